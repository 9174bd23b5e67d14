use crate::qos::QosProfile;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name attached to this session's log events.
    pub label: String,
    /// QoS sent with create requests that pass `None`.
    pub default_qos: Option<QosProfile>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            label: "roslink".to_string(),
            default_qos: None,
        }
    }
}
