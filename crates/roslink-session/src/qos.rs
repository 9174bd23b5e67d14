//! Quality-of-service options forwarded to the bridge on endpoint creation.
//!
//! The session never interprets these; it only serializes them into the
//! `qos` member of a create request. Keys this type does not know about
//! are kept in [`QosProfile::extra`] and forwarded unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// History policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum History {
    KeepLast,
    KeepAll,
    SystemDefault,
}

/// Reliability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Reliable,
    BestEffort,
    SystemDefault,
}

/// Durability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    Volatile,
    TransientLocal,
    SystemDefault,
}

/// A QoS duration: `{"sec": .., "nsec": ..}` or the string `"infinite"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DurationRepr", into = "DurationRepr")]
pub enum QosDuration {
    Finite { sec: i32, nsec: u32 },
    Infinite,
}

impl QosDuration {
    /// Convert from a std duration, saturating seconds at `i32::MAX`.
    pub fn from_std(duration: Duration) -> Self {
        let sec = i32::try_from(duration.as_secs()).unwrap_or(i32::MAX);
        QosDuration::Finite {
            sec,
            nsec: duration.subsec_nanos(),
        }
    }

    /// `None` for infinite or negative durations.
    pub fn as_std(self) -> Option<Duration> {
        match self {
            QosDuration::Finite { sec, nsec } => {
                let secs = u64::try_from(sec).ok()?;
                Some(Duration::new(secs, nsec))
            }
            QosDuration::Infinite => None,
        }
    }
}

impl From<Duration> for QosDuration {
    fn from(duration: Duration) -> Self {
        Self::from_std(duration)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum InfiniteTag {
    Infinite,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DurationRepr {
    Tag(InfiniteTag),
    Finite { sec: i32, nsec: u32 },
}

impl From<DurationRepr> for QosDuration {
    fn from(repr: DurationRepr) -> Self {
        match repr {
            DurationRepr::Tag(InfiniteTag::Infinite) => QosDuration::Infinite,
            DurationRepr::Finite { sec, nsec } => QosDuration::Finite { sec, nsec },
        }
    }
}

impl From<QosDuration> for DurationRepr {
    fn from(duration: QosDuration) -> Self {
        match duration {
            QosDuration::Infinite => DurationRepr::Tag(InfiniteTag::Infinite),
            QosDuration::Finite { sec, nsec } => DurationRepr::Finite { sec, nsec },
        }
    }
}

/// QoS profile sent with create requests.
///
/// Every field is optional; unset fields are omitted from the JSON so the
/// bridge applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QosProfile {
    /// Named preset, e.g. `"sensor_data"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<History>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<Reliability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<Durability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<QosDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifespan: Option<QosDuration>,
    /// Liveliness kind (`"automatic"`, `"manual_by_topic"`, ...). Some
    /// bridges put a duration here instead, so it is carried as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveliness: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveliness_lease_duration: Option<QosDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_ros_namespace_conventions: Option<bool>,
    /// Options not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl QosProfile {
    /// `keep_last` history with the given depth.
    pub fn keep_last(depth: u32) -> Self {
        Self {
            history: Some(History::KeepLast),
            depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn with_reliability(mut self, reliability: Reliability) -> Self {
        self.reliability = Some(reliability);
        self
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = Some(durability);
        self
    }

    /// Attach an option this type has no field for.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_profile_serializes_empty() {
        let json = serde_json::to_value(QosProfile::default()).unwrap();
        assert_eq!(json, json!({}));
    }

    #[test]
    fn full_profile_shape() {
        let qos = QosProfile {
            profile: Some("services_default".into()),
            deadline: Some(QosDuration::Infinite),
            lifespan: Some(QosDuration::Finite { sec: 1, nsec: 500 }),
            liveliness: Some(json!("automatic")),
            avoid_ros_namespace_conventions: Some(false),
            ..QosProfile::keep_last(10)
                .with_reliability(Reliability::BestEffort)
                .with_durability(Durability::TransientLocal)
        };

        let json = serde_json::to_value(&qos).unwrap();
        assert_eq!(
            json,
            json!({
                "profile": "services_default",
                "history": "keep_last",
                "depth": 10,
                "reliability": "best_effort",
                "durability": "transient_local",
                "deadline": "infinite",
                "lifespan": {"sec": 1, "nsec": 500},
                "liveliness": "automatic",
                "avoid_ros_namespace_conventions": false,
            })
        );
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let input = json!({
            "history": "keep_all",
            "liveliness_lease_duration": "infinite",
            "vendor_hint": {"shm": true},
        });
        let qos: QosProfile = serde_json::from_value(input.clone()).unwrap();

        assert_eq!(qos.history, Some(History::KeepAll));
        assert_eq!(qos.liveliness_lease_duration, Some(QosDuration::Infinite));
        assert_eq!(qos.extra.get("vendor_hint"), Some(&json!({"shm": true})));
        assert_eq!(serde_json::to_value(&qos).unwrap(), input);
    }

    #[test]
    fn liveliness_may_be_a_duration() {
        let qos: QosProfile =
            serde_json::from_value(json!({"liveliness": {"sec": 2, "nsec": 0}})).unwrap();
        assert_eq!(qos.liveliness, Some(json!({"sec": 2, "nsec": 0})));
    }

    #[test]
    fn duration_conversions() {
        let d = QosDuration::from(Duration::from_millis(1500));
        assert_eq!(
            d,
            QosDuration::Finite {
                sec: 1,
                nsec: 500_000_000
            }
        );
        assert_eq!(d.as_std(), Some(Duration::from_millis(1500)));
        assert_eq!(QosDuration::Infinite.as_std(), None);
        assert!(serde_json::from_value::<QosDuration>(json!("forever")).is_err());
    }
}
