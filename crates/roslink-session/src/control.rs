//! Control records carried in text frames.

use serde::{Deserialize, Serialize};

use crate::qos::QosProfile;

/// Which kind of endpoint a create request opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateOp {
    CreatePublisher,
    CreateSubscription,
    CreateServiceClient,
}

impl CreateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CreateOp::CreatePublisher => "create_publisher",
            CreateOp::CreateSubscription => "create_subscription",
            CreateOp::CreateServiceClient => "create_service_client",
        }
    }
}

/// Request to open an endpoint. Answered by a [`CreateResponse`] with the
/// same `call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub call_id: u32,
    pub op: CreateOp,
    /// Topic or service name.
    pub name: String,
    /// ROS type name, e.g. `std_msgs/msg/String`.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos: Option<QosProfile>,
}

/// Bridge reply carrying the assigned endpoint id. Extra members are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: u32,
    pub call_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DestroyOp {
    Destroy,
}

/// One-way request to release an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyRequest {
    op: DestroyOp,
    pub id: u32,
}

impl DestroyRequest {
    pub fn new(id: u32) -> Self {
        Self {
            op: DestroyOp::Destroy,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::qos::QosProfile;

    #[test]
    fn create_request_json_shape() {
        let req = CreateRequest {
            call_id: 4,
            op: CreateOp::CreateSubscription,
            name: "/chatter".into(),
            type_name: "std_msgs/msg/String".into(),
            qos: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "call_id": 4,
                "op": "create_subscription",
                "name": "/chatter",
                "type": "std_msgs/msg/String",
            })
        );
    }

    #[test]
    fn create_request_carries_qos() {
        let req = CreateRequest {
            call_id: 0,
            op: CreateOp::CreatePublisher,
            name: "/scan".into(),
            type_name: "sensor_msgs/msg/LaserScan".into(),
            qos: Some(QosProfile::keep_last(5)),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["qos"], json!({"history": "keep_last", "depth": 5}));

        let back: CreateRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn create_response_ignores_extra_members() {
        let resp: CreateResponse =
            serde_json::from_str(r#"{"id":12,"call_id":3,"status":"ok"}"#).unwrap();
        assert_eq!(resp, CreateResponse { id: 12, call_id: 3 });
    }

    #[test]
    fn create_response_requires_both_ids() {
        assert!(serde_json::from_str::<CreateResponse>(r#"{"id":12}"#).is_err());
        assert!(serde_json::from_str::<CreateResponse>(r#"{"call_id":"3","id":1}"#).is_err());
    }

    #[test]
    fn destroy_request_json_shape() {
        let json = serde_json::to_value(DestroyRequest::new(9)).unwrap();
        assert_eq!(json, json!({"op": "destroy", "id": 9}));
    }

    #[test]
    fn op_names_match_serde() {
        for op in [
            CreateOp::CreatePublisher,
            CreateOp::CreateSubscription,
            CreateOp::CreateServiceClient,
        ] {
            assert_eq!(serde_json::to_value(op).unwrap(), json!(op.as_str()));
        }
    }
}
