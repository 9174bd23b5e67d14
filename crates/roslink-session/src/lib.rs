//! Multiplexed ROS bridge session over one duplex frame channel.
//!
//! Text frames carry JSON control records that open and release
//! publishers, subscriptions and service clients. Binary frames carry topic
//! payloads and service calls, correlated by call id. Payloads are opaque
//! bytes here; encode them with `roslink-schema`.

pub mod cancel;
pub mod channel;
pub mod config;
pub mod control;
pub mod error;
pub mod ids;
pub mod qos;
pub mod session;
pub mod wire;

pub use cancel::CancelSignal;
pub use channel::{Channel, StreamChannel};
pub use config::SessionConfig;
pub use control::{CreateOp, CreateRequest, CreateResponse, DestroyRequest};
pub use error::{ChannelError, Result, SessionError, WireError};
pub use ids::{PublisherId, ServiceClientId, SubscriptionId};
pub use qos::{Durability, History, QosDuration, QosProfile, Reliability};
pub use session::{Cancellable, Session, SessionStats};
pub use wire::DataFrame;
