//! ROS2 typed messaging over a single bridge connection.
//!
//! roslink encodes ROS2 messages in little-endian CDR from runtime schema
//! trees, and multiplexes publishers, subscriptions and service calls over
//! one duplex text/binary frame channel.
//!
//! # Crate Structure
//!
//! - [`cdr`]: CDR primitive writer/reader with encapsulation header
//! - [`schema`]: Schema trees, dynamic values, service schemas, registry
//! - [`frame`]: Text/binary frames and stream framing
//! - [`session`]: Multiplexed bridge session (behind `session` feature)

/// Re-export CDR codec types.
pub mod cdr {
    pub use roslink_cdr::*;
}

/// Re-export schema types.
pub mod schema {
    pub use roslink_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use roslink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use roslink_session::*;
}
