//! Bridge-assigned endpoint identifiers.
//!
//! Each endpoint kind has its own newtype so a publisher id can never be
//! handed to an operation that expects a service client.

use std::fmt;

macro_rules! endpoint_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw id as it appears on the wire.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

endpoint_id!(
    /// A topic publisher opened with `create_publisher`.
    PublisherId,
    "publisher"
);
endpoint_id!(
    /// A topic subscription opened with `create_subscription`.
    SubscriptionId,
    "subscription"
);
endpoint_id!(
    /// A service client opened with `create_service_client`.
    ServiceClientId,
    "service_client"
);
