//! Strongly-typed identifiers.
//!
//! Newtype wrappers keep the different id spaces from mixing at compile time.
//! Generated ids are UUID v4; `ContextId` is caller-supplied and only checked
//! for non-emptiness.

use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Wrap an externally supplied id. Empty strings are rejected.
            pub fn from_string(s: String) -> Result<Self> {
                if s.is_empty() {
                    return Err(Error::validation(concat!(
                        stringify!($name),
                        " cannot be empty"
                    )));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

macro_rules! generated_id_type {
    ($(#[$doc:meta])* $name:ident) => {
        id_type!($(#[$doc])* $name);

        impl $name {
            /// Mint a fresh random id.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

generated_id_type! {
    /// Wire id of one chat message.
    MessageId
}

generated_id_type! {
    /// Id of one tool invocation, minted when the executor accepts it.
    ToolCallId
}

generated_id_type! {
    /// Id of one realtime subscription.
    SubscriberId
}

id_type! {
    /// Conversation id. Comes from the transport layer, never generated here.
    ContextId
}
