//! Strongly-typed identifier newtypes for domain concepts.
//!
//! All types implement `From<&str>`, `From<String>`, and `Into<String>` for
//! easy conversion. They also serialize/deserialize as plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro to generate string wrapper newtypes with consistent implementations.
///
/// Each generated type:
/// - Trims whitespace from input values
/// - Implements `From<&str>`, `From<String>`, `Into<String>`
/// - Implements `Display` for string formatting
/// - Serializes/deserializes as a plain string
macro_rules! string_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into().trim().to_string())
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Check if the identifier is empty (after trimming).
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(String::new())
            }
        }
    };
}

string_id_type!(
    WorkflowId,
    "Workflow identifier: names a remotely-hosted automation graph."
);

string_id_type!(
    InstanceId,
    "Opaque token threading state across repeated executions of a workflow."
);

impl WorkflowId {
    /// Advisory format check: alphanumeric plus `._-`, 5 to 100 characters.
    ///
    /// Client operations only require a non-empty ID; this is a stricter
    /// check callers can apply before accepting user input.
    pub fn is_well_formed(&self) -> bool {
        let id = self.as_str();
        (5..=100).contains(&id.len())
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }
}
