pub mod access_log;
pub mod api_key;
pub mod shoe;
pub mod stats;
pub mod user;

/// Returned when a TEXT column holds a value outside a Rust enum's variants.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
