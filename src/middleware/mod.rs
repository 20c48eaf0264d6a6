//! Request gates. Each one either short-circuits with an `ApiError` envelope or
//! attaches the verified identity to the request extensions for the handler.

pub mod api_key;
pub mod jwt;

pub use api_key::{require_api_key, ApiKeyContext, API_KEY_HEADER};
pub use jwt::{require_admin, require_auth};
