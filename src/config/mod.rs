pub mod settings;

pub use settings::{AuthSettings, DatabaseSettings, ServerSettings, Settings};
