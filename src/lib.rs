pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use error::{RelayError, Result};
pub use models::envelope::{ResponseEnvelope, Status};
pub use models::fingerprint::{RequestFingerprint, SearchKind};
pub use services::context::ExtensionContext;
pub use services::router::{Message, MessageRouter};
pub use utils::video_url::extract_video_id;
