pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod message;

pub use tracing;

pub use credentials::Credentials;
pub use message::{Attachment, Limits, MailMessage};
