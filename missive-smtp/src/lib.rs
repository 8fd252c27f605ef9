//! SMTP submission client.
//!
//! A send runs a fixed script over one connection: greeting, `EHLO`,
//! optionally `AUTH LOGIN`, the envelope, a MIME `multipart/mixed` payload
//! and `QUIT`. [`Mailer`] is the entry point; the lower layers are public so
//! the script can be driven over any [`Transport`].
//!
//! ## Modules
//!
//! - [`base64`]: RFC 4648 codec used for credentials and attachments
//! - [`transport`] and [`tls`]: plain or TLS byte streams
//! - [`session`] and [`response`]: the command/response cycle
//! - [`script`]: the steps of a send and their expected codes
//! - [`mime`]: DATA payload assembly
//! - [`mailer`]: runs the script

pub mod base64;
pub mod error;
pub mod mailer;
pub mod mime;
pub mod response;
pub mod script;
pub mod session;
pub mod tls;
pub mod transport;

pub use error::{AttachmentError, ClientError, Result, TransportError};
pub use mailer::Mailer;
pub use mime::MimeMessage;
pub use response::SmtpResponse;
pub use script::{Mode, Step};
pub use session::{Session, State};
pub use transport::{Connection, Target, Transport};
