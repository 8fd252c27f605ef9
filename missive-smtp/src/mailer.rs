//! Runs the send script for one message.
//!
//! [`Mailer::send`] opens the transport, then walks [`plan`] over a
//! [`Session`]: every command step is one validated exchange, every payload
//! step is written without waiting for a reply. The first failure ends the
//! send; no `QUIT` follows it, the transport is simply closed.

use missive_common::{
    Credentials, Limits, MailMessage, config::Config, error::ConfigError, tracing,
};

use crate::{
    base64,
    error::Result,
    mime::MimeMessage,
    response::SmtpResponse,
    script::{Mode, Step, plan},
    session::Session,
    transport::{Connection, Target, Transport},
};

/// Sends messages to one server.
///
/// # Examples
///
/// ```no_run
/// use missive_common::{MailMessage, config::TlsConfig};
/// use missive_smtp::{Mailer, Target};
///
/// # async fn example() -> missive_smtp::Result<()> {
/// let mailer = Mailer::new(Target::new("localhost", 25, TlsConfig::plain()), "laptop");
/// let message = MailMessage::new("a@x.com", "b@x.com", "Hi", "Hello");
/// mailer.send(&message).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Mailer {
    target: Target,
    client_id: String,
    mode: Mode,
    credentials: Option<Credentials>,
    limits: Limits,
}

impl Mailer {
    /// The mode follows the target's security: TLS targets authenticate.
    #[must_use]
    pub fn new(target: Target, client_id: impl Into<String>) -> Self {
        Self {
            mode: Mode::from(target.tls.security),
            target,
            client_id: client_id.into(),
            credentials: None,
            limits: Limits::default(),
        }
    }

    /// Build a mailer from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Target::new(config.server.host.clone(), config.port(), config.tls),
            config.server.client_id.clone(),
        )
        .with_limits(config.limits)
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub const fn target(&self) -> &Target {
        &self.target
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Connect and send `message`.
    ///
    /// Credentials are checked before any connection is attempted.
    ///
    /// # Errors
    /// [`crate::ClientError::Config`] for missing credentials in secure mode,
    /// [`crate::ClientError::Transport`] if the connection cannot be opened,
    /// and any error from [`Mailer::deliver`].
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(server = %self.target.address(), mode = ?self.mode)
    )]
    pub async fn send(&self, message: &MailMessage) -> Result<Vec<SmtpResponse>> {
        self.credentials()?;

        let connection = Connection::open(&self.target).await?;
        self.deliver(connection, message).await
    }

    /// Run the send script over an already open transport.
    ///
    /// The transport is closed before returning, whether the send succeeded
    /// or not. On success the server's replies are returned in order.
    ///
    /// # Errors
    /// The first [`crate::ClientError`] raised by a step.
    pub async fn deliver<T: Transport>(
        &self,
        transport: T,
        message: &MailMessage,
    ) -> Result<Vec<SmtpResponse>> {
        let credentials = self.credentials()?;
        let mime = MimeMessage::build(message, &self.limits);
        let mut session = Session::new(transport, &self.limits);

        let outcome = self.run(&mut session, message, &mime, credentials).await;

        if let Err(err) = &outcome {
            tracing::warn!(step = ?err.step(), state = %session.state(), %err, "Send aborted");
        }

        if let Err(err) = session.close().await {
            tracing::debug!(%err, "Error closing connection");
        }

        outcome.map(|()| session.responses().to_vec())
    }

    async fn run<T: Transport>(
        &self,
        session: &mut Session<T>,
        message: &MailMessage,
        mime: &MimeMessage,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        for step in plan(self.mode, mime.has_attachment()) {
            match step {
                Step::Headers | Step::Body | Step::Attachment => {
                    session.send_unacknowledged(step, mime.section(step)).await?;
                }
                _ => {
                    let command = self.command(step, message, credentials)?;
                    session.exchange(step, &command).await?;
                }
            }

            if step == Step::EndOfData {
                tracing::info!(from = %message.from, to = %message.to, "Message accepted");
            }
        }

        Ok(())
    }

    /// The credentials to authenticate with, if the mode needs them.
    fn credentials(&self) -> std::result::Result<Option<&Credentials>, ConfigError> {
        if self.mode == Mode::Plain {
            return Ok(None);
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ConfigError::MissingCredentials("no credentials loaded"))?;
        credentials.validate()?;

        Ok(Some(credentials))
    }

    /// The line to write for a command step. Empty for the greeting.
    fn command(
        &self,
        step: Step,
        message: &MailMessage,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<String, ConfigError> {
        let secret = |field: fn(&Credentials) -> &str| {
            credentials
                .map(|credentials| format!("{}\r\n", base64::encode(field(credentials).as_bytes())))
                .ok_or(ConfigError::MissingCredentials("no credentials loaded"))
        };

        Ok(match step {
            Step::Ehlo => format!("EHLO {}\r\n", self.client_id),
            Step::AuthLogin => "AUTH LOGIN\r\n".to_string(),
            Step::AuthUsername => secret(Credentials::username)?,
            Step::AuthPassword => secret(Credentials::password)?,
            Step::MailFrom => format!("MAIL FROM:<{}>\r\n", message.from),
            Step::RcptTo => format!("RCPT TO:<{}>\r\n", message.to),
            Step::Data => "DATA\r\n".to_string(),
            Step::EndOfData => ".\r\n".to_string(),
            Step::Quit => "QUIT\r\n".to_string(),
            Step::Greeting | Step::Headers | Step::Body | Step::Attachment => String::new(),
        })
    }
}
