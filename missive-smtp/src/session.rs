//! The command/response cycle over a [`Transport`].

use core::fmt::{self, Display, Formatter};

use missive_common::{Limits, incoming, outgoing, tracing};

use crate::{
    error::{ClientError, Result},
    response::SmtpResponse,
    script::Step,
    transport::Transport,
};

/// Where a session is in the send script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Disconnected,
    Connected,
    GreetingReceived,
    EhloSent,
    AuthSent,
    MailFromSent,
    RcptToSent,
    DataSent,
    HeadersSent,
    BodySent,
    AttachmentSent,
    DataTerminated,
    QuitSent,
    Closed,
}

impl State {
    /// The state reached once `step` has completed.
    #[must_use]
    pub const fn after(step: Step) -> Self {
        match step {
            Step::Greeting => Self::GreetingReceived,
            Step::Ehlo => Self::EhloSent,
            Step::AuthLogin | Step::AuthUsername | Step::AuthPassword => Self::AuthSent,
            Step::MailFrom => Self::MailFromSent,
            Step::RcptTo => Self::RcptToSent,
            Step::Data => Self::DataSent,
            Step::Headers => Self::HeadersSent,
            Step::Body => Self::BodySent,
            Step::Attachment => Self::AttachmentSent,
            Step::EndOfData => Self::DataTerminated,
            Step::Quit => Self::QuitSent,
        }
    }
}

impl Display for State {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, fmt)
    }
}

/// One SMTP session over an open transport.
///
/// The transport is owned by the session; dropping the session drops the
/// transport, so the socket is released on every exit path.
pub struct Session<T: Transport> {
    transport: T,
    state: State,
    responses: Vec<SmtpResponse>,
    max_reply_size: usize,
}

impl<T: Transport> Session<T> {
    #[must_use]
    pub fn new(transport: T, limits: &Limits) -> Self {
        Self {
            transport,
            state: State::Connected,
            responses: Vec::new(),
            max_reply_size: limits.max_reply_size,
        }
    }

    pub const fn state(&self) -> State {
        self.state
    }

    /// Every reply read so far, in order.
    pub fn responses(&self) -> &[SmtpResponse] {
        &self.responses
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Read the server greeting without sending anything.
    ///
    /// # Errors
    /// As for [`Session::exchange`].
    pub async fn read_greeting(&mut self) -> Result<SmtpResponse> {
        self.exchange(Step::Greeting, "").await
    }

    /// Write `command` (if not empty), read one reply and check its code
    /// against what `step` expects.
    ///
    /// `command` is written verbatim and must carry its own `\r\n`. A step
    /// with no expected code accepts any reply, as long as one arrives.
    ///
    /// # Errors
    /// [`ClientError::Interrupted`] on read or write failures,
    /// [`ClientError::ConnectionClosed`] if the server hung up, and
    /// [`ClientError::UnexpectedResponse`] if the code does not match.
    pub async fn exchange(&mut self, step: Step, command: &str) -> Result<SmtpResponse> {
        if !command.is_empty() {
            self.write(step, command).await?;
        }

        let response = self.read_reply(step).await?;

        if let Some(expected) = step.expected()
            && !response.matches(expected)
        {
            tracing::warn!(%step, expected, actual = response.code, "Unexpected reply");
            return Err(ClientError::UnexpectedResponse {
                step,
                command: if step.is_secret() {
                    "<redacted>".to_string()
                } else {
                    command.to_string()
                },
                expected,
                actual: response.code,
                message: response.message().to_string(),
            });
        }

        self.advance(step);
        Ok(response)
    }

    /// Write DATA payload lines without waiting for any reply.
    ///
    /// The server answers once, after the terminating `.`.
    ///
    /// # Errors
    /// [`ClientError::Interrupted`] if a write fails.
    pub async fn send_unacknowledged<'a, I>(&mut self, step: Step, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for line in lines {
            self.write(step, line).await?;
        }

        self.advance(step);
        Ok(())
    }

    /// Record that `step` has completed.
    pub const fn advance(&mut self, step: Step) {
        self.state = State::after(step);
    }

    /// Shut the transport down. No `QUIT` is sent.
    ///
    /// # Errors
    /// [`ClientError::Io`] if the shutdown fails; the session is closed either way.
    pub async fn close(&mut self) -> Result<()> {
        let result = self.transport.close().await;
        self.state = State::Closed;
        result
    }

    async fn write(&mut self, step: Step, line: &str) -> Result<()> {
        if step.is_secret() {
            outgoing!("[{}] <redacted>", step);
        } else {
            outgoing!("[{}] {}", step, line.trim_end_matches(['\r', '\n']));
        }

        self.transport
            .send(line.as_bytes())
            .await
            .map_err(|err| err.during(step))?;
        Ok(())
    }

    async fn read_reply(&mut self, step: Step) -> Result<SmtpResponse> {
        let data = self
            .transport
            .receive(self.max_reply_size)
            .await
            .map_err(|err| err.during(step))?;
        if data.is_empty() {
            return Err(ClientError::ConnectionClosed { step });
        }

        let response = SmtpResponse::parse(&data);
        incoming!("{}", response.message());

        self.responses.push(response.clone());
        Ok(response)
    }
}
