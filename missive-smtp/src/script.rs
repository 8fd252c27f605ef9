//! The fixed command script for one send.
//!
//! A send is a straight line through [`Step`]s; the only branching is on
//! [`Mode`] (whether AUTH LOGIN happens) and on whether the message still
//! carries an attachment after the size check. Every step either waits for
//! one specific status code or is written without waiting for a reply.

use core::fmt::{self, Display, Formatter};

use missive_common::config::Security;

/// Which variant of the script to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Plaintext transport, no authentication.
    #[default]
    Plain,
    /// TLS transport, AUTH LOGIN before the envelope.
    Secure,
}

impl From<Security> for Mode {
    fn from(security: Security) -> Self {
        match security {
            Security::Plain => Self::Plain,
            Security::Tls => Self::Secure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Greeting,
    Ehlo,
    AuthLogin,
    AuthUsername,
    AuthPassword,
    MailFrom,
    RcptTo,
    Data,
    Headers,
    Body,
    Attachment,
    EndOfData,
    Quit,
}

impl Step {
    /// The status code the server must answer with, or `None` for DATA
    /// payload that the server does not acknowledge line by line.
    #[must_use]
    pub const fn expected(self) -> Option<u16> {
        match self {
            Self::Greeting => Some(220),
            Self::Ehlo | Self::MailFrom | Self::RcptTo | Self::EndOfData => Some(250),
            Self::AuthLogin | Self::AuthUsername => Some(334),
            Self::AuthPassword => Some(235),
            Self::Data => Some(354),
            Self::Headers | Self::Body | Self::Attachment => None,
            Self::Quit => Some(221),
        }
    }

    /// Steps whose command line must not be written to the log.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::AuthUsername | Self::AuthPassword)
    }
}

impl Display for Step {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            Self::Greeting => "Greeting",
            Self::Ehlo => "EHLO",
            Self::AuthLogin => "AUTH LOGIN",
            Self::AuthUsername => "AUTH LOGIN username",
            Self::AuthPassword => "AUTH LOGIN password",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Data => "DATA",
            Self::Headers => "Headers",
            Self::Body => "Body",
            Self::Attachment => "Attachment",
            Self::EndOfData => "End of data",
            Self::Quit => "QUIT",
        })
    }
}

/// The steps of one send, in order.
#[must_use]
pub fn plan(mode: Mode, with_attachment: bool) -> Vec<Step> {
    let mut steps = vec![Step::Greeting, Step::Ehlo];

    if mode == Mode::Secure {
        steps.extend([Step::AuthLogin, Step::AuthUsername, Step::AuthPassword]);
    }

    steps.extend([
        Step::MailFrom,
        Step::RcptTo,
        Step::Data,
        Step::Headers,
        Step::Body,
    ]);

    if with_attachment {
        steps.push(Step::Attachment);
    }

    steps.extend([Step::EndOfData, Step::Quit]);
    steps
}
