//! Mock SMTP server for exercising the send script over real TCP.
#![allow(dead_code)] // Test utility module - not all methods used in every test
//!
//! The server replies with a configurable code to every command, answers
//! `AUTH LOGIN` with the two 334 challenges, collects everything between
//! `DATA` and the terminating `.`, and records what it saw.
//!
//! ```rust,no_run
//! use support::mock_server::MockSmtpServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = MockSmtpServer::builder()
//!     .with_rcpt_to_response(550, "User unknown")
//!     .build()
//!     .await?;
//!
//! // Connect to server.addr() and send.
//! # Ok(())
//! # }
//! ```

use std::{net::SocketAddr, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
};

/// A command, as the server understood it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo(String),
    /// The base64 username and password lines, undecoded.
    AuthLogin { username: String, password: String },
    /// The path between `<` and `>`.
    MailFrom(String),
    RcptTo(String),
    Data,
    /// Everything between `DATA` and the terminating `.`, line endings kept.
    MessageContent(String),
    Quit,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub code: u16,
    pub message: String,
}

impl Reply {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!("{} {}\r\n", self.code, self.message).into_bytes()
    }
}

#[derive(Clone)]
struct MockServerConfig {
    greeting: Reply,
    ehlo_response: Reply,
    auth_response: Reply,
    mail_from_response: Reply,
    rcpt_to_response: Reply,
    data_response: Reply,
    data_end_response: Reply,
    quit_response: Reply,
    /// Close the connection without replying to the Nth command (0-indexed).
    hangup_on_command: Option<usize>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: Reply::new(220, "Mock SMTP Server"),
            ehlo_response: Reply::new(250, "localhost"),
            auth_response: Reply::new(235, "Authentication successful"),
            mail_from_response: Reply::new(250, "OK"),
            rcpt_to_response: Reply::new(250, "OK"),
            data_response: Reply::new(354, "Start mail input; end with <CRLF>.<CRLF>"),
            data_end_response: Reply::new(250, "OK: Message accepted"),
            quit_response: Reply::new(221, "Bye"),
            hangup_on_command: None,
        }
    }
}

/// A mock server handling one client at a time on a random local port.
pub struct MockSmtpServer {
    addr: SocketAddr,
    commands_received: Arc<RwLock<Vec<SmtpCommand>>>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::new()
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command received so far, in order.
    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.commands_received.read().await.clone()
    }

    async fn handle_client(
        mut stream: TcpStream,
        config: Arc<MockServerConfig>,
        commands: Arc<RwLock<Vec<SmtpCommand>>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        let mut index = 0;
        let unknown = Reply::new(500, "Unknown command");

        writer.write_all(&config.greeting.to_bytes()).await?;
        writer.flush().await?;

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }

            if config.hangup_on_command == Some(index) {
                return Ok(());
            }
            index += 1;

            let cmd_line = line.trim_end_matches(['\r', '\n']).to_string();
            tracing::debug!("Mock server received: {}", cmd_line);

            let verb = cmd_line
                .split([' ', ':'])
                .next()
                .unwrap_or_default()
                .to_uppercase();

            let (command, reply) = match verb.as_str() {
                "EHLO" => (
                    SmtpCommand::Ehlo(cmd_line[4..].trim().to_string()),
                    &config.ehlo_response,
                ),
                "AUTH" => {
                    writer.write_all(b"334 VXNlcm5hbWU6\r\n").await?;
                    let username = Self::read_plain_line(&mut reader).await?;
                    writer.write_all(b"334 UGFzc3dvcmQ6\r\n").await?;
                    let password = Self::read_plain_line(&mut reader).await?;
                    (
                        SmtpCommand::AuthLogin { username, password },
                        &config.auth_response,
                    )
                }
                "MAIL" => (
                    SmtpCommand::MailFrom(path_argument(&cmd_line)),
                    &config.mail_from_response,
                ),
                "RCPT" => (
                    SmtpCommand::RcptTo(path_argument(&cmd_line)),
                    &config.rcpt_to_response,
                ),
                "DATA" => (SmtpCommand::Data, &config.data_response),
                "QUIT" => {
                    commands.write().await.push(SmtpCommand::Quit);
                    writer.write_all(&config.quit_response.to_bytes()).await?;
                    writer.flush().await?;
                    return Ok(());
                }
                _ => (SmtpCommand::Other(cmd_line), &unknown),
            };

            let accepts_data = command == SmtpCommand::Data && reply.code == 354;
            commands.write().await.push(command);
            writer.write_all(&reply.to_bytes()).await?;
            writer.flush().await?;

            if accepts_data {
                let content = Self::read_data(&mut reader).await?;
                commands
                    .write()
                    .await
                    .push(SmtpCommand::MessageContent(content));
                writer
                    .write_all(&config.data_end_response.to_bytes())
                    .await?;
                writer.flush().await?;
            }
        }
    }

    async fn read_plain_line<R: AsyncBufReadExt + Unpin>(
        reader: &mut R,
    ) -> Result<String, std::io::Error> {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read until a line holding only `.`.
    async fn read_data<R: AsyncBufReadExt + Unpin>(
        reader: &mut R,
    ) -> Result<String, std::io::Error> {
        let mut content = String::new();
        let mut data_line = String::new();

        loop {
            data_line.clear();
            if reader.read_line(&mut data_line).await? == 0 || data_line == ".\r\n" {
                return Ok(content);
            }
            content.push_str(&data_line);
        }
    }
}

fn path_argument(line: &str) -> String {
    line.split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .map(|(path, _)| path.to_string())
        .unwrap_or_default()
}

pub struct MockSmtpServerBuilder {
    config: MockServerConfig,
}

impl MockSmtpServerBuilder {
    fn new() -> Self {
        Self {
            config: MockServerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_greeting(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.greeting = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_ehlo_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.ehlo_response = Reply::new(code, message);
        self
    }

    /// The reply to the password line.
    #[must_use]
    pub fn with_auth_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.auth_response = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.mail_from_response = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.rcpt_to_response = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_data_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_response = Reply::new(code, message);
        self
    }

    /// The reply after the terminating `.`.
    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_end_response = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_quit_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.quit_response = Reply::new(code, message);
        self
    }

    /// Hang up after reading the Nth command (0-indexed), without replying.
    #[must_use]
    pub const fn with_hangup_on_command(mut self, index: usize) -> Self {
        self.config.hangup_on_command = Some(index);
        self
    }

    /// Bind to a random local port and start accepting.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to a port
    pub async fn build(self) -> Result<MockSmtpServer, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = Arc::new(self.config);
        let commands = Arc::new(RwLock::new(Vec::new()));
        let commands_clone = Arc::clone(&commands);

        tokio::spawn(async move {
            while let Ok((stream, _peer)) = listener.accept().await {
                let config = Arc::clone(&config);
                let commands = Arc::clone(&commands_clone);

                if let Err(e) = MockSmtpServer::handle_client(stream, config, commands).await {
                    tracing::debug!("Mock server client error: {}", e);
                }
            }
        });

        Ok(MockSmtpServer {
            addr,
            commands_received: commands,
        })
    }
}
