use std::path::{Path, PathBuf};

use missive_common::{Credentials, Limits, MailMessage, config::Config, internal, tracing};
use missive_smtp::Mailer;

use crate::cli::Cli;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MISSIVE_CONFIG";

const DEFAULT_CONFIG_PATHS: [&str; 2] = [
    "./missive.config.ron",
    "/etc/missive/missive.config.ron",
];

/// Find the configuration file using the following precedence:
/// 1. an explicit `--config` path
/// 2. `MISSIVE_CONFIG` environment variable
/// 3. ./missive.config.ron (current working directory)
/// 4. /etc/missive/missive.config.ron (system-wide config)
///
/// Finding nothing is not an error; the defaults apply.
///
/// # Errors
/// An explicit path or `MISSIVE_CONFIG` that does not exist.
pub fn find_config_file(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let defaults = DEFAULT_CONFIG_PATHS.map(PathBuf::from);
    locate(
        explicit,
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        &defaults,
    )
}

fn locate(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    defaults: &[PathBuf],
) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        anyhow::bail!("Configuration file does not exist: {}", path.display());
    }

    if let Some(path) = from_env {
        if path.exists() {
            return Ok(Some(path));
        }
        anyhow::bail!("{CONFIG_ENV} points to non-existent file: {}", path.display());
    }

    Ok(defaults.iter().find(|path| path.exists()).cloned())
}

/// A configured sender, ready to run.
#[derive(Debug)]
pub struct Missive {
    config: Config,
    credentials: Option<Credentials>,
}

impl Missive {
    /// Resolve the configuration from files and flags, and load credentials
    /// when the connection needs them.
    ///
    /// # Errors
    /// Any configuration or credential problem; nothing has touched the
    /// network yet.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match find_config_file(cli.config.as_deref())? {
            Some(path) => {
                internal!(level = DEBUG, "Loading configuration from {}", path.display());
                Config::load(&path)?
            }
            None => Config::default(),
        };

        cli.apply(&mut config);
        Self::new(config)
    }

    /// # Errors
    /// An invalid configuration, or unreadable or empty credentials for a
    /// secure connection.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let credentials = match (&config.credentials, config.tls.is_secure()) {
            (Some(path), true) => {
                let credentials = Credentials::load(path)?;
                credentials.validate()?;
                Some(credentials)
            }
            _ => None,
        };

        Ok(Self {
            config,
            credentials,
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn limits(&self) -> &Limits {
        &self.config.limits
    }

    pub fn mailer(&self) -> Mailer {
        let mailer = Mailer::from_config(&self.config);
        match &self.credentials {
            Some(credentials) => mailer.with_credentials(credentials.clone()),
            None => mailer,
        }
    }

    /// Send `message`, giving up if the process is asked to stop first.
    ///
    /// Stopping drops the send in progress, which closes the connection
    /// without a `QUIT`.
    ///
    /// # Errors
    /// The send failed or was interrupted.
    #[tracing::instrument(level = "trace", skip_all, err)]
    pub async fn run(self, message: MailMessage) -> anyhow::Result<()> {
        let mailer = self.mailer();

        tokio::select! {
            result = mailer.send(&message) => {
                let responses = result?;
                tracing::info!(
                    server = %mailer.target().address(),
                    replies = responses.len(),
                    "Message sent"
                );
                Ok(())
            }
            result = shutdown() => {
                result?;
                anyhow::bail!("Interrupted before the message was sent")
            }
        }
    }
}

async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered, abandoning send");
        }
        _ = terminate.recv() => {
            internal!("Terminate Signal received, abandoning send");
        }
    };

    Ok(())
}
