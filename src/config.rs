use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "projectwatch", about = "Mails a digest of newly posted freelance projects")]
pub struct Config {
    /// Path to the JSON file listing the searches to watch
    #[arg(long, env = "FETCHERS_FILE", default_value = "fetchers.json")]
    pub fetchers: PathBuf,

    /// Seconds between two polls of the same search
    #[arg(long, env = "POLL_INTERVAL", default_value = "120", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,

    /// Timeout in seconds for a single listing request
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub mail: MailConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Gmail OAuth2 credentials and the digest recipient.
#[derive(clap::Args, Debug, Clone)]
pub struct MailConfig {
    /// Gmail address the refresh token belongs to; also the sender
    #[arg(long, env = "GMAIL_USER")]
    pub gmail_user: String,

    #[arg(long, env = "GMAIL_OAUTH_CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    #[arg(long, env = "GMAIL_OAUTH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    #[arg(long, env = "GMAIL_OAUTH_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: String,

    /// Address that receives the digests
    #[arg(long, env = "RECIPIENT_EMAIL")]
    pub recipient: String,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll every configured search and mail new listings (default)
    Watch,
    /// Send a single test mail to verify the credentials, then exit
    TestMail,
}

impl Config {
    /// Resolve the command, defaulting to Watch if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREDENTIALS: [&str; 10] = [
        "--gmail-user",
        "me@gmail.com",
        "--client-id",
        "id",
        "--client-secret",
        "secret",
        "--refresh-token",
        "refresh",
        "--recipient",
        "inbox@example.org",
    ];

    #[test]
    fn defaults_to_watch_every_two_minutes() {
        let config = Config::try_parse_from(std::iter::once("projectwatch").chain(CREDENTIALS))
            .unwrap();
        assert_eq!(config.resolved_command(), Command::Watch);
        assert_eq!(config.poll_interval(), Duration::from_secs(120));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.fetchers, PathBuf::from("fetchers.json"));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn parses_test_mail_subcommand() {
        let args = std::iter::once("projectwatch")
            .chain(CREDENTIALS)
            .chain(["--poll-interval", "5", "test-mail"]);
        let config = Config::try_parse_from(args).unwrap();
        assert_eq!(config.resolved_command(), Command::TestMail);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_interval_and_timeout() {
        for flag in ["--poll-interval", "--request-timeout"] {
            let args = std::iter::once("projectwatch")
                .chain(CREDENTIALS)
                .chain([flag, "0"]);
            assert!(Config::try_parse_from(args).is_err(), "{flag} 0 was accepted");
        }
    }
}
