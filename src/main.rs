mod config;
mod dispatcher;
mod error;
mod models;
mod notify;
mod scheduler;
mod sources;
#[cfg(test)]
mod testing;
mod watermark;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config, LogFormat};
use crate::dispatcher::Dispatcher;
use crate::models::fetch_config::load_fetch_configurations;
use crate::notify::Notifier;
use crate::notify::gmail::GmailSender;
use crate::sources::freelancermap::FreelancerMap;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("projectwatch=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    init_tracing(config.log_format);

    let sender = GmailSender::new(&config.mail)?;
    let notifier = Arc::new(Notifier::new(Arc::new(sender), &config.mail.recipient)?);
    tracing::info!("Mail transport configured for {}", config.mail.gmail_user);

    match config.resolved_command() {
        Command::TestMail => {
            notifier.send_test_mail().await?;
            Ok(())
        }
        Command::Watch => {
            let fetchers = load_fetch_configurations(&config.fetchers)?;
            tracing::info!(
                "Loaded {} fetcher(s) from {}",
                fetchers.len(),
                config.fetchers.display()
            );

            let source = Arc::new(FreelancerMap::new(config.request_timeout())?);
            Dispatcher::new(source, notifier, config.poll_interval())
                .run(fetchers)
                .await
        }
    }
}
