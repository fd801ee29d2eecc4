//! # Donor Portal Binary
//!
//! Assembles the controllers with the reqwest backend, the configured
//! credential source and the local download directory, then runs one
//! command.

mod cli;
mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dp_auth_static::{StaticCredentialSource, TokenFileCredentialSource};
use dp_config::{LogFormat, LoggingSettings, Settings};
use dp_core::CredentialSource;
use dp_download_local::LocalDownloadSink;
use dp_http_reqwest::{HttpBackend, DEFAULT_USER_AGENT};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Portal;

fn init_tracing(logging: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("invalid log level {:?}", logging.level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Fmt => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&settings.logging)?;

    // 1. Backend
    let user_agent = settings
        .api
        .user_agent
        .as_deref()
        .unwrap_or(DEFAULT_USER_AGENT);
    let backend = Arc::new(HttpBackend::new(&settings.api.base_url, user_agent)?);

    // 2. Credential (a configured token wins over the token file)
    let source: Box<dyn CredentialSource> = match (&settings.auth.token, &settings.auth.token_file) {
        (Some(token), _) => Box::new(StaticCredentialSource::new(Some(token.clone()))),
        (None, Some(path)) => Box::new(TokenFileCredentialSource::new(path)),
        (None, None) => Box::new(StaticCredentialSource::signed_out()),
    };
    let credential = source.credential().await?;

    // 3. Downloads
    let sink = Arc::new(LocalDownloadSink::new(&settings.downloads.directory));

    tracing::debug!(
        base_url = backend.base_url(),
        signed_in = credential.is_some(),
        downloads = %sink.root().display(),
        "donor portal starting"
    );

    let portal = Portal::new(backend, sink, credential, cli.yes);
    let result = portal.run(cli.command).await;
    portal.print_notices();
    result
}
