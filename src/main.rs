//! Stuntguard: child nutritional-status prediction service.
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stuntguard::adapters::fs::verifying_key_from_b64;
use stuntguard::adapters::sanitize::SanitizingMakeWriter;
use stuntguard::adapters::{FsArtifactSource, VerificationPolicy};
use stuntguard::application::LoadError;
use stuntguard::config::{LogMode, ServiceConfig};
use stuntguard::{server, BundleState, PredictionService, StuntguardError};

fn verification_policy(config: &ServiceConfig) -> Result<VerificationPolicy, StuntguardError> {
    let verifying_key = match &config.pubkey_file {
        Some(path) => Some(verifying_key_from_b64(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    Ok(VerificationPolicy {
        require_signed: config.require_signed,
        verifying_key,
    })
}

/// Load the bundle once. Failures leave the server up in the not-ready state.
fn load_state(config: &ServiceConfig) -> BundleState {
    let source = verification_policy(config)
        .and_then(|policy| Ok(FsArtifactSource::open(&config.artifact_dir, &policy)?));
    match source {
        Ok(source) => {
            if !source.is_verified() {
                tracing::warn!("Serving unverified artifacts");
            }
            BundleState::load(&source)
        }
        Err(e) => {
            tracing::error!("Artifact source unavailable: {}", e);
            BundleState::Unavailable(Arc::new(LoadError::Source(e.to_string())))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env()?;

    let (writer, _guard) = match &config.log_mode {
        LogMode::File(log_file) => {
            if let Some(parent) = log_file.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Stuntguard...");

    let state = load_state(&config);
    if let Some(err) = state.error() {
        tracing::error!("Predictions disabled until restart: {}", err);
    }

    let router = server::create_router(PredictionService::new(state), &config.cors);
    server::serve(router, config.bind).await?;

    tracing::info!("Stuntguard shutdown complete.");
    Ok(())
}
