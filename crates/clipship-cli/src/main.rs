//! Command-line video uploader binary.

use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use clipship_client::{ClientConfig, EventSink, UploadOrchestrator};
use clipship_models::UploadEvent;

/// Upload a video and start clip processing.
#[derive(Debug, Parser)]
#[command(name = "clipship", version, about)]
struct Args {
    /// Video file to upload
    file: PathBuf,

    /// Number of clips to request from the processing job
    #[arg(long, default_value_t = 5)]
    parts: u32,

    /// Backend base URL (overrides CLIPSHIP_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::from_default_env().add_directive("clipship=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let args = Args::parse();

    // Load configuration
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let base_url = config.base_url.clone();

    info!(base_url = %base_url, file = %args.file.display(), "Starting upload");

    let mut orchestrator = match UploadOrchestrator::new(config, console_sink()) {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to create uploader: {}", e);
            std::process::exit(1);
        }
    };

    match orchestrator.run(&args.file, args.parts).await {
        Ok(job) => match resolve_stream(&base_url, &job.stream) {
            Ok(stream) => println!("{}", stream),
            Err(e) => {
                error!("Upload succeeded but the stream location is unusable: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Upload failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Sink printing the transfer transcript to stderr, with progress
/// deduplicated to whole percents.
fn console_sink() -> EventSink {
    let last_rendered = Mutex::new(-1i64);
    Box::new(move |event| match event {
        UploadEvent::Log { message, .. } => eprintln!("{}", message),
        UploadEvent::Progress { value } => {
            let whole = value.floor() as i64;
            let mut last = last_rendered.lock().unwrap();
            if whole > *last {
                *last = whole;
                eprintln!("  {:>3}%", whole);
            }
        }
        UploadEvent::Error { message, .. } => eprintln!("error: {}", message),
        UploadEvent::Done { .. } => {}
    })
}

/// Resolve the possibly-relative stream location against the backend.
fn resolve_stream(base_url: &str, stream: &str) -> Result<String, url::ParseError> {
    if Url::parse(stream).is_ok() {
        return Ok(stream.to_string());
    }
    let resolved = Url::parse(base_url)?.join(stream)?;
    Ok(resolved.to_string())
}
