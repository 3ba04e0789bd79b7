//! `ingest`: turns article URLs into article records with a stored
//! representative image, printing one `{"data": ...}` JSON line per URL.

mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ingest_core::ScrapeResponse;
use ingest_engine::{EngineEvent, EngineHandle, JobId, S3ObjectStore, Scraper, StorageLocation};
use ingest_logging::{ingest_debug, ingest_error, ingest_info};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Article URLs to ingest
    #[arg(required = true)]
    urls: Vec<String>,

    /// Bucket receiving originals and thumbnails
    #[arg(long, env = "AWS_BUCKET_NAME")]
    bucket: String,

    /// Region of the bucket, used for the client and public URLs
    #[arg(long, env = "AWS_S3_REGION")]
    region: String,

    /// Optional RON file overriding fetch and image settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log_level, cli.log_file.as_deref());

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            ingest_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when at least one URL failed.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let storage = StorageLocation::new(cli.bucket, cli.region);
    let config = config::load(storage, cli.config.as_deref())?;

    let store = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(S3ObjectStore::connect(&config.storage));
    let engine = EngineHandle::new(Scraper::new(config, Arc::new(store)));

    for (job_id, url) in (1..).zip(&cli.urls) {
        engine.enqueue(job_id, url.as_str());
    }

    let mut pending = cli.urls.len();
    let mut all_ok = true;
    while pending > 0 {
        let Some(event) = engine.recv() else {
            anyhow::bail!("engine stopped with {pending} job(s) outstanding");
        };
        match event {
            EngineEvent::Progress(progress) => {
                ingest_debug!("job {}: {:?}", progress.job_id, progress.stage);
            }
            EngineEvent::ScrapeCompleted { job_id, result } => {
                pending -= 1;
                all_ok &= report(job_id, &cli.urls, result.map(|article| *article))?;
            }
        }
    }
    Ok(all_ok)
}

fn report(
    job_id: JobId,
    urls: &[String],
    result: Result<ingest_core::Article, ingest_engine::ScrapeError>,
) -> anyhow::Result<bool> {
    let url = usize::try_from(job_id - 1)
        .ok()
        .and_then(|index| urls.get(index))
        .map(String::as_str)
        .unwrap_or("?");
    match result {
        Ok(article) => {
            ingest_info!("job {}: done {}", job_id, url);
            println!("{}", serde_json::to_string(&ScrapeResponse { data: article })?);
            Ok(true)
        }
        Err(err) => {
            ingest_error!("job {}: {} failed: {}", job_id, url, err);
            Ok(false)
        }
    }
}
