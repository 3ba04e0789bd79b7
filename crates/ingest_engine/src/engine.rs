use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ingest_logging::{ingest_error, ingest_warn};

use crate::fetch::ChannelProgressSink;
use crate::{EngineEvent, JobId, Scraper};

enum EngineCommand {
    Enqueue { job_id: JobId, url: String },
}

/// Runs scrapes on a background tokio runtime and reports through a channel.
///
/// Jobs run concurrently; each job is still strictly sequential inside.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(scraper: Scraper) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let scraper = Arc::new(scraper);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    ingest_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let scraper = scraper.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(scraper.as_ref(), command, event_tx).await;
                });
            }
            // Let in-flight jobs finish once the handle is gone.
            runtime.shutdown_timeout(Duration::from_secs(60));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn enqueue(&self, job_id: JobId, url: impl Into<String>) {
        if self
            .cmd_tx
            .send(EngineCommand::Enqueue {
                job_id,
                url: url.into(),
            })
            .is_err()
        {
            ingest_warn!("engine stopped; job {} dropped", job_id);
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event; `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

async fn handle_command(
    scraper: &Scraper,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Enqueue { job_id, url } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = scraper.scrape(job_id, &url, &sink).await.map(Box::new);
            let _ = event_tx.send(EngineEvent::ScrapeCompleted { job_id, result });
        }
    }
}
