//! Supervised background worker for local dispatch execution.
//!
//! One job at a time, in queue order. Failures are recorded on the job
//! and logged; they never take the worker down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::dispatch::orchestrator::Orchestrator;

/// Spawn the worker loop that drains the local-execution channel.
pub fn spawn(
    orchestrator: Arc<Orchestrator>,
    mut local_rx: mpsc::Receiver<i64>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("dispatch worker started");
        loop {
            let job_id = tokio::select! {
                () = cancel.cancelled() => break,
                received = local_rx.recv() => match received {
                    Some(id) => id,
                    None => break,
                },
            };

            let span = info_span!("dispatch_job", job_id);
            if let Err(err) = orchestrator.process_job(job_id).instrument(span).await {
                error!(job_id, %err, "dispatch job processing failed");
            }
        }
        info!("dispatch worker exiting");
    })
}
