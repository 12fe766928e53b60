//! Ingestion feed worker.
//!
//! The feed transport (broker connections, offsets, partitions) lives outside
//! this service; payloads arrive as raw bytes on a bounded channel and are
//! processed one at a time. Delivery is at-least-once, so the same logical
//! order may arrive more than once; a redelivered uid is skipped.
//!
//! There is no retry policy here: a failed payload is logged and dropped.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::services::{OrderError, OrderService};

/// Consume feed payloads until every sender is dropped.
///
/// Error triage per payload:
/// - decode failure: warn and discard (a malformed payload can never succeed)
/// - duplicate uid: skip (at-least-once redelivery of an order we have)
/// - anything else: log and discard
pub async fn run(service: OrderService, mut feed: mpsc::Receiver<Vec<u8>>) {
    info!("ingestion feed worker started");

    while let Some(payload) = feed.recv().await {
        match service.process_message(&payload).await {
            Ok(order_uid) => {
                info!(%order_uid, "order ingested");
            }
            Err(OrderError::Decode(e)) => {
                warn!(error = %e, "discarding malformed payload");
            }
            Err(OrderError::Duplicate(order_uid)) => {
                info!(%order_uid, "skipping redelivered order");
            }
            Err(e) => {
                error!(error = %e, "failed to ingest payload");
            }
        }
    }

    info!("ingestion feed closed, worker exiting");
}
