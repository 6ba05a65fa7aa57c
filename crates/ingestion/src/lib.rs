//! Background loop that tracks the upstream node's last irreversible block.
//!
//! Runs as a tokio task alongside the API server. Each cycle fetches
//! `get_dynamic_global_properties` and stores `last_irreversible_block_num` in the shared
//! [`IrreversibleBlock`] tracker, which the cache writer reads when resolving
//! "no expire if irreversible" rules.
//!
//! On any error the previous value is kept.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use rpcache_shared::irreversible::IrreversibleBlock;
use rpcache_shared::upstream::UpstreamClient;

/// Runs one poll: fetches the irreversible block number and stores it if it advanced.
///
/// Returns the stored value, or `None` if the fetch failed.
pub async fn poll_once(client: &UpstreamClient, tracker: &IrreversibleBlock) -> Option<u64> {
    let start = Instant::now();
    let before = tracker.get();

    match client.fetch_dynamic_global_properties().await {
        Ok(props) => {
            let num = props.last_irreversible_block_num;
            // never move backwards
            if num >= before {
                tracker.set(num);
            }
            tracing::debug!(
                job = "irreversible",
                head_block_number = props.head_block_number,
                last_irreversible_block_num = num,
                previous = before,
                duration_ms = start.elapsed().as_millis() as u64,
                outcome = "success",
                "polled last irreversible block"
            );
            Some(tracker.get())
        }
        Err(e) => {
            tracing::error!(
                job = "irreversible",
                upstream = client.url(),
                previous = before,
                outcome = "error",
                error = %e,
                "failed to fetch last irreversible block"
            );
            None
        }
    }
}

/// Main polling loop. Runs until the shutdown signal is received.
pub async fn run_irreversible_block_loop(
    client: UpstreamClient,
    tracker: Arc<IrreversibleBlock>,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        upstream = client.url(),
        "irreversible block poller started"
    );

    loop {
        poll_once(&client, &tracker).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                tracing::info!("irreversible block poller shutting down");
                return;
            }
        }
    }
}
