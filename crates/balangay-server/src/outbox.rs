//! Outbox delivery worker.
//!
//! Drains `sync_outbox` on an interval and mirrors each envelope to the
//! sibling system with a POST per entity kind. Failures are recorded on the
//! envelope and retried on later ticks; the tick interval is the backoff.
//! Delivery is at-least-once and never blocks a local write.

use std::{sync::Arc, time::Duration};

use balangay_core::{store::RegistryStore, sync::SyncEnvelope};

const BATCH_SIZE: usize = 32;

pub async fn run_sync_worker<S>(store: Arc<S>, base_url: String, every: Duration)
where
  S: RegistryStore,
{
  let client = reqwest::Client::new();
  let mut ticker = tokio::time::interval(every);
  ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

  loop {
    ticker.tick().await;

    let batch = match store.pending_sync(BATCH_SIZE).await {
      Ok(batch) => batch,
      Err(e) => {
        tracing::warn!("outbox read failed: {e}");
        continue;
      }
    };

    for envelope in batch {
      match deliver(&client, &base_url, &envelope).await {
        Ok(()) => {
          if let Err(e) = store.mark_delivered(envelope.sync_id).await {
            tracing::warn!("failed to mark envelope {} delivered: {e}", envelope.sync_id);
          }
        }
        Err(reason) => {
          tracing::warn!(
            sync_id = envelope.sync_id,
            entity = %envelope.entity,
            attempts = envelope.attempts + 1,
            "sync delivery failed: {reason}"
          );
          if let Err(e) = store.record_sync_failure(envelope.sync_id, &reason).await {
            tracing::warn!("failed to record sync failure: {e}");
          }
        }
      }
    }
  }
}

async fn deliver(
  client: &reqwest::Client,
  base_url: &str,
  envelope: &SyncEnvelope,
) -> Result<(), String> {
  let url = format!("{}/sync/{}", base_url.trim_end_matches('/'), envelope.entity);
  let response = client
    .post(&url)
    .json(envelope)
    .send()
    .await
    .map_err(|e| e.to_string())?;
  if response.status().is_success() {
    Ok(())
  } else {
    Err(format!("HTTP {}", response.status()))
  }
}
