//! Periodic expiry sweep for staged registration requests.
//!
//! A request left unapproved becomes eligible for deletion once it is
//! `ttl` old; the sweep interval bounds how long past that mark it can
//! survive. This server runs as a single process, so a plain interval task
//! owns the sweep.

use std::{sync::Arc, time::Duration};

use balangay_core::store::RegistryStore;
use chrono::Utc;

pub async fn run_expiry_sweep<S>(store: Arc<S>, every: Duration, ttl: chrono::Duration)
where
  S: RegistryStore,
{
  let mut ticker = tokio::time::interval(every);
  ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

  loop {
    ticker.tick().await;
    let cutoff = Utc::now() - ttl;
    match store.sweep_expired_requests(cutoff).await {
      Ok(0) => {}
      Ok(removed) => {
        tracing::info!("expired {removed} staged registration request(s)");
      }
      Err(e) => tracing::warn!("expiry sweep failed: {e}"),
    }
  }
}
