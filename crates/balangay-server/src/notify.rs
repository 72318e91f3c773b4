//! Push-gateway notifier.
//!
//! Delivery is always fire-and-forget from the caller's perspective; this
//! impl reports failures so the dispatcher can log them, nothing more. With
//! no gateway configured, drafts are logged and dropped.

use balangay_core::{
  Error, Result,
  notify::{NotificationDraft, Notifier},
};

#[derive(Clone)]
pub struct PushGateway {
  client: reqwest::Client,
  url:    Option<String>,
}

impl PushGateway {
  pub fn new(url: Option<String>) -> Self {
    Self { client: reqwest::Client::new(), url }
  }
}

impl Notifier for PushGateway {
  async fn deliver(&self, draft: &NotificationDraft) -> Result<()> {
    let Some(url) = &self.url else {
      tracing::info!(
        title = %draft.title,
        recipients = draft.recipients.len(),
        "notification dropped (no push gateway configured)"
      );
      return Ok(());
    };

    let response = self
      .client
      .post(url)
      .json(draft)
      .send()
      .await
      .map_err(|e| Error::External(e.to_string()))?;
    if !response.status().is_success() {
      return Err(Error::External(format!(
        "push gateway returned {}",
        response.status()
      )));
    }
    Ok(())
  }
}
