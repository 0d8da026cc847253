//! Echo persistence from the client side.
//!
//! Saves are fire-and-forget: each collected echo spawns its own task, with
//! no retry, no ordering between saves and no cancellation. The outcome comes
//! back over a channel so the HUD can show it.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use echo_shared::api::{
    ErrorBody, InventoryResponse, SaveEchoRequest, SaveEchoResponse, INVENTORY_PREFIX,
    SAVE_ECHO_PATH,
};
use reqwest::Url;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

/// Where collected echoes go.
#[async_trait]
pub trait EchoSink: Send + Sync {
    async fn save(&self, req: &SaveEchoRequest) -> anyhow::Result<SaveEchoResponse>;
}

/// Posts echoes to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEchoSink {
    http: reqwest::Client,
    base: Url,
}

impl HttpEchoSink {
    pub fn new(api_base: &str) -> anyhow::Result<Self> {
        let base = Url::parse(api_base).with_context(|| format!("parse api base {api_base}"))?;
        anyhow::ensure!(!base.cannot_be_a_base(), "api base {api_base} is not a base url");
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn save_url(&self) -> anyhow::Result<Url> {
        self.base.join(SAVE_ECHO_PATH).context("build save url")
    }

    fn inventory_url(&self, user_id: &str) -> anyhow::Result<Url> {
        let mut url = self.base.join(INVENTORY_PREFIX).context("build inventory url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("api base is not a base url"))?
            .push(user_id);
        Ok(url)
    }

    /// Reads a user's inventory.
    pub async fn inventory(&self, user_id: &str) -> anyhow::Result<InventoryResponse> {
        let res = self
            .http
            .get(self.inventory_url(user_id)?)
            .send()
            .await
            .context("inventory request")?;
        decode(res).await
    }
}

#[async_trait]
impl EchoSink for HttpEchoSink {
    async fn save(&self, req: &SaveEchoRequest) -> anyhow::Result<SaveEchoResponse> {
        let res = self
            .http
            .post(self.save_url()?)
            .json(req)
            .send()
            .await
            .context("save request")?;
        decode(res).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> anyhow::Result<T> {
    let status = res.status();
    if !status.is_success() {
        let reason = match res.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        anyhow::bail!("server replied {status}: {reason}");
    }
    res.json().await.context("decode response")
}

/// Result of one background save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { count: usize },
    Failed { error: String },
}

/// Spawns a save and reports its outcome on `outcomes`.
///
/// A closed receiver is not an error: the game may have ended first.
pub fn spawn_save(
    sink: Arc<dyn EchoSink>,
    req: SaveEchoRequest,
    outcomes: mpsc::UnboundedSender<SaveOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = match sink.save(&req).await {
            Ok(res) => {
                debug!(count = res.count, "Echo saved");
                SaveOutcome::Saved { count: res.count }
            }
            Err(e) => {
                warn!(error = %e, "Echo save failed");
                SaveOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        let _ = outcomes.send(outcome);
    })
}
