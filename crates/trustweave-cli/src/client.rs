//! Thin HTTP client for the node API.

use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use trustweave_core::Address;

/// Header naming the calling principal.
const CALLER_HEADER: &str = "x-caller";

/// Connection options shared by every networked subcommand.
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:9101")]
    pub endpoint: String,

    /// Address to act as (sent in the x-caller header).
    #[arg(long)]
    pub caller: Option<Address>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    kind: String,
}

pub struct NodeClient {
    endpoint: String,
    caller: Option<Address>,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(args: &NodeArgs) -> Self {
        Self {
            endpoint: args.endpoint.trim_end_matches('/').to_string(),
            caller: args.caller,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn caller(&self) -> anyhow::Result<Address> {
        self.caller
            .ok_or_else(|| anyhow::anyhow!("this command needs --caller <address>"))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let resp = self.http.get(&url).send().await.map_err(|e| self.unreachable(e))?;
        Self::decode(resp).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .header(CALLER_HEADER, self.caller()?.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(resp).await
    }

    /// POST without naming a caller, for read-only checks.
    pub async fn post_anonymous<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(resp).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "PUT");
        let resp = self
            .http
            .put(&url)
            .header(CALLER_HEADER, self.caller()?.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(resp).await
    }

    fn unreachable(&self, e: reqwest::Error) -> anyhow::Error {
        anyhow::anyhow!(
            "could not reach node at {}: {}\nIs the node running? Start it with: trustweave-node",
            self.endpoint,
            e
        )
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        match resp.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!("{} (HTTP {}, {})", err.error, status, err.kind),
            Err(_) => anyhow::bail!("request failed (HTTP {})", status),
        }
    }
}

/// Fields returned by every mutating endpoint.
#[derive(Debug, Deserialize)]
pub struct MutationResponse {
    pub last_event_seq: u64,
    pub events: u64,
    pub edge_id: Option<String>,
    pub proof_id: Option<String>,
    pub score: Option<u64>,
}
