use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::SourceError;

/// Anything that can hand back the newest published card rows, unnormalized.
pub trait CardSource: Send + Sync {
    fn fetch_published(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Value>, SourceError>>;
}

/// Reads cards through the Supabase REST (PostgREST) endpoint.
pub struct SupabaseSource {
    client: reqwest::Client,
    config: SourceConfig,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    message: Option<String>,
}

impl SupabaseSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    /// `SELECT * FROM cards WHERE is_published = true ORDER BY created_at DESC LIMIT n`
    pub(crate) fn request(&self, limit: usize) -> reqwest::RequestBuilder {
        self.client
            .get(self.endpoint())
            .query(&[
                ("select", "*"),
                ("is_published", "eq.true"),
                ("order", "created_at.desc"),
            ])
            .query(&[("limit", limit)])
            .header("apikey", &self.config.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.anon_key))
            .header(ACCEPT, "application/json")
    }

    async fn get_published(&self, limit: usize) -> Result<Vec<Value>, SourceError> {
        log::debug!("requesting up to {limit} published cards from {}", self.endpoint());
        let res: reqwest::Response = self
            .request(limit)
            .send()
            .await
            .map_err(SourceError::Fetch)?;
        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<PostgrestError>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_default();
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let rows = res
            .json::<Option<Vec<Value>>>()
            .await
            .map_err(SourceError::Deserialize)?;
        Ok(rows.unwrap_or_default())
    }
}

impl CardSource for SupabaseSource {
    fn fetch_published(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Value>, SourceError>> {
        self.get_published(limit).boxed()
    }
}
