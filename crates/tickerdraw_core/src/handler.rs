use rand::Rng;
use serde::{Deserialize, Serialize};
use tickerdraw_error::{DrawError, Result};
use tickerdraw_http::client::HttpClient;
use tickerdraw_http::jquants::JQuantsClient;
use tickerdraw_http::reqwest_client::ReqwestClient;
use tracing::info;

use crate::config::HandlerConfig;
use crate::response::{InvocationOutput, build_output};
use crate::sampler::{invocation_rng, sample_code};
use crate::storage::{S3StoreProvider, StoreProvider, fetch_object};

/// Event payload the function is invoked with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub bucket: String,
    pub key: String,
}

/// Runs the draw pipeline for each invocation.
///
/// Holds no per-invocation state. Tokens and generators are created fresh
/// for every call.
#[derive(Debug)]
pub struct Handler<C: HttpClient, S: StoreProvider> {
    config: HandlerConfig,
    api: JQuantsClient<C>,
    stores: S,
}

/// Handler talking to the real API and S3.
pub type S3Handler = Handler<ReqwestClient, S3StoreProvider>;

impl S3Handler {
    pub fn try_from_config(config: HandlerConfig) -> Result<Self> {
        let client = ReqwestClient::try_new(config.http_timeout)?;
        let stores = S3StoreProvider::new(config.region.clone(), config.http_timeout);
        Self::try_new(config, client, stores)
    }
}

impl<C, S> Handler<C, S>
where
    C: HttpClient,
    S: StoreProvider,
{
    pub fn try_new(config: HandlerConfig, client: C, stores: S) -> Result<Self> {
        let window = &config.window;
        if window.first_row > window.last_row {
            return Err(DrawError::config(format!(
                "Sample window starts after it ends: rows {}..={}",
                window.first_row, window.last_row
            )));
        }

        let api = JQuantsClient::new(client, config.base_url.clone())?;
        Ok(Handler {
            config,
            api,
            stores,
        })
    }

    /// Handle one invocation with a freshly seeded generator.
    pub async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutput> {
        let mut rng = invocation_rng();
        self.invoke_with_rng(request, &mut rng).await
    }

    /// Handle one invocation, drawing the code with `rng`.
    pub async fn invoke_with_rng<R>(
        &self,
        request: InvocationRequest,
        rng: &mut R,
    ) -> Result<InvocationOutput>
    where
        R: Rng,
    {
        let mode = self.config.response_mode;
        info!(bucket = %request.bucket, key = %request.key, %mode, "handling invocation");

        let token = if mode.requires_api() {
            let strategy = self.config.auth.as_ref().ok_or_else(|| {
                DrawError::config(format!("Response mode '{mode}' requires J-Quants credentials"))
            })?;
            Some(self.api.access_token(strategy).await?)
        } else {
            None
        };

        let buf = fetch_object(&self.stores, &request.bucket, &request.key).await?;
        let code = sample_code(&buf, &self.config.window, rng)?;
        info!(%code, "drew code");

        let record = match &token {
            Some(token) => self.api.fetch_company_info(&code, token).await?,
            None => None,
        };

        build_output(mode, code, record)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{ENV_HTTP_TIMEOUT_SECS, ENV_RESPONSE_MODE};

    #[test]
    fn timeout_reaches_both_clients() {
        let config = HandlerConfig::from_lookup(|key| match key {
            ENV_RESPONSE_MODE => Some("code".to_string()),
            ENV_HTTP_TIMEOUT_SECS => Some("7".to_string()),
            _ => None,
        })
        .unwrap();

        let handler = S3Handler::try_from_config(config).unwrap();
        assert_eq!(Some(Duration::from_secs(7)), handler.api.http_client().timeout());
        assert_eq!(Some(Duration::from_secs(7)), handler.stores.timeout());
    }

    #[test]
    fn no_timeout_by_default() {
        let config = HandlerConfig::from_lookup(|key| match key {
            ENV_RESPONSE_MODE => Some("code".to_string()),
            _ => None,
        })
        .unwrap();

        let handler = S3Handler::try_from_config(config).unwrap();
        assert_eq!(None, handler.api.http_client().timeout());
        assert_eq!(None, handler.stores.timeout());
    }
}
