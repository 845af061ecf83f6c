//! Token exchange.
//!
//! Email and password are exchanged for a refresh token, which is then
//! exchanged for an ID token. The ID token is the bearer credential for the
//! rest of the API.

use std::fmt;

use reqwest::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tickerdraw_error::{AuthStage, DrawError, Result};
use tracing::{debug, info};

use super::JQuantsClient;
use crate::client::{HttpClient, HttpResponse, read_json, set_json_body};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<secret>")
            .finish()
    }
}

/// Bearer token for the J-Quants API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<secret>").finish()
    }
}

/// How an access token is acquired for an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Pre-issued token, used as is.
    Static(AccessToken),
    /// Full exchange on every invocation.
    Exchange(Credentials),
}

#[derive(Serialize)]
struct AuthUserRequest<'a> {
    mailaddress: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenResponse {
    refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenResponse {
    id_token: String,
}

impl<C> JQuantsClient<C>
where
    C: HttpClient,
{
    /// Get a token according to the strategy.
    ///
    /// Static tokens never touch the network.
    pub async fn access_token(&self, strategy: &AuthStrategy) -> Result<AccessToken> {
        match strategy {
            AuthStrategy::Static(token) => Ok(token.clone()),
            AuthStrategy::Exchange(credentials) => self.obtain_access_token(credentials).await,
        }
    }

    /// Exchange credentials for an ID token.
    ///
    /// Nothing is retried. A failure getting the refresh token means the
    /// second endpoint is never called.
    pub async fn obtain_access_token(&self, credentials: &Credentials) -> Result<AccessToken> {
        let refresh_token = self.fetch_refresh_token(credentials).await?;
        let id_token = self.fetch_id_token(&refresh_token).await?;
        info!("obtained id token");
        Ok(id_token)
    }

    async fn fetch_refresh_token(&self, credentials: &Credentials) -> Result<String> {
        let stage = AuthStage::Refresh;

        let url = self.endpoint(&["token", "auth_user"])?;
        let mut request = Request::new(Method::POST, url);
        set_json_body(
            &mut request,
            &AuthUserRequest {
                mailaddress: &credentials.email,
                password: &credentials.password,
            },
        )
        .map_err(|e| DrawError::auth(stage, "failed to encode credentials").with_source(e))?;

        let resp: RefreshTokenResponse = self.exchange(request, stage).await?;
        if resp.refresh_token.is_empty() {
            return Err(DrawError::auth(stage, "response contained an empty refresh token"));
        }
        debug!("obtained refresh token");

        Ok(resp.refresh_token)
    }

    async fn fetch_id_token(&self, refresh_token: &str) -> Result<AccessToken> {
        let stage = AuthStage::IdToken;

        let mut url = self.endpoint(&["token", "auth_refresh"])?;
        url.query_pairs_mut()
            .append_pair("refreshtoken", refresh_token);
        let request = Request::new(Method::POST, url);

        let resp: IdTokenResponse = self.exchange(request, stage).await?;
        if resp.id_token.is_empty() {
            return Err(DrawError::auth(stage, "response contained an empty id token"));
        }

        Ok(AccessToken(resp.id_token))
    }

    /// Send one token request and decode the json body.
    async fn exchange<T>(&self, request: Request, stage: AuthStage) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .client
            .do_request(request)
            .await
            .map_err(|e| DrawError::auth(stage, "request failed").with_source(e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(DrawError::auth(stage, format!("unexpected status {status}")));
        }

        read_json(resp)
            .await
            .map_err(|e| DrawError::auth(stage, "failed to decode response").with_source(e))
    }
}
