//! Handler configuration.
//!
//! Everything is read once, when the function starts. Missing or malformed
//! values are reported as configuration errors before any request is made.

use std::time::Duration;

use tickerdraw_error::{DrawError, Result};
use tickerdraw_http::jquants::DEFAULT_BASE_URL;
use tickerdraw_http::jquants::auth::{AccessToken, AuthStrategy, Credentials};
use tracing::warn;
use url::Url;

use crate::response::ResponseMode;
use crate::sampler::SampleWindow;

pub const ENV_API_TOKEN: &str = "JQUANTS_API_TOKEN";
pub const ENV_EMAIL: &str = "JQUANTS_EMAIL";
pub const ENV_PASSWORD: &str = "JQUANTS_PASSWORD";
pub const ENV_BASE_URL: &str = "JQUANTS_BASE_URL";
pub const ENV_RESPONSE_MODE: &str = "TICKERDRAW_RESPONSE_MODE";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TICKERDRAW_HTTP_TIMEOUT_SECS";
pub const ENV_AWS_REGION: &str = "AWS_REGION";

pub const DEFAULT_REGION: &str = "ap-northeast-1";

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// `None` only when the response mode never calls the API.
    pub auth: Option<AuthStrategy>,
    pub response_mode: ResponseMode,
    pub base_url: Url,
    /// Applies to API requests and object store reads.
    pub http_timeout: Option<Duration>,
    pub region: String,
    pub window: SampleWindow,
}

impl HandlerConfig {
    /// Config with defaults for everything but auth and response mode.
    pub fn new(response_mode: ResponseMode, auth: Option<AuthStrategy>) -> Result<Self> {
        let config = HandlerConfig {
            auth,
            response_mode,
            base_url: Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| DrawError::config(format!("Invalid default base url: {e}")))?,
            http_timeout: None,
            region: DEFAULT_REGION.to_string(),
            window: SampleWindow::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key/value source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let response_mode = match get(ENV_RESPONSE_MODE) {
            Some(mode) => mode.parse()?,
            None => ResponseMode::default(),
        };

        let auth = match (get(ENV_API_TOKEN), get(ENV_EMAIL), get(ENV_PASSWORD)) {
            (Some(token), email, password) => {
                if email.is_some() || password.is_some() {
                    warn!("{ENV_API_TOKEN} is set, ignoring {ENV_EMAIL} and {ENV_PASSWORD}");
                }
                Some(AuthStrategy::Static(AccessToken::new(token)))
            }
            (None, Some(email), Some(password)) => {
                Some(AuthStrategy::Exchange(Credentials { email, password }))
            }
            (None, Some(_), None) => {
                return Err(DrawError::config(format!(
                    "{ENV_EMAIL} is set but {ENV_PASSWORD} is not"
                )));
            }
            (None, None, Some(_)) => {
                return Err(DrawError::config(format!(
                    "{ENV_PASSWORD} is set but {ENV_EMAIL} is not"
                )));
            }
            (None, None, None) => None,
        };

        let mut config = Self::new(response_mode, auth)?;

        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = Url::parse(&base_url).map_err(|e| {
                DrawError::config(format!("Invalid {ENV_BASE_URL} '{base_url}': {e}"))
            })?;
        }

        if let Some(secs) = get(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DrawError::config(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            config.http_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(region) = get(ENV_AWS_REGION) {
            config.region = region;
        }

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.response_mode.requires_api() && self.auth.is_none() {
            return Err(DrawError::config(format!(
                "Missing J-Quants credentials for response mode '{}': set {ENV_API_TOKEN}, or {ENV_EMAIL} and {ENV_PASSWORD}",
                self.response_mode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<HandlerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HandlerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_credentials_is_config_error() {
        let err = from_pairs(&[]).unwrap_err();
        assert!(matches!(err, DrawError::Config(_)), "{err}");

        let err = from_pairs(&[(ENV_RESPONSE_MODE, "summary")]).unwrap_err();
        assert!(matches!(err, DrawError::Config(_)), "{err}");
    }

    #[test]
    fn empty_values_count_as_missing() {
        let err = from_pairs(&[(ENV_API_TOKEN, ""), (ENV_EMAIL, " "), (ENV_PASSWORD, "")])
            .unwrap_err();
        assert!(matches!(err, DrawError::Config(_)), "{err}");
    }

    #[test]
    fn code_mode_needs_no_credentials() {
        let config = from_pairs(&[(ENV_RESPONSE_MODE, "code")]).unwrap();
        assert_eq!(ResponseMode::Code, config.response_mode);
        assert!(config.auth.is_none());
    }

    #[test]
    fn static_token() {
        let config = from_pairs(&[(ENV_API_TOKEN, "tok")]).unwrap();
        assert_eq!(
            Some(AuthStrategy::Static(AccessToken::new("tok"))),
            config.auth
        );
        assert_eq!(ResponseMode::Record, config.response_mode);
    }

    #[test]
    fn static_token_takes_precedence() {
        let config = from_pairs(&[
            (ENV_API_TOKEN, "tok"),
            (ENV_EMAIL, "user@example.com"),
            (ENV_PASSWORD, "hunter2"),
        ])
        .unwrap();
        assert!(matches!(config.auth, Some(AuthStrategy::Static(_))));
    }

    #[test]
    fn credential_exchange() {
        let config =
            from_pairs(&[(ENV_EMAIL, "user@example.com"), (ENV_PASSWORD, "hunter2")]).unwrap();
        assert_eq!(
            Some(AuthStrategy::Exchange(Credentials {
                email: "user@example.com".to_string(),
                password: "hunter2".to_string(),
            })),
            config.auth
        );
    }

    #[test]
    fn partial_credentials() {
        let err = from_pairs(&[(ENV_EMAIL, "user@example.com")]).unwrap_err();
        assert!(err.to_string().contains(ENV_PASSWORD), "{err}");

        let err = from_pairs(&[(ENV_PASSWORD, "hunter2")]).unwrap_err();
        assert!(err.to_string().contains(ENV_EMAIL), "{err}");
    }

    #[test]
    fn defaults() {
        let config = from_pairs(&[(ENV_API_TOKEN, "tok")]).unwrap();
        assert_eq!(DEFAULT_BASE_URL, config.base_url.as_str().trim_end_matches('/'));
        assert_eq!(DEFAULT_REGION, config.region);
        assert_eq!(None, config.http_timeout);
        assert_eq!(SampleWindow::default(), config.window);
    }

    #[test]
    fn overrides() {
        let config = from_pairs(&[
            (ENV_API_TOKEN, "tok"),
            (ENV_RESPONSE_MODE, "summary"),
            (ENV_BASE_URL, "http://localhost:9000/v1"),
            (ENV_HTTP_TIMEOUT_SECS, "15"),
            (ENV_AWS_REGION, "us-east-1"),
        ])
        .unwrap();
        assert_eq!(ResponseMode::Summary, config.response_mode);
        assert_eq!("http://localhost:9000/v1", config.base_url.as_str());
        assert_eq!(Some(Duration::from_secs(15)), config.http_timeout);
        assert_eq!("us-east-1", config.region);
    }

    #[test]
    fn malformed_values() {
        let err = from_pairs(&[(ENV_API_TOKEN, "tok"), (ENV_HTTP_TIMEOUT_SECS, "soon")])
            .unwrap_err();
        assert!(matches!(err, DrawError::Config(_)), "{err}");

        let err = from_pairs(&[(ENV_API_TOKEN, "tok"), (ENV_BASE_URL, "not a url")]).unwrap_err();
        assert!(matches!(err, DrawError::Config(_)), "{err}");

        let err = from_pairs(&[(ENV_API_TOKEN, "tok"), (ENV_RESPONSE_MODE, "xml")]).unwrap_err();
        assert!(matches!(err, DrawError::Config(_)), "{err}");
    }
}
