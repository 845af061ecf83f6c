//! Client for the J-Quants API.
//!
//! See <https://jpx.gitbook.io/j-quants-en/api-reference>

pub mod auth;
pub mod listed;

use tickerdraw_error::{DrawError, Result};
use url::Url;

use crate::client::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://api.jquants.com/v1";

#[derive(Debug, Clone)]
pub struct JQuantsClient<C: HttpClient> {
    client: C,
    base_url: Url,
}

impl<C> JQuantsClient<C>
where
    C: HttpClient,
{
    pub fn new(client: C, base_url: Url) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(DrawError::config(format!(
                "J-Quants base url cannot have paths appended: {base_url}"
            )));
        }
        Ok(JQuantsClient { client, base_url })
    }

    pub fn http_client(&self) -> &C {
        &self.client
    }

    /// Build the url for an endpoint below the base url.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DrawError::config(format!("Invalid J-Quants base url: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
