use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request, StatusCode};
use serde::{Deserialize, Serialize};
use tickerdraw_error::{DrawError, Result};
use tracing::debug;

use super::JQuantsClient;
use super::auth::AccessToken;
use crate::client::{HttpClient, HttpResponse, read_json};

/// A listed company as returned by `/listed/info`.
///
/// Field names match the API. Fields the API leaves out (some depend on the
/// subscription plan) are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompanyRecord {
    pub date: String,
    pub code: String,
    pub company_name: String,
    pub company_name_english: String,
    pub sector17_code: String,
    pub sector17_code_name: String,
    pub sector33_code: String,
    pub sector33_code_name: String,
    pub scale_category: String,
    pub market_code: String,
    pub market_code_name: String,
    pub margin_code: String,
    pub margin_code_name: String,
}

#[derive(Debug, Deserialize)]
struct ListedInfoResponse {
    info: Vec<CompanyRecord>,
}

impl<C> JQuantsClient<C>
where
    C: HttpClient,
{
    /// Fetch company info for a single code.
    ///
    /// Returns `None` when the API knows no company for the code.
    pub async fn fetch_company_info(
        &self,
        code: &str,
        token: &AccessToken,
    ) -> Result<Option<CompanyRecord>> {
        let mut url = self.endpoint(&["listed", "info"])?;
        url.query_pairs_mut().append_pair("code", code);

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|e| DrawError::api("token is not a valid header value").with_source(e))?;
        auth.set_sensitive(true);

        let mut request = Request::new(Method::GET, url);
        request.headers_mut().insert(AUTHORIZATION, auth);

        debug!(%code, "fetching listed company info");
        let resp = self
            .client
            .do_request(request)
            .await
            .map_err(|e| DrawError::api("request failed").with_source(e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(DrawError::api(format!("unexpected status {status}")));
        }

        let body: ListedInfoResponse = read_json(resp)
            .await
            .map_err(|e| DrawError::api("failed to decode response").with_source(e))?;
        debug!(%code, records = body.info.len(), "received listed company info");

        Ok(body.info.into_iter().next())
    }
}
