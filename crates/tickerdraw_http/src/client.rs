use std::fmt::Debug;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Request, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tickerdraw_error::{DrawError, Result};

pub trait HttpClient: Sync + Send + Debug + Clone + 'static {
    type Response: HttpResponse;
    type RequestFuture: Future<Output = Result<Self::Response>> + Send + Unpin;

    /// Do the request.
    fn do_request(&self, request: Request) -> Self::RequestFuture;
}

pub trait HttpResponse: Send {
    type BytesFuture: Future<Output = Result<Bytes>> + Send + Unpin;

    fn status(&self) -> StatusCode;

    /// Collect the full response body.
    fn bytes(self) -> Self::BytesFuture;
}

/// Helper to set a json body on this request.
///
/// Overwrites the existing body and 'Content-Type' of the request.
pub fn set_json_body<T>(request: &mut Request, body: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(body)
        .map_err(|e| DrawError::transport("Failed to serialize request body to json", e))?;
    *request.body_mut() = Some(body.into());
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(())
}

/// Helper to read a json response.
///
/// This will collect the full response before trying to deserialize it.
pub async fn read_json<T>(resp: impl HttpResponse) -> Result<T>
where
    T: DeserializeOwned,
{
    let full = resp.bytes().await?;
    serde_json::from_slice(&full)
        .map_err(|e| DrawError::transport("Failed to deserialize response body as json", e))
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde::Deserialize;
    use url::Url;

    use super::*;
    use crate::stub::StubResponse;

    #[test]
    fn json_body_sets_content_type() {
        let mut request = Request::new(Method::POST, Url::parse("http://localhost/a").unwrap());
        set_json_body(&mut request, &serde_json::json!({"a": 1})).unwrap();

        assert_eq!("application/json", request.headers()[CONTENT_TYPE]);
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(br#"{"a":1}"#, body);
    }

    #[derive(Debug, Deserialize)]
    struct Token {
        token: String,
    }

    #[tokio::test]
    async fn read_json_decodes_body() {
        let resp = StubResponse::new(StatusCode::OK, r#"{"token":"abc"}"#);
        let token: Token = read_json(resp).await.unwrap();
        assert_eq!("abc", token.token);
    }

    #[tokio::test]
    async fn read_json_reports_decode_failure() {
        let resp = StubResponse::new(StatusCode::OK, "<html>");
        let err = read_json::<Token>(resp).await.unwrap_err();
        assert!(matches!(err, DrawError::Transport { .. }), "{err}");
    }
}
