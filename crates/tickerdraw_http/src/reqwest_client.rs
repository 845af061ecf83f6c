use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Request, StatusCode};
use tickerdraw_error::{DrawError, Result};
use tracing::debug;

use crate::client::{HttpClient, HttpResponse};

/// Http client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestClient {
    /// Create a new client.
    ///
    /// Without a timeout, requests wait as long as reqwest's defaults allow.
    pub fn try_new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DrawError::transport("Failed to build http client", e))?;

        Ok(ReqwestClient { client, timeout })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl HttpClient for ReqwestClient {
    type Response = ReqwestResponse;
    type RequestFuture = BoxFuture<'static, Result<Self::Response>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        // Query strings may carry tokens, only log the path.
        debug!(method = %request.method(), path = %request.url().path(), "http request");
        self.client
            .execute(request)
            .map(|result| match result {
                Ok(resp) => Ok(ReqwestResponse(resp)),
                Err(e) => Err(DrawError::transport("Failed to send request", e)),
            })
            .boxed()
    }
}

#[derive(Debug)]
pub struct ReqwestResponse(reqwest::Response);

impl HttpResponse for ReqwestResponse {
    type BytesFuture = BoxFuture<'static, Result<Bytes>>;

    fn status(&self) -> StatusCode {
        self.0.status()
    }

    fn bytes(self) -> Self::BytesFuture {
        self.0
            .bytes()
            .map(|result| result.map_err(|e| DrawError::transport("Failed to read response", e)))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use tokio::net::TcpListener;
    use url::Url;

    use super::*;

    #[tokio::test]
    async fn request_times_out() {
        // Connections are accepted by the kernel but never answered.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = ReqwestClient::try_new(Some(Duration::from_millis(100))).unwrap();
        assert_eq!(Some(Duration::from_millis(100)), client.timeout());

        let url = Url::parse(&format!("http://{addr}/v1/listed/info")).unwrap();
        let err = client
            .do_request(Request::new(Method::GET, url))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DrawError::Transport { message: "Failed to send request", .. }),
            "{err}"
        );
    }
}
