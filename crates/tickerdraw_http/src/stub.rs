//! Canned-response http client.

use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Request, StatusCode};
use tickerdraw_error::{DrawError, Result};
use url::Url;

use crate::client::{HttpClient, HttpResponse};

/// A request as seen by the stub client.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub authorization: Option<String>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    status: StatusCode,
    body: Bytes,
}

impl StubResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        StubResponse {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, value: serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }
}

impl HttpResponse for StubResponse {
    type BytesFuture = Ready<Result<Bytes>>;

    fn status(&self) -> StatusCode {
        self.status
    }

    fn bytes(self) -> Self::BytesFuture {
        ready(Ok(self.body))
    }
}

#[derive(Debug, Clone)]
enum Route {
    Respond(StubResponse),
    /// Fail as if the connection was reset before a response arrived.
    Fail,
}

/// Http client answering from a fixed route table.
///
/// Routes are matched on method and url path, the query string is ignored.
/// Unmatched requests get a 404. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct StubHttpClient {
    routes: Arc<Mutex<HashMap<(Method, String), Route>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, method: Method, path: &str, response: StubResponse) -> Self {
        self.routes
            .lock()
            .insert((method, path.to_string()), Route::Respond(response));
        self
    }

    /// Make requests to `path` fail with a transport error.
    pub fn with_failure(self, method: Method, path: &str) -> Self {
        self.routes
            .lock()
            .insert((method, path.to_string()), Route::Fail);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests made to `path`.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.path() == path)
            .count()
    }
}

impl HttpClient for StubHttpClient {
    type Response = StubResponse;
    type RequestFuture = Ready<Result<StubResponse>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        let recorded = RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            authorization: request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: request.body().and_then(|b| b.as_bytes()).map(<[u8]>::to_vec),
        };

        let key = (recorded.method.clone(), recorded.url.path().to_string());
        self.requests.lock().push(recorded);

        let route = self.routes.lock().get(&key).cloned();
        match route {
            Some(Route::Respond(resp)) => ready(Ok(resp)),
            Some(Route::Fail) => ready(Err(DrawError::transport(
                "Failed to send request",
                std::io::Error::other("connection reset"),
            ))),
            None => ready(Ok(StubResponse::new(StatusCode::NOT_FOUND, ""))),
        }
    }
}
