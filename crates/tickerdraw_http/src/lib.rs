pub mod client;
pub mod jquants;
pub mod reqwest_client;

#[cfg(any(test, feature = "testing"))]
pub mod stub;

// Re-export some types to use with the http client.
pub use reqwest::{Method, Request, StatusCode};
