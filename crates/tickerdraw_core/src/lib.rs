pub mod config;
pub mod handler;
pub mod response;
pub mod sampler;
pub mod storage;

pub use handler::{Handler, InvocationRequest};
pub use response::{InvocationOutput, ResponseMode};
