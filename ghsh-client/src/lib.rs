//! HTTP plumbing for talking to the completion service.

mod error;
mod request;
mod transport;

pub use crate::error::TransportError;
pub use crate::request::Request;
pub use crate::request::Response;
pub use crate::transport::HttpTransport;
pub use crate::transport::ReqwestTransport;
