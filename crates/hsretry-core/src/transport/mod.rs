//! Send primitive: one network attempt, returns a response or a transport error.
//!
//! Implementations must not turn 4xx/5xx statuses into errors; the executor
//! decides what a status means for the request.

mod http;
mod parse;

pub use self::http::{classify_curl_error, CurlTransport};

use std::sync::Arc;

use crate::request::RequestContext;
use crate::response::Response;
use crate::retry::TransportError;

pub trait Transport: Send + Sync {
    fn send(&self, request: &RequestContext) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &RequestContext) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &RequestContext) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &RequestContext) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}
