//! libcurl-backed transport.
//!
//! Runs in the current thread; call from `spawn_blocking` if used from async code.

use std::str;
use std::time::Duration;

use curl::easy::{Easy, List};

use super::parse::parse_headers;
use super::Transport;
use crate::request::{Method, RequestContext};
use crate::response::Response;
use crate::retry::{TransportError, TransportErrorKind};

const CURLE_WEIRD_SERVER_REPLY: i32 = 8;
const CURLE_HTTP2: i32 = 16;
const CURLE_HTTP2_STREAM: i32 = 92;

/// Blocking curl transport; one `Easy` handle per attempt.
#[derive(Debug, Clone, Copy)]
pub struct CurlTransport {
    pub connect_timeout: Duration,
    /// Whole-transfer timeout for one attempt.
    pub timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

impl CurlTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    fn configure(&self, easy: &mut Easy, request: &RequestContext) -> Result<(), curl::Error> {
        easy.url(request.target())?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        match request.method() {
            Method::Get => easy.get(true)?,
            Method::Post => easy.post(true)?,
            Method::Put => easy.custom_request("PUT")?,
            Method::Delete => easy.custom_request("DELETE")?,
        }
        match request.body_bytes() {
            Some(body) => {
                easy.post_fields_copy(body)?;
                // Setting post fields switches the verb to POST.
                if request.method() == Method::Get {
                    easy.custom_request("GET")?;
                }
            }
            None if request.method() == Method::Post => easy.post_field_size(0)?,
            None => {}
        }

        let mut list = List::new();
        for (k, v) in request.headers() {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        // Small JSON bodies never benefit from a 100-continue round trip.
        list.append("Expect:")?;
        easy.http_headers(list)?;
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn send(&self, request: &RequestContext) -> Result<Response, TransportError> {
        let mut easy = Easy::new();
        self.configure(&mut easy, request).map_err(to_transport_error)?;

        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        header_lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(to_transport_error)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(to_transport_error)?;
            transfer.perform()
        };
        if let Err(e) = performed {
            let connected = reached_server(&mut easy);
            return Err(TransportError::with_source(
                classify_perform_error(&e, connected),
                e,
            ));
        }

        let status = easy.response_code().map_err(to_transport_error)?;
        if status == 0 {
            return Err(TransportError::new(
                TransportErrorKind::MalformedResponse,
                "no HTTP status received",
            ));
        }
        let status = u16::try_from(status).map_err(|_| {
            TransportError::new(
                TransportErrorKind::MalformedResponse,
                format!("status code out of range: {}", status),
            )
        })?;

        Ok(Response {
            status,
            headers: parse_headers(&header_lines),
            body,
        })
    }
}

fn to_transport_error(e: curl::Error) -> TransportError {
    TransportError::with_source(classify_curl_error(&e), e)
}

/// True once a connection to the peer was established for this handle.
fn reached_server(easy: &mut Easy) -> bool {
    let has_ip = matches!(easy.primary_ip(), Ok(Some(ip)) if !ip.is_empty());
    let connect_time = easy.connect_time().unwrap_or(Duration::ZERO);
    has_ip || !connect_time.is_zero()
}

/// Classify a failed transfer, given whether the peer was reached.
///
/// curl reports an unparseable status line ("HTTP/0.9 not allowed", bad
/// HTTP/1 subversion) as an unsupported protocol. Before a connection that
/// code means a bad URL scheme; after one it means the server's reply was
/// malformed.
pub(crate) fn classify_perform_error(e: &curl::Error, connected: bool) -> TransportErrorKind {
    if connected && e.is_unsupported_protocol() {
        return TransportErrorKind::MalformedResponse;
    }
    classify_curl_error(e)
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> TransportErrorKind {
    if e.is_operation_timedout() {
        return TransportErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_ssl_connect_error()
    {
        return TransportErrorKind::Connect;
    }
    if e.is_got_nothing() || e.is_recv_error() || e.is_send_error() || e.is_read_error() {
        return TransportErrorKind::ConnectionAborted;
    }
    let code = e.code() as i32;
    if e.is_partial_file()
        || code == CURLE_WEIRD_SERVER_REPLY
        || code == CURLE_HTTP2
        || code == CURLE_HTTP2_STREAM
    {
        return TransportErrorKind::MalformedResponse;
    }
    TransportErrorKind::Other
}
