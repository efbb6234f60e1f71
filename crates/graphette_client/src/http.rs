//! Minimal HTTP/1.1 over TCP sockets.
//!
//! Speaks just enough HTTP for a GraphQL exchange, which avoids pulling in a
//! full HTTP client stack. Plain `http://` only; the response is parsed in
//! full (status line, headers, chunked bodies) because the classifier wants
//! all of it, not just a happy-path body.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// A fully parsed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Transport-level failure, before any GraphQL interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum HttpError {
    /// Unusable URL: malformed, or a scheme this client does not speak.
    #[error("bad url: {0}")]
    BadUrl(String),
    #[error("request timed out")]
    Timeout,
    /// Connection, read, or response-framing failure, with the reason.
    #[error("network failure: {0}")]
    Network(String),
}

pub(crate) struct HttpClient {
    timeout: Duration,
}

impl HttpClient {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub(crate) async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        self.request("POST", url, Some(body), headers).await
    }

    pub(crate) async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        self.request("GET", url, None, headers).await
    }

    async fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        let (host, port, path) = parse_url(url)?;

        let connect = TcpStream::connect(format!("{host}:{port}"));
        let mut stream = timeout(self.timeout, connect)
            .await
            .map_err(|_| HttpError::Timeout)?
            .map_err(|e| HttpError::Network(format!("connection failed: {e}")))?;

        let mut request = format!(
            "{method} {path} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Connection: close\r\n"
        );
        for (key, value) in headers {
            request.push_str(&format!("{key}: {value}\r\n"));
        }
        if let Some(body) = body {
            request.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n",
                body.len()
            ));
        }
        request.push_str("\r\n");
        if let Some(body) = body {
            request.push_str(body);
        }

        trace!(method, url, "sending http request");

        let write = stream.write_all(request.as_bytes());
        timeout(self.timeout, write)
            .await
            .map_err(|_| HttpError::Timeout)?
            .map_err(|e| HttpError::Network(format!("write failed: {e}")))?;

        let mut response_bytes = Vec::new();
        let read = stream.read_to_end(&mut response_bytes);
        timeout(self.timeout, read)
            .await
            .map_err(|_| HttpError::Timeout)?
            .map_err(|e| HttpError::Network(format!("read failed: {e}")))?;

        parse_http_response(&String::from_utf8_lossy(&response_bytes))
    }
}

/// Splits a URL into host, port, and path. Plain HTTP only.
pub(crate) fn parse_url(url: &str) -> Result<(String, u16, String), HttpError> {
    let url = url.trim();

    let without_protocol = if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else if url.starts_with("https://") {
        // TLS is out of reach for a raw TCP client; terminate it in front.
        return Err(HttpError::BadUrl(url.to_owned()));
    } else if url.contains("://") {
        return Err(HttpError::BadUrl(url.to_owned()));
    } else {
        url
    };

    let (host_port, path) = match without_protocol.find('/') {
        Some(slash) => (
            &without_protocol[..slash],
            &without_protocol[slash..],
        ),
        None => (without_protocol, "/"),
    };

    if host_port.is_empty() {
        return Err(HttpError::BadUrl(url.to_owned()));
    }

    let (host, port) = match host_port.rfind(':') {
        Some(colon) => {
            let port = host_port[colon + 1..]
                .parse()
                .map_err(|_| HttpError::BadUrl(url.to_owned()))?;
            (host_port[..colon].to_owned(), port)
        }
        None => (host_port.to_owned(), 80),
    };

    Ok((host, port, path.to_owned()))
}

/// Parses a raw HTTP response into status, headers, and body.
pub(crate) fn parse_http_response(raw: &str) -> Result<HttpResponse, HttpError> {
    let (head, body) = match raw.find("\r\n\r\n") {
        Some(at) => (&raw[..at], &raw[at + 4..]),
        None => match raw.find("\n\n") {
            Some(at) => (&raw[..at], &raw[at + 2..]),
            None => return Err(HttpError::Network("no header/body separator".to_owned())),
        },
    };

    let mut lines = head.lines();
    let status_line = lines
        .next()
        .ok_or_else(|| HttpError::Network("empty response".to_owned()))?;

    // "HTTP/1.1 200 OK"
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let status_code: u16 = parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| HttpError::Network(format!("malformed status line: {status_line}")))?;
    let status_text = parts.next().unwrap_or("").to_owned();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_owned(), value.trim().to_owned());
        }
    }

    let chunked = headers.iter().any(|(name, value)| {
        name.eq_ignore_ascii_case("transfer-encoding")
            && value.to_ascii_lowercase().contains("chunked")
    });
    let body = if chunked {
        parse_chunked_body(body)
    } else {
        body.to_owned()
    };

    Ok(HttpResponse {
        status_code,
        status_text,
        headers,
        body,
    })
}

/// Reassembles a chunked transfer-encoding body.
fn parse_chunked_body(body: &str) -> String {
    let mut result = String::new();
    let mut remaining = body;

    loop {
        let Some(size_end) = remaining.find("\r\n").or_else(|| remaining.find('\n')) else {
            break;
        };
        let size_str = remaining[..size_end].trim();

        let chunk_size = usize::from_str_radix(size_str, 16).unwrap_or(0);
        if chunk_size == 0 {
            break;
        }

        let data_start = if remaining[size_end..].starts_with("\r\n") {
            size_end + 2
        } else {
            size_end + 1
        };

        if data_start + chunk_size > remaining.len() {
            result.push_str(&remaining[data_start..]);
            break;
        }

        result.push_str(&remaining[data_start..data_start + chunk_size]);
        remaining = &remaining[data_start + chunk_size..];

        if let Some(rest) = remaining.strip_prefix("\r\n") {
            remaining = rest;
        } else if let Some(rest) = remaining.strip_prefix('\n') {
            remaining = rest;
        }
    }

    result
}

/// Percent-encodes a query-string component (RFC 3986 unreserved set).
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
