//! Setup form server over a plain TCP listener.
//!
//! Implements [`HttpServerPort`] with `std::net`, which ESP-IDF provides
//! through lwIP, so the same code serves the captive portal on the device
//! and runs against loopback in host tests.
//!
//! The listener is non-blocking: [`poll_request`](HttpServerPort::poll_request)
//! returns `Ok(None)` at once when no client is waiting.  An accepted client
//! is read with blocking reads until the whole request is in, so one request
//! is handled per poll.  The whole request must arrive within
//! `CLIENT_READ_TIMEOUT` of the accept; a slower client gets a 400.  Every
//! response closes the connection.
//!
//! Arguments come from the query string and, for
//! `application/x-www-form-urlencoded` bodies, from the body, in that
//! order.  Oversized or unparsable requests are answered with 400 and
//! dropped before they reach the portal.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::ports::{HttpMethod, HttpRequest, HttpResponse, HttpServerPort, ServerError};

/// Largest accepted header block, request line included.
pub const MAX_HEADER_LEN: usize = 2048;
/// Largest accepted form body.
pub const MAX_BODY_LEN: usize = 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Budget for reading one whole request, counted from the accept.
const CLIENT_READ_TIMEOUT: Duration = Duration::from_millis(500);

pub struct TcpFormServer {
    listener: Option<TcpListener>,
    /// Client whose request was handed out and not yet answered.
    pending: Option<TcpStream>,
    read_timeout: Duration,
}

impl Default for TcpFormServer {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpFormServer {
    pub fn new() -> Self {
        Self {
            listener: None,
            pending: None,
            read_timeout: CLIENT_READ_TIMEOUT,
        }
    }

    /// Bound address, once listening.  Useful when started on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Read one request from `stream`.  Malformed input is answered with
    /// 400 here and never reaches the caller.
    fn read_request(&self, stream: &mut TcpStream) -> Result<HttpRequest, ServerError> {
        let deadline = Instant::now() + self.read_timeout;
        stream.set_nonblocking(false).map_err(|_| ServerError::Io)?;

        let mut buf = Vec::with_capacity(512);
        let mut chunk = [0u8; 256];
        let header_end = loop {
            if let Some(end) = find_header_end(&buf) {
                break end;
            }
            if buf.len() > MAX_HEADER_LEN {
                return reject(stream, "header too large");
            }
            let n = match read_before(stream, &mut chunk, deadline) {
                Ok(0) => return Err(ServerError::Io),
                Ok(n) => n,
                Err(e) if is_timeout(&e) => return reject(stream, "request timed out"),
                Err(_) => return Err(ServerError::Io),
            };
            buf.extend_from_slice(&chunk[..n]);
        };
        if header_end > MAX_HEADER_LEN {
            return reject(stream, "header too large");
        }

        let Ok(header) = core::str::from_utf8(&buf[..header_end]) else {
            return reject(stream, "header not UTF-8");
        };
        let content_length = match parse_content_length(header) {
            Ok(len) => len.unwrap_or(0),
            Err(reason) => return reject(stream, reason),
        };
        if content_length > MAX_BODY_LEN {
            return reject(stream, "body too large");
        }

        let body_start = header_end + 4;
        let mut body = buf[body_start..].to_vec();
        while body.len() < content_length {
            let n = match read_before(stream, &mut chunk, deadline) {
                Ok(0) => return Err(ServerError::Io),
                Ok(n) => n,
                Err(e) if is_timeout(&e) => return reject(stream, "request timed out"),
                Err(_) => return Err(ServerError::Io),
            };
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);

        match parse_request(header, &body) {
            Ok(request) => Ok(request),
            Err(_) => reject(stream, "bad request line"),
        }
    }
}

impl HttpServerPort for TcpFormServer {
    fn begin(&mut self, port: u16) -> Result<(), ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|e| {
            warn!("HttpServer: bind to port {} failed — {}", port, e);
            ServerError::BindFailed
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| ServerError::BindFailed)?;
        info!("HttpServer: listening on {:?}", listener.local_addr().ok());
        self.listener = Some(listener);
        Ok(())
    }

    fn poll_request(&mut self) -> Result<Option<HttpRequest>, ServerError> {
        // An unanswered client is closed by the next poll.
        self.pending = None;

        let Some(listener) = self.listener.as_ref() else {
            return Ok(None);
        };
        let (mut stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => {
                warn!("HttpServer: accept failed — {}", e);
                return Err(ServerError::Io);
            }
        };

        let request = self.read_request(&mut stream)?;
        debug!("HttpServer: {:?} {} from {}", request.method, request.path, peer);
        self.pending = Some(stream);
        Ok(Some(request))
    }

    fn respond(&mut self, response: &HttpResponse) -> Result<(), ServerError> {
        let mut stream = self.pending.take().ok_or(ServerError::NoPendingRequest)?;
        write_response(&mut stream, response)
    }
}

/// One read, bounded by the time left until `deadline`.
fn read_before(stream: &mut TcpStream, buf: &mut [u8], deadline: Instant) -> io::Result<usize> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(ErrorKind::TimedOut.into());
    }
    stream.set_read_timeout(Some(remaining))?;
    stream.read(buf)
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

fn reject<T>(stream: &mut TcpStream, reason: &'static str) -> Result<T, ServerError> {
    warn!("HttpServer: rejecting request — {}", reason);
    let _ = write_response(stream, &HttpResponse::status(400));
    Err(ServerError::MalformedRequest)
}

fn write_response(stream: &mut TcpStream, response: &HttpResponse) -> Result<(), ServerError> {
    let body = response.body.unwrap_or("");
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status,
        reason_phrase(response.status)
    );
    if let Some(content_type) = response.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));
    stream
        .write_all(head.as_bytes())
        .and_then(|()| stream.write_all(body.as_bytes()))
        .and_then(|()| stream.flush())
        .map_err(|_| ServerError::Io)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}

// ───────────────────────────────────────────────────────────────
// Request parsing
// ───────────────────────────────────────────────────────────────

pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Decode a header block (without the blank line) plus its body.
pub fn parse_request(header: &str, body: &[u8]) -> Result<HttpRequest, ServerError> {
    let (method, target) = parse_request_line(header).ok_or(ServerError::MalformedRequest)?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let mut args = query.map(decode_form).unwrap_or_default();
    let is_form = header_value(header, "content-type")
        .is_some_and(|v| v.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE));
    if is_form && !body.is_empty() {
        let body = core::str::from_utf8(body).map_err(|_| ServerError::MalformedRequest)?;
        args.extend(decode_form(body));
    }

    Ok(HttpRequest {
        method: HttpMethod::parse(method),
        path: path.to_string(),
        args,
    })
}

fn parse_request_line(header: &str) -> Option<(&str, &str)> {
    let first_line = header.lines().next()?;
    let mut parts = first_line.split_ascii_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let _version = parts.next()?;
    Some((method, target))
}

fn parse_content_length(header: &str) -> Result<Option<usize>, &'static str> {
    let mut content_length = None;

    for line in header.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("content-length") {
            continue;
        }
        let parsed = value
            .trim()
            .parse::<usize>()
            .map_err(|_| "invalid content-length")?;
        if content_length.is_some() {
            return Err("duplicate content-length");
        }
        content_length = Some(parsed);
    }

    Ok(content_length)
}

fn header_value<'a>(header: &'a str, wanted_name: &str) -> Option<&'a str> {
    header.lines().skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(wanted_name)
            .then_some(value.trim())
    })
}

/// Split `a=1&b=2` into decoded pairs.  `+` is a space; a field without
/// `=` has an empty value; empty fields are skipped.
pub fn decode_form(encoded: &str) -> Vec<(String, String)> {
    encoded
        .split('&')
        .filter(|field| !field.is_empty())
        .map(|field| {
            let (name, value) = field.split_once('=').unwrap_or((field, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
