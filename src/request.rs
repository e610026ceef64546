use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::HeaderName;

/// Separator between the message head and its body.
pub(crate) const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Largest message the server will buffer for a single connection.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

const READ_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    method: Method,
    target: String,
    version: String,
    headers: HashMap<HeaderName, String>,
    body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    /// Any other token, including the empty token of an unparsable request line.
    Extension(String),
}

impl Request {
    /// Decodes one raw HTTP request.
    ///
    /// Never fails. A request line that is not exactly three space separated
    /// tokens leaves method, target and version empty, and header lines without
    /// a `:` are skipped. A message without the blank line has an empty body.
    pub fn decode(src: &[u8]) -> Self {
        let (head, body) = match find(src, HEAD_TERMINATOR) {
            Some(pos) => (&src[..pos], &src[pos + HEAD_TERMINATOR.len()..]),
            None => (src, &[][..]),
        };
        let head = String::from_utf8_lossy(head);
        let mut lines = head.split("\r\n");

        let mut req = Self::default();
        if let Some(first_line) = lines.next() {
            let tokens = first_line.split(' ').collect::<Vec<_>>();
            if let [method, target, version] = tokens[..] {
                req.method = Method::from_token(method);
                req.target = target.to_owned();
                req.version = version.to_owned();
            }
        }

        for line in lines {
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                req.headers
                    .insert(HeaderName::from_str(name), value.trim().to_owned());
            }
        }

        req.body = body.to_vec();
        req
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HashMap<HeaderName, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&HeaderName::from_str(name))
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// False when the request line could not be split into its three parts.
    pub fn has_request_line(&self) -> bool {
        !self.target.is_empty()
    }
}

/// Encodes a bodiless GET request in origin form.
///
/// Header names are written as given.
pub fn encode_get(target: &str, headers: &[(&str, &str)]) -> Vec<u8> {
    let first_line = format!("GET {} HTTP/1.1\r\n", target);
    let headers = headers
        .iter()
        .map(|(name, value)| format!("{}: {}\r\n", name, value))
        .collect::<String>();
    (first_line + &headers + "\r\n").into_bytes()
}

/// Reads one request from `src`.
///
/// Stops once the head and `Content-Length` bytes of body have arrived, when
/// the peer closes, or when [`MAX_MESSAGE_SIZE`] bytes have been buffered.
pub async fn read_message<R: AsyncRead + Unpin>(src: &mut R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0; READ_CHUNK_SIZE];
    loop {
        let n = src.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() >= MAX_MESSAGE_SIZE {
            buf.truncate(MAX_MESSAGE_SIZE);
            break;
        }
        if is_complete(&buf) {
            break;
        }
    }
    Ok(buf)
}

fn is_complete(buf: &[u8]) -> bool {
    let head_end = match find(buf, HEAD_TERMINATOR) {
        Some(pos) => pos + HEAD_TERMINATOR.len(),
        None => return false,
    };
    let content_length = Request::decode(&buf[..head_end])
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    buf.len() - head_end >= content_length
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl Method {
    /// Method tokens are case-sensitive.
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            other => Self::Extension(other.to_owned()),
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Extension(String::new())
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Head => write!(f, "HEAD"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Extension(token) => write!(f, "{}", token),
        }
    }
}
