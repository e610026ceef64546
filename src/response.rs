use std::collections::HashMap;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::request::{find, HEAD_TERMINATOR};

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// A structured HTTP response.
///
/// Header names keep the case they were given. Emission order of headers is
/// the iteration order of the map and is not stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: String,
    status_code: u16,
    status_text: String,
    /// First line exactly as received, or as built from the parts above.
    status_line: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    OK,
    NotFound,
}

#[derive(Default)]
pub struct Builder {
    status: Status,
    headers: HashMap<String, String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("response has no header/body separator")]
    MissingSeparator,
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),
}

impl Response {
    pub fn builder() -> Builder {
        Default::default()
    }

    /// The fallback for every request the router does not recognize.
    pub fn not_found() -> Self {
        Self::builder().with_status(Status::NotFound).with_body(Vec::new())
    }

    pub async fn try_write_to<W: AsyncWriteExt + Unpin>(self, dest: &mut W) -> anyhow::Result<()> {
        dest.write_all(&self.into_bytes()).await?;
        dest.flush().await?;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let first_line = format!("{}\r\n", self.status_line);
        let headers = self
            .headers
            .iter()
            .map(|(hn, hv)| format!("{}: {}\r\n", hn, hv))
            .collect::<String>();

        let complete_header = first_line + &headers + "\r\n";

        let mut result = complete_header.into_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Splits a raw response into status line, headers and body.
    ///
    /// The body is everything after the first blank line, taken verbatim.
    pub fn decode(src: &[u8]) -> Result<Self, ProtocolError> {
        let pos = find(src, HEAD_TERMINATOR).ok_or(ProtocolError::MissingSeparator)?;
        let head = String::from_utf8_lossy(&src[..pos]);
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap_or_default();
        let mut parts = status_line.splitn(3, ' ');
        let malformed = || ProtocolError::MalformedStatusLine(status_line.to_owned());
        let version = parts.next().filter(|v| !v.is_empty()).ok_or_else(malformed)?;
        let status_code = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(malformed)?;
        let status_text = parts.next().unwrap_or_default();

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
            .collect();

        Ok(Self {
            version: version.to_owned(),
            status_code,
            status_text: status_text.to_owned(),
            status_line: status_line.to_owned(),
            headers,
            body: src[pos + HEAD_TERMINATOR.len()..].to_vec(),
        })
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(hn, _)| hn.eq_ignore_ascii_case(name))
            .map(|(_, hv)| hv.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::OK => 200,
            Self::NotFound => 404,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::OK => "OK",
            Self::NotFound => "Not Found",
        }
    }
}

impl Builder {
    pub fn with_status(&mut self, status: Status) -> &mut Self {
        self.status = status;
        self
    }

    pub fn as_html(&mut self) -> &mut Self {
        self.with_header("Content-Type", "text/html")
    }

    pub fn with_content_type(&mut self, mime: &str) -> &mut Self {
        self.with_header("Content-Type", mime)
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Finishes the response. `Content-Length` is always set from `body`.
    pub fn with_body<B: Into<Vec<u8>>>(&mut self, body: B) -> Response {
        let body = body.into();
        let mut headers = self.headers.clone();
        headers.retain(|name, _| !name.eq_ignore_ascii_case("content-length"));
        headers.insert("Content-Length".to_owned(), body.len().to_string());
        Response {
            version: HTTP_VERSION.to_owned(),
            status_code: self.status.code(),
            status_text: self.status.reason().to_owned(),
            status_line: format!(
                "{} {} {}",
                HTTP_VERSION,
                self.status.code(),
                self.status.reason()
            ),
            headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::request::Request;

    fn lines_of(raw: &[u8]) -> HashSet<String> {
        String::from_utf8_lossy(raw)
            .split("\r\n")
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn not_found_has_zero_content_length() {
        let resp = Response::not_found();
        assert_eq!(resp.status_code(), 404);
        assert_eq!(resp.status_text(), "Not Found");
        assert_eq!(resp.header("content-length"), Some("0"));
        assert!(resp.body().is_empty());
    }

    #[test]
    fn content_length_tracks_body_bytes() {
        let resp = Response::builder()
            .with_header("content-length", "999")
            .as_html()
            .with_body("héllo");
        assert_eq!(resp.headers().len(), 2);
        assert_eq!(resp.header("Content-Length"), Some("6"));
    }

    #[test]
    fn encodes_status_line_headers_and_raw_body() {
        let raw = Response::builder()
            .with_content_type("application/json")
            .with_body("{\r\n}")
            .into_bytes();
        assert!(raw.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(raw.ends_with(b"\r\n\r\n{\r\n}"));
        let lines = lines_of(&raw);
        assert!(lines.contains("Content-Type: application/json"));
        assert!(lines.contains("Content-Length: 4"));
    }

    #[test]
    fn encoded_headers_round_trip_through_request_decoder() {
        let resp = Response::builder()
            .with_content_type("application/xml")
            .with_header("X-Custom", "  spaced  ")
            .with_body("<Response/>");
        let expected = resp
            .headers()
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_owned()))
            .collect::<HashSet<_>>();

        let decoded = Request::decode(&resp.into_bytes());
        let actual = decoded
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), value.clone()))
            .collect::<HashSet<_>>();
        assert_eq!(actual, expected);
    }

    #[test]
    fn decodes_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";
        let resp = Response::decode(raw).unwrap();
        assert_eq!(resp.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert!(resp.headers().contains_key("Content-Type"));
        assert_eq!(resp.body(), b"{}");
    }

    #[test]
    fn decodes_multi_word_reason_phrase() {
        let resp = Response::decode(b"HTTP/1.1 404 Not Found\r\n\r\n").unwrap();
        assert_eq!(resp.status_text(), "Not Found");
        assert!(resp.body().is_empty());
    }

    #[test]
    fn status_line_is_kept_as_received() {
        let resp = Response::decode(b"HTTP/1.1 200\r\nContent-Length: 0\r\n\r\n").unwrap();
        assert_eq!(resp.status_line(), "HTTP/1.1 200");
        assert_eq!(resp.status_text(), "");
        let resp = Response::decode(b"HTTP/1.0 404  Not  Found\r\n\r\n").unwrap();
        assert_eq!(resp.status_line(), "HTTP/1.0 404  Not  Found");
    }

    #[test]
    fn built_response_has_canonical_status_line() {
        assert_eq!(Response::not_found().status_line(), "HTTP/1.1 404 Not Found");
    }

    #[test]
    fn missing_separator_is_a_protocol_error() {
        let err = Response::decode(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n").unwrap_err();
        assert_eq!(err, ProtocolError::MissingSeparator);
    }

    #[test]
    fn garbage_status_line_is_a_protocol_error() {
        let err = Response::decode(b"HTTP/1.1 abc\r\n\r\n").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedStatusLine(_)));
    }
}
