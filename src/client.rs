//! Client side of the exchange: building the GET request, fetching, and
//! choosing a renderer for the body.

use anyhow::Context;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::render::{self, Line, Node, RenderError};
use crate::request;
use crate::resource::MediaType;
use crate::response::Response;

const DEFAULT_PORT: u16 = 80;

/// Where to connect and what to put on the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Address to connect to; IPv6 literals without brackets.
    pub host: String,
    pub port: u16,
    /// Value of the `Host` header; IPv6 literals keep their brackets.
    pub host_header: String,
    /// Path and query as they appear on the request line.
    pub origin_form: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid URL: {0:?} has no host")]
    MissingHost(String),
    #[error("unsupported data type: {0}")]
    UnsupportedMediaType(String),
}

/// A response body ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Lines(Vec<Line>),
    /// Bodies that are not flattened, HTML included, are shown verbatim.
    Raw(String),
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let raw = raw.trim();
        let url = url::Url::parse(raw).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let (host, host_header) = match url.host() {
            Some(url::Host::Ipv6(addr)) => (addr.to_string(), format!("[{}]", addr)),
            Some(url::Host::Ipv4(addr)) => (addr.to_string(), addr.to_string()),
            Some(url::Host::Domain(domain)) if !domain.is_empty() => {
                (domain.to_owned(), domain.to_owned())
            }
            _ => return Err(ClientError::MissingHost(raw.to_owned())),
        };
        let port = match (url.port(), url.port_or_known_default()) {
            (Some(port), _) => port,
            // `url` drops a port equal to the scheme default.
            (None, Some(default)) if has_explicit_port(raw, default) => default,
            _ => DEFAULT_PORT,
        };

        let mut origin_form = match url.path() {
            "" => "/".to_owned(),
            path => path.to_owned(),
        };
        if let Some(query) = url.query() {
            origin_form.push('?');
            origin_form.push_str(query);
        }

        Ok(Self {
            host,
            port,
            host_header,
            origin_form,
        })
    }
}

/// True when the authority of `raw` spells out `:port`.
fn has_explicit_port(raw: &str, port: u16) -> bool {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    host_port.ends_with(&format!(":{}", port))
}

/// Maps the user's data type token to the representation to ask for.
pub fn parse_media_type(token: &str) -> Result<MediaType, ClientError> {
    match token.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(MediaType::Json),
        "xml" => Ok(MediaType::Xml),
        "html" | "text/html" => Ok(MediaType::Html),
        other => Err(ClientError::UnsupportedMediaType(other.to_owned())),
    }
}

pub fn encode_request(target: &Target, media: MediaType) -> Vec<u8> {
    request::encode_get(
        &target.origin_form,
        &[
            ("Host", target.host_header.as_str()),
            ("Accept", media.mime()),
            ("Connection", "close"),
        ],
    )
}

/// Connects, sends one GET and reads the response until the peer closes.
pub async fn fetch(target: &Target, media: MediaType) -> anyhow::Result<Response> {
    let mut stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .with_context(|| format!("connection to {}:{} failed", target.host, target.port))?;
    debug!(host = %target.host, port = target.port, "connected.");
    let raw = exchange(&mut stream, &encode_request(target, media)).await?;
    Ok(Response::decode(&raw)?)
}

/// Writes `request` and reads to end-of-stream.
pub async fn exchange<S>(stream: &mut S, request: &[u8]) -> anyhow::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await.context("write failed")?;
    stream.flush().await.context("write failed")?;
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.context("read failed")?;
    debug!(bytes = raw.len(), "read response.");
    Ok(raw)
}

/// Chooses a renderer from the response's `Content-Type`.
pub fn render_body(resp: &Response) -> Result<Rendered, RenderError> {
    let media = resp
        .header("content-type")
        .and_then(MediaType::from_content_type);
    match media {
        Some(MediaType::Json) => Ok(Rendered::Lines(render::flatten(&Node::from_json_slice(
            resp.body(),
        )?))),
        Some(MediaType::Xml) => Ok(Rendered::Lines(render::flatten(&Node::from_xml_slice(
            resp.body(),
        )?))),
        Some(MediaType::Html) | None => Ok(Rendered::Raw(
            String::from_utf8_lossy(resp.body()).into_owned(),
        )),
    }
}
