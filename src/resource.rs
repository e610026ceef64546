//! The single resource the server advertises and the greeting built from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity the server advertises. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename(serialize = "Nama"))]
    pub name: String,
    #[serde(rename(serialize = "Npm"))]
    pub id: String,
}

/// Body of the greet endpoint.
#[derive(Debug, Serialize)]
#[serde(rename = "Response")]
pub struct Greeting<'a> {
    #[serde(rename = "Student")]
    pub resource: &'a Resource,
    #[serde(rename = "Greeter")]
    pub caller: String,
}

/// Representations the two programs know how to exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Xml,
    Html,
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("xml serialization failed: {0}")]
    Xml(String),
    #[error("{0:?} is not a greeting representation")]
    Unsupported(MediaType),
}

const INDENT: usize = 2;

impl Resource {
    pub fn new<N: Into<String>, I: Into<String>>(name: N, id: I) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Greets `caller`, or the resource itself when no caller is given.
    pub fn greet(&self, caller: Option<&str>) -> Greeting<'_> {
        let caller = caller
            .filter(|c| !c.is_empty())
            .unwrap_or(self.name.as_str())
            .to_owned();
        Greeting {
            resource: self,
            caller,
        }
    }
}

impl Greeting<'_> {
    pub fn to_json(&self) -> Result<Vec<u8>, SerializeError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>, SerializeError> {
        let mut buf = String::new();
        let mut ser = quick_xml::se::Serializer::new(&mut buf);
        ser.indent(' ', INDENT);
        self.serialize(ser)
            .map_err(|e| SerializeError::Xml(e.to_string()))?;
        Ok(buf.into_bytes())
    }

    pub fn render(&self, media: MediaType) -> Result<Vec<u8>, SerializeError> {
        match media {
            MediaType::Json => self.to_json(),
            MediaType::Xml => self.to_xml(),
            MediaType::Html => Err(SerializeError::Unsupported(media)),
        }
    }
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Html => "text/html",
        }
    }

    /// Classifies a `Content-Type` value. Parameters such as `charset` are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.to_ascii_lowercase();
        [Self::Json, Self::Xml, Self::Html]
            .into_iter()
            .find(|media| content_type.contains(media.mime()))
    }
}
