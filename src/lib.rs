pub mod client;
pub mod config;
pub mod render;
pub mod request;
pub mod resource;
pub mod response;
pub mod router;
pub mod server;

/// Header field name, lowercased on construction so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderName(String);

impl HeaderName {
    pub fn from_str(src: &str) -> Self {
        Self(src.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
