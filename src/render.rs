//! Flattens decoded JSON and XML bodies into `path: value` lines.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Prefix every flattened path starts with.
pub const ROOT: &str = "response";

/// A decoded document, independent of the format it came from.
///
/// Mapping entries keep the order the decoder produced them in, which for
/// JSON objects is not the order of the original text. XML mappings may
/// repeat a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(String),
    Mapping(Vec<(String, Node)>),
    Sequence(Vec<Node>),
}

/// One `path: value` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Line {
    pub path: String,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML: {0}")]
    Xml(String),
    #[error("XML document has no root element")]
    EmptyDocument,
}

impl Node {
    pub fn from_json_slice(src: &[u8]) -> Result<Self, RenderError> {
        let value: serde_json::Value = serde_json::from_slice(src)?;
        Ok(Self::from(value))
    }

    /// Builds a tree from an XML document.
    ///
    /// An element without child elements becomes a leaf holding its trimmed
    /// text. An element with children becomes a mapping keyed by child name;
    /// any text mixed in with the children is dropped.
    pub fn from_xml_slice(src: &[u8]) -> Result<Self, RenderError> {
        let src = std::str::from_utf8(src).map_err(|e| RenderError::Xml(e.to_string()))?;
        let mut reader = Reader::from_str(src);
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| RenderError::Xml(e.to_string()))?;
            match event {
                Event::Start(e) => stack.push(OpenElement::new(e.local_name().as_ref())),
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    attach(&mut stack, &mut root, name, Node::Leaf(String::new()));
                }
                Event::Text(e) => {
                    if let Some(open) = stack.last_mut() {
                        let text = e.unescape().map_err(|e| RenderError::Xml(e.to_string()))?;
                        open.text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(_) => {
                    let open = stack
                        .pop()
                        .ok_or_else(|| RenderError::Xml("unexpected closing tag".to_owned()))?;
                    let (name, node) = open.close();
                    attach(&mut stack, &mut root, name, node);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(RenderError::Xml(format!("unclosed element <{}>", open.name)));
        }
        root.ok_or(RenderError::EmptyDocument)
    }
}

struct OpenElement {
    name: String,
    text: String,
    children: Vec<(String, Node)>,
}

impl OpenElement {
    fn new(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn close(self) -> (String, Node) {
        let node = if self.children.is_empty() {
            Node::Leaf(self.text.trim().to_owned())
        } else {
            Node::Mapping(self.children)
        };
        (self.name, node)
    }
}

fn attach(stack: &mut [OpenElement], root: &mut Option<Node>, name: String, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, node)),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Leaf("null".to_owned()),
            Value::Bool(b) => Self::Leaf(b.to_string()),
            Value::Number(n) => Self::Leaf(n.to_string()),
            Value::String(s) => Self::Leaf(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Flattens `node` into lines rooted at [`ROOT`].
///
/// Sequences are walked in index order. No depth limit is applied, so a
/// pathologically deep document can exhaust the stack.
pub fn flatten(node: &Node) -> Vec<Line> {
    let mut out = Vec::new();
    walk(ROOT.to_owned(), node, &mut out);
    out
}

fn walk(path: String, node: &Node, out: &mut Vec<Line>) {
    match node {
        Node::Leaf(value) => out.push(Line {
            path,
            value: value.clone(),
        }),
        Node::Mapping(entries) => {
            for (key, child) in entries {
                walk(format!("{}.{}", path, key), child, out);
            }
        }
        Node::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(format!("{}[{}]", path, i), child, out);
            }
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn rendered(lines: Vec<Line>) -> HashSet<String> {
        lines.iter().map(Line::to_string).collect()
    }

    fn set(lines: &[&str]) -> HashSet<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn scalar_json_is_a_single_line() {
        let node = Node::from_json_slice(b"42").unwrap();
        let lines = flatten(&node);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string(), "response: 42");
    }

    #[test]
    fn json_null_renders_as_null_token() {
        let node = Node::from_json_slice(b"null").unwrap();
        assert_eq!(flatten(&node)[0].to_string(), "response: null");
    }

    #[test]
    fn json_numbers_use_serde_json_display() {
        let node = Node::from_json_slice(b"[100, 1e2, -0.5, 12345678901234567890]").unwrap();
        let lines = flatten(&node)
            .into_iter()
            .map(|l| l.value)
            .collect::<Vec<_>>();
        assert_eq!(lines, ["100", "100.0", "-0.5", "12345678901234567890"]);
    }

    #[test]
    fn nested_json_paths() {
        let body = br#"{
            "Student": { "Nama": "Ameera", "Npm": "2306256223" },
            "Greeter": "Alice",
            "items": [ { "name": "a" }, [true, 1.5] ],
            "empty": {}
        }"#;
        let node = Node::from_json_slice(body).unwrap();
        assert_eq!(
            rendered(flatten(&node)),
            set(&[
                "response.Student.Nama: Ameera",
                "response.Student.Npm: 2306256223",
                "response.Greeter: Alice",
                "response.items[0].name: a",
                "response.items[1][0]: true",
                "response.items[1][1]: 1.5",
            ])
        );
    }

    #[test]
    fn sequences_keep_index_order() {
        let node = Node::from_json_slice(b"[3, 2, 1]").unwrap();
        let lines = flatten(&node)
            .into_iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>();
        assert_eq!(lines, ["response[0]: 3", "response[1]: 2", "response[2]: 1"]);
    }

    #[test]
    fn flattening_is_idempotent() {
        let body = br#"{"a": {"b": [1, {"c": null}]}, "d": "e"}"#;
        let first = rendered(flatten(&Node::from_json_slice(body).unwrap()));
        let second = rendered(flatten(&Node::from_json_slice(body).unwrap()));
        assert_eq!(first, second);

        let xml = b"<Response><A>1</A><B><C>2</C></B></Response>";
        let first = rendered(flatten(&Node::from_xml_slice(xml).unwrap()));
        let second = rendered(flatten(&Node::from_xml_slice(xml).unwrap()));
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            Node::from_json_slice(b"{\"a\": "),
            Err(RenderError::Json(_))
        ));
    }

    #[test]
    fn greeting_xml_paths_skip_root_name() {
        let body = b"<Response>\n  <Student>\n    <Nama>Ameera</Nama>\n    <Npm>2306256223</Npm>\n  </Student>\n  <Greeter>Alice</Greeter>\n</Response>";
        let node = Node::from_xml_slice(body).unwrap();
        assert_eq!(
            rendered(flatten(&node)),
            set(&[
                "response.Student.Nama: Ameera",
                "response.Student.Npm: 2306256223",
                "response.Greeter: Alice",
            ])
        );
    }

    #[test]
    fn xml_leaves_are_trimmed_and_unescaped() {
        let body = b"<?xml version=\"1.0\"?><r><a>  x &amp; y  </a><b/><c><![CDATA[<raw>]]></c></r>";
        let node = Node::from_xml_slice(body).unwrap();
        assert_eq!(
            rendered(flatten(&node)),
            set(&["response.a: x & y", "response.b: ", "response.c: <raw>"])
        );
    }

    #[test]
    fn repeated_xml_elements_repeat_paths() {
        let node = Node::from_xml_slice(b"<list><i>1</i><i>2</i></list>").unwrap();
        let lines = flatten(&node)
            .into_iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>();
        assert_eq!(lines, ["response.i: 1", "response.i: 2"]);
    }

    #[test]
    fn childless_xml_root_is_a_leaf() {
        let node = Node::from_xml_slice(b"<Greeter> hi </Greeter>").unwrap();
        assert_eq!(rendered(flatten(&node)), set(&["response: hi"]));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(matches!(
            Node::from_xml_slice(b"<a><b></a>"),
            Err(RenderError::Xml(_))
        ));
        assert!(matches!(
            Node::from_xml_slice(b"<a><b>"),
            Err(RenderError::Xml(_))
        ));
        assert!(matches!(
            Node::from_xml_slice(b"   "),
            Err(RenderError::EmptyDocument)
        ));
    }
}
