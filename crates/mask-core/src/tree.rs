//! Host trees the engine rewrites, plus an in-memory implementation.
//!
//! [`HostNode`] is the whole capability set a scan pass needs: children, text
//! content, and named attributes. Any UI tree exposing these can be driven by
//! [`crate::TemplateEngine::scan_now`].
//!
//! [`Node`] is a plain owned tree with a JSON form:
//!
//! ```json
//! {"tag": "p", "attributes": [{"name": "title", "value": "{{greeting}}"}],
//!  "children": ["Hello {{user.name | mask}}!"]}
//! ```
//!
//! Text nodes are bare JSON strings; elements are objects.

use serde::{Deserialize, Serialize};

/// Capabilities a tree node must expose to be scanned.
pub trait HostNode {
    /// Text content of a text-bearing leaf, `None` for other nodes.
    fn text(&self) -> Option<&str>;

    /// Replace the text content. Only called on nodes whose [`HostNode::text`]
    /// returned `Some`.
    fn set_text(&mut self, text: String);

    /// Attribute names in a stable order. Empty for nodes without attributes.
    fn attribute_names(&self) -> Vec<String>;

    fn attribute(&self, name: &str) -> Option<&str>;

    fn set_attribute(&mut self, name: &str, value: String);

    fn children_mut(&mut self) -> &mut [Self]
    where
        Self: Sized;
}

/// A node of the in-memory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element(Element),
}

/// An element: tag name, ordered attributes, children.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of this node and all descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set(&mut self, name: String, value: String) {
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl HostNode for Node {
    fn text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text.as_str()),
            Node::Element(_) => None,
        }
    }

    fn set_text(&mut self, text: String) {
        if let Node::Text(current) = self {
            *current = text;
        }
    }

    fn attribute_names(&self) -> Vec<String> {
        match self {
            Node::Element(element) => element
                .attributes
                .iter()
                .map(|attr| attr.name.clone())
                .collect(),
            Node::Text(_) => Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.as_element()?.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: String) {
        if let Node::Element(element) = self {
            element.set(name.to_string(), value);
        }
    }

    fn children_mut(&mut self) -> &mut [Self] {
        match self {
            Node::Element(element) => &mut element.children,
            Node::Text(_) => &mut [],
        }
    }
}
