//! Portable rich-text document tree.
//!
//! The CMS delivers formatted content as a recursive JSON structure of typed
//! nodes (`doc`, `paragraph`, `heading`, ...) whose text leaves carry inline
//! marks. This module owns the typed form of that tree. Conversion from JSON is
//! total: unknown tags become [`NodeKind::Other`] / [`MarkKind::Other`] and
//! malformed fields are dropped, so one bad node never poisons its siblings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block and inline node types understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Doc,
    Heading,
    Paragraph,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    Image,
    HardBreak,
    HorizontalRule,
    Text,
    Other,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "doc" => NodeKind::Doc,
            "heading" => NodeKind::Heading,
            "paragraph" => NodeKind::Paragraph,
            "bullet_list" | "bulletList" => NodeKind::BulletList,
            "ordered_list" | "orderedList" => NodeKind::OrderedList,
            "list_item" | "listItem" => NodeKind::ListItem,
            "blockquote" => NodeKind::Blockquote,
            "code_block" | "codeBlock" => NodeKind::CodeBlock,
            "image" => NodeKind::Image,
            "hard_break" | "hardBreak" => NodeKind::HardBreak,
            "horizontal_rule" | "horizontalRule" => NodeKind::HorizontalRule,
            "text" => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    /// Whether the node separates its text from neighbours when flattened.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::Heading
                | NodeKind::Paragraph
                | NodeKind::ListItem
                | NodeKind::Blockquote
                | NodeKind::CodeBlock
                | NodeKind::HardBreak
                | NodeKind::HorizontalRule
        )
    }
}

/// Inline formatting annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link,
    Other,
}

impl MarkKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "bold" | "strong" => MarkKind::Bold,
            "italic" | "em" => MarkKind::Italic,
            "underline" => MarkKind::Underline,
            "strike" | "strikethrough" => MarkKind::Strike,
            "code" => MarkKind::Code,
            "link" => MarkKind::Link,
            _ => MarkKind::Other,
        }
    }
}

/// Node or mark attributes (`level`, `src`, `href`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// String attribute; numbers and booleans are rendered to text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Integer attribute; numeric strings such as `"2"` are accepted.
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|float| float as i64)),
            Value::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(
                map.iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub kind: MarkKind,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: Attributes::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map_or(MarkKind::Other, MarkKind::from_tag);
        let attrs = Attributes::from_json(object.get("attrs").or_else(|| object.get("attributes")));
        Some(Self { kind, attrs })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RichTextNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl RichTextNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attributes::default(),
            children: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_children(mut self, children: Vec<RichTextNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    /// Build a node from CMS JSON (`type`, `attrs`, `content`, `text`, `marks`).
    ///
    /// Never fails. Non-object input yields an empty [`NodeKind::Other`] node.
    /// The alternate field names `attributes` and `children` are accepted too.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::new(NodeKind::Other);
        };

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map_or(NodeKind::Other, NodeKind::from_tag);
        let attrs = Attributes::from_json(object.get("attrs").or_else(|| object.get("attributes")));
        let children = object
            .get("content")
            .or_else(|| object.get("children"))
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Self::from_json).collect())
            .unwrap_or_default();
        let text = object
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string);
        let marks = object
            .get("marks")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Mark::from_json).collect())
            .unwrap_or_default();

        Self {
            kind,
            attrs,
            children,
            text,
            marks,
        }
    }

    /// Concatenated text of every leaf, with block boundaries turned into spaces.
    pub fn plain_text(&self) -> String {
        let mut buffer = String::new();
        self.collect_text(&mut buffer);
        buffer
    }

    fn collect_text(&self, buffer: &mut String) {
        if let Some(text) = &self.text {
            buffer.push_str(text);
        }
        for child in &self.children {
            child.collect_text(buffer);
        }
        if self.kind.is_block() {
            buffer.push(' ');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_cms_document_shape() {
        let node = RichTextNode::from_json(&json!({
            "type": "doc",
            "content": [{
                "type": "heading",
                "attrs": { "level": 2 },
                "content": [{
                    "type": "text",
                    "text": "Hi",
                    "marks": [{ "type": "bold" }, { "type": "link", "attrs": { "href": "/x" } }]
                }]
            }]
        }));

        assert_eq!(node.kind, NodeKind::Doc);
        let heading = &node.children[0];
        assert_eq!(heading.kind, NodeKind::Heading);
        assert_eq!(heading.attrs.integer("level"), Some(2));
        let leaf = &heading.children[0];
        assert_eq!(leaf.text.as_deref(), Some("Hi"));
        assert_eq!(leaf.marks[0].kind, MarkKind::Bold);
        assert_eq!(leaf.marks[1].attrs.text("href").as_deref(), Some("/x"));
    }

    #[test]
    fn accepts_alternate_field_names_and_camel_case_tags() {
        let node = RichTextNode::from_json(&json!({
            "type": "bulletList",
            "attributes": { "tight": true },
            "children": [{ "type": "listItem" }]
        }));

        assert_eq!(node.kind, NodeKind::BulletList);
        assert_eq!(node.attrs.text("tight").as_deref(), Some("true"));
        assert_eq!(node.children[0].kind, NodeKind::ListItem);
    }

    #[test]
    fn malformed_fields_are_dropped() {
        let node = RichTextNode::from_json(&json!({
            "type": 12,
            "attrs": "nope",
            "content": { "not": "an array" },
            "text": 5,
            "marks": [null, "bold", { "type": "sparkle" }]
        }));

        assert_eq!(node.kind, NodeKind::Other);
        assert!(node.attrs.is_empty());
        assert!(node.children.is_empty());
        assert_eq!(node.text, None);
        assert_eq!(node.marks.len(), 1);
        assert_eq!(node.marks[0].kind, MarkKind::Other);
    }

    #[test]
    fn non_object_input_is_an_empty_other_node() {
        assert_eq!(
            RichTextNode::from_json(&json!("text")),
            RichTextNode::new(NodeKind::Other)
        );
    }

    #[test]
    fn integer_attributes_accept_numeric_strings() {
        let attrs = Attributes::new()
            .with("level", "3")
            .with("width", 2.0)
            .with("bad", "x");
        assert_eq!(attrs.integer("level"), Some(3));
        assert_eq!(attrs.integer("width"), Some(2));
        assert_eq!(attrs.integer("bad"), None);
        assert_eq!(attrs.integer("missing"), None);
    }

    #[test]
    fn plain_text_separates_blocks() {
        let doc = RichTextNode::new(NodeKind::Doc).with_children(vec![
            RichTextNode::new(NodeKind::Paragraph)
                .with_children(vec![RichTextNode::text("First")]),
            RichTextNode::new(NodeKind::Paragraph)
                .with_children(vec![RichTextNode::text("Second")]),
        ]);
        assert_eq!(doc.plain_text(), "First Second ");
    }
}
