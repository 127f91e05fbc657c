//! Rich-text → HTML renderer.
//!
//! Rendering is a pure function of the tree. For every node the inner content
//! is produced first (escaped text for leaves, concatenated children
//! otherwise), the node's marks wrap it in order, and the node kind decides the
//! outer tag. Unknown node kinds and marks degrade to their inner content;
//! missing attributes fall back to defaults, so no input aborts a render.

use serde_json::Value;

use crate::domain::article::ArticleContent;
use crate::domain::rich_text::{Mark, MarkKind, NodeKind, RichTextNode};

const MIN_HEADING_LEVEL: i64 = 1;
const MAX_HEADING_LEVEL: i64 = 6;

/// Render article content. Preformatted markup passes through unchanged.
pub fn render_content(content: Option<&ArticleContent>) -> String {
    match content {
        None => String::new(),
        Some(ArticleContent::Html(html)) => html.clone(),
        Some(ArticleContent::RichText(root)) => render_document(root),
    }
}

/// Render raw JSON content: a string passes through, an object is parsed as a
/// rich-text tree, anything else renders empty.
pub fn render_json(value: &Value) -> String {
    match value {
        Value::String(html) => html.clone(),
        Value::Object(_) => render_document(&RichTextNode::from_json(value)),
        _ => String::new(),
    }
}

/// A document root renders as its concatenated children; any other root
/// renders as a single node.
pub fn render_document(root: &RichTextNode) -> String {
    let mut out = String::new();
    if root.kind == NodeKind::Doc {
        for child in &root.children {
            render_into(child, &mut out);
        }
    } else {
        render_into(root, &mut out);
    }
    out
}

pub fn render_node(node: &RichTextNode) -> String {
    let mut out = String::new();
    render_into(node, &mut out);
    out
}

fn render_into(node: &RichTextNode, out: &mut String) {
    match node.kind {
        NodeKind::Image => {
            let src = node.attrs.text("src").unwrap_or_default();
            let alt = node.attrs.text("alt").unwrap_or_default();
            out.push_str(&format!(
                r#"<img src="{}" alt="{}" />"#,
                escape_html(&src),
                escape_html(&alt)
            ));
            return;
        }
        NodeKind::HardBreak => {
            out.push_str("<br />");
            return;
        }
        NodeKind::HorizontalRule => {
            out.push_str("<hr />");
            return;
        }
        _ => {}
    }

    let content = apply_marks(inner_content(node), &node.marks);
    match node.kind {
        NodeKind::Heading => {
            let level = heading_level(node);
            out.push_str(&format!("<h{level}>{content}</h{level}>"));
        }
        NodeKind::Paragraph => wrap(out, "p", &content),
        NodeKind::BulletList => wrap(out, "ul", &content),
        NodeKind::OrderedList => wrap(out, "ol", &content),
        NodeKind::ListItem => wrap(out, "li", &content),
        NodeKind::Blockquote => wrap(out, "blockquote", &content),
        NodeKind::CodeBlock => {
            out.push_str("<pre><code>");
            out.push_str(&content);
            out.push_str("</code></pre>");
        }
        NodeKind::Doc
        | NodeKind::Text
        | NodeKind::Other
        | NodeKind::Image
        | NodeKind::HardBreak
        | NodeKind::HorizontalRule => out.push_str(&content),
    }
}

fn inner_content(node: &RichTextNode) -> String {
    if let Some(text) = &node.text {
        return escape_html(text);
    }
    let mut inner = String::new();
    for child in &node.children {
        render_into(child, &mut inner);
    }
    inner
}

fn apply_marks(content: String, marks: &[Mark]) -> String {
    marks.iter().fold(content, |content, mark| match mark.kind {
        MarkKind::Bold => format!("<strong>{content}</strong>"),
        MarkKind::Italic => format!("<em>{content}</em>"),
        MarkKind::Underline => format!("<u>{content}</u>"),
        MarkKind::Strike => format!("<s>{content}</s>"),
        MarkKind::Code => format!("<code>{content}</code>"),
        MarkKind::Link => {
            let href = mark
                .attrs
                .text("href")
                .filter(|href| !href.is_empty())
                .unwrap_or_else(|| "#".to_string());
            match mark.attrs.text("target").filter(|target| !target.is_empty()) {
                Some(target) => format!(
                    r#"<a href="{}" target="{}">{content}</a>"#,
                    escape_html(&href),
                    escape_html(&target)
                ),
                None => format!(r#"<a href="{}">{content}</a>"#, escape_html(&href)),
            }
        }
        MarkKind::Other => content,
    })
}

fn heading_level(node: &RichTextNode) -> i64 {
    node.attrs
        .integer("level")
        .unwrap_or(MIN_HEADING_LEVEL)
        .clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL)
}

fn wrap(out: &mut String, tag: &str, content: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(content);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Escape text for both element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::rich_text::Attributes;

    #[test]
    fn heading_with_bold_text() {
        let node = RichTextNode::from_json(&json!({
            "type": "heading",
            "attributes": { "level": 2 },
            "children": [{ "type": "text", "text": "Hi", "marks": [{ "type": "bold" }] }]
        }));
        assert_eq!(render_document(&node), "<h2><strong>Hi</strong></h2>");
    }

    #[test]
    fn text_leaf_is_escaped() {
        let node = RichTextNode::from_json(&json!({ "text": "<b>" }));
        assert_eq!(render_document(&node), "&lt;b&gt;");
        assert_eq!(
            escape_html(r#"Tom & "Jerry's" <tag>"#),
            "Tom &amp; &quot;Jerry&#39;s&quot; &lt;tag&gt;"
        );
    }

    #[test]
    fn plain_string_content_passes_through() {
        for html in ["", "<p>already <em>html</em></p>", "a & b", "ünïcode"] {
            assert_eq!(render_json(&json!(html)), html);
            assert_eq!(
                render_content(Some(&ArticleContent::Html(html.to_string()))),
                html
            );
        }
    }

    #[test]
    fn absent_or_scalar_content_renders_empty() {
        assert_eq!(render_content(None), "");
        assert_eq!(render_json(&Value::Null), "");
        assert_eq!(render_json(&json!(42)), "");
        assert_eq!(render_json(&json!({ "type": "doc" })), "");
    }

    #[test]
    fn marks_wrap_in_order() {
        let leaf = RichTextNode::text("x").with_marks(vec![
            Mark::new(MarkKind::Italic),
            Mark::new(MarkKind::Bold),
            Mark::new(MarkKind::Other),
            Mark::new(MarkKind::Underline),
        ]);
        assert_eq!(render_node(&leaf), "<u><strong><em>x</em></strong></u>");
    }

    #[test]
    fn link_defaults_and_target() {
        let bare = RichTextNode::text("home").with_marks(vec![Mark::new(MarkKind::Link)]);
        assert_eq!(render_node(&bare), r##"<a href="#">home</a>"##);

        let targeted = RichTextNode::text("docs").with_marks(vec![
            Mark::new(MarkKind::Link).with_attrs(
                Attributes::new()
                    .with("href", "/a?b=1&c=\"2\"")
                    .with("target", "_blank"),
            ),
        ]);
        assert_eq!(
            render_node(&targeted),
            r#"<a href="/a?b=1&amp;c=&quot;2&quot;" target="_blank">docs</a>"#
        );
    }

    #[test]
    fn heading_level_defaults_and_clamps() {
        let plain = RichTextNode::new(NodeKind::Heading).with_children(vec![RichTextNode::text("a")]);
        assert_eq!(render_node(&plain), "<h1>a</h1>");

        let deep = plain
            .clone()
            .with_attrs(Attributes::new().with("level", 9));
        assert_eq!(render_node(&deep), "<h6>a</h6>");

        let textual = plain.with_attrs(Attributes::new().with("level", "3"));
        assert_eq!(render_node(&textual), "<h3>a</h3>");
    }

    #[test]
    fn image_ignores_children_and_defaults_attributes() {
        let image = RichTextNode::new(NodeKind::Image)
            .with_attrs(Attributes::new().with("src", "/a.png"))
            .with_children(vec![RichTextNode::text("ignored")]);
        assert_eq!(render_node(&image), r#"<img src="/a.png" alt="" />"#);
        assert_eq!(
            render_node(&RichTextNode::new(NodeKind::Image)),
            r#"<img src="" alt="" />"#
        );
    }

    #[test]
    fn unknown_nodes_render_inner_content_only() {
        let node = RichTextNode::from_json(&json!({
            "type": "callout",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "kept" }] }]
        }));
        assert_eq!(render_document(&node), "<p>kept</p>");
    }

    #[test]
    fn renders_representative_document() {
        let doc = json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 1 }, "content": [{ "type": "text", "text": "Title" }] },
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "Hello " },
                    { "type": "text", "text": "world", "marks": [{ "type": "italic" }] },
                    { "type": "hard_break" },
                    { "type": "text", "text": "run", "marks": [{ "type": "code" }, { "type": "strike" }] }
                ]},
                { "type": "bullet_list", "content": [
                    { "type": "list_item", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "one" }] }] },
                    { "type": "list_item", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "two" }] }] }
                ]},
                { "type": "ordered_list", "content": [
                    { "type": "list_item", "content": [{ "type": "text", "text": "first" }] }
                ]},
                { "type": "blockquote", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "quoted" }] }] },
                { "type": "code_block", "content": [{ "type": "text", "text": "fn main() {}" }] },
                { "type": "horizontal_rule" },
                { "type": "image", "attrs": { "src": "/cat.png", "alt": "A \"cat\"" } }
            ]
        });

        insta::assert_snapshot!(
            render_json(&doc),
            @r#"<h1>Title</h1><p>Hello <em>world</em><br /><s><code>run</code></s></p><ul><li><p>one</p></li><li><p>two</p></li></ul><ol><li>first</li></ol><blockquote><p>quoted</p></blockquote><pre><code>fn main() {}</code></pre><hr /><img src="/cat.png" alt="A &quot;cat&quot;" />"#
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "same" }] }]
        });
        assert_eq!(render_json(&doc), render_json(&doc));
    }
}
