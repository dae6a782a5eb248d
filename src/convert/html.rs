//! HTML <-> editor node tree.
//!
//! Parsing goes through html5ever's standards-compliant tree builder so malformed
//! markup is repaired the same way a browser would repair it. Only the body
//! is converted; elements outside the editor schema are unwrapped and their
//! children kept.
//!
//! The DOM walk descends at most [`MAX_NESTING`] elements. Anything deeper is
//! flattened into plain text, so the walk never needs a deep stack and every
//! produced tree stays within the protobuf decoder's recursion limit.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::DocumentVariant;
use super::node::{Mark, Node};

/// Deepest element nesting converted structurally
pub const MAX_NESTING: usize = 64;

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "del", "em", "i", "input", "label", "mark", "s", "small",
    "span", "strike", "strong", "sub", "sup", "u",
];

/// Parse an HTML fragment into a `doc` node for the given variant
pub fn parse_html(html: &str, variant: DocumentVariant) -> Node {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);

    let content = match find_element(&dom.document, "body") {
        Some(body) => BlockBuilder::new(variant).build(&body),
        None => Vec::new(),
    };

    if content.is_empty() {
        return Node::empty_doc();
    }

    Node::element("doc").with_content(content)
}

fn find_element(root: &Handle, tag: &str) -> Option<Handle> {
    let mut stack = vec![root.clone()];
    while let Some(handle) = stack.pop() {
        if let NodeData::Element { name, .. } = &handle.data {
            if &*name.local == tag {
                return Some(handle);
            }
        }
        stack.extend(handle.children.borrow().iter().rev().cloned());
    }
    None
}

fn tag_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn attribute(handle: &Handle, key: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == key)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Concatenated text of a subtree in document order
fn raw_text(root: &Handle) -> String {
    let mut out = String::new();
    let mut stack = vec![root.clone()];
    while let Some(handle) = stack.pop() {
        if let NodeData::Text { contents } = &handle.data {
            out.push_str(&contents.borrow());
        }
        stack.extend(handle.children.borrow().iter().rev().cloned());
    }
    out
}

/// A subtree past the nesting limit becomes one text run
fn push_flattened(handle: &Handle, marks: &[Mark], out: &mut Vec<Node>) {
    let text = collapse_whitespace(&raw_text(handle));
    if !text.is_empty() {
        push_text(out, text, marks);
    }
}

/// Walks block-level content, gathering loose inline content into paragraphs
struct BlockBuilder {
    variant: DocumentVariant,
    depth: usize,
    blocks: Vec<Node>,
    pending: Vec<Node>,
}

impl BlockBuilder {
    fn new(variant: DocumentVariant) -> Self {
        Self::at_depth(variant, 0)
    }

    fn at_depth(variant: DocumentVariant, depth: usize) -> Self {
        Self {
            variant,
            depth,
            blocks: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn build(mut self, parent: &Handle) -> Vec<Node> {
        self.visit_children(parent);
        self.flush();
        self.blocks
    }

    /// Blocks inside a container that adds `levels` nodes to the tree
    fn nested(&self, parent: &Handle, levels: usize) -> Vec<Node> {
        BlockBuilder::at_depth(self.variant, self.depth + levels).build(parent)
    }

    fn visit_children(&mut self, parent: &Handle) {
        for child in parent.children.borrow().iter() {
            self.visit(child);
        }
    }

    fn flush(&mut self) {
        let inline = finish_inline(std::mem::take(&mut self.pending));
        if !inline.is_empty() {
            self.blocks
                .push(Node::element("paragraph").with_content(inline));
        }
    }

    fn push_block(&mut self, node: Node) {
        self.flush();
        self.blocks.push(node);
    }

    fn visit(&mut self, handle: &Handle) {
        let tag = match &handle.data {
            NodeData::Text { .. } => {
                append_inline(handle, &[], self.depth, &mut self.pending);
                return;
            }
            NodeData::Element { name, .. } => name.local.to_string(),
            _ => return,
        };

        if self.depth >= MAX_NESTING {
            push_flattened(handle, &[], &mut self.pending);
            return;
        }

        match tag.as_str() {
            "p" => {
                let content = inline_content(handle, self.depth + 1);
                self.push_block(Node::element("paragraph").with_content(content));
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = u64::from(tag.as_bytes()[1] - b'0');
                let content = inline_content(handle, self.depth + 1);
                self.push_block(
                    Node::element("heading")
                        .with_attr("level", level)
                        .with_content(content),
                );
            }
            "ul" => {
                let is_task_list = attribute(handle, "data-type").as_deref() == Some("taskList");
                let node = if is_task_list && self.variant.supports_tasks() {
                    Node::element("taskList").with_content(self.task_items(handle))
                } else {
                    Node::element("bulletList").with_content(self.list_items(handle))
                };
                self.push_block(node);
            }
            "ol" => {
                let mut node = Node::element("orderedList").with_content(self.list_items(handle));
                if let Some(start) = attribute(handle, "start").and_then(|s| s.parse::<u64>().ok())
                {
                    node = node.with_attr("start", start);
                }
                self.push_block(node);
            }
            "li" => {
                let node = self.list_item(handle);
                self.push_block(node);
            }
            "blockquote" => {
                let content = non_empty_blocks(self.nested(handle, 1));
                self.push_block(Node::element("blockquote").with_content(content));
            }
            "pre" => {
                let text = raw_text(handle);
                let mut node = Node::element("codeBlock");
                if let Some(language) = code_language(handle) {
                    node = node.with_attr("language", language);
                }
                if !text.is_empty() {
                    node = node.with_content(vec![Node::text(text, Vec::new())]);
                }
                self.push_block(node);
            }
            "hr" => self.push_block(Node::element("horizontalRule")),
            "img" => {
                if let Some(node) = image(handle) {
                    self.push_block(node);
                }
            }
            "table" if self.variant.supports_tables() => {
                let rows = self.table_rows(handle);
                self.push_block(Node::element("table").with_content(rows));
            }
            "script" | "style" | "head" | "template" => {}
            t if INLINE_TAGS.contains(&t) => {
                append_inline(handle, &[], self.depth, &mut self.pending)
            }
            _ => {
                // Unknown containers are unwrapped. Flushing first keeps
                // block boundaries from merging text across them.
                self.flush();
                self.depth += 1;
                self.visit_children(handle);
                self.depth -= 1;
                self.flush();
            }
        }
    }

    fn list_items(&self, list: &Handle) -> Vec<Node> {
        list.children
            .borrow()
            .iter()
            .filter(|child| tag_name(child).as_deref() == Some("li"))
            .map(|item| self.list_item(item))
            .collect()
    }

    fn list_item(&self, item: &Handle) -> Node {
        Node::element("listItem").with_content(non_empty_blocks(self.nested(item, 2)))
    }

    fn task_items(&self, list: &Handle) -> Vec<Node> {
        list.children
            .borrow()
            .iter()
            .filter(|child| tag_name(child).as_deref() == Some("li"))
            .map(|item| {
                let checked = attribute(item, "data-checked").as_deref() == Some("true");
                Node::element("taskItem")
                    .with_attr("checked", checked)
                    .with_content(non_empty_blocks(self.nested(item, 2)))
            })
            .collect()
    }

    fn table_rows(&self, table: &Handle) -> Vec<Node> {
        let mut rows = Vec::new();
        self.collect_rows(table, &mut rows);
        rows
    }

    fn collect_rows(&self, parent: &Handle, rows: &mut Vec<Node>) {
        for child in parent.children.borrow().iter() {
            match tag_name(child).as_deref() {
                Some("tr") => {
                    let cells = child
                        .children
                        .borrow()
                        .iter()
                        .filter_map(|cell| {
                            let kind = match tag_name(cell).as_deref() {
                                Some("td") => "tableCell",
                                Some("th") => "tableHeader",
                                _ => return None,
                            };
                            Some(Node::element(kind).with_content(non_empty_blocks(self.nested(cell, 3))))
                        })
                        .collect();
                    rows.push(Node::element("tableRow").with_content(cells));
                }
                Some("thead") | Some("tbody") | Some("tfoot") => self.collect_rows(child, rows),
                _ => {}
            }
        }
    }
}

/// Block containers must hold at least one block
fn non_empty_blocks(blocks: Vec<Node>) -> Vec<Node> {
    if blocks.is_empty() {
        vec![Node::element("paragraph")]
    } else {
        blocks
    }
}

fn code_language(pre: &Handle) -> Option<String> {
    let code = pre
        .children
        .borrow()
        .iter()
        .find(|child| tag_name(child).as_deref() == Some("code"))
        .cloned()?;

    attribute(&code, "class")?
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
}

fn image(handle: &Handle) -> Option<Node> {
    let src = attribute(handle, "src").filter(|src| !src.is_empty())?;
    let mut node = Node::element("image").with_attr("src", src);
    if let Some(alt) = attribute(handle, "alt") {
        node = node.with_attr("alt", alt);
    }
    Some(node)
}

fn inline_content(parent: &Handle, depth: usize) -> Vec<Node> {
    let mut out = Vec::new();
    for child in parent.children.borrow().iter() {
        append_inline(child, &[], depth, &mut out);
    }
    finish_inline(out)
}

fn append_inline(handle: &Handle, marks: &[Mark], depth: usize, out: &mut Vec<Node>) {
    let tag = match &handle.data {
        NodeData::Text { contents } => {
            let text = collapse_whitespace(&contents.borrow());
            if !text.is_empty() {
                push_text(out, text, marks);
            }
            return;
        }
        NodeData::Element { name, .. } => name.local.to_string(),
        _ => return,
    };

    if depth >= MAX_NESTING {
        push_flattened(handle, marks, out);
        return;
    }

    let mark = match tag.as_str() {
        "br" => {
            out.push(Node::element("hardBreak"));
            return;
        }
        "img" => {
            out.extend(image(handle));
            return;
        }
        "input" | "script" | "style" => return,
        "strong" | "b" => Some(Mark::new("bold")),
        "em" | "i" => Some(Mark::new("italic")),
        "u" => Some(Mark::new("underline")),
        "s" | "del" | "strike" => Some(Mark::new("strike")),
        "code" => Some(Mark::new("code")),
        "a" => attribute(handle, "href").map(|href| Mark::new("link").with_attr("href", href)),
        _ => None,
    };

    let mut active = marks.to_vec();
    if let Some(mark) = mark {
        if !active.iter().any(|m| m.kind == mark.kind) {
            active.push(mark);
        }
    }

    for child in handle.children.borrow().iter() {
        append_inline(child, &active, depth + 1, out);
    }
}

fn push_text(out: &mut Vec<Node>, text: String, marks: &[Mark]) {
    if let Some(last) = out.last_mut() {
        if last.is_text() && last.marks == marks {
            if let Some(existing) = last.text.as_mut() {
                existing.push_str(&text);
                return;
            }
        }
    }
    out.push(Node::text(text, marks.to_vec()));
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Trim whitespace at the edges of an inline run and drop text nodes left empty
fn finish_inline(mut nodes: Vec<Node>) -> Vec<Node> {
    if let Some(first) = nodes.first_mut().and_then(|n| n.text.as_mut()) {
        *first = first.trim_start().to_string();
    }
    if let Some(last) = nodes.last_mut().and_then(|n| n.text.as_mut()) {
        *last = last.trim_end().to_string();
    }
    nodes.retain(|n| !n.is_text() || n.text.as_deref().is_some_and(|t| !t.is_empty()));
    nodes
}

/// Render a node tree back to the editor's HTML dialect
///
/// Recursive. Trees from [`parse_html`] and from decoded binary states are
/// both depth-bounded.
pub fn render_html(node: &Node) -> String {
    let mut out = String::new();
    render_node(node, &mut out);
    out
}

fn render_children(node: &Node, out: &mut String) {
    for child in &node.content {
        render_node(child, out);
    }
}

fn wrap(tag: &str, node: &Node, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_children(node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_node(node: &Node, out: &mut String) {
    match node.kind.as_str() {
        "doc" => render_children(node, out),
        "text" => render_text(node, out),
        "paragraph" => wrap("p", node, out),
        "heading" => {
            let level = node
                .attrs
                .get("level")
                .and_then(|v| v.as_u64())
                .unwrap_or(1)
                .clamp(1, 6);
            wrap(&format!("h{level}"), node, out);
        }
        "bulletList" => wrap("ul", node, out),
        "orderedList" => match node.attrs.get("start").and_then(|v| v.as_u64()) {
            Some(start) if start != 1 => {
                out.push_str(&format!("<ol start=\"{start}\">"));
                render_children(node, out);
                out.push_str("</ol>");
            }
            _ => wrap("ol", node, out),
        },
        "listItem" => wrap("li", node, out),
        "taskList" => {
            out.push_str("<ul data-type=\"taskList\">");
            render_children(node, out);
            out.push_str("</ul>");
        }
        "taskItem" => {
            let checked = node
                .attrs
                .get("checked")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            out.push_str(&format!(
                "<li data-type=\"taskItem\" data-checked=\"{checked}\">"
            ));
            render_children(node, out);
            out.push_str("</li>");
        }
        "blockquote" => wrap("blockquote", node, out),
        "codeBlock" => {
            match node.attrs.get("language").and_then(|v| v.as_str()) {
                Some(language) => out.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    escape(language, true)
                )),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape(&node.text_content(), false));
            out.push_str("</code></pre>");
        }
        "horizontalRule" => out.push_str("<hr>"),
        "hardBreak" => out.push_str("<br>"),
        "image" => {
            let src = node.attrs.get("src").and_then(|v| v.as_str()).unwrap_or("");
            out.push_str(&format!("<img src=\"{}\"", escape(src, true)));
            if let Some(alt) = node.attrs.get("alt").and_then(|v| v.as_str()) {
                out.push_str(&format!(" alt=\"{}\"", escape(alt, true)));
            }
            out.push('>');
        }
        "table" => {
            out.push_str("<table><tbody>");
            render_children(node, out);
            out.push_str("</tbody></table>");
        }
        "tableRow" => wrap("tr", node, out),
        "tableCell" => wrap("td", node, out),
        "tableHeader" => wrap("th", node, out),
        _ => render_children(node, out),
    }
}

fn render_text(node: &Node, out: &mut String) {
    let text = node.text.as_deref().unwrap_or("");
    let mut closing = Vec::with_capacity(node.marks.len());

    for mark in &node.marks {
        let tag = match mark.kind.as_str() {
            "bold" => "strong",
            "italic" => "em",
            "underline" => "u",
            "strike" => "s",
            "code" => "code",
            "link" => {
                let href = mark.attrs.get("href").and_then(|v| v.as_str()).unwrap_or("");
                out.push_str(&format!("<a href=\"{}\">", escape(href, true)));
                closing.push("a");
                continue;
            }
            _ => continue,
        };
        out.push('<');
        out.push_str(tag);
        out.push('>');
        closing.push(tag);
    }

    out.push_str(&escape(text, false));

    for tag in closing.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
