//! Arena-backed element tree.

use cordial_protocols::DomError;

use crate::selector::{ElementTree, SelectorList};

/// Elements rendered on their own line by `inner_text`.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Elements whose content never renders.
const HIDDEN_TAGS: &[&str] = &["head", "script", "style", "template", "title"];

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Element tree rooted at a `body` element.
///
/// Nodes are never freed; detached nodes stay in the arena so stale handles
/// can be told apart from unknown ones.
#[derive(Debug, Clone)]
pub(crate) struct DocumentTree {
    nodes: Vec<Node>,
}

impl DocumentTree {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Element {
                    tag: "body".to_string(),
                    attrs: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn node(&self, id: usize) -> Result<&Node, DomError> {
        self.nodes.get(id).ok_or(DomError::StaleElement(id as u64))
    }

    /// Like [`node`](Self::node), but text nodes are rejected too.
    pub fn element(&self, id: usize) -> Result<&Node, DomError> {
        match self.node(id)? {
            node @ Node {
                kind: NodeKind::Element { .. },
                ..
            } => Ok(node),
            _ => Err(DomError::StaleElement(id as u64)),
        }
    }

    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> usize {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: &str) -> usize {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> usize {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn append_child(&mut self, parent: usize, child: usize) -> Result<(), DomError> {
        self.element(parent)?;
        self.node(child)?;
        self.detach(child)?;
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Remove a node from its parent. The root cannot be detached.
    pub fn detach(&mut self, id: usize) -> Result<(), DomError> {
        if let Some(parent) = self.node(id)?.parent {
            self.nodes[parent].children.retain(|&c| c != id);
            self.nodes[id].parent = None;
        }
        Ok(())
    }

    pub fn clear_children(&mut self, id: usize) -> Result<(), DomError> {
        self.element(id)?;
        let children = std::mem::take(&mut self.nodes[id].children);
        for child in children {
            self.nodes[child].parent = None;
        }
        Ok(())
    }

    pub fn is_connected(&self, id: usize) -> Result<bool, DomError> {
        let mut current = id;
        loop {
            if current == Self::ROOT {
                return Ok(true);
            }
            match self.node(current)?.parent {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = match self.nodes.get(id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev());
        }
        out
    }

    /// Connected elements matching `selectors`, in document order.
    pub fn select(&self, selectors: &SelectorList) -> Vec<usize> {
        std::iter::once(Self::ROOT)
            .chain(self.descendants(Self::ROOT))
            .filter(|&id| selectors.matches(self, id))
            .collect()
    }

    pub fn set_attribute(&mut self, id: usize, name: &str, value: &str) -> Result<(), DomError> {
        self.element(id)?;
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id].kind {
            let name = name.to_ascii_lowercase();
            match attrs.iter_mut().find(|(k, _)| *k == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attrs.push((name, value.to_string())),
            }
        }
        Ok(())
    }

    pub fn is_content_editable(&self, id: usize) -> Result<bool, DomError> {
        self.element(id)?;
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(flag) = self.attribute(node, "contenteditable") {
                match flag.to_ascii_lowercase().as_str() {
                    "" | "true" | "plaintext-only" => return Ok(true),
                    "false" => return Ok(false),
                    _ => {}
                }
            }
            current = self.nodes[node].parent;
        }
        Ok(false)
    }

    pub fn has_editable_descendant(&self, id: usize) -> Result<bool, DomError> {
        self.element(id)?;
        Ok(self.descendants(id).into_iter().any(|d| {
            self.attribute(d, "contenteditable")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        }))
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: usize) -> Result<String, DomError> {
        let node = self.node(id)?;
        if let NodeKind::Text(text) = &node.kind {
            return Ok(text.clone());
        }
        Ok(self
            .descendants(id)
            .into_iter()
            .filter_map(|d| match &self.nodes[d].kind {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Element { .. } => None,
            })
            .collect())
    }

    /// Rendered text: whitespace collapsed, `br` and block boundaries as newlines.
    pub fn inner_text(&self, id: usize) -> Result<String, DomError> {
        self.element(id)?;
        let mut out = String::new();
        for &child in &self.nodes[id].children {
            self.render_text(child, &mut out);
        }
        Ok(out.trim_matches('\n').to_string())
    }

    fn render_text(&self, id: usize, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => {
                let mut collapsed = String::with_capacity(text.len());
                let mut in_space = false;
                for c in text.chars() {
                    if c.is_whitespace() {
                        if !in_space {
                            collapsed.push(' ');
                        }
                        in_space = true;
                    } else {
                        collapsed.push(c);
                        in_space = false;
                    }
                }
                if out.is_empty() || out.ends_with('\n') || out.ends_with(' ') {
                    out.push_str(collapsed.trim_start());
                } else {
                    out.push_str(&collapsed);
                }
            }
            NodeKind::Element { tag, .. } => {
                let tag = tag.as_str();
                if HIDDEN_TAGS.contains(&tag) {
                    return;
                }
                if tag == "br" {
                    trim_trailing_space(out);
                    out.push('\n');
                    return;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    break_line(out);
                }
                for &child in &self.nodes[id].children {
                    self.render_text(child, out);
                }
                if block {
                    break_line(out);
                }
            }
        }
    }

    pub fn value(&self, id: usize) -> Result<Option<String>, DomError> {
        let node = self.element(id)?;
        let NodeKind::Element { tag, .. } = &node.kind else {
            return Ok(None);
        };
        Ok(match tag.as_str() {
            "input" | "select" => Some(self.attribute(id, "value").unwrap_or("").to_string()),
            "textarea" => Some(self.text_content(id)?),
            _ => None,
        })
    }
}

fn trim_trailing_space(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

fn break_line(out: &mut String) {
    trim_trailing_space(out);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

impl ElementTree for DocumentTree {
    fn tag_name(&self, node: usize) -> Option<&str> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    fn attribute(&self, node: usize, name: &str) -> Option<&str> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn parent_element(&self, node: usize) -> Option<usize> {
        self.nodes.get(node)?.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tree: &mut DocumentTree, parent: usize, tag: &str, attrs: &[(&str, &str)]) -> usize {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let id = tree.create_element(tag, attrs);
        tree.append_child(parent, id).unwrap();
        id
    }

    fn text(tree: &mut DocumentTree, parent: usize, content: &str) -> usize {
        let id = tree.create_text(content);
        tree.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn test_connected_and_detach() {
        let mut tree = DocumentTree::new();
        let div = element(&mut tree, DocumentTree::ROOT, "div", &[]);
        let inner = element(&mut tree, div, "span", &[]);
        assert!(tree.is_connected(inner).unwrap());

        tree.detach(div).unwrap();
        assert!(!tree.is_connected(inner).unwrap());
        assert!(tree.is_connected(DocumentTree::ROOT).unwrap());
    }

    #[test]
    fn test_unknown_node_is_stale() {
        let tree = DocumentTree::new();
        assert_eq!(tree.is_connected(99), Err(DomError::StaleElement(99)));
    }

    #[test]
    fn test_content_editable_inheritance() {
        let mut tree = DocumentTree::new();
        let editor = element(&mut tree, DocumentTree::ROOT, "div", &[("contenteditable", "true")]);
        let child = element(&mut tree, editor, "p", &[]);
        let locked = element(&mut tree, editor, "p", &[("contenteditable", "false")]);
        let plain = element(&mut tree, DocumentTree::ROOT, "div", &[("contenteditable", "")]);
        let bogus = element(&mut tree, DocumentTree::ROOT, "div", &[("contenteditable", "maybe")]);

        assert!(tree.is_content_editable(editor).unwrap());
        assert!(tree.is_content_editable(child).unwrap());
        assert!(!tree.is_content_editable(locked).unwrap());
        assert!(tree.is_content_editable(plain).unwrap());
        assert!(!tree.is_content_editable(bogus).unwrap());
    }

    #[test]
    fn test_has_editable_descendant() {
        let mut tree = DocumentTree::new();
        let dialog = element(&mut tree, DocumentTree::ROOT, "div", &[("role", "dialog")]);
        assert!(!tree.has_editable_descendant(dialog).unwrap());
        element(&mut tree, dialog, "div", &[("contenteditable", "TRUE")]);
        assert!(tree.has_editable_descendant(dialog).unwrap());
    }

    #[test]
    fn test_inner_text_blocks_and_breaks() {
        let mut tree = DocumentTree::new();
        let root = element(&mut tree, DocumentTree::ROOT, "div", &[]);
        let first = element(&mut tree, root, "div", &[]);
        text(&mut tree, first, "Hello   there");
        let second = element(&mut tree, root, "div", &[]);
        text(&mut tree, second, "Line one");
        element(&mut tree, second, "br", &[]);
        text(&mut tree, second, "Line two");
        let style = element(&mut tree, root, "style", &[]);
        text(&mut tree, style, ".x { color: red }");

        assert_eq!(
            tree.inner_text(root).unwrap(),
            "Hello there\nLine one\nLine two"
        );
    }

    #[test]
    fn test_value_only_for_form_fields() {
        let mut tree = DocumentTree::new();
        let input = element(&mut tree, DocumentTree::ROOT, "input", &[("value", "Re: Plans")]);
        let area = element(&mut tree, DocumentTree::ROOT, "textarea", &[]);
        text(&mut tree, area, "notes");
        let div = element(&mut tree, DocumentTree::ROOT, "div", &[("value", "x")]);

        assert_eq!(tree.value(input).unwrap().as_deref(), Some("Re: Plans"));
        assert_eq!(tree.value(area).unwrap().as_deref(), Some("notes"));
        assert_eq!(tree.value(div).unwrap(), None);
    }

    #[test]
    fn test_select_skips_detached() {
        let mut tree = DocumentTree::new();
        let kept = element(&mut tree, DocumentTree::ROOT, "div", &[("class", "a3s")]);
        let gone = element(&mut tree, DocumentTree::ROOT, "div", &[("class", "a3s")]);
        tree.detach(gone).unwrap();

        let selectors = SelectorList::parse(".a3s").unwrap();
        assert_eq!(tree.select(&selectors), vec![kept]);
    }
}
