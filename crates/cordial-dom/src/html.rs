//! Lenient HTML fragment parsing and serialization.

use cordial_protocols::DomError;

use crate::tree::{DocumentTree, NodeKind};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Parse `html` and append the resulting nodes to `parent`.
///
/// Unknown or unbalanced markup never fails: stray end tags are dropped and
/// unclosed elements are closed at the end of input.
pub(crate) fn parse_fragment(
    tree: &mut DocumentTree,
    parent: usize,
    html: &str,
) -> Result<(), DomError> {
    let mut stack = vec![parent];
    let mut text = String::new();
    let mut rest = html;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            flush_text(tree, &stack, &mut text)?;
            rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            if let Some(end) = after.find('>') {
                flush_text(tree, &stack, &mut text)?;
                let name = after[..end].trim().to_ascii_lowercase();
                let open = stack
                    .iter()
                    .skip(1)
                    .rposition(|&id| tag_of(tree, id) == Some(name.as_str()));
                if let Some(index) = open {
                    stack.truncate(index + 1);
                }
                rest = &after[end + 1..];
                continue;
            }
        }

        if let Some(after) = rest.strip_prefix("<!") {
            if let Some(end) = after.find('>') {
                flush_text(tree, &stack, &mut text)?;
                rest = &after[end + 1..];
                continue;
            }
        }

        if rest.len() > 1 && rest.starts_with('<') && rest.as_bytes()[1].is_ascii_alphabetic() {
            if let Some(tag) = parse_start_tag(rest) {
                flush_text(tree, &stack, &mut text)?;
                let element = tree.create_element(&tag.name, tag.attrs);
                tree.append_child(current(&stack), element)?;
                if !tag.self_closing && !VOID_TAGS.contains(&tag.name.as_str()) {
                    stack.push(element);
                }
                rest = &rest[tag.consumed..];
                continue;
            }
        }

        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            text.push(ch);
        }
        rest = chars.as_str();
    }

    flush_text(tree, &stack, &mut text)
}

fn current(stack: &[usize]) -> usize {
    stack.last().copied().unwrap_or(DocumentTree::ROOT)
}

fn tag_of(tree: &DocumentTree, id: usize) -> Option<&str> {
    match &tree.node(id).ok()?.kind {
        NodeKind::Element { tag, .. } => Some(tag),
        NodeKind::Text(_) => None,
    }
}

fn flush_text(tree: &mut DocumentTree, stack: &[usize], text: &mut String) -> Result<(), DomError> {
    if text.is_empty() {
        return Ok(());
    }
    let node = tree.create_text(&decode_entities(text));
    text.clear();
    tree.append_child(current(stack), node)
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    consumed: usize,
}

/// Parse a start tag at the beginning of `input`, which starts with `<`.
fn parse_start_tag(input: &str) -> Option<StartTag> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 1;
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = input[1..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            return None;
        }
        match bytes[i] {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    self_closing: false,
                    consumed: i + 1,
                });
            }
            b'/' => {
                i += 1;
                if i < len && bytes[i] == b'>' {
                    return Some(StartTag {
                        name,
                        attrs,
                        self_closing: true,
                        consumed: i + 1,
                    });
                }
            }
            _ => {
                let start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && !b"=>/".contains(&bytes[i]) {
                    i += 1;
                }
                if start == i {
                    i += 1;
                    continue;
                }
                let attr_name = input[start..i].to_ascii_lowercase();
                while i < len && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }

                let value = if i < len && bytes[i] == b'=' {
                    i += 1;
                    while i < len && bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i >= len {
                        return None;
                    }
                    if bytes[i] == b'"' || bytes[i] == b'\'' {
                        let quote = bytes[i] as char;
                        let value_start = i + 1;
                        let end = input[value_start..].find(quote)?;
                        i = value_start + end + 1;
                        decode_entities(&input[value_start..value_start + end])
                    } else {
                        let value_start = i;
                        while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                            i += 1;
                        }
                        decode_entities(&input[value_start..i])
                    }
                } else {
                    String::new()
                };

                if !attrs.iter().any(|(k, _)| *k == attr_name) {
                    attrs.push((attr_name, value));
                }
            }
        }
    }
}

/// Decode named and numeric character references.
pub(crate) fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Serialize the children of `id` as markup.
pub(crate) fn serialize_children(tree: &DocumentTree, id: usize) -> Result<String, DomError> {
    let mut out = String::new();
    for &child in &tree.node(id)?.children {
        serialize_node(tree, child, &mut out)?;
    }
    Ok(out)
}

fn serialize_node(tree: &DocumentTree, id: usize, out: &mut String) -> Result<(), DomError> {
    let node = tree.node(id)?;
    match &node.kind {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&tag.as_str()) {
                return Ok(());
            }
            for &child in &node.children {
                serialize_node(tree, child, out)?;
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
    Ok(())
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}
