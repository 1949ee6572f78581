//! CSS selector parsing and matching.

use thiserror::Error;

/// Selector parse failure.
///
/// Documents treat an unparsable selector as one that matches nothing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unexpected end of selector")]
    UnexpectedEnd,

    #[error("Unsupported selector syntax: {0}")]
    Unsupported(String),
}

/// Read-only view of an element tree used for matching.
pub(crate) trait ElementTree {
    /// Lowercase tag name, or `None` when the node is not an element.
    fn tag_name(&self, node: usize) -> Option<&str>;

    fn attribute(&self, node: usize, name: &str) -> Option<&str>;

    fn parent_element(&self, node: usize) -> Option<usize>;
}

/// A parsed, comma-separated list of selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    parts: Vec<Part>,
}

/// `combinator` relates this part to the one on its left; ignored for the first part.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    combinator: Combinator,
    compound: Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    matcher: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        Parser::new(input).parse_list()
    }

    pub(crate) fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, node))
    }
}

impl ComplexSelector {
    fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        self.match_part(tree, self.parts.len() - 1, node)
    }

    fn match_part<T: ElementTree + ?Sized>(&self, tree: &T, index: usize, node: usize) -> bool {
        let part = &self.parts[index];
        if !part.compound.matches(tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match part.combinator {
            Combinator::Child => tree
                .parent_element(node)
                .is_some_and(|parent| self.match_part(tree, index - 1, parent)),
            Combinator::Descendant => {
                let mut current = tree.parent_element(node);
                while let Some(ancestor) = current {
                    if self.match_part(tree, index - 1, ancestor) {
                        return true;
                    }
                    current = tree.parent_element(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if let Some(ref wanted) = self.tag {
            if !wanted.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.iter().all(|id| tree.attribute(node, "id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = tree.attribute(node, "class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attributes.iter().all(|a| a.matches(tree.attribute(node, &a.name)))
    }
}

impl AttributeSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let Some((op, ref expected)) = self.matcher else {
            return true;
        };
        let expected = expected.as_str();
        match op {
            AttributeOp::Equals => value == expected,
            AttributeOp::Includes => {
                !expected.is_empty() && value.split_whitespace().any(|w| w == expected)
            }
            AttributeOp::DashMatch => {
                value == expected
                    || (value.starts_with(expected) && value[expected.len()..].starts_with('-'))
            }
            AttributeOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttributeOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttributeOp::Substring => !expected.is_empty() && value.contains(expected),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar { ch, pos: self.pos },
            None => SelectorError::UnexpectedEnd,
        }
    }

    /// Returns whether any whitespace was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, ch: char) -> Result<(), SelectorError> {
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_list(mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut parts = vec![Part {
            combinator: Combinator::Descendant,
            compound: self.parse_compound()?,
        }];

        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    parts.push(Part {
                        combinator: Combinator::Child,
                        compound: self.parse_compound()?,
                    });
                }
                Some(ch @ ('+' | '~')) => {
                    return Err(SelectorError::Unsupported(format!("combinator '{}'", ch)));
                }
                Some(_) if had_ws => parts.push(Part {
                    combinator: Combinator::Descendant,
                    compound: self.parse_compound()?,
                }),
                Some(_) => return Err(self.unexpected()),
            }
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => return Err(SelectorError::Unsupported("pseudo-class".to_string())),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                let escaped = self.peek().ok_or(SelectorError::UnexpectedEnd)?;
                ident.push(escaped);
                self.pos += 1;
            } else if is_ident_char(c) {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.unexpected());
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttributeSelector { name, matcher: None });
            }
            Some('=') => {
                self.pos += 1;
                AttributeOp::Equals
            }
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.pos += 1;
                self.expect('=')?;
                match c {
                    '~' => AttributeOp::Includes,
                    '|' => AttributeOp::DashMatch,
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    _ => AttributeOp::Substring,
                }
            }
            _ => return Err(self.unexpected()),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_quoted(q)?
            }
            Some(_) => self.parse_ident()?,
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_ws();

        if matches!(self.peek(), Some('i' | 'I' | 's' | 'S')) {
            return Err(SelectorError::Unsupported("attribute case flag".to_string()));
        }
        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            matcher: Some((op, value)),
        })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(SelectorError::UnexpectedEnd),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or(SelectorError::UnexpectedEnd)?;
                    value.push(escaped);
                    self.pos += 1;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
