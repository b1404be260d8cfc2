//! Pull-based XML tokenizer.
//!
//! The tokenizer walks an in-memory document strictly forward and copies
//! each token's text into the caller's [`Arena`]. It knows nothing about
//! entities, CDATA, namespaces or DTDs: a tag is everything from `<` to the
//! next `>`, and text is everything up to the next `<`.

use crate::arena::Arena;
use crate::error::{Error, Result};

/// Kind of a tag-shaped token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Open,
    Close,
    SelfClose,
    Declaration,
    Comment,
    Doctype,
}

impl TagType {
    /// Classify the verbatim text of a tag, `<` through `>`.
    ///
    /// Rules are tried in order and the first match wins: close,
    /// self-close, declaration, comment, doctype, open.
    pub fn classify(tag: &str) -> Self {
        if tag.starts_with("</") {
            TagType::Close
        } else if tag.len() >= 3 && tag.ends_with("/>") {
            TagType::SelfClose
        } else if tag.starts_with("<?") && tag.len() >= 4 && tag.ends_with("?>") {
            TagType::Declaration
        } else if tag.starts_with("<!--") {
            TagType::Comment
        } else if tag.starts_with("<!") {
            TagType::Doctype
        } else {
            TagType::Open
        }
    }

    /// Open, close or self-closing element tag
    pub fn is_element(self) -> bool {
        matches!(self, TagType::Open | TagType::Close | TagType::SelfClose)
    }
}

/// One token, borrowed from the arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Verbatim tag text such as `<rootfile full-path="x.opf"/>`
    Tag(TagType, &'a str),
    /// Character data between tags
    Text(&'a str),
    Eof,
    /// A `<` with no closing `>`
    Malformed,
}

/// Forward-only cursor over a text buffer.
#[derive(Debug, Clone)]
pub struct XmlTokenizer<'s> {
    content: &'s str,
    cursor: usize,
}

impl<'s> XmlTokenizer<'s> {
    pub fn new(content: &'s str) -> Self {
        Self { content, cursor: 0 }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Produce the next token, copying its text into `arena`.
    ///
    /// A malformed token leaves the cursor where it was, so every later
    /// call reports the same condition.
    pub fn next<'a>(&mut self, arena: &'a Arena) -> Result<Token<'a>> {
        let bytes = self.content.as_bytes();

        while let Some(&c) = bytes.get(self.cursor) {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.cursor += 1,
                b'<' => {
                    let rest = &self.content[self.cursor..];
                    let Some(close) = rest.find('>') else {
                        return Ok(Token::Malformed);
                    };
                    let tag = arena.alloc_str(&rest[..=close])?;
                    self.cursor += close + 1;
                    return Ok(Token::Tag(TagType::classify(tag), tag));
                }
                b'&' => {
                    tracing::warn!(offset = self.cursor, "skipping unhandled character '&'");
                    self.cursor += 1;
                }
                _ => {
                    let rest = &self.content[self.cursor..];
                    let end = rest.find('<').unwrap_or(rest.len());
                    let text = arena.alloc_str(&rest[..end])?;
                    self.cursor += end;
                    return Ok(Token::Text(text));
                }
            }
        }

        Ok(Token::Eof)
    }
}

/// Extract the element name of a tag into `arena`.
///
/// The name runs from just after `<` (or `</`) to the first whitespace,
/// `/` or `>`.
pub fn tag_name<'a>(arena: &'a Arena, tag: &str) -> Result<&'a str> {
    let body = tag
        .strip_prefix("</")
        .or_else(|| tag.strip_prefix('<'))
        .ok_or_else(|| Error::MalformedXml(format!("not a tag: {tag:?}")))?;

    let end = body
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .ok_or_else(|| Error::MalformedXml(format!("unterminated tag name: {tag:?}")))?;

    Ok(arena.alloc_str(&body[..end])?)
}

/// Extract the value of attribute `name` from a tag into `arena`.
///
/// This is a plain substring search for `name`, so it can match inside
/// another attribute's value. Returns `Ok(None)` when `name` does not occur
/// at all.
pub fn tag_attribute<'a>(arena: &'a Arena, tag: &str, name: &str) -> Result<Option<&'a str>> {
    let Some(found) = tag.find(name) else {
        return Ok(None);
    };

    let after_name = tag[found + name.len()..].trim_start_matches(' ');
    let Some(after_eq) = after_name.strip_prefix('=') else {
        return Err(Error::MalformedXml(format!(
            "attribute {name} is not followed by '='"
        )));
    };

    let after_eq = after_eq.trim_start_matches(' ');
    let quote = match after_eq.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => {
            return Err(Error::MalformedXml(format!(
                "attribute {name} has no opening quote"
            )));
        }
    };

    let value = &after_eq[1..];
    let end = value
        .find(quote)
        .ok_or_else(|| Error::MalformedXml(format!("attribute {name} has no closing quote")))?;

    Ok(Some(arena.alloc_str(&value[..end])?))
}
