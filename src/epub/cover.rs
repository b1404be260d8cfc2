//! Cover image lookup in the OPF manifest.
//!
//! Tried in order:
//! 1. a manifest item whose `properties` include `cover-image` (EPUB 3)
//! 2. the item whose `id` matches `<meta name="cover" content="..."/>` (EPUB 2)
//! 3. the first image item whose `id` or `href` mentions "cover"

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::xml::{TagType, Token, XmlTokenizer, tag_attribute, tag_name};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
    properties: String,
}

impl ManifestItem {
    fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    fn has_property(&self, property: &str) -> bool {
        self.properties.split_ascii_whitespace().any(|p| p == property)
    }

    fn mentions_cover(&self) -> bool {
        self.id.to_ascii_lowercase().contains("cover")
            || self.href.to_ascii_lowercase().contains("cover")
    }
}

/// Archive path of the cover image referenced by the OPF at `opf_path`,
/// or `None` if the manifest names no cover.
pub fn locate_cover(arena: &mut Arena, opf: &str, opf_path: &str) -> Result<Option<String>> {
    let mut tokenizer = XmlTokenizer::new(opf);
    let mut items = Vec::new();
    let mut cover_id = None;

    arena.reset();
    loop {
        let more = match tokenizer.next(arena)? {
            Token::Tag(TagType::Open | TagType::SelfClose, text) => {
                let name = tag_name(arena, text)?;
                match local_name(name) {
                    "item" => items.push(ManifestItem {
                        id: attribute(arena, text, "id").unwrap_or_default().to_owned(),
                        href: attribute(arena, text, "href").unwrap_or_default().to_owned(),
                        media_type: attribute(arena, text, "media-type")
                            .unwrap_or_default()
                            .to_owned(),
                        properties: attribute(arena, text, "properties")
                            .unwrap_or_default()
                            .to_owned(),
                    }),
                    "meta" if attribute(arena, text, "name") == Some("cover") => {
                        if let Some(id) = attribute(arena, text, "content") {
                            cover_id = Some(id.to_owned());
                        }
                    }
                    _ => {}
                }
                true
            }
            Token::Tag(..) | Token::Text(_) => true,
            Token::Eof => false,
            Token::Malformed => {
                return Err(Error::MalformedXml(format!(
                    "unterminated tag at byte {}",
                    tokenizer.position()
                )));
            }
        };
        arena.reset();
        if !more {
            break;
        }
    }

    let cover = items
        .iter()
        .find(|item| item.has_property("cover-image"))
        .or_else(|| {
            let id = cover_id.as_deref()?;
            items.iter().find(|item| item.id == id)
        })
        .or_else(|| {
            items
                .iter()
                .find(|item| item.is_image() && item.mentions_cover())
        })
        .filter(|item| !item.href.is_empty());

    Ok(cover.map(|item| resolve_href(opf_path, &item.href)))
}

/// Element name without any namespace prefix
fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Attribute lookup that only accepts `name` where it starts a new
/// attribute, so `id` does not match inside `properties` or a value.
/// Malformed attributes are treated as absent.
fn attribute<'a>(arena: &'a Arena, tag: &str, name: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(pos) = tag[from..].find(name) {
        let at = from + pos;
        let starts_attribute = tag[..at].ends_with(|c: char| c.is_ascii_whitespace());
        let ends_name = tag[at + name.len()..].trim_start().starts_with('=');
        if starts_attribute && ends_name {
            return match tag_attribute(arena, &tag[at..], name) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(attribute = name, error = %e, "ignoring attribute");
                    None
                }
            };
        }
        from = at + name.len();
    }
    None
}

/// Resolve a manifest `href` against the directory holding the OPF.
fn resolve_href(opf_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let base = opf_path.rsplit_once('/').map_or("", |(dir, _)| dir);

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(href.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
