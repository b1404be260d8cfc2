//! Minimal XML tokenization for `container.xml` and OPF package documents.

mod tokenizer;

pub use tokenizer::{TagType, Token, XmlTokenizer, tag_attribute, tag_name};
