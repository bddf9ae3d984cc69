//! Reading MediaWiki exports: streaming page traversal and markup stripping.
//!
//! [`reader`] walks a (possibly bzip2-compressed) `pages-articles` XML dump
//! one page at a time, surfacing only the latest revision's text.
//! [`wikitext`] turns that raw markup into flat plain text suitable for
//! sentence segmentation.

pub mod reader;
pub mod wikitext;

pub use reader::{DumpReader, Page};
pub use wikitext::extract_plain_text;
