//! Streaming reader for MediaWiki XML exports.
//!
//! Dumps are multi-gigabyte when compressed, so the reader never holds more
//! than one page in memory: XML events are pulled through a buffered
//! decompressor and assembled into a [`Page`] as soon as the closing
//! `</page>` tag arrives.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::types::WikivecError;

/// One page record pulled out of the dump.
///
/// `text` carries the latest revision's wikitext, or `None` when the page
/// had no revisions at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub text: Option<String>,
}

/// Lazy, finite, non-restartable traversal of a dump archive.
///
/// Implements `Iterator<Item = Result<Page, WikivecError>>`; a malformed
/// archive yields one `Err` item and then ends the sequence, matching the
/// "structure errors are fatal for the run" contract.
pub struct DumpReader {
    path: PathBuf,
    reader: DumpXml,
    finished: bool,
}

/// XML reader wrapped in the decompression layer the file extension calls for.
enum DumpXml {
    Bzip2(Reader<BufReader<BzDecoder<File>>>),
    Plain(Reader<BufReader<File>>),
}

impl DumpXml {
    fn read_event<'a>(&mut self, buf: &'a mut Vec<u8>) -> Result<Event<'a>, quick_xml::Error> {
        buf.clear();
        match self {
            DumpXml::Bzip2(reader) => reader.read_event_into(buf),
            DumpXml::Plain(reader) => reader.read_event_into(buf),
        }
    }
}

/// Page fields accumulated while walking one `<page>` element.
#[derive(Debug, Default)]
struct PartialPage {
    id: Option<i64>,
    title: Option<String>,
    text: Option<String>,
}

impl DumpReader {
    /// Opens a dump file, selecting bzip2 decompression by extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WikivecError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|err| WikivecError::Dump(format!("cannot open {}: {err}", path.display())))?;

        let is_bz2 = path.extension().map(|ext| ext == "bz2").unwrap_or(false);
        let reader = if is_bz2 {
            let decoder = BzDecoder::new(file);
            DumpXml::Bzip2(Reader::from_reader(BufReader::with_capacity(
                1024 * 1024,
                decoder,
            )))
        } else {
            DumpXml::Plain(Reader::from_reader(BufReader::with_capacity(
                1024 * 1024,
                file,
            )))
        };

        Ok(Self {
            path,
            reader,
            finished: false,
        })
    }

    /// Path of the underlying dump file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pulls the next complete page off the stream, or `None` at EOF.
    ///
    /// Pages missing an id or title are structurally unusable and skipped
    /// here; absent text is surfaced to the caller instead.
    fn read_next_page(&mut self) -> Result<Option<Page>, WikivecError> {
        let mut buf = Vec::with_capacity(8192);
        let mut text_buf = String::new();
        let mut capturing: Option<&'static str> = None;
        let mut current: Option<PartialPage> = None;

        loop {
            let event = self.reader.read_event(&mut buf)?;
            match event {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"page" => {
                        current = Some(PartialPage::default());
                    }
                    b"title" => {
                        capturing = Some("title");
                        text_buf.clear();
                    }
                    b"id" => {
                        capturing = Some("id");
                        text_buf.clear();
                    }
                    b"text" => {
                        capturing = Some("text");
                        text_buf.clear();
                    }
                    _ => {}
                },
                Event::Text(ref e) => {
                    if capturing.is_some() {
                        if let Ok(text) = e.unescape() {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::CData(ref e) => {
                    if capturing.is_some() {
                        if let Ok(text) = String::from_utf8(e.to_vec()) {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"page" => {
                        if let Some(page) = current.take() {
                            match (page.id, page.title) {
                                (Some(id), Some(title)) => {
                                    return Ok(Some(Page {
                                        id,
                                        title,
                                        text: page.text,
                                    }));
                                }
                                _ => {
                                    debug!(path = %self.path.display(), "skipping page without id/title");
                                }
                            }
                        }
                    }
                    b"title" => {
                        if let Some(page) = current.as_mut() {
                            if page.title.is_none() {
                                page.title = Some(text_buf.clone());
                            }
                        }
                        capturing = None;
                    }
                    b"id" => {
                        // The first <id> under <page> is the page id;
                        // revision and contributor ids come later.
                        if let Some(page) = current.as_mut() {
                            if page.id.is_none() {
                                page.id = text_buf.trim().parse().ok();
                            }
                        }
                        capturing = None;
                    }
                    b"text" => {
                        // Each revision overwrites the previous one, so the
                        // last revision's text wins.
                        if let Some(page) = current.as_mut() {
                            page.text = Some(text_buf.clone());
                        }
                        capturing = None;
                    }
                    _ => {}
                },
                Event::Empty(ref e) => {
                    // Blanked revisions export as a self-closing
                    // <text bytes="0" />; that is present-but-empty text,
                    // not an absent revision.
                    if e.name().as_ref() == b"text" {
                        if let Some(page) = current.as_mut() {
                            page.text = Some(String::new());
                        }
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for DumpReader {
    type Item = Result<Page, WikivecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
