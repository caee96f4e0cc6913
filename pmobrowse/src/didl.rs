//! Tolerant DIDL-Lite reader.
//!
//! Browse responses carry the DIDL-Lite document escaped inside `<Result>`.
//! Some servers inline it instead, so [`parse_browse_response`] falls back to
//! parsing the body itself when no `Result` payload is present. End tag names
//! are not checked and unknown elements are skipped.

use quick_xml::{
    Reader,
    events::{BytesStart, BytesText, Event},
};

use crate::model::{DirectoryEntry, EntryMetadata};

pub fn parse_browse_response(body: &str) -> Result<Vec<DirectoryEntry>, quick_xml::Error> {
    match extract_result(body)? {
        Some(didl) if !didl.trim().is_empty() => parse_didl(&didl),
        _ => parse_didl(body),
    }
}

/// Text content of the first `<Result>` element, unescaped.
pub fn extract_result(body: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = tolerant_reader(body);
    let mut result: Option<String> = None;
    let mut in_result = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"Result" => {
                in_result = true;
                result = Some(String::new());
            }
            Event::End(e) if in_result && e.local_name().as_ref() == b"Result" => break,
            Event::Text(e) if in_result => {
                if let Some(buf) = result.as_mut() {
                    buf.push_str(&text_of(&e));
                }
            }
            Event::CData(e) if in_result => {
                if let Some(buf) = result.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(result)
}

#[derive(Default)]
struct PendingEntry {
    is_container: bool,
    id: Option<String>,
    title: String,
    url: String,
    metadata: EntryMetadata,
    in_title: bool,
    in_res: bool,
    seen_res: bool,
}

impl PendingEntry {
    fn new(start: &BytesStart, is_container: bool) -> Self {
        Self {
            is_container,
            id: attribute(start, b"id").filter(|id| !id.is_empty()),
            ..Self::default()
        }
    }

    fn read_res_attributes(&mut self, res: &BytesStart) {
        self.metadata.size = attribute(res, b"size").and_then(|size| size.parse().ok());
        self.metadata.duration = attribute(res, b"duration").filter(|d| !d.is_empty());
        self.metadata.format = attribute(res, b"protocolInfo")
            .and_then(|info| info.split(':').nth(2).map(str::to_string))
            .filter(|format| !format.is_empty());
    }

    fn push_text(&mut self, text: &str) {
        if self.in_title {
            self.title.push_str(text);
        } else if self.in_res {
            self.url.push_str(text);
        }
    }

    fn finish(self) -> Option<DirectoryEntry> {
        let name = self.title.trim();
        if name.is_empty() {
            return None;
        }

        let mut entry = if self.is_container {
            DirectoryEntry::container(name)
        } else {
            let url = self.url.trim();
            let mut file = DirectoryEntry::file(name, (!url.is_empty()).then(|| url.to_string()));
            if !self.metadata.is_empty() {
                file.metadata = Some(self.metadata);
            }
            file
        };
        entry.object_id = self.id;
        Some(entry)
    }
}

/// Parses a DIDL-Lite document into entries, in document order.
pub fn parse_didl(xml: &str) -> Result<Vec<DirectoryEntry>, quick_xml::Error> {
    let mut reader = tolerant_reader(xml);
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" => pending = Some(PendingEntry::new(&e, false)),
                b"container" => pending = Some(PendingEntry::new(&e, true)),
                b"title" => {
                    if let Some(entry) = pending.as_mut() {
                        entry.in_title = entry.title.is_empty();
                    }
                }
                b"res" => {
                    if let Some(entry) = pending.as_mut().filter(|entry| !entry.seen_res) {
                        entry.in_res = true;
                        entry.read_res_attributes(&e);
                    }
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"res" => {
                if let Some(entry) = pending.as_mut().filter(|entry| !entry.seen_res) {
                    entry.read_res_attributes(&e);
                    entry.seen_res = true;
                }
            }
            Event::Text(e) => {
                if let Some(entry) = pending.as_mut() {
                    entry.push_text(&text_of(&e));
                }
            }
            Event::CData(e) => {
                if let Some(entry) = pending.as_mut() {
                    entry.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"title" => {
                    if let Some(entry) = pending.as_mut() {
                        entry.in_title = false;
                    }
                }
                b"res" => {
                    if let Some(entry) = pending.as_mut().filter(|entry| entry.in_res) {
                        entry.in_res = false;
                        entry.seen_res = true;
                    }
                }
                b"item" | b"container" => {
                    if let Some(entry) = pending.take().and_then(PendingEntry::finish) {
                        entries.push(entry);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn tolerant_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;
    reader
}

/// Unescaped text, or the raw text when it holds unknown entities.
fn text_of(text: &BytesText) -> String {
    match text.unescape() {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

fn attribute(start: &BytesStart, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.trim().to_string()))
}
