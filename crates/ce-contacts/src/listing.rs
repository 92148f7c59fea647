//! PROPFIND multistatus parsing
//!
//! Turns the body of a `Depth: 1` PROPFIND into the ordered list of member
//! hrefs. Elements are matched by local name inside the `DAV:` namespace, so
//! `d:`, `D:` and default-namespace responses all parse the same way.

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use reqwest::StatusCode;

use crate::error::{ContactsError, Result};

const DAV_NS: &[u8] = b"DAV:";

/// `<response>` being collected. Depth 1 is the response element itself.
#[derive(Default)]
struct PendingEntry {
    href: String,
    href_seen: bool,
    status: String,
    in_propstat: bool,
    has_success: bool,
}

enum Field {
    Href,
    Status,
}

/// Extract member hrefs from a multistatus document.
///
/// An entry is kept when its first direct `href` child is non-empty and at
/// least one `propstat/status` carries code 200. Document order is preserved and
/// nothing is deduplicated.
pub fn parse_listing(xml: &str) -> Result<Vec<String>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut hrefs = Vec::new();
    let mut saw_multistatus = false;
    let mut entry: Option<PendingEntry> = None;
    let mut depth = 0usize;
    let mut field: Option<Field> = None;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| ContactsError::XmlParseError(e.to_string()))?;
        let is_dav = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == DAV_NS);

        match event {
            Event::Start(e) => {
                let local_name = e.local_name();
                let name = local_name.as_ref();

                match entry.as_mut() {
                    None => {
                        if is_dav && name == b"multistatus" {
                            saw_multistatus = true;
                        } else if is_dav && name == b"response" {
                            entry = Some(PendingEntry::default());
                            depth = 1;
                        }
                    }
                    Some(current) => {
                        depth += 1;
                        field = None;
                        if is_dav {
                            match (depth, name) {
                                (2, b"href") if !current.href_seen => field = Some(Field::Href),
                                (2, b"propstat") => current.in_propstat = true,
                                (3, b"status") if current.in_propstat => {
                                    current.status.clear();
                                    field = Some(Field::Status);
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if entry.is_none() && is_dav && e.local_name().as_ref() == b"multistatus" {
                    saw_multistatus = true;
                }
            }
            Event::Text(e) => {
                if let (Some(current), Some(f)) = (entry.as_mut(), field.as_ref()) {
                    let text = e
                        .unescape()
                        .map_err(|e| ContactsError::XmlParseError(e.to_string()))?;
                    push_text(current, f, &text);
                }
            }
            Event::CData(e) => {
                if let (Some(current), Some(f)) = (entry.as_mut(), field.as_ref()) {
                    let raw = e.into_inner();
                    push_text(current, f, &String::from_utf8_lossy(&raw));
                }
            }
            Event::End(_) => {
                let closed = match entry.as_mut() {
                    None => false,
                    Some(current) => {
                        match field {
                            Some(Field::Href) => current.href_seen = true,
                            Some(Field::Status) if is_success_status(&current.status) => {
                                current.has_success = true;
                            }
                            _ => {}
                        }
                        field = None;
                        depth -= 1;
                        if depth == 1 {
                            current.in_propstat = false;
                        }
                        depth == 0
                    }
                };

                if closed {
                    if let Some(done) = entry.take() {
                        let href = done.href.trim();
                        if done.has_success && !href.is_empty() {
                            hrefs.push(href.to_string());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if entry.is_some() {
        return Err(ContactsError::XmlParseError(
            "unexpected end of document inside <response>".to_string(),
        ));
    }
    if !saw_multistatus {
        return Err(ContactsError::XmlParseError(
            "missing DAV: multistatus element".to_string(),
        ));
    }

    Ok(hrefs)
}

fn push_text(entry: &mut PendingEntry, field: &Field, text: &str) {
    match field {
        Field::Href => entry.href.push_str(text),
        Field::Status => entry.status.push_str(text),
    }
}

/// `HTTP/1.1 200 OK` -> true, `HTTP/1.1 404 Not Found` -> false.
/// The reason phrase and protocol version are not compared.
fn is_success_status(status_line: &str) -> bool {
    status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .is_some_and(|status| status == StatusCode::OK)
}
