//! RSS and Atom extraction.
//!
//! The dialect is chosen from the root element: `{http://www.w3.org/2005/Atom}feed`
//! means Atom, anything else is treated as RSS.
//!
//! - **RSS**: un-namespaced `item` elements at any depth; `title`, `link` and
//!   `description` are read from direct children.
//! - **Atom**: `entry` elements in the Atom namespace at any depth; `title`
//!   text and the `href` of the first `link` child.
//!
//! Only the first `max_items` items are considered, but the whole document is
//! still read so that malformed XML anywhere is reported as a parse error.
//!
//! Text is decoded with the encoding named in the XML declaration (UTF-8 when
//! there is none). Entities declared in the DOCTYPE internal subset are
//! expanded alongside the five predefined ones.

use crate::error::ScrapeError;
use crate::models::Candidate;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::collections::HashMap;
use tracing::{debug, instrument};

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

/// Upper bound on the expanded text of one declared entity.
const MAX_ENTITY_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Rss,
    Atom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
}

#[derive(Debug, Default)]
struct ItemBuilder {
    depth: usize,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

impl ItemBuilder {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
        }
    }

    fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Title => self.title.is_some(),
            Field::Link => self.link.is_some(),
            Field::Description => self.description.is_some(),
        }
    }

    /// Items without a (non-empty) title are dropped.
    fn build(self, dialect: Dialect) -> Option<Candidate> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let link = self.link.unwrap_or_default();
        let match_text = match dialect {
            Dialect::Rss => format!("{} {}", title, self.description.unwrap_or_default()),
            Dialect::Atom => title.clone(),
        };
        Some(Candidate {
            title,
            link,
            match_text,
        })
    }
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

/// Element facts lifted out of a parser event so the reader borrow can end.
struct Element {
    in_atom_ns: bool,
    unbound: bool,
    local: Vec<u8>,
    href: Option<String>,
}

impl Element {
    fn from_event(ns: &ResolveResult, start: &BytesStart, entities: &Entities) -> Self {
        let href = start
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == b"href")
            .map(|attr| {
                attr.decode_and_unescape_value_with(start.decoder(), |name| entities.lookup(name))
                    .map(|value| value.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
            });
        Self {
            in_atom_ns: matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS),
            unbound: matches!(ns, ResolveResult::Unbound),
            local: start.local_name().as_ref().to_vec(),
            href,
        }
    }

    fn is(&self, local: &[u8]) -> bool {
        self.local == local
    }
}

struct FeedParser {
    max_items: usize,
    dialect: Option<Dialect>,
    depth: usize,
    root_closed: bool,
    items_seen: usize,
    item: Option<ItemBuilder>,
    capture: Option<Capture>,
    candidates: Vec<Candidate>,
}

impl FeedParser {
    fn new(max_items: usize) -> Self {
        Self {
            max_items,
            dialect: None,
            depth: 0,
            root_closed: false,
            items_seen: 0,
            item: None,
            capture: None,
            candidates: Vec::new(),
        }
    }

    fn open(&mut self, element: Element, empty: bool) -> Result<(), ScrapeError> {
        if self.depth == 0 {
            if self.root_closed {
                return Err(ScrapeError::Parse("junk after document element".into()));
            }
            let dialect = if element.in_atom_ns && element.is(b"feed") {
                Dialect::Atom
            } else {
                Dialect::Rss
            };
            debug!(?dialect, "Detected feed dialect");
            self.dialect = Some(dialect);
        }
        self.depth += 1;
        let dialect = self.dialect.unwrap_or(Dialect::Rss);

        let is_item = match dialect {
            Dialect::Atom => element.in_atom_ns && element.is(b"entry"),
            Dialect::Rss => element.unbound && element.is(b"item"),
        };

        if self.item.is_none() && is_item {
            self.items_seen += 1;
            if self.items_seen <= self.max_items {
                self.item = Some(ItemBuilder {
                    depth: self.depth,
                    ..ItemBuilder::default()
                });
            }
        } else if let Some(item) = self.item.as_mut() {
            if self.depth == item.depth + 1 && self.capture.is_none() {
                let field = match dialect {
                    Dialect::Atom if element.in_atom_ns => {
                        if element.is(b"link") && item.link.is_none() {
                            item.link = Some(element.href.as_deref().unwrap_or_default().trim().to_string());
                        }
                        element.is(b"title").then_some(Field::Title)
                    }
                    Dialect::Rss if element.unbound => match element.local.as_slice() {
                        b"title" => Some(Field::Title),
                        b"link" => Some(Field::Link),
                        b"description" => Some(Field::Description),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(field) = field.filter(|f| !item.is_set(*f)) {
                    self.capture = Some(Capture {
                        field,
                        depth: self.depth,
                        text: String::new(),
                    });
                }
            }
        }

        if empty {
            self.close();
        }
        Ok(())
    }

    fn close(&mut self) {
        let depth = self.depth;
        if let Some(capture) = self.capture.take_if(|c| c.depth == depth) {
            if let Some(item) = self.item.as_mut() {
                *item.slot(capture.field) = Some(capture.text.trim().to_string());
            }
        }
        if let Some(item) = self.item.take_if(|i| i.depth == depth) {
            let dialect = self.dialect.unwrap_or(Dialect::Rss);
            if let Some(candidate) = item.build(dialect) {
                self.candidates.push(candidate);
            }
        }
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.root_closed = true;
        }
    }

    fn text(&mut self, text: &str) -> Result<(), ScrapeError> {
        if self.depth == 0 && !text.trim().is_empty() {
            return Err(ScrapeError::Parse("text outside the document element".into()));
        }
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<Candidate>, ScrapeError> {
        if self.dialect.is_none() {
            return Err(ScrapeError::Parse("no element found".into()));
        }
        if self.depth > 0 {
            return Err(ScrapeError::Parse("unclosed element at end of document".into()));
        }
        Ok(self.candidates)
    }
}

/// General entities known while reading one document.
#[derive(Debug, Default)]
struct Entities {
    declared: HashMap<String, String>,
}

impl Entities {
    /// Record the `<!ENTITY name "value">` declarations of a DOCTYPE.
    ///
    /// Parameter entities and external entities are skipped. The first
    /// declaration of a name wins.
    fn declare(&mut self, doctype: &str) -> Result<(), ScrapeError> {
        let mut rest = doctype;
        while let Some(start) = rest.find("<!ENTITY") {
            rest = rest[start + "<!ENTITY".len()..].trim_start();
            if rest.starts_with('%') {
                continue;
            }
            let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (name, after) = rest.split_at(name_end);
            let after = after.trim_start();
            let Some(quote) = after.chars().next().filter(|c| matches!(c, '"' | '\'')) else {
                // SYSTEM or PUBLIC
                rest = after;
                continue;
            };
            let body = &after[1..];
            let close = body
                .find(quote)
                .ok_or_else(|| ScrapeError::Parse(format!("unterminated value for entity {name}")))?;
            let value = self.expand(&body[..close])?;
            debug!(entity = name, "Declared entity");
            self.declared.entry(name.to_string()).or_insert(value);
            rest = &body[close + 1..];
        }
        Ok(())
    }

    /// Replace every reference in an entity value with its text.
    fn expand(&self, value: &str) -> Result<String, ScrapeError> {
        let mut expanded = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(amp) = rest.find('&') {
            expanded.push_str(&rest[..amp]);
            let tail = &rest[amp + 1..];
            let semi = tail
                .find(';')
                .ok_or_else(|| ScrapeError::Parse("unterminated reference in entity value".into()))?;
            expanded.push_str(&self.resolve(&tail[..semi])?);
            if expanded.len() > MAX_ENTITY_LEN {
                return Err(ScrapeError::Parse("entity expansion too large".into()));
            }
            rest = &tail[semi + 1..];
        }
        expanded.push_str(rest);
        Ok(expanded)
    }

    /// Text of a named entity, predefined or declared.
    fn lookup(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.declared.get(name).map(String::as_str))
    }

    /// Resolve a general reference (`&name;`) to its text.
    ///
    /// Character references, the five predefined XML entities and declared
    /// entities are known; anything else makes the document malformed.
    fn resolve(&self, name: &str) -> Result<String, ScrapeError> {
        if let Some(code) = name.strip_prefix('#') {
            let parsed = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            return parsed
                .and_then(char::from_u32)
                .map(String::from)
                .ok_or_else(|| ScrapeError::Parse(format!("invalid character reference &{name};")));
        }
        self.lookup(name)
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Parse(format!("undefined entity &{name};")))
    }
}

/// Extract up to `max_items` candidates from an RSS or Atom document.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the document is empty, not well-formed,
/// not valid in its declared encoding, or uses an entity that is neither
/// predefined nor declared.
#[instrument(level = "debug", skip_all, fields(bytes = xml.len()))]
pub fn extract(xml: &[u8], max_items: usize) -> Result<Vec<Candidate>, ScrapeError> {
    let mut reader = NsReader::from_reader(xml);
    let mut parser = FeedParser::new(max_items);
    let mut entities = Entities::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf)? {
            (ns, Event::Start(e)) => {
                let element = Element::from_event(&ns, &e, &entities);
                parser.open(element, false)?;
            }
            (ns, Event::Empty(e)) => {
                let element = Element::from_event(&ns, &e, &entities);
                parser.open(element, true)?;
            }
            (_, Event::End(_)) => parser.close(),
            (_, Event::Text(e)) => parser.text(&e.decode()?)?,
            (_, Event::CData(e)) => parser.text(&e.decode()?)?,
            (_, Event::GeneralRef(e)) => {
                let resolved = entities.resolve(&e.decode()?)?;
                parser.text(&resolved)?;
            }
            (_, Event::DocType(e)) => entities.declare(&e.decode()?)?,
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    let items_seen = parser.items_seen;
    let candidates = parser.finish()?;
    debug!(items_seen, kept = candidates.len(), "Parsed feed");
    Ok(candidates)
}
