//! A small owned element tree built on `quick-xml`.
//!
//! The part decoder needs DOM-style lookups (first descendant by name, all
//! descendants by name, direct children), so the event stream is folded into
//! [`Element`] values once and queried from there.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{DecodeError, DecodeResult};

/// Content of an element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    nodes: Vec<Node>,
}

impl Element {
    /// Tag name as written in the document.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the named attribute, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements in document order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// All descendants (excluding `self`) in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children().rev().collect(),
        }
    }

    /// First descendant with the given tag name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name == name)
    }

    /// All descendants with the given tag name, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |e| e.name == name)
    }

    /// `self` if it has the given name, otherwise the first matching descendant.
    #[must_use]
    pub fn find_inclusive(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            Some(self)
        } else {
            self.find(name)
        }
    }

    /// Text of this element and all descendants, in document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                Node::Element(element) => element.push_text(out),
                Node::Text(text) => out.push_str(text),
            }
        }
    }

    fn push_node_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.nodes.last_mut() {
            last.push_str(text);
        } else {
            self.nodes.push(Node::Text(text.to_string()));
        }
    }

    /// Serialize back to markup, for diagnostics.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {key}=\"{}\"", escape(value.as_str()));
        }
        if self.nodes.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.nodes {
            match node {
                Node::Element(element) => element.write_markup(out),
                Node::Text(text) => out.push_str(&escape(text.as_str())),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            nodes: Vec::new(),
        })
    }
}

/// Pre-order iterator over an element's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children().rev());
        Some(next)
    }
}

/// Parse a complete document and return its root element.
///
/// Any reader error, unbalanced tag, second root element or non-whitespace
/// text outside the root is reported as [`DecodeError::MalformedXml`].
pub fn parse_document(xml: &str) -> DecodeResult<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Start(start) => {
                let element = Element::from_start(&start).map_err(|e| malformed(&reader, e))?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = Element::from_start(&start).map_err(|e| malformed(&reader, e))?;
                attach(&mut stack, &mut root, element).map_err(|e| malformed(&reader, e))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(&reader, "unmatched closing tag".to_string()))?;
                attach(&mut stack, &mut root, element).map_err(|e| malformed(&reader, e))?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(&reader, e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.push_node_text(&text);
                } else if !text.trim().is_empty() {
                    return Err(malformed(&reader, "text outside of root element".to_string()));
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.push_node_text(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(&reader, format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| malformed(&reader, "document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.nodes.push(Node::Element(element));
        Ok(())
    } else if root.is_some() {
        Err(format!("second root element <{}>", element.name))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn malformed(reader: &Reader<&[u8]>, detail: String) -> DecodeError {
    DecodeError::MalformedXml {
        position: reader.buffer_position(),
        detail,
    }
}
