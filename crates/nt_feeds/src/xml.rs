//! Minimal element tree over quick-xml events.
//!
//! Extension elements keep their prefix (`content:encoded`, `dc:date`) and
//! are matched literally. Elements in the root's own namespace are stored
//! without a prefix, so `<atom:entry>` under `<atom:feed>` is found as
//! `entry`. Lookups walk descendants in document order.

use nt_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|el| el.name == name)
    }

    /// First descendant matching `pred`, in document order.
    pub fn find_where<F>(&self, pred: F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool + Copy,
    {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_where(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.find_where(|el| el.name == name)
    }

    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// Trimmed text of the first descendant named `name`, `None` when it is
    /// missing or blank.
    pub fn find_text(&self, name: &str) -> Option<String> {
        non_empty(self.find(name)?.text())
    }

    pub fn child_text(&self, name: &str) -> Option<String> {
        non_empty(self.child(name)?.text())
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn format_err(position: impl std::fmt::Display, e: impl std::fmt::Display) -> Error {
    Error::Format(format!("at byte {}: {}", position, e))
}

fn start_element(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| format_err(reader.buffer_position(), e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| format_err(reader.buffer_position(), e))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(el));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(el);
            Ok(())
        }
        None => Err(Error::Format(format!(
            "unexpected second root element <{}>",
            el.name
        ))),
    }
}

/// Parse a complete document into its root element.
pub fn parse_document(xml: &str) -> Result<Element> {
    let xml = xml.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().check_end_names = true;

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format_err(reader.buffer_position(), e))?;
        match event {
            Event::Start(e) => {
                let el = start_element(&reader, &e)?;
                stack.push(el);
            }
            Event::Empty(e) => {
                let el = start_element(&reader, &e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| Error::Format("closing tag without opening tag".to_string()))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| format_err(reader.buffer_position(), e))?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::Format(format!("unclosed element <{}>", open.name)));
    }
    let mut root = root.ok_or_else(|| Error::Format("document has no root element".to_string()))?;
    let prefixes = document_prefixes(&root);
    if !prefixes.is_empty() {
        strip_prefixes(&mut root, &prefixes);
    }
    Ok(root)
}

/// Prefixes bound on the root to the root element's own namespace.
fn document_prefixes(root: &Element) -> Vec<String> {
    let declaration = match root.name.split_once(':') {
        Some((prefix, _)) => format!("xmlns:{}", prefix),
        None => "xmlns".to_string(),
    };
    let Some(namespace) = root.attr(&declaration) else {
        return Vec::new();
    };
    root.attrs
        .iter()
        .filter(|(_, value)| value == namespace)
        .filter_map(|(key, _)| key.strip_prefix("xmlns:"))
        .map(str::to_string)
        .collect()
}

fn strip_prefixes(el: &mut Element, prefixes: &[String]) {
    if let Some((prefix, local)) = el.name.split_once(':') {
        if prefixes.iter().any(|p| p == prefix) {
            el.name = local.to_string();
        }
    }
    for child in &mut el.children {
        if let Node::Element(child) = child {
            strip_prefixes(child, prefixes);
        }
    }
}
