//! Generic XML element tree and the provider that builds it.
//!
//! Element and attribute names are stored by local name: namespace prefixes
//! (`se:`, `sld:`, ...) are dropped while building the tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use raster_common::{RasterError, RasterResult};

/// A node inside an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with its attributes and content in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: append a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Concatenated direct text content, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out.trim().to_string()
    }

    /// Trimmed text of the first child element with the given name.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(XmlElement::text)
    }
}

/// Produces an element tree from a serialized document.
pub trait XmlTreeProvider {
    fn parse_tree(&self, document: &[u8]) -> RasterResult<XmlElement>;
}

/// Reference provider backed by `quick-xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlProvider;

impl QuickXmlProvider {
    /// Parse a document held in a string.
    pub fn parse_str(&self, document: &str) -> RasterResult<XmlElement> {
        self.parse_tree(document.as_bytes())
    }
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn start_element<R>(reader: &Reader<R>, e: &BytesStart) -> RasterResult<XmlElement> {
    let mut element = XmlElement::new(local_name(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            RasterError::malformed(format!(
                "bad attribute at position {}: {}",
                reader.buffer_position(),
                err
            ))
        })?;
        let key = local_name(attr.key.as_ref());
        // Namespace declarations are not content.
        if key == "xmlns" || attr.key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| RasterError::malformed(format!("bad attribute value: {}", err)))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

impl XmlTreeProvider for QuickXmlProvider {
    fn parse_tree(&self, document: &[u8]) -> RasterResult<XmlElement> {
        let mut reader = Reader::from_reader(document);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    stack.push(start_element(&reader, &e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = start_element(&reader, &e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None if root.is_none() => root = Some(element),
                        None => return Err(RasterError::malformed("multiple root elements")),
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| RasterError::malformed("unbalanced end tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None if root.is_none() => root = Some(element),
                        None => return Err(RasterError::malformed("multiple root elements")),
                    }
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|err| RasterError::malformed(format!("bad text: {}", err)))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(RasterError::malformed(format!(
                        "XML parsing error at position {}: {:?}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(RasterError::malformed("unexpected end of document"));
        }
        root.ok_or_else(|| RasterError::malformed("empty document"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_strips_prefixes() {
        let xml = r#"<?xml version="1.0"?>
<se:CoverageStyle xmlns:se="http://www.opengis.net/se" version="1.1.0">
    <se:Rule>
        <se:RasterSymbolizer>
            <se:Opacity> 0.5 </se:Opacity>
        </se:RasterSymbolizer>
    </se:Rule>
</se:CoverageStyle>"#;

        let root = QuickXmlProvider.parse_str(xml).unwrap();
        assert_eq!(root.name, "CoverageStyle");
        assert_eq!(root.attr("version"), Some("1.1.0"));
        assert!(root.attr("se").is_none());

        let symbolizer = root.child("Rule").unwrap().child("RasterSymbolizer").unwrap();
        assert_eq!(symbolizer.child_text("Opacity").as_deref(), Some("0.5"));
    }

    #[test]
    fn test_empty_elements_and_entities() {
        let xml = r#"<a><b x="1 &amp; 2"/><c>x &lt; y</c></a>"#;
        let root = QuickXmlProvider.parse_str(xml).unwrap();
        assert_eq!(root.child("b").unwrap().attr("x"), Some("1 & 2"));
        assert_eq!(root.child_text("c").as_deref(), Some("x < y"));
    }

    #[test]
    fn test_unbalanced_document_is_malformed() {
        let result = QuickXmlProvider.parse_str("<a><b></a>");
        assert!(matches!(result, Err(RasterError::Malformed(_))));

        let result = QuickXmlProvider.parse_str("   ");
        assert!(matches!(result, Err(RasterError::Malformed(_))));
    }
}
