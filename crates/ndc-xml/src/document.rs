//! Document parsing and serialization

use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use roxmltree::ParsingOptions;
use tracing::trace;

use crate::node::{Attribute, Element, NamespaceDecl, Node};
use crate::qname::XML_NS;
use crate::{Error, Result};

/// Options controlling how a document is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per indentation level (0 writes everything on one line)
    pub indent: usize,
    /// Whether to emit the `<?xml ...?>` declaration
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
        }
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document element
    pub root: Element,
}

impl Document {
    /// Wrap an element as a document
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a document from text
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_named(text, "<memory>")
    }

    /// Parse a document, naming the source in errors
    pub fn parse_named(text: &str, source_name: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)
            .map_err(|e| Error::parse(source_name, e.to_string()))?;
        let root = convert_element(doc.root_element());
        trace!("Parsed {} with root <{}>", source_name, root.qualified_name());
        Ok(Self { root })
    }

    /// Read and parse a document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e.to_string()))?;
        Self::parse_named(&text, &path.display().to_string())
    }

    /// Serialize with default options
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_string_with(&WriteOptions::default())
    }

    /// Serialize with the given options
    pub fn to_string_with(&self, options: &WriteOptions) -> Result<String> {
        let mut writer = if options.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', options.indent)
        } else {
            Writer::new(Vec::new())
        };

        if options.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(|e| Error::Write(e.to_string()))?;
        }
        write_element(&mut writer, &self.root)?;

        let mut text =
            String::from_utf8(writer.into_inner()).map_err(|e| Error::Write(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    /// Serialize and write to `path`, replacing any existing file
    pub fn write_to_file(&self, path: &Path, options: &WriteOptions) -> Result<()> {
        let text = self.to_string_with(options)?;
        std::fs::write(path, text).map_err(|e| Error::io(path.display().to_string(), e.to_string()))
    }
}

fn convert_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let namespace = tag.namespace().map(str::to_string);
    let prefix = tag
        .namespace()
        .and_then(|ns| node.lookup_prefix(ns))
        .map(str::to_string);

    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    let namespaces = node
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl::new(ns.name(), ns.uri()))
        .collect();

    let attributes = node
        .attributes()
        .map(|attr| {
            let name = match attr.namespace() {
                Some(XML_NS) => format!("xml:{}", attr.name()),
                Some(ns) => match node.lookup_prefix(ns) {
                    Some(prefix) => format!("{}:{}", prefix, attr.name()),
                    None => attr.name().to_string(),
                },
                None => attr.name().to_string(),
            };
            Attribute {
                name,
                value: attr.value().to_string(),
            }
        })
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(Node::Element(convert_element(child)));
        } else if child.is_text() {
            if let Some(text) = child.text().filter(|t| !t.trim().is_empty()) {
                children.push(Node::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                children.push(Node::Comment(text.to_string()));
            }
        }
    }

    Element {
        prefix,
        name: tag.name().to_string(),
        namespace,
        namespaces,
        attributes,
        children,
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_str());
    for decl in &element.namespaces {
        let attr_name = decl.attribute_name();
        start.push_attribute((attr_name.as_str(), decl.uri.as_str()));
    }
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::Write(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::Write(e.to_string()))?;
    for child in &element.children {
        match child {
            Node::Element(inner) => write_element(writer, inner)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| Error::Write(e.to_string()))?,
            Node::Comment(text) => writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(|e| Error::Write(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(|e| Error::Write(e.to_string()))
}
