//! Element tree types

use crate::qname::XSD_NS;
use crate::traversal::Descendants;

/// A node in an element's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Child element
    Element(Element),

    /// Character data (whitespace-only runs are dropped on parse)
    Text(String),

    /// Comment
    Comment(String),
}

/// An attribute as written in the source, e.g. `type` or `xml:lang`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name as it should be written
    pub name: String,

    /// Unescaped attribute value
    pub value: String,
}

/// A namespace declaration (`xmlns` or `xmlns:prefix`) carried by an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix; `None` for the default namespace
    pub prefix: Option<String>,

    /// Namespace URI
    pub uri: String,
}

impl NamespaceDecl {
    /// Create a declaration; an empty prefix means the default namespace
    pub fn new(prefix: Option<&str>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            uri: uri.into(),
        }
    }

    /// Attribute name used to write this declaration
    pub fn attribute_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        }
    }
}

/// An XML element with owned content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Prefix the element is written with
    pub prefix: Option<String>,

    /// Local name
    pub name: String,

    /// Resolved namespace URI of the element name
    pub namespace: Option<String>,

    /// Namespace declarations made on this element (not inherited ones)
    pub namespaces: Vec<NamespaceDecl>,

    /// Attributes in document order
    pub attributes: Vec<Attribute>,

    /// Child content in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without a namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
            namespace: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element in the XSD namespace, written with the `xs` prefix
    pub fn xsd(name: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.prefix = Some("xs".to_string());
        element.namespace = Some(XSD_NS.to_string());
        element
    }

    /// Name as written, including the prefix
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// True when this is the XSD element with the given local name
    pub fn is_xsd(&self, local_name: &str) -> bool {
        self.name == local_name && self.namespace.as_deref() == Some(XSD_NS)
    }

    /// Get an attribute value by its written name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value and keeping its position
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
        self
    }

    /// Builder-style variant of [`Element::set_attribute`]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Declare a namespace on this element unless the same prefix is already declared
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: impl Into<String>) -> &mut Self {
        let decl = NamespaceDecl::new(prefix, uri);
        if !self.namespaces.iter().any(|d| d.prefix == decl.prefix) {
            self.namespaces.push(decl);
        }
        self
    }

    /// Append a child element
    pub fn add_child(&mut self, child: Element) -> &mut Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append character data
    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Iterate mutably over child elements
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Find the first XSD child element with the given local name
    pub fn find_xsd_child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|c| c.is_xsd(local_name))
    }

    /// This element and every element below it, in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::new(self)
    }

    /// Concatenated character data of this element and its descendants
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(inner) => collect_text(inner, out),
            Node::Comment(_) => {}
        }
    }
}
