//! Depth-first traversal over element trees

use crate::node::Element;

/// Pre-order iterator over an element and all elements below it
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Descendants<'a> {
    /// Start a traversal at `root` (which is yielded first)
    pub fn new(root: &'a Element) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let children: Vec<&'a Element> = current.child_elements().collect();
        self.stack.extend(children.into_iter().rev());
        Some(current)
    }
}

/// Trait for visiting elements mutably, e.g. to rewrite attributes in place
pub trait Visitor {
    fn visit(&mut self, element: &mut Element);
}

/// Walk `root` and its descendants in document order with a visitor
pub fn walk<V: Visitor + ?Sized>(root: &mut Element, visitor: &mut V) {
    visitor.visit(root);
    for child in root.child_elements_mut() {
        walk(child, visitor);
    }
}
