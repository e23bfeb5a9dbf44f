//! XML documents and path-query evaluation.
//!
//! # Design
//! `Document` owns the `sxd-document` package for one response body and
//! queries are evaluated by `sxd-xpath`. `QueryResult` borrows from the
//! document, so every match is tied to the document it came from and both
//! are released together when the caller's scope ends, error paths included.

use sxd_document::parser;
use sxd_document::Package;
use sxd_xpath::nodeset;
use sxd_xpath::{Context, Value};

use crate::error::{ParseError, QueryError};
use crate::path::Path;

/// A parsed response body.
pub struct Document {
    package: Package,
}

impl Document {
    /// Parse `body` as XML. Fails on an empty body or anything not well formed.
    pub fn parse(body: &[u8]) -> Result<Self, ParseError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::Empty);
        }
        let text = std::str::from_utf8(body).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let package = parser::parse(text).map_err(|e| ParseError::Malformed(e.to_string()))?;

        #[cfg(test)]
        live::created();

        Ok(Self { package })
    }

    /// Compile `expression` and evaluate it. Zero matches is an empty
    /// result, not an error.
    pub fn query(&self, expression: &str) -> Result<QueryResult<'_>, QueryError> {
        let path = Path::parse(expression)?;
        self.select(&path)
    }

    /// Evaluate an already compiled path. Fails if the expression does not
    /// yield a node-set.
    pub fn select(&self, path: &Path) -> Result<QueryResult<'_>, QueryError> {
        let root = self.package.as_document().root();
        let context = Context::new();
        let value = path
            .xpath()
            .evaluate(&context, root)
            .map_err(|e| QueryError::new(path.as_str(), e.to_string()))?;

        match value {
            Value::Nodeset(nodes) => Ok(QueryResult {
                nodes: nodes.document_order().into_iter().map(Node).collect(),
            }),
            _ => Err(QueryError::new(path.as_str(), "expression does not select nodes")),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

#[cfg(test)]
impl Drop for Document {
    fn drop(&mut self) {
        live::dropped();
    }
}

/// A single match of a path query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<'d>(nodeset::Node<'d>);

impl<'d> Node<'d> {
    /// XPath string value: the element's text, the attribute value, or the
    /// text node.
    pub fn text(&self) -> String {
        self.0.string_value()
    }

    /// Attribute `name` of an element match.
    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        match self.0 {
            nodeset::Node::Element(element) => element.attribute_value(name),
            _ => None,
        }
    }
}

/// Matches of a query in document order.
#[derive(Debug, Clone, Default)]
pub struct QueryResult<'d> {
    nodes: Vec<Node<'d>>,
}

impl<'d> QueryResult<'d> {
    pub fn first(&self) -> Option<&Node<'d>> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node<'d>> {
        self.nodes.iter()
    }
}

impl<'d> IntoIterator for QueryResult<'d> {
    type Item = Node<'d>;
    type IntoIter = std::vec::IntoIter<Node<'d>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
