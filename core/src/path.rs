//! Path expressions: safe construction and compilation.
//!
//! # Design
//! Expressions are XPath 1.0, compiled and evaluated by `sxd-xpath`. The two
//! the client issues look like:
//!
//! ```text
//! /user/authentication-token/text()
//! /MediaContainer/Device[@name="Office"]/Connection[@local=1]
//! ```
//!
//! Caller-supplied values never go into an expression by string formatting:
//! they become a `Literal` first, and `Literal::quoted` refuses values that
//! would terminate the quoted string. `Literal` has no public variants, so
//! there is no other way to build one.

use std::fmt;
use std::str::FromStr;

use sxd_xpath::{Factory, XPath};

use crate::error::{InputError, QueryError};

/// A compiled path expression.
pub struct Path {
    expression: String,
    xpath: XPath,
}

impl Path {
    pub fn parse(expression: &str) -> Result<Self, QueryError> {
        let xpath = Factory::new()
            .build(expression)
            .map_err(|e| QueryError::new(expression, e.to_string()))?
            .ok_or_else(|| QueryError::new(expression, "empty expression"))?;
        Ok(Self {
            expression: expression.to_string(),
            xpath,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    pub(crate) fn xpath(&self) -> &XPath {
        &self.xpath
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.expression).finish()
    }
}

impl FromStr for Path {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

/// A literal operand of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(Repr);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    String(String),
    Number(i64),
}

impl Literal {
    /// A string literal for `value`, or `InputError::UnsafeLiteral` if it
    /// contains `"`.
    pub fn quoted(value: &str) -> Result<Self, InputError> {
        if value.contains('"') {
            return Err(InputError::UnsafeLiteral(value.to_string()));
        }
        Ok(Literal(Repr::String(value.to_string())))
    }

    pub fn number(value: i64) -> Self {
        Literal(Repr::Number(value))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `quoted` guarantees there is no `"` to escape.
        match &self.0 {
            Repr::String(value) => write!(f, "\"{value}\""),
            Repr::Number(value) => write!(f, "{value}"),
        }
    }
}

/// Builds an absolute path expression from element names and literals.
///
/// Names are expected to be constants; values coming from callers go
/// through `Literal`.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    expression: String,
}

impl PathBuilder {
    pub fn root(name: &str) -> Self {
        Self {
            expression: format!("/{name}"),
        }
    }

    pub fn child(mut self, name: &str) -> Self {
        self.expression.push('/');
        self.expression.push_str(name);
        self
    }

    /// Keep only nodes of the last step whose `attribute` equals `value`.
    pub fn attr_eq(mut self, attribute: &str, value: &Literal) -> Self {
        self.expression.push_str(&format!("[@{attribute}={value}]"));
        self
    }

    /// Select the text content of the last step.
    pub fn text(mut self) -> String {
        self.expression.push_str("/text()");
        self.expression
    }

    /// Select attribute `name` of the last step.
    pub fn attribute(mut self, name: &str) -> String {
        self.expression.push_str("/@");
        self.expression.push_str(name);
        self.expression
    }

    pub fn build(self) -> String {
        self.expression
    }
}
