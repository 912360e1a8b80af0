//! Parsed form of one saved component line.

use crate::error::{NetworkError, Result};
use crate::graph::Point;

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Point(Point),
    Word(String),
}

/// One component line: its class and the remaining `key: value` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub class: String,
    /// Source line (1-indexed), for error messages
    pub line: usize,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(class: impl Into<String>, line: usize) -> Self {
        Self {
            class: class.into(),
            line,
            fields: Vec::new(),
        }
    }

    /// Look up a field; the first occurrence wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// A required numeric field.
    pub fn number(&self, key: &str) -> Result<f64> {
        match self.get(key) {
            Some(Value::Number(v)) => Ok(*v),
            Some(other) => Err(self.wrong_type(key, "a number", other)),
            None => Err(NetworkError::missing_field(&self.class, key, self.line)),
        }
    }

    /// An optional numeric field.
    pub fn number_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get(key) {
            None => Ok(default),
            Some(_) => self.number(key),
        }
    }

    /// A required position field.
    pub fn point(&self, key: &str) -> Result<Point> {
        match self.get(key) {
            Some(Value::Point(p)) => Ok(*p),
            Some(other) => Err(self.wrong_type(key, "a position", other)),
            None => Err(NetworkError::missing_field(&self.class, key, self.line)),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, got: &Value) -> NetworkError {
        NetworkError::parse(
            self.line,
            format!("field '{}' of '{}' should be {}, got {:?}", key, self.class, expected, got),
        )
    }
}
