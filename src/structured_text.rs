//! Structured text: nested, attributed records packed into a single text field.
//!
//! A record is written as `(<number>||<name>(<key>|<value>|...)(<children>))`,
//! where the children are records of the same shape. Children are positional,
//! their names are usually an index or a fixed tag such as `DaysOfWeek`.
//! The grammar lives in `structured_text.pest`.

use std::collections::BTreeMap;
use std::fmt;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::{debug, warn};

use crate::error::{ReconcileError, Result};

#[derive(Parser)]
#[grammar = "structured_text.pest"]
pub struct RecordGrammar;

/// How decoders react to malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Malformed input is a decode error.
    #[default]
    Strict,
    /// Malformed input is skipped and recorded as an ignored error.
    Tolerant,
}

impl DecodeMode {
    /// Routes a decode error: raised in strict mode, recorded in tolerant mode.
    pub fn absorb(self, error: ReconcileError, ignored: &mut Vec<ReconcileError>) -> Result<()> {
        match self {
            DecodeMode::Strict => Err(error),
            DecodeMode::Tolerant => {
                warn!(%error, "ignoring malformed data");
                ignored.push(error);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredTextRecord {
    number: u32,
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<StructuredTextRecord>,
}

impl StructuredTextRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Parses a complete record. Anything after the first record is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pairs = RecordGrammar::parse(Rule::document, text)?;
        let record = pairs
            .next()
            .and_then(|document| document.into_inner().find(|p| p.as_rule() == Rule::record))
            .ok_or_else(|| ReconcileError::Invariant("document without a record".into()))?;
        Self::from_pair(record)
    }

    /// Parses according to `mode`. A tolerated failure yields what could be
    /// read before the error, or an empty record if nothing could.
    pub fn parse_with(
        text: &str,
        mode: DecodeMode,
        ignored: &mut Vec<ReconcileError>,
    ) -> Result<Self> {
        match Self::parse(text) {
            Ok(record) => Ok(record),
            Err(e) => {
                mode.absorb(e, ignored)?;
                Ok(Self::salvage(text).unwrap_or_default())
            }
        }
    }

    // Longest prefix ending in a closing bracket that parses once its open
    // brackets are closed.
    fn salvage(text: &str) -> Option<Self> {
        let mut end = text.len();
        while let Some(close) = text[..end].rfind(')') {
            let prefix = &text[..=close];
            let open = prefix.matches('(').count().saturating_sub(prefix.matches(')').count());
            if let Ok(record) = Self::parse(&format!("{prefix}{}", ")".repeat(open))) {
                debug!(kept = close + 1, of = text.len(), "salvaged structured text prefix");
                return Some(record);
            }
            end = close;
        }
        None
    }

    fn from_pair(pair: Pair<'_, Rule>) -> Result<Self> {
        let mut record = Self::default();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::number => {
                    record.number = inner.as_str().parse().map_err(|_| {
                        let (line, col) = inner.line_col();
                        ReconcileError::Parse {
                            message: format!("record number {} is out of range", inner.as_str()),
                            line: Some(line),
                            col: Some(col),
                        }
                    })?
                }
                Rule::name => record.name = inner.as_str().trim().to_string(),
                Rule::attributes => {
                    for attribute in inner.into_inner() {
                        let mut kv = attribute.into_inner();
                        let key = kv.next().map(|k| k.as_str()).unwrap_or_default();
                        let value = kv.next().map(|v| v.as_str()).unwrap_or_default();
                        record.attributes.insert(key.to_string(), value.to_string());
                    }
                }
                Rule::record => record.children.push(Self::from_pair(inner)?),
                _ => (),
            }
        }
        Ok(record)
    }

    pub fn number(&self) -> u32 {
        self.number
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
    pub fn children(&self) -> &[StructuredTextRecord] {
        &self.children
    }
    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&StructuredTextRecord> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
    pub fn with_child(mut self, child: StructuredTextRecord) -> Self {
        self.children.push(child);
        self
    }
    pub fn push(&mut self, child: StructuredTextRecord) {
        self.children.push(child);
    }

    fn write(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let mut attributes = String::new();
        for (key, value) in &self.attributes {
            if !attributes.is_empty() {
                attributes.push('|');
            }
            attributes += &format!("{key}|{value}");
        }
        write!(f, "({}||{}({})(", self.number, self.name, attributes)?;
        for child in &self.children {
            write!(f, "\n{}", "  ".repeat(depth + 1))?;
            child.write(f, depth + 1)?;
        }
        if !self.children.is_empty() {
            write!(f, "\n{}", "  ".repeat(depth))?;
        }
        write!(f, "))")
    }
}

impl fmt::Display for StructuredTextRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write(f, 0)
    }
}
