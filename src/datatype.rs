// used for dates in the tabular interchange format
use chrono::NaiveDateTime;

// used to print out readable forms of a data type
use std::fmt;

use crate::duration::Duration;
use crate::error::{ReconcileError, Result};

/// The kinds of value a mapped field can hold. Each kind has exactly one
/// conversion from source text, fixed when a [`FieldBinding`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldDataType {
    Duration,
    Currency,
    Date,
    String,
    Boolean,
    Integer,
    Binary,
}

pub type Converter = fn(&str) -> Result<FieldValue>;

impl FieldDataType {
    pub fn uid(&self) -> u8 {
        match self {
            FieldDataType::Duration => 1,
            FieldDataType::Currency => 2,
            FieldDataType::Date => 3,
            FieldDataType::String => 4,
            FieldDataType::Boolean => 5,
            FieldDataType::Integer => 6,
            FieldDataType::Binary => 7,
        }
    }
    pub fn data_type(&self) -> &'static str {
        match self {
            FieldDataType::Duration => "Duration",
            FieldDataType::Currency => "Currency",
            FieldDataType::Date => "Date",
            FieldDataType::String => "String",
            FieldDataType::Boolean => "Boolean",
            FieldDataType::Integer => "Integer",
            FieldDataType::Binary => "Binary",
        }
    }
    pub fn converter(&self) -> Converter {
        match self {
            FieldDataType::Duration => convert_duration,
            FieldDataType::Currency => convert_currency,
            FieldDataType::Date => convert_date,
            FieldDataType::String => convert_string,
            FieldDataType::Boolean => convert_boolean,
            FieldDataType::Integer => convert_integer,
            FieldDataType::Binary => convert_binary,
        }
    }
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.data_type())
    }
}

// ------------- Values --------------
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Duration(Duration),
    Currency(f64),
    Date(NaiveDateTime),
    String(String),
    Boolean(bool),
    Integer(i64),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn data_type(&self) -> FieldDataType {
        match self {
            FieldValue::Duration(_) => FieldDataType::Duration,
            FieldValue::Currency(_) => FieldDataType::Currency,
            FieldValue::Date(_) => FieldDataType::Date,
            FieldValue::String(_) => FieldDataType::String,
            FieldValue::Boolean(_) => FieldDataType::Boolean,
            FieldValue::Integer(_) => FieldDataType::Integer,
            FieldValue::Binary(_) => FieldDataType::Binary,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Duration(d) => write!(f, "{}", d.value()),
            FieldValue::Currency(c) => write!(f, "{c}"),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Boolean(b) => write!(f, "{}", if *b { "Y" } else { "N" }),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Binary(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02X}")),
        }
    }
}

// ------------- Conversions --------------
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn failed(data_type: FieldDataType, value: &str) -> ReconcileError {
    ReconcileError::Field { data_type: data_type.data_type(), value: value.to_string() }
}

// durations are stored as hours
fn convert_duration(value: &str) -> Result<FieldValue> {
    let hours: f64 = value.trim().parse().map_err(|_| failed(FieldDataType::Duration, value))?;
    Ok(FieldValue::Duration(Duration::hours(hours)))
}

fn convert_currency(value: &str) -> Result<FieldValue> {
    value
        .trim()
        .parse()
        .map(FieldValue::Currency)
        .map_err(|_| failed(FieldDataType::Currency, value))
}

fn convert_date(value: &str) -> Result<FieldValue> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT)
        .map(FieldValue::Date)
        .map_err(|_| failed(FieldDataType::Date, value))
}

fn convert_string(value: &str) -> Result<FieldValue> {
    Ok(FieldValue::String(value.to_string()))
}

fn convert_boolean(value: &str) -> Result<FieldValue> {
    match value.trim() {
        "Y" | "y" | "1" | "true" => Ok(FieldValue::Boolean(true)),
        "N" | "n" | "0" | "false" => Ok(FieldValue::Boolean(false)),
        _ => Err(failed(FieldDataType::Boolean, value)),
    }
}

fn convert_integer(value: &str) -> Result<FieldValue> {
    value.trim().parse().map(FieldValue::Integer).map_err(|_| failed(FieldDataType::Integer, value))
}

fn convert_binary(value: &str) -> Result<FieldValue> {
    let digits = value.trim().as_bytes();
    if digits.len() % 2 != 0 {
        return Err(failed(FieldDataType::Binary, value));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| failed(FieldDataType::Binary, value))
        })
        .collect::<Result<Vec<u8>>>()
        .map(FieldValue::Binary)
}

// ------------- Bindings --------------
/// A source column bound to its data type. The converter is looked up once
/// here and reused for every row.
#[derive(Clone)]
pub struct FieldBinding {
    column: String,
    data_type: FieldDataType,
    converter: Converter,
}

impl FieldBinding {
    pub fn new(column: impl Into<String>, data_type: FieldDataType) -> Self {
        Self { column: column.into(), data_type, converter: data_type.converter() }
    }
    pub fn column(&self) -> &str {
        &self.column
    }
    pub fn data_type(&self) -> FieldDataType {
        self.data_type
    }
    /// Converts a raw value. Empty text is an absent value.
    pub fn convert(&self, raw: &str) -> Result<Option<FieldValue>> {
        if raw.is_empty() {
            return Ok(None);
        }
        (self.converter)(raw).map(Some)
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("column", &self.column)
            .field("data_type", &self.data_type)
            .finish()
    }
}
