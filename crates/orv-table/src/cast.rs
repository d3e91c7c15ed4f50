//! # Field Casting
//!
//! Converts raw cell text into typed [`Cell`] values according to a field's
//! type and format, then checks the field's constraints. Everything that can
//! be prepared once per table (patterns, enum values, bounds) is compiled in
//! [`Caster::new`].
//!
//! Supported formats:
//!
//! | Type | Formats |
//! |------|---------|
//! | `string` | `default`, `email`, `uri`, `uuid`, `binary` |
//! | `date`, `time`, `datetime` | `default`, `any`, or a strftime pattern (optional `fmt:` prefix) |
//! | `geopoint` | `default` (`"lon, lat"`), `array`, `object` |
//!
//! All other types accept only `default`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use orv_core::{FieldDefinition, FieldType, SchemaDescriptor};
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::error::{TableError, TableSchemaError};

/// A cast cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Timezone-aware inputs are normalized to UTC.
    Datetime(NaiveDateTime),
    Year(i32),
    YearMonth(i32, u32),
    /// ISO 8601 duration, kept in its textual form.
    Duration(String),
    /// `object`, `array` and `geojson` values.
    Json(Value),
    /// Longitude, latitude.
    GeoPoint(f64, f64),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Ordering between comparable cells; `None` across unrelated types.
    pub fn compare(&self, other: &Cell) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Number(b)) => (*a as f64).partial_cmp(b),
            (Self::Number(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            (Self::Time(a), Self::Time(b)) => a.partial_cmp(b),
            (Self::Datetime(a), Self::Datetime(b)) => a.partial_cmp(b),
            (Self::Year(a), Self::Year(b)) => a.partial_cmp(b),
            (Self::YearMonth(ay, am), Self::YearMonth(by, bm)) => (ay, am).partial_cmp(&(by, bm)),
            _ => None,
        }
    }

    /// Length for the `minLength`/`maxLength` constraints.
    fn length(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Json(Value::Array(items)) => Some(items.len()),
            Self::Json(Value::Object(map)) => Some(map.len()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::String(s) | Self::Duration(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            Self::Year(y) => write!(f, "{y}"),
            Self::YearMonth(y, m) => write!(f, "{y:04}-{m:02}"),
            Self::Json(v) => write!(f, "{v}"),
            Self::GeoPoint(lon, lat) => write!(f, "{lon}, {lat}"),
        }
    }
}

/// Per-field casting state prepared from the schema.
#[derive(Debug, Clone)]
struct FieldCaster {
    field: FieldDefinition,
    required: bool,
    pattern: Option<Regex>,
    enum_values: Option<Vec<Cell>>,
    minimum: Option<Cell>,
    maximum: Option<Cell>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl FieldCaster {
    fn new(field: &FieldDefinition, in_primary_key: bool) -> Result<Self, TableError> {
        let constraints = field.constraints.clone().unwrap_or_default();

        let pattern = constraints
            .pattern
            .as_deref()
            .map(|p| {
                Regex::new(&format!("^(?:{p})$")).map_err(|e| {
                    TableError::InvalidSchema(format!(
                        "field '{}' has an invalid pattern: {e}",
                        field.name
                    ))
                })
            })
            .transpose()?;

        let enum_values = constraints
            .enum_values
            .as_ref()
            .map(|values| {
                values
                    .iter()
                    .map(|v| constraint_cell(field, "enum", v))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let minimum = constraints
            .minimum
            .as_ref()
            .map(|v| constraint_cell(field, "minimum", v))
            .transpose()?;
        let maximum = constraints
            .maximum
            .as_ref()
            .map(|v| constraint_cell(field, "maximum", v))
            .transpose()?;

        Ok(Self {
            field: field.clone(),
            required: field.is_required() || in_primary_key,
            pattern,
            enum_values,
            minimum,
            maximum,
            min_length: constraints.min_length,
            max_length: constraints.max_length,
        })
    }

    fn check(&self, raw: &str, cell: &Cell) -> Result<(), String> {
        let violated = |name: &str| constraint_message(&self.field.name, name, raw);

        if let Some(values) = &self.enum_values {
            if !values.contains(cell) {
                return Err(violated("enum"));
            }
        }
        if let (Some(min), Some(len)) = (self.min_length, cell.length()) {
            if len < min {
                return Err(violated("minLength"));
            }
        }
        if let (Some(max), Some(len)) = (self.max_length, cell.length()) {
            if len > max {
                return Err(violated("maxLength"));
            }
        }
        if let Some(min) = &self.minimum {
            if cell.compare(min) == Some(Ordering::Less) {
                return Err(violated("minimum"));
            }
        }
        if let Some(max) = &self.maximum {
            if cell.compare(max) == Some(Ordering::Greater) {
                return Err(violated("maximum"));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(raw) {
                return Err(violated("pattern"));
            }
        }
        Ok(())
    }
}

/// Casts raw rows against a schema.
#[derive(Debug, Clone)]
pub struct Caster {
    fields: Vec<FieldCaster>,
    missing_values: Vec<String>,
}

impl Caster {
    /// Prepare casting for `schema`. Fails when a constraint cannot be
    /// compiled, e.g. an invalid regular expression or an enum value that
    /// does not cast to the field's type.
    pub fn new(schema: &SchemaDescriptor) -> Result<Self, TableError> {
        let primary_key: Vec<&str> = schema
            .primary_key
            .as_ref()
            .map(|pk| pk.names())
            .unwrap_or_default();

        let fields = schema
            .fields
            .iter()
            .map(|f| FieldCaster::new(f, primary_key.contains(&f.name.as_str())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fields,
            missing_values: schema.missing_values.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Cast the cell at zero-based `index`. The error is the failure message.
    pub fn cast_cell(&self, index: usize, raw: &str) -> Result<Cell, String> {
        let Some(caster) = self.fields.get(index) else {
            return Err(format!("no field at position {}", index + 1));
        };

        if self.missing_values.iter().any(|m| m == raw) {
            if caster.required {
                return Err(constraint_message(&caster.field.name, "required", raw));
            }
            return Ok(Cell::Null);
        }

        let cell = cast_value(&caster.field, raw).ok_or_else(|| type_message(&caster.field, raw))?;
        caster.check(raw, &cell)?;
        Ok(cell)
    }

    /// Cast a whole row. Every failing cell is reported, collapsed into a
    /// single error per row.
    pub fn cast_row(&self, row: u64, raw: &[String]) -> Result<Vec<Cell>, TableSchemaError> {
        if raw.len() != self.fields.len() {
            return Err(TableSchemaError::row_length(row, raw.len(), self.fields.len()));
        }

        let mut cells = Vec::with_capacity(raw.len());
        let mut errors = Vec::new();
        for (index, value) in raw.iter().enumerate() {
            match self.cast_cell(index, value) {
                Ok(cell) => cells.push(cell),
                Err(message) => {
                    errors.push(TableSchemaError::at(row, Some(index as u64 + 1), message));
                    cells.push(Cell::Null);
                }
            }
        }

        match TableSchemaError::collect(row, errors) {
            Some(err) => Err(err),
            None => Ok(cells),
        }
    }
}

fn type_message(field: &FieldDefinition, raw: &str) -> String {
    format!(
        "The value \"{raw}\" in column \"{}\" is not type \"{}\" and format \"{}\"",
        field.name,
        field.field_type,
        field.format()
    )
}

fn constraint_message(field: &str, constraint: &str, raw: &str) -> String {
    format!("Field \"{field}\" has constraint \"{constraint}\" which is not satisfied for value \"{raw}\"")
}

/// Cast a constraint operand declared in the schema to the field's type.
fn constraint_cell(field: &FieldDefinition, constraint: &str, value: &Value) -> Result<Cell, TableError> {
    let cell = match value {
        Value::String(s) => cast_value(field, s),
        Value::Bool(b) => Some(Cell::Boolean(*b)),
        Value::Number(n) => match field.field_type {
            FieldType::String => Some(Cell::String(n.to_string())),
            FieldType::Integer | FieldType::Year => n.as_i64().map(|i| {
                if field.field_type == FieldType::Year {
                    Cell::Year(i as i32)
                } else {
                    Cell::Integer(i)
                }
            }),
            _ => n.as_f64().map(Cell::Number),
        },
        Value::Array(_) | Value::Object(_) => Some(Cell::Json(value.clone())),
        Value::Null => Some(Cell::Null),
    };
    cell.ok_or_else(|| {
        TableError::InvalidSchema(format!(
            "field '{}' declares a \"{constraint}\" value {value} that is not of type \"{}\"",
            field.name, field.field_type
        ))
    })
}

/// Cast `raw` per the field's type and format; `None` when it does not cast.
pub(crate) fn cast_value(field: &FieldDefinition, raw: &str) -> Option<Cell> {
    let format = field.format();
    match field.field_type {
        FieldType::String => cast_string(format, raw),
        FieldType::Integer => raw.parse::<i64>().ok().map(Cell::Integer),
        FieldType::Number => raw.parse::<f64>().ok().map(Cell::Number),
        FieldType::Boolean => match raw {
            "true" | "True" | "TRUE" | "1" => Some(Cell::Boolean(true)),
            "false" | "False" | "FALSE" | "0" => Some(Cell::Boolean(false)),
            _ => None,
        },
        FieldType::Date => cast_date(format, raw).map(Cell::Date),
        FieldType::Time => cast_time(format, raw).map(Cell::Time),
        FieldType::Datetime => cast_datetime(format, raw).map(Cell::Datetime),
        FieldType::Year => (raw.len() == 4)
            .then(|| raw.parse::<i32>().ok())
            .flatten()
            .map(Cell::Year),
        FieldType::Yearmonth => {
            let (year, month) = raw.split_once('-')?;
            let year = (year.len() == 4).then(|| year.parse::<i32>().ok()).flatten()?;
            let month = month.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
            Some(Cell::YearMonth(year, month))
        }
        FieldType::Duration => is_duration(raw).then(|| Cell::Duration(raw.to_string())),
        FieldType::Object => parse_json(raw).filter(Value::is_object).map(Cell::Json),
        FieldType::Array => parse_json(raw).filter(Value::is_array).map(Cell::Json),
        FieldType::Geopoint => cast_geopoint(format, raw),
        FieldType::Geojson => parse_json(raw)
            .filter(|v| v.get("type").is_some_and(Value::is_string))
            .map(Cell::Json),
        FieldType::Any => Some(Cell::String(raw.to_string())),
    }
}

fn parse_json(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

fn cast_string(format: &str, raw: &str) -> Option<Cell> {
    let ok = match format {
        "email" => is_email(raw),
        "uri" => is_uri(raw),
        "uuid" => uuid::Uuid::parse_str(raw).is_ok(),
        "binary" => is_base64(raw),
        _ => true,
    };
    ok.then(|| Cell::String(raw.to_string()))
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Absolute URI with an explicit `scheme://` authority. `http:example.com`
/// parses leniently as a URL but is rejected here.
fn is_uri(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => raw
            .get(url.scheme().len()..)
            .is_some_and(|rest| rest.starts_with("://")),
        Err(_) => false,
    }
}

fn is_base64(raw: &str) -> bool {
    let body = raw.trim_end_matches('=');
    raw.len() % 4 == 0
        && raw.len() - body.len() <= 2
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/')
}

/// ISO 8601 duration such as `P1Y2M10DT2H30M` or `PT0.5S`.
fn is_duration(raw: &str) -> bool {
    let Some(rest) = raw.strip_prefix('P') else {
        return false;
    };
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.map_or(true, str::is_empty) {
        return false;
    }
    designators_ok(date_part, &['Y', 'M', 'W', 'D'], false)
        && time_part.map_or(true, |t| !t.is_empty() && designators_ok(t, &['H', 'M', 'S'], true))
}

/// Check `<number><designator>` groups appear in the given order. Only the
/// last designator of the time part may carry a fraction.
fn designators_ok(part: &str, order: &[char], fraction_last: bool) -> bool {
    let mut next = 0;
    let mut digits = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' {
            digits.push(c);
            continue;
        }
        let Some(pos) = order[next..].iter().position(|d| *d == c) else {
            return false;
        };
        let index = next + pos;
        let fractional = digits.contains('.');
        let allowed_fraction = fraction_last && index == order.len() - 1;
        if digits.is_empty() || (fractional && !allowed_fraction) || digits.parse::<f64>().is_err() {
            return false;
        }
        digits.clear();
        next = index + 1;
    }
    digits.is_empty()
}

fn strftime(format: &str) -> &str {
    format.strip_prefix("fmt:").unwrap_or(format)
}

const ANY_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];
const ANY_TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M", "%I:%M %p", "%I:%M:%S %p"];
const ANY_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

fn cast_date(format: &str, raw: &str) -> Option<NaiveDate> {
    match format {
        "default" => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        "any" => ANY_DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
            .or_else(|| cast_datetime("any", raw).map(|dt| dt.date())),
        custom => NaiveDate::parse_from_str(raw, strftime(custom)).ok(),
    }
}

fn cast_time(format: &str, raw: &str) -> Option<NaiveTime> {
    match format {
        "default" => NaiveTime::parse_from_str(raw, "%H:%M:%S").ok(),
        "any" => ANY_TIME_FORMATS
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(raw, f).ok()),
        custom => NaiveTime::parse_from_str(raw, strftime(custom)).ok(),
    }
}

fn cast_datetime(format: &str, raw: &str) -> Option<NaiveDateTime> {
    let rfc3339 = || DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc());
    match format {
        "default" => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
            .ok()
            .or_else(rfc3339),
        "any" => rfc3339().or_else(|| {
            ANY_DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        }),
        custom => {
            let pattern = strftime(custom);
            NaiveDateTime::parse_from_str(raw, pattern)
                .ok()
                .or_else(|| DateTime::parse_from_str(raw, pattern).ok().map(|dt| dt.naive_utc()))
        }
    }
}

fn cast_geopoint(format: &str, raw: &str) -> Option<Cell> {
    let (lon, lat) = match format {
        "array" => {
            let value = parse_json(raw)?;
            let items = value.as_array()?;
            if items.len() != 2 {
                return None;
            }
            (items[0].as_f64()?, items[1].as_f64()?)
        }
        "object" => {
            let value = parse_json(raw)?;
            (value.get("lon")?.as_f64()?, value.get("lat")?.as_f64()?)
        }
        _ => {
            let (lon, lat) = raw.split_once(',')?;
            (lon.trim().parse().ok()?, lat.trim().parse().ok()?)
        }
    };
    ((-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat))
        .then_some(Cell::GeoPoint(lon, lat))
}
