//! The CP2K input grammar. A [Section] is rendered as
//!
//! ```text
//! &NAME label
//!    KEY  value
//!    UNITFUL [K] 300
//!    &SUBSECTION
//!    &END SUBSECTION
//! &END NAME
//! ```
//!
//! with three spaces of indentation per level. Nothing is quoted or escaped.

use std::fmt::{self, Display, Write};

use indexmap::IndexMap;

use crate::data::{Param, ParameterData};
use crate::program::{Error, Result};

/// spaces of indentation added for each nested section
pub const INDENT: usize = 3;

/// the reserved key holding a section's inline label
pub const LABEL_KEY: &str = "_";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// a single `KEY  value` line
    Scalar(String),

    /// a nested `&KEY ... &END KEY` block
    Section(Section),

    /// the key rendered once for each element, at the same depth
    Repeated(Vec<Value>),

    /// a `KEY [unit] value` line
    Quantity(Quantity),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub label: Option<String>,
    pub entries: IndexMap<String, Value>,

    /// unkeyed lines written after `entries`, like the rows of `&COORD`
    pub rows: Vec<String>,
}

/// the token for `p` as it appears in an input file. numbers use their
/// shortest round-trip digits and booleans CP2K's `T` and `F`
pub fn token(p: &Param) -> String {
    match p {
        Param::Bool(true) => "T".to_owned(),
        Param::Bool(false) => "F".to_owned(),
        Param::Int(i) => i.to_string(),
        Param::Float(f) => float(*f),
        Param::Str(s) => s.clone(),
        p => serde_json::Value::from(p.clone()).to_string(),
    }
}

/// positional notation for moderate magnitudes and exponent notation outside
/// of [1e-4, 1e16), the same cutoffs Python's `repr` uses
fn float(f: f64) -> String {
    let abs = f.abs();
    if abs != 0.0 && abs.is_finite() && !(1e-4..1e16).contains(&abs) {
        format!("{f:e}")
    } else {
        f.to_string()
    }
}

impl Value {
    pub fn scalar(s: impl Display) -> Self {
        Self::Scalar(s.to_string())
    }

    /// classify `param`, found under `key`, into the matching variant. `Map`s
    /// become sections, `List`s repeat the key, and `Pair`s must be a number
    /// and a unit in either order
    pub fn from_param(key: &str, param: &Param) -> Result<Self> {
        Ok(match param {
            Param::Map(m) => Value::Section(Section::from_params(key, m)?),
            Param::List(v) => Value::Repeated(
                v.iter()
                    .map(|p| Value::from_param(key, p))
                    .collect::<Result<_>>()?,
            ),
            Param::Pair(a, b) => {
                Value::Quantity(Quantity::from_pair(key, a, b)?)
            }
            p => Value::Scalar(token(p)),
        })
    }
}

impl Quantity {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value,
            unit: unit.to_owned(),
        }
    }

    /// the first element is tried as the number before the second, and the
    /// other element is the unit
    pub fn from_pair(
        key: &str,
        first: &Param,
        second: &Param,
    ) -> Result<Self> {
        let (value, unit) = match (first.as_number(), second.as_number()) {
            (Some(v), _) => (v, second),
            (None, Some(v)) => (v, first),
            (None, None) => {
                return Err(Error::MalformedPair {
                    key: key.to_owned(),
                    first: token(first),
                    second: token(second),
                })
            }
        };
        Ok(Self {
            value,
            unit: token(unit),
        })
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.unit, self.value)
    }
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(label: &str) -> Self {
        Self {
            label: Some(label.to_owned()),
            ..Self::default()
        }
    }

    /// build the top level of an input file out of the already
    /// case-normalized `data`. The top level has no header line to carry a
    /// label, so [LABEL_KEY] is an ordinary key here
    pub fn root(data: &ParameterData) -> Result<Self> {
        let mut ret = Self::new();
        for (key, param) in data {
            ret.entries
                .insert(key.clone(), Value::from_param(key, param)?);
        }
        Ok(ret)
    }

    /// build a nested section out of the already case-normalized `data` found
    /// under `name`, taking the label from [LABEL_KEY] if present
    pub fn from_params(name: &str, data: &ParameterData) -> Result<Self> {
        let mut ret = Self::new();
        for (key, param) in data {
            if key == LABEL_KEY {
                let label = match param {
                    Param::Map(_) | Param::List(_) | Param::Pair(..) => {
                        return Err(Error::InvalidLabel {
                            section: name.to_owned(),
                            found: param.shape(),
                        })
                    }
                    p => token(p),
                };
                ret.label = Some(label);
                continue;
            }
            ret.entries
                .insert(key.clone(), Value::from_param(key, param)?);
        }
        Ok(ret)
    }

    /// insert `value` under `key`, replacing (in place) any previous value
    pub fn insert(&mut self, key: &str, value: Value) -> &mut Self {
        self.entries.insert(key.to_owned(), value);
        self
    }

    pub fn push_row(&mut self, row: String) -> &mut Self {
        self.rows.push(row);
        self
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }
}

fn write_entry<W: Write>(
    w: &mut W,
    key: &str,
    value: &Value,
    indent: usize,
) -> fmt::Result {
    let pad = "";
    match value {
        Value::Section(s) => {
            match &s.label {
                Some(label) if !label.is_empty() => {
                    writeln!(w, "{pad:indent$}&{key} {label}")?
                }
                _ => writeln!(w, "{pad:indent$}&{key}")?,
            }
            write_body(w, s, indent + INDENT)?;
            writeln!(w, "{pad:indent$}&END {key}")
        }
        Value::Repeated(items) => {
            for item in items {
                write_entry(w, key, item, indent)?;
            }
            Ok(())
        }
        Value::Quantity(q) => writeln!(w, "{pad:indent$}{key} {q}"),
        Value::Scalar(s) if s.is_empty() => writeln!(w, "{pad:indent$}{key}"),
        Value::Scalar(s) => writeln!(w, "{pad:indent$}{key}  {s}"),
    }
}

/// write the entries and rows of `section` at `indent`, without the
/// section's own opening and closing lines
pub fn write_body<W: Write>(
    w: &mut W,
    section: &Section,
    indent: usize,
) -> fmt::Result {
    for (key, value) in &section.entries {
        write_entry(w, key, value, indent)?;
    }
    let pad = "";
    for row in &section.rows {
        writeln!(w, "{pad:indent$}{row}")?;
    }
    Ok(())
}

/// renders the body of the section, so the top level of an input file is a
/// label-less [Section]
impl Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_body(f, self, 0)
    }
}
