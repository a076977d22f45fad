//! The records a host links to a calculation as its inputs. These are the
//! dynamically-typed side of the crate: a [ParameterData] may hold anything a
//! JSON document can, plus the unit-carrying pairs of [Param::Pair].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::{geom::Structure, program::Error};

/// the JSON key marking an object as a [Param::Pair]
pub const PAIR_KEY: &str = "__pair__";

/// An ordered key/value record. Iteration order is insertion order, and that
/// order is carried through to the rendered input file.
pub type ParameterData = IndexMap<String, Param>;

/// A single value in a [ParameterData]. In JSON, every variant but `Pair` maps
/// onto the obvious JSON type. JSON has no tuples, so a pair is written as an
/// object with the single key [PAIR_KEY]:
///
/// ```json
/// {"temperature": {"__pair__": [300, "K"]}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Param {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Param>),
    Map(ParameterData),
    Pair(Box<Param>, Box<Param>),
}

impl Param {
    pub fn pair(a: impl Into<Param>, b: impl Into<Param>) -> Self {
        Self::Pair(Box::new(a.into()), Box::new(b.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            _ => None,
        }
    }

    /// the numeric value of `self`, if it is a number or a string that parses
    /// as one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Param::Int(i) => Some(*i as f64),
            Param::Float(f) => Some(*f),
            Param::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// a short name for the shape of `self`, for error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Param::Bool(_) => "bool",
            Param::Int(_) => "int",
            Param::Float(_) => "float",
            Param::Str(_) => "string",
            Param::List(_) => "list",
            Param::Map(_) => "mapping",
            Param::Pair(..) => "pair",
        }
    }

    /// return a copy of `self` with every mapping key converted to uppercase,
    /// recursing through lists, pairs, and nested mappings. Values are not
    /// touched. `name` identifies the record in the error returned when two
    /// keys of one mapping only differ by case.
    pub fn uppercase_keys(&self, name: &str) -> Result<Param, Error> {
        Ok(match self {
            Param::List(v) => Param::List(
                v.iter()
                    .map(|p| p.uppercase_keys(name))
                    .collect::<Result<_, _>>()?,
            ),
            Param::Map(m) => Param::Map(uppercase_keys(m, name)?),
            Param::Pair(a, b) => Param::Pair(
                Box::new(a.uppercase_keys(name)?),
                Box::new(b.uppercase_keys(name)?),
            ),
            p => p.clone(),
        })
    }
}

/// Case-normalize every key of `data`, recursively. Applying this twice gives
/// the same result as applying it once.
pub fn uppercase_keys(
    data: &ParameterData,
    name: &str,
) -> Result<ParameterData, Error> {
    let mut ret = ParameterData::with_capacity(data.len());
    let mut repeated = Vec::new();
    for (k, v) in data {
        let key = k.to_uppercase();
        if ret.contains_key(&key) {
            repeated.push(key);
            continue;
        }
        ret.insert(key, v.uppercase_keys(name)?);
    }
    if !repeated.is_empty() {
        return Err(Error::DuplicateKeys {
            name: name.to_owned(),
            keys: repeated,
        });
    }
    Ok(ret)
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Param {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Param {
    fn from(i: i32) -> Self {
        Self::Int(i.into())
    }
}

impl From<f64> for Param {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<ParameterData> for Param {
    fn from(m: ParameterData) -> Self {
        Self::Map(m)
    }
}

impl TryFrom<Value> for Param {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => return Err("null is not a valid parameter".into()),
            Value::Bool(b) => Param::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Param::Int(i),
                None => Param::Float(n.as_f64().ok_or_else(|| {
                    format!("{n} is not representable as a float")
                })?),
            },
            Value::String(s) => Param::Str(s),
            Value::Array(v) => Param::List(
                v.into_iter()
                    .map(Param::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(mut m) if m.len() == 1 && m.contains_key(PAIR_KEY) => {
                let Some(Value::Array(v)) = m.remove(PAIR_KEY) else {
                    return Err(format!("{PAIR_KEY} must hold an array"));
                };
                let Ok([a, b]) = <[Value; 2]>::try_from(v) else {
                    return Err(format!(
                        "{PAIR_KEY} must hold exactly two elements"
                    ));
                };
                Param::pair(Param::try_from(a)?, Param::try_from(b)?)
            }
            Value::Object(m) => Param::Map(
                m.into_iter()
                    .map(|(k, v)| Ok::<_, String>((k, Param::try_from(v)?)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl From<Param> for Value {
    fn from(p: Param) -> Self {
        match p {
            Param::Bool(b) => Value::Bool(b),
            Param::Int(i) => Value::Number(i.into()),
            Param::Float(f) => {
                Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
            }
            Param::Str(s) => Value::String(s),
            Param::List(v) => {
                Value::Array(v.into_iter().map(Value::from).collect())
            }
            Param::Map(m) => Value::Object(
                m.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
            Param::Pair(a, b) => {
                let mut m = Map::new();
                m.insert(
                    PAIR_KEY.to_owned(),
                    Value::Array(vec![Value::from(*a), Value::from(*b)]),
                );
                Value::Object(m)
            }
        }
    }
}

/// a folder left behind on a remote computer by an earlier calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteData {
    pub computer: String,
    pub remote_path: String,
}

/// a reference to the executable that will run the calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub uuid: String,
    #[serde(default)]
    pub label: String,
}

impl Code {
    pub fn new(uuid: &str, label: &str) -> Self {
        Self {
            uuid: uuid.to_owned(),
            label: label.to_owned(),
        }
    }
}

/// The kinds of record a host can link into a calculation. In JSON these are
/// tagged with the host's type names, for example
/// `{"ParameterData": {"global": {"project": "BaTiO3"}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputNode {
    #[serde(rename = "ParameterData")]
    Parameters(ParameterData),
    #[serde(rename = "StructureData")]
    Structure(Structure),
    #[serde(rename = "RemoteData")]
    Remote(RemoteData),
    Code(Code),
}

impl InputNode {
    /// the host-facing type name of the record
    pub fn kind(&self) -> &'static str {
        match self {
            InputNode::Parameters(_) => "ParameterData",
            InputNode::Structure(_) => "StructureData",
            InputNode::Remote(_) => "RemoteData",
            InputNode::Code(_) => "Code",
        }
    }
}

/// the inputs linked into one calculation, keyed by role name
pub type Inputs = IndexMap<String, InputNode>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_from_json() {
        let got: ParameterData = serde_json::from_str(
            r#"{"temperature": {"__pair__": ["K", 300]}, "list": [1, 2.5]}"#,
        )
        .unwrap();
        let mut want = ParameterData::new();
        want.insert("temperature".into(), Param::pair("K", 300));
        want.insert(
            "list".into(),
            Param::List(vec![Param::Int(1), Param::Float(2.5)]),
        );
        assert_eq!(got, want);
    }

    #[test]
    fn json_preserves_order() {
        let got: ParameterData =
            serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<_> = got.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn null_rejected() {
        let got = serde_json::from_str::<ParameterData>(r#"{"a": null}"#);
        assert!(got.is_err());
    }

    #[test]
    fn pair_to_json() {
        let got = serde_json::to_string(&Param::pair(300, "K")).unwrap();
        assert_eq!(got, r#"{"__pair__":[300,"K"]}"#);
    }

    #[test]
    fn uppercase_leaves_values() {
        let data: ParameterData = serde_json::from_str(
            r#"{"global": {"run_type": "energy", "_": "label"},
                "kind": [{"element": "Ba"}]}"#,
        )
        .unwrap();
        let got = uppercase_keys(&data, "parameters").unwrap();
        let want: ParameterData = serde_json::from_str(
            r#"{"GLOBAL": {"RUN_TYPE": "energy", "_": "label"},
                "KIND": [{"ELEMENT": "Ba"}]}"#,
        )
        .unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn uppercase_idempotent() {
        let data: ParameterData = serde_json::from_str(
            r#"{"Force_Eval": {"dft": {"mgrid": {"cutoff": 280}},
                "Print": [{"a": {"b": "c"}}, "x"]},
                "temp": {"__pair__": [{"k": 1}, 3]}}"#,
        )
        .unwrap();
        let once = uppercase_keys(&data, "parameters").unwrap();
        let twice = uppercase_keys(&once, "parameters").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn uppercase_collision() {
        let data: ParameterData =
            serde_json::from_str(r#"{"cmdline": [], "CMDLINE": []}"#).unwrap();
        let got = uppercase_keys(&data, "settings");
        let Err(Error::DuplicateKeys { name, keys }) = got else {
            panic!("expected duplicate keys, got {got:?}");
        };
        assert_eq!(name, "settings");
        assert_eq!(keys, ["CMDLINE"]);
    }

    #[test]
    fn input_node_tags() {
        let got: Inputs = serde_json::from_str(
            r#"{"code": {"Code": {"uuid": "abc"}},
                "parent_folder": {"RemoteData":
                    {"computer": "localhost", "remote_path": "/scratch/1"}}}"#,
        )
        .unwrap();
        assert_eq!(got["code"], InputNode::Code(Code::new("abc", "")));
        assert_eq!(got["parent_folder"].kind(), "RemoteData");
    }
}
