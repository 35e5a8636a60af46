use std::sync::Arc;
use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::value::Num;

pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// Represents any value a metadata block can hold.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(v),
            _ => None
        }
    }

    /// The scalar spelled as a string: strings as-is, numbers and booleans
    /// formatted. `None` for null, arrays and dictionaries.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.to_string()),
            Value::Num(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Dict(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64 => Value::Num);

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl<K, V> From<Dict<K, V>> for Value where Arc<str>: From<K>, Value: From<V> {
    fn from(value: Dict<K, V>) -> Self {
        let dict = value.into_iter()
            .map(|(k, v)| (<Arc::<str>>::from(k), Value::from(v)))
            .collect::<Dict>();

        Value::Dict(Arc::new(dict))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::new(vec))
    }
}
