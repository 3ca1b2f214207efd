//! Typed, read-only view over a request's `params` member.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::error::{JsonRpcErrorObject, ToJsonRpcError};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Only arrays and objects are valid `params`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(RequestParams::Array(items)),
            Value::Object(map) => Some(RequestParams::Object(map)),
            _ => None,
        }
    }

    /// Get a parameter by name (for object params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by index (for array params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Object(map) => map.len(),
            RequestParams::Array(vec) => vec.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to a serde_json::Value for serialization
    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for RequestParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RequestParams::from_value(value)
            .ok_or_else(|| serde::de::Error::custom("params must be an array or an object"))
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// Shape of the params a request carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsKind {
    Positional,
    Named,
    Absent,
}

/// Failure to read a parameter. Handlers usually surface it as Invalid params.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("params are absent")]
    Absent,

    #[error("params are named, expected positional")]
    NotPositional,

    #[error("params are positional, expected named")]
    NotNamed,

    #[error("missing positional param {0}")]
    MissingIndex(usize),

    #[error("missing named param '{0}'")]
    MissingKey(String),

    #[error("param {param} must be {expected}")]
    WrongType {
        param: String,
        expected: &'static str,
    },

    #[error("cannot decode {param}: {source}")]
    Decode {
        param: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ToJsonRpcError for ParamsError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject::invalid_params().with_data(self.to_string())
    }
}

impl From<ParamsError> for JsonRpcErrorObject {
    fn from(err: ParamsError) -> Self {
        err.to_error_object()
    }
}

#[derive(Clone, Copy)]
enum ParamRef<'a> {
    Index(usize),
    Key(&'a str),
}

impl fmt::Display for ParamRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRef::Index(index) => write!(f, "#{}", index),
            ParamRef::Key(key) => write!(f, "'{}'", key),
        }
    }
}

const NO_VALUES: &[Value] = &[];

/// Parameter view handed to method handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    inner: Option<RequestParams>,
}

impl Params {
    pub fn new(inner: Option<RequestParams>) -> Self {
        Self { inner }
    }

    pub fn kind(&self) -> ParamsKind {
        match &self.inner {
            Some(RequestParams::Array(_)) => ParamsKind::Positional,
            Some(RequestParams::Object(_)) => ParamsKind::Named,
            None => ParamsKind::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.inner.is_none()
    }

    pub fn as_request_params(&self) -> Option<&RequestParams> {
        self.inner.as_ref()
    }

    /// The raw params as JSON; `null` when absent.
    pub fn to_value(&self) -> Value {
        self.inner
            .as_ref()
            .map(RequestParams::to_value)
            .unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, RequestParams::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional values in order. Empty for named or absent params.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        match &self.inner {
            Some(RequestParams::Array(items)) => items.iter(),
            _ => NO_VALUES.iter(),
        }
    }

    pub fn value_at(&self, index: usize) -> Result<&Value, ParamsError> {
        match &self.inner {
            Some(RequestParams::Array(items)) => {
                items.get(index).ok_or(ParamsError::MissingIndex(index))
            }
            Some(RequestParams::Object(_)) => Err(ParamsError::NotPositional),
            None => Err(ParamsError::Absent),
        }
    }

    pub fn value(&self, key: &str) -> Result<&Value, ParamsError> {
        match &self.inner {
            Some(RequestParams::Object(map)) => map
                .get(key)
                .ok_or_else(|| ParamsError::MissingKey(key.to_string())),
            Some(RequestParams::Array(_)) => Err(ParamsError::NotNamed),
            None => Err(ParamsError::Absent),
        }
    }

    /// Decode the positional param at `index` into `T`.
    pub fn get_at<T: DeserializeOwned>(&self, index: usize) -> Result<T, ParamsError> {
        decode(self.value_at(index)?, ParamRef::Index(index))
    }

    /// Decode the named param `key` into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ParamsError> {
        decode(self.value(key)?, ParamRef::Key(key))
    }

    pub fn i64_at(&self, index: usize) -> Result<i64, ParamsError> {
        as_i64(self.value_at(index)?, ParamRef::Index(index))
    }

    pub fn i64(&self, key: &str) -> Result<i64, ParamsError> {
        as_i64(self.value(key)?, ParamRef::Key(key))
    }

    pub fn f64_at(&self, index: usize) -> Result<f64, ParamsError> {
        as_f64(self.value_at(index)?, ParamRef::Index(index))
    }

    pub fn f64(&self, key: &str) -> Result<f64, ParamsError> {
        as_f64(self.value(key)?, ParamRef::Key(key))
    }

    pub fn str_at(&self, index: usize) -> Result<&str, ParamsError> {
        as_str(self.value_at(index)?, ParamRef::Index(index))
    }

    pub fn str(&self, key: &str) -> Result<&str, ParamsError> {
        as_str(self.value(key)?, ParamRef::Key(key))
    }

    pub fn bool_at(&self, index: usize) -> Result<bool, ParamsError> {
        as_bool(self.value_at(index)?, ParamRef::Index(index))
    }

    pub fn bool(&self, key: &str) -> Result<bool, ParamsError> {
        as_bool(self.value(key)?, ParamRef::Key(key))
    }

    /// Decode the whole params value into an application-defined shape.
    /// Absent params decode from `null`, so `Option<T>` and `()` targets accept them.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ParamsError> {
        serde_json::from_value(self.to_value()).map_err(|source| ParamsError::Decode {
            param: "params".to_string(),
            source,
        })
    }
}

impl From<Option<RequestParams>> for Params {
    fn from(inner: Option<RequestParams>) -> Self {
        Self::new(inner)
    }
}

fn decode<T: DeserializeOwned>(value: &Value, param: ParamRef<'_>) -> Result<T, ParamsError> {
    T::deserialize(value).map_err(|source| ParamsError::Decode {
        param: param.to_string(),
        source,
    })
}

fn wrong_type(param: ParamRef<'_>, expected: &'static str) -> ParamsError {
    ParamsError::WrongType {
        param: param.to_string(),
        expected,
    }
}

fn as_i64(value: &Value, param: ParamRef<'_>) -> Result<i64, ParamsError> {
    value.as_i64().ok_or_else(|| wrong_type(param, "an integer"))
}

fn as_f64(value: &Value, param: ParamRef<'_>) -> Result<f64, ParamsError> {
    value.as_f64().ok_or_else(|| wrong_type(param, "a number"))
}

fn as_str<'a>(value: &'a Value, param: ParamRef<'_>) -> Result<&'a str, ParamsError> {
    value.as_str().ok_or_else(|| wrong_type(param, "a string"))
}

fn as_bool(value: &Value, param: ParamRef<'_>) -> Result<bool, ParamsError> {
    value.as_bool().ok_or_else(|| wrong_type(param, "a boolean"))
}
