use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed cell value.
///
/// Serialized untagged so that table files hold plain JSON scalars:
/// integers, booleans and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Coerce a raw command token into a typed value.
    ///
    /// Precedence:
    /// 1. `true` / `false` (any case) become booleans
    /// 2. an optional `-` followed by ASCII digits becomes an integer
    /// 3. anything else is kept as text
    ///
    /// Integer literals that do not fit into `i64` stay text.
    pub fn coerce(token: &str) -> Self {
        if token.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if token.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }
        if is_integer_literal(token)
            && let Ok(i) = token.parse::<i64>()
        {
            return Self::Integer(i);
        }
        Self::Text(token.to_string())
    }

    /// The column type this value satisfies.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer(_) => DataType::Integer,
            Self::Boolean(_) => DataType::Boolean,
            Self::Text(_) => DataType::Text,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Logical column type. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "str")]
    Text,
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "bool")]
    Boolean,
}

impl DataType {
    /// Look up a type by its logical name (`str`, `int`, `bool`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Self::Text),
            "int" => Some(Self::Integer),
            "bool" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "str",
            Self::Integer => "int",
            Self::Boolean => "bool",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Text, Value::Text(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Boolean, Value::Boolean(_))
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
