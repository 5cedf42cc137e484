use std::fmt;
use std::time::Duration;

/// One element of a key/value field sequence.
///
/// Emit calls take an alternating `key, value, key, value, ...` slice of
/// these. Only [`Value::Str`] elements act as keys; a pair whose key is any
/// other kind is skipped when the record is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Message text of an error value.
    Error(String),
    /// Generic textual rendering of anything else.
    Other(String),
}

impl Value {
    /// Capture an error by its message text.
    pub fn error(err: &(dyn std::error::Error + '_)) -> Self {
        Value::Error(err.to_string())
    }

    /// Fallback rendering through `Display`.
    pub fn display(value: impl fmt::Display) -> Self {
        Value::Other(value.to_string())
    }

    /// Fallback rendering through `Debug`.
    pub fn debug(value: impl fmt::Debug) -> Self {
        Value::Other(format!("{:?}", value))
    }

    pub(crate) fn as_key(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Error(s) | Value::Other(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Float(x) if x.is_infinite() => {
                f.write_str(if x.is_sign_positive() { "+Inf" } else { "-Inf" })
            }
            // `{}` on f64 is the shortest round-trip form without an exponent.
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

macro_rules! impl_from_int {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::$variant(n as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int as i64: i8, i16, i32, i64, isize);
impl_from_int!(Uint as u64: u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::debug(d)
    }
}

/// Build a `[Value; N]` from an alternating key/value list.
///
/// ```
/// use tasklog::fields;
/// let kv = fields!["method", "GET", "status", 200];
/// assert_eq!(kv.len(), 4);
/// ```
#[macro_export]
macro_rules! fields {
    () => {{
        let empty: [$crate::value::Value; 0] = [];
        empty
    }};
    ($($item:expr),+ $(,)?) => {
        [$($crate::value::Value::from($item)),+]
    };
}
