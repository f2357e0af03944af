//! Values carried by the variadic key/value arguments of a log call
//!
//! Arguments are a flat, ordered list alternating keys and values. Keys are
//! ordinary [`Value`]s so that a malformed call (a non-string key, an odd
//! number of arguments) is still representable and can be made visible in
//! the output instead of being rejected by the type system.

use super::callstack::{self, Frame};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A value which is not a primitive and is encoded through `serde`.
///
/// Encoding happens at format time; when it fails the formatter falls back
/// to [`StructuredValue::describe`], which cannot fail.
pub trait StructuredValue: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

impl<T> StructuredValue for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// An error passed as a log argument.
///
/// Cloning shares the underlying error, so the exact error handed to
/// `warn`/`error` can be handed back to the caller.
#[derive(Clone)]
pub struct ErrorValue {
    error: Arc<dyn StdError + Send + Sync + 'static>,
    stack: Option<Arc<[Frame]>>,
}

impl ErrorValue {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            error: Arc::new(error),
            stack: None,
        }
    }

    pub fn from_arc(error: Arc<dyn StdError + Send + Sync + 'static>) -> Self {
        Self { error, stack: None }
    }

    /// Wrap an error and capture the call stack where it was wrapped.
    ///
    /// Formatters prefer this stack over the logging call site because it
    /// points at where the error originated.
    pub fn traced<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let frames = callstack::resolver().capture(0, -1);
        Self {
            error: Arc::new(error),
            stack: Some(frames.into()),
        }
    }

    pub fn error(&self) -> &Arc<dyn StdError + Send + Sync + 'static> {
        &self.error
    }

    pub fn stack(&self) -> Option<&[Frame]> {
        self.stack.as_deref()
    }

    /// Whether both wrap the very same error instance
    pub fn same_error(&self, other: &Arc<dyn StdError + Send + Sync + 'static>) -> bool {
        Arc::ptr_eq(&self.error, other)
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorValue")
            .field("error", &self.error)
            .field("traced", &self.stack.is_some())
            .finish()
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl StdError for ErrorValue {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for ErrorValue {
    fn from(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self::from_arc(Arc::from(error))
    }
}

/// One argument of a log call
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Float32(f32),
    Str(String),
    /// Pre-encoded JSON, written verbatim by the machine formatter
    Bytes(Vec<u8>),
    Error(ErrorValue),
    List(Vec<Value>),
    Structured(Arc<dyn StructuredValue>),
}

impl Value {
    /// Wrap any error
    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Value::Error(ErrorValue::new(error))
    }

    /// Wrap an error and capture the current call stack with it
    pub fn traced_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Value::Error(ErrorValue::traced(error))
    }

    /// Wrap a `serde` serializable value (maps, structs, ...)
    pub fn structured<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Value::Structured(Arc::new(value))
    }

    /// Raw, already JSON-encoded bytes
    pub fn raw_json(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Debug representation of a value that has no other encoding
    pub fn debug<T: fmt::Debug>(value: &T) -> Self {
        Value::Str(format!("{:?}", value))
    }

    /// The key this value denotes, if it is usable as one
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Value::Str(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Float32(fl) => write!(f, "{}", fl),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Error(e) => write!(f, "{}", e),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Structured(s) => match s.to_json() {
                Ok(json) => write!(f, "{}", json),
                Err(_) => write!(f, "{}", s.describe()),
            },
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Value::Int(i as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(u: $t) -> Self {
                Value::Uint(u as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float32(f)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::Error(e)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Structured(Arc::new(json))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
