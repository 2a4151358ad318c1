//! Caller-side argument values.
//!
//! Resource methods describe their keyword arguments as an `Args` list of
//! `Value`s. Domain objects cross the wire only as an identity reference,
//! which each domain type provides by implementing `Reference`.

use chrono::{DateTime, Utc};

/// How a domain object is referred to on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Uuid(String),
    Id(i64),
}

impl Identity {
    /// Picks the uuid when there is one, falling back to the numeric id.
    pub fn prefer(uuid: Option<&str>, id: Option<i64>) -> Option<Self> {
        match (uuid, id) {
            (Some(uuid), _) => Some(Identity::Uuid(uuid.to_string())),
            (None, Some(id)) => Some(Identity::Id(id)),
            (None, None) => None,
        }
    }
}

/// Capability of a domain object to be passed by reference.
pub trait Reference {
    /// `None` when the object has neither a uuid nor an id, which makes it
    /// unserializable.
    fn identity(&self) -> Option<Identity>;
}

/// A single keyword-argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset. Arguments with this value are left out of the request.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
    Reference(Option<Identity>),
    List(Vec<Value>),
}

impl Value {
    pub fn reference<R: Reference + ?Sized>(object: &R) -> Self {
        Value::Reference(object.identity())
    }

    pub fn references<'a, R, I>(objects: I) -> Self
    where
        R: Reference + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        Value::List(objects.into_iter().map(Value::reference).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Identity> for Value {
    fn from(v: Identity) -> Self {
        Value::Reference(Some(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

/// Ordered keyword arguments for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries.push((name.to_string(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
