//! Structured key/value context attached to errors.
//!
//! [`Fields`] is both the value carried by a [`WithFields`] node and the
//! builder that creates one. [`fields()`] merges every field set found in a
//! chain.
//!
//! ## Precedence
//!
//! When the same key appears at several depths of a chain, **the entry nearer
//! the root cause wins**. The deepest annotation is assumed to hold the most
//! specific data:
//!
//! ```rust
//! use errchain::{fields, new};
//!
//! let inner = fields!("a" => 1).wrap(new("bottom"), "inner");
//! let outer = fields!("a" => 2).wrap(inner, "outer");
//! assert_eq!(errchain::fields(&outer).get("a"), Some(&serde_json::json!(1)));
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::error::Error;
use std::fmt;

use serde_json::Value;

use crate::chain::chain;
use crate::node::{Leaf, WithFields};
use crate::stack::Stack;

/// Flat string-keyed map used for fields and projections.
pub type FieldMap = BTreeMap<String, Value>;

// ============================================================================
// HasFields
// ============================================================================

/// Capability of errors that carry structured fields.
///
/// Implemented by [`WithFields`]. Implement it on your own error types and
/// pass them through [`expose()`](crate::expose) so the chain can see them.
pub trait HasFields {
    /// The fields this error contributes. Must return a fresh copy.
    fn fields(&self) -> Fields;
}

// ============================================================================
// Fields
// ============================================================================

/// A set of structured fields, and the builder for field-carrying errors.
///
/// Keys are unique and iterate in sorted order. Values are
/// [`serde_json::Value`], so anything with a `From` conversion into it can be
/// stored directly.
///
/// ## Example
///
/// ```rust
/// use errchain::{Fields, new};
///
/// let ctx = Fields::new().with("user_id", 42).with("path", "/admin");
/// let err = ctx.wrap(new("forbidden"), "handling request");
/// assert_eq!(err.to_string(), "handling request: forbidden");
/// assert_eq!(format!("{:#}", err), "handling request: forbidden (path=/admin, user_id=42)");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(FieldMap);

impl Fields {
    /// Create an empty field set.
    #[inline]
    pub fn new() -> Self {
        Self(FieldMap::new())
    }

    /// Add a field, replacing any previous value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a field, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Borrow the underlying map.
    #[inline]
    pub fn as_map(&self) -> &FieldMap {
        &self.0
    }

    /// Consume the set and return the underlying map.
    #[inline]
    pub fn into_map(self) -> FieldMap {
        self.0
    }

    /// Wrap `cause` with these fields, a message and the caller's stack.
    #[track_caller]
    #[inline(never)]
    pub fn wrap<E>(&self, cause: E, message: impl Into<String>) -> WithFields
    where
        E: Error + Send + Sync + 'static,
    {
        WithFields::from_parts(cause, self.clone(), Some(message.into()), Stack::capture(1))
    }

    /// Like [`wrap`](Self::wrap) with a formatted message.
    #[track_caller]
    #[inline(never)]
    pub fn wrap_fmt<E>(&self, cause: E, args: fmt::Arguments<'_>) -> WithFields
    where
        E: Error + Send + Sync + 'static,
    {
        WithFields::from_parts(cause, self.clone(), Some(fmt::format(args)), Stack::capture(1))
    }

    /// Attach these fields and the caller's stack to `cause` without a message.
    /// The node renders as `cause`.
    #[track_caller]
    #[inline(never)]
    pub fn with_stack<E>(&self, cause: E) -> WithFields
    where
        E: Error + Send + Sync + 'static,
    {
        WithFields::from_parts(cause, self.clone(), None, Stack::capture(1))
    }

    /// Create a new error from `text` carrying these fields and the caller's stack.
    ///
    /// Use this when there is no upstream error to wrap.
    ///
    /// ```rust
    /// use errchain::{fields, to_map};
    ///
    /// let err = fields!("key1" => "value1").error("quota exceeded");
    /// assert_eq!(err.to_string(), "quota exceeded");
    /// assert_eq!(to_map(&err)["key1"], "value1");
    /// ```
    #[track_caller]
    #[inline(never)]
    pub fn error(&self, text: impl Into<String>) -> WithFields {
        WithFields::from_parts(Leaf::new(text), self.clone(), None, Stack::capture(1))
    }

    /// Like [`error`](Self::error) with formatted text.
    #[track_caller]
    #[inline(never)]
    pub fn error_fmt(&self, args: fmt::Arguments<'_>) -> WithFields {
        WithFields::from_parts(Leaf::new(fmt::format(args)), self.clone(), None, Stack::capture(1))
    }
}

/// Renders as `key=value, key=value`. String values are written without quotes.
impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{}={}", key, s)?,
                other => write!(f, "{}={}", key, other)?,
            }
        }
        Ok(())
    }
}

impl From<FieldMap> for Fields {
    fn from(map: FieldMap) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Fields {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Extend<(String, Value)> for Fields {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Exposed - opaque errors with their own fields
// ============================================================================

/// Object-safe view of an error that also has fields.
trait FieldedError: Error + HasFields + Send + Sync + 'static {
    fn as_error(&self) -> &(dyn Error + 'static);
}

impl<E: Error + HasFields + Send + Sync + 'static> FieldedError for E {
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

/// A transparent adapter that makes an opaque error's own fields visible to
/// the chain.
///
/// Renders, and reports its source, exactly like the inner error.
/// [`first()`](crate::first) and [`last()`](crate::last) match the inner
/// error's type through it.
///
/// ## Example
///
/// ```rust
/// use errchain::{Fields, HasFields, expose, first, wrap};
///
/// #[derive(Debug)]
/// struct QueryError { table: &'static str }
///
/// impl std::fmt::Display for QueryError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "query failed")
///     }
/// }
/// impl std::error::Error for QueryError {}
///
/// impl HasFields for QueryError {
///     fn fields(&self) -> Fields {
///         Fields::new().with("table", self.table)
///     }
/// }
///
/// let err = wrap(expose(QueryError { table: "users" }), "loading");
/// assert_eq!(err.to_string(), "loading: query failed");
/// assert_eq!(errchain::fields(&err).get("table"), Some(&"users".into()));
/// assert_eq!(first::<QueryError>(&err).map(|e| e.table), Some("users"));
/// ```
pub struct Exposed {
    inner: Box<dyn FieldedError>,
    inner_type: &'static str,
}

impl Exposed {
    pub fn new<E>(err: E) -> Self
    where
        E: Error + HasFields + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(err),
            inner_type: core::any::type_name::<E>(),
        }
    }

    /// The adapted error.
    #[inline]
    pub fn inner(&self) -> &(dyn Error + 'static) {
        self.inner.as_error()
    }

    #[inline]
    pub(crate) fn inner_type(&self) -> &'static str {
        self.inner_type
    }
}

impl HasFields for Exposed {
    fn fields(&self) -> Fields {
        self.inner.fields()
    }
}

impl fmt::Display for Exposed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner.as_error(), f)
    }
}

impl fmt::Debug for Exposed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner.as_error(), f)
    }
}

impl Error for Exposed {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.as_error().source()
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Fields carried by `err` itself, ignoring its causes.
pub fn own_fields(err: &(dyn Error + 'static)) -> Option<Fields> {
    if let Some(node) = err.downcast_ref::<WithFields>() {
        return Some(node.own_fields().clone());
    }
    err.downcast_ref::<Exposed>().map(HasFields::fields)
}

/// Merge every field set in the chain starting at `err`.
///
/// Walks the whole chain, including foreign wrappers between annotated nodes.
/// On a key collision the entry nearer the root cause wins. The result is a
/// fresh copy; changing it does not affect the chain.
pub fn fields(err: &(dyn Error + 'static)) -> Fields {
    let mut merged = Fields::new();
    for node in chain(err) {
        if let Some(own) = own_fields(node) {
            merged.extend(own);
        }
    }
    merged
}
