//! Chain node types.
//!
//! Each node owns exactly one cause and adds one or more annotations to it:
//!
//! | Type | Message | Stack | Fields |
//! |------|---------|-------|--------|
//! | [`WithStack`] | ❌ | ✅ | ❌ |
//! | [`WithMessage`] | ✅ | optional | ❌ |
//! | [`WithFields`] | optional | ✅ | ✅ |
//!
//! [`Leaf`] is the plain-text error used when there is nothing to wrap.
//!
//! All nodes render the same way:
//!
//! - `{}` and `{:?}`: the message chain, `"outer: inner: leaf"`
//! - `{:#}` and `{:#?}`: the message chain plus stack frames and field lists

use std::any::type_name;
use std::error::Error;
use std::fmt;

use crate::fields::{Exposed, Fields, HasFields};
use crate::stack::Stack;

/// Boxed, thread-safe cause stored inside every node.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Variant tag of a chain node.
///
/// Two nodes are of the same kind when they are the same variant, whatever
/// their message, stack or fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// [`WithStack`]
    Stack,
    /// [`WithMessage`]
    Message,
    /// [`WithFields`]
    Fields,
}

/// Upcast a boxed cause for `Error::source`.
#[inline]
fn as_source(cause: &BoxError) -> &(dyn Error + 'static) {
    &**cause
}

// ============================================================================
// Leaf
// ============================================================================

/// An error that is only a string.
///
/// Built by [`new()`](crate::new) and by [`Fields::error`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{text}")]
pub struct Leaf {
    text: String,
}

impl Leaf {
    /// Create a leaf error with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The error text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

// ============================================================================
// WithStack
// ============================================================================

/// A cause annotated with a stack snapshot and nothing else.
///
/// Renders exactly like its cause; `{:#}` appends the frames.
///
/// ## Example
///
/// ```rust
/// use errchain::{new, with_stack};
///
/// let err = with_stack(new("disk full"));
/// assert_eq!(err.to_string(), "disk full");
/// assert!(format!("{:#}", err).contains("disk full\n"));
/// ```
pub struct WithStack {
    cause: BoxError,
    cause_type: &'static str,
    stack: Stack,
}

impl WithStack {
    /// Build a node from a cause and an already captured stack.
    pub fn from_parts<E>(cause: E, stack: Stack) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            cause: Box::new(cause),
            cause_type: type_name::<E>(),
            stack,
        }
    }

    /// The wrapped cause.
    #[inline]
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.cause
    }

    /// Consume the node and return the cause.
    #[inline]
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// Stack captured when this node was built.
    #[inline]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        NodeKind::Stack
    }
}

impl fmt::Display for WithStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{:#}{}", self.cause, self.stack)
        } else {
            write!(f, "{}", self.cause)
        }
    }
}

impl fmt::Debug for WithStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Error for WithStack {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(as_source(&self.cause))
    }
}

// ============================================================================
// WithMessage
// ============================================================================

/// A cause annotated with a message, and usually a stack.
///
/// [`wrap()`](crate::wrap) builds one with a stack; [`with_message()`](crate::with_message)
/// builds one without. An empty message renders as the cause alone.
///
/// ## Example
///
/// ```rust
/// use errchain::{new, wrap};
///
/// let err = wrap(new("connection reset"), "fetching user");
/// assert_eq!(err.to_string(), "fetching user: connection reset");
/// assert_eq!(err.message(), "fetching user");
/// ```
pub struct WithMessage {
    cause: BoxError,
    cause_type: &'static str,
    message: String,
    stack: Option<Stack>,
}

impl WithMessage {
    /// Build a node from a cause, a message and an optional stack.
    pub fn from_parts<E>(cause: E, message: String, stack: Option<Stack>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            cause: Box::new(cause),
            cause_type: type_name::<E>(),
            message,
            stack,
        }
    }

    /// The wrapped cause.
    #[inline]
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.cause
    }

    /// Consume the node and return the cause.
    #[inline]
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// This node's own message, without the cause's text.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn stack(&self) -> Option<&Stack> {
        self.stack.as_ref()
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        NodeKind::Message
    }
}

impl fmt::Display for WithMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}: ", self.message)?;
        }
        if !f.alternate() {
            return write!(f, "{}", self.cause);
        }
        write!(f, "{:#}", self.cause)?;
        if let Some(stack) = &self.stack {
            write!(f, "{}", stack)?;
        }
        Ok(())
    }
}

impl fmt::Debug for WithMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Error for WithMessage {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(as_source(&self.cause))
    }
}

// ============================================================================
// WithFields
// ============================================================================

/// A cause annotated with structured fields and a stack, with or without a message.
///
/// `{:#}` appends this node's own fields as `(key=value, ...)`. The merged,
/// chain-wide view is available through [`HasFields::fields`] and
/// [`to_map()`](crate::to_map).
///
/// ## Example
///
/// ```rust
/// use errchain::{fields, new};
///
/// let err = fields!("user_id" => 42).wrap(new("not found"), "loading profile");
/// assert_eq!(err.to_string(), "loading profile: not found");
/// assert_eq!(format!("{:#}", err), "loading profile: not found (user_id=42)");
/// ```
pub struct WithFields {
    cause: BoxError,
    cause_type: &'static str,
    fields: Fields,
    message: Option<String>,
    stack: Stack,
}

impl WithFields {
    /// Build a node from its parts. An empty message is treated as no message.
    pub fn from_parts<E>(cause: E, fields: Fields, message: Option<String>, stack: Stack) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            cause: Box::new(cause),
            cause_type: type_name::<E>(),
            fields,
            message: message.filter(|m| !m.is_empty()),
            stack,
        }
    }

    /// The wrapped cause.
    #[inline]
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.cause
    }

    /// Consume the node and return the cause.
    #[inline]
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// Fields attached at this node only. See [`HasFields::fields`] for the merged set.
    #[inline]
    pub fn own_fields(&self) -> &Fields {
        &self.fields
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[inline]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        NodeKind::Fields
    }
}

impl HasFields for WithFields {
    /// This node's fields merged with every field set below it.
    /// Entries nearer the root cause win.
    fn fields(&self) -> Fields {
        crate::fields::fields(self)
    }
}

impl fmt::Display for WithFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            write!(f, "{}: ", message)?;
        }
        if !f.alternate() {
            return write!(f, "{}", self.cause);
        }
        write!(f, "{:#}", self.cause)?;
        if !self.fields.is_empty() {
            write!(f, " ({})", self.fields)?;
        }
        Ok(())
    }
}

impl fmt::Debug for WithFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Error for WithFields {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(as_source(&self.cause))
    }
}

// ============================================================================
// Verbose adapter
// ============================================================================

/// Renders the wrapped error in its verbose form even under plain `{}`.
///
/// Useful where a sink formats with `{}` only. Created by [`verbose()`].
pub struct Verbose<'a>(&'a (dyn Error + 'static));

impl fmt::Display for Verbose<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl fmt::Debug for Verbose<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Wrap `err` so that `{}` renders it like `{:#}`.
///
/// ```rust
/// use errchain::{fields, new, verbose};
///
/// let err = fields!("k" => 1).wrap(new("e"), "m");
/// assert_eq!(verbose(&err).to_string(), "m: e (k=1)");
/// ```
#[inline]
pub fn verbose<'a>(err: &'a (dyn Error + 'static)) -> Verbose<'a> {
    Verbose(err)
}

// ============================================================================
// Capability probes
// ============================================================================

/// The error an [`Exposed`] adapter stands for, or `err` itself.
fn look_through<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    match err.downcast_ref::<Exposed>() {
        Some(exposed) => exposed.inner(),
        None => err,
    }
}

/// Stack carried by `err` itself, if it is a stack-bearing node.
///
/// Only looks at `err`, not at its causes. An [`Exposed`] node is judged by
/// the error it adapts. Combine with [`last_map()`](crate::last_map) to find
/// the deepest stack in a chain.
pub fn stack_of<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Stack> {
    let err = look_through(err);
    if let Some(node) = err.downcast_ref::<WithStack>() {
        return Some(node.stack());
    }
    if let Some(node) = err.downcast_ref::<WithMessage>() {
        return node.stack();
    }
    err.downcast_ref::<WithFields>().map(WithFields::stack)
}

/// Variant tag of `err`, or `None` when it is not one of this crate's nodes.
pub fn kind_of(err: &(dyn Error + 'static)) -> Option<NodeKind> {
    let err = look_through(err);
    if err.is::<WithStack>() {
        Some(NodeKind::Stack)
    } else if err.is::<WithMessage>() {
        Some(NodeKind::Message)
    } else if err.is::<WithFields>() {
        Some(NodeKind::Fields)
    } else {
        None
    }
}

/// Type name of the error directly below `err`, as recorded at construction.
///
/// An [`Exposed`] node reports what its inner node recorded, or the inner
/// error's own type when that is not one of this crate's nodes.
pub(crate) fn cause_type_of(err: &(dyn Error + 'static)) -> Option<&'static str> {
    let exposed = err.downcast_ref::<Exposed>();
    let err = look_through(err);
    if let Some(node) = err.downcast_ref::<WithStack>() {
        Some(node.cause_type)
    } else if let Some(node) = err.downcast_ref::<WithMessage>() {
        Some(node.cause_type)
    } else if let Some(node) = err.downcast_ref::<WithFields>() {
        Some(node.cause_type)
    } else {
        exposed.map(Exposed::inner_type)
    }
}
