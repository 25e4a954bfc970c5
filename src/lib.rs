//! # errchain - error chains with messages, stacks and fields
//!
//! Annotate errors as they propagate, without losing the original cause:
//!
//! ```text
//! loading profile: fetching user: connection reset (user_id=42)
//! myapp::db::fetch_user
//!         src/db.rs:88
//! myapp::api::load_profile
//!         src/api.rs:17
//! ```
//!
//! Every annotation is an ordinary [`std::error::Error`] whose `source()` is
//! the error it wraps, so the chain works with `?`, `Box<dyn Error>`, `anyhow`
//! and anything else that walks `source()`.
//!
//! ## Try It Now
//!
//! ```rust
//! use errchain::{ResultWrapExt, WithMessage, fields, new, to_map};
//!
//! fn fetch_user(id: u64) -> Result<String, errchain::WithFields> {
//!     Err(fields!("user_id" => id).wrap(new("connection reset"), "fetching user"))
//! }
//!
//! fn load_profile() -> Result<String, WithMessage> {
//!     fetch_user(42).wrap("loading profile")
//! }
//!
//! let err = load_profile().unwrap_err();
//! assert_eq!(err.to_string(), "loading profile: fetching user: connection reset");
//!
//! let m = to_map(&err);
//! assert_eq!(m["user_id"], 42);
//! assert!(m.contains_key("excLineNum"));
//! ```
//!
//! ## Annotating
//!
//! | Function | Message | Stack | Fields |
//! |----------|---------|-------|--------|
//! | [`wrap(err, msg)`](wrap()) / [`wrapf!`] | ✅ | ✅ | ❌ |
//! | [`with_stack(err)`](with_stack()) | ❌ | ✅ | ❌ |
//! | [`with_message(err, msg)`](with_message()) | ✅ | ❌ | ❌ |
//! | [`fields.wrap(err, msg)`](Fields::wrap) / [`wrap_fields()`] | ✅ | ✅ | ✅ |
//! | [`fields.with_stack(err)`](Fields::with_stack) | ❌ | ✅ | ✅ |
//! | [`fields.error(text)`](Fields::error) | new error | ✅ | ✅ |
//!
//! The same operations exist as methods on errors ([`ErrorWrapExt`]), on
//! `Result` ([`ResultWrapExt`]) and on `Option<E>` ([`OptionWrapExt`]). The
//! `Result` and `Option` forms do nothing when there is no error, so
//! `op().wrap("context")?` is always safe to write.
//!
//! ## Inspecting
//!
//! | Function | Returns |
//! |----------|---------|
//! | [`unwrap()`] | the immediate cause |
//! | [`first::<T>()`](first()) | the match nearest the head |
//! | [`last::<T>()`](last()) | the match nearest the root cause |
//! | [`fields()`](fields()) | all fields, merged; deeper entries win |
//! | [`to_map()`] | flat map for structured logs |
//!
//! ## Formatting
//!
//! `{}` prints the message chain. `{:#}` adds stack frames and field lists.
//! `{:?}` and `{:#?}` behave the same way, and [`verbose()`] forces the long
//! form where only `{}` is available.

#![deny(unsafe_code)]

mod chain;
mod ext;
mod fields;
mod node;
pub mod prelude;
mod record;
mod stack;

use std::error::Error;
use std::fmt;

pub use chain::{
    Chain, chain, first, first_map, is, is_kind, is_value, last, last_into, last_map, root_cause,
    unwrap,
};
pub use ext::{ErrorWrapExt, OptionWrapExt, ResultWrapExt};
pub use fields::{Exposed, FieldMap, Fields, HasFields, fields, own_fields};
pub use node::{
    BoxError, Leaf, NodeKind, Verbose, WithFields, WithMessage, WithStack, kind_of, stack_of,
    verbose,
};
pub use record::{
    AsDynError, EXC_FILE_NAME, EXC_FUNC_NAME, EXC_LINE_NUM, EXC_TYPE, EXC_VALUE, root_type_name,
    to_json, to_map,
};
#[cfg(feature = "log")]
pub use record::{LogRecord, log_error, to_log_record};
pub use stack::{Frame, MAX_FRAMES, Stack, last_frame};

// ============================================================================
// Constructors
// ============================================================================

/// Create an error whose text is `text`.
///
/// Each call returns a distinct value, even for identical text.
#[inline]
pub fn new(text: impl Into<String>) -> Leaf {
    Leaf::new(text)
}

/// Wrap `err` with a message and the caller's stack.
///
/// An empty message renders as `err` alone.
///
/// ```rust
/// use errchain::{new, wrap};
///
/// let err = wrap(new("query error"), "message");
/// assert_eq!(err.to_string(), "message: query error");
/// ```
#[track_caller]
#[inline(never)]
pub fn wrap<E>(err: E, message: impl Into<String>) -> WithMessage
where
    E: Error + Send + Sync + 'static,
{
    WithMessage::from_parts(err, message.into(), Some(Stack::capture(1)))
}

/// Wrap `err` with a formatted message and the caller's stack.
///
/// Usually called through [`wrapf!`].
#[track_caller]
#[inline(never)]
pub fn wrap_fmt<E>(err: E, args: fmt::Arguments<'_>) -> WithMessage
where
    E: Error + Send + Sync + 'static,
{
    WithMessage::from_parts(err, fmt::format(args), Some(Stack::capture(1)))
}

/// Attach the caller's stack to `err`. The result renders as `err`.
#[track_caller]
#[inline(never)]
pub fn with_stack<E>(err: E) -> WithStack
where
    E: Error + Send + Sync + 'static,
{
    WithStack::from_parts(err, Stack::capture(1))
}

/// Wrap `err` with a message only. No stack is captured.
#[inline]
pub fn with_message<E>(err: E, message: impl Into<String>) -> WithMessage
where
    E: Error + Send + Sync + 'static,
{
    WithMessage::from_parts(err, message.into(), None)
}

/// Function form of [`Fields::wrap`].
#[track_caller]
#[inline(never)]
pub fn wrap_fields<E>(err: E, fields: &Fields, message: impl Into<String>) -> WithFields
where
    E: Error + Send + Sync + 'static,
{
    WithFields::from_parts(err, fields.clone(), Some(message.into()), Stack::capture(1))
}

/// Function form of [`Fields::wrap_fmt`].
#[track_caller]
#[inline(never)]
pub fn wrap_fields_fmt<E>(err: E, fields: &Fields, args: fmt::Arguments<'_>) -> WithFields
where
    E: Error + Send + Sync + 'static,
{
    WithFields::from_parts(err, fields.clone(), Some(fmt::format(args)), Stack::capture(1))
}

/// Make the fields of an opaque error visible to [`fields()`] and [`to_map()`].
///
/// See [`Exposed`].
#[inline]
pub fn expose<E>(err: E) -> Exposed
where
    E: Error + HasFields + Send + Sync + 'static,
{
    Exposed::new(err)
}

// ============================================================================
// Macros
// ============================================================================

/// Wrap an error with a formatted message and the caller's stack.
///
/// ```rust
/// use errchain::{new, wrapf};
///
/// let err = wrapf!(new("error"), "attempt {}", 3);
/// assert_eq!(err.to_string(), "attempt 3: error");
/// ```
#[macro_export]
macro_rules! wrapf {
    ($err:expr, $($arg:tt)+) => {
        $crate::wrap_fmt($err, ::core::format_args!($($arg)+))
    };
}

/// Build a [`Fields`] set from `key => value` pairs.
///
/// ```rust
/// use errchain::fields;
///
/// let f = fields!("user_id" => 42, "path" => "/admin");
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()$(.with($key, $value))+
    };
}
