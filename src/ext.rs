//! Extension traits for annotating errors where they are returned.
//!
//! - [`ErrorWrapExt`]: call `.wrap()` / `.with_stack()` on an error value
//! - [`ResultWrapExt`]: annotate the `Err` side of a `Result`; `Ok` passes through
//! - [`OptionWrapExt`]: annotate an `Option<E>` error; `None` passes through
//!
//! The `Result` and `Option` forms let call sites annotate unconditionally:
//!
//! ```rust
//! use errchain::{Leaf, ResultWrapExt, WithMessage, new};
//!
//! fn load() -> Result<u32, Leaf> {
//!     Err(new("file not found"))
//! }
//!
//! fn init() -> Result<u32, WithMessage> {
//!     load().wrap("loading config")
//! }
//!
//! assert_eq!(init().unwrap_err().to_string(), "loading config: file not found");
//! ```
//!
//! Every method captures the stack at its own call site.

use std::error::Error;

use crate::fields::Fields;
use crate::node::{WithFields, WithMessage, WithStack};
use crate::stack::Stack;

// ============================================================================
// ErrorWrapExt
// ============================================================================

/// Annotation methods on any error value.
pub trait ErrorWrapExt: Sized {
    /// Wrap with a message and the caller's stack.
    #[track_caller]
    fn wrap(self, message: impl Into<String>) -> WithMessage;

    /// Wrap with a lazily built message and the caller's stack.
    #[track_caller]
    fn wrap_with(self, f: impl FnOnce() -> String) -> WithMessage;

    /// Attach the caller's stack only.
    #[track_caller]
    fn with_stack(self) -> WithStack;

    /// Wrap with fields, a message and the caller's stack.
    #[track_caller]
    fn wrap_fields(self, fields: &Fields, message: impl Into<String>) -> WithFields;
}

impl<E: Error + Send + Sync + 'static> ErrorWrapExt for E {
    #[track_caller]
    #[inline(never)]
    fn wrap(self, message: impl Into<String>) -> WithMessage {
        WithMessage::from_parts(self, message.into(), Some(Stack::capture(1)))
    }

    #[track_caller]
    #[inline(never)]
    fn wrap_with(self, f: impl FnOnce() -> String) -> WithMessage {
        WithMessage::from_parts(self, f(), Some(Stack::capture(1)))
    }

    #[track_caller]
    #[inline(never)]
    fn with_stack(self) -> WithStack {
        WithStack::from_parts(self, Stack::capture(1))
    }

    #[track_caller]
    #[inline(never)]
    fn wrap_fields(self, fields: &Fields, message: impl Into<String>) -> WithFields {
        WithFields::from_parts(self, fields.clone(), Some(message.into()), Stack::capture(1))
    }
}

// ============================================================================
// ResultWrapExt
// ============================================================================

/// Annotation methods on `Result<T, E>`. `Ok` values are returned untouched
/// and nothing is captured.
pub trait ResultWrapExt<T, E> {
    /// Wrap the error with a message and the caller's stack.
    #[track_caller]
    fn wrap(self, message: impl Into<String>) -> Result<T, WithMessage>;

    /// Wrap the error with a lazily built message. The closure only runs on `Err`.
    #[track_caller]
    fn wrap_with(self, f: impl FnOnce() -> String) -> Result<T, WithMessage>;

    /// Attach the caller's stack to the error.
    #[track_caller]
    fn with_stack(self) -> Result<T, WithStack>;

    /// Wrap the error with fields, a message and the caller's stack.
    #[track_caller]
    fn wrap_fields(self, fields: &Fields, message: impl Into<String>) -> Result<T, WithFields>;
}

impl<T, E: Error + Send + Sync + 'static> ResultWrapExt<T, E> for Result<T, E> {
    #[track_caller]
    #[inline(never)]
    fn wrap(self, message: impl Into<String>) -> Result<T, WithMessage> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(WithMessage::from_parts(
                e,
                message.into(),
                Some(Stack::capture(1)),
            )),
        }
    }

    #[track_caller]
    #[inline(never)]
    fn wrap_with(self, f: impl FnOnce() -> String) -> Result<T, WithMessage> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(WithMessage::from_parts(e, f(), Some(Stack::capture(1)))),
        }
    }

    #[track_caller]
    #[inline(never)]
    fn with_stack(self) -> Result<T, WithStack> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(WithStack::from_parts(e, Stack::capture(1))),
        }
    }

    #[track_caller]
    #[inline(never)]
    fn wrap_fields(self, fields: &Fields, message: impl Into<String>) -> Result<T, WithFields> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(WithFields::from_parts(
                e,
                fields.clone(),
                Some(message.into()),
                Stack::capture(1),
            )),
        }
    }
}

// ============================================================================
// OptionWrapExt
// ============================================================================

/// Annotation methods on an optional error. `None` stays `None`.
///
/// ```rust
/// use errchain::{Leaf, OptionWrapExt};
///
/// let no_error: Option<Leaf> = None;
/// assert!(no_error.wrap("no error").is_none());
/// ```
pub trait OptionWrapExt<E> {
    /// Wrap the error with a message and the caller's stack.
    #[track_caller]
    fn wrap(self, message: impl Into<String>) -> Option<WithMessage>;

    /// Attach the caller's stack to the error.
    #[track_caller]
    fn with_stack(self) -> Option<WithStack>;

    /// Wrap the error with fields, a message and the caller's stack.
    #[track_caller]
    fn wrap_fields(self, fields: &Fields, message: impl Into<String>) -> Option<WithFields>;
}

impl<E: Error + Send + Sync + 'static> OptionWrapExt<E> for Option<E> {
    #[track_caller]
    #[inline(never)]
    fn wrap(self, message: impl Into<String>) -> Option<WithMessage> {
        match self {
            Some(e) => Some(WithMessage::from_parts(
                e,
                message.into(),
                Some(Stack::capture(1)),
            )),
            None => None,
        }
    }

    #[track_caller]
    #[inline(never)]
    fn with_stack(self) -> Option<WithStack> {
        match self {
            Some(e) => Some(WithStack::from_parts(e, Stack::capture(1))),
            None => None,
        }
    }

    #[track_caller]
    #[inline(never)]
    fn wrap_fields(self, fields: &Fields, message: impl Into<String>) -> Option<WithFields> {
        match self {
            Some(e) => Some(WithFields::from_parts(
                e,
                fields.clone(),
                Some(message.into()),
                Stack::capture(1),
            )),
            None => None,
        }
    }
}
