//! Convenient re-exports for common usage.
//!
//! ## Usage
//!
//! ```rust
//! use errchain::prelude::*;
//!
//! fn inner() -> Result<(), Leaf> {
//!     Err(new("disk full"))
//! }
//!
//! fn outer() -> Result<(), WithMessage> {
//!     inner().wrap("saving snapshot")?;
//!     Ok(())
//! }
//!
//! assert_eq!(outer().unwrap_err().to_string(), "saving snapshot: disk full");
//! ```

pub use crate::{
    ErrorWrapExt, Fields, HasFields, Leaf, OptionWrapExt, ResultWrapExt, WithFields, WithMessage,
    WithStack, new,
};
