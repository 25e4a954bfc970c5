//! Walking error chains.
//!
//! A chain is `err`, then `err.source()`, then its source, and so on until an
//! error reports no source. Nodes may be of any type; this crate's own nodes
//! and foreign wrappers are walked the same way.
//!
//! - [`first()`] returns the match nearest the head (the most recent annotation)
//! - [`last()`] returns the match nearest the root cause
//!
//! ```rust
//! use errchain::{WithMessage, first, last, new, wrap};
//!
//! let err = wrap(wrap(new("bottom"), "mid"), "top");
//! assert_eq!(first::<WithMessage>(&err).unwrap().message(), "top");
//! assert_eq!(last::<WithMessage>(&err).unwrap().message(), "mid");
//! ```

use std::error::Error;
use std::iter::FusedIterator;

use crate::fields::Exposed;
use crate::node::{NodeKind, kind_of};

/// Single-step unwrap: the immediate cause of `err`, or `None` for a leaf.
#[inline]
pub fn unwrap<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    err.source()
}

// ============================================================================
// Chain iterator
// ============================================================================

/// Iterator over an error chain, head first. Created by [`chain()`].
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

impl FusedIterator for Chain<'_> {}

/// Iterate over `err` and all of its causes, head first.
#[inline]
pub fn chain<'a>(err: &'a (dyn Error + 'static)) -> Chain<'a> {
    Chain { next: Some(err) }
}

/// The terminal error of the chain.
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    chain(err).last().unwrap_or(err)
}

// ============================================================================
// Matching
// ============================================================================

/// Convert one node to `T`: by concrete type, or through an [`Exposed`]
/// adapter holding a `T`.
fn convert<'a, T: Error + 'static>(node: &'a (dyn Error + 'static)) -> Option<&'a T> {
    node.downcast_ref::<T>().or_else(|| {
        node.downcast_ref::<Exposed>()
            .and_then(|exposed| exposed.inner().downcast_ref::<T>())
    })
}

/// First node in the chain for which `f` returns `Some`.
pub fn first_map<'a, R>(
    err: &'a (dyn Error + 'static),
    f: impl FnMut(&'a (dyn Error + 'static)) -> Option<R>,
) -> Option<R> {
    chain(err).find_map(f)
}

/// Last node in the chain for which `f` returns `Some`.
///
/// Always walks the whole chain.
pub fn last_map<'a, R>(
    err: &'a (dyn Error + 'static),
    mut f: impl FnMut(&'a (dyn Error + 'static)) -> Option<R>,
) -> Option<R> {
    let mut found = None;
    for node in chain(err) {
        if let Some(hit) = f(node) {
            found = Some(hit);
        }
    }
    found
}

/// Find the first error of type `T` in the chain.
///
/// ```rust
/// use errchain::{Leaf, first, new, wrap};
///
/// let err = wrap(new("query error"), "message");
/// assert_eq!(first::<Leaf>(&err).unwrap().text(), "query error");
/// ```
pub fn first<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    first_map(err, convert::<T>)
}

/// Find the last error of type `T` in the chain, i.e. the one nearest the
/// root cause.
///
/// Slower than [`first()`] because it never stops early. Use it when the
/// deepest match matters, such as the stack taken closest to where the error
/// originated.
pub fn last<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    last_map(err, convert::<T>)
}

/// Out-slot form of [`last()`].
///
/// On a match, stores it in `target` and returns `true`. Otherwise returns
/// `false` and leaves `target` as it was.
///
/// ```rust
/// use errchain::{WithMessage, last_into, new, wrap};
///
/// let err = wrap(new("bottom"), "last");
/// let mut found: Option<&WithMessage> = None;
/// assert!(last_into(&err, &mut found));
///
/// let other = new("no stack");
/// assert!(!last_into(&other, &mut found));
/// assert_eq!(found.unwrap().to_string(), "last: bottom");
/// ```
pub fn last_into<'a, T: Error + 'static>(
    err: &'a (dyn Error + 'static),
    target: &mut Option<&'a T>,
) -> bool {
    match last::<T>(err) {
        Some(hit) => {
            *target = Some(hit);
            true
        }
        None => false,
    }
}

/// Whether any error in the chain is of type `T`.
#[inline]
pub fn is<T: Error + 'static>(err: &(dyn Error + 'static)) -> bool {
    first::<T>(err).is_some()
}

/// Whether any error in the chain equals `target`.
///
/// For sentinel-style errors compared by value.
pub fn is_value<T: Error + PartialEq + 'static>(err: &(dyn Error + 'static), target: &T) -> bool {
    chain(err).any(|node| convert::<T>(node).is_some_and(|v| v == target))
}

/// Whether any node in the chain is of the given variant.
pub fn is_kind(err: &(dyn Error + 'static), kind: NodeKind) -> bool {
    chain(err).any(|node| kind_of(node) == Some(kind))
}
