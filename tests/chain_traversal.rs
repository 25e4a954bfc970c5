//! Integration tests for walking chains that mix this crate's nodes with
//! foreign errors.

use std::error::Error;

use errchain::{
    ErrorWrapExt, Leaf, NodeKind, ResultWrapExt, WithMessage, WithStack, chain, first, is,
    is_kind, is_value, last, last_into, new, root_cause, unwrap, with_stack, wrap,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum AppError {
    #[error("not found")]
    NotFound,
    #[error("permission denied")]
    Denied,
}

#[derive(Debug, thiserror::Error)]
#[error("config error")]
struct ConfigError {
    #[source]
    source: WithMessage,
}

fn read_config() -> Result<(), AppError> {
    Err(AppError::NotFound)
}

fn load() -> Result<(), ConfigError> {
    read_config()
        .wrap("reading config")
        .map_err(|source| ConfigError { source })
}

// ============================================================================
// unwrap / chain
// ============================================================================

#[test]
fn unwrap_steps_one_cause_at_a_time() {
    let err = wrap(with_stack(AppError::Denied), "ctx");

    let step1 = unwrap(&err).unwrap();
    assert!(step1.is::<WithStack>());
    let step2 = unwrap(step1).unwrap();
    assert_eq!(step2.downcast_ref::<AppError>(), Some(&AppError::Denied));
    assert!(unwrap(step2).is_none());
}

#[test]
fn unwrap_on_foreign_leaf_is_none() {
    let io = std::io::Error::other("disk");
    assert!(unwrap(&io).is_none());
}

#[test]
fn chain_crosses_foreign_wrappers() {
    let err = load().unwrap_err();
    let texts: Vec<String> = chain(&err).map(|e| e.to_string()).collect();
    assert_eq!(
        texts,
        vec!["config error", "reading config: not found", "not found"]
    );
    assert_eq!(
        root_cause(&err).downcast_ref::<AppError>(),
        Some(&AppError::NotFound)
    );
}

// ============================================================================
// first / last
// ============================================================================

#[test]
fn first_and_last_differ_with_two_matches() {
    // positions 1 and 3 carry stacks; 0 and 2 do not
    let err = new("root");
    let err = wrap(err, "deep");
    let err = errchain::with_message(err, "plain");
    let err = wrap(err, "shallow");
    let err = errchain::with_message(err, "head");

    let shallow = first::<WithMessage>(&err).unwrap();
    assert_eq!(shallow.message(), "head");

    let with_stack_first = chain(&err)
        .filter_map(|e| e.downcast_ref::<WithMessage>())
        .find(|m| m.stack().is_some())
        .unwrap();
    assert_eq!(with_stack_first.message(), "shallow");

    let deep = errchain::last_map(&err, |e| {
        e.downcast_ref::<WithMessage>().filter(|m| m.stack().is_some())
    })
    .unwrap();
    assert_eq!(deep.message(), "deep");
    assert_eq!(last::<WithMessage>(&err).unwrap().message(), "deep");
}

#[test]
fn first_finds_foreign_wrapper_and_leaf() {
    let err = wrap(load().unwrap_err(), "starting");

    let config = first::<ConfigError>(&err).unwrap();
    assert_eq!(config.to_string(), "config error");
    assert_eq!(first::<AppError>(&err), Some(&AppError::NotFound));
    assert!(first::<Leaf>(&err).is_none());
}

#[test]
fn last_into_keeps_previous_on_miss() {
    let err = wrap(new("x"), "y");
    let other = new("z");

    let mut slot: Option<&Leaf> = None;
    assert!(last_into(&err, &mut slot));
    assert!(!last_into::<WithStack>(&other, &mut None));
    assert_eq!(slot.map(Leaf::text), Some("x"));
}

// ============================================================================
// is / is_value / is_kind
// ============================================================================

#[test]
fn is_value_matches_sentinel_through_chain() {
    let err = wrap(load().unwrap_err(), "starting");
    assert!(is_value(&err, &AppError::NotFound));
    assert!(!is_value(&err, &AppError::Denied));
    assert!(is::<ConfigError>(&err));
}

#[test]
fn is_kind_compares_variant_not_content() {
    let err = AppError::Denied.wrap("one");
    assert!(is_kind(&err, NodeKind::Message));
    assert!(!is_kind(&err, NodeKind::Stack));

    let err = AppError::Denied.with_stack();
    assert!(is_kind(&err, NodeKind::Stack));
}

// ============================================================================
// Interop
// ============================================================================

#[test]
fn anyhow_preserves_node_and_chain() {
    let err = anyhow::Error::new(wrap(new("query error"), "message"));

    assert_eq!(err.to_string(), "message: query error");
    assert_eq!(err.chain().count(), 2);
    assert_eq!(
        err.downcast_ref::<WithMessage>().map(WithMessage::message),
        Some("message")
    );
    assert_eq!(err.root_cause().to_string(), "query error");
}

#[test]
fn boxed_dyn_error_works_with_question_mark() {
    fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
        read_config().wrap("running")?;
        Ok(())
    }
    let err = run().unwrap_err();
    assert_eq!(err.to_string(), "running: not found");
    assert!(is::<AppError>(&*err));
}
