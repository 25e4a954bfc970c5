//! Flat projections of an error chain for structured logging.
//!
//! [`to_map()`] turns a chain into one string-keyed map:
//!
//! | Key | Value | Present |
//! |-----|-------|---------|
//! | `excValue` | full `Display` text | always |
//! | `excType` | type name of the root cause | always |
//! | `excFuncName` | function of the deepest stack's origin | when a stack exists |
//! | `excLineNum` | line of that origin (integer) | when a stack exists |
//! | `excFileName` | file of that origin | when a stack exists |
//! | *field keys* | merged fields, see [`fields()`](crate::fields()) | when fields exist |
//!
//! Field keys should not start with `exc`; on a collision the field wins.

use std::any::type_name;
use std::error::Error;

use serde_json::Value;

use crate::chain::{chain, last_map};
use crate::fields::{FieldMap, fields};
use crate::node::{Leaf, cause_type_of, stack_of};

pub const EXC_VALUE: &str = "excValue";
pub const EXC_TYPE: &str = "excType";
pub const EXC_FUNC_NAME: &str = "excFuncName";
pub const EXC_LINE_NUM: &str = "excLineNum";
pub const EXC_FILE_NAME: &str = "excFileName";

/// Reported as `excType` when no node in the chain recorded a type.
const UNKNOWN_TYPE: &str = "dyn core::error::Error";

// ============================================================================
// AsDynError
// ============================================================================

/// Borrow any error, sized or not, as a `dyn Error` chain head.
///
/// Lets the projections accept `&MyError` as well as `&dyn Error` while still
/// knowing the head's static type.
pub trait AsDynError {
    fn as_dyn_error(&self) -> &(dyn Error + 'static);
}

impl<E: Error + 'static> AsDynError for E {
    #[inline]
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsDynError for dyn Error + 'static {
    #[inline]
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsDynError for dyn Error + Send + Sync + 'static {
    #[inline]
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

// ============================================================================
// Projections
// ============================================================================

/// Type name of the root cause.
///
/// Nodes record the concrete type of what they wrap, so the name is exact
/// when an annotated node sits directly above the root cause. Below foreign
/// wrappers the deepest recorded type is reported. A lone error outside any
/// chain reports its static type, which is only informative when it is not
/// already `dyn Error`.
///
/// ```rust
/// let err = std::io::Error::other("disk");
/// assert!(errchain::root_type_name(&err).starts_with("std::io::"));
/// ```
pub fn root_type_name<E: AsDynError + ?Sized>(err: &E) -> &'static str {
    let head = err.as_dyn_error();
    let mut name = None;
    for node in chain(head) {
        if node.source().is_none() && node.is::<Leaf>() {
            return type_name::<Leaf>();
        }
        if let Some(recorded) = cause_type_of(node) {
            name = Some(recorded);
        }
    }
    match name {
        Some(recorded) => recorded,
        None if head.source().is_none() => type_name::<E>(),
        None => UNKNOWN_TYPE,
    }
}

/// Project the chain into a flat map. See the [module docs](self) for keys.
///
/// ```rust
/// use errchain::{new, to_map, wrap};
///
/// let m = to_map(&wrap(new("query error"), "message"));
/// assert_eq!(m["excValue"], "message: query error");
/// assert_eq!(m["excType"], "errchain::node::Leaf");
/// assert_eq!(m.len(), 5);
/// ```
pub fn to_map<E: AsDynError + ?Sized>(err: &E) -> FieldMap {
    let root_type = root_type_name(err);
    let err = err.as_dyn_error();

    let mut map = FieldMap::new();
    map.insert(EXC_VALUE.into(), Value::from(err.to_string()));
    map.insert(EXC_TYPE.into(), Value::from(root_type));

    if let Some(stack) = last_map(err, stack_of) {
        let origin = stack.origin();
        map.insert(EXC_FUNC_NAME.into(), Value::from(origin.function()));
        map.insert(EXC_LINE_NUM.into(), Value::from(origin.line()));
        map.insert(EXC_FILE_NAME.into(), Value::from(origin.file()));
    }

    map.extend(fields(err));
    map
}

/// [`to_map()`] as a JSON object.
pub fn to_json<E: AsDynError + ?Sized>(err: &E) -> Value {
    Value::Object(to_map(err).into_iter().collect())
}

// ============================================================================
// log bridge
// ============================================================================

#[cfg(feature = "log")]
pub use self::log_bridge::{LogRecord, log_error, to_log_record};

#[cfg(feature = "log")]
mod log_bridge {
    use log::kv;
    use serde_json::Value;

    use super::{AsDynError, to_map};
    use crate::fields::FieldMap;

    /// The [`to_map()`] projection as `log` key/values.
    ///
    /// Pass it to [`log::RecordBuilder::key_values`], or use [`log_error()`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct LogRecord {
        map: FieldMap,
    }

    impl LogRecord {
        #[inline]
        pub fn get(&self, key: &str) -> Option<&Value> {
            self.map.get(key)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.map.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.map.is_empty()
        }

        #[inline]
        pub fn as_map(&self) -> &FieldMap {
            &self.map
        }

        #[inline]
        pub fn into_map(self) -> FieldMap {
            self.map
        }
    }

    fn kv_value(value: &Value) -> kv::Value<'_> {
        match value {
            Value::String(s) => kv::Value::from(s.as_str()),
            Value::Bool(b) => kv::Value::from(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    kv::Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    kv::Value::from(u)
                } else {
                    kv::Value::from_display(n)
                }
            }
            other => kv::Value::from_display(other),
        }
    }

    impl kv::Source for LogRecord {
        fn visit<'kvs>(&'kvs self, visitor: &mut dyn kv::VisitSource<'kvs>) -> Result<(), kv::Error> {
            for (key, value) in &self.map {
                visitor.visit_pair(kv::Key::from_str(key), kv_value(value))?;
            }
            Ok(())
        }

        fn count(&self) -> usize {
            self.map.len()
        }
    }

    /// Project the chain into a `log` key/value record.
    pub fn to_log_record<E: AsDynError + ?Sized>(err: &E) -> LogRecord {
        LogRecord { map: to_map(err) }
    }

    /// Emit `err` through the installed logger at `level`.
    ///
    /// The message is the error's `Display` text; the key/values are
    /// [`to_log_record()`]. Nothing is computed when `level` is filtered out.
    pub fn log_error<E: AsDynError + ?Sized>(level: log::Level, err: &E) {
        if level > log::max_level() {
            return;
        }
        let record = to_log_record(err);
        log::logger().log(
            &log::Record::builder()
                .level(level)
                .target(module_path!())
                .args(format_args!("{}", err.as_dyn_error()))
                .key_values(&record)
                .build(),
        );
    }
}
