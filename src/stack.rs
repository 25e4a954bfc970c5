//! Call-stack snapshots attached to chain nodes.
//!
//! This module provides [`Stack`], captured once when a node is built, and
//! [`Frame`], one resolved call site inside it.

use std::fmt;
use std::panic::Location;
use std::path::Path;

/// Maximum number of frames kept after skipping.
pub const MAX_FRAMES: usize = 32;

/// Demangled name of the capture routine. Frames up to and including this one
/// are never reported.
const CAPTURE_FN: &str = concat!(module_path!(), "::Stack::capture");

// ============================================================================
// Frame
// ============================================================================

/// One call site inside a [`Stack`].
///
/// Symbols that cannot be resolved leave `function` and `file` empty and
/// `line` at zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Frame {
    function: String,
    file: String,
    line: u32,
}

impl Frame {
    /// Build a frame from its parts.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Fully qualified function name, e.g. `myapp::db::load_user`.
    #[inline]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Source file path as recorded by the compiler or the debug info.
    #[inline]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line number, or 0 when unknown.
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Last path segment of the function name (`load_user` for
    /// `myapp::db::load_user`).
    pub fn short_name(&self) -> &str {
        let name = self.function.trim_end_matches("::{{closure}}");
        name.rsplit("::").next().unwrap_or(name)
    }

    /// Base name of the source file (`db.rs` for `src/db.rs`).
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\t{}:{}", self.function, self.file, self.line)
    }
}

// ============================================================================
// Stack
// ============================================================================

/// A snapshot of the call stack taken when an annotation was made.
///
/// Frames are ordered innermost first, so [`frames()`](Self::frames)`[0]` is
/// the call site of the annotating function. Symbols are resolved during
/// [`capture()`](Self::capture); the snapshot never changes afterwards.
///
/// ## Example
///
/// ```rust
/// use errchain::Stack;
///
/// let stack = Stack::capture(0);
/// let origin = stack.origin();
/// assert!(origin.file().ends_with(".rs"));
/// ```
#[derive(Debug, Clone)]
pub struct Stack {
    caller: &'static Location<'static>,
    frames: Vec<Frame>,
}

impl Stack {
    /// Capture the current call stack.
    ///
    /// `skip` counts frames to drop above the caller of `capture`: `0` keeps the
    /// function that called `capture`, `1` drops it and starts at its caller.
    /// Every constructor in this crate passes `1` so the snapshot starts at the
    /// user's annotation call.
    ///
    /// Never fails. When symbols are missing the frames are still recorded
    /// with empty names.
    #[track_caller]
    #[inline(never)]
    pub fn capture(skip: usize) -> Self {
        let caller = Location::caller();
        let bt = backtrace::Backtrace::new();

        // Inlined calls show up as extra symbols on a single physical frame.
        let mut frames = Vec::new();
        for frame in bt.frames() {
            let symbols = frame.symbols();
            if symbols.is_empty() {
                frames.push(Frame::default());
                continue;
            }
            for sym in symbols {
                frames.push(Frame {
                    function: sym.name().map(|n| format!("{:#}", n)).unwrap_or_default(),
                    file: sym
                        .filename()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    line: sym.lineno().unwrap_or(0),
                });
            }
        }

        let start = frames
            .iter()
            .position(|f| f.function == CAPTURE_FN)
            .map_or(0, |i| i + 1)
            .saturating_add(skip)
            .min(frames.len());
        frames.drain(..start);
        frames.truncate(MAX_FRAMES);

        Self { caller, frames }
    }

    /// All captured frames, innermost first.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Exact source location of the annotation call.
    #[inline]
    pub fn caller(&self) -> &'static Location<'static> {
        self.caller
    }

    /// The frame considered the origin of the error: the annotation call site.
    ///
    /// The function name comes from the first captured frame; file and line
    /// come from the caller location, which is exact even without debug info.
    ///
    /// In optimized builds the annotating function may be inlined into its
    /// caller. The function name then belongs to the enclosing frame (or is
    /// empty when symbols are missing) while file and line still point at the
    /// annotation call.
    pub fn origin(&self) -> Frame {
        Frame {
            function: self
                .frames
                .first()
                .map(|f| f.function.clone())
                .unwrap_or_default(),
            file: self.caller.file().into(),
            line: self.caller.line(),
        }
    }
}

/// Renders every frame on its own pair of lines, each preceded by a newline.
impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            write!(f, "\n{}", frame)?;
        }
        Ok(())
    }
}

/// Origin frame of `stack`. Free-function form of [`Stack::origin`].
#[inline]
pub fn last_frame(stack: &Stack) -> Frame {
    stack.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(debug_assertions)]
    #[inline(never)]
    fn capture_here() -> Stack {
        Stack::capture(0)
    }

    #[cfg(debug_assertions)]
    #[inline(never)]
    fn capture_for_caller() -> Stack {
        Stack::capture(1)
    }

    #[test]
    #[cfg(debug_assertions)]
    fn skip_zero_starts_at_capturing_function() {
        let stack = capture_here();
        assert!(
            stack.frames()[0].function().ends_with("capture_here"),
            "got {:?}",
            stack.frames()[0]
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    fn skip_one_starts_at_caller() {
        let stack = capture_for_caller();
        assert!(
            stack.frames()[0]
                .function()
                .ends_with("skip_one_starts_at_caller"),
            "got {:?}",
            stack.frames()[0]
        );
    }

    #[test]
    fn origin_uses_caller_location() {
        let (stack, line) = (Stack::capture(0), line!());
        let origin = stack.origin();
        assert_eq!(origin.line(), line);
        assert!(origin.file().ends_with("stack.rs"));
    }

    #[test]
    fn frames_are_bounded() {
        fn recurse(n: usize) -> Stack {
            if n == 0 { Stack::capture(0) } else { recurse(n - 1) }
        }
        assert!(recurse(64).frames().len() <= MAX_FRAMES);
    }

    #[test]
    fn frame_short_name_and_file_name() {
        let frame = Frame::new("myapp::db::load_user::{{closure}}", "/src/db.rs", 7);
        assert_eq!(frame.short_name(), "load_user");
        assert_eq!(frame.file_name(), "db.rs");
        assert_eq!(frame.to_string(), "myapp::db::load_user::{{closure}}\n\t/src/db.rs:7");
    }

    #[test]
    fn unresolved_frame_is_empty() {
        let frame = Frame::default();
        assert_eq!(frame.function(), "");
        assert_eq!(frame.short_name(), "");
        assert_eq!(frame.line(), 0);
    }
}
