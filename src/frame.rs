//! Per-`try` frame state and the user-visible view of a caught exception.

use std::any::Any;
use std::io::Write;

use smallvec::SmallVec;

use crate::class::Class;
use crate::jump::RawTarget;

/// Which block of the construct the flow is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No frame exists for this flow.
    Outside,
    /// A frame exists but the engine is between blocks.
    Internal,
    /// Inside the `try` block (including calls made from it).
    Try,
    /// Inside a `catch` block.
    Catch,
    /// Inside the `finally` block.
    Finally,
}

/// Status of the exception slot of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExnState {
    Empty,
    Pending,
    Caught,
}

/// Data attached to a thrown exception.
///
/// The original payloads of this design are plain strings (assertion
/// expression text, user messages), so the type enumerates the small set
/// of shapes `throw!` accepts instead of erasing to `Any`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExnData {
    /// No data.
    #[default]
    None,
    /// Borrowed static text.
    Str(&'static str),
    /// Owned text.
    Text(String),
    /// An integer tag.
    Int(i64),
}

impl ExnData {
    /// The textual payload, if the data is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExnData::Str(s) => Some(s),
            ExnData::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&'static str> for ExnData {
    fn from(s: &'static str) -> Self {
        ExnData::Str(s)
    }
}

impl From<String> for ExnData {
    fn from(s: String) -> Self {
        ExnData::Text(s)
    }
}

impl From<i64> for ExnData {
    fn from(n: i64) -> Self {
        ExnData::Int(n)
    }
}

impl From<i32> for ExnData {
    fn from(n: i32) -> Self {
        ExnData::Int(n as i64)
    }
}

pub(crate) type AuditList = SmallVec<[(&'static Class, u32); 4]>;

/// State for one active `try` construct.
///
/// Frames are heap-boxed so their addresses survive growth of the frame
/// stack: the armed jump slots are written through raw pointers while the
/// body runs, and nested constructs push further frames meanwhile.
pub(crate) struct Frame {
    pub(crate) scope: Scope,
    pub(crate) state: ExnState,
    /// Destination starting `catch` evaluation; armed around the `try` body.
    pub(crate) throw_target: RawTarget,
    /// Destination reaching the `finally`; armed around body-plus-catches,
    /// then re-armed around the `finally` body itself.
    pub(crate) final_target: RawTarget,
    pub(crate) class: Option<&'static Class>,
    pub(crate) data: ExnData,
    pub(crate) file: &'static str,
    pub(crate) line: u32,
    pub(crate) try_file: &'static str,
    pub(crate) try_line: u32,
    /// True for the outermost construct of its activation; gates how far
    /// a return event propagates.
    pub(crate) first: bool,
    /// Boxed value of an in-flight `try_return!`.
    pub(crate) ret_val: Option<Box<dyn Any + Send>>,
    /// Payload of a Rust panic caught at the jump seam, resumed after the
    /// frame resolves.
    pub(crate) panic_payload: Option<Box<dyn Any + Send>>,
    /// Catch clauses seen by the auditor, debug builds only.
    pub(crate) audit: Option<AuditList>,
}

impl Frame {
    pub(crate) fn new(try_file: &'static str, try_line: u32, first: bool) -> Self {
        Frame {
            scope: Scope::Internal,
            state: ExnState::Empty,
            throw_target: std::ptr::null_mut(),
            final_target: std::ptr::null_mut(),
            class: None,
            data: ExnData::None,
            file: "",
            line: 0,
            try_file,
            try_line,
            first,
            ret_val: None,
            panic_payload: None,
            audit: None,
        }
    }
}

/// Handle bound by a `catch (Class, e)` clause.
///
/// The handle reads the current flow's pending exception, so its
/// accessors reflect later rethrows the way the original's accessor hooks
/// did. It is only meaningful inside the `catch` (or `finally`) blocks of
/// the construct that produced it.
#[derive(Clone, Copy)]
pub struct Caught {
    _private: (),
}

impl Caught {
    pub(crate) fn new() -> Self {
        Caught { _private: () }
    }

    fn read<R>(&self, f: impl FnOnce(&Frame) -> R) -> R {
        crate::engine::with_top_frame(f)
    }

    /// Class of the occurred exception.
    pub fn class(&self) -> &'static Class {
        self.read(|fr| fr.class.expect("caught handle without an exception"))
    }

    /// Data passed to the throw, possibly replaced by a rethrow.
    pub fn data(&self) -> ExnData {
        self.read(|fr| fr.data.clone())
    }

    /// Source file of the original throw.
    pub fn file(&self) -> &'static str {
        self.read(|fr| fr.file)
    }

    /// Source line of the original throw.
    pub fn line(&self) -> u32 {
        self.read(|fr| fr.line)
    }

    /// One-line description: `<class>: file "<file>", line <line>.`
    pub fn message(&self) -> String {
        self.read(|fr| {
            format!(
                "{}: file \"{}\", line {}.",
                fr.class.map(|c| c.name()).unwrap_or("?"),
                fr.file,
                fr.line
            )
        })
    }

    /// Writes the class name and every enclosing `try` site, innermost
    /// first, to `out` or to the diagnostic stream when `out` is `None`.
    pub fn print_try_trace(&self, out: Option<&mut dyn Write>) {
        crate::engine::print_try_trace(out);
    }

    /// Rethrows the current exception, preserving its class and origin
    /// but replacing the data. Normally invoked through
    /// [`throw!`](crate::throw) with the caught binding as first argument.
    pub fn throw_with(&self, data: ExnData, _file: &'static str, _line: u32) {
        crate::engine::rethrow(data);
    }
}

impl std::fmt::Debug for Caught {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caught")
            .field("class", &self.class().name())
            .field("file", &self.file())
            .field("line", &self.line())
            .finish()
    }
}
