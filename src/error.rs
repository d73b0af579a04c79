//! Error taxonomy and the per-instance last-error snapshot.

use core::fmt;

use crate::atomic::{AtomicU32, Ordering};

/// Result type alias for ring operations.
pub type Result<T, E = RingError> = core::result::Result<T, E>;

/// Every way a ring operation can fail.
///
/// The `Display` text doubles as the human-readable description of the code;
/// [`RingError::as_str`] returns the same text without going through `fmt`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[repr(u8)]
pub enum RingError {
    /// The ring was built without storage.
    #[error("Null pointer argument")]
    NullPointer = 1,
    /// The storage has zero slots.
    #[error("Invalid buffer size")]
    InvalidSize = 2,
    /// No free slot and overwrite mode is off.
    #[error("Buffer is full")]
    BufferFull = 3,
    /// Nothing to remove.
    #[error("Buffer is empty")]
    BufferEmpty = 4,
    /// `peek` offset at or beyond the current occupancy.
    #[error("Invalid offset")]
    InvalidOffset = 5,
    /// A bulk call was handed an empty slice.
    #[error("Invalid count parameter")]
    InvalidCount = 6,
    /// An index is out of range; the ring state cannot be trusted.
    #[error("Buffer integrity check failed")]
    BufferCorrupted = 7,
    /// A timeout wrapper ran to its deadline.
    #[error("Operation timed out")]
    Timeout = 8,
    #[error("Invalid parameter value")]
    InvalidParameter = 9,
}

impl RingError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NullPointer => "Null pointer argument",
            Self::InvalidSize => "Invalid buffer size",
            Self::BufferFull => "Buffer is full",
            Self::BufferEmpty => "Buffer is empty",
            Self::InvalidOffset => "Invalid offset",
            Self::InvalidCount => "Invalid count parameter",
            Self::BufferCorrupted => "Buffer integrity check failed",
            Self::Timeout => "Operation timed out",
            Self::InvalidParameter => "Invalid parameter value",
        }
    }

    /// Stable numeric code, never zero.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::NullPointer,
            2 => Self::InvalidSize,
            3 => Self::BufferFull,
            4 => Self::BufferEmpty,
            5 => Self::InvalidOffset,
            6 => Self::InvalidCount,
            7 => Self::BufferCorrupted,
            8 => Self::Timeout,
            9 => Self::InvalidParameter,
            _ => return None,
        })
    }
}

/// The ring operation a recorded failure came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    Init = 1,
    Insert = 2,
    Remove = 3,
    Peek = 4,
    InsertBulk = 5,
    RemoveBulk = 6,
    InsertWithTimeout = 7,
    RemoveWithTimeout = 8,
    SanityCheck = 9,
    SetPollPolicy = 10,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Insert => "insert",
            Self::Remove => "remove",
            Self::Peek => "peek",
            Self::InsertBulk => "insert_bulk",
            Self::RemoveBulk => "remove_bulk",
            Self::InsertWithTimeout => "insert_with_timeout",
            Self::RemoveWithTimeout => "remove_with_timeout",
            Self::SanityCheck => "sanity_check",
            Self::SetPollPolicy => "set_poll_policy",
        }
    }

    const fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Self::Init,
            2 => Self::Insert,
            3 => Self::Remove,
            4 => Self::Peek,
            5 => Self::InsertBulk,
            6 => Self::RemoveBulk,
            7 => Self::InsertWithTimeout,
            8 => Self::RemoveWithTimeout,
            9 => Self::SanityCheck,
            10 => Self::SetPollPolicy,
            _ => return None,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The argument a recorded failure is blamed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Parameter {
    Storage = 1,
    Offset = 2,
    Items = 3,
    Timeout = 4,
    Policy = 5,
}

impl Parameter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Offset => "offset",
            Self::Items => "items",
            Self::Timeout => "timeout",
            Self::Policy => "policy",
        }
    }

    /// The argument that `err` points at, if any.
    ///
    /// Full, empty and corrupted conditions describe the ring, not an argument.
    pub const fn implicated_by(err: RingError) -> Option<Self> {
        match err {
            RingError::NullPointer | RingError::InvalidSize => Some(Self::Storage),
            RingError::InvalidOffset => Some(Self::Offset),
            RingError::InvalidCount => Some(Self::Items),
            RingError::Timeout => Some(Self::Timeout),
            RingError::InvalidParameter => Some(Self::Policy),
            RingError::BufferFull | RingError::BufferEmpty | RingError::BufferCorrupted => None,
        }
    }

    const fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Self::Storage,
            2 => Self::Offset,
            3 => Self::Items,
            4 => Self::Timeout,
            5 => Self::Policy,
            _ => return None,
        })
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the most recent failure on a ring.
///
/// `line` is the source line of the call that failed, captured with
/// `#[track_caller]`. A cleared snapshot has `code == None` and `line == 0`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: Option<RingError>,
    pub operation: Option<Operation>,
    pub parameter: Option<Parameter>,
    pub line: u32,
}

impl ErrorInfo {
    pub const CLEAR: Self = Self {
        code: None,
        operation: None,
        parameter: None,
        line: 0,
    };

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.code.is_none()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(code) = self.code else {
            return f.write_str("Success");
        };
        if let Some(op) = self.operation {
            write!(f, "{op}: ")?;
        }
        write!(f, "{code}")?;
        if let Some(param) = self.parameter {
            write!(f, " (parameter `{param}`)")?;
        }
        write!(f, " at line {}", self.line)
    }
}

/// Lock-free holder for the last [`ErrorInfo`].
///
/// Code, operation and parameter share one packed word, the line lives in a
/// second one. Both sides of a split ring may record concurrently; the
/// snapshot is best effort and may pair one failure's code with another's line.
pub(crate) struct LastError {
    word: AtomicU32,
    line: AtomicU32,
}

impl LastError {
    pub(crate) fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
            line: AtomicU32::new(0),
        }
    }

    pub(crate) fn record(&self, operation: Operation, err: RingError, line: u32) {
        let param = match Parameter::implicated_by(err) {
            Some(p) => p as u32,
            None => 0,
        };
        let word = err.code() as u32 | (operation as u32) << 8 | param << 16;
        self.line.store(line, Ordering::Relaxed);
        self.word.store(word, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> ErrorInfo {
        let word = self.word.load(Ordering::Acquire);
        let line = self.line.load(Ordering::Relaxed);
        let code = RingError::from_code(word as u8);
        if code.is_none() {
            return ErrorInfo::CLEAR;
        }
        ErrorInfo {
            code,
            operation: Operation::from_u8((word >> 8) as u8),
            parameter: Parameter::from_u8((word >> 16) as u8),
            line,
        }
    }

    pub(crate) fn clear(&self) {
        self.word.store(0, Ordering::Relaxed);
        self.line.store(0, Ordering::Relaxed);
    }
}
