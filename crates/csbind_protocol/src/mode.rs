//! Mutation modes.

use std::fmt;

/// The kind of change a request describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Splice values before `index`.
    Insert,
    /// Replace `values.len()` records starting at `index`.
    Edit,
    /// Append values at the tail.
    Add,
    /// Delete one record at `index`.
    Remove,
    /// Compare a peer's snapshot against the held one.
    Check,
    /// Full resynchronisation push carrying the authoritative snapshot.
    ChangeAll,
}

/// Modes accepted by a local `set`.
pub const LOCAL_MODES: [Mode; 4] = [Mode::Insert, Mode::Edit, Mode::Add, Mode::Remove];

/// Modes accepted from the inbound channel.
pub const INBOUND_MODES: [Mode; 5] = [
    Mode::Insert,
    Mode::Edit,
    Mode::Add,
    Mode::Remove,
    Mode::Check,
];

impl Mode {
    /// Returns the wire string for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Insert => "insert",
            Mode::Edit => "edit",
            Mode::Add => "add",
            Mode::Remove => "remove",
            Mode::Check => "check",
            Mode::ChangeAll => "changeAll",
        }
    }

    /// Parses a wire string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "insert" => Some(Mode::Insert),
            "edit" => Some(Mode::Edit),
            "add" => Some(Mode::Add),
            "remove" => Some(Mode::Remove),
            "check" => Some(Mode::Check),
            "changeAll" => Some(Mode::ChangeAll),
            _ => None,
        }
    }

    /// Properties a request of this mode must carry.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Mode::Insert | Mode::Edit => &["index", "values", "mode"],
            Mode::Remove => &["index", "mode"],
            Mode::Add | Mode::Check | Mode::ChangeAll => &["values", "mode"],
        }
    }

    /// Whether `index` must lie within the held snapshot bounds.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Mode::Insert | Mode::Edit | Mode::Remove)
    }

    /// Whether `values` must be records carrying the required keys.
    pub fn carries_records(&self) -> bool {
        matches!(self, Mode::Insert | Mode::Edit | Mode::Add)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
