pub mod conflict;
pub mod file;
pub mod full;
pub mod hunk;

pub use conflict::ConflictEntry;
pub use file::Patch;
pub use full::Diff;
pub use hunk::{ConflictHunk, Hunk};

use crate::line::Line;
use crate::parse::ParseError;
use serde::Serialize;
use std::fmt;

/// How a file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Added,
    Deleted,
    Modified,
    /// Left in conflict by a merge
    Unmerged,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Added => "added",
            Status::Deleted => "deleted",
            Status::Modified => "modified",
            Status::Unmerged => "unmerged",
        })
    }
}

/// One file section of a diff.
///
/// Serialized untagged: a patch and a conflict are told apart by their
/// fields (`oldPath`/`newPath` versus `filePath`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DiffEntry {
    /// A `diff --git` section
    Patch(Patch),
    /// A `diff --cc` section or an `* Unmerged path` notice
    Conflict(ConflictEntry),
}

impl DiffEntry {
    /// The path this entry is about, preferring the new side of a patch.
    pub fn path(&self) -> &str {
        match self {
            DiffEntry::Patch(patch) => patch
                .new_path
                .as_deref()
                .or(patch.old_path.as_deref())
                .unwrap_or_default(),
            DiffEntry::Conflict(conflict) => &conflict.file_path,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            DiffEntry::Patch(patch) => patch.status,
            DiffEntry::Conflict(conflict) => conflict.status,
        }
    }

    pub fn is_binary(&self) -> bool {
        match self {
            DiffEntry::Patch(patch) => patch.binary,
            DiffEntry::Conflict(conflict) => conflict.binary == Some(true),
        }
    }

    /// One-line summary: `<status> <path> +<added> -<removed>`.
    ///
    /// Binary entries end in `binary`; conflicts carry no counts.
    pub fn summary(&self) -> String {
        match self {
            DiffEntry::Patch(patch) if patch.binary => {
                format!("{} {} binary", patch.status, self.path())
            }
            DiffEntry::Patch(patch) => {
                let added: usize = patch.hunks.iter().map(Hunk::added).sum();
                let removed: usize = patch.hunks.iter().map(Hunk::removed).sum();
                format!("{} {} +{} -{}", patch.status, self.path(), added, removed)
            }
            DiffEntry::Conflict(conflict) if self.is_binary() => {
                format!("{} {} binary", conflict.status, conflict.file_path)
            }
            DiffEntry::Conflict(conflict) => format!("{} {}", conflict.status, conflict.file_path),
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffEntry::Patch(patch) => write!(f, "{}", patch),
            DiffEntry::Conflict(conflict) => write!(f, "{}", conflict),
        }
    }
}

/// What a section builder should do after consuming a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep feeding lines
    Continue,
    /// The section is complete; only a new header may follow
    Close,
}

/// Where a section ended.
#[derive(Debug, Clone, Copy)]
pub enum Boundary<'a> {
    /// At the header line that opens the next section
    Header(&'a Line<'a>),
    /// At the end of input; `line` is one past the last line
    End { line: usize },
}

impl Boundary<'_> {
    /// Error for a section that needed `expected` before ending here.
    pub fn expected(&self, expected: &'static str) -> ParseError {
        match self {
            Boundary::Header(line) => unexpected(line, expected),
            Boundary::End { line } => ParseError::UnexpectedEnd {
                line: *line,
                expected,
            },
        }
    }
}

/// Error for `line` appearing where `expected` was required.
pub(crate) fn unexpected(line: &Line, expected: &'static str) -> ParseError {
    ParseError::UnexpectedLine {
        line: line.number,
        column: 1,
        expected,
        text: line.text.to_string(),
    }
}
