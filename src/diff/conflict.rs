use super::hunk::ConflictHunk;
use super::{Boundary, Status, Step, unexpected};
use crate::line::{Line, LineKind};
use crate::parse::{self, ParseError};
use serde::Serialize;
use std::fmt;

/// A path left in conflict by a merge.
///
/// Entries from a combined diff (`diff --cc`) carry `binary` and `hunks`;
/// entries from a bare `* Unmerged path` notice carry neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub file_path: String,
    pub status: Status,
    #[serde(skip_serializing_if = "is_not_binary")]
    pub binary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunks: Option<Vec<ConflictHunk>>,
}

fn is_not_binary(binary: &Option<bool>) -> bool {
    *binary != Some(true)
}

impl ConflictEntry {
    /// Entry for an `* Unmerged path <path>` line.
    pub fn unmerged(line: &Line) -> Result<Self, ParseError> {
        if line.rest.is_empty() {
            return Err(ParseError::MissingPath {
                line: line.number,
                column: line.column_of(line.rest),
                text: line.text.to_string(),
            });
        }

        Ok(ConflictEntry {
            file_path: parse::unquote(line.rest).into_owned(),
            status: Status::Unmerged,
            binary: None,
            hunks: None,
        })
    }
}

impl fmt::Display for ConflictEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(hunks) = &self.hunks else {
            return writeln!(f, "* Unmerged path {}", self.file_path);
        };

        writeln!(f, "diff --cc {}", self.file_path)?;
        writeln!(f, "index 0000000,0000000..0000000")?;

        if self.binary == Some(true) {
            writeln!(
                f,
                "Binary files a/{} and b/{} differ",
                self.file_path, self.file_path
            )?;
        } else if !hunks.is_empty() {
            writeln!(f, "--- a/{}", self.file_path)?;
            writeln!(f, "+++ b/{}", self.file_path)?;
            for hunk in hunks {
                write!(f, "{}", hunk)?;
            }
        }

        Ok(())
    }
}

/// Accumulates one `diff --cc` section line by line.
#[derive(Debug)]
pub struct ConflictBuilder {
    file_path: String,
    seen_index: bool,
    /// Set after a `---` line until its `+++` arrives
    pending_new_marker: bool,
    binary: bool,
    hunks: Vec<ConflictHunk>,
}

impl ConflictBuilder {
    /// Start a section from its `diff --cc <path>` line.
    pub fn open(line: &Line) -> Result<Self, ParseError> {
        if line.rest.is_empty() {
            return Err(ParseError::MissingPath {
                line: line.number,
                column: line.column_of(line.rest),
                text: line.text.to_string(),
            });
        }

        Ok(ConflictBuilder {
            file_path: parse::unquote(line.rest).into_owned(),
            seen_index: false,
            pending_new_marker: false,
            binary: false,
            hunks: Vec::new(),
        })
    }

    /// Whether a hunk is open, so further lines are hunk body.
    pub fn in_body(&self) -> bool {
        !self.hunks.is_empty()
    }

    /// Consume the next non-section-header line.
    pub fn feed(&mut self, line: &Line) -> Result<Step, ParseError> {
        if self.pending_new_marker {
            if line.kind != LineKind::NewPath {
                return Err(unexpected(line, "'+++' line"));
            }
            self.pending_new_marker = false;
            return Ok(Step::Continue);
        }

        match line.kind {
            LineKind::Index => self.seen_index = true,
            LineKind::Body => match self.hunks.last_mut() {
                Some(hunk) => hunk.push(line),
                None => return Err(unexpected(line, "combined diff metadata or hunk header")),
            },
            _ if !self.seen_index => return Err(unexpected(line, "index line")),
            LineKind::CombinedHunkHeader => self.hunks.push(ConflictHunk::open(line)?),
            LineKind::OldPath => self.pending_new_marker = true,
            LineKind::Binary => {
                parse::binary_notice(line.text).map_err(|tail| {
                    ParseError::MalformedBinaryNotice {
                        line: line.number,
                        column: line.text.len() - tail + 1,
                        text: line.text.to_string(),
                    }
                })?;
                self.binary = true;
                return Ok(Step::Close);
            }
            LineKind::HunkHeader => return Err(unexpected(line, "combined hunk header")),
            _ => return Err(unexpected(line, "combined diff metadata or hunk header")),
        }

        Ok(Step::Continue)
    }

    /// Finish the section into an unmerged entry.
    pub fn finish(self, boundary: Boundary) -> Result<ConflictEntry, ParseError> {
        if self.pending_new_marker {
            return Err(boundary.expected("'+++' line"));
        }
        if !self.seen_index {
            return Err(boundary.expected("index line"));
        }

        Ok(ConflictEntry {
            file_path: self.file_path,
            status: Status::Unmerged,
            binary: Some(self.binary),
            hunks: Some(self.hunks),
        })
    }
}
