use super::hunk::Hunk;
use super::{Boundary, Status, Step, unexpected};
use crate::line::{Line, LineKind};
use crate::parse::{self, ParseError};
use serde::Serialize;
use std::fmt;

/// The diff for a single file of a standard (`diff --git`) diff.
///
/// Paths and modes are `None` on the side where the file does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub old_mode: Option<String>,
    pub new_mode: Option<String>,
    pub status: Status,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub binary: bool,
    /// Empty for binary, empty-content and mode-only changes
    pub hunks: Vec<Hunk>,
}

type Paths = (Option<String>, Option<String>);

/// Owned, decoded path tokens
fn owned_paths(old: Option<&str>, new: Option<&str>) -> Paths {
    let decode = |path: &str| parse::unquote(path).into_owned();
    (old.map(decode), new.map(decode))
}

/// Accumulates one `diff --git` section line by line.
#[derive(Debug)]
pub struct PatchBuilder {
    /// Tail of the `diff --git` line, for pairing rename names with prefixes
    header: String,
    header_paths: Paths,
    marker_paths: Option<Paths>,
    binary_paths: Option<Paths>,
    copy_source: Option<String>,
    copy_target: Option<String>,
    /// Set after a `---` line until its `+++` arrives
    pending_old_path: Option<Option<String>>,
    old_mode: Option<String>,
    new_mode: Option<String>,
    index_mode: Option<String>,
    status: Status,
    binary: bool,
    hunks: Vec<Hunk>,
}

impl PatchBuilder {
    /// Start a section from its `diff --git <a> <b>` line.
    pub fn open(line: &Line) -> Result<Self, ParseError> {
        let (old, new) = parse::header_paths(line.rest).ok_or_else(|| ParseError::MissingPath {
            line: line.number,
            column: line.column_of(line.rest),
            text: line.text.to_string(),
        })?;

        Ok(PatchBuilder {
            header: line.rest.to_string(),
            header_paths: owned_paths(Some(old), Some(new)),
            marker_paths: None,
            binary_paths: None,
            copy_source: None,
            copy_target: None,
            pending_old_path: None,
            old_mode: None,
            new_mode: None,
            index_mode: None,
            status: Status::Modified,
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
        if let Some(old) = self.pending_old_path.take() {
            if line.kind != LineKind::NewPath {
                return Err(unexpected(line, "'+++' line"));
            }
            let (_, new) = owned_paths(None, parse::marker_path(line.rest));
            self.marker_paths = Some((old, new));
            return Ok(Step::Continue);
        }

        match line.kind {
            LineKind::HunkHeader => self.hunks.push(Hunk::open(line)?),
            LineKind::Body => match self.hunks.last_mut() {
                Some(hunk) => hunk.push(line),
                None => return Err(unexpected(line, "file metadata or hunk header")),
            },
            LineKind::NewFileMode => {
                self.status = Status::Added;
                self.new_mode = Some(line.rest.to_string());
            }
            LineKind::DeletedFileMode => {
                self.status = Status::Deleted;
                self.old_mode = Some(line.rest.to_string());
            }
            LineKind::OldMode => self.old_mode = Some(line.rest.to_string()),
            LineKind::NewMode => self.new_mode = Some(line.rest.to_string()),
            LineKind::Index => {
                self.index_mode = line
                    .rest
                    .split_once(' ')
                    .map(|(_, mode)| mode.trim().to_string())
                    .filter(|mode| !mode.is_empty());
            }
            LineKind::Similarity => {}
            LineKind::CopySource => self.copy_source = Some(parse::unquote(line.rest).into_owned()),
            LineKind::CopyTarget => self.copy_target = Some(parse::unquote(line.rest).into_owned()),
            LineKind::OldPath => {
                let (old, _) = owned_paths(parse::marker_path(line.rest), None);
                self.pending_old_path = Some(old);
            }
            LineKind::NewPath => return Err(unexpected(line, "'---' line before '+++'")),
            LineKind::Binary => {
                let (old, new) =
                    parse::binary_notice(line.text).map_err(|tail| {
                        ParseError::MalformedBinaryNotice {
                            line: line.number,
                            column: line.text.len() - tail + 1,
                            text: line.text.to_string(),
                        }
                    })?;
                self.binary_paths = Some(owned_paths(
                    parse::marker_path(old),
                    parse::marker_path(new),
                ));
                self.binary = true;
                return Ok(Step::Close);
            }
            LineKind::CombinedHunkHeader => return Err(unexpected(line, "standard hunk header")),
            LineKind::GitHeader | LineKind::CombinedHeader | LineKind::UnmergedPath => {
                return Err(unexpected(line, "file metadata or hunk header"));
            }
        }

        Ok(Step::Continue)
    }

    /// Finish the section, deriving paths, modes and status.
    pub fn finish(self, boundary: Boundary) -> Result<Patch, ParseError> {
        if self.pending_old_path.is_some() {
            return Err(boundary.expected("'+++' line"));
        }

        let copy_paths = match (self.copy_source, self.copy_target) {
            (Some(source), Some(target)) => {
                let (old, new) = parse::rename_paths(&self.header, &source, &target);
                Some((Some(old), Some(new)))
            }
            _ => None,
        };
        let (mut old_path, mut new_path) = self
            .marker_paths
            .or(self.binary_paths)
            .or(copy_paths)
            .unwrap_or(self.header_paths);

        let (mut old_mode, mut new_mode) = (self.old_mode, self.new_mode);
        if old_mode.is_none() {
            old_mode = self.index_mode.clone();
        }
        if new_mode.is_none() {
            new_mode = self.index_mode;
        }

        match self.status {
            Status::Added => {
                old_path = None;
                old_mode = None;
            }
            Status::Deleted => {
                new_path = None;
                new_mode = None;
            }
            Status::Modified | Status::Unmerged => {}
        }

        Ok(Patch {
            old_path,
            new_path,
            old_mode,
            new_mode,
            status: self.status,
            binary: self.binary,
            hunks: self.hunks,
        })
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DEV_NULL: &str = "/dev/null";
        let old = self.old_path.as_deref();
        let new = self.new_path.as_deref();

        writeln!(
            f,
            "diff --git {} {}",
            old.or(new).unwrap_or(DEV_NULL),
            new.or(old).unwrap_or(DEV_NULL)
        )?;

        match self.status {
            Status::Added => {
                if let Some(mode) = &self.new_mode {
                    writeln!(f, "new file mode {}", mode)?;
                }
            }
            Status::Deleted => {
                if let Some(mode) = &self.old_mode {
                    writeln!(f, "deleted file mode {}", mode)?;
                }
            }
            Status::Modified | Status::Unmerged => {
                if self.old_mode == self.new_mode {
                    if let Some(mode) = &self.old_mode {
                        writeln!(f, "index 0000000..0000000 {}", mode)?;
                    }
                } else {
                    if let Some(mode) = &self.old_mode {
                        writeln!(f, "old mode {}", mode)?;
                    }
                    if let Some(mode) = &self.new_mode {
                        writeln!(f, "new mode {}", mode)?;
                    }
                }
            }
        }

        if self.binary {
            writeln!(
                f,
                "Binary files {} and {} differ",
                old.unwrap_or(DEV_NULL),
                new.unwrap_or(DEV_NULL)
            )?;
        } else if !self.hunks.is_empty() {
            writeln!(f, "--- {}", old.unwrap_or(DEV_NULL))?;
            writeln!(f, "+++ {}", new.unwrap_or(DEV_NULL))?;
            for hunk in &self.hunks {
                write!(f, "{}", hunk)?;
            }
        }

        Ok(())
    }
}
