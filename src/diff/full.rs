use super::conflict::{ConflictBuilder, ConflictEntry};
use super::file::PatchBuilder;
use super::{Boundary, DiffEntry, Step, unexpected};
use crate::line::{Line, LineKind};
use crate::parse::ParseError;

/// A complete diff: one entry per file section, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub entries: Vec<DiffEntry>,
}

/// The file section currently being read.
#[derive(Debug)]
enum Section {
    Idle,
    Standard(PatchBuilder),
    Combined(ConflictBuilder),
}

impl Section {
    fn in_body(&self) -> bool {
        match self {
            Section::Idle => false,
            Section::Standard(builder) => builder.in_body(),
            Section::Combined(builder) => builder.in_body(),
        }
    }

    /// Finish the open section, if any, at `boundary`.
    fn close(self, boundary: Boundary) -> Result<Option<DiffEntry>, ParseError> {
        let entry = match self {
            Section::Idle => return Ok(None),
            Section::Standard(builder) => DiffEntry::Patch(builder.finish(boundary)?),
            Section::Combined(builder) => DiffEntry::Conflict(builder.finish(boundary)?),
        };
        log::debug!("closed {} section for {}", entry.status(), entry.path());
        Ok(Some(entry))
    }
}

impl Diff {
    /// Parse complete diff text.
    ///
    /// Fails on the first line that does not fit the grammar; no partial
    /// result is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use git_diff_parse::{Diff, DiffEntry, Status};
    ///
    /// let diff = Diff::parse("diff --git a.txt a.txt\nold mode 100644\nnew mode 100755").unwrap();
    /// let DiffEntry::Patch(patch) = &diff.entries[0] else { panic!() };
    /// assert_eq!(patch.status, Status::Modified);
    /// assert_eq!(patch.new_mode.as_deref(), Some("100755"));
    /// ```
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut entries = Vec::new();
        let mut section = Section::Idle;
        let mut last_line = 0;

        // only LF separates lines; a '\r' before it may belong to the content
        for (index, raw) in text.split_terminator('\n').enumerate() {
            let line = Line::classify(index + 1, raw, section.in_body());
            log::trace!("line {} {:?}: {}", line.number, line.kind, line.text);
            last_line = line.number;

            section = match line.kind {
                LineKind::GitHeader => {
                    entries.extend(section.close(Boundary::Header(&line))?);
                    log::debug!("standard section at line {}: {}", line.number, line.rest);
                    Section::Standard(PatchBuilder::open(&line)?)
                }
                LineKind::CombinedHeader => {
                    entries.extend(section.close(Boundary::Header(&line))?);
                    log::debug!("combined section at line {}: {}", line.number, line.rest);
                    Section::Combined(ConflictBuilder::open(&line)?)
                }
                LineKind::UnmergedPath => {
                    entries.extend(section.close(Boundary::Header(&line))?);
                    log::debug!("unmerged path at line {}: {}", line.number, line.rest);
                    entries.push(DiffEntry::Conflict(ConflictEntry::unmerged(&line)?));
                    Section::Idle
                }
                _ => match section {
                    // blank lines between sections carry nothing
                    Section::Idle if line.text.trim_end_matches('\r').is_empty() => Section::Idle,
                    Section::Idle => return Err(unexpected(&line, "diff header")),
                    Section::Standard(mut builder) => match builder.feed(&line)? {
                        Step::Continue => Section::Standard(builder),
                        Step::Close => {
                            entries.push(DiffEntry::Patch(
                                builder.finish(Boundary::Header(&line))?,
                            ));
                            Section::Idle
                        }
                    },
                    Section::Combined(mut builder) => match builder.feed(&line)? {
                        Step::Continue => Section::Combined(builder),
                        Step::Close => {
                            entries.push(DiffEntry::Conflict(
                                builder.finish(Boundary::Header(&line))?,
                            ));
                            Section::Idle
                        }
                    },
                },
            };
        }

        entries.extend(section.close(Boundary::End {
            line: last_line + 1,
        })?);
        log::debug!("parsed {} diff entries", entries.len());

        Ok(Diff { entries })
    }
}

impl std::fmt::Display for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
