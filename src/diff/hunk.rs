use crate::line::Line;
use crate::parse::{self, ParseError};
use serde::Serialize;
use std::fmt;

/// A single hunk from a standard diff.
///
/// `lines` is the rendered hunk body: every line keeps its leading marker
/// (`' '`, `'-'`, `'+'`) and `\ No newline at end of file` markers stay where
/// they appeared. The header counts are transcribed as written and are not
/// checked against the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    pub old_start_line: u32,
    pub old_line_count: u32,
    pub new_start_line: u32,
    pub new_line_count: u32,
    /// Text after the closing `@@`, e.g. the enclosing function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

impl Hunk {
    /// Open an empty hunk from its `@@ ` header line.
    pub fn open(line: &Line) -> Result<Self, ParseError> {
        let header =
            parse::hunk_header(line.text).map_err(|tail| ParseError::MalformedHunkHeader {
                line: line.number,
                column: line.text.len() - tail + 1,
                text: line.text.to_string(),
            })?;

        Ok(Hunk {
            old_start_line: header.old.start,
            old_line_count: header.old.count,
            new_start_line: header.new.start,
            new_line_count: header.new.count,
            heading: header.heading.map(str::to_string),
            lines: Vec::new(),
        })
    }

    /// Append a body line verbatim.
    pub fn push(&mut self, line: &Line) {
        self.lines.push(line.text.to_string());
    }

    /// Number of `+` lines in the body
    pub fn added(&self) -> usize {
        self.lines.iter().filter(|l| l.starts_with('+')).count()
    }

    /// Number of `-` lines in the body
    pub fn removed(&self) -> usize {
        self.lines.iter().filter(|l| l.starts_with('-')).count()
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{} +{} @@",
            render_span(self.old_start_line, self.old_line_count),
            render_span(self.new_start_line, self.new_line_count)
        )?;
        if let Some(heading) = &self.heading {
            write!(f, " {}", heading)?;
        }
        writeln!(f)?;

        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}

/// A hunk from a combined (merge conflict) diff.
///
/// Body lines carry one marker column per parent, e.g. `++<<<<<<< HEAD` or
/// ` +master modification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictHunk {
    pub our_start_line: u32,
    pub our_line_count: u32,
    pub base_start_line: u32,
    pub base_line_count: u32,
    pub their_start_line: u32,
    pub their_line_count: u32,
    pub lines: Vec<String>,
}

impl ConflictHunk {
    /// Open an empty hunk from its `@@@ ` header line.
    ///
    /// The first minus-span is ours, the second the base, the plus-span theirs.
    pub fn open(line: &Line) -> Result<Self, ParseError> {
        let header = parse::combined_hunk_header(line.text).map_err(|tail| {
            ParseError::MalformedCombinedHunkHeader {
                line: line.number,
                column: line.text.len() - tail + 1,
                text: line.text.to_string(),
            }
        })?;

        Ok(ConflictHunk {
            our_start_line: header.ours.start,
            our_line_count: header.ours.count,
            base_start_line: header.base.start,
            base_line_count: header.base.count,
            their_start_line: header.theirs.start,
            their_line_count: header.theirs.count,
            lines: Vec::new(),
        })
    }

    /// Append a body line verbatim.
    pub fn push(&mut self, line: &Line) {
        self.lines.push(line.text.to_string());
    }
}

impl fmt::Display for ConflictHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@@ -{} -{} +{} @@@",
            render_span(self.our_start_line, self.our_line_count),
            render_span(self.base_start_line, self.base_line_count),
            render_span(self.their_start_line, self.their_line_count)
        )?;

        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}

/// `start,count`, with the count omitted when it is one
fn render_span(start: u32, count: u32) -> String {
    match count {
        1 => format!("{}", start),
        n => format!("{},{}", start, n),
    }
}
