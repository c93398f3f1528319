//! Header-line grammar and structural parse errors.
//!
//! The line classifier decides *what* a line is from its prefix; this module
//! parses the inside of the lines that carry structure:
//!
//! - `@@ -a[,b] +c[,d] @@[ heading]`
//! - `@@@ -a[,b] -c[,d] +e[,f] @@@[ heading]`
//! - `Binary files <old> and <new> differ`
//! - the two path tokens of `diff --git <old> <new>`
//!
//! A missing `,count` means a count of one. Paths git had to C-quote
//! (`"a/caf\303\251.txt"`) are split as whole tokens and decoded by
//! [`unquote`].
//!
//! # Examples
//!
//! ```
//! use git_diff_parse::parse::{hunk_header, Span};
//!
//! let header = hunk_header("@@ -3 +3,2 @@ fn main() {").unwrap();
//! assert_eq!(header.old, Span { start: 3, count: 1 });
//! assert_eq!(header.new, Span { start: 3, count: 2 });
//! assert_eq!(header.heading, Some("fn main() {"));
//! ```

use error_set::error_set;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{escaped, tag, take_until},
    character::complete::{anychar, char, none_of, u32 as number},
    combinator::{eof, map, opt, recognize, rest},
    sequence::{delimited, preceded},
};
use std::borrow::Cow;

error_set! {
    /// Errors from parsing diff text.
    ///
    /// Every variant carries the 1-based line number of the offending line;
    /// all but [`ParseError::UnexpectedEnd`] also carry the 1-based column
    /// where the grammar stopped matching.
    ParseError := {
        /// `@@ ` line whose spans do not parse
        #[display("line {line}, column {column}: malformed hunk header '{text}'")]
        MalformedHunkHeader { line: usize, column: usize, text: String },
        /// `@@@ ` line whose spans do not parse
        #[display("line {line}, column {column}: malformed combined hunk header '{text}'")]
        MalformedCombinedHunkHeader { line: usize, column: usize, text: String },
        /// `Binary files ` line without ` and ` / ` differ`
        #[display("line {line}, column {column}: malformed binary notice '{text}'")]
        MalformedBinaryNotice { line: usize, column: usize, text: String },
        /// Header line without the path(s) it must name
        #[display("line {line}, column {column}: missing path in '{text}'")]
        MissingPath { line: usize, column: usize, text: String },
        /// A line of the wrong kind for its position
        #[display("line {line}, column {column}: expected {expected}, found '{text}'")]
        UnexpectedLine { line: usize, column: usize, expected: &'static str, text: String },
        /// Input ended while a line was still required
        #[display("line {line}: unexpected end of input, expected {expected}")]
        UnexpectedEnd { line: usize, expected: &'static str },
    }
}

impl ParseError {
    /// 1-based line number of the failure
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedHunkHeader { line, .. }
            | ParseError::MalformedCombinedHunkHeader { line, .. }
            | ParseError::MalformedBinaryNotice { line, .. }
            | ParseError::MissingPath { line, .. }
            | ParseError::UnexpectedLine { line, .. }
            | ParseError::UnexpectedEnd { line, .. } => *line,
        }
    }

    /// 1-based column of the failure
    pub fn column(&self) -> usize {
        match self {
            ParseError::MalformedHunkHeader { column, .. }
            | ParseError::MalformedCombinedHunkHeader { column, .. }
            | ParseError::MalformedBinaryNotice { column, .. }
            | ParseError::MissingPath { column, .. }
            | ParseError::UnexpectedLine { column, .. } => *column,
            ParseError::UnexpectedEnd { .. } => 1,
        }
    }
}

/// A line range claimed by one side of a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub count: u32,
}

/// Parsed `@@ -a,b +c,d @@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader<'a> {
    pub old: Span,
    pub new: Span,
    /// Text after the closing `@@`, usually the enclosing function
    pub heading: Option<&'a str>,
}

/// Parsed `@@@ -a,b -c,d +e,f @@@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinedHunkHeader<'a> {
    /// First minus-span
    pub ours: Span,
    /// Second minus-span
    pub base: Span,
    /// The plus-span
    pub theirs: Span,
    pub heading: Option<&'a str>,
}

/// `start[,count]`
fn span(input: &str) -> IResult<&str, Span> {
    map(
        (number, opt(preceded(char(','), number))),
        |(start, count): (u32, Option<u32>)| Span {
            start,
            count: count.unwrap_or(1),
        },
    )
    .parse(input)
}

/// End of line, or a space and free text
fn heading(input: &str) -> IResult<&str, Option<&str>> {
    alt((
        map(eof, |_: &str| None),
        map(preceded(char(' '), rest), |text: &str| {
            Some(text).filter(|t| !t.is_empty())
        }),
    ))
    .parse(input)
}

/// Length of the unconsumed tail where a failed parse stopped
fn stopped_at(input: &str, err: nom::Err<nom::error::Error<&str>>) -> usize {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input.len(),
        nom::Err::Incomplete(_) => 0,
    }
    .min(input.len())
}

/// Parse a standard hunk header.
///
/// On failure returns the length of the unparsed tail, from which the caller
/// derives the error column.
pub fn hunk_header(input: &str) -> Result<HunkHeader<'_>, usize> {
    let parsed: IResult<&str, _> = (
        tag("@@ "),
        char('-'),
        span,
        tag(" +"),
        span,
        tag(" @@"),
        heading,
    )
        .parse(input);

    match parsed {
        Ok((_, (_, _, old, _, new, _, heading))) => Ok(HunkHeader { old, new, heading }),
        Err(err) => Err(stopped_at(input, err)),
    }
}

/// Parse a combined (two parent) hunk header.
pub fn combined_hunk_header(input: &str) -> Result<CombinedHunkHeader<'_>, usize> {
    let parsed: IResult<&str, _> = (
        tag("@@@ "),
        char('-'),
        span,
        tag(" -"),
        span,
        tag(" +"),
        span,
        tag(" @@@"),
        heading,
    )
        .parse(input);

    match parsed {
        Ok((_, (_, _, ours, _, base, _, theirs, _, heading))) => Ok(CombinedHunkHeader {
            ours,
            base,
            theirs,
            heading,
        }),
        Err(err) => Err(stopped_at(input, err)),
    }
}

/// Parse `Binary files <old> and <new> differ` into its two paths.
pub fn binary_notice(input: &str) -> Result<(&str, &str), usize> {
    let parsed: IResult<&str, _> = (
        tag("Binary files "),
        take_until(" and "),
        tag(" and "),
        take_until(" differ"),
        tag(" differ"),
        eof,
    )
        .parse(input);

    match parsed {
        Ok((_, (_, old, _, new, _, _))) => Ok((old, new)),
        Err(err) => Err(stopped_at(input, err)),
    }
}

/// A C-quoted token, quotes included
fn quoted(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('"'),
        opt(escaped(none_of("\\\""), '\\', anychar)),
        char('"'),
    ))
    .parse(input)
}

/// Split the tail of a `diff --git` line into its two path tokens.
///
/// Quoted tokens are taken whole. Otherwise paths may contain spaces, so the
/// line is split in the middle when the two halves name the same file
/// (optionally behind `a/` and `b/` prefixes), and at the first space
/// otherwise. Tokens are returned still quoted.
pub fn header_paths(input: &str) -> Option<(&str, &str)> {
    if input.starts_with('"') {
        let parsed: IResult<&str, _> = (quoted, char(' '), rest).parse(input);
        return match parsed {
            Ok((_, (old, _, new))) if !new.is_empty() => Some((old, new)),
            _ => None,
        };
    }
    // a quote never appears unescaped inside a quoted token
    if input.ends_with('"') {
        if let Some(at) = input.rfind(" \"") {
            return Some((&input[..at], &input[at + 1..])).filter(|(old, _)| !old.is_empty());
        }
    }

    let mid = input.len() / 2;
    if input.len() % 2 == 1 && input.as_bytes().get(mid) == Some(&b' ') {
        let (old, new) = (&input[..mid], &input[mid + 1..]);
        let same = old == new
            || matches!(
                (old.strip_prefix("a/"), new.strip_prefix("b/")),
                (Some(o), Some(n)) if o == n
            );
        if same {
            return Some((old, new));
        }
    }

    input
        .split_once(' ')
        .filter(|(old, new)| !old.is_empty() && !new.is_empty())
}

/// Decode a C-quoted path; anything else is returned as is.
pub fn unquote(path: &str) -> Cow<'_, str> {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .and_then(|inner| smashquote::unescape_bytes(inner.as_bytes()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map_or(Cow::Borrowed(path), Cow::Owned)
}

/// Whether `token` is `name`, possibly behind a directory-style prefix
fn names(token: &str, name: &str) -> bool {
    token
        .strip_suffix(name)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('/'))
}

/// Pair the decoded `rename/copy from` and `to` names with whatever prefixes
/// (`a/`, `b/`, ...) the `diff --git` tokens carry.
///
/// The header is split at the space where its two halves end in the two
/// names, which also handles names containing spaces. Without such a split
/// the bare names are returned.
pub fn rename_paths(header: &str, from: &str, to: &str) -> (String, String) {
    header
        .match_indices(' ')
        .map(|(at, _)| (unquote(&header[..at]), unquote(&header[at + 1..])))
        .find(|(old, new)| names(old, from) && names(new, to))
        .map(|(old, new)| (old.into_owned(), new.into_owned()))
        .unwrap_or_else(|| (from.to_string(), to.to_string()))
}

/// The path named by a `---`/`+++` line, `None` for `/dev/null`.
///
/// git terminates names containing spaces with a tab, which is dropped.
pub fn marker_path(input: &str) -> Option<&str> {
    let path = input.strip_suffix('\t').unwrap_or(input);
    (path != "/dev/null").then_some(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn hunk_header_with_counts() {
        let header = hunk_header("@@ -1,5 +1,4 @@").unwrap();
        assert_eq!(header.old, Span { start: 1, count: 5 });
        assert_eq!(header.new, Span { start: 1, count: 4 });
        assert_eq!(header.heading, None);
    }

    #[test]
    fn hunk_header_counts_default_to_one() {
        let header = hunk_header("@@ -1 +1 @@").unwrap();
        assert_eq!(header.old, Span { start: 1, count: 1 });
        assert_eq!(header.new, Span { start: 1, count: 1 });

        let header = hunk_header("@@ -0,0 +1 @@").unwrap();
        assert_eq!(header.old, Span { start: 0, count: 0 });
        assert_eq!(header.new, Span { start: 1, count: 1 });
    }

    #[test]
    fn hunk_header_keeps_heading() {
        let header = hunk_header("@@ -2,0 +3 @@ line 2").unwrap();
        assert_eq!(header.heading, Some("line 2"));
    }

    #[test]
    fn hunk_header_missing_span() {
        // stops at the second '@' of the closing marker
        let tail = hunk_header("@@ @@").unwrap_err();
        assert_eq!(tail, 2);
    }

    #[test]
    fn hunk_header_bad_number() {
        let input = "@@ -x,1 +1 @@";
        let tail = hunk_header(input).unwrap_err();
        assert_eq!(&input[input.len() - tail..], "x,1 +1 @@");
    }

    #[test]
    fn hunk_header_unterminated() {
        let input = "@@ -1,3 +1,3";
        assert_eq!(hunk_header(input).unwrap_err(), 0);
    }

    #[test]
    fn hunk_header_rejects_extra_at_sign() {
        let input = "@@ -1 +1 @@@";
        assert_eq!(hunk_header(input).unwrap_err(), 1);
    }

    #[test]
    fn combined_header_maps_spans_positionally() {
        let header = combined_hunk_header("@@@ -1,2 -3,4 +5,6 @@@").unwrap();
        assert_eq!(header.ours, Span { start: 1, count: 2 });
        assert_eq!(header.base, Span { start: 3, count: 4 });
        assert_eq!(header.theirs, Span { start: 5, count: 6 });
    }

    #[test]
    fn combined_header_counts_default_to_one() {
        let header = combined_hunk_header("@@@ -4 -5 +6,2 @@@ impl Foo").unwrap();
        assert_eq!(header.ours, Span { start: 4, count: 1 });
        assert_eq!(header.base, Span { start: 5, count: 1 });
        assert_eq!(header.theirs, Span { start: 6, count: 2 });
        assert_eq!(header.heading, Some("impl Foo"));
    }

    #[test]
    fn combined_header_needs_two_minus_spans() {
        assert!(combined_hunk_header("@@@ -1,1 +1,7 @@@").is_err());
    }

    #[test]
    fn binary_notice_paths() {
        assert_eq!(
            binary_notice("Binary files a/img.png and b/img.png differ").unwrap(),
            ("a/img.png", "b/img.png")
        );
        assert_eq!(
            binary_notice("Binary files /dev/null and b/img.png differ").unwrap(),
            ("/dev/null", "b/img.png")
        );
    }

    #[test]
    fn binary_notice_requires_differ() {
        assert!(binary_notice("Binary files a and b").is_err());
        assert!(binary_notice("Binary files a and b differ!").is_err());
    }

    #[test]
    fn header_paths_identical() {
        assert_eq!(header_paths("file.txt file.txt"), Some(("file.txt", "file.txt")));
    }

    #[test]
    fn header_paths_with_spaces() {
        assert_eq!(
            header_paths("a/my file.txt b/my file.txt"),
            Some(("a/my file.txt", "b/my file.txt"))
        );
    }

    #[test]
    fn header_paths_differing() {
        assert_eq!(header_paths("a/old.txt b/new.txt"), Some(("a/old.txt", "b/new.txt")));
        assert_eq!(header_paths("lonely"), None);
    }

    #[test]
    fn header_paths_quoted() {
        assert_eq!(
            header_paths(r#""a/caf\303\251.txt" "b/caf\303\251.txt""#),
            Some((r#""a/caf\303\251.txt""#, r#""b/caf\303\251.txt""#))
        );
        assert_eq!(
            header_paths(r#""a/say \"hi\" now.txt" b/plain.txt"#),
            Some((r#""a/say \"hi\" now.txt""#, "b/plain.txt"))
        );
        assert_eq!(
            header_paths(r#"a/plain.txt "b/tab\there.txt""#),
            Some(("a/plain.txt", r#""b/tab\there.txt""#))
        );
        assert_eq!(header_paths(r#""a/unterminated.txt b/x"#), None);
    }

    #[test]
    fn unquote_decodes_octal_escapes() {
        assert_eq!(unquote(r#""a/caf\303\251.txt""#), "a/caf\u{e9}.txt");
        assert_eq!(unquote(r#""b/tab\there.txt""#), "b/tab\there.txt");
        assert_eq!(unquote("b/plain.txt"), "b/plain.txt");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn rename_paths_take_header_prefixes() {
        assert_eq!(
            rename_paths("a/old name.txt b/new name.txt", "old name.txt", "new name.txt"),
            ("a/old name.txt".to_string(), "b/new name.txt".to_string())
        );
        assert_eq!(
            rename_paths("dir/old.txt dir/new.txt", "dir/old.txt", "dir/new.txt"),
            ("dir/old.txt".to_string(), "dir/new.txt".to_string())
        );
        assert_eq!(
            rename_paths(
                r#""a/caf\303\251.txt" "b/th\303\251.txt""#,
                "caf\u{e9}.txt",
                "th\u{e9}.txt"
            ),
            ("a/caf\u{e9}.txt".to_string(), "b/th\u{e9}.txt".to_string())
        );
    }

    #[test]
    fn rename_paths_without_matching_header() {
        // "xold.txt" is not "old.txt" behind a prefix
        assert_eq!(
            rename_paths("a/xold.txt b/new.txt", "old.txt", "new.txt"),
            ("old.txt".to_string(), "new.txt".to_string())
        );
    }

    #[test]
    fn marker_path_dev_null() {
        assert_eq!(marker_path("/dev/null"), None);
        assert_eq!(marker_path("b/file.txt"), Some("b/file.txt"));
        assert_eq!(marker_path("b/with space.txt\t"), Some("b/with space.txt"));
    }

    #[test]
    fn error_accessors() {
        let err = ParseError::MalformedHunkHeader {
            line: 5,
            column: 4,
            text: "@@ @@".to_string(),
        };
        assert_eq!(err.line(), 5);
        assert_eq!(err.column(), 4);
        insta::assert_snapshot!(err.to_string(), @"line 5, column 4: malformed hunk header '@@ @@'");

        let err = ParseError::UnexpectedEnd {
            line: 9,
            expected: "'+++' line",
        };
        assert_eq!(err.column(), 1);
        insta::assert_snapshot!(err.to_string(), @"line 9: unexpected end of input, expected '+++' line");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn render_span(start: u32, count: Option<u32>) -> String {
        match count {
            Some(count) => format!("{start},{count}"),
            None => start.to_string(),
        }
    }

    proptest! {
        #[test]
        fn hunk_header_transcribes_spans(
            old_start in 0..100_000u32,
            old_count in proptest::option::of(0..1_000u32),
            new_start in 0..100_000u32,
            new_count in proptest::option::of(0..1_000u32),
        ) {
            let text = format!(
                "@@ -{} +{} @@",
                render_span(old_start, old_count),
                render_span(new_start, new_count)
            );
            let header = hunk_header(&text);
            prop_assert!(header.is_ok(), "failed to parse {}", text);
            let header = header.unwrap();
            prop_assert_eq!(header.old, Span { start: old_start, count: old_count.unwrap_or(1) });
            prop_assert_eq!(header.new, Span { start: new_start, count: new_count.unwrap_or(1) });
        }

        #[test]
        fn combined_header_transcribes_spans(
            spans in proptest::array::uniform3((0..10_000u32, proptest::option::of(0..500u32))),
        ) {
            let [ours, base, theirs] = spans;
            let text = format!(
                "@@@ -{} -{} +{} @@@",
                render_span(ours.0, ours.1),
                render_span(base.0, base.1),
                render_span(theirs.0, theirs.1)
            );
            let header = combined_hunk_header(&text);
            prop_assert!(header.is_ok(), "failed to parse {}", text);
            let header = header.unwrap();
            prop_assert_eq!(header.ours, Span { start: ours.0, count: ours.1.unwrap_or(1) });
            prop_assert_eq!(header.base, Span { start: base.0, count: base.1.unwrap_or(1) });
            prop_assert_eq!(header.theirs, Span { start: theirs.0, count: theirs.1.unwrap_or(1) });
        }
    }
}
