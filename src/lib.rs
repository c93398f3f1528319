//! Parse unified, git extended and combined diff text into structured records.
//!
//! A diff is split into file sections. `diff --git` sections become a
//! [`Patch`], while `diff --cc` sections and `* Unmerged path` notices become a
//! [`ConflictEntry`].
//!
//! # Examples
//!
//! ```
//! use git_diff_parse::{DiffEntry, Status};
//!
//! let text = "diff --git file.txt file.txt\n\
//!             new file mode 100644\n\
//!             index 0000000..dab621c\n\
//!             --- /dev/null\n\
//!             +++ file.txt\n\
//!             @@ -0,0 +1 @@\n\
//!             +foo\n";
//!
//! let entries = git_diff_parse::parse(text).unwrap();
//! let DiffEntry::Patch(patch) = &entries[0] else { panic!() };
//! assert_eq!(patch.status, Status::Added);
//! assert_eq!(patch.old_path, None);
//! assert_eq!(patch.hunks[0].lines, vec!["+foo"]);
//! ```

use error_set::error_set;
use std::io::Read;

pub mod diff;
pub mod line;
pub mod parse;

pub use diff::{ConflictEntry, ConflictHunk, Diff, DiffEntry, Hunk, Patch, Status};
pub use parse::ParseError;

error_set! {
    /// Top-level error for reading and parsing a diff
    DiffError := {
        ParseError(ParseError),
    } || InputError

    /// Errors from obtaining the diff text
    InputError := {
        #[display("Failed to read diff input: {message}")]
        ReadFailed { message: String },
        #[display("Invalid UTF-8 in diff input: {message}")]
        InvalidUtf8 { message: String },
    }
}

/// Parse complete diff text into its entries, in input order.
pub fn parse(text: &str) -> Result<Vec<DiffEntry>, ParseError> {
    Ok(Diff::parse(text)?.entries)
}

/// Read `reader` to the end and parse the result.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Vec<DiffEntry>, DiffError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| InputError::ReadFailed {
            message: e.to_string(),
        })?;

    let text = String::from_utf8(bytes).map_err(|e| InputError::InvalidUtf8 {
        message: e.to_string(),
    })?;

    Ok(parse(&text)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn parse_reader_reads_everything() {
        let input: &[u8] = b"* Unmerged path a.txt\n* Unmerged path b.txt\n";
        let entries = parse_reader(input).unwrap();
        let paths: Vec<_> = entries.iter().map(DiffEntry::path).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn parse_reader_rejects_invalid_utf8() {
        let input: &[u8] = b"diff --git a b\n@@ -1 +1 @@\n-\xff\n";
        let err = parse_reader(input).unwrap_err();
        assert!(matches!(err, DiffError::InvalidUtf8 { .. }));
    }

    #[test]
    fn parse_reader_surfaces_parse_errors() {
        let input: &[u8] = b"garbage\n";
        let err = parse_reader(input).unwrap_err();
        let DiffError::ParseError(inner) = err else {
            panic!("expected a parse error");
        };
        assert_eq!(inner.line(), 1);
        insta::assert_snapshot!(inner.to_string(), @"line 1, column 1: expected diff header, found 'garbage'");
    }

    #[test]
    fn read_failure() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let err = parse_reader(Broken).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Failed to read diff input: disk on fire");
    }
}
