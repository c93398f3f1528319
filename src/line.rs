//! Line classification for diff text.
//!
//! Every input line is matched against an ordered table of literal prefixes.
//! The first matching rule wins, so longer prefixes that overlap shorter ones
//! (`@@@ ` and `@@ `) are listed first.
//!
//! Rules come in two scopes. Header rules open sections or hunks and are
//! recognized everywhere. Metadata rules describe the file section itself
//! and are only recognized before the first hunk of a section: inside a hunk
//! body a line such as `--- foo` is a removed line `-- foo`, not a path marker.

/// The kinds of line the grammar distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `diff --git <a> <b>`
    GitHeader,
    /// `diff --cc <path>` or `diff --combined <path>`
    CombinedHeader,
    /// `* Unmerged path <path>`
    UnmergedPath,
    /// `@@@ -a,b -c,d +e,f @@@`
    CombinedHunkHeader,
    /// `@@ -a,b +c,d @@`
    HunkHeader,
    NewFileMode,
    DeletedFileMode,
    OldMode,
    NewMode,
    Index,
    /// `similarity index` / `dissimilarity index`
    Similarity,
    /// `rename from` / `copy from`
    CopySource,
    /// `rename to` / `copy to`
    CopyTarget,
    /// `--- <path>`
    OldPath,
    /// `+++ <path>`
    NewPath,
    /// `Binary files <a> and <b> differ`
    Binary,
    /// Anything else: hunk body content
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Always,
    Metadata,
}

/// Prefix rules, evaluated top to bottom.
const RULES: &[(&str, LineKind, Scope)] = &[
    ("diff --git ", LineKind::GitHeader, Scope::Always),
    ("diff --cc ", LineKind::CombinedHeader, Scope::Always),
    ("diff --combined ", LineKind::CombinedHeader, Scope::Always),
    ("* Unmerged path ", LineKind::UnmergedPath, Scope::Always),
    ("@@@ ", LineKind::CombinedHunkHeader, Scope::Always),
    ("@@ ", LineKind::HunkHeader, Scope::Always),
    ("new file mode ", LineKind::NewFileMode, Scope::Metadata),
    ("deleted file mode ", LineKind::DeletedFileMode, Scope::Metadata),
    ("old mode ", LineKind::OldMode, Scope::Metadata),
    ("new mode ", LineKind::NewMode, Scope::Metadata),
    ("index ", LineKind::Index, Scope::Metadata),
    ("similarity index ", LineKind::Similarity, Scope::Metadata),
    ("dissimilarity index ", LineKind::Similarity, Scope::Metadata),
    ("rename from ", LineKind::CopySource, Scope::Metadata),
    ("copy from ", LineKind::CopySource, Scope::Metadata),
    ("rename to ", LineKind::CopyTarget, Scope::Metadata),
    ("copy to ", LineKind::CopyTarget, Scope::Metadata),
    ("--- ", LineKind::OldPath, Scope::Metadata),
    ("+++ ", LineKind::NewPath, Scope::Metadata),
    ("Binary files ", LineKind::Binary, Scope::Metadata),
];

/// A classified line of diff text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number in the input
    pub number: usize,
    pub kind: LineKind,
    /// The full line, without its terminator
    pub text: &'a str,
    /// The text after the matched prefix (the whole line for body lines)
    pub rest: &'a str,
}

impl<'a> Line<'a> {
    /// Classify `text`. Metadata rules only apply when `in_body` is false.
    ///
    /// A trailing `\r` is dropped from header and metadata lines so CRLF
    /// separated diffs parse, but body lines keep it: it is file content.
    pub fn classify(number: usize, text: &'a str, in_body: bool) -> Self {
        let bare = text.strip_suffix('\r').unwrap_or(text);

        RULES
            .iter()
            .filter(|(_, _, scope)| *scope == Scope::Always || !in_body)
            .find_map(|(prefix, kind, _)| {
                bare.strip_prefix(prefix).map(|rest| Line {
                    number,
                    kind: *kind,
                    text: bare,
                    rest,
                })
            })
            .unwrap_or(Line {
                number,
                kind: LineKind::Body,
                text,
                rest: text,
            })
    }

    /// 1-based column of `tail` within this line, where `tail` is a suffix of
    /// the line text.
    pub fn column_of(&self, tail: &str) -> usize {
        self.text.len().saturating_sub(tail.len()) + 1
    }
}
