use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// A highlighted byte range inside the target file.
///
/// This is the CLI stand-in for an editor selection: `start == end` is a
/// cursor, not a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the selected text out of the buffer.
    ///
    /// Rejects ranges past the end of the buffer and ranges that split a
    /// UTF-8 character.
    pub fn slice<'a>(&self, text: &'a str) -> Result<&'a str> {
        if self.end > text.len() {
            bail!(
                "selection {} is out of bounds (file is {} bytes)",
                self,
                text.len()
            );
        }
        if !text.is_char_boundary(self.start) || !text.is_char_boundary(self.end) {
            bail!("selection {} does not fall on character boundaries", self);
        }
        Ok(&text[self.start..self.end])
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| format!("expected START..END, got '{}'", s))?;
        let start: usize = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid start offset '{}'", start))?;
        let end: usize = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid end offset '{}'", end))?;
        if end < start {
            return Err(format!("selection end {} is before start {}", end, start));
        }
        Ok(Selection { start, end })
    }
}

/// Splice replacement strings into the buffer in one pass.
///
/// Replacements are applied back-to-front so earlier edits never shift the
/// byte offsets of later ones; overlapping selections are rejected.
pub fn apply_replacements(text: &str, replacements: &[(Selection, String)]) -> Result<String> {
    let mut ordered: Vec<&(Selection, String)> = replacements.iter().collect();
    ordered.sort_by_key(|(sel, _)| sel.start);

    for pair in ordered.windows(2) {
        let (a, _) = pair[0];
        let (b, _) = pair[1];
        if a.end > b.start {
            bail!("selections {} and {} overlap", a, b);
        }
    }

    let mut result = text.to_string();
    for (selection, replacement) in ordered.into_iter().rev() {
        // Bounds were validated when the selection was sliced.
        result.replace_range(selection.start..selection.end, replacement);
    }
    Ok(result)
}
