// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location handles. Only used when reporting diagnostics.

/// A byte range in the source a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Placeholder for compiler-synthesized nodes.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_dummy(&self) -> bool {
        *self == Span::DUMMY
    }
}

/// Line-start table for turning byte offsets into `line:col` pairs.
#[derive(Debug, Clone)]
pub struct LineMap {
    starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        LineMap { starts }
    }

    /// 1-based `(line, col)` of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (idx + 1, offset - self.starts[idx] + 1)
    }

    /// Text of a 1-based line, without its newline.
    pub fn line<'a>(&self, source: &'a str, line: usize) -> Option<&'a str> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next.saturating_sub(1))
            .unwrap_or(source.len());
        source.get(start..end)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_lookup() {
        let map = LineMap::new("let x\nlet yy\n\nz");
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(4), (1, 5));
        assert_eq!(map.line_col(6), (2, 1));
        assert_eq!(map.line_col(13), (3, 1));
        assert_eq!(map.line_col(14), (4, 1));
        assert_eq!(map.line_count(), 4);
    }

    #[test]
    fn line_text() {
        let src = "first\nsecond\n";
        let map = LineMap::new(src);
        assert_eq!(map.line(src, 1), Some("first"));
        assert_eq!(map.line(src, 2), Some("second"));
        assert_eq!(map.line(src, 3), Some(""));
        assert_eq!(map.line(src, 0), None);
    }

    #[test]
    fn span_cover() {
        let a = Span::new(4, 9);
        let b = Span::new(1, 6);
        assert_eq!(a.to(b), Span::new(1, 9));
        assert!(Span::DUMMY.is_dummy());
    }
}
