//! Source positions for tokens, parse-tree nodes and diagnostics.

/// A single position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    /// Byte offset from the start of the input (0-based).
    pub offset: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based, counted in characters).
    pub column: usize,
}

impl Pos {
    pub const fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    pub const fn origin() -> Self {
        Self::new(0, 1, 1)
    }
}

impl Default for Pos {
    fn default() -> Self {
        Self::origin()
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open region `[start, end)` of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn point(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Span { start, end }
    }
}

/// Diagnostics only ever point at the first character of a span.
impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.start.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_order_independent() {
        let a = Span::new(Pos::new(0, 1, 1), Pos::new(3, 1, 4));
        let b = Span::new(Pos::new(5, 1, 6), Pos::new(9, 2, 2));
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).start, a.start);
        assert_eq!(a.merge(b).end, b.end);
    }

    #[test]
    fn display_is_line_and_column() {
        let span = Span::new(Pos::new(12, 3, 7), Pos::new(15, 3, 10));
        assert_eq!(span.to_string(), "3:7");
    }
}
