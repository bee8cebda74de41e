use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of Quill source text, carried by every token, AST node,
/// and syntax error.
///
/// Lines and columns are 1-based, matching how editors number them.
/// Spans are plain data: copying one is free and nothing ties it back
/// to the source buffer it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A zero-width span, for positions without an extent (end of
    /// input, synthesized tokens).
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// The smallest span covering both `self` and `other`. Declaration
    /// and statement spans are built by merging the spans of their
    /// first and last tokens.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_col) = std::cmp::min(
            (self.start_line, self.start_col),
            (other.start_line, other.start_col),
        );
        let (end_line, end_col) = std::cmp::max(
            (self.end_line, self.end_col),
            (other.end_line, other.end_col),
        );
        Span::new(start_line, start_col, end_line, end_col)
    }
}

impl fmt::Display for Span {
    /// Renders the starting position only, `line:col`, which is what
    /// error messages want.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_point() {
        let s = Span::point(4, 9);
        assert_eq!(s.start_line, 4);
        assert_eq!(s.start_col, 9);
        assert_eq!(s.end_line, 4);
        assert_eq!(s.end_col, 9);
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(1, 5, 1, 10);
        let b = Span::new(2, 3, 2, 8);
        let merged = a.merge(b);
        assert_eq!(merged.start_line, 1);
        assert_eq!(merged.start_col, 5);
        assert_eq!(merged.end_line, 2);
        assert_eq!(merged.end_col, 8);
    }

    #[test]
    fn test_span_merge_same_line() {
        let a = Span::new(1, 5, 1, 10);
        let b = Span::new(1, 3, 1, 8);
        let merged = a.merge(b);
        assert_eq!(merged.start_col, 3);
        assert_eq!(merged.end_col, 10);
    }

    #[test]
    fn test_span_merge_is_order_independent() {
        let a = Span::new(2, 1, 2, 6);
        let b = Span::new(1, 4, 3, 2);
        assert_eq!(a.merge(b), b.merge(a));
    }

    #[test]
    fn test_span_display() {
        let s = Span::new(3, 7, 3, 15);
        assert_eq!(format!("{s}"), "3:7");
    }
}
