//! Comment handling for the manifest syntax tree
//!
//! Comments are attached to statements so that edits never disturb them.

use crate::lexer::Span;

/// A comment in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// The comment text (including // or /* */)
    pub text: String,
    pub span: Span,
    pub kind: CommentKind,
}

impl Comment {
    #[must_use]
    pub fn line(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            kind: CommentKind::Line,
        }
    }

    #[must_use]
    pub fn block(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            kind: CommentKind::Block,
        }
    }

    /// Build a synthesized line comment, adding the `//` marker if needed
    #[must_use]
    pub fn synthesized(text: &str) -> Self {
        if text.starts_with("/*") && text.ends_with("*/") {
            Self::block(text, Span::dummy())
        } else if text.starts_with("//") {
            Self::line(text, Span::dummy())
        } else {
            Self::line(format!("// {text}"), Span::dummy())
        }
    }

    /// Get the comment content without the delimiters
    #[must_use]
    pub fn content(&self) -> &str {
        match self.kind {
            CommentKind::Line => self
                .text
                .strip_prefix("//")
                .unwrap_or(&self.text)
                .trim_start(),
            CommentKind::Block => {
                let s = self.text.strip_prefix("/*").unwrap_or(&self.text);
                s.strip_suffix("*/").unwrap_or(s).trim()
            }
        }
    }
}

/// The kind of comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// Line comment: // ...
    Line,
    /// Block comment: /* ... */
    Block,
}

/// Comments and spacing attached to a tree node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trivia {
    /// Comments on the lines directly above the node
    pub leading: Vec<Comment>,
    /// Comments after the node on the same line
    pub trailing: Vec<Comment>,
    /// A blank line separates this node from whatever precedes it
    pub blank_before: bool,
}

impl Trivia {
    #[must_use]
    pub fn with_leading(leading: Vec<Comment>) -> Self {
        Self {
            leading,
            ..Self::default()
        }
    }

    /// Absorb the comments of a node that is being folded into this one.
    ///
    /// `outer` comments come first in the leading list and last in the
    /// trailing list, so the merged node reads the same as before.
    pub fn merge_outer(&mut self, outer: Trivia) {
        let mut leading = outer.leading;
        leading.append(&mut self.leading);
        self.leading = leading;
        self.trailing.extend(outer.trailing);
        self.blank_before |= outer.blank_before;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_content_strips_markers() {
        assert_eq!(Comment::line("// indirect", Span::dummy()).content(), "indirect");
        assert_eq!(Comment::block("/* pinned */", Span::dummy()).content(), "pinned");
    }

    #[test]
    fn synthesized_comment_gets_marker() {
        assert_eq!(Comment::synthesized("hello").text, "// hello");
        assert_eq!(Comment::synthesized("// kept").text, "// kept");
        let block = Comment::synthesized("/* b */");
        assert_eq!(block.kind, CommentKind::Block);
    }

    #[test]
    fn merge_outer_orders_comments() {
        let mut inner = Trivia {
            leading: vec![Comment::synthesized("inner")],
            trailing: vec![Comment::synthesized("inner tail")],
            blank_before: false,
        };
        let outer = Trivia {
            leading: vec![Comment::synthesized("outer")],
            trailing: vec![Comment::synthesized("outer tail")],
            blank_before: true,
        };
        inner.merge_outer(outer);
        let leading: Vec<_> = inner.leading.iter().map(Comment::content).collect();
        let trailing: Vec<_> = inner.trailing.iter().map(Comment::content).collect();
        assert_eq!(leading, vec!["outer", "inner"]);
        assert_eq!(trailing, vec!["inner tail", "outer tail"]);
        assert!(inner.blank_before);
    }
}
