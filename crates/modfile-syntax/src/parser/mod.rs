//! Tree builder for manifest files
//!
//! Groups the token stream into statements: one line per newline-terminated
//! run of words, `verb (` ... `)` blocks, and standalone comment runs.
//! Comments directly above a statement become its leading trivia, comments
//! after it on the same line its trailing trivia. A comment run followed by
//! a blank line stays a statement of its own.

mod error;

pub use error::{SyntaxError, SyntaxErrorKind};

use crate::lexer::{LineIndex, Lexer, Location, Span, Token, TokenKind};
use crate::tree::{Comment, CommentBlock, FileSyntax, Line, LineBlock, Stmt, Trivia};

/// Parse manifest source text into a [`FileSyntax`].
///
/// # Errors
///
/// Returns every lexer and tree-builder error found, sorted by position.
pub fn parse(name: &str, source: &str) -> Result<FileSyntax, Vec<SyntaxError>> {
    let mut parser = Parser::new(name, source);
    parser.parse_file();
    parser.finish()
}

/// How a run of words on one line ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    Newline,
    Eof,
    /// `(` was consumed
    OpenBlock,
    /// `)` is next and was not consumed
    CloseBlock,
}

/// Comments waiting to be attached to the next node
#[derive(Debug, Default)]
struct Pending {
    comments: Vec<Comment>,
    /// blank line seen before the first pending comment
    group_blank: bool,
    /// blank line seen since the last node or comment
    blank: bool,
}

impl Pending {
    fn push(&mut self, comment: Comment) {
        if self.comments.is_empty() {
            self.group_blank = std::mem::take(&mut self.blank);
        }
        self.comments.push(comment);
    }

    /// Record a blank line. At top level a comment run followed by a blank
    /// line is detached into its own statement, which is returned.
    fn blank_line(&mut self, detach: bool) -> Option<CommentBlock> {
        if self.comments.is_empty() {
            self.blank = true;
            return None;
        }
        if !detach {
            return None;
        }
        let detached = self.take_trivia();
        self.blank = true;
        Some(CommentBlock { trivia: detached })
    }

    fn take_trivia(&mut self) -> Trivia {
        if self.comments.is_empty() {
            Trivia {
                blank_before: std::mem::take(&mut self.blank),
                ..Trivia::default()
            }
        } else {
            self.blank = false;
            Trivia {
                leading: std::mem::take(&mut self.comments),
                trailing: Vec::new(),
                blank_before: std::mem::take(&mut self.group_blank),
            }
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    index: LineIndex,
    file: FileSyntax,
    errors: Vec<SyntaxError>,
}

impl Parser {
    fn new(name: &str, source: &str) -> Self {
        let (tokens, lex_errors) = Lexer::tokenize(source);
        let index = LineIndex::new(source);
        let errors = lex_errors
            .into_iter()
            .map(|e| {
                let location = index.location(e.span.start);
                SyntaxError::new(SyntaxErrorKind::Lex(e.error), e.span, location)
            })
            .collect();
        Self {
            tokens,
            pos: 0,
            index,
            file: FileSyntax::new(name),
            errors,
        }
    }

    fn finish(mut self) -> Result<FileSyntax, Vec<SyntaxError>> {
        if self.errors.is_empty() {
            Ok(self.file)
        } else {
            self.errors.sort_by_key(|e| e.span.start);
            Err(self.errors)
        }
    }

    // ==================== Token Helpers ====================

    fn peek(&self) -> &Token {
        // collect_all always ends the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn location(&self, span: Span) -> Location {
        self.index.location(span.start)
    }

    fn error(&mut self, kind: SyntaxErrorKind, span: Span) {
        let location = self.location(span);
        self.errors.push(SyntaxError::new(kind, span, location));
    }

    fn unexpected(&mut self, token: &Token, context: &'static str) {
        self.error(
            SyntaxErrorKind::Unexpected {
                found: token.kind,
                context,
            },
            token.span,
        );
    }

    fn comment(token: &Token) -> Comment {
        if token.kind == TokenKind::BlockComment {
            Comment::block(&token.lexeme, token.span)
        } else {
            Comment::line(&token.lexeme, token.span)
        }
    }

    /// Read words and same-line comments up to the end of the line
    fn read_line(&mut self) -> (Vec<String>, Vec<Comment>, LineEnd) {
        let mut words = Vec::new();
        let mut trailing = Vec::new();
        loop {
            let kind = self.peek().kind;
            match kind {
                TokenKind::Bare | TokenKind::String => words.push(self.bump().lexeme),
                TokenKind::LineComment | TokenKind::BlockComment => {
                    let token = self.bump();
                    trailing.push(Self::comment(&token));
                }
                // already reported by the lexer
                TokenKind::Error => {
                    self.bump();
                }
                TokenKind::Newline => {
                    self.bump();
                    return (words, trailing, LineEnd::Newline);
                }
                TokenKind::Eof => return (words, trailing, LineEnd::Eof),
                TokenKind::LParen => {
                    self.bump();
                    return (words, trailing, LineEnd::OpenBlock);
                }
                TokenKind::RParen => return (words, trailing, LineEnd::CloseBlock),
            }
        }
    }

    // ==================== File ====================

    fn parse_file(&mut self) {
        let mut pending = Pending::default();
        let mut at_line_start = true;
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.bump();
                    if at_line_start {
                        if let Some(comments) = pending.blank_line(true) {
                            self.file.stmts.push(Stmt::Comments(comments));
                        }
                    }
                    at_line_start = true;
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    self.bump();
                    pending.push(Self::comment(&token));
                    at_line_start = false;
                }
                TokenKind::RParen => {
                    self.unexpected(&token, "outside of a block");
                    self.bump();
                    at_line_start = false;
                }
                TokenKind::Error => {
                    self.bump();
                    at_line_start = false;
                }
                TokenKind::Bare | TokenKind::String | TokenKind::LParen => {
                    let trivia = pending.take_trivia();
                    if let Some(stmt) = self.parse_stmt(trivia) {
                        self.file.stmts.push(stmt);
                    }
                    at_line_start = true;
                }
            }
        }
        let rest = pending.take_trivia();
        if !rest.leading.is_empty() {
            self.file.stmts.push(Stmt::Comments(CommentBlock { trivia: rest }));
        }
    }

    fn parse_stmt(&mut self, mut trivia: Trivia) -> Option<Stmt> {
        let first = self.peek().clone();
        let start = self.location(first.span);
        let (tokens, trailing, end) = self.read_line();
        trivia.trailing = trailing;
        match end {
            LineEnd::OpenBlock => {
                if tokens.is_empty() {
                    self.unexpected(&first, "at start of statement");
                }
                let block = self.parse_block(tokens, trivia, start, first.span);
                Some(Stmt::Block(block))
            }
            LineEnd::CloseBlock => {
                let close = self.bump();
                self.unexpected(&close, "outside of a block");
                self.line_stmt(tokens, trivia, start)
            }
            LineEnd::Newline | LineEnd::Eof => self.line_stmt(tokens, trivia, start),
        }
    }

    fn line_stmt(&mut self, tokens: Vec<String>, trivia: Trivia, start: Location) -> Option<Stmt> {
        if tokens.is_empty() {
            return None;
        }
        let id = self.file.alloc_line(Line {
            tokens,
            trivia,
            start,
            in_block: false,
        });
        Some(Stmt::Line(id))
    }

    // ==================== Blocks ====================

    fn parse_block(
        &mut self,
        tokens: Vec<String>,
        trivia: Trivia,
        start: Location,
        open: Span,
    ) -> LineBlock {
        let mut block = LineBlock {
            tokens,
            trivia,
            lines: Vec::new(),
            close: Trivia::default(),
            start,
        };

        // remainder of the `(` line
        let first = self.peek().clone();
        let (words, trailing, end) = self.read_line();
        block.trivia.trailing.extend(trailing);
        if !words.is_empty() {
            self.unexpected(&first, "after '('");
        }
        match end {
            LineEnd::CloseBlock => {
                self.close_block(&mut block, Trivia::default());
                return block;
            }
            LineEnd::Eof => {
                self.error(SyntaxErrorKind::UnterminatedBlock, open);
                return block;
            }
            LineEnd::OpenBlock => self.unexpected(&first, "inside a block"),
            LineEnd::Newline => {}
        }

        let mut pending = Pending::default();
        let mut at_line_start = true;
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Newline => {
                    self.bump();
                    if at_line_start {
                        pending.blank_line(false);
                    }
                    at_line_start = true;
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    self.bump();
                    pending.push(Self::comment(&token));
                    at_line_start = false;
                }
                TokenKind::RParen => {
                    let trivia = pending.take_trivia();
                    self.close_block(&mut block, trivia);
                    return block;
                }
                TokenKind::Eof => {
                    self.error(SyntaxErrorKind::UnterminatedBlock, open);
                    block.close = pending.take_trivia();
                    return block;
                }
                TokenKind::Error => {
                    self.bump();
                    at_line_start = false;
                }
                TokenKind::Bare | TokenKind::String | TokenKind::LParen => {
                    let start = self.location(token.span);
                    let mut trivia = pending.take_trivia();
                    let (words, trailing, end) = self.read_line();
                    trivia.trailing = trailing;
                    if end == LineEnd::OpenBlock {
                        self.unexpected(&token, "inside a block");
                    }
                    if !words.is_empty() {
                        let id = self.file.alloc_line(Line {
                            tokens: words,
                            trivia,
                            start,
                            in_block: true,
                        });
                        block.lines.push(id);
                    }
                    at_line_start = true;
                }
            }
        }
    }

    /// Consume `)` and the rest of its line
    fn close_block(&mut self, block: &mut LineBlock, leading: Trivia) {
        let close = self.bump();
        block.close = leading;
        let (words, trailing, end) = self.read_line();
        block.close.trailing = trailing;
        if !words.is_empty() || matches!(end, LineEnd::OpenBlock) {
            self.unexpected(&close, "followed by more tokens");
        }
    }
}
