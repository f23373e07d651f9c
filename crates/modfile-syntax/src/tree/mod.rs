//! Format-preserving syntax tree for manifest files
//!
//! A file is an ordered list of statements. Each statement is a bare line
//! (`require example.com/a v1.0.0`), a block grouping several lines under a
//! shared header (`require ( ... )`), or a run of standalone comments.
//!
//! Lines live in an arena owned by [`FileSyntax`] and are addressed by
//! [`LineId`]. The id of a line never changes, even when the line moves
//! into or out of a block, so callers can keep it as a handle. A removed
//! line keeps its arena slot with an empty token list until [`FileSyntax::cleanup`]
//! unlinks it from the statement list.

mod comment;

pub use comment::{Comment, CommentKind, Trivia};

use crate::lexer::Location;

/// Stable handle to a line in a [`FileSyntax`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(usize);

impl LineId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single line of tokens
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Tokens as written; for a line inside a block the header verb is not
    /// repeated here
    pub tokens: Vec<String>,
    pub trivia: Trivia,
    pub start: Location,
    pub in_block: bool,
}

impl Line {
    /// A removed line has no tokens left
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A header followed by a parenthesized group of lines
#[derive(Debug, Clone, PartialEq)]
pub struct LineBlock {
    /// Header tokens before `(`; well-formed files have exactly one
    pub tokens: Vec<String>,
    /// Comments above the header and after `(`
    pub trivia: Trivia,
    pub lines: Vec<LineId>,
    /// Comments above and after the closing `)`
    pub close: Trivia,
    pub start: Location,
}

impl LineBlock {
    /// The header verb, when the header is a single token
    #[must_use]
    pub fn verb(&self) -> Option<&str> {
        match self.tokens.as_slice() {
            [verb] => Some(verb),
            _ => None,
        }
    }
}

/// Comments that are not attached to any line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentBlock {
    pub trivia: Trivia,
}

/// A top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Line(LineId),
    Block(LineBlock),
    Comments(CommentBlock),
}

/// Where an existing line sits in the statement list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// A bare line at `stmts[i]`
    TopLevel(usize),
    /// The block at `stmts[i]`
    Block(usize),
    /// Line `j` of the block at `stmts[i]`
    InBlock(usize, usize),
}

/// The parsed form of a whole manifest file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileSyntax {
    /// File name used in diagnostics
    pub name: String,
    pub stmts: Vec<Stmt>,
    lines: Vec<Line>,
}

impl FileSyntax {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stmts: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Look up a line by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different tree.
    #[must_use]
    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.0]
    }

    pub fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.lines[id.0]
    }

    /// Store a line in the arena without linking it into any statement
    pub fn alloc_line(&mut self, line: Line) -> LineId {
        self.lines.push(line);
        LineId(self.lines.len() - 1)
    }

    /// Every live line in document order, paired with the verb that
    /// introduces it (its first token, or the header of its block)
    #[must_use]
    pub fn live_lines(&self) -> Vec<(&str, LineId)> {
        let mut out = Vec::new();
        for stmt in &self.stmts {
            match stmt {
                Stmt::Line(id) => {
                    if let Some(verb) = self.line(*id).tokens.first() {
                        out.push((verb.as_str(), *id));
                    }
                }
                Stmt::Block(block) => {
                    let verb = block.tokens.first().map_or("", String::as_str);
                    out.extend(
                        block
                            .lines
                            .iter()
                            .filter(|id| !self.line(**id).is_removed())
                            .map(|id| (verb, *id)),
                    );
                }
                Stmt::Comments(_) => {}
            }
        }
        out
    }

    /// Add a line built from `tokens` (verb first) and return its handle.
    ///
    /// The new line is placed after `hint` when given. Without a hint it
    /// joins the last statement using the same verb. A bare line used as
    /// the anchor is turned into a block holding both lines. With no anchor
    /// at all the line is appended at the end of the file.
    pub fn add_line(&mut self, hint: Option<LineId>, tokens: Vec<String>) -> LineId {
        let anchor = match hint {
            Some(id) if !self.line(id).is_removed() => self.locate(id),
            Some(_) => None,
            None => tokens.first().and_then(|verb| self.last_stmt_with_verb(verb)),
        };

        let Some(anchor) = anchor else {
            let id = self.alloc_line(Line {
                tokens,
                trivia: Trivia {
                    blank_before: !self.stmts.is_empty(),
                    ..Trivia::default()
                },
                start: Location::default(),
                in_block: false,
            });
            self.stmts.push(Stmt::Line(id));
            return id;
        };

        let nested = Line {
            tokens: tokens.into_iter().skip(1).collect(),
            trivia: Trivia::default(),
            start: Location::default(),
            in_block: true,
        };
        let id = self.alloc_line(nested);
        match anchor {
            Anchor::TopLevel(i) => {
                if let Stmt::Line(existing) = self.stmts[i] {
                    let block = self.wrap_in_block(existing, id);
                    self.stmts[i] = Stmt::Block(block);
                }
            }
            Anchor::Block(i) => {
                if let Stmt::Block(block) = &mut self.stmts[i] {
                    block.lines.push(id);
                }
            }
            Anchor::InBlock(i, j) => {
                if let Stmt::Block(block) = &mut self.stmts[i] {
                    block.lines.insert(j + 1, id);
                }
            }
        }
        id
    }

    /// Replace the tokens of a line; `tokens` starts with the verb, which is
    /// dropped for lines inside a block.
    pub fn update_line(&mut self, id: LineId, tokens: Vec<String>) {
        let line = self.line_mut(id);
        line.tokens = if line.in_block {
            tokens.into_iter().skip(1).collect()
        } else {
            tokens
        };
    }

    /// Mark a line as removed; it stops rendering immediately and is
    /// unlinked by the next [`FileSyntax::cleanup`].
    pub fn remove_line(&mut self, id: LineId) {
        self.line_mut(id).tokens.clear();
    }

    /// Append a standalone comment statement
    pub fn add_comment(&mut self, text: &str) {
        let blank_before = !self.stmts.is_empty();
        self.stmts.push(Stmt::Comments(CommentBlock {
            trivia: Trivia {
                leading: vec![Comment::synthesized(text)],
                trailing: Vec::new(),
                blank_before,
            },
        }));
    }

    /// Unlink every line for which `keep` returns false, in a single pass
    /// over the statements. Blocks left without live lines are dropped,
    /// together with any removed lines they still hold.
    pub fn retain_lines(&mut self, mut keep: impl FnMut(LineId, &Line) -> bool) {
        let Self { stmts, lines, .. } = self;
        stmts.retain_mut(|stmt| match stmt {
            Stmt::Line(id) => keep(*id, &lines[id.0]),
            Stmt::Block(block) => {
                block.lines.retain(|id| keep(*id, &lines[id.0]));
                block.lines.iter().any(|id| !lines[id.0].is_removed())
            }
            Stmt::Comments(_) => true,
        });
    }

    /// Stably sort the lines of every block by their token sequences
    pub fn sort_blocks(&mut self) {
        let Self { stmts, lines, .. } = self;
        for stmt in stmts {
            if let Stmt::Block(block) = stmt {
                block
                    .lines
                    .sort_by(|a, b| lines[a.0].tokens.cmp(&lines[b.0].tokens));
            }
        }
    }

    /// Unlink removed lines and drop emptied blocks.
    ///
    /// A block that lost lines and is down to a single one is collapsed
    /// back into a bare line carrying the block's comments. The collapsed
    /// line keeps its [`LineId`].
    pub fn cleanup(&mut self) {
        let Self { stmts, lines, .. } = self;
        let mut kept = Vec::with_capacity(stmts.len());
        for stmt in stmts.drain(..) {
            match stmt {
                Stmt::Line(id) if lines[id.0].is_removed() => {}
                Stmt::Block(mut block) => {
                    let before = block.lines.len();
                    block.lines.retain(|id| !lines[id.0].is_removed());
                    match block.lines.as_slice() {
                        [] => {}
                        [only] if before > 1 => {
                            let only = *only;
                            let line = &mut lines[only.0];
                            let mut tokens = block.tokens;
                            tokens.append(&mut line.tokens);
                            line.tokens = tokens;
                            line.in_block = false;
                            line.start = block.start;
                            let mut outer = block.trivia;
                            outer.trailing.extend(block.close.trailing);
                            line.trivia.merge_outer(outer);
                            kept.push(Stmt::Line(only));
                            if !block.close.leading.is_empty() {
                                kept.push(Stmt::Comments(CommentBlock {
                                    trivia: Trivia::with_leading(block.close.leading),
                                }));
                            }
                        }
                        _ => kept.push(Stmt::Block(block)),
                    }
                }
                other => kept.push(other),
            }
        }
        *stmts = kept;
    }

    fn locate(&self, id: LineId) -> Option<Anchor> {
        self.stmts.iter().enumerate().find_map(|(i, stmt)| match stmt {
            Stmt::Line(line) if *line == id => Some(Anchor::TopLevel(i)),
            Stmt::Block(block) => block
                .lines
                .iter()
                .position(|line| *line == id)
                .map(|j| Anchor::InBlock(i, j)),
            _ => None,
        })
    }

    fn last_stmt_with_verb(&self, verb: &str) -> Option<Anchor> {
        self.stmts.iter().enumerate().rev().find_map(|(i, stmt)| match stmt {
            Stmt::Line(id) if self.line(*id).tokens.first().is_some_and(|t| t == verb) => {
                Some(Anchor::TopLevel(i))
            }
            Stmt::Block(block) if block.verb() == Some(verb) => Some(Anchor::Block(i)),
            _ => None,
        })
    }

    /// Move the bare line `existing` under a new block header made of its
    /// verb, followed by the already allocated line `added`.
    fn wrap_in_block(&mut self, existing: LineId, added: LineId) -> LineBlock {
        let line = self.line_mut(existing);
        let verb = line.tokens.remove(0);
        line.in_block = true;
        let trivia = Trivia {
            leading: std::mem::take(&mut line.trivia.leading),
            trailing: Vec::new(),
            blank_before: std::mem::take(&mut line.trivia.blank_before),
        };
        LineBlock {
            tokens: vec![verb],
            trivia,
            lines: vec![existing, added],
            close: Trivia::default(),
            start: line.start,
        }
    }
}
