//! Manifest printer
//!
//! Renders a [`FileSyntax`] in canonical layout:
//! - one space between tokens
//! - block lines indented with a tab
//! - trailing comments separated from the tokens by one space
//! - at most one blank line between nodes, none at the top of the file
//! - removed lines are skipped
//!
//! A freshly parsed file that is already in this layout renders back to
//! the same bytes.

use crate::tree::{Comment, FileSyntax, LineBlock, LineId, Stmt, Trivia};

/// Formatter configuration
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Indentation used for lines inside a block
    pub indent: String,
    /// Whether to end the output with a newline
    pub trailing_newline: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: String::from("\t"),
            trailing_newline: true,
        }
    }
}

/// The manifest printer
pub struct Formatter {
    output: String,
    indent_level: usize,
    config: FormatConfig,
    at_line_start: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    #[must_use]
    pub fn with_config(config: FormatConfig) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            config,
            at_line_start: true,
        }
    }

    /// Render a file with the default configuration
    #[must_use]
    pub fn format_file(file: &FileSyntax) -> String {
        Self::new().render(file)
    }

    /// Render a file, consuming the formatter
    #[must_use]
    pub fn render(mut self, file: &FileSyntax) -> String {
        for stmt in &file.stmts {
            self.write_stmt(file, stmt);
        }
        if !self.config.trailing_newline && self.output.ends_with('\n') {
            self.output.pop();
        }
        self.output
    }

    // ==================== Output Helpers ====================

    fn write(&mut self, s: &str) {
        if self.at_line_start && !s.is_empty() {
            for _ in 0..self.indent_level {
                self.output.push_str(&self.config.indent);
            }
            self.at_line_start = false;
        }
        self.output.push_str(s);
    }

    fn writeln(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    fn write_tokens(&mut self, tokens: &[String]) {
        self.write(&tokens.join(" "));
    }

    // ==================== Trivia/Comments ====================

    fn write_blank_line(&mut self, trivia: &Trivia) {
        // no blank line at the top of the file or straight after another one
        if trivia.blank_before && !self.output.is_empty() && !self.output.ends_with("\n\n") {
            self.writeln();
        }
    }

    fn write_leading_trivia(&mut self, trivia: &Trivia) {
        self.write_blank_line(trivia);
        for comment in &trivia.leading {
            self.write_comment(comment);
            self.writeln();
        }
    }

    fn write_trailing_trivia(&mut self, trivia: &Trivia) {
        for comment in &trivia.trailing {
            self.write(" ");
            self.write_comment(comment);
        }
    }

    fn write_comment(&mut self, comment: &Comment) {
        self.write(comment.text.trim_end());
    }

    // ==================== Statements ====================

    fn write_stmt(&mut self, file: &FileSyntax, stmt: &Stmt) {
        match stmt {
            Stmt::Line(id) => self.write_line(file, *id),
            Stmt::Block(block) => self.write_block(file, block),
            Stmt::Comments(comments) => self.write_leading_trivia(&comments.trivia),
        }
    }

    fn write_line(&mut self, file: &FileSyntax, id: LineId) {
        let line = file.line(id);
        if line.is_removed() {
            return;
        }
        self.write_leading_trivia(&line.trivia);
        self.write_tokens(&line.tokens);
        self.write_trailing_trivia(&line.trivia);
        self.writeln();
    }

    fn write_block(&mut self, file: &FileSyntax, block: &LineBlock) {
        self.write_leading_trivia(&block.trivia);
        self.write_tokens(&block.tokens);
        self.write(" (");
        self.write_trailing_trivia(&block.trivia);
        self.writeln();

        self.indent_level += 1;
        for id in &block.lines {
            self.write_line(file, *id);
        }
        self.write_leading_trivia(&block.close);
        self.indent_level -= 1;

        self.write(")");
        self.write_trailing_trivia(&block.close);
        self.writeln();
    }
}
