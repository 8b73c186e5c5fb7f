//! Indentation-sensitive scanner for the embedded scripting grammar.
//!
//! Produces NEWLINE/INDENT/DEDENT tokens on top of the ordinary stream:
//! an indentation stack is compared at every logical line start, tabs
//! expand to the next multiple of the tab size, and open brackets
//! suppress the whole mechanism (implicit line joining). Dedents that
//! align with no open level are reported as diagnostics, not failures.

use std::collections::VecDeque;

use crate::keywords::{self, KeywordSet};
use crate::models::enums::{MySqlVersion, ServiceLanguage, TokenChannel, TokenKind};
use crate::models::structs::{ParserError, Token};

pub const TAB_SIZE: usize = 8;

/// Tokens plus the scanner-level diagnostics collected on the way.
pub struct ScriptTokenizeResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParserError>,
}

pub struct ScriptLexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    line: u32,
    col: u32,
    indent_stack: Vec<usize>,
    bracket_depth: usize,
    pending: VecDeque<Token>,
    at_line_start: bool,
    line_had_content: bool,
    last_was_newline: bool,
    eof_flushed: bool,
    errors: Vec<ParserError>,
}

impl<'a> ScriptLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            text: source,
            pos: 0,
            line: 1,
            col: 0,
            indent_stack: vec![0],
            bracket_depth: 0,
            pending: VecDeque::new(),
            at_line_start: true,
            line_had_content: false,
            last_was_newline: true,
            eof_flushed: false,
            errors: Vec::new(),
        }
    }

    /// Tokenize the whole buffer, EOF included.
    pub fn tokenize(source: &'a str) -> ScriptTokenizeResult {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        ScriptTokenizeResult { tokens, errors: lexer.errors }
    }

    /// Reset all per-buffer state: indentation stack, bracket depth,
    /// pending tokens.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.col = 0;
        self.indent_stack = vec![0];
        self.bracket_depth = 0;
        self.pending.clear();
        self.at_line_start = true;
        self.line_had_content = false;
        self.last_was_newline = true;
        self.eof_flushed = false;
        self.errors.clear();
    }

    fn keyword_set() -> &'static KeywordSet {
        keywords::keyword_set(ServiceLanguage::Script, MySqlVersion::Unknown)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }

        Some(byte)
    }

    fn synthetic(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            text: String::new(),
            start: self.pos,
            stop: self.pos,
            line: self.line,
            column: self.col,
            channel: TokenChannel::Default,
        }
    }

    fn make(&self, kind: TokenKind, start: usize, line: u32, col: u32, channel: TokenChannel) -> Token {
        Token {
            kind,
            text: self.text[start..self.pos].to_string(),
            start,
            stop: self.pos,
            line,
            column: col,
            channel,
        }
    }

    fn error(&mut self, message: &str, start: usize, line: u32, col: u32, length: usize) {
        self.errors.push(ParserError {
            message: message.to_string(),
            char_offset: start,
            line,
            offset: col,
            length: length.max(1),
        });
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(pending) = self.pending.pop_front() {
            self.last_was_newline = pending.kind == TokenKind::Newline;
            return pending;
        }

        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                if let Some(token) = self.handle_line_start() {
                    self.last_was_newline = token.kind == TokenKind::Newline;
                    return token;
                }
                continue;
            }

            let start = self.pos;
            let line = self.line;
            let col = self.col;

            let Some(ch) = self.peek(0) else {
                return self.flush_eof();
            };

            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.bump();
                    continue;
                }
                b'\\' if self.peek(1) == Some(b'\n') => {
                    // Explicit line joining.
                    self.bump();
                    self.bump();
                    continue;
                }
                b'\n' => {
                    self.bump();
                    if self.bracket_depth > 0 {
                        // Implicit joining inside brackets.
                        continue;
                    }
                    self.at_line_start = true;
                    if self.line_had_content {
                        self.line_had_content = false;
                        self.last_was_newline = true;
                        return self.make(TokenKind::Newline, start, line, col, TokenChannel::Default);
                    }
                    continue;
                }
                b'#' => {
                    while !matches!(self.peek(0), None | Some(b'\n')) {
                        self.bump();
                    }
                    return self.make(TokenKind::LineComment, start, line, col, TokenChannel::Hidden);
                }
                _ => {}
            }

            self.line_had_content = true;
            self.last_was_newline = false;

            let kind = match ch {
                b'\'' | b'"' => self.lex_string(),
                b'0'..=b'9' => self.lex_number(),
                b'.' if matches!(self.peek(1), Some(b'0'..=b'9')) => self.lex_number(),
                c if is_name_start(c) => self.lex_name(start),
                _ => self.lex_operator(),
            };

            return self.make(kind, start, line, col, TokenChannel::Default);
        }
    }

    /// Measure the indentation of a fresh logical line and queue the
    /// INDENT/DEDENT tokens it produces. Returns the first token to
    /// emit, or None when the line turned out blank.
    fn handle_line_start(&mut self) -> Option<Token> {
        let mut width = 0usize;
        loop {
            match self.peek(0) {
                Some(b' ') => {
                    width += 1;
                    self.bump();
                }
                Some(b'\t') => {
                    width = (width / TAB_SIZE + 1) * TAB_SIZE;
                    self.bump();
                }
                _ => break,
            }
        }

        match self.peek(0) {
            // Blank line: no NEWLINE, no indentation effect.
            Some(b'\n') => {
                self.bump();
                return None;
            }
            Some(b'\r') => {
                self.bump();
                return None;
            }
            // Comment-only line: emit the comment (hidden), skip the
            // indentation bookkeeping entirely.
            Some(b'#') => {
                let start = self.pos;
                let line = self.line;
                let col = self.col;
                while !matches!(self.peek(0), None | Some(b'\n')) {
                    self.bump();
                }
                return Some(self.make(TokenKind::LineComment, start, line, col, TokenChannel::Hidden));
            }
            None => return Some(self.flush_eof()),
            _ => {}
        }

        self.at_line_start = false;

        let current = *self.indent_stack.last().unwrap_or(&0);
        if width > current {
            self.indent_stack.push(width);
            return Some(self.synthetic(TokenKind::Indent));
        }
        if width < current {
            while self.indent_stack.len() > 1 && *self.indent_stack.last().unwrap() > width {
                self.indent_stack.pop();
                self.pending.push_back(self.synthetic(TokenKind::Dedent));
            }
            if *self.indent_stack.last().unwrap() != width {
                self.error(
                    "unindent does not match any outer indentation level",
                    self.pos,
                    self.line,
                    self.col,
                    width.max(1),
                );
            }
            return self.pending.pop_front();
        }

        None
    }

    /// End of input: synthesize a trailing NEWLINE if the last
    /// significant token wasn't one, drain the indentation stack with
    /// DEDENTs, then report EOF.
    fn flush_eof(&mut self) -> Token {
        if !self.eof_flushed {
            self.eof_flushed = true;

            if self.line_had_content && !self.last_was_newline {
                self.pending.push_back(self.synthetic(TokenKind::Newline));
            }
            while self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                self.pending.push_back(self.synthetic(TokenKind::Dedent));
            }
            self.pending.push_back(self.synthetic(TokenKind::Eof));

            if let Some(first) = self.pending.pop_front() {
                self.last_was_newline = first.kind == TokenKind::Newline;
                return first;
            }
        }

        self.synthetic(TokenKind::Eof)
    }

    fn lex_string(&mut self) -> TokenKind {
        let quote = self.peek(0).unwrap_or(b'\'');
        let start = self.pos;
        let line = self.line;
        let col = self.col;

        // Triple-quoted strings span lines.
        if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
            self.bump();
            self.bump();
            self.bump();
            loop {
                match self.peek(0) {
                    None => {
                        self.error("unterminated triple-quoted string", start, line, col, self.pos - start);
                        break;
                    }
                    Some(c) if c == quote && self.peek(1) == Some(quote) && self.peek(2) == Some(quote) => {
                        self.bump();
                        self.bump();
                        self.bump();
                        break;
                    }
                    Some(b'\\') => {
                        self.bump();
                        self.bump();
                    }
                    _ => {
                        self.bump();
                    }
                }
            }
            return TokenKind::SingleQuotedText;
        }

        self.bump();
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    self.error("unterminated string literal", start, line, col, self.pos - start);
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }

        if quote == b'\'' {
            TokenKind::SingleQuotedText
        } else {
            TokenKind::DoubleQuotedText
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X')) {
            self.bump();
            self.bump();
            while matches!(self.peek(0), Some(c) if c.is_ascii_hexdigit() || c == b'_') {
                self.bump();
            }
            return TokenKind::HexNumber;
        }
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'b' | b'B')) {
            self.bump();
            self.bump();
            while matches!(self.peek(0), Some(b'0' | b'1' | b'_')) {
                self.bump();
            }
            return TokenKind::BinNumber;
        }

        while matches!(self.peek(0), Some(c) if c.is_ascii_digit() || c == b'_') {
            self.bump();
        }
        if self.peek(0) == Some(b'.') {
            self.bump();
            while matches!(self.peek(0), Some(c) if c.is_ascii_digit() || c == b'_') {
                self.bump();
            }
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let mut ahead = 1;
            if matches!(self.peek(1), Some(b'+' | b'-')) {
                ahead = 2;
            }
            if matches!(self.peek(ahead), Some(b'0'..=b'9')) {
                for _ in 0..=ahead {
                    self.bump();
                }
                while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        if matches!(self.peek(0), Some(b'j' | b'J')) {
            self.bump();
        }

        TokenKind::Number
    }

    fn lex_name(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(0), Some(c) if is_name_part(c)) {
            self.bump();
        }

        // String prefixes: r'...', f"...", rb'...' etc.
        if matches!(self.peek(0), Some(b'\'' | b'"')) {
            let prefix = &self.text[start..self.pos];
            if prefix.len() <= 2
                && prefix.chars().all(|c| matches!(c, 'r' | 'R' | 'b' | 'B' | 'f' | 'F' | 'u' | 'U'))
            {
                return self.lex_string();
            }
        }

        let word = &self.text[start..self.pos];
        if Self::keyword_set().is_keyword(word) && word.chars().all(|c| c.is_ascii_lowercase())
            || matches!(word, "True" | "False" | "None")
        {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        }
    }

    fn lex_operator(&mut self) -> TokenKind {
        let ch = self.peek(0).unwrap_or(0);

        match ch {
            b'(' => {
                self.bump();
                self.bracket_depth += 1;
                return TokenKind::OpenParen;
            }
            b'[' => {
                self.bump();
                self.bracket_depth += 1;
                return TokenKind::OpenBracket;
            }
            b'{' => {
                self.bump();
                self.bracket_depth += 1;
                return TokenKind::OpenBrace;
            }
            b')' => {
                self.bump();
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                return TokenKind::CloseParen;
            }
            b']' => {
                self.bump();
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                return TokenKind::CloseBracket;
            }
            b'}' => {
                self.bump();
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                return TokenKind::CloseBrace;
            }
            b',' => {
                self.bump();
                return TokenKind::Comma;
            }
            b';' => {
                self.bump();
                return TokenKind::Semicolon;
            }
            b':' => {
                self.bump();
                if self.peek(0) == Some(b'=') {
                    self.bump();
                    return TokenKind::Operator;
                }
                return TokenKind::Colon;
            }
            b'.' => {
                self.bump();
                return TokenKind::Dot;
            }
            _ => {}
        }

        // Multi-character operators, longest first.
        for op in ["**=", "//=", ">>=", "<<=", "->", "**", "//", "<<", ">>", "<=", ">=", "==", "!=",
            "+=", "-=", "*=", "/=", "%=", "@=", "&=", "|=", "^="]
        {
            let bytes = op.as_bytes();
            if (0..bytes.len()).all(|i| self.peek(i) == Some(bytes[i])) {
                for _ in 0..bytes.len() {
                    self.bump();
                }
                return TokenKind::Operator;
            }
        }

        self.bump();
        match ch {
            b'+' | b'-' | b'*' | b'/' | b'%' | b'@' | b'&' | b'|' | b'^' | b'~' | b'<' | b'>'
            | b'=' => TokenKind::Operator,
            _ => TokenKind::Invalid,
        }
    }
}

fn is_name_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80
}

fn is_name_part(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(result: &ScriptTokenizeResult) -> Vec<TokenKind> {
        result
            .tokens
            .iter()
            .filter(|t| t.channel == TokenChannel::Default)
            .map(|t| t.kind)
            .collect()
    }

    fn count(result: &ScriptTokenizeResult, kind: TokenKind) -> usize {
        result.tokens.iter().filter(|t| t.kind == kind).count()
    }

    #[test]
    fn block_produces_one_indent_dedent_pair() {
        let result = ScriptLexer::tokenize("if x:\n    y\n    z\nw");
        assert_eq!(count(&result, TokenKind::Indent), 1);
        assert_eq!(count(&result, TokenKind::Dedent), 1);
        assert!(result.errors.is_empty());

        let kinds = significant(&result);
        let expected = vec![
            TokenKind::Keyword,    // if
            TokenKind::Identifier, // x
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Identifier, // y
            TokenKind::Newline,
            TokenKind::Identifier, // z
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Identifier, // w
            TokenKind::Newline,    // synthesized at EOF
            TokenKind::Eof,
        ];
        assert_eq!(kinds, expected);
    }

    #[test]
    fn indents_balance_dedents_on_nested_blocks() {
        let src = "def f():\n    if a:\n        b\n    c\nd\n";
        let result = ScriptLexer::tokenize(src);
        assert_eq!(count(&result, TokenKind::Indent), count(&result, TokenKind::Dedent));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn brackets_suppress_indentation() {
        let src = "x = (1 +\n        2 +\n    3)\ny";
        let result = ScriptLexer::tokenize(src);
        assert_eq!(count(&result, TokenKind::Indent), 0);
        assert_eq!(count(&result, TokenKind::Dedent), 0);
    }

    #[test]
    fn mismatched_dedent_is_reported() {
        let src = "if x:\n        a\n    b\n";
        let result = ScriptLexer::tokenize(src);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("unindent"));
    }

    #[test]
    fn tabs_expand_to_tab_stops() {
        // One tab equals eight columns, so "\t a" is deeper than "    a".
        let src = "if x:\n    a\n\tb\n";
        let result = ScriptLexer::tokenize(src);
        assert_eq!(count(&result, TokenKind::Indent), 2);
        assert_eq!(count(&result, TokenKind::Dedent), 2);
    }

    #[test]
    fn blank_and_comment_lines_are_neutral() {
        let src = "if x:\n    a\n\n# note\n    b\n";
        let result = ScriptLexer::tokenize(src);
        assert_eq!(count(&result, TokenKind::Indent), 1);
        assert_eq!(count(&result, TokenKind::Dedent), 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn eof_without_trailing_newline_flushes_stack() {
        let result = ScriptLexer::tokenize("if x:\n    y");
        let kinds = significant(&result);
        assert_eq!(
            &kinds[kinds.len() - 3..],
            &[TokenKind::Newline, TokenKind::Dedent, TokenKind::Eof]
        );
    }

    #[test]
    fn soft_keywords_stay_identifiers() {
        let result = ScriptLexer::tokenize("match = 1\n");
        assert_eq!(result.tokens[0].kind, TokenKind::Identifier);
    }
}
