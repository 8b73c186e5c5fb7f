//! Raw SQL scanner.
//!
//! Converts SQL text into a token stream, tracking line/column for
//! diagnostics. Dialect quirks (comment styles, quoting, variable
//! markers, version comments) are driven by `LexerConfig`; keyword
//! reclassification happens afterwards in the per-dialect filters.

use std::collections::HashSet;

use crate::models::enums::{MySqlVersion, ServiceLanguage, SqlMode, TokenChannel, TokenKind};
use crate::models::structs::Token;

/// Dialect parameters for the scanner.
#[derive(Clone, Debug)]
pub struct LexerConfig {
    pub language: ServiceLanguage,
    pub version: MySqlVersion,
    /// Raw numeric server version, used by `/*!NNNNN ... */` predicates.
    pub server_version: u32,
    pub sql_modes: HashSet<SqlMode>,
}

impl LexerConfig {
    pub fn mysql(server_version: u32, sql_mode: &str) -> Self {
        Self {
            language: ServiceLanguage::MySql,
            version: MySqlVersion::from_number(server_version),
            server_version,
            sql_modes: SqlMode::set_from_string(sql_mode),
        }
    }

    pub fn with_modes(mut self, sql_modes: HashSet<SqlMode>) -> Self {
        self.sql_modes = sql_modes;
        self
    }

    pub fn sqlite() -> Self {
        Self {
            language: ServiceLanguage::Sqlite,
            version: MySqlVersion::Unknown,
            server_version: 0,
            sql_modes: HashSet::new(),
        }
    }

    fn hash_comments(&self) -> bool {
        self.language == ServiceLanguage::MySql
    }

    fn dash_comment_needs_space(&self) -> bool {
        self.language == ServiceLanguage::MySql
    }

    fn bracket_identifiers(&self) -> bool {
        self.language == ServiceLanguage::Sqlite
    }

    fn at_variables(&self) -> bool {
        self.language == ServiceLanguage::MySql
    }

    fn version_comments(&self) -> bool {
        self.language == ServiceLanguage::MySql
    }

    fn double_quote_is_identifier(&self) -> bool {
        match self.language {
            ServiceLanguage::Sqlite => true,
            ServiceLanguage::MySql => self.sql_modes.contains(&SqlMode::AnsiQuotes),
            ServiceLanguage::Script => false,
        }
    }

    fn backslash_escapes(&self) -> bool {
        !self.sql_modes.contains(&SqlMode::NoBackslashEscapes)
    }
}

/// Byte scanner over UTF-8 SQL source.
pub struct SqlLexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    line: u32,
    col: u32,
    config: LexerConfig,
    in_version_comment: bool,
}

impl<'a> SqlLexer<'a> {
    pub fn new(source: &'a str, config: LexerConfig) -> Self {
        Self {
            src: source.as_bytes(),
            text: source,
            pos: 0,
            line: 1,
            col: 0,
            config,
            in_version_comment: false,
        }
    }

    /// Tokenize the whole input, EOF token included. Whitespace is
    /// dropped, comments go to the hidden channel.
    pub fn tokenize(source: &'a str, config: LexerConfig) -> Vec<Token> {
        let mut lexer = Self::new(source, config);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        tokens
    }

    /// Reset transient state and rewind to the start of the input.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.col = 0;
        self.in_version_comment = false;
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

    /// Produce the next token. Returns EOF forever once exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let start = self.pos;
            let line = self.line;
            let col = self.col;

            let Some(ch) = self.peek(0) else {
                return self.make(TokenKind::Eof, start, line, col, TokenChannel::Default);
            };

            // Closing of an active version comment is consumed silently.
            if self.in_version_comment && ch == b'*' && self.peek(1) == Some(b'/') {
                self.bump();
                self.bump();
                self.in_version_comment = false;
                continue;
            }

            let kind = match ch {
                b'\'' => self.lex_string(b'\''),
                b'"' => {
                    let kind = self.lex_string(b'"');
                    if kind == TokenKind::DoubleQuotedText && self.config.double_quote_is_identifier() {
                        TokenKind::QuotedIdentifier
                    } else {
                        kind
                    }
                }
                b'`' => self.lex_quoted_identifier(b'`', TokenKind::BackTickIdentifier),
                b'[' if self.config.bracket_identifiers() => {
                    self.lex_quoted_identifier(b']', TokenKind::BracketIdentifier)
                }
                b'#' if self.config.hash_comments() => {
                    self.lex_line_comment();
                    return self.make(TokenKind::LineComment, start, line, col, TokenChannel::Hidden);
                }
                b'-' if self.peek(1) == Some(b'-') && self.dash_comment_follows() => {
                    self.lex_line_comment();
                    return self.make(TokenKind::LineComment, start, line, col, TokenChannel::Hidden);
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    match self.lex_block_comment() {
                        BlockComment::Version => continue,
                        BlockComment::Closed => {
                            return self.make(
                                TokenKind::BlockComment,
                                start,
                                line,
                                col,
                                TokenChannel::Hidden,
                            );
                        }
                        BlockComment::Open => {
                            return self.make(
                                TokenKind::OpenBlockComment,
                                start,
                                line,
                                col,
                                TokenChannel::Hidden,
                            );
                        }
                    }
                }
                b'@' if self.config.at_variables() => self.lex_at_variable(),
                b'0'..=b'9' => self.lex_number(),
                b'.' => {
                    if matches!(self.peek(1), Some(b'0'..=b'9')) {
                        self.lex_number()
                    } else {
                        self.bump();
                        TokenKind::Dot
                    }
                }
                b'x' | b'X' | b'b' | b'B' if self.peek(1) == Some(b'\'') => self.lex_quoted_literal(ch),
                c if is_identifier_start(c) => self.lex_identifier(),
                _ => self.lex_operator(),
            };

            return self.make(kind, start, line, col, TokenChannel::Default);
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(0), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.bump();
        }
    }

    fn dash_comment_follows(&self) -> bool {
        if !self.config.dash_comment_needs_space() {
            return true;
        }

        // MySQL requires whitespace (or end of line/input) after `--`.
        matches!(self.peek(2), None | Some(b' ' | b'\t' | b'\n' | b'\r'))
    }

    fn lex_line_comment(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch == b'\n' {
                break;
            }
            self.bump();
        }
    }

    fn lex_block_comment(&mut self) -> BlockComment {
        self.bump(); // '/'
        self.bump(); // '*'

        // `/*!NNNNN` executes its body when the server version matches.
        if self.config.version_comments() && self.peek(0) == Some(b'!') {
            self.bump();
            let digits_start = self.pos;
            while matches!(self.peek(0), Some(b'0'..=b'9')) {
                self.bump();
            }
            let digits = &self.text[digits_start..self.pos];
            let applies = if digits.is_empty() {
                true
            } else {
                digits.parse::<u32>().map(|v| v <= self.config.server_version).unwrap_or(false)
            };

            if applies {
                self.in_version_comment = true;
                return BlockComment::Version;
            }
            // Version too new: fall through and swallow as a comment.
        }

        loop {
            match self.peek(0) {
                None => return BlockComment::Open,
                Some(b'*') if self.peek(1) == Some(b'/') => {
                    self.bump();
                    self.bump();
                    return BlockComment::Closed;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn lex_string(&mut self, quote: u8) -> TokenKind {
        self.bump(); // opening quote
        loop {
            match self.peek(0) {
                None => break,
                Some(b'\\') if self.config.backslash_escapes() => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    // Doubled quote continues the literal.
                    if self.peek(0) == Some(quote) {
                        self.bump();
                    } else {
                        break;
                    }
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

    fn lex_quoted_identifier(&mut self, closing: u8, kind: TokenKind) -> TokenKind {
        self.bump();
        while let Some(ch) = self.peek(0) {
            self.bump();
            if ch == closing {
                break;
            }
        }

        kind
    }

    fn lex_at_variable(&mut self) -> TokenKind {
        self.bump(); // '@'
        let system = self.peek(0) == Some(b'@');
        if system {
            self.bump();
        }

        match self.peek(0) {
            Some(q @ (b'\'' | b'"' | b'`')) => {
                let close = if q == b'`' { b'`' } else { q };
                self.lex_quoted_identifier(close, TokenKind::Identifier);
            }
            _ => {
                while matches!(self.peek(0), Some(c) if is_identifier_part(c)) {
                    self.bump();
                }
            }
        }

        if system {
            TokenKind::AtAtVariable
        } else {
            TokenKind::AtVariable
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        // 0x / 0b prefixes.
        if self.peek(0) == Some(b'0') {
            match self.peek(1) {
                Some(b'x' | b'X') if matches!(self.peek(2), Some(c) if c.is_ascii_hexdigit()) => {
                    self.bump();
                    self.bump();
                    while matches!(self.peek(0), Some(c) if c.is_ascii_hexdigit()) {
                        self.bump();
                    }
                    return TokenKind::HexNumber;
                }
                Some(b'b' | b'B') if matches!(self.peek(2), Some(b'0' | b'1')) => {
                    self.bump();
                    self.bump();
                    while matches!(self.peek(0), Some(b'0' | b'1')) {
                        self.bump();
                    }
                    return TokenKind::BinNumber;
                }
                _ => {}
            }
        }

        while matches!(self.peek(0), Some(b'0'..=b'9')) {
            self.bump();
        }
        if self.peek(0) == Some(b'.') && matches!(self.peek(1), Some(b'0'..=b'9')) {
            self.bump();
            while matches!(self.peek(0), Some(b'0'..=b'9')) {
                self.bump();
            }
        } else if self.peek(0) == Some(b'.') {
            self.bump();
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
                while matches!(self.peek(0), Some(b'0'..=b'9')) {
                    self.bump();
                }
            }
        }

        // A number running straight into identifier chars is one
        // identifier (e.g. `1st_table`).
        if matches!(self.peek(0), Some(c) if is_identifier_part(c)) {
            while matches!(self.peek(0), Some(c) if is_identifier_part(c)) {
                self.bump();
            }
            return TokenKind::Identifier;
        }

        TokenKind::Number
    }

    fn lex_quoted_literal(&mut self, prefix: u8) -> TokenKind {
        self.bump(); // x or b
        self.lex_string(b'\'');
        if prefix == b'x' || prefix == b'X' {
            TokenKind::HexNumber
        } else {
            TokenKind::BinNumber
        }
    }

    fn lex_identifier(&mut self) -> TokenKind {
        while matches!(self.peek(0), Some(c) if is_identifier_part(c)) {
            self.bump();
        }

        TokenKind::Identifier
    }

    fn lex_operator(&mut self) -> TokenKind {
        let ch = self.peek(0).unwrap_or(0);
        let two: [Option<u8>; 2] = [self.peek(1), self.peek(2)];

        // Three-char operators first.
        if ch == b'<' && two[0] == Some(b'=') && two[1] == Some(b'>') {
            self.bump();
            self.bump();
            self.bump();
            return TokenKind::Operator;
        }
        if ch == b'-' && two[0] == Some(b'>') && two[1] == Some(b'>') {
            self.bump();
            self.bump();
            self.bump();
            return TokenKind::Operator;
        }

        let pair = (ch, two[0]);
        let double = matches!(
            pair,
            (b'<', Some(b'<' | b'=' | b'>'))
                | (b'>', Some(b'>' | b'='))
                | (b'!', Some(b'='))
                | (b':', Some(b'='))
                | (b'|', Some(b'|'))
                | (b'&', Some(b'&'))
                | (b'-', Some(b'>'))
        );
        if double {
            self.bump();
            self.bump();
            return TokenKind::Operator;
        }

        self.bump();
        match ch {
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'(' => TokenKind::OpenParen,
            b')' => TokenKind::CloseParen,
            b'[' => TokenKind::OpenBracket,
            b']' => TokenKind::CloseBracket,
            b'{' => TokenKind::OpenBrace,
            b'}' => TokenKind::CloseBrace,
            b'?' => TokenKind::ParamMarker,
            b'=' | b'<' | b'>' | b'!' | b'%' | b'*' | b'/' | b'+' | b'-' | b'&' | b'^' | b'|'
            | b'~' | b'@' => TokenKind::Operator,
            _ => TokenKind::Invalid,
        }
    }
}

enum BlockComment {
    Closed,
    Open,
    Version,
}

fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$' || ch >= 0x80
}

fn is_identifier_part(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$' || ch >= 0x80
}

/// Binary search for the token covering `offset`. EOF never matches;
/// past-the-end positions resolve to the last real token (the original
/// quick-info behavior).
pub fn token_from_offset(tokens: &[Token], offset: usize) -> Option<usize> {
    let significant = tokens.len().checked_sub(1)?; // exclude EOF
    if significant == 0 {
        return None;
    }

    let mut low = 0usize;
    let mut high = significant - 1;
    while low < high {
        let middle = low + (high - low + 1) / 2;
        if tokens[middle].start > offset {
            high = middle - 1;
        } else {
            low = middle;
        }
    }

    if tokens[low].start <= offset && offset < tokens[low].stop {
        Some(low)
    } else if offset >= tokens[low].stop {
        Some(low)
    } else {
        None
    }
}

/// Previous default-channel token before `index`.
pub fn previous_default(tokens: &[Token], index: usize) -> Option<&Token> {
    tokens[..index]
        .iter()
        .rev()
        .find(|t| t.channel == TokenChannel::Default)
}
