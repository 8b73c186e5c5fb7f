//! MySQL analysis operations.
//!
//! The per-request entry points the worker dispatches to: validation,
//! quick info, statement preprocessing, semicolon fixup, parameter
//! extraction and tokenization. Stateless given their inputs; the
//! external grammar (sqlparser's MySQL dialect) is consulted in
//! error-collecting fashion, statement by statement, so one broken
//! statement doesn't hide diagnostics in the next.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::lexer::{previous_default, token_from_offset};
use crate::lexer_mysql::MySqlTokenProcessor;
use crate::models::enums::{
    QueryType, ServiceLanguage, StatementFinishState, SymbolKind, TokenChannel, TokenKind,
};
use crate::models::structs::{ParserError, SymbolDefinition, SymbolInfo, Token};
use crate::splitter;
use crate::symbols::SymbolOverlay;

static ERROR_POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Line:?\s*(\d+),\s*Column:?\s*(\d+)").expect("static regex"));

pub struct MySqlParsingServices {
    processor: MySqlTokenProcessor,
}

impl MySqlParsingServices {
    pub fn new(server_version: u32, sql_mode: &str) -> Self {
        Self { processor: MySqlTokenProcessor::new(server_version, sql_mode) }
    }

    pub fn processor(&self) -> &MySqlTokenProcessor {
        &self.processor
    }

    /// Full post-processed token list, as used by every other operation.
    pub fn tokenize(&self, sql: &str) -> Vec<Token> {
        self.processor.tokenize(sql)
    }

    pub fn determine_query_type(&self, sql: &str) -> QueryType {
        let tokens = self.tokenize(sql);
        self.processor.determine_query_type(&tokens)
    }

    /// Error check in collecting mode. Positions are shifted by
    /// `base_offset` so a single statement can be validated in the
    /// context of a larger buffer.
    pub fn validate(&self, sql: &str, base_offset: usize) -> Vec<ParserError> {
        let mut errors = Vec::new();

        // Scanner-level findings first: an unfinished block comment
        // never reaches the parser as anything useful.
        let tokens = self.tokenize(sql);
        for token in &tokens {
            if token.kind == TokenKind::OpenBlockComment {
                errors.push(ParserError {
                    message: "Unfinished multi line comment".to_string(),
                    char_offset: base_offset + token.start,
                    line: token.line,
                    offset: token.column,
                    length: token.len().min(100),
                });
            }
        }

        for span in splitter::determine_statement_ranges(
            sql,
            splitter::DEFAULT_DELIMITER,
            ServiceLanguage::MySql,
        ) {
            match span.state {
                StatementFinishState::DelimiterChange => continue,
                StatementFinishState::OpenString => {
                    let at = span.span.start + span.span.length;
                    let (line, column) = position_of(sql, at.saturating_sub(1));
                    errors.push(ParserError {
                        message: "Unterminated string literal".to_string(),
                        char_offset: base_offset + at.saturating_sub(1),
                        line,
                        offset: column,
                        length: 1,
                    });
                    continue;
                }
                _ => {}
            }

            let mut statement =
                &sql[span.content_start..span.span.start + span.span.length];
            if span.state == StatementFinishState::Complete {
                if let Some(stripped) = statement.strip_suffix(&span.delimiter) {
                    statement = stripped;
                }
            }
            if statement.trim().is_empty() {
                continue;
            }

            if let Err(error) = Parser::parse_sql(&MySqlDialect {}, statement) {
                errors.push(parser_error_to_diagnostic(
                    &error.to_string(),
                    statement,
                    span.content_start,
                    base_offset,
                ));
            }
        }

        errors
    }

    /// Information about the symbol at the given offset, resolved from
    /// the symbol overlay: system variables (bare, `@@`-prefixed or
    /// GLOBAL/SESSION qualified), system functions, character sets and
    /// data types.
    pub fn quick_info(
        &self,
        sql: &str,
        offset: usize,
        overlay: &SymbolOverlay,
    ) -> Option<SymbolInfo> {
        let tokens = self.tokenize(sql);
        let index = token_from_offset(&tokens, offset)?;
        let token = &tokens[index];
        let lower = token.text.to_lowercase();

        match token.kind {
            TokenKind::AtAtVariable => {
                let name = lower.trim_start_matches('@').to_string();
                // `@@global.x` arrives as three tokens; resolve the
                // variable after the dot instead of the qualifier.
                if matches!(name.as_str(), "global" | "session" | "local") {
                    let qualified = tokens
                        .get(index + 1)
                        .filter(|t| t.kind == TokenKind::Dot)
                        .and_then(|_| tokens.get(index + 2));
                    if let Some(variable) = qualified {
                        return self.variable_info(overlay, variable);
                    }
                }

                let descriptor = overlay.lookup_kind(&name, SymbolKind::SystemVariable)?;
                Some(SymbolInfo {
                    kind: descriptor.kind,
                    name: name.clone(),
                    description: descriptor.description,
                    definition: Some(SymbolDefinition {
                        text: token.text.clone(),
                        span: crate::models::structs::TextSpan {
                            start: token.start,
                            length: token.len(),
                        },
                    }),
                })
            }

            TokenKind::Identifier | TokenKind::BackTickIdentifier => {
                // A variable qualified as GLOBAL.x / SESSION.x?
                if let Some(previous) = previous_default(&tokens, index) {
                    if previous.kind == TokenKind::Dot {
                        return self.variable_info(overlay, token);
                    }
                }

                self.generic_info(overlay, token)
            }

            TokenKind::Keyword => self.generic_info(overlay, token),

            _ => None,
        }
    }

    fn variable_info(&self, overlay: &SymbolOverlay, token: &Token) -> Option<SymbolInfo> {
        let name = crate::completion::unquote(&token.text).to_lowercase();
        let descriptor = overlay.lookup_kind(&name, SymbolKind::SystemVariable)?;
        Some(SymbolInfo {
            kind: descriptor.kind,
            name,
            description: descriptor.description,
            definition: Some(SymbolDefinition {
                text: token.text.clone(),
                span: crate::models::structs::TextSpan { start: token.start, length: token.len() },
            }),
        })
    }

    fn generic_info(&self, overlay: &SymbolOverlay, token: &Token) -> Option<SymbolInfo> {
        let name = crate::completion::unquote(&token.text).to_lowercase();
        let descriptor = overlay.lookup(&name)?;
        Some(SymbolInfo {
            kind: descriptor.kind,
            name,
            description: descriptor.description,
            definition: Some(SymbolDefinition {
                text: token.text.clone(),
                span: crate::models::structs::TextSpan { start: token.start, length: token.len() },
            }),
        })
    }

    /// Rewrite a query before execution: add a top-level LIMIT when
    /// there is none, and optionally force the secondary engine via an
    /// optimizer hint. Queries with syntax errors come back unchanged.
    pub fn preprocess_statement(
        &self,
        sql: &str,
        offset: u64,
        count: u64,
        force_secondary_engine: bool,
    ) -> (String, bool) {
        if !self.validate(sql, 0).is_empty() {
            return (sql.to_string(), false);
        }

        let tokens = self.tokenize(sql);
        let query_type = self.processor.determine_query_type(&tokens);
        if !matches!(query_type, QueryType::Select | QueryType::Table | QueryType::Values) {
            return (sql.to_string(), false);
        }

        let stream: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.channel == TokenChannel::Default && t.kind != TokenKind::Eof)
            .collect();

        // A LIMIT at parenthesis depth zero is a top-level LIMIT;
        // anything inside parentheses belongs to a subquery.
        let mut depth = 0usize;
        let mut has_limit = false;
        let mut last_stop = 0usize;
        let mut trailing_semicolon: Option<usize> = None;
        for token in &stream {
            match token.kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => depth = depth.saturating_sub(1),
                TokenKind::Keyword if depth == 0 && token.upper() == "LIMIT" => {
                    has_limit = true;
                }
                TokenKind::Semicolon if depth == 0 => {
                    trailing_semicolon = Some(token.start);
                    last_stop = token.start;
                    continue;
                }
                _ => {}
            }
            last_stop = token.stop;
        }

        let mut result = sql.to_string();
        let mut changed = false;

        if !has_limit {
            let insert_at = trailing_semicolon.unwrap_or(last_stop);
            result.insert_str(insert_at, &format!(" LIMIT {offset}, {count}"));
            changed = true;
        }

        if force_secondary_engine {
            if let Some(select) = stream
                .iter()
                .find(|t| t.kind == TokenKind::Keyword && t.upper() == "SELECT")
            {
                result.insert_str(
                    select.stop,
                    " /*+ SET_VAR(use_secondary_engine = FORCED) */",
                );
                changed = true;
            }
        }

        (result, changed)
    }

    /// Append a semicolon when the statement has none. Trailing hidden
    /// tokens (comments) stay behind the inserted delimiter.
    pub fn check_and_add_semicolon(&self, sql: &str) -> (String, bool) {
        if !self.validate(sql, 0).is_empty() {
            return (sql.to_string(), false);
        }

        let tokens = self.tokenize(sql);
        let last = tokens
            .iter()
            .rev()
            .find(|t| t.channel == TokenChannel::Default && t.kind != TokenKind::Eof);

        match last {
            Some(token) if token.kind != TokenKind::Semicolon => {
                let mut result = sql.to_string();
                result.insert(token.stop, ';');
                (result, true)
            }
            Some(_) => (sql.to_string(), false),
            None => (sql.to_string(), false),
        }
    }

    /// Find embedded parameters in comments, like
    /// `select * from actor where actor_id = ? /*:name=value*/`.
    /// Returns (name, value) pairs; both parts can be empty.
    pub fn extract_query_parameters(&self, sql: &str) -> Vec<(String, String)> {
        let mut result = Vec::new();

        for token in self.tokenize(sql) {
            let body = match token.kind {
                TokenKind::LineComment if token.text.starts_with('#') => {
                    token.text[1..].to_string()
                }
                TokenKind::BlockComment => {
                    let inner = token.text.trim_start_matches("/*");
                    inner.trim_end_matches("*/").to_string()
                }
                _ => continue,
            };

            if body.is_empty() {
                continue;
            }

            match body.as_bytes()[0] {
                b'=' => result.push((String::new(), body[1..].to_string())),
                b':' => {
                    if let Some(eq) = body.find('=') {
                        result.push((body[1..eq].to_string(), body[eq + 1..].to_string()));
                    }
                }
                _ => {}
            }
        }

        result
    }
}

/// Lift a sqlparser error message into a positioned diagnostic. The
/// message carries "Line: N, Column: M" when the tokenizer or parser
/// knew where it was; positions are 1-based and relative to the
/// statement, so they get rebased onto the surrounding buffer.
pub fn parser_error_to_diagnostic(
    message: &str,
    statement: &str,
    statement_start: usize,
    base_offset: usize,
) -> ParserError {
    let (line, column) = ERROR_POSITION
        .captures(message)
        .and_then(|captures| {
            let line = captures.get(1)?.as_str().parse::<u32>().ok()?;
            let column = captures.get(2)?.as_str().parse::<u32>().ok()?;
            Some((line, column.saturating_sub(1)))
        })
        .unwrap_or((1, 0));

    let local_offset = offset_for_position(statement, line, column);

    ParserError {
        message: message.to_string(),
        char_offset: base_offset + statement_start + local_offset,
        line,
        offset: column,
        length: 1,
    }
}

/// Byte offset of a 1-based line / 0-based column pair.
pub fn offset_for_position(text: &str, line: u32, column: u32) -> usize {
    let mut remaining = line.saturating_sub(1);
    let mut offset = 0usize;
    for (index, byte) in text.bytes().enumerate() {
        if remaining == 0 {
            return (index + column as usize).min(text.len());
        }
        if byte == b'\n' {
            remaining -= 1;
            offset = index + 1;
        }
    }

    (offset + column as usize).min(text.len())
}

/// 1-based line and 0-based column of a byte offset.
pub fn position_of(text: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut column = 0u32;
    for byte in text.bytes().take(offset.min(text.len())) {
        if byte == b'\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }

    (line, column)
}
