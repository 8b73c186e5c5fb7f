//! SQLite analysis operations.
//!
//! Mirrors the MySQL services with the SQLite grammar and built-in
//! function catalog. No DELIMITER directives, no version predicates,
//! no secondary engine; LIMIT injection uses LIMIT/OFFSET syntax.

use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::lexer::token_from_offset;
use crate::lexer_sqlite::SqliteTokenProcessor;
use crate::models::enums::{
    QueryType, ServiceLanguage, StatementFinishState, TokenChannel, TokenKind,
};
use crate::models::structs::{ParserError, SymbolDefinition, SymbolInfo, TextSpan, Token};
use crate::services_mysql::{parser_error_to_diagnostic, position_of};
use crate::splitter;
use crate::symbols::SymbolOverlay;

pub struct SqliteParsingServices {
    processor: SqliteTokenProcessor,
}

impl SqliteParsingServices {
    pub fn new() -> Self {
        Self { processor: SqliteTokenProcessor::new() }
    }

    pub fn processor(&self) -> &SqliteTokenProcessor {
        &self.processor
    }

    pub fn tokenize(&self, sql: &str) -> Vec<Token> {
        self.processor.tokenize(sql)
    }

    pub fn determine_query_type(&self, sql: &str) -> QueryType {
        let tokens = self.tokenize(sql);
        self.processor.determine_query_type(&tokens)
    }

    pub fn validate(&self, sql: &str, base_offset: usize) -> Vec<ParserError> {
        let mut errors = Vec::new();

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
            ServiceLanguage::Sqlite,
        ) {
            match span.state {
                StatementFinishState::DelimiterChange => continue,
                StatementFinishState::OpenString => {
                    let at = (span.span.start + span.span.length).saturating_sub(1);
                    let (line, column) = position_of(sql, at);
                    errors.push(ParserError {
                        message: "Unterminated string literal".to_string(),
                        char_offset: base_offset + at,
                        line,
                        offset: column,
                        length: 1,
                    });
                    continue;
                }
                _ => {}
            }

            let mut statement = &sql[span.content_start..span.span.start + span.span.length];
            if span.state == StatementFinishState::Complete {
                if let Some(stripped) = statement.strip_suffix(&span.delimiter) {
                    statement = stripped;
                }
            }
            if statement.trim().is_empty() {
                continue;
            }

            if let Err(error) = Parser::parse_sql(&SQLiteDialect {}, statement) {
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

    /// Quick info resolves against the built-in function catalog only;
    /// SQLite has no system variables or charsets to speak of.
    pub fn quick_info(
        &self,
        sql: &str,
        offset: usize,
        overlay: &SymbolOverlay,
    ) -> Option<SymbolInfo> {
        let tokens = self.tokenize(sql);
        let index = token_from_offset(&tokens, offset)?;
        let token = &tokens[index];
        if !matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword) {
            return None;
        }

        let name = token.text.to_lowercase();
        let descriptor = overlay.lookup(&name)?;
        Some(SymbolInfo {
            kind: descriptor.kind,
            name,
            description: descriptor.description,
            definition: Some(SymbolDefinition {
                text: token.text.clone(),
                span: TextSpan { start: token.start, length: token.len() },
            }),
        })
    }

    /// LIMIT injection, SQLite style: `LIMIT count OFFSET offset`.
    pub fn preprocess_statement(&self, sql: &str, offset: u64, count: u64) -> (String, bool) {
        if !self.validate(sql, 0).is_empty() {
            return (sql.to_string(), false);
        }

        let tokens = self.tokenize(sql);
        if self.processor.determine_query_type(&tokens) != QueryType::Select {
            return (sql.to_string(), false);
        }

        let mut depth = 0usize;
        let mut has_limit = false;
        let mut last_stop = 0usize;
        let mut trailing_semicolon: Option<usize> = None;
        for token in tokens.iter().filter(|t| t.channel == TokenChannel::Default) {
            match token.kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => depth = depth.saturating_sub(1),
                TokenKind::Keyword if depth == 0 && token.upper() == "LIMIT" => has_limit = true,
                TokenKind::Semicolon if depth == 0 => {
                    trailing_semicolon = Some(token.start);
                    continue;
                }
                TokenKind::Eof => continue,
                _ => {}
            }
            last_stop = token.stop;
        }

        if has_limit {
            return (sql.to_string(), false);
        }

        let mut result = sql.to_string();
        let insert_at = trailing_semicolon.unwrap_or(last_stop);
        let suffix = if offset > 0 {
            format!(" LIMIT {count} OFFSET {offset}")
        } else {
            format!(" LIMIT {count}")
        };
        result.insert_str(insert_at, &suffix);

        (result, true)
    }

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
            _ => (sql.to_string(), false),
        }
    }
}

impl Default for SqliteParsingServices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_sqlite_statements() {
        let s = SqliteParsingServices::new();
        assert!(s.validate("SELECT * FROM sqlite_master;", 0).is_empty());
        assert!(!s.validate("SELECT FROM FROM", 0).is_empty());
    }

    #[test]
    fn limit_injection_uses_offset_syntax() {
        let s = SqliteParsingServices::new();
        let (sql, changed) = s.preprocess_statement("SELECT * FROM t", 20, 10);
        assert!(changed);
        assert_eq!(sql, "SELECT * FROM t LIMIT 10 OFFSET 20");

        let (sql, changed) = s.preprocess_statement("SELECT * FROM t", 0, 10);
        assert!(changed);
        assert_eq!(sql, "SELECT * FROM t LIMIT 10");
    }

    #[test]
    fn pragma_is_not_rewritten() {
        let s = SqliteParsingServices::new();
        let (sql, changed) = s.preprocess_statement("PRAGMA journal_mode", 0, 10);
        assert!(!changed);
        assert_eq!(sql, "PRAGMA journal_mode");
    }
}
