//! Scripting-language operations.
//!
//! The embedded Python-like grammar only participates in a subset of
//! the api surface: tokenization (for highlighting), validation
//! (scanner-level diagnostics, indentation errors included) and
//! trivial splitting — a script cell is always one unit; the SQL
//! statement machinery does not apply.

use crate::lexer_python::ScriptLexer;
use crate::models::enums::{QueryType, StatementFinishState};
use crate::models::structs::{ParserError, StatementSpan, TextSpan, Token};

pub struct ScriptParsingServices;

impl ScriptParsingServices {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        ScriptLexer::tokenize(source).tokens
    }

    /// Scanner diagnostics: indentation mismatches and unterminated
    /// strings. Positions shift by `base_offset` like the SQL services.
    pub fn validate(&self, source: &str, base_offset: usize) -> Vec<ParserError> {
        let mut errors = ScriptLexer::tokenize(source).errors;
        for error in &mut errors {
            error.char_offset += base_offset;
        }

        errors
    }

    /// Scripts are not statement-classified.
    pub fn determine_query_type(&self, _source: &str) -> QueryType {
        QueryType::Unknown
    }

    /// One span covering the whole buffer.
    pub fn determine_statement_ranges(&self, source: &str) -> Vec<StatementSpan> {
        if source.is_empty() {
            return Vec::new();
        }

        let content_start = source
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(0);

        vec![StatementSpan {
            delimiter: String::new(),
            span: TextSpan { start: 0, length: source.len() },
            content_start,
            state: StatementFinishState::NoDelimiter,
        }]
    }
}

impl Default for ScriptParsingServices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_one_span() {
        let s = ScriptParsingServices::new();
        let spans = s.determine_statement_ranges("a = 1; b = 2\nprint(a)\n");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span.length, 22);
    }

    #[test]
    fn indentation_errors_become_diagnostics() {
        let s = ScriptParsingServices::new();
        let errors = s.validate("if x:\n        a\n    b\n", 100);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].char_offset >= 100);
    }
}
