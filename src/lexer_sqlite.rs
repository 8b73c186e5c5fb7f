//! SQLite token post-processing.
//!
//! Same shape as the MySQL strategy, with the smaller version-less
//! keyword table and the SQLite statement families (ATTACH, PRAGMA,
//! VACUUM, ...). SQLite has no DEFINER clauses, no SHOW and no
//! version comments, which keeps the scanner short.

use crate::keywords::{self, KeywordSet};
use crate::lexer::{LexerConfig, SqlLexer};
use crate::models::enums::{MySqlVersion, QueryType, ServiceLanguage, TokenChannel, TokenKind};
use crate::models::structs::Token;

pub struct SqliteTokenProcessor;

impl SqliteTokenProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn config(&self) -> LexerConfig {
        LexerConfig::sqlite()
    }

    fn keyword_set(&self) -> &'static KeywordSet {
        keywords::keyword_set(ServiceLanguage::Sqlite, MySqlVersion::Unknown)
    }

    pub fn tokenize(&self, sql: &str) -> Vec<Token> {
        self.process(SqlLexer::tokenize(sql, self.config()))
    }

    pub fn process(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        let set = self.keyword_set();
        for token in &mut tokens {
            if token.kind == TokenKind::Identifier && set.is_keyword(&token.text) {
                token.kind = TokenKind::Keyword;
            }
        }

        tokens
    }

    pub fn is_identifier(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Identifier
            | TokenKind::QuotedIdentifier
            | TokenKind::BackTickIdentifier
            | TokenKind::BracketIdentifier => true,
            TokenKind::Keyword => !self.keyword_set().is_reserved(&token.text),
            _ => false,
        }
    }

    pub fn determine_query_type(&self, tokens: &[Token]) -> QueryType {
        let mut cursor = tokens
            .iter()
            .filter(|t| t.channel == TokenChannel::Default && t.kind != TokenKind::Eof);

        let Some(first) = cursor.next() else {
            return QueryType::Unknown;
        };
        if first.kind != TokenKind::Keyword {
            return QueryType::Unknown;
        }

        match first.upper().as_str() {
            "ALTER" => QueryType::AlterTable,
            "ANALYZE" => QueryType::AnalyzeTable,
            "ATTACH" => QueryType::Attach,
            "BEGIN" => QueryType::BeginWork,
            "COMMIT" | "END" => QueryType::Commit,
            "CREATE" => {
                let Some(second) = cursor.next() else {
                    return QueryType::Ambiguous;
                };
                match second.upper().as_str() {
                    "TEMP" | "TEMPORARY" | "TABLE" => QueryType::CreateTable,
                    "UNIQUE" | "INDEX" => QueryType::CreateIndex,
                    "TRIGGER" => QueryType::CreateTrigger,
                    "VIEW" => QueryType::CreateView,
                    "VIRTUAL" => QueryType::CreateTable,
                    _ => QueryType::Unknown,
                }
            }
            "DELETE" => QueryType::Delete,
            "DETACH" => QueryType::Detach,
            "DROP" => {
                let Some(second) = cursor.next() else {
                    return QueryType::Ambiguous;
                };
                match second.upper().as_str() {
                    "TABLE" => QueryType::DropTable,
                    "INDEX" => QueryType::DropIndex,
                    "TRIGGER" => QueryType::DropTrigger,
                    "VIEW" => QueryType::DropView,
                    _ => QueryType::Unknown,
                }
            }
            "EXPLAIN" => QueryType::ExplainStatement,
            "INSERT" | "REPLACE" => {
                if first.upper() == "REPLACE" {
                    QueryType::Replace
                } else {
                    QueryType::Insert
                }
            }
            "PRAGMA" => QueryType::Pragma,
            "REINDEX" => QueryType::Reindex,
            "RELEASE" => QueryType::ReleaseSavepoint,
            "ROLLBACK" => QueryType::RollbackWork,
            "SAVEPOINT" => QueryType::Savepoint,
            "SELECT" | "WITH" | "VALUES" => {
                if first.upper() == "VALUES" {
                    QueryType::Values
                } else {
                    QueryType::Select
                }
            }
            "UPDATE" => QueryType::Update,
            "VACUUM" => QueryType::Vacuum,
            _ => QueryType::Unknown,
        }
    }
}

impl Default for SqliteTokenProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming post-processor over the raw scanner.
pub struct SqliteTokenStream<'a> {
    lexer: SqlLexer<'a>,
    set: &'static KeywordSet,
}

impl<'a> SqliteTokenStream<'a> {
    pub fn new(sql: &'a str, processor: &SqliteTokenProcessor) -> Self {
        Self { lexer: SqlLexer::new(sql, processor.config()), set: processor.keyword_set() }
    }

    pub fn next_token(&mut self) -> Token {
        let mut token = self.lexer.next_token();
        if token.kind == TokenKind::Identifier && self.set.is_keyword(&token.text) {
            token.kind = TokenKind::Keyword;
        }

        token
    }

    pub fn reset(&mut self) {
        self.lexer.reset();
    }
}
