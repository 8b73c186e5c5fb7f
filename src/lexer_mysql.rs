//! MySQL token post-processing.
//!
//! Wraps the raw scanner output for the MySQL dialect: identifier-shaped
//! tokens whose text is in the active `(dialect, version)` keyword set
//! are reclassified as keywords, and the leading-token query type
//! scanner lives here. Composed with the scanner by delegation; one
//! strategy object per dialect.

use std::collections::HashSet;

use crate::keywords::{self, KeywordSet};
use crate::lexer::{LexerConfig, SqlLexer};
use crate::models::enums::{MySqlVersion, QueryType, SqlMode, TokenChannel, TokenKind};
use crate::models::structs::Token;

pub struct MySqlTokenProcessor {
    version: MySqlVersion,
    server_version: u32,
    sql_modes: HashSet<SqlMode>,
}

impl MySqlTokenProcessor {
    pub fn new(server_version: u32, sql_mode: &str) -> Self {
        Self {
            version: MySqlVersion::from_number(server_version),
            server_version,
            sql_modes: SqlMode::set_from_string(sql_mode),
        }
    }

    pub fn config(&self) -> LexerConfig {
        LexerConfig::mysql(self.server_version, "")
            .with_modes(self.sql_modes.clone())
    }

    fn keyword_set(&self) -> &'static KeywordSet {
        keywords::keyword_set(crate::models::enums::ServiceLanguage::MySql, self.version)
    }

    /// Scan and post-process a buffer in one go.
    pub fn tokenize(&self, sql: &str) -> Vec<Token> {
        self.process(SqlLexer::tokenize(sql, self.config()))
    }

    /// Reclassify identifier-shaped tokens against the keyword table.
    pub fn process(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        let set = self.keyword_set();
        for token in &mut tokens {
            if token.kind == TokenKind::Identifier && set.is_keyword(&token.text) {
                token.kind = TokenKind::Keyword;
            }
        }

        tokens
    }

    /// True when the token can act as an identifier under the active
    /// version and SQL modes: plain and quoted identifiers always,
    /// double-quoted text only with AnsiQuotes, non-reserved keywords.
    pub fn is_identifier(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Identifier | TokenKind::BackTickIdentifier => true,
            TokenKind::QuotedIdentifier => true,
            TokenKind::DoubleQuotedText => self.sql_modes.contains(&SqlMode::AnsiQuotes),
            TokenKind::Keyword => !self.keyword_set().is_reserved(&token.text),
            _ => false,
        }
    }

    /// Classify the leading statement by its first keywords.
    pub fn determine_query_type(&self, tokens: &[Token]) -> QueryType {
        let stream: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.channel == TokenChannel::Default && t.kind != TokenKind::Eof)
            .collect();
        let mut cursor = stream.into_iter();

        let Some(first) = cursor.next() else {
            return QueryType::Unknown;
        };
        if first.kind != TokenKind::Keyword {
            return QueryType::Unknown;
        }

        match first.upper().as_str() {
            "ALTER" => {
                let Some(second) = cursor.next() else {
                    return QueryType::Ambiguous;
                };
                match second.upper().as_str() {
                    "DATABASE" | "SCHEMA" => QueryType::AlterDatabase,
                    "EVENT" => QueryType::AlterEvent,
                    "FUNCTION" => QueryType::AlterFunction,
                    "PROCEDURE" => QueryType::AlterProcedure,
                    "SERVER" => QueryType::AlterServer,
                    // ONLINE/OFFLINE/IGNORE are optional ALTER TABLE noise.
                    "TABLE" | "ONLINE" | "OFFLINE" | "IGNORE" => QueryType::AlterTable,
                    "TABLESPACE" => QueryType::AlterTablespace,
                    "USER" => QueryType::AlterUser,
                    "VIEW" | "ALGORITHM" => QueryType::AlterView,
                    "DEFINER" => {
                        if !skip_definer(&mut cursor) {
                            return QueryType::Ambiguous;
                        }
                        match cursor.next().map(|t| t.upper()).as_deref() {
                            Some("EVENT") => QueryType::AlterEvent,
                            Some("SQL") | Some("VIEW") => QueryType::AlterView,
                            _ => QueryType::Unknown,
                        }
                    }
                    _ => QueryType::Unknown,
                }
            }

            "CREATE" => {
                let Some(second) = cursor.next() else {
                    return QueryType::Ambiguous;
                };
                match second.upper().as_str() {
                    "TEMPORARY" | "TABLE" => QueryType::CreateTable,
                    "ONLINE" | "OFFLINE" | "INDEX" | "UNIQUE" | "FULLTEXT" | "SPATIAL" => {
                        QueryType::CreateIndex
                    }
                    "DATABASE" | "SCHEMA" => QueryType::CreateDatabase,
                    "TRIGGER" => QueryType::CreateTrigger,
                    "EVENT" => QueryType::CreateEvent,
                    "VIEW" | "OR" | "ALGORITHM" => QueryType::CreateView,
                    "PROCEDURE" => QueryType::CreateProcedure,
                    "FUNCTION" | "AGGREGATE" => QueryType::CreateFunction,
                    "USER" | "ROLE" => QueryType::CreateUser,
                    "DEFINER" => {
                        if !skip_definer(&mut cursor) {
                            return QueryType::Ambiguous;
                        }
                        match cursor.next().map(|t| t.upper()).as_deref() {
                            Some("EVENT") => QueryType::CreateEvent,
                            Some("VIEW") | Some("SQL") => QueryType::CreateView,
                            Some("PROCEDURE") => QueryType::CreateProcedure,
                            Some("FUNCTION") => QueryType::CreateFunction,
                            Some("TRIGGER") => QueryType::CreateTrigger,
                            _ => QueryType::Unknown,
                        }
                    }
                    _ => QueryType::Unknown,
                }
            }

            "DROP" => {
                let Some(second) = cursor.next() else {
                    return QueryType::Ambiguous;
                };
                match second.upper().as_str() {
                    "DATABASE" | "SCHEMA" => QueryType::DropDatabase,
                    "EVENT" => QueryType::DropEvent,
                    "FUNCTION" => QueryType::DropFunction,
                    "PROCEDURE" => QueryType::DropProcedure,
                    "INDEX" | "ONLINE" | "OFFLINE" => QueryType::DropIndex,
                    "TEMPORARY" | "TABLE" | "TABLES" => QueryType::DropTable,
                    "TRIGGER" => QueryType::DropTrigger,
                    "USER" | "ROLE" => QueryType::DropUser,
                    "VIEW" => QueryType::DropView,
                    _ => QueryType::Unknown,
                }
            }

            "RENAME" => QueryType::RenameTable,
            "TRUNCATE" => QueryType::TruncateTable,
            "CALL" => QueryType::Call,
            "DELETE" => QueryType::Delete,
            "DO" => QueryType::Do,
            "INSERT" => QueryType::Insert,
            "LOAD" => QueryType::LoadData,
            "REPLACE" => QueryType::Replace,
            "SELECT" | "WITH" => QueryType::Select,
            "TABLE" => QueryType::Table,
            "VALUES" => QueryType::Values,
            "UPDATE" => QueryType::Update,

            "START" => QueryType::StartTransaction,
            "BEGIN" => QueryType::BeginWork,
            "COMMIT" => QueryType::Commit,
            "ROLLBACK" => {
                // ROLLBACK TO SAVEPOINT stays a rollback for our purposes.
                QueryType::RollbackWork
            }
            "SAVEPOINT" => QueryType::Savepoint,
            "RELEASE" => QueryType::ReleaseSavepoint,
            "LOCK" => QueryType::Lock,
            "UNLOCK" => QueryType::Unlock,
            "XA" => QueryType::Xa,

            "GRANT" => QueryType::Grant,
            "REVOKE" => QueryType::Revoke,
            "ANALYZE" => QueryType::AnalyzeTable,
            "CHECK" => QueryType::CheckTable,
            "OPTIMIZE" => QueryType::OptimizeTable,
            "REPAIR" => QueryType::RepairTable,
            "SET" => QueryType::Set,
            "FLUSH" => QueryType::Flush,
            "KILL" => QueryType::Kill,
            "HELP" => QueryType::Help,
            "USE" => QueryType::Use,

            "SHOW" => self.classify_show(&mut cursor),

            "EXPLAIN" | "DESCRIBE" | "DESC" => {
                let Some(second) = cursor.next() else {
                    return QueryType::Ambiguous;
                };
                if self.is_identifier(second) || second.kind == TokenKind::Dot {
                    return QueryType::ExplainTable;
                }
                match second.upper().as_str() {
                    "EXTENDED" => match cursor.next().map(|t| t.upper()).as_deref() {
                        Some("DELETE") | Some("INSERT") | Some("REPLACE") | Some("UPDATE")
                        | Some("SELECT") => QueryType::ExplainStatement,
                        _ => QueryType::ExplainTable,
                    },
                    _ => QueryType::ExplainStatement,
                }
            }

            _ => QueryType::Unknown,
        }
    }

    fn classify_show<'a, I>(&self, cursor: &mut I) -> QueryType
    where
        I: Iterator<Item = &'a Token>,
    {
        let Some(mut token) = cursor.next() else {
            return QueryType::Show;
        };

        // Not every SHOW allows FULL, but classification is about the
        // most likely type, not validity.
        if token.upper() == "FULL" {
            match cursor.next() {
                Some(next) => token = next,
                None => return QueryType::ShowProcessList,
            }
        }

        match token.upper().as_str() {
            "GLOBAL" | "SESSION" | "LOCAL" => match cursor.next().map(|t| t.upper()).as_deref() {
                Some("STATUS") => QueryType::ShowStatus,
                _ => QueryType::ShowVariables,
            },
            "COLUMNS" | "FIELDS" => QueryType::ShowColumns,
            "CREATE" => match cursor.next().map(|t| t.upper()).as_deref() {
                Some("TABLE") => QueryType::ShowCreateTable,
                _ => QueryType::Show,
            },
            "DATABASES" | "SCHEMAS" => QueryType::ShowDatabases,
            "GRANTS" => QueryType::ShowGrants,
            "PROCESSLIST" => QueryType::ShowProcessList,
            "STATUS" => QueryType::ShowStatus,
            "VARIABLES" => QueryType::ShowVariables,
            "TABLES" => QueryType::ShowTables,
            _ => QueryType::Show,
        }
    }
}

/// Streaming form of the post-processor: delegates to the raw scanner
/// and reclassifies each token on the way out. `reset()` rewinds the
/// underlying scanner.
pub struct MySqlTokenStream<'a> {
    lexer: SqlLexer<'a>,
    set: &'static KeywordSet,
}

impl<'a> MySqlTokenStream<'a> {
    pub fn new(sql: &'a str, processor: &MySqlTokenProcessor) -> Self {
        Self {
            lexer: SqlLexer::new(sql, processor.config()),
            set: processor.keyword_set(),
        }
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

/// Skips a DEFINER clause: `= CURRENT_USER[()]` or `= user[@host]`.
/// The DEFINER word itself has been consumed. Returns false when the
/// clause doesn't parse; the cursor state is then undetermined.
fn skip_definer<'a, I>(cursor: &mut I) -> bool
where
    I: Iterator<Item = &'a Token>,
{
    let Some(eq) = cursor.next() else {
        return false;
    };
    if !(eq.kind == TokenKind::Operator && eq.text == "=") {
        return false;
    }

    let Some(user) = cursor.next() else {
        return false;
    };
    if user.upper() == "CURRENT_USER" {
        return true;
    }

    if user.kind.is_identifier_shaped()
        || user.kind == TokenKind::SingleQuotedText
        || user.kind == TokenKind::Keyword
    {
        // Optional @host part comes through as an AtVariable token.
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> MySqlTokenProcessor {
        MySqlTokenProcessor::new(80031, "")
    }

    #[test]
    fn reclassifies_keywords() {
        let tokens = processor().tokenize("SELECT actor_id FROM actor");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
    }

    #[test]
    fn insert_is_detected() {
        let p = processor();
        let tokens = p.tokenize("INSERT INTO t VALUES (1)");
        assert_eq!(p.determine_query_type(&tokens), QueryType::Insert);
    }

    #[test]
    fn leading_comment_is_skipped() {
        let p = processor();
        let tokens = p.tokenize("/* hello */ UPDATE t SET a = 1");
        assert_eq!(p.determine_query_type(&tokens), QueryType::Update);
    }

    #[test]
    fn empty_input_is_unknown() {
        let p = processor();
        assert_eq!(p.determine_query_type(&p.tokenize("")), QueryType::Unknown);
        assert_eq!(p.determine_query_type(&p.tokenize("-- note\n")), QueryType::Unknown);
    }

    #[test]
    fn alter_families() {
        let p = processor();
        let t = p.tokenize("ALTER TABLE t ADD COLUMN c INT");
        assert_eq!(p.determine_query_type(&t), QueryType::AlterTable);
        let t = p.tokenize("ALTER DEFINER = CURRENT_USER VIEW v AS SELECT 1");
        assert_eq!(p.determine_query_type(&t), QueryType::AlterView);
    }

    #[test]
    fn show_families() {
        let p = processor();
        let t = p.tokenize("SHOW FULL PROCESSLIST");
        assert_eq!(p.determine_query_type(&t), QueryType::ShowProcessList);
        let t = p.tokenize("SHOW CREATE TABLE t");
        assert_eq!(p.determine_query_type(&t), QueryType::ShowCreateTable);
        let t = p.tokenize("SHOW GLOBAL VARIABLES");
        assert_eq!(p.determine_query_type(&t), QueryType::ShowVariables);
    }

    #[test]
    fn streaming_and_batch_forms_agree() {
        let p = processor();
        let sql = "SELECT engine FROM t";
        let batch = p.tokenize(sql);

        let mut stream = MySqlTokenStream::new(sql, &p);
        let mut streamed = Vec::new();
        loop {
            let token = stream.next_token();
            let done = token.kind == TokenKind::Eof;
            streamed.push(token);
            if done {
                break;
            }
        }

        assert_eq!(batch, streamed);
    }

    #[test]
    fn non_reserved_keyword_counts_as_identifier() {
        let p = processor();
        let tokens = p.tokenize("SELECT engine FROM information_schema.engines");
        let engine = tokens.iter().find(|t| t.text == "engine").unwrap();
        assert_eq!(engine.kind, TokenKind::Keyword);
        assert!(p.is_identifier(engine));
    }
}
