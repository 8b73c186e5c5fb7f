//! Code completion.
//!
//! Classifies the grammar context at the caret from the token stream,
//! then merges three candidate sources: keyword lists from the active
//! dialect table, system symbols from the registry overlay, and live
//! schema objects awaited from the embedding IDE's `SchemaProvider`.

use async_trait::async_trait;
use log::debug;

use crate::errors::SchemaError;
use crate::models::enums::{
    CompletionKind, MySqlVersion, ServiceLanguage, SymbolKind, TokenChannel, TokenKind,
};
use crate::models::structs::{CompletionCandidate, CompletionData, Token};
use crate::symbols::SymbolOverlay;

/// Live schema metadata, resolved by the host against its connection.
/// Completion awaits these; a slow provider delays only its own task.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn schemas(&self) -> Result<Vec<String>, SchemaError>;
    async fn tables(&self, schema: &str) -> Result<Vec<String>, SchemaError>;
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<String>, SchemaError>;
}

/// Provider for contexts without a connection: everything resolves to
/// empty lists.
pub struct NullSchemaProvider;

#[async_trait]
impl SchemaProvider for NullSchemaProvider {
    async fn schemas(&self) -> Result<Vec<String>, SchemaError> {
        Ok(Vec::new())
    }

    async fn tables(&self, _schema: &str) -> Result<Vec<String>, SchemaError> {
        Ok(Vec::new())
    }

    async fn columns(&self, _schema: &str, _table: &str) -> Result<Vec<String>, SchemaError> {
        Ok(Vec::new())
    }
}

/// Keywords that open a statement, offered on an empty context.
const STATEMENT_START_KEYWORDS: &[&str] = &[
    "ALTER", "ANALYZE", "BEGIN", "CALL", "COMMIT", "CREATE", "DELETE", "DESCRIBE", "DROP",
    "EXPLAIN", "GRANT", "INSERT", "LOCK", "OPTIMIZE", "RENAME", "REPLACE", "REVOKE", "ROLLBACK",
    "SELECT", "SET", "SHOW", "START", "TRUNCATE", "UPDATE", "USE", "WITH",
];

const SQLITE_START_KEYWORDS: &[&str] = &[
    "ALTER", "ANALYZE", "ATTACH", "BEGIN", "COMMIT", "CREATE", "DELETE", "DETACH", "DROP",
    "EXPLAIN", "INSERT", "PRAGMA", "REINDEX", "REPLACE", "ROLLBACK", "SAVEPOINT", "SELECT",
    "UPDATE", "VACUUM", "WITH",
];

/// Keywords usable inside an expression or clause position.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "DESC", "DISTINCT", "ELSE", "END", "EXISTS",
    "FROM", "GROUP", "HAVING", "IN", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "ON",
    "OR", "ORDER", "RIGHT", "THEN", "UNION", "WHEN", "WHERE",
];

/// What the caret's surroundings ask for.
#[derive(Clone, PartialEq, Eq, Debug)]
enum CompletionContext {
    StatementStart,
    TableReference,
    /// After `qualifier.` — members of a schema or table.
    QualifiedName(String),
    Expression,
    SystemVariable,
    UserVariable,
}

pub struct CompletionRequest<'a> {
    pub sql: &'a str,
    pub tokens: &'a [Token],
    pub offset: usize,
    pub language: ServiceLanguage,
    pub version: MySqlVersion,
    pub current_schema: String,
}

/// Collect completion candidates at the request offset.
pub async fn collect_completions(
    request: &CompletionRequest<'_>,
    overlay: &SymbolOverlay,
    provider: &dyn SchemaProvider,
) -> CompletionData {
    let mut data = CompletionData::default();

    let context = classify_context(request);
    debug!("completion context at {}: {:?}", request.offset, context);

    data.is_quoted = word_is_quoted(request);
    data.tables = table_references(request.tokens)
        .into_iter()
        .map(|r| r.alias.unwrap_or(r.table))
        .collect();

    match context {
        CompletionContext::StatementStart => {
            let starters = if request.language == ServiceLanguage::Sqlite {
                SQLITE_START_KEYWORDS
            } else {
                STATEMENT_START_KEYWORDS
            };
            data.keywords = starters.iter().map(|s| s.to_string()).collect();
        }

        CompletionContext::TableReference => {
            let mut candidate = CompletionCandidate {
                kind: CompletionKind::Table,
                schemas: vec![request.current_schema.clone()],
                tables: Vec::new(),
                names: Vec::new(),
            };
            if let Ok(tables) = provider.tables(&request.current_schema).await {
                candidate.names = tables;
            }
            data.candidates.push(candidate);

            let mut schemas = CompletionCandidate {
                kind: CompletionKind::Schema,
                schemas: Vec::new(),
                tables: Vec::new(),
                names: Vec::new(),
            };
            if let Ok(names) = provider.schemas().await {
                schemas.names = names;
            }
            data.candidates.push(schemas);
        }

        CompletionContext::QualifiedName(qualifier) => {
            // The qualifier is either a schema or a table (alias).
            let schemas = provider.schemas().await.unwrap_or_default();
            if schemas.iter().any(|s| s.eq_ignore_ascii_case(&qualifier)) {
                let mut candidate = CompletionCandidate {
                    kind: CompletionKind::Table,
                    schemas: vec![qualifier.clone()],
                    tables: Vec::new(),
                    names: Vec::new(),
                };
                if let Ok(tables) = provider.tables(&qualifier).await {
                    candidate.names = tables;
                }
                data.candidates.push(candidate);
            } else {
                let table = resolve_alias(request.tokens, &qualifier);
                let mut candidate = CompletionCandidate {
                    kind: CompletionKind::Column,
                    schemas: vec![request.current_schema.clone()],
                    tables: vec![table.clone()],
                    names: Vec::new(),
                };
                if let Ok(columns) = provider.columns(&request.current_schema, &table).await {
                    candidate.names = columns;
                }
                data.candidates.push(candidate);
            }
        }

        CompletionContext::Expression => {
            data.keywords = EXPRESSION_KEYWORDS.iter().map(|s| s.to_string()).collect();
            data.functions = overlay.names_of_kind(SymbolKind::SystemFunction);

            // Columns of every referenced table.
            let references = table_references(request.tokens);
            for reference in &references {
                let mut candidate = CompletionCandidate {
                    kind: CompletionKind::Column,
                    schemas: vec![reference
                        .schema
                        .clone()
                        .unwrap_or_else(|| request.current_schema.clone())],
                    tables: vec![reference.table.clone()],
                    names: Vec::new(),
                };
                let schema = candidate.schemas[0].clone();
                if let Ok(columns) = provider.columns(&schema, &reference.table).await {
                    candidate.names = columns;
                }
                data.candidates.push(candidate);
            }

            if request.language == ServiceLanguage::MySql {
                data.candidates.push(CompletionCandidate {
                    kind: CompletionKind::SystemFunction,
                    schemas: Vec::new(),
                    tables: Vec::new(),
                    names: Vec::new(),
                });
            }
        }

        CompletionContext::SystemVariable => {
            data.candidates.push(CompletionCandidate {
                kind: CompletionKind::SystemVariable,
                schemas: Vec::new(),
                tables: Vec::new(),
                names: overlay.names_of_kind(SymbolKind::SystemVariable),
            });
        }

        CompletionContext::UserVariable => {
            data.candidates.push(CompletionCandidate {
                kind: CompletionKind::UserVariable,
                schemas: Vec::new(),
                tables: Vec::new(),
                names: Vec::new(),
            });
        }
    }

    data
}

/// Decide what the tokens before the caret ask for.
fn classify_context(request: &CompletionRequest<'_>) -> CompletionContext {
    // Tokens fully before the caret, default channel only.
    let before: Vec<&Token> = request
        .tokens
        .iter()
        .filter(|t| {
            t.channel == TokenChannel::Default
                && t.kind != TokenKind::Eof
                && t.start < request.offset
        })
        .collect();

    let Some(last) = before.last() else {
        return CompletionContext::StatementStart;
    };

    // A word being typed: classify by what comes before it.
    let (last, previous) = if last.stop >= request.offset && last.kind.is_identifier_shaped() {
        match before.len().checked_sub(2) {
            Some(index) => (before[index], before.get(index.wrapping_sub(1)).copied()),
            None => return CompletionContext::StatementStart,
        }
    } else {
        let previous = before.len().checked_sub(2).map(|i| before[i]);
        (*last, previous)
    };

    match last.kind {
        TokenKind::AtAtVariable => return CompletionContext::SystemVariable,
        TokenKind::AtVariable => return CompletionContext::UserVariable,
        TokenKind::Dot => {
            if let Some(qualifier) = previous.filter(|t| t.kind.is_identifier_shaped()) {
                return CompletionContext::QualifiedName(unquote(&qualifier.text));
            }
            return CompletionContext::Expression;
        }
        TokenKind::Semicolon => return CompletionContext::StatementStart,
        _ => {}
    }

    if last.kind == TokenKind::Keyword {
        match last.upper().as_str() {
            "FROM" | "JOIN" | "INTO" | "UPDATE" | "TABLE" | "DESCRIBE" | "DESC" => {
                return CompletionContext::TableReference;
            }
            _ => {}
        }
    }

    CompletionContext::Expression
}

/// True if the word at the caret is quoted in any of the dialect ways.
fn word_is_quoted(request: &CompletionRequest<'_>) -> bool {
    request.tokens.iter().any(|t| {
        t.start <= request.offset
            && request.offset <= t.stop
            && matches!(
                t.kind,
                TokenKind::QuotedIdentifier
                    | TokenKind::BackTickIdentifier
                    | TokenKind::BracketIdentifier
                    | TokenKind::SingleQuotedText
                    | TokenKind::DoubleQuotedText
            )
    })
}

/// A table reference pulled out of the statement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TableReference {
    pub schema: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

/// Collect `schema.table alias` references following FROM/JOIN/INTO/
/// UPDATE keywords. Good enough for editor candidates; the server has
/// the last word anyway.
pub fn table_references(tokens: &[Token]) -> Vec<TableReference> {
    let stream: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.channel == TokenChannel::Default && t.kind != TokenKind::Eof)
        .collect();

    let mut result = Vec::new();
    let mut index = 0;
    while index < stream.len() {
        let token = stream[index];
        let introduces = token.kind == TokenKind::Keyword
            && matches!(token.upper().as_str(), "FROM" | "JOIN" | "INTO" | "UPDATE");
        index += 1;
        if !introduces {
            continue;
        }

        // One or more comma separated references.
        loop {
            let Some(first) = stream.get(index).filter(|t| t.kind.is_identifier_shaped()) else {
                break;
            };
            let mut reference = TableReference {
                schema: None,
                table: unquote(&first.text),
                alias: None,
            };
            index += 1;

            if stream.get(index).map(|t| t.kind) == Some(TokenKind::Dot) {
                if let Some(second) = stream.get(index + 1).filter(|t| t.kind.is_identifier_shaped()) {
                    reference.schema = Some(reference.table.clone());
                    reference.table = unquote(&second.text);
                    index += 2;
                }
            }

            // Optional alias: AS word, or a bare identifier.
            if let Some(next) = stream.get(index) {
                if next.kind == TokenKind::Keyword && next.upper() == "AS" {
                    if let Some(alias) = stream.get(index + 1).filter(|t| t.kind.is_identifier_shaped())
                    {
                        reference.alias = Some(unquote(&alias.text));
                        index += 2;
                    }
                } else if next.kind == TokenKind::Identifier {
                    reference.alias = Some(unquote(&next.text));
                    index += 1;
                }
            }

            result.push(reference);

            if stream.get(index).map(|t| t.kind) == Some(TokenKind::Comma) {
                index += 1;
                continue;
            }
            break;
        }
    }

    result
}

/// Map an alias back to its table name; unknown aliases pass through.
fn resolve_alias(tokens: &[Token], qualifier: &str) -> String {
    for reference in table_references(tokens) {
        if reference
            .alias
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(qualifier))
        {
            return reference.table;
        }
        if reference.table.eq_ignore_ascii_case(qualifier) {
            return reference.table;
        }
    }

    qualifier.to_string()
}

/// Strip one level of identifier quoting.
pub fn unquote(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let matched = matches!(
            (bytes[0], bytes[bytes.len() - 1]),
            (b'`', b'`') | (b'"', b'"') | (b'\'', b'\'') | (b'[', b']')
        );
        if matched {
            return text[1..text.len() - 1].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer_mysql::MySqlTokenProcessor;

    fn tokens(sql: &str) -> Vec<Token> {
        MySqlTokenProcessor::new(80031, "").tokenize(sql)
    }

    #[test]
    fn finds_table_references() {
        let toks = tokens("SELECT * FROM sakila.actor a JOIN film AS f, city");
        let refs = table_references(&toks);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].schema.as_deref(), Some("sakila"));
        assert_eq!(refs[0].table, "actor");
        assert_eq!(refs[0].alias.as_deref(), Some("a"));
        assert_eq!(refs[1].table, "film");
        assert_eq!(refs[1].alias.as_deref(), Some("f"));
        assert_eq!(refs[2].table, "city");
    }

    #[test]
    fn context_after_from_is_table_reference() {
        let sql = "SELECT * FROM ";
        let request = CompletionRequest {
            sql,
            tokens: &tokens(sql),
            offset: sql.len(),
            language: ServiceLanguage::MySql,
            version: MySqlVersion::V8_0,
            current_schema: "sakila".into(),
        };
        assert_eq!(classify_context(&request), CompletionContext::TableReference);
    }

    #[test]
    fn context_at_start_is_statement_start() {
        let sql = "";
        let request = CompletionRequest {
            sql,
            tokens: &tokens(sql),
            offset: 0,
            language: ServiceLanguage::MySql,
            version: MySqlVersion::V8_0,
            current_schema: String::new(),
        };
        assert_eq!(classify_context(&request), CompletionContext::StatementStart);
    }

    #[test]
    fn unquote_strips_one_level() {
        assert_eq!(unquote("`actor`"), "actor");
        assert_eq!(unquote("\"actor\""), "actor");
        assert_eq!(unquote("[actor]"), "actor");
        assert_eq!(unquote("actor"), "actor");
    }
}
