use std::sync::Arc;

use async_trait::async_trait;
use squill::completion::SchemaProvider;
use squill::errors::SchemaError;
use squill::keywords;
use squill::models::enums::{MySqlVersion, QueryType, ServiceLanguage, TokenKind};
use squill::pool::WorkerPool;
use squill::protocol::{ResultPayload, TaskData};
use squill::services_mysql::MySqlParsingServices;
use squill::services_sqlite::SqliteParsingServices;

struct CannedProvider;

#[async_trait]
impl SchemaProvider for CannedProvider {
    async fn schemas(&self) -> Result<Vec<String>, SchemaError> {
        Ok(vec!["sakila".into(), "world".into()])
    }

    async fn tables(&self, schema: &str) -> Result<Vec<String>, SchemaError> {
        if schema == "sakila" {
            Ok(vec!["actor".into(), "film".into()])
        } else {
            Ok(vec!["city".into()])
        }
    }

    async fn columns(&self, _schema: &str, table: &str) -> Result<Vec<String>, SchemaError> {
        if table == "actor" {
            Ok(vec!["actor_id".into(), "first_name".into(), "last_name".into()])
        } else {
            Ok(Vec::new())
        }
    }
}

#[test]
fn query_type_scenario_insert() {
    let services = MySqlParsingServices::new(80031, "");
    assert_eq!(
        services.determine_query_type("INSERT INTO t VALUES (1)"),
        QueryType::Insert
    );
}

#[test]
fn reserved_keyword_scenario() {
    // SELECT cannot be a bare identifier in 8.0; a non-reserved keyword
    // from the same version can.
    let set = keywords::keyword_set(ServiceLanguage::MySql, MySqlVersion::from_number(80031));
    assert!(set.is_reserved("SELECT"));
    assert!(set.is_keyword("STATUS"));
    assert!(!set.is_reserved("STATUS"));

    // The lexer agrees: `status` used as an alias stays identifier-like.
    let services = MySqlParsingServices::new(80031, "");
    let tokens = services.tokenize("SELECT 1 AS status");
    let alias = tokens.iter().find(|t| t.text == "status").expect("alias token");
    assert_eq!(alias.kind, TokenKind::Keyword);
    assert!(services.processor().is_identifier(alias));

    let select = &tokens[0];
    assert!(!services.processor().is_identifier(select));
}

#[test]
fn validation_reports_relative_to_base_offset() {
    let services = MySqlParsingServices::new(80031, "");
    let buffer = "SELECT 1;\nSELEC x FROM t;";
    let second_start = buffer.find("SELEC").unwrap();
    let statement = &buffer[second_start..];

    let errors = services.validate(statement, second_start);
    assert!(!errors.is_empty());
    assert!(errors[0].char_offset >= second_start);
    assert!(errors[0].char_offset < buffer.len());
}

#[test]
fn tokenize_agrees_with_validation_on_boundaries() {
    // The tokenize api must reuse the same post-processing path, so a
    // version comment is visible to both the same way.
    let services = MySqlParsingServices::new(80031, "");
    let sql = "/*!80000 SELECT */ 1";
    let tokens = services.tokenize(sql);
    assert!(tokens.iter().any(|t| t.text.eq_ignore_ascii_case("SELECT")));
    assert!(services.validate("SELECT 1", 0).is_empty());
}

#[test]
fn sqlite_and_mysql_disagree_on_dialect_specifics() {
    let mysql = MySqlParsingServices::new(80031, "");
    let sqlite = SqliteParsingServices::new();

    assert_eq!(sqlite.determine_query_type("PRAGMA user_version"), QueryType::Pragma);
    assert_eq!(mysql.determine_query_type("PRAGMA user_version"), QueryType::Unknown);

    // AUTOINCREMENT exists only in the SQLite keyword table.
    let sqlite_tokens = sqlite.tokenize("autoincrement");
    assert_eq!(sqlite_tokens[0].kind, TokenKind::Keyword);
    let mysql_tokens = mysql.tokenize("autoincrement");
    assert_eq!(mysql_tokens[0].kind, TokenKind::Identifier);
}

#[tokio::test]
async fn suggestion_merges_schema_and_keyword_sources() {
    let pool = WorkerPool::with_provider(Arc::new(CannedProvider));

    let sql = "SELECT  FROM sakila.actor";
    let result = pool
        .run_task(TaskData::Suggestion {
            language: ServiceLanguage::MySql,
            version: 80031,
            sql: sql.into(),
            offset: 7,
            line: 1,
            column: 7,
            current_schema: "sakila".into(),
        })
        .await
        .expect("resolves");

    match result.payload {
        ResultPayload::Completions(completions) => {
            // Buffer-local context: the referenced table shows up.
            assert!(completions.tables.iter().any(|t| t == "actor"));
            // Live schema objects: actor columns offered.
            let names: Vec<&String> =
                completions.candidates.iter().flat_map(|c| c.names.iter()).collect();
            assert!(names.iter().any(|n| n.as_str() == "actor_id"));
            // Keyword source is populated too.
            assert!(completions.keywords.iter().any(|k| k == "WHERE"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn info_task_resolves_system_function() {
    let pool = WorkerPool::new();

    // The symbol tables load in the background; completion of the load
    // is observable through the global flag.
    while !squill::symbols::global().fully_loaded() {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let result = pool
        .run_task(TaskData::Info {
            language: ServiceLanguage::MySql,
            version: 80031,
            sql: "SELECT NOW()".into(),
            offset: 8,
        })
        .await
        .expect("resolves");

    match result.payload {
        ResultPayload::Info(Some(info)) => {
            assert_eq!(info.name, "now");
            assert!(!info.description.is_empty());
        }
        other => panic!("expected symbol info, got {other:?}"),
    }
}

#[tokio::test]
async fn preprocess_and_semicolon_tasks() {
    let pool = WorkerPool::new();

    let result = pool
        .run_task(TaskData::PreprocessStatement {
            language: ServiceLanguage::MySql,
            version: 80031,
            sql_mode: String::new(),
            sql: "SELECT * FROM t".into(),
            offset: 0,
            count: 1000,
            force_secondary_engine: false,
        })
        .await
        .expect("resolves");
    match result.payload {
        ResultPayload::Rewritten { query, changed } => {
            assert!(changed);
            assert_eq!(query, "SELECT * FROM t LIMIT 0, 1000");
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let result = pool
        .run_task(TaskData::AddSemicolon {
            language: ServiceLanguage::Sqlite,
            version: 0,
            sql_mode: String::new(),
            sql: "SELECT 1".into(),
        })
        .await
        .expect("resolves");
    match result.payload {
        ResultPayload::Rewritten { query, changed } => {
            assert!(changed);
            assert_eq!(query, "SELECT 1;");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn parameters_task_finds_embedded_parameters() {
    let pool = WorkerPool::new();
    let result = pool
        .run_task(TaskData::Parameters {
            language: ServiceLanguage::MySql,
            version: 80031,
            sql_mode: String::new(),
            sql: "SELECT * FROM actor WHERE actor_id = ? /*:actor=7*/".into(),
        })
        .await
        .expect("resolves");

    match result.payload {
        ResultPayload::Parameters(parameters) => {
            assert_eq!(parameters, vec![("actor".to_string(), "7".to_string())]);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn script_tasks_take_the_script_path() {
    let pool = WorkerPool::new();

    let result = pool
        .run_task(TaskData::Tokenize {
            language: ServiceLanguage::Script,
            version: 0,
            sql_mode: String::new(),
            sql: Some("if x:\n    y\n".into()),
            statements: Vec::new(),
        })
        .await
        .expect("resolves");
    match result.payload {
        ResultPayload::Tokens(tokens) => {
            assert!(tokens.iter().any(|t| t.kind == TokenKind::Indent));
            assert!(tokens.iter().any(|t| t.kind == TokenKind::Dedent));
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let result = pool
        .run_task(TaskData::Validate {
            language: ServiceLanguage::Script,
            version: 0,
            sql_mode: String::new(),
            sql: "if x:\n        a\n    b\n".into(),
            offset: 50,
        })
        .await
        .expect("resolves");
    match result.payload {
        ResultPayload::Diagnostics(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].char_offset >= 50);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}
