//! Per-dialect, per-version keyword tables.
//!
//! Built once at first use. Each `(dialect, version)` pair partitions its
//! keywords into "all" and "reserved"; reserved keywords can never be
//! used as bare identifiers, the rest can. Version deltas are explicit
//! add/remove lists so later versions never leak into earlier ones.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::models::enums::{MySqlVersion, ServiceLanguage, TokenKind};
use crate::models::structs::Token;

/// The keyword partition for one `(dialect, version)` pair.
pub struct KeywordSet {
    all: HashSet<&'static str>,
    reserved: HashSet<&'static str>,
}

impl KeywordSet {
    /// True when the (case-insensitive) word is a keyword of this set.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.all.contains(word.to_ascii_uppercase().as_str())
    }

    /// True when the word can never be used as a bare identifier.
    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved.contains(word.to_ascii_uppercase().as_str())
    }

    pub fn all(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.all.iter().copied()
    }

    /// Keywords usable as identifiers, i.e. the non-reserved part.
    pub fn non_reserved(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.all.iter().copied().filter(move |w| !self.reserved.contains(w))
    }
}

/// Reserved keywords of the MySQL 8.0 grammar.
static MYSQL_RESERVED_8_0: &[&str] = &[
    "ACCESSIBLE", "ADD", "ALL", "ALTER", "ANALYZE", "AND", "AS", "ASC", "ASENSITIVE",
    "BEFORE", "BETWEEN", "BIGINT", "BINARY", "BLOB", "BOTH", "BY", "CALL", "CASCADE",
    "CASE", "CHANGE", "CHAR", "CHARACTER", "CHECK", "COLLATE", "COLUMN", "CONDITION",
    "CONSTRAINT", "CONTINUE", "CONVERT", "CREATE", "CROSS", "CUBE", "CUME_DIST",
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "CURSOR",
    "DATABASE", "DATABASES", "DAY_HOUR", "DAY_MICROSECOND", "DAY_MINUTE", "DAY_SECOND",
    "DEC", "DECIMAL", "DECLARE", "DEFAULT", "DELAYED", "DELETE", "DENSE_RANK", "DESC",
    "DESCRIBE", "DETERMINISTIC", "DISTINCT", "DISTINCTROW", "DIV", "DOUBLE", "DROP",
    "DUAL", "EACH", "ELSE", "ELSEIF", "EMPTY", "ENCLOSED", "ESCAPED", "EXCEPT",
    "EXISTS", "EXIT", "EXPLAIN", "FALSE", "FETCH", "FIRST_VALUE", "FLOAT", "FLOAT4",
    "FLOAT8", "FOR", "FORCE", "FOREIGN", "FROM", "FULLTEXT", "FUNCTION", "GENERATED",
    "GET", "GRANT", "GROUP", "GROUPING", "GROUPS", "HAVING", "HIGH_PRIORITY",
    "HOUR_MICROSECOND", "HOUR_MINUTE", "HOUR_SECOND", "IF", "IGNORE", "IN", "INDEX",
    "INFILE", "INNER", "INOUT", "INSENSITIVE", "INSERT", "INT", "INT1", "INT2", "INT3",
    "INT4", "INT8", "INTEGER", "INTERSECT", "INTERVAL", "INTO", "IO_AFTER_GTIDS",
    "IO_BEFORE_GTIDS", "IS", "ITERATE", "JOIN", "JSON_TABLE", "KEY", "KEYS", "KILL",
    "LAG", "LAST_VALUE", "LATERAL", "LEAD", "LEADING", "LEAVE", "LEFT", "LIKE",
    "LIMIT", "LINEAR", "LINES", "LOAD", "LOCALTIME", "LOCALTIMESTAMP", "LOCK", "LONG",
    "LONGBLOB", "LONGTEXT", "LOOP", "LOW_PRIORITY", "MASTER_BIND",
    "MASTER_SSL_VERIFY_SERVER_CERT", "MATCH", "MAXVALUE", "MEDIUMBLOB", "MEDIUMINT",
    "MEDIUMTEXT", "MIDDLEINT", "MINUTE_MICROSECOND", "MINUTE_SECOND", "MOD",
    "MODIFIES", "NATURAL", "NOT", "NO_WRITE_TO_BINLOG", "NTH_VALUE", "NTILE", "NULL",
    "NUMERIC", "OF", "ON", "OPTIMIZE", "OPTIMIZER_COSTS", "OPTION", "OPTIONALLY",
    "OR", "ORDER", "OUT", "OUTER", "OUTFILE", "OVER", "PARTITION", "PERCENT_RANK",
    "PRECISION", "PRIMARY", "PROCEDURE", "PURGE", "RANGE", "RANK", "READ", "READS",
    "READ_WRITE", "REAL", "RECURSIVE", "REFERENCES", "REGEXP", "RELEASE", "RENAME",
    "REPEAT", "REPLACE", "REQUIRE", "RESIGNAL", "RESTRICT", "RETURN", "REVOKE",
    "RIGHT", "RLIKE", "ROW", "ROWS", "ROW_NUMBER", "SCHEMA", "SCHEMAS",
    "SECOND_MICROSECOND", "SELECT", "SENSITIVE", "SEPARATOR", "SET", "SHOW", "SIGNAL",
    "SMALLINT", "SPATIAL", "SPECIFIC", "SQL", "SQLEXCEPTION", "SQLSTATE", "SQLWARNING",
    "SQL_BIG_RESULT", "SQL_CALC_FOUND_ROWS", "SQL_SMALL_RESULT", "SSL", "STARTING",
    "STORED", "STRAIGHT_JOIN", "SYSTEM", "TABLE", "TERMINATED", "THEN", "TINYBLOB",
    "TINYINT", "TINYTEXT", "TO", "TRAILING", "TRIGGER", "TRUE", "UNDO", "UNION",
    "UNIQUE", "UNLOCK", "UNSIGNED", "UPDATE", "USAGE", "USE", "USING", "UTC_DATE",
    "UTC_TIME", "UTC_TIMESTAMP", "VALUES", "VARBINARY", "VARCHAR", "VARCHARACTER",
    "VARYING", "VIRTUAL", "WHEN", "WHERE", "WHILE", "WINDOW", "WITH", "WRITE", "XOR",
    "YEAR_MONTH", "ZEROFILL",
];

/// Non-reserved keywords of the MySQL 8.0 grammar (usable as identifiers).
static MYSQL_NON_RESERVED_8_0: &[&str] = &[
    "ACCOUNT", "ACTION", "ACTIVE", "ADMIN", "AFTER", "AGAINST", "AGGREGATE",
    "ALGORITHM", "ALWAYS", "ANY", "ARRAY", "ASCII", "AT", "ATTRIBUTE",
    "AUTOEXTEND_SIZE", "AUTO_INCREMENT", "AVG", "AVG_ROW_LENGTH", "BACKUP", "BEGIN",
    "BINLOG", "BIT", "BOOL", "BOOLEAN", "BTREE", "BUCKETS", "BYTE", "CACHE",
    "CASCADED", "CATALOG_NAME", "CHAIN", "CHANNEL", "CHARSET", "CHECKSUM", "CIPHER",
    "CLIENT", "CLONE", "CLOSE", "COALESCE", "CODE", "COLLATION", "COLUMNS",
    "COLUMN_FORMAT", "COLUMN_NAME", "COMMENT", "COMMIT", "COMMITTED", "COMPACT",
    "COMPLETION", "COMPONENT", "COMPRESSED", "COMPRESSION", "CONCURRENT",
    "CONNECTION", "CONSISTENT", "CONTAINS", "CONTEXT", "CPU", "CURRENT",
    "CURSOR_NAME", "DATA", "DATAFILE", "DATE", "DATETIME", "DAY", "DEALLOCATE",
    "DEFAULT_AUTH", "DEFINER", "DEFINITION", "DELAY_KEY_WRITE", "DESCRIPTION",
    "DIAGNOSTICS", "DIRECTORY", "DISABLE", "DISCARD", "DISK", "DO", "DUMPFILE",
    "DUPLICATE", "DYNAMIC", "ENABLE", "ENCRYPTION", "END", "ENDS", "ENFORCED",
    "ENGINE", "ENGINES", "ENGINE_ATTRIBUTE", "ENUM", "ERROR", "ERRORS", "ESCAPE",
    "EVENT", "EVENTS", "EVERY", "EXCHANGE", "EXCLUDE", "EXECUTE", "EXPANSION",
    "EXPIRE", "EXPORT", "EXTENDED", "EXTENT_SIZE", "FAILED_LOGIN_ATTEMPTS", "FAST",
    "FAULTS", "FIELDS", "FILE", "FILE_BLOCK_SIZE", "FILTER", "FIRST", "FIXED",
    "FLUSH", "FOLLOWING", "FOLLOWS", "FORMAT", "FOUND", "FULL", "GENERAL",
    "GEOMCOLLECTION", "GEOMETRY", "GEOMETRYCOLLECTION", "GET_FORMAT", "GLOBAL",
    "GRANTS", "GROUP_REPLICATION", "HANDLER", "HASH", "HELP", "HISTOGRAM", "HISTORY",
    "HOST", "HOSTS", "HOUR", "IDENTIFIED", "IMPORT", "INACTIVE", "INDEXES",
    "INITIAL_SIZE", "INSERT_METHOD", "INSTALL", "INSTANCE", "INVISIBLE", "INVOKER",
    "IO", "IPC", "ISOLATION", "ISSUER", "JSON", "JSON_VALUE", "KEYRING",
    "KEY_BLOCK_SIZE", "LANGUAGE", "LAST", "LEAVES", "LESS", "LEVEL", "LINESTRING",
    "LIST", "LOCAL", "LOCKED", "LOCKS", "LOGFILE", "LOGS", "MASTER",
    "MAX_CONNECTIONS_PER_HOUR", "MAX_QUERIES_PER_HOUR", "MAX_ROWS", "MAX_SIZE",
    "MAX_UPDATES_PER_HOUR", "MAX_USER_CONNECTIONS", "MEDIUM", "MEMBER", "MEMORY",
    "MERGE", "MESSAGE_TEXT", "MICROSECOND", "MIGRATE", "MINUTE", "MIN_ROWS", "MODE",
    "MODIFY", "MONTH", "MULTILINESTRING", "MULTIPOINT", "MULTIPOLYGON", "MUTEX",
    "MYSQL_ERRNO", "NAME", "NAMES", "NATIONAL", "NCHAR", "NESTED", "NEVER", "NEW",
    "NEXT", "NO", "NODEGROUP", "NONE", "NOWAIT", "NO_WAIT", "NULLS", "NUMBER",
    "NVARCHAR", "OFF", "OFFSET", "OLD", "ONE", "ONLY", "OPEN", "OPTIONAL", "OPTIONS",
    "ORDINALITY", "ORGANIZATION", "OTHERS", "OWNER", "PACK_KEYS", "PAGE", "PARSER",
    "PARTIAL", "PARTITIONING", "PARTITIONS", "PASSWORD", "PASSWORD_LOCK_TIME", "PATH",
    "PERSIST", "PERSIST_ONLY", "PHASE", "PLUGIN", "PLUGINS", "PLUGIN_DIR", "POINT",
    "POLYGON", "PORT", "PRECEDES", "PRECEDING", "PREPARE", "PRESERVE", "PREV",
    "PRIVILEGES", "PRIVILEGE_CHECKS_USER", "PROCESS", "PROCESSLIST", "PROFILE",
    "PROFILES", "PROXY", "QUARTER", "QUERY", "QUICK", "RANDOM", "READ_ONLY",
    "REBUILD", "RECOVER", "REDO_BUFFER_SIZE", "REDUNDANT", "REFERENCE", "RELAY",
    "RELAYLOG", "RELAY_LOG_FILE", "RELAY_LOG_POS", "RELAY_THREAD", "RELOAD",
    "REMOVE", "REORGANIZE", "REPAIR", "REPEATABLE", "REPLICA", "REPLICAS",
    "REPLICATION", "REQUIRE_ROW_FORMAT", "RESET", "RESOURCE", "RESPECT", "RESTART",
    "RESTORE", "RESUME", "RETAIN", "RETURNED_SQLSTATE", "RETURNING", "RETURNS",
    "REUSE", "REVERSE", "ROLE", "ROLLBACK", "ROLLUP", "ROTATE", "ROUTINE",
    "ROW_COUNT", "ROW_FORMAT", "RTREE", "SAVEPOINT", "SCHEDULE", "SCHEMA_NAME",
    "SECOND", "SECONDARY", "SECONDARY_ENGINE", "SECONDARY_ENGINE_ATTRIBUTE",
    "SECONDARY_LOAD", "SECONDARY_UNLOAD", "SECURITY", "SERIAL", "SERIALIZABLE",
    "SERVER", "SESSION", "SHARE", "SHUTDOWN", "SIGNED", "SIMPLE", "SKIP", "SLAVE",
    "SLOW", "SNAPSHOT", "SOCKET", "SOME", "SONAME", "SOUNDS", "SOURCE",
    "SQL_AFTER_GTIDS", "SQL_BEFORE_GTIDS", "SQL_BUFFER_RESULT", "SQL_NO_CACHE",
    "SQL_THREAD", "SRID", "STACKED", "START", "STARTS", "STATS_AUTO_RECALC",
    "STATS_PERSISTENT", "STATS_SAMPLE_PAGES", "STATUS", "STOP", "STORAGE", "STREAM",
    "STRING", "SUBJECT", "SUBPARTITION", "SUBPARTITIONS", "SUPER", "SUSPEND",
    "SWAPS", "SWITCHES", "TABLES", "TABLESPACE", "TABLE_CHECKSUM", "TABLE_NAME",
    "TEMPORARY", "TEMPTABLE", "TEXT", "THAN", "THREAD_PRIORITY", "TIES", "TIME",
    "TIMESTAMP", "TIMESTAMPADD", "TIMESTAMPDIFF", "TLS", "TRANSACTION", "TRIGGERS",
    "TRUNCATE", "TYPE", "TYPES", "UNBOUNDED", "UNCOMMITTED", "UNDEFINED", "UNDOFILE",
    "UNDO_BUFFER_SIZE", "UNICODE", "UNINSTALL", "UNKNOWN", "UNTIL", "UPGRADE",
    "USER", "USER_RESOURCES", "USE_FRM", "VALIDATION", "VALUE", "VARIABLES", "VCPU",
    "VIEW", "VISIBLE", "WAIT", "WARNINGS", "WEEK", "WEIGHT_STRING", "WITHOUT",
    "WORK", "WRAPPER", "X509", "XA", "XID", "XML", "YEAR", "ZONE",
];

/// REST DDL grammar extension (CREATE REST SERVICE and friends). Only
/// grammars from 8.1 on carry the extension; never unioned into 8.0.
static MYSQL_EXTENSION_KEYWORDS: &[&str] = &[
    "REST", "ENDPOINT", "METADATA", "AUTHENTICATION", "REDIRECTION", "JWT",
    "PROTOBUF", "DUALITY",
];

/// 8.4 dropped the legacy replication terminology from the grammar.
static MYSQL_RESERVED_REMOVED_8_4: &[&str] =
    &["MASTER_BIND", "MASTER_SSL_VERIFY_SERVER_CERT"];
static MYSQL_NON_RESERVED_REMOVED_8_4: &[&str] = &["MASTER", "SLAVE"];

/// The SQLite keyword list. SQLite treats most keywords as usable
/// identifiers; the reserved subset below is the part that really
/// cannot appear as a bare name.
static SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND",
    "AS", "ASC", "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY",
    "CASCADE", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT", "DEFERRABLE", "DEFERRED", "DELETE",
    "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH", "ELSE", "END", "ESCAPE",
    "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL", "FILTER",
    "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX",
    "INDEXED", "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS",
    "ISNULL", "JOIN", "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH",
    "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING", "NOTNULL", "NULL", "NULLS",
    "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER", "OVER", "PARTITION",
    "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE", "RANGE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT",
    "SELECT", "SET", "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO",
    "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION", "UNIQUE", "UPDATE", "USING",
    "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE", "WINDOW", "WITH",
    "WITHOUT",
];

static SQLITE_RESERVED: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "AUTOINCREMENT", "BETWEEN", "CASE", "CHECK",
    "COLLATE", "COMMIT", "CONSTRAINT", "CREATE", "DEFAULT", "DEFERRABLE", "DELETE",
    "DISTINCT", "DROP", "ELSE", "ESCAPE", "EXCEPT", "EXISTS", "FOREIGN", "FROM",
    "GROUP", "HAVING", "IN", "INDEX", "INSERT", "INTERSECT", "INTO", "IS", "ISNULL",
    "JOIN", "LIMIT", "NOT", "NOTNULL", "NULL", "ON", "OR", "ORDER", "PRIMARY",
    "REFERENCES", "SELECT", "SET", "TABLE", "THEN", "TO", "TRANSACTION", "UNION",
    "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE",
];

/// Hard keywords of the scripting grammar. All reserved.
static SCRIPT_RESERVED: &[&str] = &[
    "FALSE", "NONE", "TRUE", "AND", "AS", "ASSERT", "ASYNC", "AWAIT", "BREAK",
    "CLASS", "CONTINUE", "DEF", "DEL", "ELIF", "ELSE", "EXCEPT", "FINALLY", "FOR",
    "FROM", "GLOBAL", "IF", "IMPORT", "IN", "IS", "LAMBDA", "NONLOCAL", "NOT", "OR",
    "PASS", "RAISE", "RETURN", "TRY", "WHILE", "WITH", "YIELD",
];

/// Soft keywords: keywords only in specific positions, identifiers
/// everywhere else.
static SCRIPT_SOFT: &[&str] = &["MATCH", "CASE", "TYPE"];

fn make_set(reserved: &[&'static str], non_reserved: &[&'static str]) -> KeywordSet {
    let reserved: HashSet<&'static str> = reserved.iter().copied().collect();
    let mut all = reserved.clone();
    all.extend(non_reserved.iter().copied());

    KeywordSet { all, reserved }
}

static MYSQL_TABLES: Lazy<HashMap<MySqlVersion, KeywordSet>> = Lazy::new(|| {
    let mut tables = HashMap::new();

    for version in [
        MySqlVersion::V8_0,
        MySqlVersion::V8_1,
        MySqlVersion::V8_2,
        MySqlVersion::V8_3,
        MySqlVersion::V8_4,
    ] {
        let mut set = make_set(MYSQL_RESERVED_8_0, MYSQL_NON_RESERVED_8_0);

        // Extension grammar keywords are opt-in from 8.1 on.
        if version >= MySqlVersion::V8_1 {
            set.all.extend(MYSQL_EXTENSION_KEYWORDS.iter().copied());
        }

        if version >= MySqlVersion::V8_4 {
            for word in MYSQL_RESERVED_REMOVED_8_4 {
                set.all.remove(word);
                set.reserved.remove(word);
            }
            for word in MYSQL_NON_RESERVED_REMOVED_8_4 {
                set.all.remove(word);
            }
        }

        tables.insert(version, set);
    }

    tables
});

static SQLITE_TABLE: Lazy<KeywordSet> = Lazy::new(|| {
    let reserved: HashSet<&'static str> = SQLITE_RESERVED.iter().copied().collect();
    let all: HashSet<&'static str> = SQLITE_KEYWORDS.iter().copied().collect();

    KeywordSet { all, reserved }
});

static SCRIPT_TABLE: Lazy<KeywordSet> =
    Lazy::new(|| make_set(SCRIPT_RESERVED, SCRIPT_SOFT));

/// Look up the keyword partition for a `(dialect, version)` pair.
/// Unknown MySQL versions fall back to the 8.0 table.
pub fn keyword_set(language: ServiceLanguage, version: MySqlVersion) -> &'static KeywordSet {
    match language {
        ServiceLanguage::MySql => MYSQL_TABLES
            .get(&version)
            .unwrap_or_else(|| &MYSQL_TABLES[&MySqlVersion::V8_0]),
        ServiceLanguage::Sqlite => &SQLITE_TABLE,
        ServiceLanguage::Script => &SCRIPT_TABLE,
    }
}

/// Relational / logical operator check, over kind and text.
pub fn is_relation(token: &Token) -> bool {
    match token.kind {
        TokenKind::Operator => true,
        TokenKind::Keyword => matches!(
            token.upper().as_str(),
            "OR" | "XOR" | "AND" | "IS" | "BETWEEN" | "LIKE" | "REGEXP" | "RLIKE" | "IN"
                | "SOUNDS" | "NOT" | "GLOB"
        ),
        _ => false,
    }
}

/// Operator-or-punctuation check (the splitter and the quick-info
/// walker treat these alike).
pub fn is_operator(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Operator
            | TokenKind::Dot
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::Colon
            | TokenKind::OpenParen
            | TokenKind::CloseParen
            | TokenKind::OpenBracket
            | TokenKind::CloseBracket
            | TokenKind::OpenBrace
            | TokenKind::CloseBrace
            | TokenKind::AtVariable
            | TokenKind::AtAtVariable
            | TokenKind::ParamMarker
    )
}

pub fn is_number(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Number | TokenKind::HexNumber | TokenKind::BinNumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_is_subset_of_all() {
        for version in [
            MySqlVersion::V8_0,
            MySqlVersion::V8_1,
            MySqlVersion::V8_2,
            MySqlVersion::V8_3,
            MySqlVersion::V8_4,
        ] {
            let set = keyword_set(ServiceLanguage::MySql, version);
            for word in &set.reserved {
                assert!(set.all.contains(word), "{word} reserved but not a keyword");
            }
        }

        let sqlite = keyword_set(ServiceLanguage::Sqlite, MySqlVersion::Unknown);
        for word in &sqlite.reserved {
            assert!(sqlite.all.contains(word));
        }
    }

    #[test]
    fn select_is_reserved_in_8_0() {
        let set = keyword_set(ServiceLanguage::MySql, MySqlVersion::V8_0);
        assert!(set.is_reserved("SELECT"));
        assert!(set.is_reserved("select"));
        // A non-reserved keyword stays usable as an identifier.
        assert!(set.is_keyword("ENGINE"));
        assert!(!set.is_reserved("ENGINE"));
    }

    #[test]
    fn extension_keywords_are_opt_in_per_version() {
        let v80 = keyword_set(ServiceLanguage::MySql, MySqlVersion::V8_0);
        let v81 = keyword_set(ServiceLanguage::MySql, MySqlVersion::V8_1);
        assert!(!v80.is_keyword("REST"));
        assert!(v81.is_keyword("REST"));
        assert!(!v81.is_reserved("REST"));
    }

    #[test]
    fn legacy_replication_words_dropped_in_8_4() {
        let v83 = keyword_set(ServiceLanguage::MySql, MySqlVersion::V8_3);
        let v84 = keyword_set(ServiceLanguage::MySql, MySqlVersion::V8_4);
        assert!(v83.is_reserved("MASTER_BIND"));
        assert!(!v84.is_keyword("MASTER_BIND"));
        assert!(!v84.is_keyword("MASTER"));
    }

    #[test]
    fn unknown_words_are_not_keywords() {
        let set = keyword_set(ServiceLanguage::MySql, MySqlVersion::V8_0);
        assert!(!set.is_keyword("FROBNICATE"));
        assert!(!set.is_reserved("FROBNICATE"));
    }

    #[test]
    fn token_class_predicates() {
        use crate::lexer::{LexerConfig, SqlLexer};

        let tokens = SqlLexer::tokenize("a <=> b AND c + 1", LexerConfig::mysql(80031, ""));
        let op = tokens.iter().find(|t| t.text == "<=>").unwrap();
        assert!(is_relation(op));
        assert!(is_operator(op));

        let and = tokens.iter().find(|t| t.text == "AND").unwrap();
        // Raw scanner output: AND is still an identifier until the
        // keyword filter runs.
        let mut and = and.clone();
        and.kind = TokenKind::Keyword;
        assert!(is_relation(&and));

        let number = tokens.iter().find(|t| t.text == "1").unwrap();
        assert!(is_number(number.kind));
        assert!(!is_relation(number));
    }
}
