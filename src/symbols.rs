//! Symbol registry powering quick info and completion.
//!
//! A global registry per dialect holds system variables, system
//! functions, character sets and data types. It is populated on a
//! background thread at first use; readers may observe a table that is
//! still growing, but never a half-written entry. Session layers stack
//! on top and are dropped when their connection goes away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;
use once_cell::sync::Lazy;

use crate::models::enums::{ServiceLanguage, SymbolKind};

/// Kind-specific payload attached to a symbol.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SymbolMeta {
    None,
    SystemVariable { scope: &'static str },
    SystemFunction { signature: &'static str },
    Charset { default_collation: &'static str },
    DataType { synonyms: &'static [&'static str] },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SymbolDescriptor {
    pub kind: SymbolKind,
    pub description: Vec<String>,
    pub meta: SymbolMeta,
}

/// One registry level: name (lowercased) to descriptors. Multiple kinds
/// may share a name (a function and a data type can collide).
pub struct SymbolRegistry {
    entries: RwLock<HashMap<String, Vec<SymbolDescriptor>>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Idempotent add: re-adding the same name+kind replaces the payload.
    pub fn add_symbol(&self, name: &str, descriptor: SymbolDescriptor) {
        let key = name.to_lowercase();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let slot = entries.entry(key).or_default();
        if let Some(existing) = slot.iter_mut().find(|d| d.kind == descriptor.kind) {
            *existing = descriptor;
        } else {
            slot.push(descriptor);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolDescriptor> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&name.to_lowercase()).and_then(|v| v.first().cloned())
    }

    pub fn lookup_kind(&self, name: &str, kind: SymbolKind) -> Option<SymbolDescriptor> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&name.to_lowercase())
            .and_then(|v| v.iter().find(|d| d.kind == kind).cloned())
    }

    /// All names of a given kind, for completion candidate lists.
    pub fn names_of_kind(&self, kind: SymbolKind) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, v)| v.iter().any(|d| d.kind == kind))
            .map(|(k, _)| k.clone())
            .collect();
        names.sort();
        names
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registries, one per dialect, plus the loading flag.
pub struct GlobalSymbols {
    mysql: Arc<SymbolRegistry>,
    sqlite: Arc<SymbolRegistry>,
    loaded: AtomicBool,
}

impl GlobalSymbols {
    pub fn registry(&self, language: ServiceLanguage) -> Arc<SymbolRegistry> {
        match language {
            ServiceLanguage::Sqlite => Arc::clone(&self.sqlite),
            _ => Arc::clone(&self.mysql),
        }
    }

    /// False while the background load is still running. Callers must
    /// tolerate partial tables; this flag exists for status display.
    pub fn fully_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

static GLOBALS: Lazy<Arc<GlobalSymbols>> = Lazy::new(|| {
    let globals = Arc::new(GlobalSymbols {
        mysql: Arc::new(SymbolRegistry::new()),
        sqlite: Arc::new(SymbolRegistry::new()),
        loaded: AtomicBool::new(false),
    });

    let worker = Arc::clone(&globals);
    std::thread::Builder::new()
        .name("symbol-loader".into())
        .spawn(move || {
            load_builtin_symbols(&worker);
            worker.loaded.store(true, Ordering::Release);
            debug!("built-in symbol tables loaded");
        })
        .ok();

    globals
});

/// The shared global symbol tables. First call kicks off the load.
pub fn global() -> Arc<GlobalSymbols> {
    Arc::clone(&GLOBALS)
}

/// A session-scoped view: zero or more session layers over the global
/// registry. Owned by one connection; never shared between sessions.
pub struct SymbolOverlay {
    base: Arc<SymbolRegistry>,
    layers: Vec<Arc<SymbolRegistry>>,
}

impl SymbolOverlay {
    pub fn new(language: ServiceLanguage) -> Self {
        Self { base: global().registry(language), layers: Vec::new() }
    }

    pub fn push_layer(&mut self) -> Arc<SymbolRegistry> {
        let layer = Arc::new(SymbolRegistry::new());
        self.layers.push(Arc::clone(&layer));
        layer
    }

    /// Drop all session layers (the `cleanup` task).
    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    /// Top-down lookup: session layers first, then the global table.
    pub fn lookup(&self, name: &str) -> Option<SymbolDescriptor> {
        for layer in self.layers.iter().rev() {
            if let Some(found) = layer.lookup(name) {
                return Some(found);
            }
        }

        self.base.lookup(name)
    }

    pub fn lookup_kind(&self, name: &str, kind: SymbolKind) -> Option<SymbolDescriptor> {
        for layer in self.layers.iter().rev() {
            if let Some(found) = layer.lookup_kind(name, kind) {
                return Some(found);
            }
        }

        self.base.lookup_kind(name, kind)
    }

    pub fn names_of_kind(&self, kind: SymbolKind) -> Vec<String> {
        let mut names = self.base.names_of_kind(kind);
        for layer in &self.layers {
            names.extend(layer.names_of_kind(kind));
        }
        names.sort();
        names.dedup();
        names
    }
}

fn sysvar(registry: &SymbolRegistry, name: &'static str, scope: &'static str, text: &'static str) {
    registry.add_symbol(
        name,
        SymbolDescriptor {
            kind: SymbolKind::SystemVariable,
            description: vec![format!("@@{name}"), text.to_string()],
            meta: SymbolMeta::SystemVariable { scope },
        },
    );
}

fn sysfunc(registry: &SymbolRegistry, name: &'static str, signature: &'static str, text: &'static str) {
    registry.add_symbol(
        name,
        SymbolDescriptor {
            kind: SymbolKind::SystemFunction,
            description: vec![signature.to_string(), text.to_string()],
            meta: SymbolMeta::SystemFunction { signature },
        },
    );
}

fn charset(registry: &SymbolRegistry, name: &'static str, collation: &'static str) {
    registry.add_symbol(
        name,
        SymbolDescriptor {
            kind: SymbolKind::Charset,
            description: vec![format!("Character set {name}"), format!("Default collation: {collation}")],
            meta: SymbolMeta::Charset { default_collation: collation },
        },
    );
}

fn datatype(registry: &SymbolRegistry, name: &'static str, synonyms: &'static [&'static str], text: &'static str) {
    registry.add_symbol(
        name,
        SymbolDescriptor {
            kind: SymbolKind::DataType,
            description: vec![name.to_uppercase(), text.to_string()],
            meta: SymbolMeta::DataType { synonyms },
        },
    );
}

fn load_builtin_symbols(globals: &GlobalSymbols) {
    let mysql = &globals.mysql;

    // System variables (the ones the editor shows most; descriptions
    // condensed from the server manual).
    sysvar(mysql, "autocommit", "session", "Autocommit mode; set to 0 to group statements into transactions.");
    sysvar(mysql, "auto_increment_increment", "both", "Interval between successive AUTO_INCREMENT values.");
    sysvar(mysql, "auto_increment_offset", "both", "Starting point for AUTO_INCREMENT values.");
    sysvar(mysql, "basedir", "global", "Path to the MySQL installation base directory.");
    sysvar(mysql, "binlog_format", "both", "Binary logging format: ROW, STATEMENT or MIXED.");
    sysvar(mysql, "character_set_client", "both", "Character set for statements arriving from the client.");
    sysvar(mysql, "character_set_connection", "both", "Character set used for literals without an introducer.");
    sysvar(mysql, "character_set_database", "both", "Character set of the default database.");
    sysvar(mysql, "character_set_results", "both", "Character set for query results sent to the client.");
    sysvar(mysql, "character_set_server", "both", "Default server character set.");
    sysvar(mysql, "collation_connection", "both", "Collation of the connection character set.");
    sysvar(mysql, "collation_server", "both", "Default server collation.");
    sysvar(mysql, "connect_timeout", "global", "Seconds the server waits for a connect packet.");
    sysvar(mysql, "datadir", "global", "Path to the data directory.");
    sysvar(mysql, "default_storage_engine", "both", "Default storage engine for new tables.");
    sysvar(mysql, "foreign_key_checks", "both", "Whether foreign key constraints are checked.");
    sysvar(mysql, "general_log", "global", "Whether the general query log is enabled.");
    sysvar(mysql, "group_concat_max_len", "both", "Maximum result length of GROUP_CONCAT().");
    sysvar(mysql, "hostname", "global", "Server host name.");
    sysvar(mysql, "innodb_buffer_pool_size", "global", "Size in bytes of the InnoDB buffer pool.");
    sysvar(mysql, "innodb_flush_log_at_trx_commit", "global", "InnoDB log flushing behavior at commit.");
    sysvar(mysql, "interactive_timeout", "both", "Seconds to wait for activity on an interactive connection.");
    sysvar(mysql, "join_buffer_size", "both", "Minimum size of the buffer used for joins without indexes.");
    sysvar(mysql, "last_insert_id", "session", "Value to be returned by LAST_INSERT_ID().");
    sysvar(mysql, "lower_case_table_names", "global", "How table names are stored and compared.");
    sysvar(mysql, "max_allowed_packet", "both", "Maximum size of one packet or generated string.");
    sysvar(mysql, "max_connections", "global", "Maximum permitted number of simultaneous connections.");
    sysvar(mysql, "max_execution_time", "both", "Statement execution timeout for SELECT, in milliseconds.");
    sysvar(mysql, "max_heap_table_size", "both", "Maximum size for in-memory tables.");
    sysvar(mysql, "optimizer_switch", "both", "Flags controlling optimizer behavior.");
    sysvar(mysql, "port", "global", "TCP port the server listens on.");
    sysvar(mysql, "read_only", "global", "Whether the server is in read-only mode.");
    sysvar(mysql, "secondary_engine", "session", "Preferred secondary engine for query offload.");
    sysvar(mysql, "server_id", "global", "Replication server id.");
    sysvar(mysql, "slow_query_log", "global", "Whether the slow query log is enabled.");
    sysvar(mysql, "sort_buffer_size", "both", "Per-session sort buffer size.");
    sysvar(mysql, "sql_mode", "both", "Active SQL modes, comma separated.");
    sysvar(mysql, "sql_safe_updates", "session", "Reject UPDATE/DELETE without a key or LIMIT.");
    sysvar(mysql, "time_zone", "both", "Session time zone.");
    sysvar(mysql, "tmpdir", "global", "Directory for temporary files.");
    sysvar(mysql, "transaction_isolation", "both", "Default transaction isolation level.");
    sysvar(mysql, "use_secondary_engine", "session", "Whether to offload eligible queries to the secondary engine.");
    sysvar(mysql, "version", "global", "Server version string.");
    sysvar(mysql, "version_comment", "global", "Build description of the server version.");
    sysvar(mysql, "wait_timeout", "both", "Seconds to wait for activity on a non-interactive connection.");

    // System functions.
    sysfunc(mysql, "abs", "ABS(X)", "Returns the absolute value of X.");
    sysfunc(mysql, "avg", "AVG([DISTINCT] expr)", "Returns the average value of expr.");
    sysfunc(mysql, "ceiling", "CEILING(X)", "Returns the smallest integer value not less than X.");
    sysfunc(mysql, "char_length", "CHAR_LENGTH(str)", "Returns the length of str in characters.");
    sysfunc(mysql, "coalesce", "COALESCE(value, ...)", "Returns the first non-NULL argument.");
    sysfunc(mysql, "concat", "CONCAT(str1, str2, ...)", "Returns the concatenation of its arguments.");
    sysfunc(mysql, "concat_ws", "CONCAT_WS(sep, str1, ...)", "Concatenate with separator, skipping NULLs.");
    sysfunc(mysql, "count", "COUNT([DISTINCT] expr)", "Returns the number of non-NULL values.");
    sysfunc(mysql, "curdate", "CURDATE()", "Returns the current date.");
    sysfunc(mysql, "current_user", "CURRENT_USER()", "Returns the authenticated user name and host.");
    sysfunc(mysql, "curtime", "CURTIME([fsp])", "Returns the current time.");
    sysfunc(mysql, "database", "DATABASE()", "Returns the default (current) database name.");
    sysfunc(mysql, "date_add", "DATE_ADD(date, INTERVAL expr unit)", "Adds a time interval to a date.");
    sysfunc(mysql, "date_format", "DATE_FORMAT(date, format)", "Formats a date per the format string.");
    sysfunc(mysql, "date_sub", "DATE_SUB(date, INTERVAL expr unit)", "Subtracts a time interval from a date.");
    sysfunc(mysql, "datediff", "DATEDIFF(expr1, expr2)", "Returns expr1 - expr2 in days.");
    sysfunc(mysql, "floor", "FLOOR(X)", "Returns the largest integer value not greater than X.");
    sysfunc(mysql, "format", "FORMAT(X, D)", "Formats X with D decimals and thousand separators.");
    sysfunc(mysql, "found_rows", "FOUND_ROWS()", "Rows the last SELECT would have returned without LIMIT.");
    sysfunc(mysql, "greatest", "GREATEST(value1, value2, ...)", "Returns the largest argument.");
    sysfunc(mysql, "group_concat", "GROUP_CONCAT(expr)", "Returns a concatenated string from a group.");
    sysfunc(mysql, "hex", "HEX(N_or_S)", "Hexadecimal representation of a number or string.");
    sysfunc(mysql, "if", "IF(expr1, expr2, expr3)", "Returns expr2 when expr1 is true, else expr3.");
    sysfunc(mysql, "ifnull", "IFNULL(expr1, expr2)", "Returns expr1 unless it is NULL, else expr2.");
    sysfunc(mysql, "instr", "INSTR(str, substr)", "Position of the first occurrence of substr in str.");
    sysfunc(mysql, "json_extract", "JSON_EXTRACT(json_doc, path, ...)", "Returns data from a JSON document.");
    sysfunc(mysql, "json_object", "JSON_OBJECT(key, val, ...)", "Creates a JSON object from key/value pairs.");
    sysfunc(mysql, "last_insert_id", "LAST_INSERT_ID()", "Value of the last AUTO_INCREMENT insert.");
    sysfunc(mysql, "least", "LEAST(value1, value2, ...)", "Returns the smallest argument.");
    sysfunc(mysql, "length", "LENGTH(str)", "Returns the length of str in bytes.");
    sysfunc(mysql, "lower", "LOWER(str)", "Returns str with all characters in lowercase.");
    sysfunc(mysql, "lpad", "LPAD(str, len, padstr)", "Left-pads str to len characters.");
    sysfunc(mysql, "ltrim", "LTRIM(str)", "Removes leading spaces.");
    sysfunc(mysql, "max", "MAX([DISTINCT] expr)", "Returns the maximum value of expr.");
    sysfunc(mysql, "md5", "MD5(str)", "MD5 checksum as a hex string.");
    sysfunc(mysql, "min", "MIN([DISTINCT] expr)", "Returns the minimum value of expr.");
    sysfunc(mysql, "now", "NOW([fsp])", "Returns the current date and time.");
    sysfunc(mysql, "nullif", "NULLIF(expr1, expr2)", "Returns NULL when expr1 = expr2, else expr1.");
    sysfunc(mysql, "rand", "RAND([N])", "Returns a random float in [0, 1).");
    sysfunc(mysql, "replace", "REPLACE(str, from_str, to_str)", "Replaces all occurrences of from_str.");
    sysfunc(mysql, "round", "ROUND(X, [D])", "Rounds X to D decimals.");
    sysfunc(mysql, "row_count", "ROW_COUNT()", "Rows changed by the last statement.");
    sysfunc(mysql, "rpad", "RPAD(str, len, padstr)", "Right-pads str to len characters.");
    sysfunc(mysql, "rtrim", "RTRIM(str)", "Removes trailing spaces.");
    sysfunc(mysql, "sha2", "SHA2(str, hash_length)", "SHA-2 checksum as a hex string.");
    sysfunc(mysql, "substring", "SUBSTRING(str, pos, [len])", "Returns a substring of str.");
    sysfunc(mysql, "sum", "SUM([DISTINCT] expr)", "Returns the sum of expr.");
    sysfunc(mysql, "sysdate", "SYSDATE([fsp])", "Time at which the function executes.");
    sysfunc(mysql, "trim", "TRIM([remstr FROM] str)", "Removes leading and trailing remstr (default space).");
    sysfunc(mysql, "unix_timestamp", "UNIX_TIMESTAMP([date])", "Seconds since the Unix epoch.");
    sysfunc(mysql, "upper", "UPPER(str)", "Returns str with all characters in uppercase.");
    sysfunc(mysql, "user", "USER()", "Returns the user name and host of the current client.");
    sysfunc(mysql, "uuid", "UUID()", "Returns a Universal Unique Identifier.");
    sysfunc(mysql, "version", "VERSION()", "Returns the server version string.");

    // Character sets.
    charset(mysql, "armscii8", "armscii8_general_ci");
    charset(mysql, "ascii", "ascii_general_ci");
    charset(mysql, "big5", "big5_chinese_ci");
    charset(mysql, "binary", "binary");
    charset(mysql, "cp1250", "cp1250_general_ci");
    charset(mysql, "cp1251", "cp1251_general_ci");
    charset(mysql, "gb18030", "gb18030_chinese_ci");
    charset(mysql, "gbk", "gbk_chinese_ci");
    charset(mysql, "latin1", "latin1_swedish_ci");
    charset(mysql, "latin2", "latin2_general_ci");
    charset(mysql, "sjis", "sjis_japanese_ci");
    charset(mysql, "tis620", "tis620_thai_ci");
    charset(mysql, "ucs2", "ucs2_general_ci");
    charset(mysql, "utf16", "utf16_general_ci");
    charset(mysql, "utf32", "utf32_general_ci");
    charset(mysql, "utf8mb3", "utf8mb3_general_ci");
    charset(mysql, "utf8mb4", "utf8mb4_0900_ai_ci");

    // Data types with their synonyms.
    datatype(mysql, "bigint", &[], "8-byte integer.");
    datatype(mysql, "binary", &[], "Fixed-length binary string.");
    datatype(mysql, "blob", &[], "Binary large object, up to 65535 bytes.");
    datatype(mysql, "bool", &["boolean"], "Synonym for TINYINT(1).");
    datatype(mysql, "char", &["character"], "Fixed-length string.");
    datatype(mysql, "date", &[], "Calendar date, 'YYYY-MM-DD'.");
    datatype(mysql, "datetime", &[], "Date and time, without time zone.");
    datatype(mysql, "decimal", &["dec", "numeric", "fixed"], "Exact fixed-point number.");
    datatype(mysql, "double", &["float8", "real"], "8-byte floating point number.");
    datatype(mysql, "enum", &[], "Enumeration of permitted string values.");
    datatype(mysql, "float", &["float4"], "4-byte floating point number.");
    datatype(mysql, "geometry", &[], "Spatial value of any type.");
    datatype(mysql, "int", &["integer", "int4"], "4-byte integer.");
    datatype(mysql, "json", &[], "JSON document, validated and optimized for access.");
    datatype(mysql, "longblob", &[], "Binary large object, up to 4GB.");
    datatype(mysql, "longtext", &[], "Character large object, up to 4GB.");
    datatype(mysql, "mediumint", &["int3", "middleint"], "3-byte integer.");
    datatype(mysql, "mediumtext", &[], "Character large object, up to 16MB.");
    datatype(mysql, "set", &[], "Set of permitted string values.");
    datatype(mysql, "smallint", &["int2"], "2-byte integer.");
    datatype(mysql, "text", &[], "Character large object, up to 65535 bytes.");
    datatype(mysql, "time", &[], "Time of day or elapsed time.");
    datatype(mysql, "timestamp", &[], "Date and time, stored in UTC.");
    datatype(mysql, "tinyint", &["int1"], "1-byte integer.");
    datatype(mysql, "varbinary", &[], "Variable-length binary string.");
    datatype(mysql, "varchar", &["varcharacter"], "Variable-length string.");
    datatype(mysql, "year", &[], "Year in 4-digit format.");

    // SQLite built-in functions.
    let sqlite = &globals.sqlite;
    sysfunc(sqlite, "abs", "abs(X)", "Absolute value of X.");
    sysfunc(sqlite, "avg", "avg(X)", "Average of all non-NULL X in a group.");
    sysfunc(sqlite, "changes", "changes()", "Rows changed by the most recent statement.");
    sysfunc(sqlite, "char", "char(X1, X2, ...)", "String from unicode code points.");
    sysfunc(sqlite, "coalesce", "coalesce(X, Y, ...)", "First non-NULL argument.");
    sysfunc(sqlite, "count", "count(X)", "Number of non-NULL X in a group.");
    sysfunc(sqlite, "date", "date(time-value, modifier, ...)", "Date as text: YYYY-MM-DD.");
    sysfunc(sqlite, "datetime", "datetime(time-value, modifier, ...)", "Date and time as text.");
    sysfunc(sqlite, "glob", "glob(X, Y)", "True when Y matches the glob pattern X.");
    sysfunc(sqlite, "group_concat", "group_concat(X, [Y])", "Concatenation of non-NULL X with separator Y.");
    sysfunc(sqlite, "hex", "hex(X)", "Hexadecimal rendering of the blob X.");
    sysfunc(sqlite, "ifnull", "ifnull(X, Y)", "First non-NULL of X and Y.");
    sysfunc(sqlite, "iif", "iif(X, Y, Z)", "Y when X is true, else Z.");
    sysfunc(sqlite, "instr", "instr(X, Y)", "1-based position of Y within X.");
    sysfunc(sqlite, "json", "json(X)", "Validates and minifies the JSON text X.");
    sysfunc(sqlite, "json_extract", "json_extract(X, P, ...)", "Extracts values from JSON text.");
    sysfunc(sqlite, "julianday", "julianday(time-value, ...)", "Fractional Julian day number.");
    sysfunc(sqlite, "last_insert_rowid", "last_insert_rowid()", "ROWID of the most recent insert.");
    sysfunc(sqlite, "length", "length(X)", "Characters in the string X.");
    sysfunc(sqlite, "like", "like(X, Y, [Z])", "True when Y matches the LIKE pattern X.");
    sysfunc(sqlite, "lower", "lower(X)", "X with ASCII characters lowercased.");
    sysfunc(sqlite, "ltrim", "ltrim(X, [Y])", "X with leading characters in Y removed.");
    sysfunc(sqlite, "max", "max(X)", "Maximum value in a group.");
    sysfunc(sqlite, "min", "min(X)", "Minimum value in a group.");
    sysfunc(sqlite, "nullif", "nullif(X, Y)", "NULL when X = Y, else X.");
    sysfunc(sqlite, "printf", "printf(FORMAT, ...)", "Formatted output, printf style.");
    sysfunc(sqlite, "quote", "quote(X)", "SQL literal text for the value X.");
    sysfunc(sqlite, "random", "random()", "Pseudo-random 64-bit integer.");
    sysfunc(sqlite, "replace", "replace(X, Y, Z)", "X with every Y replaced by Z.");
    sysfunc(sqlite, "round", "round(X, [Y])", "X rounded to Y decimals.");
    sysfunc(sqlite, "rtrim", "rtrim(X, [Y])", "X with trailing characters in Y removed.");
    sysfunc(sqlite, "strftime", "strftime(FORMAT, time-value, ...)", "Formats a date per FORMAT.");
    sysfunc(sqlite, "substr", "substr(X, Y, [Z])", "Substring of X starting at Y.");
    sysfunc(sqlite, "sum", "sum(X)", "Sum of all non-NULL X in a group.");
    sysfunc(sqlite, "total", "total(X)", "Like sum() but returns 0.0 for empty groups.");
    sysfunc(sqlite, "total_changes", "total_changes()", "Rows changed since the connection opened.");
    sysfunc(sqlite, "trim", "trim(X, [Y])", "X with leading and trailing characters in Y removed.");
    sysfunc(sqlite, "typeof", "typeof(X)", "Datatype name of X.");
    sysfunc(sqlite, "unicode", "unicode(X)", "Code point of the first character of X.");
    sysfunc(sqlite, "upper", "upper(X)", "X with ASCII characters uppercased.");
    sysfunc(sqlite, "zeroblob", "zeroblob(N)", "Blob of N zero bytes.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_symbol_is_idempotent() {
        let registry = SymbolRegistry::new();
        let make = |text: &str| SymbolDescriptor {
            kind: SymbolKind::SystemFunction,
            description: vec![text.to_string()],
            meta: SymbolMeta::None,
        };
        registry.add_symbol("NOW", make("first"));
        registry.add_symbol("now", make("second"));
        let found = registry.lookup("Now").unwrap();
        assert_eq!(found.description, vec!["second".to_string()]);
        assert_eq!(registry.names_of_kind(SymbolKind::SystemFunction).len(), 1);
    }

    #[test]
    fn overlay_prefers_session_layers() {
        let mut overlay = SymbolOverlay::new(ServiceLanguage::MySql);
        let layer = overlay.push_layer();
        layer.add_symbol(
            "version",
            SymbolDescriptor {
                kind: SymbolKind::Table,
                description: vec!["session table".to_string()],
                meta: SymbolMeta::None,
            },
        );
        assert_eq!(overlay.lookup("version").unwrap().kind, SymbolKind::Table);
        overlay.clear_layers();
        // Falls back to the global entry (whenever loading finished).
        if global().fully_loaded() {
            assert_ne!(overlay.lookup("version").unwrap().kind, SymbolKind::Table);
        }
    }
}
