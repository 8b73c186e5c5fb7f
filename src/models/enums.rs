use serde::{Deserialize, Serialize};

/// Languages served by the analysis engine. `Script` is the embedded
/// Python-like scripting grammar used in notebook cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLanguage {
    MySql,
    Sqlite,
    Script,
}

/// Version buckets for the MySQL grammar. Numeric server versions
/// (e.g. 80031) collapse into these.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum MySqlVersion {
    Unknown,
    V8_0,
    V8_1,
    V8_2,
    V8_3,
    V8_4,
}

impl MySqlVersion {
    /// Collapse a numeric server version into a version bucket.
    /// Accepts short forms too: 8 and 800 normalize to 80000.
    pub fn from_number(version: u32) -> Self {
        let mut version = version;
        if version < 100 {
            version *= 10000;
        } else if version < 10000 {
            version *= 100;
        }

        let major = version / 10000;
        let minor = (version / 100) % 100;
        if major >= 8 {
            match minor {
                1 => MySqlVersion::V8_1,
                2 => MySqlVersion::V8_2,
                3 => MySqlVersion::V8_3,
                4 => MySqlVersion::V8_4,
                _ => MySqlVersion::V8_0,
            }
        } else {
            MySqlVersion::Unknown
        }
    }
}

/// SQL modes that change lexing behavior.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SqlMode {
    AnsiQuotes,
    HighNotPrecedence,
    PipesAsConcat,
    IgnoreSpace,
    NoBackslashEscapes,
}

impl SqlMode {
    /// Parse a server `sql_mode` string into the set of modes the lexer
    /// cares about. Combination modes expand like the server does it.
    pub fn set_from_string(modes: &str) -> std::collections::HashSet<SqlMode> {
        let mut result = std::collections::HashSet::new();
        for part in modes.to_uppercase().split(',') {
            match part.trim() {
                "ANSI" | "DB2" | "MAXDB" | "MSSQL" | "ORACLE" | "POSTGRESQL" => {
                    result.insert(SqlMode::AnsiQuotes);
                    result.insert(SqlMode::PipesAsConcat);
                    result.insert(SqlMode::IgnoreSpace);
                }
                "ANSI_QUOTES" => {
                    result.insert(SqlMode::AnsiQuotes);
                }
                "PIPES_AS_CONCAT" => {
                    result.insert(SqlMode::PipesAsConcat);
                }
                "NO_BACKSLASH_ESCAPES" => {
                    result.insert(SqlMode::NoBackslashEscapes);
                }
                "IGNORE_SPACE" => {
                    result.insert(SqlMode::IgnoreSpace);
                }
                "HIGH_NOT_PRECEDENCE" | "MYSQL323" | "MYSQL40" => {
                    result.insert(SqlMode::HighNotPrecedence);
                }
                _ => {}
            }
        }

        result
    }
}

/// The classification produced by scanning the first tokens of a
/// statement. Not every dialect produces every variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum QueryType {
    Unknown,
    Ambiguous,

    // DDL
    AlterDatabase,
    AlterEvent,
    AlterFunction,
    AlterProcedure,
    AlterServer,
    AlterTable,
    AlterTablespace,
    AlterUser,
    AlterView,
    CreateDatabase,
    CreateEvent,
    CreateFunction,
    CreateIndex,
    CreateProcedure,
    CreateTable,
    CreateTrigger,
    CreateUser,
    CreateView,
    DropDatabase,
    DropEvent,
    DropFunction,
    DropIndex,
    DropProcedure,
    DropTable,
    DropTrigger,
    DropUser,
    DropView,
    RenameTable,
    TruncateTable,

    // DML
    Call,
    Delete,
    Do,
    Insert,
    LoadData,
    Replace,
    Select,
    Table,
    Values,
    Update,

    // Transactions
    StartTransaction,
    BeginWork,
    Commit,
    RollbackWork,
    Savepoint,
    ReleaseSavepoint,
    Lock,
    Unlock,
    Xa,

    // Administration
    Grant,
    Revoke,
    AnalyzeTable,
    CheckTable,
    OptimizeTable,
    RepairTable,
    Set,
    Show,
    ShowColumns,
    ShowCreateTable,
    ShowDatabases,
    ShowGrants,
    ShowProcessList,
    ShowStatus,
    ShowTables,
    ShowVariables,
    Flush,
    Kill,

    // SQLite specifics
    Attach,
    Detach,
    Pragma,
    Reindex,
    Vacuum,

    ExplainStatement,
    ExplainTable,
    Help,
    Use,
}

/// How a statement produced by the splitter ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum StatementFinishState {
    /// Ends with the active delimiter.
    Complete,
    /// Ends in an unterminated multi line (or trailing single line) comment.
    OpenComment,
    /// A quoted string or identifier was never closed.
    OpenString,
    /// The buffer ended before a delimiter showed up.
    NoDelimiter,
    /// The statement is a DELIMITER directive changing the active delimiter.
    DelimiterChange,
}

/// Symbol categories carried by the symbol registry and quick info.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SymbolKind {
    Unknown,
    Keyword,
    Schema,
    Table,
    View,
    Column,
    SystemVariable,
    SystemFunction,
    UserVariable,
    Charset,
    Collation,
    DataType,
}

/// Candidate groups a completion result can ask the host to expand.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum CompletionKind {
    Keyword,
    Column,
    UserVariable,
    Table,
    View,
    Schema,
    Function,
    SystemFunction,
    SystemVariable,
    Charset,
    Collation,
}

/// Severity for diagnostics surfaced to the editor.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
    Suggestion,
    Message,
}

/// Channel a token is emitted on. Whitespace and comments live on the
/// hidden channel so analysis skips them while tools can still see them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TokenChannel {
    Default,
    Hidden,
}

/// Lexical classification of a token. One closed set shared by all
/// dialects; kinds a dialect never produces simply don't show up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    /// `"..."` when it quotes an identifier (AnsiQuotes, SQLite).
    QuotedIdentifier,
    BackTickIdentifier,
    /// `[...]` quoting (SQLite compatibility syntax).
    BracketIdentifier,
    /// An identifier-shaped word found in the active keyword set.
    Keyword,

    SingleQuotedText,
    DoubleQuotedText,
    Number,
    HexNumber,
    BinNumber,

    Operator,
    Dot,
    Comma,
    Semicolon,
    Colon,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,

    /// `@name` user variable reference.
    AtVariable,
    /// `@@name` system variable reference.
    AtAtVariable,
    /// `?` placeholder.
    ParamMarker,

    LineComment,
    BlockComment,
    /// A `/*` comment that never closes; validation reports it.
    OpenBlockComment,

    /// Logical newline (Script dialect).
    Newline,
    /// Indentation increased (Script dialect).
    Indent,
    /// Indentation decreased (Script dialect).
    Dedent,

    Invalid,
    Eof,
}

impl TokenKind {
    /// True for every kind that can act as an identifier before keyword
    /// reclassification has looked at it.
    pub fn is_identifier_shaped(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::QuotedIdentifier
                | TokenKind::BackTickIdentifier
                | TokenKind::BracketIdentifier
        )
    }
}
