use serde::{Deserialize, Serialize};

use crate::models::enums::{
    CompletionKind, Severity, StatementFinishState, SymbolKind, TokenChannel, TokenKind,
};

/// One lexed token. Immutable once emitted; `stop` is exclusive.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub stop: usize,
    /// 1-based line of the first character.
    pub line: u32,
    /// 0-based column of the first character.
    pub column: u32,
    pub channel: TokenChannel,
}

impl Token {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }

    /// Uppercased text, used for keyword comparisons. SQL keywords are
    /// plain ASCII so a simple conversion is enough.
    pub fn upper(&self) -> String {
        self.text.to_ascii_uppercase()
    }
}

/// Start and length of a region in the input buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

/// One statement found by the splitter. The span includes leading
/// whitespace and the terminating delimiter; `content_start` is where
/// non-whitespace, non-comment content begins.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StatementSpan {
    /// The delimiter used to find this statement. For a
    /// `DelimiterChange` span this holds the new delimiter.
    pub delimiter: String,
    pub span: TextSpan,
    pub content_start: usize,
    pub state: StatementFinishState,
}

/// A diagnostic produced by validation.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ParserError {
    pub message: String,
    /// Offset from the beginning of the input to the error position.
    pub char_offset: usize,
    /// 1-based error line.
    pub line: u32,
    /// 0-based char offset within the error line.
    pub offset: u32,
    pub length: usize,
}

/// A diagnostic as delivered to the editor host.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub span: TextSpan,
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

/// The range and text a quick-info symbol was resolved from.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SymbolDefinition {
    pub text: String,
    pub span: TextSpan,
}

/// Quick-info result for the symbol under the cursor.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub kind: SymbolKind,
    pub name: String,
    /// Description lines: typically a signature line and a prose line.
    pub description: Vec<String>,
    pub definition: Option<SymbolDefinition>,
}

/// A group of DB objects the completion result asks the host to offer.
/// Schema/table sets narrow the group (columns need both).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CompletionCandidate {
    pub kind: CompletionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
    /// Concrete names, when already known (live schema lookups).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

/// Everything collected during a completion call.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CompletionData {
    /// True when the word being completed is already quoted.
    pub is_quoted: bool,
    pub keywords: Vec<String>,
    /// Keywords which can also be called as functions.
    pub functions: Vec<String>,
    pub candidates: Vec<CompletionCandidate>,
    /// Table (or alias) references found in the statement.
    pub tables: Vec<String>,
}
