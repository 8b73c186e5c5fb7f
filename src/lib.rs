pub mod completion;
pub mod errors;
pub mod keywords;
pub mod lexer;
pub mod lexer_mysql;
pub mod lexer_python;
pub mod lexer_sqlite;
pub mod models;
pub mod pool;
pub mod protocol;
pub mod services_mysql;
pub mod services_script;
pub mod services_sqlite;
pub mod splitter;
pub mod symbols;
pub mod worker;

pub use completion::{NullSchemaProvider, SchemaProvider};
pub use errors::TaskError;
pub use models::enums::{MySqlVersion, QueryType, ServiceLanguage, StatementFinishState};
pub use models::structs::{CompletionData, ParserError, StatementSpan, SymbolInfo, Token};
pub use pool::{PendingTask, PoolConfig, WorkerPool};
pub use protocol::{ResultPayload, TaskData, TaskRequest, TaskResponse, TaskResult};

/// Set up env_logger for embedders that don't bring their own logging.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_module("squill", log::LevelFilter::Debug)
        .try_init();
}
