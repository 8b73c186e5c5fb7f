//! Worker execution.
//!
//! Each worker is a long-lived thread processing one task at a time to
//! completion. Operations run inside `catch_unwind` so a panicking task
//! fails only itself; a drop guard notifies the dispatcher if the
//! thread ever unwinds out of its loop so in-flight work is not left
//! pending forever. Per-session symbol overlays live here and are
//! dropped on `cleanup`.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

use log::{debug, error, warn};

use crate::completion::{self, CompletionRequest, SchemaProvider};
use crate::models::enums::{MySqlVersion, QueryType, ServiceLanguage};
use crate::models::structs::CompletionData;
use crate::protocol::{ResultPayload, TaskData, TaskRequest, TaskResponse, TaskResult};
use crate::services_mysql::MySqlParsingServices;
use crate::services_script::ScriptParsingServices;
use crate::services_sqlite::SqliteParsingServices;
use crate::splitter;
use crate::symbols::SymbolOverlay;

/// Messages into a worker.
pub(crate) enum WorkerMessage {
    Run(TaskRequest),
    Shutdown,
}

/// Messages from workers back to the dispatcher's router.
pub(crate) enum RouterEvent {
    Result { worker: usize, response: TaskResponse },
    WorkerLost { worker: usize, task_id: Option<u64> },
}

/// Spawns one worker thread.
pub(crate) fn spawn_worker(
    id: usize,
    receiver: Receiver<WorkerMessage>,
    events: Sender<RouterEvent>,
    provider: Arc<dyn SchemaProvider>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("analysis-worker-{id}"))
        .spawn(move || {
            let guard = LossGuard { id, events: events.clone(), armed: true, current: None };
            run_loop(id, receiver, &events, provider, guard);
        })
}

struct LossGuard {
    id: usize,
    events: Sender<RouterEvent>,
    armed: bool,
    current: Option<u64>,
}

impl Drop for LossGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("worker {} terminated unexpectedly", self.id);
            let _ = self
                .events
                .send(RouterEvent::WorkerLost { worker: self.id, task_id: self.current });
        }
    }
}

fn run_loop(
    id: usize,
    receiver: Receiver<WorkerMessage>,
    events: &Sender<RouterEvent>,
    provider: Arc<dyn SchemaProvider>,
    mut guard: LossGuard,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("worker {id}: failed to build runtime: {e}");
            return; // Guard reports the loss.
        }
    };

    let mut session = WorkerSession::new();

    while let Ok(message) = receiver.recv() {
        match message {
            WorkerMessage::Shutdown => break,
            WorkerMessage::Run(request) => {
                let task_id = request.task_id;
                guard.current = Some(task_id);
                debug!("worker {id}: task {task_id} starting");

                if !request.data.expects_response() {
                    // Control message: release session caches, answer
                    // nothing. Does not occupy the worker from the
                    // dispatcher's point of view.
                    session.cleanup(request.data.language());
                    guard.current = None;
                    continue;
                }

                let payload = panic::catch_unwind(AssertUnwindSafe(|| {
                    execute(request.data, &mut session, provider.as_ref(), &runtime)
                }))
                .unwrap_or_else(|cause| {
                    let message = cause
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| cause.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "task panicked".to_string());
                    error!("worker {id}: task {task_id} panicked: {message}");
                    ResultPayload::Error(message)
                });

                guard.current = None;
                let response =
                    TaskResponse { task_id, data: TaskResult::final_result(payload) };
                if events.send(RouterEvent::Result { worker: id, response }).is_err() {
                    break; // Dispatcher is gone; nothing left to do.
                }
            }
        }
    }

    guard.armed = false;
    debug!("worker {id}: clean shutdown");
}

/// Per-worker session state: one symbol overlay per language, kept
/// until a `cleanup` message drops the session layers.
struct WorkerSession {
    overlays: HashMap<ServiceLanguage, SymbolOverlay>,
}

impl WorkerSession {
    fn new() -> Self {
        Self { overlays: HashMap::new() }
    }

    fn overlay(&mut self, language: ServiceLanguage) -> &SymbolOverlay {
        self.overlays.entry(language).or_insert_with(|| SymbolOverlay::new(language))
    }

    fn cleanup(&mut self, language: ServiceLanguage) {
        if let Some(overlay) = self.overlays.get_mut(&language) {
            overlay.clear_layers();
        }
    }
}

/// The api dispatch. Adding a `TaskData` variant without a match arm
/// here is a compile error.
fn execute(
    data: TaskData,
    session: &mut WorkerSession,
    provider: &dyn SchemaProvider,
    runtime: &tokio::runtime::Runtime,
) -> ResultPayload {
    match data {
        TaskData::QueryType { language, version, sql } => {
            let query_type = match language {
                ServiceLanguage::MySql => {
                    MySqlParsingServices::new(version, "").determine_query_type(&sql)
                }
                ServiceLanguage::Sqlite => {
                    SqliteParsingServices::new().determine_query_type(&sql)
                }
                ServiceLanguage::Script => QueryType::Unknown,
            };
            ResultPayload::QueryType(query_type)
        }

        TaskData::Split { language, sql, delimiter } => {
            let ranges = match language {
                ServiceLanguage::Script => {
                    ScriptParsingServices::new().determine_statement_ranges(&sql)
                }
                _ => splitter::determine_statement_ranges(&sql, &delimiter, language),
            };
            ResultPayload::Ranges(ranges)
        }

        TaskData::Validate { language, version, sql_mode, sql, offset } => {
            let content = match language {
                ServiceLanguage::MySql => {
                    MySqlParsingServices::new(version, &sql_mode).validate(&sql, offset)
                }
                ServiceLanguage::Sqlite => SqliteParsingServices::new().validate(&sql, offset),
                ServiceLanguage::Script => ScriptParsingServices::new().validate(&sql, offset),
            };
            ResultPayload::Diagnostics(content)
        }

        TaskData::Info { language, version, sql, offset } => {
            let info = match language {
                ServiceLanguage::MySql => MySqlParsingServices::new(version, "").quick_info(
                    &sql,
                    offset,
                    session.overlay(language),
                ),
                ServiceLanguage::Sqlite => SqliteParsingServices::new().quick_info(
                    &sql,
                    offset,
                    session.overlay(language),
                ),
                ServiceLanguage::Script => None,
            };
            ResultPayload::Info(info)
        }

        TaskData::Suggestion { language, version, sql, offset, line: _, column: _, current_schema } => {
            let completions = match language {
                ServiceLanguage::Script => CompletionData::default(),
                _ => {
                    let tokens = match language {
                        ServiceLanguage::MySql => {
                            MySqlParsingServices::new(version, "").tokenize(&sql)
                        }
                        _ => SqliteParsingServices::new().tokenize(&sql),
                    };
                    let request = CompletionRequest {
                        sql: &sql,
                        tokens: &tokens,
                        offset,
                        language,
                        version: MySqlVersion::from_number(version),
                        current_schema,
                    };
                    // The one legitimate suspension inside a worker:
                    // waiting for the schema provider.
                    runtime.block_on(completion::collect_completions(
                        &request,
                        session.overlay(language),
                        provider,
                    ))
                }
            };
            ResultPayload::Completions(completions)
        }

        TaskData::PreprocessStatement {
            language,
            version,
            sql_mode,
            sql,
            offset,
            count,
            force_secondary_engine,
        } => {
            let (query, changed) = match language {
                ServiceLanguage::MySql => MySqlParsingServices::new(version, &sql_mode)
                    .preprocess_statement(&sql, offset, count, force_secondary_engine),
                ServiceLanguage::Sqlite => {
                    SqliteParsingServices::new().preprocess_statement(&sql, offset, count)
                }
                ServiceLanguage::Script => (sql, false),
            };
            ResultPayload::Rewritten { query, changed }
        }

        TaskData::AddSemicolon { language, version, sql_mode, sql } => {
            let (query, changed) = match language {
                ServiceLanguage::MySql => {
                    MySqlParsingServices::new(version, &sql_mode).check_and_add_semicolon(&sql)
                }
                ServiceLanguage::Sqlite => SqliteParsingServices::new().check_and_add_semicolon(&sql),
                ServiceLanguage::Script => (sql, false),
            };
            ResultPayload::Rewritten { query, changed }
        }

        TaskData::Parameters { language, version, sql_mode, sql } => {
            let parameters = match language {
                ServiceLanguage::MySql => MySqlParsingServices::new(version, &sql_mode)
                    .extract_query_parameters(&sql),
                _ => Vec::new(),
            };
            ResultPayload::Parameters(parameters)
        }

        TaskData::Tokenize { language, version, sql_mode: _, sql, statements } => {
            let buffer = match sql {
                Some(sql) => sql,
                None => statements.join("\n"),
            };
            let tokens = match language {
                ServiceLanguage::MySql => MySqlParsingServices::new(version, "").tokenize(&buffer),
                ServiceLanguage::Sqlite => SqliteParsingServices::new().tokenize(&buffer),
                ServiceLanguage::Script => ScriptParsingServices::new().tokenize(&buffer),
            };
            ResultPayload::Tokens(tokens)
        }

        // Handled before dispatch; unreachable by construction.
        TaskData::Cleanup { .. } => ResultPayload::Error("cleanup produces no result".into()),
    }
}
