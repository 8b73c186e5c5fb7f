use std::sync::Arc;

use async_trait::async_trait;
use squill::TaskError;
use squill::completion::{NullSchemaProvider, SchemaProvider};
use squill::errors::SchemaError;
use squill::models::enums::{QueryType, ServiceLanguage};
use squill::pool::{PoolConfig, WorkerPool};
use squill::protocol::{ResultPayload, TaskData};

fn query_type_task(sql: &str) -> TaskData {
    TaskData::QueryType {
        language: ServiceLanguage::MySql,
        version: 80031,
        sql: sql.to_string(),
    }
}

/// Takes its time answering, to hold a worker busy in tests.
struct SlowProvider;

#[async_trait]
impl SchemaProvider for SlowProvider {
    async fn schemas(&self) -> Result<Vec<String>, SchemaError> {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        Ok(vec!["sakila".into()])
    }

    async fn tables(&self, _schema: &str) -> Result<Vec<String>, SchemaError> {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        Ok(vec!["actor".into()])
    }

    async fn columns(&self, _schema: &str, _table: &str) -> Result<Vec<String>, SchemaError> {
        Ok(Vec::new())
    }
}

/// A suggestion request that makes the worker await the (slow) schema
/// provider.
fn slow_task() -> TaskData {
    TaskData::Suggestion {
        language: ServiceLanguage::MySql,
        version: 80031,
        sql: "SELECT * FROM ".into(),
        offset: 14,
        line: 1,
        column: 14,
        current_schema: "sakila".into(),
    }
}

#[tokio::test]
async fn round_trip_through_a_worker() {
    let pool = WorkerPool::new();
    let result = pool
        .run_task(query_type_task("INSERT INTO t VALUES (1)"))
        .await
        .expect("task resolves");
    assert!(result.final_);
    match result.payload {
        ResultPayload::QueryType(qt) => assert_eq!(qt, QueryType::Insert),
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn results_route_back_to_their_submitters() {
    let pool = Arc::new(WorkerPool::with_config(
        PoolConfig { workers: 3, max_pending: 1000 },
        Arc::new(NullSchemaProvider),
    ));

    let mut handles = Vec::new();
    for index in 0..24u32 {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            let (sql, expected) = if index % 2 == 0 {
                ("INSERT INTO t VALUES (1)", QueryType::Insert)
            } else {
                ("SELECT 1", QueryType::Select)
            };
            let result = pool.run_task(query_type_task(sql)).await.expect("resolves");
            match result.payload {
                ResultPayload::QueryType(qt) => assert_eq!(qt, expected, "task {index}"),
                other => panic!("unexpected payload: {other:?}"),
            }
        }));
    }

    for handle in handles {
        handle.await.expect("no panics");
    }
}

#[tokio::test]
async fn tasks_queue_beyond_worker_count() {
    let pool = WorkerPool::with_config(
        PoolConfig { workers: 1, max_pending: 100 },
        Arc::new(NullSchemaProvider),
    );

    let mut pending = Vec::new();
    for _ in 0..10 {
        pending.push(pool.submit(query_type_task("SELECT 1")).expect("accepted"));
    }

    // Task ids are unique and monotonically assigned.
    let ids: Vec<u64> = pending.iter().map(|p| p.task_id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ids, sorted);

    for task in pending {
        assert!(task.final_result().await.is_ok());
    }
}

#[tokio::test]
async fn cancelled_task_never_resolves_its_caller() {
    let pool = WorkerPool::with_config(
        PoolConfig { workers: 1, max_pending: 100 },
        Arc::new(SlowProvider),
    );

    // Occupy the single worker, then queue the victim behind it.
    let busy = pool.submit(slow_task()).expect("accepted");
    let victim = pool.submit(query_type_task("SELECT 2")).expect("accepted");
    let victim_id = victim.task_id;

    assert!(pool.cancel(victim_id));
    // A second cancel is a no-op, not an error.
    assert!(!pool.cancel(victim_id));

    match victim.final_result().await {
        Err(TaskError::Cancelled(id)) => assert_eq!(id, victim_id),
        other => panic!("cancelled task must not resolve: {other:?}"),
    }

    // The pool keeps serving tasks afterwards.
    assert!(busy.final_result().await.is_ok());
    assert!(pool.run_task(query_type_task("SELECT 1")).await.is_ok());
}

#[tokio::test]
async fn queue_overflow_is_rejected() {
    let pool = WorkerPool::with_config(
        PoolConfig { workers: 1, max_pending: 2 },
        Arc::new(SlowProvider),
    );

    // Worker busy; only two pending slots remain.
    let busy = pool.submit(slow_task()).expect("accepted");

    let mut accepted = Vec::new();
    let mut rejected = 0;
    for _ in 0..5 {
        match pool.submit(query_type_task("SELECT 1")) {
            Ok(task) => accepted.push(task),
            Err(TaskError::QueueFull) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted.len(), 2);
    assert_eq!(rejected, 3);

    assert!(busy.final_result().await.is_ok());
    for task in accepted {
        assert!(task.final_result().await.is_ok());
    }
}

#[tokio::test]
async fn cleanup_does_not_disturb_the_pool() {
    let pool = WorkerPool::new();
    pool.cleanup(ServiceLanguage::MySql);

    let result = pool.run_task(query_type_task("SELECT 1")).await.expect("resolves");
    assert!(matches!(result.payload, ResultPayload::QueryType(QueryType::Select)));
}

#[tokio::test]
async fn shutdown_fails_new_submissions() {
    let pool = WorkerPool::new();
    pool.shutdown();
    assert!(matches!(
        pool.submit(query_type_task("SELECT 1")),
        Err(TaskError::PoolShutdown)
    ));
}

#[tokio::test]
async fn split_task_through_the_pool() {
    let pool = WorkerPool::new();
    let result = pool
        .run_task(TaskData::Split {
            language: ServiceLanguage::MySql,
            sql: "SELECT 1$$ SELECT 2$$".into(),
            delimiter: "$$".into(),
        })
        .await
        .expect("resolves");

    match result.payload {
        ResultPayload::Ranges(ranges) => {
            assert_eq!(ranges.len(), 2);
            assert_eq!(ranges[0].span.start, 0);
            assert_eq!(ranges[0].span.length, 10);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn suggestion_awaits_the_schema_provider() {
    let pool = WorkerPool::with_provider(Arc::new(SlowProvider));
    let result = pool.run_task(slow_task()).await.expect("resolves");
    match result.payload {
        ResultPayload::Completions(completions) => {
            let names: Vec<&String> =
                completions.candidates.iter().flat_map(|c| c.names.iter()).collect();
            assert!(names.iter().any(|n| n.as_str() == "actor"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}
