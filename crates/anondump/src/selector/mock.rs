//! In-memory executor for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::result::ResultSet;
use crate::core::traits::{Dialect, QueryExecutor};
use crate::core::value::SqlValue;
use crate::drivers::PostgresDialect;
use crate::error::Result;

/// Records every statement and answers with queued result sets.
///
/// When the queue is empty an empty result set is returned.
pub(crate) struct MockExecutor {
    dialect: PostgresDialect,
    responses: Mutex<VecDeque<ResultSet>>,
    calls: Mutex<Vec<(String, Vec<SqlValue<'static>>)>>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self {
            dialect: PostgresDialect::new(),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_response(self, result: ResultSet) -> Self {
        self.responses.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<SqlValue<'static>>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn query(&self, sql: &str, params: &[SqlValue<'static>]) -> Result<ResultSet> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
