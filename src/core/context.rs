use crate::domain::model::Table;
use crate::utils::error::{ReportError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

pub const EMPLOYEE_TABLE: &str = "employee_salaries";

/// Query execution context. Holds the registered tables for one run and
/// releases them when dropped, so an early `?` return still cleans up.
pub struct QueryContext {
    app_name: String,
    tables: HashMap<String, Arc<Table>>,
    started_at: Instant,
    active: bool,
}

impl QueryContext {
    pub fn acquire(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        tracing::info!("🔌 Query context '{}' started", app_name);
        Self {
            app_name,
            tables: HashMap::new(),
            started_at: Instant::now(),
            active: true,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Register (or replace) a table under a view name.
    pub fn register_table(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        tracing::debug!("Registered table '{}' ({} rows)", name, table.row_count());
        self.tables.insert(name, Arc::new(table));
    }

    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        if !self.active {
            return Err(ReportError::query(format!(
                "query context '{}' has been stopped",
                self.app_name
            )));
        }

        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::query(format!("table or view not found: {}", name)))
    }

    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.tables.clear();
        tracing::info!(
            "🔌 Query context '{}' stopped after {:?}",
            self.app_name,
            self.started_at.elapsed()
        );
    }
}

impl Drop for QueryContext {
    fn drop(&mut self) {
        self.release();
    }
}
