use crate::core::context::{QueryContext, EMPLOYEE_TABLE};
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub const APP_NAME: &str = "CSV Data Analysis";

/// Runs a report pipeline inside a query context that lives for the whole
/// run and is released on every exit path.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("Starting salary report...");
        let mut ctx = QueryContext::acquire(APP_NAME);

        // Extract
        tracing::info!("Loading input data...");
        let table = self.pipeline.extract().await?;
        tracing::info!("Loaded {} records", table.row_count());
        ctx.register_table(EMPLOYEE_TABLE, table);
        self.monitor.log_stage("extract");

        // Transform
        tracing::info!("Running aggregation queries...");
        let report = self.pipeline.transform(&ctx).await?;
        self.monitor.log_stage("transform");

        // Load
        tracing::info!("Rendering charts...");
        let written = self.pipeline.load(report).await?;
        self.monitor.log_stage("load");

        ctx.stop();
        self.monitor.log_final_stats();
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ColumnType, Table, Value};
    use crate::domain::report::{AggregationReport, SalaryStats};
    use crate::utils::error::ReportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records which stages ran; optionally fails one of them.
    struct ScriptedPipeline {
        fail_at: Option<&'static str>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedPipeline {
        fn new(fail_at: Option<&'static str>) -> Self {
            Self {
                fail_at,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn step(&self, stage: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(stage);
            if self.fail_at == Some(stage) {
                return Err(ReportError::query(format!("{} failed", stage)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Pipeline for ScriptedPipeline {
        async fn extract(&self) -> Result<Table> {
            self.step("extract")?;
            Ok(Table::new(
                vec!["Base_Salary".to_string()],
                vec![ColumnType::Integer],
                vec![vec![Value::Int(100)]],
            ))
        }

        async fn transform(&self, ctx: &QueryContext) -> Result<AggregationReport> {
            self.step("transform")?;
            let table = ctx.table(EMPLOYEE_TABLE)?;
            Ok(AggregationReport {
                overall: SalaryStats {
                    total_records: table.row_count(),
                    avg: Some(100.0),
                    min: Some(100.0),
                    max: Some(100.0),
                },
                top_paid: vec![],
                by_gender: vec![],
                department_counts: vec![],
                department_salaries: vec![],
            })
        }

        async fn load(&self, report: AggregationReport) -> Result<Vec<String>> {
            self.step("load")?;
            Ok(vec![format!("{} records", report.overall.total_records)])
        }
    }

    #[tokio::test]
    async fn test_run_executes_stages_in_order() {
        let engine = ReportEngine::new(ScriptedPipeline::new(None));

        let written = engine.run().await.unwrap();

        assert_eq!(written, vec!["1 records".to_string()]);
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_stages() {
        let engine = ReportEngine::new(ScriptedPipeline::new(Some("transform")));

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, ReportError::QueryError { .. }));
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "transform"]
        );
    }

    #[tokio::test]
    async fn test_run_with_monitoring() {
        let engine = ReportEngine::new_with_monitoring(ScriptedPipeline::new(None), true);
        assert!(engine.run().await.is_ok());
    }
}
