use crate::core::aggregation::{self, TOP_PAID_LIMIT};
use crate::core::charts::{ChartRenderer, BAR_CHART_FILE, BOX_PLOT_FILE, PIE_CHART_FILE};
use crate::core::context::{QueryContext, EMPLOYEE_TABLE};
use crate::core::loader::parse_csv;
use crate::core::summary::{format_overview, format_report};
use crate::domain::model::Table;
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::domain::report::AggregationReport;
use crate::utils::error::{ReportError, Result};
use std::path::Path;

pub struct SalaryReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    renderer: ChartRenderer,
}

impl<S: Storage, C: ConfigProvider> SalaryReportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let renderer = ChartRenderer::new(config.font_path());
        Self::with_renderer(storage, config, renderer)
    }

    pub fn with_renderer(storage: S, config: C, renderer: ChartRenderer) -> Self {
        Self {
            storage,
            config,
            renderer,
        }
    }

    fn output_path(&self, file_name: &str) -> String {
        Path::new(self.config.output_dir())
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }

    async fn save_chart(&self, file_name: &str, png: Vec<u8>) -> Result<String> {
        let path = self.output_path(file_name);
        self.storage.write_file(&path, &png).await?;
        tracing::info!("🖼️ Saved chart {}", path);
        Ok(path)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SalaryReportPipeline<S, C> {
    async fn extract(&self) -> Result<Table> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input file: {}", input_path);
        let data = self.storage.read_file(input_path).await?;

        let delimiter = u8::try_from(self.config.delimiter()).map_err(|_| {
            ReportError::InvalidConfigValueError {
                field: "delimiter".to_string(),
                value: self.config.delimiter().to_string(),
                reason: "Delimiter must be a single-byte character".to_string(),
            }
        })?;
        let table = parse_csv(&data, delimiter)?;
        tracing::debug!(
            "Loaded {} rows with columns {:?}",
            table.row_count(),
            table.columns()
        );

        print!("{}", format_overview(&table));
        Ok(table)
    }

    async fn transform(&self, ctx: &QueryContext) -> Result<AggregationReport> {
        let table = ctx.table(EMPLOYEE_TABLE)?;

        let report = AggregationReport {
            overall: aggregation::overall_stats(&table)?,
            top_paid: aggregation::top_paid(&table, TOP_PAID_LIMIT)?,
            by_gender: aggregation::average_by_gender(&table)?,
            department_counts: aggregation::count_by_department(&table)?,
            department_salaries: aggregation::salary_by_department(&table)?,
        };
        tracing::debug!(
            "Aggregated {} genders and {} departments",
            report.by_gender.len(),
            report.department_counts.len()
        );

        print!("{}", format_report(&report));
        Ok(report)
    }

    async fn load(&self, report: AggregationReport) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(3);

        let bar = self.renderer.bar_chart(&report.top_paid)?;
        written.push(self.save_chart(BAR_CHART_FILE, bar).await?);

        let pie = self.renderer.pie_chart(&report.department_counts)?;
        written.push(self.save_chart(PIE_CHART_FILE, pie).await?);

        let box_plot = self.renderer.box_plot(&report.department_salaries)?;
        written.push(self.save_chart(BOX_PLOT_FILE, box_plot).await?);

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &[u8]) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ReportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        delimiter: char,
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "salaries.csv"
        }

        fn output_dir(&self) -> &str {
            "images"
        }

        fn delimiter(&self) -> char {
            self.delimiter
        }

        fn font_path(&self) -> Option<&str> {
            None
        }
    }

    const SAMPLE: &str = "\
Department,Department_Name,Division,Gender,Base_Salary
POL,Police,Patrol,M,100
FRS,Fire and Rescue,Operations,F,200
POL,Police,Investigations,F,150
";

    fn pipeline(data: &str, delimiter: char) -> SalaryReportPipeline<MockStorage, MockConfig> {
        SalaryReportPipeline::with_renderer(
            MockStorage::with_file("salaries.csv", data.as_bytes()),
            MockConfig { delimiter },
            ChartRenderer::without_text(),
        )
    }

    #[tokio::test]
    async fn test_extract_parses_input() {
        let table = pipeline(SAMPLE, ',').extract().await.unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_index("Base_Salary"), Some(4));
    }

    #[tokio::test]
    async fn test_extract_with_custom_delimiter() {
        let data = SAMPLE.replace(',', ";");
        let table = pipeline(&data, ';').extract().await.unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.columns().len(), 5);
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let pipeline = SalaryReportPipeline::with_renderer(
            MockStorage::with_file("other.csv", b""),
            MockConfig { delimiter: ',' },
            ChartRenderer::without_text(),
        );

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, ReportError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_reads_registered_table() {
        let pipeline = pipeline(SAMPLE, ',');
        let table = pipeline.extract().await.unwrap();
        let mut ctx = QueryContext::acquire("test");
        ctx.register_table(EMPLOYEE_TABLE, table);

        let report = pipeline.transform(&ctx).await.unwrap();

        assert_eq!(report.overall.total_records, 3);
        assert_eq!(report.overall.avg, Some(150.0));
        assert_eq!(report.top_paid.len(), 3);
        assert_eq!(report.top_paid[0].salary, Some(200.0));
        assert_eq!(report.by_gender.len(), 2);
        let counted: usize = report.department_counts.iter().map(|c| c.employees).sum();
        assert_eq!(counted, 3);
    }

    #[tokio::test]
    async fn test_transform_without_table_fails() {
        let ctx = QueryContext::acquire("test");

        let err = pipeline(SAMPLE, ',').transform(&ctx).await.unwrap_err();
        assert!(matches!(err, ReportError::QueryError { .. }));
    }

    #[tokio::test]
    async fn test_load_writes_three_charts() {
        let pipeline = pipeline(SAMPLE, ',');
        let table = pipeline.extract().await.unwrap();
        let mut ctx = QueryContext::acquire("test");
        ctx.register_table(EMPLOYEE_TABLE, table);
        let report = pipeline.transform(&ctx).await.unwrap();

        let written = pipeline.load(report).await.unwrap();

        let expected: Vec<String> = [BAR_CHART_FILE, PIE_CHART_FILE, BOX_PLOT_FILE]
            .iter()
            .map(|f| Path::new("images").join(f).to_string_lossy().into_owned())
            .collect();
        assert_eq!(written, expected);
        for path in &written {
            let png = pipeline.storage.get_file(path).await.unwrap();
            assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        }
    }
}
