use crate::core::context::QueryContext;
use crate::domain::model::Table;
use crate::domain::report::AggregationReport;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn delimiter(&self) -> char;
    fn font_path(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, ctx: &QueryContext) -> Result<AggregationReport>;
    async fn load(&self, report: AggregationReport) -> Result<Vec<String>>;
}
