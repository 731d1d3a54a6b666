use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_file_extensions, validate_non_empty_string, validate_path,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportSection,
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub charts: Option<ChartsConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub images_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    pub font_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| ReportError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("report.name", &self.report.name)?;
        validate_path("source.path", &self.source.path)?;
        validate_file_extensions(
            "source.path",
            std::slice::from_ref(&self.source.path),
            &["csv", "tsv", "txt"],
        )?;
        validate_path("output.images_dir", &self.output.images_dir)?;

        if let Some(raw) = &self.source.delimiter {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(delimiter), None) => validate_delimiter("source.delimiter", delimiter)?,
                _ => {
                    return Err(ReportError::InvalidConfigValueError {
                        field: "source.delimiter".to_string(),
                        value: raw.clone(),
                        reason: "Delimiter must be exactly one character".to_string(),
                    })
                }
            }
        }

        if let Some(font_path) = self.font_path() {
            validate_path("charts.font_path", font_path)?;
        }

        Ok(())
    }

    /// 取得分隔符號 (僅在設定為單一字元時)
    pub fn delimiter(&self) -> Option<char> {
        let raw = self.source.delimiter.as_deref()?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(delimiter), None) => Some(delimiter),
            _ => None,
        }
    }

    pub fn font_path(&self) -> Option<&str> {
        self.charts.as_ref().and_then(|c| c.font_path.as_deref())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn output_dir(&self) -> &str {
        &self.output.images_dir
    }

    fn delimiter(&self) -> char {
        TomlConfig::delimiter(self).unwrap_or(',')
    }

    fn font_path(&self) -> Option<&str> {
        TomlConfig::font_path(self)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
