use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing column '{column}' in table '{table}'")]
    MissingColumnError { table: String, column: String },

    #[error("Cannot cast '{value}' in column {column} (row {row}) to DOUBLE")]
    CastError {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Query error: {message}")]
    QueryError { message: String },

    #[error("Failed to write {path}: {source}")]
    OutputError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {chart}: {message}")]
    RenderError { chart: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Query,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryError {
            message: message.into(),
        }
    }

    pub fn render(chart: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::RenderError {
            chart: chart.into(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) | Self::CsvError(_) => ErrorCategory::Input,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::MissingColumnError { .. } | Self::CastError { .. } | Self::QueryError { .. } => {
                ErrorCategory::Query
            }
            Self::OutputError { .. } | Self::RenderError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Query => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// 依錯誤類別給出的處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "Check that the input CSV exists at the configured --input-path"
            }
            Self::IoError(_) => "Check file permissions and available disk space",
            Self::CsvError(_) => {
                "Make sure the file is valid CSV with a header row and the configured delimiter"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the command line flags and the TOML configuration file"
            }
            Self::MissingColumnError { .. } => {
                "The input needs Division, Gender, Department_Name and Base_Salary columns"
            }
            Self::CastError { .. } => "Base_Salary must contain numeric values or be empty",
            Self::QueryError { .. } => "Inspect the input data for the failing query",
            Self::OutputError { .. } => "Make sure the output directory is writable",
            Self::RenderError { .. } => "Check the output directory and the configured font",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read the input data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Query => format!("Aggregation failed: {}", self),
            ErrorCategory::Output => format!("Could not write the report: {}", self),
        }
    }

    /// 進程退出碼，任何錯誤都不會回傳 0
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
