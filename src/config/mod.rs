pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::{CliConfig, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_DIR};

#[cfg(feature = "cli")]
mod cli_config {
    use super::toml_config::TomlConfig;
    use crate::domain::ports::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_delimiter, validate_file_extensions, validate_path, Validate,
    };
    use clap::parser::ValueSource;
    use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
    use serde::{Deserialize, Serialize};

    pub const DEFAULT_INPUT_PATH: &str = "../data/Employee_Salaries_-_2023.csv";
    pub const DEFAULT_OUTPUT_DIR: &str = "../images";

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "salary-report")]
    #[command(about = "Employee salary statistics and charts from a CSV file")]
    pub struct CliConfig {
        #[arg(long, default_value = DEFAULT_INPUT_PATH)]
        pub input_path: String,

        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        pub output_dir: String,

        #[arg(long, default_value = ",", help = "Field delimiter of the input file")]
        pub delimiter: char,

        #[arg(long, help = "TrueType font used for chart text")]
        pub font_path: Option<String>,

        #[arg(long, help = "TOML configuration file; explicit flags take precedence")]
        pub config: Option<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log CPU and memory usage per stage")]
        pub monitor: bool,
    }

    impl Default for CliConfig {
        fn default() -> Self {
            Self {
                input_path: DEFAULT_INPUT_PATH.to_string(),
                output_dir: DEFAULT_OUTPUT_DIR.to_string(),
                delimiter: ',',
                font_path: None,
                config: None,
                verbose: false,
                monitor: false,
            }
        }
    }

    impl CliConfig {
        /// 解析命令列參數，並合併 `--config` 指定的 TOML 檔案
        pub fn load() -> Result<Self> {
            Self::load_from_matches(&Self::command().get_matches())
        }

        pub fn load_from_matches(matches: &ArgMatches) -> Result<Self> {
            let mut config = match Self::from_arg_matches(matches) {
                Ok(config) => config,
                Err(e) => e.exit(),
            };

            if let Some(path) = config.config.clone() {
                let toml_config = TomlConfig::from_file(&path)?;
                toml_config.validate()?;
                config.merge_toml(&toml_config, |id| {
                    matches.value_source(id) == Some(ValueSource::CommandLine)
                });
            }

            Ok(config)
        }

        /// Take each value from the TOML file unless `explicit` reports the
        /// flag was given on the command line.
        pub fn merge_toml(&mut self, toml: &TomlConfig, explicit: impl Fn(&str) -> bool) {
            if !explicit("input_path") {
                self.input_path = toml.source.path.clone();
            }
            if !explicit("delimiter") {
                if let Some(delimiter) = toml.delimiter() {
                    self.delimiter = delimiter;
                }
            }
            if !explicit("output_dir") {
                self.output_dir = toml.output.images_dir.clone();
            }
            if !explicit("font_path") {
                if let Some(font_path) = toml.font_path() {
                    self.font_path = Some(font_path.to_string());
                }
            }
            self.monitor = self.monitor || toml.monitoring_enabled();
        }
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn output_dir(&self) -> &str {
            &self.output_dir
        }

        fn delimiter(&self) -> char {
            self.delimiter
        }

        fn font_path(&self) -> Option<&str> {
            self.font_path.as_deref()
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("input_path", &self.input_path)?;
            validate_file_extensions(
                "input_path",
                std::slice::from_ref(&self.input_path),
                &["csv", "tsv", "txt"],
            )?;
            validate_path("output_dir", &self.output_dir)?;
            validate_delimiter("delimiter", self.delimiter)?;
            if let Some(font_path) = &self.font_path {
                validate_path("font_path", font_path)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const TOML: &str = r#"
[report]
name = "salaries"
description = "Salary report"

[source]
path = "data/salaries.tsv"
delimiter = "\t"

[output]
images_dir = "charts"

[charts]
font_path = "/fonts/Sans.ttf"

[monitoring]
enabled = true
"#;

        #[test]
        fn test_defaults_match_fixed_paths() {
            let config = CliConfig::parse_from(["salary-report"]);

            assert_eq!(config.input_path, DEFAULT_INPUT_PATH);
            assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
            assert_eq!(config.delimiter, ',');
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_flags_override_defaults() {
            let config = CliConfig::parse_from([
                "salary-report",
                "--input-path",
                "salaries.tsv",
                "--delimiter",
                "\t",
                "--output-dir",
                "out",
                "--verbose",
            ]);

            assert_eq!(config.input_path(), "salaries.tsv");
            assert_eq!(config.delimiter(), '\t');
            assert_eq!(config.output_dir(), "out");
            assert!(config.verbose);
        }

        #[test]
        fn test_validation_rejects_bad_input() {
            let config = CliConfig {
                input_path: "salaries.xlsx".to_string(),
                ..CliConfig::default()
            };
            assert!(config.validate().is_err());

            let config = CliConfig {
                delimiter: '"',
                ..CliConfig::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_toml_fills_unset_flags() {
            let toml = TomlConfig::from_toml_str(TOML).unwrap();
            let mut config = CliConfig::default();

            config.merge_toml(&toml, |_| false);

            assert_eq!(config.input_path(), "data/salaries.tsv");
            assert_eq!(config.delimiter(), '\t');
            assert_eq!(config.output_dir(), "charts");
            assert_eq!(config.font_path(), Some("/fonts/Sans.ttf"));
            assert!(config.monitor);
        }

        #[test]
        fn test_load_merges_config_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            std::io::Write::write_all(&mut file, TOML.as_bytes()).unwrap();
            let path = file.path().to_str().unwrap().to_string();
            let matches = CliConfig::command()
                .try_get_matches_from(["salary-report", "--config", path.as_str(), "--verbose"])
                .unwrap();

            let config = CliConfig::load_from_matches(&matches).unwrap();

            assert_eq!(config.config.as_deref(), Some(path.as_str()));
            assert_eq!(config.input_path(), "data/salaries.tsv");
            assert_eq!(config.output_dir(), "charts");
            assert!(config.verbose);
            assert!(config.monitor);
        }

        #[test]
        fn test_explicit_flags_win_over_toml() {
            let toml = TomlConfig::from_toml_str(TOML).unwrap();
            let matches = CliConfig::command()
                .try_get_matches_from(["salary-report", "--output-dir", "elsewhere"])
                .unwrap();
            let mut config = CliConfig::from_arg_matches(&matches).unwrap();

            config.merge_toml(&toml, |id| {
                matches.value_source(id) == Some(ValueSource::CommandLine)
            });

            assert_eq!(config.output_dir(), "elsewhere");
            assert_eq!(config.input_path(), "data/salaries.tsv");
        }
    }
}
