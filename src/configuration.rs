use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ContextError, ErrorKind};

/// The environment variable naming the LaTeX compiler, consulted before any automatic search.
pub const COMPILER_ENVIRONMENT_VARIABLE: &str = "LATEX_PDFLATEX";

/// Export settings, read from a JSON file such as:
///
/// ```json
/// {
///     "compilerPath": "/usr/local/texlive/2024/bin/x86_64-linux/pdflatex",
///     "compileTimeoutSeconds": 30,
///     "templatePath": "templates/resume.tex.j2",
///     "useCompiler": true
/// }
/// ```
///
/// Every key is optional.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub compiler_path: Option<PathBuf>,
    pub compile_timeout_seconds: u64,
    pub template_path: Option<PathBuf>,
    pub use_compiler: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            compiler_path: None,
            compile_timeout_seconds: 60,
            template_path: None,
            use_compiler: true,
        }
    }
}

impl Configuration {
    pub fn from_path(configuration_file_path: &PathBuf) -> Result<Self, ContextError> {
        let configuration_file_contents = std::fs::read_to_string(configuration_file_path)
            .map_err(|error| {
                ContextError::with_error(
                    ErrorKind::Io,
                    format!(
                        "Failed to read the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;
        let configuration: Configuration = serde_json::from_str(&configuration_file_contents)
            .map_err(|error| {
                ContextError::with_error(
                    ErrorKind::Validation,
                    format!(
                        "Failed to parse the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;

        Ok(configuration)
    }

    /// Apply `LATEX_PDFLATEX`, which takes precedence over the configured compiler path.
    pub fn with_environment_overrides(self) -> Self {
        let compiler_override = std::env::var_os(COMPILER_ENVIRONMENT_VARIABLE)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        self.with_compiler_override(compiler_override)
    }

    pub fn with_compiler_override(mut self, compiler_override: Option<PathBuf>) -> Self {
        if let Some(compiler_path) = compiler_override {
            log::debug!("Using the compiler override {:?}", compiler_path);
            self.compiler_path = Some(compiler_path);
        }
        self
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_seconds)
    }
}
