//! GPU metric providers.
//!
//! Only the first (main) GPU is queried.

#[cfg(feature = "nvml")]
mod nvml;

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[cfg(feature = "nvml")]
pub use nvml::NvmlQuery;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// One sample of the monitored metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reading {
    pub vram_used_mib: u64,
    pub temperature_celsius: u64,
}

#[derive(Debug, Error)]
pub enum GpuQueryError {
    #[error("`{program}` not found, make sure NVIDIA drivers are installed")]
    NotFound { program: String },

    #[error("failed to execute `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("no number found in `{field}` output: {output:?}")]
    Parse { field: String, output: String },

    #[error("`{field}` query returned no output")]
    Empty { field: String },

    #[cfg(feature = "nvml")]
    #[error("NVML call failed: {0}")]
    Nvml(#[from] nvml_wrapper::error::NvmlError),
}

impl GpuQueryError {
    fn spawn(program: &Path, source: io::Error) -> Self {
        let program = program.display().to_string();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { program }
        } else {
            Self::Spawn { program, source }
        }
    }
}

/// Source of instantaneous GPU readings.
pub trait GpuQuery {
    fn memory_used_mib(&self) -> Result<u64, GpuQueryError>;

    fn memory_total_mib(&self) -> Result<u64, GpuQueryError>;

    fn temperature_celsius(&self) -> Result<u64, GpuQueryError>;

    fn gpu_name(&self) -> Result<String, GpuQueryError>;

    /// Reads VRAM usage, then temperature.
    fn sample(&self) -> Result<Reading, GpuQueryError> {
        Ok(Reading {
            vram_used_mib: self.memory_used_mib()?,
            temperature_celsius: self.temperature_celsius()?,
        })
    }
}

/// Queries the GPU through the `nvidia-smi` command line tool.
#[derive(Debug, Clone)]
pub struct NvidiaSmi {
    program: PathBuf,
}

impl Default for NvidiaSmi {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl NvidiaSmi {
    pub const DEFAULT_PROGRAM: &'static str = "nvidia-smi";

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn query(&self, field: &str, format: &str) -> Result<String, GpuQueryError> {
        tracing::trace!("querying {field} from {}", self.program.display());

        let output = Command::new(&self.program)
            .arg(format!("--query-gpu={field}"))
            .arg(format!("--format={format}"))
            .output()
            .map_err(|e| GpuQueryError::spawn(&self.program, e))?;

        if !output.status.success() {
            return Err(GpuQueryError::Failed {
                program: self.program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn query_number(&self, field: &str) -> Result<u64, GpuQueryError> {
        let output = self.query(field, "csv,noheader,nounits")?;
        parse_first_number(&output).ok_or_else(|| GpuQueryError::Parse {
            field: field.to_string(),
            output: output.trim().to_string(),
        })
    }
}

impl GpuQuery for NvidiaSmi {
    fn memory_used_mib(&self) -> Result<u64, GpuQueryError> {
        self.query_number("memory.used")
    }

    fn memory_total_mib(&self) -> Result<u64, GpuQueryError> {
        self.query_number("memory.total")
    }

    fn temperature_celsius(&self) -> Result<u64, GpuQueryError> {
        self.query_number("temperature.gpu")
    }

    fn gpu_name(&self) -> Result<String, GpuQueryError> {
        let output = self.query("name", "csv,noheader")?;
        output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GpuQueryError::Empty {
                field: "name".to_string(),
            })
    }
}

/// First unsigned integer in the tool output, i.e. the main GPU's value.
fn parse_first_number(output: &str) -> Option<u64> {
    FIRST_NUMBER.find(output)?.as_str().parse().ok()
}
