use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of concurrent conversion workers. 0 means auto:
    /// max(1, CPU_COUNT - 1), leaving one core free.
    #[serde(default)]
    pub workers: usize,
    /// Per-job wall-clock limit for one conversion.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// File extensions accepted for conversion (lowercase, no dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// External converter command invoked per file; its stdout becomes the
    /// derived output file.
    #[serde(default = "default_converter_cmd")]
    pub converter_cmd: String,
    /// Extension of the derived output file, written alongside the source.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5555
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_extensions() -> Vec<String> {
    ["pdf", "docx", "pptx", "txt", "md"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_converter_cmd() -> String {
    "markitdown".to_string()
}

fn default_output_extension() -> String {
    "md".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            timeout_secs: default_timeout_secs(),
            extensions: default_extensions(),
            converter_cmd: default_converter_cmd(),
            output_extension: default_output_extension(),
        }
    }
}

impl ConverterConfig {
    /// Resolve the effective worker count. 0 falls back to one worker per
    /// CPU core minus one, never below 1.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::cmp::max(1, num_cpus::get().saturating_sub(1))
        }
    }
}
