// Conversion collaborator - external routine abstraction with real and mock
// implementations.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

/// The conversion collaborator: given a source file, produce the derived
/// output file and return its path, or fail with a human-readable reason.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, input: &Path) -> anyhow::Result<PathBuf>;
}

// --- Real implementation shelling out to an external converter command ---

/// Runs `<command> <input>` and writes the captured stdout to the derived
/// output path (same stem as the source, alternate extension). The child is
/// killed when the invocation is abandoned, so a timed-out conversion does
/// not linger.
pub struct CommandConverter {
    command: String,
    output_extension: String,
}

impl CommandConverter {
    pub fn new(command: impl Into<String>, output_extension: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output_extension: output_extension.into(),
        }
    }
}

#[async_trait]
impl Converter for CommandConverter {
    async fn convert(&self, input: &Path) -> anyhow::Result<PathBuf> {
        if !input.is_file() {
            anyhow::bail!("File does not exist: {}", input.display());
        }

        let output_path = input.with_extension(&self.output_extension);

        let output = tokio::process::Command::new(&self.command)
            .arg(input)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run converter '{}'", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Converter exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        tokio::fs::write(&output_path, &output.stdout)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        Ok(output_path)
    }
}

// --- Mock implementation for tests ---

/// A scriptable converter for tests: configurable latency, failure for
/// paths containing a marker substring, and counters observing how many
/// conversions ran concurrently.
pub struct MockConverter {
    delay: std::time::Duration,
    fail_containing: Option<String>,
    in_flight: std::sync::atomic::AtomicUsize,
    max_in_flight: std::sync::atomic::AtomicUsize,
    completed: std::sync::atomic::AtomicUsize,
}

impl MockConverter {
    /// Succeeds immediately for every path.
    pub fn instant() -> Self {
        Self::with_delay(std::time::Duration::ZERO)
    }

    /// Succeeds after sleeping `delay` per conversion.
    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay,
            fail_containing: None,
            in_flight: std::sync::atomic::AtomicUsize::new(0),
            max_in_flight: std::sync::atomic::AtomicUsize::new(0),
            completed: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Fails (after the configured delay) for any path containing `marker`.
    pub fn failing_for(mut self, marker: impl Into<String>) -> Self {
        self.fail_containing = Some(marker.into());
        self
    }

    /// Highest number of conversions observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of conversions that ran to successful completion.
    pub fn completed(&self) -> usize {
        self.completed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Converter for MockConverter {
    async fn convert(&self, input: &Path) -> anyhow::Result<PathBuf> {
        use std::sync::atomic::Ordering;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let path_str = input.to_string_lossy();
        if let Some(marker) = &self.fail_containing {
            if path_str.contains(marker.as_str()) {
                anyhow::bail!("mock conversion failed for {}", path_str);
            }
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(input.with_extension("md"))
    }
}
