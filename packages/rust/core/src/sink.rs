//! Output sinks for the combined and per-category files.
//!
//! The pipeline never touches the filesystem directly; it hands named record
//! lists to an [`OutputSink`]. [`DirectorySink`] writes `<name>.json` files,
//! [`MemorySink`] keeps them in memory.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use protomerge_shared::{CanonicalRecord, ProtomergeError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument};

/// Metadata for one written output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OutputFile {
    /// Output name without extension (`combined`, `lending`, ...).
    pub name: String,
    /// Number of records in the file.
    pub records: usize,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Destination for rendered outputs.
pub trait OutputSink {
    /// Remove everything a previous run produced.
    fn reset(&mut self) -> Result<()>;

    /// Store `records` under `name`.
    fn write(&mut self, name: &str, records: &[&CanonicalRecord]) -> Result<OutputFile>;
}

/// Outcome of writing a batch of outputs; every output is attempted.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<OutputFile>,
    pub failed: Vec<(String, ProtomergeError)>,
}

impl WriteReport {
    /// Collapse into an error naming every failed output, if any failed.
    pub fn into_result(self) -> Result<Vec<OutputFile>> {
        if self.failed.is_empty() {
            Ok(self.written)
        } else {
            Err(ProtomergeError::OutputWrite {
                failed: self.failed.into_iter().map(|(name, _)| name).collect(),
            })
        }
    }
}

/// Write each named record list, continuing past individual failures.
#[instrument(skip_all, fields(outputs = outputs.len()))]
pub fn write_all(
    sink: &mut dyn OutputSink,
    outputs: &BTreeMap<String, Vec<&CanonicalRecord>>,
) -> WriteReport {
    let mut report = WriteReport::default();

    for (name, records) in outputs {
        match sink.write(name, records) {
            Ok(file) => report.written.push(file),
            Err(e) => {
                error!(output = %name, error = %e, "failed to write output");
                report.failed.push((name.clone(), e));
            }
        }
    }

    report
}

/// Pretty-printed JSON array.
fn render(records: &[&CanonicalRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(|e| {
        ProtomergeError::validation(format!("JSON serialization failed: {e}"))
    })
}

fn describe(name: &str, records: &[&CanonicalRecord], content: &str) -> OutputFile {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    OutputFile {
        name: name.to_string(),
        records: records.len(),
        size_bytes: content.len(),
        sha256: format!("{:x}", hasher.finalize()),
    }
}

// ---------------------------------------------------------------------------
// DirectorySink
// ---------------------------------------------------------------------------

/// Writes `<dir>/<name>.json` files.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl OutputSink for DirectorySink {
    /// Empty the directory, creating it if needed.
    fn reset(&mut self) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| ProtomergeError::io(&self.dir, e))?;
            debug!(path = %self.dir.display(), "created output directory");
            return Ok(());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| ProtomergeError::io(&self.dir, e))?;
        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| ProtomergeError::io(&self.dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| ProtomergeError::io(&path, e))?;
            let removal = if file_type.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            removal.map_err(|e| ProtomergeError::io(&path, e))?;
            removed += 1;
        }

        info!(path = %self.dir.display(), removed, "cleared output directory");
        Ok(())
    }

    /// Write atomically: temp file in the same directory, then rename.
    fn write(&mut self, name: &str, records: &[&CanonicalRecord]) -> Result<OutputFile> {
        let content = render(records)?;
        let target = self.path_for(name);
        let temp = self.dir.join(format!(".{name}.json.tmp"));

        std::fs::write(&temp, &content).map_err(|e| ProtomergeError::io(&temp, e))?;
        if let Err(e) = std::fs::rename(&temp, &target) {
            std::fs::remove_file(&temp).ok();
            return Err(ProtomergeError::io(&target, e));
        }

        debug!(path = %target.display(), records = records.len(), "wrote output file");
        Ok(describe(name, records, &content))
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Keeps rendered outputs in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, String>,
    failing: HashSet<String>,
    resets: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that refuses to store the given names.
    pub fn failing_on<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Rendered JSON for an output.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// Parse an output back into records.
    pub fn records(&self, name: &str) -> Option<Vec<CanonicalRecord>> {
        self.get(name)
            .and_then(|content| serde_json::from_str(content).ok())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl OutputSink for MemorySink {
    fn reset(&mut self) -> Result<()> {
        self.files.clear();
        self.resets += 1;
        Ok(())
    }

    fn write(&mut self, name: &str, records: &[&CanonicalRecord]) -> Result<OutputFile> {
        if self.failing.contains(name) {
            return Err(ProtomergeError::io(
                format!("memory://{name}"),
                std::io::Error::other("write refused"),
            ));
        }
        let content = render(records)?;
        let file = describe(name, records, &content);
        self.files.insert(name.to_string(), content);
        Ok(file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
