// Per-Trial JSONL Sample Writer
// Outputs one JSON line per trial for independent analysis

use paylab_engine::TrialOutcome;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct TrialLine<'a> {
    pub trial: usize,
    pub sample_ms: f64,
    #[serde(flatten)]
    pub outcome: &'a TrialOutcome,
}

/// Write `outcomes` to `path` as JSONL, creating parent directories.
pub fn write_jsonl(path: &std::path::Path, outcomes: &[TrialOutcome]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for (trial, outcome) in outcomes.iter().enumerate() {
        let line = TrialLine { trial, sample_ms: outcome.sample_ms(), outcome };
        let json = serde_json::to_string(&line).map_err(std::io::Error::other)?;
        writeln!(file, "{}", json)?;
    }
    file.flush()
}
