use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Consolidated view of everything remembered about one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub topics: Vec<String>,
    pub decisions: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("memory store encoding: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable per-project memory. The pipeline appends after every run and
/// treats failures as non-fatal.
pub trait ProjectMemory: Send + Sync {
    fn load(&self, project_id: &str) -> Result<MemorySnapshot, MemoryError>;

    fn append(
        &self,
        project_id: &str,
        topics: &[String],
        decisions: &[String],
        next_steps: &[String],
    ) -> Result<(), MemoryError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoryRecord {
    timestamp: String,
    project_id: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    decisions: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
}

/// Append-only JSONL store. One record per pipeline run; `load` folds all
/// records for a project into sorted, deduplicated lists. A missing file is
/// an empty store, not an error.
#[derive(Debug, Clone)]
pub struct JsonlMemory {
    path: PathBuf,
}

impl JsonlMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProjectMemory for JsonlMemory {
    fn load(&self, project_id: &str) -> Result<MemorySnapshot, MemoryError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MemorySnapshot::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut topics = BTreeSet::new();
        let mut decisions = BTreeSet::new();
        let mut next_steps = BTreeSet::new();

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: MemoryRecord = serde_json::from_str(&line)?;
            if record.project_id != project_id {
                continue;
            }
            topics.extend(record.topics);
            decisions.extend(record.decisions);
            next_steps.extend(record.next_steps);
        }

        Ok(MemorySnapshot {
            topics: topics.into_iter().collect(),
            decisions: decisions.into_iter().collect(),
            next_steps: next_steps.into_iter().collect(),
        })
    }

    fn append(
        &self,
        project_id: &str,
        topics: &[String],
        decisions: &[String],
        next_steps: &[String],
    ) -> Result<(), MemoryError> {
        let record = MemoryRecord {
            timestamp: Utc::now().to_rfc3339(),
            project_id: project_id.to_string(),
            topics: topics.to_vec(),
            decisions: decisions.to_vec(),
            next_steps: next_steps.to_vec(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(&record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, JsonlMemory) {
        let dir = tempfile::tempdir().expect("temp dir");
        let memory = JsonlMemory::new(dir.path().join("memory_store.jsonl"));
        (dir, memory)
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let (_dir, memory) = store();
        let snapshot = memory.load("PX-1").expect("load");
        assert_eq!(snapshot, MemorySnapshot::default());
    }

    #[test]
    fn appends_accumulate_and_deduplicate() {
        let (_dir, memory) = store();
        memory
            .append(
                "PX-1",
                &["pricing".to_string()],
                &["ship option A".to_string()],
                &["draft rollout".to_string()],
            )
            .expect("append");
        memory
            .append(
                "PX-1",
                &["pricing".to_string(), "churn".to_string()],
                &[],
                &[],
            )
            .expect("append");

        let snapshot = memory.load("PX-1").expect("load");
        assert_eq!(snapshot.topics, vec!["churn".to_string(), "pricing".to_string()]);
        assert_eq!(snapshot.decisions, vec!["ship option A".to_string()]);
        assert_eq!(snapshot.next_steps, vec!["draft rollout".to_string()]);
    }

    #[test]
    fn projects_are_kept_separate() {
        let (_dir, memory) = store();
        memory
            .append("PX-1", &["alpha".to_string()], &[], &[])
            .expect("append");
        memory
            .append("PX-2", &["beta".to_string()], &[], &[])
            .expect("append");

        let snapshot = memory.load("PX-2").expect("load");
        assert_eq!(snapshot.topics, vec!["beta".to_string()]);
    }

    #[test]
    fn blank_lines_are_tolerated() {
        let (_dir, memory) = store();
        memory
            .append("PX-1", &["alpha".to_string()], &[], &[])
            .expect("append");
        {
            let mut file = OpenOptions::new()
                .append(true)
                .open(&memory.path)
                .expect("open");
            writeln!(file).expect("blank line");
        }
        memory
            .append("PX-1", &["gamma".to_string()], &[], &[])
            .expect("append");

        let snapshot = memory.load("PX-1").expect("load");
        assert_eq!(snapshot.topics.len(), 2);
    }
}
