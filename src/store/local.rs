//! Local filesystem store.
//!
//! Holds the job table and score history in memory behind one async mutex
//! (single-writer) and flushes each mutation to JSON files with atomic
//! temp-file + rename writes.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── jobs.json             # id-keyed posting table
//! ├── scores.json           # append-only score history
//! └── backups/              # checkpoint snapshots, pruned to max_backups
//!     └── jobs-YYYYMMDDHHMMSSfff.json
//! ```
//!
//! The checkpoint hook runs after each persisted mutation: once the
//! configured interval has elapsed since the last snapshot, the current job
//! table is copied into `backups/` and the oldest snapshots beyond the
//! retention bound are removed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{JobPosting, JobStatus, ScoreResult, StoreConfig};
use crate::store::{JobStore, UpsertOutcome};

/// Attempts for an atomic rename before giving up with a conflict error.
const RENAME_ATTEMPTS: u32 = 3;

#[derive(Debug, Default)]
struct StoreState {
    jobs: BTreeMap<String, JobPosting>,
    scores: Vec<ScoreResult>,
    last_backup: Option<Instant>,
    loaded: bool,
}

/// JSON-file-backed job store.
pub struct LocalJobStore {
    root_dir: PathBuf,
    backup_interval: Duration,
    max_backups: usize,
    state: Mutex<StoreState>,
}

impl LocalJobStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, config: &StoreConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            backup_interval: Duration::from_secs(config.backup_interval_secs),
            max_backups: config.max_backups,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Create a store at the path named in the config.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.path.clone(), config)
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename). The rename is
    /// retried a bounded number of times; a persistent collision surfaces
    /// as a store conflict.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        let mut last_err = None;
        for _ in 0..RENAME_ATTEMPTS {
            match tokio::fs::rename(&tmp, &path).await {
                Ok(()) => return Ok(()),
                Err(e) => last_err = Some(e),
            }
        }
        Err(AppError::store_conflict(format!(
            "could not replace {}: {}",
            path.display(),
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Load persisted state on first access.
    async fn ensure_loaded(&self, state: &mut StoreState) -> Result<()> {
        if state.loaded {
            return Ok(());
        }
        if let Some(jobs) = self.read_json::<Vec<JobPosting>>("jobs.json").await? {
            state.jobs = jobs.into_iter().map(|j| (j.id.clone(), j)).collect();
        }
        if let Some(scores) = self.read_json::<Vec<ScoreResult>>("scores.json").await? {
            state.scores = scores;
        }
        state.loaded = true;
        Ok(())
    }

    /// Flush the job table and run the checkpoint hook.
    async fn persist_jobs(&self, state: &mut StoreState) -> Result<()> {
        let jobs: Vec<&JobPosting> = state.jobs.values().collect();
        self.write_json("jobs.json", &jobs).await?;
        self.checkpoint(state).await
    }

    /// Flush the score history.
    async fn persist_scores(&self, state: &StoreState) -> Result<()> {
        self.write_json("scores.json", &state.scores).await
    }

    /// Snapshot the job table if the backup interval has elapsed, keeping
    /// only the most recent `max_backups` snapshots.
    async fn checkpoint(&self, state: &mut StoreState) -> Result<()> {
        if self.max_backups == 0 {
            return Ok(());
        }
        let due = match state.last_backup {
            Some(at) => at.elapsed() >= self.backup_interval,
            None => true,
        };
        if !due {
            return Ok(());
        }

        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
        let key = format!("backups/jobs-{stamp}.json");
        let jobs: Vec<&JobPosting> = state.jobs.values().collect();
        self.write_json(&key, &jobs).await?;
        state.last_backup = Some(Instant::now());

        self.prune_backups().await
    }

    async fn prune_backups(&self) -> Result<()> {
        let dir = self.path("backups");
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(AppError::Io(e)),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("jobs-") && name.ends_with(".json") {
                names.push(name);
            }
        }

        // Timestamped names sort chronologically.
        names.sort();
        while names.len() > self.max_backups {
            let oldest = names.remove(0);
            tokio::fs::remove_file(dir.join(&oldest)).await?;
            log::debug!("pruned backup {oldest}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobStore for LocalJobStore {
    async fn upsert(&self, job: &JobPosting) -> Result<UpsertOutcome> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let outcome = match state.jobs.get(&job.id) {
            Some(existing) if existing.content_hash == job.content_hash => {
                return Ok(UpsertOutcome::Unchanged);
            }
            Some(existing) => {
                // Content drifted: refresh the posting but keep its lifecycle
                // status so finalized jobs are not silently reopened.
                let mut refreshed = job.clone();
                refreshed.status = existing.status;
                state.jobs.insert(job.id.clone(), refreshed);
                UpsertOutcome::Updated
            }
            None => {
                state.jobs.insert(job.id.clone(), job.clone());
                UpsertOutcome::Inserted
            }
        };

        self.persist_jobs(&mut state).await?;
        Ok(outcome)
    }

    async fn get(&self, id: &str) -> Result<Option<JobPosting>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.jobs.get(id).cloned())
    }

    async fn list_unscored(&self) -> Result<Vec<JobPosting>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::New)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<JobPosting>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.jobs.values().cloned().collect())
    }

    async fn list_passing(&self, threshold: f64) -> Result<Vec<(JobPosting, ScoreResult)>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let mut passing = Vec::new();
        for job in state.jobs.values() {
            let latest = state
                .scores
                .iter()
                .rev()
                .find(|s| s.job_id == job.id)
                .cloned();
            if let Some(score) = latest {
                if score.overall_score > threshold {
                    passing.push((job.clone(), score));
                }
            }
        }
        Ok(passing)
    }

    async fn record_score(&self, score: &ScoreResult) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        state.scores.push(score.clone());
        self.persist_scores(&state).await
    }

    async fn latest_score(&self, id: &str) -> Result<Option<ScoreResult>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.scores.iter().rev().find(|s| s.job_id == id).cloned())
    }

    async fn set_status(&self, id: &str, status: JobStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        match state.jobs.get_mut(id) {
            Some(job) => {
                job.status = status;
                self.persist_jobs(&mut state).await
            }
            None => Err(AppError::store_conflict(format!(
                "status update for unknown job {id}"
            ))),
        }
    }

    async fn len(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.jobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientSignals, SubScores};
    use tempfile::TempDir;

    fn make_store(tmp: &TempDir, backup_interval_secs: u64, max_backups: usize) -> LocalJobStore {
        let config = StoreConfig {
            path: tmp.path().to_string_lossy().into_owned(),
            backup_interval_secs,
            max_backups,
        };
        LocalJobStore::new(tmp.path(), &config)
    }

    fn make_job(id: &str, hash: &str) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: format!("Job {id}"),
            description: "Build things".into(),
            link: format!("https://example.com/jobs/~{id}/"),
            budget: None,
            experience_level: None,
            job_type: None,
            duration: None,
            client: ClientSignals::default(),
            scraped_at: Utc::now(),
            content_hash: hash.to_string(),
            low_confidence: false,
            status: JobStatus::New,
        }
    }

    fn make_score(job_id: &str, overall: f64) -> ScoreResult {
        ScoreResult {
            job_id: job_id.to_string(),
            sub_scores: SubScores::default(),
            overall_score: overall,
            confidence: 0.9,
            explanation: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_same_id_twice_keeps_one_record() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(&tmp, 3600, 0);
        let job = make_job("abc", "h1");

        assert_eq!(store.upsert(&job).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(&job).await.unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_changed_content_preserves_status() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(&tmp, 3600, 0);

        store.upsert(&make_job("abc", "h1")).await.unwrap();
        store.set_status("abc", JobStatus::Rejected).await.unwrap();

        let outcome = store.upsert(&make_job("abc", "h2")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let stored = store.get("abc").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Rejected);
        assert_eq!(stored.content_hash, "h2");
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = make_store(&tmp, 3600, 0);
            store.upsert(&make_job("abc", "h1")).await.unwrap();
            store.record_score(&make_score("abc", 8.0)).await.unwrap();
        }

        let reopened = make_store(&tmp, 3600, 0);
        assert_eq!(reopened.len().await.unwrap(), 1);
        let score = reopened.latest_score("abc").await.unwrap().unwrap();
        assert!((score.overall_score - 8.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_list_unscored_filters_by_status() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(&tmp, 3600, 0);

        store.upsert(&make_job("a", "h1")).await.unwrap();
        store.upsert(&make_job("b", "h2")).await.unwrap();
        store.set_status("a", JobStatus::Scored).await.unwrap();

        let unscored = store.list_unscored().await.unwrap();
        assert_eq!(unscored.len(), 1);
        assert_eq!(unscored[0].id, "b");
    }

    #[tokio::test]
    async fn test_list_passing_uses_latest_score() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(&tmp, 3600, 0);

        store.upsert(&make_job("a", "h1")).await.unwrap();
        store.record_score(&make_score("a", 5.0)).await.unwrap();
        store.record_score(&make_score("a", 9.0)).await.unwrap();

        let passing = store.list_passing(7.0).await.unwrap();
        assert_eq!(passing.len(), 1);
        assert!((passing[0].1.overall_score - 9.0).abs() < f64::EPSILON);

        // Rescoring appended rather than overwrote.
        assert_eq!(store.latest_score("a").await.unwrap().unwrap().overall_score, 9.0);
    }

    #[tokio::test]
    async fn test_checkpoint_snapshots_and_prunes() {
        let tmp = TempDir::new().unwrap();
        // interval 0 → snapshot on every persisted mutation
        let store = make_store(&tmp, 0, 2);

        for i in 0..5 {
            store.upsert(&make_job(&format!("job{i}"), "h")).await.unwrap();
        }

        let mut backups = Vec::new();
        let mut entries = std::fs::read_dir(tmp.path().join("backups")).unwrap();
        while let Some(Ok(entry)) = entries.next() {
            backups.push(entry.file_name());
        }
        assert!(!backups.is_empty());
        assert!(backups.len() <= 2);
    }

    #[tokio::test]
    async fn test_no_backups_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(&tmp, 0, 0);
        store.upsert(&make_job("a", "h")).await.unwrap();
        assert!(!tmp.path().join("backups").exists());
    }

    #[tokio::test]
    async fn test_set_status_on_unknown_job_errors() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(&tmp, 3600, 0);
        assert!(store.set_status("ghost", JobStatus::Passed).await.is_err());
    }
}
