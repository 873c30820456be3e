//! # Job Stores
//!
//! The job registry is the only structure shared between request handlers
//! and job workers. Every in-memory change is a single critical section, so
//! a worker's update and a concurrent cancel cannot interleave: after a job
//! is removed, `update` returns `None` and the worker stops.
//!
//! `FileJobStore` never touches the disk while holding the registry lock.
//! A per-job file lock orders a job's writes and its deletion instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use attest_core::{JobId, Store, Timestamp};
use parking_lot::Mutex;

use crate::error::JobStoreError;
use crate::job::{BatchJob, JobStatus};

/// Result of [`JobStore::remove_unless_completed`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobRemoval {
    Removed(BatchJob),
    /// The job exists but is completed; it was left in place.
    Completed(BatchJob),
    Missing,
}

/// Concurrency-safe job registry.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: BatchJob) -> Result<(), JobStoreError>;

    fn get(&self, id: &JobId) -> Result<Option<BatchJob>, JobStoreError>;

    /// Apply `f` to the job. `Ok(None)` if it no longer exists.
    fn update(
        &self,
        id: &JobId,
        f: &mut dyn FnMut(&mut BatchJob),
    ) -> Result<Option<BatchJob>, JobStoreError>;

    /// Remove the job if it is pending or processing.
    fn remove_unless_completed(&self, id: &JobId) -> Result<JobRemoval, JobStoreError>;

    /// Drop completed jobs whose `completed_at` is before `cutoff`.
    fn evict_completed_before(&self, cutoff: Timestamp) -> Result<usize, JobStoreError>;

    fn list(&self) -> Result<Vec<BatchJob>, JobStoreError>;
}

fn removal(outcome: Option<Result<BatchJob, BatchJob>>) -> JobRemoval {
    match outcome {
        None => JobRemoval::Missing,
        Some(Ok(job)) => JobRemoval::Removed(job),
        Some(Err(job)) => JobRemoval::Completed(job),
    }
}

fn is_expired(job: &BatchJob, cutoff: Timestamp) -> bool {
    job.status == JobStatus::Completed && job.completed_at.is_some_and(|t| t < cutoff)
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-lifetime job store.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    jobs: Store<JobId, BatchJob>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn insert(&self, job: BatchJob) -> Result<(), JobStoreError> {
        let id = job.id;
        if !self.jobs.insert_new(id, job) {
            return Err(JobStoreError::Duplicate(id));
        }
        Ok(())
    }

    fn get(&self, id: &JobId) -> Result<Option<BatchJob>, JobStoreError> {
        Ok(self.jobs.get(id))
    }

    fn update(
        &self,
        id: &JobId,
        f: &mut dyn FnMut(&mut BatchJob),
    ) -> Result<Option<BatchJob>, JobStoreError> {
        Ok(self.jobs.update(id, |job| f(job)))
    }

    fn remove_unless_completed(&self, id: &JobId) -> Result<JobRemoval, JobStoreError> {
        Ok(removal(self.jobs.remove_if(id, |job| !job.is_completed())))
    }

    fn evict_completed_before(&self, cutoff: Timestamp) -> Result<usize, JobStoreError> {
        Ok(self.jobs.retain(|_, job| !is_expired(job, cutoff)))
    }

    fn list(&self) -> Result<Vec<BatchJob>, JobStoreError> {
        Ok(self.jobs.list())
    }
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// Job store that writes each job through to `<dir>/<job-id>.json`.
///
/// Jobs are reloaded on [`open`](Self::open). A job that was pending or
/// processing when the previous process stopped is reloaded in that state:
/// its items were never persisted, so it can be inspected and cancelled
/// but will not resume.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    jobs: Store<JobId, BatchJob>,
    file_locks: Store<JobId, Arc<Mutex<()>>>,
    dir: PathBuf,
}

fn io_err(path: &Path, e: std::io::Error) -> JobStoreError {
    JobStoreError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl FileJobStore {
    /// Open (creating if needed) a job directory and load every job in it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JobStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let jobs = Store::new();
        let mut stale = 0usize;
        for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let path = entry.map_err(|e| io_err(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
            let job: BatchJob =
                serde_json::from_slice(&bytes).map_err(|e| JobStoreError::Corrupt {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            if !job.is_completed() {
                stale += 1;
            }
            jobs.insert(job.id, job);
        }
        if stale > 0 {
            tracing::warn!(dir = %dir.display(), stale, "reloaded unfinished batch jobs; they will not resume");
        }
        tracing::info!(dir = %dir.display(), jobs = jobs.len(), "opened file job store");
        Ok(Self {
            jobs,
            file_locks: Store::new(),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, id: &JobId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn file_lock(&self, id: &JobId) -> Arc<Mutex<()>> {
        self.file_locks.get_or_insert_with(*id, Default::default)
    }

    fn encode(&self, job: &BatchJob) -> Result<Vec<u8>, JobStoreError> {
        serde_json::to_vec(job).map_err(|e| JobStoreError::Corrupt {
            path: self.path_of(&job.id).display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace the job's file. Callers hold the job's file lock.
    fn write(&self, id: &JobId, bytes: &[u8]) -> Result<(), JobStoreError> {
        let path = self.path_of(id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))
    }

    /// Remove the job's file. Callers hold the job's file lock.
    fn delete(&self, id: &JobId) -> Result<(), JobStoreError> {
        let path = self.path_of(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    fn forget(&self, id: &JobId) -> Result<(), JobStoreError> {
        let lock = self.file_lock(id);
        let _file = lock.lock();
        self.delete(id)?;
        self.file_locks.remove(id);
        Ok(())
    }
}

impl JobStore for FileJobStore {
    fn insert(&self, job: BatchJob) -> Result<(), JobStoreError> {
        let id = job.id;
        let bytes = self.encode(&job)?;
        let lock = self.file_lock(&id);
        let _file = lock.lock();
        if !self.jobs.insert_new(id, job) {
            return Err(JobStoreError::Duplicate(id));
        }
        if let Err(e) = self.write(&id, &bytes) {
            self.jobs.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, id: &JobId) -> Result<Option<BatchJob>, JobStoreError> {
        Ok(self.jobs.get(id))
    }

    fn update(
        &self,
        id: &JobId,
        f: &mut dyn FnMut(&mut BatchJob),
    ) -> Result<Option<BatchJob>, JobStoreError> {
        let lock = self.file_lock(id);
        let _file = lock.lock();
        let updated = self.jobs.try_update(id, |job| {
            f(job);
            self.encode(job).map(|bytes| (bytes, job.clone()))
        });
        let Some(updated) = updated else {
            self.file_locks.remove(id);
            return Ok(None);
        };
        let (bytes, job) = updated?;
        self.write(id, &bytes)?;
        Ok(Some(job))
    }

    fn remove_unless_completed(&self, id: &JobId) -> Result<JobRemoval, JobStoreError> {
        let lock = self.file_lock(id);
        let _file = lock.lock();
        let outcome = removal(self.jobs.remove_if(id, |job| !job.is_completed()));
        if !matches!(outcome, JobRemoval::Completed(_)) {
            self.delete(id)?;
            self.file_locks.remove(id);
        }
        Ok(outcome)
    }

    fn evict_completed_before(&self, cutoff: Timestamp) -> Result<usize, JobStoreError> {
        let mut evicted = Vec::new();
        self.jobs.retain(|id, job| {
            let expired = is_expired(job, cutoff);
            if expired {
                evicted.push(*id);
            }
            !expired
        });
        for id in &evicted {
            self.forget(id)?;
        }
        Ok(evicted.len())
    }

    fn list(&self) -> Result<Vec<BatchJob>, JobStoreError> {
        Ok(self.jobs.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::Did;

    fn job() -> BatchJob {
        BatchJob::pending("s".into(), Did::new("did:example:issuer").unwrap(), 2)
    }

    fn completed_at(at: Timestamp) -> BatchJob {
        let mut j = job();
        j.status = JobStatus::Completed;
        j.completed_at = Some(at);
        j
    }

    fn exercise(store: &dyn JobStore) {
        let j = job();
        store.insert(j.clone()).unwrap();
        assert!(matches!(store.insert(j.clone()), Err(JobStoreError::Duplicate(_))));
        assert_eq!(store.get(&j.id).unwrap(), Some(j.clone()));

        let updated = store
            .update(&j.id, &mut |job| job.status = JobStatus::Processing)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, JobStatus::Processing);

        assert!(matches!(store.remove_unless_completed(&j.id).unwrap(), JobRemoval::Removed(_)));
        assert_eq!(store.remove_unless_completed(&j.id).unwrap(), JobRemoval::Missing);
        assert!(store.update(&j.id, &mut |_| {}).unwrap().is_none());

        let done = completed_at(Timestamp::now());
        store.insert(done.clone()).unwrap();
        assert!(matches!(
            store.remove_unless_completed(&done.id).unwrap(),
            JobRemoval::Completed(_)
        ));
        assert!(store.get(&done.id).unwrap().is_some());
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryJobStore::new());
    }

    #[test]
    fn file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileJobStore::open(dir.path()).unwrap());
    }

    #[test]
    fn eviction_drops_only_old_completed_jobs() {
        let store = MemoryJobStore::new();
        let now = Timestamp::now();
        let old = completed_at(now.plus_seconds(-7200));
        let fresh = completed_at(now);
        let running = job();
        for j in [&old, &fresh, &running] {
            store.insert(j.clone()).unwrap();
        }
        assert_eq!(store.evict_completed_before(now.plus_seconds(-3600)).unwrap(), 1);
        assert!(store.get(&old.id).unwrap().is_none());
        assert!(store.get(&fresh.id).unwrap().is_some());
        assert!(store.get(&running.id).unwrap().is_some());
    }

    #[test]
    fn file_store_reloads_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let j = job();
        {
            let store = FileJobStore::open(dir.path()).unwrap();
            store.insert(j.clone()).unwrap();
            store
                .update(&j.id, &mut |job| {
                    job.status = JobStatus::Processing;
                    job.record_success(0, "urn:uuid:x".into());
                })
                .unwrap();
        }
        let reopened = FileJobStore::open(dir.path()).unwrap();
        let loaded = reopened.get(&j.id).unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Processing);
        assert_eq!(loaded.processed, 1);
        assert_eq!(loaded.results[0].credential_id, "urn:uuid:x");

        assert!(matches!(
            reopened.remove_unless_completed(&j.id).unwrap(),
            JobRemoval::Removed(_)
        ));
        assert!(!dir.path().join(format!("{}.json", j.id)).exists());
    }

    #[test]
    fn file_store_eviction_deletes_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        let old = completed_at(Timestamp::now().plus_seconds(-100));
        store.insert(old.clone()).unwrap();
        assert!(dir.path().join(format!("{}.json", old.id)).exists());
        assert_eq!(store.evict_completed_before(Timestamp::now()).unwrap(), 1);
        assert!(!dir.path().join(format!("{}.json", old.id)).exists());
    }

    #[test]
    fn file_writes_do_not_hold_the_registry_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        let (a, b) = (job(), job());
        store.insert(a.clone()).unwrap();
        store.insert(b.clone()).unwrap();

        let lock = store.file_lock(&a.id);
        let _writing = lock.lock();
        assert!(store.get(&a.id).unwrap().is_some());
        assert_eq!(store.list().unwrap().len(), 2);
        let updated = store
            .update(&b.id, &mut |job| job.status = JobStatus::Processing)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, JobStatus::Processing);
    }

    #[test]
    fn job_files_are_compact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        let j = job();
        store.insert(j.clone()).unwrap();
        let text = std::fs::read_to_string(dir.path().join(format!("{}.json", j.id))).unwrap();
        assert!(!text.contains('\n'));
    }

    #[test]
    fn cancel_racing_updates_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileJobStore::open(dir.path()).unwrap());
        let j = job();
        store.insert(j.clone()).unwrap();

        let worker = {
            let store = Arc::clone(&store);
            let id = j.id;
            std::thread::spawn(move || {
                let mut writes = 0usize;
                while store
                    .update(&id, &mut |job| job.status = JobStatus::Processing)
                    .unwrap()
                    .is_some()
                {
                    writes += 1;
                }
                writes
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(
            store.remove_unless_completed(&j.id).unwrap(),
            JobRemoval::Removed(_)
        ));
        worker.join().unwrap();
        assert!(!dir.path().join(format!("{}.json", j.id)).exists());
        assert!(FileJobStore::open(dir.path()).unwrap().list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{").unwrap();
        assert!(matches!(
            FileJobStore::open(dir.path()),
            Err(JobStoreError::Corrupt { .. })
        ));
    }
}
