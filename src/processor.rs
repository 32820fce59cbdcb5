// ABOUTME: Background embedding maintenance: queue, consumer, backfill sweep
// ABOUTME: Bounded channel with one consumer makes single-drain structural

use crate::{api::ApiClient, model::Entry, store::EntryStore, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::thread::JoinHandle;
use std::time::Duration;
use uuid::Uuid;

pub const EMBEDDING_VERSION: &str = "text-embedding-3-small";

/// Queue capacity. Enqueue is fire-and-forget; beyond this the id is
/// dropped and rediscovered by the next backfill sweep.
const QUEUE_CAPACITY: usize = 256;

/// An embedding refreshed this recently is assumed current. This is the
/// only guard against duplicate work when two processors coexist.
const REFRESH_GUARD_MINUTES: i64 = 60;

/// Inter-job delay to respect upstream rate limits.
const DEFAULT_JOB_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BackfillReport {
    pub processed: usize,
    pub errors: usize,
    pub total_found: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EmbeddingStatus {
    pub total_entries: usize,
    pub with_embeddings: usize,
    pub needs_processing: usize,
    pub coverage_percent: f32,
}

/// Owns the in-process embedding queue. One consumer thread drains it; a
/// second drain loop cannot exist because the receiving end is moved into
/// that thread at construction. The queue does not survive process restart;
/// unprocessed entries are rediscovered by `process_missing`.
pub struct EmbeddingProcessor {
    sender: Option<SyncSender<Uuid>>,
    pending: Arc<Mutex<HashSet<Uuid>>>,
    errors: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl EmbeddingProcessor {
    pub fn new(api: Arc<ApiClient>, store: Arc<dyn EntryStore>) -> Self {
        Self::with_delay(api, store, Duration::from_millis(DEFAULT_JOB_DELAY_MS))
    }

    pub fn with_delay(
        api: Arc<ApiClient>,
        store: Arc<dyn EntryStore>,
        job_delay: Duration,
    ) -> Self {
        let (sender, receiver) = sync_channel::<Uuid>(QUEUE_CAPACITY);
        let pending = Arc::new(Mutex::new(HashSet::new()));
        let errors = Arc::new(AtomicUsize::new(0));

        let worker_pending = Arc::clone(&pending);
        let worker_errors = Arc::clone(&errors);
        let handle = std::thread::spawn(move || {
            for id in receiver.iter() {
                if let Ok(mut set) = worker_pending.lock() {
                    set.remove(&id);
                }
                if let Err(e) = process_entry(&api, store.as_ref(), id, Utc::now()) {
                    worker_errors.fetch_add(1, Ordering::Relaxed);
                    eprintln!("Warning: Embedding job for entry {} failed: {}", id, e);
                }
                std::thread::sleep(job_delay);
            }
        });

        EmbeddingProcessor {
            sender: Some(sender),
            pending,
            errors,
            handle: Some(handle),
        }
    }

    /// Fire-and-forget enqueue. Idempotent: an id already waiting is not
    /// duplicated. Returns whether the id was newly queued.
    pub fn queue(&self, entry_id: Uuid) -> bool {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if pending.contains(&entry_id) {
            return false;
        }

        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(entry_id) {
            Ok(()) => {
                pending.insert(entry_id);
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                eprintln!(
                    "Warning: Embedding queue full, dropping entry {} (backfill will pick it up)",
                    entry_id
                );
                false
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Closes the queue and waits for in-flight work to finish.
    pub fn shutdown(mut self) {
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EmbeddingProcessor {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

/// True when the entry's embedding was refreshed recently enough that
/// recomputation would be duplicate work.
fn recently_refreshed(entry: &Entry, now: DateTime<Utc>) -> bool {
    match entry.last_embedding_update {
        Some(updated) if entry.content_embedding.is_some() => {
            now - updated < ChronoDuration::minutes(REFRESH_GUARD_MINUTES)
        }
        _ => false,
    }
}

/// Computes and persists the embedding for one entry. A missing entry or a
/// recently refreshed one is a successful no-op. Nothing is persisted when
/// the provider call fails.
fn process_entry(
    api: &ApiClient,
    store: &dyn EntryStore,
    entry_id: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(entry) = store.get(entry_id)? else {
        return Ok(());
    };

    if recently_refreshed(&entry, now) {
        return Ok(());
    }

    let text = entry.derive_searchable_text();
    if text.trim().is_empty() {
        return Ok(());
    }

    let embedding = api.embed(&text)?;
    let encoded = crate::vector::encode(&embedding);
    store.update_embedding(entry_id, &encoded, EMBEDDING_VERSION, now, &text)
}

/// Synchronous backfill over entries missing embeddings. Per-entry failures
/// are counted and logged; the sweep always runs to completion.
pub fn process_missing(
    api: &ApiClient,
    store: &dyn EntryStore,
    user: Option<Uuid>,
    limit: usize,
) -> Result<BackfillReport> {
    let missing = store.missing_embeddings(user, limit)?;
    let total_found = missing.len();

    let pb = ProgressBar::new(total_found as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} entries")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut processed = 0;
    let mut errors = 0;

    for entry in &missing {
        match process_entry(api, store, entry.id, Utc::now()) {
            Ok(()) => processed += 1,
            Err(e) => {
                errors += 1;
                eprintln!("Warning: Failed to embed entry {}: {}", entry.id, e);
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "embedded {} entries ({} failed)",
        processed, errors
    ));

    Ok(BackfillReport {
        processed,
        errors,
        total_found,
    })
}

/// Embedding coverage for one user's entries.
pub fn status(store: &dyn EntryStore, user: Uuid) -> Result<EmbeddingStatus> {
    let entries = store.owned_entries(user)?;
    let total_entries = entries.len();
    let with_embeddings = entries
        .iter()
        .filter(|e| e.content_embedding.is_some())
        .count();
    let needs_processing = total_entries - with_embeddings;
    let coverage_percent = if total_entries == 0 {
        100.0
    } else {
        with_embeddings as f32 / total_entries as f32 * 100.0
    };

    Ok(EmbeddingStatus {
        total_entries,
        with_embeddings,
        needs_processing,
        coverage_percent,
    })
}
