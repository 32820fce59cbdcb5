// ABOUTME: Entry store trait and JSON file-backed reference implementation
// ABOUTME: Scope/filter candidate reads plus embedding-field-only writes

use crate::{
    model::{AiInsights, Engagement, Entry, PersonTag, Privacy, SearchFilters, SearchScope},
    Error, Result,
};
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Read/write boundary between the retrieval core and entry persistence.
/// The core never mutates entry content; writes are limited to the
/// embedding fields, derived searchable text, and AI insights.
pub trait EntryStore: Send + Sync {
    /// Entries visible to `user` under `scope`, with all filters applied
    /// conjunctively. A filter that matches nothing yields an empty set.
    fn candidates(
        &self,
        user: Uuid,
        scope: SearchScope,
        filters: &SearchFilters,
    ) -> Result<Vec<Entry>>;

    fn get(&self, id: Uuid) -> Result<Option<Entry>>;

    fn insert(&self, entry: Entry) -> Result<()>;

    /// Entries whose derived embedding is absent, optionally restricted to
    /// one owner. Used by the maintenance sweep.
    fn missing_embeddings(&self, user: Option<Uuid>, limit: usize) -> Result<Vec<Entry>>;

    /// The user's own entries created in the last `days` days, newest first.
    fn recent_entries(&self, user: Uuid, days: i64, limit: usize) -> Result<Vec<Entry>>;

    fn owned_entries(&self, user: Uuid) -> Result<Vec<Entry>>;

    fn update_embedding(
        &self,
        id: Uuid,
        embedding: &str,
        version: &str,
        updated_at: DateTime<Utc>,
        searchable_text: &str,
    ) -> Result<()>;

    fn update_insights(&self, id: Uuid, insights: &AiInsights) -> Result<()>;

    /// Social signals for one entry as seen by the requesting user.
    fn engagement(&self, entry_id: Uuid, user: Uuid) -> Result<Engagement>;
}

pub fn scope_matches(entry: &Entry, user: Uuid, scope: SearchScope) -> bool {
    match scope {
        SearchScope::Own => entry.owner_id == user,
        SearchScope::Feed => {
            entry.owner_id != user
                && (entry.privacy == Privacy::Public || entry.shared_with.contains(&user))
        }
        SearchScope::Shared => {
            entry.privacy == Privacy::Shared && entry.shared_with.contains(&user)
        }
    }
}

/// Conjunctive structured filters. Person constraints join against the
/// person-tagging relation restricted to tags created by the querying user.
pub fn filters_match(
    entry: &Entry,
    user: Uuid,
    filters: &SearchFilters,
    person_tags: &[PersonTag],
) -> bool {
    for tag in &filters.tags {
        if !entry.tags.iter().any(|t| t == tag) {
            return false;
        }
    }

    for name in &filters.people {
        let tagged = person_tags.iter().any(|pt| {
            pt.entry_id == entry.id
                && pt.tagged_by == user
                && pt.person_name.eq_ignore_ascii_case(name)
        });
        if !tagged {
            return false;
        }
    }

    // Inclusive by calendar day at both ends
    let day = entry.created_at.date_naive();
    if let Some(from) = filters.date_from {
        if day < from {
            return false;
        }
    }
    if let Some(to) = filters.date_to {
        if day > to {
            return false;
        }
    }

    if let Some(privacy) = filters.privacy {
        if entry.privacy != privacy {
            return false;
        }
    }

    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EngagementData {
    #[serde(default)]
    likes: u32,
    #[serde(default)]
    comments: u32,
    /// Per-user timestamp of the most recent like or comment.
    #[serde(default)]
    interactions: HashMap<Uuid, DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    default_user: Option<Uuid>,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    person_tags: Vec<PersonTag>,
    #[serde(default)]
    engagement: HashMap<Uuid, EngagementData>,
}

/// Single-file JSON store with atomic writes. Good enough for one user's
/// journal on disk; production deployments swap in their own `EntryStore`.
pub struct JsonStore {
    path: PathBuf,
    tmp_dir: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let tmp_dir = path
            .parent()
            .map(|p| p.join("tmp"))
            .unwrap_or_else(|| PathBuf::from("tmp"));
        ensure_dir(&tmp_dir)?;

        let data = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            StoreData {
                default_user: Some(Uuid::new_v4()),
                ..Default::default()
            }
        };

        Ok(JsonStore {
            path,
            tmp_dir,
            data: Mutex::new(data),
        })
    }

    /// The user generated when this store file was first created.
    pub fn default_user(&self) -> Uuid {
        let mut data = self.lock();
        if let Some(user) = data.default_user {
            return user;
        }
        let user = Uuid::new_v4();
        data.default_user = Some(user);
        user
    }

    pub fn tag_person(&self, tag: PersonTag) -> Result<()> {
        {
            let mut data = self.lock();
            data.person_tags.push(tag);
        }
        self.save()
    }

    pub fn record_engagement(
        &self,
        entry_id: Uuid,
        likes: u32,
        comments: u32,
        interaction: Option<(Uuid, DateTime<Utc>)>,
    ) -> Result<()> {
        {
            let mut data = self.lock();
            let record = data.engagement.entry(entry_id).or_default();
            record.likes = likes;
            record.comments = comments;
            if let Some((user, at)) = interaction {
                record.interactions.insert(user, at);
            }
        }
        self.save()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreData> {
        // Mutex poisoning only happens after a panic mid-write; recover the data
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self) -> Result<()> {
        let content = {
            let data = self.lock();
            serde_json::to_string_pretty(&*data)?
        };
        write_atomic(&self.path, content.as_bytes(), &self.tmp_dir)
    }
}

impl EntryStore for JsonStore {
    fn candidates(
        &self,
        user: Uuid,
        scope: SearchScope,
        filters: &SearchFilters,
    ) -> Result<Vec<Entry>> {
        let data = self.lock();
        Ok(data
            .entries
            .iter()
            .filter(|e| scope_matches(e, user, scope))
            .filter(|e| filters_match(e, user, filters, &data.person_tags))
            .cloned()
            .collect())
    }

    fn get(&self, id: Uuid) -> Result<Option<Entry>> {
        let data = self.lock();
        Ok(data.entries.iter().find(|e| e.id == id).cloned())
    }

    fn insert(&self, mut entry: Entry) -> Result<()> {
        if entry.searchable_text.trim().is_empty() {
            entry.searchable_text = entry.derive_searchable_text();
        }
        {
            let mut data = self.lock();
            if data.entries.iter().any(|e| e.id == entry.id) {
                return Err(Error::Store(format!("duplicate entry id {}", entry.id)));
            }
            data.entries.push(entry);
        }
        self.save()
    }

    fn missing_embeddings(&self, user: Option<Uuid>, limit: usize) -> Result<Vec<Entry>> {
        let data = self.lock();
        let mut missing: Vec<Entry> = data
            .entries
            .iter()
            .filter(|e| e.content_embedding.is_none())
            .filter(|e| user.map(|u| e.owner_id == u).unwrap_or(true))
            .cloned()
            .collect();
        missing.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        missing.truncate(limit);
        Ok(missing)
    }

    fn recent_entries(&self, user: Uuid, days: i64, limit: usize) -> Result<Vec<Entry>> {
        let cutoff = Utc::now() - Duration::days(days);
        let data = self.lock();
        let mut recent: Vec<Entry> = data
            .entries
            .iter()
            .filter(|e| e.owner_id == user && e.created_at >= cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }

    fn owned_entries(&self, user: Uuid) -> Result<Vec<Entry>> {
        let data = self.lock();
        Ok(data
            .entries
            .iter()
            .filter(|e| e.owner_id == user)
            .cloned()
            .collect())
    }

    fn update_embedding(
        &self,
        id: Uuid,
        embedding: &str,
        version: &str,
        updated_at: DateTime<Utc>,
        searchable_text: &str,
    ) -> Result<()> {
        {
            let mut data = self.lock();
            let entry = data
                .entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| Error::Store(format!("entry {} not found", id)))?;
            entry.content_embedding = Some(embedding.to_string());
            entry.embedding_version = Some(version.to_string());
            entry.last_embedding_update = Some(updated_at);
            entry.searchable_text = searchable_text.to_string();
        }
        self.save()
    }

    fn update_insights(&self, id: Uuid, insights: &AiInsights) -> Result<()> {
        {
            let mut data = self.lock();
            let entry = data
                .entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| Error::Store(format!("entry {} not found", id)))?;
            entry.ai_insights = Some(insights.clone());
        }
        self.save()
    }

    fn engagement(&self, entry_id: Uuid, user: Uuid) -> Result<Engagement> {
        let data = self.lock();
        Ok(data
            .engagement
            .get(&entry_id)
            .map(|record| Engagement {
                likes: record.likes,
                comments: record.comments,
                last_interaction: record.interactions.get(&user).copied(),
            })
            .unwrap_or_default())
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o700);
        fs::set_permissions(dir, perms)?;
    }
    Ok(())
}

pub fn write_atomic(path: &Path, content: &[u8], tmp_dir: &Path) -> Result<()> {
    use rand::Rng;

    // Create temp file
    let random: u32 = rand::thread_rng().gen();
    let tmp_path = tmp_dir.join(format!("{:x}.part", random));

    // Write to temp
    fs::write(&tmp_path, content)?;

    // Set permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&tmp_path, perms)?;
    }

    // Atomic rename
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Default on-disk location for the CLI's journal store.
pub fn default_store_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "daybook").ok_or_else(|| {
        Error::Filesystem(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().join("journal.json"))
}
