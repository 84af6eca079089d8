//! Persistence seam for the crowd log history.
//!
//! Durable storage is an external collaborator; the engine writes one entry
//! per tick and reads history back for the peak-hour and log queries. The
//! trait is the seam a database-backed implementation would plug into.

use anyhow::Result;
use async_trait::async_trait;
use common::analytics::LogEntry;
use std::collections::VecDeque;
use tokio::sync::RwLock;

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn append(&self, entry: LogEntry) -> Result<()>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>>;

    /// Full retained history, oldest first.
    async fn history(&self) -> Result<Vec<LogEntry>>;
}

/// Bounded in-memory store; oldest entries roll off past the retention cap.
pub struct MemoryLogStore {
    max_entries: usize,
    inner: RwLock<VecDeque<LogEntry>>,
}

impl MemoryLogStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            inner: RwLock::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn append(&self, entry: LogEntry) -> Result<()> {
        let mut entries = self.inner.write().await;
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let entries = self.inner.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn history(&self) -> Result<Vec<LogEntry>> {
        let entries = self.inner.read().await;
        Ok(entries.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::analytics::RiskLevel;
    use common::detection::AudioStatus;
    use uuid::Uuid;

    fn entry(offset_secs: i64, count: u32) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now() + Duration::seconds(offset_secs),
            person_count: count,
            risk_score: RiskLevel::Low,
            audio_status: AudioStatus::Normal,
        }
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let store = MemoryLogStore::new(100);
        for i in 0..5 {
            store.append(entry(i, i as u32)).await.unwrap();
        }
        let recent = store.recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].person_count, 4);
        assert_eq!(recent[2].person_count, 2);
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let store = MemoryLogStore::new(100);
        for i in 0..3 {
            store.append(entry(i, i as u32)).await.unwrap();
        }
        let history = store.history().await.unwrap();
        assert_eq!(history[0].person_count, 0);
        assert_eq!(history[2].person_count, 2);
    }

    #[tokio::test]
    async fn test_retention_cap() {
        let store = MemoryLogStore::new(2);
        for i in 0..4 {
            store.append(entry(i, i as u32)).await.unwrap();
        }
        let history = store.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].person_count, 2);
    }
}
