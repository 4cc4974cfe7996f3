//! Slot holding the single in-flight scraping job

use tokio::sync::RwLock;

use crate::types::ScrapingJob;

/// At most one scraping job is tracked at a time
#[derive(Default)]
pub struct ScrapingJobSlot {
    job: RwLock<Option<ScrapingJob>>,
}

impl ScrapingJobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current job, if any
    pub async fn current(&self) -> Option<ScrapingJob> {
        self.job.read().await.clone()
    }

    /// Swap the tracked job, returning the previous one
    pub async fn replace(&self, job: Option<ScrapingJob>) -> Option<ScrapingJob> {
        let mut slot = self.job.write().await;
        std::mem::replace(&mut *slot, job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_slot_starts_empty_and_replaces() {
        let slot = ScrapingJobSlot::new();
        assert!(slot.current().await.is_none());

        let job = ScrapingJob {
            id: "job-1".into(),
            url: "https://example.com".into(),
            status: "running".into(),
            progress: 0.25,
            started_at: Utc::now(),
        };
        assert!(slot.replace(Some(job.clone())).await.is_none());
        assert_eq!(slot.current().await, Some(job.clone()));

        assert_eq!(slot.replace(None).await, Some(job));
        assert!(slot.current().await.is_none());
    }
}
