//! Mem0 long-term memory backends

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::UpstreamClient;
use crate::error::Result;
use crate::types::{BackendMode, MemoryHealth, MemoryHit, MemoryUsage};

#[async_trait]
pub trait MemoryBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    async fn search(&self, query: &str, filters: Option<&Value>, limit: usize) -> Result<Vec<MemoryHit>>;

    /// Store a memory and return the id the vendor assigned
    async fn store(&self, id: &str, content: &str, metadata: Option<&Value>) -> Result<String>;

    async fn health(&self) -> Result<MemoryHealth>;
}

pub struct LiveMem0 {
    client: UpstreamClient,
    user_id: String,
}

impl LiveMem0 {
    pub fn new(client: UpstreamClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl MemoryBackend for LiveMem0 {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn search(&self, query: &str, filters: Option<&Value>, limit: usize) -> Result<Vec<MemoryHit>> {
        let mut body = json!({
            "query": query,
            "user_id": self.user_id,
            "limit": limit,
        });
        if let Some(filters) = filters {
            body["filters"] = filters.clone();
        }

        let reply = self.client.post("/v1/memories/search/", &body).await?;

        let mut hits: Vec<MemoryHit> = records(&reply).iter().filter_map(to_hit).collect();
        hits.truncate(limit);
        Ok(hits)
    }

    async fn store(&self, id: &str, content: &str, metadata: Option<&Value>) -> Result<String> {
        let mut merged = match metadata {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        merged.insert("external_id".into(), Value::String(id.to_string()));

        let body = json!({
            "messages": [{ "role": "user", "content": content }],
            "user_id": self.user_id,
            "metadata": merged,
        });

        let reply = self.client.post("/v1/memories/", &body).await?;

        // The vendor may not echo an id for deduplicated memories
        let memory_id = records(&reply)
            .first()
            .and_then(|r| r.get("id"))
            .and_then(Value::as_str)
            .or_else(|| reply.get("id").and_then(Value::as_str))
            .unwrap_or(id)
            .to_string();

        Ok(memory_id)
    }

    async fn health(&self) -> Result<MemoryHealth> {
        let reply = self
            .client
            .get_with_query("/v1/memories/", &[("user_id", self.user_id.as_str())])
            .await?;

        let memories_count = records(&reply).len();
        Ok(MemoryHealth {
            status: "connected".to_string(),
            memories_count,
            usage: MemoryUsage {
                stored: memories_count,
                plan_limit: reply
                    .get("plan_limit")
                    .and_then(Value::as_u64)
                    .map(|n| n as usize),
            },
        })
    }
}

/// In-process memory backend used when no Mem0 key is configured
pub struct StubMem0;

#[async_trait]
impl MemoryBackend for StubMem0 {
    fn mode(&self) -> BackendMode {
        BackendMode::Stub
    }

    async fn search(&self, _query: &str, _filters: Option<&Value>, _limit: usize) -> Result<Vec<MemoryHit>> {
        Ok(Vec::new())
    }

    async fn store(&self, _id: &str, _content: &str, _metadata: Option<&Value>) -> Result<String> {
        Ok(format!("mem_{}", uuid::Uuid::new_v4().simple()))
    }

    async fn health(&self) -> Result<MemoryHealth> {
        Ok(MemoryHealth {
            status: "development".to_string(),
            memories_count: 0,
            usage: MemoryUsage {
                stored: 0,
                plan_limit: None,
            },
        })
    }
}

/// Mem0 answers with either a bare array or `{ "results": [...] }`
fn records(reply: &Value) -> Vec<Value> {
    match reply {
        Value::Array(items) => items.clone(),
        other => other
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn to_hit(record: &Value) -> Option<MemoryHit> {
    let id = record.get("id")?.as_str()?.to_string();
    let content = record
        .get("memory")
        .or_else(|| record.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(MemoryHit {
        id,
        content,
        score: record.get("score").and_then(Value::as_f64),
        metadata: record.get("metadata").cloned().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_accepts_both_shapes() {
        let bare = json!([{ "id": "1" }, { "id": "2" }]);
        let wrapped = json!({ "results": [{ "id": "1" }] });
        assert_eq!(records(&bare).len(), 2);
        assert_eq!(records(&wrapped).len(), 1);
        assert!(records(&json!({ "message": "ok" })).is_empty());
    }

    #[test]
    fn test_to_hit_reads_memory_or_content() {
        let hit = to_hit(&json!({ "id": "m1", "memory": "likes rust", "score": 0.9 })).unwrap();
        assert_eq!(hit.content, "likes rust");
        assert_eq!(hit.score, Some(0.9));

        let hit = to_hit(&json!({ "id": "m2", "content": "fallback" })).unwrap();
        assert_eq!(hit.content, "fallback");
        assert_eq!(hit.metadata, Value::Null);

        assert!(to_hit(&json!({ "memory": "no id" })).is_none());
    }

    #[tokio::test]
    async fn test_stub_store_generates_ids() {
        let first = StubMem0.store("a", "content", None).await.unwrap();
        let second = StubMem0.store("a", "content", None).await.unwrap();
        assert!(first.starts_with("mem_"));
        assert_ne!(first, second);
    }
}
