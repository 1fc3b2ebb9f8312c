//! Memory recall — the read interface the reasoning engine needs from the
//! agent's memory store, plus an in-process stream with three-factor retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::reasoning::Situation;

const DEFAULT_RETRIEVAL_COUNT: usize = 10;
const DEFAULT_RECENCY_DECAY: f64 = 0.995;

/// A stored memory as the decision core sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    /// Situation kind the memory was recorded under ("task", "problem", ...)
    #[serde(rename = "type")]
    pub memory_type: String,
    pub content: String,
    /// 1-10
    #[serde(default = "default_importance")]
    pub importance: i32,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Whether acting on this memory went well, when known
    #[serde(default)]
    pub success: Option<bool>,
}

fn default_importance() -> i32 {
    5
}

/// Collaborator that recalls memories similar to a situation.
pub trait MemoryRecall: Send + Sync {
    fn recall_similar(&self, situation: &Situation) -> Vec<MemoryRecord>;
}

/// Recall that never remembers anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMemory;

impl MemoryRecall for NoMemory {
    fn recall_similar(&self, _situation: &Situation) -> Vec<MemoryRecord> {
        Vec::new()
    }
}

/// Lower-cased word set, ignoring short filler words.
fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Jaccard overlap between two keyword sets.
fn keyword_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    inter / union
}

/// Append-only memory stream with recency x importance x relevance retrieval.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    pub memories: Vec<MemoryRecord>,
    next_id: u32,
    retrieval_count: usize,
    recency_decay_rate: f64,
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIEVAL_COUNT, DEFAULT_RECENCY_DECAY)
    }
}

impl MemoryStream {
    pub fn new(retrieval_count: usize, recency_decay_rate: f64) -> Self {
        Self {
            memories: Vec::new(),
            next_id: 0,
            retrieval_count,
            recency_decay_rate,
        }
    }

    /// Seed the stream from existing records, continuing their `m_NNNN` numbering.
    pub fn from_records(records: Vec<MemoryRecord>) -> Self {
        let mut stream = Self::default();
        if let Some(max_id) = records
            .iter()
            .filter_map(|m| m.id.strip_prefix("m_").and_then(|s| s.parse::<u32>().ok()))
            .max()
        {
            stream.next_id = max_id + 1;
        }
        stream.memories = records;
        stream
    }

    pub fn add(
        &mut self,
        memory_type: &str,
        content: &str,
        importance: i32,
        success: Option<bool>,
    ) -> MemoryRecord {
        let entry = MemoryRecord {
            id: format!("m_{:04}", self.next_id),
            memory_type: memory_type.to_string(),
            content: content.to_string(),
            importance: importance.clamp(1, 10),
            timestamp: Utc::now(),
            success,
        };
        self.memories.push(entry.clone());
        self.next_id += 1;
        entry
    }

    /// Three-factor retrieval against an arbitrary query.
    pub fn retrieve(&self, query: &str, kind: Option<&str>, top_k: Option<usize>) -> Vec<&MemoryRecord> {
        let top_k = top_k.unwrap_or(self.retrieval_count);
        if self.memories.is_empty() {
            return Vec::new();
        }

        let query_words = keywords(query);
        let now = Utc::now();
        let decay_rate = self.recency_decay_rate;

        let mut scored: Vec<(f64, &MemoryRecord)> = self
            .memories
            .iter()
            .map(|mem| {
                let hours_ago = (now - mem.timestamp).num_seconds().max(0) as f64 / 3600.0;
                let recency = (-(1.0 - decay_rate) * hours_ago).exp();
                let importance = mem.importance as f64 / 10.0;
                let relevance = keyword_overlap(&query_words, &keywords(&mem.content));
                let kind_bonus = match kind {
                    Some(k) if mem.memory_type == k => 1.0,
                    _ => 0.0,
                };
                (recency + importance + relevance + kind_bonus, mem)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(top_k).map(|(_, mem)| mem).collect()
    }

    pub fn get_recent(&self, n: usize, kind: Option<&str>) -> Vec<&MemoryRecord> {
        let filtered: Vec<&MemoryRecord> = if let Some(k) = kind {
            self.memories.iter().filter(|m| m.memory_type == k).collect()
        } else {
            self.memories.iter().collect()
        };
        let start = filtered.len().saturating_sub(n);
        filtered[start..].to_vec()
    }
}

impl MemoryRecall for MemoryStream {
    fn recall_similar(&self, situation: &Situation) -> Vec<MemoryRecord> {
        let recalled: Vec<MemoryRecord> = self
            .retrieve(
                &situation.description,
                Some(situation.situation_type.as_str()),
                None,
            )
            .into_iter()
            .cloned()
            .collect();
        debug!("Recalled {} memories for '{}'", recalled.len(), situation.description);
        recalled
    }
}
