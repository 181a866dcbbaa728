use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOPIC_QUESTIONS: &str = "qa-forum.questions";
pub const TOPIC_ANSWERS: &str = "qa-forum.answers";

pub const TOPIC_PARTITIONS: u32 = 3;
pub const TOPIC_REPLICAS: u16 = 1;

pub const TOPICS: [&str; 2] = [TOPIC_QUESTIONS, TOPIC_ANSWERS];

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    #[display(fmt = "QUESTION_CREATED")]
    QuestionCreated,
    #[display(fmt = "ANSWER_CREATED")]
    AnswerCreated,
    #[display(fmt = "ANSWER_ACCEPTED")]
    AnswerAccepted,
    #[display(fmt = "ANSWER_VOTED")]
    AnswerVoted,
}

/// Event published on the broker whenever forum content changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub question_id: Option<Uuid>,
    #[serde(default)]
    pub answer_id: Option<Uuid>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub question_author_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ForumEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            question_id: None,
            answer_id: None,
            author_id: None,
            question_author_id: None,
            title: None,
            body: None,
            timestamp: Utc::now(),
        }
    }

    pub fn topic(&self) -> &'static str {
        match self.event_type {
            EventType::QuestionCreated => TOPIC_QUESTIONS,
            EventType::AnswerCreated | EventType::AnswerAccepted | EventType::AnswerVoted => {
                TOPIC_ANSWERS
            }
        }
    }

    /// Record key, which also picks the partition.
    pub fn key(&self) -> Option<String> {
        self.question_id
            .or(self.answer_id)
            .map(|id| id.to_string())
    }

    pub fn partition(&self) -> u32 {
        let key = self.key().unwrap_or_default();
        partition_for(key.as_bytes(), TOPIC_PARTITIONS)
    }
}

/// Murmur2 hash as computed by the Kafka default partitioner.
pub fn murmur2(data: &[u8]) -> u32 {
    const SEED: u32 = 0x9747_b28c;
    const M: u32 = 0x5bd1_e995;
    const R: u32 = 24;

    let length = data.len();
    let mut h = SEED ^ (length as u32);

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

pub fn partition_for(key: &[u8], partitions: u32) -> u32 {
    (murmur2(key) & 0x7fff_ffff) % partitions.max(1)
}
