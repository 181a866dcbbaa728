use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::resource::{ValidationErrorKind, ValidationFieldError};

/// Most notifications a question may trigger in one UTC day.
pub const MAX_NOTIFICATIONS_PER_QUESTION_PER_DAY: u32 = 3;

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    #[display(fmt = "ANSWER_RECEIVED")]
    AnswerReceived,
    #[display(fmt = "ANSWER_ACCEPTED")]
    AnswerAccepted,
    #[display(fmt = "ANSWER_VOTED")]
    AnswerVoted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnswerReceived => "ANSWER_RECEIVED",
            Self::AnswerAccepted => "ANSWER_ACCEPTED",
            Self::AnswerVoted => "ANSWER_VOTED",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ValidationFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANSWER_RECEIVED" => Ok(Self::AnswerReceived),
            "ANSWER_ACCEPTED" => Ok(Self::AnswerAccepted),
            "ANSWER_VOTED" => Ok(Self::AnswerVoted),
            _ => Err(ValidationFieldError::new(
                "notification::kind",
                s.into(),
                "/kind".into(),
                vec![ValidationErrorKind::UnknownVariant],
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub question_id: Uuid,
    pub answer_id: Option<Uuid>,
    pub read: bool,
    pub created: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: String,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        question_id: Uuid,
        answer_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            title: title.into(),
            message: message.into(),
            question_id,
            answer_id,
            read: false,
            created: Utc::now(),
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
