use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    base::ResourceID,
    error::resource::{ValidationErrorKind, ValidationFieldError},
};

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    #[display(fmt = "QUESTION_CREATED")]
    QuestionCreated,
    #[display(fmt = "QUESTION_UPDATED")]
    QuestionUpdated,
    #[display(fmt = "QUESTION_DELETED")]
    QuestionDeleted,
    #[display(fmt = "ANSWER_CREATED")]
    AnswerCreated,
    #[display(fmt = "ANSWER_VOTED")]
    AnswerVoted,
    #[display(fmt = "ANSWER_ACCEPTED")]
    AnswerAccepted,
    #[display(fmt = "SEARCH_PERFORMED")]
    SearchPerformed,
    #[display(fmt = "USER_REGISTERED")]
    UserRegistered,
    #[display(fmt = "USER_LOGIN_SUCCESS")]
    UserLoginSuccess,
    #[display(fmt = "USER_LOGIN_FAILED")]
    UserLoginFailed,
}

impl ActivityType {
    pub const ALL: [ActivityType; 10] = [
        Self::QuestionCreated,
        Self::QuestionUpdated,
        Self::QuestionDeleted,
        Self::AnswerCreated,
        Self::AnswerVoted,
        Self::AnswerAccepted,
        Self::SearchPerformed,
        Self::UserRegistered,
        Self::UserLoginSuccess,
        Self::UserLoginFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionCreated => "QUESTION_CREATED",
            Self::QuestionUpdated => "QUESTION_UPDATED",
            Self::QuestionDeleted => "QUESTION_DELETED",
            Self::AnswerCreated => "ANSWER_CREATED",
            Self::AnswerVoted => "ANSWER_VOTED",
            Self::AnswerAccepted => "ANSWER_ACCEPTED",
            Self::SearchPerformed => "SEARCH_PERFORMED",
            Self::UserRegistered => "USER_REGISTERED",
            Self::UserLoginSuccess => "USER_LOGIN_SUCCESS",
            Self::UserLoginFailed => "USER_LOGIN_FAILED",
        }
    }
}

impl ResourceID for ActivityType {
    fn resource_id() -> &'static str {
        "activity::activity_type"
    }
}

impl FromStr for ActivityType {
    type Err = ValidationFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ValidationFieldError::new(
                    Self::resource_id(),
                    s.into(),
                    "/type".into(),
                    vec![ValidationErrorKind::UnknownVariant],
                )
            })
    }
}

/// Audit trail entry of something a user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub activity_type: ActivityType,
    pub description: String,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(
        user_id: Option<String>,
        activity_type: ActivityType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            activity_type,
            description: description.into(),
            resource_id: None,
            ip_address: None,
            metadata: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_resource(mut self, resource_id: impl ToString) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        let ip = ip.into();
        self.metadata.insert("ip".into(), ip.clone());
        self.ip_address = Some(ip);
        self
    }

    pub fn with_metadata<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}
