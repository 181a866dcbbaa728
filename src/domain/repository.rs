use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entity::{
    activity::{ActivityLog, ActivityType},
    forum::{Answer, Question},
    iam::User,
    notification::Notification,
};
use crate::error::persistence::PersistenceError;

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn insert_question(&self, question: &Question) -> Result<(), PersistenceError>;
    /// Fails with [`PersistenceError::NotFound`] when the question is gone.
    async fn update_question(&self, question: &Question) -> Result<(), PersistenceError>;
    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, PersistenceError>;
    /// All questions, oldest first.
    async fn find_questions(&self) -> Result<Vec<Question>, PersistenceError>;
    async fn find_questions_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<Question>, PersistenceError>;
    async fn find_questions_by_tag(&self, tag: &str) -> Result<Vec<Question>, PersistenceError>;
    /// Delete a question along with its answers, returning whether it existed.
    async fn delete_question(&self, id: Uuid) -> Result<bool, PersistenceError>;
    /// Questions matching a phrase, best match first.
    async fn search_questions(&self, phrase: &str) -> Result<Vec<Question>, PersistenceError>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn insert_answer(&self, answer: &Answer) -> Result<(), PersistenceError>;
    async fn update_answer(&self, answer: &Answer) -> Result<(), PersistenceError>;
    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>, PersistenceError>;
    /// Answers of a question, oldest first.
    async fn find_answers_by_question(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<Answer>, PersistenceError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError>;
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<User>, PersistenceError>;
    async fn find_users(&self) -> Result<Vec<User>, PersistenceError>;
}

/// Activity queries return the newest entries first.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn insert_activity(&self, entry: &ActivityLog) -> Result<(), PersistenceError>;
    async fn find_activity_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActivityLog>, PersistenceError>;
    async fn find_activity_by_user_and_type(
        &self,
        user_id: &str,
        activity_type: ActivityType,
    ) -> Result<Vec<ActivityLog>, PersistenceError>;
    async fn find_activity_by_user_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ActivityLog>, PersistenceError>;
    async fn find_activity_by_type(
        &self,
        activity_type: ActivityType,
    ) -> Result<Vec<ActivityLog>, PersistenceError>;
}

/// Notification queries return the newest entries first.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert unless the notification's question already reached `limit`
    /// notifications created at or after `since`.
    ///
    /// Counting and inserting happen atomically per question. Returns
    /// whether the notification was stored.
    async fn insert_notification_within_limit(
        &self,
        notification: &Notification,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<bool, PersistenceError>;
    async fn update_notification(&self, notification: &Notification)
        -> Result<(), PersistenceError>;
    async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>, PersistenceError>;
    async fn find_notifications_by_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, PersistenceError>;
}
