//! Embedded store keeping every aggregate in process memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::{
        entity::{
            activity::{ActivityLog, ActivityType},
            forum::{Answer, Question},
            iam::User,
            notification::Notification,
            Entity,
        },
        repository::{
            ActivityLogRepository, AnswerRepository, NotificationRepository, QuestionRepository,
            UserRepository,
        },
        search,
    },
    error::persistence::PersistenceError,
};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Default)]
pub struct MemoryStore {
    questions: RwLock<Vec<Question>>,
    answers: RwLock<Vec<Answer>>,
    users: RwLock<Vec<User>>,
    activity: RwLock<Vec<ActivityLog>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicated() -> PersistenceError {
    PersistenceError::Database(Some(UNIQUE_VIOLATION.into()))
}

/// Replace the stored item sharing `id`.
fn replace<T, F>(items: &mut [T], item: &T, id: F) -> Result<(), PersistenceError>
where
    T: Clone,
    F: Fn(&T) -> Uuid,
{
    let target = id(item);
    let slot = items
        .iter_mut()
        .find(|stored| id(stored) == target)
        .ok_or(PersistenceError::NotFound)?;
    *slot = item.clone();
    Ok(())
}

/// Newest first, entries sharing a timestamp keep the latest insert first.
fn newest_first<T, F>(mut items: Vec<T>, timestamp: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.reverse();
    items.sort_by_key(|item| std::cmp::Reverse(timestamp(item)));
    items
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn insert_question(&self, question: &Question) -> Result<(), PersistenceError> {
        let mut questions = self.questions.write().await;
        if questions.iter().any(|q| q.ident() == question.ident()) {
            return Err(duplicated());
        }
        questions.push(question.clone());
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<(), PersistenceError> {
        let mut questions = self.questions.write().await;
        replace(&mut questions, question, Entity::ident)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, PersistenceError> {
        let questions = self.questions.read().await;
        Ok(questions.iter().find(|q| q.ident() == id).cloned())
    }

    async fn find_questions(&self) -> Result<Vec<Question>, PersistenceError> {
        Ok(self.questions.read().await.clone())
    }

    async fn find_questions_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<Question>, PersistenceError> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| q.author_id() == author_id)
            .cloned()
            .collect())
    }

    async fn find_questions_by_tag(&self, tag: &str) -> Result<Vec<Question>, PersistenceError> {
        let questions = self.questions.read().await;
        Ok(questions.iter().filter(|q| q.has_tag(tag)).cloned().collect())
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, PersistenceError> {
        let mut questions = self.questions.write().await;
        let mut answers = self.answers.write().await;

        let before = questions.len();
        questions.retain(|q| q.ident() != id);
        if questions.len() == before {
            return Ok(false);
        }
        answers.retain(|a| a.question_id() != id);
        Ok(true)
    }

    async fn search_questions(&self, phrase: &str) -> Result<Vec<Question>, PersistenceError> {
        let questions = self.questions.read().await.clone();
        Ok(search::rank(questions, phrase))
    }
}

#[async_trait]
impl AnswerRepository for MemoryStore {
    async fn insert_answer(&self, answer: &Answer) -> Result<(), PersistenceError> {
        let mut answers = self.answers.write().await;
        if answers.iter().any(|a| a.ident() == answer.ident()) {
            return Err(duplicated());
        }
        answers.push(answer.clone());
        Ok(())
    }

    async fn update_answer(&self, answer: &Answer) -> Result<(), PersistenceError> {
        let mut answers = self.answers.write().await;
        replace(&mut answers, answer, Entity::ident)
    }

    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>, PersistenceError> {
        let answers = self.answers.read().await;
        Ok(answers.iter().find(|a| a.ident() == id).cloned())
    }

    async fn find_answers_by_question(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<Answer>, PersistenceError> {
        let answers = self.answers.read().await;
        Ok(answers
            .iter()
            .filter(|a| a.question_id() == question_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.ident() == user.ident() || u.username() == user.username())
        {
            return Err(duplicated());
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, PersistenceError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username() == username).cloned())
    }

    async fn find_users(&self) -> Result<Vec<User>, PersistenceError> {
        Ok(self.users.read().await.clone())
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryStore {
    async fn insert_activity(&self, entry: &ActivityLog) -> Result<(), PersistenceError> {
        self.activity.write().await.push(entry.clone());
        Ok(())
    }

    async fn find_activity_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActivityLog>, PersistenceError> {
        let activity = self.activity.read().await;
        Ok(newest_first(
            activity
                .iter()
                .filter(|e| e.user_id.as_deref() == Some(user_id))
                .cloned()
                .collect(),
            |e: &ActivityLog| e.timestamp,
        ))
    }

    async fn find_activity_by_user_and_type(
        &self,
        user_id: &str,
        activity_type: ActivityType,
    ) -> Result<Vec<ActivityLog>, PersistenceError> {
        let activity = self.activity.read().await;
        Ok(newest_first(
            activity
                .iter()
                .filter(|e| e.user_id.as_deref() == Some(user_id))
                .filter(|e| e.activity_type == activity_type)
                .cloned()
                .collect(),
            |e: &ActivityLog| e.timestamp,
        ))
    }

    async fn find_activity_by_user_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ActivityLog>, PersistenceError> {
        let activity = self.activity.read().await;
        Ok(newest_first(
            activity
                .iter()
                .filter(|e| e.user_id.as_deref() == Some(user_id))
                .filter(|e| e.timestamp >= from && e.timestamp <= to)
                .cloned()
                .collect(),
            |e: &ActivityLog| e.timestamp,
        ))
    }

    async fn find_activity_by_type(
        &self,
        activity_type: ActivityType,
    ) -> Result<Vec<ActivityLog>, PersistenceError> {
        let activity = self.activity.read().await;
        Ok(newest_first(
            activity
                .iter()
                .filter(|e| e.activity_type == activity_type)
                .cloned()
                .collect(),
            |e: &ActivityLog| e.timestamp,
        ))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification_within_limit(
        &self,
        notification: &Notification,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<bool, PersistenceError> {
        let mut notifications = self.notifications.write().await;
        let count = notifications
            .iter()
            .filter(|n| n.question_id == notification.question_id && n.created >= since)
            .count();

        if count >= limit as usize {
            return Ok(false);
        }
        notifications.push(notification.clone());
        Ok(true)
    }

    async fn update_notification(
        &self,
        notification: &Notification,
    ) -> Result<(), PersistenceError> {
        let mut notifications = self.notifications.write().await;
        replace(&mut notifications, notification, |n| n.id)
    }

    async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>, PersistenceError> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn find_notifications_by_recipient(
        &self,
        recipient_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, PersistenceError> {
        let notifications = self.notifications.read().await;
        Ok(newest_first(
            notifications
                .iter()
                .filter(|n| n.recipient_id == recipient_id)
                .filter(|n| !unread_only || !n.read)
                .cloned()
                .collect(),
            |n: &Notification| n.created,
        ))
    }
}
