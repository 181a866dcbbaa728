pub mod activity;
pub mod resource;
pub mod use_case;
pub mod workload;

use std::sync::Arc;

use crate::{
    config::env_var::PoolSizes,
    domain::{
        repository::{
            ActivityLogRepository, AnswerRepository, NotificationRepository, QuestionRepository,
            UserRepository,
        },
        service::{EventPublisher, PasswordHashService},
    },
};

use self::{activity::ActivityRecorder, workload::Workload};

/// Shared state of every use case.
#[derive(Clone)]
pub struct Context {
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub activity: ActivityRecorder,
    pub publisher: Arc<dyn EventPublisher>,
    pub hash_service: Arc<dyn PasswordHashService>,
    pub workload: Workload,
}

impl Context {
    /// Build a context whose repositories are all served by `store`.
    pub fn new<S>(
        store: Arc<S>,
        publisher: Arc<dyn EventPublisher>,
        hash_service: Arc<dyn PasswordHashService>,
        pools: &PoolSizes,
    ) -> Self
    where
        S: QuestionRepository
            + AnswerRepository
            + UserRepository
            + ActivityLogRepository
            + NotificationRepository
            + 'static,
    {
        Self {
            questions: store.clone(),
            answers: store.clone(),
            users: store.clone(),
            notifications: store.clone(),
            activity: ActivityRecorder::new(store),
            publisher,
            hash_service,
            workload: Workload::new(pools),
        }
    }
}

pub mod transform {
    use crate::{
        app::resource::{
            activity::ActivityLogResponse,
            forum::{AnswerResponse, QuestionResponse},
            iam::UserResponse,
            notification::NotificationResponse,
        },
        domain::entity::{
            activity::ActivityLog,
            forum::{Answer, Question},
            iam::User,
            notification::Notification,
            Entity,
        },
    };

    impl From<Question> for QuestionResponse {
        fn from(question: Question) -> Self {
            Self {
                id: question.ident(),
                created_at: question.created(),
                updated_at: question.updated(),
                version: question.version(),
                title: question.title().clone(),
                body: question.body().clone(),
                tags: question.tags().clone(),
                author_id: question.author_id().clone(),
                votes: question.votes(),
            }
        }
    }

    impl From<Answer> for AnswerResponse {
        fn from(answer: Answer) -> Self {
            Self {
                id: answer.ident(),
                created_at: answer.created(),
                updated_at: answer.updated(),
                version: answer.version(),
                question_id: answer.question_id(),
                body: answer.body().clone(),
                author_id: answer.author_id().clone(),
                votes: answer.votes(),
                accepted: answer.accepted(),
            }
        }
    }

    impl From<User> for UserResponse {
        fn from(user: User) -> Self {
            Self {
                id: user.ident(),
                created_at: user.created(),
                updated_at: user.updated(),
                version: user.version(),
                username: user.username().clone(),
                email: user.email().clone(),
            }
        }
    }

    impl From<ActivityLog> for ActivityLogResponse {
        fn from(entry: ActivityLog) -> Self {
            Self {
                id: entry.id,
                user_id: entry.user_id,
                activity_type: entry.activity_type,
                description: entry.description,
                resource_id: entry.resource_id,
                ip_address: entry.ip_address,
                metadata: entry.metadata,
                timestamp: entry.timestamp,
            }
        }
    }

    impl From<Notification> for NotificationResponse {
        fn from(notification: Notification) -> Self {
            Self {
                id: notification.id,
                recipient_id: notification.recipient_id,
                kind: notification.kind,
                title: notification.title,
                message: notification.message,
                question_id: notification.question_id,
                answer_id: notification.answer_id,
                read: notification.read,
                created_at: notification.created,
            }
        }
    }
}
