use async_trait::async_trait;
use derive_more::Display;

use super::event::ForumEvent;
use crate::error::service::PublishError;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum PasswordHashError {
    #[display(fmt = "password hash could not be computed")]
    Hash,
    #[display(fmt = "malformed password hash")]
    Malformed,
    #[display(fmt = "invalid password")]
    InvalidPassword,
}

impl std::error::Error for PasswordHashError {}

pub trait PasswordHashService: Send + Sync {
    /// Hash a password into a PHC string.
    fn hash_password(&self, pwd: &str) -> Result<String, PasswordHashError>;
    fn verify_password(&self, pwd: &str, hash: &str) -> Result<(), PasswordHashError>;
}

/// Outbound port of the event broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &ForumEvent) -> Result<(), PublishError>;
}

/// Inbound port of the event broker, called once per consumed record.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, topic: &str, payload: &[u8]);
}
