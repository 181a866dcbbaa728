//! Wiring of stores, broker and services from the environment.

use std::sync::Arc;

use derive_more::Display;

use crate::{
    app::Context,
    config::env_var::{Broker, EnvVar, Storage},
    domain::{
        repository::{
            ActivityLogRepository, AnswerRepository, NotificationRepository, QuestionRepository,
            UserRepository,
        },
        service::{EventPublisher, RecordHandler},
    },
    error::{persistence::PersistenceError, service::DispatchError},
    infra::{
        broker::{ForumEventConsumer, LocalBroker, LoggingPublisher},
        database::{connection, repository::PgStore},
        memory::MemoryStore,
        service::security::Argon2HashService,
    },
};

#[derive(Debug, Display)]
pub enum StartupError {
    #[display(fmt = "postgres storage selected without database configuration")]
    MissingDatabase,
    #[display(fmt = "storage startup failed: {_0}")]
    Persistence(PersistenceError),
    #[display(fmt = "broker startup failed: {_0}")]
    Broker(DispatchError),
}

impl std::error::Error for StartupError {}

impl From<PersistenceError> for StartupError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<DispatchError> for StartupError {
    fn from(err: DispatchError) -> Self {
        Self::Broker(err)
    }
}

/// Build the application context described by `env`.
pub async fn context(env: &EnvVar) -> Result<Context, StartupError> {
    match env.storage {
        Storage::Memory => {
            tracing::info!("using embedded memory store");
            with_store(Arc::new(MemoryStore::new()), env).await
        }
        Storage::Postgres => {
            let database = env.database.as_ref().ok_or(StartupError::MissingDatabase)?;
            tracing::info!(host = %database.host, name = %database.name, "using postgres store");

            let pool = connection::create_sqlx_pool(database).await?;
            connection::migrate(&pool).await?;
            with_store(Arc::new(PgStore::new(pool)), env).await
        }
    }
}

async fn with_store<S>(store: Arc<S>, env: &EnvVar) -> Result<Context, StartupError>
where
    S: QuestionRepository
        + AnswerRepository
        + UserRepository
        + ActivityLogRepository
        + NotificationRepository
        + 'static,
{
    let consumer: Arc<dyn RecordHandler> = Arc::new(ForumEventConsumer::new(store.clone()));
    let publisher = publisher(env, consumer).await?;

    Ok(Context::new(
        store,
        publisher,
        Arc::new(Argon2HashService::new()),
        &env.pools,
    ))
}

async fn publisher(
    env: &EnvVar,
    consumer: Arc<dyn RecordHandler>,
) -> Result<Arc<dyn EventPublisher>, StartupError> {
    let publisher: Arc<dyn EventPublisher> = match env.broker {
        Broker::Local => Arc::new(LocalBroker::start(consumer)),
        Broker::Disabled => Arc::new(LoggingPublisher::new()),
        Broker::Kafka => kafka_publisher(env, consumer).await?,
    };
    Ok(publisher)
}

#[cfg(feature = "kafka")]
async fn kafka_publisher(
    env: &EnvVar,
    consumer: Arc<dyn RecordHandler>,
) -> Result<Arc<dyn EventPublisher>, StartupError> {
    let broker = crate::infra::broker::kafka::KafkaBroker::connect(
        env.kafka_bootstrap_servers.clone(),
        env.kafka_auto_create_topics,
        consumer,
    )
    .await?;
    Ok(Arc::new(broker))
}

#[cfg(not(feature = "kafka"))]
async fn kafka_publisher(
    _: &EnvVar,
    _: Arc<dyn RecordHandler>,
) -> Result<Arc<dyn EventPublisher>, StartupError> {
    tracing::warn!("built without the kafka feature, falling back to a disabled broker");
    Ok(Arc::new(LoggingPublisher::new()))
}

#[cfg(test)]
mod tests {
    use crate::config::env_var::PoolSizes;

    use super::*;

    fn env(storage: Storage, broker: Broker) -> EnvVar {
        EnvVar {
            port: 0,
            storage,
            database: None,
            broker,
            kafka_bootstrap_servers: vec![],
            kafka_auto_create_topics: false,
            pools: PoolSizes::default(),
        }
    }

    #[tokio::test]
    async fn memory_context_starts() {
        let ctx = context(&env(Storage::Memory, Broker::Local)).await.unwrap();
        assert!(ctx.users.find_user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn postgres_requires_database_variables() {
        let result = context(&env(Storage::Postgres, Broker::Disabled)).await;
        assert!(matches!(result, Err(StartupError::MissingDatabase)));
    }

    #[cfg(not(feature = "kafka"))]
    #[tokio::test]
    async fn kafka_falls_back_without_feature() {
        assert!(context(&env(Storage::Memory, Broker::Kafka)).await.is_ok());
    }
}
