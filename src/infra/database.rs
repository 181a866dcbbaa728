pub mod connection {
    use std::time::Duration;

    use sqlx::PgPool;

    use crate::{config::env_var::DatabaseVar, error::persistence::PersistenceError};

    pub async fn create_sqlx_pool(database: &DatabaseVar) -> Result<PgPool, PersistenceError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .acquire_timeout(Duration::from_millis(1000))
            .idle_timeout(Duration::from_millis(1000 * 30))
            .max_lifetime(Duration::from_millis(1000 * 10))
            .connect(&database.url)
            .await?;

        Ok(pool)
    }

    /// Apply the schema, every statement is idempotent.
    pub async fn migrate(pool: &PgPool) -> Result<(), PersistenceError> {
        let mut trx = pool.begin().await?;
        for sttm in include_str!("../../dbschema.sql")
            .split(';')
            .map(str::trim)
            .filter(|sttm| !sttm.is_empty())
        {
            sqlx::query(sttm).execute(&mut trx).await?;
        }
        trx.commit().await?;

        tracing::info!("database schema applied");
        Ok(())
    }
}

mod transform {
    use std::collections::BTreeMap;

    use sqlx::{postgres::PgRow, types::Json, Row};

    use crate::{
        domain::entity::{
            activity::{ActivityLog, ActivityType},
            forum::{Answer, AnswerState, Question, QuestionState},
            iam::{User, UserState},
            notification::{Notification, NotificationKind},
            EntityData,
        },
        error::persistence::PersistenceError,
    };

    fn entity_data(row: &PgRow) -> Result<EntityData, PersistenceError> {
        let version: i64 = row.try_get("version")?;
        Ok(EntityData::restore(
            row.try_get("id")?,
            row.try_get("created")?,
            row.try_get("updated")?,
            u32::try_from(version).map_err(|_| PersistenceError::DecodeData)?,
        ))
    }

    pub fn question(row: &PgRow) -> Result<Question, PersistenceError> {
        let state = QuestionState::new(
            row.try_get("title")?,
            row.try_get("body")?,
            row.try_get("tags")?,
            row.try_get("author_id")?,
            row.try_get("votes")?,
        );
        Ok(Question::restore(entity_data(row)?, state))
    }

    pub fn answer(row: &PgRow) -> Result<Answer, PersistenceError> {
        let state = AnswerState::new(
            row.try_get("question_id")?,
            row.try_get("body")?,
            row.try_get("author_id")?,
            row.try_get("votes")?,
            row.try_get("accepted")?,
        );
        Ok(Answer::restore(entity_data(row)?, state))
    }

    pub fn user(row: &PgRow) -> Result<User, PersistenceError> {
        let state = UserState::new(
            row.try_get("username")?,
            row.try_get("email")?,
            row.try_get("password_hash")?,
        );
        Ok(User::restore(entity_data(row)?, state))
    }

    pub fn activity(row: &PgRow) -> Result<ActivityLog, PersistenceError> {
        let activity_type: String = row.try_get("activity_type")?;
        let activity_type: ActivityType = activity_type
            .parse()
            .map_err(|_| PersistenceError::DecodeData)?;
        let metadata: Json<BTreeMap<String, String>> = row.try_get("metadata")?;

        Ok(ActivityLog {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            activity_type,
            description: row.try_get("description")?,
            resource_id: row.try_get("resource_id")?,
            ip_address: row.try_get("ip_address")?,
            metadata: metadata.0,
            timestamp: row.try_get("occurred")?,
        })
    }

    pub fn notification(row: &PgRow) -> Result<Notification, PersistenceError> {
        let kind: String = row.try_get("kind")?;
        let kind: NotificationKind = kind.parse().map_err(|_| PersistenceError::DecodeData)?;

        Ok(Notification {
            id: row.try_get("id")?,
            recipient_id: row.try_get("recipient_id")?,
            kind,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            question_id: row.try_get("question_id")?,
            answer_id: row.try_get("answer_id")?,
            read: row.try_get("is_read")?,
            created: row.try_get("created")?,
        })
    }
}

pub mod repository {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use futures::TryStreamExt;
    use sqlx::{postgres::PgRow, types::Json, PgPool};
    use uuid::Uuid;

    use super::transform;
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
                ActivityLogRepository, AnswerRepository, NotificationRepository,
                QuestionRepository, UserRepository,
            },
        },
        error::persistence::PersistenceError,
    };

    const QUESTION_COLUMNS: &str =
        "q.id, q.created, q.updated, q.version, q.title, q.body, q.tags, q.author_id, q.votes";

    const ANSWER_COLUMNS: &str =
        "id, created, updated, version, question_id, body, author_id, votes, accepted";

    const USER_COLUMNS: &str = "id, created, updated, version, username, email, password_hash";

    const ACTIVITY_COLUMNS: &str =
        "id, user_id, activity_type, description, resource_id, ip_address, metadata, occurred";

    const NOTIFICATION_COLUMNS: &str =
        "id, recipient_id, kind, title, message, question_id, answer_id, is_read, created";

    /// Relative weight of the D, C, B and A labels, body is C, tags B and title A.
    const SEARCH_WEIGHTS: &str = "'{0.0, 0.33, 0.67, 1.0}'";

    fn collect<T>(
        rows: Vec<PgRow>,
        transform: fn(&PgRow) -> Result<T, PersistenceError>,
    ) -> Result<Vec<T>, PersistenceError> {
        rows.iter().map(transform).collect()
    }

    fn updated(rows_affected: u64) -> Result<(), PersistenceError> {
        if rows_affected == 0 {
            return Err(PersistenceError::NotFound);
        }
        Ok(())
    }

    /// Store backed by a Postgres database.
    #[derive(Debug, Clone)]
    pub struct PgStore {
        pool: PgPool,
    }

    impl PgStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        pub fn pool(&self) -> &PgPool {
            &self.pool
        }

        async fn find_questions_where(
            &self,
            condition: &str,
            param: &str,
        ) -> Result<Vec<Question>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {QUESTION_COLUMNS} FROM forum.question q WHERE {condition} ORDER BY q.created"
            ))
            .bind(param)
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::question)
        }
    }

    #[async_trait]
    impl QuestionRepository for PgStore {
        async fn insert_question(&self, question: &Question) -> Result<(), PersistenceError> {
            sqlx::query(concat!(
                "INSERT INTO forum.question ",
                "(id, created, updated, version, title, body, tags, author_id, votes) ",
                "VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            ))
            .bind(question.ident())
            .bind(question.created())
            .bind(question.updated())
            .bind(question.version() as i64)
            .bind(question.title())
            .bind(question.body())
            .bind(question.tags())
            .bind(question.author_id())
            .bind(question.votes())
            .execute(&self.pool)
            .await?;

            Ok(())
        }

        async fn update_question(&self, question: &Question) -> Result<(), PersistenceError> {
            let result = sqlx::query(concat!(
                "UPDATE forum.question SET updated = $2, version = $3, title = $4, ",
                "body = $5, tags = $6, votes = $7 WHERE id = $1",
            ))
            .bind(question.ident())
            .bind(question.updated())
            .bind(question.version() as i64)
            .bind(question.title())
            .bind(question.body())
            .bind(question.tags())
            .bind(question.votes())
            .execute(&self.pool)
            .await?;

            updated(result.rows_affected())
        }

        async fn find_question(&self, id: Uuid) -> Result<Option<Question>, PersistenceError> {
            let row = sqlx::query(&format!(
                "SELECT {QUESTION_COLUMNS} FROM forum.question q WHERE q.id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            row.as_ref().map(transform::question).transpose()
        }

        async fn find_questions(&self) -> Result<Vec<Question>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {QUESTION_COLUMNS} FROM forum.question q ORDER BY q.created"
            ))
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::question)
        }

        async fn find_questions_by_author(
            &self,
            author_id: &str,
        ) -> Result<Vec<Question>, PersistenceError> {
            self.find_questions_where("q.author_id = $1", author_id)
                .await
        }

        async fn find_questions_by_tag(
            &self,
            tag: &str,
        ) -> Result<Vec<Question>, PersistenceError> {
            self.find_questions_where("$1 = ANY(q.tags)", tag).await
        }

        async fn delete_question(&self, id: Uuid) -> Result<bool, PersistenceError> {
            // answers follow through ON DELETE CASCADE
            let result = sqlx::query("DELETE FROM forum.question WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        }

        async fn search_questions(&self, phrase: &str) -> Result<Vec<Question>, PersistenceError> {
            let rows = sqlx::query(&format!(
                concat!(
                    "SELECT {columns}, ts_rank({weights}, doc.vector, search.query) AS rank ",
                    "FROM forum.question q ",
                    "CROSS JOIN phraseto_tsquery('english', $1) AS search(query) ",
                    "CROSS JOIN LATERAL (SELECT ",
                    "setweight(to_tsvector('english', q.title), 'A') || ",
                    "setweight(to_tsvector('english', array_to_string(q.tags, ' ')), 'B') || ",
                    "setweight(to_tsvector('english', q.body), 'C') AS vector) AS doc ",
                    "WHERE doc.vector @@ search.query ",
                    "ORDER BY rank DESC, q.created",
                ),
                columns = QUESTION_COLUMNS,
                weights = SEARCH_WEIGHTS,
            ))
            .bind(phrase)
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::question)
        }
    }

    #[async_trait]
    impl AnswerRepository for PgStore {
        async fn insert_answer(&self, answer: &Answer) -> Result<(), PersistenceError> {
            sqlx::query(concat!(
                "INSERT INTO forum.answer ",
                "(id, created, updated, version, question_id, body, author_id, votes, accepted) ",
                "VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            ))
            .bind(answer.ident())
            .bind(answer.created())
            .bind(answer.updated())
            .bind(answer.version() as i64)
            .bind(answer.question_id())
            .bind(answer.body())
            .bind(answer.author_id())
            .bind(answer.votes())
            .bind(answer.accepted())
            .execute(&self.pool)
            .await?;

            Ok(())
        }

        async fn update_answer(&self, answer: &Answer) -> Result<(), PersistenceError> {
            let result = sqlx::query(concat!(
                "UPDATE forum.answer SET updated = $2, version = $3, body = $4, ",
                "votes = $5, accepted = $6 WHERE id = $1",
            ))
            .bind(answer.ident())
            .bind(answer.updated())
            .bind(answer.version() as i64)
            .bind(answer.body())
            .bind(answer.votes())
            .bind(answer.accepted())
            .execute(&self.pool)
            .await?;

            updated(result.rows_affected())
        }

        async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>, PersistenceError> {
            let row = sqlx::query(&format!(
                "SELECT {ANSWER_COLUMNS} FROM forum.answer WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            row.as_ref().map(transform::answer).transpose()
        }

        async fn find_answers_by_question(
            &self,
            question_id: Uuid,
        ) -> Result<Vec<Answer>, PersistenceError> {
            let sql = format!(
                "SELECT {ANSWER_COLUMNS} FROM forum.answer WHERE question_id = $1 ORDER BY created"
            );
            let mut rows = sqlx::query(&sql).bind(question_id).fetch(&self.pool);

            let mut answers = Vec::new();
            while let Some(row) = rows.try_next().await? {
                answers.push(transform::answer(&row)?);
            }
            Ok(answers)
        }
    }

    #[async_trait]
    impl UserRepository for PgStore {
        async fn insert_user(&self, user: &User) -> Result<(), PersistenceError> {
            sqlx::query(concat!(
                "INSERT INTO iam.user_account ",
                "(id, created, updated, version, username, email, password_hash) ",
                "VALUES ($1, $2, $3, $4, $5, $6, $7)",
            ))
            .bind(user.ident())
            .bind(user.created())
            .bind(user.updated())
            .bind(user.version() as i64)
            .bind(user.username())
            .bind(user.email())
            .bind(user.password_hash())
            .execute(&self.pool)
            .await?;

            Ok(())
        }

        async fn find_user_by_username(
            &self,
            username: &str,
        ) -> Result<Option<User>, PersistenceError> {
            let row = sqlx::query(&format!(
                "SELECT {USER_COLUMNS} FROM iam.user_account WHERE username = $1"
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

            row.as_ref().map(transform::user).transpose()
        }

        async fn find_users(&self) -> Result<Vec<User>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {USER_COLUMNS} FROM iam.user_account ORDER BY created"
            ))
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::user)
        }
    }

    #[async_trait]
    impl ActivityLogRepository for PgStore {
        async fn insert_activity(&self, entry: &ActivityLog) -> Result<(), PersistenceError> {
            sqlx::query(&format!(
                "INSERT INTO forum.activity_log ({ACTIVITY_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            ))
            .bind(entry.id)
            .bind(&entry.user_id)
            .bind(entry.activity_type.as_str())
            .bind(&entry.description)
            .bind(&entry.resource_id)
            .bind(&entry.ip_address)
            .bind(Json(&entry.metadata))
            .bind(entry.timestamp)
            .execute(&self.pool)
            .await?;

            Ok(())
        }

        async fn find_activity_by_user(
            &self,
            user_id: &str,
        ) -> Result<Vec<ActivityLog>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM forum.activity_log \
                 WHERE user_id = $1 ORDER BY occurred DESC"
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::activity)
        }

        async fn find_activity_by_user_and_type(
            &self,
            user_id: &str,
            activity_type: ActivityType,
        ) -> Result<Vec<ActivityLog>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM forum.activity_log \
                 WHERE user_id = $1 AND activity_type = $2 ORDER BY occurred DESC"
            ))
            .bind(user_id)
            .bind(activity_type.as_str())
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::activity)
        }

        async fn find_activity_by_user_between(
            &self,
            user_id: &str,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> Result<Vec<ActivityLog>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM forum.activity_log \
                 WHERE user_id = $1 AND occurred BETWEEN $2 AND $3 ORDER BY occurred DESC"
            ))
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::activity)
        }

        async fn find_activity_by_type(
            &self,
            activity_type: ActivityType,
        ) -> Result<Vec<ActivityLog>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM forum.activity_log \
                 WHERE activity_type = $1 ORDER BY occurred DESC"
            ))
            .bind(activity_type.as_str())
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::activity)
        }
    }

    #[async_trait]
    impl NotificationRepository for PgStore {
        async fn insert_notification_within_limit(
            &self,
            notification: &Notification,
            since: DateTime<Utc>,
            limit: u32,
        ) -> Result<bool, PersistenceError> {
            let mut trx = self.pool.begin().await?;

            // serializes count and insert per question until the commit
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(notification.question_id.to_string())
                .execute(&mut trx)
                .await?;

            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM forum.notification WHERE question_id = $1 AND created >= $2",
            )
            .bind(notification.question_id)
            .bind(since)
            .fetch_one(&mut trx)
            .await?;

            if count >= i64::from(limit) {
                trx.rollback().await?;
                return Ok(false);
            }

            sqlx::query(&format!(
                "INSERT INTO forum.notification ({NOTIFICATION_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ))
            .bind(notification.id)
            .bind(&notification.recipient_id)
            .bind(notification.kind.as_str())
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.question_id)
            .bind(notification.answer_id)
            .bind(notification.read)
            .bind(notification.created)
            .execute(&mut trx)
            .await?;

            trx.commit().await?;
            Ok(true)
        }

        async fn update_notification(
            &self,
            notification: &Notification,
        ) -> Result<(), PersistenceError> {
            let result = sqlx::query("UPDATE forum.notification SET is_read = $2 WHERE id = $1")
                .bind(notification.id)
                .bind(notification.read)
                .execute(&self.pool)
                .await?;

            updated(result.rows_affected())
        }

        async fn find_notification(
            &self,
            id: Uuid,
        ) -> Result<Option<Notification>, PersistenceError> {
            let row = sqlx::query(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM forum.notification WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            row.as_ref().map(transform::notification).transpose()
        }

        async fn find_notifications_by_recipient(
            &self,
            recipient_id: &str,
            unread_only: bool,
        ) -> Result<Vec<Notification>, PersistenceError> {
            let rows = sqlx::query(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM forum.notification \
                 WHERE recipient_id = $1 AND ($2 = FALSE OR is_read = FALSE) \
                 ORDER BY created DESC"
            ))
            .bind(recipient_id)
            .bind(unread_only)
            .fetch_all(&self.pool)
            .await?;

            collect(rows, transform::notification)
        }
    }
}
