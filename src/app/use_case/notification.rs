use chrono::Utc;
use uuid::Uuid;

use crate::{
    app::{resource::notification::NotificationResponse, Context},
    domain::{
        entity::notification::{
            Notification, NotificationKind, MAX_NOTIFICATIONS_PER_QUESTION_PER_DAY,
        },
        event::{EventType, ForumEvent},
        repository::NotificationRepository,
        start_of_day,
    },
    error::{app::ApplicationError, persistence::PersistenceError, resource::NotFoundError},
};

/// Turn a consumed answer event into a notification, when it calls for one.
pub async fn handle_event(
    repository: &dyn NotificationRepository,
    event: &ForumEvent,
) -> Result<(), PersistenceError> {
    match event.event_type {
        EventType::AnswerCreated => handle_answer_created(repository, event).await,
        EventType::AnswerAccepted => handle_answer_accepted(repository, event).await,
        EventType::AnswerVoted => handle_answer_voted(repository, event).await,
        EventType::QuestionCreated => {
            tracing::warn!(event_type = %event.event_type, "unhandled answer event type");
            Ok(())
        }
    }
}

fn title(event: &ForumEvent) -> &str {
    event.title.as_deref().unwrap_or_default()
}

async fn handle_answer_created(
    repository: &dyn NotificationRepository,
    event: &ForumEvent,
) -> Result<(), PersistenceError> {
    let Some(recipient) = event.question_author_id.clone() else {
        tracing::warn!(answer_id = ?event.answer_id, "answer event without question author");
        return Ok(());
    };
    if event.author_id.as_deref() == Some(recipient.as_str()) {
        tracing::info!(user_id = %recipient, "skipping self answer notification");
        return Ok(());
    }

    notify(
        repository,
        event,
        recipient,
        NotificationKind::AnswerReceived,
        "New answer on your question".into(),
        format!("Someone answered your question: {}", title(event)),
    )
    .await
}

async fn handle_answer_accepted(
    repository: &dyn NotificationRepository,
    event: &ForumEvent,
) -> Result<(), PersistenceError> {
    let Some(recipient) = event.author_id.clone() else {
        tracing::warn!(answer_id = ?event.answer_id, "accepted event without answer author");
        return Ok(());
    };

    notify(
        repository,
        event,
        recipient,
        NotificationKind::AnswerAccepted,
        "Your answer was accepted!".into(),
        format!("Your answer on \"{}\" was marked as accepted.", title(event)),
    )
    .await
}

async fn handle_answer_voted(
    repository: &dyn NotificationRepository,
    event: &ForumEvent,
) -> Result<(), PersistenceError> {
    let Some(recipient) = event.author_id.clone() else {
        tracing::warn!(answer_id = ?event.answer_id, "vote event without answer author");
        return Ok(());
    };

    notify(
        repository,
        event,
        recipient,
        NotificationKind::AnswerVoted,
        "Your answer received a vote".into(),
        format!("Someone voted on your answer in \"{}\".", title(event)),
    )
    .await
}

async fn notify(
    repository: &dyn NotificationRepository,
    event: &ForumEvent,
    recipient: String,
    kind: NotificationKind,
    title: String,
    message: String,
) -> Result<(), PersistenceError> {
    let Some(question_id) = event.question_id else {
        tracing::warn!(kind = %kind, "event without question, notification dropped");
        return Ok(());
    };

    let notification = Notification::new(
        recipient,
        kind,
        title,
        message,
        question_id,
        event.answer_id,
    );
    save_with_rate_limit(repository, &notification).await?;
    Ok(())
}

/// Store a notification unless its question already produced the daily
/// maximum. Returns whether it was stored.
pub async fn save_with_rate_limit(
    repository: &dyn NotificationRepository,
    notification: &Notification,
) -> Result<bool, PersistenceError> {
    let since = start_of_day(Utc::now());
    let stored = repository
        .insert_notification_within_limit(
            notification,
            since,
            MAX_NOTIFICATIONS_PER_QUESTION_PER_DAY,
        )
        .await?;

    if stored {
        tracing::info!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            kind = %notification.kind,
            question_id = %notification.question_id,
            "notification created"
        );
    } else {
        tracing::info!(
            question_id = %notification.question_id,
            limit = MAX_NOTIFICATIONS_PER_QUESTION_PER_DAY,
            "rate limit reached, notification skipped"
        );
    }

    Ok(stored)
}

pub async fn notifications(
    ctx: &Context,
    recipient_id: &str,
) -> Result<Vec<NotificationResponse>, ApplicationError<String>> {
    let found = ctx
        .notifications
        .find_notifications_by_recipient(recipient_id, false)
        .await?;
    Ok(found.into_iter().map(NotificationResponse::from).collect())
}

pub async fn unread_notifications(
    ctx: &Context,
    recipient_id: &str,
) -> Result<Vec<NotificationResponse>, ApplicationError<String>> {
    let found = ctx
        .notifications
        .find_notifications_by_recipient(recipient_id, true)
        .await?;
    Ok(found.into_iter().map(NotificationResponse::from).collect())
}

pub async fn mark_read(
    ctx: &Context,
    id: Uuid,
) -> Result<NotificationResponse, ApplicationError<Uuid>> {
    let not_found = || NotFoundError::new("notification::Notification", id);

    let mut notification = ctx
        .notifications
        .find_notification(id)
        .await?
        .ok_or_else(not_found)?;
    notification.mark_read();

    match ctx.notifications.update_notification(&notification).await {
        Err(PersistenceError::NotFound) => return Err(not_found().into()),
        result => result?,
    }

    Ok(notification.into())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{app::use_case::test_support::context, infra::memory::MemoryStore};

    fn answer_event(event_type: EventType, question_id: Uuid) -> ForumEvent {
        let mut event = ForumEvent::new(event_type);
        event.question_id = Some(question_id);
        event.answer_id = Some(Uuid::new_v4());
        event.author_id = Some("bob".into());
        event.question_author_id = Some("alice".into());
        event.title = Some("Send and Sync".into());
        event
    }

    #[tokio::test]
    async fn answer_created_notifies_question_author() {
        let store = MemoryStore::new();
        let event = answer_event(EventType::AnswerCreated, Uuid::new_v4());

        handle_event(&store, &event).await.unwrap();

        let found = store.find_notifications_by_recipient("alice", false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, NotificationKind::AnswerReceived);
        assert_eq!(found[0].title, "New answer on your question");
        assert_eq!(found[0].message, "Someone answered your question: Send and Sync");
        assert_eq!(found[0].answer_id, event.answer_id);
        assert!(!found[0].read);
    }

    #[tokio::test]
    async fn self_answer_is_not_notified() {
        let store = MemoryStore::new();
        let mut event = answer_event(EventType::AnswerCreated, Uuid::new_v4());
        event.author_id = Some("alice".into());

        handle_event(&store, &event).await.unwrap();

        assert!(store
            .find_notifications_by_recipient("alice", false)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn accepted_and_voted_go_to_answer_author() {
        let store = MemoryStore::new();
        let question_id = Uuid::new_v4();

        handle_event(&store, &answer_event(EventType::AnswerAccepted, question_id))
            .await
            .unwrap();
        handle_event(&store, &answer_event(EventType::AnswerVoted, question_id))
            .await
            .unwrap();
        handle_event(&store, &answer_event(EventType::QuestionCreated, question_id))
            .await
            .unwrap();

        let found = store.find_notifications_by_recipient("bob", false).await.unwrap();
        let messages: Vec<_> = found.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Someone voted on your answer in \"Send and Sync\".",
                "Your answer on \"Send and Sync\" was marked as accepted.",
            ]
        );
    }

    #[tokio::test]
    async fn daily_limit_per_question() {
        let store = MemoryStore::new();
        let busy = Uuid::new_v4();
        let quiet = Uuid::new_v4();

        for _ in 0..5 {
            handle_event(&store, &answer_event(EventType::AnswerVoted, busy))
                .await
                .unwrap();
        }
        handle_event(&store, &answer_event(EventType::AnswerVoted, quiet))
            .await
            .unwrap();

        let found = store.find_notifications_by_recipient("bob", false).await.unwrap();
        assert_eq!(found.iter().filter(|n| n.question_id == busy).count(), 3);
        assert_eq!(found.iter().filter(|n| n.question_id == quiet).count(), 1);
    }

    #[tokio::test]
    async fn mark_notification_read() {
        let (ctx, store, _) = context();
        let question_id = Uuid::new_v4();
        handle_event(store.as_ref(), &answer_event(EventType::AnswerVoted, question_id))
            .await
            .unwrap();
        handle_event(store.as_ref(), &answer_event(EventType::AnswerAccepted, question_id))
            .await
            .unwrap();

        let all = notifications(&ctx, "bob").await.unwrap();
        assert_eq!(all.len(), 2);

        let read = mark_read(&ctx, all[0].id).await.unwrap();
        assert!(read.read);

        let unread = unread_notifications(&ctx, "bob").await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, all[1].id);

        assert!(matches!(
            mark_read(&ctx, Uuid::new_v4()).await,
            Err(ApplicationError::NotFound(_))
        ));
    }
}
