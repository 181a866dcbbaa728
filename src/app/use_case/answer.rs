use uuid::Uuid;

use super::{publish, require_text};
use crate::{
    app::{
        resource::forum::{AnswerResponse, CreateAnswer, QuestionResponse, VoteAnswer},
        workload::Lane,
        Context,
    },
    base::ResourceID,
    domain::{
        entity::{
            activity::{ActivityLog, ActivityType},
            forum::Answer,
            Entity,
        },
        event::{EventType, ForumEvent},
    },
    error::{
        app::ApplicationError,
        persistence::PersistenceError,
        resource::{NotFoundError, ValidationError},
    },
};

mod validation {
    use super::*;

    pub fn create_answer(dto: &CreateAnswer) -> Result<(), ApplicationError<CreateAnswer>> {
        let mut errors = Vec::new();
        require_text(&mut errors, "forum::body", "/body", &dto.body);
        require_text(&mut errors, "base::user_id", "/authorId", &dto.author_id);

        if !errors.is_empty() {
            return Err(ValidationError::from_resource(dto.clone(), errors).into());
        }
        Ok(())
    }
}

fn not_found(id: Uuid) -> NotFoundError {
    NotFoundError::new(AnswerResponse::resource_id(), id)
}

async fn load_answer<R>(ctx: &Context, lane: Lane, id: Uuid) -> Result<Answer, ApplicationError<R>> {
    ctx.workload
        .run(lane, ctx.answers.find_answer(id))
        .await?
        .ok_or_else(|| not_found(id).into())
}

async fn store_answer<R>(ctx: &Context, lane: Lane, answer: &Answer) -> Result<(), ApplicationError<R>> {
    match ctx.workload.run(lane, ctx.answers.update_answer(answer)).await {
        Err(PersistenceError::NotFound) => Err(not_found(answer.ident()).into()),
        result => Ok(result?),
    }
}

/// Title of the question an answer belongs to, empty once the question is gone.
async fn question_title<R>(ctx: &Context, question_id: Uuid) -> Result<String, ApplicationError<R>> {
    let question = ctx
        .workload
        .run(Lane::QuestionFetch, ctx.questions.find_question(question_id))
        .await?;
    Ok(question.map(|q| q.title().clone()).unwrap_or_default())
}

pub async fn create_answer(
    ctx: &Context,
    question_id: Uuid,
    dto: CreateAnswer,
) -> Result<AnswerResponse, ApplicationError<CreateAnswer>> {
    validation::create_answer(&dto)?;

    let question = ctx
        .workload
        .run(Lane::QuestionFetch, ctx.questions.find_question(question_id))
        .await?
        .ok_or_else(|| NotFoundError::new(QuestionResponse::resource_id(), question_id))?;

    let answer = Answer::new(question_id, dto.body, dto.author_id);
    ctx.workload
        .run(Lane::AnswerFetch, ctx.answers.insert_answer(&answer))
        .await?;

    tracing::info!(
        answer_id = %answer.ident(),
        question_id = %question_id,
        author_id = %answer.author_id(),
        "answer created"
    );

    let mut event = ForumEvent::new(EventType::AnswerCreated);
    event.question_id = Some(question_id);
    event.answer_id = Some(answer.ident());
    event.author_id = Some(answer.author_id().clone());
    event.question_author_id = Some(question.author_id().clone());
    event.title = Some(question.title().clone());
    publish(ctx, event).await;

    ctx.activity.record(
        ActivityLog::new(
            Some(answer.author_id().clone()),
            ActivityType::AnswerCreated,
            format!("Answered question: {}", question.title()),
        )
        .with_resource(answer.ident())
        .with_metadata([("questionId", question_id.to_string())]),
    );

    Ok(answer.into())
}

pub async fn list_answers(
    ctx: &Context,
    question_id: Uuid,
) -> Result<Vec<AnswerResponse>, ApplicationError<Uuid>> {
    let answers = ctx
        .workload
        .run(Lane::AnswerFetch, ctx.answers.find_answers_by_question(question_id))
        .await?;

    Ok(answers.into_iter().map(AnswerResponse::from).collect())
}

pub async fn vote_answer(
    ctx: &Context,
    id: Uuid,
    dto: VoteAnswer,
) -> Result<AnswerResponse, ApplicationError<VoteAnswer>> {
    let mut answer = load_answer(ctx, Lane::Vote, id).await?;
    let votes = answer.vote(dto.delta);
    store_answer(ctx, Lane::Vote, &answer).await?;

    tracing::info!(answer_id = %id, delta = dto.delta, votes, "answer voted");

    let title = question_title(ctx, answer.question_id()).await?;

    let mut event = ForumEvent::new(EventType::AnswerVoted);
    event.question_id = Some(answer.question_id());
    event.answer_id = Some(id);
    event.author_id = Some(answer.author_id().clone());
    event.title = Some(title);
    publish(ctx, event).await;

    let direction = if dto.delta > 0 { "up" } else { "down" };
    ctx.activity.record(
        ActivityLog::new(
            Some(answer.author_id().clone()),
            ActivityType::AnswerVoted,
            format!("Vote {direction} on answer"),
        )
        .with_resource(id)
        .with_metadata([
            ("delta", dto.delta.to_string()),
            ("newVoteCount", votes.to_string()),
        ]),
    );

    Ok(answer.into())
}

pub async fn accept_answer(ctx: &Context, id: Uuid) -> Result<AnswerResponse, ApplicationError<Uuid>> {
    let mut answer = load_answer(ctx, Lane::AnswerFetch, id).await?;
    answer.accept();
    store_answer(ctx, Lane::AnswerFetch, &answer).await?;

    tracing::info!(answer_id = %id, question_id = %answer.question_id(), "answer accepted");

    let title = question_title(ctx, answer.question_id()).await?;

    let mut event = ForumEvent::new(EventType::AnswerAccepted);
    event.question_id = Some(answer.question_id());
    event.answer_id = Some(id);
    event.author_id = Some(answer.author_id().clone());
    event.title = Some(title.clone());
    publish(ctx, event).await;

    ctx.activity.record(
        ActivityLog::new(
            Some(answer.author_id().clone()),
            ActivityType::AnswerAccepted,
            format!("Answer accepted on: {title}"),
        )
        .with_resource(id)
        .with_metadata([("questionId", answer.question_id().to_string())]),
    );

    Ok(answer.into())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        app::{
            resource::forum::CreateQuestion,
            use_case::{
                question::create_question,
                test_support::{context, settle},
            },
        },
        domain::repository::ActivityLogRepository,
    };

    async fn question(ctx: &Context) -> QuestionResponse {
        create_question(
            ctx,
            CreateQuestion {
                title: "Pinning futures".into(),
                body: "When is Pin needed?".into(),
                tags: vec!["async".into()],
                author_id: "alice".into(),
            },
        )
        .await
        .unwrap()
    }

    fn answer_dto(author: &str) -> CreateAnswer {
        CreateAnswer {
            body: "When the future is self referential".into(),
            author_id: author.into(),
        }
    }

    #[tokio::test]
    async fn create_answer_carries_question_context() {
        let (ctx, store, publisher) = context();
        let question = question(&ctx).await;

        let answer = create_answer(&ctx, question.id, answer_dto("bob")).await.unwrap();
        settle().await;

        assert_eq!(answer.question_id, question.id);
        assert!(!answer.accepted);

        let events = publisher.events.lock().await;
        let event = events.last().unwrap();
        assert_eq!(event.event_type, EventType::AnswerCreated);
        assert_eq!(event.answer_id, Some(answer.id));
        assert_eq!(event.author_id.as_deref(), Some("bob"));
        assert_eq!(event.question_author_id.as_deref(), Some("alice"));
        assert_eq!(event.title.as_deref(), Some("Pinning futures"));

        let activity = store.find_activity_by_user("bob").await.unwrap();
        assert_eq!(activity[0].description, "Answered question: Pinning futures");
        assert_eq!(
            activity[0].metadata.get("questionId"),
            Some(&question.id.to_string())
        );
    }

    #[tokio::test]
    async fn answer_unknown_question() {
        let (ctx, _, publisher) = context();

        let err = create_answer(&ctx, Uuid::new_v4(), answer_dto("bob"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::NotFound(_)));
        assert!(publisher.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn vote_up_and_down() {
        let (ctx, store, publisher) = context();
        let question = question(&ctx).await;
        let answer = create_answer(&ctx, question.id, answer_dto("bob")).await.unwrap();

        vote_answer(&ctx, answer.id, VoteAnswer::default()).await.unwrap();
        let voted = vote_answer(&ctx, answer.id, VoteAnswer { delta: -3 }).await.unwrap();
        settle().await;

        assert_eq!(voted.votes, -2);
        assert_eq!(voted.version, 3);

        let events = publisher.events.lock().await;
        let event = events.last().unwrap();
        assert_eq!(event.event_type, EventType::AnswerVoted);
        assert_eq!(event.title.as_deref(), Some("Pinning futures"));

        let votes = store
            .find_activity_by_user_and_type("bob", ActivityType::AnswerVoted)
            .await
            .unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].description, "Vote down on answer");
        assert_eq!(votes[0].metadata.get("delta").map(String::as_str), Some("-3"));
        assert_eq!(
            votes[0].metadata.get("newVoteCount").map(String::as_str),
            Some("-2")
        );
        assert_eq!(votes[1].description, "Vote up on answer");

        let listed = list_answers(&ctx, question.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].votes, -2);
    }

    #[tokio::test]
    async fn accept_answer_marks_it() {
        let (ctx, _, publisher) = context();
        let question = question(&ctx).await;
        let answer = create_answer(&ctx, question.id, answer_dto("bob")).await.unwrap();

        let accepted = accept_answer(&ctx, answer.id).await.unwrap();

        assert!(accepted.accepted);
        let events = publisher.events.lock().await;
        assert_eq!(events.last().unwrap().event_type, EventType::AnswerAccepted);
        assert!(matches!(
            accept_answer(&ctx, Uuid::new_v4()).await,
            Err(ApplicationError::NotFound(_))
        ));
    }
}
