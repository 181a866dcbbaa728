use uuid::Uuid;

use super::{publish, require_text};
use crate::{
    app::{
        resource::forum::{CreateQuestion, QuestionFilter, QuestionResponse, UpdateQuestion},
        workload::Lane,
        Context,
    },
    base::ResourceID,
    domain::{
        entity::{
            activity::{ActivityLog, ActivityType},
            forum::Question,
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

    pub fn create_question(dto: &CreateQuestion) -> Result<(), ApplicationError<CreateQuestion>> {
        let mut errors = Vec::new();
        require_text(&mut errors, "forum::title", "/title", &dto.title);
        require_text(&mut errors, "forum::body", "/body", &dto.body);
        require_text(&mut errors, "base::user_id", "/authorId", &dto.author_id);

        if !errors.is_empty() {
            return Err(ValidationError::from_resource(dto.clone(), errors).into());
        }
        Ok(())
    }

    pub fn update_question(dto: &UpdateQuestion) -> Result<(), ApplicationError<UpdateQuestion>> {
        let mut errors = Vec::new();
        require_text(&mut errors, "forum::title", "/title", &dto.title);
        require_text(&mut errors, "forum::body", "/body", &dto.body);

        if !errors.is_empty() {
            return Err(ValidationError::from_resource(dto.clone(), errors).into());
        }
        Ok(())
    }
}

fn not_found(id: Uuid) -> NotFoundError {
    NotFoundError::new(QuestionResponse::resource_id(), id)
}

async fn load_question<R>(ctx: &Context, id: Uuid) -> Result<Question, ApplicationError<R>> {
    ctx.workload
        .run(Lane::QuestionFetch, ctx.questions.find_question(id))
        .await?
        .ok_or_else(|| not_found(id).into())
}

pub async fn create_question(
    ctx: &Context,
    dto: CreateQuestion,
) -> Result<QuestionResponse, ApplicationError<CreateQuestion>> {
    validation::create_question(&dto)?;

    let question = Question::new(dto.title, dto.body, dto.tags, dto.author_id);
    ctx.workload
        .run(Lane::QuestionFetch, ctx.questions.insert_question(&question))
        .await?;

    tracing::info!(
        question_id = %question.ident(),
        author_id = %question.author_id(),
        "question created"
    );

    let mut event = ForumEvent::new(EventType::QuestionCreated);
    event.question_id = Some(question.ident());
    event.author_id = Some(question.author_id().clone());
    event.title = Some(question.title().clone());
    event.body = Some(question.body().clone());
    publish(ctx, event).await;

    ctx.activity.record(
        ActivityLog::new(
            Some(question.author_id().clone()),
            ActivityType::QuestionCreated,
            format!("Created question: {}", question.title()),
        )
        .with_resource(question.ident())
        .with_metadata([("tags", question.tags().join(","))]),
    );

    Ok(question.into())
}

pub async fn list_questions(
    ctx: &Context,
    filter: QuestionFilter,
) -> Result<Vec<QuestionResponse>, ApplicationError<QuestionFilter>> {
    let questions = ctx
        .workload
        .run(Lane::QuestionFetch, async {
            match (&filter.author, &filter.tag) {
                (Some(author), Some(tag)) => {
                    let mut questions = ctx.questions.find_questions_by_author(author).await?;
                    questions.retain(|question| question.has_tag(tag));
                    Ok::<_, PersistenceError>(questions)
                }
                (Some(author), None) => ctx.questions.find_questions_by_author(author).await,
                (None, Some(tag)) => ctx.questions.find_questions_by_tag(tag).await,
                (None, None) => ctx.questions.find_questions().await,
            }
        })
        .await?;

    Ok(questions.into_iter().map(QuestionResponse::from).collect())
}

pub async fn find_question(
    ctx: &Context,
    id: Uuid,
) -> Result<QuestionResponse, ApplicationError<Uuid>> {
    Ok(load_question(ctx, id).await?.into())
}

pub async fn update_question(
    ctx: &Context,
    id: Uuid,
    dto: UpdateQuestion,
) -> Result<QuestionResponse, ApplicationError<UpdateQuestion>> {
    validation::update_question(&dto)?;

    let mut question = load_question(ctx, id).await?;
    question.revise(dto.title, dto.body, dto.tags);

    match ctx
        .workload
        .run(Lane::QuestionFetch, ctx.questions.update_question(&question))
        .await
    {
        Err(PersistenceError::NotFound) => return Err(not_found(id).into()),
        result => result?,
    }

    tracing::info!(question_id = %id, version = question.version(), "question updated");

    ctx.activity.record(
        ActivityLog::new(
            Some(question.author_id().clone()),
            ActivityType::QuestionUpdated,
            format!("Updated question: {}", question.title()),
        )
        .with_resource(question.ident()),
    );

    Ok(question.into())
}

/// Delete a question together with its answers.
pub async fn delete_question(ctx: &Context, id: Uuid) -> Result<(), ApplicationError<Uuid>> {
    let question = load_question(ctx, id).await?;

    let deleted = ctx
        .workload
        .run(Lane::QuestionFetch, ctx.questions.delete_question(id))
        .await?;
    if !deleted {
        return Err(not_found(id).into());
    }

    tracing::info!(question_id = %id, "question deleted");

    ctx.activity.record(
        ActivityLog::new(
            Some(question.author_id().clone()),
            ActivityType::QuestionDeleted,
            format!("Deleted question: {}", question.title()),
        )
        .with_resource(id),
    );

    Ok(())
}

pub async fn find_answer_ids(ctx: &Context, id: Uuid) -> Result<Vec<Uuid>, ApplicationError<Uuid>> {
    load_question(ctx, id).await?;

    let answers = ctx
        .workload
        .run(Lane::AnswerFetch, ctx.answers.find_answers_by_question(id))
        .await?;

    Ok(answers.iter().map(Entity::ident).collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        app::use_case::test_support::{context, settle},
        domain::{entity::forum::Answer, repository::ActivityLogRepository},
        error::resource::ValidationErrorKind,
    };

    fn create_dto(title: &str, tags: &[&str]) -> CreateQuestion {
        CreateQuestion {
            title: title.into(),
            body: "How should this be done?".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author_id: "alice".into(),
        }
    }

    #[tokio::test]
    async fn create_question_publishes_and_records() {
        let (ctx, store, publisher) = context();

        let question = create_question(&ctx, create_dto("Tokio tasks", &["rust", "tokio"]))
            .await
            .unwrap();
        settle().await;

        assert_eq!(question.title, "Tokio tasks");
        assert_eq!(question.votes, 0);
        assert_eq!(question.version, 1);

        let events = publisher.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::QuestionCreated);
        assert_eq!(events[0].question_id, Some(question.id));
        assert_eq!(events[0].author_id.as_deref(), Some("alice"));

        let activity = store.find_activity_by_user("alice").await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].activity_type, ActivityType::QuestionCreated);
        assert_eq!(activity[0].description, "Created question: Tokio tasks");
        assert_eq!(
            activity[0].metadata.get("tags").map(String::as_str),
            Some("rust,tokio")
        );
        assert_eq!(activity[0].resource_id, Some(question.id.to_string()));
    }

    #[tokio::test]
    async fn reject_blank_question() {
        let (ctx, _, publisher) = context();

        let mut dto = create_dto("  ", &[]);
        dto.author_id = String::new();
        let err = create_question(&ctx, dto).await.unwrap_err();

        match err {
            ApplicationError::Validation(err) => {
                let paths: Vec<_> = err.fields.iter().map(|f| f.path.as_str()).collect();
                assert_eq!(paths, vec!["/title", "/authorId"]);
                assert!(err
                    .fields
                    .iter()
                    .all(|f| f.kinds == vec![ValidationErrorKind::Required]));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(publisher.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn filter_questions() {
        let (ctx, _, _) = context();
        create_question(&ctx, create_dto("First", &["rust"])).await.unwrap();
        create_question(&ctx, create_dto("Second", &["go"])).await.unwrap();
        let mut other = create_dto("Third", &["rust"]);
        other.author_id = "bob".into();
        create_question(&ctx, other).await.unwrap();

        let titles = |questions: Vec<QuestionResponse>| -> Vec<String> {
            questions.into_iter().map(|q| q.title).collect()
        };

        let all = list_questions(&ctx, QuestionFilter::default()).await.unwrap();
        assert_eq!(titles(all), vec!["First", "Second", "Third"]);

        let by_tag = list_questions(
            &ctx,
            QuestionFilter {
                tag: Some("rust".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(titles(by_tag), vec!["First", "Third"]);

        let by_author_and_tag = list_questions(
            &ctx,
            QuestionFilter {
                author: Some("alice".into()),
                tag: Some("rust".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(titles(by_author_and_tag), vec!["First"]);
    }

    #[tokio::test]
    async fn update_and_delete_question() {
        let (ctx, store, _) = context();
        let created = create_question(&ctx, create_dto("Draft", &[])).await.unwrap();

        let updated = update_question(
            &ctx,
            created.id,
            UpdateQuestion {
                title: "Final".into(),
                body: "Revised body".into(),
                tags: vec!["edited".into()],
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.version, 2);
        assert!(updated.updated_at.is_some());

        let answer = Answer::new(created.id, "an answer".into(), "bob".into());
        crate::domain::repository::AnswerRepository::insert_answer(store.as_ref(), &answer)
            .await
            .unwrap();
        assert_eq!(find_answer_ids(&ctx, created.id).await.unwrap(), vec![answer.ident()]);

        delete_question(&ctx, created.id).await.unwrap();
        settle().await;

        assert!(matches!(
            find_question(&ctx, created.id).await,
            Err(ApplicationError::NotFound(_))
        ));
        assert!(matches!(
            delete_question(&ctx, created.id).await,
            Err(ApplicationError::NotFound(_))
        ));
        assert!(
            crate::domain::repository::AnswerRepository::find_answer(store.as_ref(), answer.ident())
                .await
                .unwrap()
                .is_none()
        );

        let kinds: Vec<_> = store
            .find_activity_by_user("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.activity_type)
            .collect();
        assert!(kinds.contains(&ActivityType::QuestionUpdated));
        assert!(kinds.contains(&ActivityType::QuestionDeleted));
    }

    #[tokio::test]
    async fn update_missing_question() {
        let (ctx, _, _) = context();
        let err = update_question(
            &ctx,
            Uuid::new_v4(),
            UpdateQuestion {
                title: "t".into(),
                body: "b".into(),
                tags: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }
}
