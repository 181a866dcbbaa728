use crate::{
    app::{resource::forum::QuestionResponse, workload::Lane, Context},
    domain::entity::activity::{ActivityLog, ActivityType},
    error::app::ApplicationError,
};

/// Questions matching `phrase`, best match first. A blank phrase matches
/// nothing.
pub async fn search_questions(
    ctx: &Context,
    phrase: &str,
) -> Result<Vec<QuestionResponse>, ApplicationError<String>> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return Ok(Vec::new());
    }

    let questions = ctx
        .workload
        .run(Lane::Search, ctx.questions.search_questions(phrase))
        .await?;

    tracing::debug!(phrase, matches = questions.len(), "search performed");

    Ok(questions.into_iter().map(QuestionResponse::from).collect())
}

/// Search on behalf of an optional user, leaving a trace in the activity log.
pub async fn tracked_search(
    ctx: &Context,
    phrase: &str,
    user_id: Option<String>,
) -> Result<Vec<QuestionResponse>, ApplicationError<String>> {
    ctx.activity.record(
        ActivityLog::new(
            user_id,
            ActivityType::SearchPerformed,
            format!("Search: {phrase}"),
        )
        .with_metadata([("query", phrase)]),
    );

    search_questions(ctx, phrase).await
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

    async fn ask(ctx: &Context, title: &str, body: &str, tags: &[&str]) {
        create_question(
            ctx,
            CreateQuestion {
                title: title.into(),
                body: body.into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                author_id: "alice".into(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn search_ranks_title_over_body() {
        let (ctx, _, _) = context();
        ask(&ctx, "Error handling", "Should I use thiserror or anyhow?", &[]).await;
        ask(&ctx, "Sqlx transactions", "Commit and rollback", &["database"]).await;
        ask(&ctx, "Thiserror derive", "Deriving Display", &["errors"]).await;

        let found = search_questions(&ctx, "thiserror").await.unwrap();
        let titles: Vec<_> = found.iter().map(|q| q.title.as_str()).collect();

        assert_eq!(titles, vec!["Thiserror derive", "Error handling"]);
        assert!(search_questions(&ctx, "   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tracked_search_records_query() {
        let (ctx, store, _) = context();
        ask(&ctx, "Lifetimes", "Elision rules", &["rust"]).await;

        let found = tracked_search(&ctx, "elision rules", Some("carol".into()))
            .await
            .unwrap();
        tracked_search(&ctx, "anonymous", None).await.unwrap();
        settle().await;

        assert_eq!(found.len(), 1);

        let carol = store.find_activity_by_user("carol").await.unwrap();
        assert_eq!(carol.len(), 1);
        assert_eq!(carol[0].description, "Search: elision rules");
        assert_eq!(
            carol[0].metadata.get("query").map(String::as_str),
            Some("elision rules")
        );

        let searches = store
            .find_activity_by_type(ActivityType::SearchPerformed)
            .await
            .unwrap();
        assert_eq!(searches.len(), 2);
    }
}
