use std::sync::{
    atomic::{AtomicI64, AtomicU32, Ordering},
    Arc,
};

use tokio::task::JoinSet;

use crate::{
    app::{resource::forum::VoteTallyResponse, workload::Lane, Context},
    domain::entity::Entity,
    error::{app::ApplicationError, persistence::PersistenceError},
};

/// Sum the answer votes of every question, one task per question, at most
/// a batch lane worth of tasks at a time.
pub async fn tally_votes(ctx: &Context) -> Result<VoteTallyResponse, ApplicationError<()>> {
    let questions = ctx
        .workload
        .run(Lane::QuestionFetch, ctx.questions.find_questions())
        .await?;

    let processed = Arc::new(AtomicU32::new(0));
    let total_votes = Arc::new(AtomicI64::new(0));
    let lane = ctx.workload.semaphore(Lane::Batch);

    let mut tasks = JoinSet::new();
    for question in questions {
        let answers = ctx.answers.clone();
        let lane = lane.clone();
        let processed = processed.clone();
        let total_votes = total_votes.clone();

        tasks.spawn(async move {
            let _permit = lane.acquire_owned().await.ok();
            let score: i64 = answers
                .find_answers_by_question(question.ident())
                .await?
                .iter()
                .map(|answer| i64::from(answer.votes()))
                .sum();

            total_votes.fetch_add(score, Ordering::Relaxed);
            processed.fetch_add(1, Ordering::Relaxed);
            Ok::<_, PersistenceError>(())
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined.map_err(PersistenceError::from).and_then(|result| result) {
            tracing::error!("vote tally failed: {err}");
            tasks.abort_all();
            return Err(err.into());
        }
    }

    let response = VoteTallyResponse {
        questions_processed: processed.load(Ordering::Relaxed),
        total_votes: total_votes.load(Ordering::Relaxed),
    };
    tracing::info!(
        processed = response.questions_processed,
        total_votes = response.total_votes,
        "vote tally complete"
    );

    Ok(response)
}
