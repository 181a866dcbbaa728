use std::{future::Future, sync::Arc};

use tokio::sync::Semaphore;

use crate::config::env_var::PoolSizes;

/// Class of work sharing a bounded number of concurrent slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    QuestionFetch,
    AnswerFetch,
    Search,
    Vote,
    Batch,
}

#[derive(Debug, Clone)]
pub struct Workload {
    question_fetch: Arc<Semaphore>,
    answer_fetch: Arc<Semaphore>,
    search: Arc<Semaphore>,
    vote: Arc<Semaphore>,
    batch: Arc<Semaphore>,
}

fn lane(size: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(size.max(1)))
}

impl Workload {
    pub fn new(pools: &PoolSizes) -> Self {
        Self {
            question_fetch: lane(pools.question_fetch),
            answer_fetch: lane(pools.answer_fetch),
            search: lane(pools.search_processing),
            vote: lane(pools.vote_calculation),
            batch: lane(pools.batch_processing),
        }
    }

    pub fn semaphore(&self, lane: Lane) -> Arc<Semaphore> {
        match lane {
            Lane::QuestionFetch => self.question_fetch.clone(),
            Lane::AnswerFetch => self.answer_fetch.clone(),
            Lane::Search => self.search.clone(),
            Lane::Vote => self.vote.clone(),
            Lane::Batch => self.batch.clone(),
        }
    }

    /// Run `fut` once a slot of `lane` is free.
    pub async fn run<F, T>(&self, lane: Lane, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let semaphore = self.semaphore(lane);
        // lanes are never closed, a failed acquire only drops the bound
        let _permit = semaphore.acquire().await.ok();
        fut.await
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::new(&PoolSizes::default())
    }
}
