use uuid::Uuid;

use super::{impl_entity, state_ref, transform_helper, EntityData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionState {
    pub(in crate::domain) title: String,
    pub(in crate::domain) body: String,
    pub(in crate::domain) tags: Vec<String>,
    pub(in crate::domain) author_id: String,
    pub(in crate::domain) votes: i32,
}

impl QuestionState {
    pub fn new(title: String, body: String, tags: Vec<String>, author_id: String, votes: i32) -> Self {
        Self {
            title,
            body,
            tags,
            author_id,
            votes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub(in crate::domain) data: EntityData,
    pub(in crate::domain) state: QuestionState,
}

impl_entity!(Question);

impl Question {
    state_ref!(title, String);
    state_ref!(body, String);
    state_ref!(tags, Vec<String>);
    state_ref!(author_id, String);

    transform_helper!(QuestionState);

    pub fn new(title: String, body: String, tags: Vec<String>, author_id: String) -> Self {
        Self::restore(
            EntityData::new(),
            QuestionState::new(title, body, tags, author_id, 0),
        )
    }

    pub fn votes(&self) -> i32 {
        self.state.votes
    }

    pub fn revise(&mut self, title: String, body: String, tags: Vec<String>) {
        self.state.title = title;
        self.state.body = body;
        self.state.tags = tags;
        self.data.touch();
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.state.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerState {
    pub(in crate::domain) question_id: Uuid,
    pub(in crate::domain) body: String,
    pub(in crate::domain) author_id: String,
    pub(in crate::domain) votes: i32,
    pub(in crate::domain) accepted: bool,
}

impl AnswerState {
    pub fn new(question_id: Uuid, body: String, author_id: String, votes: i32, accepted: bool) -> Self {
        Self {
            question_id,
            body,
            author_id,
            votes,
            accepted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub(in crate::domain) data: EntityData,
    pub(in crate::domain) state: AnswerState,
}

impl_entity!(Answer);

impl Answer {
    state_ref!(body, String);
    state_ref!(author_id, String);

    transform_helper!(AnswerState);

    pub fn new(question_id: Uuid, body: String, author_id: String) -> Self {
        Self::restore(
            EntityData::new(),
            AnswerState::new(question_id, body, author_id, 0, false),
        )
    }

    pub fn question_id(&self) -> Uuid {
        self.state.question_id
    }

    pub fn votes(&self) -> i32 {
        self.state.votes
    }

    pub fn accepted(&self) -> bool {
        self.state.accepted
    }

    /// Apply a vote, returning the new vote count.
    pub fn vote(&mut self, delta: i32) -> i32 {
        self.state.votes = self.state.votes.saturating_add(delta);
        self.data.touch();
        self.state.votes
    }

    pub fn accept(&mut self) {
        self.state.accepted = true;
        self.data.touch();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::entity::Entity;

    #[test]
    fn revise_question_replaces_content() {
        let mut question = Question::new(
            "Borrow checker".into(),
            "Why does it complain?".into(),
            vec!["rust".into()],
            "author-1".into(),
        );
        let id = question.ident();

        question.revise(
            "Borrow checker errors".into(),
            "E0502 on a vec push".into(),
            vec!["rust".into(), "borrowck".into()],
        );

        assert_eq!(question.ident(), id);
        assert_eq!(question.title(), "Borrow checker errors");
        assert_eq!(question.body(), "E0502 on a vec push");
        assert!(question.has_tag("borrowck"));
        assert!(!question.has_tag("borrow"));
        assert_eq!(question.version(), 2);
        assert!(question.updated().is_some());
    }

    #[test]
    fn answer_votes_accumulate_and_go_negative() {
        let mut answer = Answer::new(Uuid::new_v4(), "Use a scope".into(), "author-2".into());

        assert_eq!(answer.vote(1), 1);
        assert_eq!(answer.vote(1), 2);
        assert_eq!(answer.vote(-5), -3);
        assert_eq!(answer.version(), 4);
    }

    #[test]
    fn accept_answer() {
        let mut answer = Answer::new(Uuid::new_v4(), "Clone it".into(), "author-3".into());
        assert!(!answer.accepted());

        answer.accept();

        assert!(answer.accepted());
        assert_eq!(answer.votes(), 0);
    }
}
