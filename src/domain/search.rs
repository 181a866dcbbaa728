//! Weighted phrase matching over questions.
//!
//! Title matches weigh 3, tag matches 2 and body matches 1.

use std::cmp::Ordering;

use super::entity::{forum::Question, Entity};

pub const TITLE_WEIGHT: u32 = 3;
pub const TAG_WEIGHT: u32 = 2;
pub const BODY_WEIGHT: u32 = 1;

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn occurrences(haystack: &[String], phrase: &[String]) -> u32 {
    if phrase.is_empty() || haystack.len() < phrase.len() {
        return 0;
    }
    haystack
        .windows(phrase.len())
        .filter(|window| *window == phrase)
        .count() as u32
}

/// Score of a question against a phrase, zero when it does not match.
pub fn score(question: &Question, phrase: &str) -> u32 {
    let phrase = tokenize(phrase);
    if phrase.is_empty() {
        return 0;
    }

    let title = occurrences(&tokenize(question.title()), &phrase);
    let tags: u32 = question
        .tags()
        .iter()
        .map(|tag| occurrences(&tokenize(tag), &phrase))
        .sum();
    let body = occurrences(&tokenize(question.body()), &phrase);

    title * TITLE_WEIGHT + tags * TAG_WEIGHT + body * BODY_WEIGHT
}

/// Keep matching questions, best score first, oldest first on ties.
pub fn rank<I>(questions: I, phrase: &str) -> Vec<Question>
where
    I: IntoIterator<Item = Question>,
{
    let mut scored: Vec<(u32, Question)> = questions
        .into_iter()
        .map(|question| (score(&question, phrase), question))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(left_score, left), (right_score, right)| {
        match right_score.cmp(left_score) {
            Ordering::Equal => left.created().cmp(&right.created()),
            ordering => ordering,
        }
    });

    scored.into_iter().map(|(_, question)| question).collect()
}
