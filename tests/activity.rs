use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use setup::{eventually, spawn_app};

mod setup;

fn types(entries: &Value) -> Vec<String> {
    entries
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["activityType"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn forum_writes_are_logged_per_user() {
    let app = spawn_app().await;
    let app = &app;

    let question = app
        .create_question("alice", "Iterators", "Lazy adapters", &["rust", "iter"])
        .await;
    let question_id = question["id"].as_str().unwrap();
    app.put(
        &format!("/api/questions/{question_id}"),
        json!({ "title": "Iterators", "body": "Lazy adapters and fusion", "tags": ["rust"] }),
    )
    .await;
    let answer = app.create_answer(question_id, "bob", "They do nothing until consumed").await;
    let answer_id = answer["id"].as_str().unwrap();
    app.put(&format!("/api/answers/{answer_id}/vote"), json!({ "delta": -2 })).await;

    eventually(|| async move {
        let alice = app.get_json("/api/activity/alice").await;
        let bob = app.get_json("/api/activity/bob").await;
        alice.as_array().unwrap().len() == 2 && bob.as_array().unwrap().len() == 2
    })
    .await;

    let alice = app.get_json("/api/activity/alice").await;
    let mut alice_types = types(&alice);
    alice_types.sort();
    assert_eq!(alice_types, vec!["QUESTION_CREATED", "QUESTION_UPDATED"]);

    let created = app.get_json("/api/activity/alice/type/QUESTION_CREATED").await;
    assert_eq!(created.as_array().unwrap().len(), 1);
    assert_eq!(created[0]["resourceId"], question["id"]);
    assert_eq!(created[0]["metadata"]["tags"], "rust,iter");

    let voted = app.get_json("/api/activity/bob/type/ANSWER_VOTED").await;
    assert_eq!(voted[0]["description"], "Vote down on answer");
    assert_eq!(voted[0]["metadata"]["delta"], "-2");
    assert_eq!(voted[0]["metadata"]["newVoteCount"], "-2");

    let answered = app.get_json("/api/activity/type/ANSWER_CREATED").await;
    assert_eq!(answered.as_array().unwrap().len(), 1);
    assert_eq!(answered[0]["metadata"]["questionId"], question["id"]);

    let today = app.get_json("/api/activity/bob/today").await;
    assert_eq!(today.as_array().unwrap().len(), 2);

    assert!(app
        .get_json("/api/activity/nobody")
        .await
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_activity_type_is_rejected() {
    let app = spawn_app().await;

    let res = app.get("/api/activity/type/QUESTION_PUBLISHED").await;
    assert_eq!(res.status(), 400);

    let res = app.get("/api/activity/alice/type/not_a_type").await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn deleting_question_is_logged() {
    let app = spawn_app().await;
    let app = &app;

    let question = app.create_question("carol", "Unsafe", "When is it sound?", &[]).await;
    let question_id = question["id"].as_str().unwrap();
    let res = app
        .client
        .delete(app.url(&format!("/api/questions/{question_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    eventually(|| async move {
        let deleted = app.get_json("/api/activity/carol/type/QUESTION_DELETED").await;
        deleted.as_array().unwrap().len() == 1
    })
    .await;

    let carol = app.get_json("/api/activity/carol").await;
    assert_eq!(types(&carol).len(), 2);
}
