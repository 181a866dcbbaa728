use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use setup::{eventually, spawn_app};

mod setup;

fn len(value: &Value) -> usize {
    value.as_array().map(Vec::len).unwrap_or_default()
}

#[tokio::test]
async fn answer_events_notify_and_rate_limit() {
    let app = spawn_app().await;
    let app = &app;

    let question = app.create_question("alice", "Channels", "mpsc or broadcast?", &["tokio"]).await;
    let question_id = question["id"].as_str().unwrap();
    let answer = app.create_answer(question_id, "bob", "mpsc for one consumer").await;
    let answer_id = answer["id"].as_str().unwrap();

    eventually(|| async move { len(&app.get_json("/api/notifications/alice").await) == 1 }).await;
    let alice = app.get_json("/api/notifications/alice").await;
    assert_eq!(alice[0]["type"], "ANSWER_RECEIVED");
    assert_eq!(alice[0]["title"], "New answer on your question");
    assert_eq!(alice[0]["message"], "Someone answered your question: Channels");
    assert_eq!(alice[0]["questionId"], question["id"]);
    assert_eq!(alice[0]["answerId"], answer["id"]);
    assert_eq!(alice[0]["read"], false);

    for _ in 0..4 {
        let res = app.put(&format!("/api/answers/{answer_id}/vote"), json!({ "delta": 1 })).await;
        assert_eq!(res.status(), 200);
    }

    eventually(|| async move { len(&app.get_json("/api/notifications/bob").await) == 2 }).await;
    // let the remaining votes reach the consumer, they are over the daily limit
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let bob = app.get_json("/api/notifications/bob").await;
    assert_eq!(len(&bob), 2);
    assert_eq!(bob[0]["type"], "ANSWER_VOTED");
    assert_eq!(bob[0]["message"], "Someone voted on your answer in \"Channels\".");
}

#[tokio::test]
async fn self_answers_are_not_notified() {
    let app = spawn_app().await;
    let app = &app;

    let question = app.create_question("alice", "Pinning", "Unpin?", &[]).await;
    let question_id = question["id"].as_str().unwrap();
    app.create_answer(question_id, "alice", "Answering myself").await;
    let answer = app.create_answer(question_id, "bob", "Unpin is auto").await;

    let answer_id = answer["id"].as_str().unwrap();
    app.put(&format!("/api/answers/{answer_id}/accept"), json!({})).await;

    eventually(|| async move { len(&app.get_json("/api/notifications/bob").await) == 1 }).await;
    let bob = app.get_json("/api/notifications/bob").await;
    assert_eq!(bob[0]["type"], "ANSWER_ACCEPTED");
    assert_eq!(bob[0]["title"], "Your answer was accepted!");
    assert_eq!(bob[0]["message"], "Your answer on \"Pinning\" was marked as accepted.");

    let alice = app.get_json("/api/notifications/alice").await;
    assert_eq!(len(&alice), 1);
    assert_eq!(alice[0]["answerId"], answer["id"]);
}

#[tokio::test]
async fn mark_notifications_read() {
    let app = spawn_app().await;
    let app = &app;

    for title in ["First", "Second"] {
        let question = app.create_question("alice", title, "body", &[]).await;
        app.create_answer(question["id"].as_str().unwrap(), "bob", "answer").await;
    }

    eventually(|| async move { len(&app.get_json("/api/notifications/alice/unread").await) == 2 })
        .await;

    let all = app.get_json("/api/notifications/alice").await;
    let id = all[0]["id"].as_str().unwrap();
    let res = app.put(&format!("/api/notifications/{id}/read"), json!({})).await;
    assert_eq!(res.status(), 200);
    let read: Value = res.json().await.unwrap();
    assert_eq!(read["read"], true);

    let unread = app.get_json("/api/notifications/alice/unread").await;
    assert_eq!(len(&unread), 1);
    assert_eq!(unread[0]["id"], all[1]["id"]);
    assert_eq!(len(&app.get_json("/api/notifications/alice").await), 2);

    let missing = uuid::Uuid::new_v4();
    let res = app.put(&format!("/api/notifications/{missing}/read"), json!({})).await;
    assert_eq!(res.status(), 404);
}
