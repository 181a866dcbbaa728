use pretty_assertions::assert_eq;
use serde_json::Value;

use setup::{eventually, spawn_app};

mod setup;

fn titles(results: &Value) -> Vec<String> {
    results
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn search_ranks_title_over_tags_over_body() {
    let app = spawn_app().await;
    app.create_question("alice", "Generic code", "Using async closures here", &[]).await;
    app.create_question("bob", "Async closures", "When are they stable?", &[]).await;
    app.create_question("carol", "Closures", "Capturing by move", &["async closures"]).await;
    app.create_question("dave", "Unrelated", "Nothing to see", &["misc"]).await;

    let results = app.get_json("/api/v2/search?q=async%20closures").await;
    assert_eq!(titles(&results), vec!["Async closures", "Closures", "Generic code"]);

    let results = app.get_json("/api/v2/search?q=ASYNC").await;
    assert_eq!(results.as_array().unwrap().len(), 3);

    let results = app.get_json("/api/v2/search").await;
    assert_eq!(results, Value::Array(vec![]));
}

#[tokio::test]
async fn tracked_search_requires_phrase_and_logs_activity() {
    let app = spawn_app().await;
    let app = &app;
    app.create_question("alice", "Serde derive", "Rename all fields", &["serde"]).await;

    let res = app.get("/api/search").await;
    assert_eq!(res.status(), 400);

    let res = app
        .client
        .get(app.url("/api/search?q=serde"))
        .header("x-user-id", "erin")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let results: Value = res.json().await.unwrap();
    assert_eq!(titles(&results), vec!["Serde derive"]);

    let anonymous = app.get_json("/api/search?q=missing").await;
    assert_eq!(anonymous, Value::Array(vec![]));

    eventually(|| async move {
        let entries = app.get_json("/api/activity/type/SEARCH_PERFORMED").await;
        entries.as_array().unwrap().len() == 2
    })
    .await;

    let erin = app.get_json("/api/activity/erin/type/SEARCH_PERFORMED").await;
    assert_eq!(erin.as_array().unwrap().len(), 1);
    assert_eq!(erin[0]["description"], "Search: serde");
    assert_eq!(erin[0]["metadata"]["query"], "serde");

    app.get_json("/api/v2/search?q=serde").await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let all = app.get_json("/api/activity/type/SEARCH_PERFORMED").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}
