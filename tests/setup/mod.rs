#![allow(dead_code)]

use std::{future::Future, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use salvo::{listener::TcpListener, Server};
use serde_json::{json, Value};
use url::Url;

use qa_forum::{
    config::env_var::{Broker, EnvVar, PoolSizes, Storage},
    infra::{bootstrap, router},
};

pub struct TestApp {
    pub client: Client,
    pub url: Url,
}

impl TestApp {
    pub fn url(&self, path: &str) -> Url {
        self.url.join(path).unwrap()
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.put(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let res = self.get(path).await;
        assert_eq!(res.status(), 200, "GET {path}");
        res.json().await.unwrap()
    }

    pub async fn create_question(&self, author: &str, title: &str, body: &str, tags: &[&str]) -> Value {
        let res = self
            .post(
                "/api/questions",
                json!({ "title": title, "body": body, "tags": tags, "authorId": author }),
            )
            .await;
        assert_eq!(res.status(), 201);
        res.json().await.unwrap()
    }

    pub async fn create_answer(&self, question_id: &str, author: &str, body: &str) -> Value {
        let res = self
            .post(
                &format!("/api/questions/{question_id}/answers"),
                json!({ "body": body, "authorId": author }),
            )
            .await;
        assert_eq!(res.status(), 201);
        res.json().await.unwrap()
    }
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Start the api in-process with the memory store and the local broker.
pub async fn spawn_app() -> TestApp {
    let port = free_port();
    let env = EnvVar {
        port,
        storage: Storage::Memory,
        database: None,
        broker: Broker::Local,
        kafka_bootstrap_servers: vec![],
        kafka_auto_create_topics: false,
        pools: PoolSizes::default(),
    };

    let ctx = bootstrap::context(&env).await.unwrap();
    let listener = TcpListener::bind(&format!("127.0.0.1:{port}"));
    tokio::spawn(Server::new(listener).serve(router::app(ctx)));

    TestApp {
        client: create_client(),
        url: Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
    }
}

/// Poll until `check` holds, activity and notifications are written asynchronously.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

fn create_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.append("accept", HeaderValue::from_static("application/json"));

    let connect_timeout = 1000 * 5; // 5 sec
    let timeout = 1000 * 30; // 30 sec, password hashing is slow in debug builds

    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(connect_timeout))
        .timeout(Duration::from_millis(timeout))
        .pool_max_idle_per_host(5)
        .default_headers(headers)
        .brotli(true)
        .gzip(true)
        .build()
        .expect("Expect to create a http client")
}
