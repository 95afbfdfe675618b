//! End-to-end route tests against a real listener on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::Duration;

use magpie_scheduler::{JobHandler, Scheduler};
use magpie_web::create_router;

async fn serve(scheduler: Arc<Scheduler>) -> SocketAddr {
    let router = create_router(scheduler);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

fn recording_handler(seen: Arc<Mutex<Vec<Option<String>>>>) -> JobHandler {
    Arc::new(move |override_text| {
        let seen = seen.clone();
        Box::pin(async move {
            seen.lock().expect("test mutex").push(override_text);
            Ok(())
        })
    })
}

fn failing_handler() -> JobHandler {
    Arc::new(|_| Box::pin(async { anyhow::bail!("pipeline exploded") }))
}

#[tokio::test]
async fn health_answers_ok() {
    let scheduler = Arc::new(Scheduler::new());
    let addr = serve(scheduler).await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn job_listing_describes_registered_jobs() {
    let scheduler = Arc::new(Scheduler::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    scheduler
        .register(
            "random-words",
            "posts a riff on two random words",
            Duration::seconds(21_600),
            recording_handler(seen),
        )
        .await;
    let addr = serve(scheduler).await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/api/jobs"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    assert_eq!(body[0]["name"], "random-words");
    assert_eq!(body[0]["schedule"], "6h");
    assert_eq!(body[0]["description"], "posts a riff on two random words");
}

#[tokio::test]
async fn manual_trigger_passes_override_text() {
    let scheduler = Arc::new(Scheduler::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    scheduler
        .register(
            "random-words",
            "test",
            Duration::seconds(21_600),
            recording_handler(seen.clone()),
        )
        .await;
    let addr = serve(scheduler).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/jobs/random-words/run"))
        .json(&serde_json::json!({"text": "posted by hand"}))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["outcome"], "completed");
    assert_eq!(
        seen.lock().expect("test mutex").as_slice(),
        &[Some("posted by hand".to_string())]
    );
}

#[tokio::test]
async fn manual_trigger_without_body_passes_none() {
    let scheduler = Arc::new(Scheduler::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    scheduler
        .register(
            "trending-story",
            "test",
            Duration::seconds(10_800),
            recording_handler(seen.clone()),
        )
        .await;
    let addr = serve(scheduler).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/jobs/trending-story/run"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 200);
    assert_eq!(seen.lock().expect("test mutex").as_slice(), &[None]);
}

#[tokio::test]
async fn unknown_job_is_a_404() {
    let scheduler = Arc::new(Scheduler::new());
    let addr = serve(scheduler).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/jobs/ghost/run"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn failing_job_reports_the_error() {
    let scheduler = Arc::new(Scheduler::new());
    scheduler
        .register(
            "flaky",
            "test",
            Duration::seconds(60),
            failing_handler(),
        )
        .await;
    let addr = serve(scheduler).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/jobs/flaky/run"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["outcome"], "failed");
    assert!(
        body["error"]
            .as_str()
            .expect("error string")
            .contains("pipeline exploded")
    );
}
