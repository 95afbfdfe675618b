use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use magpie_common::MagpieError;
use magpie_content::WordPairClient;

#[tokio::test]
async fn fetch_pair_returns_two_words_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/word"))
        .and(query_param("number", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["lantern", "sediment"])))
        .mount(&server)
        .await;

    let client = WordPairClient::with_base(&server.uri()).expect("client");
    let (first, second) = client.fetch_pair().await.expect("pair");

    assert_eq!(first, "lantern");
    assert_eq!(second, "sediment");
}

#[tokio::test]
async fn wrong_word_count_is_a_content_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/word"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["only-one"])))
        .mount(&server)
        .await;

    let client = WordPairClient::with_base(&server.uri()).expect("client");
    let err = client.fetch_pair().await.expect_err("one word is not a pair");

    match err {
        MagpieError::Content(message) => assert!(message.contains("1 words"), "{message}"),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[tokio::test]
async fn upstream_failure_propagates_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/word"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = WordPairClient::with_base(&server.uri()).expect("client");
    let result = client.fetch_pair().await;

    assert!(matches!(result, Err(MagpieError::Content(_))));
}
