//! End-to-end tests for `Client` over `HttpTransport` using wiremock.

use dogapi_lib::{
    ApiRequest, CancelHandle, Client, ClientConfig, Error, NoContent, Params, TransportError,
    ValidateResponse,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer, config: ClientConfig) -> Client {
    Client::from_config(config.with_host(server.uri())).expect("client")
}

#[tokio::test]
async fn validate_sends_credentials_as_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .and(query_param("api_key", "api-123"))
        .and(query_param("application_key", "app-456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("api-123").with_app_key("app-456"));
    let res = client.validate().await.expect("validate");
    assert!(res.valid);

    let received = server.received_requests().await.expect("recording");
    let headers = &received[0].headers;
    assert!(!headers.contains_key("api_key"));
    assert!(!headers.contains_key("dd-api-key"));
}

#[tokio::test]
async fn repeated_params_keep_order_and_credentials_come_last() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"host_list": []})))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let mut params = Params::new();
    params.add("filter", "env:prod").add("filter", "role:db");
    let _: Value = client
        .execute(ApiRequest::get("/api/v1/hosts").params(&params))
        .await
        .expect("hosts");

    let received = server.received_requests().await.expect("recording");
    let pairs: Vec<(String, String)> = received[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("filter".to_string(), "env:prod".to_string()),
            ("filter".to_string(), "role:db".to_string()),
            ("api_key".to_string(), "k".to_string()),
        ]
    );
    assert_eq!(params.len(), 2);
}

#[tokio::test]
async fn json_error_response_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/monitor/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": ["Not Found"]})))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let err = client
        .execute::<Value>(ApiRequest::get("/api/v1/monitor/42"))
        .await
        .unwrap_err();
    match err {
        Error::Api(e) => {
            assert_eq!(e.status, 404);
            assert_eq!(e.errors, vec!["Not Found".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn plain_text_error_response_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let err = client.validate().await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 500 }));
}

#[tokio::test]
async fn malformed_success_body_keeps_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"valid\": tru", "application/json"))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let err = client.validate().await.unwrap_err();
    match err {
        Error::InvalidJson { body, .. } => assert_eq!(body, b"{\"valid\": tru".to_vec()),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn delete_host_tags_returns_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/tags/hosts/web-01"))
        .and(query_param("source", "users"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let res = client
        .delete_host_tags("web-01", Some("users"))
        .await
        .expect("delete");
    assert_eq!(res, NoContent);
}

#[tokio::test]
async fn host_tags_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tags/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tags": {"env:prod": ["web-01", "web-02"], "role:db": ["db-01"]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let tags = client.host_tags(None).await.expect("tags");
    assert_eq!(tags.tags["env:prod"], vec!["web-01", "web-02"]);
    assert_eq!(tags.tags.len(), 2);
}

#[tokio::test]
async fn rate_limit_headers_update_latest_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"valid": true}))
                .insert_header("x-ratelimit-limit", "100")
                .insert_header("x-ratelimit-period", "60")
                .insert_header("x-ratelimit-remaining", "57")
                .insert_header("x-ratelimit-reset", "12")
                .insert_header("x-ratelimit-name", "validate"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tags/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tags": {}})))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    assert!(client.latest_rate_limit().is_none());

    client.validate().await.expect("validate");
    let snapshot = client.latest_rate_limit().expect("snapshot");
    assert_eq!(snapshot.limit, Some(100));
    assert_eq!(snapshot.remaining, Some(57));
    assert_eq!(snapshot.name.as_deref(), Some("validate"));

    client.host_tags(None).await.expect("tags");
    assert_eq!(client.latest_rate_limit(), Some(snapshot));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_share_one_client() {
    const CALLS: u64 = 8;
    let server = MockServer::start().await;
    for n in 0..CALLS {
        Mock::given(method("GET"))
            .and(path("/api/v1/validate"))
            .and(query_param("n", n.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"valid": true}))
                    .insert_header("x-ratelimit-limit", "100")
                    .insert_header("x-ratelimit-remaining", n.to_string().as_str())
                    .set_delay(Duration::from_millis(20 * (CALLS - n))),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = Arc::new(client_for(&server, ClientConfig::new("k")));
    let tasks: Vec<_> = (0..CALLS)
        .map(|n| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let mut params = Params::new();
                params.add("n", n.to_string());
                client
                    .execute::<ValidateResponse>(
                        ApiRequest::get("/api/v1/validate").params(&params),
                    )
                    .await
            })
        })
        .collect();

    for task in tasks {
        let res = task.await.expect("join").expect("validate");
        assert!(res.valid);
    }

    let snapshot = client.latest_rate_limit().expect("snapshot");
    assert_eq!(snapshot.limit, Some(100));
    let remaining = snapshot.remaining.expect("remaining");
    assert!(remaining < CALLS, "unexpected snapshot {snapshot:?}");
}

#[tokio::test]
async fn slow_response_hits_the_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"valid": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::new("k").with_timeout(Duration::from_millis(100));
    let client = client_for(&server, config);
    let err = client.validate().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(client.latest_rate_limit().is_none());
}

#[tokio::test]
async fn cancel_signal_aborts_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"valid": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, ClientConfig::new("k"));
    let handle = CancelHandle::new();
    let request = ApiRequest::get("/api/v1/validate").cancel_on(handle.signal());
    let canceller = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = client.execute::<Value>(request).await.unwrap_err();
    match err {
        Error::Transport(cause) => assert!(matches!(
            cause.downcast_ref::<TransportError>(),
            Some(TransportError::Cancelled)
        )),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let client = Client::from_config(ClientConfig::new("k").with_host("http://127.0.0.1:9"))
        .expect("client");
    let err = client.validate().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
