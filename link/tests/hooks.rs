//! State hook lifecycle tests: the loading/data/error transitions that
//! callers observe through the watch channels.

use std::time::Duration;

use folio_link::{
    FolioClient, InsertHandle, OrderBy, QueryHandle, QueryOptions, Record, RecordHandle,
    RequestState,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).expect("record fixture")
}

async fn client_for(server: &MockServer) -> FolioClient {
    FolioClient::builder()
        .base_url(server.uri())
        .anon_key("test-anon-key")
        .build()
        .expect("client")
}

fn unreachable_client() -> FolioClient {
    FolioClient::builder()
        .base_url("http://127.0.0.1:1")
        .anon_key("test-anon-key")
        .build()
        .expect("client")
}

/// Polls a watch receiver until the request settles or the budget runs out.
async fn settled<T: Clone>(
    rx: &tokio::sync::watch::Receiver<RequestState<T>>,
) -> RequestState<T> {
    for _ in 0..200 {
        let state = rx.borrow().clone();
        if state.is_settled() {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hook never settled");
}

/// Waits until the mock server has seen at least one request, so a test can
/// supersede a fetch that is genuinely in flight.
async fn first_request_in_flight(server: &MockServer) {
    for _ in 0..200 {
        if !server.received_requests().await.unwrap_or_default().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no request reached the server");
}

fn first_title(state: &RequestState<Vec<Record>>) -> Option<String> {
    let title = state.data.as_ref()?.first()?.get("title")?;
    title.as_str().map(str::to_owned)
}

#[tokio::test]
async fn query_handle_moves_from_loading_to_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1}, {"id": 2}]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = QueryHandle::new(&client, "projects", QueryOptions::new());
    let rx = handle.watch();

    let initial = rx.borrow().clone();
    assert!(initial.loading);
    assert!(initial.data.is_none());
    assert!(initial.error.is_none());

    let state = settled(&rx).await;
    assert!(!state.loading);
    assert_eq!(state.data.as_ref().map(Vec::len), Some(2));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn query_handle_surfaces_backend_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = QueryHandle::new(&client, "projects", QueryOptions::new());

    let state = settled(&handle.watch()).await;
    assert!(state.data.is_none());
    assert_eq!(state.error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn structurally_equal_options_do_not_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/skills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let options = QueryOptions::new().with_select("id, name").with_limit(3);
    let handle = QueryHandle::new(&client, "skills", options);
    settled(&handle.watch()).await;

    // A freshly built but identical identity must be recognized as unchanged.
    let same = QueryOptions::new().with_select("id, name").with_limit(3);
    handle.set_query("skills", same);
    tokio::time::sleep(Duration::from_millis(150)).await;

    // expect(1) is asserted when the server drops.
}

#[tokio::test]
async fn refetch_issues_a_second_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/skills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = QueryHandle::new(&client, "skills", QueryOptions::new());
    settled(&handle.watch()).await;

    handle.refetch().await;
    let state = settled(&handle.watch()).await;
    assert!(state.data.is_some());
}

#[tokio::test]
async fn previous_rows_stay_visible_while_refetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1}, {"id": 2}]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = QueryHandle::new(&client, "projects", QueryOptions::new());
    let rx = handle.watch();

    let first = settled(&rx).await;
    assert_eq!(first.data.as_ref().map(Vec::len), Some(1));

    let refetcher = handle.clone();
    tokio::spawn(async move { refetcher.refetch().await });

    // While the slow second request is in flight, the stale rows remain.
    let mut observed_overlap = false;
    for _ in 0..100 {
        let state = rx.borrow().clone();
        if state.loading && state.data.as_ref().map(Vec::len) == Some(1) {
            observed_overlap = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(observed_overlap, "stale rows should stay visible during refetch");

    let second = settled(&rx).await;
    assert_eq!(second.data.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn superseded_fetch_cannot_overwrite_the_newer_result() {
    let server = MockServer::start().await;
    // The first identity answers slowly; its rows must never win.
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "title": "outdated"}]))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .and(query_param("order", "title.asc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "title": "current"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = QueryHandle::new(
        &client,
        "projects",
        QueryOptions::new().with_order(OrderBy::new("created_at")),
    );
    let rx = handle.watch();

    first_request_in_flight(&server).await;
    handle.set_query(
        "projects",
        QueryOptions::new().with_order(OrderBy::ascending("title")),
    );

    let state = settled(&rx).await;
    assert_eq!(first_title(&state).as_deref(), Some("current"));

    // The slow response lands on a retired issue; it must be discarded,
    // not published over the newer rows.
    tokio::time::sleep(Duration::from_millis(600)).await;
    let state = rx.borrow().clone();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(first_title(&state).as_deref(), Some("current"));
}

#[tokio::test]
async fn hook_errors_match_direct_primitive_errors() {
    let client = unreachable_client();

    let direct = client
        .fetch_all("projects", &QueryOptions::new())
        .await
        .expect_err("direct fetch_all must fail")
        .message();
    let query = QueryHandle::new(&client, "projects", QueryOptions::new());
    let state = settled(&query.watch()).await;
    assert_eq!(state.error.as_deref(), Some(direct.as_str()));

    let direct = client
        .fetch_by_id("projects", "7")
        .await
        .expect_err("direct fetch_by_id must fail")
        .message();
    let by_id = RecordHandle::new(&client, "projects", Some("7"));
    let state = settled(&by_id.watch()).await;
    assert_eq!(state.error.as_deref(), Some(direct.as_str()));

    let direct = client
        .insert("projects", &record(json!({"name": "A"})))
        .await
        .expect_err("direct insert must fail")
        .message();
    let insert = InsertHandle::new(&client, "projects");
    let err = insert
        .submit(record(json!({"name": "A"})))
        .await
        .expect_err("submit must fail");
    assert_eq!(err.message(), direct);
    assert_eq!(insert.state().error.as_deref(), Some(direct.as_str()));
}

#[tokio::test]
async fn record_handle_without_id_stays_idle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = RecordHandle::new(&client, "blog_posts", None);
    let rx = handle.watch();

    let state = rx.borrow().clone();
    assert!(!state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());

    // No request may sneak out later either.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let state = rx.borrow().clone();
    assert!(!state.loading && state.data.is_none() && state.error.is_none());
}

#[tokio::test]
async fn record_handle_treats_empty_id_as_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = RecordHandle::new(&client, "blog_posts", Some(""));
    tokio::time::sleep(Duration::from_millis(150)).await;

    let state = handle.state();
    assert!(!state.loading && state.data.is_none() && state.error.is_none());
}

#[tokio::test]
async fn record_handle_fetches_once_id_arrives() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/blog_posts"))
        .and(query_param("id", "eq.12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 12, "title": "post"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = RecordHandle::new(&client, "blog_posts", None);
    handle.set_key("blog_posts", Some("12"));

    let state = settled(&handle.watch()).await;
    let row = state.data.expect("row");
    assert_eq!(row.get("title"), Some(&json!("post")));
}

#[tokio::test]
async fn clearing_the_key_discards_the_in_flight_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/blog_posts"))
        .and(query_param("id", "eq.9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 9, "title": "late"}]))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = RecordHandle::new(&client, "blog_posts", Some("9"));
    let rx = handle.watch();

    first_request_in_flight(&server).await;
    handle.set_key("blog_posts", None);

    let state = rx.borrow().clone();
    assert!(!state.loading && state.data.is_none() && state.error.is_none());

    // The slow response settles on a retired issue and must leave idle alone.
    tokio::time::sleep(Duration::from_millis(600)).await;
    let state = rx.borrow().clone();
    assert!(!state.loading && state.data.is_none() && state.error.is_none());
}

#[tokio::test]
async fn record_handle_missing_row_reports_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/blog_posts"))
        .and(query_param("id", "eq.404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = RecordHandle::new(&client, "blog_posts", Some("404"));

    let state = settled(&handle.watch()).await;
    assert!(state.data.is_none());
    let message = state.error.expect("error message");
    assert!(message.contains("blog_posts"));
    assert!(message.contains("404"));
}

#[tokio::test]
async fn insert_handle_reports_success_and_returns_the_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/contacts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([{"id": 1, "name": "A"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = InsertHandle::new(&client, "contacts");

    let initial = handle.state();
    assert!(!initial.loading && !initial.success && initial.error.is_none());

    let inserted = handle
        .submit(record(json!({"name": "A"})))
        .await
        .expect("inserted row");
    assert_eq!(inserted.get("name"), Some(&json!("A")));

    let state = handle.state();
    assert!(state.success);
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn insert_handle_failure_state_matches_returned_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/contacts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "new row violates row-level security policy",
            "code": "42501"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = InsertHandle::new(&client, "contacts");

    let err = handle
        .submit(record(json!({"name": "A"})))
        .await
        .expect_err("must fail");

    let state = handle.state();
    assert!(!state.success);
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(err.message().as_str()));
}

#[tokio::test]
async fn insert_handle_reset_clears_the_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/contacts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([{"id": 1, "name": "A"}])),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let handle = InsertHandle::new(&client, "contacts");
    handle
        .submit(record(json!({"name": "A"})))
        .await
        .expect("inserted row");
    assert!(handle.state().success);

    handle.reset();
    let state = handle.state();
    assert!(!state.loading && !state.success && state.error.is_none());
}
