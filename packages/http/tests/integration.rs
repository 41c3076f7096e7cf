use std::time::Duration;

use serde::Deserialize;
use wiremock::matchers::{body_json, body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use restbind_http::{
    BodyType, CancelHandle, Client, Error, ErrorKind, Operation, ReqwestTransport, Value,
};

fn client_for(server: &MockServer) -> Client {
    let transport = ReqwestTransport::with_default_timeout()
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
        .with_default_header("user-agent", "restbind-tests")
        .unwrap();
    Client::new(transport)
}

fn api_kind(err: &Error) -> (ErrorKind, Option<u16>) {
    let api = err.as_api().expect("transport failure");
    (api.kind(), api.status())
}

#[derive(Debug, Deserialize, PartialEq)]
struct Suggestion {
    q: String,
    g: Vec<String>,
}

#[tokio::test]
async fn sugrec_query_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sugrec"))
        .and(query_param("wd", "test"))
        .and(query_param("prod", "pc"))
        .and(header("user-agent", "restbind-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "q": "test",
            "g": ["test1", "test2"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sugrec = Operation::get("/sugrec").query(0, "wd").query(1, "prod");

    let suggestion: Suggestion = client
        .execute_as(&sugrec, vec![Value::from("test"), Value::from("pc")])
        .await
        .unwrap();

    assert_eq!(
        suggestion,
        Suggestion {
            q: "test".to_string(),
            g: vec!["test1".to_string(), "test2".to_string()],
        }
    );
}

#[tokio::test]
async fn json_body_with_path_params() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/users/42"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"name": "Alice", "age": 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let update = Operation::put("/users/{id}").path_param(0, "id").body(1);

    let result = client
        .execute(
            &update,
            vec![
                Value::from(42i64),
                Value::from(serde_json::json!({"name": "Alice", "age": 30})),
            ],
        )
        .await
        .unwrap();

    assert_eq!(result.get("id"), Some(&Value::from(42i64)));
}

#[tokio::test]
async fn url_encoded_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("password=s3cret&user=alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let login = Operation::post("/login")
        .with_body_type(BodyType::FORM_URLENCODED)
        .field(0, "user")
        .field(1, "password");

    let result = client
        .execute(&login, vec![Value::from("alice"), Value::from("s3cret")])
        .await
        .unwrap();

    assert_eq!(result, Value::from("welcome"));
}

#[tokio::test]
async fn multipart_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"title\""))
        .and(body_string_contains("name=\"tags[1]\""))
        .and(body_string_contains("name=\"file\"; filename=\"blob\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let upload = Operation::post("/upload")
        .with_body_type(BodyType::FORM_DATA)
        .field(0, "title")
        .field(1, "tags")
        .field(2, "file");

    client
        .execute(
            &upload,
            vec![
                Value::from("report"),
                Value::from(vec!["a", "b"]),
                Value::Bytes(b"file contents".to_vec()),
            ],
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
}

#[tokio::test]
async fn text_body_and_header_precedence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/notes"))
        .and(header("content-type", "text/markdown"))
        .and(header("x-api-version", "2"))
        .and(header("x-client", "restbind"))
        .and(body_string(r##"{"content":"# hello"}"##))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let note = Operation::post("/notes")
        .with_body_type(BodyType::TEXT)
        .with_header("content-type", "text/markdown")
        .with_header("x-api-version", "1")
        .with_header("x-client", "restbind")
        .field(0, "content")
        .header(1, "X-API-VERSION");

    let result = client
        .execute(&note, vec![Value::from("# hello"), Value::from(2i64)])
        .await
        .unwrap();

    assert!(result.is_null());
}

#[tokio::test]
async fn error_statuses_are_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.execute(&Operation::get("/missing"), vec![]).await.unwrap_err();
    assert_eq!(api_kind(&err), (ErrorKind::Client, Some(404)));

    let err = client.execute(&Operation::get("/busy"), vec![]).await.unwrap_err();
    assert_eq!(api_kind(&err), (ErrorKind::Server, Some(503)));
    assert_eq!(
        err.as_api().unwrap().summary(),
        "[server] request failed with status 503 Service Unavailable (status 503) GET /busy"
    );
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(Duration::from_millis(100))
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap();
    let client = Client::new(transport);

    let err = client.execute(&Operation::get("/slow"), vec![]).await.unwrap_err();
    assert_eq!(api_kind(&err), (ErrorKind::Timeout, None));
}

#[tokio::test]
async fn refused_connection_is_network() {
    // Reserve a port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let transport = ReqwestTransport::with_default_timeout()
        .unwrap()
        .with_base_url(&uri)
        .unwrap();
    let client = Client::new(transport);

    let err = client.execute(&Operation::get("/ping"), vec![]).await.unwrap_err();
    assert_eq!(api_kind(&err), (ErrorKind::Network, None));
}

#[tokio::test]
async fn cancel_aborts_in_flight_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancelHandle::new();

    let call = tokio::spawn({
        let client = client.clone();
        let cancel = cancel.clone();
        async move {
            client
                .execute_with_cancel(&Operation::get("/slow"), vec![], cancel)
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel("user navigated away");

    let err = call.await.unwrap().unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ErrorKind::Canceled);
    assert_eq!(api.message(), "user navigated away");
}
