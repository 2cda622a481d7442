use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use ingest_kernel::database::Database;
use ingest_kernel::domain::config::ApiConfig;
use ingest_kernel::prelude::ApiState;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tower::ServiceExt;

const SECRET: &str = "objects-test-secret";

fn app() -> Router {
    let mut config = ApiConfig::default();
    config.security.jwt.secret = SECRET.to_owned();
    config.security.jwt.membership_lookup = false;

    let database = Database::builder()
        .url("postgres://ingest@127.0.0.1:1/macrostrat")
        .init_lazy()
        .expect("lazy pool");

    let state = ApiState::builder()
        .config(config)
        .db(database)
        .register_slice(ingest_objects::init().expect("objects slice"))
        .build()
        .expect("state");

    let (router, _api) = ingest_objects::router().split_for_parts();
    router.with_state(state)
}

fn bearer(groups: &[i32]) -> String {
    let claims = json!({ "sub": "tester", "groups": groups, "exp": chrono::Utc::now().timestamp() + 600 });
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("jwt");
    format!("Bearer {token}")
}

fn request(method: Method, uri: &str, auth: Option<String>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

fn new_object() -> serde_json::Value {
    json!({ "scheme": "s3", "host": "storage.example.org", "bucket": "maps", "key": "a.tif" })
}

#[tokio::test]
async fn writes_require_admin() {
    let cases = [
        request(Method::POST, "/object", None, Some(new_object())),
        request(Method::POST, "/object", Some(bearer(&[3])), Some(new_object())),
        request(Method::PATCH, "/object/1", Some(bearer(&[3])), Some(json!({ "host": "x" }))),
        request(Method::DELETE, "/object/1", None, None),
    ];

    for case in cases {
        let response = app().oneshot(case).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let mut body = new_object();
    body["owner"] = json!("someone");
    let response =
        app().oneshot(request(Method::POST, "/object", Some(bearer(&[1])), Some(body))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_scheme_is_rejected() {
    let mut body = new_object();
    body["scheme"] = json!("ftp");
    let response =
        app().oneshot(request(Method::POST, "/object", Some(bearer(&[1])), Some(body))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bad_paging_is_a_bad_request() {
    let response =
        app().oneshot(request(Method::GET, "/object?page_size=lots", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_ids_are_rejected() {
    let response = app().oneshot(request(Method::GET, "/object/abc", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
