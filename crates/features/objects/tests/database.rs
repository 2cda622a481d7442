//! End-to-end checks against PostgreSQL.
//!
//! Skipped unless `INGEST_TEST_DATABASE_URL` points at a server where the test user may
//! create databases.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use ingest_database::testing::TestDatabase;
use ingest_kernel::domain::config::ApiConfig;
use ingest_kernel::prelude::ApiState;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "database-test-secret";

const SCHEMA: &str = r"
CREATE SCHEMA macrostrat;
CREATE TYPE schemeenum AS ENUM ('http', 's3');

CREATE TABLE macrostrat.objects (
    id serial PRIMARY KEY,
    scheme schemeenum NOT NULL,
    host varchar(255) NOT NULL,
    bucket varchar(255) NOT NULL,
    key varchar(255) NOT NULL,
    source json,
    mime_type varchar(255),
    sha256_hash varchar(255),
    created_on timestamptz NOT NULL DEFAULT now(),
    updated_on timestamptz NOT NULL DEFAULT now(),
    deleted_on timestamptz,
    CONSTRAINT unique_file UNIQUE (scheme, host, bucket, key)
);
";

struct Fixture {
    db: TestDatabase,
    app: Router,
}

impl Fixture {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, HeaderMap, Value) {
        let claims = json!({ "sub": "tester", "groups": [1], "exp": chrono::Utc::now().timestamp() + 600 });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
            .expect("jwt");

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
            .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json") };
        (status, headers, body)
    }
}

async fn fixture() -> Option<Fixture> {
    let db = TestDatabase::create().await.expect("test database")?;
    db.execute(SCHEMA).await.expect("schema");

    let mut config = ApiConfig::default();
    config.security.jwt.secret = SECRET.to_owned();
    config.security.jwt.membership_lookup = false;

    let state = ApiState::builder()
        .config(config)
        .db(db.database())
        .register_slice(ingest_objects::init().expect("objects slice"))
        .build()
        .expect("state");

    let (router, _api) = ingest_objects::router().split_for_parts();
    Some(Fixture { db, app: router.with_state(state) })
}

fn new_object(key: &str) -> Value {
    json!({
        "scheme": "s3",
        "host": "storage.example.org",
        "bucket": "maps",
        "key": key,
        "source": { "uploaded_by": "tester" },
        "mime_type": "application/zip",
    })
}

#[tokio::test]
async fn objects_are_created_listed_and_updated() {
    let Some(fx) = fixture().await else { return };

    let (status, _, created) = fx.send(Method::POST, "/object", Some(new_object("a.zip"))).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["scheme"], "s3");
    assert_eq!(created["source"]["uploaded_by"], "tester");
    assert!(created["deleted_on"].is_null());
    let id = created["id"].as_i64().expect("id");

    let (status, _, _) = fx.send(Method::POST, "/object", Some(new_object("b.zip"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, headers, body) = fx.send(Method::GET, "/object?page_size=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-total-count"], "2");
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], id);

    let (status, _, updated) =
        fx.send(Method::PATCH, &format!("/object/{id}"), Some(json!({ "mime_type": "text/plain" }))).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["mime_type"], "text/plain");
    assert_eq!(updated["key"], "a.zip");
    assert_ne!(updated["updated_on"], created["updated_on"]);

    fx.db.drop_database().await.expect("drop");
}

#[tokio::test]
async fn duplicate_locations_conflict() {
    let Some(fx) = fixture().await else { return };

    let (status, _, _) = fx.send(Method::POST, "/object", Some(new_object("a.zip"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = fx.send(Method::POST, "/object", Some(new_object("a.zip"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Object already exists");

    fx.db.drop_database().await.expect("drop");
}

#[tokio::test]
async fn deletes_are_soft_and_not_repeatable() {
    let Some(fx) = fixture().await else { return };

    let (_, _, created) = fx.send(Method::POST, "/object", Some(new_object("a.zip"))).await;
    let id = created["id"].as_i64().expect("id");
    let uri = format!("/object/{id}");

    let (status, _, _) = fx.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = fx.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], format!("Object with id ({id}) not found"));

    let (status, _, _) = fx.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, headers, _) = fx.send(Method::GET, "/object", None).await;
    assert_eq!(headers["x-total-count"], "0");

    let deleted = sqlx::query_scalar::<_, bool>("SELECT deleted_on IS NOT NULL FROM macrostrat.objects WHERE id = $1")
        .bind(i32::try_from(id).expect("i32 id"))
        .fetch_one(fx.db.database().pool())
        .await
        .expect("row kept");
    assert!(deleted);

    fx.db.drop_database().await.expect("drop");
}
