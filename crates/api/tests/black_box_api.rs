use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, StatusCode as AxumStatus, header::AUTHORIZATION},
    routing::{get, post},
};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

use docgate_api::{app, config::GatewayConfig};
use docgate_core::{SecretKey, encode};

const SECRET: &str = "black-box-secret";
const FRONTEND: &str = "http://frontend.test";
const PDF: &[u8] = b"%PDF-1.7\n% black box fixture\n";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Stand-in for the account backend and the document origin.
fn upstream() -> Router {
    async fn user_info(headers: HeaderMap) -> Result<Json<Value>, AxumStatus> {
        match bearer(&headers).as_deref() {
            Some("member-token") => Ok(Json(json!({ "id": 7, "roles": ["user"] }))),
            Some("outsider-token") => Ok(Json(json!({ "id": 8, "roles": ["user"] }))),
            Some("admin-token") => Ok(Json(json!({ "id": "root", "roles": ["admin"] }))),
            _ => Err(AxumStatus::UNAUTHORIZED),
        }
    }

    async fn unlocked(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let items = match (bearer(&headers).as_deref(), body["userId"].as_str()) {
            (Some("member-token"), Some("7")) => json!([{ "resourceId": "CMP123" }]),
            (Some("outsider-token"), Some("8")) => json!([{ "resourceId": "CMP999" }]),
            _ => json!([]),
        };
        Json(items)
    }

    Router::new()
        .route("/api/user-info", get(user_info))
        .route("/api/user-unlocked-resources", post(unlocked))
        .route(
            "/docs/CMP123/cert.pdf",
            get(|| async { ([("content-type", "binary/octet-stream")], PDF) }),
        )
        .route("/docs/CMP123/missing.pdf", get(|| async { AxumStatus::NOT_FOUND }))
        .route(
            "/docs/CMP123/live.pdf",
            get(|| async {
                let head = futures::stream::iter([Ok::<_, std::io::Error>(bytes::Bytes::from_static(
                    b"%PDF-1.7\n",
                ))]);
                Body::from_stream(futures::StreamExt::chain(head, futures::stream::pending()))
            }),
        )
}

struct Harness {
    gateway: TestServer,
    upstream: TestServer,
    client: reqwest::Client,
}

impl Harness {
    async fn spawn(secret: Option<&str>) -> Self {
        docgate_observability::init_pretty();
        let upstream = TestServer::spawn(upstream()).await;

        let backend = format!("{}/api", upstream.base_url);
        let secret = secret.map(str::to_string);
        let config = GatewayConfig::from_lookup(move |key| match key {
            "DOCGATE_BACKEND_URL" => Some(backend.clone()),
            "DOCGATE_FRONTEND_URL" => Some(FRONTEND.to_string()),
            "DOCGATE_SECRET_KEY" => secret.clone(),
            "DOCGATE_UPSTREAM_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();

        let state = app::services::build_services(config).unwrap();
        let gateway = TestServer::spawn(app::build_app(state)).await;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            gateway,
            upstream,
            client,
        }
    }

    fn token_for(&self, path: &str) -> String {
        let url = format!("{}{}", self.upstream.base_url, path);
        encode(&url, &SecretKey::new(SECRET).unwrap())
    }

    async fn get(&self, path_and_query: &str, session: Option<&str>) -> reqwest::Response {
        let mut req = self
            .client
            .get(format!("{}{}", self.gateway.base_url, path_and_query));
        if let Some(s) = session {
            req = req.header(header::COOKIE, format!("session_token={s}"));
        }
        req.send().await.unwrap()
    }
}

/// Decode an error redirect into (status, message).
fn error_redirect(res: &reqwest::Response) -> (String, String) {
    assert!(res.status().is_redirection(), "expected redirect, got {}", res.status());
    let location = res.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with(&format!("{FRONTEND}/error?")), "{location}");

    let url = url::Url::parse(location).unwrap();
    let mut status = String::new();
    let mut message = String::new();
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "status" => status = v.into_owned(),
            "message" => message = v.into_owned(),
            _ => {}
        }
    }
    (status, message)
}

#[tokio::test]
async fn health_is_public() {
    let h = Harness::spawn(Some(SECRET)).await;
    let res = h.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn entitled_member_receives_inline_pdf_stream() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");

    let res = h
        .get(&format!("/documents/cert?key={token}"), Some("member-token"))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline")
    );
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key(header::ETAG));
    assert!(
        headers[header::CACHE_CONTROL]
            .to_str()
            .unwrap()
            .contains("stale-while-revalidate")
    );

    let body = res.bytes().await.unwrap();
    assert_eq!(&body[..], PDF);
}

#[tokio::test]
async fn bytes_reach_the_client_while_origin_is_still_sending() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/live.pdf");

    let mut res = h
        .get(&format!("/documents/live?key={token}"), Some("member-token"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let first = tokio::time::timeout(Duration::from_secs(2), res.chunk())
        .await
        .expect("first chunk should arrive before the origin finishes")
        .unwrap()
        .expect("body ended early");
    assert!(first.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn non_entitled_member_is_denied() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");

    let res = h
        .get(&format!("/documents/cert?key={token}"), Some("outsider-token"))
        .await;

    let (status, message) = error_redirect(&res);
    assert_eq!(status, "403");
    assert!(message.to_lowercase().contains("permission denied"), "{message}");
}

#[tokio::test]
async fn admin_is_allowed_without_entitlements() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");

    let res = h
        .get(&format!("/documents/cert?key={token}"), Some("admin-token"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn origin_not_found_redirects_with_404() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/missing.pdf");

    let res = h
        .get(&format!("/documents/missing?key={token}"), Some("member-token"))
        .await;

    let (status, message) = error_redirect(&res);
    assert_eq!(status, "404");
    assert!(message.contains("document could not be found"), "{message}");
}

#[tokio::test]
async fn missing_key_redirects_with_400() {
    let h = Harness::spawn(Some(SECRET)).await;

    let res = h.get("/documents/cert", Some("member-token")).await;

    let (status, message) = error_redirect(&res);
    assert_eq!(status, "400");
    assert!(message.to_lowercase().contains("missing access key"), "{message}");
}

#[tokio::test]
async fn unset_secret_redirects_with_400() {
    let h = Harness::spawn(None).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");

    let res = h
        .get(&format!("/documents/cert?key={token}"), Some("member-token"))
        .await;

    let (status, message) = error_redirect(&res);
    assert_eq!(status, "400");
    assert!(message.contains("missing secret"), "{message}");
}

#[tokio::test]
async fn tampered_key_redirects_with_400() {
    let h = Harness::spawn(Some(SECRET)).await;

    let res = h.get("/documents/cert?key=%25%25%25", Some("member-token")).await;

    let (status, message) = error_redirect(&res);
    assert_eq!(status, "400");
    assert!(message.to_lowercase().contains("invalid or corrupted"), "{message}");
}

#[tokio::test]
async fn expired_session_redirects_with_401() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");

    let res = h.get(&format!("/documents/cert?key={token}"), Some("")).await;

    let (status, _) = error_redirect(&res);
    assert_eq!(status, "401");
}

#[tokio::test]
async fn unknown_account_redirects_with_401() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");

    let res = h
        .get(&format!("/documents/cert?key={token}"), Some("stranger-token"))
        .await;

    let (status, _) = error_redirect(&res);
    assert_eq!(status, "401");
}

#[tokio::test]
async fn missing_session_round_trips_through_sign_in() {
    let h = Harness::spawn(Some(SECRET)).await;
    let token = h.token_for("/docs/CMP123/cert.pdf");
    let original = format!("/documents/cert?key={token}");

    let res = h.get(&original, None).await;
    assert!(res.status().is_redirection());

    let location = res.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with(&format!("{FRONTEND}/login?")), "{location}");

    let return_to = url::Url::parse(&location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "returnTo")
        .map(|(_, v)| v.into_owned())
        .expect("returnTo parameter");
    assert_eq!(return_to, original);

    // After signing in, replaying the return path yields the document.
    let replay = h.get(&return_to, Some("member-token")).await;
    assert_eq!(replay.status(), StatusCode::OK);
    assert_eq!(&replay.bytes().await.unwrap()[..], PDF);
}
