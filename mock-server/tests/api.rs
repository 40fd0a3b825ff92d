use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, Fixture, JobEntry, XML_CONTENT_TYPE};
use tokio::sync::RwLock;
use tower::ServiceExt;

// "admin:secret"
const AUTH: &str = "Basic YWRtaW46c2VjcmV0";
const CONFIG: &str = "<?xml version='1.1' encoding='UTF-8'?><project><disabled>false</disabled></project>";

fn fixture() -> Fixture {
    Fixture::new("admin", "secret")
        .with_folder(
            "/",
            vec![JobEntry::freestyle("A", "/job/A/"), JobEntry::folder("sub", "/job/sub/")],
        )
        .with_folder("/job/sub/", vec![JobEntry::freestyle("C", "/job/sub/job/C/")])
        .with_config("/job/A/", CONFIG)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .body(String::new())
        .unwrap()
}

fn post_xml(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::CONTENT_TYPE, XML_CONTENT_TYPE)
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app(fixture())
        .oneshot(Request::builder().uri("/api/xml").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Invalid password/token for user");
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let req = Request::builder()
        .uri("/api/xml")
        .header(http::header::AUTHORIZATION, "Basic YWRtaW46d3Jvbmc=")
        .body(String::new())
        .unwrap();
    let resp = app(fixture()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- api/xml ---

#[tokio::test]
async fn root_folder_listing() {
    let resp = app(fixture()).oneshot(get("/api/xml")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        XML_CONTENT_TYPE
    );
    let body = body_text(resp).await;
    assert!(body.starts_with("<?xml version='1.1'"));
    assert!(body.contains("<url>/job/A/</url>"));
    assert!(body.contains("<url>/job/sub/</url>"));
}

#[tokio::test]
async fn nested_folder_listing() {
    let resp = app(fixture()).oneshot(get("/job/sub/api/xml")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("<url>/job/sub/job/C/</url>"));
}

#[tokio::test]
async fn unknown_folder_returns_404_with_body() {
    let resp = app(fixture()).oneshot(get("/job/nope/api/xml")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(resp).await, "No such item: /job/nope/");
}

// --- config.xml ---

#[tokio::test]
async fn get_config_returns_stored_document() {
    let resp = app(fixture()).oneshot(get("/job/A/config.xml")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, CONFIG);
}

#[tokio::test]
async fn post_config_requires_xml_content_type() {
    let req = Request::builder()
        .method("POST")
        .uri("/job/A/config.xml")
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body("<project/>".to_string())
        .unwrap();
    let resp = app(fixture()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn post_config_for_unknown_job_returns_404() {
    let resp = app(fixture())
        .oneshot(post_xml("/job/ghost/config.xml", "<project/>"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_to_api_is_rejected() {
    let resp = app(fixture()).oneshot(post_xml("/api/xml", "<x/>")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- config round trip ---

#[tokio::test]
async fn config_update_lifecycle() {
    use tower::Service;

    let db = Arc::new(RwLock::new(fixture()));
    let mut app = router(db.clone()).into_service();

    // post a new config
    let updated = "<?xml version='1.0' encoding='utf-8' ?>\n<project>\n  <disabled>true</disabled>\n</project>";
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(post_xml("/job/A/config.xml", updated))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.is_empty());

    // the state holds it
    assert_eq!(db.read().await.configs["/job/A/"], updated);

    // and it is served back
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/job/A/config.xml"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, updated);
}
