use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::warn;

pub const FREESTYLE_CLASS: &str = "hudson.model.FreeStyleProject";
pub const FOLDER_CLASS: &str = "com.cloudbees.hudson.plugins.folder.Folder";
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobEntry {
    #[serde(rename = "_class")]
    pub class: String,
    pub name: String,
    pub url: String,
}

impl JobEntry {
    pub fn freestyle(name: &str, url: &str) -> Self {
        Self {
            class: FREESTYLE_CLASS.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    pub fn folder(name: &str, url: &str) -> Self {
        Self {
            class: FOLDER_CLASS.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Server contents: one user, folder listings keyed by folder path
/// (`/`, `/job/sub/`) and job configs keyed by job path (`/job/A/`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub folders: HashMap<String, Vec<JobEntry>>,
    #[serde(default)]
    pub configs: HashMap<String, String>,
}

impl Fixture {
    pub fn new(username: &str, token: &str) -> Self {
        Self {
            username: username.to_string(),
            token: token.to_string(),
            ..Self::default()
        }
    }

    pub fn with_folder(mut self, path: &str, jobs: Vec<JobEntry>) -> Self {
        self.folders.insert(path.to_string(), jobs);
        self
    }

    pub fn with_config(mut self, path: &str, config: &str) -> Self {
        self.configs.insert(path.to_string(), config.to_string());
        self
    }
}

pub type Db = Arc<RwLock<Fixture>>;

pub fn app(fixture: Fixture) -> Router {
    router(Arc::new(RwLock::new(fixture)))
}

/// Router over shared state, so tests can inspect what was posted.
pub fn router(db: Db) -> Router {
    Router::new()
        .route("/{*path}", get(read_resource).post(write_config))
        .with_state(db)
}

pub async fn run(listener: TcpListener, fixture: Fixture) -> Result<(), std::io::Error> {
    axum::serve(listener, app(fixture)).await
}

async fn read_resource(State(db): State<Db>, Path(path): Path<String>, headers: HeaderMap) -> Response {
    let fixture = db.read().await;
    if !authorized(&headers, &fixture) {
        return unauthorized(&path);
    }

    if let Some(folder) = path.strip_suffix("api/xml") {
        let key = format!("/{folder}");
        return match fixture.folders.get(&key) {
            Some(jobs) => xml(render_folder(jobs)),
            None => not_found(&key),
        };
    }

    if let Some(job) = path.strip_suffix("config.xml") {
        let key = format!("/{job}");
        return match fixture.configs.get(&key) {
            Some(config) => xml(config.clone()),
            None => not_found(&key),
        };
    }

    not_found(&path)
}

async fn write_config(
    State(db): State<Db>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut fixture = db.write().await;
    if !authorized(&headers, &fixture) {
        return unauthorized(&path);
    }

    let Some(job) = path.strip_suffix("config.xml") else {
        return (StatusCode::METHOD_NOT_ALLOWED, "Only config.xml accepts POST").into_response();
    };

    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if content_type != Some(XML_CONTENT_TYPE) {
        warn!(path = %path, ?content_type, "rejected config upload");
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Expected application/xml").into_response();
    }

    let key = format!("/{job}");
    match fixture.configs.get_mut(&key) {
        Some(config) => {
            *config = body;
            StatusCode::OK.into_response()
        }
        None => not_found(&key),
    }
}

fn authorized(headers: &HeaderMap, fixture: &Fixture) -> bool {
    let expected = format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", fixture.username, fixture.token))
    );
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn unauthorized(path: &str) -> Response {
    warn!(path, "rejected credentials");
    (StatusCode::UNAUTHORIZED, "Invalid password/token for user").into_response()
}

fn not_found(key: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("No such item: {key}")).into_response()
}

fn xml(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XML_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Render a folder's `api/xml` the way Jenkins does, single-quoted
/// declaration included.
pub fn render_folder(jobs: &[JobEntry]) -> String {
    let mut out = format!(
        "<?xml version='1.1' encoding='UTF-8'?><folder _class=\"{FOLDER_CLASS}\">"
    );
    for job in jobs {
        out.push_str(&format!(
            "<job _class=\"{}\"><name>{}</name><url>{}</url></job>",
            escape(job.class.as_str()),
            escape(job.name.as_str()),
            escape(job.url.as_str()),
        ));
    }
    out.push_str("</folder>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_folder_lists_jobs_in_order() {
        let body = render_folder(&[JobEntry::freestyle("A", "/job/A/"), JobEntry::folder("sub", "/job/sub/")]);
        assert!(body.starts_with("<?xml version='1.1' encoding='UTF-8'?><folder"));
        let a = body.find("/job/A/").unwrap();
        let sub = body.find("/job/sub/").unwrap();
        assert!(a < sub);
        assert!(body.contains(&format!("<job _class=\"{FREESTYLE_CLASS}\"><name>A</name>")));
    }

    #[test]
    fn render_folder_escapes_text() {
        let body = render_folder(&[JobEntry::freestyle("R&D", "/job/R&D/")]);
        assert!(body.contains("<name>R&amp;D</name>"));
        assert!(body.contains("<url>/job/R&amp;D/</url>"));
    }

    #[test]
    fn fixture_deserializes_with_defaults() {
        let fixture: Fixture = serde_json::from_str(r#"{"username":"admin","token":"secret"}"#).unwrap();
        assert_eq!(fixture.username, "admin");
        assert!(fixture.folders.is_empty());
        assert!(fixture.configs.is_empty());
    }

    #[test]
    fn fixture_reads_job_class_field() {
        let fixture: Fixture = serde_json::from_str(
            r#"{"username":"u","token":"t","folders":{"/":[{"_class":"x.Y","name":"n","url":"/job/n/"}]}}"#,
        )
        .unwrap();
        assert_eq!(fixture.folders["/"][0].class, "x.Y");
    }

    #[test]
    fn authorized_requires_exact_credentials() {
        let fixture = Fixture::new("admin", "secret");
        let mut headers = HeaderMap::new();
        assert!(!authorized(&headers, &fixture));

        headers.insert(header::AUTHORIZATION, "Basic YWRtaW46c2VjcmV0".parse().unwrap());
        assert!(authorized(&headers, &fixture));

        headers.insert(header::AUTHORIZATION, "Basic YWRtaW46d3Jvbmc=".parse().unwrap());
        assert!(!authorized(&headers, &fixture));
    }
}
