//! Request builder and response parser for the Jenkins XML API.
//!
//! # Design
//! `JenkinsClient` holds only its `ClientConfig` and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The transport-driven methods (`query_api`, `get_config`,
//! `send_config`, `get_projects`, `list_folder`) chain the two through a
//! caller-supplied `Transport`.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{FolderListing, JobEntry};
use crate::xml::Document;

pub const API_SUFFIX: &str = "api/xml";
pub const CONFIG_SUFFIX: &str = "config.xml";
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Synchronous, stateless client for the Jenkins XML API.
#[derive(Clone)]
pub struct JenkinsClient {
    config: ClientConfig,
    authorization: String,
}

impl fmt::Debug for JenkinsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl JenkinsClient {
    /// Validate `config` and build a client. A trailing `/` on the server
    /// address is dropped.
    pub fn new(mut config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        config.server = config.server.trim_end_matches('/').to_string();
        let credentials = format!("{}:{}", config.username, config.token);
        let authorization = format!("Basic {}", BASE64.encode(credentials));
        Ok(Self { config, authorization })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for `path` + `suffix`.
    ///
    /// Paths that already start with the server address (as the URLs in
    /// folder listings do) are used unchanged. Any other path is joined to the
    /// server address with a `/` inserted when it lacks one, so `"job/A/"` and
    /// `"/job/A/"` resolve alike and `""` is the server root.
    pub fn resolve_url(&self, path: &str, suffix: &str) -> String {
        let server = &self.config.server;
        if path.starts_with(server.as_str()) {
            format!("{path}{suffix}")
        } else if path.starts_with('/') {
            format!("{server}{path}{suffix}")
        } else {
            format!("{server}/{path}{suffix}")
        }
    }

    pub fn build_query_api(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.resolve_url(path, API_SUFFIX), None)
    }

    pub fn build_get_config(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.resolve_url(path, CONFIG_SUFFIX), None)
    }

    pub fn build_send_config(&self, path: &str, config: &Document) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            self.resolve_url(path, CONFIG_SUFFIX),
            Some(config.to_xml()),
        )
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![("authorization".to_string(), self.authorization.clone())];
        if method == HttpMethod::Post && body.is_some() {
            headers.push(("content-type".to_string(), XML_CONTENT_TYPE.to_string()));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// Parse an `api/xml` or `config.xml` response.
    ///
    /// A leading declaration is removed so the root element is the first
    /// child of the returned document.
    pub fn parse_document(&self, response: HttpResponse) -> Result<Document, ApiError> {
        check_status(&response)?;
        let mut doc = Document::parse(&response.body)?;
        doc.strip_declaration();
        Ok(doc)
    }

    pub fn parse_send_config(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// GET `path` + `api/xml`.
    pub fn query_api(&self, transport: &impl Transport, path: &str) -> Result<Document, ApiError> {
        self.fetch(transport, self.build_query_api(path))
    }

    /// GET `path` + `config.xml`.
    pub fn get_config(&self, transport: &impl Transport, path: &str) -> Result<Document, ApiError> {
        self.fetch(transport, self.build_get_config(path))
    }

    /// POST `config` to `path` + `config.xml`, replacing the job's stored
    /// configuration.
    pub fn send_config(&self, transport: &impl Transport, path: &str, config: &Document) -> Result<(), ApiError> {
        let request = self.build_send_config(path, config);
        let url = request.url.clone();
        let response = transport.execute(request)?;
        log_failure(&url, &response);
        self.parse_send_config(response)
    }

    /// Every entry of the folder at `path`, whatever its class.
    pub fn list_folder(&self, transport: &impl Transport, path: &str) -> Result<Vec<JobEntry>, ApiError> {
        let doc = self.query_api(transport, path)?;
        Ok(FolderListing::from_document(&doc).entries)
    }

    /// URLs of all freestyle jobs under `path`, recursing into sub-folders.
    ///
    /// Each folder contributes its own jobs first, then the complete
    /// contents of each sub-folder in listing order. Any failed request
    /// aborts the walk.
    pub fn get_projects(&self, transport: &impl Transport, path: &str) -> Result<Vec<String>, ApiError> {
        let mut projects = Vec::new();
        let mut pending = vec![path.to_string()];

        while let Some(folder) = pending.pop() {
            let doc = self.query_api(transport, &folder)?;
            let listing = FolderListing::from_document(&doc);
            let folders: Vec<String> = listing.folders().map(str::to_string).collect();
            debug!(folder = %folder, sub_folders = folders.len(), "listed folder");

            projects.extend(listing.jobs().map(str::to_string));
            pending.extend(folders.into_iter().rev());
        }

        Ok(projects)
    }

    fn fetch(&self, transport: &impl Transport, request: HttpRequest) -> Result<Document, ApiError> {
        let url = request.url.clone();
        let response = transport.execute(request)?;
        log_failure(&url, &response);
        self.parse_document(response)
    }
}

/// Anything but 200 is an error carrying the raw body.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::HttpStatus {
        status: response.status,
        body: response.body.clone(),
    })
}

fn log_failure(url: &str, response: &HttpResponse) {
    if response.status != 200 {
        warn!(url, status = response.status, "request rejected");
    }
}
