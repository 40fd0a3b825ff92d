//! Synchronous client core for the Jenkins XML API.
//!
//! # Overview
//! Reads folder listings (`api/xml`) and reads or rewrites job
//! configurations (`config.xml`). Responses are parsed into an in-memory
//! `Document` that callers patch in place and send back.
//!
//! # Design
//! - `JenkinsClient` holds only its `ClientConfig`. Each operation is split
//!   into `build_*` (produces a request) and `parse_*` (consumes a response);
//!   a `Transport` executes the round-trip in between.
//! - `Document` is an index-addressed arena. Parent and sibling links are
//!   `NodeId`s, so edits are in-place index rewrites.
//! - Serialization always writes the single-quoted declaration Jenkins
//!   emits itself and keeps text-only elements on one line.
//!
//! ```no_run
//! use jenkins_core::{ClientConfig, JenkinsClient, UreqTransport};
//!
//! # fn main() -> Result<(), jenkins_core::ApiError> {
//! let client = JenkinsClient::new(ClientConfig::new("https://ci.example.com", "bot", "api-token"))?;
//! let transport = UreqTransport::new();
//!
//! for job in client.get_projects(&transport, "/job/team/")? {
//!     let mut config = client.get_config(&transport, &job)?;
//!     if let Some(project) = config.root_element() {
//!         config.set_element_text(project, "disabled", "true")?;
//!     }
//!     client.send_config(&transport, &job, &config)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod serialize;
pub mod tree;
pub mod types;
pub mod xml;

pub use client::JenkinsClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, XmlError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{FolderListing, JobClass, JobEntry};
pub use xml::{Attribute, Document, Element, Node, NodeId, NodeKind, QualifiedName};
