//! Synchronous, typed client for an Asana-style project-management API.
//!
//! # Overview
//! Resources (workspaces, tasks, stories) are plain structs that mirror the
//! API's JSON. A resource is either a bare handle holding only an ID, or a
//! fully hydrated record decoded from a response. Bare handles load the rest
//! of their fields on demand through [`Expandable::expand`]. Collections are
//! fetched one page at a time, or all at once through the `all_*` methods
//! built on [`walk_pages`].
//!
//! # Design
//! - [`Client`] is a cheap, clonable handle around one [`Transport`]. It
//!   builds `HttpRequest` values and parses `HttpResponse` values; the
//!   transport does the round-trip. [`UreqTransport`] is the default.
//! - Resources hold a weak link to the client they came from and never keep
//!   it alive. Story operations take the client explicitly.
//! - Every call blocks, nothing retries, and the first error is returned
//!   unchanged.
//!
//! ```no_run
//! use asana_core::{Client, ClientConfig, Expandable, Options};
//!
//! let client = Client::new(ClientConfig::from_env()?)?;
//! for workspace in client.all_workspaces(&[Options::fields(["name"])])? {
//!     println!("{} {}", workspace.gid(), workspace.name);
//! }
//!
//! let mut task = client.task("1204");
//! task.expand()?;
//! for story in task.all_stories(&client, &[])? {
//!     println!("{}: {}", story.resource_subtype(), story.base.text);
//! }
//! # Ok::<(), asana_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod options;
pub mod pagination;
pub mod story;
pub mod task;
pub mod transport;
pub mod types;
pub mod workspace;

pub use client::Client;
pub use config::ClientConfig;
pub use envelope::{Envelope, Expandable, LoadState};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::{NextPage, Options};
pub use pagination::{walk_pages, PAGE_SIZE};
pub use story::{Story, StoryBase, StoryDetail};
pub use task::Task;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{Dates, EnumValue, ResourceRef};
pub use workspace::Workspace;
