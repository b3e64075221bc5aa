//! Workspaces: the top-level organizational unit. Every project and task
//! belongs to exactly one workspace. An organization is a workspace that
//! represents a company.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::client::Client;
use crate::envelope::{hydrate, Envelope, Expandable};
use crate::error::ApiError;
use crate::options::{NextPage, Options};
use crate::pagination::walk_pages;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(flatten)]
    envelope: Envelope,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub is_organization: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_domains: Vec<String>,
}

impl Expandable for Workspace {
    const COLLECTION: &'static str = "workspaces";

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}

impl Client {
    /// An unexpanded workspace handle with the given ID.
    pub fn workspace(&self, gid: impl Into<String>) -> Workspace {
        Workspace {
            envelope: Envelope::new(gid, self),
            ..Workspace::default()
        }
    }

    /// One page of the workspaces visible to the authorized account.
    pub fn workspaces(&self, options: &[Options]) -> Result<(Vec<Workspace>, Option<NextPage>), ApiError> {
        trace!("listing workspaces");
        let (mut workspaces, next_page): (Vec<Workspace>, _) = self.get("/workspaces", options)?;
        hydrate(self, &mut workspaces);
        Ok((workspaces, next_page))
    }

    /// Every workspace visible to the authorized account, across all pages.
    pub fn all_workspaces(&self, options: &[Options]) -> Result<Vec<Workspace>, ApiError> {
        walk_pages(options, self.max_pages(), |page| self.workspaces(page))
    }
}
