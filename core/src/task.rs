//! Tasks and the stories attached to them.

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::client::Client;
use crate::envelope::{hydrate, Envelope, Expandable};
use crate::error::ApiError;
use crate::options::{NextPage, Options};
use crate::pagination::walk_pages;
use crate::story::{Story, StoryBase};
use crate::types::{Dates, ResourceRef};

/// The basic unit of work. Only the fields needed to host stories are
/// modeled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    envelope: Envelope,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<ResourceRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<ResourceRef>,

    #[serde(flatten)]
    pub dates: Dates,
}

impl Expandable for Task {
    const COLLECTION: &'static str = "tasks";

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}

impl Client {
    /// An unexpanded task handle with the given ID.
    pub fn task(&self, gid: impl Into<String>) -> Task {
        Task {
            envelope: Envelope::new(gid, self),
            ..Task::default()
        }
    }
}

impl Task {
    fn stories_path(&self) -> String {
        format!("{}/stories", self.path())
    }

    /// One page of the stories attached to this task.
    pub fn stories(&self, client: &Client, options: &[Options]) -> Result<(Vec<Story>, Option<NextPage>), ApiError> {
        trace!(task = %self.gid(), "listing stories");
        let (mut stories, next_page): (Vec<Story>, _) = client.get(&self.stories_path(), options)?;
        hydrate(client, &mut stories);
        Ok((stories, next_page))
    }

    /// Every story attached to this task, across all pages.
    pub fn all_stories(&self, client: &Client, options: &[Options]) -> Result<Vec<Story>, ApiError> {
        walk_pages(options, client.max_pages(), |page| self.stories(client, page))
    }

    /// Add a comment to this task.
    pub fn create_comment(&self, client: &Client, comment: &StoryBase) -> Result<Story, ApiError> {
        info!(task = %self.gid(), "creating comment");
        let mut story: Story = client.post(&self.stories_path(), comment)?;
        story.envelope_mut().attach(client);
        Ok(story)
    }
}
