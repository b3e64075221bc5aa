//! Stories: the activity history of a task.
//!
//! # Design
//! The API sends every story as one flat object. Which of the many
//! "what changed" fields are present depends on `resource_subtype`. Here the
//! subtype becomes [`StoryDetail`], one variant per subtype carrying only the
//! fields that subtype can have. The flat wire shape lives in a private
//! `StoryWire` struct that `Story` converts from and into, so decoding picks
//! out the relevant fields for the discriminator and ignores the rest, and
//! encoding writes only the fields of the active variant. The client does no
//! cross-field validation beyond that.
//!
//! Stories are history: apart from the comment text and pin state in
//! [`StoryBase`], nothing about a story can be changed after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::client::Client;
use crate::envelope::{Envelope, Expandable};
use crate::error::ApiError;
use crate::types::{Dates, EnumValue, ResourceRef};

/// The user-editable part of a story. Used as the body when creating a
/// comment or updating a story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryBase {
    /// Plain text. Editable only on comments.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// Rich text. Only returned when requested via `opt_fields`. Send at
    /// most one of `text` and `html_text`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_text: String,

    /// Pin state. Only comment and attachment stories can be pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

/// What a story records, keyed by its `resource_subtype`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryDetail {
    CommentAdded {
        is_edited: bool,
    },
    NameChanged {
        old_name: Option<String>,
        new_name: Option<String>,
    },
    DueDateChanged {
        old_dates: Option<Dates>,
        new_dates: Option<Dates>,
    },
    DependencyDueDateChanged {
        dependency: Option<ResourceRef>,
        new_dates: Option<Dates>,
    },
    ResourceSubtypeChanged {
        old_resource_subtype: Option<String>,
        new_resource_subtype: Option<String>,
    },
    CommentLiked {
        story: Option<Box<Story>>,
    },
    CompletionLiked {
        story: Option<Box<Story>>,
    },
    AttachmentLiked {
        attachment: Option<ResourceRef>,
    },
    Assigned {
        assignee: Option<ResourceRef>,
    },
    FollowerAdded {
        follower: Option<ResourceRef>,
    },
    SectionChanged {
        old_section: Option<ResourceRef>,
        new_section: Option<ResourceRef>,
    },
    AddedToTask {
        task: Option<ResourceRef>,
    },
    RemovedFromTask {
        task: Option<ResourceRef>,
    },
    AddedToProject {
        project: Option<ResourceRef>,
    },
    RemovedFromProject {
        project: Option<ResourceRef>,
    },
    AddedToTag {
        tag: Option<ResourceRef>,
    },
    RemovedFromTag {
        tag: Option<ResourceRef>,
    },
    TextCustomFieldChanged {
        old_text_value: Option<String>,
        new_text_value: Option<String>,
    },
    NumberCustomFieldChanged {
        old_number_value: Option<f64>,
        new_number_value: Option<f64>,
    },
    EnumCustomFieldChanged {
        old_enum_value: Option<EnumValue>,
        new_enum_value: Option<EnumValue>,
    },
    DuplicateMerged {
        duplicate_of: Option<ResourceRef>,
    },
    MarkedDuplicate {
        duplicate_of: Option<ResourceRef>,
    },
    DuplicateUnmerged {
        duplicate_of: Option<ResourceRef>,
    },
    Duplicated {
        duplicated_from: Option<ResourceRef>,
    },
    DependencyAdded {
        dependency: Option<ResourceRef>,
    },
    DependencyRemoved {
        dependency: Option<ResourceRef>,
    },
    DependencyMarkedComplete {
        dependency: Option<ResourceRef>,
    },
    DependencyMarkedIncomplete {
        dependency: Option<ResourceRef>,
    },
    /// A subtype without extra fields (e.g. `marked_complete`) or one this
    /// client does not know. Holds the raw discriminator; empty when the
    /// server sent none.
    Other(String),
}

impl Default for StoryDetail {
    fn default() -> Self {
        StoryDetail::Other(String::new())
    }
}

impl StoryDetail {
    /// The wire discriminator for this variant.
    pub fn subtype(&self) -> &str {
        use StoryDetail::*;
        match self {
            CommentAdded { .. } => "comment_added",
            NameChanged { .. } => "name_changed",
            DueDateChanged { .. } => "due_date_changed",
            DependencyDueDateChanged { .. } => "dependency_due_date_changed",
            ResourceSubtypeChanged { .. } => "resource_subtype_changed",
            CommentLiked { .. } => "comment_liked",
            CompletionLiked { .. } => "completion_liked",
            AttachmentLiked { .. } => "attachment_liked",
            Assigned { .. } => "assigned",
            FollowerAdded { .. } => "follower_added",
            SectionChanged { .. } => "section_changed",
            AddedToTask { .. } => "added_to_task",
            RemovedFromTask { .. } => "removed_from_task",
            AddedToProject { .. } => "added_to_project",
            RemovedFromProject { .. } => "removed_from_project",
            AddedToTag { .. } => "added_to_tag",
            RemovedFromTag { .. } => "removed_from_tag",
            TextCustomFieldChanged { .. } => "text_custom_field_changed",
            NumberCustomFieldChanged { .. } => "number_custom_field_changed",
            EnumCustomFieldChanged { .. } => "enum_custom_field_changed",
            DuplicateMerged { .. } => "duplicate_merged",
            MarkedDuplicate { .. } => "marked_duplicate",
            DuplicateUnmerged { .. } => "duplicate_unmerged",
            Duplicated { .. } => "duplicated",
            DependencyAdded { .. } => "dependency_added",
            DependencyRemoved { .. } => "dependency_removed",
            DependencyMarkedComplete { .. } => "dependency_marked_complete",
            DependencyMarkedIncomplete { .. } => "dependency_marked_incomplete",
            Other(subtype) => subtype.as_str(),
        }
    }
}

/// An activity record on a task. Comments are user-written stories; all
/// other subtypes are generated by the system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoryWire", into = "StoryWire")]
pub struct Story {
    envelope: Envelope,
    pub base: StoryBase,
    pub created_at: Option<DateTime<Utc>>,
    /// Whether the authorized user liked this story.
    pub liked: bool,
    pub likes: Vec<ResourceRef>,
    pub num_likes: u32,
    pub created_by: Option<ResourceRef>,
    /// The object this story is attached to. Currently always a task.
    pub target: Option<ResourceRef>,
    /// Product surface that triggered the story, e.g. `web` or `api`.
    pub source: String,
    pub detail: StoryDetail,
}

impl Expandable for Story {
    const COLLECTION: &'static str = "stories";

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}

impl Story {
    pub fn resource_subtype(&self) -> &str {
        self.detail.subtype()
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.detail, StoryDetail::CommentAdded { .. })
    }

    /// Update the text or pin state and return the full updated record.
    /// Only comments can have their text changed; only comments and
    /// attachment stories can be pinned. The server enforces both.
    pub fn update(&self, client: &Client, changes: &StoryBase) -> Result<Story, ApiError> {
        info!(story = %self.gid(), "updating story");
        let mut story: Story = client.put(&self.path(), changes)?;
        story.envelope_mut().attach(client);
        Ok(story)
    }

    /// Delete the story. The handle is consumed: a deleted story cannot be
    /// used again.
    pub fn delete(self, client: &Client) -> Result<(), ApiError> {
        trace!(story = %self.gid(), subtype = self.resource_subtype(), "deleting story");
        client.delete(&self.path())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// The flat wire shape: every subtype field side by side, all optional.
#[derive(Default, Serialize, Deserialize)]
struct StoryWire {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(flatten)]
    base: StoryBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "is_false")]
    liked: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    likes: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "is_zero")]
    num_likes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_by: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    resource_subtype: String,

    #[serde(default, skip_serializing_if = "is_false")]
    is_edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_dates: Option<Dates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_dates: Option<Dates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_resource_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_resource_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    story: Option<Box<Story>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attachment: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    follower: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_section: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_section: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_number_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_number_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_enum_value: Option<EnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_enum_value: Option<EnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duplicate_of: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duplicated_from: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dependency: Option<ResourceRef>,
}

impl From<StoryWire> for Story {
    fn from(w: StoryWire) -> Self {
        use StoryDetail::*;
        let detail = match w.resource_subtype.as_str() {
            "comment_added" => CommentAdded { is_edited: w.is_edited },
            "name_changed" => NameChanged {
                old_name: w.old_name,
                new_name: w.new_name,
            },
            "due_date_changed" => DueDateChanged {
                old_dates: w.old_dates,
                new_dates: w.new_dates,
            },
            "dependency_due_date_changed" => DependencyDueDateChanged {
                dependency: w.dependency,
                new_dates: w.new_dates,
            },
            "resource_subtype_changed" => ResourceSubtypeChanged {
                old_resource_subtype: w.old_resource_subtype,
                new_resource_subtype: w.new_resource_subtype,
            },
            "comment_liked" => CommentLiked { story: w.story },
            "completion_liked" => CompletionLiked { story: w.story },
            "attachment_liked" => AttachmentLiked { attachment: w.attachment },
            "assigned" => Assigned { assignee: w.assignee },
            "follower_added" => FollowerAdded { follower: w.follower },
            "section_changed" => SectionChanged {
                old_section: w.old_section,
                new_section: w.new_section,
            },
            "added_to_task" => AddedToTask { task: w.task },
            "removed_from_task" => RemovedFromTask { task: w.task },
            "added_to_project" => AddedToProject { project: w.project },
            "removed_from_project" => RemovedFromProject { project: w.project },
            "added_to_tag" => AddedToTag { tag: w.tag },
            "removed_from_tag" => RemovedFromTag { tag: w.tag },
            "text_custom_field_changed" => TextCustomFieldChanged {
                old_text_value: w.old_text_value,
                new_text_value: w.new_text_value,
            },
            "number_custom_field_changed" => NumberCustomFieldChanged {
                old_number_value: w.old_number_value,
                new_number_value: w.new_number_value,
            },
            "enum_custom_field_changed" => EnumCustomFieldChanged {
                old_enum_value: w.old_enum_value,
                new_enum_value: w.new_enum_value,
            },
            "duplicate_merged" => DuplicateMerged { duplicate_of: w.duplicate_of },
            "marked_duplicate" => MarkedDuplicate { duplicate_of: w.duplicate_of },
            "duplicate_unmerged" => DuplicateUnmerged { duplicate_of: w.duplicate_of },
            "duplicated" => Duplicated {
                duplicated_from: w.duplicated_from,
            },
            "dependency_added" => DependencyAdded { dependency: w.dependency },
            "dependency_removed" => DependencyRemoved { dependency: w.dependency },
            "dependency_marked_complete" => DependencyMarkedComplete { dependency: w.dependency },
            "dependency_marked_incomplete" => DependencyMarkedIncomplete { dependency: w.dependency },
            other => Other(other.to_string()),
        };

        Story {
            envelope: w.envelope,
            base: w.base,
            created_at: w.created_at,
            liked: w.liked,
            likes: w.likes,
            num_likes: w.num_likes,
            created_by: w.created_by,
            target: w.target,
            source: w.source,
            detail,
        }
    }
}

impl From<Story> for StoryWire {
    fn from(s: Story) -> Self {
        use StoryDetail::*;
        let mut w = StoryWire {
            resource_subtype: s.detail.subtype().to_string(),
            envelope: s.envelope,
            base: s.base,
            created_at: s.created_at,
            liked: s.liked,
            likes: s.likes,
            num_likes: s.num_likes,
            created_by: s.created_by,
            target: s.target,
            source: s.source,
            ..StoryWire::default()
        };

        match s.detail {
            CommentAdded { is_edited } => w.is_edited = is_edited,
            NameChanged { old_name, new_name } => {
                w.old_name = old_name;
                w.new_name = new_name;
            }
            DueDateChanged { old_dates, new_dates } => {
                w.old_dates = old_dates;
                w.new_dates = new_dates;
            }
            DependencyDueDateChanged { dependency, new_dates } => {
                w.dependency = dependency;
                w.new_dates = new_dates;
            }
            ResourceSubtypeChanged {
                old_resource_subtype,
                new_resource_subtype,
            } => {
                w.old_resource_subtype = old_resource_subtype;
                w.new_resource_subtype = new_resource_subtype;
            }
            CommentLiked { story } | CompletionLiked { story } => w.story = story,
            AttachmentLiked { attachment } => w.attachment = attachment,
            Assigned { assignee } => w.assignee = assignee,
            FollowerAdded { follower } => w.follower = follower,
            SectionChanged { old_section, new_section } => {
                w.old_section = old_section;
                w.new_section = new_section;
            }
            AddedToTask { task } | RemovedFromTask { task } => w.task = task,
            AddedToProject { project } | RemovedFromProject { project } => w.project = project,
            AddedToTag { tag } | RemovedFromTag { tag } => w.tag = tag,
            TextCustomFieldChanged {
                old_text_value,
                new_text_value,
            } => {
                w.old_text_value = old_text_value;
                w.new_text_value = new_text_value;
            }
            NumberCustomFieldChanged {
                old_number_value,
                new_number_value,
            } => {
                w.old_number_value = old_number_value;
                w.new_number_value = new_number_value;
            }
            EnumCustomFieldChanged {
                old_enum_value,
                new_enum_value,
            } => {
                w.old_enum_value = old_enum_value;
                w.new_enum_value = new_enum_value;
            }
            DuplicateMerged { duplicate_of } | MarkedDuplicate { duplicate_of } | DuplicateUnmerged { duplicate_of } => {
                w.duplicate_of = duplicate_of
            }
            Duplicated { duplicated_from } => w.duplicated_from = duplicated_from,
            DependencyAdded { dependency }
            | DependencyRemoved { dependency }
            | DependencyMarkedComplete { dependency }
            | DependencyMarkedIncomplete { dependency } => w.dependency = dependency,
            Other(_) => {}
        }
        w
    }
}
