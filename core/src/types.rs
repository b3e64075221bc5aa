//! Compact records embedded in other resources.
//!
//! These are what the API returns when it references a user, project, tag,
//! section, attachment or task from inside another object: an ID plus a
//! display name. They are plain data with no client link.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Compact reference to another resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl ResourceRef {
    pub fn new(gid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            name: Some(name.into()),
            resource_type: None,
        }
    }
}

/// One option of an enum custom field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub gid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn enabled() -> bool {
    true
}

/// Due and start dates of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_on: Option<NaiveDate>,
}

impl Dates {
    pub fn is_empty(&self) -> bool {
        self.due_on.is_none() && self.due_at.is_none() && self.start_on.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_ref_tolerates_bare_gid() {
        let r: ResourceRef = serde_json::from_str(r#"{"gid":"12"}"#).unwrap();
        assert_eq!(r.gid, "12");
        assert!(r.name.is_none());
    }

    #[test]
    fn dates_parse_iso_formats() {
        let d: Dates = serde_json::from_str(
            r#"{"due_on":"2024-03-01","due_at":"2024-03-01T17:00:00Z","start_on":"2024-02-20"}"#,
        )
        .unwrap();
        assert_eq!(d.due_on, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(d.start_on, NaiveDate::from_ymd_opt(2024, 2, 20));
        assert!(d.due_at.is_some());
        assert!(!d.is_empty());
    }

    #[test]
    fn enum_value_defaults_to_enabled() {
        let v: EnumValue = serde_json::from_str(r#"{"gid":"3","name":"High"}"#).unwrap();
        assert!(v.enabled);
    }
}
