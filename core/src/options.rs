//! Per-call request options and the pagination cursor.
//!
//! # Design
//! Every listing and fetch accepts a slice of `Options`. The slice is merged
//! field by field with a "first non-empty value wins" rule, which lets the
//! pagination walker prepend its own limit/offset while the caller's field
//! selection survives. Options are plain values: merging builds a new one and
//! never mutates the inputs.

use serde::{Deserialize, Serialize};

/// Request options encoded into the URL query string.
///
/// Empty values (`None`, `""`, empty lists, `false`) mean "not set" and are
/// omitted from the query. A `limit` of zero is treated as not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Page size cap (`limit`).
    pub limit: Option<u32>,
    /// Opaque continuation token (`offset`); empty means "start".
    pub offset: String,
    /// Field selection (`opt_fields`).
    pub fields: Vec<String>,
    /// Compact references to expand in full (`opt_expand`).
    pub expand: Vec<String>,
    /// Ask the server for indented JSON (`opt_pretty`).
    pub pretty: bool,
}

impl Options {
    /// Options selecting one page.
    pub fn page(limit: u32, offset: impl Into<String>) -> Self {
        Self {
            limit: Some(limit),
            offset: offset.into(),
            ..Self::default()
        }
    }

    /// Options selecting only the given fields.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_expand<I, S>(mut self, expand: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand = expand.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn limit(&self) -> Option<u32> {
        self.limit.filter(|n| *n > 0)
    }

    /// Merge a list of options into one. For each field the first non-empty
    /// value in list order wins; later values only fill gaps.
    pub fn merge(options: &[Options]) -> Options {
        let mut merged = Options::default();
        for o in options {
            if merged.limit().is_none() {
                merged.limit = o.limit();
            }
            if merged.offset.is_empty() {
                merged.offset.clone_from(&o.offset);
            }
            if merged.fields.is_empty() {
                merged.fields.clone_from(&o.fields);
            }
            if merged.expand.is_empty() {
                merged.expand.clone_from(&o.expand);
            }
            merged.pretty |= o.pretty;
        }
        merged
    }

    /// Query parameters for the set fields, unencoded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.pretty {
            pairs.push(("opt_pretty", "true".to_string()));
        }
        if !self.fields.is_empty() {
            pairs.push(("opt_fields", self.fields.join(",")));
        }
        if !self.expand.is_empty() {
            pairs.push(("opt_expand", self.expand.join(",")));
        }
        if let Some(limit) = self.limit() {
            pairs.push(("limit", limit.to_string()));
        }
        if !self.offset.is_empty() {
            pairs.push(("offset", self.offset.clone()));
        }
        pairs
    }

    /// Percent-encoded query string without the leading `?`.
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Cursor returned alongside a collection page. Its presence means more
/// pages remain; `offset` is passed back to fetch the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPage {
    pub offset: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_offset_in_list_wins() {
        let caller = Options {
            offset: "x".into(),
            ..Options::default()
        };
        let walker = Options::page(100, "y");

        let merged = Options::merge(&[walker.clone(), caller.clone()]);
        assert_eq!(merged.offset, "y");

        let merged = Options::merge(&[caller, walker]);
        assert_eq!(merged.offset, "x");
        assert_eq!(merged.limit, Some(100));
    }

    #[test]
    fn later_options_fill_gaps() {
        let merged = Options::merge(&[
            Options::page(100, ""),
            Options::fields(["name", "is_organization"]),
        ]);
        assert_eq!(merged.limit, Some(100));
        assert_eq!(merged.offset, "");
        assert_eq!(merged.fields, vec!["name", "is_organization"]);
    }

    #[test]
    fn merge_does_not_touch_inputs() {
        let caller = Options::fields(["name"]);
        let inputs = vec![Options::page(100, "abc"), caller.clone()];
        let _ = Options::merge(&inputs);
        assert_eq!(inputs[1], caller);
    }

    #[test]
    fn zero_limit_counts_as_unset() {
        let merged = Options::merge(&[Options::page(0, ""), Options::page(25, "")]);
        assert_eq!(merged.limit, Some(25));
    }

    #[test]
    fn query_string_encodes_values() {
        let opts = Options {
            fields: vec!["name".into(), "email_domains".into()],
            offset: "eyJ0eXAi OiJKV1Qi".into(),
            limit: Some(50),
            ..Options::default()
        }
        .with_pretty();
        assert_eq!(
            opts.query_string(),
            "opt_pretty=true&opt_fields=name%2Cemail_domains&limit=50&offset=eyJ0eXAi%20OiJKV1Qi"
        );
    }

    #[test]
    fn empty_options_produce_empty_query() {
        assert_eq!(Options::default().query_string(), "");
    }

    #[test]
    fn next_page_tolerates_missing_path_and_uri() {
        let page: NextPage = serde_json::from_str(r#"{"offset":"abc"}"#).unwrap();
        assert_eq!(page.offset, "abc");
        assert!(page.path.is_empty());
    }
}
