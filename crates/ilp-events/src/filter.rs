//! Nostr-style event filters: every populated field is a conjunctive
//! constraint, an empty filter matches everything.

use serde::{Deserialize, Serialize};

use crate::event::NostrEvent;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<i64>,
    #[serde(rename = "#e", default, skip_serializing_if = "Option::is_none")]
    pub e_tags: Option<Vec<String>>,
    #[serde(rename = "#p", default, skip_serializing_if = "Option::is_none")]
    pub p_tags: Option<Vec<String>>,
}

impl Filter {
    pub fn matches(&self, event: &NostrEvent) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &event.id) {
                return false;
            }
        }
        if let Some(authors) = &self.authors {
            if !authors.iter().any(|a| a == &event.author) {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.created_at > until {
                return false;
            }
        }
        if let Some(e_tags) = &self.e_tags {
            if !event.tag_values("e").any(|v| e_tags.iter().any(|want| want == v)) {
                return false;
            }
        }
        if let Some(p_tags) = &self.p_tags {
            if !event.tag_values("p").any(|v| p_tags.iter().any(|want| want == v)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> NostrEvent {
        NostrEvent {
            id: "id-1".to_string(),
            author: "author-1".to_string(),
            kind: 1,
            created_at: 1000,
            tags: vec![
                vec!["e".to_string(), "evt-ref".to_string()],
                vec!["p".to_string(), "pubkey-ref".to_string()],
            ],
            content: "hi".to_string(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::default().matches(&event()));
    }

    #[test]
    fn author_mismatch_excludes() {
        let filter = Filter {
            authors: Some(vec!["someone-else".to_string()]),
            ..Default::default()
        };
        assert!(!filter.matches(&event()));
    }

    #[test]
    fn predicates_are_conjunctive() {
        let filter = Filter {
            authors: Some(vec!["author-1".to_string()]),
            kinds: Some(vec![2]),
            ..Default::default()
        };
        assert!(!filter.matches(&event()));
    }

    #[test]
    fn tag_filter_matches_if_any_value_present() {
        let filter = Filter {
            e_tags: Some(vec!["evt-ref".to_string(), "unrelated".to_string()]),
            ..Default::default()
        };
        assert!(filter.matches(&event()));
    }

    #[test]
    fn since_until_bound_created_at() {
        let filter = Filter {
            since: Some(1001),
            ..Default::default()
        };
        assert!(!filter.matches(&event()));
    }
}
