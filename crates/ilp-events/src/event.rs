//! The decoded application payload: a Nostr-style tagged event.

use serde::{Deserialize, Serialize};

/// A single tag, e.g. `["e", "<event-id>"]` or `["p", "<pubkey>"]`.
pub type Tag = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NostrEvent {
    pub id: String,
    pub author: String,
    pub kind: i64,
    pub created_at: i64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub content: String,
}

impl NostrEvent {
    /// Values of tags named `name`, e.g. `tag_values("e")` for `#e` filters.
    pub fn tag_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.tags
            .iter()
            .filter(move |tag| tag.first().map(|t| t.as_str()) == Some(name))
            .filter_map(|tag| tag.get(1).map(|v| v.as_str()))
    }
}
