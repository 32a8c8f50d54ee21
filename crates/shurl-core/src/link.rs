use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque identifier of the user who created a link.
///
/// Identities are established by the transport layer. An empty id means
/// the caller has no identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A short link record.
///
/// Records are immutable once created; the only state change a record ever
/// sees is the tombstone transition, which the repository tracks outside
/// this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    /// The public short identifier.
    pub token: Token,
    /// The original URL the token resolves to.
    pub long_url: String,
    /// The user who created the link.
    pub created_by: UserId,
}

/// Parameters for creating a short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShortLink {
    /// The original URL to be shortened. Must be non-empty.
    pub long_url: String,
    /// The creating user.
    pub created_by: UserId,
}

impl NewShortLink {
    pub fn new(long_url: impl Into<String>, created_by: impl Into<UserId>) -> Self {
        Self {
            long_url: long_url.into(),
            created_by: created_by.into(),
        }
    }
}

/// An equality predicate over a single [`ShortLink`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFilter {
    /// Links created by the given user.
    CreatedBy(UserId),
    /// Links pointing at exactly the given URL.
    LongUrl(String),
}

impl LinkFilter {
    /// Builds a filter from a field name and a value.
    ///
    /// Returns `None` for field names that do not name a filterable field.
    pub fn from_field(field: &str, value: impl Into<String>) -> Option<Self> {
        match field {
            "created_by" | "createdBy" | "CreatedBy" => Some(Self::CreatedBy(UserId(value.into()))),
            "long_url" | "longURL" | "LongURL" => Some(Self::LongUrl(value.into())),
            _ => None,
        }
    }

    /// Returns the name of the field this filter compares.
    pub fn field(&self) -> &'static str {
        match self {
            LinkFilter::CreatedBy(_) => "created_by",
            LinkFilter::LongUrl(_) => "long_url",
        }
    }

    /// Returns the value this filter compares against.
    pub fn value(&self) -> &str {
        match self {
            LinkFilter::CreatedBy(user) => user.as_str(),
            LinkFilter::LongUrl(url) => url.as_str(),
        }
    }

    pub fn matches(&self, link: &ShortLink) -> bool {
        match self {
            LinkFilter::CreatedBy(user) => &link.created_by == user,
            LinkFilter::LongUrl(url) => &link.long_url == url,
        }
    }
}

/// Aggregate counts over the active links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Number of active links.
    pub urls: usize,
    /// Number of distinct users owning at least one active link.
    pub users: usize,
}

impl LinkStats {
    pub fn from_links<'a>(links: impl IntoIterator<Item = &'a ShortLink>) -> Self {
        let mut users = std::collections::HashSet::new();
        let mut urls = 0;
        for link in links {
            urls += 1;
            users.insert(&link.created_by);
        }
        Self {
            urls,
            users: users.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(token: &str, url: &str, user: &str) -> ShortLink {
        ShortLink {
            token: Token::new_unchecked(token),
            long_url: url.to_string(),
            created_by: UserId::from(user),
        }
    }

    #[test]
    fn filter_from_known_fields() {
        assert_eq!(
            LinkFilter::from_field("created_by", "u1"),
            Some(LinkFilter::CreatedBy(UserId::from("u1")))
        );
        assert_eq!(
            LinkFilter::from_field("createdBy", "u1"),
            Some(LinkFilter::CreatedBy(UserId::from("u1")))
        );
        assert_eq!(
            LinkFilter::from_field("longURL", "https://example.com"),
            Some(LinkFilter::LongUrl("https://example.com".to_string()))
        );
    }

    #[test]
    fn filter_from_unknown_field() {
        assert_eq!(LinkFilter::from_field("token", "abc"), None);
        assert_eq!(LinkFilter::from_field("", "abc"), None);
    }

    #[test]
    fn filter_matches_exactly() {
        let l = link("aaaaaaaa", "https://example.com", "u1");

        assert!(LinkFilter::CreatedBy("u1".into()).matches(&l));
        assert!(!LinkFilter::CreatedBy("U1".into()).matches(&l));
        assert!(LinkFilter::LongUrl("https://example.com".into()).matches(&l));
        assert!(!LinkFilter::LongUrl("https://example.com/".into()).matches(&l));
    }

    #[test]
    fn stats_count_distinct_users() {
        let links = vec![
            link("aaaaaaaa", "https://a.com", "u1"),
            link("aaaaaaab", "https://b.com", "u1"),
            link("aaaaaaac", "https://c.com", "u2"),
        ];

        let stats = LinkStats::from_links(&links);
        assert_eq!(stats, LinkStats { urls: 3, users: 2 });
        assert_eq!(LinkStats::from_links(&Vec::new()), LinkStats::default());
    }
}
