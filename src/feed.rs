//! Feed aggregation: turn repository reads into the list shown to a user.
//!
//! Ordering comes from the repository query; this module never re-sorts.
//! Changing the sort key means reloading. Search is a pure filter over the
//! loaded items and never touches the backend.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::MediaItem;
use crate::error::ShareResult;
use crate::repository::MediaRepository;

/// Feed ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Newest uploads first.
    #[default]
    Latest,
    /// Most viewed first.
    Popular,
    /// Most liked first.
    MostLiked,
}

impl SortKey {
    pub const ALL: [Self; 3] = [Self::Latest, Self::Popular, Self::MostLiked];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Popular => "popular",
            Self::MostLiked => "mostLiked",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Latest => "Latest",
            Self::Popular => "Popular",
            Self::MostLiked => "Most liked",
        }
    }

    /// Parse a query-string value, falling back to [`SortKey::Latest`].
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key '{}'", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "popular" => Ok(Self::Popular),
            "mostliked" | "most_liked" | "most-liked" => Ok(Self::MostLiked),
            _ => Err(UnknownSortKey(s.to_string())),
        }
    }
}

/// Keep items whose title, description or author name contains `query`,
/// ignoring case.
///
/// Surrounding whitespace in the query is ignored and an empty query keeps
/// everything. Order is preserved.
#[must_use]
pub fn apply_filter<'a>(items: &'a [MediaItem], query: &str) -> Vec<&'a MediaItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|item| {
            item.title.to_lowercase().contains(&needle)
                || item
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || item.author_name.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Drop repeated ids, keeping the first occurrence.
fn dedupe(items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Why a feed view has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// Nothing has been uploaded.
    NoData,
    /// Items exist but none match the search.
    NoMatch,
}

/// A loaded feed: repository items in query order, without duplicates.
#[derive(Debug, Clone)]
pub struct Feed {
    sort: SortKey,
    items: Vec<MediaItem>,
}

impl Feed {
    /// Load the feed from the repository.
    ///
    /// # Errors
    ///
    /// Propagates repository failures (connectivity, rejected query).
    pub async fn load<R>(repo: &R, sort: SortKey) -> ShareResult<Self>
    where
        R: MediaRepository + ?Sized,
    {
        let raw = repo.list_media(sort).await?;
        let fetched = raw.len();
        let items = dedupe(raw);
        debug!(
            sort = %sort,
            fetched,
            kept = items.len(),
            "Loaded feed"
        );
        Ok(Self { sort, items })
    }

    /// Switch sort order. Reloads from the repository unless the order is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Propagates repository failures; the current feed is left untouched.
    pub async fn reload_with<R>(&mut self, repo: &R, sort: SortKey) -> ShareResult<()>
    where
        R: MediaRepository + ?Sized,
    {
        if sort == self.sort {
            return Ok(());
        }
        *self = Self::load(repo, sort).await?;
        Ok(())
    }

    #[must_use]
    pub const fn sort(&self) -> SortKey {
        self.sort
    }

    #[must_use]
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Apply a search query.
    #[must_use]
    pub fn view<'a>(&'a self, query: &'a str) -> FeedView<'a> {
        FeedView {
            sort: self.sort,
            query,
            items: apply_filter(&self.items, query),
            total: self.items.len(),
        }
    }
}

/// What the presentation layer renders.
#[derive(Debug, Clone)]
pub struct FeedView<'a> {
    pub sort: SortKey,
    pub query: &'a str,
    pub items: Vec<&'a MediaItem>,
    /// Item count before filtering.
    pub total: usize,
}

impl FeedView<'_> {
    #[must_use]
    pub fn empty_reason(&self) -> Option<EmptyReason> {
        if !self.items.is_empty() {
            None
        } else if self.total == 0 {
            Some(EmptyReason::NoData)
        } else {
            Some(EmptyReason::NoMatch)
        }
    }
}
