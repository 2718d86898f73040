use crate::{
    model::{author::Did, oekaki::Oekaki, tag::TagName},
    tid::Tid,
};
use thiserror::Error;
use time::UtcDateTime;

/// A predicate over an oekaki post.
///
/// Stores translate these into their own query language. [`OekakiFilter::matches`] is the
/// reference evaluation every store has to agree with.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum OekakiFilter {
    AuthorIs(Did),
    ParentIs(Tid),
    IsReply,
    IsTopLevel,
    /// `indexed_at` strictly before the given time.
    IndexedBefore(UtcDateTime),
    IndexedAtOrAfter(UtcDateTime),
    HasAltText,
    /// Some tag relation of the post names exactly this tag.
    HasTag(TagName),
    Not(Box<OekakiFilter>),
    /// True if any of the inner filters is. An empty list is false.
    Any(Vec<OekakiFilter>),
}

impl OekakiFilter {
    /// Evaluates the filter. `has_tag` answers whether a relation between the post and the
    /// tag exists.
    pub fn matches<F>(&self, oekaki: &Oekaki, has_tag: &F) -> bool
    where
        F: Fn(Tid, &TagName) -> bool,
    {
        match self {
            OekakiFilter::AuthorIs(did) => oekaki.author_did == *did,
            OekakiFilter::ParentIs(parent) => oekaki.is_reply_to(*parent),
            OekakiFilter::IsReply => oekaki.is_reply(),
            OekakiFilter::IsTopLevel => !oekaki.is_reply(),
            OekakiFilter::IndexedBefore(time) => oekaki.indexed_at < *time,
            OekakiFilter::IndexedAtOrAfter(time) => oekaki.indexed_at >= *time,
            OekakiFilter::HasAltText => oekaki.alt_text.is_some(),
            OekakiFilter::HasTag(tag) => has_tag(oekaki.tid, tag),
            OekakiFilter::Not(inner) => !inner.matches(oekaki, has_tag),
            OekakiFilter::Any(filters) => filters.iter().any(|f| f.matches(oekaki, has_tag)),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        OekakiFilter::Not(Box::new(self))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A feed limit cannot be negative: {0}")]
pub struct InvalidLimitError(i64);

impl InvalidLimitError {
    /// Checks a signed row count coming from outside.
    pub fn check(count: i64) -> Result<usize, Self> {
        usize::try_from(count).map_err(|_| Self(count))
    }

    #[must_use]
    pub fn count(self) -> i64 {
        self.0
    }
}

/// The accumulated description of a feed read.
///
/// Results are always ordered by `indexed_at` descending, ties broken by TID descending.
/// All filters must hold for a post to be included, and the limit applies after ordering
/// and filtering.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FeedQuery {
    filters: Vec<OekakiFilter>,
    limit: Option<usize>,
}

impl FeedQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filters(&self) -> &[OekakiFilter] {
        &self.filters
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn push_filter(&mut self, filter: OekakiFilter) {
        self.filters.push(filter);
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    pub fn matches<F>(&self, oekaki: &Oekaki, has_tag: &F) -> bool
    where
        F: Fn(Tid, &TagName) -> bool,
    {
        self.filters.iter().all(|f| f.matches(oekaki, has_tag))
    }
}
