use crate::{
    feed::{
        query::{FeedQuery, InvalidLimitError, OekakiFilter},
        resolver::HandleResolver,
        store::OekakiStore,
    },
    model::{
        author::{Did, Handle, INVALID_HANDLE},
        dto::OekakiDto,
        oekaki::Oekaki,
        tag::TagName,
    },
};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use time::UtcDateTime;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FeedError<E> {
    #[error("Reading the feed from the store failed: {0}")]
    Store(#[source] E),
}

/// Composes a feed query and runs it.
///
/// Configuration never touches the store. Only [`FeedBuilder::get_feed`] does I/O, and it
/// borrows the builder, so a builder can be refined and executed again.
pub struct FeedBuilder<'a, S, R> {
    store: &'a S,
    resolver: &'a R,
    query: FeedQuery,
}

impl<'a, S, R> FeedBuilder<'a, S, R> {
    /// A builder over all posts, newest first.
    #[must_use]
    pub fn new(store: &'a S, resolver: &'a R) -> Self {
        Self {
            store,
            resolver,
            query: FeedQuery::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: OekakiFilter) -> Self {
        self.query.push_filter(filter);
        self
    }

    /// Only posts related to exactly this tag.
    #[must_use]
    pub fn with_tag(self, tag: TagName) -> Self {
        self.filter(OekakiFilter::HasTag(tag))
    }

    /// Only posts indexed strictly before `since`.
    ///
    /// This pages backwards: pass the `indexed_at` of the oldest post already seen.
    #[must_use]
    pub fn since(self, since: UtcDateTime) -> Self {
        self.filter(OekakiFilter::IndexedBefore(since))
    }

    /// At most `count` posts. A later call replaces an earlier one.
    #[must_use]
    pub fn limit(mut self, count: usize) -> Self {
        self.query.set_limit(count);
        self
    }

    pub fn try_limit(self, count: i64) -> Result<Self, InvalidLimitError> {
        Ok(self.limit(InvalidLimitError::check(count)?))
    }

    #[must_use]
    pub fn query(&self) -> &FeedQuery {
        &self.query
    }
}

impl<S, R> FeedBuilder<'_, S, R>
where
    S: OekakiStore + Sync,
    R: HandleResolver + Sync,
{
    /// Reads the matching posts and resolves their authors' handles.
    ///
    /// Every distinct author is resolved once. Authors that fail to resolve get
    /// [`INVALID_HANDLE`]; only a failing store read fails the feed.
    pub async fn get_feed(&self) -> Result<Vec<OekakiDto>, FeedError<S::Error>> {
        let oekaki = self
            .store
            .fetch_feed(&self.query)
            .await
            .map_err(FeedError::Store)?;

        let handles = self.resolve_handles(&oekaki).await;

        let feed: Vec<OekakiDto> = oekaki
            .iter()
            .map(|oekaki| {
                OekakiDto::from_oekaki(oekaki, display_handle(handles.get(&oekaki.author_did)))
            })
            .collect();

        debug!(
            posts = feed.len(),
            authors = handles.len(),
            "Assembled feed"
        );
        Ok(feed)
    }

    async fn resolve_handles(&self, oekaki: &[Oekaki]) -> HashMap<Did, Handle> {
        let authors: HashSet<&Did> = oekaki.iter().map(|oekaki| &oekaki.author_did).collect();

        let resolutions = authors.into_iter().map(|did| async move {
            resolve_author(self.resolver, did)
                .await
                .map(|handle| (did.clone(), handle))
        });

        join_all(resolutions).await.into_iter().flatten().collect()
    }
}

/// Resolves one author's handle. Failures and authors without a handle are logged and
/// give `None`.
pub async fn resolve_author<R: HandleResolver>(resolver: &R, did: &Did) -> Option<Handle> {
    match resolver.resolve_handle(did).await {
        Ok(Some(handle)) => Some(handle),
        Ok(None) => {
            warn!(%did, "Author has no handle");
            None
        }
        Err(error) => {
            warn!(%did, %error, "Resolving author handle failed");
            None
        }
    }
}

/// Maps a single post outside of a feed, with the same handle fallback as
/// [`FeedBuilder::get_feed`].
pub async fn resolve_oekaki<R: HandleResolver>(resolver: &R, oekaki: &Oekaki) -> OekakiDto {
    let handle = resolve_author(resolver, &oekaki.author_did).await;

    OekakiDto::from_oekaki(oekaki, display_handle(handle.as_ref()))
}

fn display_handle(handle: Option<&Handle>) -> &str {
    handle.map_or(INVALID_HANDLE, Handle::get)
}
