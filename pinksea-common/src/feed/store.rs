use crate::{feed::query::FeedQuery, model::oekaki::Oekaki, tid::Tid};
use std::error::Error;

/// Read access to indexed oekaki posts and their tag relations.
pub trait OekakiStore {
    type Error: Error + Send + Sync + 'static;

    /// Materializes every post matching `query`, newest first, in a single read.
    fn fetch_feed(
        &self,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<Vec<Oekaki>, Self::Error>> + Send;

    /// Looks a single post up by its key. Dangling references resolve to `None`.
    fn fetch_oekaki(
        &self,
        tid: Tid,
    ) -> impl Future<Output = Result<Option<Oekaki>, Self::Error>> + Send;
}
