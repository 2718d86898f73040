//! The PostgreSQL backed store.
//!
//! Expects the tables written by ingestion:
//! `oekaki.oekaki (tid, author_did, indexed_at, record_cid, blob_cid, alt_text, parent_id)`,
//! `oekaki.tag_oekaki_relations (oekaki_tid, tag_name)` and `oekaki.authors (did, handle)`.

use crate::{
    query::{SELECT_OEKAKI, feed_statement},
    record::{AuthorRecord, OekakiRecord, valid_oekaki},
};
use pinksea_common::{
    feed::{query::FeedQuery, resolver::HandleResolver, store::OekakiStore},
    model::{
        ModelValidationError,
        author::{Author, Did, Handle},
        oekaki::Oekaki,
    },
    tid::Tid,
};
use sqlx::{PgPool, QueryBuilder, query_as};
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_feed(&self, query: &FeedQuery) -> Result<Vec<Oekaki>> {
        let mut statement = feed_statement(query);
        debug!(sql = statement.sql(), "Fetching feed");

        let records: Vec<OekakiRecord> = statement
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(valid_oekaki(records))
    }

    pub async fn fetch_oekaki(&self, tid: Tid) -> Result<Option<Oekaki>> {
        let mut statement = QueryBuilder::new(SELECT_OEKAKI);
        statement.push(" WHERE o.tid = ").push_bind(tid.to_string());

        let record: Option<OekakiRecord> = statement
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        let oekaki = record.map(Oekaki::try_from).transpose()?;
        Ok(oekaki)
    }

    pub async fn fetch_author(&self, did: &Did) -> Result<Option<Author>> {
        let record = query_as::<_, AuthorRecord>(
            "
            SELECT
                authors.did,
                authors.handle
            FROM
                oekaki.authors
            WHERE
                authors.did = $1
            ",
        )
        .bind(did.get())
        .fetch_optional(&self.pool)
        .await?;

        let author = record.map(Author::try_from).transpose()?;
        Ok(author)
    }
}

impl OekakiStore for DbClient {
    type Error = DbError;

    async fn fetch_feed(&self, query: &FeedQuery) -> Result<Vec<Oekaki>> {
        DbClient::fetch_feed(self, query).await
    }

    async fn fetch_oekaki(&self, tid: Tid) -> Result<Option<Oekaki>> {
        DbClient::fetch_oekaki(self, tid).await
    }
}

/// Resolves handles from the `authors` table, which ingestion keeps up to date.
impl HandleResolver for DbClient {
    type Error = DbError;

    async fn resolve_handle(&self, did: &Did) -> Result<Option<Handle>> {
        let author = self.fetch_author(did).await?;
        Ok(author.and_then(|author| author.handle))
    }
}
