use crate::record::to_bound;
use pinksea_common::feed::query::{FeedQuery, OekakiFilter};
use sqlx::{Postgres, QueryBuilder};

pub(crate) const SELECT_OEKAKI: &str = "SELECT o.tid, o.author_did, o.indexed_at, o.record_cid, \
    o.blob_cid, o.alt_text, o.parent_id FROM oekaki.oekaki o";

/// Builds the single statement reading a feed page.
pub(crate) fn feed_statement(query: &FeedQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_OEKAKI);

    builder.push(" WHERE TRUE");
    for filter in query.filters() {
        builder.push(" AND (");
        push_filter(&mut builder, filter);
        builder.push(")");
    }

    builder.push(" ORDER BY o.indexed_at DESC, o.tid DESC");
    if let Some(limit) = query.limit() {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    builder
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &OekakiFilter) {
    match filter {
        OekakiFilter::AuthorIs(did) => {
            builder.push("o.author_did = ").push_bind(did.get().to_owned());
        }
        OekakiFilter::ParentIs(tid) => {
            builder.push("o.parent_id = ").push_bind(tid.to_string());
        }
        OekakiFilter::IsReply => {
            builder.push("o.parent_id IS NOT NULL");
        }
        OekakiFilter::IsTopLevel => {
            builder.push("o.parent_id IS NULL");
        }
        OekakiFilter::IndexedBefore(time) => {
            builder.push("o.indexed_at < ").push_bind(to_bound(*time));
        }
        OekakiFilter::IndexedAtOrAfter(time) => {
            builder.push("o.indexed_at >= ").push_bind(to_bound(*time));
        }
        OekakiFilter::HasAltText => {
            builder.push("o.alt_text IS NOT NULL");
        }
        // A semi-join, so duplicate relations cannot duplicate rows.
        OekakiFilter::HasTag(tag) => {
            builder
                .push(
                    "EXISTS (SELECT 1 FROM oekaki.tag_oekaki_relations r \
                    WHERE r.oekaki_tid = o.tid AND r.tag_name = ",
                )
                .push_bind(tag.get().to_owned())
                .push(")");
        }
        OekakiFilter::Not(inner) => {
            builder.push("NOT (");
            push_filter(builder, inner);
            builder.push(")");
        }
        OekakiFilter::Any(filters) if filters.is_empty() => {
            builder.push("FALSE");
        }
        OekakiFilter::Any(filters) => {
            for (i, filter) in filters.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push("(");
                push_filter(builder, filter);
                builder.push(")");
            }
        }
    }
}
