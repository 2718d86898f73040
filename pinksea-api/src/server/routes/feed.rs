use crate::server::{Result, ServerError, ServerRouter, json::Json, query::Query};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use pinksea_common::{
    feed::{
        builder::{FeedBuilder, resolve_oekaki},
        query::OekakiFilter,
    },
    model::{author::Did, dto::OekakiDto, tag::TagName},
    tid::Tid,
};
use pinksea_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{OffsetDateTime, UtcDateTime};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_recent)
        .typed_get(get_tag_feed)
        .typed_get(get_author_feed)
        .typed_get(get_parent_for_reply)
}

type DbFeedBuilder<'a> = FeedBuilder<'a, DbClient, DbClient>;

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct FeedResponse {
    oekaki: Vec<OekakiDto>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct Page {
    #[serde(default, with = "time::serde::rfc3339::option")]
    since: Option<OffsetDateTime>,
    limit: Option<i64>,
}

/// Applies the cursor and page size shared by all feeds.
fn paginate(builder: DbFeedBuilder<'_>, page: Page) -> Result<DbFeedBuilder<'_>> {
    let mut builder = builder.try_limit(page.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT))?;
    if let Some(since) = page.since {
        builder = builder.since(UtcDateTime::from(since));
    }

    Ok(builder)
}

async fn run(builder: DbFeedBuilder<'_>) -> Result<Json<FeedResponse>> {
    let oekaki = builder.get_feed().await?;

    Ok(Json(FeedResponse { oekaki }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/xrpc/com.shinolabs.pinksea.getRecent", rejection(ServerError))]
struct GetRecentPath();

async fn get_recent(
    GetRecentPath(): GetRecentPath,
    State(db): State<Arc<DbClient>>,
    Query(page): Query<Page>,
) -> Result<Json<FeedResponse>> {
    let builder = paginate(FeedBuilder::new(&*db, &*db), page)?;

    run(builder).await
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/xrpc/com.shinolabs.pinksea.getTagFeed", rejection(ServerError))]
struct GetTagFeedPath();

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct GetTagFeedParams {
    tag: TagName,
    #[serde(default, with = "time::serde::rfc3339::option")]
    since: Option<OffsetDateTime>,
    limit: Option<i64>,
}

async fn get_tag_feed(
    GetTagFeedPath(): GetTagFeedPath,
    State(db): State<Arc<DbClient>>,
    Query(params): Query<GetTagFeedParams>,
) -> Result<Json<FeedResponse>> {
    let page = Page {
        since: params.since,
        limit: params.limit,
    };
    let builder = paginate(FeedBuilder::new(&*db, &*db).with_tag(params.tag), page)?;

    run(builder).await
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/xrpc/com.shinolabs.pinksea.getAuthorFeed", rejection(ServerError))]
struct GetAuthorFeedPath();

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct GetAuthorFeedParams {
    did: Did,
    #[serde(default, with = "time::serde::rfc3339::option")]
    since: Option<OffsetDateTime>,
    limit: Option<i64>,
}

async fn get_author_feed(
    GetAuthorFeedPath(): GetAuthorFeedPath,
    State(db): State<Arc<DbClient>>,
    Query(params): Query<GetAuthorFeedParams>,
) -> Result<Json<FeedResponse>> {
    let page = Page {
        since: params.since,
        limit: params.limit,
    };
    let builder = paginate(
        FeedBuilder::new(&*db, &*db).filter(OekakiFilter::AuthorIs(params.did)),
        page,
    )?;

    run(builder).await
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/xrpc/com.shinolabs.pinksea.getParentForReply", rejection(ServerError))]
struct GetParentForReplyPath();

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize)]
struct GetParentForReplyParams {
    tid: Tid,
}

async fn get_parent_for_reply(
    GetParentForReplyPath(): GetParentForReplyPath,
    State(db): State<Arc<DbClient>>,
    Query(GetParentForReplyParams { tid }): Query<GetParentForReplyParams>,
) -> Result<Json<OekakiDto>> {
    let reply = db
        .fetch_oekaki(tid)
        .await?
        .ok_or(ServerError::OekakiByTidNotFound(tid))?;
    let parent_tid = reply.parent_id.ok_or(ServerError::NotAReply(tid))?;
    let parent = db
        .fetch_oekaki(parent_tid)
        .await?
        .ok_or(ServerError::OekakiByTidNotFound(parent_tid))?;

    Ok(Json(resolve_oekaki(&*db, &parent).await))
}
