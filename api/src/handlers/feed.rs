//! Feed handlers
//!
//! JSON timelines and the RSS feed. Both accept the `include_*` query flags;
//! filtering happens after retrieval, so every flag combination shares a cache.

use axum::{
    extract::{Query, RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::app::{PostFilter, Timelines};
use crate::domain::entities::Handle;
use crate::error::AppError;
use crate::feed::render_rss;
use crate::AppState;

const RSS_CONTENT_TYPE: &str = "application/rss+xml";

/// POST /
///
/// Body is a JSON array of handles. Returns `{handle: [post]}` in request order.
pub async fn post_timelines(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
    Json(body): Json<Vec<String>>,
) -> Result<Json<Timelines>, AppError> {
    let handles = parse_handles(body.iter().map(String::as_str))?;
    let timelines = state.feed_service.timelines(&handles, filter).await?;
    Ok(Json(timelines))
}

/// GET /feed.xml
///
/// `usernames` may repeat and may hold comma-separated lists. Without it the
/// configured default handles are served.
pub async fn get_rss_feed(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let requested = usernames_from_query(query.as_deref().unwrap_or_default())?;
    let handles = if requested.is_empty() {
        state.default_handles.as_ref().clone()
    } else {
        requested
    };

    let feed = state.feed_service.feed(&handles, filter).await?;
    let body = render_rss(&feed, chrono::Utc::now());

    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], body).into_response())
}

fn parse_handles<'a, I>(raw: I) -> Result<Vec<Handle>, AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .map(|h| h.parse::<Handle>().map_err(AppError::BadRequest))
        .collect()
}

/// Collect every `usernames` value, splitting on commas
fn usernames_from_query(query: &str) -> Result<Vec<Handle>, AppError> {
    let mut names = Vec::new();

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != "usernames" {
            continue;
        }

        let value = value.replace('+', " ");
        let decoded = urlencoding::decode(&value)
            .map_err(|e| AppError::BadRequest(format!("Invalid usernames encoding: {}", e)))?;

        names.extend(
            decoded
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    parse_handles(names.iter().map(String::as_str))
}
