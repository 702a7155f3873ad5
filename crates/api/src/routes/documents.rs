use crate::{auth::Authenticated, error::ApiError, server::AppState, types::DocumentQuery};
use axum::{
    extract::{Query, State},
    Json,
};
use catalog_common::{Category, IndexEntry, IndexSnapshot};
use catalog_indexing::read_snapshot_or_empty;
use tracing::{info, instrument};

/// Current persisted snapshot, optionally filtered.
///
/// An absent snapshot file is an empty catalog, not an error.
#[instrument(skip(state, principal), fields(principal = %principal.0))]
pub async fn list_documents(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<IndexSnapshot>, ApiError> {
    let category = match query.category.as_deref() {
        Some(name) => Some(
            Category::parse_loose(name).ok_or_else(|| ApiError::BadRequest(format!("Unknown category '{}'", name)))?,
        ),
        None => None,
    };
    let needle = query.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty());

    let snapshot = read_snapshot_or_empty(&state.snapshot_path).await?;
    let total = snapshot.len();

    let entries: Vec<IndexEntry> = snapshot
        .0
        .into_iter()
        .filter(|entry| category.map_or(true, |c| entry.category == c))
        .filter(|entry| needle.as_deref().map_or(true, |q| matches_text(entry, q)))
        .collect();

    info!(total, returned = entries.len(), "Serving documents");
    Ok(Json(IndexSnapshot::new(entries)))
}

fn matches_text(entry: &IndexEntry, needle: &str) -> bool {
    entry.filename.to_lowercase().contains(needle)
        || entry.reasoning_tags.iter().any(|tag| tag.to_lowercase().contains(needle))
        || entry.full_text.to_lowercase().contains(needle)
}
