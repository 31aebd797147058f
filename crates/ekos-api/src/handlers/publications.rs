//! Publication handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use ekos_models::{ContentId, Publication, PublicationId};

use super::OrNotFound;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_PUBLICATION_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct PublicationQuery {
    pub limit: Option<usize>,
    pub content_id: Option<String>,
}

/// Publications, newest first, optionally for one content record.
pub async fn list_publications(
    State(state): State<AppState>,
    Query(query): Query<PublicationQuery>,
) -> ApiResult<Json<Vec<Publication>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PUBLICATION_LIMIT).clamp(1, 500);
    let publications = match query.content_id {
        Some(id) => {
            let mut list = state
                .publications
                .list_for_content(&ContentId::from_string(id))
                .await?;
            list.truncate(limit);
            list
        }
        None => state.publications.list(limit).await?,
    };
    Ok(Json(publications))
}

pub async fn get_publication(
    State(state): State<AppState>,
    Path(publication_id): Path<String>,
) -> ApiResult<Json<Publication>> {
    let publication = state
        .publications
        .get(&PublicationId::from_string(publication_id))
        .await
        .or_not_found("Публикация не найдена")?;
    Ok(Json(publication))
}
