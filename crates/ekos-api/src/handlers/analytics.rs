//! Analytics handlers.

use axum::extract::State;
use axum::Json;

use ekos_models::AnalyticsSummary;

use crate::error::ApiResult;
use crate::state::AppState;

/// Totals over recorded publications and analytics.
pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSummary>> {
    let publications = state.publications.list_all().await?;
    let records = state.analytics.list().await?;
    Ok(Json(AnalyticsSummary::aggregate(&publications, &records)))
}
