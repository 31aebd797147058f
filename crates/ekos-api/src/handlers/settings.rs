//! Settings handlers.

use axum::extract::State;
use axum::Json;
use tracing::info;

use ekos_models::SystemSettings;

use super::ActionResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const MASK_PREFIX: &str = "****";

/// Settings with API keys masked.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<SystemSettings>> {
    let settings = state.settings.get().await?;
    Ok(Json(settings.masked()))
}

/// Replace the settings.
///
/// Keys posted back in masked form keep their stored value.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(mut settings): Json<SystemSettings>,
) -> ApiResult<Json<ActionResponse>> {
    let current = state.settings.get().await?;
    settings.api_keys = settings
        .api_keys
        .into_iter()
        .filter_map(|(name, value)| {
            if value.starts_with(MASK_PREFIX) {
                current.api_keys.get(&name).map(|stored| (name, stored.clone()))
            } else {
                Some((name, value))
            }
        })
        .collect();

    state.settings.save(settings).await?;
    info!("System settings updated");
    Ok(Json(ActionResponse::ok("Настройки обновлены")))
}
