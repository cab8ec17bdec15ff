use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::products::DistrictList,
    error::AppResult,
    models::District,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_districts))
}

#[utoipa::path(
    get,
    path = "/api/districts",
    responses(
        (status = 200, description = "List delivery districts", body = ApiResponse<DistrictList>)
    ),
    tag = "Districts"
)]
pub async fn list_districts(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DistrictList>>> {
    let items = sqlx::query_as::<_, District>(
        "SELECT id, name, shipping_zone_id FROM districts ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Districts",
        DistrictList { items },
        Some(Meta::empty()),
    )))
}
