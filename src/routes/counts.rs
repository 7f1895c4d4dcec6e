use crate::{
    auth,
    errors::AppError,
    extract::AppQuery,
    services::staffing,
    state::AppState,
    structs::shifts::{CountQuery, Staffing},
};
use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Json, Router,
};

pub fn new() -> Router<AppState> {
    Router::new()
        .route("/{shelter_id}", get(count_workers))
        .layer(middleware::from_fn(auth::authorize))
}

/// 依時間區間計算收容所各時段的在班人數
pub async fn count_workers(
    State(state): State<AppState>,
    Path(shelter_id): Path<String>,
    AppQuery(query): AppQuery<CountQuery>,
) -> Result<Json<Vec<Staffing>>, AppError> {
    // 先驗證區間再查資料
    if query.start_after > query.end_before {
        return Err(AppError::InvalidWindow {
            start: query.start_after,
            end: query.end_before,
        });
    }

    let shifts = state
        .shift_store()
        .list_for_shelter_window(&shelter_id, query.start_after, query.end_before)
        .await?;

    let staffing = staffing::compute(&shifts, query.start_after, query.end_before)?;
    tracing::debug!(
        shelter = %shelter_id,
        "{} shifts -> {} staffing spans",
        shifts.len(),
        staffing.len()
    );

    Ok(Json(staffing))
}
