use crate::{
    auth,
    errors::AppError,
    extract::{AppJson, AppQuery},
    services::facility::attach_facility_info,
    state::AppState,
    structs::{
        auth::CurrentWorker,
        shifts::{ListQuery, Message, NewShift, Shift, ShiftFilter},
    },
};
use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get},
    Extension, Json, Router,
};

pub fn new() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shifts).post(add_shifts))
        .route("/{code}", delete(delete_shift))
        .layer(middleware::from_fn(auth::authorize))
}

/// 取目前志工的班表，附上 facility 資訊
pub async fn list_shifts(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentWorker>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Vec<Shift>>, AppError> {
    let filter = ShiftFilter {
        worker: Some(worker.id),
        shelter: query.shelter,
    };

    let shifts = state.shift_store().list(&filter).await?;
    let shifts = attach_facility_info(state.facility_provider(), shifts).await?;

    Ok(Json(shifts))
}

// 批次新增，worker 一律以 Authorization 為準
pub async fn add_shifts(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentWorker>,
    AppJson(payload): AppJson<Vec<NewShift>>,
) -> Result<Json<Vec<Shift>>, AppError> {
    let shifts = payload
        .into_iter()
        .map(|new_shift| new_shift.into_shift(&worker.id))
        .collect::<Result<Vec<Shift>, AppError>>()?;

    let created = state.shift_store().add_many(shifts).await?;
    tracing::info!(worker = %worker.id, "added {} shifts", created.len());

    Ok(Json(created))
}

pub async fn delete_shift(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentWorker>,
    Path(code): Path<String>,
) -> Result<Json<Message>, AppError> {
    state.shift_store().delete(&code).await?;
    tracing::info!(worker = %worker.id, "deleted shift {}", code);

    Ok(Json(Message {
        message: "Shift deleted successfully".to_string(),
    }))
}
