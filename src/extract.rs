use crate::errors::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// 與 `axum::Json` 相同，但解析失敗時回傳 `AppError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// 與 `axum::extract::Query` 相同，但解析失敗時回傳 `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
