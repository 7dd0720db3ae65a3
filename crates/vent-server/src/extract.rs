use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` body extractor whose rejections go through [`AppError`], so a
/// missing field or a malformed body answers 400 with the usual
/// `{"error": ...}` body instead of axum's plain-text 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
