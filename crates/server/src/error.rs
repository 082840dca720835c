use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError, finance::FinanceError, route::RouteError, storage::StorageError,
    work_order::WorkOrderError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    WorkOrder(#[from] WorkOrderError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Finance(#[from] FinanceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::InvalidCredentials | AuthError::Token(_)) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Auth(AuthError::Inactive) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::WorkOrder(WorkOrderError::Validation(_) | WorkOrderError::UnknownStatus(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::WorkOrder(WorkOrderError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::WorkOrder(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Route(RouteError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Route(RouteError::Duplicate) => StatusCode::CONFLICT,
            ApiError::Route(RouteError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Route(RouteError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Route(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Finance(FinanceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Finance(FinanceError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Finance(FinanceError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Finance(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(StorageError::UnsupportedType(_) | StorageError::TooLarge) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(%self, "internal error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
