use application::ApplicationError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    /// 校验失败时列出全部违反的规则
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unprocessable(details: Vec<String>) -> Self {
        let mut error = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_FAILED",
            "payload validation failed",
        );
        error.body.details = Some(details);
        error
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, RepositoryError};

        match error {
            AppErr::Domain(DomainError::ValidationFailed { violations }) => {
                ApiError::unprocessable(violations)
            }
            AppErr::Domain(err @ DomainError::ParticipantAlreadyExists { .. }) => {
                ApiError::new(StatusCode::CONFLICT, "PARTICIPANT_EXISTS", err.to_string())
            }
            AppErr::Domain(err @ DomainError::UnknownSender { .. }) => {
                ApiError::new(StatusCode::CONFLICT, "UNKNOWN_SENDER", err.to_string())
            }
            AppErr::Domain(err @ DomainError::ParticipantNotFound { .. }) => ApiError::new(
                StatusCode::NOT_FOUND,
                "PARTICIPANT_NOT_FOUND",
                err.to_string(),
            ),
            AppErr::Domain(err @ DomainError::MessageNotFound { .. }) => {
                ApiError::new(StatusCode::NOT_FOUND, "MESSAGE_NOT_FOUND", err.to_string())
            }
            AppErr::Domain(err @ DomainError::NotMessageOwner { .. }) => {
                ApiError::new(StatusCode::UNAUTHORIZED, "NOT_MESSAGE_OWNER", err.to_string())
            }
            AppErr::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Storage { message } => {
                    tracing::error!(error = %message, "storage failure");
                    ApiError::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        "storage error",
                    )
                }
            },
        }
    }
}

/// 请求体无法解析为 JSON 载荷；字段类型不符按校验失败处理
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            ApiError::unprocessable(vec![rejection.body_text()])
        } else {
            ApiError::new(status, "INVALID_BODY", rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DomainError, RepositoryError};

    #[test]
    fn maps_error_taxonomy_to_status_codes() {
        let cases = [
            (
                ApplicationError::from(DomainError::validation_failed(vec!["x".into()])),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                DomainError::participant_already_exists("alice").into(),
                StatusCode::CONFLICT,
            ),
            (DomainError::unknown_sender("ghost").into(), StatusCode::CONFLICT),
            (
                DomainError::participant_not_found("ghost").into(),
                StatusCode::NOT_FOUND,
            ),
            (DomainError::message_not_found("1").into(), StatusCode::NOT_FOUND),
            (
                DomainError::not_message_owner("bob", "1").into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                RepositoryError::storage("boom").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }
}
