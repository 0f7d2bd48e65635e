use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::member::FIELDS;
use crate::models::{ErrorBody, ErrorResponse};
use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Database(sqlx::Error),
    NotFound(String),
    Validation(FieldErrors),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_) => "internal_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_failed",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                "internal database error".to_string()
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(errors) => errors.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.message(),
                errors: match self {
                    AppError::Validation(errors) => Some(errors),
                    _ => None,
                },
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("member not found".to_string()),
            // The pre-insert uniqueness check can race; the constraint is the backstop.
            sqlx::Error::Database(db)
                if db.is_unique_violation() && db.message().contains("members.email") =>
            {
                let mut errors = FieldErrors::new();
                errors.add("email", "The email has already been taken.");
                AppError::Validation(errors)
            }
            _ => AppError::Database(e),
        }
    }
}

/// A body that decodes as JSON but has the wrong type under a member field
/// is reported against that field; anything else is a bad request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if let JsonRejection::JsonDataError(ref e) = rejection {
            if let Some(field) = rejected_field(e) {
                let mut errors = FieldErrors::new();
                errors.add(field, format!("The {field} field must be a string."));
                return AppError::Validation(errors);
            }
        }
        tracing::debug!("rejected request body: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    }
}

/// The path-tracking decode error in the source chain reads `<path>: <reason>`.
fn rejected_field(error: &(dyn std::error::Error + 'static)) -> Option<&'static str> {
    std::iter::successors(Some(error), |e| e.source()).find_map(|e| {
        let text = e.to_string();
        let (path, _) = text.split_once(": ")?;
        FIELDS.into_iter().find(|field| *field == path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_renders_field_errors() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email has already been taken.");
        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_of(response).await;
        assert_eq!(body["error"]["code"], "validation_failed");
        assert_eq!(
            body["error"]["errors"]["email"][0],
            "The email has already been taken."
        );
    }

    #[tokio::test]
    async fn test_not_found_has_no_field_errors() {
        let response = AppError::NotFound("member not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body["error"]["message"], "member not found");
        assert!(body["error"].get("errors").is_none());
    }

    #[tokio::test]
    async fn test_bad_request_uses_envelope() {
        let response = AppError::BadRequest("malformed body".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body["error"]["code"], "bad_request");
        assert_eq!(body["error"]["message"], "malformed body");
    }
}
