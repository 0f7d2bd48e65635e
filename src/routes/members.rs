use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::db;
use crate::error::AppError;
use crate::models::member::{CreateMember, Member, UpdateMember};
use crate::routes::extract::JsonBody;
use crate::state::AppState;
use crate::validation;

/// Ids that are not positive integers can never resolve, so they 404 like
/// any other unknown id.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::NotFound("member not found".to_string()))
}

pub async fn list_members(state: State<AppState>) -> Result<Json<Vec<Member>>, AppError> {
    let members = db::members::list_members(&state.db).await?;
    Ok(Json(members))
}

pub async fn get_member(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Member>, AppError> {
    let id = parse_id(&id)?;
    let member = db::members::get_member(&state.db, id).await?;
    Ok(Json(member))
}

pub async fn create_member(
    state: State<AppState>,
    JsonBody(input): JsonBody<CreateMember>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let input = input.normalized();
    let email_taken = match input.email.as_deref() {
        Some(email) => db::members::email_taken(&state.db, email, None).await?,
        None => false,
    };
    let new_member = validation::validate_create(input, email_taken)?;

    let member = db::members::create_member(&state.db, &new_member).await?;
    tracing::info!(member_id = member.id, "member created");
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    state: State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateMember>,
) -> Result<Json<Member>, AppError> {
    let id = parse_id(&id)?;
    // Resolve the member before validating so unknown ids 404 rather than 422.
    db::members::get_member(&state.db, id).await?;

    let input = input.normalized();
    let email_taken = match &input.email {
        Some(Some(email)) => db::members::email_taken(&state.db, email, Some(id)).await?,
        _ => false,
    };
    let changes = validation::validate_update(input, email_taken)?;

    let member = db::members::update_member(&state.db, id, &changes).await?;
    tracing::debug!(member_id = member.id, "member updated");
    Ok(Json(member))
}

pub async fn delete_member(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    db::members::delete_member(&state.db, id).await?;
    tracing::info!(member_id = id, "member deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("0"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound(_))));
    }
}
