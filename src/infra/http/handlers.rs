use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::greetings::GreetingLookup;
use crate::domain::greeting::{Greeting, parse_greeting_id};

use super::error::ApiError;
use super::state::HttpState;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateGreetingRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GreetingResponse {
    pub id: Uuid,
    pub message: String,
}

impl From<Greeting> for GreetingResponse {
    fn from(greeting: Greeting) -> Self {
        Self {
            id: greeting.id,
            message: greeting.message,
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_greeting_id(raw).map_err(|err| ApiError::invalid_id(err.to_string()))
}

pub async fn create_greeting(
    State(state): State<HttpState>,
    payload: Result<Json<CreateGreetingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;

    let greeting = state.greetings.create(&request.name).await?;

    Ok((StatusCode::CREATED, Json(GreetingResponse::from(greeting))))
}

pub async fn get_greeting(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    match state.greetings.get(id).await? {
        GreetingLookup::Found(greeting) => Ok(Json(GreetingResponse::from(greeting))),
        GreetingLookup::NotFound => Err(ApiError::not_found("Greeting not found")),
    }
}

pub async fn evict_greeting(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state.greetings.evict_cached(id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn evict_all(State(state): State<HttpState>) -> impl IntoResponse {
    state.greetings.evict_all_cached().await;
    StatusCode::NO_CONTENT
}
