// region:    --- Imports
use crate::auction::commands::{create_auction, delete_auction, update_auction};
use crate::auction::model::{CreateAuction, Identity, UpdateAuction};
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::query;
use crate::search::repository::{self, SearchFilter};
use crate::search::ProjectionError;
use axum::async_trait;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// endregion: --- Imports

/// 게이트웨이가 인증 후 채워 주는 사용자 헤더
pub const IDENTITY_HEADER: &str = "x-authenticated-user";

// region:    --- Router
pub fn routes(db_manager: Arc<DatabaseManager>) -> Router {
    Router::new()
        .route(
            "/auctions",
            get(handle_get_auctions).post(handle_create_auction),
        )
        .route(
            "/auctions/:id",
            get(handle_get_auction)
                .put(handle_update_auction)
                .delete(handle_delete_auction),
        )
        .route("/search/items", get(handle_search_items))
        .route("/search/items/:id", get(handle_get_search_item))
        .with_state(db_manager)
}
// endregion: --- Router

// region:    --- Identity
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Identity::new)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                        "error": "인증된 사용자 정보가 없습니다.",
                        "code": "UNAUTHORIZED"
                    })),
                )
            })
    }
}
// endregion: --- Identity

// region:    --- Command Handlers

/// 경매 생성
pub async fn handle_create_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    identity: Identity,
    Json(cmd): Json<CreateAuction>,
) -> impl IntoResponse {
    match create_auction(&db_manager, cmd, &identity).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 수정
pub async fn handle_update_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(id): Path<Uuid>,
    identity: Identity,
    Json(patch): Json<UpdateAuction>,
) -> impl IntoResponse {
    match update_auction(&db_manager, id, patch, &identity).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 삭제
pub async fn handle_delete_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(id): Path<Uuid>,
    identity: Identity,
) -> impl IntoResponse {
    match delete_auction(&db_manager, id, &identity).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

#[derive(Debug, Deserialize)]
pub struct AuctionsQuery {
    pub since: Option<DateTime<Utc>>,
}

/// 경매 목록 조회
pub async fn handle_get_auctions(
    State(db_manager): State<Arc<DatabaseManager>>,
    Query(params): Query<AuctionsQuery>,
) -> impl IntoResponse {
    match query::handlers::get_auctions(&db_manager, params.since).await {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => AuctionError::from(e).into_response(),
    }
}

/// 경매 조회
pub async fn handle_get_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match query::handlers::get_auction(&db_manager, id).await {
        Ok(Some(auction)) => Json(auction).into_response(),
        Ok(None) => AuctionError::NotFound(id).into_response(),
        Err(e) => AuctionError::from(e).into_response(),
    }
}

/// 검색
pub async fn handle_search_items(
    State(db_manager): State<Arc<DatabaseManager>>,
    Query(filter): Query<SearchFilter>,
) -> impl IntoResponse {
    info!("{:<12} --> 검색: {:?}", "HandlerQuery", filter);
    match repository::search(&db_manager, &filter).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => {
            error!("{:<12} --> 검색 오류: {:?}", "HandlerQuery", e);
            search_error_response(&e)
        }
    }
}

/// 검색 레코드 조회
pub async fn handle_get_search_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!("{:<12} --> 검색 레코드 조회 id: {}", "HandlerQuery", id);
    match repository::get_item(&db_manager, id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("검색 레코드를 찾을 수 없습니다: {id}"),
                "code": "NOT_FOUND"
            })),
        )
            .into_response(),
        Err(e) => {
            error!("{:<12} --> 검색 레코드 조회 오류: {:?}", "HandlerQuery", e);
            search_error_response(&e)
        }
    }
}

/// 읽기 모델 오류 응답 (쓰기 측과 같은 {error, code} 형식)
fn search_error_response(e: &ProjectionError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": e.to_string(),
            "code": "SEARCH_UNAVAILABLE"
        })),
    )
        .into_response()
}

// endregion: --- Query Handlers

// endregion: --- Tests
