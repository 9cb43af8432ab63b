use super::error::*;
use crate::application_port::RelationshipService;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

fn parse_path_id<T: std::str::FromStr>(raw: &str) -> Result<T, warp::Rejection> {
    raw.parse::<T>()
        .map_err(|_| reject::custom(ApiErrorCode::InvalidRequest))
}

pub async fn list_friends(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friends = relationship_service
        .list_friends(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(friends)))
}

pub async fn list_incoming_requests(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requests = relationship_service
        .list_incoming_requests(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(requests)))
}

pub async fn request_friendship(
    target: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target: UserId = parse_path_id(&target)?;

    let friendship = relationship_service
        .request_friendship(user_id, target)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(friendship)),
        StatusCode::CREATED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: RespondAction,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub friendship_id: FriendshipId,
    pub outcome: RespondOutcome,
}

pub async fn respond_to_request(
    friendship_id: String,
    user_id: UserId,
    body: RespondRequest,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friendship_id: FriendshipId = parse_path_id(&friendship_id)?;

    let outcome = relationship_service
        .respond_to_request(user_id, friendship_id, body.action)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(RespondResponse {
        friendship_id,
        outcome,
    })))
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub friendship_id: FriendshipId,
}

pub async fn remove_friendship(
    friendship_id: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friendship_id: FriendshipId = parse_path_id(&friendship_id)?;

    relationship_service
        .remove_friendship(user_id, friendship_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(RemoveResponse {
        friendship_id,
    })))
}
