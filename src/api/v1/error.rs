use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, warn};
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.clone(), code.to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        debug!("bad request body: {e}");
        (ApiErrorCode::InvalidRequest, format!("Invalid request body: {e}"))
    } else if err.is_not_found() {
        (ApiErrorCode::RouteNotFound, ApiErrorCode::RouteNotFound.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (ApiErrorCode::RouteNotFound, ApiErrorCode::RouteNotFound.to_string())
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            ApiErrorCode::InternalError,
            format!("Unhandled error: {:?}", err),
        )
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
pub enum ApiErrorCode {
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Authentication failed")]
    Unauthenticated,
    #[error("You cannot send a friend request to yourself")]
    SelfTarget,
    #[error("Target user not found")]
    TargetNotFound,
    #[error("You are already friends with this user")]
    AlreadyFriends,
    #[error("You already sent a friend request to this user")]
    DuplicateRequest,
    #[error("This user already sent you a friend request, respond to it")]
    ReciprocalPending,
    #[error("Pending friend request not found or you are not the recipient")]
    RequestNotFound,
    #[error("Friendship not found or you are not part of it")]
    RelationshipNotFound,
    #[error("Route not found")]
    RouteNotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest
            | ApiErrorCode::SelfTarget
            | ApiErrorCode::AlreadyFriends
            | ApiErrorCode::DuplicateRequest
            | ApiErrorCode::ReciprocalPending => StatusCode::BAD_REQUEST,
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::TargetNotFound
            | ApiErrorCode::RequestNotFound
            | ApiErrorCode::RelationshipNotFound
            | ApiErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<RelationError> for ApiErrorCode {
    fn from(error: RelationError) -> Self {
        match error {
            RelationError::SelfTarget => ApiErrorCode::SelfTarget,
            RelationError::TargetNotFound => ApiErrorCode::TargetNotFound,
            RelationError::AlreadyFriends => ApiErrorCode::AlreadyFriends,
            RelationError::DuplicateRequest => ApiErrorCode::DuplicateRequest,
            RelationError::ReciprocalPending => ApiErrorCode::ReciprocalPending,
            RelationError::RequestNotFound => ApiErrorCode::RequestNotFound,
            RelationError::RelationshipNotFound => ApiErrorCode::RelationshipNotFound,
            RelationError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenInvalid | AuthError::TokenExpired => ApiErrorCode::Unauthenticated,
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_relation_error_keeps_its_own_code() {
        let cases = [
            (RelationError::SelfTarget, ApiErrorCode::SelfTarget),
            (RelationError::TargetNotFound, ApiErrorCode::TargetNotFound),
            (RelationError::AlreadyFriends, ApiErrorCode::AlreadyFriends),
            (RelationError::DuplicateRequest, ApiErrorCode::DuplicateRequest),
            (RelationError::ReciprocalPending, ApiErrorCode::ReciprocalPending),
            (RelationError::RequestNotFound, ApiErrorCode::RequestNotFound),
            (RelationError::RelationshipNotFound, ApiErrorCode::RelationshipNotFound),
            (RelationError::Store("boom".into()), ApiErrorCode::InternalError),
        ];

        for (error, code) in cases {
            assert_eq!(ApiErrorCode::from(error), code);
        }
    }

    #[test]
    fn expired_tokens_are_unauthenticated() {
        assert_eq!(
            ApiErrorCode::from(AuthError::TokenExpired).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
