use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let friend_list = warp::get()
        .and(warp::path!("friendships"))
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_friends);

    let pending_list = warp::get()
        .and(warp::path!("friendships" / "pending"))
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_incoming_requests);

    let request = warp::post()
        .and(warp::path!("friendships" / "request" / String))
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::request_friendship);

    let respond = warp::put()
        .and(warp::path!("friendships" / "respond" / String))
        .and(with_verification(server.auth_service.clone()))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::respond_to_request);

    let remove = warp::delete()
        .and(warp::path!("friendships" / String))
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::remove_friendship);

    friend_list
        .or(pending_list)
        .or(request)
        .or(respond)
        .or(remove)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let Some(token) = header.as_deref().and_then(|h| h.strip_prefix("Bearer ")) else {
                    return Err(reject::custom(ApiErrorCode::Unauthenticated));
                };
                let user_id = auth_service
                    .verify_token(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok(user_id)
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::recover_error;
    use crate::application_impl::*;
    use crate::application_port::RelationshipService;
    use crate::domain_model::FriendshipId;
    use crate::infra_memory::*;
    use serde_json::Value;
    use warp::http::StatusCode;

    fn api() -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
        let users = Arc::new(MemoryUserRepo::with_usernames(["alice", "bob", "carol"]));
        let relationship_service: Arc<dyn RelationshipService> = Arc::new(
            RealRelationshipService::new(users.clone(), Arc::new(MemoryFriendshipRepo::new(users))),
        );
        let server = Arc::new(Server::with_services(
            Arc::new(FakeAuthService::new()),
            relationship_service,
        ));
        routes(server).recover(recover_error)
    }

    fn bearer(user: &str) -> String {
        format!("Bearer {}", FakeAuthService::token_for(user))
    }

    fn id_of(user: &str) -> String {
        UserId::from_name(user).to_string()
    }

    async fn call<F>(
        api: &F,
        method: &str,
        path: &str,
        user: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value)
    where
        F: Filter + 'static,
        F::Extract: warp::Reply + Send,
    {
        let mut req = warp::test::request().method(method).path(path);
        if let Some(user) = user {
            req = req.header("authorization", bearer(user));
        }
        if let Some(body) = body {
            req = req.header("content-type", "application/json").body(body);
        }
        let res = req.reply(api).await;
        let json = serde_json::from_slice(res.body()).unwrap();
        (res.status(), json)
    }

    fn error_code(json: &Value) -> &str {
        json["error"]["code"].as_str().unwrap()
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthenticated() {
        let api = api();

        let (status, json) = call(&api, "GET", "/friendships", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&json), "Unauthenticated");

        let res = warp::test::request()
            .method("GET")
            .path("/friendships")
            .header("authorization", "Bearer not-a-token")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn request_accept_and_list_round_trip() {
        let api = api();
        let path = format!("/friendships/request/{}", id_of("bob"));

        let (status, json) = call(&api, "POST", &path, Some("alice"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["status"], "pending");
        let friendship_id = json["data"]["friendship_id"].as_str().unwrap().to_string();

        let (_, pending) = call(&api, "GET", "/friendships/pending", Some("bob"), None).await;
        assert_eq!(pending["data"].as_array().unwrap().len(), 1);
        assert_eq!(pending["data"][0]["sender_id"], id_of("alice"));
        assert_eq!(pending["data"][0]["sender_username"], "alice");
        assert!(pending["data"][0]["sender_profile_picture_url"].is_null());

        let respond = format!("/friendships/respond/{friendship_id}");
        let (status, json) = call(
            &api,
            "PUT",
            &respond,
            Some("bob"),
            Some(r#"{"action":"accept"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["outcome"], "accepted");

        let (_, friends) = call(&api, "GET", "/friendships", Some("alice"), None).await;
        assert_eq!(friends["data"][0]["user_id"], id_of("bob"));
        assert_eq!(friends["data"][0]["username"], "bob");

        let remove = format!("/friendships/{friendship_id}");
        let (status, _) = call(&api, "DELETE", &remove, Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, friends) = call(&api, "GET", "/friendships", Some("alice"), None).await;
        assert!(friends["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn conflicts_are_reported_with_distinct_codes() {
        let api = api();
        let to_bob = format!("/friendships/request/{}", id_of("bob"));
        let to_alice = format!("/friendships/request/{}", id_of("alice"));
        let to_self = format!("/friendships/request/{}", id_of("alice"));
        let to_nobody = format!("/friendships/request/{}", id_of("zed"));

        call(&api, "POST", &to_bob, Some("alice"), None).await;

        let (status, json) = call(&api, "POST", &to_bob, Some("alice"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&json), "DuplicateRequest");

        let (_, json) = call(&api, "POST", &to_alice, Some("bob"), None).await;
        assert_eq!(error_code(&json), "ReciprocalPending");

        let (_, json) = call(&api, "POST", &to_self, Some("alice"), None).await;
        assert_eq!(error_code(&json), "SelfTarget");

        let (status, json) = call(&api, "POST", &to_nobody, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&json), "TargetNotFound");
    }

    #[tokio::test]
    async fn requester_cannot_accept_and_pending_cannot_be_removed() {
        let api = api();
        let path = format!("/friendships/request/{}", id_of("carol"));
        let (_, json) = call(&api, "POST", &path, Some("alice"), None).await;
        let friendship_id = json["data"]["friendship_id"].as_str().unwrap().to_string();

        let respond = format!("/friendships/respond/{friendship_id}");
        let (status, json) = call(
            &api,
            "PUT",
            &respond,
            Some("alice"),
            Some(r#"{"action":"accept"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&json), "RequestNotFound");

        let remove = format!("/friendships/{friendship_id}");
        let (status, json) = call(&api, "DELETE", &remove, Some("carol"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&json), "RelationshipNotFound");
    }

    #[tokio::test]
    async fn respond_checks_the_token_before_the_body() {
        let api = api();
        let respond = format!("/friendships/respond/{}", FriendshipId::new_v4());

        let (status, json) = call(
            &api,
            "PUT",
            &respond,
            None,
            Some(r#"{"action":"maybe"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&json), "Unauthenticated");
    }

    #[tokio::test]
    async fn malformed_ids_and_actions_are_invalid_requests() {
        let api = api();

        let (status, json) =
            call(&api, "POST", "/friendships/request/42", Some("alice"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&json), "InvalidRequest");

        let respond = format!("/friendships/respond/{}", FriendshipId::new_v4());
        let (status, json) = call(
            &api,
            "PUT",
            &respond,
            Some("bob"),
            Some(r#"{"action":"maybe"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&json), "InvalidRequest");
    }
}
