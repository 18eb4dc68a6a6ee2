use std::convert::Infallible;

use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::config::Config;
use crate::constants::SESSION_COOKIE;
use crate::error::ApiError;

use super::jwt::{verify_jwt_session, SessionData};

/// Requires a valid session cookie; rejects with 401 otherwise.
pub fn with_session(
    config: Config,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).and_then(move |cookie: Option<String>| {
        let config = config.clone();
        async move {
            let token = cookie.ok_or_else(|| {
                Rejection::from(ApiError::unauthorized("Authentication required"))
            })?;
            match verify_jwt_session(&token, &config) {
                Ok(data) => Ok(SessionData::from(data)),
                Err(e) => Err(Rejection::from(e)),
            }
        }
    })
}

/// Extracts the session when the cookie is present and valid; anonymous
/// callers pass through as `None`.
pub fn with_possible_session(
    config: Config,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(move |cookie: Option<String>| {
        cookie
            .and_then(|token| verify_jwt_session(&token, &config).ok())
            .map(SessionData::from)
    })
}

/// Renders `ApiError` rejections as JSON replies with the matching status.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(api_error) = err.find::<ApiError>() {
        let body = warp::reply::json(api_error);
        return Ok(warp::reply::with_status(body, api_error.status()));
    }

    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let fallback = ApiError::Database(String::from("Unhandled rejection"));
    let body = warp::reply::json(&fallback);
    Ok(warp::reply::with_status(body, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::{User, UserRole};
    use crate::jwt::generate_jwt_session;
    use std::path::PathBuf;

    fn config() -> Config {
        Config {
            database_url: String::from("postgres://localhost/plateful"),
            jwt_secret: String::from("test-secret"),
            session_ttl_hours: 1,
            media_root: PathBuf::from("media"),
        }
    }

    fn user() -> User {
        User {
            id: 1,
            email: String::from("a@example.com"),
            username: String::from("a"),
            first_name: String::from("Ada"),
            last_name: String::from("Author"),
            password: String::from("hash"),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn possible_session_passes_anonymous_callers_through() {
        let filter = with_possible_session(config());
        let session = warp::test::request().filter(&filter).await.unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn possible_session_ignores_an_invalid_cookie() {
        let filter = with_possible_session(config());
        let session = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}=not-a-token"))
            .filter(&filter)
            .await
            .unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn possible_session_extracts_a_valid_cookie() {
        let config = config();
        let token = generate_jwt_session(&user(), &config).unwrap();
        let filter = with_possible_session(config);
        let session = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}={token}"))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(session.unwrap().user_id, 1);
    }

    #[tokio::test]
    async fn session_is_required_for_authenticated_filters() {
        let filter = with_session(config());
        let result = warp::test::request().filter(&filter).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn session_filter_accepts_a_valid_cookie() {
        let config = config();
        let token = generate_jwt_session(&user(), &config).unwrap();
        let filter = with_session(config);
        let session = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}={token}"))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(session.user_id, 1);
    }
}
