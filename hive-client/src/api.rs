//! HTTP client for the forum REST API.
//!
//! Mutations go straight to the server; the resulting push events (or the
//! returned records) reach the store through the normal paths.

use std::sync::{PoisonError, RwLock};

use askhive_types::{Answer, AuthResponse, Question, QuestionId, User};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// REST API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL does not parse.
    #[error("invalid api url {url}: {reason}")]
    InvalidUrl {
        /// The offending value.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic one.
        message: String,
    },

    /// A success response whose body is not what the endpoint returns.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The endpoint needs a token and none is set.
    #[error("not signed in")]
    NotAuthenticated,
}

impl ApiError {
    /// HTTP status, for server-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct SuggestionBody {
    suggestion: String,
}

/// Client for the forum REST API.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: RwLock::new(None),
        })
    }

    /// Set or clear the bearer token sent with requests.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// The current bearer token.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `POST /api/auth/register`
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = RegisterBody {
            username,
            email,
            password,
        };
        let request = self.request(Method::POST, "api/auth/register", false)?.json(&body);
        self.execute(request).await
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginBody { username, password };
        let request = self.request(Method::POST, "api/auth/login", false)?.json(&body);
        self.execute(request).await
    }

    /// `GET /api/auth/me`
    pub async fn me(&self) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "api/auth/me", true)?;
        self.execute(request).await
    }

    /// `GET /api/questions`
    pub async fn list_questions(&self) -> Result<Vec<Question>, ApiError> {
        let request = self.request(Method::GET, "api/questions", false)?;
        self.execute(request).await
    }

    /// `POST /api/questions`
    pub async fn create_question(&self, message: &str) -> Result<Question, ApiError> {
        let request = self
            .request(Method::POST, "api/questions", false)?
            .json(&MessageBody { message });
        self.execute(request).await
    }

    /// `POST /api/questions/{id}/answers`
    pub async fn add_answer(&self, id: QuestionId, message: &str) -> Result<Answer, ApiError> {
        let path = format!("api/questions/{id}/answers");
        let request = self
            .request(Method::POST, &path, false)?
            .json(&MessageBody { message });
        self.execute(request).await
    }

    /// `PUT /api/questions/{id}/mark-answered`
    pub async fn mark_answered(&self, id: QuestionId) -> Result<Question, ApiError> {
        let path = format!("api/questions/{id}/mark-answered");
        let request = self.request(Method::PUT, &path, false)?;
        self.execute(request).await
    }

    /// `PUT /api/questions/{id}/escalate`
    pub async fn escalate(&self, id: QuestionId) -> Result<Question, ApiError> {
        let path = format!("api/questions/{id}/escalate");
        let request = self.request(Method::PUT, &path, false)?;
        self.execute(request).await
    }

    /// `POST /api/questions/{id}/ai-suggest`
    pub async fn ai_suggest(&self, id: QuestionId) -> Result<String, ApiError> {
        let path = format!("api/questions/{id}/ai-suggest");
        let request = self.request(Method::POST, &path, false)?;
        let body: SuggestionBody = self.execute(request).await?;
        Ok(body.suggestion)
    }

    /// Build a request, attaching the bearer token when one is set.
    fn request(
        &self,
        method: Method,
        path: &str,
        requires_auth: bool,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.base.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{path}", self.base),
            reason: e.to_string(),
        })?;
        let builder = self.http.request(method, url);
        match self.token() {
            Some(token) => Ok(builder.bearer_auth(token)),
            None if requires_auth => Err(ApiError::NotAuthenticated),
            None => Ok(builder),
        }
    }

    async fn execute<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ApiError> {
        let response = request.send().await?;
        decode(response).await
    }
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        debug!(status = status.as_u16(), "api request failed");
        return Err(ApiError::Request {
            status: status.as_u16(),
            message: server_message(&body).unwrap_or_else(|| generic_message(status)),
        });
    }
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The `detail` or `message` field of an error body.
///
/// Validation failures carry `detail` as a list of `{ msg }` objects; their
/// messages are joined.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("message"))? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

fn generic_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("request failed: {reason}"),
        None => "request failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askhive_types::QuestionStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn question(id: u64, status: &str) -> Value {
        json!({
            "id": id,
            "user_id": 3,
            "message": format!("question {id}"),
            "status": status,
            "created_at": "2025-03-01T12:00:00",
            "answers": []
        })
    }

    fn auth_body() -> Value {
        json!({
            "access_token": "tok-123",
            "token_type": "bearer",
            "user": { "id": 3, "username": "ana", "email": "ana@example.com" }
        })
    }

    async fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri()).unwrap()
    }

    // ===========================================
    // Auth
    // ===========================================

    #[tokio::test]
    async fn login_returns_token_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "username": "ana", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
            .mount(&server)
            .await;

        let auth = client(&server).await.login("ana", "pw").await.unwrap();
        assert_eq!(auth.access_token, "tok-123");
        assert_eq!(auth.user.username, "ana");
    }

    #[tokio::test]
    async fn register_sends_all_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .and(body_json(json!({
                "username": "ana",
                "email": "ana@example.com",
                "password": "pw"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
            .mount(&server)
            .await;

        let auth = client(&server)
            .await
            .register("ana", "ana@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(auth.user.id.value(), 3);
    }

    #[tokio::test]
    async fn me_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": 3, "username": "ana" })),
            )
            .mount(&server)
            .await;

        let api = client(&server).await;
        api.set_token(Some("tok-123".into()));
        let user = api.me().await.unwrap();
        assert_eq!(user.username, "ana");
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn me_without_token_fails_locally() {
        let server = MockServer::start().await;
        let api = client(&server).await;
        assert!(matches!(api.me().await, Err(ApiError::NotAuthenticated)));
    }

    // ===========================================
    // Questions
    // ===========================================

    #[tokio::test]
    async fn list_questions_decodes_naive_timestamps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/questions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([question(1, "pending"), question(2, "escalated")])),
            )
            .mount(&server)
            .await;

        let questions = client(&server).await.list_questions().await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].status, QuestionStatus::Escalated);
    }

    #[tokio::test]
    async fn create_question_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/questions"))
            .and(body_json(json!({ "message": "why?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(question(9, "pending")))
            .mount(&server)
            .await;

        let created = client(&server).await.create_question("why?").await.unwrap();
        assert_eq!(created.id, QuestionId::new(9));
    }

    #[tokio::test]
    async fn add_answer_returns_the_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/questions/4/answers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 40,
                "message": "because",
                "created_at": "2025-03-01T12:30:00Z"
            })))
            .mount(&server)
            .await;

        let answer = client(&server)
            .await
            .add_answer(QuestionId::new(4), "because")
            .await
            .unwrap();
        assert_eq!(answer.message, "because");
        assert!(answer.user_id.is_none());
    }

    #[tokio::test]
    async fn status_endpoints_use_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/questions/4/escalate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(question(4, "escalated")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/questions/4/mark-answered"))
            .and(header("authorization", "Bearer admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(question(4, "answered")))
            .mount(&server)
            .await;

        let api = client(&server).await;
        let escalated = api.escalate(QuestionId::new(4)).await.unwrap();
        assert_eq!(escalated.status, QuestionStatus::Escalated);

        api.set_token(Some("admin".into()));
        let answered = api.mark_answered(QuestionId::new(4)).await.unwrap();
        assert_eq!(answered.status, QuestionStatus::Answered);
    }

    #[tokio::test]
    async fn ai_suggest_unwraps_the_suggestion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/questions/4/ai-suggest"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "suggestion": "Reboot it." })),
            )
            .mount(&server)
            .await;

        let text = client(&server)
            .await
            .ai_suggest(QuestionId::new(4))
            .await
            .unwrap();
        assert_eq!(text, "Reboot it.");
    }

    // ===========================================
    // Error Mapping
    // ===========================================

    #[tokio::test]
    async fn detail_field_becomes_the_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "detail": "Incorrect username or password" })),
            )
            .mount(&server)
            .await;

        let err = client(&server).await.login("ana", "bad").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(matches!(
            err,
            ApiError::Request { ref message, .. } if message == "Incorrect username or password"
        ));
    }

    #[tokio::test]
    async fn message_field_is_used_when_detail_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/questions/1/escalate"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({ "message": "already answered" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .escalate(QuestionId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Request { status: 409, ref message } if message == "already answered"
        ));
    }

    #[tokio::test]
    async fn validation_details_are_joined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/questions"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [
                    { "loc": ["body", "message"], "msg": "field required" },
                    { "loc": ["body"], "msg": "too short" }
                ]
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_question("")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Request { ref message, .. } if message == "field required; too short"
        ));
    }

    #[tokio::test]
    async fn unreadable_error_body_gets_a_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/questions/2/ai-suggest"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .ai_suggest(QuestionId::new(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Request { status: 503, ref message }
                if message == "request failed: Service Unavailable"
        ));
    }

    #[tokio::test]
    async fn wrong_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "oops": true })))
            .mount(&server)
            .await;

        let err = client(&server).await.list_questions().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn base_path_is_kept_when_joining() {
        let api = ApiClient::new("http://forum.test/prefix").unwrap();
        let request = api.request(Method::GET, "api/questions", false).unwrap();
        let built = request.build().unwrap();
        assert_eq!(built.url().as_str(), "http://forum.test/prefix/api/questions");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("::nope::"),
            Err(ApiError::InvalidUrl { .. })
        ));
    }
}
