mod pages;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use frontdesk_core::{Desk, DeskError, RequestBoard, timestamp};
use frontdesk_memory::JsonFileStore;
use frontdesk_token::{IssuedToken, TokenError, TokenIssuer};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared handler state. The desk sits behind one mutex so that concurrent
/// handlers never interleave their load/save cycles on the JSON files.
pub struct AppState {
    desk: Mutex<Desk<JsonFileStore>>,
    issuer: Option<TokenIssuer>,
}

impl AppState {
    pub fn new(desk: Desk<JsonFileStore>, issuer: Option<TokenIssuer>) -> Self {
        Self {
            desk: Mutex::new(desk),
            issuer,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiHealth {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct CallInput {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Serialize)]
struct CallOutput {
    response: String,
}

#[derive(Debug, Deserialize)]
struct AnswerForm {
    id: u64,
    #[serde(default)]
    answer: String,
}

type HandlerError = (StatusCode, String);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ask", get(ask_page))
        .route("/supervisor", get(supervisor_page))
        .route("/supervisor/answer", post(supervisor_answer))
        .route("/receive_call", post(receive_call))
        .route("/get_livekit_token", get(get_livekit_token))
        .route("/api/health", get(api_health))
        .route("/api/requests", get(api_requests))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let app = router(Arc::new(state));
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid bind address: {bind_addr}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "front desk listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Redirect {
    Redirect::to("/ask")
}

async fn ask_page() -> Html<String> {
    Html(pages::ask())
}

async fn supervisor_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, HandlerError> {
    let board = load_board(&state).await?;
    Ok(Html(pages::dashboard(&board)))
}

async fn api_requests(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RequestBoard>, HandlerError> {
    Ok(Json(load_board(&state).await?))
}

async fn load_board(state: &AppState) -> Result<RequestBoard, HandlerError> {
    let mut desk = state.desk.lock().await;
    desk.list(timestamp::now()).map_err(desk_error)
}

async fn supervisor_answer(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnswerForm>,
) -> Result<Redirect, HandlerError> {
    let mut desk = state.desk.lock().await;
    desk.answer(form.id, &form.answer, timestamp::now())
        .map_err(desk_error)?;
    Ok(Redirect::to("/supervisor"))
}

async fn receive_call(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CallInput>,
) -> Result<Json<CallOutput>, HandlerError> {
    let mut desk = state.desk.lock().await;
    let outcome = desk
        .ask(&input.question, timestamp::now())
        .map_err(desk_error)?;
    Ok(Json(CallOutput {
        response: outcome.response().to_string(),
    }))
}

async fn get_livekit_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IssuedToken>, HandlerError> {
    let Some(issuer) = &state.issuer else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "voice tokens are not configured".to_string(),
        ));
    };
    let issued = issuer.issue().map_err(token_error)?;
    info!(identity = %issued.identity, room = %issued.room, "issued voice token");
    Ok(Json(issued))
}

async fn api_health() -> impl IntoResponse {
    Json(ApiHealth { status: "ok" })
}

fn desk_error(err: DeskError) -> HandlerError {
    let status = match &err {
        DeskError::Validation(_) => StatusCode::BAD_REQUEST,
        DeskError::NotFound(_) => StatusCode::NOT_FOUND,
        DeskError::NotPending { .. } => StatusCode::CONFLICT,
        DeskError::Store(_) => {
            error!(error = %err, "store failure");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("internal error: {err}"),
            );
        }
    };
    warn!(error = %err, "request rejected");
    (status, err.to_string())
}

fn token_error(err: TokenError) -> HandlerError {
    error!(error = %err, "token minting failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("internal error: {err}"),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use frontdesk_core::{HelpRequest, RequestStatus, Store};
    use frontdesk_token::Credentials;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    fn app_with(issuer: Option<TokenIssuer>) -> (TempDir, Router) {
        let tmp = tempdir().expect("tempdir");
        let desk = Desk::with_timeout_minutes(JsonFileStore::in_dir(tmp.path()), 60);
        (tmp, router(Arc::new(AppState::new(desk, issuer))))
    }

    fn ask_request(question: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/receive_call")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "question": question }).to_string(),
            ))
            .expect("request")
    }

    fn answer_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/supervisor/answer")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request")
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    async fn text_body(res: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn root_redirects_to_ask() {
        let (_tmp, app) = app_with(None);
        let res = app
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/ask");
    }

    #[tokio::test]
    async fn escalate_answer_then_learned() {
        let (_tmp, app) = app_with(None);

        let res = app
            .clone()
            .oneshot(ask_request("what are your hours"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json_body(res).await["response"],
            "Let me check with my supervisor and get back to you."
        );

        let res = app
            .clone()
            .oneshot(answer_request("id=1&answer=9+to+5"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/supervisor");

        let res = app
            .oneshot(ask_request("  What are your HOURS "))
            .await
            .expect("response");
        assert_eq!(json_body(res).await["response"], "9 to 5");
    }

    #[tokio::test]
    async fn answer_errors_map_to_status_codes() {
        let (_tmp, app) = app_with(None);
        app.clone()
            .oneshot(ask_request("lost keys"))
            .await
            .expect("response");

        let res = app
            .clone()
            .oneshot(answer_request("id=1&answer=+++"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .clone()
            .oneshot(answer_request("id=99&answer=yes"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        app.clone()
            .oneshot(answer_request("id=1&answer=front+desk"))
            .await
            .expect("response");
        let res = app
            .oneshot(answer_request("id=1&answer=again"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn blank_question_is_bad_request() {
        let (_tmp, app) = app_with(None);
        let res = app.oneshot(ask_request("   ")).await.expect("response");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_view_times_out_stale_requests() {
        let (tmp, app) = app_with(None);
        let mut store = JsonFileStore::in_dir(tmp.path());
        let stale = timestamp::parse("2000-01-01 00:00:00").expect("timestamp");
        store
            .save_requests(&[HelpRequest::pending(1, "is anyone <there>?", stale)])
            .expect("seed");

        let res = app
            .clone()
            .oneshot(Request::get("/supervisor").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        let html = text_body(res).await;
        assert!(html.contains("is anyone &lt;there&gt;?"));
        assert!(html.contains("timed out"));

        let stored = store.load_requests().expect("load");
        assert_eq!(stored[0].status, RequestStatus::Unresolved);
        assert!(stored[0].timeout_at.is_some());

        let res = app
            .oneshot(Request::get("/api/requests").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let board = json_body(res).await;
        assert_eq!(board["unresolved"][0]["id"], 1);
        assert_eq!(board["pending"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn token_endpoint_requires_configuration() {
        let (_tmp, app) = app_with(None);
        let res = app
            .oneshot(Request::get("/get_livekit_token").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn token_endpoint_returns_signed_room_token() {
        let issuer = TokenIssuer::new(
            Credentials {
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                url: "wss://voice.example.test".to_string(),
            },
            "ai_voice_room",
            Duration::from_secs(600),
        );
        let (_tmp, app) = app_with(Some(issuer));
        let res = app
            .oneshot(Request::get("/get_livekit_token").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["room"], "ai_voice_room");
        assert_eq!(body["url"], "wss://voice.example.test");
        let identity = body["identity"].as_str().expect("identity");
        assert!(identity.starts_with("caller_"));

        let claims = frontdesk_token::verify(body["token"].as_str().expect("token"), "secret")
            .expect("verify");
        assert_eq!(claims.sub, identity);
    }
}
