//! Axum route handlers for the planning API.

use crate::output::render_text;
use crate::request::{TripForm, TripRequest};
use crate::status::{PlanningRegistry, PlanningStatus, RunState, StatusTracker};
use crate::workflow::Coordinator;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct AppState {
    pub registry: PlanningRegistry,
    pub coordinator: Arc<Coordinator>,
}

#[derive(Debug, Deserialize)]
pub struct PlanBody {
    #[serde(alias = "tripDetails")]
    pub trip_details: TripForm,
    /// Accepted for compatibility with older clients; only one planning mode exists
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_id: Option<String>,
}

impl ApiResponse {
    fn ok(message: impl Into<String>, planning_id: String) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            planning_id: Some(planning_id),
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            planning_id: None,
        }
    }
}

/// Run one planning request in the background.
///
/// The coordinator runs in its own task so a panic anywhere below it still ends the run
/// with an error status instead of leaving pollers on `running`.
fn spawn_planning(coordinator: Arc<Coordinator>, request: TripRequest, tracker: StatusTracker) {
    let tracker = Arc::new(tracker);
    tokio::spawn(async move {
        let run_tracker = tracker.clone();
        let run = tokio::spawn(async move {
            // Outcome is published through the tracker
            let _ = coordinator.run(request, &run_tracker).await;
        });
        if let Err(e) = run.await {
            error!("Planning task aborted: {}", e);
            tracker.failed(&format!("planning task aborted: {}", e));
        }
    });
}

/// `trip-<destination>.txt`, limited to ASCII letters, digits and dashes
fn download_filename(destination: &str) -> String {
    let mut slug = String::new();
    for c in destination.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "trip-plan.txt".to_string()
    } else {
        format!("trip-{}.txt", slug)
    }
}

// POST /plan
pub async fn plan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlanBody>,
) -> (StatusCode, Json<ApiResponse>) {
    let request = match TripRequest::from_form(&body.trip_details) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected planning request: {}", e);
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string())));
        }
    };

    if let Some(mode) = &body.mode {
        info!("Ignoring requested planning mode '{}'", mode);
    }

    let planning_id = Uuid::new_v4().to_string();
    let tracker = state.registry.register(&planning_id);
    let coordinator = state.coordinator.clone();
    info!("Planning {} for {}", planning_id, request.destination);

    spawn_planning(coordinator, request, tracker);

    (
        StatusCode::OK,
        Json(ApiResponse::ok("Trip planning started", planning_id)),
    )
}

// GET /planning_status/:id
pub async fn planning_status(
    State(state): State<Arc<AppState>>,
    Path(planning_id): Path<String>,
) -> Response {
    match state.registry.status(&planning_id) {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err("Planning ID not found")),
        )
            .into_response(),
    }
}

// GET /download/:id
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(planning_id): Path<String>,
) -> Response {
    let status: PlanningStatus = match state.registry.status(&planning_id) {
        Some(s) => s,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::err("Planning ID not found")),
            )
                .into_response()
        }
    };

    match (status.status, status.result) {
        (RunState::Completed, Some(plan)) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                download_filename(&plan.destination)
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                render_text(&plan),
            )
                .into_response()
        }
        _ => (
            StatusCode::CONFLICT,
            Json(ApiResponse::err(format!(
                "Planning is {}, nothing to download yet",
                status.status
            ))),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ProviderError;
    use crate::lookup::NoopLookup;
    use crate::provider::{GenerationParams, OfflineReasoner, Reasoner};
    use crate::workflow::state::Message;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Panicking;

    #[async_trait]
    impl Reasoner for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _history: &[Message],
            _params: &GenerationParams,
        ) -> Result<String, ProviderError> {
            panic!("reasoner blew up");
        }
    }

    fn app_state_with(reasoner: Arc<dyn Reasoner>) -> Arc<AppState> {
        let config = Arc::new(Config::default());
        Arc::new(AppState {
            registry: PlanningRegistry::new(8),
            coordinator: Arc::new(Coordinator::new(config, reasoner, Arc::new(NoopLookup))),
        })
    }

    fn app_state() -> Arc<AppState> {
        app_state_with(Arc::new(OfflineReasoner))
    }

    async fn wait_for_terminal(state: &AppState, id: &str) -> PlanningStatus {
        for _ in 0..200 {
            let status = state.registry.status(id).unwrap();
            if status.status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("planning {} did not finish", id);
    }

    fn body(json: &str) -> PlanBody {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let state = app_state();
        let (code, Json(response)) = plan(
            State(state),
            Json(body(
                r#"{"tripDetails": {"destination": "Lisbon", "startDate": "2025-06-10", "endDate": "2025-06-10"}}"#,
            )),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(response.status, "error");
        assert!(response.message.contains("must be after start date"));
        assert!(response.planning_id.is_none());
    }

    #[tokio::test]
    async fn test_plan_poll_and_download() {
        let state = app_state();
        let (code, Json(response)) = plan(
            State(state.clone()),
            Json(body(
                r#"{"trip_details": {"destination": "Lisbon", "startDate": "2025-06-10", "endDate": "2025-06-15", "groupSize": "2"}, "mode": "langgraph"}"#,
            )),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        let id = response.planning_id.unwrap();

        let mut last_progress = 0;
        let mut finished = None;
        for _ in 0..200 {
            let status = state.registry.status(&id).unwrap();
            assert!(status.progress >= last_progress);
            last_progress = status.progress;
            if status.status.is_terminal() {
                finished = Some(status);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let finished = finished.expect("planning did not finish");
        assert_eq!(finished.status, RunState::Completed);
        assert_eq!(finished.result.unwrap().itinerary.len(), 5);

        let response = download(State(state.clone()), Path(id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"trip-lisbon.txt\""
        );
    }

    #[tokio::test]
    async fn test_panicking_run_ends_in_error() {
        let state = app_state_with(Arc::new(Panicking));
        let (code, Json(response)) = plan(
            State(state.clone()),
            Json(body(
                r#"{"trip_details": {"destination": "Lisbon", "startDate": "2025-06-10", "endDate": "2025-06-15"}}"#,
            )),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        let id = response.planning_id.unwrap();

        let status = wait_for_terminal(&state, &id).await;
        assert_eq!(status.status, RunState::Error);
        assert!(status.result.is_none());
        assert!(status
            .error
            .as_deref()
            .unwrap()
            .starts_with("planning task aborted"));

        let response = download(State(state), Path(id)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_download_filename_is_header_safe() {
        assert_eq!(download_filename("New York"), "trip-new-york.txt");
        assert_eq!(download_filename("Lis\"bon\nX"), "trip-lis-bon-x.txt");
        assert_eq!(download_filename("  São Paulo!  "), "trip-s-o-paulo.txt");
        assert_eq!(download_filename("東京"), "trip-plan.txt");
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let state = app_state();
        let response = planning_status(State(state.clone()), Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = download(State(state), Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_before_completion_conflicts() {
        let state = app_state();
        let _tracker = state.registry.register("in-flight");
        let response = download(State(state), Path("in-flight".to_string())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
