//! Desk API router.
//!
//! Returns a composable `Router` mounted under `/api/`.
//! Middleware (outermost first): CORS, audit logger.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the desk API router over shared core state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // Path params use `:param` syntax (axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::register),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route("/patients/:id/notes", post(endpoints::patients::add_note))
        .route("/patients/:id/opd-slips", post(endpoints::opd::from_patient))
        .route("/opd-slips", post(endpoints::opd::from_snapshot))
        .route("/identifications", post(endpoints::identification::log_event))
        .route("/admissions", post(endpoints::admissions::admit))
        .route("/drafts/symptoms", post(endpoints::drafts::symptoms))
        .route("/drafts/report-summary", post(endpoints::drafts::report_summary))
        .route("/drafts/note", post(endpoints::drafts::note))
        .route("/drafts/prescription", post(endpoints::drafts::prescription))
        .route(
            "/drafts/prescription/sections",
            post(endpoints::drafts::prescription_sections),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    Router::new()
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::pipeline::generation::{GenerationClient, MockGenerationClient};
    use crate::registry::InMemoryPatientRegistry;
    use crate::store::{InMemoryRecordStore, RecordStore};

    fn test_core(
        records: Arc<dyn RecordStore>,
        generation: Arc<MockGenerationClient>,
    ) -> Arc<CoreState> {
        let config = AppConfig {
            db_path: None,
            ..AppConfig::default()
        };
        let generation: Arc<dyn GenerationClient> = generation;
        Arc::new(CoreState::new(
            config,
            Arc::new(InMemoryPatientRegistry::new()),
            records,
            generation,
        ))
    }

    fn default_core() -> Arc<CoreState> {
        test_core(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(MockGenerationClient::new("Rest and fluids.")),
        )
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn jane_roe() -> serde_json::Value {
        json!({
            "name": "Jane Roe",
            "age": 34,
            "gender": "female",
            "bloodGroup": "O+",
            "emergencyContactName": "John Roe",
            "emergencyContactPhone": "+19876543210"
        })
    }

    #[tokio::test]
    async fn health_response_shape() {
        let app = api_router(default_core());
        let response = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["recordStore"], "memory");
        assert_eq!(json["patientCount"], 0);
        assert_eq!(json["modelAvailable"], true);
        assert!(!json["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_reports_missing_model() {
        let mock = MockGenerationClient::new("unused").with_models(vec!["llama3:8b".into()]);
        let core = test_core(Arc::new(InMemoryRecordStore::new()), Arc::new(mock));
        let response = api_router(core)
            .oneshot(get_request("/api/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["model"], "medgemma:4b");
        assert_eq!(json["modelAvailable"], false);
    }

    #[tokio::test]
    async fn registration_missing_blood_group_lists_the_field() {
        let mut body = jane_roe();
        body.as_object_mut().unwrap().remove("bloodGroup");
        let app = api_router(default_core());
        let response = app.oneshot(post_json("/api/patients", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "MISSING_INPUT");
        assert_eq!(json["error"]["fields"][0]["field"], "bloodGroup");
    }

    #[tokio::test]
    async fn wrong_typed_body_uses_error_contract() {
        let app = api_router(default_core());
        let response = app
            .oneshot(post_json(
                "/api/identifications",
                json!({
                    "patientId": 42,
                    "identificationTimestamp": "2024-05-01T09:30:00Z",
                    "method": "face"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("patientId"));
    }

    #[tokio::test]
    async fn malformed_json_uses_error_contract() {
        let app = api_router(default_core());
        let request = Request::builder()
            .method("POST")
            .uri("/api/admissions")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"patientId\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn not_found_for_unknown_route() {
        let app = api_router(default_core());
        let response = app.oneshot(get_request("/api/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_then_fetch_patient() {
        let core = default_core();

        let response = api_router(core.clone())
            .oneshot(post_json("/api/patients", jane_roe()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = response_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("patient-"));
        assert_eq!(created["medicalHistory"], json!([]));

        let response = api_router(core.clone())
            .oneshot(get_request(&format!("/api/patients/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = response_json(response).await;
        assert_eq!(fetched["name"], "Jane Roe");
        assert_eq!(fetched["gender"], "female");

        let response = api_router(core)
            .oneshot(get_request("/api/patients"))
            .await
            .unwrap();
        let list = response_json(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn unknown_patient_is_404() {
        let app = api_router(default_core());
        let response = app
            .oneshot(get_request("/api/patients/patient-0-nobody"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn invalid_registration_is_400_with_fields() {
        let mut body = jane_roe();
        body["emergencyContactPhone"] = json!("call-me");
        let app = api_router(default_core());
        let response = app.oneshot(post_json("/api/patients", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["fields"][0]["field"], "emergencyContactPhone");
    }

    #[tokio::test]
    async fn note_for_unknown_patient_is_not_recorded() {
        let app = api_router(default_core());
        let response = app
            .oneshot(post_json(
                "/api/patients/patient-0-nobody/notes",
                json!({"content": "Follow-up in 2 weeks"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["recorded"], false);
        assert!(json.get("note").is_none());
    }

    #[tokio::test]
    async fn blank_draft_input_never_reaches_model() {
        let mock = Arc::new(MockGenerationClient::new("unused"));
        let core = test_core(Arc::new(InMemoryRecordStore::new()), mock.clone());
        let response = api_router(core)
            .oneshot(post_json("/api/drafts/symptoms", json!({"symptoms": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "MISSING_INPUT");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn symptom_draft_carries_disclaimer() {
        let mock = Arc::new(MockGenerationClient::new(
            "Based on the reported symptoms, a viral infection is possible.",
        ));
        let core = test_core(Arc::new(InMemoryRecordStore::new()), mock.clone());
        let response = api_router(core)
            .oneshot(post_json(
                "/api/drafts/symptoms",
                json!({"symptoms": "fever, cough for 3 days"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert!(json["analysis"].as_str().unwrap().starts_with("Based on"));
        assert!(json["disclaimer"].as_str().unwrap().starts_with("Disclaimer:"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_model_output_is_502() {
        let mock = Arc::new(MockGenerationClient::new("<think>only thoughts</think>  "));
        let core = test_core(Arc::new(InMemoryRecordStore::new()), mock);
        let response = api_router(core)
            .oneshot(post_json(
                "/api/drafts/prescription",
                json!({"diagnosis": "Acute bronchitis"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "GENERATION_EMPTY");
    }

    #[tokio::test]
    async fn walk_in_slip_has_dated_token() {
        let records = Arc::new(InMemoryRecordStore::new());
        let core = test_core(
            records.clone(),
            Arc::new(MockGenerationClient::new("unused")),
        );
        let response = api_router(core)
            .oneshot(post_json(
                "/api/opd-slips",
                json!({
                    "patientId": "patient-1-abc123",
                    "patientName": "Jane Roe",
                    "patientAge": 34,
                    "patientGender": "female",
                    "doctorName": "Dr. Rao"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let token = json["tokenNumber"].as_str().unwrap();
        let re = regex::Regex::new(r"^OPD-\d{8}-\d{6}$").unwrap();
        assert!(re.is_match(token), "unexpected token {token}");
        assert_eq!(json["department"], "General Medicine");
        assert_eq!(json["doctorName"], "Dr. Rao");
        assert_eq!(json["persistence"]["stored"], true);
        assert_eq!(records.opd_slips().len(), 1);
    }

    #[tokio::test]
    async fn slip_survives_store_failure() {
        let core = test_core(
            Arc::new(InMemoryRecordStore::failing("disk full")),
            Arc::new(MockGenerationClient::new("unused")),
        );
        let registered = api_router(core.clone())
            .oneshot(post_json("/api/patients", jane_roe()))
            .await
            .unwrap();
        let id = response_json(registered).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = api_router(core)
            .oneshot(post_json(&format!("/api/patients/{id}/opd-slips"), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["patientId"], id.as_str());
        assert_eq!(json["patientName"], "Jane Roe");
        assert_eq!(json["persistence"]["stored"], false);
        assert!(json["persistence"]["error"]
            .as_str()
            .unwrap()
            .contains("disk full"));
    }

    #[tokio::test]
    async fn slip_for_unknown_patient_is_404() {
        let app = api_router(default_core());
        let response = app
            .oneshot(post_json("/api/patients/patient-0-nobody/opd-slips", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn identification_is_logged() {
        let records = Arc::new(InMemoryRecordStore::new());
        let core = test_core(
            records.clone(),
            Arc::new(MockGenerationClient::new("unused")),
        );
        let response = api_router(core)
            .oneshot(post_json(
                "/api/identifications",
                json!({
                    "patientId": "patient-1-abc123",
                    "identificationTimestamp": "2024-05-01T09:30:00Z",
                    "method": "face"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert!(json["logId"].as_str().unwrap().starts_with("log-"));
        assert_eq!(json["persistence"]["stored"], true);
        assert_eq!(records.identification_events().len(), 1);
    }

    #[tokio::test]
    async fn admission_without_consent_is_rejected() {
        let app = api_router(default_core());
        let response = app
            .oneshot(post_json(
                "/api/admissions",
                json!({
                    "patientId": "patient-1-abc123",
                    "consentGiven": false,
                    "dateTime": "2024-05-01T09:30:00Z",
                    "name": "Jane Roe",
                    "age": 34,
                    "bloodGroup": "O+"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["fields"][0]["code"], "CONSENT_REQUIRED");
    }

    #[tokio::test]
    async fn sections_endpoint_partitions_text() {
        let app = api_router(default_core());
        let text = "Medications\n1. Amoxicillin 500mg\nAdvice\n- Rest\nDisclaimer: Verify before use.";
        let response = app
            .oneshot(post_json(
                "/api/drafts/prescription/sections",
                json!({ "text": text }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["medications"], json!(["Amoxicillin 500mg"]));
        assert_eq!(json["advice"], json!(["Rest"]));
    }

    #[tokio::test]
    async fn sections_endpoint_rejects_blank_text() {
        let app = api_router(default_core());
        let response = app
            .oneshot(post_json(
                "/api/drafts/prescription/sections",
                json!({ "text": "  " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
