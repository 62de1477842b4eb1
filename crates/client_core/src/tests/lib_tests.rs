use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{domain::PatientId, protocol::number_from_f64};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    updates: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn fetch_handler(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    match id.as_str() {
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false })),
        ),
        "missing" => (StatusCode::OK, Json(json!({ "success": false }))),
        _ => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "_id": id,
                    "bloodPressure": 130,
                    "respiratoryRate": 18,
                    "bloodOxygenLevel": 95,
                    "heartbeatRate": 88.5,
                    "chiefComplaint": "Chest pain",
                    "pastMedicalHistory": "Hypertension",
                    "medicalDiagnosis": "Angina",
                    "medicalPrescription": "Nitroglycerin",
                    "creationDateTime": "2023-11-02T10:00:00.000Z",
                    "patient": { "_id": "patient-7", "firstName": "Grace" }
                }
            })),
        ),
    }
}

async fn update_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let success = id != "locked";
    state.updates.lock().await.push((id, body));
    Json(json!({ "success": success }))
}

async fn spawn_clinical_tests_server() -> anyhow::Result<(String, ServerState)> {
    let state = ServerState::default();
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(
            "/api/clinical-tests/clinical-testsById/:id",
            get(fetch_handler),
        )
        .route("/api/clinical-tests/clinical-tests/:id", put(update_handler))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn sample_request() -> UpdateClinicalTestRequest {
    UpdateClinicalTestRequest {
        blood_pressure: serde_json::Number::from(125),
        respiratory_rate: serde_json::Number::from(17),
        blood_oxygen_level: serde_json::Number::from(96),
        heartbeat_rate: number_from_f64(80.5).expect("finite"),
        chief_complaint: "Chest pain".into(),
        past_medical_history: "Hypertension".into(),
        medical_diagnosis: "Angina".into(),
        medical_prescription: "Nitroglycerin".into(),
        creation_date_time: chrono::Utc::now(),
        patient_id: PatientId::new("patient-7"),
    }
}

#[test]
fn endpoint_urls_follow_service_layout() {
    let api = HttpClinicalTestsApi::new("https://clinic.example/").expect("api");
    let id = ClinicalTestId::new("656f1c");
    assert_eq!(
        api.fetch_url(&id).expect("url").as_str(),
        "https://clinic.example/api/clinical-tests/clinical-testsById/656f1c"
    );
    assert_eq!(
        api.update_url(&id).expect("url").as_str(),
        "https://clinic.example/api/clinical-tests/clinical-tests/656f1c"
    );
}

#[test]
fn endpoint_urls_keep_base_path_and_escape_ids() {
    let api = HttpClinicalTestsApi::new("http://localhost:3000/backend").expect("api");
    assert_eq!(
        api.fetch_url(&ClinicalTestId::new("a/b c"))
            .expect("url")
            .as_str(),
        "http://localhost:3000/backend/api/clinical-tests/clinical-testsById/a%2Fb%20c"
    );
}

#[test]
fn rejects_invalid_base_url() {
    assert!(matches!(
        HttpClinicalTestsApi::new("localhost:3000"),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
}

#[tokio::test]
async fn fetch_decodes_record_envelope() {
    let (server_url, _state) = spawn_clinical_tests_server().await.expect("spawn server");
    let api = HttpClinicalTestsApi::new(&server_url).expect("api");

    let response = api
        .fetch_clinical_test(&ClinicalTestId::new("ct-1"))
        .await
        .expect("fetch");
    let record = response.into_record().expect("record");
    assert_eq!(record.patient_id(), PatientId::new("patient-7"));
    assert_eq!(record.chief_complaint.as_deref(), Some("Chest pain"));
}

#[tokio::test]
async fn fetch_reports_non_success_status() {
    let (server_url, _state) = spawn_clinical_tests_server().await.expect("spawn server");
    let api = HttpClinicalTestsApi::new(&server_url).expect("api");

    let err = api
        .fetch_clinical_test(&ClinicalTestId::new("boom"))
        .await
        .expect_err("500");
    assert!(matches!(
        err,
        ClientError::Status { status, .. } if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
    ));
}

#[tokio::test]
async fn update_sends_remote_schema_body() {
    let (server_url, state) = spawn_clinical_tests_server().await.expect("spawn server");
    let api = HttpClinicalTestsApi::new(&server_url).expect("api");

    let response = api
        .update_clinical_test(&ClinicalTestId::new("ct-1"), &sample_request())
        .await
        .expect("update");
    assert!(response.success);

    let updates = state.updates.lock().await;
    assert_eq!(updates.len(), 1);
    let (id, body) = &updates[0];
    assert_eq!(id, "ct-1");
    assert_eq!(body["bloodPressure"], json!(125));
    assert_eq!(body["heartbeatRate"], json!(80.5));
    assert_eq!(body["chiefComplaint"], "Chest pain");
    assert_eq!(body["patientId"], "patient-7");
    assert!(body["creationDateTime"]
        .as_str()
        .is_some_and(|ts| ts.ends_with('Z')));
    assert!(body.get("chiefcomplaint").is_none());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpClinicalTestsApi::new(&format!("http://{addr}")).expect("api");
    let err = api
        .fetch_clinical_test(&ClinicalTestId::new("ct-1"))
        .await
        .expect_err("connection refused");
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn edit_screen_round_trip_over_http() {
    let (server_url, state) = spawn_clinical_tests_server().await.expect("spawn server");
    let api = Arc::new(HttpClinicalTestsApi::new(&server_url).expect("api"));
    let screen = EditClinicalTestController::new(
        api,
        ClinicalTestId::new("ct-9"),
        Route::new("ClinicalTests"),
    );

    assert_eq!(screen.load().await, LoadOutcome::Populated);
    assert_eq!(screen.form().await.heartbeat_rate, "88.5");
    screen
        .update_field(shared::domain::FormField::HeartbeatRate, "90")
        .await;

    let outcome = screen.submit().await.expect("submit");
    assert_eq!(outcome, SubmitOutcome::Navigated(Route::new("ClinicalTests")));

    let updates = state.updates.lock().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "ct-9");
    assert_eq!(updates[0].1["heartbeatRate"], json!(90));
    assert_eq!(updates[0].1["bloodOxygenLevel"], json!(95));
    assert_eq!(updates[0].1["patientId"], "patient-7");
}

#[tokio::test]
async fn edit_screen_load_survives_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = Arc::new(HttpClinicalTestsApi::new(&format!("http://{addr}")).expect("api"));
    let screen = EditClinicalTestController::new(
        api,
        ClinicalTestId::new("ct-9"),
        Route::new("ClinicalTests"),
    );
    let mut events = screen.subscribe_events();

    assert_eq!(screen.load().await, LoadOutcome::Failed);
    assert!(screen.form().await.is_empty());
    assert_eq!(screen.phase().await, ScreenPhase::Ready);

    let mut saw_alert = false;
    while let Ok(event) = events.try_recv() {
        if let ScreenEvent::Alert(alert) = event {
            assert_eq!(alert.title, "Error");
            saw_alert = true;
        }
    }
    assert!(saw_alert);
}

#[tokio::test]
async fn server_reported_failure_does_not_navigate() {
    let (server_url, state) = spawn_clinical_tests_server().await.expect("spawn server");
    let api = Arc::new(HttpClinicalTestsApi::new(&server_url).expect("api"));
    let screen = EditClinicalTestController::new(
        api,
        ClinicalTestId::new("locked"),
        Route::new("ClinicalTests"),
    );

    screen.load().await;
    let err = screen.submit().await.expect_err("locked");
    assert!(matches!(err, SubmitError::Rejected { .. }));
    assert_eq!(screen.phase().await, ScreenPhase::Ready);
    assert_eq!(state.updates.lock().await.len(), 1);
}
