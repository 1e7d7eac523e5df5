use std::sync::Arc;

use super::*;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap as AxumHeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{FixedOffset, TimeZone};
use serde_json::{json, Value};
use shared::{
    domain::{AppointmentStatus, TimeWindow},
    protocol::Nullable,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
struct UploadedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct ClinicServerState {
    fetched_segments: Arc<Mutex<Vec<String>>>,
    cookies: Arc<Mutex<Vec<String>>>,
    update_bodies: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<UploadedPart>>>,
    logouts: Arc<Mutex<u32>>,
}

fn appointment_json(id: i64, date: &str, status: &str) -> Value {
    json!({
        "id": id,
        "patientName": format!("patient-{id}"),
        "patientId": format!("P{id}"),
        "patientContactNo": "0770000000",
        "appointmentDate": date,
        "status": status,
        "clinic": {
            "name": "Lakeside Clinic",
            "contactNo": "0112345678",
            "address": "12 Lake Rd"
        }
    })
}

async fn handle_list(
    State(state): State<ClinicServerState>,
    Path(segment): Path<String>,
    headers: AxumHeaderMap,
) -> Result<axum::response::Response, StatusCode> {
    state.fetched_segments.lock().await.push(segment.clone());
    if let Some(cookie) = headers.get("cookie").and_then(|value| value.to_str().ok()) {
        state.cookies.lock().await.push(cookie.to_string());
    }
    match segment.as_str() {
        "all" => Ok((
            [(header::SET_COOKIE, "SESSION=rotated; Path=/")],
            Json(json!([
                appointment_json(1, "2024-06-12T08:15:00", "PENDING"),
                appointment_json(2, "2024-06-10", "CONFIRMED"),
            ])),
        )
            .into_response()),
        "pending" => Ok(Json(json!([appointment_json(1, "2024-06-12T08:15:00", "PENDING")]))
            .into_response()),
        "completed" => Ok(Json(json!({"unexpected": "shape"})).into_response()),
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn handle_update(
    State(state): State<ClinicServerState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state.update_bodies.lock().await.push(body.clone());
    if id == 404 {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut updated = appointment_json(id, body["appointmentDate"].as_str().unwrap_or(""), "PENDING");
    updated["status"] = body["status"].clone();
    updated["remarks"] = body["remarks"].clone();
    updated["medicalRequirement"] = body["medicalRequirement"].clone();
    updated["clinicReportUrl"] = body["clinicReportUrl"].clone();
    Ok(Json(updated))
}

async fn handle_upload(
    State(state): State<ClinicServerState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<String, StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let part = UploadedPart {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: Vec::new(),
        };
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        state.uploads.lock().await.push(UploadedPart {
            bytes: bytes.to_vec(),
            ..part
        });
    }
    match id {
        8 => Ok("Report stored".to_string()),
        9 => Err(StatusCode::PAYLOAD_TOO_LARGE),
        _ => Ok(format!(
            "Report uploaded successfully: https://files.example.org/reports/{id}.pdf (ok)"
        )),
    }
}

async fn handle_logout(State(state): State<ClinicServerState>) -> StatusCode {
    *state.logouts.lock().await += 1;
    StatusCode::OK
}

async fn spawn_clinic_server() -> (String, ClinicServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ClinicServerState::default();
    let app = Router::new()
        .route("/api/clinic/appointments/:segment", get(handle_list))
        .route("/api/clinic/appointments/update/:id", post(handle_update))
        .route("/api/clinic/appointments/upload-report/:id", post(handle_upload))
        .route("/api/clinic/auth/logout", post(handle_logout))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api/clinic"), state)
}

fn client(base_url: &str) -> ClinicClient {
    ClinicClient::new(base_url, None).expect("client")
}

#[test]
fn base_url_gets_trailing_slash() {
    let client = client("http://localhost:8080/api/clinic");
    assert_eq!(client.base_url().as_str(), "http://localhost:8080/api/clinic/");
    assert_eq!(
        client.endpoint("appointments/all").expect("join").as_str(),
        "http://localhost:8080/api/clinic/appointments/all"
    );
}

#[test]
fn rejects_invalid_base_url() {
    assert!(matches!(
        ClinicClient::new("not a url", None),
        Err(ClientError::InvalidBaseUrl(_))
    ));
}

#[test]
fn extracts_first_https_token_from_upload_message() {
    let url = report::extract_report_url("Uploaded to https://cdn.example.org/r/1.pdf today")
        .expect("url");
    assert_eq!(url.as_str(), "https://cdn.example.org/r/1.pdf");
    assert!(report::extract_report_url("stored at http://plain.example.org/r").is_none());
}

#[test]
fn report_files_must_be_images_or_pdf() {
    let pdf = ReportFile::new("lab.PDF", b"%PDF".to_vec()).expect("pdf accepted");
    assert_eq!(pdf.mime_type, "application/pdf");
    let scan = ReportFile::new("scan.jpeg", vec![0xff, 0xd8]).expect("jpeg accepted");
    assert_eq!(scan.mime_type, "image/jpeg");
    assert!(matches!(
        ReportFile::new("notes.docx", Vec::new()),
        Err(ClientError::UnsupportedReport(name)) if name == "notes.docx"
    ));
    assert!(ReportFile::new("README", Vec::new()).is_err());
}

#[tokio::test]
async fn fetches_appointments_for_status_segment() {
    let (base_url, state) = spawn_clinic_server().await;
    let client = ClinicClient::new(&base_url, Some("SESSION=abc123")).expect("client");

    let all = client
        .fetch_appointments(StatusSelector::All)
        .await
        .expect("fetch all");
    let pending = client
        .fetch_appointments(StatusSelector::Only(AppointmentStatus::Pending))
        .await
        .expect("fetch pending");

    assert_eq!(all.len(), 2);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, AppointmentStatus::Pending);
    assert_eq!(
        *state.fetched_segments.lock().await,
        vec!["all".to_string(), "pending".to_string()]
    );
    assert_eq!(state.cookies.lock().await[0], "SESSION=abc123");
}

#[tokio::test]
async fn session_rotated_by_server_replaces_seeded_cookie() {
    let (base_url, state) = spawn_clinic_server().await;
    let client = ClinicClient::new(&base_url, Some("SESSION=abc123")).expect("client");

    client
        .fetch_appointments(StatusSelector::All)
        .await
        .expect("fetch all");
    client
        .fetch_appointments(StatusSelector::Only(AppointmentStatus::Pending))
        .await
        .expect("fetch pending");

    assert_eq!(
        *state.cookies.lock().await,
        vec!["SESSION=abc123".to_string(), "SESSION=rotated".to_string()]
    );
}

#[test]
fn rejects_session_cookie_without_value() {
    assert!(matches!(
        ClinicClient::new("http://localhost:8080/api/clinic", Some("SESSION")),
        Err(ClientError::InvalidSessionCookie)
    ));
}

#[tokio::test]
async fn non_success_status_surfaces_as_status_error() {
    let (base_url, _state) = spawn_clinic_server().await;
    let err = client(&base_url)
        .fetch_appointments(StatusSelector::Only(AppointmentStatus::Cancelled))
        .await
        .expect_err("server error");

    assert!(err.is_status());
    assert_eq!(
        err.to_string(),
        "failed to fetch appointments: server responded with 500 Internal Server Error"
    );
}

#[tokio::test]
async fn malformed_body_surfaces_as_decode_error() {
    let (base_url, _state) = spawn_clinic_server().await;
    let err = client(&base_url)
        .fetch_appointments(StatusSelector::Only(AppointmentStatus::Completed))
        .await
        .expect_err("decode error");

    assert!(matches!(
        err,
        ClientError::Decode {
            action: Action::FetchAppointments,
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_server_surfaces_as_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let err = client(&format!("http://{addr}/api/clinic"))
        .fetch_appointments(StatusSelector::All)
        .await
        .expect_err("connection refused");

    assert!(matches!(err, ClientError::Network { .. }));
    assert!(err
        .to_string()
        .starts_with("network error while fetching appointments"));
}

#[tokio::test]
async fn submits_only_the_mutable_fields() {
    let (base_url, state) = spawn_clinic_server().await;
    let update = AppointmentUpdate {
        appointment_date: "2024-06-14T10:30".into(),
        status: AppointmentStatus::Completed,
        medical_requirement: "ECG".into(),
        remarks: "Follow up in two weeks".into(),
        clinic_report_url: String::new(),
    };

    let updated = client(&base_url)
        .submit_appointment_update(AppointmentId(7), &update)
        .await
        .expect("update");

    assert_eq!(updated.id, AppointmentId(7));
    assert_eq!(updated.status, AppointmentStatus::Completed);
    assert_eq!(updated.remarks.as_deref(), Some("Follow up in two weeks"));

    let bodies = state.update_bodies.lock().await;
    assert_eq!(
        bodies[0],
        json!({
            "appointmentDate": "2024-06-14T10:30",
            "status": "COMPLETED",
            "medicalRequirement": "ECG",
            "remarks": "Follow up in two weeks",
            "clinicReportUrl": ""
        })
    );
}

#[tokio::test]
async fn uploads_report_as_multipart_file_field() {
    let (base_url, state) = spawn_clinic_server().await;
    let file = ReportFile::new("blood-panel.pdf", b"%PDF-1.7 test".to_vec()).expect("file");

    let url = client(&base_url)
        .upload_report_file(AppointmentId(7), file)
        .await
        .expect("upload");

    assert_eq!(url.as_str(), "https://files.example.org/reports/7.pdf");
    let uploads = state.uploads.lock().await;
    assert_eq!(
        *uploads,
        vec![UploadedPart {
            field: "file".into(),
            file_name: Some("blood-panel.pdf".into()),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.7 test".to_vec(),
        }]
    );
}

#[tokio::test]
async fn upload_without_url_in_reply_is_an_error() {
    let (base_url, _state) = spawn_clinic_server().await;
    let file = ReportFile::new("scan.png", vec![1, 2, 3]).expect("file");

    let err = client(&base_url)
        .upload_report_file(AppointmentId(8), file)
        .await
        .expect_err("no url");
    assert!(matches!(err, ClientError::MissingReportUrl));
}

#[tokio::test]
async fn logout_posts_to_auth_endpoint() {
    let (base_url, state) = spawn_clinic_server().await;
    client(&base_url).logout().await.expect("logout");
    assert_eq!(*state.logouts.lock().await, 1);
}

struct FakeBackend {
    appointments: Mutex<Vec<Appointment>>,
    fail_fetch: Mutex<bool>,
    requested: Mutex<Vec<StatusSelector>>,
}

impl FakeBackend {
    fn with(appointments: Vec<Value>) -> Self {
        let appointments = appointments
            .into_iter()
            .map(|raw| serde_json::from_value(raw).expect("appointment"))
            .collect();
        Self {
            appointments: Mutex::new(appointments),
            fail_fetch: Mutex::new(false),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AppointmentBackend for FakeBackend {
    async fn fetch_appointments(
        &self,
        selector: StatusSelector,
    ) -> Result<Vec<Appointment>, ClientError> {
        self.requested.lock().await.push(selector);
        if *self.fail_fetch.lock().await {
            return Err(ClientError::Status {
                action: Action::FetchAppointments,
                status: reqwest::StatusCode::BAD_GATEWAY,
            });
        }
        Ok(self
            .appointments
            .lock()
            .await
            .iter()
            .filter(|appointment| selector.matches(appointment.status))
            .cloned()
            .collect())
    }

    async fn submit_appointment_update(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, ClientError> {
        let mut held = self.appointments.lock().await;
        let Some(current) = held.iter_mut().find(|appointment| appointment.id == id) else {
            return Err(ClientError::Status {
                action: Action::UpdateAppointment,
                status: reqwest::StatusCode::NOT_FOUND,
            });
        };
        current.appointment_date = update.appointment_date.clone();
        current.status = update.status;
        current.remarks = Nullable::Present(update.remarks.clone());
        current.clinic_report_url = Some(update.clinic_report_url.clone())
            .filter(|url| !url.is_empty())
            .into();
        Ok(current.clone())
    }

    async fn upload_report_file(
        &self,
        id: AppointmentId,
        file: ReportFile,
    ) -> Result<Url, ClientError> {
        Url::parse(&format!(
            "https://files.example.org/{id}/{}",
            file.file_name
        ))
        .map_err(ClientError::from)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

fn wednesday_morning() -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("utc")
        .with_ymd_and_hms(2024, 6, 12, 9, 0, 0)
        .single()
        .expect("now")
}

#[tokio::test]
async fn controller_fetches_per_status_and_filters_per_window() {
    let backend = FakeBackend::with(vec![
        appointment_json(1, "2024-06-12T08:15:00", "PENDING"),
        appointment_json(2, "2024-06-20", "CONFIRMED"),
        appointment_json(3, "2024-06-10", "PENDING"),
    ]);
    let mut controller = AppointmentsController::new(backend, TimeWindow::AllTime);
    let now = wednesday_morning();

    let count = controller
        .select_status(StatusSelector::Only(AppointmentStatus::Pending))
        .await
        .expect("fetch");
    assert_eq!(count, 2);
    assert_eq!(controller.visible(&now).len(), 2);

    controller.select_window(TimeWindow::Today);
    let visible: Vec<i64> = controller.visible(&now).iter().map(|a| a.id.0).collect();
    assert_eq!(visible, vec![1]);
    assert_eq!(controller.backend().requested.lock().await.len(), 1);
}

#[tokio::test]
async fn controller_keeps_previous_list_when_fetch_fails() {
    let backend = FakeBackend::with(vec![appointment_json(1, "2024-06-12", "PENDING")]);
    let mut controller = AppointmentsController::new(backend, TimeWindow::AllTime);
    controller
        .select_status(StatusSelector::All)
        .await
        .expect("first fetch");

    *controller.backend().fail_fetch.lock().await = true;
    let err = controller
        .select_status(StatusSelector::Only(AppointmentStatus::Cancelled))
        .await
        .expect_err("failing fetch");

    assert!(err.is_status());
    assert_eq!(controller.board().snapshot().len(), 1);
    assert_eq!(controller.board().status(), StatusSelector::All);
    assert_eq!(
        controller.last_error(),
        Some("failed to fetch appointments: server responded with 502 Bad Gateway")
    );

    *controller.backend().fail_fetch.lock().await = false;
    controller.refresh().await.expect("refresh");
    assert_eq!(controller.last_error(), None);
}

#[tokio::test]
async fn controller_edit_upload_and_save_reconciles_in_place() {
    let backend = FakeBackend::with(vec![
        appointment_json(1, "2024-06-12T08:15:00", "PENDING"),
        appointment_json(2, "2024-06-13T11:45:30", "CONFIRMED"),
    ]);
    let mut controller = AppointmentsController::new(backend, TimeWindow::AllTime);
    controller
        .select_status(StatusSelector::All)
        .await
        .expect("fetch");

    let mut draft = controller.edit(AppointmentId(2)).expect("held appointment");
    assert_eq!(draft.appointment_date, "2024-06-13T11:45");
    draft.status = AppointmentStatus::Completed;
    draft.remarks = "Reviewed".into();

    let file = ReportFile::new("xray.png", vec![9, 9]).expect("file");
    let report_url = controller
        .attach_report(AppointmentId(2), file, &mut draft)
        .await
        .expect("upload");
    assert_eq!(draft.clinic_report_url, report_url.to_string());

    let saved = controller.save(AppointmentId(2), &draft).await.expect("save");
    let snapshot = controller.board().snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].status, AppointmentStatus::Pending);
    assert_eq!(snapshot[1], saved);
    assert_eq!(snapshot[1].status, AppointmentStatus::Completed);
    assert_eq!(
        snapshot[1].clinic_report_url.as_deref(),
        Some("https://files.example.org/2/xray.png")
    );
}

#[tokio::test]
async fn controller_save_failure_leaves_list_intact() {
    let backend = FakeBackend::with(vec![appointment_json(1, "2024-06-12", "PENDING")]);
    let mut controller = AppointmentsController::new(backend, TimeWindow::AllTime);
    controller
        .select_status(StatusSelector::All)
        .await
        .expect("fetch");
    let before = controller.board().snapshot().to_vec();

    let draft = controller.edit(AppointmentId(1)).expect("draft");
    controller
        .save(AppointmentId(404), &draft)
        .await
        .expect_err("unknown id");

    assert_eq!(controller.board().snapshot(), before.as_slice());
    assert!(controller.last_error().is_some());
}
