//! Multi-request flows of `FleetApi`, checked against a scripted transport.
//!
//! # Design
//! `Scripted` answers each request with the next queued response and keeps
//! every request it saw, so tests can assert both the outcome and the exact
//! number and shape of requests on the wire.

use std::collections::VecDeque;
use std::sync::Mutex;

use fleet_core::{
    Admin, AffectationKeys, AgentUpdate, ApiError, FleetApi, HttpMethod, HttpRequest, HttpResponse, NewMission,
    NewRapport, NewVehicule, Page, Rapport, Transport,
};

const BASE_URL: &str = "http://fleet.test";

#[derive(Default)]
struct Scripted {
    responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Scripted {
    fn new(responses: Vec<Result<HttpResponse, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for Scripted {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }
}

fn reply(status: u16, content_type: &str, body: &str) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse {
        status,
        headers: vec![("Content-Type".to_string(), content_type.to_string())],
        body: body.to_string(),
    })
}

fn api(responses: Vec<Result<HttpResponse, ApiError>>) -> FleetApi<Scripted> {
    FleetApi::new(BASE_URL, Scripted::new(responses))
}

fn report() -> NewRapport {
    NewRapport {
        titre: "Panne".to_string(),
        texte: "Pneu crevé".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_retries_as_merge_patch_after_415() {
    let api = api(vec![
        reply(415, "text/plain", "unsupported"),
        reply(
            200,
            "application/hal+json",
            r#"{"prenom":"Amina","nom":"B","username":"amina","adresse":"Tunis",
               "_links":{"self":{"href":"http://fleet.test/agents/4"}}}"#,
        ),
    ]);
    let input = AgentUpdate {
        adresse: Some("Tunis".to_string()),
        nom: Some("  ".to_string()),
        ..AgentUpdate::default()
    };

    let updated = api.update::<fleet_core::Agent>(4, &input).unwrap().unwrap();
    assert_eq!(updated.id, Some(4));
    assert_eq!(updated.adresse, "Tunis");

    let requests = api.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, HttpMethod::Patch);
    assert_eq!(requests[0].path, "http://fleet.test/agents/4");
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    assert_eq!(requests[1].header("content-type"), Some("application/merge-patch+json"));
    assert_eq!(requests[0].body, requests[1].body);

    let body: serde_json::Value = serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({ "adresse": "Tunis" }));
}

#[test]
fn update_retries_after_400_and_reports_second_failure() {
    let api = api(vec![
        reply(400, "text/plain", "bad"),
        reply(409, "text/plain", "conflict"),
    ]);
    let err = api
        .update::<fleet_core::Agent>(4, &AgentUpdate::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::UpdateFailed { status: 409, .. }));
    assert_eq!(api.transport().requests().len(), 2);
}

#[test]
fn update_does_not_retry_other_failures() {
    let api = api(vec![reply(500, "text/plain", "boom")]);
    let err = api
        .update::<fleet_core::Agent>(4, &AgentUpdate::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::UpdateFailed { status: 500, .. }));
    assert_eq!(api.transport().requests().len(), 1);
}

#[test]
fn update_with_no_content_returns_none() {
    let api = api(vec![reply(204, "text/plain", "")]);
    let updated = api.update::<fleet_core::Agent>(4, &AgentUpdate::default()).unwrap();
    assert!(updated.is_none());
}

#[test]
fn transport_errors_are_not_retried() {
    let api = api(vec![Err(ApiError::Transport("connection refused".to_string()))]);
    let err = api
        .update::<fleet_core::Agent>(4, &AgentUpdate::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(api.transport().requests().len(), 1);
}

// ---------------------------------------------------------------------------
// Report creation
// ---------------------------------------------------------------------------

#[test]
fn report_uses_dedicated_endpoint_when_available() {
    let api = api(vec![reply(
        201,
        "application/json",
        r#"{"id":12,"titre":"Panne","texte":"Pneu crevé","date":"2026-10-16T09:30:00"}"#,
    )]);
    let created: Rapport = api.create_rapport(3, &report()).unwrap().unwrap();
    assert_eq!(created.id, Some(12));

    let requests = api.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "http://fleet.test/rapport/create/forAffectation/3");
}

#[test]
fn report_falls_back_to_repository_on_404() {
    let api = api(vec![
        reply(404, "text/plain", "no such route"),
        reply(
            201,
            "application/hal+json",
            r#"{"titre":"Panne","texte":"Pneu crevé","date":"2026-10-16T09:30:00.000Z",
               "_links":{"self":{"href":"http://fleet.test/rapports/21"}}}"#,
        ),
    ]);
    let created = api.create_rapport(3, &report()).unwrap().unwrap();
    assert_eq!(created.id, Some(21));

    let requests = api.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, HttpMethod::Post);
    assert_eq!(requests[1].path, "http://fleet.test/rapports");
    let body: serde_json::Value = serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["affectation"], "http://fleet.test/affectations/3");
    assert_eq!(body["titre"], "Panne");
    let date = body["date"].as_str().unwrap();
    assert!(date.ends_with('Z'), "{date}");
    assert_eq!(date.len(), "2026-10-16T09:30:00.000Z".len());
}

#[test]
fn report_fallback_with_text_body_returns_none() {
    let api = api(vec![
        reply(403, "text/plain", "forbidden"),
        reply(201, "text/plain", "created"),
    ]);
    assert!(api.create_rapport(3, &report()).unwrap().is_none());
}

#[test]
fn report_failure_carries_both_errors() {
    let api = api(vec![
        reply(403, "text/plain", "forbidden"),
        reply(400, "text/plain", "missing affectation"),
    ]);
    let err = api.create_rapport(3, &report()).unwrap_err();
    match &err {
        ApiError::ReportCreationFailed {
            primary_status,
            primary_body,
            fallback,
        } => {
            assert_eq!(*primary_status, 403);
            assert_eq!(primary_body, "forbidden");
            assert!(fallback.contains("400"));
            assert!(fallback.contains("missing affectation"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("forbidden") && message.contains("missing affectation"));
}

#[test]
fn report_fallback_transport_error_is_reported() {
    let api = api(vec![
        reply(404, "text/plain", "gone"),
        Err(ApiError::Transport("reset by peer".to_string())),
    ]);
    let err = api.create_rapport(3, &report()).unwrap_err();
    assert!(matches!(&err, ApiError::ReportCreationFailed { fallback, .. } if fallback.contains("reset by peer")));
}

#[test]
fn report_server_error_skips_fallback() {
    let api = api(vec![reply(500, "text/plain", "boom")]);
    let err = api.create_rapport(3, &report()).unwrap_err();
    assert!(matches!(err, ApiError::RequestFailed { status: 500, .. }));
    assert_eq!(api.transport().requests().len(), 1);
}

// ---------------------------------------------------------------------------
// Creation and RPC responses
// ---------------------------------------------------------------------------

fn keys() -> AffectationKeys {
    AffectationKeys {
        chef_garage_id: 1,
        chauffeur_id: 2,
        vehicule_id: 3,
        mission_id: 4,
    }
}

#[test]
fn create_with_empty_body_succeeds_without_entity() {
    let api = api(vec![Ok(HttpResponse {
        status: 201,
        headers: Vec::new(),
        body: String::new(),
    })]);
    assert_eq!(api.create_affectation(&keys()).unwrap(), None);
    assert_eq!(api.transport().requests().len(), 1);
}

#[test]
fn create_with_text_body_succeeds_without_entity() {
    let api = api(vec![
        reply(200, "text/plain", "mission created"),
        reply(200, "text/plain", "vehicule created"),
        reply(200, "text/plain", "mission validated"),
    ]);
    let mission = NewMission {
        titre: "Navette".to_string(),
        detail: "Personnel".to_string(),
        date: "2026-10-20T08:00:00".to_string(),
        destination: "Sousse".to_string(),
        statut: None,
    };
    assert!(api.create_mission(5, &mission).unwrap().is_none());
    let vehicule = NewVehicule {
        plaque: "123 TU 4567".to_string(),
        kind: "bus".to_string(),
        capacite: 40,
    };
    assert!(api.create_vehicule(&vehicule).unwrap().is_none());
    assert!(api.validate_mission(7).unwrap().is_none());
}

#[test]
fn create_with_json_body_returns_entity() {
    let api = api(vec![reply(
        201,
        "application/json",
        r#"{"id":9,"date":"2026-10-16T09:30:00"}"#,
    )]);
    let created = api.create_affectation(&keys()).unwrap().unwrap();
    assert_eq!(created.id, Some(9));
}

#[test]
fn create_failure_is_still_an_error() {
    let api = api(vec![reply(409, "text/plain", "mission already assigned")]);
    let err = api.create_affectation(&keys()).unwrap_err();
    assert!(matches!(err, ApiError::RequestFailed { status: 409, .. }));
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[test]
fn login_token_is_sent_on_later_requests() {
    let mut api = api(vec![
        reply(200, "application/json", r#"{"token":"abc","role":"ADMIN","username":"root"}"#),
        reply(200, "application/hal+json", r#"{"_embedded":{"admins":[]}}"#),
    ]);
    let auth = api.login("root", "pw").unwrap();
    assert_eq!(auth.token, "abc");
    assert_eq!(api.session().token(), Some("abc"));

    let admins = api.list::<Admin>(Page::default()).unwrap();
    assert!(admins.is_empty());

    let requests = api.transport().requests();
    assert_eq!(requests[0].header("authorization"), None);
    assert_eq!(requests[1].header("authorization"), Some("Bearer abc"));
}

#[test]
fn failed_login_leaves_session_empty() {
    let mut api = api(vec![reply(401, "text/plain", "bad credentials")]);
    let err = api.login("root", "nope").unwrap_err();
    assert!(matches!(err, ApiError::Authentication { status: 401, .. }));
    assert!(!api.session().is_authenticated());
}

#[test]
fn logout_drops_the_token() {
    let mut api = api(vec![
        reply(200, "application/json", r#"{"token":"abc"}"#),
        reply(200, "application/json", "[]"),
    ]);
    api.login("root", "pw").unwrap();
    api.logout();
    api.all_missions().unwrap();
    assert_eq!(api.transport().requests()[1].header("authorization"), None);
}
