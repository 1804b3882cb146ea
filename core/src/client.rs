//! HTTP request builder and response parser for the fleet API.
//!
//! # Design
//! `FleetClient` holds the base URL and the explicit `Session`. Each
//! operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The round-trip itself happens elsewhere (`FleetApi` over a `Transport`),
//! so everything here is deterministic.
//!
//! Authenticated requests carry `Authorization: Bearer <token>` when the
//! session has one. Registration and login never do.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::adapters;
use crate::error::ApiError;
use crate::hal::{self, CollectionBody};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, ACCEPT, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE,
    HAL_JSON, MERGE_PATCH_JSON,
};
use crate::resource::{Account, Resource};
use crate::sanitize;
use crate::session::Session;
use crate::types::{
    AffectationKeys, AuthResponse, LoginRequest, MissionDetails, NewMission, NewRapport, NewVehicule, Page,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

/// Request builder and response parser for the fleet API.
#[derive(Debug, Clone)]
pub struct FleetClient {
    base_url: String,
    session: Session,
}

impl FleetClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Session::default(),
        }
    }

    pub fn with_session(base_url: &str, session: Session) -> Self {
        Self {
            session,
            ..Self::new(base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn start_session(&mut self, auth: AuthResponse) {
        self.session.begin(auth);
    }

    pub fn end_session(&mut self) {
        self.session.clear();
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.json_request(HttpMethod::Post, "/auth/login", &body, Auth::Anonymous, APPLICATION_JSON)
    }

    /// Any non-2xx answer counts as rejected credentials.
    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Authentication {
                status: response.status,
                body: response.body,
            });
        }
        decode(&response.body)
    }

    pub fn build_test_auth(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/auth/test", Auth::Bearer)
    }

    pub fn parse_test_auth(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response)?;
        Ok(response.body)
    }

    pub fn build_profile(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/profile", Auth::Bearer)
    }

    pub fn parse_profile(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    // -----------------------------------------------------------------------
    // Generic repository operations
    // -----------------------------------------------------------------------

    pub fn build_list<R: Resource>(&self, page: Page) -> HttpRequest {
        let path = format!("/{}?page={}&size={}", R::COLLECTION, page.page, page.size);
        self.request(HttpMethod::Get, &path, Auth::Bearer)
    }

    /// Parse a collection in either shape into entities of kind `R`.
    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R>, ApiError> {
        check_status(&response)?;
        let body: CollectionBody = decode(&response.body)?;
        body.into_items(R::COLLECTION)
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| ApiError::Deserialization(e.to_string())))
            .collect()
    }

    pub fn build_get<R: Resource>(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &R::get_path(id), Auth::Bearer)
    }

    /// Parse a single entity, resolving its id from the self link if needed.
    pub fn parse_entity<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response)?;
        decode_entity(&response.body)
    }

    pub fn build_find_by_username<R: Account>(&self, username: &str) -> HttpRequest {
        let path = format!(
            "/{}/search/findByUsername?username={}",
            R::COLLECTION,
            utf8_percent_encode(username, NON_ALPHANUMERIC)
        );
        self.request(HttpMethod::Get, &path, Auth::Bearer)
    }

    pub fn build_register<R: Account>(&self, input: &R::Registration) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, R::REGISTER_PATH, input, Auth::Anonymous, APPLICATION_JSON)
    }

    /// Creation and RPC endpoints answer with JSON or with a bare
    /// confirmation message; only the former yields an entity.
    pub fn parse_created<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<Option<R>, ApiError> {
        check_status(&response)?;
        optional_entity(&response)
    }

    /// First attempt of an update: sanitized body, `application/json`.
    /// `adapters::into_merge_patch` derives the retry.
    pub fn build_update<R: Resource>(&self, id: u64, input: &R::Update) -> Result<HttpRequest, ApiError> {
        let body = sanitize::sanitized(input)?;
        self.json_request(HttpMethod::Patch, &R::item_path(id), &body, Auth::Bearer, APPLICATION_JSON)
    }

    pub fn parse_update<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<Option<R>, ApiError> {
        if !response.is_success() {
            return Err(ApiError::UpdateFailed {
                status: response.status,
                body: response.body,
            });
        }
        if response.status == 204 {
            return Ok(None);
        }
        optional_entity(&response)
    }

    /// Single merge-patch request; the body is sent as given.
    pub fn build_patch<R: Resource>(&self, id: u64, body: &Value) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, &R::item_path(id), body, Auth::Bearer, MERGE_PATCH_JSON)
    }

    pub fn build_delete<R: Resource>(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &R::delete_path(id), Auth::Bearer)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)?;
        Ok(())
    }

    /// `GET /<collection>/<id>/<rel>`, answered with a single HAL entity or
    /// a HAL collection depending on the relation.
    pub fn build_relation<R: Resource>(&self, id: u64, rel: &str) -> HttpRequest {
        let path = format!("{}/{rel}", R::item_path(id));
        self.request(HttpMethod::Get, &path, Auth::Bearer)
    }

    // -----------------------------------------------------------------------
    // Missions
    // -----------------------------------------------------------------------

    pub fn build_all_missions(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/mission/getall", Auth::Bearer)
    }

    pub fn build_create_mission(&self, agent_id: u64, input: &NewMission) -> Result<HttpRequest, ApiError> {
        let path = format!("/mission/create/{agent_id}");
        self.json_request(HttpMethod::Post, &path, input, Auth::Bearer, APPLICATION_JSON)
    }

    pub fn build_replace_mission(&self, id: u64, input: &MissionDetails) -> Result<HttpRequest, ApiError> {
        let path = format!("/mission/update/{id}");
        self.json_request(HttpMethod::Put, &path, input, Auth::Bearer, APPLICATION_JSON)
    }

    pub fn build_validate_mission(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Put, &format!("/admin/validateMission/{id}"), Auth::Bearer)
    }

    pub fn build_delete_mission_as_admin(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/admin/deleteMission/{id}"), Auth::Bearer)
    }

    // -----------------------------------------------------------------------
    // Vehicles
    // -----------------------------------------------------------------------

    pub fn build_all_vehicules(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/vehicule/getall", Auth::Bearer)
    }

    pub fn build_create_vehicule(&self, input: &NewVehicule) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/vehicule/create", input, Auth::Bearer, APPLICATION_JSON)
    }

    pub fn build_replace_vehicule(&self, id: u64, input: &NewVehicule) -> Result<HttpRequest, ApiError> {
        let path = format!("/vehicule/update/{id}");
        self.json_request(HttpMethod::Put, &path, input, Auth::Bearer, APPLICATION_JSON)
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    pub fn build_all_affectations(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/chef/getAffectations", Auth::Bearer)
    }

    pub fn build_create_affectation(&self, keys: &AffectationKeys) -> HttpRequest {
        self.request(HttpMethod::Post, &adapters::affectation_create_path(keys), Auth::Bearer)
    }

    pub fn build_affectation_exists_for_mission(&self, mission_id: u64) -> HttpRequest {
        let path = format!("/affectations/search/existsByMissionId?missionId={mission_id}");
        self.request(HttpMethod::Get, &path, Auth::Bearer)
    }

    pub fn parse_exists(&self, response: HttpResponse) -> Result<bool, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub fn build_create_rapport(&self, affectation_id: u64, input: &NewRapport) -> Result<HttpRequest, ApiError> {
        let path = adapters::report_primary_path(affectation_id);
        self.json_request(HttpMethod::Post, &path, input, Auth::Bearer, APPLICATION_JSON)
    }

    /// Repository fallback for report creation, stamped with `now`.
    pub fn build_create_rapport_in_repository(
        &self,
        affectation_id: u64,
        input: &NewRapport,
        now: DateTime<Utc>,
    ) -> Result<HttpRequest, ApiError> {
        let body = adapters::repository_report_body(input, &self.base_url, affectation_id, now);
        self.json_request(
            HttpMethod::Post,
            adapters::REPORT_REPOSITORY_PATH,
            &body,
            Auth::Bearer,
            APPLICATION_JSON,
        )
    }

    // -----------------------------------------------------------------------
    // Request shaping
    // -----------------------------------------------------------------------

    fn headers(&self, auth: Auth, content_type: Option<&str>) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(3);
        if let Some(ct) = content_type {
            headers.push((CONTENT_TYPE.to_string(), ct.to_string()));
        }
        headers.push((ACCEPT.to_string(), HAL_JSON.to_string()));
        if auth == Auth::Bearer {
            if let Some(token) = self.session.token() {
                headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
            }
        }
        headers
    }

    fn request(&self, method: HttpMethod, path: &str, auth: Auth) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: self.headers(auth, None),
            body: None,
        }
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        auth: Auth,
        content_type: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: self.headers(auth, Some(content_type)),
            body: Some(body),
        })
    }
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::RequestFailed {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn decode_entity<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let value: Value = decode(body)?;
    serde_json::from_value(hal::normalize_entity(value)).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn optional_entity<T: DeserializeOwned>(response: &HttpResponse) -> Result<Option<T>, ApiError> {
    if !response.has_json_body() || response.body.trim().is_empty() {
        return Ok(None);
    }
    decode_entity(&response.body).map(Some)
}
