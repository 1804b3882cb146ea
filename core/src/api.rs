//! The fleet back-office façade.
//!
//! # Design
//! `FleetApi` pairs a `FleetClient` (request shaping, response parsing,
//! session) with a `Transport`. Single-request operations are a build,
//! a send and a parse. Two operations need more than one request:
//!
//! - `update` retries once as merge-patch when the JSON attempt is refused
//!   with 400 or 415;
//! - `create_rapport` falls back to repository creation when the dedicated
//!   endpoint answers 403 or 404.
//!
//! Nothing else retries. `login` and `logout` are the only operations that
//! take `&mut self`, since they are the only writers of the session.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::adapters;
use crate::client::FleetClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::resource::{Account, Resource};
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{
    Admin, Affectation, AffectationKeys, Agent, AuthResponse, Chauffeur, ChefGarage, Mission, MissionDetails,
    NewMission, NewRapport, NewVehicule, Page, Rapport, Vehicule,
};

pub struct FleetApi<T> {
    client: FleetClient,
    transport: T,
}

impl<T: Transport> FleetApi<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: FleetClient::new(base_url),
            transport,
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T) -> Self {
        Self::new(&config.base_url, transport)
    }

    pub fn client(&self) -> &FleetClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.send(request)?;
        debug!(status = response.status, path = %request.path, "received response");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Authenticate and keep the returned token for subsequent calls.
    pub fn login(&mut self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = self.client.build_login(username, password)?;
        let auth = self.client.parse_login(self.send(&request)?)?;
        info!(username, role = auth.role.as_deref().unwrap_or("-"), "logged in");
        self.client.start_session(auth.clone());
        Ok(auth)
    }

    pub fn logout(&mut self) {
        if self.client.session().is_authenticated() {
            info!("logged out");
        }
        self.client.end_session();
    }

    pub fn test_auth(&self) -> Result<String, ApiError> {
        let response = self.send(&self.client.build_test_auth())?;
        self.client.parse_test_auth(response)
    }

    pub fn profile(&self) -> Result<Value, ApiError> {
        let response = self.send(&self.client.build_profile())?;
        self.client.parse_profile(response)
    }

    // -----------------------------------------------------------------------
    // Generic repository operations
    // -----------------------------------------------------------------------

    pub fn list<R: Resource>(&self, page: Page) -> Result<Vec<R>, ApiError> {
        let response = self.send(&self.client.build_list::<R>(page))?;
        self.client.parse_list(response)
    }

    pub fn get<R: Resource>(&self, id: u64) -> Result<R, ApiError> {
        let response = self.send(&self.client.build_get::<R>(id))?;
        self.client.parse_entity(response)
    }

    pub fn find_by_username<R: Account>(&self, username: &str) -> Result<R, ApiError> {
        let response = self.send(&self.client.build_find_by_username::<R>(username))?;
        self.client.parse_entity(response)
    }

    /// Create an account through its registration endpoint.
    pub fn register<R: Account>(&self, input: &R::Registration) -> Result<Option<R>, ApiError> {
        let response = self.send(&self.client.build_register::<R>(input)?)?;
        self.client.parse_created(response)
    }

    /// Sanitized partial update with the merge-patch content-type fallback.
    pub fn update<R: Resource>(&self, id: u64, input: &R::Update) -> Result<Option<R>, ApiError> {
        let request = self.client.build_update::<R>(id, input)?;
        let mut response = self.send(&request)?;
        if adapters::wants_merge_patch_retry(&response) {
            warn!(
                status = response.status,
                path = %request.path,
                "JSON patch refused, retrying as merge-patch"
            );
            response = self.send(&adapters::into_merge_patch(request))?;
        }
        self.client.parse_update(response)
    }

    /// One merge-patch request with `body` sent verbatim.
    pub fn patch<R: Resource>(&self, id: u64, body: &Value) -> Result<Option<R>, ApiError> {
        let response = self.send(&self.client.build_patch::<R>(id, body)?)?;
        self.client.parse_update(response)
    }

    pub fn delete<R: Resource>(&self, id: u64) -> Result<(), ApiError> {
        let response = self.send(&self.client.build_delete::<R>(id))?;
        self.client.parse_delete(response)
    }

    fn related_one<R: Resource, U: Resource>(&self, id: u64, rel: &str) -> Result<U, ApiError> {
        let response = self.send(&self.client.build_relation::<R>(id, rel))?;
        self.client.parse_entity(response)
    }

    fn related_many<R: Resource, U: Resource>(&self, id: u64) -> Result<Vec<U>, ApiError> {
        let response = self.send(&self.client.build_relation::<R>(id, U::COLLECTION))?;
        self.client.parse_list(response)
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    pub fn admin_missions(&self, admin_id: u64) -> Result<Vec<Mission>, ApiError> {
        self.related_many::<Admin, Mission>(admin_id)
    }

    pub fn agent_missions(&self, agent_id: u64) -> Result<Vec<Mission>, ApiError> {
        self.related_many::<Agent, Mission>(agent_id)
    }

    pub fn chauffeur_affectations(&self, chauffeur_id: u64) -> Result<Vec<Affectation>, ApiError> {
        self.related_many::<Chauffeur, Affectation>(chauffeur_id)
    }

    pub fn chef_garage_affectations(&self, chef_garage_id: u64) -> Result<Vec<Affectation>, ApiError> {
        self.related_many::<ChefGarage, Affectation>(chef_garage_id)
    }

    // -----------------------------------------------------------------------
    // Missions
    // -----------------------------------------------------------------------

    /// Every mission, from the controller route (plain array, no paging).
    pub fn all_missions(&self) -> Result<Vec<Mission>, ApiError> {
        let response = self.send(&self.client.build_all_missions())?;
        self.client.parse_list(response)
    }

    /// Create a mission on behalf of an agent. `None` when the backend
    /// confirms without a JSON body.
    pub fn create_mission(&self, agent_id: u64, input: &NewMission) -> Result<Option<Mission>, ApiError> {
        let response = self.send(&self.client.build_create_mission(agent_id, input)?)?;
        self.client.parse_created(response)
    }

    /// Full replacement through the controller's PUT route.
    pub fn replace_mission(&self, id: u64, input: &MissionDetails) -> Result<Option<Mission>, ApiError> {
        let response = self.send(&self.client.build_replace_mission(id, input)?)?;
        self.client.parse_created(response)
    }

    /// Mark a mission validated. This is an administrative action on the
    /// backend, not a field edit, and cannot be undone.
    pub fn validate_mission(&self, id: u64) -> Result<Option<Mission>, ApiError> {
        let response = self.send(&self.client.build_validate_mission(id))?;
        self.client.parse_created(response)
    }

    pub fn delete_mission_as_admin(&self, id: u64) -> Result<(), ApiError> {
        let response = self.send(&self.client.build_delete_mission_as_admin(id))?;
        self.client.parse_delete(response)
    }

    pub fn mission_agent(&self, mission_id: u64) -> Result<Agent, ApiError> {
        self.related_one::<Mission, Agent>(mission_id, "agent")
    }

    pub fn mission_admin(&self, mission_id: u64) -> Result<Admin, ApiError> {
        self.related_one::<Mission, Admin>(mission_id, "admin")
    }

    pub fn mission_affectation(&self, mission_id: u64) -> Result<Affectation, ApiError> {
        self.related_one::<Mission, Affectation>(mission_id, "affectation")
    }

    // -----------------------------------------------------------------------
    // Vehicles
    // -----------------------------------------------------------------------

    pub fn all_vehicules(&self) -> Result<Vec<Vehicule>, ApiError> {
        let response = self.send(&self.client.build_all_vehicules())?;
        self.client.parse_list(response)
    }

    pub fn create_vehicule(&self, input: &NewVehicule) -> Result<Option<Vehicule>, ApiError> {
        let response = self.send(&self.client.build_create_vehicule(input)?)?;
        self.client.parse_created(response)
    }

    pub fn replace_vehicule(&self, id: u64, input: &NewVehicule) -> Result<Option<Vehicule>, ApiError> {
        let response = self.send(&self.client.build_replace_vehicule(id, input)?)?;
        self.client.parse_created(response)
    }

    pub fn vehicule_affectations(&self, vehicule_id: u64) -> Result<Vec<Affectation>, ApiError> {
        self.related_many::<Vehicule, Affectation>(vehicule_id)
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    pub fn all_affectations(&self) -> Result<Vec<Affectation>, ApiError> {
        let response = self.send(&self.client.build_all_affectations())?;
        self.client.parse_list(response)
    }

    pub fn create_affectation(&self, keys: &AffectationKeys) -> Result<Option<Affectation>, ApiError> {
        let response = self.send(&self.client.build_create_affectation(keys))?;
        self.client.parse_created(response)
    }

    pub fn affectation_exists_for_mission(&self, mission_id: u64) -> Result<bool, ApiError> {
        let response = self.send(&self.client.build_affectation_exists_for_mission(mission_id))?;
        self.client.parse_exists(response)
    }

    pub fn affectation_chauffeur(&self, affectation_id: u64) -> Result<Chauffeur, ApiError> {
        self.related_one::<Affectation, Chauffeur>(affectation_id, "chauffeur")
    }

    pub fn affectation_chef_garage(&self, affectation_id: u64) -> Result<ChefGarage, ApiError> {
        self.related_one::<Affectation, ChefGarage>(affectation_id, "chefGarage")
    }

    pub fn affectation_mission(&self, affectation_id: u64) -> Result<Mission, ApiError> {
        self.related_one::<Affectation, Mission>(affectation_id, "mission")
    }

    pub fn affectation_vehicule(&self, affectation_id: u64) -> Result<Vehicule, ApiError> {
        self.related_one::<Affectation, Vehicule>(affectation_id, "vehicule")
    }

    pub fn affectation_rapport(&self, affectation_id: u64) -> Result<Rapport, ApiError> {
        self.related_one::<Affectation, Rapport>(affectation_id, "rapport")
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Create a report for an assignment.
    ///
    /// Tries `/rapport/create/forAffectation/{id}` first. On 403 or 404 the
    /// report is created through the repository instead, with the
    /// assignment passed as a relation URI. When that fails too, the error
    /// carries both outcomes.
    pub fn create_rapport(&self, affectation_id: u64, input: &NewRapport) -> Result<Option<Rapport>, ApiError> {
        let primary = self.send(&self.client.build_create_rapport(affectation_id, input)?)?;
        if !adapters::wants_report_fallback(&primary) {
            return self.client.parse_created(primary);
        }

        warn!(
            status = primary.status,
            affectation_id, "report endpoint unavailable, creating through repository"
        );
        let request = self
            .client
            .build_create_rapport_in_repository(affectation_id, input, Utc::now())?;
        let fallback = match self.send(&request) {
            Ok(response) if response.is_success() => return self.client.parse_created(response),
            Ok(response) => format!("{} {}", response.status, response.body),
            Err(err) => err.to_string(),
        };
        Err(ApiError::ReportCreationFailed {
            primary_status: primary.status,
            primary_body: primary.body,
            fallback,
        })
    }

    pub fn rapport_affectation(&self, rapport_id: u64) -> Result<Affectation, ApiError> {
        self.related_one::<Rapport, Affectation>(rapport_id, "affectation")
    }
}
