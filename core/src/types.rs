//! Domain DTOs for the fleet API.
//!
//! # Design
//! Entities carry `id: Option<u64>` because the backend's HAL responses
//! omit the identifier; it is filled in from `_links.self.href` before
//! decoding (see `crate::hal`) and stays `None` only when neither source
//! resolves. Unknown fields such as `_links` are ignored.
//!
//! Creation payloads and partial-update payloads are separate types. Update
//! payloads have every field optional and are sanitized before sending.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Paging parameters for repository collection routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 0, size: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body returned by `POST /auth/login`: the bearer token, the role, and
/// whatever user fields the backend adds alongside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub user: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    SuperAdmin,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Admin {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub prenom: String,
    pub nom: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmin {
    pub username: String,
    pub password: String,
    pub prenom: String,
    pub nom: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Agent {
    #[serde(default)]
    pub id: Option<u64>,
    pub prenom: String,
    pub nom: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub adresse: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAgent {
    pub prenom: String,
    pub nom: String,
    pub username: String,
    pub password: String,
    pub adresse: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chauffeur {
    #[serde(default)]
    pub id: Option<u64>,
    pub nom: String,
    pub prenom: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChefGarage {
    #[serde(default)]
    pub id: Option<u64>,
    pub nom: String,
    pub prenom: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Registration payload shared by chauffeurs and chefs de garage, which
/// register with the same four fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub nom: String,
    pub prenom: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Missions and vehicles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mission {
    #[serde(default)]
    pub id: Option<u64>,
    pub titre: String,
    pub detail: String,
    /// ISO 8601 date-time as emitted by the backend.
    pub date: String,
    pub destination: String,
    /// `false` while pending, `true` once validated by an admin.
    #[serde(default)]
    pub statut: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMission {
    pub titre: String,
    pub detail: String,
    pub date: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statut: Option<bool>,
}

/// Full replacement of a mission's editable fields through
/// `PUT /mission/update/{id}`. Carries no `statut`, so a replace can never
/// undo a validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDetails {
    pub titre: String,
    pub detail: String,
    pub date: String,
    pub destination: String,
}

/// Partial mission edit. Carries no `statut`: validation goes through
/// `FleetApi::validate_mission`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vehicule {
    #[serde(default)]
    pub id: Option<u64>,
    pub plaque: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacite: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicule {
    pub plaque: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacite: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehiculeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaque: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacite: Option<u32>,
}

// ---------------------------------------------------------------------------
// Assignments and reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Affectation {
    #[serde(default)]
    pub id: Option<u64>,
    pub date: String,
}

/// The four parents an assignment links at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectationKeys {
    pub chef_garage_id: u64,
    pub chauffeur_id: u64,
    pub vehicule_id: u64,
    pub mission_id: u64,
}

/// Only the date of an assignment may change after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffectationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rapport {
    #[serde(default)]
    pub id: Option<u64>,
    pub titre: String,
    pub texte: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRapport {
    pub titre: String,
    pub texte: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RapportUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}
