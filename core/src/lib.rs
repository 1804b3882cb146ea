//! Client core for the fleet back-office API.
//!
//! # Overview
//! Typed access to missions, vehicles, drivers, garage supervisors, agents,
//! administrators, assignments and reports held by a Spring-Data-REST style
//! HAL+JSON backend.
//!
//! # Design
//! - `FleetClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - `FleetApi` runs those requests through a `Transport` and owns the
//!   multi-request flows: the merge-patch retry on update and the
//!   repository fallback on report creation.
//! - The bearer token lives in an explicit `Session` on the client; only
//!   `FleetApi::login` and `FleetApi::logout` change it.
//! - HAL envelopes and plain arrays are decoded into `CollectionBody` and
//!   flattened before any typed decoding, so callers never see the shape.
//! - Backend quirks are isolated in `adapters`.

pub mod adapters;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod hal;
pub mod http;
pub mod resource;
pub mod sanitize;
pub mod session;
pub mod transport;
pub mod types;

pub use api::FleetApi;
pub use client::FleetClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{Account, Resource};
pub use session::Session;
pub use transport::{Transport, UreqTransport};
pub use types::{
    Admin, AdminUpdate, Affectation, AffectationKeys, AffectationUpdate, Agent, AgentUpdate, AuthResponse,
    Chauffeur, ChefGarage, Mission, MissionDetails, MissionUpdate, NewAdmin, NewAgent, NewMission, NewRapport, NewStaff,
    NewVehicule, Page, Rapport, RapportUpdate, Role, StaffUpdate, Vehicule, VehiculeUpdate,
};
