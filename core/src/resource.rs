//! Route table for the entity kinds exposed by the backend.
//!
//! Each entity names its repository collection, which doubles as the
//! `_embedded` key of its HAL collection responses. A few kinds read or
//! delete through RPC-style controller routes instead of the repository;
//! those override `get_path` / `delete_path`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    AdminUpdate, Affectation, AffectationUpdate, Agent, AgentUpdate, Admin, Chauffeur, ChefGarage,
    Mission, MissionUpdate, NewAdmin, NewAgent, NewStaff, Rapport, RapportUpdate, StaffUpdate,
    Vehicule, VehiculeUpdate,
};

/// An entity kind reachable through the repository routes.
pub trait Resource: DeserializeOwned {
    /// Repository collection segment and HAL `_embedded` key.
    const COLLECTION: &'static str;

    /// Partial-update payload accepted by `update`.
    type Update: Serialize;

    fn item_path(id: u64) -> String {
        format!("/{}/{id}", Self::COLLECTION)
    }

    fn get_path(id: u64) -> String {
        Self::item_path(id)
    }

    fn delete_path(id: u64) -> String {
        Self::item_path(id)
    }
}

/// A user account created through `/auth/register/*` and searchable by
/// username.
pub trait Account: Resource {
    type Registration: Serialize;

    const REGISTER_PATH: &'static str;
}

impl Resource for Admin {
    const COLLECTION: &'static str = "admins";
    type Update = AdminUpdate;
}

impl Account for Admin {
    type Registration = NewAdmin;
    const REGISTER_PATH: &'static str = "/auth/register/admin";
}

impl Resource for Agent {
    const COLLECTION: &'static str = "agents";
    type Update = AgentUpdate;
}

impl Account for Agent {
    type Registration = NewAgent;
    const REGISTER_PATH: &'static str = "/auth/register/agent";
}

impl Resource for Chauffeur {
    const COLLECTION: &'static str = "chauffeurs";
    type Update = StaffUpdate;
}

impl Account for Chauffeur {
    type Registration = NewStaff;
    const REGISTER_PATH: &'static str = "/auth/register/chauffeur";
}

impl Resource for ChefGarage {
    const COLLECTION: &'static str = "chefGarages";
    type Update = StaffUpdate;
}

impl Account for ChefGarage {
    type Registration = NewStaff;
    const REGISTER_PATH: &'static str = "/auth/register/chef";
}

impl Resource for Mission {
    const COLLECTION: &'static str = "missions";
    type Update = MissionUpdate;

    fn get_path(id: u64) -> String {
        format!("/mission/get/{id}")
    }

    fn delete_path(id: u64) -> String {
        format!("/mission/delete/{id}")
    }
}

impl Resource for Vehicule {
    const COLLECTION: &'static str = "vehicules";
    type Update = VehiculeUpdate;

    fn get_path(id: u64) -> String {
        format!("/vehicule/get/{id}")
    }
}

impl Resource for Affectation {
    const COLLECTION: &'static str = "affectations";
    type Update = AffectationUpdate;

    fn get_path(id: u64) -> String {
        format!("/chef/getAffectation/{id}")
    }

    fn delete_path(id: u64) -> String {
        format!("/chef/deleteAffectation/{id}")
    }
}

impl Resource for Rapport {
    const COLLECTION: &'static str = "rapports";
    type Update = RapportUpdate;
}
