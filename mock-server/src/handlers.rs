use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::store::{
    self, hal, hal_collection, key_from_uri, plain, role_of, Caller, Key, Record, ACCOUNTS, ADMINS,
    AFFECTATIONS, AGENTS, CHAUFFEURS, CHEF_GARAGES, MISSIONS, RAPPORTS, VEHICULES,
};
use crate::{AppState, ReportEndpoint};

const HAL_JSON: &str = "application/hal+json";
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// A JSON body served as `application/hal+json`.
pub struct Hal(pub StatusCode, pub Value);

impl IntoResponse for Hal {
    fn into_response(self) -> Response {
        (self.0, [(header::CONTENT_TYPE, HAL_JSON)], self.1.to_string()).into_response()
    }
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
}

fn default_page_size() -> u64 {
    20
}

type Fields = Map<String, Value>;

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn known(collection: &str) -> Result<&'static str, StatusCode> {
    store::collection(collection).ok_or(StatusCode::NOT_FOUND)
}

fn require_admin(caller: &Caller) -> Result<(), StatusCode> {
    if caller.key.collection == ADMINS {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// Copy `names` from `input` into `record`, skipping absent and null values.
fn copy_fields(record: &mut Record, input: &Fields, names: &[&str]) {
    for name in names {
        match input.get(*name) {
            Some(Value::Null) | None => {}
            Some(value) => {
                record.fields.insert(name.to_string(), value.clone());
            }
        }
    }
}

// --- auth ---

const ADMIN_FIELDS: &[&str] = &["username", "password", "prenom", "nom", "role"];
const AGENT_FIELDS: &[&str] = &["username", "password", "prenom", "nom", "adresse"];
const STAFF_FIELDS: &[&str] = &["username", "password", "prenom", "nom"];

pub async fn login(State(state): State<AppState>, Json(input): Json<Credentials>) -> Result<Json<Value>, StatusCode> {
    let mut db = state.db.write().await;
    let caller = db
        .authenticate(&input.username, &input.password)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let mut body = db
        .get(caller.key)
        .map(|record| plain(caller.key.id, record))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let role = caller.role.clone();
    let token = db.issue_token(caller);
    debug!(username = %input.username, %role, "issued token");
    body["token"] = json!(token);
    body["role"] = json!(role);
    Ok(Json(body))
}

pub async fn register(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(input): Json<Fields>,
) -> Result<(StatusCode, String), StatusCode> {
    let (collection, names) = match kind.as_str() {
        "admin" => (ADMINS, ADMIN_FIELDS),
        "agent" => (AGENTS, AGENT_FIELDS),
        "chauffeur" => (CHAUFFEURS, STAFF_FIELDS),
        "chef" => (CHEF_GARAGES, STAFF_FIELDS),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    let username = input
        .get("username")
        .and_then(Value::as_str)
        .filter(|u| !u.trim().is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;
    if input.get("password").and_then(Value::as_str).is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut db = state.db.write().await;
    let taken = ACCOUNTS
        .iter()
        .copied()
        .any(|c| db.find_by_field(c, "username", username).is_some());
    if taken {
        return Err(StatusCode::CONFLICT);
    }
    let mut record = Record::default();
    copy_fields(&mut record, &input, names);
    if collection == ADMINS && !record.fields.contains_key("role") {
        record.fields.insert("role".to_string(), json!("ADMIN"));
    }
    db.insert(collection, record);
    Ok((StatusCode::CREATED, format!("{kind} {username} registered")))
}

pub async fn test_auth(Extension(caller): Extension<Caller>) -> String {
    format!("authenticated as {}", caller.role)
}

pub async fn profile(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> Result<Json<Value>, StatusCode> {
    let db = state.db.read().await;
    let record = db.get(caller.key).ok_or(StatusCode::NOT_FOUND)?;
    let mut body = plain(caller.key.id, record);
    body["role"] = json!(role_of(caller.key.collection, record));
    Ok(Json(body))
}

// --- repository routes ---

pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Hal, StatusCode> {
    let collection = known(&collection)?;
    let db = state.db.read().await;
    let base = &state.options.base_url;
    let all: Vec<_> = db.records(collection).collect();
    let total = all.len();
    let items = all
        .into_iter()
        .skip((params.page * params.size) as usize)
        .take(params.size as usize)
        .map(|(id, record)| hal(base, Key { collection, id }, record))
        .collect();
    let body = hal_collection(base, collection, items, Some((params.page, params.size, total)));
    Ok(Hal(StatusCode::OK, body))
}

pub async fn get_entity(State(state): State<AppState>, Path((collection, id)): Path<(String, u64)>) -> Result<Hal, StatusCode> {
    let key = Key { collection: known(&collection)?, id };
    let db = state.db.read().await;
    let record = db.get(key).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Hal(StatusCode::OK, hal(&state.options.base_url, key, record)))
}

/// Repository creation. String fields holding the URI of an existing record
/// become links, which is how associations are set through the repository.
pub async fn create_in_repository(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(input): Json<Fields>,
) -> Result<Hal, StatusCode> {
    let collection = known(&collection)?;
    if ACCOUNTS.contains(&collection) {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }
    let mut db = state.db.write().await;
    let mut record = Record::default();
    for (name, value) in input {
        let link = value.as_str().and_then(key_from_uri).filter(|k| db.get(*k).is_some());
        match link {
            Some(key) => {
                record.links.insert(name, key);
            }
            None if name == "id" || name == "_links" => {}
            None => {
                record.fields.insert(name, value);
            }
        }
    }
    if collection == RAPPORTS && !record.links.contains_key("affectation") {
        return Err(StatusCode::BAD_REQUEST);
    }
    let id = db.insert(collection, record);
    let key = Key { collection, id };
    let body = db.get(key).map(|r| hal(&state.options.base_url, key, r)).unwrap_or_default();
    Ok(Hal(StatusCode::CREATED, body))
}

/// Partial update. Honors `merge_patch_only` by refusing
/// `application/json` with 415.
pub async fn patch_entity(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Hal, StatusCode> {
    let key = Key { collection: known(&collection)?, id };
    let media = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match media.as_str() {
        MERGE_PATCH_JSON => {}
        "application/json" if !state.options.merge_patch_only => {}
        _ => {
            debug!(%media, collection = key.collection, "refusing patch media type");
            return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }
    }
    let patch: Fields = serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    let mut db = state.db.write().await;
    let record = db.get_mut(key).ok_or(StatusCode::NOT_FOUND)?;
    for (name, value) in patch {
        // Validation is an admin action, not a field edit.
        if name == "id" || name == "_links" || (key.collection == MISSIONS && name == "statut") {
            continue;
        }
        if value.is_null() {
            record.fields.remove(&name);
        } else {
            record.fields.insert(name, value);
        }
    }
    Ok(Hal(StatusCode::OK, hal(&state.options.base_url, key, record)))
}

pub async fn delete_entity(State(state): State<AppState>, Path((collection, id)): Path<(String, u64)>) -> Result<StatusCode, StatusCode> {
    let key = Key { collection: known(&collection)?, id };
    let mut db = state.db.write().await;
    db.remove(key).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

/// `/{collection}/{id}/{rel}`: a to-many relation when `rel` names a
/// collection, otherwise a to-one relation held by either side.
pub async fn relation(
    State(state): State<AppState>,
    Path((collection, id, rel)): Path<(String, u64, String)>,
) -> Result<Hal, StatusCode> {
    let owner = Key { collection: known(&collection)?, id };
    let db = state.db.read().await;
    let base = &state.options.base_url;
    let record = db.get(owner).ok_or(StatusCode::NOT_FOUND)?;

    if let Some(target) = store::collection(&rel) {
        let items = db
            .linking_to(target, owner)
            .into_iter()
            .map(|(id, r)| hal(base, Key { collection: target, id }, r))
            .collect();
        return Ok(Hal(StatusCode::OK, hal_collection(base, target, items, None)));
    }

    if let Some(key) = record.links.get(&rel) {
        let target = db.get(*key).ok_or(StatusCode::NOT_FOUND)?;
        return Ok(Hal(StatusCode::OK, hal(base, *key, target)));
    }

    let inverse = store::collection(&format!("{rel}s")).ok_or(StatusCode::NOT_FOUND)?;
    let (id, target) = db
        .linking_to(inverse, owner)
        .into_iter()
        .next()
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Hal(StatusCode::OK, hal(base, Key { collection: inverse, id }, target)))
}

pub async fn search(
    State(state): State<AppState>,
    Path((collection, finder)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, StatusCode> {
    let collection = known(&collection)?;
    let db = state.db.read().await;
    match finder.as_str() {
        "findByUsername" if ACCOUNTS.contains(&collection) => {
            let username = params.get("username").ok_or(StatusCode::BAD_REQUEST)?;
            let (id, record) = db
                .find_by_field(collection, "username", username)
                .ok_or(StatusCode::NOT_FOUND)?;
            let body = hal(&state.options.base_url, Key { collection, id }, record);
            Ok(Hal(StatusCode::OK, body).into_response())
        }
        "existsByMissionId" if collection == AFFECTATIONS => {
            let mission_id: u64 = params
                .get("missionId")
                .and_then(|v| v.parse().ok())
                .ok_or(StatusCode::BAD_REQUEST)?;
            let mission = Key { collection: MISSIONS, id: mission_id };
            let exists = !db.linking_to(AFFECTATIONS, mission).is_empty();
            Ok(Json(exists).into_response())
        }
        _ => Err(StatusCode::NOT_FOUND),
    }
}

// --- missions ---

const MISSION_FIELDS: [&str; 4] = ["titre", "detail", "date", "destination"];

fn all_plain(db: &store::Store, collection: &'static str) -> Json<Vec<Value>> {
    Json(db.records(collection).map(|(id, r)| plain(id, r)).collect())
}

fn get_plain(db: &store::Store, collection: &'static str, id: u64) -> Result<Json<Value>, StatusCode> {
    db.get(Key { collection, id })
        .map(|r| Json(plain(id, r)))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn all_missions(State(state): State<AppState>) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    all_plain(&db, MISSIONS)
}

pub async fn get_mission(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    get_plain(&*state.db.read().await, MISSIONS, id)
}

pub async fn create_mission(
    State(state): State<AppState>,
    Path(agent_id): Path<u64>,
    Json(input): Json<Fields>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let agent = Key { collection: AGENTS, id: agent_id };
    let mut db = state.db.write().await;
    if db.get(agent).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut record = Record::default();
    copy_fields(&mut record, &input, &MISSION_FIELDS);
    let statut = input.get("statut").and_then(Value::as_bool).unwrap_or(false);
    record.fields.insert("statut".to_string(), json!(statut));
    record.links.insert("agent".to_string(), agent);
    let id = db.insert(MISSIONS, record);
    Ok((StatusCode::CREATED, get_plain(&db, MISSIONS, id)?))
}

/// Full replacement of the editable fields; `statut` only ever moves to true.
pub async fn replace_mission(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Fields>,
) -> Result<Json<Value>, StatusCode> {
    let mut db = state.db.write().await;
    let record = db
        .get_mut(Key { collection: MISSIONS, id })
        .ok_or(StatusCode::NOT_FOUND)?;
    copy_fields(record, &input, &MISSION_FIELDS);
    if input.get("statut").and_then(Value::as_bool) == Some(true) {
        record.fields.insert("statut".to_string(), json!(true));
    }
    get_plain(&db, MISSIONS, id)
}

pub async fn delete_mission(State(state): State<AppState>, Path(id): Path<u64>) -> Result<String, StatusCode> {
    let mut db = state.db.write().await;
    db.remove(Key { collection: MISSIONS, id })
        .map(|_| format!("mission {id} deleted"))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn validate_mission(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    require_admin(&caller)?;
    let mut db = state.db.write().await;
    let record = db
        .get_mut(Key { collection: MISSIONS, id })
        .ok_or(StatusCode::NOT_FOUND)?;
    record.fields.insert("statut".to_string(), json!(true));
    record.links.insert("admin".to_string(), caller.key);
    debug!(mission = id, admin = caller.key.id, "mission validated");
    get_plain(&db, MISSIONS, id)
}

pub async fn delete_mission_as_admin(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    require_admin(&caller)?;
    let mut db = state.db.write().await;
    db.remove(Key { collection: MISSIONS, id })
        .map(|_| Json(json!({ "deleted": id })))
        .ok_or(StatusCode::NOT_FOUND)
}

// --- vehicles ---

const VEHICULE_FIELDS: [&str; 3] = ["plaque", "type", "capacite"];

pub async fn all_vehicules(State(state): State<AppState>) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    all_plain(&db, VEHICULES)
}

pub async fn get_vehicule(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    get_plain(&*state.db.read().await, VEHICULES, id)
}

pub async fn create_vehicule(
    State(state): State<AppState>,
    Json(input): Json<Fields>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if input.get("plaque").and_then(Value::as_str).is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut db = state.db.write().await;
    let mut record = Record::default();
    copy_fields(&mut record, &input, &VEHICULE_FIELDS);
    let id = db.insert(VEHICULES, record);
    Ok((StatusCode::CREATED, get_plain(&db, VEHICULES, id)?))
}

pub async fn replace_vehicule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<Fields>,
) -> Result<Json<Value>, StatusCode> {
    let mut db = state.db.write().await;
    let record = db
        .get_mut(Key { collection: VEHICULES, id })
        .ok_or(StatusCode::NOT_FOUND)?;
    copy_fields(record, &input, &VEHICULE_FIELDS);
    get_plain(&db, VEHICULES, id)
}

// --- assignments ---

pub async fn all_affectations(State(state): State<AppState>) -> Json<Vec<Value>> {
    let db = state.db.read().await;
    all_plain(&db, AFFECTATIONS)
}

pub async fn get_affectation(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    get_plain(&*state.db.read().await, AFFECTATIONS, id)
}

fn prefixed_id(segment: &str, prefix: &str) -> Result<u64, StatusCode> {
    segment
        .strip_prefix(prefix)
        .and_then(|rest| rest.parse().ok())
        .ok_or(StatusCode::BAD_REQUEST)
}

/// `/chef/createAffectation/by{chef}/chauffeur{c}/vehicule{v}/mission{m}`.
/// A mission can be assigned once.
pub async fn create_affectation(
    State(state): State<AppState>,
    Path((chef, chauffeur, vehicule, mission)): Path<(String, String, String, String)>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let parents = [
        ("chefGarage", Key { collection: CHEF_GARAGES, id: prefixed_id(&chef, "by")? }),
        ("chauffeur", Key { collection: CHAUFFEURS, id: prefixed_id(&chauffeur, "chauffeur")? }),
        ("vehicule", Key { collection: VEHICULES, id: prefixed_id(&vehicule, "vehicule")? }),
        ("mission", Key { collection: MISSIONS, id: prefixed_id(&mission, "mission")? }),
    ];
    let mut db = state.db.write().await;
    if parents.iter().any(|(_, key)| db.get(*key).is_none()) {
        return Err(StatusCode::NOT_FOUND);
    }
    if !db.linking_to(AFFECTATIONS, parents[3].1).is_empty() {
        return Err(StatusCode::CONFLICT);
    }
    let mut record = Record::default();
    record.fields.insert("date".to_string(), json!(now()));
    for (rel, key) in parents {
        record.links.insert(rel.to_string(), key);
    }
    let id = db.insert(AFFECTATIONS, record);
    Ok((StatusCode::CREATED, get_plain(&db, AFFECTATIONS, id)?))
}

pub async fn delete_affectation(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let mut db = state.db.write().await;
    db.remove(Key { collection: AFFECTATIONS, id })
        .map(|_| Json(json!({ "deleted": id })))
        .ok_or(StatusCode::NOT_FOUND)
}

// --- reports ---

pub async fn create_rapport_for(
    State(state): State<AppState>,
    Path(affectation_id): Path<u64>,
    Json(input): Json<Fields>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    match state.options.report_endpoint {
        ReportEndpoint::Enabled => {}
        ReportEndpoint::Forbidden => return Err(StatusCode::FORBIDDEN),
        ReportEndpoint::Missing => return Err(StatusCode::NOT_FOUND),
    }
    let affectation = Key { collection: AFFECTATIONS, id: affectation_id };
    let mut db = state.db.write().await;
    if db.get(affectation).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut record = Record::default();
    copy_fields(&mut record, &input, &["titre", "texte"]);
    record.fields.insert("date".to_string(), json!(now()));
    record.links.insert("affectation".to_string(), affectation);
    let id = db.insert(RAPPORTS, record);
    Ok((StatusCode::CREATED, get_plain(&db, RAPPORTS, id)?))
}
