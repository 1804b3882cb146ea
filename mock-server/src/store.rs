//! In-memory tables behind the mock backend.
//!
//! Records are untyped JSON objects plus named links to other records, which
//! is enough to render both the repository (HAL) and controller (plain)
//! views of the same data.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};

pub const ADMINS: &str = "admins";
pub const AGENTS: &str = "agents";
pub const CHAUFFEURS: &str = "chauffeurs";
pub const CHEF_GARAGES: &str = "chefGarages";
pub const MISSIONS: &str = "missions";
pub const VEHICULES: &str = "vehicules";
pub const AFFECTATIONS: &str = "affectations";
pub const RAPPORTS: &str = "rapports";

pub const COLLECTIONS: [&str; 8] = [
    ADMINS,
    AGENTS,
    CHAUFFEURS,
    CHEF_GARAGES,
    MISSIONS,
    VEHICULES,
    AFFECTATIONS,
    RAPPORTS,
];

/// Collections whose records can log in.
pub const ACCOUNTS: [&str; 4] = [ADMINS, AGENTS, CHAUFFEURS, CHEF_GARAGES];

pub fn collection(name: &str) -> Option<&'static str> {
    COLLECTIONS.iter().copied().find(|c| *c == name)
}

/// A pointer to a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub collection: &'static str,
    pub id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Record {
    pub fields: Map<String, Value>,
    pub links: BTreeMap<String, Key>,
}

/// The authenticated account behind a bearer token.
#[derive(Debug, Clone)]
pub struct Caller {
    pub key: Key,
    pub role: String,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    next_token: u64,
    tables: HashMap<&'static str, BTreeMap<u64, Record>>,
    tokens: HashMap<String, Caller>,
}

impl Store {
    pub fn insert(&mut self, collection: &'static str, record: Record) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.tables.entry(collection).or_default().insert(id, record);
        id
    }

    pub fn get(&self, key: Key) -> Option<&Record> {
        self.tables.get(key.collection)?.get(&key.id)
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut Record> {
        self.tables.get_mut(key.collection)?.get_mut(&key.id)
    }

    pub fn remove(&mut self, key: Key) -> Option<Record> {
        self.tables.get_mut(key.collection)?.remove(&key.id)
    }

    pub fn records(&self, collection: &'static str) -> impl Iterator<Item = (u64, &Record)> {
        self.tables
            .get(collection)
            .into_iter()
            .flat_map(|table| table.iter().map(|(id, record)| (*id, record)))
    }

    /// Records of `collection` holding any link to `target`.
    pub fn linking_to(&self, collection: &'static str, target: Key) -> Vec<(u64, &Record)> {
        self.records(collection)
            .filter(|(_, record)| record.links.values().any(|k| *k == target))
            .collect()
    }

    pub fn find_by_field(&self, collection: &'static str, field: &str, value: &str) -> Option<(u64, &Record)> {
        self.records(collection)
            .find(|(_, record)| record.fields.get(field).and_then(Value::as_str) == Some(value))
    }

    /// Look up an account across every account collection.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Caller> {
        ACCOUNTS.iter().copied().find_map(|collection| {
            let (id, record) = self.find_by_field(collection, "username", username)?;
            let stored = record.fields.get("password").and_then(Value::as_str);
            (stored == Some(password)).then(|| Caller {
                key: Key { collection, id },
                role: role_of(collection, record),
            })
        })
    }

    pub fn issue_token(&mut self, caller: Caller) -> String {
        self.next_token += 1;
        let token = format!("token-{}", self.next_token);
        self.tokens.insert(token.clone(), caller);
        token
    }

    pub fn caller(&self, token: &str) -> Option<Caller> {
        self.tokens.get(token).cloned()
    }
}

pub fn role_of(collection: &str, record: &Record) -> String {
    match collection {
        ADMINS => record
            .fields
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("ADMIN")
            .to_string(),
        AGENTS => "AGENT".to_string(),
        CHAUFFEURS => "CHAUFFEUR".to_string(),
        _ => "CHEF_GARAGE".to_string(),
    }
}

/// Controller view: the fields plus `id`, never the password.
pub fn plain(id: u64, record: &Record) -> Value {
    let mut fields = visible_fields(record);
    fields.insert("id".to_string(), Value::from(id));
    Value::Object(fields)
}

/// Repository view: the fields without `id`, with `_links.self` and one
/// link per relation.
pub fn hal(base_url: &str, key: Key, record: &Record) -> Value {
    let mut fields = visible_fields(record);
    let self_href = format!("{base_url}/{}/{}", key.collection, key.id);
    let mut links = Map::new();
    links.insert("self".to_string(), json!({ "href": self_href }));
    for rel in record.links.keys() {
        links.insert(rel.clone(), json!({ "href": format!("{self_href}/{rel}") }));
    }
    fields.insert("_links".to_string(), Value::Object(links));
    Value::Object(fields)
}

pub fn hal_collection(base_url: &str, rel: &str, items: Vec<Value>, page: Option<(u64, u64, usize)>) -> Value {
    let mut embedded = Map::new();
    embedded.insert(rel.to_string(), Value::Array(items));
    let mut body = json!({
        "_embedded": embedded,
        "_links": { "self": { "href": format!("{base_url}/{rel}") } },
    });
    if let Some((number, size, total)) = page {
        let total_pages = if size == 0 { 0 } else { (total as u64).div_ceil(size) };
        body["page"] = json!({
            "size": size,
            "totalElements": total,
            "totalPages": total_pages,
            "number": number,
        });
    }
    body
}

fn visible_fields(record: &Record) -> Map<String, Value> {
    let mut fields = record.fields.clone();
    fields.remove("password");
    fields
}

/// Resolve an association URI such as `http://host/affectations/3`.
pub fn key_from_uri(uri: &str) -> Option<Key> {
    let mut segments = uri.trim_end_matches('/').rsplit('/');
    let id = segments.next()?.parse().ok()?;
    let collection = collection(segments.next()?)?;
    Some(Key { collection, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str, password: &str) -> Record {
        let mut record = Record::default();
        record.fields.insert("username".to_string(), json!(username));
        record.fields.insert("password".to_string(), json!(password));
        record
    }

    #[test]
    fn ids_are_positive_and_unique() {
        let mut store = Store::default();
        let a = store.insert(AGENTS, Record::default());
        let b = store.insert(MISSIONS, Record::default());
        assert!(a > 0);
        assert_ne!(a, b);
    }

    #[test]
    fn authenticate_checks_password() {
        let mut store = Store::default();
        store.insert(CHAUFFEURS, account("karim", "pw"));
        let caller = store.authenticate("karim", "pw").unwrap();
        assert_eq!(caller.key.collection, CHAUFFEURS);
        assert_eq!(caller.role, "CHAUFFEUR");
        assert!(store.authenticate("karim", "nope").is_none());
    }

    #[test]
    fn hal_view_hides_id_and_password() {
        let record = account("root", "secret");
        let body = hal("http://h", Key { collection: ADMINS, id: 5 }, &record);
        assert!(body.get("id").is_none());
        assert!(body.get("password").is_none());
        assert_eq!(body["_links"]["self"]["href"], "http://h/admins/5");
    }

    #[test]
    fn key_from_uri_parses_collection_and_id() {
        assert_eq!(
            key_from_uri("http://localhost:8081/affectations/3"),
            Some(Key { collection: AFFECTATIONS, id: 3 })
        );
        assert_eq!(key_from_uri("http://localhost:8081/unknown/3"), None);
        assert_eq!(key_from_uri("not a uri"), None);
    }
}
