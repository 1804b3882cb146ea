//! Backend quirks, one adapter per quirk.
//!
//! Every workaround for the current backend lives here so that pointing the
//! client at a different backend means replacing these functions, not the
//! call sites in `client` and `api`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::http::{HttpRequest, HttpResponse, CONTENT_TYPE, MERGE_PATCH_JSON};
use crate::types::{AffectationKeys, NewRapport};

/// Assignment creation takes its four foreign keys as path segments glued
/// to fixed prefixes, with no request body.
pub fn affectation_create_path(keys: &AffectationKeys) -> String {
    format!(
        "/chef/createAffectation/by{}/chauffeur{}/vehicule{}/mission{}",
        keys.chef_garage_id, keys.chauffeur_id, keys.vehicule_id, keys.mission_id
    )
}

/// Some repository endpoints refuse `application/json` on PATCH, answering
/// 400 or 415; those accept the same body as `merge-patch+json`.
pub fn wants_merge_patch_retry(response: &HttpResponse) -> bool {
    matches!(response.status, 400 | 415)
}

/// The same request with its content type switched to merge-patch.
pub fn into_merge_patch(mut request: HttpRequest) -> HttpRequest {
    request.set_header(CONTENT_TYPE, MERGE_PATCH_JSON);
    request
}

/// The dedicated report endpoint is disabled or forbidden on some
/// deployments; those still accept repository creation.
pub fn wants_report_fallback(response: &HttpResponse) -> bool {
    matches!(response.status, 403 | 404)
}

/// Path of the repository fallback for report creation.
pub const REPORT_REPOSITORY_PATH: &str = "/rapports";

pub fn report_primary_path(affectation_id: u64) -> String {
    format!("/rapport/create/forAffectation/{affectation_id}")
}

/// Association reference understood by the repository: the absolute URI of
/// the parent assignment, as a plain string.
pub fn affectation_uri(base_url: &str, affectation_id: u64) -> String {
    format!("{base_url}/affectations/{affectation_id}")
}

/// Body for `POST /rapports`: the report fields, a creation timestamp, and
/// the parent assignment as a relation URI instead of a nested object.
pub fn repository_report_body(
    input: &NewRapport,
    base_url: &str,
    affectation_id: u64,
    now: DateTime<Utc>,
) -> Value {
    json!({
        "titre": input.titre,
        "texte": input.texte,
        "date": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        "affectation": affectation_uri(base_url, affectation_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, APPLICATION_JSON};
    use chrono::TimeZone;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn affectation_path_is_positional() {
        let keys = AffectationKeys {
            chef_garage_id: 1,
            chauffeur_id: 22,
            vehicule_id: 333,
            mission_id: 4,
        };
        assert_eq!(
            affectation_create_path(&keys),
            "/chef/createAffectation/by1/chauffeur22/vehicule333/mission4"
        );
    }

    #[test]
    fn merge_patch_retry_only_on_400_and_415() {
        assert!(wants_merge_patch_retry(&response(400)));
        assert!(wants_merge_patch_retry(&response(415)));
        for status in [200, 204, 401, 403, 404, 409, 500] {
            assert!(!wants_merge_patch_retry(&response(status)), "{status}");
        }
    }

    #[test]
    fn into_merge_patch_keeps_body_and_path() {
        let request = HttpRequest {
            method: HttpMethod::Patch,
            path: "http://h/admins/1".to_string(),
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
            body: Some(r#"{"nom":"X"}"#.to_string()),
        };
        let retried = into_merge_patch(request.clone());
        assert_eq!(retried.header("Content-Type"), Some(MERGE_PATCH_JSON));
        assert_eq!(retried.body, request.body);
        assert_eq!(retried.path, request.path);
        assert_eq!(retried.method, HttpMethod::Patch);
    }

    #[test]
    fn report_fallback_only_on_403_and_404() {
        assert!(wants_report_fallback(&response(403)));
        assert!(wants_report_fallback(&response(404)));
        assert!(!wants_report_fallback(&response(400)));
        assert!(!wants_report_fallback(&response(500)));
    }

    #[test]
    fn repository_report_body_references_affectation() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        let input = NewRapport {
            titre: "Panne".to_string(),
            texte: "Pneu crevé".to_string(),
        };
        let body = repository_report_body(&input, "http://localhost:8081", 12, now);
        assert_eq!(body["affectation"], "http://localhost:8081/affectations/12");
        assert_eq!(body["date"], "2024-03-09T14:30:00.000Z");
        assert_eq!(body["titre"], "Panne");
    }
}
