use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rule_sync_api::{create_router, AppState};
use rule_sync_engine::SyncConfig;
use rule_sync_storage::InMemoryStorage;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

fn app() -> Router {
    let storage = Arc::new(InMemoryStorage::new());
    create_router(Arc::new(AppState::with_storage(storage, SyncConfig::default())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, body)
}

fn template(rego_rule_id: &str, benchmark: &str, enabled: bool, version: u32) -> Value {
    json!({
        "metadata": {
            "rego_rule_id": rego_rule_id,
            "name": format!("Rule {}", rego_rule_id),
            "benchmark": { "id": benchmark, "name": "CIS Kubernetes" },
            "section": "Control Plane"
        },
        "enabled": enabled,
        "version": version
    })
}

fn package_policy(id: &str, policy_id: &str) -> Value {
    json!({
        "id": id,
        "policy_id": policy_id,
        "inputs": [
            { "type": "cloudbeat/cis_k8s", "enabled": true },
            { "type": "cloudbeat/cis_eks", "enabled": false }
        ]
    })
}

#[tokio::test]
async fn test_full_package_policy_lifecycle() {
    let app = app();

    // 1. Seed rule templates
    for (rule, enabled) in [("1.1.1", true), ("1.1.2", false)] {
        let (status, body) = send(&app, "POST", "/api/rule-templates", Some(template(rule, "cis_k8s", enabled, 1))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["version"], 1);
    }
    let (status, _) = send(&app, "POST", "/api/rule-templates", Some(template("2.1.1", "cis_eks", true, 1))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(body["installed"], false);

    // 2. Package policy created
    let (status, body) = send(&app, "POST", "/api/package-policies/created", Some(package_policy("pp-1", "agent-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"], "created");
    assert_eq!(body["outcomes"][0]["status"], "synced");
    assert_eq!(body["outcomes"][0]["benchmark"], "cis_k8s");
    assert_eq!(body["outcomes"][0]["created"], 2);

    let (_, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(body["installed"], true);

    let (status, rules) = send(&app, "GET", "/api/package-policies/pp-1/rules?policy_id=agent-1", None).await;
    assert_eq!(status, StatusCode::OK);
    let rules = rules.as_array().unwrap().clone();
    assert_eq!(rules.len(), 2);
    let rule_111 = rules
        .iter()
        .find(|r| r["metadata"]["rego_rule_id"] == "1.1.1")
        .unwrap()
        .clone();
    assert_eq!(rule_111["enabled"], true);
    assert_eq!(rule_111["metadata"]["section"], "Control Plane");

    // 3. User disables rule 1.1.1
    let uri = format!("/api/rules/{}", rule_111["id"].as_str().unwrap());
    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "enabled": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);

    // 4. Package policy upgraded
    let (status, body) = send(&app, "POST", "/api/package-policies/upgraded", Some(package_policy("pp-1", "agent-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"], "upgraded");
    assert_eq!(body["outcomes"][0]["status"], "synced");
    assert_eq!(body["outcomes"][0]["created"], 2);
    assert_eq!(body["outcomes"][0]["deleted"], 2);

    let (_, rules) = send(&app, "GET", "/api/package-policies/pp-1/rules?policy_id=agent-1", None).await;
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules.iter().all(|r| r["id"] != rule_111["id"]), "rules are regenerated");
    let regenerated = rules
        .iter()
        .find(|r| r["metadata"]["rego_rule_id"] == "1.1.1")
        .unwrap();
    assert_eq!(regenerated["enabled"], false, "user override survives the upgrade");

    // 5. Package policy deleted
    let (status, body) = send(&app, "POST", "/api/package-policies/deleted", Some(package_policy("pp-1", "agent-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcomes"][0]["status"], "removed");
    assert_eq!(body["outcomes"][0]["deleted"], 2);

    let (_, rules) = send(&app, "GET", "/api/package-policies/pp-1/rules?policy_id=agent-1", None).await;
    assert_eq!(rules, json!([]));
    let (_, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(body["installed"], false);
}

#[tokio::test]
async fn test_list_templates_by_benchmark() {
    let app = app();
    send(&app, "POST", "/api/rule-templates", Some(template("1.1.1", "cis_k8s", true, 1))).await;
    send(&app, "POST", "/api/rule-templates", Some(template("2.1.1", "cis_eks", true, 1))).await;

    let (status, all) = send(&app, "GET", "/api/rule-templates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, eks) = send(&app, "GET", "/api/rule-templates?benchmark=cis_eks", None).await;
    let eks = eks.as_array().unwrap();
    assert_eq!(eks.len(), 1);
    assert_eq!(eks[0]["metadata"]["rego_rule_id"], "2.1.1");
}

#[tokio::test]
async fn test_new_template_version_supersedes_the_old_one() {
    let app = app();
    send(&app, "POST", "/api/rule-templates", Some(template("1.1.1", "cis_k8s", true, 1))).await;
    send(&app, "POST", "/api/rule-templates", Some(template("1.1.1", "cis_k8s", true, 2))).await;

    let (_, eks) = send(&app, "GET", "/api/rule-templates?benchmark=cis_k8s", None).await;
    let current = eks.as_array().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["version"], 2);

    let (_, body) = send(&app, "POST", "/api/package-policies/created", Some(package_policy("pp-1", "agent-1"))).await;
    assert_eq!(body["outcomes"][0]["created"], 1);

    let (_, rules) = send(&app, "GET", "/api/package-policies/pp-1/rules?policy_id=agent-1", None).await;
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["template_version"], 2);
}

#[tokio::test]
async fn test_invalid_template_is_rejected() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/rule-templates", Some(template("", "cis_k8s", true, 1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, all) = send(&app, "GET", "/api/rule-templates", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_unknown_rule_override_is_not_found() {
    let app = app();
    let uri = format!("/api/rules/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "enabled": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_policy_without_templates_still_succeeds() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/package-policies/created", Some(package_policy("pp-9", "agent-9"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcomes"][0]["status"], "synced");
    assert_eq!(body["outcomes"][0]["created"], 0);
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
