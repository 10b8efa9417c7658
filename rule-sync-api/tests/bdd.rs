//! BDD Test Harness for the Rule Sync API
//!
//! Run with: cargo test --test bdd
//!
//! Scenarios run in-process against the router with in-memory storage.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use cucumber::{given, then, when, World};
use rule_sync_api::{create_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// World state shared across steps
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct RuleSyncWorld {
    app: Router,

    /// Last HTTP response status
    last_status: Option<StatusCode>,

    /// Last response body as JSON
    last_response: Option<Value>,

    /// Package policy id -> owning policy id
    policies: HashMap<String, String>,
}

impl RuleSyncWorld {
    fn new() -> Self {
        Self {
            app: create_router(Arc::new(AppState::new())),
            last_status: None,
            last_response: None,
            policies: HashMap::new(),
        }
    }

    async fn request(&mut self, method: &str, uri: &str, body: Option<Value>) -> Value {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let resp = self.app.clone().oneshot(req).await.expect("Request failed");
        self.last_status = Some(resp.status());
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        self.last_response = Some(json.clone());
        json
    }

    async fn lifecycle(&mut self, event: &str, package_policy_id: &str, input_type: &str) {
        let policy_id = self
            .policies
            .entry(package_policy_id.to_string())
            .or_insert_with(|| format!("agent-{}", package_policy_id))
            .clone();
        let body = json!({
            "id": package_policy_id,
            "policy_id": policy_id,
            "inputs": [{ "type": input_type, "enabled": true }]
        });
        self.request("POST", &format!("/api/package-policies/{}", event), Some(body))
            .await;
    }

    async fn rules(&mut self, package_policy_id: &str) -> Vec<Value> {
        let policy_id = self
            .policies
            .get(package_policy_id)
            .cloned()
            .unwrap_or_else(|| panic!("Package policy '{}' not known", package_policy_id));
        let uri = format!("/api/package-policies/{}/rules?policy_id={}", package_policy_id, policy_id);
        let json = self.request("GET", &uri, None).await;
        json.as_array().cloned().expect("Rule list is not an array")
    }

    async fn rule(&mut self, package_policy_id: &str, rego_rule_id: &str) -> Value {
        self.rules(package_policy_id)
            .await
            .into_iter()
            .find(|r| r["metadata"]["rego_rule_id"] == rego_rule_id)
            .unwrap_or_else(|| panic!("Rule '{}' not generated for '{}'", rego_rule_id, package_policy_id))
    }

    fn first_outcome(&self) -> &Value {
        let resp = self.last_response.as_ref().expect("No response received");
        &resp["outcomes"][0]
    }
}

// ==================== GIVEN Steps ====================

#[given(expr = "a rule template {string} for benchmark {string} enabled by default")]
async fn enabled_template(world: &mut RuleSyncWorld, rule: String, benchmark: String) {
    create_template(world, &rule, &benchmark, true).await;
}

#[given(expr = "a rule template {string} for benchmark {string} disabled by default")]
async fn disabled_template(world: &mut RuleSyncWorld, rule: String, benchmark: String) {
    create_template(world, &rule, &benchmark, false).await;
}

#[given(expr = "the package policy {string} was created with input {string}")]
async fn policy_created(world: &mut RuleSyncWorld, package_policy_id: String, input_type: String) {
    world.lifecycle("created", &package_policy_id, &input_type).await;
    assert_eq!(world.last_status, Some(StatusCode::OK));
}

// ==================== WHEN Steps ====================

#[when(expr = "the package policy {string} is created with input {string}")]
async fn create_policy(world: &mut RuleSyncWorld, package_policy_id: String, input_type: String) {
    world.lifecycle("created", &package_policy_id, &input_type).await;
}

#[when(expr = "the package policy {string} is upgraded with input {string}")]
async fn upgrade_policy(world: &mut RuleSyncWorld, package_policy_id: String, input_type: String) {
    world.lifecycle("upgraded", &package_policy_id, &input_type).await;
}

#[when(expr = "the package policy {string} is deleted")]
async fn delete_policy(world: &mut RuleSyncWorld, package_policy_id: String) {
    world.lifecycle("deleted", &package_policy_id, "cloudbeat/cis_k8s").await;
}

#[when(expr = "the user sets rule {string} of {string} to enabled {word}")]
async fn override_rule(world: &mut RuleSyncWorld, rego_rule_id: String, package_policy_id: String, enabled: String) {
    let enabled: bool = enabled.parse().expect("enabled must be true or false");
    let rule = world.rule(&package_policy_id, &rego_rule_id).await;
    let uri = format!("/api/rules/{}", rule["id"].as_str().expect("No id on rule"));
    world
        .request("PATCH", &uri, Some(json!({ "enabled": enabled })))
        .await;
    assert_eq!(world.last_status, Some(StatusCode::OK));
}

// ==================== THEN Steps ====================

#[then(expr = "the response status should be {int}")]
async fn response_status(world: &mut RuleSyncWorld, expected: u16) {
    let status = world.last_status.expect("No response received");
    assert_eq!(status.as_u16(), expected, "Unexpected status code");
}

#[then(expr = "the sync status should be {string}")]
async fn sync_status(world: &mut RuleSyncWorld, expected: String) {
    let outcome = world.first_outcome();
    assert_eq!(outcome["status"], expected.as_str(), "Unexpected outcome: {}", outcome);
}

#[then(expr = "the rules were generated from benchmark {string}")]
async fn generated_benchmark(world: &mut RuleSyncWorld, expected: String) {
    let outcome = world.first_outcome();
    assert_eq!(outcome["benchmark"], expected.as_str(), "Unexpected outcome: {}", outcome);
}

#[then(expr = "the package policy {string} should have {int} rules")]
async fn rule_count(world: &mut RuleSyncWorld, package_policy_id: String, expected: usize) {
    let rules = world.rules(&package_policy_id).await;
    assert_eq!(rules.len(), expected, "Unexpected rules: {:?}", rules);
}

#[then(expr = "rule {string} of {string} should be enabled {word}")]
async fn rule_enabled(world: &mut RuleSyncWorld, rego_rule_id: String, package_policy_id: String, expected: String) {
    let expected: bool = expected.parse().expect("enabled must be true or false");
    let rule = world.rule(&package_policy_id, &rego_rule_id).await;
    assert_eq!(rule["enabled"], expected, "Unexpected rule: {}", rule);
}

#[then(expr = "the package should be reported as installed {word}")]
async fn installed(world: &mut RuleSyncWorld, expected: String) {
    let expected: bool = expected.parse().expect("installed must be true or false");
    let json = world.request("GET", "/api/status", None).await;
    assert_eq!(json["installed"], expected);
}

// ==================== Helper Functions ====================

async fn create_template(world: &mut RuleSyncWorld, rule: &str, benchmark: &str, enabled: bool) {
    let body = json!({
        "metadata": {
            "rego_rule_id": rule,
            "benchmark": { "id": benchmark }
        },
        "enabled": enabled
    });
    world.request("POST", "/api/rule-templates", Some(body)).await;
    assert_eq!(world.last_status, Some(StatusCode::CREATED), "Failed to create template");
}

// ==================== Main ====================

#[tokio::main]
async fn main() {
    RuleSyncWorld::run("tests/features").await;
}
