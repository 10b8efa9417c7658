//! API request handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rule_sync_core::{BenchmarkId, LifecycleEvent, PackagePolicy, RuleMetadata, RuleTemplate};
use rule_sync_engine::{fetch_all, load_existing, load_templates, HookOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiError, AppState};

// ==================== Lifecycle Handlers ====================

#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub event: LifecycleEvent,
    pub package_policy_id: String,
    pub outcomes: Vec<HookOutcome>,
}

/// Run the registered callbacks of `event`.
///
/// Always succeeds: rule sync problems are reported in the outcomes and
/// never fail the package policy operation itself.
async fn dispatch(state: &AppState, event: LifecycleEvent, policy: PackagePolicy) -> Json<LifecycleResponse> {
    let package_policy_id = policy.id.clone();
    tracing::debug!("Dispatching {} event for package policy {}", event, package_policy_id);

    let outcomes = state.registry.dispatch(event, policy).await;

    Json(LifecycleResponse {
        event,
        package_policy_id,
        outcomes,
    })
}

/// Package policy created
pub async fn package_policy_created(
    State(state): State<Arc<AppState>>,
    Json(policy): Json<PackagePolicy>,
) -> impl IntoResponse {
    dispatch(&state, LifecycleEvent::Created, policy).await
}

/// Package policy upgraded
pub async fn package_policy_upgraded(
    State(state): State<Arc<AppState>>,
    Json(policy): Json<PackagePolicy>,
) -> impl IntoResponse {
    dispatch(&state, LifecycleEvent::Upgraded, policy).await
}

/// Package policy deleted
pub async fn package_policy_deleted(
    State(state): State<Arc<AppState>>,
    Json(policy): Json<PackagePolicy>,
) -> impl IntoResponse {
    dispatch(&state, LifecycleEvent::Deleted, policy).await
}

/// Whether the posture package has generated any rules
pub async fn installation_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let installed = state.rule_sync.is_package_installed().await;
    Json(serde_json::json!({ "installed": installed }))
}

// ==================== Rule Template Handlers ====================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRuleTemplateRequest {
    pub metadata: RuleMetadata,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub version: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

/// Seed a rule template
pub async fn create_rule_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRuleTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut template = RuleTemplate::new(req.metadata, req.enabled);
    if let Some(version) = req.version {
        template.version = version;
    }
    template.validate()?;

    let saved = state.template_storage.save(template).await?;

    tracing::info!(
        "Created rule template '{}' version {} for benchmark {}",
        saved.rego_rule_id(),
        saved.version,
        saved.benchmark_id()
    );

    Ok((StatusCode::CREATED, Json(saved)))
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub benchmark: Option<String>,
}

/// List rule templates, optionally those of one benchmark
pub async fn list_rule_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.template_storage.as_ref();
    let templates = match query.benchmark {
        Some(benchmark) => load_templates(store, &BenchmarkId::from(benchmark), state.page_size()).await?,
        None => fetch_all(state.page_size(), |page| store.list(page)).await?,
    };
    Ok(Json(templates))
}

// ==================== Rule Handlers ====================

#[derive(Debug, Deserialize)]
pub struct RuleQuery {
    pub policy_id: String,
}

/// List the rules generated for a package policy
pub async fn list_policy_rules(
    State(state): State<Arc<AppState>>,
    Path(package_policy_id): Path<String>,
    Query(query): Query<RuleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = load_existing(
        state.rule_storage.as_ref(),
        &query.policy_id,
        &package_policy_id,
        state.page_size(),
    )
    .await?;
    Ok(Json(existing.rules().to_vec()))
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// User override of a rule's enabled flag
pub async fn set_rule_enabled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.rule_storage.set_enabled(id, req.enabled).await?;
    tracing::info!(
        "Rule {} ({}) of package policy {} set to enabled={}",
        rule.id,
        rule.rego_rule_id(),
        rule.package_policy_id,
        rule.enabled
    );
    Ok(Json(rule))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rule-sync"
    }))
}
