//! Selects the rule templates of a benchmark

use rule_sync_core::{BenchmarkId, RuleTemplate};
use rule_sync_storage::RuleTemplateStorage;
use std::collections::HashMap;

use crate::paging::fetch_all;
use crate::SyncError;

/// Keep the current templates of `benchmark`, in input order.
///
/// Only the highest `version` of each `rego_rule_id` is kept, at the
/// position where that rule first appears. Equal versions keep the later one.
pub fn select_templates(all: Vec<RuleTemplate>, benchmark: &BenchmarkId) -> Vec<RuleTemplate> {
    let mut selected: Vec<RuleTemplate> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for template in all.into_iter().filter(|t| t.benchmark_id() == benchmark) {
        match position.get(template.rego_rule_id()) {
            Some(&i) => {
                if template.version >= selected[i].version {
                    selected[i] = template;
                }
            }
            None => {
                position.insert(template.rego_rule_id().to_string(), selected.len());
                selected.push(template);
            }
        }
    }
    selected
}

/// Read every stored template and keep those of `benchmark`
pub async fn load_templates(
    store: &dyn RuleTemplateStorage,
    benchmark: &BenchmarkId,
    per_page: u32,
) -> Result<Vec<RuleTemplate>, SyncError> {
    let all = fetch_all(per_page, |page| store.list(page))
        .await
        .map_err(SyncError::TemplateFetch)?;
    let total = all.len();
    let selected = select_templates(all, benchmark);
    tracing::debug!(
        "Selected {} of {} rule templates for benchmark {}",
        selected.len(),
        total,
        benchmark
    );
    Ok(selected)
}
