//! Decides which benchmark governs rule generation for a package policy

use rule_sync_core::{BenchmarkId, PolicyInput, CLOUDBEAT_VANILLA};

fn is_enabled_benchmark_input(input: &PolicyInput) -> bool {
    !input.input_type.trim().is_empty() && input.enabled
}

/// Benchmark used when the inputs do not name exactly one
pub fn default_benchmark() -> BenchmarkId {
    match CLOUDBEAT_VANILLA.split_once('/') {
        Some((_, benchmark)) => benchmark.into(),
        None => CLOUDBEAT_VANILLA.into(),
    }
}

/// Resolve the benchmark from a package policy's inputs.
///
/// Exactly one enabled input selects its benchmark suffix; zero or several
/// enabled inputs fall back to [`default_benchmark`]. This never fails.
pub fn resolve_benchmark(inputs: &[PolicyInput]) -> BenchmarkId {
    let enabled: Vec<&PolicyInput> = inputs.iter().filter(|i| is_enabled_benchmark_input(i)).collect();

    match enabled.as_slice() {
        [only] => input_benchmark(&only.input_type),
        _ => {
            tracing::debug!(
                "{} enabled inputs, using default benchmark {}",
                enabled.len(),
                default_benchmark()
            );
            default_benchmark()
        }
    }
}

/// Benchmark suffix of an input type: everything after the first `/`
fn input_benchmark(input_type: &str) -> BenchmarkId {
    match input_type.split_once('/') {
        Some((_, benchmark)) if !benchmark.is_empty() => benchmark.into(),
        Some(_) => {
            tracing::warn!(
                "Input type '{}' has an empty benchmark id, using default benchmark",
                input_type
            );
            default_benchmark()
        }
        None => {
            tracing::warn!(
                "Input type '{}' has no family separator, using it as the benchmark id",
                input_type
            );
            input_type.into()
        }
    }
}
