//! Assertion Suite Harness
//!
//! **Core Responsibility:**
//! Grade a candidate against a literal assertion script instead of fixture
//! pairs. The candidate, the script, and a `check(<entry>)` trailer are
//! concatenated and executed as one bounded call.
//!
//! The script is expected to define `check`, a function that receives the
//! entry-point callable and throws on any failed assertion. There is no
//! per-fixture granularity: one execution, pass or fail.

use verdex_common::types::{ExecutionOutcome, Failure, FailureKind, Verdict};

use crate::config::GraderConfig;
use crate::engine::Runner;
use crate::inspect;
use crate::normalize;

/// Run an assertion-style suite against candidate text. The entry name must
/// resolve to a top-level callable in the cleaned candidate; resolution also
/// guarantees the name interpolated into the trailer is a parsed identifier,
/// never raw caller text.
pub async fn run_assertion_suite(
    source: &str,
    test_script: &str,
    entry_name: &str,
    config: &GraderConfig,
) -> Verdict {
    let cleaned = normalize::clean_source(source);
    if cleaned.is_empty() {
        return Verdict::Failed(Failure::setup("empty code"));
    }

    let entry = match inspect::resolve_entry_point(
        &cleaned,
        Some(entry_name),
        &config.entry_point_candidates,
    ) {
        Ok(entry) => entry,
        Err(failure) => return Verdict::Failed(failure),
    };

    let body = format!("{}\n\n{}\ncheck({});", cleaned, test_script, entry.name);
    let runner = Runner::new(config.deadline());
    let report = runner.run_script(&body).await;

    match report.outcome {
        ExecutionOutcome::Success(_) => Verdict::Passed,
        ExecutionOutcome::Timeout => Verdict::Failed(Failure {
            kind: FailureKind::Timeout,
            fixture_index: None,
            message: "assertion suite timed out".to_string(),
            expected: None,
            actual: None,
            raw_input: None,
        }),
        ExecutionOutcome::RuntimeFailure(detail) => Verdict::Failed(Failure {
            kind: FailureKind::Runtime,
            fixture_index: None,
            message: format!("assertion suite failed: {}", detail),
            expected: None,
            actual: None,
            raw_input: None,
        }),
        ExecutionOutcome::SetupFailure(message) => Verdict::Failed(Failure::setup(message)),
    }
}
