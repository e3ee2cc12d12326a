//! Grading Pipeline
//!
//! **Core Responsibility:**
//! Run one grading request end to end: normalize the candidate, resolve and
//! probe the entry point, then evaluate fixtures in order until the first
//! failure or until all pass.
//!
//! The first failure is terminal. Later fixtures are never decoded, bound,
//! or executed once a verdict exists.

use std::time::Duration;

use tracing::{info, warn};

use verdex_common::types::{ExecutionOutcome, Failure, GradeRequest, Verdict};

use crate::bind;
use crate::config::GraderConfig;
use crate::decode;
use crate::engine::Runner;
use crate::evaluator;
use crate::inspect;
use crate::normalize;

/// Grade one request against its fixtures. Infallible at the API boundary;
/// every internal error becomes a `Failed` verdict.
pub async fn grade(request: &GradeRequest, config: &GraderConfig) -> Verdict {
    let source = normalize::clean_source(&request.source);
    if source.is_empty() {
        return Verdict::Failed(Failure::setup("empty code"));
    }

    let entry = match inspect::resolve_entry_point(
        &source,
        request.entry_point.as_deref(),
        &config.entry_point_candidates,
    ) {
        Ok(entry) => entry,
        Err(failure) => return Verdict::Failed(failure),
    };

    info!(
        request_id = %request.id,
        entry_point = %entry.name,
        arity = entry.arity(),
        fixtures = request.fixtures.len(),
        "grading request"
    );

    let deadline = request
        .deadline_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.deadline());
    let runner = Runner::new(deadline);

    let probe = runner.probe(&source, &entry.name).await;
    if let ExecutionOutcome::SetupFailure(message) = probe.outcome {
        warn!(request_id = %request.id, %message, "setup failed");
        return Verdict::Failed(Failure::setup(message));
    }

    for (i, fixture) in request.fixtures.iter().enumerate() {
        let index = i + 1;

        let decoded = match decode::decode_with(&fixture.input, config.decode_strictness) {
            Ok(value) => value,
            Err(e) => {
                return Verdict::Failed(Failure::setup(format!(
                    "cannot decode fixture {}: {}",
                    index, e
                )))
            }
        };
        let expected = match decode::decode_with(&fixture.expected, config.decode_strictness) {
            Ok(value) => value,
            Err(e) => {
                return Verdict::Failed(Failure::setup(format!(
                    "cannot decode fixture {}: {}",
                    index, e
                )))
            }
        };

        let call = bind::bind(&decoded, &entry, &fixture.input);
        let report = runner.run_call(&source, &entry, &call).await;

        match report.outcome {
            ExecutionOutcome::Timeout => {
                return Verdict::Failed(Failure::timeout(index));
            }
            ExecutionOutcome::RuntimeFailure(detail) => {
                return Verdict::Failed(Failure::runtime(index, detail));
            }
            ExecutionOutcome::SetupFailure(message) => {
                return Verdict::Failed(Failure::setup(message));
            }
            ExecutionOutcome::Success(actual) => {
                if !evaluator::tolerant_equal(&actual, &expected) {
                    return Verdict::Failed(Failure::mismatch(
                        index,
                        expected,
                        actual,
                        fixture.input.as_str(),
                    ));
                }
            }
        }
    }

    info!(request_id = %request.id, "all fixtures passed");
    Verdict::Passed
}
