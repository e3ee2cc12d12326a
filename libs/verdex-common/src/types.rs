use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::DecodedValue;

/// One (input, expected-output) pair used to grade a candidate.
/// Both fields are opaque text until the decoder interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub input: String,
    pub expected: String,
}

impl Fixture {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// One grading request: untrusted candidate text plus the fixtures to grade
/// it against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    pub id: Uuid,
    pub source: String,
    pub fixtures: Vec<Fixture>,
    /// Explicit entry-point name. When absent the engine infers one from the
    /// candidate's top-level callables.
    #[serde(default)]
    pub entry_point: Option<String>,
    /// Per-request wall-clock deadline override, in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl GradeRequest {
    pub fn new(source: impl Into<String>, fixtures: Vec<Fixture>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            fixtures,
            entry_point: None,
            deadline_ms: None,
        }
    }
}

/// Result of executing one bound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Success(DecodedValue),
    Timeout,
    RuntimeFailure(String),
    SetupFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Setup,
    Mismatch,
    Timeout,
    Runtime,
}

/// Diagnostic payload for a failed grading request.
///
/// `fixture_index` is the 1-based number of the fixture that terminated the
/// request; setup failures carry no index because no fixture ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub fixture_index: Option<usize>,
    pub message: String,
    pub expected: Option<DecodedValue>,
    pub actual: Option<DecodedValue>,
    pub raw_input: Option<String>,
}

impl Failure {
    pub fn setup(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Setup,
            fixture_index: None,
            message: message.into(),
            expected: None,
            actual: None,
            raw_input: None,
        }
    }

    pub fn timeout(fixture_index: usize) -> Self {
        Self {
            kind: FailureKind::Timeout,
            fixture_index: Some(fixture_index),
            message: format!("Timeout on fixture {}", fixture_index),
            expected: None,
            actual: None,
            raw_input: None,
        }
    }

    pub fn runtime(fixture_index: usize, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            kind: FailureKind::Runtime,
            fixture_index: Some(fixture_index),
            message: format!("Runtime error on fixture {}: {}", fixture_index, detail),
            expected: None,
            actual: None,
            raw_input: None,
        }
    }

    pub fn mismatch(
        fixture_index: usize,
        expected: DecodedValue,
        actual: DecodedValue,
        raw_input: impl Into<String>,
    ) -> Self {
        let raw_input = raw_input.into();
        Self {
            kind: FailureKind::Mismatch,
            fixture_index: Some(fixture_index),
            message: format!(
                "Fixture {} failed. Expected {}, got {}. Input: {}",
                fixture_index, expected, actual, raw_input
            ),
            expected: Some(expected),
            actual: Some(actual),
            raw_input: Some(raw_input),
        }
    }
}

/// Terminal result of one grading request. Once produced, no further
/// fixtures are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Verdict {
    Passed,
    Failed(Failure),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Verdict::Passed => None,
            Verdict::Failed(failure) => Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_failure_has_no_fixture_index() {
        let failure = Failure::setup("syntax error: unexpected token");
        assert_eq!(failure.kind, FailureKind::Setup);
        assert!(failure.fixture_index.is_none());
        assert!(failure.expected.is_none());
    }

    #[test]
    fn test_mismatch_message_carries_reproduction_detail() {
        let failure = Failure::mismatch(
            2,
            DecodedValue::Int(5),
            DecodedValue::Int(4),
            "2, 3",
        );
        assert_eq!(failure.fixture_index, Some(2));
        assert_eq!(
            failure.message,
            "Fixture 2 failed. Expected 5, got 4. Input: 2, 3"
        );
    }

    #[test]
    fn test_verdict_accessors() {
        assert!(Verdict::Passed.passed());
        let verdict = Verdict::Failed(Failure::timeout(1));
        assert!(!verdict.passed());
        assert_eq!(verdict.failure().unwrap().kind, FailureKind::Timeout);
    }

    #[test]
    fn test_grade_request_serde_defaults() {
        let json = r#"{
            "id": "6f2a9c3e-8b1d-4e5f-9a7b-1c2d3e4f5a6b",
            "source": "function solve(x) { return x; }",
            "fixtures": [{"input": "1", "expected": "1"}]
        }"#;
        let request: GradeRequest = serde_json::from_str(json).unwrap();
        assert!(request.entry_point.is_none());
        assert!(request.deadline_ms.is_none());
        assert_eq!(request.fixtures.len(), 1);
    }
}
