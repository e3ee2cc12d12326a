//! Isolated Runner
//!
//! **Core Responsibility:**
//! Execute one bound call against candidate source under a hard wall-clock
//! deadline, capturing printed output and thrown conditions.
//!
//! **Architecture:**
//! Each call is evaluated in a fresh interpreter context on a blocking
//! worker, raced against a deadline timer. If the deadline elapses first the
//! caller gets `Timeout` and stops waiting; the worker is not forcibly
//! terminated and may keep its thread until the interpreter returns. True
//! termination requires process-level isolation.
//!
//! The evaluated script is: stdin/console shim, then the candidate source,
//! then a driver that invokes the entry point and returns a JSON envelope
//! `{result, stdout}`.

use std::time::{Duration, Instant};

use anyhow::Result;
use boa_engine::{Context, Source};
use serde::Deserialize;
use tracing::{debug, warn};

use verdex_common::types::ExecutionOutcome;
use verdex_common::value::DecodedValue;

use crate::bind::BoundCall;
use crate::decode;
use crate::inspect::EntryPoint;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(2);

/// Console capture, `print`, and line-oriented stdin. `__stdin_lines` must
/// be defined before this prelude runs.
const RUNTIME_SHIM: &str = r#"
var __stdout = [];
var __stdin_pos = 0;
var console = {
    log: function() {
        var parts = [];
        for (var i = 0; i < arguments.length; i++) {
            if (typeof arguments[i] === 'object') {
                parts.push(JSON.stringify(arguments[i]));
            } else {
                parts.push(String(arguments[i]));
            }
        }
        __stdout.push(parts.join(' '));
    },
    warn: function() { console.log.apply(null, arguments); },
    error: function() { console.log.apply(null, arguments); },
    info: function() { console.log.apply(null, arguments); }
};
function print() { console.log.apply(null, arguments); }
function readLine() {
    return __stdin_pos < __stdin_lines.length ? __stdin_lines[__stdin_pos++] : '';
}
function readAll() {
    return __stdin_lines.join('\n');
}
"#;

/// Outcome of one bounded execution plus its observed wall-clock time.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: ExecutionOutcome,
    pub execution_time_ms: u64,
}

impl RunReport {
    fn new(outcome: ExecutionOutcome, execution_time_ms: u64) -> Self {
        Self {
            outcome,
            execution_time_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Runner {
    deadline: Duration,
}

enum BoundedEval {
    /// The script ran to completion; payload is its string completion value.
    Completed(Option<String>, u64),
    /// The script threw, or the worker itself failed.
    Thrown(String, u64),
    TimedOut(u64),
}

#[derive(Deserialize)]
struct CallEnvelope {
    #[serde(default)]
    result: Option<DecodedValue>,
    #[serde(default)]
    stdout: Vec<String>,
}

#[derive(Deserialize)]
struct ProbeEnvelope {
    ok: bool,
}

impl Runner {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Execute one bound call. Never blocks past the deadline plus
    /// scheduling overhead.
    pub async fn run_call(
        &self,
        source: &str,
        entry: &EntryPoint,
        call: &BoundCall,
    ) -> RunReport {
        let args = call_arguments(entry, call);
        let script = match build_call_script(source, entry, call, &args) {
            Ok(script) => script,
            Err(e) => {
                return RunReport::new(
                    ExecutionOutcome::RuntimeFailure(format!("failed to prepare call: {}", e)),
                    0,
                )
            }
        };

        match self.eval_bounded(script).await {
            BoundedEval::TimedOut(ms) => {
                warn!(entry = %entry.name, elapsed_ms = ms, "call exceeded deadline");
                RunReport::new(ExecutionOutcome::Timeout, ms)
            }
            BoundedEval::Thrown(thrown, ms) => RunReport::new(
                ExecutionOutcome::RuntimeFailure(runtime_diagnostic(&thrown, &args, entry)),
                ms,
            ),
            BoundedEval::Completed(None, ms) => RunReport::new(
                ExecutionOutcome::RuntimeFailure(
                    "call driver returned a non-string envelope".to_string(),
                ),
                ms,
            ),
            BoundedEval::Completed(Some(text), ms) => match serde_json::from_str::<CallEnvelope>(
                &text,
            ) {
                Ok(envelope) => {
                    let stdout = envelope.stdout.join("\n");
                    let value = match envelope.result {
                        Some(value) if !value.is_null() => value,
                        // A value-less return with captured output means the
                        // candidate communicates through stdout.
                        _ if !stdout.trim().is_empty() => decode::decode(&stdout),
                        _ => DecodedValue::Null,
                    };
                    debug!(entry = %entry.name, elapsed_ms = ms, "call completed");
                    RunReport::new(ExecutionOutcome::Success(value), ms)
                }
                Err(e) => RunReport::new(
                    ExecutionOutcome::RuntimeFailure(format!("malformed result envelope: {}", e)),
                    ms,
                ),
            },
        }
    }

    /// Evaluate the candidate once before any fixture and verify the entry
    /// point is callable. Top-level throws and hangs are setup failures,
    /// not per-fixture runtime failures.
    pub async fn probe(&self, source: &str, entry_name: &str) -> RunReport {
        let script = match build_probe_script(source, entry_name) {
            Ok(script) => script,
            Err(e) => {
                return RunReport::new(
                    ExecutionOutcome::SetupFailure(format!("failed to prepare probe: {}", e)),
                    0,
                )
            }
        };

        match self.eval_bounded(script).await {
            BoundedEval::TimedOut(ms) => RunReport::new(
                ExecutionOutcome::SetupFailure("setup timed out".to_string()),
                ms,
            ),
            BoundedEval::Thrown(thrown, ms) => RunReport::new(
                ExecutionOutcome::SetupFailure(format!("setup error: {}", thrown)),
                ms,
            ),
            BoundedEval::Completed(Some(text), ms) => {
                match serde_json::from_str::<ProbeEnvelope>(&text) {
                    Ok(envelope) if envelope.ok => {
                        RunReport::new(ExecutionOutcome::Success(DecodedValue::Null), ms)
                    }
                    Ok(_) => RunReport::new(
                        ExecutionOutcome::SetupFailure(format!(
                            "'{}' is not callable",
                            entry_name
                        )),
                        ms,
                    ),
                    Err(e) => RunReport::new(
                        ExecutionOutcome::SetupFailure(format!("malformed probe envelope: {}", e)),
                        ms,
                    ),
                }
            }
            BoundedEval::Completed(None, ms) => RunReport::new(
                ExecutionOutcome::SetupFailure(
                    "probe driver returned a non-string envelope".to_string(),
                ),
                ms,
            ),
        }
    }

    /// Run an arbitrary script once, bounded. Success carries no value;
    /// callers only care whether the script threw or hung.
    pub async fn run_script(&self, body: &str) -> RunReport {
        let script = match shim_prelude(&[]) {
            Ok(prelude) => format!("{}\n{}\n", prelude, body),
            Err(e) => {
                return RunReport::new(
                    ExecutionOutcome::RuntimeFailure(format!("failed to prepare script: {}", e)),
                    0,
                )
            }
        };

        match self.eval_bounded(script).await {
            BoundedEval::TimedOut(ms) => RunReport::new(ExecutionOutcome::Timeout, ms),
            BoundedEval::Thrown(thrown, ms) => {
                RunReport::new(ExecutionOutcome::RuntimeFailure(thrown), ms)
            }
            BoundedEval::Completed(_, ms) => {
                RunReport::new(ExecutionOutcome::Success(DecodedValue::Null), ms)
            }
        }
    }

    async fn eval_bounded(&self, script: String) -> BoundedEval {
        let start = Instant::now();
        let handle = tokio::task::spawn_blocking(move || eval_script(&script));
        let raced = tokio::time::timeout(self.deadline, handle).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match raced {
            // The worker keeps running after this point; only the waiter
            // stops.
            Err(_) => BoundedEval::TimedOut(elapsed),
            Ok(Err(join_error)) => {
                BoundedEval::Thrown(format!("worker failed: {}", join_error), elapsed)
            }
            Ok(Ok(Err(thrown))) => BoundedEval::Thrown(thrown, elapsed),
            Ok(Ok(Ok(completion))) => BoundedEval::Completed(completion, elapsed),
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}

fn eval_script(script: &str) -> Result<Option<String>, String> {
    let mut context = Context::default();
    match context.eval(Source::from_bytes(script)) {
        Ok(value) => Ok(value.as_string().map(|s| s.to_std_string_escaped())),
        Err(e) => Err(e.to_string()),
    }
}

/// Concrete positional arguments for a bound call. Keyword calls are
/// realized positionally in declared-parameter order; missing keys pass
/// null.
fn call_arguments(entry: &EntryPoint, call: &BoundCall) -> Vec<DecodedValue> {
    match call {
        BoundCall::ZeroArgStdin { .. } => Vec::new(),
        BoundCall::Keyword(map) => entry
            .params
            .iter()
            .map(|param| {
                param
                    .as_deref()
                    .and_then(|name| map.get(name).cloned())
                    .unwrap_or(DecodedValue::Null)
            })
            .collect(),
        BoundCall::PositionalSpread(items) => items.clone(),
        BoundCall::SinglePositional(value) => vec![value.clone()],
    }
}

fn shim_prelude(stdin_lines: &[&str]) -> Result<String> {
    let stdin_json = serde_json::to_string(stdin_lines)?;
    Ok(format!(
        "var __stdin_lines = JSON.parse('{}');\n{}",
        escape_single_quoted(&stdin_json),
        RUNTIME_SHIM
    ))
}

fn build_call_script(
    source: &str,
    entry: &EntryPoint,
    call: &BoundCall,
    args: &[DecodedValue],
) -> Result<String> {
    let stdin_lines: Vec<&str> = match call {
        BoundCall::ZeroArgStdin { raw_input } => raw_input.lines().collect(),
        _ => Vec::new(),
    };
    let prelude = shim_prelude(&stdin_lines)?;
    let args_json = serde_json::to_string(args)?;
    Ok(format!(
        "{prelude}\n{source}\n\n(function() {{\n\
         \x20   var __args = JSON.parse('{args}');\n\
         \x20   var __result = {entry}.apply(null, __args);\n\
         \x20   if (typeof __result === 'undefined') {{ __result = null; }}\n\
         \x20   return JSON.stringify({{ \"result\": __result, \"stdout\": __stdout }});\n\
         }})();\n",
        prelude = prelude,
        source = source,
        args = escape_single_quoted(&args_json),
        entry = entry.name,
    ))
}

fn build_probe_script(source: &str, entry_name: &str) -> Result<String> {
    let prelude = shim_prelude(&[])?;
    Ok(format!(
        "{prelude}\n{source}\n\n(function() {{\n\
         \x20   return JSON.stringify({{ \"ok\": typeof {entry} === 'function' }});\n\
         }})();\n",
        prelude = prelude,
        source = source,
        entry = entry_name,
    ))
}

fn runtime_diagnostic(thrown: &str, args: &[DecodedValue], entry: &EntryPoint) -> String {
    let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!(
        "{}. Args: [{}]. Params: [{}]",
        thrown,
        rendered.join(", "),
        entry.named_params().join(", ")
    )
}

fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
