//! In-process JavaScript evaluation on an embedded V8 isolate.
//!
//! The isolate is created with default options: no module loader, no ops, no
//! filesystem or network reach. Everything a script can see is injected
//! explicitly by the bootstrap below. Scripts communicate back by assigning to
//! a global `result` slot; `console` output is buffered and surfaced as the
//! result's stdout.

use deno_core::{JsRuntime, RuntimeOptions};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::action::ExecutionResult;
use crate::error::EngineError;

/// Evaluate one script in a fresh isolate. `JsRuntime` is `!Send`, so the
/// whole evaluation runs on a blocking thread.
#[instrument(skip_all, fields(script_len = script.len()))]
pub async fn evaluate(
    script: &str,
    params: Option<&Map<String, Value>>,
) -> Result<ExecutionResult, EngineError> {
    let script = script.to_string();
    let params = params.cloned();
    tokio::task::spawn_blocking(move || evaluate_blocking(&script, params.as_ref()))
        .await
        .map_err(|err| EngineError::Sandbox(format!("sandbox task panicked: {err}")))?
}

fn evaluate_blocking(
    script: &str,
    params: Option<&Map<String, Value>>,
) -> Result<ExecutionResult, EngineError> {
    let mut runtime = JsRuntime::new(RuntimeOptions::default());

    let bootstrap = bootstrap_source(params);
    runtime
        .execute_script("keydeck:bootstrap", bootstrap)
        .map_err(|err| EngineError::Sandbox(format!("bootstrap failed: {err}")))?;

    // The user script is wrapped so that thrown errors become a failure
    // `result` instead of aborting the harvest, and queued timers run to
    // completion before we read anything back.
    let wrapped = format!(
        r#"try {{
{script}
}} catch (e) {{
  result = {{ success: false, message: 'Script error: ' + (e && e.message ? e.message : String(e)) }};
}}
__drainTimers();"#
    );
    runtime
        .execute_script("keydeck:user", wrapped)
        .map_err(|err| EngineError::Sandbox(err.to_string()))?;

    let harvest = runtime
        .execute_script("keydeck:harvest", HARVEST_SOURCE)
        .map_err(|err| EngineError::Sandbox(format!("harvest failed: {err}")))?;

    let raw = {
        let scope = &mut runtime.handle_scope();
        let local = deno_core::v8::Local::new(scope, harvest);
        local.to_rust_string_lossy(scope)
    };
    debug!(raw = %raw, "Sandbox harvest");

    let harvested: Value = serde_json::from_str(&raw)
        .map_err(|err| EngineError::Sandbox(format!("unreadable sandbox result: {err}")))?;
    Ok(interpret(&harvested))
}

/// Globals available before the user script runs.
fn bootstrap_source(params: Option<&Map<String, Value>>) -> String {
    let params_json = match params {
        Some(map) => Value::Object(map.clone()).to_string(),
        None => "{}".to_string(),
    };
    let env: Map<String, Value> = std::env::vars()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let process_info = json!({
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "env": env,
    })
    .to_string();
    let app_path = Value::String(
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_string_lossy().into_owned()))
            .unwrap_or_default(),
    )
    .to_string();

    format!(
        r#"var result = undefined;
var __logs = [];
function __fmt(args) {{
  return args.map(function (a) {{
    if (typeof a === 'string') return a;
    try {{ return JSON.stringify(a); }} catch (_) {{ return String(a); }}
  }}).join(' ');
}}
var console = {{
  log: function () {{ __logs.push(__fmt(Array.prototype.slice.call(arguments))); }},
  warn: function () {{ __logs.push('[warn] ' + __fmt(Array.prototype.slice.call(arguments))); }},
  error: function () {{ __logs.push('[error] ' + __fmt(Array.prototype.slice.call(arguments))); }},
}};
var params = {params_json};
var processInfo = Object.freeze({process_info});
var appPath = {app_path};
var appResourcesPath = appPath;
var __timers = [];
var __timerId = 0;
function setTimeout(fn, _delay) {{
  __timers.push({{ id: ++__timerId, fn: fn }});
  return __timerId;
}}
function clearTimeout(id) {{
  __timers = __timers.filter(function (t) {{ return t.id !== id; }});
}}
function __drainTimers() {{
  // Timers fire in queue order with no real delay; new timers queued while
  // draining also run, bounded to avoid infinite self-scheduling.
  var budget = 1000;
  while (__timers.length > 0 && budget-- > 0) {{
    var t = __timers.shift();
    try {{ t.fn(); }} catch (e) {{ __logs.push('[error] timer: ' + String(e)); }}
  }}
}}"#
    )
}

const HARVEST_SOURCE: &str = r#"(function () {
  var out = { set: result !== undefined, result: null, logs: __logs };
  if (out.set) {
    try {
      JSON.stringify(result);
      out.result = result;
    } catch (_) {
      out.result = String(result);
    }
  }
  try {
    return JSON.stringify(out);
  } catch (_) {
    return JSON.stringify({ set: false, result: null, logs: [] });
  }
})()"#;

/// Map the harvested `{set, result, logs}` envelope onto an
/// [`ExecutionResult`].
fn interpret(harvested: &Value) -> ExecutionResult {
    let logs = harvested["logs"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let mut result = if harvested["set"].as_bool() == Some(true) {
        match &harvested["result"] {
            Value::Object(obj) => {
                let success = obj.get("success").and_then(Value::as_bool).unwrap_or(true);
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| {
                        if success {
                            "Script completed".to_string()
                        } else {
                            "Script failed".to_string()
                        }
                    });
                // A result object is the script's verbatim verdict; its own
                // stdout/stderr fields carry through.
                ExecutionResult {
                    success,
                    message,
                    stdout: obj
                        .get("stdout")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                    stderr: obj
                        .get("stderr")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                    error: None,
                }
            }
            other => ExecutionResult::ok(value_to_message(other)),
        }
    } else {
        ExecutionResult::ok("Script completed")
    };

    // Console output appends after any script-set stdout.
    if !logs.is_empty() {
        result.stdout = Some(match result.stdout.take() {
            Some(existing) => format!("{existing}\n{logs}"),
            None => logs,
        });
    }
    result
}

fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn eval(script: &str) -> ExecutionResult {
        evaluate(script, None).await.expect("sandbox evaluation")
    }

    #[tokio::test]
    async fn result_object_is_returned_verbatim() {
        let result = eval("result = { success: true, message: 'copied' };").await;
        assert!(result.success);
        assert_eq!(result.message, "copied");
    }

    #[tokio::test]
    async fn unset_result_is_generic_success() {
        let result = eval("var x = 1 + 1;").await;
        assert!(result.success);
        assert_eq!(result.message, "Script completed");
    }

    #[tokio::test]
    async fn scalar_result_becomes_the_message() {
        let result = eval("result = 'all done';").await;
        assert!(result.success);
        assert_eq!(result.message, "all done");
    }

    #[tokio::test]
    async fn failure_result_keeps_success_false() {
        let result = eval("result = { success: false, message: 'no target' };").await;
        assert!(!result.success);
        assert_eq!(result.message, "no target");
    }

    #[tokio::test]
    async fn result_stdout_and_stderr_fields_carry_through() {
        let result = eval(
            "result = { success: true, message: 'x', stdout: 'data', stderr: 'noise' };",
        )
        .await;
        assert!(result.success);
        assert_eq!(result.message, "x");
        assert_eq!(result.stdout.as_deref(), Some("data"));
        assert_eq!(result.stderr.as_deref(), Some("noise"));
    }

    #[tokio::test]
    async fn console_output_appends_after_result_stdout() {
        let result = eval(
            "console.log('logged'); result = { success: true, message: 'x', stdout: 'data' };",
        )
        .await;
        assert_eq!(result.stdout.as_deref(), Some("data\nlogged"));
    }

    #[tokio::test]
    async fn thrown_error_becomes_failure_result() {
        let result = eval("throw new Error('boom');").await;
        assert!(!result.success);
        assert!(result.message.contains("boom"));
    }

    #[tokio::test]
    async fn params_are_visible_to_the_script() {
        let mut params = Map::new();
        params.insert("name".to_string(), Value::String("world".to_string()));
        let result = evaluate(
            "result = { success: true, message: 'hello ' + params.name };",
            Some(&params),
        )
        .await
        .expect("sandbox evaluation");
        assert_eq!(result.message, "hello world");
    }

    #[tokio::test]
    async fn console_output_is_captured_as_stdout() {
        let result = eval("console.log('first', { n: 1 }); console.log('second');").await;
        assert!(result.success);
        let stdout = result.stdout.expect("stdout");
        assert!(stdout.contains("first {\"n\":1}"));
        assert!(stdout.contains("second"));
    }

    #[tokio::test]
    async fn timers_run_before_harvest() {
        let result =
            eval("setTimeout(function () { result = { success: true, message: 'late' }; }, 50);")
                .await;
        assert_eq!(result.message, "late");
    }

    #[tokio::test]
    async fn syntax_error_is_a_sandbox_error() {
        let err = evaluate("this is not javascript", None).await.unwrap_err();
        assert!(matches!(err, EngineError::Sandbox(_)));
    }

    #[tokio::test]
    async fn process_info_describes_the_host() {
        let result = eval("result = processInfo.platform;").await;
        assert_eq!(result.message, std::env::consts::OS);
    }
}
