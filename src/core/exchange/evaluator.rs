//! Bridge between sandboxed expression evaluation and async host helpers.
//!
//! Options expressions may invoke a small fixed set of host-provided
//! callables (signing, file download, encoding). Script evaluation is
//! synchronous, so the script runs on a blocking thread while helper
//! invocations travel over a request/reply channel to the async side where
//! collaborator calls are awaited.

use crate::core::error::AppError;
use crate::core::exchange::expression::{expression_error, from_dynamic, sandbox_engine, to_dynamic, ExpressionBindings};
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use indexmap::IndexMap;
use rhai::{Dynamic, EvalAltResult, Scope};
use serde_json::{Map as JsonMap, Value};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Host helpers an expression may invoke. The set is fixed and explicit;
/// nothing else of the runtime is reachable from a script.
#[async_trait]
pub trait HostCallables: Send + Sync + 'static {
    fn names(&self) -> &'static [&'static str];
    async fn call(&self, name: &str, arg: Value) -> Result<Value, AppError>;
}

struct HostCall {
    name: &'static str,
    arg: Value,
    reply: std_mpsc::Sender<Result<Value, String>>,
}

/// Evaluate one expression with the host callable set in scope.
pub async fn evaluate_with_host(
    name: &str,
    expr: &str,
    bindings: &ExpressionBindings,
    host: Arc<dyn HostCallables>,
) -> Result<Value, AppError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<HostCall>();
    let callable_names = host.names();
    let expr_owned = expr.to_string();
    let bindings = bindings.clone();

    let mut eval = tokio::task::spawn_blocking(move || -> Result<Value, String> {
        let mut engine = sandbox_engine();
        for &callable in callable_names {
            let tx = tx.clone();
            engine.register_fn(
                callable,
                move |arg: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
                    let (reply_tx, reply_rx) = std_mpsc::channel();
                    tx.send(HostCall {
                        name: callable,
                        arg: from_dynamic(arg),
                        reply: reply_tx,
                    })
                    .map_err(|_| Box::<EvalAltResult>::from("host side closed"))?;
                    match reply_rx.recv() {
                        Ok(Ok(value)) => Ok(to_dynamic(&value)),
                        Ok(Err(message)) => Err(message.into()),
                        Err(_) => Err("host side closed".into()),
                    }
                },
            );
        }
        drop(tx);
        let mut scope = Scope::new();
        for (key, value) in bindings.entries() {
            scope.push_dynamic(key.clone(), to_dynamic(value));
        }
        engine
            .eval_with_scope::<Dynamic>(&mut scope, &expr_owned)
            .map(from_dynamic)
            .map_err(|err| err.to_string())
    });

    loop {
        tokio::select! {
            call = rx.recv() => match call {
                Some(call) => {
                    let result = host
                        .call(call.name, call.arg)
                        .await
                        .map_err(|err| err.to_string());
                    let _ = call.reply.send(result);
                }
                None => break,
            },
            joined = &mut eval => {
                return finish(name, joined);
            }
        }
    }
    finish(name, eval.await)
}

/// Evaluate the ordered options mapping sequentially, in mapping order.
/// Later expressions may rely on side effects of earlier helper calls, so
/// the fields are never evaluated concurrently.
pub async fn evaluate_fields(
    fields: &IndexMap<String, String>,
    bindings: &ExpressionBindings,
    host: &Arc<dyn HostCallables>,
) -> Result<Value, AppError> {
    let mut out = JsonMap::new();
    for (key, expr) in fields {
        let value = evaluate_with_host(key, expr, bindings, host.clone()).await?;
        out.insert(key.clone(), value);
    }
    Ok(Value::Object(out))
}

fn finish(
    name: &str,
    joined: Result<Result<Value, String>, tokio::task::JoinError>,
) -> Result<Value, AppError> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(expression_error(name, &message)),
        Err(err) => Err(AppError::new(
            ErrorCategory::InternalError,
            format!("evaluation task for expression '{}' failed: {}", name, err),
        )),
    }
}
