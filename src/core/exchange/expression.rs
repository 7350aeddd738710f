use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use rhai::{Array, Dynamic, Engine, FnPtr, Map, Scope};
use serde_json::{Map as JsonMap, Number, Value};

/// Named values visible to an expression. Only what is bound here is in
/// scope; expressions never gain ambient access to the runtime.
#[derive(Clone, Default)]
pub struct ExpressionBindings {
    entries: Vec<(String, Value)>,
}

impl ExpressionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<T: Into<String>>(mut self, name: T, value: Value) -> Self {
        self.entries.push((name.into(), value));
        self
    }

    pub(crate) fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

/// Build a locked-down engine shared by immediate evaluation and the
/// host-callable bridge.
pub(crate) fn sandbox_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(50_000);
    engine.set_max_call_levels(64);
    engine.set_max_expr_depths(64, 64);
    engine.disable_symbol("eval");
    engine.on_print(|_| {});
    engine.on_debug(|_, _, _| {});
    engine
}

/// Expression evaluation engine for operator-authored computation rules.
pub struct ExpressionEngine {
    engine: Engine,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        ExpressionEngine {
            engine: sandbox_engine(),
        }
    }
}

impl ExpressionEngine {
    /// Evaluate the given expression against the provided bindings.
    ///
    /// A compile failure or throw is reported as an `ExpressionError`; shape
    /// checks on the result are the caller's concern.
    pub fn evaluate(
        &self,
        name: &str,
        expr: &str,
        bindings: &ExpressionBindings,
    ) -> Result<Value, AppError> {
        let mut scope = Scope::new();
        for (key, value) in bindings.entries() {
            scope.push_dynamic(key.clone(), to_dynamic(value));
        }
        let result = self
            .engine
            .eval_with_scope::<Dynamic>(&mut scope, expr)
            .map_err(|err| expression_error(name, &err.to_string()))?;
        Ok(from_dynamic(result))
    }

    /// Evaluate an expression that must yield a callable, then invoke the
    /// callable with the supplied named arguments as a single map argument.
    pub fn evaluate_callable(
        &self,
        name: &str,
        expr: &str,
        args: &ExpressionBindings,
    ) -> Result<Value, AppError> {
        let ast = self
            .engine
            .compile(expr)
            .map_err(|err| expression_error(name, &err.to_string()))?;
        let mut scope = Scope::new();
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|err| expression_error(name, &err.to_string()))?;
        let fn_ptr = result.try_cast::<FnPtr>().ok_or_else(|| {
            AppError::new(
                ErrorCategory::ContractError,
                format!("expression '{}' must return a function", name),
            )
            .with_code("PGW-EXPR-002")
        })?;
        let mut arg_map = Map::new();
        for (key, value) in args.entries() {
            arg_map.insert(key.as_str().into(), to_dynamic(value));
        }
        let out: Dynamic = fn_ptr
            .call(&self.engine, &ast, (Dynamic::from_map(arg_map),))
            .map_err(|err| expression_error(name, &err.to_string()))?;
        Ok(from_dynamic(out))
    }
}

pub(crate) fn expression_error(name: &str, detail: &str) -> AppError {
    AppError::new(
        ErrorCategory::ExpressionError,
        format!("expression '{}' failed: {}", name, detail),
    )
    .with_code("PGW-EXPR-001")
}

/// Loose truthiness used by condition expressions authored against documents.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(u) = n.as_u64() {
                Dynamic::from(u)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::from(0_i64)
            }
        }
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(items) => {
            let mut arr = Array::new();
            for item in items {
                arr.push(to_dynamic(item));
            }
            Dynamic::from_array(arr)
        }
        Value::Object(map) => {
            let mut rhai_map = Map::new();
            for (key, value) in map {
                rhai_map.insert(key.as_str().into(), to_dynamic(value));
            }
            Dynamic::from_map(rhai_map)
        }
    }
}

pub(crate) fn from_dynamic(value: Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Some(b) = value.clone().try_cast::<bool>() {
        return Value::Bool(b);
    }
    if let Some(i) = value.clone().try_cast::<i64>() {
        return Value::Number(Number::from(i));
    }
    if let Some(u) = value.clone().try_cast::<u64>() {
        return Value::Number(Number::from(u));
    }
    if let Some(f) = value.clone().try_cast::<f64>() {
        if let Some(num) = Number::from_f64(f) {
            return Value::Number(num);
        }
    }
    if let Some(s) = value.clone().try_cast::<String>() {
        return Value::String(s);
    }
    if let Some(arr) = value.clone().try_cast::<Array>() {
        return Value::Array(arr.into_iter().map(from_dynamic).collect());
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        let mut json_map = JsonMap::new();
        for (key, value) in map {
            json_map.insert(key.into(), from_dynamic(value));
        }
        return Value::Object(json_map);
    }
    Value::Null
}
