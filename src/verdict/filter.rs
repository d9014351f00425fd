use serde_json::Value;

use super::Verdicts;
use crate::error::FilterError;

/// Query language evaluated over the JSON form of a verdict list.
pub trait Evaluator {
    fn evaluate(&self, document: &Value, expr: &str) -> Result<Value, FilterError>;
}

/// `JSONPath` evaluator backed by `jsonpath_lib`.
///
/// A single match that is already an array is returned as-is (so `$` is the
/// identity); any other result is collected into an array.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPath;

impl Evaluator for JsonPath {
    fn evaluate(&self, document: &Value, expr: &str) -> Result<Value, FilterError> {
        let matches = jsonpath_lib::select(document, expr).map_err(|e| FilterError::InvalidExpression {
            expr: expr.to_string(),
            reason: format!("{:?}", e),
        })?;
        if matches.len() == 1 && matches[0].is_array() {
            return Ok(matches[0].clone());
        }
        Ok(Value::Array(matches.into_iter().cloned().collect()))
    }
}

/// Raw filter output plus its best-effort typed form.
#[derive(Debug)]
pub struct Filtered {
    /// Whatever the expression matched.
    pub value: Value,
    /// The matched value decoded as verdicts, when it has that shape.
    pub verdicts: Result<Verdicts, FilterError>,
}

impl Verdicts {
    /// Filter with a `JSONPath` expression.
    pub fn filter(&self, expr: &str) -> Result<Filtered, FilterError> {
        self.filter_with(&JsonPath, expr)
    }

    pub fn filter_with(&self, evaluator: &dyn Evaluator, expr: &str) -> Result<Filtered, FilterError> {
        let document = serde_json::to_value(self).map_err(FilterError::Serialize)?;
        let value = evaluator.evaluate(&document, expr)?;
        let verdicts = serde_json::from_value(value.clone()).map_err(FilterError::Shape);
        tracing::debug!(expr, typed = verdicts.is_ok(), "verdicts filtered");
        Ok(Filtered { value, verdicts })
    }
}
