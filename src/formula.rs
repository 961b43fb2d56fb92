//! Sandboxed formula evaluation against a document snapshot.
//!
//! Workflow rows can compute their approving role, or gate themselves, with
//! a small expression such as `doc.department + " Manager"` or
//! `doc.grand_total > 10000`. Formulas run on an embedded Rhai engine in
//! expression-only mode: no statements, no assignments, no `eval`, bounded
//! operations and sizes. The only name in scope is the read-only constant
//! `doc`, a map of the document's fields.

use rhai::{Dynamic, Engine, Scope};

use crate::error::{Error, Result};
use crate::model::Document;

const MAX_OPERATIONS: u64 = 10_000;
const MAX_EXPR_DEPTH: usize = 32;
const MAX_STRING_SIZE: usize = 4_096;
const MAX_COLLECTION_SIZE: usize = 1_024;

pub struct FormulaEvaluator {
    engine: Engine,
}

impl Default for FormulaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaEvaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine
            .set_max_operations(MAX_OPERATIONS)
            .set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH)
            .set_max_string_size(MAX_STRING_SIZE)
            .set_max_array_size(MAX_COLLECTION_SIZE)
            .set_max_map_size(MAX_COLLECTION_SIZE)
            .disable_symbol("eval");
        engine.on_print(|_| {});
        engine.on_debug(|_, _, _| {});
        Self { engine }
    }

    /// Evaluate `expr` with `doc` bound to the document's field map.
    pub fn evaluate(&self, expr: &str, doc: &Document) -> Result<Dynamic> {
        let fields = rhai::serde::to_dynamic(doc.context()).map_err(|e| formula_error(expr, e))?;
        let mut scope = Scope::new();
        scope.push_constant("doc", fields);

        self.engine
            .eval_expression_with_scope::<Dynamic>(&mut scope, expr)
            .map_err(|e| formula_error(expr, e))
    }

    /// Evaluate a role formula. Unit and blank strings mean "no role".
    pub fn eval_role(&self, expr: &str, doc: &Document) -> Result<Option<String>> {
        let value = self.evaluate(expr, doc)?;
        if value.is_unit() {
            return Ok(None);
        }
        let type_name = value.type_name();
        let role = value.into_string().map_err(|_| Error::Formula {
            expr: expr.to_string(),
            message: format!("expected a role name, got {type_name}"),
        })?;
        let role = role.trim();
        Ok((!role.is_empty()).then(|| role.to_string()))
    }

    /// Evaluate a gating condition. Anything but a boolean is an error.
    pub fn eval_condition(&self, expr: &str, doc: &Document) -> Result<bool> {
        let value = self.evaluate(expr, doc)?;
        value.as_bool().map_err(|found| Error::Formula {
            expr: expr.to_string(),
            message: format!("condition must be a boolean, got {found}"),
        })
    }
}

fn formula_error(expr: &str, err: impl std::fmt::Display) -> Error {
    Error::Formula {
        expr: expr.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Document {
        Document::new("Purchase Order", "PO-0001", "clerk@x")
            .workflow_state("Manager Review")
            .field("department", "Finance")
            .field("grand_total", 12_500)
    }

    #[test]
    fn role_formula_reads_document_fields() {
        let eval = FormulaEvaluator::new();
        let role = eval
            .eval_role(r#"doc.department + " Manager""#, &order())
            .unwrap();
        assert_eq!(role.as_deref(), Some("Finance Manager"));
    }

    #[test]
    fn blank_role_is_none() {
        let eval = FormulaEvaluator::new();
        assert_eq!(eval.eval_role(r#""  ""#, &order()).unwrap(), None);
        assert_eq!(eval.eval_role("()", &order()).unwrap(), None);
    }

    #[test]
    fn condition_must_be_boolean() {
        let eval = FormulaEvaluator::new();
        assert!(eval.eval_condition("doc.grand_total > 10000", &order()).unwrap());
        assert!(eval.eval_condition("doc.grand_total + 1", &order()).is_err());
    }

    #[test]
    fn statements_are_rejected() {
        let eval = FormulaEvaluator::new();
        assert!(eval.evaluate("let x = 1; x", &order()).is_err());
    }
}
