//! Rule evaluator

use crate::context::{to_number, DataContext};
use crate::rule::ast::{AstNode, LogicalOperator, Operand, RelationalOperator};

/// Evaluate an AST against a data context
///
/// Both sides of a logical node are always evaluated before combining.
/// Missing attributes never fail: they compare false under `>`, `<` and `=`.
/// The walk uses an explicit stack, so tree height is bounded by memory only.
pub fn evaluate_rule(ast: &AstNode, context: &DataContext) -> bool {
    ast.fold(
        |operand| check_operand(operand, context),
        |operator, left, right| match operator {
            LogicalOperator::And => left && right,
            LogicalOperator::Or => left || right,
        },
    )
}

fn check_operand(operand: &Operand, context: &DataContext) -> bool {
    let actual = context.get(&operand.attribute);

    match operand.operator {
        // NaN on either side makes both orderings false
        RelationalOperator::Greater => actual.to_number() > to_number(&operand.value),
        RelationalOperator::Less => actual.to_number() < to_number(&operand.value),
        RelationalOperator::Equal => actual.strictly_equals(&operand.value),
    }
}
