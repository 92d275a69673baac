//! # AST → IR Lowering
//!
//! A single pre-order traversal (spec §4.2). Statement nodes emit one or more
//! IR nodes; expression nodes evaluate to a single IR node. Three cases are
//! lowered in a way that is deliberately *not* the most capable thing we
//! could write, because the spec documents this as the reference behavior to
//! reproduce rather than silently "fix":
//!
//! - `PRINT a, b, c` only lowers the first expression into `Ir::Print` - the
//!   remaining comma-separated expressions are parsed but discarded here.
//! - `CONTINUE`/`EXIT` lower to `Ir::Goto("__continue__")`/`Ir::Goto("__break__")`
//!   marker labels that [`crate::emit`] does not resolve - reserved, not
//!   wired up.
//! - `LEN`/`VAL`/`ISNAN` calls lower to `Ir::Call` with the lower-cased
//!   builtin name; the emitter does not implement `Ir::Call` and raises an
//!   emission fault if one reaches it.

use crate::ast::{Expr, Program, Stmt};
use crate::ir::{ConstType, Ir};

/// Lower an entire program into its flat, ordered IR node list.
pub fn lower_program(program: &Program) -> Vec<Ir> {
    program.stmts.iter().flat_map(lower_stmt).collect()
}

fn lower_block(stmts: &[Stmt]) -> Vec<Ir> {
    stmts.iter().flat_map(lower_stmt).collect()
}

fn lower_stmt(stmt: &Stmt) -> Vec<Ir> {
    match stmt {
        Stmt::Print { exprs, .. } => {
            // Documented limitation: only the first expression survives lowering.
            let expr = match exprs.first() {
                Some(e) => lower_expr(e),
                None => Ir::Const { value: String::new(), ty: ConstType::Str },
            };
            vec![Ir::Print { expr: Box::new(expr) }]
        }
        Stmt::Let { name, expr, .. } => {
            vec![Ir::Let { name: name.clone(), expr: Box::new(lower_expr(expr)) }]
        }
        Stmt::AssignIndex { name, index, value, .. } => {
            vec![Ir::StoreIndex {
                target: Box::new(Ir::Var { name: name.clone() }),
                index: Box::new(lower_expr(index)),
                value: Box::new(lower_expr(value)),
            }]
        }
        Stmt::If { cond, then_branch, else_branch, .. } => {
            vec![Ir::If {
                cond: Box::new(lower_expr(cond)),
                then_body: lower_block(then_branch),
                else_body: else_branch.as_ref().map(|b| lower_block(b)),
            }]
        }
        Stmt::While { cond, body, .. } => {
            vec![Ir::While { cond: Box::new(lower_expr(cond)), body: lower_block(body) }]
        }
        Stmt::Repeat { body, cond, .. } => {
            vec![Ir::Repeat { body: lower_block(body), cond: Box::new(lower_expr(cond)) }]
        }
        Stmt::For { var, from, to, step, body, .. } => {
            vec![Ir::For {
                var: var.clone(),
                from: Box::new(lower_expr(from)),
                to: Box::new(lower_expr(to)),
                step: step.as_ref().map(|s| Box::new(lower_expr(s))),
                body: lower_block(body),
            }]
        }
        Stmt::Input { names, .. } => vec![Ir::Input { names: names.clone() }],
        Stmt::Continue { .. } => vec![Ir::Goto { label: "__continue__".to_string() }],
        Stmt::Exit { .. } => vec![Ir::Goto { label: "__break__".to_string() }],
    }
}

fn lower_expr(expr: &Expr) -> Ir {
    match expr {
        Expr::Number { text, .. } => {
            let ty = if text.contains('.') { ConstType::Float } else { ConstType::Int };
            Ir::Const { value: text.clone(), ty }
        }
        Expr::Str { text, .. } => Ir::Const { value: text.clone(), ty: ConstType::Str },
        Expr::Var { name, .. } => Ir::Var { name: name.clone() },
        Expr::Binary { op, left, right, .. } => Ir::Binary {
            op: op.clone(),
            left: Box::new(lower_expr(left)),
            right: Box::new(lower_expr(right)),
        },
        Expr::Unary { op, operand, .. } => {
            Ir::Unary { op: op.clone(), operand: Box::new(lower_expr(operand)) }
        }
        Expr::FuncCall { builtin, args, .. } => Ir::Call {
            name: builtin.clone(),
            args: args.iter().map(lower_expr).collect(),
        },
        // Never produced by the parser (no call syntax exists for user-defined
        // functions in this grammar - see spec §1 non-goals); lowered the same
        // way as a builtin call so the AST variant still has defined behavior.
        Expr::CustomCall { name, args, .. } => Ir::Call {
            name: name.clone(),
            args: args.iter().map(lower_expr).collect(),
        },
        Expr::Index { target, index, .. } => Ir::Index {
            target: Box::new(lower_expr(target)),
            index: Box::new(lower_expr(index)),
        },
        Expr::NewArray { size, .. } => {
            Ir::NewArray { size: Box::new(lower_expr(size)), element_type: "any".to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::token::tokenize;

    fn lower(src: &str) -> Vec<Ir> {
        let program = Parser::parse_program(tokenize(src).unwrap()).unwrap();
        lower_program(&program)
    }

    #[test]
    fn print_with_multiple_args_keeps_only_first() {
        let ir = lower("PRINT 1, 2, 3\n");
        match &ir[0] {
            Ir::Print { expr } => match expr.as_ref() {
                Ir::Const { value, .. } => assert_eq!(value, "1"),
                _ => panic!("expected constant"),
            },
            _ => panic!("expected print"),
        }
    }

    #[test]
    fn continue_and_exit_become_reserved_gotos() {
        let ir = lower("CONTINUE\nEXIT\n");
        assert!(matches!(&ir[0], Ir::Goto { label } if label == "__continue__"));
        assert!(matches!(&ir[1], Ir::Goto { label } if label == "__break__"));
    }

    #[test]
    fn builtin_calls_lower_to_ir_call() {
        let ir = lower("LET X = LEN(\"hi\")\n");
        match &ir[0] {
            Ir::Let { expr, .. } => assert!(matches!(expr.as_ref(), Ir::Call { name, .. } if name == "len")),
            _ => panic!("expected let"),
        }
    }
}
