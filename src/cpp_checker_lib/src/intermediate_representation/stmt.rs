use super::{Expression, Term, Variable};
use crate::prelude::*;

/// A statement inside a function body.
///
/// Straight-line statements (declarations, assignments, expression statements,
/// `break` and `return`) become the contents of basic blocks during control flow
/// graph construction, while the structured control flow statements
/// (`if`, `while`, `for`, `switch`) determine the block and edge structure.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum Stmt {
    /// A variable declaration with an optional initializer.
    Decl {
        /// The declared variable.
        var: Variable,
        /// The initializer expression, if present.
        init: Option<Expression>,
    },
    /// An assignment.
    ///
    /// The target is either a variable read (`x = ..`)
    /// or a dereference expression (`*p = ..` for assignment through a pointer).
    Assign {
        /// The assignment target.
        target: Expression,
        /// The assigned value.
        value: Expression,
    },
    /// An expression evaluated for its side effects, e.g. a call statement.
    Expr(Expression),
    /// An `if` statement with optional `else` branch.
    If {
        /// The branch condition.
        condition: Expression,
        /// The statements of the true branch.
        then_body: Vec<Term<Stmt>>,
        /// The statements of the false branch, if present.
        else_body: Option<Vec<Term<Stmt>>>,
    },
    /// A `while` loop.
    While {
        /// The loop condition.
        condition: Expression,
        /// The loop body.
        body: Vec<Term<Stmt>>,
    },
    /// A `for` loop.
    ///
    /// All three header clauses are optional, as in C++.
    For {
        /// The loop initializer statement.
        init: Option<Box<Term<Stmt>>>,
        /// The loop condition.
        condition: Option<Expression>,
        /// The update statement executed after each iteration.
        update: Option<Box<Term<Stmt>>>,
        /// The loop body.
        body: Vec<Term<Stmt>>,
    },
    /// A `switch` statement.
    Switch {
        /// The switched-over expression.
        scrutinee: Expression,
        /// The `case` arms in source order.
        cases: Vec<SwitchCase>,
        /// The `default` arm, if present.
        default: Option<Vec<Term<Stmt>>>,
    },
    /// A `break` statement inside a loop or switch.
    Break,
    /// A `return` statement with optional return value.
    Return(Option<Expression>),
}

/// One `case` arm of a switch statement.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct SwitchCase {
    /// The integer label of the case.
    pub value: i64,
    /// The statements of the case body.
    /// A body that does not end in `break` or `return` falls through to the next case.
    pub body: Vec<Term<Stmt>>,
}

impl Stmt {
    /// Return the expressions evaluated directly by this statement.
    ///
    /// For control flow statements only the header expression is returned;
    /// nested bodies are not traversed.
    pub fn expressions(&self) -> Vec<&Expression> {
        use Stmt::*;
        match self {
            Decl { init, .. } => init.iter().collect(),
            Assign { target, value } => vec![target, value],
            Expr(expr) => vec![expr],
            If { condition, .. } | While { condition, .. } => vec![condition],
            For { condition, .. } => condition.iter().collect(),
            Switch { scrutinee, .. } => vec![scrutinee],
            Break => Vec::new(),
            Return(expr) => expr.iter().collect(),
        }
    }

    /// Return the names of all functions called anywhere inside this statement,
    /// including calls in nested bodies.
    pub fn call_targets(&self) -> Vec<&str> {
        use Stmt::*;
        fn body_targets(body: &[Term<Stmt>]) -> Vec<&str> {
            body.iter()
                .flat_map(|stmt| stmt.term.call_targets())
                .collect()
        }
        let mut targets: Vec<&str> = self
            .expressions()
            .into_iter()
            .flat_map(|expr| expr.call_targets())
            .collect();
        match self {
            If {
                then_body,
                else_body,
                ..
            } => {
                targets.append(&mut body_targets(then_body));
                if let Some(else_body) = else_body {
                    targets.append(&mut body_targets(else_body));
                }
            }
            While { body, .. } => targets.append(&mut body_targets(body)),
            For {
                init, update, body, ..
            } => {
                if let Some(init) = init {
                    targets.append(&mut init.term.call_targets());
                }
                if let Some(update) = update {
                    targets.append(&mut update.term.call_targets());
                }
                targets.append(&mut body_targets(body));
            }
            Switch { cases, default, .. } => {
                for case in cases {
                    targets.append(&mut body_targets(&case.body));
                }
                if let Some(default) = default {
                    targets.append(&mut body_targets(default));
                }
            }
            _ => (),
        }
        targets
    }
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Stmt::*;
        match self {
            Decl { var, init: None } => write!(formatter, "decl {}", var),
            Decl {
                var,
                init: Some(init),
            } => write!(formatter, "decl {} = {}", var, init),
            Assign { target, value } => write!(formatter, "{target} = {value}"),
            Expr(expr) => write!(formatter, "{expr}"),
            If { condition, .. } => write!(formatter, "if ({condition}) ..."),
            While { condition, .. } => write!(formatter, "while ({condition}) ..."),
            For { .. } => write!(formatter, "for (...) ..."),
            Switch { scrutinee, .. } => write!(formatter, "switch ({scrutinee}) ..."),
            Break => write!(formatter, "break"),
            Return(None) => write!(formatter, "return"),
            Return(Some(expr)) => write!(formatter, "return {expr}"),
        }
    }
}
