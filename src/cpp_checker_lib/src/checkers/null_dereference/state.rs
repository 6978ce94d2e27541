use crate::abstract_domain::{AbstractDomain, DomainMap, PointerDomain, UnionMergeStrategy};
use crate::intermediate_representation::*;
use crate::prelude::*;

/// The map type holding one abstract value per tracked pointer variable.
pub type PointerBindings = DomainMap<String, PointerDomain, UnionMergeStrategy>;

/// The state at one program point of the null dereference analysis.
///
/// The state consists of one [`PointerDomain`] binding per pointer variable
/// whose declaration has been reached.
/// Variables without a binding are not tracked pointers at that program point.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct State {
    bindings: PointerBindings,
}

impl State {
    /// Create the state at function entry.
    ///
    /// Pointer parameters are tracked but nothing is known about their values.
    pub fn new_entry(function: &Function) -> State {
        let bindings = function
            .parameters
            .iter()
            .filter(|param| param.is_pointer)
            .map(|param| (param.name.clone(), PointerDomain::MaybeNull))
            .collect();
        State { bindings }
    }

    /// Get the binding of the pointer variable with the given name.
    /// Returns `None` for untracked variables.
    pub fn get(&self, var_name: &str) -> Option<PointerDomain> {
        self.bindings.get(var_name).copied()
    }

    /// Compute the abstract pointer value of an expression
    /// assigned to a pointer variable:
    /// the null sentinels `nullptr` and literal `0` are definitely null,
    /// an address-of expression is definitely non-null,
    /// copying another pointer variable copies its current binding
    /// and everything else (calls, arithmetic) is unknown.
    fn eval(&self, expr: &Expression) -> PointerDomain {
        match expr {
            expr if expr.is_null_sentinel() => PointerDomain::Null,
            Expression::AddressOf(_) => PointerDomain::NonNull,
            Expression::Var(var) => self.get(&var.name).unwrap_or(PointerDomain::MaybeNull),
            _ => PointerDomain::MaybeNull,
        }
    }

    /// Apply the transfer function of a single straight-line statement to the state.
    ///
    /// Declarations of and assignments to pointer variables overwrite their binding.
    /// All other statements are identity on the pointer bindings;
    /// in particular, calls never modify the binding of any pointer
    /// (no inspection of pointers escaping into call arguments is attempted).
    pub fn handle_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl { var, init } => {
                if var.is_pointer {
                    let value = init
                        .as_ref()
                        .map(|init| self.eval(init))
                        .unwrap_or(PointerDomain::MaybeNull);
                    self.bindings.insert(var.name.clone(), value);
                } else {
                    // A non-pointer declaration shadowing a tracked pointer
                    // ends the tracking of that name.
                    self.bindings.remove(&var.name);
                }
            }
            Stmt::Assign {
                target: Expression::Var(var),
                value,
            } if var.is_pointer => {
                let value = self.eval(value);
                self.bindings.insert(var.name.clone(), value);
            }
            _ => (),
        }
    }

    /// Narrow the state according to a branch condition.
    ///
    /// On the branch where a guard of shape `p`, `p != nullptr` or `!(p == nullptr)`
    /// proves that `p` is non-null, the binding of `p` is narrowed to definitely-non-null.
    /// Branches that do not prove non-nullness leave all bindings unchanged,
    /// so an already null or unknown binding is preserved there.
    /// Conjunctions narrow all their operands on the true branch,
    /// disjunctions on the false branch.
    pub fn specialize_by_condition(&mut self, condition: &Expression, branch_taken: bool) {
        use Expression::*;
        match condition {
            Var(var) if branch_taken => self.set_non_null_if_tracked(var),
            UnOp {
                op: UnOpType::LogicalNot,
                arg,
            } => self.specialize_by_condition(arg, !branch_taken),
            BinOp {
                op: BinOpType::NotEqual,
                lhs,
                rhs,
            } if branch_taken => self.narrow_null_comparison(lhs, rhs),
            BinOp {
                op: BinOpType::Equal,
                lhs,
                rhs,
            } if !branch_taken => self.narrow_null_comparison(lhs, rhs),
            BinOp {
                op: BinOpType::LogicalAnd,
                lhs,
                rhs,
            } if branch_taken => {
                self.specialize_by_condition(lhs, true);
                self.specialize_by_condition(rhs, true);
            }
            BinOp {
                op: BinOpType::LogicalOr,
                lhs,
                rhs,
            } if !branch_taken => {
                self.specialize_by_condition(lhs, false);
                self.specialize_by_condition(rhs, false);
            }
            _ => (),
        }
    }

    /// Narrow a comparison against a null sentinel
    /// on the branch where it proves non-nullness.
    fn narrow_null_comparison(&mut self, lhs: &Expression, rhs: &Expression) {
        match (lhs, rhs) {
            (Expression::Var(var), other) | (other, Expression::Var(var))
                if other.is_null_sentinel() =>
            {
                self.set_non_null_if_tracked(var)
            }
            _ => (),
        }
    }

    fn set_non_null_if_tracked(&mut self, var: &Variable) {
        if let Some(binding) = self.bindings.get_mut(&var.name) {
            *binding = PointerDomain::NonNull;
        }
    }
}

impl AbstractDomain for State {
    /// Merge two states by pointwise joining the pointer bindings.
    fn merge(&self, other: &Self) -> Self {
        State {
            bindings: self.bindings.merge(&other.bindings),
        }
    }

    /// The `Top` element of the state lattice is the state without any tracked pointers.
    fn is_top(&self) -> bool {
        self.bindings.is_top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_state() -> State {
        State {
            bindings: PointerBindings::from(std::collections::BTreeMap::new()),
        }
    }

    #[test]
    fn declarations_set_bindings_by_initializer() {
        let mut state = empty_state();
        state.handle_stmt(&Stmt::Decl {
            var: Variable::new("p", true),
            init: Some(Expression::Null),
        });
        state.handle_stmt(&Stmt::Decl {
            var: Variable::new("q", true),
            init: Some(Expression::AddressOf(Variable::new("value", false))),
        });
        state.handle_stmt(&Stmt::Decl {
            var: Variable::new("r", true),
            init: Some(Expression::Const(0)),
        });
        state.handle_stmt(&Stmt::Decl {
            var: Variable::new("s", true),
            init: None,
        });
        assert_eq!(state.get("p"), Some(PointerDomain::Null));
        assert_eq!(state.get("q"), Some(PointerDomain::NonNull));
        assert_eq!(state.get("r"), Some(PointerDomain::Null));
        assert_eq!(state.get("s"), Some(PointerDomain::MaybeNull));
    }

    #[test]
    fn assignments_overwrite_bindings() {
        let mut state = empty_state();
        state.handle_stmt(&Stmt::Decl {
            var: Variable::new("p", true),
            init: Some(Expression::Null),
        });
        state.handle_stmt(&Stmt::Assign {
            target: Expression::ptr_var("p"),
            value: Expression::AddressOf(Variable::new("value", false)),
        });
        assert_eq!(state.get("p"), Some(PointerDomain::NonNull));
        // Copying a pointer variable copies its binding.
        state.handle_stmt(&Stmt::Decl {
            var: Variable::new("q", true),
            init: Some(Expression::ptr_var("p")),
        });
        assert_eq!(state.get("q"), Some(PointerDomain::NonNull));
        // A call result is unknown.
        state.handle_stmt(&Stmt::Assign {
            target: Expression::ptr_var("p"),
            value: Expression::call("make_ptr", vec![]),
        });
        assert_eq!(state.get("p"), Some(PointerDomain::MaybeNull));
    }

    #[test]
    fn guards_narrow_to_non_null_on_the_proving_branch() {
        let mut null_state = empty_state();
        null_state.handle_stmt(&Stmt::Decl {
            var: Variable::new("p", true),
            init: Some(Expression::Null),
        });

        // `p != nullptr`, true branch: proven non-null.
        let mut state = null_state.clone();
        state.specialize_by_condition(&Expression::ptr_var("p").is_not_null(), true);
        assert_eq!(state.get("p"), Some(PointerDomain::NonNull));

        // `p != nullptr`, false branch: binding preserved.
        let mut state = null_state.clone();
        state.specialize_by_condition(&Expression::ptr_var("p").is_not_null(), false);
        assert_eq!(state.get("p"), Some(PointerDomain::Null));

        // Truthy guard `p`, true branch.
        let mut state = null_state.clone();
        state.specialize_by_condition(&Expression::ptr_var("p"), true);
        assert_eq!(state.get("p"), Some(PointerDomain::NonNull));

        // `!p`, false branch: equivalent to the truthy guard holding.
        let mut state = null_state.clone();
        state.specialize_by_condition(
            &Expression::ptr_var("p").un_op(UnOpType::LogicalNot),
            false,
        );
        assert_eq!(state.get("p"), Some(PointerDomain::NonNull));

        // `nullptr == p`, false branch: operand order does not matter.
        let mut state = null_state.clone();
        state.specialize_by_condition(
            &Expression::BinOp {
                op: BinOpType::Equal,
                lhs: Box::new(Expression::Null),
                rhs: Box::new(Expression::ptr_var("p")),
            },
            false,
        );
        assert_eq!(state.get("p"), Some(PointerDomain::NonNull));

        // Untracked variables are never narrowed into the state.
        let mut state = empty_state();
        state.specialize_by_condition(&Expression::var("x"), true);
        assert_eq!(state.get("x"), None);
    }

    #[test]
    fn merge_joins_bindings_pointwise() {
        let mut null_state = empty_state();
        null_state.handle_stmt(&Stmt::Decl {
            var: Variable::new("p", true),
            init: Some(Expression::Null),
        });
        let mut non_null_state = null_state.clone();
        non_null_state.handle_stmt(&Stmt::Assign {
            target: Expression::ptr_var("p"),
            value: Expression::AddressOf(Variable::new("value", false)),
        });
        let merged = null_state.merge(&non_null_state);
        assert_eq!(merged.get("p"), Some(PointerDomain::MaybeNull));
    }
}
