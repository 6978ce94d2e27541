use super::*;

/// ## Helper functions for building expressions
impl Expression {
    /// Shortcut for creating a (non-pointer) variable read expression.
    #[cfg(test)]
    pub fn var(name: &str) -> Expression {
        Expression::Var(Variable::new(name, false))
    }

    /// Shortcut for creating a pointer variable read expression.
    #[cfg(test)]
    pub fn ptr_var(name: &str) -> Expression {
        Expression::Var(Variable::new(name, true))
    }

    /// Shortcut for creating a dereference of a pointer variable.
    #[cfg(test)]
    pub fn deref_var(name: &str) -> Expression {
        Expression::Deref(Box::new(Expression::ptr_var(name)))
    }

    /// Shortcut for creating a call expression.
    #[cfg(test)]
    pub fn call(target: &str, args: Vec<Expression>) -> Expression {
        Expression::Call {
            target: target.to_string(),
            args,
        }
    }

    /// Shortcut for creating an `Add`-expression.
    pub fn plus(self, rhs: Expression) -> Expression {
        Expression::BinOp {
            op: BinOpType::Add,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// Shortcut for creating unary operation expressions.
    #[cfg(test)]
    pub fn un_op(self, op: UnOpType) -> Expression {
        Expression::UnOp {
            op,
            arg: Box::new(self),
        }
    }

    /// Shortcut for creating a comparison of the expression against `nullptr`.
    #[cfg(test)]
    pub fn is_not_null(self) -> Expression {
        Expression::BinOp {
            op: BinOpType::NotEqual,
            lhs: Box::new(self),
            rhs: Box::new(Expression::Null),
        }
    }
}
