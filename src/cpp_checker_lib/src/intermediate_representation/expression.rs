use super::Variable;
use crate::prelude::*;

mod builder;

/// An expression is a side-effect-free calculation rule
/// on how to compute a value from variables and constants.
///
/// Call expressions are the one exception to side-effect-freeness:
/// the called function may have arbitrary effects.
/// Since the analyses in this crate are intraprocedural,
/// calls are treated as opaque value sources.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum Expression {
    /// A variable read.
    Var(Variable),
    /// An integer constant.
    Const(i64),
    /// The `nullptr` literal.
    Null,
    /// The address of a variable, i.e. `&var`.
    AddressOf(Variable),
    /// A pointer dereference, i.e. `*arg`.
    Deref(Box<Expression>),
    /// A direct call to the function with the given name.
    Call {
        /// The name of the called function.
        target: String,
        /// The argument expressions of the call.
        args: Vec<Expression>,
    },
    /// A binary operation.
    BinOp {
        /// The opcode/type of the operation.
        op: BinOpType,
        /// The left hand side expression.
        lhs: Box<Expression>,
        /// The right hand side expression.
        rhs: Box<Expression>,
    },
    /// A unary operation.
    UnOp {
        /// The opcode/type of the operation.
        op: UnOpType,
        /// The argument expression.
        arg: Box<Expression>,
    },
}

impl Expression {
    /// Return an array of all variables read by the given expression.
    /// The array may contain duplicates.
    pub fn input_vars(&self) -> Vec<&Variable> {
        use Expression::*;
        match self {
            Var(var) => vec![var],
            Const(_) | Null => Vec::new(),
            AddressOf(var) => vec![var],
            Deref(arg) => arg.input_vars(),
            Call { args, .. } => args.iter().flat_map(|arg| arg.input_vars()).collect(),
            BinOp { lhs, rhs, .. } => {
                let mut vars = lhs.input_vars();
                vars.append(&mut rhs.input_vars());
                vars
            }
            UnOp { arg, .. } => arg.input_vars(),
        }
    }

    /// Return the names of all pointer variables that are dereferenced
    /// somewhere inside the given expression.
    /// Each dereference site contributes one entry, so the array may contain duplicates.
    pub fn dereferenced_vars(&self) -> Vec<&Variable> {
        use Expression::*;
        match self {
            Var(_) | Const(_) | Null | AddressOf(_) => Vec::new(),
            Deref(arg) => match &**arg {
                Var(var) => vec![var],
                other => other.dereferenced_vars(),
            },
            Call { args, .. } => args
                .iter()
                .flat_map(|arg| arg.dereferenced_vars())
                .collect(),
            BinOp { lhs, rhs, .. } => {
                let mut vars = lhs.dereferenced_vars();
                vars.append(&mut rhs.dereferenced_vars());
                vars
            }
            UnOp { arg, .. } => arg.dereferenced_vars(),
        }
    }

    /// Return the names of all functions called somewhere inside the given expression.
    pub fn call_targets(&self) -> Vec<&str> {
        use Expression::*;
        match self {
            Var(_) | Const(_) | Null | AddressOf(_) => Vec::new(),
            Deref(arg) => arg.call_targets(),
            Call { target, args } => {
                let mut targets = vec![target.as_str()];
                for arg in args {
                    targets.append(&mut arg.call_targets());
                }
                targets
            }
            BinOp { lhs, rhs, .. } => {
                let mut targets = lhs.call_targets();
                targets.append(&mut rhs.call_targets());
                targets
            }
            UnOp { arg, .. } => arg.call_targets(),
        }
    }

    /// Returns true if the expression is a null sentinel,
    /// i.e. syntactically `nullptr` or the integer literal `0`.
    pub fn is_null_sentinel(&self) -> bool {
        matches!(self, Expression::Null | Expression::Const(0))
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Expression::*;
        match self {
            Var(var) => write!(formatter, "{}", var.name),
            Const(value) => write!(formatter, "{value}"),
            Null => write!(formatter, "nullptr"),
            AddressOf(var) => write!(formatter, "&{}", var.name),
            Deref(arg) => write!(formatter, "*{arg}"),
            Call { target, args } => {
                write!(formatter, "{target}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(formatter, ", ")?;
                    }
                    write!(formatter, "{arg}")?;
                }
                write!(formatter, ")")
            }
            BinOp { op, lhs, rhs } => write!(formatter, "({lhs} {op} {rhs})"),
            UnOp { op, arg } => write!(formatter, "{op}{arg}"),
        }
    }
}

/// The opcodes of binary operations.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BinOpType {
    /// Integer addition.
    Add,
    /// Integer subtraction.
    Sub,
    /// Integer multiplication.
    Mul,
    /// Integer division.
    Div,
    /// Integer remainder.
    Rem,
    /// Equality comparison.
    Equal,
    /// Inequality comparison.
    NotEqual,
    /// Signed less-than comparison.
    Less,
    /// Signed less-than-or-equal comparison.
    LessEqual,
    /// Signed greater-than comparison.
    Greater,
    /// Signed greater-than-or-equal comparison.
    GreaterEqual,
    /// Boolean short-circuiting conjunction.
    LogicalAnd,
    /// Boolean short-circuiting disjunction.
    LogicalOr,
}

impl std::fmt::Display for BinOpType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        use BinOpType::*;
        let symbol = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            LogicalAnd => "&&",
            LogicalOr => "||",
        };
        write!(formatter, "{symbol}")
    }
}

/// The opcodes of unary operations.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum UnOpType {
    /// Boolean negation.
    LogicalNot,
    /// Integer negation.
    Negate,
}

impl std::fmt::Display for UnOpType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            UnOpType::LogicalNot => write!(formatter, "!"),
            UnOpType::Negate => write!(formatter, "-"),
        }
    }
}
