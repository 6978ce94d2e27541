//! Recursive descent parsing of function bodies.

use std::collections::HashSet;

use super::lexer::{Token, TokenKind};
use super::ParseError;
use crate::intermediate_representation::*;

/// Type keywords that can start a declaration.
/// Qualifiers like `const` are handled separately.
const TYPE_KEYWORDS: [&str; 10] = [
    "void", "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
];

/// Keywords describing constructs outside the modeled language subset.
const UNSUPPORTED_KEYWORDS: [&str; 3] = ["do", "goto", "continue"];

/// A parser for a single function body.
///
/// The parser tracks which variables were declared with pointer type
/// (starting with the pointer parameters of the function),
/// so that every variable read in an expression carries the correct pointer-ness.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    function_name: String,
    pointer_vars: HashSet<String>,
    tid_counter: u64,
    /// Nesting depth of enclosing loops and switches, used to validate `break`.
    breakable_depth: u32,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the body of the given function.
    pub fn new(tokens: &'a [Token], function_name: &str, parameters: &[Variable]) -> Parser<'a> {
        let pointer_vars = parameters
            .iter()
            .filter(|param| param.is_pointer)
            .map(|param| param.name.clone())
            .collect();
        Parser {
            tokens,
            pos: 0,
            function_name: function_name.to_string(),
            pointer_vars,
            tid_counter: 0,
            breakable_depth: 0,
        }
    }

    /// Parse the complete token stream as a statement sequence.
    pub fn parse_body(mut self) -> Result<Vec<Term<Stmt>>, ParseError> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            self.parse_stmt(&mut body)?;
        }
        Ok(body)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    /// The source position of the current token,
    /// or of the last token if the input is exhausted.
    fn current_location(&self) -> SourceLocation {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|token| token.location)
            .unwrap_or_else(SourceLocation::unknown)
    }

    fn syntax_error(&self, message: impl ToString) -> ParseError {
        ParseError::Syntax {
            message: message.to_string(),
            location: self.current_location(),
        }
    }

    fn unsupported(&self, construct: impl ToString) -> ParseError {
        ParseError::UnsupportedConstruct {
            construct: construct.to_string(),
            location: self.current_location(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(found) if *found == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.syntax_error(format!("expected `{kind}`, found `{found}`"))),
            None => Err(self.syntax_error(format!("expected `{kind}`, found end of input"))),
        }
    }

    /// Consume the current token if it is the given identifier.
    fn accept_ident(&mut self, name: &str) -> bool {
        if let Some(TokenKind::Ident(ident)) = self.peek_kind() {
            if ident == name {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_ident(&mut self) -> Result<(String, SourceLocation), ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                location,
            }) => {
                let result = (name.clone(), *location);
                self.pos += 1;
                Ok(result)
            }
            Some(Token { kind, .. }) => {
                Err(self.syntax_error(format!("expected identifier, found `{kind}`")))
            }
            None => Err(self.syntax_error("expected identifier, found end of input")),
        }
    }

    fn next_tid(&mut self, location: SourceLocation) -> Tid {
        let tid = Tid::new(format!("{}_stmt_{}", self.function_name, self.tid_counter))
            .with_location(location);
        self.tid_counter += 1;
        tid
    }

    /// Create a variable read with the pointer-ness recorded at its declaration.
    fn make_var(&self, name: String) -> Variable {
        let is_pointer = self.pointer_vars.contains(&name);
        Variable { name, is_pointer }
    }

    /// Returns true if the current token starts a declaration.
    fn at_declaration(&self) -> bool {
        match self.peek_kind() {
            Some(TokenKind::Ident(name)) => {
                name == "const" || TYPE_KEYWORDS.contains(&name.as_str())
            }
            _ => false,
        }
    }

    fn parse_stmt(&mut self, out: &mut Vec<Term<Stmt>>) -> Result<(), ParseError> {
        let location = self.current_location();
        let keyword: Option<String> = match self.peek_kind() {
            Some(TokenKind::Ident(name)) => Some(name.clone()),
            Some(TokenKind::LBrace) => {
                // A bare block statement. Scoping is not modeled,
                // its statements are spliced into the surrounding sequence.
                self.pos += 1;
                while self.peek_kind() != Some(&TokenKind::RBrace) {
                    if self.peek().is_none() {
                        return Err(self.syntax_error("unbalanced braces"));
                    }
                    self.parse_stmt(out)?;
                }
                self.pos += 1;
                return Ok(());
            }
            Some(TokenKind::Semicolon) => {
                // Empty statement.
                self.pos += 1;
                return Ok(());
            }
            Some(_) => None,
            None => return Err(self.syntax_error("expected statement, found end of input")),
        };
        let stmt = match keyword.as_deref() {
            Some(name) if UNSUPPORTED_KEYWORDS.contains(&name) => {
                return Err(self.unsupported(format!("`{name}` statement")));
            }
            Some("if") => self.parse_if()?,
            Some("while") => self.parse_while()?,
            Some("for") => self.parse_for()?,
            Some("switch") => self.parse_switch()?,
            Some("break") => {
                if self.breakable_depth == 0 {
                    return Err(self.syntax_error("`break` outside of loop or switch"));
                }
                self.pos += 1;
                self.expect(TokenKind::Semicolon)?;
                Stmt::Break
            }
            Some("return") => {
                self.pos += 1;
                let value = if self.peek_kind() == Some(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(TokenKind::Semicolon)?;
                Stmt::Return(value)
            }
            _ if self.at_declaration() => {
                return self.parse_decl(out);
            }
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.expect(TokenKind::Semicolon)?;
                stmt
            }
        };
        out.push(Term {
            tid: self.next_tid(location),
            term: stmt,
        });
        Ok(())
    }

    /// Parse a declaration statement, possibly with several comma-separated declarators.
    /// Each declarator becomes its own `Decl` statement.
    fn parse_decl(&mut self, out: &mut Vec<Term<Stmt>>) -> Result<(), ParseError> {
        self.parse_type_tokens()?;
        loop {
            let mut is_pointer = false;
            while self.peek_kind() == Some(&TokenKind::Star) {
                is_pointer = true;
                self.pos += 1;
            }
            let (name, location) = self.expect_ident()?;
            if is_pointer {
                self.pointer_vars.insert(name.clone());
            } else {
                self.pointer_vars.remove(&name);
            }
            let init = if self.peek_kind() == Some(&TokenKind::Assign) {
                self.pos += 1;
                Some(self.parse_expression()?)
            } else {
                None
            };
            out.push(Term {
                tid: self.next_tid(location),
                term: Stmt::Decl {
                    var: Variable { name, is_pointer },
                    init,
                },
            });
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    /// Consume the type keywords (and `const` qualifiers) at the start of a declaration.
    fn parse_type_tokens(&mut self) -> Result<(), ParseError> {
        let mut consumed_any = false;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Ident(name))
                    if name == "const" || TYPE_KEYWORDS.contains(&name.as_str()) =>
                {
                    consumed_any = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if consumed_any {
            Ok(())
        } else {
            Err(self.syntax_error("expected type name"))
        }
    }

    /// Parse an assignment, increment/decrement or expression statement
    /// without consuming the statement terminator.
    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        // Prefix increment/decrement statements are desugared to assignments.
        if let Some(op) = self.accept_incdec_op() {
            let expr = self.parse_unary()?;
            return self.desugar_incdec(expr, op);
        }
        let expr = self.parse_expression()?;
        match self.peek_kind() {
            Some(TokenKind::Assign) => {
                self.pos += 1;
                let value = self.parse_expression()?;
                self.check_lvalue(&expr)?;
                Ok(Stmt::Assign {
                    target: expr,
                    value,
                })
            }
            Some(TokenKind::PlusAssign)
            | Some(TokenKind::MinusAssign)
            | Some(TokenKind::StarAssign)
            | Some(TokenKind::SlashAssign) => {
                let op = match self.peek_kind() {
                    Some(TokenKind::PlusAssign) => BinOpType::Add,
                    Some(TokenKind::MinusAssign) => BinOpType::Sub,
                    Some(TokenKind::StarAssign) => BinOpType::Mul,
                    _ => BinOpType::Div,
                };
                self.pos += 1;
                let rhs = self.parse_expression()?;
                self.check_lvalue(&expr)?;
                let value = Expression::BinOp {
                    op,
                    lhs: Box::new(expr.clone()),
                    rhs: Box::new(rhs),
                };
                Ok(Stmt::Assign {
                    target: expr,
                    value,
                })
            }
            Some(TokenKind::PlusPlus) => {
                self.pos += 1;
                self.desugar_incdec(expr, BinOpType::Add)
            }
            Some(TokenKind::MinusMinus) => {
                self.pos += 1;
                self.desugar_incdec(expr, BinOpType::Sub)
            }
            _ => Ok(Stmt::Expr(expr)),
        }
    }

    fn accept_incdec_op(&mut self) -> Option<BinOpType> {
        match self.peek_kind() {
            Some(TokenKind::PlusPlus) => {
                self.pos += 1;
                Some(BinOpType::Add)
            }
            Some(TokenKind::MinusMinus) => {
                self.pos += 1;
                Some(BinOpType::Sub)
            }
            _ => None,
        }
    }

    /// Desugar `x++` / `--x` into `x = x +- 1`.
    fn desugar_incdec(&self, expr: Expression, op: BinOpType) -> Result<Stmt, ParseError> {
        self.check_lvalue(&expr)?;
        let value = Expression::BinOp {
            op,
            lhs: Box::new(expr.clone()),
            rhs: Box::new(Expression::Const(1)),
        };
        Ok(Stmt::Assign {
            target: expr,
            value,
        })
    }

    fn check_lvalue(&self, expr: &Expression) -> Result<(), ParseError> {
        match expr {
            Expression::Var(_) | Expression::Deref(_) => Ok(()),
            _ => Err(self.syntax_error("assignment target is not a variable or dereference")),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.pos += 1; // `if`
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let then_body = self.parse_block_or_stmt()?;
        let else_body = if self.accept_ident("else") {
            // `else if` chains nest as a single-statement else body.
            Some(self.parse_block_or_stmt()?)
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.pos += 1; // `while`
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.breakable_depth += 1;
        let body = self.parse_block_or_stmt()?;
        self.breakable_depth -= 1;
        Ok(Stmt::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.pos += 1; // `for`
        self.expect(TokenKind::LParen)?;
        let init = if self.peek_kind() == Some(&TokenKind::Semicolon) {
            self.pos += 1;
            None
        } else if self.at_declaration() {
            let mut decls = Vec::new();
            self.parse_decl(&mut decls)?;
            if decls.len() != 1 {
                return Err(self.syntax_error("multiple declarations in `for` initializer"));
            }
            Some(Box::new(decls.remove(0)))
        } else {
            let location = self.current_location();
            let stmt = self.parse_simple_stmt()?;
            self.expect(TokenKind::Semicolon)?;
            Some(Box::new(Term {
                tid: self.next_tid(location),
                term: stmt,
            }))
        };
        let condition = if self.peek_kind() == Some(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.peek_kind() == Some(&TokenKind::RParen) {
            None
        } else {
            let location = self.current_location();
            let stmt = self.parse_simple_stmt()?;
            Some(Box::new(Term {
                tid: self.next_tid(location),
                term: stmt,
            }))
        };
        self.expect(TokenKind::RParen)?;
        self.breakable_depth += 1;
        let body = self.parse_block_or_stmt()?;
        self.breakable_depth -= 1;
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        self.pos += 1; // `switch`
        self.expect(TokenKind::LParen)?;
        let scrutinee = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        self.breakable_depth += 1;
        let mut cases = Vec::new();
        let mut default = None;
        loop {
            if self.accept_ident("case") {
                let value = self.parse_case_label()?;
                self.expect(TokenKind::Colon)?;
                cases.push(SwitchCase {
                    value,
                    body: self.parse_case_body()?,
                });
            } else if self.accept_ident("default") {
                self.expect(TokenKind::Colon)?;
                if default.is_some() {
                    return Err(self.syntax_error("duplicate `default` label"));
                }
                default = Some(self.parse_case_body()?);
            } else if self.peek_kind() == Some(&TokenKind::RBrace) {
                self.pos += 1;
                break;
            } else {
                self.breakable_depth -= 1;
                return Err(self.syntax_error("expected `case`, `default` or `}` in switch body"));
            }
        }
        self.breakable_depth -= 1;
        Ok(Stmt::Switch {
            scrutinee,
            cases,
            default,
        })
    }

    fn parse_case_label(&mut self) -> Result<i64, ParseError> {
        let negative = self.peek_kind() == Some(&TokenKind::Minus);
        if negative {
            self.pos += 1;
        }
        let value = match self.peek_kind().cloned() {
            Some(TokenKind::Int(value)) => {
                self.pos += 1;
                value
            }
            _ => return Err(self.syntax_error("expected integer case label")),
        };
        Ok(if negative { -value } else { value })
    }

    /// Parse the statements of a case body,
    /// up to the next `case`/`default` label or the end of the switch.
    fn parse_case_body(&mut self) -> Result<Vec<Term<Stmt>>, ParseError> {
        let mut body = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Ident(name)) if name == "case" || name == "default" => break,
                Some(TokenKind::RBrace) => break,
                Some(_) => self.parse_stmt(&mut body)?,
                None => return Err(self.syntax_error("unterminated switch body")),
            }
        }
        Ok(body)
    }

    /// Parse `{ stmts }` or a single unbraced statement.
    fn parse_block_or_stmt(&mut self) -> Result<Vec<Term<Stmt>>, ParseError> {
        let mut body = Vec::new();
        if self.peek_kind() == Some(&TokenKind::LBrace) {
            self.pos += 1;
            while self.peek_kind() != Some(&TokenKind::RBrace) {
                if self.peek().is_none() {
                    return Err(self.syntax_error("unbalanced braces"));
                }
                self.parse_stmt(&mut body)?;
            }
            self.pos += 1;
        } else {
            self.parse_stmt(&mut body)?;
        }
        Ok(body)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_logical_and()?;
        while self.peek_kind() == Some(&TokenKind::OrOr) {
            self.pos += 1;
            let rhs = self.parse_logical_and()?;
            expr = Expression::BinOp {
                op: BinOpType::LogicalOr,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_equality()?;
        while self.peek_kind() == Some(&TokenKind::AndAnd) {
            self.pos += 1;
            let rhs = self.parse_equality()?;
            expr = Expression::BinOp {
                op: BinOpType::LogicalAnd,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqualEqual) => BinOpType::Equal,
                Some(TokenKind::NotEqual) => BinOpType::NotEqual,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_relational()?;
            expr = Expression::BinOp {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Less) => BinOpType::Less,
                Some(TokenKind::LessEqual) => BinOpType::LessEqual,
                Some(TokenKind::Greater) => BinOpType::Greater,
                Some(TokenKind::GreaterEqual) => BinOpType::GreaterEqual,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            expr = Expression::BinOp {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOpType::Add,
                Some(TokenKind::Minus) => BinOpType::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            expr = Expression::BinOp {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOpType::Mul,
                Some(TokenKind::Slash) => BinOpType::Div,
                Some(TokenKind::Percent) => BinOpType::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            expr = Expression::BinOp {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Not) => {
                self.pos += 1;
                let arg = self.parse_unary()?;
                Ok(Expression::UnOp {
                    op: UnOpType::LogicalNot,
                    arg: Box::new(arg),
                })
            }
            Some(TokenKind::Minus) => {
                self.pos += 1;
                let arg = self.parse_unary()?;
                Ok(Expression::UnOp {
                    op: UnOpType::Negate,
                    arg: Box::new(arg),
                })
            }
            Some(TokenKind::Star) => {
                self.pos += 1;
                let arg = self.parse_unary()?;
                Ok(Expression::Deref(Box::new(arg)))
            }
            Some(TokenKind::Amp) => {
                self.pos += 1;
                let (name, _) = self.expect_ident()?;
                Ok(Expression::AddressOf(self.make_var(name)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_primary_inner()?;
        // Postfix member access and indexing are outside the modeled subset.
        match self.peek_kind() {
            Some(TokenKind::Arrow) | Some(TokenKind::Dot) => Err(self.unsupported("member access")),
            Some(TokenKind::LBracket) => Err(self.unsupported("array indexing")),
            _ => Ok(expr),
        }
    }

    fn parse_primary_inner(&mut self) -> Result<Expression, ParseError> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Int(value)) => {
                self.pos += 1;
                Ok(Expression::Const(value))
            }
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            Some(TokenKind::Ident(name)) => {
                self.pos += 1;
                match name.as_str() {
                    "nullptr" => return Ok(Expression::Null),
                    "true" => return Ok(Expression::Const(1)),
                    "false" => return Ok(Expression::Const(0)),
                    _ => (),
                }
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek_kind() != Some(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if self.peek_kind() == Some(&TokenKind::Comma) {
                                self.pos += 1;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    Ok(Expression::Call { target: name, args })
                } else {
                    Ok(Expression::Var(self.make_var(name)))
                }
            }
            Some(TokenKind::Arrow) | Some(TokenKind::Dot) => {
                Err(self.unsupported("member access"))
            }
            Some(TokenKind::LBracket) => Err(self.unsupported("array indexing")),
            Some(kind) => Err(self.syntax_error(format!("unparseable expression at `{kind}`"))),
            None => Err(self.syntax_error("expected expression, found end of input")),
        }
    }
}
