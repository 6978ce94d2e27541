//! This module contains the frontend that turns source text into the
//! [intermediate representation](crate::intermediate_representation).
//!
//! The frontend handles the small C++ subset that the analyzed workshop
//! fixtures are written in: function definitions with scalar and pointer
//! locals, assignments, direct calls, `if`/`else`, `while`, `for`,
//! `switch` and `return`.
//! Constructs outside of this subset are rejected with
//! [`ParseError::UnsupportedConstruct`] instead of being silently skipped,
//! so that the analyses never operate on an incomplete syntax tree.
//!
//! Parsing is isolated per function:
//! a parse failure inside one function body is reported as an error-level
//! [`LogMessage`] and parsing continues after the closing brace of that
//! function, so that the siblings in the same translation unit can still
//! be analyzed.

use crate::intermediate_representation::*;
use crate::utils::log::LogMessage;

mod lexer;
mod parser;

use lexer::{Token, TokenKind};
use parser::Parser;

#[cfg(test)]
mod tests;

/// The name under which frontend diagnostics are logged.
const LOG_SOURCE: &str = "Frontend";

/// Keywords introducing top-level constructs outside the modeled subset.
const UNSUPPORTED_TOPLEVEL: [&str; 8] = [
    "class",
    "struct",
    "union",
    "enum",
    "template",
    "namespace",
    "using",
    "typedef",
];

/// The error type for failed parsing of a function.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ParseError {
    /// Malformed source, e.g. unbalanced braces or an unparseable expression.
    Syntax {
        /// A description of the syntax error.
        message: String,
        /// The position of the offending token.
        location: SourceLocation,
    },
    /// Syntactically well-formed source using a construct outside the modeled subset.
    UnsupportedConstruct {
        /// A description of the unsupported construct.
        construct: String,
        /// The position of the offending token.
        location: SourceLocation,
    },
}

impl ParseError {
    /// Return the source position the error points at.
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Syntax { location, .. } => *location,
            ParseError::UnsupportedConstruct { location, .. } => *location,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseError::Syntax { message, location } => {
                write!(formatter, "syntax error at {location}: {message}")
            }
            ParseError::UnsupportedConstruct {
                construct,
                location,
            } => {
                write!(formatter, "unsupported construct at {location}: {construct}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse the source text of one translation unit.
///
/// Returns the translation unit containing all successfully parsed functions
/// together with one error-level log message for each function that could not be parsed.
pub fn parse_translation_unit(source: &str) -> (TranslationUnit, Vec<LogMessage>) {
    let tokens = lexer::tokenize(source);
    let mut unit = TranslationUnit::new();
    let mut logs = Vec::new();
    let mut pos = 0;

    while pos < tokens.len() {
        // Stray semicolons between definitions.
        if tokens[pos].kind == TokenKind::Semicolon {
            pos += 1;
            continue;
        }
        match parse_function_definition(&tokens, pos) {
            Ok((function, name_location, next_pos)) => {
                pos = next_pos;
                if unit.functions.contains_key(&function.name) {
                    logs.push(
                        LogMessage::new_error(format!(
                            "duplicate definition of function `{}`, keeping the first one",
                            function.name
                        ))
                        .location(Tid::new(&function.name).with_location(name_location))
                        .source(LOG_SOURCE),
                    );
                } else {
                    let tid = Tid::new(&function.name).with_location(name_location);
                    unit.functions
                        .insert(function.name.clone(), Term { tid, term: function });
                }
            }
            Err(error) => {
                logs.push(
                    LogMessage::new_error(format!("{error}"))
                        .location(Tid::new("toplevel").with_location(error.location()))
                        .source(LOG_SOURCE),
                );
                pos = recover_to_next_definition(&tokens, pos);
            }
        }
    }

    (unit, logs)
}

/// Parse one function definition starting at `pos`.
///
/// On success returns the function, the source position of its name
/// and the token position directly after the closing brace of the body.
/// Body parse errors are reported with the function name included;
/// the caller recovers by skipping past the balanced body braces.
fn parse_function_definition(
    tokens: &[Token],
    mut pos: usize,
) -> Result<(Function, SourceLocation, usize), ParseError> {
    let location_at = |pos: usize| {
        tokens
            .get(pos)
            .or_else(|| tokens.last())
            .map(|token| token.location)
            .unwrap_or_else(SourceLocation::unknown)
    };

    if let Some(Token {
        kind: TokenKind::Ident(name),
        location,
    }) = tokens.get(pos)
    {
        if UNSUPPORTED_TOPLEVEL.contains(&name.as_str()) {
            return Err(ParseError::UnsupportedConstruct {
                construct: format!("`{name}` definition"),
                location: *location,
            });
        }
    }

    pos = parse_type(tokens, pos)?;
    let (name, name_location) = match tokens.get(pos) {
        Some(Token {
            kind: TokenKind::Ident(name),
            location,
        }) => (name.clone(), *location),
        _ => {
            return Err(ParseError::Syntax {
                message: "expected function name".to_string(),
                location: location_at(pos),
            })
        }
    };
    pos += 1;

    let (parameters, after_params) = parse_parameter_list(tokens, pos)?;
    pos = after_params;

    match tokens.get(pos) {
        Some(Token {
            kind: TokenKind::LBrace,
            ..
        }) => (),
        _ => {
            return Err(ParseError::Syntax {
                message: format!("expected `{{` to start the body of function `{name}`"),
                location: location_at(pos),
            })
        }
    }
    let body_start = pos + 1;
    let body_end = find_matching_brace(tokens, pos).ok_or_else(|| ParseError::Syntax {
        message: format!("unbalanced braces in function `{name}`"),
        location: location_at(pos),
    })?;

    let body = Parser::new(&tokens[body_start..body_end], &name, &parameters)
        .parse_body()
        .map_err(|error| match error {
            ParseError::Syntax { message, location } => ParseError::Syntax {
                message: format!("in function `{name}`: {message}"),
                location,
            },
            ParseError::UnsupportedConstruct {
                construct,
                location,
            } => ParseError::UnsupportedConstruct {
                construct: format!("in function `{name}`: {construct}"),
                location,
            },
        })?;

    Ok((
        Function {
            name,
            parameters,
            body,
        },
        name_location,
        body_end + 1,
    ))
}

/// Consume the type keywords, qualifiers and pointer stars of a type
/// and return the position of the first token after the type.
fn parse_type(tokens: &[Token], mut pos: usize) -> Result<usize, ParseError> {
    const TYPE_KEYWORDS: [&str; 11] = [
        "const", "void", "bool", "char", "short", "int", "long", "float", "double", "signed",
        "unsigned",
    ];
    let start = pos;
    while let Some(Token {
        kind: TokenKind::Ident(name),
        ..
    }) = tokens.get(pos)
    {
        if TYPE_KEYWORDS.contains(&name.as_str()) {
            pos += 1;
        } else {
            break;
        }
    }
    if pos == start {
        return Err(ParseError::Syntax {
            message: "expected type name".to_string(),
            location: tokens
                .get(pos)
                .or_else(|| tokens.last())
                .map(|token| token.location)
                .unwrap_or_else(SourceLocation::unknown),
        });
    }
    while let Some(Token {
        kind: TokenKind::Star,
        ..
    }) = tokens.get(pos)
    {
        pos += 1;
    }
    Ok(pos)
}

/// Parse a parenthesized parameter list starting at `pos`.
fn parse_parameter_list(
    tokens: &[Token],
    mut pos: usize,
) -> Result<(Vec<Variable>, usize), ParseError> {
    let location_at = |pos: usize| {
        tokens
            .get(pos)
            .or_else(|| tokens.last())
            .map(|token| token.location)
            .unwrap_or_else(SourceLocation::unknown)
    };
    match tokens.get(pos) {
        Some(Token {
            kind: TokenKind::LParen,
            ..
        }) => pos += 1,
        _ => {
            return Err(ParseError::Syntax {
                message: "expected `(` to start the parameter list".to_string(),
                location: location_at(pos),
            })
        }
    }
    let mut parameters = Vec::new();
    // Empty parameter list, possibly spelled `(void)`.
    if let Some(Token {
        kind: TokenKind::RParen,
        ..
    }) = tokens.get(pos)
    {
        return Ok((parameters, pos + 1));
    }
    if let (
        Some(Token {
            kind: TokenKind::Ident(name),
            ..
        }),
        Some(Token {
            kind: TokenKind::RParen,
            ..
        }),
    ) = (tokens.get(pos), tokens.get(pos + 1))
    {
        if name == "void" {
            return Ok((parameters, pos + 2));
        }
    }
    loop {
        let type_start = pos;
        pos = parse_type(tokens, pos)?;
        let is_pointer = tokens[type_start..pos]
            .iter()
            .any(|token| token.kind == TokenKind::Star);
        let name = match tokens.get(pos) {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => {
                pos += 1;
                name.clone()
            }
            // Unnamed parameters get a synthetic name.
            _ => format!("__param_{}", parameters.len()),
        };
        parameters.push(Variable { name, is_pointer });
        match tokens.get(pos) {
            Some(Token {
                kind: TokenKind::Comma,
                ..
            }) => pos += 1,
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => return Ok((parameters, pos + 1)),
            _ => {
                return Err(ParseError::Syntax {
                    message: "expected `,` or `)` in parameter list".to_string(),
                    location: location_at(pos),
                })
            }
        }
    }
}

/// Return the position of the `}` matching the `{` at `pos`.
fn find_matching_brace(tokens: &[Token], pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[pos..].iter().enumerate() {
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos + offset);
                }
            }
            _ => (),
        }
    }
    None
}

/// Skip forward to a plausible start of the next top-level definition:
/// past the next balanced brace group, past the next top-level semicolon
/// or to the next top-level type keyword.
fn recover_to_next_definition(tokens: &[Token], start: usize) -> usize {
    const TYPE_KEYWORDS: [&str; 10] = [
        "void", "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
    ];
    let mut depth = 0usize;
    let mut pos = start;
    while pos < tokens.len() {
        match &tokens[pos].kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return pos + 1;
                }
            }
            TokenKind::Semicolon if depth == 0 => return pos + 1,
            TokenKind::Ident(name)
                if depth == 0 && pos > start && TYPE_KEYWORDS.contains(&name.as_str()) =>
            {
                return pos;
            }
            _ => (),
        }
        pos += 1;
    }
    pos
}
