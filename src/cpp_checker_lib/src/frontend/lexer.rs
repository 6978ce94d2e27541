//! Tokenization of the analyzed source text.
//!
//! The lexer is total: characters outside the modeled language
//! are emitted as [`TokenKind::Unknown`] tokens instead of errors,
//! so that the parser can report them with a proper source position
//! and recovery can continue with the next function definition.

use crate::intermediate_representation::SourceLocation;

/// The different kinds of tokens produced by the lexer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    /// An identifier or keyword.
    Ident(String),
    /// An integer literal.
    Int(i64),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `*`
    Star,
    /// `&`
    Amp,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Not,
    /// `->`
    Arrow,
    /// `.`
    Dot,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// A character outside the modeled language.
    Unknown(char),
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TokenKind::*;
        match self {
            Ident(name) => write!(formatter, "{name}"),
            Int(value) => write!(formatter, "{value}"),
            Unknown(character) => write!(formatter, "{character}"),
            LParen => write!(formatter, "("),
            RParen => write!(formatter, ")"),
            LBrace => write!(formatter, "{{"),
            RBrace => write!(formatter, "}}"),
            Semicolon => write!(formatter, ";"),
            Comma => write!(formatter, ","),
            Colon => write!(formatter, ":"),
            Star => write!(formatter, "*"),
            Amp => write!(formatter, "&"),
            Plus => write!(formatter, "+"),
            Minus => write!(formatter, "-"),
            Slash => write!(formatter, "/"),
            Percent => write!(formatter, "%"),
            Assign => write!(formatter, "="),
            PlusAssign => write!(formatter, "+="),
            MinusAssign => write!(formatter, "-="),
            StarAssign => write!(formatter, "*="),
            SlashAssign => write!(formatter, "/="),
            PlusPlus => write!(formatter, "++"),
            MinusMinus => write!(formatter, "--"),
            EqualEqual => write!(formatter, "=="),
            NotEqual => write!(formatter, "!="),
            Less => write!(formatter, "<"),
            LessEqual => write!(formatter, "<="),
            Greater => write!(formatter, ">"),
            GreaterEqual => write!(formatter, ">="),
            AndAnd => write!(formatter, "&&"),
            OrOr => write!(formatter, "||"),
            Not => write!(formatter, "!"),
            Arrow => write!(formatter, "->"),
            Dot => write!(formatter, "."),
            LBracket => write!(formatter, "["),
            RBracket => write!(formatter, "]"),
        }
    }
}

/// A token together with the source position of its first character.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    /// The kind (and payload) of the token.
    pub kind: TokenKind,
    /// The source position of the first character of the token.
    pub location: SourceLocation,
}

/// Tokenize the given source text.
///
/// Whitespace and both comment styles (`//` and `/* */`) are skipped.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    let mut line = 1u64;
    let mut column = 1u64;

    let advance = |pos: &mut usize, line: &mut u64, column: &mut u64, chars: &[char]| {
        if chars[*pos] == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
        *pos += 1;
    };

    while pos < chars.len() {
        let character = chars[pos];
        let location = SourceLocation::new(line, column);
        // Whitespace.
        if character.is_whitespace() {
            advance(&mut pos, &mut line, &mut column, &chars);
            continue;
        }
        // Line comments.
        if character == '/' && chars.get(pos + 1) == Some(&'/') {
            while pos < chars.len() && chars[pos] != '\n' {
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            continue;
        }
        // Block comments. An unterminated comment simply consumes the rest of the input.
        if character == '/' && chars.get(pos + 1) == Some(&'*') {
            advance(&mut pos, &mut line, &mut column, &chars);
            advance(&mut pos, &mut line, &mut column, &chars);
            while pos < chars.len() {
                if chars[pos] == '*' && chars.get(pos + 1) == Some(&'/') {
                    advance(&mut pos, &mut line, &mut column, &chars);
                    advance(&mut pos, &mut line, &mut column, &chars);
                    break;
                }
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            continue;
        }
        // Identifiers and keywords.
        if character.is_ascii_alphabetic() || character == '_' {
            let mut name = String::new();
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                name.push(chars[pos]);
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            tokens.push(Token {
                kind: TokenKind::Ident(name),
                location,
            });
            continue;
        }
        // Integer literals.
        if character.is_ascii_digit() {
            let mut digits = String::new();
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                digits.push(chars[pos]);
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            // Longer-than-i64 literals degrade to an unknown token at the same position.
            let kind = match digits.parse::<i64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => TokenKind::Unknown(character),
            };
            tokens.push(Token { kind, location });
            continue;
        }
        // Operators and punctuation.
        let two_char_kind = match (character, chars.get(pos + 1).copied()) {
            ('+', Some('+')) => Some(TokenKind::PlusPlus),
            ('-', Some('-')) => Some(TokenKind::MinusMinus),
            ('+', Some('=')) => Some(TokenKind::PlusAssign),
            ('-', Some('=')) => Some(TokenKind::MinusAssign),
            ('*', Some('=')) => Some(TokenKind::StarAssign),
            ('/', Some('=')) => Some(TokenKind::SlashAssign),
            ('=', Some('=')) => Some(TokenKind::EqualEqual),
            ('!', Some('=')) => Some(TokenKind::NotEqual),
            ('<', Some('=')) => Some(TokenKind::LessEqual),
            ('>', Some('=')) => Some(TokenKind::GreaterEqual),
            ('&', Some('&')) => Some(TokenKind::AndAnd),
            ('|', Some('|')) => Some(TokenKind::OrOr),
            ('-', Some('>')) => Some(TokenKind::Arrow),
            _ => None,
        };
        if let Some(kind) = two_char_kind {
            advance(&mut pos, &mut line, &mut column, &chars);
            advance(&mut pos, &mut line, &mut column, &chars);
            tokens.push(Token { kind, location });
            continue;
        }
        let kind = match character {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '*' => TokenKind::Star,
            '&' => TokenKind::Amp,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '!' => TokenKind::Not,
            '.' => TokenKind::Dot,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            other => TokenKind::Unknown(other),
        };
        advance(&mut pos, &mut line, &mut column, &chars);
        tokens.push(Token { kind, location });
    }
    tokens
}
