//! IMAP token types.

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom, including an attached `[section]` and `<partial>` if present.
    Atom(&'a str),
    /// Quoted string, unescaped.
    QuotedString(String),
    /// Literal string with size prefix {n}.
    Literal(Vec<u8>),
    /// Number.
    Number(u64),
    /// Opening parenthesis.
    LParen,
    /// Closing parenthesis.
    RParen,
    /// Opening bracket.
    LBracket,
    /// Closing bracket.
    RBracket,
    /// Space character.
    Space,
    /// Asterisk (untagged response prefix).
    Asterisk,
    /// Plus (continuation response prefix).
    Plus,
    /// NIL literal.
    Nil,
    /// End of input.
    Eof,
}
