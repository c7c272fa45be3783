//! IMAP response parser.
//!
//! Every response line is parsed into the same generic shape: a prefix
//! (`*`, `+` or a tag), a verb or status, and an attribute tree. Callers
//! that care about a particular response kind read it from the tree.

#![allow(clippy::missing_errors_doc)]

mod types;

pub use types::{Attribute, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Status, Tag};
use crate::Result;

/// Deepest list nesting accepted in one response.
const MAX_DEPTH: usize = 64;

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code, without its brackets.
        code: Option<Vec<Attribute>>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one logical response line.
    ///
    /// The line may still carry its trailing CRLF. Literals embedded in the
    /// line must be complete, as produced by the line framer.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let line = input.strip_suffix(b"\r\n").unwrap_or(input);
        let mut lexer = Lexer::new(line);

        match lexer.peek() {
            Some(b'*') => {
                lexer.advance();
                Self::parse_untagged(&mut lexer)
            }
            Some(b'+') => {
                lexer.advance();
                Ok(Self::parse_continuation(&mut lexer))
            }
            _ => {
                let tag = lexer.read_tag()?;
                Self::parse_tagged(&mut lexer, tag)
            }
        }
    }

    /// Parses a tagged response.
    fn parse_tagged(lexer: &mut Lexer<'_>, tag_str: &str) -> Result<Response> {
        lexer.expect_space()?;

        let status = Self::parse_status(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag_str),
            status,
            code,
            text,
        })
    }

    /// Parses an untagged response.
    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let (number, verb) = match lexer.next_token()? {
            Token::Number(n) => {
                lexer.expect_space()?;
                (Some(n), lexer.read_atom_string()?)
            }
            Token::Atom(s) => (None, s),
            token => {
                return Err(lexer.error(&format!(
                    "Unexpected token in untagged response: {token:?}"
                )));
            }
        };
        let verb = verb.to_ascii_uppercase();

        let attributes = if number.is_none() && Status::is_status_verb(&verb) {
            let (code, text) = Self::parse_resp_text(lexer)?;
            code.map(Attribute::Code)
                .into_iter()
                .chain((!text.is_empty()).then_some(Attribute::Text(text)))
                .collect()
        } else {
            Self::parse_attributes(lexer)?
        };

        Ok(Response::Untagged(UntaggedResponse {
            number,
            verb,
            attributes,
        }))
    }

    /// Parses a continuation response.
    fn parse_continuation(lexer: &mut Lexer<'_>) -> Response {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = lexer.read_text();

        Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        }
    }

    /// Parses a tagged status keyword.
    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let start = lexer.position();
        match lexer.next_token()? {
            Token::Atom(s) => match s.to_ascii_uppercase().as_str() {
                "OK" => Ok(Status::Ok),
                "NO" => Ok(Status::No),
                "BAD" => Ok(Status::Bad),
                _ => Err(lexer.error(&format!("Invalid tagged status {s:?} at {start}"))),
            },
            token => Err(lexer.error(&format!("Invalid tagged status: {token:?}"))),
        }
    }

    /// Parses response text with optional response code.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<Vec<Attribute>>, String)> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let code = if lexer.peek() == Some(b'[') {
            lexer.advance();
            Some(Self::parse_sequence(lexer, b']', 1)?)
        } else {
            None
        };

        // Skip space after code if present
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        Ok((code, lexer.read_text()))
    }

    /// Parses space-separated attributes up to the end of the line.
    fn parse_attributes(lexer: &mut Lexer<'_>) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();
        loop {
            lexer.skip_spaces();
            if lexer.is_eof() {
                return Ok(attributes);
            }
            attributes.push(Self::parse_attribute(lexer, 0)?);
        }
    }

    /// Parses attributes up to and including `close`.
    fn parse_sequence(lexer: &mut Lexer<'_>, close: u8, depth: usize) -> Result<Vec<Attribute>> {
        if depth > MAX_DEPTH {
            return Err(lexer.error("List nesting too deep"));
        }

        let mut items = Vec::new();
        loop {
            lexer.skip_spaces();
            match lexer.peek() {
                None if close == b')' => return Err(lexer.error("Unterminated list")),
                None => return Err(lexer.error("Unterminated response code")),
                Some(b) if b == close => {
                    lexer.advance();
                    return Ok(items);
                }
                Some(_) => items.push(Self::parse_attribute(lexer, depth)?),
            }
        }
    }

    /// Parses one attribute, recursing into lists.
    fn parse_attribute(lexer: &mut Lexer<'_>, depth: usize) -> Result<Attribute> {
        match lexer.next_token()? {
            Token::Nil => Ok(Attribute::Nil),
            Token::Number(n) => Ok(Attribute::Number(n)),
            Token::Atom(s) => Ok(Attribute::Atom(s.to_string())),
            Token::QuotedString(s) => Ok(Attribute::String(s)),
            Token::Literal(data) => Ok(Attribute::Literal(data)),
            Token::Asterisk => Ok(Attribute::Atom("*".to_string())),
            Token::Plus => Ok(Attribute::Atom("+".to_string())),
            Token::LParen => Self::parse_sequence(lexer, b')', depth + 1).map(Attribute::List),
            Token::LBracket => Self::parse_sequence(lexer, b']', depth + 1).map(Attribute::Code),
            token => Err(lexer.error(&format!("Unexpected token: {token:?}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Error;

    fn untagged(input: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(response) => response,
            other => panic!("Expected untagged response, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_ok_response() {
        let response = untagged(b"* OK IMAP4rev1 server ready\r\n");

        assert_eq!(response.verb, "OK");
        assert!(response.number.is_none());
        assert!(response.code().is_none());
        assert_eq!(response.text(), Some("IMAP4rev1 server ready"));
    }

    #[test]
    fn test_parse_tagged_ok() {
        let response = ResponseParser::parse(b"A001 OK LOGIN completed\r\n").unwrap();

        match response {
            Response::Tagged {
                tag,
                status,
                code,
                text,
            } => {
                assert_eq!(tag.as_str(), "A001");
                assert_eq!(status, Status::Ok);
                assert!(code.is_none());
                assert_eq!(text, "LOGIN completed");
            }
            _ => panic!("Expected tagged response"),
        }
    }

    #[test]
    fn test_parse_tagged_code() {
        let response =
            ResponseParser::parse(b"A002 OK [READ-WRITE] SELECT completed\r\n").unwrap();

        match response {
            Response::Tagged { code, text, .. } => {
                assert_eq!(code, Some(vec![Attribute::Atom("READ-WRITE".into())]));
                assert_eq!(text, "SELECT completed");
            }
            _ => panic!("Expected tagged response"),
        }
    }

    #[test]
    fn test_parse_tagged_no_text() {
        let response = ResponseParser::parse(b"A003 NO").unwrap();
        assert!(matches!(
            response,
            Response::Tagged { status: Status::No, ref text, .. } if text.is_empty()
        ));
    }

    #[test]
    fn test_parse_exists() {
        let response = untagged(b"* 23 EXISTS\r\n");

        assert_eq!(response.number, Some(23));
        assert_eq!(response.verb, "EXISTS");
        assert!(response.attributes.is_empty());
    }

    #[test]
    fn test_parse_flags() {
        let response = untagged(b"* FLAGS (\\Seen \\Answered \\Flagged)\r\n");

        assert_eq!(response.verb, "FLAGS");
        assert_eq!(
            response.attributes,
            vec![Attribute::List(vec![
                Attribute::Atom("\\Seen".into()),
                Attribute::Atom("\\Answered".into()),
                Attribute::Atom("\\Flagged".into()),
            ])]
        );
    }

    #[test]
    fn test_parse_response_code() {
        let response = untagged(b"* OK [PERMANENTFLAGS (\\Seen \\Deleted \\*)] Limited\r\n");

        assert_eq!(
            response.code().unwrap(),
            &[
                Attribute::Atom("PERMANENTFLAGS".into()),
                Attribute::List(vec![
                    Attribute::Atom("\\Seen".into()),
                    Attribute::Atom("\\Deleted".into()),
                    Attribute::Atom("\\*".into()),
                ]),
            ]
        );
        assert_eq!(response.text(), Some("Limited"));
    }

    #[test]
    fn test_parse_continuation() {
        match ResponseParser::parse(b"+ Ready for literal\r\n").unwrap() {
            Response::Continuation { text } => {
                assert_eq!(text, Some("Ready for literal".to_string()));
            }
            _ => panic!("Expected continuation"),
        }

        assert_eq!(
            ResponseParser::parse(b"+\r\n").unwrap(),
            Response::Continuation { text: None }
        );
    }

    #[test]
    fn test_parse_fetch_envelope() {
        let input = b"* 12 FETCH (FLAGS (\\Seen) ENVELOPE (\"Mon, 7 Feb 1994 21:52:25 -0800\" \"Hi\" ((\"Jane\" NIL \"jane\" \"example.com\")) NIL NIL NIL NIL NIL NIL \"<1@x>\"))\r\n";
        let response = untagged(input);

        assert_eq!(response.number, Some(12));
        assert_eq!(response.verb, "FETCH");
        assert_eq!(response.attributes.len(), 1);

        let items = response.attributes[0].as_list().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_atom(), Some("FLAGS"));
        assert_eq!(items[2].as_atom(), Some("ENVELOPE"));

        let envelope = items[3].as_list().unwrap();
        assert_eq!(envelope.len(), 10);
        let from = envelope[2].as_list().unwrap();
        assert_eq!(
            from[0],
            Attribute::List(vec![
                Attribute::String("Jane".into()),
                Attribute::Nil,
                Attribute::String("jane".into()),
                Attribute::String("example.com".into()),
            ])
        );
    }

    #[test]
    fn test_parse_fetch_section_literal() {
        let input = b"* 3 FETCH (BODY[HEADER.FIELDS (SUBJECT)]<0> {11}\r\nSubject: x\n UID 7)";
        let response = untagged(input);

        let items = response.attributes[0].as_list().unwrap();
        assert_eq!(
            items,
            &[
                Attribute::Atom("BODY[HEADER.FIELDS (SUBJECT)]<0>".into()),
                Attribute::Literal(b"Subject: x\n".to_vec()),
                Attribute::Atom("UID".into()),
                Attribute::Number(7),
            ]
        );
    }

    #[test]
    fn test_parse_nested_lists() {
        let response = untagged(b"* NAMESPACE ((\"\" \"/\")) NIL NIL");

        assert_eq!(
            response.attributes,
            vec![
                Attribute::List(vec![Attribute::List(vec![
                    Attribute::String(String::new()),
                    Attribute::String("/".into()),
                ])]),
                Attribute::Nil,
                Attribute::Nil,
            ]
        );
    }

    #[test]
    fn test_unknown_verb_is_generic() {
        let response = untagged(b"* XSTATE foo 1 (bar)");
        assert_eq!(response.verb, "XSTATE");
        assert_eq!(response.attributes.len(), 3);
    }

    #[test]
    fn test_errors_carry_line() {
        let cases: &[(&[u8], &str)] = &[
            (b" OK no tag", "Missing tag"),
            (b"* 1 FETCH (FLAGS (\\Seen)", "Unterminated list"),
            (b"* 1 FETCH (ENVELOPE (\"open", "Unterminated quoted string"),
            (b"* 1 FETCH (BODY[] {5}\r\nab", "Incomplete literal data"),
            (b"A001 MAYBE done", "Invalid tagged status"),
            (b"* OK [ALERT", "Unterminated response code"),
        ];

        for (input, expected) in cases {
            match ResponseParser::parse(input) {
                Err(Error::Parse { line, message, .. }) => {
                    assert!(
                        message.contains(expected),
                        "{message:?} should mention {expected:?}"
                    );
                    assert_eq!(line, String::from_utf8_lossy(input));
                }
                other => panic!("Expected parse error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = b"* X ".to_vec();
        input.extend(std::iter::repeat_n(b'(', 100));
        input.extend(std::iter::repeat_n(b')', 100));
        assert!(ResponseParser::parse(&input).is_err());
    }

    proptest! {
        #[test]
        fn parse_never_panics(input in proptest::collection::vec(any::<u8>(), 0..200)) {
            let _ = ResponseParser::parse(&input);
        }
    }
}
