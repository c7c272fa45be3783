//! Response data types.

use crate::types::SeqNum;

/// One node of a parsed response attribute tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// `NIL`.
    Nil,
    /// A bare number.
    Number(u64),
    /// An atom, including flags (`\Seen`) and atoms with an attached
    /// section (`BODY[TEXT]<0>`).
    Atom(String),
    /// A quoted string.
    String(String),
    /// A literal, verbatim.
    Literal(Vec<u8>),
    /// A parenthesized list.
    List(Vec<Self>),
    /// A bracketed response code such as `[PERMANENTFLAGS (\Seen)]`.
    Code(Vec<Self>),
    /// The free text that ends a status response.
    Text(String),
}

impl Attribute {
    /// Returns the textual value of an atom, string, text or literal.
    ///
    /// Literals are decoded as UTF-8 with replacement characters.
    #[must_use]
    pub fn as_text(&self) -> Option<std::borrow::Cow<'_, str>> {
        match self {
            Self::Atom(s) | Self::String(s) | Self::Text(s) => Some(s.as_str().into()),
            Self::Literal(bytes) => Some(String::from_utf8_lossy(bytes)),
            _ => None,
        }
    }

    /// Returns the value of an `nstring` slot: `None` for `NIL`, text
    /// otherwise.
    #[must_use]
    pub fn as_nstring(&self) -> Option<String> {
        self.as_text().map(std::borrow::Cow::into_owned)
    }

    /// Returns the number if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the atom if this is an atom.
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the elements if this is a response code.
    #[must_use]
    pub fn as_code(&self) -> Option<&[Self]> {
        match self {
            Self::Code(items) => Some(items),
            _ => None,
        }
    }
}

/// Renders the attribute roughly as it appeared on the wire. Literals are
/// written inline as text.
impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => f.write_str("NIL"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Atom(s) | Self::Text(s) => f.write_str(s),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Literal(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Self::List(items) => write_joined(f, '(', items, ')'),
            Self::Code(items) => write_joined(f, '[', items, ']'),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    open: char,
    items: &[Attribute],
    close: char,
) -> std::fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

/// An untagged (`*`) response.
///
/// Numbered responses such as `* 12 FETCH (...)` keep the number apart
/// from the verb. Status responses (`* OK [CODE] text`) carry their code
/// as an [`Attribute::Code`] followed by an [`Attribute::Text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntaggedResponse {
    /// Leading message number, if any.
    pub number: Option<u64>,
    /// Upper-cased verb (`EXISTS`, `FETCH`, `FLAGS`, `OK`, ...).
    pub verb: String,
    /// Everything after the verb.
    pub attributes: Vec<Attribute>,
}

impl UntaggedResponse {
    /// Returns true if the verb matches, ignoring case.
    #[must_use]
    pub fn is(&self, verb: &str) -> bool {
        self.verb.eq_ignore_ascii_case(verb)
    }

    /// Returns the response code of a status response.
    #[must_use]
    pub fn code(&self) -> Option<&[Attribute]> {
        self.attributes.first().and_then(Attribute::as_code)
    }

    /// Returns the free text of a status response.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.attributes.iter().rev().find_map(|a| match a {
            Attribute::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// Returns the message number as a sequence number.
    #[must_use]
    pub fn seq(&self) -> Option<SeqNum> {
        self.number
            .and_then(|n| u32::try_from(n).ok())
            .and_then(SeqNum::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nstring() {
        assert_eq!(Attribute::Nil.as_nstring(), None);
        assert_eq!(
            Attribute::String("jane".into()).as_nstring(),
            Some("jane".to_string())
        );
        assert_eq!(
            Attribute::Literal(b"raw".to_vec()).as_nstring(),
            Some("raw".to_string())
        );
        assert_eq!(Attribute::Number(3).as_nstring(), None);
    }

    #[test]
    fn test_display() {
        let attribute = Attribute::List(vec![
            Attribute::Atom("\\Seen".into()),
            Attribute::Nil,
            Attribute::String("a b".into()),
            Attribute::Code(vec![Attribute::Number(1)]),
        ]);
        assert_eq!(attribute.to_string(), "(\\Seen NIL \"a b\" [1])");
    }

    #[test]
    fn test_status_helpers() {
        let response = UntaggedResponse {
            number: None,
            verb: "OK".into(),
            attributes: vec![
                Attribute::Code(vec![Attribute::Atom("UIDNEXT".into()), Attribute::Number(9)]),
                Attribute::Text("Predicted".into()),
            ],
        };

        assert!(response.is("ok"));
        assert_eq!(response.code().unwrap().len(), 2);
        assert_eq!(response.text(), Some("Predicted"));
        assert!(response.seq().is_none());
    }

    #[test]
    fn test_seq_rejects_zero() {
        let response = UntaggedResponse {
            number: Some(0),
            verb: "FETCH".into(),
            attributes: Vec::new(),
        };
        assert!(response.seq().is_none());
    }
}
