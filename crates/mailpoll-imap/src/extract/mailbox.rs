//! Builds a [`Mailbox`] from the untagged responses to SELECT.

use crate::parser::{Attribute, UntaggedResponse};
use crate::types::{ExtraValue, Mailbox};

/// Accumulates SELECT responses into a fresh [`Mailbox`].
///
/// ```
/// use mailpoll_imap::extract::MailboxBuilder;
/// use mailpoll_imap::parser::{Response, ResponseParser};
///
/// let mut builder = MailboxBuilder::new("INBOX");
/// for line in [&b"* 172 EXISTS"[..], b"* FLAGS (\\Seen \\Answered)"] {
///     if let Ok(Response::Untagged(response)) = ResponseParser::parse(line) {
///         builder.observe(&response);
///     }
/// }
/// let mailbox = builder.finish();
/// assert_eq!(mailbox.exists, 172);
/// assert_eq!(mailbox.flags, ["Seen", "Answered"]);
/// ```
#[derive(Debug, Clone)]
pub struct MailboxBuilder {
    mailbox: Mailbox,
}

impl MailboxBuilder {
    /// Starts a snapshot for `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            mailbox: Mailbox {
                path: path.into(),
                ..Mailbox::default()
            },
        }
    }

    /// Folds one untagged response into the snapshot.
    ///
    /// Returns false if the response carries nothing a mailbox snapshot
    /// records.
    pub fn observe(&mut self, response: &UntaggedResponse) -> bool {
        match (response.number, response.verb.as_str()) {
            (Some(n), "EXISTS") => {
                self.mailbox.exists = saturate(n);
                true
            }
            (Some(n), "RECENT") => {
                self.mailbox.recent = saturate(n);
                true
            }
            (None, "FLAGS") => match response.attributes.first().and_then(Attribute::as_list) {
                Some(flags) => {
                    self.mailbox.flags = flag_names(flags);
                    true
                }
                None => false,
            },
            (None, "OK") => response.code().is_some_and(|code| self.observe_code(code)),
            _ => false,
        }
    }

    /// Records the response code of the tagged SELECT completion.
    pub fn observe_completion(&mut self, code: Option<&[Attribute]>) {
        if let Some(code) = code {
            self.observe_code(code);
        }
    }

    /// Returns the finished snapshot.
    #[must_use]
    pub fn finish(self) -> Mailbox {
        self.mailbox
    }

    fn observe_code(&mut self, code: &[Attribute]) -> bool {
        let Some((key, rest)) = code.split_first() else {
            return false;
        };
        let Some(key) = key.as_atom() else {
            return false;
        };

        match key.to_ascii_uppercase().as_str() {
            "PERMANENTFLAGS" => match rest.first().and_then(Attribute::as_list) {
                Some(flags) => {
                    self.mailbox.permanent_flags = flag_names(flags);
                    true
                }
                None => false,
            },
            "READ-ONLY" => {
                self.mailbox.read_only = true;
                true
            }
            "READ-WRITE" => {
                self.mailbox.read_only = false;
                true
            }
            _ if rest.is_empty() => false,
            _ => {
                self.mailbox
                    .extra
                    .insert(key.to_ascii_lowercase(), extra_value(rest));
                true
            }
        }
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Flag names with the leading `\` removed, first occurrence wins.
fn flag_names(flags: &[Attribute]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(flags.len());
    for flag in flags.iter().filter_map(Attribute::as_text) {
        let name = flag.strip_prefix('\\').unwrap_or(&*flag);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Integer first, text otherwise.
fn extra_value(values: &[Attribute]) -> ExtraValue {
    let text = match values {
        [Attribute::Number(n)] => {
            return i64::try_from(*n)
                .map_or_else(|_| ExtraValue::Text(n.to_string()), ExtraValue::Integer);
        }
        [single] => single
            .as_text()
            .map_or_else(|| single.to_string(), std::borrow::Cow::into_owned),
        _ => values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" "),
    };

    text.parse()
        .map_or(ExtraValue::Text(text), ExtraValue::Integer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{Response, ResponseParser};

    fn build(lines: &[&str]) -> Mailbox {
        let mut builder = MailboxBuilder::new("INBOX");
        for line in lines {
            match ResponseParser::parse(line.as_bytes()).unwrap() {
                Response::Untagged(response) => {
                    builder.observe(&response);
                }
                Response::Tagged { code, .. } => builder.observe_completion(code.as_deref()),
                Response::Continuation { .. } => {}
            }
        }
        builder.finish()
    }

    #[test]
    fn test_select_decode() {
        let mailbox = build(&[
            "* 172 EXISTS",
            "* 1 RECENT",
            "* FLAGS (\\Seen \\Answered)",
            "* OK [PERMANENTFLAGS (\\Seen \\Deleted)] Ok",
            "A002 OK SELECT completed",
        ]);

        assert_eq!(mailbox.path, "INBOX");
        assert_eq!(mailbox.exists, 172);
        assert_eq!(mailbox.recent, 1);
        assert_eq!(mailbox.flags, ["Seen", "Answered"]);
        assert_eq!(mailbox.permanent_flags, ["Seen", "Deleted"]);
        assert!(mailbox.extra.is_empty());
        assert!(!mailbox.read_only);
    }

    #[test]
    fn test_extra_codes() {
        let mailbox = build(&[
            "* OK [UIDVALIDITY 3857529045] UIDs valid",
            "* OK [UIDNEXT 4392] Predicted next UID",
            "* OK [MAILBOXID (F2212ea87-6097-4256-9d51-71338625)] Ok",
            "* OK [X-NOTE hello] Ok",
            "* OK [X-SIGNED -12] Ok",
        ]);

        assert_eq!(mailbox.extra_integer("uidvalidity"), Some(3_857_529_045));
        assert_eq!(mailbox.extra_integer("uidnext"), Some(4392));
        assert_eq!(
            mailbox.extra.get("mailboxid"),
            Some(&ExtraValue::Text(
                "(F2212ea87-6097-4256-9d51-71338625)".to_string()
            ))
        );
        assert_eq!(
            mailbox.extra.get("x-note"),
            Some(&ExtraValue::Text("hello".to_string()))
        );
        assert_eq!(mailbox.extra_integer("x-signed"), Some(-12));
    }

    #[test]
    fn test_read_only_completion() {
        let mailbox = build(&["* 0 EXISTS", "A002 OK [READ-ONLY] EXAMINE completed"]);
        assert!(mailbox.read_only);
    }

    #[test]
    fn test_flags_deduplicated_in_order() {
        let mailbox = build(&["* FLAGS (\\Seen $Forwarded \\Seen \\Draft)"]);
        assert_eq!(mailbox.flags, ["Seen", "$Forwarded", "Draft"]);
    }

    #[test]
    fn test_unrecognized_ignored() {
        let mut builder = MailboxBuilder::new("INBOX");
        for line in ["* OK [ALERT] hi", "* CAPABILITY IMAP4rev1", "* 3 FETCH (UID 1)", "* OK plain"] {
            let Response::Untagged(response) = ResponseParser::parse(line.as_bytes()).unwrap()
            else {
                panic!("Expected untagged");
            };
            assert!(!builder.observe(&response), "{line} should be ignored");
        }
        assert_eq!(builder.finish(), Mailbox {
            path: "INBOX".into(),
            ..Mailbox::default()
        });
    }
}
