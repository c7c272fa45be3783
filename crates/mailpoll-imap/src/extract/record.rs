//! Decodes FETCH records into [`FetchedMessage`] values.

use mailpoll_mime::{decode_encoded_words, parse_date};

use crate::parser::{Attribute, UntaggedResponse};
use crate::types::{Address, Envelope, FetchedMessage};

/// Why a FETCH record was not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedRecord(pub &'static str);

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

type Extracted<T> = std::result::Result<T, MalformedRecord>;

/// Decodes `* n FETCH (key value ...)`.
///
/// The response must carry exactly one parenthesized list of key/value
/// pairs. If an `ENVELOPE` key is present its value must be the 10-slot
/// envelope structure, and every address in it a 4-slot tuple.
///
/// # Errors
///
/// Returns [`MalformedRecord`] describing the first shape violation. The
/// caller is expected to skip such records.
pub fn extract_record(response: &UntaggedResponse) -> Extracted<FetchedMessage> {
    let seq = response
        .seq()
        .ok_or(MalformedRecord("missing or zero message number"))?;

    let [Attribute::List(items)] = response.attributes.as_slice() else {
        return Err(MalformedRecord("expected exactly one attribute list"));
    };
    if items.len() % 2 != 0 {
        return Err(MalformedRecord("odd number of attribute keys and values"));
    }

    let mut envelope = None;
    for pair in items.chunks_exact(2) {
        let key = pair[0]
            .as_atom()
            .ok_or(MalformedRecord("attribute key is not an atom"))?;
        if key.eq_ignore_ascii_case("ENVELOPE") {
            envelope = Some(parse_envelope(&pair[1])?);
        }
    }

    Ok(FetchedMessage {
        seq,
        envelope,
        attributes: items.clone(),
    })
}

fn parse_envelope(value: &Attribute) -> Extracted<Envelope> {
    let Some(
        [
            date,
            subject,
            from,
            sender,
            reply_to,
            to,
            cc,
            bcc,
            in_reply_to,
            message_id,
        ],
    ) = value.as_list()
    else {
        return Err(MalformedRecord("ENVELOPE is not a 10-element list"));
    };

    Ok(Envelope {
        date: date.as_nstring().and_then(|d| parse_date(&d)),
        subject: subject.as_nstring().map(|s| decode_encoded_words(&s)),
        from: parse_address_list(from)?,
        sender: parse_address_list(sender)?,
        reply_to: parse_address_list(reply_to)?,
        to: parse_address_list(to)?,
        cc: parse_address_list(cc)?,
        bcc: parse_address_list(bcc)?,
        in_reply_to: in_reply_to.as_nstring(),
        message_id: message_id.as_nstring(),
    })
}

fn parse_address_list(value: &Attribute) -> Extracted<Option<Vec<Address>>> {
    match value {
        Attribute::Nil => Ok(None),
        Attribute::List(items) => items.iter().map(parse_address).collect::<Extracted<_>>().map(Some),
        _ => Err(MalformedRecord("address field is neither NIL nor a list")),
    }
}

/// `(name adl mailbox host)`; the source route is dropped.
fn parse_address(value: &Attribute) -> Extracted<Address> {
    let Some([name, _adl, mailbox, host]) = value.as_list() else {
        return Err(MalformedRecord("address is not a 4-element list"));
    };

    Ok(Address {
        name: name.as_nstring().map(|n| decode_encoded_words(&n)),
        mailbox: mailbox.as_nstring(),
        host: host.as_nstring(),
    })
}
