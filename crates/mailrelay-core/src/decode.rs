//! MIME decoding into a [`NormalizedRecord`].
//!
//! Decoding is total over syntactically valid MIME: missing headers yield
//! empty strings, undecodable body bytes are replaced rather than failing,
//! and a message with no `text/plain` part simply has an empty body. Only
//! input that cannot be parsed as MIME at all is an error.

use std::collections::HashMap;

use mailparse::{MailHeaderMap, ParsedMail, parse_mail};

use mailrelay_types::error::{RelayError, Result};
use mailrelay_types::record::NormalizedRecord;

/// Decode raw RFC 822 bytes (already base64url-decoded from the Gmail
/// transport encoding) into a normalized record.
pub fn decode(gmail_id: &str, raw: &[u8]) -> Result<NormalizedRecord> {
    let mail = parse_mail(raw).map_err(|e| RelayError::Decode {
        id: gmail_id.to_owned(),
        reason: e.to_string(),
    })?;

    // Later occurrences overwrite earlier ones: duplicate header names
    // collapse to the last-seen value.
    let headers: HashMap<String, String> = mail
        .headers
        .iter()
        .map(|h| (h.get_key(), h.get_value()))
        .collect();

    Ok(NormalizedRecord {
        gmail_id: gmail_id.to_owned(),
        subject: first_header(&mail, "Subject"),
        from: first_header(&mail, "From"),
        to: first_header(&mail, "To"),
        body: extract_body(&mail),
        headers,
    })
}

fn first_header(mail: &ParsedMail<'_>, name: &str) -> String {
    mail.headers.get_first_value(name).unwrap_or_default()
}

/// Best-effort plain-text body.
///
/// Multipart: the first `text/plain` part in document order, decoded per
/// its declared charset (UTF-8 when unspecified, lossy on bad bytes).
/// Single-part: the payload itself under the same charset policy.
fn extract_body(mail: &ParsedMail<'_>) -> String {
    if mail.subparts.is_empty() {
        return mail.get_body().unwrap_or_default();
    }
    first_text_plain(mail)
        .map(|part| part.get_body().unwrap_or_default())
        .unwrap_or_default()
}

/// Pre-order scan for the first `text/plain` leaf, descending into nested
/// multipart containers.
fn first_text_plain<'a, 'b>(part: &'a ParsedMail<'b>) -> Option<&'a ParsedMail<'b>> {
    for sub in &part.subparts {
        if sub.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            return Some(sub);
        }
        if let Some(found) = first_text_plain(sub) {
            return Some(found);
        }
    }
    None
}
