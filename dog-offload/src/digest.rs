//! MD5 digests as computed by the queue service.
//!
//! Rehydrated messages get their `MD5OfBody` and `MD5OfMessageAttributes`
//! recomputed here so callers can keep verifying them independently.

use tracing::warn;

use crate::MessageAttributes;

const STRING_TRANSPORT: u8 = 1;
const BINARY_TRANSPORT: u8 = 2;

/// Hex MD5 of the body bytes
pub fn md5_of_body(body: &str) -> String {
    hex::encode(md5::compute(body.as_bytes()).0)
}

/// Hex MD5 of the message attributes, `None` when there are none.
///
/// Attributes are visited in name order. Each contributes, with every length
/// a 4-byte big-endian prefix: name, data type, one transport byte (1 for
/// string values, 2 for binary), value.
pub fn md5_of_message_attributes(attributes: Option<&MessageAttributes>) -> Option<String> {
    let attributes = attributes.filter(|attrs| !attrs.is_empty())?;

    let mut buffer = Vec::new();
    for (name, value) in attributes {
        let (transport, bytes): (u8, &[u8]) = match (&value.string_value, &value.binary_value) {
            (Some(s), _) => (STRING_TRANSPORT, s.as_bytes()),
            (None, Some(b)) => (BINARY_TRANSPORT, b.as_ref()),
            (None, None) => {
                warn!(attribute = %name, "message attribute has no value, skipped from digest");
                continue;
            }
        };

        push_length_prefixed(&mut buffer, name.as_bytes());
        push_length_prefixed(&mut buffer, value.data_type.as_bytes());
        buffer.push(transport);
        push_length_prefixed(&mut buffer, bytes);
    }

    Some(hex::encode(md5::compute(&buffer).0))
}

fn push_length_prefixed(buffer: &mut Vec<u8>, bytes: &[u8]) {
    buffer.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buffer.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageAttributeValue;

    fn attributes(entries: Vec<(&str, MessageAttributeValue)>) -> MessageAttributes {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[test]
    fn body_digest_is_plain_md5() {
        assert_eq!(md5_of_body(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            md5_of_body(r#"{"message":"small text"}"#),
            "d8c52d17002b79bcfa459d651755f1a6"
        );
    }

    #[test]
    fn no_attributes_means_no_digest() {
        assert_eq!(md5_of_message_attributes(None), None);
        assert_eq!(md5_of_message_attributes(Some(&MessageAttributes::new())), None);
    }

    #[test]
    fn single_string_attribute() {
        let attrs = attributes(vec![("Author", MessageAttributeValue::string("alice"))]);
        assert_eq!(
            md5_of_message_attributes(Some(&attrs)).as_deref(),
            Some("e359dfbf3997df0b05607a5e2e457d9b")
        );
    }

    #[test]
    fn mixed_attributes_are_sorted_by_name() {
        let attrs = attributes(vec![
            ("Priority", MessageAttributeValue::number(5)),
            ("Blob", MessageAttributeValue::binary(vec![0u8, 1, 2])),
            ("Author", MessageAttributeValue::string("alice")),
        ]);
        assert_eq!(
            md5_of_message_attributes(Some(&attrs)).as_deref(),
            Some("42ff95732fadd3180c1f118826657b65")
        );
    }

    #[test]
    fn valueless_attributes_are_skipped() {
        let mut attrs = attributes(vec![("Author", MessageAttributeValue::string("alice"))]);
        attrs.insert(
            "Empty".to_string(),
            MessageAttributeValue {
                data_type: "String".to_string(),
                string_value: None,
                binary_value: None,
            },
        );
        assert_eq!(
            md5_of_message_attributes(Some(&attrs)).as_deref(),
            Some("e359dfbf3997df0b05607a5e2e457d9b")
        );
    }
}
