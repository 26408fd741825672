use crate::MessageAttributes;

/// Byte accounting used by the queue to enforce its message size limit.
///
/// The total is the body length plus, per attribute, the lengths of its name,
/// its data type, and whichever value it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEvaluator {
    threshold: usize,
}

impl SizeEvaluator {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Total accounted size of a message
    pub fn message_size(attributes: &MessageAttributes, body: &str) -> usize {
        body.len()
            + attributes
                .iter()
                .map(|(name, value)| {
                    name.len()
                        + value.data_type.len()
                        + value.string_value.as_ref().map_or(0, |s| s.len())
                        + value.binary_value.as_ref().map_or(0, |b| b.len())
                })
                .sum::<usize>()
    }

    /// True when the message is strictly larger than the threshold
    pub fn exceeds(&self, attributes: &MessageAttributes, body: &str) -> bool {
        Self::message_size(attributes, body) > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MESSAGE_SIZE_THRESHOLD;
    use crate::MessageAttributeValue;
    use proptest::prelude::*;

    #[test]
    fn counts_every_attribute_part() {
        let mut attributes = MessageAttributes::new();
        attributes.insert("Author".to_string(), MessageAttributeValue::string("alice"));
        attributes.insert("Blob".to_string(), MessageAttributeValue::binary(vec![0u8, 1, 2]));

        // body 5 + (6 + 6 + 5) + (4 + 6 + 3)
        assert_eq!(SizeEvaluator::message_size(&attributes, "hello"), 35);
    }

    #[test]
    fn body_length_is_in_bytes() {
        assert_eq!(SizeEvaluator::message_size(&MessageAttributes::new(), "héllo"), 6);
    }

    #[test]
    fn attributes_can_push_a_message_over() {
        let evaluator = SizeEvaluator::new(10);
        let mut attributes = MessageAttributes::new();
        assert!(!evaluator.exceeds(&attributes, "0123456789"));

        attributes.insert("a".to_string(), MessageAttributeValue::string(""));
        assert!(evaluator.exceeds(&attributes, "0123456789"));
    }

    #[test]
    fn default_threshold_boundary() {
        let evaluator = SizeEvaluator::new(DEFAULT_MESSAGE_SIZE_THRESHOLD);
        let at = "x".repeat(DEFAULT_MESSAGE_SIZE_THRESHOLD);
        let over = "x".repeat(DEFAULT_MESSAGE_SIZE_THRESHOLD + 1);
        assert!(!evaluator.exceeds(&MessageAttributes::new(), &at));
        assert!(evaluator.exceeds(&MessageAttributes::new(), &over));
    }

    proptest! {
        #[test]
        fn boundary_holds_for_any_threshold(threshold in 0usize..4096) {
            let evaluator = SizeEvaluator::new(threshold);
            let empty = MessageAttributes::new();
            prop_assert!(!evaluator.exceeds(&empty, &"x".repeat(threshold)));
            prop_assert!(evaluator.exceeds(&empty, &"x".repeat(threshold + 1)));
        }
    }
}
