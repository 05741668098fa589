use printhook_core::message::{prepare_message, ELLIPSIS};
use proptest::prelude::*;

proptest! {
    #[test]
    fn long_text_truncates_to_exact_limit(text in "\\PC{1,400}", limit in 4usize..300) {
        let len = text.chars().count();
        let prepared = prepare_message(&text, limit);
        if len > limit {
            prop_assert_eq!(prepared.chars().count(), limit);
            prop_assert!(prepared.ends_with(ELLIPSIS));
            let kept: String = text.chars().take(limit - 3).collect();
            prop_assert!(prepared.starts_with(kept.as_str()));
        } else {
            prop_assert_eq!(prepared.as_ref(), text.as_str());
        }
    }

    #[test]
    fn disabled_policy_is_identity(text in "\\PC{0,400}") {
        let prepared = prepare_message(&text, 0);
        prop_assert_eq!(prepared.as_ref(), text.as_str());
    }
}

#[test]
fn test_three_hundred_characters_at_default_limit() {
    let text: String = "abcdefghij".repeat(30);
    let prepared = prepare_message(&text, printhook_core::DEFAULT_MAX_LENGTH);
    assert_eq!(prepared.chars().count(), 255);
    assert!(prepared.ends_with("..."));
}
