//! Property tests for redaction soundness.

use proptest::prelude::*;
use vigil::redact::Redactor;

proptest! {
    /// No generated API-key-shaped value ever survives redaction, whatever
    /// surrounds it.
    #[test]
    fn prop_api_keys_never_survive(
        key in "sk-[A-Za-z0-9]{20,40}",
        prefix in "[a-z ]{0,20}",
        suffix in "[a-z ]{0,20}",
    ) {
        let redactor = Redactor::default();
        let input = format!("{} {} {}", prefix, key, suffix);
        let output = redactor.redact(&input);
        prop_assert!(!output.contains(&key));
    }

    /// Redaction is deterministic and idempotent: placeholders themselves
    /// contain nothing left to match.
    #[test]
    fn prop_redaction_idempotent(input in ".{0,200}") {
        let redactor = Redactor::default();
        let once = redactor.redact(&input);
        let twice = redactor.redact(&once);
        prop_assert_eq!(&once, &redactor.redact(&input));
        prop_assert_eq!(once, twice);
    }

    /// E-mail-shaped account identities never survive.
    #[test]
    fn prop_emails_never_survive(
        local in "[a-z0-9]{1,12}",
        domain in "[a-z0-9]{1,12}",
    ) {
        let redactor = Redactor::default();
        let email = format!("{}@{}.com", local, domain);
        let output = redactor.redact(&format!("account {} suspended", email));
        prop_assert!(!output.contains(&email));
    }
}
