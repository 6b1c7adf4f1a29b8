//! The closed credential-pattern set.
//!
//! Four pattern kinds cover everything the gateway is known to leak into its
//! logs: raw API keys, bearer/JWT material, credential file paths, and
//! account e-mail identities. The set is fixed at compile time and not
//! extensible at report-generation time.

use regex::Regex;
use std::sync::LazyLock;

/// Kind of credential shape a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    ApiKey,
    BearerToken,
    CredentialPath,
    AccountEmail,
}

impl PatternKind {
    /// Fixed placeholder substituted for a match. Preserves that a value
    /// existed without preserving any byte of it.
    pub fn placeholder(&self) -> &'static str {
        match self {
            PatternKind::ApiKey => "[REDACTED:api-key]",
            PatternKind::BearerToken => "[REDACTED:bearer-token]",
            PatternKind::CredentialPath => "[REDACTED:credential-path]",
            PatternKind::AccountEmail => "[REDACTED:account-email]",
        }
    }
}

/// A compiled redaction rule.
pub struct RedactionRule {
    pub kind: PatternKind,
    pub regex: &'static LazyLock<Regex>,
}

macro_rules! redaction_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($regex_str).expect("redaction pattern compiles"));
    };
}

// ── API keys ───────────────────────────────────────────────────────────────
redaction_pattern!(RE_SK_KEY, r"\bsk-[A-Za-z0-9_-]{16,}\b");
redaction_pattern!(RE_GOOGLE_KEY, r"\bAIza[0-9A-Za-z_-]{35}\b");
redaction_pattern!(RE_GITHUB_TOKEN, r"\bgh[pousr]_[A-Za-z0-9]{36}\b");
redaction_pattern!(
    RE_KEY_ASSIGN,
    r#"(?i)\b(?:api[_-]?key|apikey|auth[_-]?token|access[_-]?token|secret)\s*[=:]\s*["']?[A-Za-z0-9_\-./+]{12,}["']?"#
);

// ── Bearer tokens ──────────────────────────────────────────────────────────
redaction_pattern!(RE_BEARER, r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{16,}=*");
redaction_pattern!(
    RE_JWT,
    r"\beyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\b"
);

// ── Credential file paths ──────────────────────────────────────────────────
redaction_pattern!(
    RE_CRED_PATH,
    r"(?:/[\w.+-]+)*/[\w.+-]*(?i:credentials?|secrets?|oauth|keyfile|service[_-]?account|id_rsa|id_ed25519)[\w.+-]*"
);

// ── Account e-mail identities ──────────────────────────────────────────────
redaction_pattern!(
    RE_ACCOUNT_EMAIL,
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"
);

/// All redaction rules in their fixed application order.
pub fn all_rules() -> &'static [RedactionRule] {
    static RULES: LazyLock<Vec<RedactionRule>> = LazyLock::new(|| {
        vec![
            RedactionRule {
                kind: PatternKind::ApiKey,
                regex: &RE_SK_KEY,
            },
            RedactionRule {
                kind: PatternKind::ApiKey,
                regex: &RE_GOOGLE_KEY,
            },
            RedactionRule {
                kind: PatternKind::ApiKey,
                regex: &RE_GITHUB_TOKEN,
            },
            RedactionRule {
                kind: PatternKind::ApiKey,
                regex: &RE_KEY_ASSIGN,
            },
            RedactionRule {
                kind: PatternKind::BearerToken,
                regex: &RE_BEARER,
            },
            RedactionRule {
                kind: PatternKind::BearerToken,
                regex: &RE_JWT,
            },
            RedactionRule {
                kind: PatternKind::CredentialPath,
                regex: &RE_CRED_PATH,
            },
            RedactionRule {
                kind: PatternKind::AccountEmail,
                regex: &RE_ACCOUNT_EMAIL,
            },
        ]
    });
    &RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        for rule in all_rules() {
            // Touching the regex forces compilation.
            assert!(!rule.regex.as_str().is_empty());
        }
    }

    #[test]
    fn test_sk_key_matches() {
        assert!(RE_SK_KEY.is_match("request failed for key sk-abcdef1234567890abcdef"));
        assert!(!RE_SK_KEY.is_match("task-123 finished"));
    }

    #[test]
    fn test_email_matches() {
        assert!(RE_ACCOUNT_EMAIL.is_match("account ops-bot@example.com suspended"));
        assert!(!RE_ACCOUNT_EMAIL.is_match("google-gemini-cli"));
    }

    #[test]
    fn test_cred_path_matches() {
        assert!(RE_CRED_PATH.is_match("loaded /home/gw/.config/gateway/oauth_creds.json"));
        assert!(RE_CRED_PATH.is_match("reading /root/.ssh/id_rsa"));
        assert!(!RE_CRED_PATH.is_match("/var/log/gateway.log"));
    }

    #[test]
    fn test_token_limit_phrase_not_matched() {
        // "token limit" is a classification phrase, not a credential.
        assert!(!RE_KEY_ASSIGN.is_match("request hit the token limit"));
        assert!(!RE_KEY_ASSIGN.is_match("too many tokens: 128000"));
    }
}
