//! Total (non-short-circuiting) validation of `UserConfig`.
//!
//! Every error is collected; callers never see only the first problem. This
//! mirrors the teacher's validation style in `metal::state`/`metal::talos`
//! tests, which assert on every relevant condition rather than bailing out
//! on the first `assert`. Cluster-name validation is rejects-first: each
//! check runs independently against the raw string rather than building on
//! a previous check's result.

use thiserror::Error;

use crate::schema::UserConfig;

/// A single validation failure. `Validate` returns all of these that apply;
/// it never stops at the first one (see the module doc and the Open
/// question about join-vs-short-circuit error shapes).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cluster name must not be empty")]
    NameEmpty,
    #[error("cluster name must be at most 63 characters, got {0}")]
    NameTooLong(usize),
    #[error("cluster name must start with a lowercase letter")]
    NameBadStart,
    #[error("cluster name must end with a lowercase letter or digit")]
    NameBadEnd,
    #[error("cluster name may only contain lowercase letters, digits, and hyphens")]
    NameBadCharset,
    #[error("cluster name must not contain consecutive hyphens")]
    NameConsecutiveHyphens,
    #[error("worker count must be between 1 and 5, got {0}")]
    WorkerCountOutOfRange(u8),
    #[error("domain {0:?} is not a valid domain name")]
    InvalidDomain(String),
    #[error("domain is set but environment variable CF_API_TOKEN is not set")]
    MissingCloudflareToken,
    #[error("backup is enabled but environment variable {0} is not set")]
    MissingBackupCredential(&'static str),
}

/// Validate a `UserConfig`, returning every failing rule. An empty vector
/// means the config validates.
#[must_use]
pub fn validate(cfg: &UserConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_name(&cfg.name));

    if !(1..=5).contains(&cfg.workers.count) {
        errors.push(ValidationError::WorkerCountOutOfRange(cfg.workers.count));
    }

    if let Some(domain) = &cfg.domain {
        if !is_valid_domain(domain) {
            errors.push(ValidationError::InvalidDomain(domain.clone()));
        }
        if std::env::var("CF_API_TOKEN").is_err() {
            errors.push(ValidationError::MissingCloudflareToken);
        }
    }

    if cfg.backup {
        if std::env::var("HETZNER_S3_ACCESS_KEY").is_err() {
            errors.push(ValidationError::MissingBackupCredential(
                "HETZNER_S3_ACCESS_KEY",
            ));
        }
        if std::env::var("HETZNER_S3_SECRET_KEY").is_err() {
            errors.push(ValidationError::MissingBackupCredential(
                "HETZNER_S3_SECRET_KEY",
            ));
        }
    }

    errors
}

fn validate_name(name: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push(ValidationError::NameEmpty);
        // The remaining checks are meaningless on an empty string and
        // would duplicate NameEmpty's signal; skip them.
        return errors;
    }

    if name.len() > 63 {
        errors.push(ValidationError::NameTooLong(name.len()));
    }

    let first = name.chars().next().unwrap();
    if !first.is_ascii_lowercase() {
        errors.push(ValidationError::NameBadStart);
    }

    let last = name.chars().last().unwrap();
    if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
        errors.push(ValidationError::NameBadEnd);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        errors.push(ValidationError::NameBadCharset);
    }

    if name.contains("--") {
        errors.push(ValidationError::NameConsecutiveHyphens);
    }

    errors
}

/// RFC-ish domain validation: labels of `[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?`,
/// at least two labels, TLD of >= 2 alpha chars, total length <= 253.
#[must_use]
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    if !labels.iter().all(|label| is_valid_label(label)) {
        return false;
    }

    let tld = labels.last().unwrap();
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    let chars: Vec<char> = label.chars().collect();
    let alnum = |c: char| c.is_ascii_alphanumeric();
    if !alnum(chars[0]) || !alnum(*chars.last().unwrap()) {
        return false;
    }
    chars.iter().all(|&c| alnum(c) || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Mode, Region, ServerSize, Workers};

    fn base_config() -> UserConfig {
        UserConfig {
            name: "dev".to_string(),
            region: Region::Fsn1,
            mode: Mode::Dev,
            workers: Workers {
                count: 1,
                size: ServerSize::Cx23,
            },
            domain: None,
            backup: false,
        }
    }

    #[test]
    fn minimal_config_validates() {
        assert!(validate(&base_config()).is_empty());
    }

    #[test]
    fn name_length_boundaries() {
        assert!(validate_name(&"a".repeat(1)).is_empty());
        assert!(validate_name(&"a".repeat(63)).is_empty());
        assert!(!validate_name(&"a".repeat(64)).is_empty());
        assert!(!validate_name("").is_empty());
    }

    #[test]
    fn worker_count_boundaries() {
        for (count, ok) in [(0u8, false), (1, true), (5, true), (6, false)] {
            let mut cfg = base_config();
            cfg.workers.count = count;
            let errors = validate(&cfg);
            assert_eq!(
                errors.is_empty(),
                ok,
                "count={count} errors={errors:?}"
            );
        }
    }

    #[test]
    fn validation_is_total_not_short_circuiting() {
        let mut cfg = base_config();
        cfg.name = String::new();
        cfg.workers.count = 0;
        let errors = validate(&cfg);
        assert!(errors.contains(&ValidationError::NameEmpty));
        assert!(errors.contains(&ValidationError::WorkerCountOutOfRange(0)));
    }

    #[test]
    fn consecutive_hyphens_rejected() {
        assert!(validate_name("my--cluster").contains(&ValidationError::NameConsecutiveHyphens));
    }

    #[test]
    #[serial_test::serial(env)]
    fn domain_without_cf_token_fails() {
        std::env::remove_var("CF_API_TOKEN");
        let mut cfg = base_config();
        cfg.domain = Some("example.com".to_string());
        assert!(validate(&cfg).contains(&ValidationError::MissingCloudflareToken));
    }

    #[test]
    fn valid_domains() {
        for d in ["example.com", "sub.example.co.uk", "a-b.io"] {
            assert!(is_valid_domain(d), "{d} should be valid");
        }
    }

    #[test]
    fn invalid_domains() {
        for d in ["", "nodot", "-lead.com", "trail-.com", "a.c", "a.123"] {
            assert!(!is_valid_domain(d), "{d} should be invalid");
        }
    }
}
