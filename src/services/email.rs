use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_ADDRESS_LEN: usize = 254;

/// Domains reserved for special use that can never receive mail.
const SPECIAL_USE_DOMAINS: &[&str] = &["arpa", "invalid", "local", "localhost", "onion", "test"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("The email address is not valid: {0}")]
    InvalidSyntax(String),

    #[error("The domain name {0} does not accept email.")]
    Undeliverable(String),
}

fn invalid(reason: &str) -> EmailError {
    EmailError::InvalidSyntax(reason.to_string())
}

lazy_static! {
    static ref LOCAL_PART_RE: Regex =
        Regex::new(r"^[\p{L}\p{N}!#$%&'*+/=?^_`{|}~-]+(\.[\p{L}\p{N}!#$%&'*+/=?^_`{|}~-]+)*$")
            .unwrap();
    static ref DOMAIN_LABEL_RE: Regex =
        Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap();
}

/// Validate `email` and return its normalized form (trimmed, lowercase domain).
///
/// With `check_deliverability` the domain must also resolve in DNS.
pub async fn validate_and_normalize_email(
    email: &str,
    check_deliverability: bool,
) -> Result<String, EmailError> {
    let normalized = normalize_syntax(email)?;
    if check_deliverability {
        let domain = normalized
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default();
        check_domain_resolves(domain).await?;
    }
    Ok(normalized)
}

fn normalize_syntax(email: &str) -> Result<String, EmailError> {
    let email = email.trim();
    let (local, domain) = email
        .rsplit_once('@')
        .ok_or_else(|| invalid("An email address must have an @-sign."))?;

    if local.is_empty() {
        return Err(invalid("There must be something before the @-sign."));
    }
    if local.chars().count() > MAX_LOCAL_PART_LEN {
        return Err(invalid("The email address is too long before the @-sign."));
    }
    if local.starts_with('.') {
        return Err(invalid("An email address cannot start with a period."));
    }
    if local.ends_with('.') {
        return Err(invalid("An email address cannot have a period immediately before the @-sign."));
    }
    if local.contains("..") {
        return Err(invalid("An email address cannot have two periods in a row."));
    }
    if !LOCAL_PART_RE.is_match(local) {
        return Err(invalid("The email address contains invalid characters before the @-sign."));
    }

    let domain = domain.to_lowercase();
    if domain.is_empty() {
        return Err(invalid("There must be something after the @-sign."));
    }
    if !domain.contains('.') {
        return Err(invalid("The part after the @-sign is not valid. It should have a period."));
    }
    if domain.split('.').any(|label| !DOMAIN_LABEL_RE.is_match(label)) {
        return Err(invalid("The part after the @-sign is not valid."));
    }
    let tld = domain.rsplit('.').next().unwrap_or_default();
    if tld.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("The part after the @-sign is not valid. It is not within a valid top-level domain."));
    }
    if SPECIAL_USE_DOMAINS.contains(&tld) {
        return Err(invalid("The part after the @-sign is a special-use or reserved name that cannot be used with email."));
    }

    let normalized = format!("{local}@{domain}");
    if normalized.chars().count() > MAX_ADDRESS_LEN {
        return Err(invalid("The email address is too long."));
    }
    Ok(normalized)
}

async fn check_domain_resolves(domain: &str) -> Result<(), EmailError> {
    let undeliverable = || EmailError::Undeliverable(domain.to_string());
    match tokio::net::lookup_host(format!("{domain}:25")).await {
        Ok(mut addrs) => {
            if addrs.next().is_some() {
                Ok(())
            } else {
                Err(undeliverable())
            }
        }
        Err(e) => {
            debug!(error = %e, %domain, "email domain lookup failed");
            Err(undeliverable())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn normalize(email: &str) -> Result<String, EmailError> {
        validate_and_normalize_email(email, false).await
    }

    #[tokio::test]
    async fn accepts_and_normalizes_valid_addresses() {
        assert_eq!(
            normalize("joseph.yaaqov@gmail.com").await.unwrap(),
            "joseph.yaaqov@gmail.com"
        );
        assert_eq!(
            normalize("  Fulton.Sheen@Example.COM ").await.unwrap(),
            "Fulton.Sheen@example.com"
        );
        assert_eq!(
            normalize("o'brien+quiz@mail.example.org").await.unwrap(),
            "o'brien+quiz@mail.example.org"
        );
    }

    #[tokio::test]
    async fn rejects_consecutive_periods() {
        let err = normalize("florence..faolluiere@gmail.com").await.unwrap_err();
        assert!(matches!(err, EmailError::InvalidSyntax(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_addresses() {
        for email in [
            "",
            "no-at-sign",
            "@example.com",
            "user@",
            ".user@example.com",
            "user.@example.com",
            "us er@example.com",
            "user@nodot",
            "user@-bad-.com",
            "user@example.123",
        ] {
            assert!(
                matches!(normalize(email).await, Err(EmailError::InvalidSyntax(_))),
                "{email:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn rejects_special_use_domains_without_dns() {
        for email in ["user@host.localhost", "user@example.test", "user@nowhere.invalid"] {
            assert!(normalize(email).await.is_err(), "{email:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn rejects_overlong_local_part() {
        let email = format!("{}@example.com", "a".repeat(65));
        assert!(normalize(&email).await.is_err());
    }

    #[tokio::test]
    async fn unresolvable_domain_is_undeliverable() {
        fn assert_send<T: Send>(_: &T) {}

        let check = validate_and_normalize_email("user@no-such-host.example", true);
        assert_send(&check);
        assert_eq!(
            check.await,
            Err(EmailError::Undeliverable("no-such-host.example".into()))
        );
    }
}
