///! Input validation
///! Checks applied to request fields before anything touches the database or cluster

use kubelab_common::Error;
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_GROUP_NAME_LENGTH: usize = 255;
pub const MAX_IMAGE_LENGTH: usize = 512;

/// Lowercase DNS-1123 label fragment
static DNS_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

pub type ValidationResult<T> = Result<T, Error>;

/// Trim a required field, rejecting missing or blank values
pub fn required<'a>(value: Option<&'a str>, field: &str) -> ValidationResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::Validation(format!("Missing required field: {}", field))),
    }
}

/// True when `name` is usable inside a Kubernetes object name
pub fn is_dns_label(name: &str) -> bool {
    DNS_LABEL_REGEX.is_match(name)
}

/// Username validation
///
/// Usernames prefix every workload name, so they follow object-name rules.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
        return Err(Error::Validation(format!(
            "Username must be between 1 and {} characters",
            MAX_USERNAME_LENGTH
        )));
    }

    if !is_dns_label(username) {
        return Err(Error::Validation(
            "Username may only contain lowercase letters, digits and '-', and must start and end with a letter or digit"
                .to_string(),
        ));
    }

    Ok(())
}

/// Password validation
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(Error::Validation("Password cannot be empty".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(Error::Validation(format!(
            "Password too long (max {} characters)",
            MAX_PASSWORD_LENGTH
        )));
    }

    Ok(())
}

/// Container image reference validation
pub fn validate_image(image: &str) -> ValidationResult<()> {
    if image.len() > MAX_IMAGE_LENGTH {
        return Err(Error::Validation(format!(
            "Image reference too long (max {} characters)",
            MAX_IMAGE_LENGTH
        )));
    }

    if image.chars().any(char::is_whitespace) {
        return Err(Error::Validation(
            "Image reference cannot contain whitespace".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_group_name(name: &str) -> ValidationResult<()> {
    if name.len() > MAX_GROUP_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "Group name too long (max {} characters)",
            MAX_GROUP_NAME_LENGTH
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(required(Some("  web "), "name").unwrap(), "web");
        assert!(required(Some("   "), "name").is_err());
        assert!(required(None, "name").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("student-01").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("Alice").is_err());
        assert!(validate_username("-alice").is_err());
        assert!(validate_username("alice_b").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("hunter2").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image("nginx:1.27").is_ok());
        assert!(validate_image("ghcr.io/org/app@sha256:abc").is_ok());
        assert!(validate_image("nginx latest").is_err());
    }
}
