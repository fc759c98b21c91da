//! Workload naming
//!
//! Every cluster object of a workload is named `{username}-{short name}`;
//! the Ingress host is `{derived}.{domain}`. All call sites go through here.

use crate::validation::is_dns_label;
use kubelab_common::{Error, Result};

/// Kubernetes limit for object names used as DNS labels
pub const MAX_OBJECT_NAME_LENGTH: usize = 63;

/// Derived object name for a user's workload
pub fn derive_name(username: &str, short_name: &str) -> String {
    format!("{}-{}", username, short_name)
}

/// Validate a requested short name and return the derived name
pub fn validated_name(username: &str, short_name: &str) -> Result<String> {
    if !is_dns_label(short_name) {
        return Err(Error::Validation(format!(
            "Invalid name '{}': use lowercase letters, digits and '-', starting and ending with a letter or digit",
            short_name
        )));
    }

    let derived = derive_name(username, short_name);
    if derived.len() > MAX_OBJECT_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "Name '{}' is too long: '{}' exceeds {} characters",
            short_name, derived, MAX_OBJECT_NAME_LENGTH
        )));
    }

    Ok(derived)
}

/// Recover the short name from a derived name owned by `username`
pub fn short_name<'a>(derived: &'a str, username: &str) -> Option<&'a str> {
    derived
        .strip_prefix(username)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|rest| !rest.is_empty())
}

/// Ingress host for a derived name
pub fn hostname(derived: &str, domain: &str) -> String {
    format!("{}.{}", derived, domain.trim_start_matches('.'))
}
