//! Zone naming rules
//!
//! A managed zone has two names: the DNS name it serves (`example.com.`)
//! and the resource name the cloud provider files it under (`example-com`).
//! The resource name is derived from the DNS name.

use crate::error::{Error, Result};

/// Maximum length of a DNS name, trailing dot excluded (RFC 1035)
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single label (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

/// Derive the zone resource name from a DNS name
///
/// Every `.` becomes `-`, then the last character is dropped. For a fully
/// qualified name this removes the hyphen that replaced the trailing dot:
///
/// ```
/// use zoneprov_core::naming::derive_zone_resource_name;
///
/// assert_eq!(derive_zone_resource_name("example.com."), "example-com");
/// ```
///
/// The truncation is positional. Without a trailing dot it cuts a real
/// character (`"example.com"` gives `"example-co"`), so callers should pass
/// the name through [`normalize_dns_name`] first.
pub fn derive_zone_resource_name(name: &str) -> String {
    let mut resource_name = name.replace('.', "-");
    resource_name.pop();
    resource_name
}

/// Append the trailing dot to a DNS name if it is missing
pub fn normalize_dns_name(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Validate a requested zone DNS name
///
/// Accepts an optional leading `*`, then at least two non-empty parts
/// separated by a dot, with no whitespace anywhere. A single trailing dot is
/// allowed.
pub fn validate_dns_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::missing("zone name cannot be empty"));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(Error::invalid_input(format!(
            "Zone name '{name}' must not contain whitespace"
        )));
    }

    // Same shape as `^\*?\S+\.\S+$`: something on both sides of some dot
    let has_two_parts = name
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < name.len());
    if !has_two_parts {
        return Err(Error::invalid_input(format!(
            "Zone name '{name}' must have more than two parts separated by periods \
             and can have an optional asterisk at the beginning"
        )));
    }

    let bare = name.strip_prefix('*').unwrap_or(name);
    let bare = bare.strip_suffix('.').unwrap_or(bare);

    if bare.len() > MAX_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "Zone name too long: {} chars (max {MAX_NAME_LEN})",
            bare.len()
        )));
    }

    if let Some(label) = bare.split('.').find(|l| l.len() > MAX_LABEL_LEN) {
        return Err(Error::invalid_input(format!(
            "Zone label too long: {} chars (max {MAX_LABEL_LEN}). Label: '{label}'",
            label.len()
        )));
    }

    Ok(())
}
