use crate::CoreError;

const MAX_SHOP_DOMAIN_LEN: usize = 255;

/// Normalizes a tenant identifier to a bare lowercase host
/// (`"https://Example.myshopify.com/"` becomes `"example.myshopify.com"`).
///
/// # Errors
///
/// Returns [`CoreError::InvalidShopDomain`] when the value is empty, too long,
/// has no dot, or contains characters outside `[a-z0-9.-]`.
pub fn normalize_shop_domain(raw: &str) -> Result<String, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidShopDomain {
        domain: raw.to_string(),
        reason: reason.to_string(),
    };

    let lowered = raw.trim().to_ascii_lowercase();
    let host = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered)
        .trim_end_matches('/');

    if host.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if host.len() > MAX_SHOP_DOMAIN_LEN {
        return Err(invalid("too long"));
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(invalid("only letters, digits, '.' and '-' are allowed"));
    }
    if !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
        return Err(invalid("expected a host name such as example.myshopify.com"));
    }

    Ok(host.to_string())
}
