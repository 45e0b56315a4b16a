//! Secret lookup shared by the completion service and the post source.

use keyring::Entry;
use std::env;

/// Keyring service name under which secrets are stored.
pub const KEYRING_SERVICE: &str = "post-screener";

/// Resolve a secret: explicit value, then OS keyring, then environment.
pub fn resolve_secret(explicit: Option<&str>, keyring_user: &str, env_var: &str) -> Option<String> {
    if let Some(v) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return Some(v.to_string());
    }

    // 1. Try Keyring
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, keyring_user) {
        if let Ok(secret) = entry.get_password() {
            return Some(secret);
        }
    }

    // 2. Try Environment Variable
    env::var(env_var).ok().filter(|v| !v.trim().is_empty())
}
