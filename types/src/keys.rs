//! State key conventions.
//!
//! The ledger program publishes flat key/value state; structure lives in the
//! key names. The conventions mirrored here:
//!
//! - `user_<addr>` — per-user account entry (balances, flags).
//! - `friend_<addr>_<date>` — one referral edge credited to `<addr>`.
//! - `variables` — governance-derived program parameters.
//! - `constants` — immutable program constants, required at startup.

/// Prefix of per-user account entries.
pub const USER_PREFIX: &str = "user_";

/// Prefix of referral-edge entries.
pub const FRIEND_PREFIX: &str = "friend_";

/// Key holding the governance-derived program parameters.
pub const VARIABLES_KEY: &str = "variables";

/// Key holding the immutable program constants.
pub const CONSTANTS_KEY: &str = "constants";

/// Extract the address from a `user_<addr>` key.
pub fn user_address(key: &str) -> Option<&str> {
    key.strip_prefix(USER_PREFIX).filter(|rest| !rest.is_empty())
}

/// Extract the credited address from a `friend_<addr>_<date>` key.
///
/// The date suffix is everything after the last underscore; the address may
/// itself contain underscores, so the split is from the right.
pub fn friend_address(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(FRIEND_PREFIX)?;
    let (addr, _date) = rest.rsplit_once('_')?;
    if addr.is_empty() {
        None
    } else {
        Some(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_parses() {
        assert_eq!(user_address("user_ABC123"), Some("ABC123"));
        assert_eq!(user_address("user_"), None);
        assert_eq!(user_address("friend_A_2024"), None);
        assert_eq!(user_address("constants"), None);
    }

    #[test]
    fn friend_key_parses_date_from_right() {
        assert_eq!(friend_address("friend_ABC_2024-01-01"), Some("ABC"));
        // Addresses containing underscores keep everything before the date.
        assert_eq!(friend_address("friend_A_B_2024-01-01"), Some("A_B"));
        assert_eq!(friend_address("friend_2024-01-01"), None);
        assert_eq!(friend_address("friend__2024"), None);
        assert_eq!(friend_address("user_ABC"), None);
    }
}
