//! Session key generation

use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Uuid;

/// Number of random bytes behind a session key
pub const SESSION_KEY_BYTES: usize = 16;

/// Generate an unpredictable session key
///
/// 128 bits from the operating system CSPRNG, rendered as a hyphenated
/// UUID string. Holding the key is the only authorization to a session.
///
/// # Examples
///
/// ```
/// use shared_sessions_store::generate_session_key;
///
/// let key = generate_session_key();
/// assert_eq!(key.len(), 36);
/// assert_ne!(key, generate_session_key());
/// ```
pub fn generate_session_key() -> String {
	let mut bytes = [0u8; SESSION_KEY_BYTES];
	OsRng.fill_bytes(&mut bytes);
	Uuid::from_bytes(bytes).to_string()
}

/// Shortened form of a key for log output
pub fn key_prefix(key: &str) -> &str {
	key.get(..8).unwrap_or(key)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashSet;

	#[rstest]
	fn test_keys_are_canonical_uuids() {
		let key = generate_session_key();

		let parsed = Uuid::parse_str(&key).unwrap();

		assert_eq!(parsed.hyphenated().to_string(), key);
	}

	#[rstest]
	fn test_keys_do_not_repeat() {
		let keys: HashSet<String> = (0..1000).map(|_| generate_session_key()).collect();

		assert_eq!(keys.len(), 1000);
	}

	#[rstest]
	#[case("0123456789abcdef", "01234567")]
	#[case("abc", "abc")]
	#[case("", "")]
	fn test_key_prefix(#[case] key: &str, #[case] expected: &str) {
		assert_eq!(key_prefix(key), expected);
	}
}
