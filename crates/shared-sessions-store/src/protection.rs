//! Cookie protection
//!
//! Session keys travel to the browser signed with a per-purpose HMAC-SHA256
//! subkey. Every server that shares the master key (a shared secret or a
//! shared key file) accepts the others' cookies.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::path::Path;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Purpose shared by every component that reads or writes the session cookie
pub const SESSION_COOKIE_PURPOSE: &str = "SessionMiddleware";

const TAG_LEN: usize = 32;
const MASTER_KEY_LEN: usize = 32;

/// Standard alphabet, no `=` padding written, padding tolerated on read
const COOKIE_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ProtectionError {
	/// Payload was malformed or its signature did not verify
	#[error("Invalid protected payload: {0}")]
	InvalidPayload(String),

	#[error("Invalid key: {0}")]
	InvalidKey(String),

	#[error("Key file error: {0}")]
	KeyFile(String),
}

/// Signs and verifies payloads for one purpose
pub trait DataProtector: Send + Sync {
	fn protect(&self, plaintext: &[u8]) -> Vec<u8>;

	fn unprotect(&self, protected: &[u8]) -> Result<Vec<u8>, ProtectionError>;
}

/// Hands out protectors isolated by purpose string
pub trait DataProtectionProvider: Send + Sync {
	fn create_protector(&self, purpose: &str) -> Result<Arc<dyn DataProtector>, ProtectionError>;
}

/// HMAC-SHA256 protection provider
///
/// # Examples
///
/// ```
/// use shared_sessions_store::protection::{
///     DataProtectionProvider, HmacProtectionProvider, SESSION_COOKIE_PURPOSE,
/// };
///
/// let provider = HmacProtectionProvider::new(b"a shared secret of enough length!").unwrap();
/// let protector = provider.create_protector(SESSION_COOKIE_PURPOSE).unwrap();
///
/// let signed = protector.protect(b"session-key");
/// assert_eq!(protector.unprotect(&signed).unwrap(), b"session-key");
/// ```
#[derive(Clone)]
pub struct HmacProtectionProvider {
	master: HmacSha256,
}

impl HmacProtectionProvider {
	pub fn new(master_key: impl AsRef<[u8]>) -> Result<Self, ProtectionError> {
		let master_key = master_key.as_ref();
		if master_key.is_empty() {
			return Err(ProtectionError::InvalidKey(
				"master key must not be empty".to_string(),
			));
		}
		let master = HmacSha256::new_from_slice(master_key)
			.map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;
		Ok(Self { master })
	}

	/// Load the master key from `path`, creating it with random bytes if missing
	pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self, ProtectionError> {
		let path = path.as_ref();

		let key = if path.exists() {
			let key = std::fs::read(path).map_err(|e| {
				ProtectionError::KeyFile(format!("Failed to read {}: {}", path.display(), e))
			})?;
			if key.len() < MASTER_KEY_LEN {
				return Err(ProtectionError::KeyFile(format!(
					"{} holds {} bytes, expected at least {}",
					path.display(),
					key.len(),
					MASTER_KEY_LEN
				)));
			}
			key
		} else {
			let mut key = vec![0u8; MASTER_KEY_LEN];
			OsRng.fill_bytes(&mut key);
			if let Some(parent) = path.parent()
				&& !parent.as_os_str().is_empty()
			{
				std::fs::create_dir_all(parent).map_err(|e| {
					ProtectionError::KeyFile(format!(
						"Failed to create {}: {}",
						parent.display(),
						e
					))
				})?;
			}
			std::fs::write(path, &key).map_err(|e| {
				ProtectionError::KeyFile(format!("Failed to write {}: {}", path.display(), e))
			})?;
			tracing::info!(path = %path.display(), "generated new cookie protection key");
			key
		};

		Self::new(key)
	}
}

impl DataProtectionProvider for HmacProtectionProvider {
	fn create_protector(&self, purpose: &str) -> Result<Arc<dyn DataProtector>, ProtectionError> {
		let mut derive = self.master.clone();
		derive.update(purpose.as_bytes());
		let subkey = derive.finalize().into_bytes();

		let mac = HmacSha256::new_from_slice(&subkey)
			.map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;
		Ok(Arc::new(HmacProtector { mac }))
	}
}

struct HmacProtector {
	mac: HmacSha256,
}

impl HmacProtector {
	fn tag(&self, payload: &[u8]) -> Vec<u8> {
		let mut mac = self.mac.clone();
		mac.update(payload);
		mac.finalize().into_bytes().to_vec()
	}
}

impl DataProtector for HmacProtector {
	fn protect(&self, plaintext: &[u8]) -> Vec<u8> {
		let mut protected = plaintext.to_vec();
		protected.extend_from_slice(&self.tag(plaintext));
		protected
	}

	fn unprotect(&self, protected: &[u8]) -> Result<Vec<u8>, ProtectionError> {
		if protected.len() < TAG_LEN {
			return Err(ProtectionError::InvalidPayload(
				"payload shorter than its signature".to_string(),
			));
		}
		let (payload, tag) = protected.split_at(protected.len() - TAG_LEN);

		if bool::from(self.tag(payload).ct_eq(tag)) {
			Ok(payload.to_vec())
		} else {
			Err(ProtectionError::InvalidPayload(
				"signature mismatch".to_string(),
			))
		}
	}
}

/// Cookie value for a session key: base64 of the signed key, without padding
pub fn protect_cookie_value(protector: &dyn DataProtector, session_key: &str) -> String {
	COOKIE_ENGINE.encode(protector.protect(session_key.as_bytes()))
}

/// Session key carried by a cookie value
pub fn unprotect_cookie_value(
	protector: &dyn DataProtector,
	cookie_value: &str,
) -> Result<String, ProtectionError> {
	let protected = COOKIE_ENGINE
		.decode(cookie_value)
		.map_err(|e| ProtectionError::InvalidPayload(format!("not base64: {}", e)))?;
	let key = protector.unprotect(&protected)?;
	String::from_utf8(key)
		.map_err(|_| ProtectionError::InvalidPayload("session key is not UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn provider() -> HmacProtectionProvider {
		HmacProtectionProvider::new("0123456789abcdef0123456789abcdef").unwrap()
	}

	#[rstest]
	fn test_cookie_value_round_trip(provider: HmacProtectionProvider) {
		let protector = provider.create_protector(SESSION_COOKIE_PURPOSE).unwrap();

		let cookie = protect_cookie_value(protector.as_ref(), "3f2a9c1e-0000-4000-8000-000000000000");

		assert!(!cookie.ends_with('='));
		assert_eq!(
			unprotect_cookie_value(protector.as_ref(), &cookie).unwrap(),
			"3f2a9c1e-0000-4000-8000-000000000000"
		);
	}

	#[rstest]
	fn test_purposes_are_isolated(provider: HmacProtectionProvider) {
		let cookies = provider.create_protector(SESSION_COOKIE_PURPOSE).unwrap();
		let other = provider.create_protector("Antiforgery").unwrap();

		let signed = cookies.protect(b"key");

		assert!(other.unprotect(&signed).is_err());
	}

	#[rstest]
	fn test_servers_sharing_a_secret_accept_each_other(provider: HmacProtectionProvider) {
		let peer = HmacProtectionProvider::new("0123456789abcdef0123456789abcdef").unwrap();
		let stranger = HmacProtectionProvider::new("ffffffffffffffffffffffffffffffff").unwrap();
		let signed = provider
			.create_protector(SESSION_COOKIE_PURPOSE)
			.unwrap()
			.protect(b"key");

		let by_peer = peer.create_protector(SESSION_COOKIE_PURPOSE).unwrap();
		let by_stranger = stranger.create_protector(SESSION_COOKIE_PURPOSE).unwrap();

		assert_eq!(by_peer.unprotect(&signed).unwrap(), b"key");
		assert!(by_stranger.unprotect(&signed).is_err());
	}

	#[rstest]
	#[case("")]
	#[case("not*base64")]
	#[case("c2hvcnQ")]
	fn test_rejects_malformed_cookie(provider: HmacProtectionProvider, #[case] cookie: &str) {
		let protector = provider.create_protector(SESSION_COOKIE_PURPOSE).unwrap();

		assert!(unprotect_cookie_value(protector.as_ref(), cookie).is_err());
	}

	#[rstest]
	fn test_rejects_tampered_payload(provider: HmacProtectionProvider) {
		let protector = provider.create_protector(SESSION_COOKIE_PURPOSE).unwrap();
		let mut signed = protector.protect(b"victim-key");

		signed[0] ^= 0x01;

		assert!(matches!(
			protector.unprotect(&signed),
			Err(ProtectionError::InvalidPayload(_))
		));
	}

	#[rstest]
	fn test_rejects_empty_master_key() {
		assert!(HmacProtectionProvider::new("").is_err());
	}

	#[rstest]
	fn test_key_file_is_created_then_reused() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("keys").join("session.key");

		// Act
		let first = HmacProtectionProvider::from_key_file(&path).unwrap();
		let second = HmacProtectionProvider::from_key_file(&path).unwrap();

		// Assert
		assert_eq!(std::fs::read(&path).unwrap().len(), MASTER_KEY_LEN);
		let signed = first
			.create_protector(SESSION_COOKIE_PURPOSE)
			.unwrap()
			.protect(b"key");
		let verified = second
			.create_protector(SESSION_COOKIE_PURPOSE)
			.unwrap()
			.unprotect(&signed);
		assert_eq!(verified.unwrap(), b"key");
	}

	#[rstest]
	fn test_key_file_too_short() {
		let file = tempfile::NamedTempFile::new().unwrap();
		std::fs::write(file.path(), b"short").unwrap();

		assert!(matches!(
			HmacProtectionProvider::from_key_file(file.path()),
			Err(ProtectionError::KeyFile(_))
		));
	}
}
