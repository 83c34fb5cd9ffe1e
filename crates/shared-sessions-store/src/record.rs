//! Binary layout of a persisted session record
//!
//! ```text
//! version: u8 (= 1)
//! count:   u32 BE
//! count × { name_len: u16 BE, name: UTF-8, value_len: u32 BE, value }
//! ```

use bytes::{Buf, BufMut};
use indexmap::IndexMap;

use crate::error::{Result, SessionError};

const RECORD_VERSION: u8 = 1;

/// Longest entry name the record can hold
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Largest entry value the record can hold
pub const MAX_VALUE_LEN: usize = u32::MAX as usize;

/// Most entries one record can hold
pub const MAX_ENTRIES: usize = u32::MAX as usize;

/// Reject an entry whose lengths do not fit the record's length prefixes
pub(crate) fn check_entry_size(name_len: usize, value_len: usize) -> Result<()> {
	if name_len > MAX_NAME_LEN {
		return Err(SessionError::InvalidArgument(format!(
			"entry name of {} bytes exceeds {} bytes",
			name_len, MAX_NAME_LEN
		)));
	}
	if value_len > MAX_VALUE_LEN {
		return Err(SessionError::InvalidArgument(format!(
			"entry value of {} bytes exceeds {} bytes",
			value_len, MAX_VALUE_LEN
		)));
	}
	Ok(())
}

/// Encode entries that passed [`check_entry_size`]
pub(crate) fn serialize(entries: &IndexMap<String, Vec<u8>>) -> Vec<u8> {
	let size = entries
		.iter()
		.map(|(name, value)| 2 + name.len() + 4 + value.len())
		.sum::<usize>();
	let mut buf = Vec::with_capacity(1 + 4 + size);

	buf.put_u8(RECORD_VERSION);
	buf.put_u32(entries.len() as u32);
	for (name, value) in entries {
		buf.put_u16(name.len() as u16);
		buf.put_slice(name.as_bytes());
		buf.put_u32(value.len() as u32);
		buf.put_slice(value);
	}
	buf
}

pub(crate) fn deserialize(mut buf: &[u8]) -> Result<IndexMap<String, Vec<u8>>> {
	if buf.remaining() < 5 {
		return Err(corrupt("record header truncated"));
	}
	let version = buf.get_u8();
	if version != RECORD_VERSION {
		return Err(corrupt(&format!("unknown record version {}", version)));
	}

	let count = buf.get_u32() as usize;
	let mut entries = IndexMap::with_capacity(count.min(1024));
	for _ in 0..count {
		if buf.remaining() < 2 {
			return Err(corrupt("entry name length truncated"));
		}
		let name_len = buf.get_u16() as usize;
		if buf.remaining() < name_len {
			return Err(corrupt("entry name truncated"));
		}
		let name = std::str::from_utf8(&buf[..name_len])
			.map_err(|_| corrupt("entry name is not UTF-8"))?
			.to_string();
		buf.advance(name_len);

		if buf.remaining() < 4 {
			return Err(corrupt("entry value length truncated"));
		}
		let value_len = buf.get_u32() as usize;
		if buf.remaining() < value_len {
			return Err(corrupt("entry value truncated"));
		}
		let value = buf[..value_len].to_vec();
		buf.advance(value_len);

		entries.insert(name, value);
	}

	Ok(entries)
}

fn corrupt(detail: &str) -> SessionError {
	SessionError::Store(format!("corrupt session record: {}", detail))
}
