//! Webhook signatures of the form `t=<timestamp>,v1=<hex hmac-sha256>`.
//!
//! The signed message is `"<timestamp>."` followed by the raw request body exactly as received.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Values above this are read as milliseconds rather than seconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
	pub timestamp: &'a str,
	pub digest: &'a str,
}

/// Returns `None` when a part lacks `=` or when `t` or `v1` is missing or empty.
pub fn parse_header(header: &str) -> Option<SignatureHeader<'_>> {
	let mut timestamp = None;
	let mut digest = None;

	for part in header.split(',') {
		let (key, value) = part.split_once('=')?;

		match key {
			"t" => timestamp = Some(value),
			"v1" => digest = Some(value),
			_ => {},
		}
	}

	let timestamp = timestamp.filter(|value| !value.is_empty())?;
	let digest = digest.filter(|value| !value.is_empty())?;

	Some(SignatureHeader { timestamp, digest })
}

pub fn verify(header: &str, body: &[u8], secret: &str) -> bool {
	let Some(parsed) = parse_header(header) else {
		return false;
	};

	verify_parts(&parsed, body, secret)
}

pub fn verify_parts(parsed: &SignatureHeader<'_>, body: &[u8], secret: &str) -> bool {
	let Ok(provided) = hex::decode(parsed.digest) else {
		return false;
	};

	// Only the canonical lowercase encoding is accepted.
	if hex::encode(&provided) != parsed.digest {
		return false;
	}

	let Ok(mac) = signed_mac(parsed.timestamp, body, secret) else {
		return false;
	};

	mac.verify_slice(&provided).is_ok()
}

/// Hex digest for `timestamp` and `body`, as the sender computes it.
pub fn sign(timestamp: &str, body: &[u8], secret: &str) -> String {
	match signed_mac(timestamp, body, secret) {
		Ok(mac) => hex::encode(mac.finalize().into_bytes()),
		Err(_) => String::new(),
	}
}

pub fn header_value(timestamp: &str, body: &[u8], secret: &str) -> String {
	format!("t={timestamp},v1={}", sign(timestamp, body, secret))
}

/// Whether the signed timestamp lies within `tolerance_seconds` of `now_unix`.
pub fn timestamp_within(timestamp: &str, now_unix: i64, tolerance_seconds: u64) -> bool {
	let Ok(mut value) = timestamp.parse::<i64>() else {
		return false;
	};

	if value > MILLIS_THRESHOLD {
		value /= 1_000;
	}

	now_unix.abs_diff(value) <= tolerance_seconds
}

fn signed_mac(
	timestamp: &str,
	body: &[u8],
	secret: &str,
) -> Result<HmacSha256, hmac::digest::InvalidLength> {
	let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;

	mac.update(timestamp.as_bytes());
	mac.update(b".");
	mac.update(body);

	Ok(mac)
}

#[cfg(test)]
mod tests {
	use super::*;

	const SECRET: &str = "whsec_test";
	const BODY: &[u8] = br#"{"type":"webset.item.enriched","websetId":"ws_1"}"#;

	#[test]
	fn accepts_correct_signature() {
		let header = header_value("1700000000", BODY, SECRET);

		assert!(verify(&header, BODY, SECRET));
	}

	#[test]
	fn rejects_any_single_byte_body_mutation() {
		let header = header_value("1700000000", BODY, SECRET);

		for index in 0..BODY.len() {
			let mut mutated = BODY.to_vec();

			mutated[index] ^= 0x01;

			assert!(!verify(&header, &mutated, SECRET), "mutation at {index} was accepted");
		}
	}

	#[test]
	fn rejects_any_single_byte_digest_mutation() {
		let digest = sign("1700000000", BODY, SECRET);

		for index in 0..digest.len() {
			let mut bytes = digest.clone().into_bytes();

			bytes[index] = if bytes[index] == b'0' { b'1' } else { b'0' };

			let mutated = String::from_utf8(bytes).expect("Hex stays ASCII.");
			let header = format!("t=1700000000,v1={mutated}");

			assert!(!verify(&header, BODY, SECRET), "mutation at {index} was accepted");
		}
	}

	#[test]
	fn rejects_uppercase_digest() {
		let digest = sign("1700000000", BODY, SECRET).to_uppercase();
		let header = format!("t=1700000000,v1={digest}");

		assert!(!verify(&header, BODY, SECRET));
	}

	#[test]
	fn rejects_wrong_secret_and_wrong_timestamp() {
		let header = header_value("1700000000", BODY, SECRET);
		let digest = sign("1700000000", BODY, SECRET);

		assert!(!verify(&header, BODY, "other"));
		assert!(!verify(&format!("t=1700000001,v1={digest}"), BODY, SECRET));
	}

	#[test]
	fn malformed_headers_return_false() {
		let digest = sign("1", BODY, SECRET);

		for header in [
			String::new(),
			"garbage".to_string(),
			format!("v1={digest}"),
			"t=1".to_string(),
			format!("t=1,v1={digest},junk"),
			format!("t=,v1={digest}"),
			"t=1,v1=".to_string(),
			"t=1,v1=zz".to_string(),
			format!("t=1, v1={digest}"),
		] {
			assert!(!verify(&header, BODY, SECRET), "header {header:?} was accepted");
		}
	}

	#[test]
	fn value_may_contain_equals_sign() {
		let parsed = parse_header("t=1=2,v1=ab").expect("Header should parse.");

		assert_eq!(parsed.timestamp, "1=2");
		assert_eq!(parsed.digest, "ab");
	}

	#[test]
	fn later_duplicate_keys_win() {
		let digest = sign("2", BODY, SECRET);
		let header = format!("t=1,t=2,v1={digest}");

		assert!(verify(&header, BODY, SECRET));
	}

	#[test]
	fn timestamp_tolerance_accepts_seconds_and_millis() {
		assert!(timestamp_within("1700000000", 1_700_000_100, 300));
		assert!(timestamp_within("1700000000000", 1_700_000_100, 300));
		assert!(!timestamp_within("1700000000", 1_700_001_000, 300));
		assert!(!timestamp_within("soon", 1_700_000_000, 300));
	}
}
