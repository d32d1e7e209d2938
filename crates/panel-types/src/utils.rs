//! Utility functions

use rand::RngExt;

pub const SAFE: [char; 62] = [
	'0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
	'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
	'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
	'V', 'W', 'X', 'Y', 'Z',
];

/// Random alphanumeric string of `len` characters
pub fn random_string(len: usize) -> String {
	let mut rng = rand::rng();
	(0..len).map(|_| SAFE[rng.random_range(0..SAFE.len())]).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_random_string() {
		let s = random_string(64);
		assert_eq!(s.len(), 64);
		assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(random_string(64), s);
		assert!(random_string(0).is_empty());
	}
}

// vim: ts=4
