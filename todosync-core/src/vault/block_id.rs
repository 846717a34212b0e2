//! Content-hash identifiers appended to task lines as `^ID`.

use sha2::{Digest, Sha256};

/// Width identifiers are left-padded to.
pub const BLOCK_ID_WIDTH: usize = 8;

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Identifier for a task's text: the first 64 bits of its SHA-256 in
/// upper-case base 36, zero-padded.
pub fn block_id_for(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);

    let encoded = to_base36(u64::from_be_bytes(head));
    format!("{encoded:0>width$}", width = BLOCK_ID_WIDTH)
}

/// Identifier for `text` that does not collide with `taken`.
///
/// Identical task texts in one note would otherwise share an identifier.
pub fn unique_block_id(text: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut id = block_id_for(text);
    let mut salt = 1u32;
    while taken(&id) {
        id = block_id_for(&format!("{text}\n{salt}"));
        salt += 1;
    }
    id
}

/// Whether `line` carries `^id` as a whole token.
pub fn line_has_block_id(line: &str, id: &str) -> bool {
    let marker = format!("^{id}");
    line.match_indices(&marker).any(|(start, _)| {
        !line[start + marker.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_shape() {
        let id = block_id_for("Buy milk 🛫 2024-01-01");
        assert!(id.len() >= BLOCK_ID_WIDTH);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_block_id_is_deterministic() {
        assert_eq!(block_id_for("same text"), block_id_for("same text"));
        assert_ne!(block_id_for("same text"), block_id_for("other text"));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u64::MAX), "3W5E11264SGSF");
    }

    #[test]
    fn test_unique_block_id_avoids_taken() {
        let first = block_id_for("dup");
        let second = unique_block_id("dup", |id| id == first);
        assert_ne!(first, second);
        assert_eq!(unique_block_id("dup", |_| false), first);
    }

    #[test]
    fn test_line_has_block_id_matches_whole_token() {
        assert!(line_has_block_id("- [ ] a ^AB12", "AB12"));
        assert!(!line_has_block_id("- [ ] a ^AB123", "AB12"));
        assert!(!line_has_block_id("- [ ] a AB12", "AB12"));
        assert!(line_has_block_id("- [ ] a ^AB12 #tag", "AB12"));
    }
}
