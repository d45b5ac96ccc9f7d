//! Human-shareable codes.

use rand::Rng;

/// Upper-case alphabet without look-alike characters (0/O, 1/I/L).
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Random code of `groups` blocks of `group_len` characters joined by `-`.
pub fn random_code(groups: usize, group_len: usize) -> String {
    let mut rng = rand::thread_rng();
    let blocks: Vec<String> = (0..groups)
        .map(|_| {
            (0..group_len)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect()
        })
        .collect();
    blocks.join("-")
}

/// Canonical form for user-typed codes: trimmed and upper-case.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
