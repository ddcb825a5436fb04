//! Identifier normalization.
//!
//! Addresses and inbox ids arrive in inconsistent casing from different
//! protocol versions, so every comparison goes through [`normalize`].

/// Sigil that prefixes user mentions (`@alix`).
pub const MENTION_SIGIL: char = '@';

/// Lowercase and trim an address, inbox id, or handle.
pub fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Identifier equality after [`normalize`].
pub fn same(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Strip a leading `@` from a mention token and normalize the rest.
///
/// Returns `None` when the token is not a mention or is a bare `@`.
pub fn mention_handle(token: &str) -> Option<String> {
    let handle = token.trim().strip_prefix(MENTION_SIGIL)?;
    let handle = handle.trim_end_matches([',', '.', '!', '?', ';', ':']);
    if handle.is_empty() {
        None
    } else {
        Some(normalize(handle))
    }
}

/// Whether `token` looks like an EVM account address (`0x` + 40 hex digits).
pub fn is_address(token: &str) -> bool {
    let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}
