//! Phone numbers are the de-duplication key for clients, so every write path
//! must normalize them the same way before touching the database.

/// Strips everything but ASCII digits. Idempotent.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
