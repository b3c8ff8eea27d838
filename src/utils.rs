use sha2::{Digest, Sha256};

/// Split a full name into (first, last).
///
/// The last whitespace-delimited token is the last name; everything before it
/// is the first name. A single token yields an empty last name, which also
/// covers names written without spaces (e.g. CJK names).
pub fn split_name(full_name: &str) -> (String, String) {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.split_last() {
        None => (String::new(), String::new()),
        Some((only, [])) => (only.to_string(), String::new()),
        Some((last, rest)) => (rest.join(" "), last.to_string()),
    }
}

/// Short, stable fingerprint of a value for log correlation without leaking PII.
pub fn hash_for_log(value: &str) -> String {
    let digest = Sha256::digest(value.trim().to_lowercase().as_bytes());
    hex::encode(&digest[..6])
}
