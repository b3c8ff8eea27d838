//! Human-scannable tracking tokens: `CON-lx3k9q2a-4f8k2m1z`.

use chrono::Utc;
use uuid::Uuid;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_WIDTH: u32 = 8;

/// Generate a reference id for a lead of the given type.
///
/// Format: `<PREFIX>-<base36 epoch millis>-<base36 random>`. The prefix is the
/// first three letters of the type, upper-cased and padded with `X`.
pub fn generate(lead_type: &str) -> String {
    let timestamp = Utc::now().timestamp_millis().max(0) as u128;
    let random = Uuid::new_v4().as_u128() % 36u128.pow(RANDOM_WIDTH);

    format!(
        "{}-{}-{:0>width$}",
        prefix(lead_type),
        to_base36(timestamp),
        to_base36(random),
        width = RANDOM_WIDTH as usize
    )
}

fn prefix(lead_type: &str) -> String {
    let mut prefix: String = lead_type
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    prefix
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn test_prefix_per_lead_type() {
        assert!(generate("contact").starts_with("CON-"));
        assert!(generate("product").starts_with("PRO-"));
        assert!(generate("newsletter").starts_with("NEW-"));
        assert!(generate("ab").starts_with("ABX-"));
    }

    #[test]
    fn test_shape() {
        let re = Regex::new(r"^[A-Z]{3}-[a-z0-9]+-[a-z0-9]+$").unwrap();
        for lead_type in ["contact", "product", "newsletter"] {
            let id = generate(lead_type);
            assert!(re.is_match(&id), "unexpected id shape: {}", id);
        }
    }

    #[test]
    fn test_hundred_generations_are_distinct() {
        let ids: HashSet<String> = (0..100).map(|_| generate("contact")).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }
}
