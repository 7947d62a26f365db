//! Game configuration constants
//!
//! Seed vote ranges and CAPTCHA parameters.

/// Minimum seed votes per category for a newly published review
pub const SEED_VOTES_MIN: i32 = 10;

/// Maximum seed votes per category for a newly published review
pub const SEED_VOTES_MAX: i32 = 20;

/// Upper bound per category when an admin re-seeds every review
pub const RESEED_VOTES_MAX: i32 = 100;

/// Characters used in CAPTCHA text. Excludes I, O, 0 and 1.
pub const CAPTCHA_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of characters in a CAPTCHA
pub const CAPTCHA_LENGTH: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_range_is_ordered() {
        assert!(SEED_VOTES_MIN > 0);
        assert!(SEED_VOTES_MIN <= SEED_VOTES_MAX);
        assert!(SEED_VOTES_MAX <= RESEED_VOTES_MAX);
    }

    #[test]
    fn captcha_alphabet_has_no_ambiguous_chars() {
        for c in ['I', 'O', '0', '1'] {
            assert!(!CAPTCHA_ALPHABET.contains(c), "{} is ambiguous", c);
        }
        assert_eq!(CAPTCHA_ALPHABET.len(), 32);
    }

    #[test]
    fn captcha_length_reasonable() {
        assert_eq!(CAPTCHA_LENGTH, 5);
    }
}
