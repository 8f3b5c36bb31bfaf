//! Certificate numbers and verification codes

use chrono::{DateTime, Datelike, Utc};
use coursely_core::constants::VERIFICATION_CODE_LEN;
use rand::Rng;

/// Uppercase letters and digits without the look-alikes `0 O 1 I`.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn random_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `CERT-YYYY-XXXXXXXX`
pub fn certificate_number(issued_at: DateTime<Utc>) -> String {
    format!("CERT-{}-{}", issued_at.year(), random_code(8))
}

pub fn verification_code() -> String {
    random_code(VERIFICATION_CODE_LEN)
}

/// Normalizes user-typed codes before lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_certificate_number_format() {
        let issued = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let number = certificate_number(issued);
        assert_eq!(number.len(), "CERT-2024-".len() + 8);
        assert!(number.starts_with("CERT-2024-"));
        assert!(number[10..].bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_verification_code_is_separate_and_sized() {
        let code = verification_code();
        assert_eq!(code.len(), VERIFICATION_CODE_LEN);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
        assert_ne!(code, verification_code());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  abcd2345efgh "), "ABCD2345EFGH");
    }
}
