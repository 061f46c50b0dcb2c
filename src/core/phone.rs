use regex::Regex;
use std::sync::LazyLock;

// Mobile 05X-XXXXXXX and landline 0X-XXXXXXX, hyphen optional.
static ISRAELI_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0(?:5\d-?\d{7}|[23489]-?\d{7})$").unwrap()
});

/// Validate a phone number in local Israeli format.
pub fn validate_israeli_phone(phone: &str) -> bool {
    ISRAELI_PHONE_RE.is_match(phone.trim())
}

/// Normalize a phone number for a wa.me link: digits only, local `0`
/// prefix replaced by the international `972` prefix.
pub fn format_phone_for_whatsapp(phone: &str) -> String {
    let cleaned: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(rest) = cleaned.strip_prefix('0') {
        return format!("972{}", rest);
    }
    if cleaned.starts_with("972") {
        return cleaned;
    }
    format!("972{}", cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_mobile_numbers() {
        assert!(validate_israeli_phone("050-1234567"));
        assert!(validate_israeli_phone("0521234567"));
        assert!(validate_israeli_phone("058-7654321"));
    }

    #[test]
    fn valid_landline_numbers() {
        assert!(validate_israeli_phone("03-1234567"));
        assert!(validate_israeli_phone("041234567"));
    }

    #[test]
    fn invalid_numbers() {
        assert!(!validate_israeli_phone("12345"));
        assert!(!validate_israeli_phone("050-123"));
        assert!(!validate_israeli_phone("1501234567"));
        assert!(!validate_israeli_phone(""));
    }

    #[test]
    fn whatsapp_format_strips_local_prefix() {
        assert_eq!(format_phone_for_whatsapp("050-1234567"), "972501234567");
        assert_eq!(format_phone_for_whatsapp("972501234567"), "972501234567");
        assert_eq!(format_phone_for_whatsapp("501234567"), "972501234567");
    }
}
