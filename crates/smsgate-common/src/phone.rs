//! Phone number normalization and recipient list parsing
//!
//! Numbers are canonicalized to the `+7XXXXXXXXXX` form used across the
//! panel: the Russian mobile prefix rules collapse bare 10-digit numbers and
//! `8`-trunk dialing into the `+7` country code form. Anything the rules do
//! not recognize is passed through so callers can still display it.

use crate::types::Recipient;

/// Normalize a phone number into its canonical comparable form.
///
/// The function is pure, total and idempotent: any output fed back in comes
/// out unchanged. Short or otherwise ambiguous input is returned as-is and
/// must be treated by callers as potentially unsendable.
pub fn normalize(raw: &str) -> String {
    // Keep digits and a leading +, drop everything else
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    // Russian number normalization:
    //   9167193249  (10 digits)              -> +79167193249
    //   89167193249 (11 digits, trunk 8)     -> +79167193249
    //   79167193249 (11 digits, country 7)   -> +79167193249
    if digits.len() == 10 && digits.starts_with('9') {
        return format!("+7{}", digits);
    }

    if digits.len() == 11 {
        if let Some(rest) = digits.strip_prefix('8') {
            return format!("+7{}", rest);
        }
        if digits.starts_with('7') {
            return format!("+{}", digits);
        }
    }

    // Other formats: keep the + if it was there, or add one for anything
    // long enough to plausibly carry its own country code
    if has_plus || digits.len() >= 11 {
        return format!("+{}", digits);
    }

    digits
}

/// Parse a pasted recipient list into `(phone, name)` entries.
///
/// One recipient per line, `phone[sep]name`, with the separator detected
/// from the first line that carries one (`;`, `,` or tab). Lines without a
/// usable phone are skipped.
pub fn parse_recipients(input: &str) -> Vec<Recipient> {
    let mut recipients = Vec::new();
    let mut separator: Option<char> = None;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if separator.is_none() {
            separator = [';', ',', '\t'].iter().copied().find(|s| line.contains(*s));
        }

        let (phone_part, name_part) = match separator {
            Some(sep) => match line.split_once(sep) {
                Some((p, n)) => (p, Some(n)),
                None => (line, None),
            },
            None => (line, None),
        };

        let phone: String = phone_part
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if phone.is_empty() {
            continue;
        }

        let name = name_part
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);

        recipients.push(Recipient::new(phone, name));
    }

    recipients
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_ten_digit_mobile() {
        assert_eq!(normalize("9167193249"), "+79167193249");
        assert_eq!(normalize("916 719-32-49"), "+79167193249");
    }

    #[test]
    fn test_normalize_trunk_prefix() {
        assert_eq!(normalize("89167193249"), "+79167193249");
        assert_eq!(normalize("8 (916) 719-32-49"), "+79167193249");
    }

    #[test]
    fn test_normalize_country_code() {
        assert_eq!(normalize("79167193249"), "+79167193249");
        assert_eq!(normalize("+79167193249"), "+79167193249");
    }

    #[test]
    fn test_normalize_foreign_number_passthrough() {
        assert_eq!(normalize("+14155552671"), "+14155552671");
        assert_eq!(normalize("441632960961"), "+441632960961");
    }

    #[test]
    fn test_normalize_short_input_unchanged() {
        assert_eq!(normalize("12345"), "12345");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "9167193249",
            "89167193249",
            "79167193249",
            "+79167193249",
            "+14155552671",
            "12345",
            "sms: 8 916 719 32 49",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_parse_recipients_comma() {
        let parsed = parse_recipients("89167193249,Ivan\n9167193250,Olga\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].phone, "89167193249");
        assert_eq!(parsed[0].name.as_deref(), Some("Ivan"));
        assert_eq!(parsed[1].name.as_deref(), Some("Olga"));
    }

    #[test]
    fn test_parse_recipients_semicolon_and_blank_lines() {
        let parsed = parse_recipients("+79167193249; Ivan Petrov\n\nnot-a-number\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].phone, "+79167193249");
        assert_eq!(parsed[0].name.as_deref(), Some("Ivan Petrov"));
    }

    #[test]
    fn test_parse_recipients_bare_numbers() {
        let parsed = parse_recipients("9167193249\n9167193250");
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(|r| r.name.is_none()));
    }
}
