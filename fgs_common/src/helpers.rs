/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recognised_flags() {
        for v in ["1", "true", "YES", " on "] {
            assert!(parse_boolean_flag(Some(v.to_string()), false));
        }
        for v in ["0", "false", "No", "off"] {
            assert!(!parse_boolean_flag(Some(v.to_string()), true));
        }
    }

    #[test]
    fn garbage_and_absence_fall_back_to_default() {
        assert!(parse_boolean_flag(None, true));
        assert!(!parse_boolean_flag(None, false));
        assert!(parse_boolean_flag(Some("maybe".to_string()), true));
    }
}
