//! Human-readable device labels derived from the user agent.
//!
//! Best-effort vendor sniffing for the optional `device_name` beacon field.
//! Order matters: more specific vendor strings come before generic platform
//! ones (a Redmi phone's agent also contains "Linux").

/// Checked in order; first match wins.
const VENDOR_LABELS: &[(&str, &str)] = &[
    ("poco", "POCO Device"),
    ("redmi", "Redmi Device"),
    ("xiaomi", "Xiaomi Device"),
    ("oneplus", "OnePlus Device"),
    ("samsung", "Samsung Device"),
    ("oppo", "Oppo Device"),
    ("vivo", "Vivo Device"),
    ("realme", "Realme Device"),
    ("iphone", "iPhone"),
    ("ipad", "iPad"),
    ("windows", "Windows PC/Laptop"),
    ("macintosh", "MacBook / iMac"),
    ("linux", "Linux Device"),
];

/// Maps a user-agent string to a readable device label, or `None` when no
/// vendor is recognized (the beacon then omits `device_name`).
pub fn device_label(user_agent: &str) -> Option<&'static str> {
    let ua = user_agent.to_ascii_lowercase();
    VENDOR_LABELS
        .iter()
        .find(|(needle, _)| ua.contains(needle))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redmi_agent() {
        let ua = "Mozilla/5.0 (Linux; Android 13; Redmi Note 12) AppleWebKit/537.36";
        assert_eq!(device_label(ua), Some("Redmi Device"));
    }

    #[test]
    fn test_iphone_agent() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(device_label(ua), Some("iPhone"));
    }

    #[test]
    fn test_windows_agent() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
        assert_eq!(device_label(ua), Some("Windows PC/Laptop"));
    }

    #[test]
    fn test_vendor_beats_platform() {
        // Android agents also contain "Linux"; the vendor label must win.
        let ua = "Mozilla/5.0 (Linux; Android 14; OnePlus 12)";
        assert_eq!(device_label(ua), Some("OnePlus Device"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(device_label("SAMSUNG SM-S918B"), Some("Samsung Device"));
    }

    #[test]
    fn test_unknown_agent_is_none() {
        assert_eq!(device_label("curl/8.4.0"), None);
    }
}
