//! Display-mode detection.
//!
//! Hosts report how the page is being rendered; the probe condenses that into
//! the single "standalone" answer the tracker cares about. Standalone means
//! the app was launched from an installed icon rather than a browser tab.

/// Answers whether the app is currently running in standalone (installed)
/// mode. Pure and synchronous; evaluate once per page context.
pub trait DisplayModeProbe {
    fn is_standalone(&self) -> bool;
}

/// Probe built from host-reported signals: the CSS `display-mode` media value
/// and the vendor-specific iOS `navigator.standalone` flag.
#[derive(Debug, Clone)]
pub struct HostDisplayMode {
    display_mode: String,
    ios_standalone: bool,
}

impl HostDisplayMode {
    pub fn new(display_mode: impl Into<String>, ios_standalone: bool) -> Self {
        Self {
            display_mode: display_mode.into(),
            ios_standalone,
        }
    }
}

impl DisplayModeProbe for HostDisplayMode {
    fn is_standalone(&self) -> bool {
        self.display_mode.eq_ignore_ascii_case("standalone") || self.ios_standalone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_display_mode() {
        assert!(HostDisplayMode::new("standalone", false).is_standalone());
    }

    #[test]
    fn test_browser_display_mode() {
        assert!(!HostDisplayMode::new("browser", false).is_standalone());
    }

    #[test]
    fn test_minimal_ui_is_not_standalone() {
        assert!(!HostDisplayMode::new("minimal-ui", false).is_standalone());
    }

    #[test]
    fn test_ios_flag_overrides_display_mode() {
        assert!(HostDisplayMode::new("browser", true).is_standalone());
    }

    #[test]
    fn test_display_mode_is_case_insensitive() {
        assert!(HostDisplayMode::new("Standalone", false).is_standalone());
    }
}
