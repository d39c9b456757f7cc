//! Platform detection
//!
//! Plugins may declare a different default scraper per platform, so the
//! resolver needs to know which one we are running on.

use std::fmt;

/// Operating systems a plugin can target with a `{PLATFORM}.DEFAULT` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Android,
    Darwin,
    Ios,
}

impl Platform {
    /// Returns the platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "macos") {
            Platform::Darwin
        } else {
            Platform::Linux
        }
    }

    /// Upper-case marker used in catalog keys such as `LINUX.DEFAULT`
    pub fn catalog_prefix(&self) -> &'static str {
        match self {
            Platform::Windows => "WINDOWS",
            Platform::Linux => "LINUX",
            Platform::Android => "ANDROID",
            Platform::Darwin => "DARWIN",
            Platform::Ios => "IOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::Android => "Android",
            Platform::Darwin => "Darwin",
            Platform::Ios => "iOS",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_prefix_is_upper_case() {
        for platform in [
            Platform::Windows,
            Platform::Linux,
            Platform::Android,
            Platform::Darwin,
            Platform::Ios,
        ] {
            let prefix = platform.catalog_prefix();
            assert_eq!(prefix, prefix.to_uppercase());
            assert_eq!(prefix.to_lowercase(), platform.to_string().to_lowercase());
        }
    }
}
