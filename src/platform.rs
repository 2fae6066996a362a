//! Platform detection and platform-dependent build constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system family a step can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Macos,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else {
            Platform::Linux
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Extension of link-time libraries.
    pub fn lib_ext(&self) -> &'static str {
        match self {
            Platform::Windows => "lib",
            Platform::Macos => "dylib",
            Platform::Linux => "so",
        }
    }

    /// Extension of runtime libraries.
    pub fn dll_ext(&self) -> &'static str {
        match self {
            Platform::Windows => "dll",
            Platform::Macos => "dylib",
            Platform::Linux => "so",
        }
    }

    /// Default CMake generator.
    pub fn cmake_generator(&self) -> &'static str {
        match self {
            Platform::Windows => "NMake Makefiles",
            _ => "Unix Makefiles",
        }
    }

    /// Default make program matching [`cmake_generator`](Self::cmake_generator).
    pub fn make_program(&self) -> &'static str {
        match self {
            Platform::Windows => "nmake",
            _ => "make",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Macos => "macos",
        }
    }

    /// Check whether a platform tag list admits this platform.
    ///
    /// An empty list means "all platforms".
    pub fn matches(&self, tags: &[Platform]) -> bool {
        tags.is_empty() || tags.contains(self)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" => Ok(Platform::Macos),
            _ => Err(format!("unknown platform: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tag_list_matches_everything() {
        assert!(Platform::Linux.matches(&[]));
        assert!(Platform::Windows.matches(&[]));
    }

    #[test]
    fn tag_list_restricts() {
        assert!(Platform::Windows.matches(&[Platform::Windows]));
        assert!(!Platform::Linux.matches(&[Platform::Windows]));
    }

    #[test]
    fn windows_build_constants() {
        let p = Platform::Windows;
        assert_eq!(p.lib_ext(), "lib");
        assert_eq!(p.cmake_generator(), "NMake Makefiles");
        assert_eq!(p.make_program(), "nmake");
    }

    #[test]
    fn unix_build_constants() {
        let p = Platform::Linux;
        assert_eq!(p.lib_ext(), "so");
        assert_eq!(p.cmake_generator(), "Unix Makefiles");
        assert_eq!(p.make_program(), "make");
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("Windows".parse::<Platform>(), Ok(Platform::Windows));
        assert_eq!("darwin".parse::<Platform>(), Ok(Platform::Macos));
        assert!("beos".parse::<Platform>().is_err());
    }

    #[test]
    fn deserializes_lowercase() {
        let p: Platform = serde_yaml::from_str("linux").unwrap();
        assert_eq!(p, Platform::Linux);
    }
}
