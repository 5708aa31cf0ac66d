//! Platform identity for runtime gating and key resolution.
//!
//! Resolved once per call and passed explicitly into each execution strategy,
//! so platform-dependent paths are unit-testable without process-global
//! mocking.

/// Host platform family as the engine sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Platform::Linux
        }
    }

    /// macOS-like hosts run AppleScript and map the `cmd` family to Command.
    pub fn is_macos_like(self) -> bool {
        matches!(self, Platform::MacOS)
    }

    /// Windows-like hosts run PowerShell and reject Bash.
    pub fn is_windows_like(self) -> bool {
        matches!(self, Platform::Windows)
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gating_families_are_disjoint() {
        for platform in [Platform::MacOS, Platform::Windows, Platform::Linux] {
            assert!(!(platform.is_macos_like() && platform.is_windows_like()));
        }
        assert!(Platform::MacOS.is_macos_like());
        assert!(Platform::Windows.is_windows_like());
        assert!(!Platform::Linux.is_macos_like());
        assert!(!Platform::Linux.is_windows_like());
    }

    #[test]
    fn current_matches_compile_target() {
        let name = Platform::current().name();
        assert!(["macos", "windows", "linux"].contains(&name));
    }
}
