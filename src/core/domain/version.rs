//! Backend version information.

use std::fmt;

/// Version reported by a backend binary or library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BackendVersion {
    Known { major: u64, minor: u64, patch: u64 },
    Unknown,
}

impl BackendVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self::Known {
            major,
            minor,
            patch,
        }
    }

    /// Find the first `x.y[.z]` token in `text`.
    ///
    /// Handles `gpg --version` ("gpg (GnuPG) 2.2.40") and `git --version`
    /// ("git version 2.43.0") style output. Missing components default to 0.
    pub fn parse(text: &str) -> Self {
        text.split_whitespace()
            .find_map(|token| {
                let mut parts = token.split('.');
                let major = parts.next()?.parse().ok()?;
                let minor = parts.next()?.parse().ok()?;
                let patch = parts
                    .next()
                    .map(|p| {
                        p.chars()
                            .take_while(char::is_ascii_digit)
                            .collect::<String>()
                    })
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(0);
                Some(Self::new(major, minor, patch))
            })
            .unwrap_or(Self::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }
}

impl fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known {
                major,
                minor,
                patch,
            } => write!(f, "{}.{}.{}", major, minor, patch),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
