//! User-facing strings.
//!
//! The controllers produce a handful of sentences themselves (membership
//! announcements, the kick notice). Everything else is the renderer's job.

use std::{fmt, str::FromStr};

/// Display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    /// Vietnamese, the application's original language.
    #[default]
    Vietnamese,
    /// English.
    English,
}

impl Locale {
    /// Announcement appended when a member joins.
    pub fn member_joined(self, name: &str) -> String {
        match self {
            Self::Vietnamese => format!("{name} đã tham gia phòng"),
            Self::English => format!("{name} joined the room"),
        }
    }

    /// Announcement appended when a member leaves.
    pub fn member_left(self, name: &str) -> String {
        match self {
            Self::Vietnamese => format!("{name} đã rời phòng"),
            Self::English => format!("{name} left the room"),
        }
    }

    /// Blocking notice shown after this client was kicked.
    pub fn kicked(self) -> &'static str {
        match self {
            Self::Vietnamese => "Bạn đã bị đá khỏi phòng.",
            Self::English => "You were removed from the room.",
        }
    }

    /// Fallback for server exceptions without a message.
    pub fn unknown_error(self) -> &'static str {
        match self {
            Self::Vietnamese => "Lỗi không xác định",
            Self::English => "Unknown error",
        }
    }

    /// Connection indicator while the transport is up.
    pub fn connected(self) -> &'static str {
        match self {
            Self::Vietnamese => "Đã kết nối",
            Self::English => "Connected",
        }
    }

    /// Connection indicator while the transport is down.
    pub fn disconnected(self) -> &'static str {
        match self {
            Self::Vietnamese => "Mất kết nối",
            Self::English => "Disconnected",
        }
    }

    /// Short language tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Vietnamese => "vi",
            Self::English => "en",
        }
    }
}

/// Language tag was not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale `{0}` (expected `vi` or `en`)")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" | "vi-vn" | "vietnamese" => Ok(Self::Vietnamese),
            "en" | "en-us" | "en-gb" | "english" => Ok(Self::English),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
