// Profile links — platform detection, canonical form, best-effort username.
//
// The canonical link is the identity of an account within a project.
// Usernames are display-only: they collide across platforms and change
// over time, so nothing keys on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Social platforms we track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Instagram,
    Facebook,
    Youtube,
    Threads,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Youtube,
        Platform::Threads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Youtube => "youtube",
            Platform::Threads => "threads",
        }
    }

    /// Whether profile paths are handles that ignore case.
    fn case_insensitive_path(&self) -> bool {
        matches!(self, Platform::Tiktok | Platform::Instagram | Platform::Threads)
    }

    /// Match a bare host (already stripped of `www.` / `m.`).
    fn from_host(host: &str) -> Option<Self> {
        match host {
            "tiktok.com" => Some(Platform::Tiktok),
            "instagram.com" => Some(Platform::Instagram),
            "facebook.com" | "fb.com" => Some(Platform::Facebook),
            "youtube.com" | "youtu.be" => Some(Platform::Youtube),
            "threads.net" | "threads.com" => Some(Platform::Threads),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LinkError::UnknownPlatform(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("invalid profile link {0:?}")]
    Invalid(String),

    #[error("unsupported platform for link {0:?}")]
    UnsupportedHost(String),

    #[error("unknown platform {0:?}")]
    UnknownPlatform(String),
}

/// A parsed, canonicalised profile link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    pub platform: Platform,
    /// `https://{host}{path}` with host lower-cased, `www.`/`m.` stripped,
    /// and no trailing slash. TikTok, Instagram and Threads paths are
    /// lower-cased too. Query strings are dropped except Facebook's
    /// `profile.php?id=`.
    pub canonical: String,
    pub username: Option<String>,
}

impl ProfileLink {
    pub fn parse(raw: &str) -> Result<Self, LinkError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LinkError::Invalid(raw.to_string()));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let url = Url::parse(&with_scheme).map_err(|_| LinkError::Invalid(raw.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| LinkError::Invalid(raw.to_string()))?
            .to_ascii_lowercase();
        let host = ["www.", "m.", "mobile.", "vm."]
            .iter()
            .find_map(|prefix| host.strip_prefix(prefix))
            .unwrap_or(host.as_str())
            .to_string();

        let platform =
            Platform::from_host(&host).ok_or_else(|| LinkError::UnsupportedHost(raw.to_string()))?;

        let owned: Vec<String> = url
            .path_segments()
            .map(|s| {
                s.filter(|seg| !seg.is_empty())
                    .map(|seg| {
                        if platform.case_insensitive_path() {
                            seg.to_lowercase()
                        } else {
                            seg.to_string()
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        let segments: Vec<&str> = owned.iter().map(String::as_str).collect();

        let facebook_id = if platform == Platform::Facebook
            && segments.first() == Some(&"profile.php")
        {
            url.query_pairs()
                .find(|(k, _)| k == "id")
                .map(|(_, v)| v.into_owned())
        } else {
            None
        };

        let path = if segments.is_empty() {
            String::new()
        } else {
            format!("/{}", segments.join("/"))
        };
        let canonical = match &facebook_id {
            Some(id) => format!("https://{host}{path}?id={id}"),
            None => format!("https://{host}{path}"),
        };

        let username = facebook_id.or_else(|| username_from_segments(platform, &segments));

        Ok(Self {
            platform,
            canonical,
            username,
        })
    }
}

/// Canonicalise a link for matching, falling back to the trimmed input
/// when it isn't a recognised profile link.
pub fn match_key(raw: &str) -> String {
    ProfileLink::parse(raw)
        .map(|link| link.canonical)
        .unwrap_or_else(|_| raw.trim().trim_end_matches('/').to_string())
}

fn username_from_segments(platform: Platform, segments: &[&str]) -> Option<String> {
    match platform {
        Platform::Tiktok | Platform::Threads => segments.iter().find_map(|s| at_handle(s)),
        Platform::Youtube => match segments {
            [first, ..] if first.starts_with('@') => at_handle(first),
            ["channel" | "c" | "user", name, ..] => Some((*name).to_string()),
            _ => None,
        },
        Platform::Instagram => match segments.first() {
            Some(&("p" | "reel" | "reels" | "stories" | "explore" | "tv")) | None => None,
            Some(name) => Some((*name).to_string()),
        },
        Platform::Facebook => match segments.first() {
            Some(&("pages" | "groups" | "watch" | "share")) | None => None,
            Some(name) => Some((*name).to_string()),
        },
    }
}

fn at_handle(segment: &str) -> Option<String> {
    segment
        .strip_prefix('@')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
