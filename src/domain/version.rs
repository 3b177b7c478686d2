//! Version tags and the revisions that carry them.
//!
//! Tags are plain `v<N>` labels embedded in commit messages. Parsing is kept
//! free of any git access so the rules can be exercised on crafted strings.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Any `v` followed by a digit run, anywhere in the text
fn allocation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"v(\d+)").expect("valid tag pattern"))
}

/// Whole-word `v<digits>`, case-insensitive
fn listing_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bv(\d+)\b").expect("valid tag pattern"))
}

/// A `v<N>` version label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(u64);

impl VersionTag {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u64 {
        self.0
    }

    /// The tag following this one, if the number space is not exhausted
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Whether `message` mentions this tag as a whole word (case-insensitive)
    pub fn appears_in(&self, message: &str) -> bool {
        tags_in(message).contains(self)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for VersionTag {
    type Err = String;

    /// Accepts exactly `v<digits>` (either case), nothing around it
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .ok_or_else(|| format!("not a version tag: {}", s))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("not a version tag: {}", s));
        }

        digits
            .parse()
            .map(Self)
            .map_err(|_| format!("version number out of range: {}", s))
    }
}

impl TryFrom<String> for VersionTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.to_string()
    }
}

/// A commit in the dashboard history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Abbreviated commit hash
    pub id: String,

    /// Commit subject line
    pub message: String,
}

impl Revision {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Parse a `git log --pretty=format:"%h %s"` line
    pub fn from_log_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (id, message) = line.split_once(' ').unwrap_or((line, ""));
        Some(Self::new(id, message.trim()))
    }

    /// Whether the message carries a version tag
    pub fn is_versioned(&self) -> bool {
        listing_pattern().is_match(&self.message)
    }

    /// First version tag mentioned in the message
    pub fn tag(&self) -> Option<VersionTag> {
        tags_in(&self.message).into_iter().next()
    }

    /// `"<hash> <message>"`, the form shown in listings
    pub fn label(&self) -> String {
        format!("{} {}", self.id, self.message)
    }
}

/// Whole-word version tags found in a message, in order of appearance
pub fn tags_in(message: &str) -> Vec<VersionTag> {
    listing_pattern()
        .captures_iter(message)
        .filter_map(|caps| caps[1].parse().ok().map(VersionTag))
        .collect()
}

/// Propose the tag after the highest one mentioned anywhere in `messages`.
///
/// Every `v<digits>` run counts, several per message included. Returns `v1`
/// when nothing matches, and fails when the highest tag is `u64::MAX`.
pub fn next_tag<I, S>(messages: I) -> Result<VersionTag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let highest = messages
        .into_iter()
        .flat_map(|message| {
            allocation_pattern()
                .captures_iter(message.as_ref())
                .filter_map(|caps| caps[1].parse::<u64>().ok())
                .collect::<Vec<_>>()
        })
        .max();

    match highest {
        None => Ok(VersionTag(1)),
        Some(max) => VersionTag(max).next().ok_or_else(|| {
            Error::Validation(format!("no version tag after {}", VersionTag(max)))
        }),
    }
}
