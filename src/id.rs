//! Video identifier parsing.
//!
//! Input lines are either bare identifiers (`dQw4w9WgXcQ`) or URLs in one of
//! the shapes YouTube hands out. Everything is reduced to a [`VideoId`].

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Hosts that serve `/watch?v=`, `/embed/`, `/shorts/`, `/live/` and `/v/` pages.
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

const SHORT_LINK_HOST: &str = "youtu.be";

/// Path prefixes whose next segment is the video identifier.
const ID_PATH_PREFIXES: &[&str] = &["embed", "shorts", "live", "v"];

/// Canonical identifier of one video.
///
/// Always non-empty and free of path separators and whitespace, so it can be
/// embedded in a file name and searched for in one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Wraps an already-extracted identifier, checking the invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `id` is empty or contains a
    /// path separator, whitespace or a control character.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(invalid(&id, "identifier is empty"));
        }
        if id.contains(['/', '\\']) {
            return Err(invalid(&id, "identifier contains a path separator"));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid(&id, "identifier contains whitespace"));
        }
        Ok(Self(id))
    }

    /// Parses a bare identifier or a YouTube URL.
    ///
    /// Text without a `://` scheme separator is treated as a bare identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] when a URL matches none of the
    /// known shapes, or a bare token breaks the identifier invariant.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if !text.contains("://") {
            return Self::new(text);
        }

        let url = Url::parse(text).map_err(|e| invalid(text, &format!("malformed URL: {e}")))?;
        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| invalid(text, "URL has no host"))?;

        let candidate = if host == SHORT_LINK_HOST {
            first_segment(&url)
        } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
            id_from_youtube_url(&url)
        } else {
            return Err(invalid(text, "not a YouTube URL"));
        };

        match candidate {
            Some(id) => Self::new(id).map_err(|_| invalid(text, "URL carries a malformed identifier")),
            None => Err(invalid(text, "URL does not point at a single video")),
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the canonical watch-page URL for this video.
    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes one line of an id list. Blank lines yield `None`.
#[must_use]
pub fn normalize_line(line: &str) -> Option<Result<VideoId>> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(VideoId::parse(line))
    }
}

/// Normalizes every non-blank line of `text`, keeping 1-based line numbers.
#[must_use]
pub fn parse_id_list(text: &str) -> Vec<(usize, Result<VideoId>)> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| normalize_line(line).map(|res| (idx + 1, res)))
        .collect()
}

fn id_from_youtube_url(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|v| !v.is_empty()),
        prefix if ID_PATH_PREFIXES.contains(&prefix) => segments.next().map(str::to_string),
        _ => None,
    }
}

fn first_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn invalid(input: &str, reason: &str) -> Error {
    Error::InvalidIdentifier {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> String {
        VideoId::parse(text).unwrap().to_string()
    }

    fn is_invalid(text: &str) -> bool {
        matches!(VideoId::parse(text), Err(Error::InvalidIdentifier { .. }))
    }

    // --- bare identifiers ---

    #[test]
    fn bare_id_is_accepted_as_is() {
        assert_eq!(id("abc123"), "abc123");
        assert_eq!(id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn bare_id_is_trimmed() {
        assert_eq!(id("  abc123\t"), "abc123");
    }

    #[test]
    fn bare_id_starting_with_http_is_not_a_url() {
        assert_eq!(id("httpXYZ_12-"), "httpXYZ_12-");
    }

    #[test]
    fn bare_id_with_separator_is_rejected() {
        assert!(is_invalid("foo/bar"));
        assert!(is_invalid("foo\\bar"));
        assert!(is_invalid("www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn bare_id_with_inner_space_is_rejected() {
        assert!(is_invalid("abc 123"));
    }

    // --- URL shapes ---

    #[test]
    fn watch_url() {
        assert_eq!(id("https://www.youtube.com/watch?v=def456"), "def456");
        assert_eq!(id("https://youtube.com/watch?v=def456&t=42s"), "def456");
        assert_eq!(id("http://m.youtube.com/watch?feature=share&v=def456"), "def456");
        assert_eq!(id("https://music.youtube.com/watch?v=def456&list=RD"), "def456");
    }

    #[test]
    fn short_link() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ?si=xyz"), "dQw4w9WgXcQ");
    }

    #[test]
    fn embed_and_friends() {
        assert_eq!(id("https://www.youtube.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://youtube.com/shorts/abcDEF12345"), "abcDEF12345");
        assert_eq!(id("https://www.youtube.com/live/abcDEF12345?feature=x"), "abcDEF12345");
        assert_eq!(id("https://www.youtube.com/v/abcDEF12345"), "abcDEF12345");
    }

    #[test]
    fn host_is_case_insensitive() {
        assert_eq!(id("https://WWW.YouTube.com/watch?v=def456"), "def456");
    }

    #[test]
    fn unrecognized_urls_are_rejected() {
        assert!(is_invalid("https://example.com/watch?v=def456"));
        assert!(is_invalid("https://www.youtube.com/watch"));
        assert!(is_invalid("https://www.youtube.com/watch?v="));
        assert!(is_invalid("https://www.youtube.com/@SomeChannel"));
        assert!(is_invalid("https://www.youtube.com/playlist?list=PL123"));
        assert!(is_invalid("https://youtu.be/"));
        assert!(is_invalid("https://www.youtube.com/embed/"));
        assert!(is_invalid("https://"));
    }

    #[test]
    fn watch_url_round_trip() {
        let vid = VideoId::new("def456").unwrap();
        assert_eq!(vid.watch_url(), "https://www.youtube.com/watch?v=def456");
        assert_eq!(VideoId::parse(&vid.watch_url()).unwrap(), vid);
    }

    // --- line handling ---

    #[test]
    fn blank_lines_are_discarded() {
        assert!(normalize_line("").is_none());
        assert!(normalize_line("   \t").is_none());
    }

    #[test]
    fn parse_id_list_keeps_line_numbers() {
        let text = "abc123\nhttps://www.youtube.com/watch?v=def456\n\nhttps://example.com/x\n";
        let parsed = parse_id_list(text);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].0, 1);
        assert_eq!(parsed[0].1.as_ref().unwrap().as_str(), "abc123");
        assert_eq!(parsed[1].1.as_ref().unwrap().as_str(), "def456");
        assert_eq!(parsed[2].0, 4);
        assert!(parsed[2].1.is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bare_ids_are_returned_unchanged(raw in "[A-Za-z0-9_-]{1,20}") {
                let parsed = VideoId::parse(&raw).unwrap();
                prop_assert_eq!(parsed.as_str(), raw.as_str());
            }

            #[test]
            fn watch_urls_yield_their_id(raw in "[A-Za-z0-9_-]{11}") {
                let url = format!("https://www.youtube.com/watch?v={raw}");
                let parsed = VideoId::parse(&url).unwrap();
                prop_assert_eq!(parsed.as_str(), raw.as_str());
            }

            #[test]
            fn parse_never_panics(text in "\\PC*") {
                let _ = VideoId::parse(&text);
            }

            #[test]
            fn accepted_ids_hold_the_invariant(text in "\\PC*") {
                if let Ok(id) = VideoId::parse(&text) {
                    prop_assert!(!id.as_str().is_empty());
                    prop_assert!(!id.as_str().contains(['/', '\\']));
                }
            }
        }
    }
}
