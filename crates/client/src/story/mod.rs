//! Story qualification and the filtered story stream.
//!
//! A fetched item qualifies when it is a `story` with a non-empty outbound
//! URL. Qualifying items gain a `host` derived from that URL.

pub mod stream;

pub use stream::StoryStream;

use qhn_core::{RawItem, Story};

/// Turn a raw item into a story if it links out.
pub fn qualify(item: RawItem) -> Option<Story> {
    if item.kind.as_deref() != Some("story") {
        return None;
    }

    let host = match item.url.as_deref() {
        Some(url) if !url.trim().is_empty() => host_name(url),
        _ => return None,
    };

    Some(Story { item, host })
}

/// Host name of `url` for display.
///
/// Normalization steps:
/// 1. Parse the URL; an unparsable URL yields an empty host
/// 2. Lowercase the host
/// 3. Strip a leading `www.`
pub fn host_name(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url.trim()) else {
        return String::new();
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: &str, url: Option<&str>) -> RawItem {
        RawItem { id: 1, kind: Some(kind.into()), url: url.map(String::from), ..Default::default() }
    }

    #[test]
    fn test_qualify_story_with_url() {
        let story = qualify(item("story", Some("https://www.Example.com/a?b=c"))).unwrap();
        assert_eq!(story.host, "example.com");
        assert_eq!(story.id(), 1);
        assert_eq!(story.url(), "https://www.Example.com/a?b=c");
    }

    #[test]
    fn test_qualify_rejects_text_posts() {
        assert!(qualify(item("story", None)).is_none());
        assert!(qualify(item("story", Some(""))).is_none());
        assert!(qualify(item("story", Some("   "))).is_none());
    }

    #[test]
    fn test_qualify_rejects_other_kinds() {
        assert!(qualify(item("job", Some("https://example.com"))).is_none());
        assert!(qualify(item("comment", Some("https://example.com"))).is_none());
        assert!(qualify(RawItem { id: 1, url: Some("https://example.com".into()), ..Default::default() }).is_none());
    }

    #[test]
    fn test_host_name_basic() {
        assert_eq!(host_name("https://github.com/rust-lang/rust"), "github.com");
    }

    #[test]
    fn test_host_name_strips_www_only_at_start() {
        assert_eq!(host_name("http://www.nytimes.com/2024/story.html"), "nytimes.com");
        assert_eq!(host_name("https://blog.www.example.com"), "blog.www.example.com");
    }

    #[test]
    fn test_host_name_lowercases() {
        assert_eq!(host_name("HTTPS://WWW.EXAMPLE.ORG/Path"), "example.org");
    }

    #[test]
    fn test_host_name_keeps_subdomain_and_drops_port() {
        assert_eq!(host_name("https://news.ycombinator.com:443/item?id=1"), "news.ycombinator.com");
    }

    #[test]
    fn test_host_name_unparsable() {
        assert_eq!(host_name("not a url"), "");
        assert_eq!(host_name(""), "");
    }
}
