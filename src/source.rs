//! Hosting-provider classification and the eligibility filter.
//!
//! Providers are matched against the host of the post URL in the order given
//! by [`ContentSource::PRIORITY`]; the first provider that matches wins.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::reddit::Post;

// Platform media hosts. Bare `redd.it` is the post shortlink service.
const NATIVE_MEDIA_HOSTS: [&str; 2] = ["v.redd.it", "i.redd.it"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Imgur,
    Gfycat,
    #[serde(rename = "reddit")]
    NativeVideo,
    Unsupported,
}

impl ContentSource {
    /// Match order used by [`classify`]. A new provider gets a slot here and
    /// an arm in [`ContentSource::matches`] and in the resolver.
    pub const PRIORITY: [ContentSource; 3] = [
        ContentSource::Gfycat,
        ContentSource::Imgur,
        ContentSource::NativeVideo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Imgur => "imgur",
            ContentSource::Gfycat => "gfycat",
            ContentSource::NativeVideo => "reddit",
            ContentSource::Unsupported => "unsupported",
        }
    }

    fn matches(&self, host: &str, post: &Post) -> bool {
        match self {
            ContentSource::Gfycat => host_is(host, "gfycat.com"),
            ContentSource::Imgur => host_is(host, "imgur.com"),
            ContentSource::NativeVideo => {
                NATIVE_MEDIA_HOSTS.contains(&host)
                    || (post.is_video && host_is(host, "reddit.com"))
            }
            ContentSource::Unsupported => false,
        }
    }
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a post to the provider that hosts its media.
pub fn classify(post: &Post) -> ContentSource {
    let Some(host) = url_host(&post.url) else {
        return ContentSource::Unsupported;
    };
    ContentSource::PRIORITY
        .into_iter()
        .find(|source| source.matches(&host, post))
        .unwrap_or(ContentSource::Unsupported)
}

/// A post is eligible when it links out to media hosted by a known provider.
pub fn is_eligible(post: &Post) -> bool {
    if post.is_self {
        return false;
    }
    classify(post) != ContentSource::Unsupported
}

pub(crate) fn url_host(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().map(|host| host.to_ascii_lowercase())
}

pub(crate) fn host_is(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
