//! Turns a post's public page URL into a direct media asset URL.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::reddit::{Post, PostMedia};
use crate::source::{host_is, url_host, ContentSource};

pub const GFYCAT_ASSET_HOST: &str = "giant.gfycat.com";
const VIDEO_EXTENSION: &str = "mp4";
const ANIMATED_IMGUR_EXTENSION: &str = ".gifv";

// Gfycat ids are CamelCase words; anything after them (`-size_restricted`,
// `-mobile`, tag slugs) is decoration.
static GFYCAT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+").expect("gfycat id regex"));

pub fn resolve(post: &Post, source: ContentSource) -> Option<String> {
    match source {
        ContentSource::Imgur => Some(imgur_video_url(&post.url)),
        ContentSource::Gfycat => gfycat_video_url(post),
        ContentSource::NativeVideo => native_fallback_url(post).map(str::to_string),
        ContentSource::Unsupported => None,
    }
}

/// `.gifv` pages have an `.mp4` twin; every other imgur URL is already direct.
pub fn imgur_video_url(raw: &str) -> String {
    let split = raw.find(['?', '#']).unwrap_or(raw.len());
    let (path, suffix) = raw.split_at(split);
    if is_animated_imgur(path) {
        let stem = &path[..path.len() - ANIMATED_IMGUR_EXTENSION.len()];
        format!("{stem}.{VIDEO_EXTENSION}{suffix}")
    } else {
        raw.to_string()
    }
}

pub(crate) fn is_animated_imgur(raw: &str) -> bool {
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    path.len()
        .checked_sub(ANIMATED_IMGUR_EXTENSION.len())
        .and_then(|start| path.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(ANIMATED_IMGUR_EXTENSION))
}

fn gfycat_video_url(post: &Post) -> Option<String> {
    let parsed = Url::parse(post.url.trim()).ok()?;
    let mut id = gfycat_id(&parsed)?;

    // Reddit sometimes lowercases the id in the post URL while the thumbnail
    // keeps the casing the asset host expects.
    if id.chars().all(|c| !c.is_ascii_uppercase()) {
        if let Some(thumb_id) = post
            .thumbnail_url()
            .filter(|thumb| url_host(thumb).is_some_and(|host| host_is(&host, "gfycat.com")))
            .and_then(|thumb| Url::parse(thumb).ok())
            .and_then(|thumb| gfycat_id(&thumb))
        {
            if thumb_id.eq_ignore_ascii_case(&id) {
                id = thumb_id;
            }
        }
    }

    Some(format!(
        "{}://{GFYCAT_ASSET_HOST}/{id}.{VIDEO_EXTENSION}",
        parsed.scheme()
    ))
}

fn gfycat_id(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;
    let stem = segment.split('.').next().unwrap_or(segment);
    GFYCAT_ID
        .find(stem)
        .map(|found| found.as_str().to_string())
}

/// Direct fallback stream for platform-hosted video. Crossposts carry the
/// media on the parent post rather than on themselves.
pub fn native_fallback_url(post: &Post) -> Option<&str> {
    fallback_from(post.media.as_ref())
        .or_else(|| fallback_from(post.secure_media.as_ref()))
        .or_else(|| {
            post.crosspost_parent_list.iter().find_map(|parent| {
                fallback_from(parent.media.as_ref())
                    .or_else(|| fallback_from(parent.secure_media.as_ref()))
            })
        })
}

fn fallback_from(media: Option<&PostMedia>) -> Option<&str> {
    let video = media?.reddit_video.as_ref()?;
    if video.fallback_url.trim().is_empty() {
        None
    } else {
        Some(video.fallback_url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::{CrosspostParent, RedditVideo};

    fn post(url: &str) -> Post {
        Post {
            id: "t".into(),
            url: url.into(),
            ..Post::default()
        }
    }

    fn video_media(fallback: &str) -> Option<PostMedia> {
        Some(PostMedia {
            reddit_video: Some(RedditVideo {
                fallback_url: fallback.into(),
                ..RedditVideo::default()
            }),
        })
    }

    #[test]
    fn imgur_gifv_becomes_mp4() {
        let p = post("https://imgur.com/a/abc123.gifv");
        assert_eq!(
            resolve(&p, ContentSource::Imgur).as_deref(),
            Some("https://imgur.com/a/abc123.mp4")
        );
    }

    #[test]
    fn imgur_keeps_query_string() {
        assert_eq!(
            imgur_video_url("https://i.imgur.com/abc.GIFV?1"),
            "https://i.imgur.com/abc.mp4?1"
        );
    }

    #[test]
    fn imgur_static_image_is_unchanged() {
        let p = post("https://i.imgur.com/abc123.jpg");
        assert_eq!(
            resolve(&p, ContentSource::Imgur).as_deref(),
            Some("https://i.imgur.com/abc123.jpg")
        );
    }

    #[test]
    fn gfycat_page_url_points_at_asset_host() {
        let p = post("https://gfycat.com/ZippyTerm");
        assert_eq!(
            resolve(&p, ContentSource::Gfycat).as_deref(),
            Some("https://giant.gfycat.com/ZippyTerm.mp4")
        );
    }

    #[test]
    fn gfycat_does_not_depend_on_identifier_length() {
        for id in ["A", "ZippyTerm", "LongIdentifierName"] {
            let expected = format!("https://giant.gfycat.com/{id}.mp4");
            for url in [
                format!("https://gfycat.com/{id}"),
                format!("https://thumbs.gfycat.com/{id}-size_restricted.gif"),
                format!("https://www.gfycat.com/gifs/detail/{id}/"),
                format!("https://gfycat.com/{id}-funny-cat-tags"),
            ] {
                assert_eq!(
                    resolve(&post(&url), ContentSource::Gfycat).as_deref(),
                    Some(expected.as_str()),
                    "url {url}"
                );
            }
        }
    }

    #[test]
    fn gfycat_recovers_casing_from_thumbnail() {
        let p = Post {
            thumbnail: "https://thumbs.gfycat.com/ZippyTerm-size_restricted.gif".into(),
            ..post("https://gfycat.com/zippyterm")
        };
        assert_eq!(
            resolve(&p, ContentSource::Gfycat).as_deref(),
            Some("https://giant.gfycat.com/ZippyTerm.mp4")
        );
    }

    #[test]
    fn gfycat_ignores_unrelated_thumbnail() {
        let p = Post {
            thumbnail: "https://b.thumbs.redditmedia.com/Other.jpg".into(),
            ..post("https://gfycat.com/zippyterm")
        };
        assert_eq!(
            resolve(&p, ContentSource::Gfycat).as_deref(),
            Some("https://giant.gfycat.com/zippyterm.mp4")
        );
    }

    #[test]
    fn gfycat_ignores_lookalike_thumbnail_host() {
        let p = Post {
            thumbnail: "https://evilgfycat.com/ZIPPYTERM.gif".into(),
            ..post("https://gfycat.com/zippyterm")
        };
        assert_eq!(
            resolve(&p, ContentSource::Gfycat).as_deref(),
            Some("https://giant.gfycat.com/zippyterm.mp4")
        );
    }

    #[test]
    fn gfycat_without_identifier_fails() {
        assert_eq!(resolve(&post("https://gfycat.com/"), ContentSource::Gfycat), None);
    }

    #[test]
    fn native_video_returns_exact_fallback() {
        let fallback = "https://v.redd.it/abc/DASH_720.mp4?source=fallback";
        let p = Post {
            is_video: true,
            media: video_media(fallback),
            ..post("https://v.redd.it/abc")
        };
        assert_eq!(resolve(&p, ContentSource::NativeVideo).as_deref(), Some(fallback));
    }

    #[test]
    fn native_video_without_media_fails() {
        let p = Post {
            is_video: true,
            ..post("https://v.redd.it/abc")
        };
        assert_eq!(resolve(&p, ContentSource::NativeVideo), None);

        let blank = Post {
            media: video_media("   "),
            ..p
        };
        assert_eq!(resolve(&blank, ContentSource::NativeVideo), None);
    }

    #[test]
    fn native_video_checks_crosspost_parent() {
        let p = Post {
            crosspost_parent_list: vec![CrosspostParent {
                media: None,
                secure_media: video_media("https://v.redd.it/parent/DASH_480.mp4"),
            }],
            ..post("https://v.redd.it/parent")
        };
        assert_eq!(
            resolve(&p, ContentSource::NativeVideo).as_deref(),
            Some("https://v.redd.it/parent/DASH_480.mp4")
        );
    }

    #[test]
    fn unsupported_never_resolves() {
        let p = Post {
            media: video_media("https://v.redd.it/abc/DASH_720.mp4"),
            ..post("https://example.com/a.gifv")
        };
        assert_eq!(resolve(&p, ContentSource::Unsupported), None);
    }
}
