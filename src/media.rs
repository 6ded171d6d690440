use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reddit::Post;
use crate::resolve::{self, is_animated_imgur};
use crate::source::{self, url_host, ContentSource};

const NATIVE_VIDEO_HOST: &str = "v.redd.it";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One displayable item. `uri` is always a non-empty http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub uri: String,
    pub source: ContentSource,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Builds the descriptor for a single post, or `None` when the post has no
/// media this pipeline can show.
pub fn build(post: &Post) -> Option<MediaDescriptor> {
    if !source::is_eligible(post) {
        debug!(post = %post.id, url = %post.url, "skipping ineligible post");
        return None;
    }
    let source = source::classify(post);

    let (kind, uri) = if is_still_image(post, source) {
        (MediaKind::Image, post.url.trim().to_string())
    } else {
        match resolve::resolve(post, source) {
            Some(uri) => (MediaKind::Video, uri),
            None => {
                debug!(post = %post.id, %source, "dropping post with unresolvable media");
                return None;
            }
        }
    };

    if uri.is_empty() || url_host(&uri).is_none() {
        debug!(post = %post.id, %source, uri = %uri, "dropping post with invalid media url");
        return None;
    }

    Some(MediaDescriptor {
        kind,
        uri,
        source,
        title: post.title.trim().to_string(),
        thumbnail: post.thumbnail_url().map(str::to_string),
    })
}

fn is_still_image(post: &Post, source: ContentSource) -> bool {
    if post.is_video {
        return false;
    }
    match source {
        ContentSource::Gfycat => false,
        ContentSource::Imgur => !is_animated_imgur(&post.url),
        ContentSource::NativeVideo => url_host(&post.url).as_deref() != Some(NATIVE_VIDEO_HOST),
        ContentSource::Unsupported => false,
    }
}

/// Ordered descriptors built from one feed page. Never mutated once built;
/// clones share the same storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSequence {
    items: Arc<[MediaDescriptor]>,
}

impl Default for MediaSequence {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }
}

impl MediaSequence {
    pub fn from_posts<'a, I>(posts: I) -> Self
    where
        I: IntoIterator<Item = &'a Post>,
    {
        posts.into_iter().filter_map(build).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaDescriptor> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaDescriptor> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[MediaDescriptor] {
        &self.items
    }
}

impl FromIterator<MediaDescriptor> for MediaSequence {
    fn from_iter<T: IntoIterator<Item = MediaDescriptor>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MediaSequence {
    type Item = &'a MediaDescriptor;
    type IntoIter = std::slice::Iter<'a, MediaDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
