use anyhow::{Context, Result};
use std::sync::Arc;

use crate::reddit::{self, ListingOptions, SortOption};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub after: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub posts: Vec<reddit::Post>,
    pub after: Option<String>,
}

impl From<reddit::Listing<reddit::Post>> for FeedPage {
    fn from(listing: reddit::Listing<reddit::Post>) -> Self {
        Self {
            posts: listing
                .children
                .into_iter()
                .map(|thing| thing.data)
                .collect(),
            after: listing.after.filter(|after| !after.is_empty()),
        }
    }
}

pub trait FeedService: Send + Sync {
    fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage>;
}

pub struct RedditFeedService {
    client: Arc<reddit::Client>,
    subreddit: String,
    sort: SortOption,
    limit: Option<u32>,
}

impl RedditFeedService {
    pub fn new(
        client: Arc<reddit::Client>,
        subreddit: impl Into<String>,
        sort: SortOption,
        limit: Option<u32>,
    ) -> Self {
        Self {
            client,
            subreddit: subreddit.into(),
            sort,
            limit,
        }
    }
}

impl FeedService for RedditFeedService {
    fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage> {
        let opts = ListingOptions {
            after: request.after.clone(),
            limit: self.limit,
        };
        let listing = self
            .client
            .subreddit_listing(&self.subreddit, self.sort, opts)
            .with_context(|| format!("fetch r/{} feed", self.subreddit))?;
        Ok(listing.into())
    }
}

/// Offline feed: one page with a post for every provider shape, including
/// posts the pipeline is expected to reject.
#[derive(Default)]
pub struct MockFeedService;

impl FeedService for MockFeedService {
    fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage> {
        if request.after.is_some() {
            return Ok(FeedPage::default());
        }
        Ok(FeedPage {
            posts: mock_posts(),
            after: Some("t3_mock_end".into()),
        })
    }
}

fn mock_posts() -> Vec<reddit::Post> {
    let post = |id: &str, title: &str, url: &str| reddit::Post {
        id: id.into(),
        name: format!("t3_{id}"),
        title: title.into(),
        subreddit: "pippup".into(),
        permalink: format!("/r/pippup/comments/{id}/"),
        url: url.into(),
        ..reddit::Post::default()
    };

    vec![
        post("m1", "An imgur gifv", "https://i.imgur.com/k2Zpd3x.gifv"),
        post("m2", "A gfycat page", "https://gfycat.com/ZippyTerm"),
        reddit::Post {
            is_self: true,
            ..post("m3", "A self post", "https://www.reddit.com/r/pippup/comments/m3/")
        },
        reddit::Post {
            is_video: true,
            media: Some(reddit::PostMedia {
                reddit_video: Some(reddit::RedditVideo {
                    fallback_url: "https://v.redd.it/m4video/DASH_720.mp4?source=fallback"
                        .into(),
                    is_gif: true,
                    width: 1280,
                    height: 720,
                    ..reddit::RedditVideo::default()
                }),
            }),
            ..post("m4", "A reddit video", "https://v.redd.it/m4video")
        },
        post("m5", "A still image", "https://i.redd.it/m5still.jpg"),
        post("m6", "Somewhere else", "https://youtube.com/watch?v=m6"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_converts_to_page() {
        let listing = reddit::Listing {
            after: Some(String::new()),
            before: None,
            children: vec![reddit::Thing {
                kind: "t3".into(),
                data: reddit::Post {
                    id: "a".into(),
                    ..reddit::Post::default()
                },
            }],
        };
        let page = FeedPage::from(listing);
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.after, None);
    }

    #[test]
    fn mock_feed_has_one_page() {
        let feed = MockFeedService;
        let first = feed.fetch_page(&PageRequest::default()).unwrap();
        assert_eq!(first.posts.len(), 6);
        let next = feed
            .fetch_page(&PageRequest {
                after: first.after.clone(),
            })
            .unwrap();
        assert!(next.posts.is_empty());
        assert_eq!(next.after, None);
    }
}
