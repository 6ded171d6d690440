use anyhow::Result;
use tracing::{info, warn};

use crate::cursor::{EndPolicy, NavigationCursor};
use crate::data::{FeedPage, PageRequest};
use crate::media::{MediaDescriptor, MediaSequence};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("feed fetch failed: {message}")]
    FetchFailed { message: String },
    #[error("feed has no displayable media")]
    EmptySequence,
}

/// Token handed out per fetch; only the latest one may install a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Ready,
    Empty,
    Failed(FeedError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Ready(usize),
    Empty,
    Failed(FeedError),
    Stale,
}

/// One viewer's state: the live cursor, the feed status and the token for
/// the next page.
#[derive(Debug)]
pub struct Session {
    policy: EndPolicy,
    generation: Generation,
    pending: Option<Generation>,
    status: FeedStatus,
    cursor: Option<NavigationCursor>,
    next_after: Option<String>,
}

impl Session {
    pub fn new(policy: EndPolicy) -> Self {
        Self {
            policy,
            generation: Generation::default(),
            pending: None,
            status: FeedStatus::Loading,
            cursor: None,
            next_after: None,
        }
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn cursor(&self) -> Option<&NavigationCursor> {
        self.cursor.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a fetch. Any fetch still in flight becomes stale.
    pub fn begin_fetch(&mut self) -> Generation {
        self.generation = Generation(self.generation.0 + 1);
        self.pending = Some(self.generation);
        self.status = FeedStatus::Loading;
        self.generation
    }

    /// Request for the page after the one currently shown, if the feed has one.
    pub fn next_page(&self) -> Option<PageRequest> {
        self.next_after
            .clone()
            .map(|after| PageRequest { after: Some(after) })
    }

    pub fn complete_fetch(
        &mut self,
        generation: Generation,
        result: Result<FeedPage>,
    ) -> FetchOutcome {
        if self.pending != Some(generation) {
            warn!(
                generation = generation.value(),
                latest = self.generation.value(),
                "discarding stale feed result"
            );
            return FetchOutcome::Stale;
        }
        self.pending = None;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                let error = FeedError::FetchFailed {
                    message: format!("{err:#}"),
                };
                warn!(generation = generation.value(), error = %error, "feed fetch failed");
                self.status = FeedStatus::Failed(error.clone());
                return FetchOutcome::Failed(error);
            }
        };

        let sequence = MediaSequence::from_posts(&page.posts);
        info!(
            generation = generation.value(),
            posts = page.posts.len(),
            media = sequence.len(),
            "feed page ready"
        );
        self.next_after = page.after;
        let len = sequence.len();
        self.cursor = Some(NavigationCursor::with_policy(sequence, self.policy));
        if len == 0 {
            self.status = FeedStatus::Empty;
            FetchOutcome::Empty
        } else {
            self.status = FeedStatus::Ready;
            FetchOutcome::Ready(len)
        }
    }

    pub fn current(&self) -> Option<&MediaDescriptor> {
        self.cursor.as_ref().and_then(NavigationCursor::current)
    }

    pub fn advance(&mut self) -> bool {
        self.cursor.as_mut().is_some_and(NavigationCursor::advance)
    }

    pub fn rewind(&mut self) -> bool {
        self.cursor.as_mut().is_some_and(NavigationCursor::rewind)
    }

    pub fn reset(&mut self) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.reset();
        }
    }

    /// Error to surface for the latest fetch, if it ended badly.
    pub fn error(&self) -> Option<FeedError> {
        match &self.status {
            FeedStatus::Failed(err) => Some(err.clone()),
            FeedStatus::Empty => Some(FeedError::EmptySequence),
            FeedStatus::Loading | FeedStatus::Ready => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    use crate::reddit::Post;

    fn page(urls: &[&str], after: Option<&str>) -> FeedPage {
        FeedPage {
            posts: urls
                .iter()
                .enumerate()
                .map(|(i, url)| Post {
                    id: i.to_string(),
                    title: format!("post {i}"),
                    url: url.to_string(),
                    ..Post::default()
                })
                .collect(),
            after: after.map(str::to_string),
        }
    }

    #[test]
    fn starts_loading_without_content() {
        let session = Session::new(EndPolicy::Clamp);
        assert_eq!(session.status(), &FeedStatus::Loading);
        assert!(session.current().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn successful_fetch_installs_fresh_cursor() {
        let mut session = Session::new(EndPolicy::Clamp);
        let generation = session.begin_fetch();
        let outcome = session.complete_fetch(
            generation,
            Ok(page(
                &["https://i.imgur.com/a.jpg", "https://i.imgur.com/b.gifv"],
                Some("t3_b"),
            )),
        );
        assert_eq!(outcome, FetchOutcome::Ready(2));
        assert_eq!(session.status(), &FeedStatus::Ready);
        assert_eq!(session.current().unwrap().uri, "https://i.imgur.com/a.jpg");
        assert!(session.advance());
        assert!(!session.advance());
        assert_eq!(session.current().unwrap().uri, "https://i.imgur.com/b.mp4");
        assert_eq!(
            session.next_page(),
            Some(PageRequest {
                after: Some("t3_b".into())
            })
        );
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut session = Session::new(EndPolicy::Clamp);
        let first = session.begin_fetch();
        let second = session.begin_fetch();
        assert!(second > first);

        let outcome =
            session.complete_fetch(second, Ok(page(&["https://i.imgur.com/new.jpg"], None)));
        assert_eq!(outcome, FetchOutcome::Ready(1));

        let outcome =
            session.complete_fetch(first, Ok(page(&["https://i.imgur.com/old.jpg"], None)));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(session.current().unwrap().uri, "https://i.imgur.com/new.jpg");
    }

    #[test]
    fn late_duplicate_of_applied_generation_is_stale() {
        let mut session = Session::new(EndPolicy::Clamp);
        let generation = session.begin_fetch();
        session.complete_fetch(generation, Ok(page(&["https://i.imgur.com/a.jpg"], None)));
        let again = session.complete_fetch(generation, Ok(page(&[], None)));
        assert_eq!(again, FetchOutcome::Stale);
        assert_eq!(session.status(), &FeedStatus::Ready);
    }

    #[test]
    fn failure_keeps_previous_sequence_navigable() {
        let mut session = Session::new(EndPolicy::Clamp);
        let generation = session.begin_fetch();
        session.complete_fetch(
            generation,
            Ok(page(&["https://i.imgur.com/a.jpg", "https://i.imgur.com/b.jpg"], None)),
        );

        let generation = session.begin_fetch();
        assert!(session.is_loading());
        let outcome = session.complete_fetch(generation, Err(anyhow!("connection reset")));
        assert!(matches!(outcome, FetchOutcome::Failed(FeedError::FetchFailed { .. })));
        assert!(matches!(session.error(), Some(FeedError::FetchFailed { .. })));

        assert!(session.advance());
        assert_eq!(session.current().unwrap().uri, "https://i.imgur.com/b.jpg");
    }

    #[test]
    fn empty_page_is_distinct_from_failure() {
        let mut session = Session::new(EndPolicy::Clamp);
        let generation = session.begin_fetch();
        let outcome = session.complete_fetch(
            generation,
            Ok(page(&["https://youtube.com/watch?v=1"], None)),
        );
        assert_eq!(outcome, FetchOutcome::Empty);
        assert_eq!(session.status(), &FeedStatus::Empty);
        assert_eq!(session.error(), Some(FeedError::EmptySequence));
        assert!(session.current().is_none());
        assert!(!session.advance());
        assert_eq!(session.next_page(), None);
    }

    #[test]
    fn new_fetch_resets_to_first_item() {
        let mut session = Session::new(EndPolicy::Clamp);
        let generation = session.begin_fetch();
        session.complete_fetch(
            generation,
            Ok(page(&["https://i.imgur.com/a.jpg", "https://i.imgur.com/b.jpg"], None)),
        );
        session.advance();
        let generation = session.begin_fetch();
        session.complete_fetch(
            generation,
            Ok(page(&["https://i.imgur.com/c.jpg", "https://i.imgur.com/d.jpg"], None)),
        );
        assert_eq!(session.cursor().and_then(NavigationCursor::index), Some(0));
        assert_eq!(session.current().unwrap().uri, "https://i.imgur.com/c.jpg");
    }
}
