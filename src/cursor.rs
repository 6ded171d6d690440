use serde::{Deserialize, Serialize};

use crate::media::{MediaDescriptor, MediaSequence};

/// What `advance` does on the last item (and `rewind` on the first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndPolicy {
    #[default]
    Clamp,
    Wrap,
}

impl EndPolicy {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "clamp" => Some(EndPolicy::Clamp),
            "wrap" => Some(EndPolicy::Wrap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Empty,
    At(usize),
}

/// Traversal state over one [`MediaSequence`]. The sequence cannot change
/// underneath the cursor, so `Position::At(i)` is always in bounds.
#[derive(Debug, Clone)]
pub struct NavigationCursor {
    sequence: MediaSequence,
    position: Position,
    policy: EndPolicy,
}

impl NavigationCursor {
    pub fn new(sequence: MediaSequence) -> Self {
        Self::with_policy(sequence, EndPolicy::default())
    }

    pub fn with_policy(sequence: MediaSequence, policy: EndPolicy) -> Self {
        let position = initial_position(&sequence);
        Self {
            sequence,
            position,
            policy,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn index(&self) -> Option<usize> {
        match self.position {
            Position::Empty => None,
            Position::At(index) => Some(index),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position == Position::Empty
    }

    pub fn policy(&self) -> EndPolicy {
        self.policy
    }

    pub fn sequence(&self) -> &MediaSequence {
        &self.sequence
    }

    pub fn current(&self) -> Option<&MediaDescriptor> {
        self.index().and_then(|index| self.sequence.get(index))
    }

    pub fn is_at_end(&self) -> bool {
        match self.position {
            Position::Empty => true,
            Position::At(index) => index + 1 >= self.sequence.len(),
        }
    }

    /// Moves to the next item. Returns whether the position changed.
    pub fn advance(&mut self) -> bool {
        let Position::At(index) = self.position else {
            return false;
        };
        let last = self.sequence.len() - 1;
        let next = if index < last {
            index + 1
        } else {
            match self.policy {
                EndPolicy::Clamp => last,
                EndPolicy::Wrap => 0,
            }
        };
        self.position = Position::At(next);
        next != index
    }

    /// Moves to the previous item. Returns whether the position changed.
    pub fn rewind(&mut self) -> bool {
        let Position::At(index) = self.position else {
            return false;
        };
        let prev = if index > 0 {
            index - 1
        } else {
            match self.policy {
                EndPolicy::Clamp => 0,
                EndPolicy::Wrap => self.sequence.len() - 1,
            }
        };
        self.position = Position::At(prev);
        prev != index
    }

    pub fn reset(&mut self) {
        self.position = initial_position(&self.sequence);
    }
}

fn initial_position(sequence: &MediaSequence) -> Position {
    if sequence.is_empty() {
        Position::Empty
    } else {
        Position::At(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::source::ContentSource;

    fn sequence(len: usize) -> MediaSequence {
        (0..len)
            .map(|i| MediaDescriptor {
                kind: MediaKind::Image,
                uri: format!("https://i.imgur.com/{i}.jpg"),
                source: ContentSource::Imgur,
                title: format!("item {i}"),
                thumbnail: None,
            })
            .collect()
    }

    fn assert_in_bounds(cursor: &NavigationCursor) {
        match cursor.position() {
            Position::Empty => assert_eq!(cursor.len(), 0),
            Position::At(index) => {
                assert!(index < cursor.len());
                assert!(cursor.current().is_some());
            }
        }
    }

    #[test]
    fn starts_at_first_item() {
        let cursor = NavigationCursor::new(sequence(3));
        assert_eq!(cursor.position(), Position::At(0));
        assert_eq!(cursor.current().unwrap().title, "item 0");
    }

    #[test]
    fn advance_clamps_at_last_item() {
        for len in [1, 2, 7] {
            let mut cursor = NavigationCursor::new(sequence(len));
            for _ in 0..len + 5 {
                cursor.advance();
                assert_in_bounds(&cursor);
            }
            assert_eq!(cursor.index(), Some(len - 1));
            assert_eq!(cursor.current().unwrap().title, format!("item {}", len - 1));
            assert!(cursor.is_at_end());
            assert!(!cursor.advance());
        }
    }

    #[test]
    fn empty_cursor_stays_empty() {
        let mut cursor = NavigationCursor::new(sequence(0));
        assert!(cursor.is_empty());
        for _ in 0..10 {
            assert!(!cursor.advance());
            assert!(!cursor.rewind());
            assert!(cursor.current().is_none());
        }
        cursor.reset();
        assert_eq!(cursor.position(), Position::Empty);
    }

    #[test]
    fn rewind_clamps_at_first_item() {
        let mut cursor = NavigationCursor::new(sequence(3));
        cursor.advance();
        assert!(cursor.rewind());
        assert!(!cursor.rewind());
        assert_eq!(cursor.index(), Some(0));
    }

    #[test]
    fn wrap_policy_cycles() {
        let mut cursor = NavigationCursor::with_policy(sequence(3), EndPolicy::Wrap);
        for _ in 0..3 {
            cursor.advance();
            assert_in_bounds(&cursor);
        }
        assert_eq!(cursor.index(), Some(0));
        cursor.rewind();
        assert_eq!(cursor.index(), Some(2));

        let mut single = NavigationCursor::with_policy(sequence(1), EndPolicy::Wrap);
        assert!(!single.advance());
        assert_eq!(single.index(), Some(0));
    }

    #[test]
    fn reset_returns_to_start() {
        let mut cursor = NavigationCursor::new(sequence(4));
        cursor.advance();
        cursor.advance();
        cursor.reset();
        assert_eq!(cursor.index(), Some(0));
    }

    #[test]
    fn end_policy_keys() {
        assert_eq!(EndPolicy::from_key("Wrap"), Some(EndPolicy::Wrap));
        assert_eq!(EndPolicy::from_key("bounce"), None);
    }
}
