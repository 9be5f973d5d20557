use std::collections::VecDeque;

use crate::models::chat::{ChatMessage, MessageRole};

/// Messages forwarded to the provider per turn, including the new one.
pub const CONTEXT_WINDOW_SIZE: usize = 15;

/// Fixed-capacity buffer holding the most recent messages of a transcript.
/// Pushing into a full window evicts the oldest message.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl ContextWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// The last `capacity` user/assistant messages of `transcript`.
    /// System messages are never part of a window.
    pub fn from_transcript(capacity: usize, transcript: &[ChatMessage]) -> Self {
        let mut window = Self::new(capacity);
        let start = transcript.len().saturating_sub(window.capacity);
        for message in &transcript[start..] {
            window.push(message.clone());
        }
        window
    }

    pub fn push(&mut self, message: ChatMessage) {
        if message.role == MessageRole::System {
            return;
        }
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(&format!("question {i}"))
                } else {
                    ChatMessage::assistant(&format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_short_transcript_is_kept_whole() {
        let window = ContextWindow::from_transcript(CONTEXT_WINDOW_SIZE, &transcript(4));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_window_keeps_most_recent_messages() {
        let window = ContextWindow::from_transcript(CONTEXT_WINDOW_SIZE, &transcript(21));
        let messages = window.into_messages();
        assert_eq!(messages.len(), CONTEXT_WINDOW_SIZE);
        assert_eq!(messages.first().unwrap().content, "question 6");
        assert_eq!(messages.last().unwrap().content, "question 20");
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut window = ContextWindow::new(2);
        window.push(ChatMessage::user("a"));
        window.push(ChatMessage::assistant("b"));
        window.push(ChatMessage::user("c"));
        let contents: Vec<_> = window.into_messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }

    #[test]
    fn test_system_messages_are_skipped() {
        let mut window = ContextWindow::new(3);
        window.push(ChatMessage {
            role: MessageRole::System,
            content: "injected".to_string(),
            created_at: chrono::Utc::now(),
        });
        assert!(window.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let window = ContextWindow::from_transcript(0, &transcript(3));
        assert_eq!(window.len(), 1);
    }
}
