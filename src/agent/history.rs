use crate::llm::Message;
use std::collections::VecDeque;

/// Ordered message history shared by all queries of a session
#[derive(Debug, Default, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Snapshot of the history in the shape the model API expects
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Drops messages from the oldest end until at most `cap` remain.
    ///
    /// A tool invocation is always dropped together with its result, and a
    /// tool result is never left at the front. Returns the number of
    /// messages removed.
    pub fn trim(&mut self, cap: usize) -> usize {
        let before = self.messages.len();

        while self.messages.len() > cap {
            self.messages.pop_front();

            // Results whose invocation is gone go with it
            while self
                .messages
                .front()
                .is_some_and(|message| message.tool_result_id().is_some())
            {
                self.messages.pop_front();
            }
        }

        before - self.messages.len()
    }
}
