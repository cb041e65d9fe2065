//! Conversation state for a single orchestration run.

use crate::model::{Message, Role};
use crate::{Error, Result};

/// Append-only message log shared by every phase of a run.
///
/// Every tool message must answer a tool call made by an earlier
/// assistant message; [`append`](Self::append) rejects anything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Start a conversation from the user's request.
    pub fn seeded(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
        }
    }

    /// Append a message, enforcing the tool-call linkage.
    pub fn append(&mut self, message: Message) -> Result<()> {
        if message.role == Role::Tool && !self.has_request_for(message.tool_call_id.as_deref()) {
            return Err(Error::OrphanToolResult {
                tool_call_id: message.tool_call_id,
            });
        }
        self.messages.push(message);
        Ok(())
    }

    /// Read-only view of the log, in order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    fn has_request_for(&self, tool_call_id: Option<&str>) -> bool {
        let Some(id) = tool_call_id else {
            return false;
        };
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .flat_map(|m| &m.tool_calls)
            .any(|call| call.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolCall;
    use serde_json::Map;

    fn request(id: &str) -> Message {
        Message::assistant_with_calls(
            None,
            vec![ToolCall {
                id: id.into(),
                name: "get_country_info".into(),
                arguments: Map::new(),
            }],
        )
    }

    #[test]
    fn seeded_with_user_message() {
        let conversation = ConversationState::seeded("What is the capital of Germany?");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.snapshot()[0].role, Role::User);
    }

    #[test]
    fn tool_message_after_matching_request_is_accepted() {
        let mut conversation = ConversationState::seeded("q");
        conversation.append(request("call_1")).unwrap();
        conversation.append(Message::tool("call_1", "{}")).unwrap();
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn orphan_tool_message_is_rejected_without_mutation() {
        let mut conversation = ConversationState::seeded("q");
        conversation.append(request("call_1")).unwrap();
        let before = conversation.clone();

        let err = conversation
            .append(Message::tool("call_2", "{}"))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::OrphanToolResult { tool_call_id: Some(id) } if id == "call_2"
        ));
        assert_eq!(conversation, before);
    }

    #[test]
    fn tool_message_without_id_is_orphan() {
        let mut conversation = ConversationState::seeded("q");
        conversation.append(request("call_1")).unwrap();

        let mut message = Message::tool("call_1", "{}");
        message.tool_call_id = None;

        assert!(conversation.append(message).is_err());
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn request_must_precede_result() {
        let mut conversation = ConversationState::seeded("q");
        assert!(conversation.append(Message::tool("call_1", "{}")).is_err());
        assert_eq!(conversation.len(), 1);
    }
}
