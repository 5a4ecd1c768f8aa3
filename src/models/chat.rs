use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Raw JSON argument text as the model produced it.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool(tool_call_id: &str, name: &str, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.to_string()),
            name: Some(name.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Ordered message history for one dialogue.
///
/// Append-only apart from `prune`, which keeps message 0 (the system prompt)
/// plus the newest `max_messages - 1` entries once the limit is exceeded.
#[derive(Clone, Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, max_messages: usize) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            max_messages: max_messages.max(2),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn prune(&mut self) {
        if self.messages.len() <= self.max_messages {
            return;
        }
        let keep_from = self.messages.len() - (self.max_messages - 1);
        self.messages.drain(1..keep_from);
    }

    /// Rolls back a failed turn: everything appended after the last user
    /// message is dropped together with that message.
    pub fn discard_last_user(&mut self) -> Option<ChatMessage> {
        let idx = self.messages.iter().rposition(|m| m.role == Role::User)?;
        if idx == 0 {
            return None;
        }
        self.messages.drain(idx..).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_keeps_system_and_newest() {
        let mut convo = Conversation::new("system", 5);
        for i in 0..10 {
            convo.push(ChatMessage::user(format!("msg {}", i)));
        }
        convo.prune();

        assert_eq!(convo.len(), 5);
        assert_eq!(convo.messages()[0].role, Role::System);
        assert_eq!(convo.messages()[0].text(), "system");
        assert_eq!(convo.messages()[1].text(), "msg 6");
        assert_eq!(convo.messages()[4].text(), "msg 9");
    }

    #[test]
    fn prune_is_noop_under_limit() {
        let mut convo = Conversation::new("system", 15);
        convo.push(ChatMessage::user("hi"));
        convo.prune();
        assert_eq!(convo.len(), 2);
    }

    #[test]
    fn discard_last_user_drops_trailing_messages() {
        let mut convo = Conversation::new("system", 15);
        convo.push(ChatMessage::assistant("hello"));
        convo.push(ChatMessage::user("find me a laptop"));
        convo.push(ChatMessage::assistant_tool_calls(None, Vec::new()));

        let removed = convo.discard_last_user().unwrap();
        assert_eq!(removed.text(), "find me a laptop");
        assert_eq!(convo.len(), 2);
        assert_eq!(convo.messages()[1].text(), "hello");
    }

    #[test]
    fn tool_message_serializes_call_id() {
        let msg = ChatMessage::tool("call_1", "end_conversation", "{}");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_1");
        assert!(value.get("tool_calls").is_none());
    }
}
