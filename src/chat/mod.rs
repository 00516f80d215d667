//! Chat panel state: transcript, typing indicator and fenced code splitting.

pub mod window;

pub const SYSTEM_PROMPT: &str = "You are a helpful coding assistant in a code debugger application. When responding, format code with ```language code``` blocks. Keep responses concise and helpful.";
pub const EMPTY_REPLY_MESSAGE: &str = "I'm sorry, I couldn't process your request. Please try again.";
pub const CHAT_FAILED_MESSAGE: &str = "There was an error connecting to the assistant. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A reply fragment: prose or a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPart {
    Text(String),
    Code { language: Option<String>, content: String },
}

/// Split `text` on triple-backtick fences. An opening fence may carry a
/// language tag on its own line; an unclosed fence is left as prose.
pub fn parse_code_blocks(text: &str) -> Vec<ChatPart> {
    const FENCE: &str = "```";
    let mut parts = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            break;
        };
        if open > 0 {
            parts.push(ChatPart::Text(rest[..open].to_string()));
        }
        let inner = &after_open[..close];
        let (language, content) = split_language_tag(inner);
        parts.push(ChatPart::Code { language, content: content.to_string() });
        rest = &after_open[close + FENCE.len()..];
    }

    if !rest.is_empty() {
        parts.push(ChatPart::Text(rest.to_string()));
    }
    parts
}

fn split_language_tag(inner: &str) -> (Option<String>, &str) {
    if let Some((tag, body)) = inner.split_once('\n') {
        if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return (Some(tag.to_string()), body);
        }
    }
    (None, inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBubble {
    pub sender: Sender,
    pub text: String,
}

impl ChatBubble {
    pub fn parts(&self) -> Vec<ChatPart> {
        if self.text.contains("```") {
            parse_code_blocks(&self.text)
        } else {
            vec![ChatPart::Text(self.text.clone())]
        }
    }
}

/// Transcript shown in the chat window. One exchange runs at a time; the
/// typing indicator stays up until the first reply chunk arrives.
#[derive(Debug, Clone, Default)]
pub struct ChatPanel {
    pub messages: Vec<ChatBubble>,
    pub input: String,
    pub visible: bool,
    typing: bool,
    pending_reply: Option<String>,
}

impl ChatPanel {
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn is_waiting(&self) -> bool {
        self.typing || self.pending_reply.is_some()
    }

    pub fn streaming_reply(&self) -> Option<&str> {
        self.pending_reply.as_deref()
    }

    /// Take the input line as a user message. Returns the prompt to send, or
    /// `None` for blank input or while a reply is outstanding.
    pub fn submit(&mut self) -> Option<String> {
        let message = self.input.trim().to_string();
        if message.is_empty() || self.is_waiting() {
            return None;
        }
        self.input.clear();
        self.messages.push(ChatBubble { sender: Sender::User, text: message.clone() });
        self.typing = true;
        Some(message)
    }

    pub fn append_reply(&mut self, chunk: &str) {
        self.typing = false;
        self.pending_reply.get_or_insert_with(String::new).push_str(chunk);
    }

    pub fn finish_reply(&mut self) {
        self.typing = false;
        let text = self.pending_reply.take().unwrap_or_default();
        let text = if text.trim().is_empty() { EMPTY_REPLY_MESSAGE.to_string() } else { text };
        self.messages.push(ChatBubble { sender: Sender::Bot, text });
    }

    /// Replace whatever was streamed so far with the generic failure message.
    pub fn fail_reply(&mut self) {
        self.typing = false;
        self.pending_reply = None;
        self.messages.push(ChatBubble { sender: Sender::Bot, text: CHAT_FAILED_MESSAGE.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_fenced_blocks() {
        let parts = parse_code_blocks("Try this:\n```python\nprint(1)\n```\nDone.");
        assert_eq!(
            parts,
            vec![
                ChatPart::Text("Try this:\n".into()),
                ChatPart::Code { language: Some("python".into()), content: "print(1)\n".into() },
                ChatPart::Text("\nDone.".into()),
            ]
        );
    }

    #[test]
    fn fence_without_language() {
        let parts = parse_code_blocks("```x = 1```");
        assert_eq!(parts, vec![ChatPart::Code { language: None, content: "x = 1".into() }]);
    }

    #[test]
    fn unclosed_fence_is_text() {
        let parts = parse_code_blocks("a ```b");
        assert_eq!(parts, vec![ChatPart::Text("a ```b".into())]);
    }

    #[test]
    fn multiple_blocks() {
        let parts = parse_code_blocks("```c\nint x;\n``` and ```java\nint y;\n```");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], ChatPart::Text(" and ".into()));
    }

    #[test]
    fn exchange_lifecycle() {
        let mut chat = ChatPanel::default();
        chat.input = "  ".into();
        assert_eq!(chat.submit(), None);

        chat.input = "why?".into();
        assert_eq!(chat.submit().as_deref(), Some("why?"));
        assert!(chat.is_typing());
        chat.input = "again".into();
        assert_eq!(chat.submit(), None);

        chat.append_reply("Because");
        assert!(!chat.is_typing());
        assert_eq!(chat.streaming_reply(), Some("Because"));
        chat.finish_reply();
        assert_eq!(chat.messages.last().unwrap(), &ChatBubble { sender: Sender::Bot, text: "Because".into() });
        assert!(!chat.is_waiting());
    }

    #[test]
    fn empty_and_failed_replies() {
        let mut chat = ChatPanel::default();
        chat.input = "hi".into();
        chat.submit();
        chat.finish_reply();
        assert_eq!(chat.messages.last().unwrap().text, EMPTY_REPLY_MESSAGE);

        chat.input = "hi".into();
        chat.submit();
        chat.append_reply("partial");
        chat.fail_reply();
        assert_eq!(chat.messages.last().unwrap().text, CHAT_FAILED_MESSAGE);
        assert_eq!(chat.streaming_reply(), None);
    }
}
