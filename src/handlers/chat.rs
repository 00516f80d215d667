//! `--chat PROMPT`: a single exchange with the coding assistant.

use anyhow::Result;
use futures_util::StreamExt;

use crate::chat::{EMPTY_REPLY_MESSAGE, SYSTEM_PROMPT};
use crate::config::Config;
use crate::llm::{ChatMessage, ChatOptions, LlmClient, Role, StreamEvent};
use crate::printer::MarkdownPrinter;

pub struct ChatHandler;

impl ChatHandler {
    pub async fn run(cfg: &Config, prompt: &str, markdown: bool) -> Result<()> {
        let client = LlmClient::from_config(cfg)?;
        let messages = vec![ChatMessage::new(Role::System, SYSTEM_PROMPT), ChatMessage::new(Role::User, prompt)];

        let mut stream = client.chat_stream(messages, ChatOptions::from_config(cfg));
        let mut assistant_text = String::new();
        while let Some(ev) = stream.next().await {
            match ev? {
                StreamEvent::Content(t) => {
                    assistant_text.push_str(&t);
                    if !markdown {
                        print!("{}", t);
                    }
                }
                StreamEvent::Done => {
                    if !markdown {
                        println!();
                    }
                    break;
                }
            }
        }
        if assistant_text.trim().is_empty() {
            println!("{}", EMPTY_REPLY_MESSAGE);
        } else if markdown {
            MarkdownPrinter::default().print(&assistant_text);
        }
        Ok(())
    }
}
