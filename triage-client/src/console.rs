//! Line-oriented terminal input and message rendering.

use consultation::{ConsultationType, Urgency};
use std::{
    io::{self, Write},
    sync::Arc,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};
use triage_agents::{Message, MessageStatus, Sender};

/// Shared line reader, stdin unless built with [`Console::from_reader`].
/// Clones read from the same line stream.
pub struct Console<R = BufReader<Stdin>> {
    lines: Arc<Mutex<Lines<R>>>,
}

impl<R> Clone for Console<R> {
    fn clone(&self) -> Self {
        Self {
            lines: self.lines.clone(),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> Console<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
        }
    }

    /// Prints `prompt` and reads one trimmed line. `None` at end of input.
    pub async fn ask(&self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        io::stdout().flush().ok();

        let line = self.lines.lock().await.next_line().await.ok().flatten()?;
        Some(line.trim().to_string())
    }

    /// Like [`Console::ask`], but an empty answer keeps `current`.
    pub async fn ask_or(&self, label: &str, current: &str) -> Option<String> {
        let prompt = if current.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{current}]: ")
        };
        let answer = self.ask(&prompt).await?;
        Some(keep_or(answer, current))
    }
}

fn keep_or(answer: String, current: &str) -> String {
    if answer.is_empty() {
        current.to_string()
    } else {
        answer
    }
}

pub fn parse_consultation_type(input: &str) -> Option<ConsultationType> {
    match input.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
        "video" | "v" => Some(ConsultationType::Video),
        "at_home" | "home" | "h" => Some(ConsultationType::AtHome),
        _ => None,
    }
}

pub fn parse_urgency(input: &str) -> Option<Urgency> {
    match input.trim().to_lowercase().as_str() {
        "low" | "l" => Some(Urgency::Low),
        "medium" | "m" => Some(Urgency::Medium),
        "high" | "h" => Some(Urgency::High),
        _ => None,
    }
}

fn status_marker(status: Option<MessageStatus>) -> &'static str {
    match status {
        Some(MessageStatus::Sent) => " ✓",
        Some(MessageStatus::Received) => " ✓✓",
        Some(MessageStatus::Read) => " ✓✓ read",
        None => "",
    }
}

pub fn render(message: &Message) -> String {
    match message.sender {
        Sender::User => format!("you: {}{}", message.text, status_marker(message.status)),
        Sender::Bot => format!("bot: {}", message.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_agents::MessageMetadata;

    #[test]
    fn test_parse_consultation_type() {
        assert_eq!(parse_consultation_type("At-Home"), Some(ConsultationType::AtHome));
        assert_eq!(parse_consultation_type("at home"), Some(ConsultationType::AtHome));
        assert_eq!(parse_consultation_type(" video "), Some(ConsultationType::Video));
        assert_eq!(parse_consultation_type("phone"), None);
    }

    #[test]
    fn test_parse_urgency() {
        assert_eq!(parse_urgency("HIGH"), Some(Urgency::High));
        assert_eq!(parse_urgency("l"), Some(Urgency::Low));
        assert_eq!(parse_urgency("asap"), None);
    }

    #[tokio::test]
    async fn test_clones_share_one_line_stream() {
        let console = Console::from_reader(&b"  ana@example.com \n\nGerman\n"[..]);
        let other = console.clone();

        assert_eq!(console.ask("email: ").await.as_deref(), Some("ana@example.com"));
        assert_eq!(
            other.ask_or("Country", "Spain").await.as_deref(),
            Some("Spain")
        );
        assert_eq!(
            console.ask_or("Preferred language", "Spanish").await.as_deref(),
            Some("German")
        );
        assert_eq!(console.ask("> ").await, None);
    }

    #[test]
    fn test_empty_answer_keeps_current() {
        assert_eq!(keep_or(String::new(), "Spanish"), "Spanish");
        assert_eq!(keep_or("German".to_string(), "Spanish"), "German");
    }

    #[test]
    fn test_render_shows_delivery_status() {
        let mut message = Message::user("hola");
        assert_eq!(render(&message), "you: hola ✓");
        message.status = Some(MessageStatus::Read);
        assert_eq!(render(&message), "you: hola ✓✓ read");

        let bot = Message::bot("¿En qué puedo ayudarle?", Some(MessageMetadata::default()));
        assert_eq!(render(&bot), "bot: ¿En qué puedo ayudarle?");
    }
}
