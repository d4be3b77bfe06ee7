use iced::{Event};
use iced::time::Instant;

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    Frame(Instant),
}
