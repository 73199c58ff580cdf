use std::io::Write;

use chat_core::{ConversationViewModel, MessageId, MessageStatus, MessageView, Role, Theme};
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

use crate::session::View;

const RESET: &str = "\x1b[0m";
const GENERATING_NOTICE: &str = "(generating, Ctrl-C to stop)";

#[derive(Debug, Clone, Copy)]
struct Palette {
    user: &'static str,
    assistant: &'static str,
    error: &'static str,
    notice: &'static str,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                user: "\x1b[34m",
                assistant: "\x1b[30m",
                error: "\x1b[31m",
                notice: "\x1b[90m",
            },
            Theme::Dark => Self {
                user: "\x1b[96m",
                assistant: "\x1b[97m",
                error: "\x1b[91m",
                notice: "\x1b[37m",
            },
        }
    }
}

/// Prints the conversation incrementally: only content not yet on screen is written.
pub struct TerminalView<W: Write> {
    out: W,
    palette: Palette,
    /// Offset used for the time shown in message headers.
    offset: FixedOffset,
    /// Message being streamed and how many bytes of it are printed.
    streaming: Option<(MessageId, usize)>,
    /// Highest message id fully printed.
    last_closed: MessageId,
    theme: Option<Theme>,
    model_name: String,
    had_messages: bool,
    loading: bool,
    replayed: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            palette: Palette::for_theme(Theme::default()),
            offset: Local::now().offset().fix(),
            streaming: None,
            last_closed: 0,
            theme: None,
            model_name: String::new(),
            had_messages: false,
            loading: false,
            replayed: false,
        }
    }

    #[cfg(test)]
    fn with_offset(out: W, offset: FixedOffset) -> Self {
        Self {
            offset,
            ..Self::new(out)
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn clock(&self, timestamp_ms: i64) -> String {
        match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
            Some(at) => at.with_timezone(&self.offset).format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }

    fn notice(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}{}{}", self.palette.notice, text, RESET);
    }

    fn render_row(&mut self, row: &MessageView) {
        match row.role {
            // The user typed the prompt; it is only echoed when replaying history.
            Role::User if self.replayed => {
                self.last_closed = row.id;
            }
            Role::User => {
                let time = self.clock(row.timestamp_ms);
                let _ = writeln!(
                    self.out,
                    "{}{} you>{} {}",
                    self.palette.user, time, RESET, row.content
                );
                self.last_closed = row.id;
            }
            Role::Assistant => self.render_assistant(row),
        }
    }

    fn render_assistant(&mut self, row: &MessageView) {
        let printed = match self.streaming {
            Some((id, printed)) if id == row.id => printed,
            _ => {
                let time = self.clock(row.timestamp_ms);
                let _ = write!(
                    self.out,
                    "{}{} assistant>{} ",
                    self.palette.assistant, time, RESET
                );
                0
            }
        };
        if let Some(delta) = row.content.get(printed..) {
            let _ = write!(self.out, "{}", delta);
        }

        match row.status {
            MessageStatus::Pending => {
                self.streaming = Some((row.id, row.content.len()));
            }
            MessageStatus::Complete => {
                let _ = writeln!(self.out);
                self.close(row.id);
            }
            MessageStatus::Failed => {
                let error = row.error.as_deref().unwrap_or_default();
                if !row.content.is_empty() {
                    let _ = writeln!(self.out);
                }
                let _ = writeln!(self.out, "{}[error] {}{}", self.palette.error, error, RESET);
                self.close(row.id);
            }
        }
    }

    fn close(&mut self, id: MessageId) {
        self.streaming = None;
        self.last_closed = id;
    }
}

impl<W: Write> View for TerminalView<W> {
    fn render(&mut self, view: &ConversationViewModel) {
        if self.theme != Some(view.theme) {
            self.palette = Palette::for_theme(view.theme);
            if self.theme.is_some() {
                let label = match view.theme {
                    Theme::Light => "light",
                    Theme::Dark => "dark",
                };
                self.notice(&format!("theme: {label}"));
            }
            self.theme = Some(view.theme);
        }

        if view.model_name != self.model_name {
            self.notice(&format!("model: {}", view.model_name));
            self.model_name = view.model_name.clone();
        }

        if view.messages.is_empty() && self.had_messages {
            if self.streaming.take().is_some() {
                let _ = writeln!(self.out);
            }
            self.notice("conversation cleared");
        }
        self.had_messages = !view.messages.is_empty();

        if view.loading && !self.loading {
            self.notice(GENERATING_NOTICE);
        }
        self.loading = view.loading;

        let last_closed = self.last_closed;
        for row in view.messages.iter().filter(|row| row.id > last_closed) {
            self.render_row(row);
        }
        self.replayed = true;
        let _ = self.out.flush();
    }
}
