//! Line-oriented terminal front end: stdin input and a transcript printer.

use std::io::Write;

use anyhow::{Context, Result};
use rehearse_core::workflow::{ChatPhase, Delivery, ScreenView, ViewBinding, ViewSnapshot};
use rehearse_types::Role;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Shared stdin reader; every prompt in a command goes through one buffer.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next raw line, or `None` at end of input. Cancel safe.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines.next_line().await.context("read stdin")
    }

    /// Prints `prompt` and reads one trimmed line.
    pub async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush().context("flush stdout")?;
        Ok(self
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

/// Prints chat transcript lines as they settle, plus notices.
#[derive(Default)]
pub struct TerminalView {
    shown: usize,
    header: bool,
    phase: ChatPhase,
    notice: Option<String>,
    chat_notice: Option<String>,
    confirming: bool,
    ending: bool,
}

impl ViewBinding for TerminalView {
    fn render(&mut self, view: &ViewSnapshot) {
        if view.notice != self.notice {
            if let Some(notice) = &view.notice {
                eprintln!("! {notice}");
            }
            self.notice.clone_from(&view.notice);
        }

        let ScreenView::Chat(chat) = &view.body else {
            return;
        };
        if chat.loading {
            return;
        }

        if !self.header
            && let Some(title) = &chat.title
        {
            let status = chat.status.map_or("", |s| s.label());
            println!("== {title} [{status}] ==");
            self.header = true;
        }

        for line in chat.lines.iter().skip(self.shown) {
            if line.delivery == Delivery::Pending {
                break;
            }
            let speaker = match line.role {
                Role::User => "you",
                Role::Assistant => "persona",
                Role::System => "system",
            };
            if line.delivery == Delivery::Failed {
                println!("{speaker}: {} (not delivered)", line.content);
            } else {
                println!("{speaker}: {}", line.content);
            }
            self.shown += 1;
        }

        if chat.phase != self.phase {
            if chat.phase == ChatPhase::AwaitingResponse {
                println!("...");
            }
            self.phase = chat.phase;
        }

        if chat.notice != self.chat_notice {
            if let Some(notice) = &chat.notice {
                eprintln!("! {notice}");
            }
            self.chat_notice.clone_from(&chat.notice);
        }

        if chat.confirming_end && !self.confirming {
            print!("End this session? [y/N] ");
            let _ = std::io::stdout().flush();
        }
        self.confirming = chat.confirming_end;

        if chat.ending && !self.ending {
            println!("Ending session...");
        }
        self.ending = chat.ending;
    }
}

#[cfg(test)]
mod tests {
    use rehearse_core::workflow::Screen;
    use rehearse_core::workflow::view::{ChatLine, ChatView};
    use rehearse_types::SessionStatus;

    use super::*;

    fn snapshot(lines: Vec<ChatLine>) -> ViewSnapshot {
        ViewSnapshot {
            screen: Some(Screen::Chat),
            user: None,
            notice: None,
            body: ScreenView::Chat(ChatView {
                session_id: Some("s1".into()),
                title: Some("Mrs. Lan".into()),
                status: Some(SessionStatus::Active),
                loading: false,
                lines,
                phase: ChatPhase::Idle,
                composing: false,
                input_enabled: true,
                confirming_end: false,
                ending: false,
                notice: None,
            }),
        }
    }

    fn line(content: &str, delivery: Delivery) -> ChatLine {
        ChatLine {
            role: Role::User,
            content: content.into(),
            delivery,
        }
    }

    #[test]
    fn test_pending_lines_wait_until_settled() {
        let mut view = TerminalView::default();
        view.render(&snapshot(vec![line("hi", Delivery::Sent), line("there", Delivery::Pending)]));
        assert_eq!(view.shown, 1);
        assert!(view.header);

        view.render(&snapshot(vec![line("hi", Delivery::Sent), line("there", Delivery::Failed)]));
        assert_eq!(view.shown, 2);
    }

    #[test]
    fn test_ending_is_tracked_across_renders() {
        let mut ending = snapshot(vec![]);
        if let ScreenView::Chat(chat) = &mut ending.body {
            chat.ending = true;
        }
        let mut view = TerminalView::default();
        view.render(&ending);
        assert!(view.ending);
        view.render(&ending);
        assert!(view.ending);

        view.render(&snapshot(vec![]));
        assert!(!view.ending);
    }

    #[test]
    fn test_shrunk_transcript_does_not_panic() {
        let mut view = TerminalView {
            shown: 5,
            ..TerminalView::default()
        };
        view.render(&snapshot(vec![line("hi", Delivery::Sent)]));
        assert_eq!(view.shown, 5);
    }
}
