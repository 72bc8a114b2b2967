use super::ui;
use crate::core::display::{RateRow, build_rows};
use crate::core::sink::STATUS_REFRESHING;
use crate::core::{
    Classifications, CurrencyCode, LivePoller, PollSettings, PresentationSink, RateSnapshot,
    RateSource,
};
use anyhow::Result;
use chrono::{DateTime, Local};
use comfy_table::Cell;
use console::Term;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;

/// Routine progress is dimmed; failures and input errors stand out.
fn status_style(status: &str) -> ui::StyleType {
    if status == STATUS_REFRESHING {
        ui::StyleType::Subtle
    } else {
        ui::StyleType::Error
    }
}

#[derive(Default)]
struct Screen {
    base: Option<CurrencyCode>,
    rows: Vec<RateRow>,
    rendered_at: Option<Instant>,
    status: String,
    updated: Option<DateTime<Local>>,
    /// Whether the frame on the terminal carries the highlight.
    highlighted: bool,
    draws: usize,
}

impl Screen {
    fn flashing(&self, row: &RateRow, now: Instant) -> bool {
        let since_render = self
            .rendered_at
            .map_or(Duration::MAX, |at| now.saturating_duration_since(at));
        row.marker.is_some_and(|m| since_render < m.flash)
    }

    fn draw(&self, now: Instant) -> String {
        let title = match &self.base {
            Some(base) => format!("Live rates (1 {base})"),
            None => "Live rates".to_string(),
        };
        let mut output = format!("{}\n\n", ui::style_text(&title, ui::StyleType::Title));

        if !self.rows.is_empty() {
            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Rate")]);
            for row in &self.rows {
                table.add_row(vec![
                    Cell::new(&row.code),
                    ui::rate_cell(row, self.flashing(row, now)),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        if let Some(updated) = self.updated {
            let text = format!("Updated {}", updated.format("%H:%M:%S"));
            output.push_str(&ui::style_text(&text, ui::StyleType::Subtle));
            output.push('\n');
        }
        if !self.status.is_empty() {
            output.push_str(&ui::style_text(&self.status, status_style(&self.status)));
            output.push('\n');
        }
        output.push_str(&ui::style_text(
            "Type a currency code to switch base, Enter to refresh, Ctrl-C to quit",
            ui::StyleType::Subtle,
        ));
        output
    }

    fn redraw(&mut self, term: &Term) {
        let now = Instant::now();
        let frame = self.draw(now);
        self.highlighted = self.rows.iter().any(|row| self.flashing(row, now));
        self.draws += 1;

        if term.is_term() {
            let _ = term.clear_screen();
        }
        if let Err(e) = term.write_line(&frame) {
            debug!(error = %e, "Failed to draw live rates");
        }
    }
}

/// Draws the live table on the terminal, redrawing on every update and once
/// more when the highlight of a render expires.
pub struct ConsoleSink {
    term: Term,
    priority: Vec<CurrencyCode>,
    flash: Duration,
    screen: Arc<Mutex<Screen>>,
}

impl ConsoleSink {
    pub fn new(priority: Vec<CurrencyCode>, flash: Duration) -> Self {
        Self {
            term: Term::stdout(),
            priority,
            flash,
            screen: Arc::new(Mutex::new(Screen::default())),
        }
    }

    fn update<F: FnOnce(&mut Screen)>(&self, change: F) {
        let Ok(mut screen) = self.screen.lock() else {
            return;
        };
        change(&mut screen);
        screen.redraw(&self.term);
    }

    /// Redraws once the highlight of the render at `rendered_at` has expired,
    /// unless a newer render replaced it.
    fn schedule_flash_expiry(&self, rendered_at: Instant) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let screen = Arc::clone(&self.screen);
        let term = self.term.clone();
        let expires_at = rendered_at + self.flash;

        handle.spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            let Ok(mut screen) = screen.lock() else {
                return;
            };
            if screen.rendered_at == Some(rendered_at) {
                screen.redraw(&term);
            }
        });
    }
}

impl PresentationSink for ConsoleSink {
    fn render_rates(&self, snapshot: &RateSnapshot, classifications: &Classifications) {
        let rows = build_rows(snapshot, classifications, &self.priority, self.flash);
        let has_markers = rows.iter().any(|row| row.marker.is_some());
        let rendered_at = Instant::now();
        self.update(|screen| {
            screen.base = Some(snapshot.base().clone());
            screen.rows = rows;
            screen.rendered_at = Some(rendered_at);
        });

        if has_markers {
            self.schedule_flash_expiry(rendered_at);
        }
    }

    fn set_status(&self, message: &str) {
        self.update(|screen| screen.status = message.to_string());
    }

    fn set_updated_timestamp(&self, time: DateTime<Local>) {
        self.update(|screen| screen.updated = Some(time));
    }
}

enum Input {
    Refresh,
    Quit,
    Base(CurrencyCode),
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let text = line.trim();
    match text {
        "" => Input::Refresh,
        "q" | "quit" | "exit" => Input::Quit,
        _ => match text.parse() {
            Ok(code) => Input::Base(code),
            Err(e) => Input::Invalid(e.to_string()),
        },
    }
}

/// Polls live rates until Ctrl-C, `quit` on stdin, or `duration` elapses.
pub async fn run(
    source: Arc<dyn RateSource>,
    base: CurrencyCode,
    settings: PollSettings,
    priority: Vec<CurrencyCode>,
    flash: Duration,
    duration: Option<Duration>,
) -> Result<()> {
    let sink = Arc::new(ConsoleSink::new(priority, flash));
    let poller = LivePoller::new(source, sink.clone(), base, settings)?;
    poller.start().await;

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(text)) => match parse_input(&text) {
                    Input::Refresh => poller.refresh().await,
                    Input::Quit => break,
                    Input::Base(code) => poller.change_base(code).await,
                    Input::Invalid(message) => sink.set_status(&message),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    poller.dispose().await;
    Ok(())
}
