//! Ratatui-based terminal dashboard.
//!
//! The dashboard shows the run settings, triggers analysis runs on demand, and
//! renders the normalized result: insights on the left, rating chart and
//! summary metrics on the right. Runs are blocking; the status line shows the
//! stage reached.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::pipeline::{self, Endpoints, RunOutput, RunStage};
use crate::data::{Credentials, OpenAiClient, SerpApiClient};
use crate::domain::{AnalysisResult, RunRequest};
use crate::error::AppError;
use crate::report::{sentiment_marker, summarize};

mod plotters_chart;

use plotters_chart::RatingBarsChart;

const REVIEW_STEP: usize = 5;
const MAX_REVIEWS_CAP: usize = 100;

/// Start the TUI.
pub fn run(request: RunRequest, credentials: Credentials, endpoints: Endpoints) -> Result<(), AppError> {
    let (reviews, llm) = pipeline::build_clients(&credentials, &endpoints)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(request, reviews, llm);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    request: RunRequest,
    reviews: SerpApiClient,
    llm: OpenAiClient,
    stage: RunStage,
    status: String,
    scroll: u16,
    run: Option<RunOutput>,
}

/// Keys that need a terminal redraw before the action runs.
enum Action {
    None,
    Quit,
    StartRun,
}

impl App {
    fn new(request: RunRequest, reviews: SerpApiClient, llm: OpenAiClient) -> Self {
        Self {
            request,
            reviews,
            llm,
            stage: RunStage::Idle,
            status: "Press r to fetch and analyze reviews.".to_string(),
            scroll: 0,
            run: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                self.redraw(terminal)?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match self.handle_key(key.code) {
                        Action::Quit => break,
                        Action::StartRun => {
                            // Show "fetching" before blocking on the network.
                            self.stage = RunStage::Fetching;
                            self.status = format!(
                                "Fetching {} reviews and analyzing with {}...",
                                self.request.max_reviews, self.request.model
                            );
                            self.redraw(terminal)?;
                            self.start_run();
                        }
                        Action::None => {}
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn redraw<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        terminal
            .draw(|f| self.draw(f))
            .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') => return Action::StartRun,
            KeyCode::Char('e') => self.export(),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Left => self.adjust_max_reviews(false),
            KeyCode::Right => self.adjust_max_reviews(true),
            _ => {}
        }
        Action::None
    }

    fn adjust_max_reviews(&mut self, up: bool) {
        self.request.max_reviews = step_max_reviews(self.request.max_reviews, up);
        self.status = format!("reviews per run: {}", self.request.max_reviews);
    }

    fn start_run(&mut self) {
        let mut last = RunStage::Idle;
        let result = pipeline::run_with_progress(&self.request, &self.reviews, &self.llm, &mut |s| last = s);
        self.stage = last;

        match result {
            Ok(run) => {
                self.status = match &run.warning {
                    Some(w) => format!("Analyzed {} reviews, with formatting issues ({w}).", run.reviews.len()),
                    None => format!("Analysis complete! Analyzed {} reviews.", run.reviews.len()),
                };
                self.scroll = 0;
                self.run = Some(run);
            }
            Err(failure) => {
                self.status = format!("Run stopped at {failure}. Press r to retry.");
            }
        }
    }

    fn export(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to export yet; press r to run an analysis.".to_string();
            return;
        };
        match crate::io::write_analysis_json(
            std::path::Path::new("."),
            &run.request.app_name,
            &run.analysis,
            chrono::Utc::now(),
        ) {
            Ok(path) => self.status = format!("Wrote {}", path.display()),
            Err(err) => self.status = format!("Export failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("insights", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - {} mobile experience", self.request.app_name)),
            ]),
            Line::from(Span::styled(
                format!(
                    "app id: {} | reviews: {} | model: {} | stage: {}",
                    self.request.app_id, self.request.max_reviews, self.request.model, self.stage,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.draw_insights(frame, chunks[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(chunks[1]);

        self.draw_chart(frame, right[0]);
        self.draw_metrics(frame, right[1]);
    }

    fn draw_insights(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Key insights").borders(Borders::ALL);
        let Some(run) = &self.run else {
            let msg = Paragraph::new("No analysis yet.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let p = Paragraph::new(Text::from(insight_lines(&run.analysis)))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Rating distribution").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let widget = RatingBarsChart {
            distribution: run.analysis.rating_distribution,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines = Vec::new();
        if let Some(run) = &self.run {
            let summary = summarize(run);
            lines.push(Line::from(format!("Total reviews: {}", summary.total_reviews)));
            lines.push(Line::from(format!(
                "Average rating: {:.1} / 5 (n={})",
                summary.average_rating, summary.rated_reviews
            )));
            lines.push(Line::from(format!(
                "Sent to model: {} of {} with text",
                summary.reviews_embedded, summary.reviews_with_text
            )));
            lines.push(Line::from(format!("Status: {}", summary.status_label())));
        } else {
            lines.push(Line::from("-"));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Summary").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "r run  e export  ←/→ reviews  ↑/↓ scroll  q quit";
        let status_style = if self.stage.is_failed() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, status_style),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn step_max_reviews(current: usize, up: bool) -> usize {
    let next = if up {
        current.saturating_add(REVIEW_STEP)
    } else {
        current.saturating_sub(REVIEW_STEP)
    };
    next.clamp(REVIEW_STEP, MAX_REVIEWS_CAP)
}

fn insight_lines(analysis: &AnalysisResult) -> Vec<Line<'static>> {
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(format!(
            "Overall sentiment: {} {}",
            analysis.overall_sentiment.title(),
            sentiment_marker(&analysis.overall_sentiment)
        )),
        Line::from(format!("Sentiment score: {:.2}/1.0", analysis.sentiment_score)),
    ];

    let sections: [(&str, &[String]); 3] = [
        ("Key themes", &analysis.key_themes),
        ("Common issues", &analysis.common_issues),
        ("Strengths", &analysis.strengths),
    ];
    for (title, items) in sections {
        push_section(&mut lines, title, items, heading);
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("User experience feedback", heading)));
    lines.push(Line::from(analysis.user_experience_feedback.clone()));

    push_section(&mut lines, "Feature requests", &analysis.feature_requests, heading);
    lines
}

fn push_section(lines: &mut Vec<Line<'static>>, title: &str, items: &[String], heading: Style) {
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(title.to_string(), heading)));
    for item in items {
        lines.push(Line::from(format!("• {item}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fallback_analysis;

    #[test]
    fn max_reviews_steps_within_bounds() {
        assert_eq!(step_max_reviews(25, true), 30);
        assert_eq!(step_max_reviews(25, false), 20);
        assert_eq!(step_max_reviews(5, false), 5);
        assert_eq!(step_max_reviews(100, true), 100);
    }

    #[test]
    fn insight_lines_cover_every_section() {
        let lines = insight_lines(&fallback_analysis());
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(text[0], "Overall sentiment: Neutral :|");
        assert_eq!(text[1], "Sentiment score: 0.50/1.0");
        for heading in ["Key themes", "Common issues", "Strengths", "User experience feedback", "Feature requests"] {
            assert!(text.iter().any(|l| l == heading), "missing {heading}");
        }
        assert!(text.iter().any(|l| l == "• User feedback processed"));
    }
}
