use crate::app::{App, FlashLevel, Screen};
use crate::theme::{self, Theme};
use crate::views::{auth_editor, create, login, modal, rebuild, roster};
use mcphub_dashboard::Backend;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render<B: Backend>(frame: &mut Frame, app: &mut App<B>) {
    let screen = app.screen();
    let server_url = app.dash.options().server_url.clone();

    match screen {
        Screen::Checking => {
            let area = frame.area();
            login::render_checking(frame, area);
            return;
        }
        Screen::Login => {
            login::render(frame, app, &server_url);
            return;
        }
        _ => {}
    }

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, &server_url, header_area);
    roster::render(frame, app, body_area);
    render_footer(frame, app, screen, footer_area);

    match screen {
        Screen::Confirm => {
            if let Some(action) = app.dash.pending_confirm() {
                modal::render(frame, action);
            }
        }
        Screen::Create => create::render(frame, app),
        Screen::AuthEditor => auth_editor::render(frame, app),
        Screen::Rebuild => rebuild::render(frame, app),
        Screen::Roster | Screen::Checking | Screen::Login => {}
    }
}

fn render_header<B: Backend>(frame: &mut Frame, app: &App<B>, server_url: &str, area: Rect) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let apps = app.dash.roster().apps();
    let running = apps.iter().filter(|a| a.is_running()).count();

    let mut spans = vec![
        Span::styled(
            " mcphub ",
            Style::new()
                .fg(Color::Black)
                .bg(Theme::ACCENT_ORANGE)
                .bold(),
        ),
        Span::styled(format!("  {server_url}"), Style::new().fg(Theme::TEXT_SECONDARY)),
        Span::styled(
            format!("  {} apps, {running} running", apps.len()),
            Style::new().fg(Theme::TEXT_PRIMARY),
        ),
    ];
    if app.dash.is_busy() {
        spans.push(Span::styled(
            "  Working...",
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        ));
    }
    if let Some(session) = app.dash.rebuild().session() {
        spans.push(Span::styled(
            format!("  rebuild {}: {}", session.app_name, session.outcome.label()),
            Style::new().fg(theme::outcome_color(session.outcome)),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_footer<B: Backend>(frame: &mut Frame, app: &App<B>, screen: Screen, area: Rect) {
    if let Some((ref msg, level)) = app.flash_message {
        let color = match level {
            FlashLevel::Success => Theme::ACCENT_GREEN,
            FlashLevel::Error => Theme::ACCENT_RED,
            FlashLevel::Info => Theme::ACCENT_BLUE,
        };
        let line = Line::from(Span::styled(format!(" {msg}"), Style::new().fg(color)));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }
    if let Some(notice) = app.dash.notice() {
        let line = Line::from(vec![
            Span::styled(
                format!(" {}", notice.message),
                Style::new().fg(theme::notice_color(notice.level)),
            ),
            Span::styled("  (Esc to dismiss)", Style::new().fg(Theme::TEXT_KEY_DESC)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let hints: &[(&str, &str)] = match screen {
        Screen::Roster => &[
            (" j/k ", "navigate  "),
            ("n ", "new  "),
            ("r ", "refresh  "),
            ("L ", "logout  "),
            ("q ", "quit"),
        ],
        Screen::Rebuild => &[(" j/k ", "scroll  "), ("Esc ", "close when finished")],
        _ => &[(" Esc ", "cancel")],
    };
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(*key, key_style),
                Span::styled(*desc, desc_style),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
