use crate::app::App;
use crate::theme::Theme;
use mcphub_dashboard::Backend;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

pub fn render_checking(frame: &mut Frame, area: Rect) {
    let popup = super::centered(area, 40, 5);
    let msg = Paragraph::new("Checking session...")
        .alignment(Alignment::Center)
        .block(Theme::block_dim().padding(Theme::PADDING_COMPACT))
        .style(Style::new().fg(Theme::ACCENT_BLUE));
    frame.render_widget(msg, popup);
}

pub fn render<B: Backend>(frame: &mut Frame, app: &App<B>, server_url: &str) {
    let popup = super::centered(frame.area(), 52, 11);
    frame.render_widget(Clear, popup);

    let session = app.dash.session();
    let block = Theme::block_accent()
        .title(" mcphub ")
        .title_style(Style::new().fg(Theme::ACCENT_ORANGE).bold())
        .padding(Theme::PADDING_COMPACT);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let masked = "•".repeat(session.password().chars().count());
    let password_line = if session.is_logging_in() {
        Line::from(Span::styled(
            "Logging in...",
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        ))
    } else {
        Line::from(vec![
            Span::styled("Password: ", Style::new().fg(Theme::TEXT_SECONDARY)),
            Span::styled(masked, Style::new().fg(Theme::TEXT_PRIMARY)),
            Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)),
        ])
    };

    let error_line = match session.login_error() {
        Some(err) => Line::from(Span::styled(err.message(), Style::new().fg(Theme::ACCENT_RED))),
        None => Line::raw(""),
    };

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let lines = vec![
        Line::from(Span::styled(
            server_url.to_string(),
            Style::new().fg(Theme::TEXT_MUTED),
        )),
        Line::raw(""),
        password_line,
        Line::raw(""),
        error_line,
        Line::raw(""),
        Line::from(vec![
            Span::styled("Enter ", key_style),
            Span::styled("log in  ", desc_style),
            Span::styled("Esc ", key_style),
            Span::styled("quit", desc_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
