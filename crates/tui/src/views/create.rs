use crate::app::App;
use crate::theme::Theme;
use mcphub_dashboard::Backend;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

pub fn render<B: Backend>(frame: &mut Frame, app: &App<B>) {
    let Some(dialog) = app.dash.create_dialog() else {
        return;
    };
    let popup = super::centered(frame.area(), 50, 9);
    frame.render_widget(Clear, popup);

    let block = Theme::block_accent()
        .title(" New App ")
        .padding(Theme::PADDING_COMPACT);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let validation = match app.dash.create_error() {
        Some(message) => Line::from(Span::styled(message, Style::new().fg(Theme::ACCENT_RED))),
        None if app.dash.is_busy() => Line::from(Span::styled(
            "Creating...",
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        )),
        None => Line::raw(""),
    };
    let submit_style = if app.dash.can_submit_create() {
        Style::new().fg(Theme::TEXT_KEY)
    } else {
        Style::new().fg(Theme::TEXT_DISABLED)
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Name: ", Style::new().fg(Theme::TEXT_SECONDARY)),
            Span::styled(dialog.name.clone(), Style::new().fg(Theme::TEXT_PRIMARY)),
            Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)),
        ]),
        Line::raw(""),
        validation,
        Line::raw(""),
        Line::from(vec![
            Span::styled("Enter ", submit_style),
            Span::styled("create  ", Style::new().fg(Theme::TEXT_KEY_DESC)),
            Span::styled("Esc ", Style::new().fg(Theme::TEXT_KEY)),
            Span::styled("cancel", Style::new().fg(Theme::TEXT_KEY_DESC)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
