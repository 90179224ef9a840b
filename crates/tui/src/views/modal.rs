use crate::theme::Theme;
use mcphub_dashboard::ConfirmAction;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

/// Render the confirmation dialog on top of everything.
pub fn render(frame: &mut Frame, action: &ConfirmAction) {
    let popup_area = super::centered(frame.area(), 56, 9);
    frame.render_widget(Clear, popup_area);

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);

    let block = Block::bordered()
        .border_type(ratatui::widgets::BorderType::Rounded)
        .title(format!(" {} ", action.title()))
        .border_style(Style::new().fg(Theme::ACCENT_YELLOW))
        .padding(Theme::PADDING_COMPACT);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            action.message(),
            Style::new().fg(Theme::TEXT_PRIMARY),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y/Enter ", key_style),
            Span::styled("confirm  ", desc_style),
            Span::styled("n/Esc ", key_style),
            Span::styled("cancel", desc_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
