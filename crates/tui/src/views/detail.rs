use crate::app::App;
use crate::theme::{self, Theme};
use mcphub_dashboard::{Backend, Revealed};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

/// Right-hand panel for the selected app: status, links, and any revealed
/// password or logs.
pub fn render<B: Backend>(frame: &mut Frame, app: &App<B>, area: Rect) {
    let Some(selected) = app.selected_app() else {
        frame.render_widget(Theme::block_dim().title(" Details "), area);
        return;
    };
    let name = selected.name.as_str();
    let running = selected.is_running();
    let dash = &app.dash;

    let block = Theme::block().title(format!(" {name} "));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = Style::new().fg(Theme::TEXT_SECONDARY);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Status    ", label),
            Span::styled(
                selected.status.clone(),
                Style::new().fg(theme::status_color(running)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Auth      ", label),
            Span::styled(
                selected.auth_type.display(),
                Style::new().fg(theme::auth_badge_color(selected.auth_type)),
            ),
        ]),
    ];
    if let Some(url) = dash.ide_url(name) {
        lines.push(Line::from(vec![
            Span::styled("Web IDE   ", label),
            Span::styled(url, Style::new().fg(Theme::ACCENT_BLUE).underlined()),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(password_line(dash.passwords().get(name), dash.passwords().is_pending(name)));
    lines.push(Line::raw(""));

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let action_style = |enabled: bool| {
        if enabled {
            key_style
        } else {
            Style::new().fg(Theme::TEXT_DISABLED)
        }
    };
    let busy = dash.is_busy();
    lines.push(Line::from(vec![
        Span::styled("d ", action_style(!busy)),
        Span::styled(format!("{}  ", selected.deploy_label().to_lowercase()), desc_style),
        Span::styled("s ", action_style(!busy && running)),
        Span::styled("stop  ", desc_style),
        Span::styled("x ", action_style(!busy)),
        Span::styled("delete  ", desc_style),
        Span::styled("b ", action_style(!dash.rebuild().is_building_app(name))),
        Span::styled("rebuild  ", desc_style),
    ]));
    lines.push(Line::from(vec![
        Span::styled("l ", key_style),
        Span::styled("logs  ", desc_style),
        Span::styled("p ", action_style(running || dash.passwords().is_revealed(name))),
        Span::styled("password  ", desc_style),
        Span::styled("P ", action_style(running)),
        Span::styled("reset  ", desc_style),
        Span::styled("a ", key_style),
        Span::styled("auth  ", desc_style),
        Span::styled("o ", action_style(running)),
        Span::styled("IDE", desc_style),
    ]));

    let [summary_area, logs_area] =
        Layout::vertical([Constraint::Length(lines.len() as u16), Constraint::Fill(1)]).areas(inner);
    frame.render_widget(Paragraph::new(lines), summary_area);

    if dash.logs().is_revealed(name) || dash.logs().is_pending(name) {
        render_logs(frame, dash.logs().get(name), logs_area);
    }
}

fn password_line(value: Option<&Revealed>, pending: bool) -> Line<'static> {
    let label = Span::styled("Password  ", Style::new().fg(Theme::TEXT_SECONDARY));
    let value = match value {
        Some(Revealed::Ok(password)) => Span::styled(
            format!("{password}  (c to copy)"),
            Style::new().fg(Theme::ACCENT_YELLOW),
        ),
        Some(Revealed::Err(message)) => {
            Span::styled(message.clone(), Style::new().fg(Theme::ACCENT_RED))
        }
        None if pending => Span::styled("Loading...", Style::new().fg(Theme::TEXT_MUTED).italic()),
        None => Span::styled("hidden", Style::new().fg(Theme::TEXT_MUTED)),
    };
    Line::from(vec![label, value])
}

fn render_logs(frame: &mut Frame, value: Option<&Revealed>, area: Rect) {
    let block = Theme::block_dim().title(" Logs ");
    let paragraph = match value {
        Some(Revealed::Ok(text)) => {
            let height = area.height.saturating_sub(2) as usize;
            let total = text.lines().count();
            let tail: Vec<Line> = text
                .lines()
                .skip(total.saturating_sub(height))
                .map(|l| Line::raw(l.to_string()))
                .collect();
            Paragraph::new(tail).style(Style::new().fg(Theme::TEXT_CONTENT))
        }
        Some(Revealed::Err(message)) => {
            Paragraph::new(message.clone()).style(Style::new().fg(Theme::ACCENT_RED))
        }
        None => Paragraph::new("Loading logs...").style(Style::new().fg(Theme::TEXT_MUTED).italic()),
    };
    frame.render_widget(paragraph.block(block).wrap(Wrap { trim: false }), area);
}
