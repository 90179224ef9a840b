use crate::app::App;
use crate::follow::wrap_rows;
use crate::theme::{self, Theme};
use mcphub_dashboard::rebuild::WAITING_FOR_OUTPUT;
use mcphub_dashboard::{Backend, RebuildOutcome};
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

pub fn render<B: Backend>(frame: &mut Frame, app: &mut App<B>) {
    let Some(session) = app.dash.rebuild().session() else {
        return;
    };
    let area = frame.area();
    let popup = super::centered(area, area.width.saturating_sub(8), area.height.saturating_sub(4));
    frame.render_widget(Clear, popup);

    let outcome = session.outcome;
    let block = Theme::block_accent()
        .title(format!(" Rebuild: {} ", session.app_name))
        .title(
            Line::from(Span::styled(
                format!(" {} ", outcome.label()),
                Style::new().fg(theme::outcome_color(outcome)).bold(),
            ))
            .right_aligned(),
        );
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [log_area, hint_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    let height = log_area.height as usize;
    let rows: Vec<String> = session
        .log_lines
        .iter()
        .flat_map(|l| wrap_rows(l, log_area.width as usize))
        .collect();
    let total = rows.len();
    let lines: Vec<Line> = if total == 0 && outcome == RebuildOutcome::Building {
        vec![Line::from(Span::styled(
            WAITING_FOR_OUTPUT,
            Style::new().fg(Theme::TEXT_MUTED).italic(),
        ))]
    } else {
        let offset = app.rebuild_follow.offset(total, height);
        rows.into_iter().skip(offset).take(height).map(Line::raw).collect()
    };
    frame.render_widget(
        Paragraph::new(lines).style(Style::new().fg(Theme::TEXT_CONTENT)),
        log_area,
    );

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let mut hints = vec![
        Span::styled(" j/k ", key_style),
        Span::styled("scroll  ", desc_style),
        Span::styled("G ", key_style),
        Span::styled("follow  ", desc_style),
    ];
    match outcome {
        RebuildOutcome::Building => {}
        RebuildOutcome::Success => {
            hints.push(Span::styled("o ", key_style));
            hints.push(Span::styled("open IDE  ", desc_style));
        }
        RebuildOutcome::Failed => {
            hints.push(Span::styled("r ", key_style));
            hints.push(Span::styled("retry  ", desc_style));
        }
    }
    if outcome.is_terminal() {
        hints.push(Span::styled("Esc ", key_style));
        hints.push(Span::styled("close", desc_style));
    }
    frame.render_widget(Paragraph::new(Line::from(hints)), hint_area);

    app.rebuild_viewport = height.max(1);
    app.rebuild_rows = total;
}
