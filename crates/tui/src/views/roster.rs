use crate::app::App;
use crate::theme::{self, Theme};
use mcphub_api::AppSummary;
use mcphub_dashboard::Backend;
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, Paragraph};

pub fn render<B: Backend>(frame: &mut Frame, app: &mut App<B>, area: Rect) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    super::detail::render(frame, app, detail_area);

    let apps = app.dash.roster().apps();
    if apps.is_empty() {
        let block = Theme::block_dim()
            .title(" Apps ")
            .padding(Theme::PADDING_CARD);
        let msg = Paragraph::new("No apps yet. Press n to create one.")
            .block(block)
            .style(Style::new().fg(Color::DarkGray));
        frame.render_widget(msg, list_area);
        return;
    }

    let items: Vec<ListItem> = apps.iter().map(app_to_list_item).collect();
    let list = List::new(items)
        .block(Theme::block().title(format!(" Apps ({}) ", apps.len())))
        .highlight_style(
            Style::new()
                .bg(Theme::BG_SURFACE)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(" > ")
        .highlight_spacing(ratatui::widgets::HighlightSpacing::Always);

    frame.render_stateful_widget(list, list_area, &mut app.list_state);
}

fn app_to_list_item(summary: &AppSummary) -> ListItem<'static> {
    let running = summary.is_running();
    let mut line1 = vec![
        Span::styled(
            summary.name.clone(),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
        Span::styled("  ", Style::new()),
    ];
    if let Some(badge) = summary.auth_type.badge() {
        line1.push(Span::styled(
            format!(" {badge} "),
            Style::new()
                .fg(Color::Black)
                .bg(theme::auth_badge_color(summary.auth_type)),
        ));
    }

    let marker = if running { "\u{25cf} " } else { "\u{25cb} " };
    let line2 = Line::from(vec![
        Span::styled("   ", Style::new()),
        Span::styled(marker, Style::new().fg(theme::status_color(running))),
        Span::styled(
            summary.status_label().to_string(),
            Style::new().fg(theme::status_color(running)),
        ),
    ]);

    ListItem::new(vec![Line::from(line1), line2])
}
