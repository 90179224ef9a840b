use crate::app::{App, AuthField};
use crate::theme::Theme;
use mcphub_api::AuthType;
use mcphub_dashboard::{Backend, EditorPhase};
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph, Wrap};

pub fn render<B: Backend>(frame: &mut Frame, app: &App<B>) {
    let editor = app.dash.auth_editor();
    let popup = super::centered(frame.area(), 70, 14);
    frame.render_widget(Clear, popup);

    let block = Theme::block_accent()
        .title(format!(" Auth: {} ", editor.app().unwrap_or_default()))
        .padding(Theme::PADDING_COMPACT);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    if editor.phase() == EditorPhase::Loading {
        let msg = Paragraph::new("Loading auth config...")
            .style(Style::new().fg(Theme::ACCENT_BLUE).italic());
        frame.render_widget(msg, inner);
        return;
    }

    let draft = editor.draft();
    let focused = |field: AuthField| app.auth_field == field;
    let mut lines = vec![field_line(
        "Mode",
        format!("< {} >", draft.auth_type.display()),
        focused(AuthField::Mode),
    )];
    match draft.auth_type {
        AuthType::None => lines.push(Line::from(Span::styled(
            "The MCP endpoint accepts unauthenticated requests.",
            Style::new().fg(Theme::TEXT_MUTED),
        ))),
        AuthType::ApiKey => {
            lines.push(field_line("API key", draft.api_key.clone(), focused(AuthField::ApiKey)));
        }
        AuthType::EntraId => {
            lines.push(field_line(
                "Tenant ID",
                draft.tenant_id.clone(),
                focused(AuthField::TenantId),
            ));
            lines.push(field_line(
                "Client ID",
                draft.client_id.clone(),
                focused(AuthField::ClientId),
            ));
        }
    }

    lines.push(Line::raw(""));
    lines.push(match (editor.phase(), editor.error()) {
        (EditorPhase::Saving, _) => Line::from(Span::styled(
            "Saving...",
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        )),
        (_, Some(error)) => Line::from(Span::styled(
            error.to_string(),
            Style::new().fg(Theme::ACCENT_RED),
        )),
        _ => Line::raw(""),
    });

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let mut hints = vec![
        Span::styled("Tab ", key_style),
        Span::styled("field  ", desc_style),
        Span::styled("\u{2190}/\u{2192} ", key_style),
        Span::styled("mode  ", desc_style),
    ];
    if draft.auth_type == AuthType::ApiKey {
        hints.push(Span::styled("Ctrl-G ", key_style));
        hints.push(Span::styled("generate  ", desc_style));
    }
    hints.extend([
        Span::styled("Enter ", key_style),
        Span::styled("save  ", desc_style),
        Span::styled("Esc ", key_style),
        Span::styled("cancel", desc_style),
    ]);
    lines.push(Line::from(hints));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn field_line(label: &str, value: String, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::new().fg(Theme::ACCENT_YELLOW).bold()
    } else {
        Style::new().fg(Theme::TEXT_SECONDARY)
    };
    let mut spans = vec![
        Span::styled(format!("{label:<10} "), label_style),
        Span::styled(value, Style::new().fg(Theme::TEXT_PRIMARY)),
    ];
    if focused {
        spans.push(Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)));
    }
    Line::from(spans)
}
