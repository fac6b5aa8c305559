// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Layout, title, footer, and item helpers used by TUI rendering.
fn stack_main_panes_vertically(area: Rect) -> bool {
    area.width < 90
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Plan,
    History,
}

impl Focus {
    fn cycle(self) -> Self {
        match self {
            Self::Input => Self::Plan,
            Self::Plan => Self::History,
            Self::History => Self::Input,
        }
    }

    fn cycle_back(self) -> Self {
        match self {
            Self::Input => Self::History,
            Self::Plan => Self::Input,
            Self::History => Self::Plan,
        }
    }
}

fn view_title(label: &str, key: char, tail: Option<&str>) -> String {
    let mut title = format!("─[{key}]─ {label}");
    if let Some(tail) = tail {
        let tail = tail.trim();
        if !tail.is_empty() {
            title.push(' ');
            title.push_str(tail);
        }
    }
    title.push(' ');
    title
}

fn clamp_positive_i32_to_u16(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}

/// A `width_percent` wide, `height` tall rect centered in `area`.
fn centered_rect(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(width_percent.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn expansion_marker(expansion: ExpansionState, has_cache: bool) -> &'static str {
    match expansion {
        ExpansionState::Expanded => "▾",
        ExpansionState::Loading => "…",
        ExpansionState::Collapsed if has_cache => "▸",
        ExpansionState::Collapsed => "▹",
    }
}

fn plan_item_line(theme: &TuiTheme, depth: usize, node: &crate::explore::ExpansionNode) -> Line<'static> {
    let check = if node.is_completed() { "[x] " } else { "[ ] " };
    let marker = expansion_marker(node.expansion(), node.cached_child().is_some());
    let title_style = if node.is_completed() { theme.completed_style() } else { theme.base_style() };

    Line::from(vec![
        Span::raw("  ".repeat(depth)),
        Span::styled(format!("{marker} "), theme.muted_style()),
        Span::styled(check, theme.muted_style()),
        Span::styled(format!("{}. {}", node.step().order(), node.step().title()), title_style),
    ])
}

fn step_detail_text(theme: &TuiTheme, step: &crate::model::Step) -> Text<'static> {
    let mut lines = vec![Line::from(step.description().to_owned())];
    let links = step.resource_links();
    if !links.is_empty() {
        lines.push(Line::from(String::new()));
    }
    for link in links {
        lines.push(Line::from(vec![
            Span::raw("• "),
            Span::raw(link.label().to_owned()),
            Span::raw(" "),
            Span::styled(link.url().to_string(), theme.link_style()),
        ]));
    }
    Text::from(lines)
}

fn footer_hints(app: &App) -> &'static [(&'static str, &'static str)] {
    match (app.focus, app.mode()) {
        (Focus::Input, _) => &[("⏎", "generate"), ("esc", "leave"), ("⇥", "focus")],
        (Focus::History, _) => &[("⏎", "restore"), ("d", "delete"), ("D", "clear"), ("⇥", "focus"), ("q", "quit")],
        (Focus::Plan, ViewMode::Roadmap) => &[
            ("⏎", "deep-dive"),
            ("x", "done"),
            ("y", "copy link"),
            ("m", "diagram"),
            ("p", "persona"),
            ("q", "quit"),
        ],
        (Focus::Plan, ViewMode::Diagram) => &[
            ("+/-", "zoom"),
            ("0", "reset"),
            ("←↑↓→", "pan"),
            ("f", "fullscreen"),
            ("e/s", "png/svg"),
            ("m", "roadmap"),
            ("q", "quit"),
        ],
    }
}

fn footer_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, (key, label)) in footer_hints(app).iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled((*key).to_owned(), app.theme.key_style()));
        spans.push(Span::styled(format!(" {label}"), app.theme.muted_style()));
    }

    if app.workbench.store().is_loading() {
        spans.push(Span::raw("  │ "));
        spans.push(Span::styled("generating…", app.theme.key_style()));
    }
    if !app.workbench.is_online() {
        spans.push(Span::raw("  │ "));
        spans.push(Span::styled("offline", app.theme.error_style()));
    }
    if let Some(toast) = &app.toast {
        spans.push(Span::raw("  │ "));
        spans.push(Span::raw(toast.message.clone()));
    }
    Line::from(spans)
}
