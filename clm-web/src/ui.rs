//! Terminal UI rendering for CLM Web
//!
//! This module mirrors clm-cli's UI but uses ratzilla's rendering.

use ratzilla::ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
    },
    Frame,
};

use clm_core::markup::{self, BlockKind, SegmentStyle};
use clm_core::{
    classify, AnswerRow, AnswerValue, App, CurveStyle, Focus, InputTarget, InputType, LayoutProbe, MatchColumn,
    Mode, Page, Theme,
};

// Catppuccin Mocha colors
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const BASE: Color = Color::Rgb(30, 30, 46);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const RED: Color = Color::Rgb(243, 139, 168);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);
const TEAL: Color = Color::Rgb(148, 226, 213);

const TERM_HEIGHT: u16 = 3;
const DEFINITION_HEIGHT: u16 = 4;
const CURVE_STEPS: usize = 24;

/// Where the matching boxes were drawn, in terminal cells.
#[derive(Debug, Default)]
pub struct MatchLayout {
    terms: Vec<(String, clm_core::Rect)>,
    definitions: Vec<(String, clm_core::Rect)>,
}

impl LayoutProbe for MatchLayout {
    fn term_rect(&self, id: &str) -> Option<clm_core::Rect> {
        self.terms.iter().find(|(t, _)| t == id).map(|(_, r)| *r)
    }

    fn definition_rect(&self, id: &str) -> Option<clm_core::Rect> {
        self.definitions.iter().find(|(d, _)| d == id).map(|(_, r)| *r)
    }
}

fn cell_rect(area: Rect) -> clm_core::Rect {
    clm_core::Rect::new(area.x as f64, area.y as f64, area.width as f64, area.height as f64)
}

pub fn draw(frame: &mut Frame, app: &App) -> MatchLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);

    let mut layout = MatchLayout::default();
    match app.page {
        Page::Document => draw_document_page(frame, app, chunks[1]),
        Page::Questionnaire => draw_questionnaire(frame, app, chunks[1]),
        Page::LiveGeneration => draw_live_generation(frame, app, chunks[1]),
        Page::Matching => layout = draw_matching(frame, app, chunks[1]),
        Page::Finish => draw_finish(frame, app, chunks[1]),
    }

    draw_status_bar(frame, app, chunks[2]);

    // Draw popups/overlays
    match app.mode {
        Mode::TypePicker => draw_type_picker(frame, app),
        Mode::Input => draw_input_dialog(frame, app),
        Mode::Help => draw_help(frame),
        _ => {}
    }
    if let Some(alert) = &app.alert {
        draw_alert(frame, alert);
    }

    layout
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title_text = format!(
        " CLM Trainer - Level {} - {} - {}",
        app.level.suffix(),
        app.title(),
        app.page.title()
    );

    let title_bar = Paragraph::new(title_text).style(Style::default().fg(TEXT).bg(SURFACE0));

    frame.render_widget(title_bar, area);
}

fn panel(title: String, focused: bool) -> Block<'static> {
    let border = if focused { BLUE } else { SUBTEXT0 };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

// --------------------------------------------------------------------------
// Document page

fn draw_document_page(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Editor
            Constraint::Length(38), // Sidebar
        ])
        .split(area);

    draw_editor(frame, app, chunks[0]);
    draw_sidebar(frame, app, chunks[1]);
}

fn draw_editor(frame: &mut Frame, app: &App, area: Rect) {
    let mode_indicator = match app.mode {
        Mode::Visual => " [VISUAL]",
        _ => "",
    };

    let block = panel(format!("Agreement{}", mode_indicator), app.focus == Focus::Editor);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(doc) = &app.document else {
        return;
    };

    let highlights = doc.highlights_sorted();
    let selection = app.get_selection_range();
    let cursor_offset = app.cursor.offset();

    let mut lines: Vec<Line> = Vec::new();
    let mut line_start = 0;

    for line_text in doc.content.split('\n') {
        let mut spans: Vec<Span> = Vec::new();

        for (byte, ch) in line_text.char_indices() {
            let offset = line_start + byte;
            let mut style = Style::default().fg(TEXT);

            if let Some(h) = highlights.iter().find(|h| h.range.contains(offset)) {
                let color = if classify(&h.text).is_known() { TEAL } else { YELLOW };
                style = style.fg(color).add_modifier(Modifier::UNDERLINED);
            }

            if let Some((sel_start, sel_end)) = selection {
                if offset >= sel_start && offset < sel_end {
                    style = style.bg(SURFACE1).add_modifier(Modifier::BOLD);
                }
            }

            if offset == cursor_offset && app.focus == Focus::Editor {
                style = style.add_modifier(Modifier::REVERSED);
            }

            spans.push(Span::styled(ch.to_string(), style));
        }

        if line_text.is_empty() && line_start == cursor_offset {
            spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
        }

        lines.push(Line::from(spans));
        line_start += line_text.len() + 1; // +1 for newline
    }

    // Calculate scroll offset based on cursor
    let cursor = app.cursor_pos();
    let visible_height = inner.height as usize;
    let scroll_offset = if cursor.0 >= visible_height {
        cursor.0 - visible_height + 1
    } else {
        0
    };

    let paragraph = Paragraph::new(lines)
        .scroll((scroll_offset as u16, 0))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, inner);
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let count = app.document.as_ref().map(|d| d.highlights.len()).unwrap_or(0);
    let block = panel(format!("Highlights ({})", count), app.focus == Focus::Sidebar);

    let Some(doc) = &app.document else {
        frame.render_widget(block, area);
        return;
    };

    let items: Vec<ListItem> = doc
        .highlights_sorted()
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let selected = i == app.sidebar_selected;
            let marker = if selected { ">" } else { " " };
            let preview: String = h.text.chars().take(28).collect::<String>().replace('\n', " ");
            let identity = classify(&h.text)
                .identity
                .unwrap_or("(not a placeholder)");

            let style = if selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };

            ListItem::new(vec![
                Line::from(Span::styled(format!("{} \"{}\"", marker, preview), style)),
                Line::from(Span::styled(format!("   {}", identity), style.fg(SUBTEXT0))),
            ])
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// --------------------------------------------------------------------------
// Questionnaire

fn draw_questionnaire(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let block = panel(format!("Questions ({})", app.registry.len()), true);

    if app.registry.is_empty() {
        let empty = Paragraph::new("Highlight placeholders on the Document page (<) to create questions.")
            .style(Style::default().fg(SUBTEXT0))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = app
            .registry
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let selected = i == app.question_selected;
                let marker = if selected { ">" } else { " " };
                let required = if entry.required { "*" } else { " " };
                let style = if selected {
                    Style::default().fg(TEXT).bg(SURFACE1)
                } else {
                    Style::default().fg(TEXT)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} {:>2}. ", marker, i + 1), style),
                    Span::styled(format!("[{:<9}]", entry.input_type.as_str()), style.fg(MAUVE)),
                    Span::styled(format!("{} ", required), style.fg(RED)),
                    Span::styled(entry.display_label().to_string(), style),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(block), chunks[0]);
    }

    let detail = panel("Details".to_string(), false);
    let lines = match app.registry.get(app.question_selected) {
        Some(entry) => vec![
            Line::from(Span::styled("Question", Style::default().fg(MAUVE))),
            Line::from(entry.identity.clone()),
            Line::from(""),
            Line::from(Span::styled("Highlighted text", Style::default().fg(MAUVE))),
            Line::from(entry.raw_text.clone()),
            Line::from(""),
            Line::from(format!(
                "Type: {}{}",
                entry.input_type.as_str(),
                if entry.type_locked { " (chosen)" } else { "" }
            )),
            Line::from(format!("Required: {}", if entry.required { "yes" } else { "no" })),
        ],
        None => Vec::new(),
    };
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(detail), chunks[1]);
}

// --------------------------------------------------------------------------
// Live generation

fn answer_summary(value: Option<&AnswerValue>, input_type: InputType) -> String {
    match value {
        Some(AnswerValue::Flag(true)) => "Yes".to_string(),
        Some(AnswerValue::Flag(false)) => "No".to_string(),
        None | Some(AnswerValue::Unset) if input_type == InputType::Radio => "(y/n)".to_string(),
        Some(v) => v.display(),
        None => String::new(),
    }
}

fn row_lines(app: &App, row: AnswerRow, style: Style) -> Vec<Line<'static>> {
    let label = app.row_label(row);
    let mut error = None;

    let value = match row {
        AnswerRow::Question(index) => match app.registry.get(index) {
            Some(entry) => {
                error = app.answers.error(&entry.identity).map(str::to_string);
                answer_summary(app.answers.get(&entry.identity), entry.input_type)
            }
            None => String::new(),
        },
        AnswerRow::FollowUp { identity, .. } => {
            app.answers.text(identity).unwrap_or_default().to_string()
        }
        AnswerRow::ExtraLocation(slot) => app.additional_locations.get(slot).cloned().unwrap_or_default(),
        AnswerRow::AddLocation => String::new(),
        AnswerRow::HolidayOperation => {
            let op = app.holiday_operation_type().map_or("-", |op| op.as_str());
            let value = app.holiday_operation_value().unwrap_or_default();
            let result = app.holiday_pay().map(|p| p.to_string()).unwrap_or_default();
            format!("{} {} = {}  (o cycles)", op, value, result)
        }
    };

    let indent = match row {
        AnswerRow::Question(_) | AnswerRow::HolidayOperation => "",
        _ => "    ",
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{}{}", indent, label), style),
        Span::styled(
            if value.is_empty() { String::new() } else { format!("  {}", value) },
            style.fg(TEAL),
        ),
    ])];
    if let Some(error) = error.filter(|e| !e.is_empty()) {
        lines.push(Line::from(Span::styled(format!("{}  {}", indent, error), style.fg(RED))));
    }
    lines
}

fn draw_live_generation(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let rows = app.answer_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == app.row_selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };
            ListItem::new(row_lines(app, *row, style))
        })
        .collect();

    let answers = List::new(items).block(panel("Answers".to_string(), true));
    frame.render_widget(answers, chunks[0]);

    let preview = Paragraph::new(document_lines(&app.rendered, app.theme))
        .wrap(Wrap { trim: false })
        .block(panel("Agreement".to_string(), false));
    frame.render_widget(preview, chunks[1]);
}

/// Rendered agreement as styled lines.
fn document_lines(html: &str, theme: Theme) -> Vec<Line<'static>> {
    let highlight = match theme {
        Theme::Light => Style::default().fg(TEAL).add_modifier(Modifier::BOLD),
        Theme::Dark => Style::default().fg(BASE).bg(TEAL),
    };

    let mut lines = Vec::new();
    for block in markup::parse(html) {
        match block.kind {
            BlockKind::Heading(_) => lines.push(Line::from(Span::styled(
                block.text(),
                Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
            ))),
            BlockKind::Paragraph => {
                let spans: Vec<Span> = block
                    .segments
                    .into_iter()
                    .map(|segment| {
                        let style = match segment.style {
                            SegmentStyle::Plain => Style::default().fg(TEXT),
                            SegmentStyle::Bold => Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
                            SegmentStyle::Highlight => highlight,
                        };
                        Span::styled(segment.text, style)
                    })
                    .collect();
                lines.push(Line::from(spans));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

// --------------------------------------------------------------------------
// Matching

fn draw_matching(frame: &mut Frame, app: &App, area: Rect) -> MatchLayout {
    let outer = panel(
        format!(
            "Match each term to its definition ({}/{})",
            app.exercise.matched_count(),
            app.exercise.items().len()
        ),
        true,
    );
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(28),
            Constraint::Percentage(17),
            Constraint::Percentage(55),
        ])
        .split(inner);

    let mut layout = MatchLayout::default();
    let selected_term = app.exercise.selected_term();

    for (i, item) in app.exercise.items().iter().enumerate() {
        let y = columns[0].y + i as u16 * (DEFINITION_HEIGHT + 1);
        if y + DEFINITION_HEIGHT > inner.y + inner.height {
            break;
        }

        let term_area = Rect::new(columns[0].x, y, columns[0].width, TERM_HEIGHT);
        let def_area = Rect::new(columns[2].x, y, columns[2].width, DEFINITION_HEIGHT);

        let term_color = if item.is_matched {
            GREEN
        } else if selected_term == Some(item.id.as_str()) {
            YELLOW
        } else if app.match_column == MatchColumn::Terms && app.term_selected == i {
            BLUE
        } else {
            SUBTEXT0
        };
        let def_color = if item.is_matched {
            GREEN
        } else if app.match_column == MatchColumn::Definitions && app.definition_selected == i {
            BLUE
        } else {
            SUBTEXT0
        };

        let term = Paragraph::new(item.term.clone())
            .style(Style::default().fg(TEXT))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(term_color)));
        frame.render_widget(term, term_area);

        let definition = Paragraph::new(item.definition.clone())
            .style(Style::default().fg(TEXT))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(def_color)));
        frame.render_widget(definition, def_area);

        layout.terms.push((item.id.clone(), cell_rect(term_area)));
        layout.definitions.push((item.id.clone(), cell_rect(def_area)));
    }

    draw_connectors(frame, app, columns[1], inner);

    if app.exercise.is_complete() {
        let banner_area = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1);
        let banner = Paragraph::new("Well done! All terms matched.")
            .style(Style::default().fg(GREEN).add_modifier(Modifier::BOLD));
        frame.render_widget(banner, banner_area);
    }

    layout
}

fn draw_connectors(frame: &mut Frame, app: &App, gap: Rect, container: Rect) {
    let top = (container.y + container.height) as f64;
    let paths: Vec<(Color, Vec<(f64, f64)>)> = app
        .exercise
        .connectors()
        .iter()
        .filter(|c| c.start.x > 0.0 || c.end.x > 0.0)
        .map(|c| {
            let (r, g, b) = c.outcome.rgb();
            let points = c
                .curve(CurveStyle::cells(), CURVE_STEPS)
                .into_iter()
                .map(|p| (p.x, top - p.y))
                .collect();
            (Color::Rgb(r, g, b), points)
        })
        .collect();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([gap.x as f64, (gap.x + gap.width) as f64])
        .y_bounds([container.y as f64, top])
        .paint(move |ctx| {
            for (color, points) in &paths {
                for pair in points.windows(2) {
                    ctx.draw(&CanvasLine::new(pair[0].0, pair[0].1, pair[1].0, pair[1].1, *color));
                }
            }
        });
    frame.render_widget(canvas, gap);
}

// --------------------------------------------------------------------------
// Finish

fn draw_finish(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = clm_core::generate_summary(app)
        .lines()
        .map(|l| {
            if l.starts_with('#') {
                Line::from(Span::styled(
                    l.trim_start_matches('#').trim().to_string(),
                    Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(l.to_string())
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "e download session JSON | < back",
        Style::default().fg(SUBTEXT0),
    )));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel("Finished".to_string(), true));
    frame.render_widget(paragraph, area);
}

// --------------------------------------------------------------------------
// Status bar and popups

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_str = match app.mode {
        Mode::Normal => "NORMAL",
        Mode::Visual => "VISUAL",
        Mode::Input => "INPUT",
        Mode::TypePicker => "TYPE",
        Mode::Help => "HELP",
    };

    let status = app.status_message.as_deref().unwrap_or("");

    let help_hint = match app.page {
        Page::Document => "v select | a highlight | d remove | > questions | m matching | ? help",
        Page::Questionnaire => "Enter label | T type | r required | J/K move | > live | ? help",
        Page::LiveGeneration => "Enter edit | y/n answer | c currency | F finish | t theme | ? help",
        Page::Matching => "Enter select | h/l column | Esc back | ? help",
        Page::Finish => "e download | < back",
    };

    let status_text = format!(
        " {} | {}",
        mode_str,
        if status.is_empty() { help_hint } else { status },
    );

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));

    frame.render_widget(status_bar, area);
}

fn draw_type_picker(frame: &mut Frame, app: &App) {
    let area = centered_rect(36, InputType::all().len() as u16 + 2, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MAUVE))
        .title("Answer type (chosen once)");

    let items: Vec<ListItem> = InputType::all()
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let selected = i == app.type_selected;
            let marker = if selected { ">" } else { " " };
            let style = if selected {
                Style::default().fg(TEAL).bg(SURFACE1)
            } else {
                Style::default().fg(TEAL)
            };
            ListItem::new(format!("{} {}", marker, t.as_str())).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn draw_input_dialog(frame: &mut Frame, app: &App) {
    let area = centered_rect(64, 5, frame.area());
    frame.render_widget(Clear, area);

    let title = match app.input_target {
        InputTarget::Label(_) => "Edit question label".to_string(),
        InputTarget::Answer(index) => app
            .registry
            .get(index)
            .map(|e| e.display_label().to_string())
            .unwrap_or_default(),
        InputTarget::FollowUp(identity) => identity.to_string(),
        InputTarget::ExtraLocation(slot) => format!("Additional location {}", slot + 2),
        InputTarget::OperationValue => "Holiday pay operand".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let error = match app.input_target {
        InputTarget::Answer(index) => app
            .registry
            .get(index)
            .and_then(|e| app.answers.error(&e.identity))
            .unwrap_or(""),
        _ => "",
    };

    let input = Paragraph::new(vec![
        Line::from(Span::styled(format!("{}_", app.input_buffer), Style::default().fg(TEXT))),
        Line::from(Span::styled(error.to_string(), Style::default().fg(RED))),
    ]);
    frame.render_widget(input, inner);
}

fn draw_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(60, 6, frame.area());
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(TEXT))),
        Line::from(""),
        Line::from(Span::styled("Press any key", Style::default().fg(SUBTEXT0))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(RED))
            .title("Cannot finish yet"),
    );
    frame.render_widget(paragraph, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(62, 26, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let heading = Style::default().fg(MAUVE).add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled("Pages", heading)),
        Line::from("  > / <    Next/previous page"),
        Line::from("  m        Matching exercise"),
        Line::from("  t        Toggle theme"),
        Line::from(""),
        Line::from(Span::styled("Document", heading)),
        Line::from("  hjkl wbe Move cursor"),
        Line::from("  v        Start selection, a to highlight"),
        Line::from("  ]/[      Next/prev highlight, d to remove"),
        Line::from("  Tab      Toggle editor/sidebar"),
        Line::from(""),
        Line::from(Span::styled("Questionnaire", heading)),
        Line::from("  Enter    Edit label"),
        Line::from("  T        Choose answer type (once)"),
        Line::from("  r        Toggle required"),
        Line::from("  J/K      Move question down/up"),
        Line::from(""),
        Line::from(Span::styled("Live generation", heading)),
        Line::from("  Enter    Edit answer or press button"),
        Line::from("  y/n      Answer yes/no"),
        Line::from("  c / o    Cycle currency / holiday operation"),
        Line::from("  F        Finish"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
