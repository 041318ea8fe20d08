use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Clear, Paragraph, Tabs,
    },
};
use portfolio_core::Speaker;
use crate::app::{App, InputMode, Section};
use crate::hero::{FIELD_HEIGHT, FIELD_WIDTH};

const MAX_CHAT_WIDTH: u16 = 64;
const MAX_CHAT_HEIGHT: u16 = 26;

/// Splits a word wider than `width` into `width`-sized chunks.
fn split_long_word(word: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}

/// Wrap text to fit within a given width, returning multiple lines
/// Breaks on word boundaries; only words wider than a line are split
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    let words = text.split_whitespace().flat_map(|word| {
        if word.chars().count() > width {
            split_long_word(word, width)
        } else {
            vec![word.to_string()]
        }
    });

    for word in words {
        let word = word.as_str();
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Re-opens a `**bold**` run on the next line when wrapping split it.
fn balance_bold(lines: Vec<String>) -> Vec<String> {
    let mut open = false;
    lines
        .into_iter()
        .map(|line| {
            let mut line = if open { format!("**{line}") } else { line };
            if line.matches("**").count() % 2 == 1 {
                line.push_str("**");
                open = true;
            } else {
                open = false;
            }
            line
        })
        .collect()
}

/// Wraps a markdown source line and renders `**bold**` runs.
fn wrap_markdown(text: &str, width: usize) -> Vec<Line<'static>> {
    balance_bold(wrap_text_to_width(text, width))
        .iter()
        .map(|line| parse_markdown_line(line))
        .collect()
}

fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Wrapped bullet item with a hanging indent.
fn bullet_lines(text: &str, width: usize, bullet_style: Style) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(4).max(1);
    wrap_markdown(text, inner)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 {
                Span::styled("  • ", bullet_style)
            } else {
                Span::raw("    ")
            };
            let mut spans = vec![prefix];
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

fn indented(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(2).max(1);
    wrap_text_to_width(text, inner)
        .into_iter()
        .map(|line| Line::from(vec![Span::raw("  "), Span::styled(line, style)]))
        .collect()
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn labeled(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<10}"), Style::default().fg(Color::DarkGray)),
        Span::raw(value.to_string()),
    ])
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, tabs, body, footer
    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);

    app.content_area = Some(body_area);
    let section = app.section;
    match section {
        Section::Home => render_home(app, frame, body_area),
        section => render_section(app, frame, body_area, section),
    }

    render_footer(app, frame, footer_area);

    if app.assistant.is_open() {
        render_assistant(app, frame, body_area);
    } else {
        app.chat_area = None;
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let profile = app.content.profile();
    let title = Line::from(vec![
        Span::styled(format!(" {} ", profile.name), Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", profile.location), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let titles: Vec<String> = Section::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", i + 1, s.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.section.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .divider("|");

    frame.render_widget(tabs, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match (app.input_mode, app.assistant.is_open()) {
        (InputMode::Editing, _) => " ASK ",
        (InputMode::Normal, true) => " CHAT ",
        (InputMode::Normal, false) => " BROWSE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.input_mode, app.assistant.is_open()) {
        (InputMode::Editing, _) => &[("Enter", "send"), ("Esc", "stop typing")],
        (InputMode::Normal, true) => &[
            ("i", "type"),
            ("j/k", "scroll"),
            ("G", "latest"),
            ("Esc", "close"),
            ("q", "quit"),
        ],
        (InputMode::Normal, false) => &[
            ("1-6", "section"),
            ("Tab", "next"),
            ("j/k", "scroll"),
            ("a", "ask AI"),
            ("q", "quit"),
        ],
    };

    let hints = pairs.iter().flat_map(|(key, label)| {
        [
            Span::styled(format!(" {key} "), key_style),
            Span::styled(format!(" {label} "), label_style),
        ]
    });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_home(app: &mut App, frame: &mut Frame, area: Rect) {
    let points = app.particles.points();
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, FIELD_WIDTH])
        .y_bounds([0.0, FIELD_HEIGHT])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &points,
                color: Color::DarkGray,
            });
        });
    frame.render_widget(canvas, area);

    let profile = app.content.profile();
    let text_width = area.width.saturating_sub(4).min(72);

    let mut lines = vec![
        Line::from(Span::styled(
            profile.availability.clone(),
            Style::default().fg(Color::Green),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!("Hi, I'm {}", profile.name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("> {}", app.roles.current().unwrap_or_default()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(
        wrap_text_to_width(&profile.tagline, text_width as usize)
            .into_iter()
            .map(Line::from),
    );
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press 2-6 to explore, or a to ask my AI assistant",
        Style::default().fg(Color::Gray),
    )));

    let height = (lines.len() as u16).min(area.height);
    let [hero_area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [hero_area] = Layout::horizontal([Constraint::Length(text_width)])
        .flex(Flex::Center)
        .areas(hero_area);

    let hero = Paragraph::new(lines).centered();
    frame.render_widget(hero, hero_area);

    app.content_height = area.height;
    app.total_content_lines = 0;
    app.content_scroll = 0;
}

fn section_lines(app: &App, section: Section, width: usize) -> Vec<Line<'static>> {
    let content = &app.content;
    let dim = Style::default().fg(Color::Gray);
    let accent = Style::default().fg(Color::Cyan);
    let mut lines: Vec<Line<'static>> = Vec::new();

    match section {
        Section::Home => {}
        Section::About => {
            let profile = content.profile();
            lines.push(heading("About Me"));
            lines.push(Line::default());
            for paragraph in &profile.about {
                lines.extend(wrap_markdown(paragraph, width));
                lines.push(Line::default());
            }
            for highlight in &profile.highlights {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:>4} ", highlight.value), accent.add_modifier(Modifier::BOLD)),
                    Span::styled(highlight.label.clone(), dim),
                ]));
            }
            lines.push(Line::default());

            let education = content.education();
            lines.push(heading("Education"));
            lines.push(Line::from(Span::styled(
                format!("  {}", education.institution),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(indented(&education.degree, width, Style::default()));
            lines.extend(indented(
                &format!("{} · {} · CGPA {}", education.duration, education.location, education.cgpa),
                width,
                dim,
            ));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("  Relevant coursework", dim)));
            for course in &education.coursework {
                lines.extend(bullet_lines(course, width, accent));
            }
        }
        Section::Experience => {
            lines.push(heading("Experience"));
            lines.push(Line::default());
            for entry in content.experiences() {
                lines.push(Line::from(vec![
                    Span::styled(entry.role.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" @ {}", entry.company), accent),
                ]));
                lines.push(Line::from(Span::styled(
                    format!("{} · {}", entry.duration, entry.location),
                    dim,
                )));
                for bullet in &entry.bullets {
                    lines.extend(bullet_lines(bullet, width, accent));
                }
                lines.extend(indented(&entry.tech.join(" · "), width, dim));
                lines.push(Line::default());
            }
        }
        Section::Projects => {
            lines.push(heading("Projects"));
            lines.push(Line::default());
            for project in content.projects() {
                lines.push(Line::from(Span::styled(
                    project.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.extend(wrap_markdown(&project.description, width));
                for detail in &project.long_description {
                    lines.extend(bullet_lines(detail, width, accent));
                }
                lines.extend(indented(&project.tech.join(" · "), width, dim));
                if let Some(github) = &project.github {
                    lines.push(Line::from(vec![
                        Span::styled("  Source: ", dim),
                        Span::styled(github.clone(), accent.add_modifier(Modifier::UNDERLINED)),
                    ]));
                }
                lines.push(Line::default());
            }

            lines.push(heading("Open Source"));
            lines.push(Line::default());
            for repo in content.repos() {
                lines.push(Line::from(vec![
                    Span::styled(repo.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  [{}]", repo.language), dim),
                    Span::styled(format!("  ★ {}", repo.stars), Style::default().fg(Color::Yellow)),
                ]));
                lines.extend(indented(&repo.description, width, Style::default()));
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(repo.url.clone(), accent.add_modifier(Modifier::UNDERLINED)),
                ]));
                lines.push(Line::default());
            }
        }
        Section::Skills => {
            lines.push(heading("Skills"));
            lines.push(Line::default());
            for group in content.skill_groups() {
                lines.push(Line::from(Span::styled(
                    group.category.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.extend(indented(&group.skills.join(" · "), width, accent));
                lines.push(Line::default());
            }

            lines.push(heading("Certifications"));
            lines.push(Line::default());
            for cert in content.certifications() {
                lines.extend(bullet_lines(&format!("**{}**", cert.title), width, accent));
                lines.extend(indented(&format!("  {} · {}", cert.issuer, cert.year), width, dim));
            }
        }
        Section::Contact => {
            let profile = content.profile();
            lines.push(heading("Get In Touch"));
            lines.push(Line::default());
            lines.extend(wrap_text_to_width(&profile.availability, width).into_iter().map(Line::from));
            lines.push(Line::default());
            lines.push(labeled("Email", &profile.email));
            lines.push(labeled("LinkedIn", &profile.linkedin));
            lines.push(labeled("GitHub", &profile.github));
            lines.push(labeled("Phone", &profile.phone));
            lines.push(labeled("Location", &profile.location));
            lines.push(labeled("Resume", &profile.resume_url));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("© {} · Built with Rust and ratatui", profile.name),
                dim,
            )));
        }
    }

    lines
}

fn render_section(app: &mut App, frame: &mut Frame, area: Rect, section: Section) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", section.title()));
    let inner = block.inner(area);

    let lines = section_lines(app, section, inner.width as usize);

    // Store dimensions for scroll calculations
    app.content_height = inner.height;
    app.total_content_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    app.content_scroll = app
        .content_scroll
        .min(app.total_content_lines.saturating_sub(app.content_height));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.content_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn chat_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for turn in app.assistant.transcript() {
        match turn.speaker {
            Speaker::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in turn.text.lines() {
                    lines.extend(wrap_text_to_width(line, width).into_iter().map(Line::from));
                }
            }
            Speaker::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in turn.text.lines() {
                    lines.extend(wrap_markdown(line, width));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.assistant.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Floating panel anchored to the bottom-right of `area`.
fn assistant_popup_area(area: Rect) -> Rect {
    let width = MAX_CHAT_WIDTH.min(area.width.saturating_sub(2));
    let height = MAX_CHAT_HEIGHT.min(area.height.saturating_sub(1));
    Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height),
        width,
        height,
    )
}

fn render_assistant(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup = assistant_popup_area(area);
    frame.render_widget(Clear, popup);

    let mut title = vec![Span::styled(" AI Assistant ", Style::default().bold())];
    title.push(Span::styled(format!("{} ", app.model), Style::default().fg(Color::Gray)));
    if !app.has_credential {
        title.push(Span::styled("(no API key) ", Style::default().fg(Color::Red)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(title));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    app.chat_area = Some(popup);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(inner);

    let lines = chat_lines(app, chat_area.width as usize);
    let total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    app.chat_max_scroll = total_lines.saturating_sub(chat_area.height);
    app.chat_scroll = if app.chat_follow {
        app.chat_max_scroll
    } else {
        app.chat_scroll.min(app.chat_max_scroll)
    };

    let chat = Paragraph::new(lines).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(if editing { " Ask (Enter to send) " } else { " Ask (i to type) " });

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let input = app.assistant.input();
    let cursor_pos = input.cursor();

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input_widget = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input_widget, input_area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}
