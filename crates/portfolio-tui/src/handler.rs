use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode, Section};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::RotateRole => app.rotate_role(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let chat_open = app.assistant.is_open();

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Assistant panel
        KeyCode::Char('a') => app.toggle_assistant(),
        KeyCode::Esc if chat_open => app.close_assistant(),
        KeyCode::Char('i') | KeyCode::Enter if chat_open => app.start_editing(),

        // Sections
        KeyCode::Char(c @ '1'..='6') => {
            if let Some(section) = c.to_digit(10).and_then(Section::from_number) {
                app.select_section(section);
            }
        }
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => app.next_section(),
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => app.prev_section(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),

        // Line scroll goes to the transcript while the panel is open
        KeyCode::Char('j') | KeyCode::Down => {
            if chat_open {
                app.chat_scroll_down(1);
            } else {
                app.scroll_down();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if chat_open {
                app.chat_scroll_up(1);
            } else {
                app.scroll_up();
            }
        }
        KeyCode::Char('g') => {
            if chat_open {
                app.chat_scroll_top();
            } else {
                app.scroll_top();
            }
        }
        KeyCode::Char('G') => {
            if chat_open {
                app.chat_follow_latest();
            } else {
                app.scroll_bottom();
            }
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_question(),
        KeyCode::Backspace => app.assistant.input_mut().backspace(),
        KeyCode::Delete => app.assistant.input_mut().delete(),
        KeyCode::Left => app.assistant.input_mut().move_left(),
        KeyCode::Right => app.assistant.input_mut().move_right(),
        KeyCode::Home => app.assistant.input_mut().move_home(),
        KeyCode::End => app.assistant.input_mut().move_end(),
        KeyCode::Char(c) => app.assistant.input_mut().insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // The panel floats over the content, so test it first
    let in_chat = app.assistant.is_open()
        && app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_content = app.content_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.chat_scroll_down(WHEEL_LINES);
            } else if in_content {
                for _ in 0..WHEEL_LINES {
                    app.scroll_down();
                }
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.chat_scroll_up(WHEEL_LINES);
            } else if in_content {
                for _ in 0..WHEEL_LINES {
                    app.scroll_up();
                }
            }
        }
        _ => {}
    }
}
