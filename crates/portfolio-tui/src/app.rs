use ratatui::layout::Rect;
use portfolio_core::{AssistantWidget, ContentStore, InputRejected};
use tracing::debug;

use crate::hero::{ParticleField, RoleRotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    About,
    Experience,
    Projects,
    Skills,
    Contact,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Home,
        Section::About,
        Section::Experience,
        Section::Projects,
        Section::Skills,
        Section::Contact,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::About => "About",
            Section::Experience => "Experience",
            Section::Projects => "Projects",
            Section::Skills => "Skills",
            Section::Contact => "Contact",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Section for a 1-based tab number.
    pub fn from_number(n: u32) -> Option<Self> {
        let idx = usize::try_from(n).ok()?.checked_sub(1)?;
        Self::ALL.get(idx).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub section: Section,
    pub input_mode: InputMode,

    // Section content state
    pub content_scroll: u16,
    pub content_height: u16,
    pub total_content_lines: u16,

    // Assistant panel state
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub chat_follow: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub roles: RoleRotation,
    pub particles: ParticleField,

    // Panel areas for mouse hit-testing (updated during render)
    pub content_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    // Data
    pub content: ContentStore,
    pub assistant: AssistantWidget,
    pub model: String,
    pub has_credential: bool,
}

impl App {
    pub fn new(content: ContentStore, assistant: AssistantWidget, model: impl Into<String>, has_credential: bool) -> Self {
        let roles = RoleRotation::new(content.profile().roles.clone());

        Self {
            should_quit: false,
            section: Section::Home,
            input_mode: InputMode::Normal,
            content_scroll: 0,
            content_height: 0,
            total_content_lines: 0,
            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_follow: true,
            animation_frame: 0,
            roles,
            particles: ParticleField::new(),
            content_area: None,
            chat_area: None,
            content,
            assistant,
            model: model.into(),
            has_credential,
        }
    }

    // Section navigation
    pub fn select_section(&mut self, section: Section) {
        if self.section != section {
            debug!(section = section.title(), "Switching section");
            self.section = section;
            self.content_scroll = 0;
        }
    }

    pub fn next_section(&mut self) {
        self.select_section(self.section.next());
    }

    pub fn prev_section(&mut self) {
        self.select_section(self.section.prev());
    }

    // Content scrolling
    fn max_content_scroll(&self) -> u16 {
        self.total_content_lines.saturating_sub(self.content_height)
    }

    pub fn scroll_down(&mut self) {
        if self.content_scroll < self.max_content_scroll() {
            self.content_scroll = self.content_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = (self.content_height / 2).max(1);
        self.content_scroll = (self.content_scroll + half_page).min(self.max_content_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = (self.content_height / 2).max(1);
        self.content_scroll = self.content_scroll.saturating_sub(half_page);
    }

    pub fn scroll_top(&mut self) {
        self.content_scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.content_scroll = self.max_content_scroll();
    }

    // Assistant panel
    pub fn toggle_assistant(&mut self) {
        self.assistant.toggle();
        if self.assistant.is_open() {
            self.chat_follow = true;
        } else {
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn close_assistant(&mut self) {
        self.assistant.close();
        self.input_mode = InputMode::Normal;
    }

    pub fn start_editing(&mut self) {
        if self.assistant.is_open() {
            self.input_mode = InputMode::Editing;
        }
    }

    /// Sends the typed question. Rejections are silent.
    pub fn submit_question(&mut self) {
        match self.assistant.submit_input() {
            Ok(()) => {
                self.animation_frame = 0;
                self.chat_follow = true;
            }
            Err(InputRejected::Blank) | Err(InputRejected::Busy) => {}
        }
    }

    pub fn chat_scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        self.chat_follow = self.chat_scroll >= self.chat_max_scroll;
    }

    pub fn chat_scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.chat_follow = self.chat_max_scroll == 0;
    }

    pub fn chat_scroll_top(&mut self) {
        self.chat_scroll = 0;
        self.chat_follow = self.chat_max_scroll == 0;
    }

    pub fn chat_follow_latest(&mut self) {
        self.chat_follow = true;
        self.chat_scroll = self.chat_max_scroll;
    }

    /// Tick animation frame and collect any finished reply (called by Tick event)
    pub fn tick(&mut self) {
        if self.assistant.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.section == Section::Home {
            self.particles.step();
        }
        self.collect_reply();
    }

    /// Returns true when a reply landed in the transcript.
    pub fn collect_reply(&mut self) -> bool {
        let changed = self.assistant.poll_reply();
        if changed {
            self.chat_follow = true;
        }
        changed
    }

    pub fn rotate_role(&mut self) {
        self.roles.advance();
    }
}
