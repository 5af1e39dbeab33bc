use crate::diagnostic::Severity;
use crate::token::Tier;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    pub primitive: Style,
    pub semantic: Style,
    pub component: Style,
    pub unknown: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            primitive: Style::new().blue(),
            semantic: Style::new().green(),
            component: Style::new().magenta(),
            unknown: Style::new().bright_black().italic(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            primitive: Style::new(),
            semantic: Style::new(),
            component: Style::new(),
            unknown: Style::new(),
        }
    }

    pub fn tier(&self, tier: Tier) -> Style {
        match tier {
            Tier::Primitive => self.primitive,
            Tier::Semantic => self.semantic,
            Tier::Component => self.component,
            Tier::Unknown => self.unknown,
        }
    }

    pub fn severity(&self, severity: Severity) -> Style {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warn,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
