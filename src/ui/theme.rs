use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for each kind of thing the tracker prints
#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub saved: Style,
    pub failed: Style,
    pub caution: Style,
    pub label: Style,
    pub food_name: Style,
    pub calories: Style,
}

impl Theme {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::choose(console::Term::stdout().is_term(), no_color)
    }

    /// Colors only for a terminal, and never when `NO_COLOR` is set
    pub fn choose(is_term: bool, no_color: bool) -> Self {
        if is_term && !no_color {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            heading: Style::new().cyan().bold(),
            saved: Style::new().green().bold(),
            failed: Style::new().red().bold(),
            caution: Style::new().yellow().bold(),
            label: Style::new().white().dimmed(),
            food_name: Style::new().bright_white().bold(),
            calories: Style::new().bright_yellow(),
        }
    }

    pub fn plain() -> Self {
        Self {
            heading: Style::new(),
            saved: Style::new(),
            failed: Style::new(),
            caution: Style::new(),
            label: Style::new(),
            food_name: Style::new(),
            calories: Style::new(),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.heading.is_plain() && self.calories.is_plain()
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
