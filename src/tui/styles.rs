use ratatui::style::{Color, Modifier, Style};

/// Application theme configuration
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary colors
    pub primary: Color,

    /// Text colors
    pub text: Color,
    pub text_dim: Color,
    pub text_bright: Color,

    /// Background colors
    pub background: Color,
    pub background_alt: Color,

    /// Border colors
    pub border: Color,
    pub border_focused: Color,

    /// Status colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    /// Special colors
    pub placeholder: Color,
    pub selection: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Look a theme up by its configured name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            primary: Color::Rgb(147, 51, 234),    // Purple

            text: Color::Rgb(248, 250, 252),      // Slate-50
            text_dim: Color::Rgb(148, 163, 184),  // Slate-400
            text_bright: Color::Rgb(255, 255, 255), // White

            background: Color::Rgb(15, 23, 42),   // Slate-900
            background_alt: Color::Rgb(30, 41, 59), // Slate-800

            border: Color::Rgb(71, 85, 105),      // Slate-600
            border_focused: Color::Rgb(147, 51, 234), // Purple

            success: Color::Rgb(34, 197, 94),     // Green-500
            warning: Color::Rgb(245, 158, 11),    // Amber-500
            error: Color::Rgb(239, 68, 68),       // Red-500

            placeholder: Color::Rgb(100, 116, 139), // Slate-500
            selection: Color::Rgb(30, 58, 138),   // Blue-900
        }
    }

    /// Create a light theme
    pub fn light() -> Self {
        Self {
            primary: Color::Rgb(103, 58, 183),

            text: Color::Rgb(32, 32, 32),
            text_dim: Color::Rgb(95, 99, 104),
            text_bright: Color::Rgb(0, 0, 0),

            background: Color::Rgb(253, 253, 253),
            background_alt: Color::Rgb(232, 234, 237),

            border: Color::Rgb(189, 193, 198),
            border_focused: Color::Rgb(103, 58, 183),

            success: Color::Rgb(40, 114, 49),
            warning: Color::Rgb(237, 108, 2),
            error: Color::Rgb(198, 40, 40),

            placeholder: Color::Rgb(128, 134, 139),
            selection: Color::Rgb(197, 202, 233),
        }
    }

    /// Base style for normal elements
    pub fn base_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.background)
    }

    /// Style for text content
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Style for secondary text such as dialog descriptions
    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Style for focused borders
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(self.border_focused)
            .add_modifier(Modifier::BOLD)
    }

    /// Border of alert dialogs, which ask before something irreversible
    pub fn alert_border_style(&self) -> Style {
        Style::default()
            .fg(self.warning)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for selected items
    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .fg(self.text_bright)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the status bar
    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.background_alt)
    }

    /// Style for help text
    pub fn help_style(&self) -> Style {
        Style::default()
            .fg(self.text)
            .bg(self.background)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for placeholder text
    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for validation messages
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// Style for an alert button; the focused one is highlighted
    pub fn button_style(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .bg(self.primary)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .bg(self.background_alt)
                .fg(self.text)
        }
    }

    /// Style for signed amounts in the list
    pub fn amount_style(&self, cents: i64) -> Style {
        if cents < 0 {
            Style::default().fg(self.error)
        } else {
            Style::default().fg(self.success)
        }
    }
}
