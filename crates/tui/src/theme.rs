use ratatui::style::Color;

/// Palette used by every screen.
#[derive(Debug, Clone)]
pub struct Theme {
    pub dark: bool,
    pub primary_bg: Color,
    pub primary_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Theme {
    pub fn new(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn light() -> Self {
        Self {
            dark: false,
            primary_bg: Color::White,
            primary_fg: Color::Black,
            accent: Color::Blue,
            muted: Color::Gray,
            selection_bg: Color::Rgb(0xdb, 0xea, 0xfe),
            success: Color::Green,
            warning: Color::Rgb(0xb4, 0x53, 0x09),
            danger: Color::Red,
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            primary_bg: Color::Black,
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::LightRed,
        }
    }

    pub fn toggled(&self) -> Self {
        Self::new(!self.dark)
    }
}
