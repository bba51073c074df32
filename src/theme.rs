use ratatui::style::Color;

/// The handful of base16 slots the viewer draws with
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub background: Color, // base00
    pub surface: Color, // base01
    pub muted: Color, // base03
    pub foreground: Color, // base05
    pub bright: Color, // base07
    pub accent: Color, // base0C
    pub highlight: Color, // base0D
}

pub const OCEANIC_NEXT: Palette = Palette {
    background: Color::Rgb(0x1B, 0x2B, 0x34),
    surface: Color::Rgb(0x34, 0x3D, 0x46),
    muted: Color::Rgb(0x65, 0x73, 0x7E),
    foreground: Color::Rgb(0xC0, 0xC5, 0xCE),
    bright: Color::Rgb(0xD8, 0xDE, 0xE9),
    accent: Color::Rgb(0x5F, 0xB3, 0xB3),
    highlight: Color::Rgb(0x66, 0x99, 0xCC),
};
