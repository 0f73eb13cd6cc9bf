use ratatui::style::Color;

pub const PRIMARY: Color = Color::from_u32(0x00ff7a59);
pub const SECONDARY: Color = Color::from_u32(0x00a8452d);
pub const NEUTRAL: Color = Color::from_u32(0x00404040);
pub const BACKGROUND: Color = Color::from_u32(0x000f0d0c);
pub const ACCENT: Color = Color::from_u32(0x00ffc1a6);
pub const ERROR: Color = Color::from_u32(0x00e5484d);
