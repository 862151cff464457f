use eframe::egui::Color32;

pub const ACCENT: Color32 = Color32::from_rgb(0xff, 0xcc, 0x00);
pub const MUTED: Color32 = Color32::from_rgb(0xcc, 0xcc, 0xcc);
pub const CARD: Color32 = Color32::from_rgb(0x2a, 0x2a, 0x2a);
pub const ERROR: Color32 = Color32::from_rgb(0xff, 0x63, 0x47);
pub const UPLOAD_BUTTON: Color32 = Color32::from_rgb(0x00, 0x7b, 0xff);
pub const DETECT_BUTTON: Color32 = Color32::from_rgb(0xdc, 0x35, 0x45);
pub const DOWNLOAD_BUTTON: Color32 = Color32::from_rgb(0x28, 0xa7, 0x45);
pub const PANEL: Color32 = Color32::from_rgb(0x1e, 0x1e, 0x1e);
