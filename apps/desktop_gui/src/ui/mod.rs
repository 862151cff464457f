//! UI layer for the desktop GUI: app shell, result panels, and theme colors.

pub mod app;
pub mod panels;
pub mod theme;

pub use app::AnalysisApp;
