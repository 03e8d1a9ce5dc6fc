//! GUI module - User interface components

mod app;
mod chart_viewer;
mod sidebar;

pub use app::DashboardApp;
pub use chart_viewer::{ChartViewer, ViewState};
pub use sidebar::{Sidebar, SidebarAction};
