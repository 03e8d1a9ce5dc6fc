//! Charts module - interactive plots, playback and PNG export

mod animation;
pub mod fonts;
pub mod palette;
mod plotter;
mod renderer;

pub use animation::FramePlayer;
pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;
