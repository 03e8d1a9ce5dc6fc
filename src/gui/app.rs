//! Realty Insights Main Application
//! Main window with the topic sidebar and chart viewer.

use crate::charts::fonts::CJK_FONTS;
use crate::charts::{FramePlayer, StaticChartRenderer};
use crate::config::DashboardConfig;
use crate::dashboard::{build_topic, preload, Topic, TopicView};
use crate::data::{DataUnavailable, TableCache};
use crate::gui::{ChartViewer, Sidebar, SidebarAction, ViewState};
use egui::SidePanel;
use log::{info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Topic computation result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(TopicView),
    Error(Topic, DataUnavailable),
}

/// Main application window.
pub struct DashboardApp {
    cache: Arc<TableCache>,
    config: Arc<DashboardConfig>,
    sidebar: Sidebar,
    chart_viewer: ChartViewer,
    player: FramePlayer,

    // Async topic computation
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    preloaded: bool,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        install_cjk_font(&cc.egui_ctx);

        let frame_duration = Duration::from_millis(config.frame_duration_ms);
        let mut app = Self {
            cache: Arc::new(TableCache::new()),
            config: Arc::new(config),
            sidebar: Sidebar::default(),
            chart_viewer: ChartViewer::new(),
            player: FramePlayer::new(0, frame_duration),
            load_rx: None,
            is_loading: false,
            preloaded: false,
        };
        app.start_topic(app.sidebar.topic);
        app
    }

    /// Compute a topic's view in a background thread.
    fn start_topic(&mut self, topic: Topic) {
        if self.is_loading {
            return;
        }
        info!("Switching to topic {:?}", topic);

        self.player.pause();
        self.chart_viewer.state = ViewState::Loading(topic);
        self.sidebar.export_enabled = false;
        self.sidebar.set_progress(5.0, "Loading data...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let cache = Arc::clone(&self.cache);
        let config = Arc::clone(&self.config);
        let warm_up = !self.preloaded;
        self.preloaded = true;

        thread::spawn(move || {
            Self::run_topic(tx, topic, &cache, &config, warm_up);
        });
    }

    /// Drop cached frames so edited files are parsed again, then rebuild.
    fn reload_topic(&mut self) {
        if self.is_loading {
            return;
        }
        for path in [
            self.config.loan_age_path(),
            self.config.county_quarter_path(),
            self.config.county_growth_path(),
        ] {
            if self.cache.invalidate(&path) {
                info!("Invalidated {}", path.display());
            }
        }
        self.start_topic(self.sidebar.topic);
    }

    /// Build the view (called from background thread)
    fn run_topic(
        tx: Sender<LoadResult>,
        topic: Topic,
        cache: &TableCache,
        config: &DashboardConfig,
        warm_up: bool,
    ) {
        if warm_up {
            let _ = tx.send(LoadResult::Progress(10.0, "Reading datasets...".to_string()));
            let loaded = preload(cache, config)
                .iter()
                .filter(|(_, result)| result.is_ok())
                .count();
            info!("Preloaded {loaded} dataset(s)");
        }

        let _ = tx.send(LoadResult::Progress(50.0, "Computing charts...".to_string()));

        let result = match build_topic(topic, cache, config) {
            Ok(view) => LoadResult::Complete(view),
            Err(e) => LoadResult::Error(topic, e),
        };
        let _ = tx.send(result);
    }

    /// Check for topic results
    fn check_load_results(&mut self) {
        // Take the receiver temporarily to avoid borrow issues
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.sidebar.set_progress(progress, &status);
                    }
                    LoadResult::Complete(view) => {
                        let frames = view.frame_count();
                        self.player = FramePlayer::new(frames, self.player.frame_duration());
                        self.sidebar.export_enabled = true;
                        self.sidebar
                            .set_done(&format!("Complete! {} frames ready", frames));
                        self.chart_viewer.state = ViewState::Ready(view);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(topic, error) => {
                        warn!("Topic {:?} unavailable: {error}", topic);
                        self.sidebar.set_error(&format!("Error: {}", error));
                        self.player = FramePlayer::new(0, self.player.frame_duration());
                        self.chart_viewer.state = ViewState::Failed { topic, error };
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            // Put receiver back if still needed
            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Write the active topic's charts as PNG into a chosen folder
    fn handle_export(&mut self) {
        let Some(view) = self.chart_viewer.view() else {
            self.sidebar.set_error("No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new()
            .set_title("Export charts to folder")
            .pick_folder()
        else {
            return; // User cancelled
        };

        match StaticChartRenderer::export_topic(view, self.player.current(), &dir) {
            Ok(files) => {
                self.sidebar
                    .set_done(&format!("Exported {} chart(s)", files.len()));
                if let Err(e) = open::that(&dir) {
                    warn!("Cannot open {}: {e}", dir.display());
                }
            }
            Err(e) => {
                warn!("Export failed: {e}");
                self.sidebar.set_error(&format!("Export error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.player.advance(dt);

        // Request repaint while loading or playing
        if self.is_loading || self.player.is_playing() {
            ctx.request_repaint();
        }

        let period = self
            .chart_viewer
            .view()
            .and_then(|v| v.frame_period(self.player.current()));

        SidePanel::left("sidebar")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.sidebar.show(ui, &self.player, period, self.is_loading);

                    match action {
                        SidebarAction::TopicChanged(topic) => self.start_topic(topic),
                        SidebarAction::Reload => self.reload_topic(),
                        SidebarAction::TogglePlayback => self.player.toggle(),
                        SidebarAction::Seek(index) => self.player.seek(index),
                        SidebarAction::Export => self.handle_export(),
                        SidebarAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, &self.player);
        });
    }
}

/// Register the first available CJK font as a fallback so county names render.
fn install_cjk_font(ctx: &egui::Context) {
    let Some((path, bytes)) = CJK_FONTS
        .iter()
        .find_map(|font| std::fs::read(font.path).ok().map(|bytes| (font.path, bytes)))
    else {
        warn!("No CJK font found; Chinese labels may not render");
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), egui::FontData::from_owned(bytes).into());
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);
    info!("Loaded CJK font from {path}");
}
