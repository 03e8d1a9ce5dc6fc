//! Sidebar Widget
//! Left side panel with topic selection, playback and export controls.

use crate::charts::{ChartPlotter, FramePlayer};
use crate::dashboard::Topic;
use crate::data::Quarter;
use egui::{Color32, ComboBox, RichText};

/// How the status line is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Done,
    Error,
}

/// Left side panel state.
pub struct Sidebar {
    pub topic: Topic,
    pub progress: f32,
    pub status: String,
    pub level: StatusLevel,
    pub export_enabled: bool,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self {
            topic: Topic::ALL[0],
            progress: 0.0,
            status: "Ready".to_string(),
            level: StatusLevel::Info,
            export_enabled: false,
        }
    }
}

impl Sidebar {
    /// Draw the sidebar. `period` is the quarter of the current frame.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        player: &FramePlayer,
        period: Option<Quarter>,
        busy: bool,
    ) -> SidebarAction {
        let mut action = SidebarAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🏠 Realty Insights")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Taiwan housing & mortgage trends")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Topic Section =====
        ui.label(RichText::new("📰 Topic").size(14.0).strong());
        ui.add_space(5.0);

        ui.add_enabled_ui(!busy, |ui| {
            ComboBox::from_id_salt("topic")
                .width(220.0)
                .selected_text(self.topic.label())
                .show_ui(ui, |ui| {
                    for topic in Topic::ALL {
                        if ui
                            .selectable_label(self.topic == topic, topic.label())
                            .clicked()
                            && self.topic != topic
                        {
                            self.topic = topic;
                            action = SidebarAction::TopicChanged(topic);
                        }
                    }
                });
            ui.add_space(5.0);
            if ui.small_button("⟳ Reload data").clicked() {
                action = SidebarAction::Reload;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Playback Section =====
        ui.label(RichText::new("🎞 Playback").size(14.0).strong());
        ui.add_space(5.0);

        let frame_count = player.frame_count();
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.add_enabled_ui(frame_count > 1 && !busy, |ui| {
                    ui.horizontal(|ui| {
                        let label = if player.is_playing() { "⏸ Pause" } else { "▶ Play" };
                        if ui.button(label).clicked() {
                            action = SidebarAction::TogglePlayback;
                        }
                    });

                    let mut index = player.current();
                    let last = frame_count.saturating_sub(1);
                    let slider = egui::Slider::new(&mut index, 0..=last).show_value(false);
                    if ui.add(slider).changed() {
                        action = SidebarAction::Seek(index);
                    }
                });
                ui.label(
                    RichText::new(ChartPlotter::frame_caption(
                        period,
                        player.current(),
                        frame_count,
                    ))
                    .size(12.0),
                );
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !busy, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = SidebarAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(busy),
        );

        ui.add_space(5.0);

        let status_color = match self.level {
            StatusLevel::Error => ChartPlotter::error_color(),
            StatusLevel::Done => Color32::from_rgb(40, 167, 69),
            StatusLevel::Info => Color32::GRAY,
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
        self.level = StatusLevel::Info;
    }

    pub fn set_done(&mut self, status: &str) {
        self.progress = 100.0;
        self.status = status.to_string();
        self.level = StatusLevel::Done;
    }

    pub fn set_error(&mut self, status: &str) {
        self.progress = 0.0;
        self.status = status.to_string();
        self.level = StatusLevel::Error;
    }
}

/// Actions triggered by the sidebar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SidebarAction {
    None,
    TopicChanged(Topic),
    Reload,
    TogglePlayback,
    Seek(usize),
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_on_the_first_topic() {
        let sidebar = Sidebar::default();
        assert_eq!(sidebar.topic, Topic::AgingHomes);
        assert!(!sidebar.export_enabled);
    }

    #[test]
    fn status_setters_pick_the_level() {
        let mut sidebar = Sidebar::default();
        assert_eq!(sidebar.level, StatusLevel::Info);

        sidebar.set_done("3 charts ready");
        assert_eq!(sidebar.level, StatusLevel::Done);
        assert_eq!(sidebar.progress, 100.0);

        sidebar.set_error("Data file not found");
        assert_eq!(sidebar.level, StatusLevel::Error);
        assert_eq!(sidebar.progress, 0.0);

        sidebar.set_progress(40.0, "Computing");
        assert_eq!(sidebar.level, StatusLevel::Info);
        assert_eq!(sidebar.status, "Computing");
    }
}
