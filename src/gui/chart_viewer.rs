//! Chart Viewer Widget
//! Right side scrollable panel showing the active topic's narrative and charts.

use crate::analysis::AnalysisError;
use crate::charts::{ChartPlotter, FramePlayer};
use crate::dashboard::{Topic, TopicView};
use crate::data::DataUnavailable;
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const CARD_WIDTH: f32 = 800.0;

/// What the central panel currently holds.
pub enum ViewState {
    Empty,
    Loading(Topic),
    Ready(TopicView),
    Failed { topic: Topic, error: DataUnavailable },
}

pub struct ChartViewer {
    pub state: ViewState,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            state: ViewState::Empty,
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Option<&TopicView> {
        match &self.state {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, player: &FramePlayer) {
        match &self.state {
            ViewState::Empty => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
            }
            ViewState::Loading(topic) => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(format!("Loading {}...", topic.label())).size(20.0));
                });
            }
            ViewState::Failed { topic, error } => {
                Self::draw_heading(ui, *topic);
                Self::draw_data_error(ui, error);
            }
            ViewState::Ready(view) => {
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        Self::draw_heading(ui, view.topic());
                        ui.label(RichText::new(view.topic().intro()).size(14.0));
                        ui.add_space(CHART_SPACING);

                        match view {
                            TopicView::AgingHomes(v) => {
                                Self::card(ui, "各縣市住宅買賣平均屋齡與平均單價", |ui| {
                                    let frame = player.current();
                                    ChartPlotter::draw_bubble_chart(ui, &v.bubbles, frame);
                                });
                                Self::card(ui, &v.age_growth.title, |ui| {
                                    ChartPlotter::draw_growth_chart(ui, &v.age_growth);
                                });
                                Self::card(ui, &v.price_growth.title, |ui| {
                                    ChartPlotter::draw_growth_chart(ui, &v.price_growth);
                                });
                            }
                            TopicView::LaterBuyers(v) => {
                                Self::card(ui, "新申辦房貸客戶件數年齡分佈", |ui| {
                                    ChartPlotter::draw_race_chart(ui, &v.race, player);
                                });
                                match &v.average_age {
                                    Ok(band) => {
                                        Self::card(ui, "Average age of new applicants", |ui| {
                                            ChartPlotter::draw_age_band(ui, band);
                                        })
                                    }
                                    Err(e) => Self::error_card(ui, "Average age", e),
                                }
                                match &v.age_ratio {
                                    Ok(ratio) => Self::card(
                                        ui,
                                        &format!("Applications relative to {}", ratio.baseline),
                                        |ui| ChartPlotter::draw_ratio_chart(ui, ratio),
                                    ),
                                    Err(e) => Self::error_card(ui, "Age ratio", e),
                                }
                            }
                        }

                        ui.label(
                            RichText::new(view.topic().outro())
                                .size(12.0)
                                .color(Color32::GRAY),
                        );
                    });
            }
        }
    }

    fn draw_heading(ui: &mut egui::Ui, topic: Topic) {
        ui.label(RichText::new(topic.label()).size(24.0).strong());
        ui.label(RichText::new(topic.title()).size(14.0).color(Color32::GRAY));
        ui.add_space(10.0);
    }

    fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.label(RichText::new(title).size(16.0).strong());
                ui.add_space(8.0);
                add_contents(ui);
            });
        ui.add_space(CHART_SPACING);
    }

    /// One chart's computation failed; the rest of the page still renders.
    fn error_card(ui: &mut egui::Ui, title: &str, error: &AnalysisError) {
        let color = ChartPlotter::error_color();
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, color))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.label(
                    RichText::new(format!("⚠ {title} unavailable"))
                        .size(16.0)
                        .strong()
                        .color(color),
                );
                ui.label(error.to_string());
            });
        ui.add_space(CHART_SPACING);
    }

    fn draw_data_error(ui: &mut egui::Ui, error: &DataUnavailable) {
        let color = ChartPlotter::error_color();
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, color))
            .fill(color.gamma_multiply(0.15))
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.label(
                    RichText::new("⚠ Data unavailable")
                        .size(18.0)
                        .strong()
                        .color(color),
                );
                ui.add_space(6.0);
                ui.label(error.to_string());
                ui.label(
                    RichText::new(format!("File: {}", error.path().display()))
                        .size(12.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(6.0);
                ui.label("Fix the file and reload the topic.");
            });
    }
}
