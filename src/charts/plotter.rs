//! Chart Plotter Module
//! Draws the dashboard charts interactively using egui_plot.

use crate::analysis::RatioSeries;
use crate::charts::animation::{frame_positions, interpolate_frames, BarPosition, FramePlayer};
use crate::charts::palette::{self, AVERAGE_LINE, BAND_FILL, MARKER_GREY};
use crate::dashboard::{AgeBand, BubbleChart, GrowthChart, RaceChart};
use crate::data::Quarter;
use egui::{Align2, Color32, RichText};
use egui_plot::{
    Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
    VLine,
};

/// Plot sizes
const PLOT_WIDTH: f32 = 780.0;
const TALL_PLOT_HEIGHT: f32 = 560.0;
const LINE_PLOT_HEIGHT: f32 = 340.0;

/// Bubble radius range in points
const MIN_BUBBLE_RADIUS: f64 = 3.0;
const MAX_BUBBLE_RADIUS: f64 = 28.0;

/// Creates the dashboard visualizations using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Radius proportional to the square root of the transaction count.
    pub fn bubble_radius(transactions: f64, max_transactions: f64) -> f32 {
        if max_transactions <= 0.0 {
            return MIN_BUBBLE_RADIUS as f32;
        }
        let scaled = (transactions / max_transactions).sqrt() * MAX_BUBBLE_RADIUS;
        scaled.max(MIN_BUBBLE_RADIUS) as f32
    }

    fn quarter_axis_label(value: f64) -> String {
        let year = value.floor();
        let offset = (value - year) * 4.0;
        if (offset - offset.round()).abs() > 1e-6 {
            return String::new();
        }
        let quarter = offset.round() as u8 + 1;
        match Quarter::new(year as i32, quarter) {
            Some(q) if q.quarter == 1 => format!("{}", q.year),
            Some(q) => q.to_string(),
            None => String::new(),
        }
    }

    /// County house age vs unit price for one quarter.
    pub fn draw_bubble_chart(ui: &mut egui::Ui, chart: &BubbleChart, frame_index: usize) {
        let Some(frame) = chart.frames.get(frame_index) else {
            ui.label("No quarterly county data");
            return;
        };

        Plot::new("county_bubbles")
            .width(PLOT_WIDTH)
            .height(TALL_PLOT_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Average age of houses sold (years)")
            .y_axis_label("Average contract unit price (10k NTD / ping)")
            .include_x(5.0)
            .include_x(35.0)
            .include_y(5.0)
            .include_y(75.0)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (idx, district) in chart.districts.iter().enumerate() {
                    let color = palette::series_color(idx);
                    for point in frame.points.iter().filter(|p| &p.district == district) {
                        let radius =
                            Self::bubble_radius(point.transactions, chart.max_transactions);
                        plot_ui.points(
                            Points::new(PlotPoints::new(vec![[point.house_age, point.unit_price]]))
                                .radius(radius)
                                .color(color.gamma_multiply(0.7))
                                .name(district),
                        );
                        plot_ui.text(
                            Text::new(
                                PlotPoint::new(point.house_age, point.unit_price),
                                RichText::new(&point.county).size(11.0),
                            )
                            .anchor(Align2::CENTER_BOTTOM),
                        );
                    }
                }
            });
    }

    /// Horizontal bars of county growth minus national growth.
    pub fn draw_growth_chart(ui: &mut egui::Ui, chart: &GrowthChart) {
        let labels: Vec<String> = chart.bars.iter().map(|b| b.county.clone()).collect();
        let bars: Vec<Bar> = chart
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                Bar::new(i as f64, bar.value)
                    .width(0.7)
                    .fill(bar.color)
                    .name(format!("{}: {:+.2}", bar.county, bar.value))
            })
            .collect();

        Plot::new(format!("growth_{}", chart.title))
            .width(PLOT_WIDTH)
            .height(TALL_PLOT_HEIGHT)
            .x_axis_label(chart.value_label.clone())
            .allow_scroll(false)
            .allow_zoom(false)
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// One bar-race frame, blended towards the next one while playing.
    pub fn draw_race_chart(ui: &mut egui::Ui, race: &RaceChart, player: &FramePlayer) {
        let index = player.current();
        let Some(frame) = race.frames.get(index) else {
            ui.label("No mortgage application data");
            return;
        };

        let positions: Vec<BarPosition> = match race.frames.get(index + 1) {
            Some(next) if player.is_playing() => {
                interpolate_frames(frame, next, player.progress())
            }
            _ => frame_positions(frame),
        };
        let shown = if player.is_playing() {
            race.frames
                .get(index + 1)
                .map(|f| f.time_bucket)
                .unwrap_or(frame.time_bucket)
        } else {
            frame.time_bucket
        };

        ui.label(RichText::new(shown.to_string()).size(20.0).strong());

        let top = race.top_n.max(1) as f64 - 1.0;
        let bars: Vec<Bar> = positions
            .iter()
            .map(|p| {
                Bar::new(top - p.slot, p.value)
                    .width(0.8)
                    .fill(race.color_of(&p.category))
                    .name(&p.category)
            })
            .collect();

        Plot::new("age_race")
            .width(PLOT_WIDTH)
            .height(TALL_PLOT_HEIGHT)
            .x_axis_label("New mortgage applications")
            .show_y(false)
            .include_x(0.0)
            .include_x(race.max_value * 1.15)
            .include_y(-0.5)
            .include_y(top + 0.5)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_axes([true, false])
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
                for p in &positions {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(p.value, top - p.slot),
                            RichText::new(format!(" {} ({:.0})", p.category, p.value)).size(12.0),
                        )
                        .anchor(Align2::LEFT_CENTER),
                    );
                }
            });
    }

    /// Weighted average age line inside its lower/upper band.
    pub fn draw_age_band(ui: &mut egui::Ui, band: &AgeBand) {
        let line: PlotPoints = band
            .points
            .iter()
            .map(|p| [p.period.as_axis_value(), p.mean])
            .collect();
        // upper bound forward, lower bound reversed: one closed outline
        let outline: PlotPoints = band
            .points
            .iter()
            .map(|p| [p.period.as_axis_value(), p.upper])
            .chain(
                band.points
                    .iter()
                    .rev()
                    .map(|p| [p.period.as_axis_value(), p.lower]),
            )
            .collect();

        Plot::new("average_age")
            .width(PLOT_WIDTH)
            .height(LINE_PLOT_HEIGHT)
            .y_axis_label("Average age")
            .allow_scroll(false)
            .x_axis_formatter(|mark, _range| Self::quarter_axis_label(mark.value))
            .label_formatter(|_name, value| {
                format!("{}\n{:.2}", Self::quarter_axis_label(value.x), value.y)
            })
            .show(ui, |plot_ui| {
                plot_ui.polygon(Polygon::new(outline).fill_color(BAND_FILL).name("bounds"));
                plot_ui.line(
                    Line::new(line)
                        .color(AVERAGE_LINE)
                        .width(2.0)
                        .name("weighted age"),
                );
                plot_ui.vline(
                    VLine::new(band.marker.as_axis_value() + 0.25)
                        .color(MARKER_GREY)
                        .width(3.0)
                        .style(LineStyle::dashed_loose()),
                );
            });
    }

    /// Target-over-baseline ratio lines with first/last values annotated.
    pub fn draw_ratio_chart(ui: &mut egui::Ui, ratio: &RatioSeries<Quarter>) {
        let xs: Vec<f64> = ratio.time_buckets.iter().map(Quarter::as_axis_value).collect();

        Plot::new("age_ratio")
            .width(PLOT_WIDTH)
            .height(LINE_PLOT_HEIGHT)
            .legend(Legend::default())
            .y_axis_label(format!("Applications / {} applications", ratio.baseline))
            .allow_scroll(false)
            .x_axis_formatter(|mark, _range| Self::quarter_axis_label(mark.value))
            .show(ui, |plot_ui| {
                for (i, series) in ratio.series.iter().enumerate() {
                    let color = palette::series_color(i);
                    let points: PlotPoints = xs
                        .iter()
                        .zip(series.values.iter())
                        .map(|(&x, &y)| [x, y])
                        .collect();
                    plot_ui.line(
                        Line::new(points)
                            .color(color)
                            .width(2.0)
                            .name(series.category.replace('_', "~")),
                    );

                    let (Some(&x0), Some(&x1)) = (xs.first(), xs.last()) else {
                        continue;
                    };
                    if let Some((first, last)) = series.endpoints() {
                        plot_ui.points(
                            Points::new(PlotPoints::new(vec![[x0, first], [x1, last]]))
                                .radius(4.0)
                                .color(color),
                        );
                        plot_ui.text(
                            Text::new(PlotPoint::new(x0, first), format!("{first:.2} "))
                                .color(color)
                                .anchor(Align2::RIGHT_CENTER),
                        );
                        plot_ui.text(
                            Text::new(PlotPoint::new(x1, last), format!(" {last:.2}"))
                                .color(color)
                                .anchor(Align2::LEFT_CENTER),
                        );
                    }
                }
            });
    }

    /// Frame caption used by the sidebar and exports.
    pub fn frame_caption(period: Option<Quarter>, index: usize, count: usize) -> String {
        match period {
            Some(q) => format!("{} ({}/{})", q, index + 1, count),
            None => "No frames".to_string(),
        }
    }

    pub fn error_color() -> Color32 {
        Color32::from_rgb(220, 53, 69)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bubble_radius_scales_with_sqrt() {
        assert_eq!(ChartPlotter::bubble_radius(100.0, 100.0), MAX_BUBBLE_RADIUS as f32);
        assert_eq!(
            ChartPlotter::bubble_radius(25.0, 100.0),
            (MAX_BUBBLE_RADIUS / 2.0) as f32
        );
        assert_eq!(ChartPlotter::bubble_radius(0.0, 100.0), MIN_BUBBLE_RADIUS as f32);
        assert_eq!(ChartPlotter::bubble_radius(5.0, 0.0), MIN_BUBBLE_RADIUS as f32);
    }

    #[test]
    fn quarter_axis_labels() {
        assert_eq!(ChartPlotter::quarter_axis_label(2016.0), "2016");
        assert_eq!(ChartPlotter::quarter_axis_label(2016.5), "2016Q3");
        assert_eq!(ChartPlotter::quarter_axis_label(2016.1), "");
        assert_eq!(
            ChartPlotter::frame_caption(Quarter::new(2009, 1), 0, 57),
            "2009Q1 (1/57)"
        );
        assert_eq!(ChartPlotter::frame_caption(None, 0, 0), "No frames");
    }
}
