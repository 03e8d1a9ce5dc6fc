//! Static Chart Renderer
//! Writes PNG versions of the dashboard charts with plotters.
//!
//! Layout follows the interactive charts: title on top, value axis at the
//! bottom, category or time axis on the left.

use crate::analysis::{RankedFrame, RatioSeries};
use crate::charts::fonts;
use crate::charts::palette::{self, AVERAGE_LINE, MARKER_GREY};
use crate::dashboard::{AgeBand, GrowthChart, RaceChart, TopicView};
use crate::data::Quarter;
use egui::Color32;
use log::{info, warn};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const EXPORT_WIDTH: u32 = 1200;
pub const EXPORT_HEIGHT: u32 = 800;

/// Family for every text element; a CJK family when one is installed.
fn font() -> &'static str {
    static FAMILY: OnceLock<&'static str> = OnceLock::new();
    FAMILY.get_or_init(|| match fonts::installed_cjk_font() {
        Some(cjk) => {
            info!("Exporting charts with font {} ({})", cjk.family, cjk.path);
            cjk.family
        }
        None => {
            warn!("No CJK font found; exported labels may not render");
            fonts::FALLBACK_FAMILY
        }
    })
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render: {0}")]
    Empty(&'static str),
    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb(color: Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

/// Padded value range that always includes zero.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((max - min) * 0.1).max(1.0);
    (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
}

fn time_range(buckets: &[Quarter]) -> Option<(f64, f64)> {
    let first = buckets.first()?.as_axis_value();
    let last = buckets.last()?.as_axis_value();
    Some((first - 0.25, last + 0.25))
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Growth-difference bars, smallest at the bottom.
    pub fn render_growth_chart(chart: &GrowthChart, path: &Path) -> Result<(), RenderError> {
        if chart.bars.is_empty() {
            return Err(RenderError::Empty("growth chart has no counties"));
        }
        let (x_min, x_max) = value_range(chart.bars.iter().map(|b| b.value));
        let n = chart.bars.len();
        let labels: Vec<String> = chart.bars.iter().map(|b| b.county.clone()).collect();

        let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart_ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (font(), 26.0))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, -0.5f64..(n as f64 - 0.5))
            .map_err(draw_err)?;

        chart_ctx
            .configure_mesh()
            .label_style((font(), 14.0))
            .axis_desc_style((font(), 16.0))
            .disable_y_mesh()
            .x_desc(chart.value_label.as_str())
            .y_labels(n)
            .y_label_formatter(&|y| {
                let idx = y.round();
                if idx < 0.0 || (y - idx).abs() > 1e-6 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .draw()
            .map_err(draw_err)?;

        chart_ctx
            .draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
                let y = i as f64;
                Rectangle::new([(0.0, y - 0.35), (bar.value, y + 0.35)], rgb(bar.color).filled())
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    /// A single bar-race frame.
    pub fn render_race_frame(
        race: &RaceChart,
        frame: &RankedFrame<Quarter>,
        path: &Path,
    ) -> Result<(), RenderError> {
        if frame.entries.is_empty() {
            return Err(RenderError::Empty("race frame has no entries"));
        }
        let slots = race.top_n.max(frame.entries.len());
        let top = slots as f64 - 1.0;
        let names: Vec<String> = frame.entries.iter().map(|e| e.category.clone()).collect();
        let title = format!("New mortgage applications by age group, {}", frame.time_bucket);

        let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart_ctx = ChartBuilder::on(&root)
            .caption(&title, (font(), 26.0))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(80)
            .build_cartesian_2d(0.0..race.max_value.max(1.0) * 1.1, -0.5f64..(top + 0.5))
            .map_err(draw_err)?;

        chart_ctx
            .configure_mesh()
            .label_style((font(), 14.0))
            .axis_desc_style((font(), 16.0))
            .disable_y_mesh()
            .x_desc("Applications")
            .y_labels(slots)
            .y_label_formatter(&|y| {
                let slot = (top - y).round();
                if slot < 0.0 || (top - y - slot).abs() > 1e-6 {
                    return String::new();
                }
                names.get(slot as usize).cloned().unwrap_or_default()
            })
            .draw()
            .map_err(draw_err)?;

        chart_ctx
            .draw_series(frame.entries.iter().map(|e| {
                let y = top - (e.rank - 1) as f64;
                Rectangle::new(
                    [(0.0, y - 0.4), (e.value, y + 0.4)],
                    rgb(race.color_of(&e.category)).filled(),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    /// Average age line with its lower/upper band and the shift marker.
    pub fn render_age_band(band: &AgeBand, path: &Path) -> Result<(), RenderError> {
        let periods: Vec<Quarter> = band.points.iter().map(|p| p.period).collect();
        let (x_min, x_max) =
            time_range(&periods).ok_or(RenderError::Empty("average age has no points"))?;
        let y_min = band.points.iter().map(|p| p.lower).fold(f64::INFINITY, f64::min) - 1.0;
        let y_max = band.points.iter().map(|p| p.upper).fold(f64::NEG_INFINITY, f64::max) + 1.0;

        let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT / 2 + 100))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart_ctx = ChartBuilder::on(&root)
            .caption("Average age of new mortgage applicants", (font(), 26.0))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart_ctx
            .configure_mesh()
            .label_style((font(), 14.0))
            .axis_desc_style((font(), 16.0))
            .y_desc("Average age")
            .x_label_formatter(&|x| format!("{:.0}", x.floor()))
            .draw()
            .map_err(draw_err)?;

        let line = rgb(AVERAGE_LINE);
        let outline: Vec<(f64, f64)> = band
            .points
            .iter()
            .map(|p| (p.period.as_axis_value(), p.upper))
            .chain(
                band.points
                    .iter()
                    .rev()
                    .map(|p| (p.period.as_axis_value(), p.lower)),
            )
            .collect();
        chart_ctx
            .draw_series(std::iter::once(Polygon::new(outline, line.mix(0.2).filled())))
            .map_err(draw_err)?;
        chart_ctx
            .draw_series(LineSeries::new(
                band.points
                    .iter()
                    .map(|p| (p.period.as_axis_value(), p.mean)),
                line.stroke_width(3),
            ))
            .map_err(draw_err)?;

        let marker_x = band.marker.as_axis_value() + 0.25;
        chart_ctx
            .draw_series(LineSeries::new(
                vec![(marker_x, y_min), (marker_x, y_max)],
                rgb(MARKER_GREY).stroke_width(2),
            ))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    /// Ratio lines with endpoint labels.
    pub fn render_ratio_chart(ratio: &RatioSeries<Quarter>, path: &Path) -> Result<(), RenderError> {
        if ratio.series.is_empty() {
            return Err(RenderError::Empty("ratio series has no categories"));
        }
        let (x_min, x_max) =
            time_range(&ratio.time_buckets).ok_or(RenderError::Empty("ratio series is empty"))?;
        let all = ratio.series.iter().flat_map(|s| s.values.iter().copied());
        let y_min = all.clone().fold(f64::INFINITY, f64::min) - 0.1;
        let y_max = all.fold(f64::NEG_INFINITY, f64::max) + 0.1;
        let xs: Vec<f64> = ratio.time_buckets.iter().map(Quarter::as_axis_value).collect();
        let title = format!("Applications per age group / {} applications", ratio.baseline);

        let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT / 2 + 100))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart_ctx = ChartBuilder::on(&root)
            .caption(&title, (font(), 26.0))
            .margin(30)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart_ctx
            .configure_mesh()
            .label_style((font(), 14.0))
            .axis_desc_style((font(), 16.0))
            .y_desc("Ratio")
            .x_label_formatter(&|x| format!("{:.0}", x.floor()))
            .draw()
            .map_err(draw_err)?;

        for (i, series) in ratio.series.iter().enumerate() {
            let style = rgb(palette::series_color(i)).stroke_width(2);
            chart_ctx
                .draw_series(LineSeries::new(
                    xs.iter().copied().zip(series.values.iter().copied()),
                    style,
                ))
                .map_err(draw_err)?
                .label(series.category.replace('_', "~"))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

            if let (Some((first, last)), Some(&x0), Some(&x1)) =
                (series.endpoints(), xs.first(), xs.last())
            {
                chart_ctx
                    .draw_series([
                        Text::new(format!("{first:.2}"), (x0, first), (font(), 14.0)),
                        Text::new(format!("{last:.2}"), (x1, last), (font(), 14.0)),
                    ])
                    .map_err(draw_err)?;
            }
        }

        chart_ctx
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    /// Charts of a topic worth exporting, with their file names in write order.
    /// Charts whose computation failed or that hold no data are left out.
    fn export_plan(view: &TopicView, frame_index: usize) -> Vec<(String, ExportChart<'_>)> {
        let mut plan = Vec::new();
        match view {
            TopicView::AgingHomes(v) => {
                for (name, chart) in [
                    ("house_age_growth.png", &v.age_growth),
                    ("unit_price_growth.png", &v.price_growth),
                ] {
                    if !chart.bars.is_empty() {
                        plan.push((name.to_string(), ExportChart::Growth(chart)));
                    }
                }
            }
            TopicView::LaterBuyers(v) => {
                if let Some(frame) = v.race.frames.get(frame_index) {
                    if !frame.entries.is_empty() {
                        plan.push((
                            format!("age_race_{}.png", frame.time_bucket),
                            ExportChart::Race(&v.race, frame),
                        ));
                    }
                }
                if let Ok(band) = &v.average_age {
                    if !band.points.is_empty() {
                        plan.push(("average_age.png".to_string(), ExportChart::AgeBand(band)));
                    }
                }
                if let Ok(ratio) = &v.age_ratio {
                    if !ratio.time_buckets.is_empty() && !ratio.series.is_empty() {
                        plan.push(("age_ratio.png".to_string(), ExportChart::Ratio(ratio)));
                    }
                }
            }
        }
        plan
    }

    /// File names written by [`Self::export_topic`], in write order.
    pub fn export_file_names(view: &TopicView, frame_index: usize) -> Vec<String> {
        Self::export_plan(view, frame_index)
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Write the static charts of a topic into `dir`.
    pub fn export_topic(
        view: &TopicView,
        frame_index: usize,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, RenderError> {
        let mut written = Vec::new();
        for (name, chart) in Self::export_plan(view, frame_index) {
            let path = dir.join(name);
            match chart {
                ExportChart::Growth(growth) => Self::render_growth_chart(growth, &path)?,
                ExportChart::Race(race, frame) => Self::render_race_frame(race, frame, &path)?,
                ExportChart::AgeBand(band) => Self::render_age_band(band, &path)?,
                ExportChart::Ratio(ratio) => Self::render_ratio_chart(ratio, &path)?,
            }
            written.push(path);
        }

        info!("Exported {} chart(s) to {}", written.len(), dir.display());
        Ok(written)
    }
}

enum ExportChart<'a> {
    Growth(&'a GrowthChart),
    Race(&'a RaceChart, &'a RankedFrame<Quarter>),
    AgeBand(&'a AgeBand),
    Ratio(&'a RatioSeries<Quarter>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_always_contains_zero() {
        let (lo, hi) = value_range([3.0, 10.0].into_iter());
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 11.0);

        let (lo, hi) = value_range([-25.0, 91.0].into_iter());
        assert!(lo < -25.0);
        assert!(hi > 91.0);
    }

    #[test]
    fn time_range_pads_quarters() {
        let buckets = [Quarter::new(2009, 1).unwrap(), Quarter::new(2023, 1).unwrap()];
        assert_eq!(time_range(&buckets), Some((2008.75, 2023.25)));
        assert_eq!(time_range(&[]), None);
    }

    #[test]
    fn failed_charts_are_left_out_of_the_export() {
        use crate::analysis::{AnalysisError, RankedEntry};
        use crate::dashboard::LaterBuyersView;
        use std::collections::HashMap;

        let q = Quarter::new(2012, 3).unwrap();
        let view = TopicView::LaterBuyers(LaterBuyersView {
            race: RaceChart {
                frames: vec![RankedFrame {
                    time_bucket: q,
                    entries: vec![RankedEntry {
                        category: "30_35".into(),
                        value: 10.0,
                        rank: 1,
                    }],
                }],
                colors: HashMap::new(),
                top_n: 12,
                max_value: 10.0,
            },
            average_age: Err(AnalysisError::DivisionUndefined {
                time_bucket: q.to_string(),
            }),
            age_ratio: Err(AnalysisError::BaselineMissing {
                baseline: "30_35".into(),
                time_bucket: q.to_string(),
            }),
        });

        assert_eq!(
            StaticChartRenderer::export_file_names(&view, 0),
            vec!["age_race_2012Q3.png".to_string()]
        );
        assert!(StaticChartRenderer::export_file_names(&view, 5).is_empty());
    }

    #[test]
    fn header_only_dataset_exports_nothing() {
        use crate::config::DashboardConfig;
        use crate::dashboard::{build_topic, Topic};
        use crate::data::TableCache;

        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("data_age.csv"),
            "date_fmt,age_group,age_group_name,cnt,cnt_m_age,cnt_l_age,cnt_u_age,barcolor\n",
        )
        .unwrap();
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        let view = build_topic(Topic::LaterBuyers, &TableCache::new(), &config).unwrap();

        assert!(StaticChartRenderer::export_file_names(&view, 0).is_empty());
        let out = tempfile::TempDir::new().unwrap();
        let written = StaticChartRenderer::export_topic(&view, 0, out.path()).unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn empty_charts_that_computed_are_left_out() {
        use crate::dashboard::LaterBuyersView;
        use std::collections::HashMap;

        let view = TopicView::LaterBuyers(LaterBuyersView {
            race: RaceChart {
                frames: vec![RankedFrame {
                    time_bucket: Quarter::new(2012, 3).unwrap(),
                    entries: Vec::new(),
                }],
                colors: HashMap::new(),
                top_n: 12,
                max_value: 0.0,
            },
            average_age: Ok(AgeBand {
                points: Vec::new(),
                marker: Quarter::new(2015, 4).unwrap(),
            }),
            age_ratio: Ok(RatioSeries {
                baseline: "30_35".into(),
                time_buckets: Vec::new(),
                series: Vec::new(),
            }),
        });
        assert!(StaticChartRenderer::export_file_names(&view, 0).is_empty());

        let dir = tempfile::TempDir::new().unwrap();
        let written = StaticChartRenderer::export_topic(&view, 0, dir.path()).unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_growth_chart_is_rejected_before_drawing() {
        let chart = GrowthChart {
            title: "empty".into(),
            value_label: "pp".into(),
            bars: Vec::new(),
        };
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            StaticChartRenderer::render_growth_chart(&chart, &dir.path().join("g.png")),
            Err(RenderError::Empty(_))
        ));
    }
}
