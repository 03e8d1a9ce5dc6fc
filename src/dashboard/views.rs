//! Topic view models
//! Loads each topic's datasets and shapes them into chart-ready series.

use crate::analysis::{
    frames_by_time, rank_by_time, ratio_series, weighted_average, AnalysisError, RankedFrame,
    RatioSeries, ZeroTotalPolicy,
};
use crate::charts::palette::{age_bar_color, district_rank, parse_color};
use crate::config::DashboardConfig;
use crate::dashboard::topics::Topic;
use crate::data::{
    load_typed, CountyGrowthRecord, CountyQuarterRecord, DataUnavailable, LoanAgeRecord, Quarter,
    TableCache,
};
use egui::Color32;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Quarter after which the average applicant age visibly shifts upward.
pub const AGE_SHIFT_MARKER: Quarter = Quarter {
    year: 2015,
    quarter: 4,
};

const ABOVE_NATIONAL: Color32 = Color32::from_rgb(239, 85, 59);
const BELOW_NATIONAL: Color32 = Color32::from_rgb(99, 110, 250);

#[derive(Debug, Clone, PartialEq)]
pub struct BubblePoint {
    pub county: String,
    pub district: String,
    pub house_age: f64,
    pub unit_price: f64,
    pub transactions: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BubbleFrame {
    pub period: Quarter,
    pub points: Vec<BubblePoint>,
}

/// House age vs unit price per county, one frame per quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleChart {
    pub frames: Vec<BubbleFrame>,
    /// Districts in legend order.
    pub districts: Vec<String>,
    pub max_transactions: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthBar {
    pub county: String,
    pub value: f64,
    pub color: Color32,
}

/// County growth minus national growth, ascending by value.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthChart {
    pub title: String,
    pub value_label: String,
    pub bars: Vec<GrowthBar>,
}

#[derive(Debug, Clone)]
pub struct AgingHomesView {
    pub bubbles: BubbleChart,
    pub age_growth: GrowthChart,
    pub price_growth: GrowthChart,
}

/// Ranked age brackets per quarter.
#[derive(Debug, Clone)]
pub struct RaceChart {
    pub frames: Vec<RankedFrame<Quarter>>,
    pub colors: HashMap<String, Color32>,
    pub top_n: usize,
    pub max_value: f64,
}

impl RaceChart {
    pub fn color_of(&self, category: &str) -> Color32 {
        self.colors
            .get(category)
            .copied()
            .unwrap_or_else(|| age_bar_color(category))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeBandPoint {
    pub period: Quarter,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Weighted average applicant age with lower/upper bracket bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBand {
    pub points: Vec<AgeBandPoint>,
    pub marker: Quarter,
}

#[derive(Debug, Clone)]
pub struct LaterBuyersView {
    pub race: RaceChart,
    pub average_age: Result<AgeBand, AnalysisError>,
    pub age_ratio: Result<RatioSeries<Quarter>, AnalysisError>,
}

#[derive(Debug, Clone)]
pub enum TopicView {
    AgingHomes(AgingHomesView),
    LaterBuyers(LaterBuyersView),
}

impl TopicView {
    pub fn topic(&self) -> Topic {
        match self {
            TopicView::AgingHomes(_) => Topic::AgingHomes,
            TopicView::LaterBuyers(_) => Topic::LaterBuyers,
        }
    }

    /// Frame count of the topic's animated chart.
    pub fn frame_count(&self) -> usize {
        match self {
            TopicView::AgingHomes(view) => view.bubbles.frames.len(),
            TopicView::LaterBuyers(view) => view.race.frames.len(),
        }
    }

    /// Quarter shown by frame `index` of the animated chart.
    pub fn frame_period(&self, index: usize) -> Option<Quarter> {
        match self {
            TopicView::AgingHomes(view) => view.bubbles.frames.get(index).map(|f| f.period),
            TopicView::LaterBuyers(view) => view.race.frames.get(index).map(|f| f.time_bucket),
        }
    }
}

/// Parse every configured dataset in parallel to warm the cache.
pub fn preload(
    cache: &TableCache,
    config: &DashboardConfig,
) -> Vec<(PathBuf, Result<usize, DataUnavailable>)> {
    let paths = vec![
        config.loan_age_path(),
        config.county_quarter_path(),
        config.county_growth_path(),
    ];

    paths
        .into_par_iter()
        .map(|path| {
            let result = cache.load(&path).map(|df| df.height());
            if let Err(e) = &result {
                warn!("Preload failed: {e}");
            }
            (path, result)
        })
        .collect()
}

pub fn build_topic(
    topic: Topic,
    cache: &TableCache,
    config: &DashboardConfig,
) -> Result<TopicView, DataUnavailable> {
    info!("Building view for {:?}", topic);
    match topic {
        Topic::AgingHomes => build_aging_homes(cache, config).map(TopicView::AgingHomes),
        Topic::LaterBuyers => build_later_buyers(cache, config).map(TopicView::LaterBuyers),
    }
}

pub fn build_aging_homes(
    cache: &TableCache,
    config: &DashboardConfig,
) -> Result<AgingHomesView, DataUnavailable> {
    let quarters = load_typed::<CountyQuarterRecord>(cache, &config.county_quarter_path())?;
    let growth = load_typed::<CountyGrowthRecord>(cache, &config.county_growth_path())?;

    Ok(AgingHomesView {
        bubbles: bubble_chart(&quarters.rows),
        age_growth: growth_chart(
            "House-age growth minus national growth (2023 / 2011)",
            "Growth difference (pp)",
            &growth.rows,
            |r| (r.house_age_diff, r.house_age_color.as_str()),
        ),
        price_growth: growth_chart(
            "Unit-price growth minus national growth (2023 / 2011)",
            "Growth difference (pp)",
            &growth.rows,
            |r| (r.price_diff, r.price_color.as_str()),
        ),
    })
}

pub fn build_later_buyers(
    cache: &TableCache,
    config: &DashboardConfig,
) -> Result<LaterBuyersView, DataUnavailable> {
    let table = load_typed::<LoanAgeRecord>(cache, &config.loan_age_path())?;
    let rows = &table.rows;

    let average_age = age_band(rows, config.zero_total_policy);
    if let Err(e) = &average_age {
        warn!("Average age chart unavailable: {e}");
    }

    let age_ratio = ratio_series(
        rows,
        |r| r.period,
        |r| r.age_group.as_str(),
        |r| r.count,
        &config.ratio_baseline,
        &config.ratio_targets,
        config.ratio_precision,
    );
    if let Err(e) = &age_ratio {
        warn!("Age ratio chart unavailable: {e}");
    }

    Ok(LaterBuyersView {
        race: race_chart(rows, config.race_top_n),
        average_age,
        age_ratio,
    })
}

fn bubble_chart(rows: &[CountyQuarterRecord]) -> BubbleChart {
    let frames: Vec<BubbleFrame> = frames_by_time(rows, |r| r.period)
        .into_iter()
        .map(|frame| BubbleFrame {
            period: frame.time_bucket,
            points: frame
                .rows
                .iter()
                .map(|r| BubblePoint {
                    county: r.county.clone(),
                    district: r.district.clone(),
                    house_age: r.house_age,
                    unit_price: r.unit_price,
                    transactions: r.transactions,
                })
                .collect(),
        })
        .collect();

    let mut districts: Vec<String> = Vec::new();
    for row in rows {
        if !districts.contains(&row.district) {
            districts.push(row.district.clone());
        }
    }
    districts.sort_by_key(|d| district_rank(d));

    BubbleChart {
        frames,
        districts,
        max_transactions: rows.iter().map(|r| r.transactions).fold(0.0, f64::max),
    }
}

fn growth_chart(
    title: &str,
    value_label: &str,
    rows: &[CountyGrowthRecord],
    pick: impl Fn(&CountyGrowthRecord) -> (f64, &str),
) -> GrowthChart {
    let mut bars: Vec<GrowthBar> = rows
        .iter()
        .map(|r| {
            let (value, color) = pick(r);
            GrowthBar {
                county: r.county.clone(),
                value,
                color: parse_color(color).unwrap_or(if value >= 0.0 {
                    ABOVE_NATIONAL
                } else {
                    BELOW_NATIONAL
                }),
            }
        })
        .collect();
    bars.sort_by(|a, b| a.value.total_cmp(&b.value));

    GrowthChart {
        title: title.to_string(),
        value_label: value_label.to_string(),
        bars,
    }
}

fn race_chart(rows: &[LoanAgeRecord], top_n: usize) -> RaceChart {
    let frames: Vec<RankedFrame<Quarter>> = rank_by_time(
        rows,
        |r| r.period,
        |r| r.age_group_name.as_str(),
        |r| r.count,
        top_n,
    )
    .iter()
    .collect();

    let mut colors: HashMap<String, Color32> = HashMap::new();
    for row in rows {
        colors.entry(row.age_group_name.clone()).or_insert_with(|| {
            row.bar_color
                .as_deref()
                .and_then(parse_color)
                .unwrap_or_else(|| age_bar_color(&row.age_group))
        });
    }

    let max_value = frames
        .iter()
        .flat_map(|f| f.entries.iter().map(|e| e.value))
        .fold(0.0, f64::max);

    RaceChart {
        frames,
        colors,
        top_n,
        max_value,
    }
}

fn age_band(rows: &[LoanAgeRecord], policy: ZeroTotalPolicy) -> Result<AgeBand, AnalysisError> {
    let mean = weighted_average(rows, |r| r.period, |r| r.count_mid_age, |r| r.count)
        .resolve(policy)?;
    let lower = weighted_average(rows, |r| r.period, |r| r.count_lower_age, |r| r.count)
        .resolve(policy)?;
    let upper = weighted_average(rows, |r| r.period, |r| r.count_upper_age, |r| r.count)
        .resolve(policy)?;

    let lower: BTreeMap<Quarter, f64> = lower.into_iter().collect();
    let upper: BTreeMap<Quarter, f64> = upper.into_iter().collect();

    let points = mean
        .into_iter()
        .filter_map(|(period, mean)| {
            Some(AgeBandPoint {
                period,
                mean,
                lower: *lower.get(&period)?,
                upper: *upper.get(&period)?,
            })
        })
        .collect();

    Ok(AgeBand {
        points,
        marker: AGE_SHIFT_MARKER,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const AGE_CSV: &str = "\
date_fmt,age_group,age_group_name,cnt,cnt_m_age,cnt_l_age,cnt_u_age,barcolor
2009-03-31,30_35,30~35,100,3250,3000,3500,
2009-03-31,35_40,35~40,94,3525,3290,3760,
2009-03-31,40_45,40~45,86,3655,3440,3870,
2009-03-31,45_50,45~50,70,3325,3150,3500,
2009-06-30,30_35,30~35,0,0,0,0,
2009-06-30,35_40,35~40,0,0,0,0,
2009-06-30,40_45,40~45,0,0,0,0,
2009-06-30,45_50,45~50,0,0,0,0,
2023-03-31,30_35,30~35,200,6500,6000,7000,\"rgb(1,2,3)\"
2023-03-31,35_40,35~40,224,8400,7840,8960,
2023-03-31,40_45,40~45,226,9605,9040,10170,
2023-03-31,45_50,45~50,150,7125,6750,7500,
";

    const QUARTER_CSV: &str = "\
date,county,district,hage,price,cnt
10001,臺北市,北部區域,25.1,52.27,1200
10001,臺中市,中部區域,12.0,18.5,900
10001,花蓮縣,東部區域,18.0,11.0,150
10002,臺北市,北部區域,25.4,53.0,1100
";

    const GROWTH_CSV: &str = "\
county,hage_diff,hage_color,price_diff,price_color
新竹縣,91.0,red,37.0,red
臺北市,12.0,red,-25.0,blue
臺東縣,-20.5,blue,4.0,unknown
";

    fn config_for(dir: &Path) -> DashboardConfig {
        DashboardConfig {
            data_dir: dir.to_path_buf(),
            ..DashboardConfig::default()
        }
    }

    fn fixture() -> (TempDir, DashboardConfig) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data_age.csv"), AGE_CSV).unwrap();
        fs::write(dir.path().join("data_hage_yyyqq.csv"), QUARTER_CSV).unwrap();
        fs::write(dir.path().join("data_hage_versus.csv"), GROWTH_CSV).unwrap();
        let config = config_for(dir.path());
        (dir, config)
    }

    #[test]
    fn later_buyers_ratio_fails_alone_on_zero_baseline() {
        let (_dir, config) = fixture();
        let cache = TableCache::new();

        let view = build_later_buyers(&cache, &config).unwrap();

        // 2009Q2 has a zero baseline: only the ratio chart fails
        assert!(matches!(
            view.age_ratio,
            Err(AnalysisError::DivisionUndefined { .. })
        ));
        let band = view.average_age.unwrap();
        assert_eq!(band.points.len(), 2);
        assert_eq!(
            band.points[0].mean,
            (3250.0 + 3525.0 + 3655.0 + 3325.0) / 350.0
        );
        assert!(band.points.iter().all(|p| p.lower < p.mean && p.mean < p.upper));
        assert_eq!(view.race.frames.len(), 3);
        assert_eq!(view.race.frames[0].entries[0].category, "30~35");
        assert_eq!(view.race.color_of("30~35"), Color32::from_rgb(239, 85, 59));
    }

    #[test]
    fn abort_policy_fails_average_age_only() {
        let (dir, _) = fixture();
        let config = DashboardConfig {
            zero_total_policy: ZeroTotalPolicy::Abort,
            ..config_for(dir.path())
        };
        let cache = TableCache::new();

        let view = build_later_buyers(&cache, &config).unwrap();
        assert!(view.average_age.is_err());
        assert_eq!(view.race.top_n, 12);
    }

    #[test]
    fn ratio_chart_over_complete_quarters() {
        let dir = TempDir::new().unwrap();
        let filtered: String = AGE_CSV
            .lines()
            .filter(|l| !l.starts_with("2009-06-30"))
            .map(|l| format!("{l}\n"))
            .collect();
        fs::write(dir.path().join("data_age.csv"), filtered).unwrap();
        let cache = TableCache::new();

        let view = build_later_buyers(&cache, &config_for(dir.path())).unwrap();
        let ratio = view.age_ratio.unwrap();

        assert_eq!(ratio.time_buckets.len(), 2);
        assert_eq!(ratio.get("35_40").unwrap().values, vec![0.94, 1.12]);
        assert_eq!(ratio.get("40_45").unwrap().values, vec![0.86, 1.13]);
        assert_eq!(ratio.get("45_50").unwrap().values, vec![0.7, 0.75]);
    }

    #[test]
    fn aging_homes_view_orders_bars_and_districts() {
        let (_dir, config) = fixture();
        let cache = TableCache::new();

        let view = build_aging_homes(&cache, &config).unwrap();
        let first = view.bubbles.frames[0].period;
        let topic_view = TopicView::AgingHomes(view.clone());
        assert_eq!(topic_view.frame_count(), 2);
        assert_eq!(topic_view.frame_period(0), Some(first));
        assert_eq!(topic_view.frame_period(2), None);

        assert_eq!(view.bubbles.frames.len(), 2);
        assert_eq!(view.bubbles.frames[0].points.len(), 3);
        assert_eq!(view.bubbles.districts, ["北部區域", "中部區域", "東部區域"]);
        assert_eq!(view.bubbles.max_transactions, 1200.0);

        let counties: Vec<&str> = view
            .age_growth
            .bars
            .iter()
            .map(|b| b.county.as_str())
            .collect();
        assert_eq!(counties, ["臺東縣", "臺北市", "新竹縣"]);
        assert_eq!(view.price_growth.bars[0].value, -25.0);
        // unknown color strings fall back to the sign color
        assert_eq!(view.price_growth.bars[1].color, ABOVE_NATIONAL);
    }

    #[test]
    fn missing_dataset_fails_the_topic() {
        let dir = TempDir::new().unwrap();
        let cache = TableCache::new();
        let err = build_topic(Topic::AgingHomes, &cache, &config_for(dir.path())).unwrap_err();
        assert!(matches!(err, DataUnavailable::NotFound { .. }));
    }

    #[test]
    fn preload_warms_cache_for_present_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data_age.csv"), AGE_CSV).unwrap();
        let cache = TableCache::new();

        let results = preload(&cache, &config_for(dir.path()));
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|(_, r)| r.is_ok()).count(), 1);
        assert_eq!(cache.len(), 1);
    }
}
