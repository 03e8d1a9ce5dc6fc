//! Chart colors.
//! Fixed palettes plus parsing of the color strings stored in the datasets.

use egui::Color32;

/// Fixed bar color per age bracket; brackets outside the spotlight are grey.
pub const AGE_BAR_COLORS: [(&str, Color32); 12] = [
    ("20_25", Color32::from_rgb(99, 110, 250)),
    ("25_30", Color32::from_rgb(0, 204, 150)),
    ("30_35", Color32::from_rgb(239, 85, 59)),
    ("35_40", Color32::from_rgb(208, 210, 210)),
    ("40_45", Color32::from_rgb(208, 210, 211)),
    ("45_50", Color32::from_rgb(208, 210, 212)),
    ("50_55", Color32::from_rgb(208, 210, 213)),
    ("55_60", Color32::from_rgb(208, 210, 214)),
    ("60_65", Color32::from_rgb(208, 210, 215)),
    ("65_70", Color32::from_rgb(208, 210, 216)),
    ("70_75", Color32::from_rgb(208, 210, 217)),
    ("75_80", Color32::from_rgb(208, 210, 218)),
];

/// Regions in legend order for the county bubble chart.
pub const DISTRICT_ORDER: [&str; 4] = ["北部區域", "中部區域", "南部區域", "東部區域"];

pub const SERIES_PALETTE: [Color32; 6] = [
    Color32::from_rgb(99, 110, 250),
    Color32::from_rgb(239, 85, 59),
    Color32::from_rgb(0, 204, 150),
    Color32::from_rgb(171, 99, 250),
    Color32::from_rgb(255, 161, 90),
    Color32::from_rgb(25, 211, 243),
];

pub const AVERAGE_LINE: Color32 = Color32::from_rgb(0, 176, 246);
pub const BAND_FILL: Color32 = Color32::from_rgba_premultiplied(0, 35, 49, 51);
pub const MARKER_GREY: Color32 = Color32::from_rgb(128, 128, 128);
pub const NEUTRAL_BAR: Color32 = Color32::from_rgb(208, 210, 210);

pub fn age_bar_color(age_group: &str) -> Color32 {
    AGE_BAR_COLORS
        .iter()
        .find(|(key, _)| *key == age_group)
        .map(|(_, color)| *color)
        .unwrap_or(NEUTRAL_BAR)
}

pub fn series_color(index: usize) -> Color32 {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Legend position of a district: known regions first, others after.
pub fn district_rank(district: &str) -> usize {
    DISTRICT_ORDER
        .iter()
        .position(|d| *d == district)
        .unwrap_or(DISTRICT_ORDER.len())
}

/// Parse `rgb(r,g,b)`, `rgba(r,g,b,a)`, `#rrggbb` or a basic color name.
pub fn parse_color(value: &str) -> Option<Color32> {
    let s = value.trim().trim_matches('"').to_ascii_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?));
    }

    if let Some(body) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let rgb: Vec<u8> = parts
            .iter()
            .take(3)
            .map(|p| p.parse::<u8>().ok())
            .collect::<Option<_>>()?;
        return match parts.len() {
            3 => Some(Color32::from_rgb(rgb[0], rgb[1], rgb[2])),
            4 => {
                let alpha: f32 = parts[3].parse().ok()?;
                let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
                Some(Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], a))
            }
            _ => None,
        };
    }

    match s.as_str() {
        "red" => Some(Color32::from_rgb(239, 85, 59)),
        "blue" => Some(Color32::from_rgb(99, 110, 250)),
        "green" => Some(Color32::from_rgb(0, 204, 150)),
        "orange" => Some(Color32::from_rgb(255, 161, 90)),
        "grey" | "gray" => Some(NEUTRAL_BAR),
        "black" => Some(Color32::BLACK),
        "white" => Some(Color32::WHITE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dataset_color_strings() {
        assert_eq!(
            parse_color("rgb(208, 210, 212)"),
            Some(Color32::from_rgb(208, 210, 212))
        );
        assert_eq!(parse_color("#EF553B"), Some(Color32::from_rgb(239, 85, 59)));
        assert_eq!(
            parse_color("rgba(0,176,246,0.2)"),
            Some(Color32::from_rgba_unmultiplied(0, 176, 246, 51))
        );
        assert_eq!(parse_color(" Red "), parse_color("red"));
        assert_eq!(parse_color("rgb(300,0,0)"), None);
        assert_eq!(parse_color("#abc"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn fixed_palettes() {
        assert_eq!(age_bar_color("30_35"), Color32::from_rgb(239, 85, 59));
        assert_eq!(age_bar_color("80_85"), NEUTRAL_BAR);
        assert_eq!(district_rank("中部區域"), 1);
        assert_eq!(district_rank("離島"), DISTRICT_ORDER.len());
        assert_eq!(series_color(6), series_color(0));
    }
}
