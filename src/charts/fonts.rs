//! CJK fonts
//! System fonts able to draw county and age-group names, shared by the window and PNG export.

use std::path::Path;

/// A font file and the family name it is registered under.
#[derive(Debug, PartialEq)]
pub struct CjkFont {
    pub path: &'static str,
    pub family: &'static str,
}

/// Tried in order, first installed wins.
pub static CJK_FONTS: &[CjkFont] = &[
    CjkFont {
        path: "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        family: "Noto Sans CJK TC",
    },
    CjkFont {
        path: "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        family: "Noto Sans CJK TC",
    },
    CjkFont {
        path: "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        family: "WenQuanYi Micro Hei",
    },
    CjkFont {
        path: "/System/Library/Fonts/PingFang.ttc",
        family: "PingFang TC",
    },
    CjkFont {
        path: "C:\\Windows\\Fonts\\msjh.ttc",
        family: "Microsoft JhengHei",
    },
    CjkFont {
        path: "C:\\Windows\\Fonts\\msyh.ttc",
        family: "Microsoft YaHei",
    },
];

/// Family used when no CJK font is installed.
pub const FALLBACK_FAMILY: &str = "sans-serif";

pub fn first_installed<'a>(
    candidates: &'a [CjkFont],
    exists: impl Fn(&Path) -> bool,
) -> Option<&'a CjkFont> {
    candidates.iter().find(|font| exists(Path::new(font.path)))
}

pub fn installed_cjk_font() -> Option<&'static CjkFont> {
    first_installed(CJK_FONTS, Path::is_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_existing_candidate_wins() {
        let found = first_installed(CJK_FONTS, |p| {
            p.to_string_lossy().contains("wqy") || p.to_string_lossy().contains("PingFang")
        });
        assert_eq!(found.map(|f| f.family), Some("WenQuanYi Micro Hei"));
    }

    #[test]
    fn no_candidate_installed() {
        assert_eq!(first_installed(CJK_FONTS, |_| false), None);
    }
}
