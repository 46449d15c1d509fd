//! Per-request localization.
//!
//! A `RenderContext` is built for each request and handed to every view;
//! nothing here is global.

use services::SiteInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    ZhHans,
    ZhHant,
}

impl Locale {
    /// Value for the `lang` attribute.
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::ZhHans => "zh-Hans",
            Locale::ZhHant => "zh-Hant",
        }
    }

    /// Maps a BCP 47 tag onto a supported locale, if any.
    pub fn from_tag(tag: &str) -> Option<Locale> {
        let tag = tag.trim().to_ascii_lowercase();
        let mut parts = tag.split(['-', '_']);
        match parts.next()? {
            "en" => Some(Locale::En),
            "zh" => {
                let rest: Vec<&str> = parts.collect();
                let traditional = rest
                    .iter()
                    .any(|p| matches!(*p, "hant" | "tw" | "hk" | "mo"));
                Some(if traditional { Locale::ZhHant } else { Locale::ZhHans })
            }
            _ => None,
        }
    }
}

/// Picks the best supported locale from an `Accept-Language` header,
/// falling back to `fallback` (usually the site language).
pub fn negotiate(accept_language: Option<&str>, fallback: &str) -> Locale {
    let mut candidates: Vec<(f32, Locale)> = accept_language
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| {
            let mut fields = entry.split(';');
            let locale = Locale::from_tag(fields.next()?)?;
            let q = fields
                .find_map(|f| f.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then_some((q, locale))
        })
        .collect();

    // Stable sort keeps header order among equal weights.
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates
        .first()
        .map(|(_, l)| *l)
        .or_else(|| Locale::from_tag(fallback))
        .unwrap_or_default()
}

/// Everything a view needs besides its own data.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub locale: Locale,
    pub site: SiteInfo,
}

impl RenderContext {
    pub fn new(locale: Locale, site: SiteInfo) -> Self {
        Self { locale, site }
    }

    pub fn lang(&self) -> &'static str {
        self.locale.tag()
    }

    /// Translated UI string; unknown keys are returned as-is.
    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        translate(self.locale, key).unwrap_or(key)
    }
}

fn translate(locale: Locale, key: &str) -> Option<&'static str> {
    let (en, hans, hant) = match key {
        "home" => ("Home", "首页", "首頁"),
        "search" => ("Search", "搜索", "搜尋"),
        "search_placeholder" => ("Search posts…", "搜索文章…", "搜尋文章…"),
        "no_results" => ("Nothing found.", "没有找到结果。", "沒有找到結果。"),
        "no_posts" => ("No posts yet.", "还没有文章。", "還沒有文章。"),
        "older" => ("Older posts", "更早的文章", "更早的文章"),
        "replies" => ("Replies", "回复", "回覆"),
        "featured" => ("Featured", "精选", "精選"),
        "source" => ("Source", "来源", "來源"),
        "feed" => ("RSS feed", "RSS 订阅", "RSS 訂閱"),
        "not_found" => ("Not found", "未找到", "找不到"),
        "not_found_body" => (
            "The page you are looking for does not exist.",
            "你要找的页面不存在。",
            "你要找的頁面不存在。",
        ),
        "error" => ("Something went wrong", "出错了", "出錯了"),
        "error_body" => (
            "Please try again later.",
            "请稍后再试。",
            "請稍後再試。",
        ),
        _ => return None,
    };
    Some(match locale {
        Locale::En => en,
        Locale::ZhHans => hans,
        Locale::ZhHant => hant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteInfo {
        SiteInfo {
            name: "Jant".into(),
            description: String::new(),
            language: "en".into(),
            base_url: "http://localhost".into(),
        }
    }

    #[test]
    fn tags_map_to_locales() {
        assert_eq!(Locale::from_tag("en-US"), Some(Locale::En));
        assert_eq!(Locale::from_tag("zh-CN"), Some(Locale::ZhHans));
        assert_eq!(Locale::from_tag("zh-Hans"), Some(Locale::ZhHans));
        assert_eq!(Locale::from_tag("zh-TW"), Some(Locale::ZhHant));
        assert_eq!(Locale::from_tag("zh-Hant-HK"), Some(Locale::ZhHant));
        assert_eq!(Locale::from_tag("fr"), None);
    }

    #[test]
    fn header_weights_win_over_fallback() {
        assert_eq!(negotiate(Some("fr;q=1.0, zh-TW;q=0.8, en;q=0.5"), "en"), Locale::ZhHant);
        assert_eq!(negotiate(Some("en, zh-CN"), "zh-Hant"), Locale::En);
        assert_eq!(negotiate(Some("zh-CN;q=0"), "en"), Locale::En);
    }

    #[test]
    fn falls_back_to_site_language() {
        assert_eq!(negotiate(None, "zh-Hans"), Locale::ZhHans);
        assert_eq!(negotiate(Some("de"), "fr"), Locale::En);
    }

    #[test]
    fn context_translates_and_passes_unknown_keys_through() {
        let ctx = RenderContext::new(Locale::ZhHans, site());
        assert_eq!(ctx.t("search"), "搜索");
        assert_eq!(ctx.t("missing.key"), "missing.key");
        assert_eq!(ctx.lang(), "zh-Hans");
    }
}
