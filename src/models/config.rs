//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::format::{Item as FormatItem, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CategoryConfig, IdentityPolicy, ParserHint, SourceConfig};

/// Environment variable overriding the feed gateway base URL.
pub const ENV_GATEWAY_BASE: &str = "RSSHUB_BASE";
/// Environment variable overriding the per-category item cap.
pub const ENV_MAX_ITEMS: &str = "GAZETTE_MAX_ITEMS";
/// Environment variable overriding the retention window in days.
pub const ENV_MAX_AGE_DAYS: &str = "GAZETTE_MAX_AGE_DAYS";
/// Environment variable overriding the per-request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "GAZETTE_TIMEOUT_SECS";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Feed gateway location
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Age and size limits per category
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Text normalization limits
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Snapshot header fields
    #[serde(default)]
    pub meta: MetaConfig,

    /// Keyword lists for topic filtering
    #[serde(default)]
    pub relevance: RelevanceConfig,

    /// Categories and their sources, in display order
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(e) => {
                log::warn!(
                    "Config load failed from {:?}: {}. Using defaults.",
                    path.as_ref(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base) = lookup(ENV_GATEWAY_BASE) {
            self.gateway.base_url = base;
        }
        if let Some(value) = lookup(ENV_MAX_ITEMS) {
            self.retention.max_items_per_category = parse_env(ENV_MAX_ITEMS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_AGE_DAYS) {
            self.retention.max_age_days = parse_env(ENV_MAX_AGE_DAYS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.fetch.timeout_secs = parse_env(ENV_TIMEOUT_SECS, &value)?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::validation("fetch.max_concurrent must be > 0"));
        }
        if self.retention.max_items_per_category == 0 {
            return Err(AppError::validation(
                "retention.max_items_per_category must be > 0",
            ));
        }
        if self.retention.max_age_days < 0 {
            return Err(AppError::validation("retention.max_age_days must be >= 0"));
        }
        if self.normalize.summary_chars == 0 || self.normalize.oversize_factor == 0 {
            return Err(AppError::validation(
                "normalize.summary_chars and normalize.oversize_factor must be > 0",
            ));
        }
        if !self.meta.edition_format_is_valid() {
            return Err(AppError::validation(format!(
                "meta.edition_format '{}' is not a valid date format",
                self.meta.edition_format
            )));
        }
        if self.categories.is_empty() {
            return Err(AppError::validation("No categories defined"));
        }

        let mut keys = HashSet::new();
        for category in &self.categories {
            if category.key.trim().is_empty() {
                return Err(AppError::validation("Category with empty key"));
            }
            if !keys.insert(category.key.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate category key '{}'",
                    category.key
                )));
            }
            for source in &category.sources {
                if source.url.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "Source '{}' in category '{}' has no url",
                        source.name, category.key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Total number of configured sources.
    pub fn source_count(&self) -> usize {
        self.categories.iter().map(|c| c.sources.len()).sum()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            fetch: FetchConfig::default(),
            retention: RetentionConfig::default(),
            normalize: NormalizeConfig::default(),
            meta: MetaConfig::default(),
            relevance: RelevanceConfig::default(),
            categories: defaults::categories(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{key} has invalid value '{value}'")))
}

/// Feed gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL substituted for `{gateway}` in source URLs
    #[serde(default = "defaults::gateway_base")]
    pub base_url: String,
}

impl GatewayConfig {
    /// Expand a source URL template against this gateway.
    pub fn expand(&self, template: &str) -> String {
        template.replace("{gateway}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::gateway_base(),
        }
    }
}

/// HTTP client and fetch behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent source fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Retention window and per-category cap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetentionConfig {
    #[serde(default = "defaults::max_items")]
    pub max_items_per_category: usize,

    #[serde(default = "defaults::max_age_days")]
    pub max_age_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_items_per_category: defaults::max_items(),
            max_age_days: defaults::max_age_days(),
        }
    }
}

/// Summary shaping limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Characters kept in a summary
    #[serde(default = "defaults::summary_chars")]
    pub summary_chars: usize,

    /// Summaries longer than `summary_chars * oversize_factor` are rejected
    #[serde(default = "defaults::oversize_factor")]
    pub oversize_factor: usize,
}

impl NormalizeConfig {
    /// Upper bound on stripped summary length before the entry is rejected.
    pub fn ceiling(&self) -> usize {
        self.summary_chars.saturating_mul(self.oversize_factor)
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            summary_chars: defaults::summary_chars(),
            oversize_factor: defaults::oversize_factor(),
        }
    }
}

/// Header fields written into `meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    #[serde(default = "defaults::meta_title")]
    pub title: String,

    #[serde(default = "defaults::meta_title_jp")]
    pub title_jp: String,

    #[serde(default = "defaults::meta_subtitle")]
    pub subtitle: String,

    /// `chrono` format string for the edition identifier
    #[serde(default = "defaults::edition_format")]
    pub edition_format: String,

    #[serde(default = "defaults::generated_by")]
    pub generated_by: String,

    #[serde(default = "defaults::meta_version")]
    pub version: String,
}

impl MetaConfig {
    /// Whether `edition_format` contains only recognized `chrono` specifiers.
    pub fn edition_format_is_valid(&self) -> bool {
        !StrftimeItems::new(&self.edition_format).any(|item| matches!(item, FormatItem::Error))
    }
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            title: defaults::meta_title(),
            title_jp: defaults::meta_title_jp(),
            subtitle: defaults::meta_subtitle(),
            edition_format: defaults::edition_format(),
            generated_by: defaults::generated_by(),
            version: defaults::meta_version(),
        }
    }
}

/// Keyword lists for the topic filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Unambiguous franchise terms
    #[serde(default = "defaults::core_keywords")]
    pub core: Vec<String>,

    #[serde(default = "defaults::character_keywords")]
    pub characters: Vec<String>,

    #[serde(default = "defaults::work_keywords")]
    pub works: Vec<String>,

    #[serde(default = "defaults::music_keywords")]
    pub music: Vec<String>,

    /// Homonyms that veto a match unless an override term is present
    #[serde(default = "defaults::blacklist_keywords")]
    pub blacklist: Vec<String>,

    /// Terms that cancel a blacklist veto
    #[serde(default = "defaults::blacklist_overrides")]
    pub blacklist_overrides: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            core: defaults::core_keywords(),
            characters: defaults::character_keywords(),
            works: defaults::work_keywords(),
            music: defaults::music_keywords(),
            blacklist: defaults::blacklist_keywords(),
            blacklist_overrides: defaults::blacklist_overrides(),
        }
    }
}

mod defaults {
    use super::{CategoryConfig, IdentityPolicy, ParserHint, SourceConfig};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // Gateway and fetch defaults
    pub fn gateway_base() -> String {
        "https://rsshub.app".into()
    }
    pub fn user_agent() -> String {
        "Gazette/1.0 (RSS Reader; +https://github.com/gensokyo-daily)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Retention defaults
    pub fn max_items() -> usize {
        50
    }
    pub fn max_age_days() -> i64 {
        30
    }

    // Normalization defaults
    pub fn summary_chars() -> usize {
        300
    }
    pub fn oversize_factor() -> usize {
        10
    }

    // Meta defaults
    pub fn meta_title() -> String {
        "幻想乡日报".into()
    }
    pub fn meta_title_jp() -> String {
        "幻想郷日報".into()
    }
    pub fn meta_subtitle() -> String {
        "Gensokyo Daily".into()
    }
    pub fn edition_format() -> String {
        "第%Y%m%d期".into()
    }
    pub fn generated_by() -> String {
        "射命丸文 & gazette".into()
    }
    pub fn meta_version() -> String {
        "1.0.0".into()
    }

    // Relevance defaults
    pub fn core_keywords() -> Vec<String> {
        strings(&[
            "东方project", "東方project", "touhou project", "touhou", "トウホウ", "とうほう",
            "幻想乡", "幻想郷", "gensokyo", "博丽神社", "博麗神社", "hakurei", "ZUN",
            "上海爱丽丝", "上海アリス幻樂団", "例大祭", "reitaisai", "thwiki", "THBWiki",
            "东方吧",
        ])
    }
    pub fn character_keywords() -> Vec<String> {
        strings(&[
            "灵梦", "霊夢", "reimu", "魔理沙", "marisa", "咲夜", "sakuya", "琪露诺", "チルノ",
            "cirno", "妖梦", "妖夢", "youmu", "幽幽子", "yuyuko", "蕾米莉亚", "remilia",
            "芙兰朵露", "flandre", "帕秋莉", "patchouli", "射命丸文", "aya shameimaru",
            "河城荷取", "nitori", "八云紫", "八雲紫", "yukari", "藤原妹红", "mokou",
            "鬼人正邪", "seija", "古明地觉", "古明地恋", "satori", "koishi", "风见幽香",
            "yuuka", "四季映姬", "eiki", "小野塚小町", "komachi", "因幡帝", "tewi", "铃仙",
            "鈴仙", "reisen", "永琳", "eirin", "辉夜", "輝夜", "kaguya", "红美铃", "meiling",
            "爱丽丝", "alice margatroid", "西行寺", "saigyouji", "博丽", "博麗",
        ])
    }
    pub fn work_keywords() -> Vec<String> {
        strings(&[
            "红魔乡", "紅魔郷", "红魔馆", "紅魔館", "妖妖梦", "妖々夢", "永夜抄", "花映塚",
            "风神录", "風神録", "地灵殿", "地霊殿", "星莲船", "星蓮船", "神灵庙", "神霊廟",
            "辉针城", "輝針城", "绀珠传", "紺珠伝", "天空璋", "鬼形兽", "鬼形獣", "虹龙洞",
            "虹龍洞", "兽王园", "獣王園", "献华抄", "刚欲异闻",
        ])
    }
    pub fn music_keywords() -> Vec<String> {
        strings(&[
            "东方arrange", "东方编曲", "东方同人音乐", "U.N.オーエンは彼女なのか",
            "ネクロファンタジア", "bad apple", "色は匂へど散りぬるを", "东方vocal",
            "东方remix", "秘封俱乐部", "秘封倶楽部",
        ])
    }
    pub fn blacklist_keywords() -> Vec<String> {
        strings(&[
            "东方卫视", "东方财富", "东方航空", "东方明珠", "东方雨虹", "东方电气",
            "东方证券", "东方通信", "东方园林", "东方日升", "东方盛虹", "东方铁塔",
            "东方美食", "东方甄选", "东方不败", "orient", "oriental securities",
        ])
    }
    pub fn blacklist_overrides() -> Vec<String> {
        strings(&["project", "zun"])
    }

    fn source(
        name: &str,
        url: &str,
        icon: &str,
        priority: u8,
        parser: ParserHint,
        identity: IdentityPolicy,
        needs_filter: bool,
    ) -> SourceConfig {
        SourceConfig {
            key: None,
            name: name.to_string(),
            url: url.to_string(),
            icon: icon.to_string(),
            priority,
            parser,
            identity,
            needs_filter,
        }
    }

    // Category defaults
    pub fn categories() -> Vec<CategoryConfig> {
        use IdentityPolicy::{Link, Title};
        use ParserHint::{Booru, Syndication, WikiChanges};

        vec![
            CategoryConfig {
                key: "official".to_string(),
                label: "头版头条".to_string(),
                sources: vec![source(
                    "东方官方资讯站",
                    "https://touhou-project.news/feed.rss",
                    "📰",
                    1,
                    Syndication,
                    Link,
                    false,
                )],
            },
            CategoryConfig {
                key: "community".to_string(),
                label: "社会·民生".to_string(),
                sources: vec![
                    source(
                        "B站 MMD榜",
                        "{gateway}/bilibili/ranking/25/3/1",
                        "💃",
                        1,
                        Syndication,
                        Link,
                        true,
                    ),
                    source(
                        "B站 MAD榜",
                        "{gateway}/bilibili/ranking/24/3/1",
                        "🎬",
                        1,
                        Syndication,
                        Link,
                        true,
                    ),
                    source(
                        "B站 游戏榜",
                        "{gateway}/bilibili/ranking/17/3/1",
                        "🎮",
                        2,
                        Syndication,
                        Link,
                        true,
                    ),
                    source(
                        "Reddit r/touhou",
                        "https://www.reddit.com/r/touhou/new/.rss",
                        "💬",
                        2,
                        Syndication,
                        Link,
                        false,
                    ),
                    source(
                        "THWiki 最近更改",
                        "https://thwiki.cc/index.php?title=Special:%E6%9C%80%E8%BF%91%E6%9B%B4%E6%94%B9&feed=atom",
                        "📚",
                        3,
                        WikiChanges,
                        Title,
                        false,
                    ),
                ],
            },
            CategoryConfig {
                key: "art".to_string(),
                label: "艺术·副刊".to_string(),
                sources: vec![source(
                    "Safebooru (Touhou)",
                    "https://safebooru.org/index.php?page=rss&s=post&q=touhou",
                    "🎨",
                    1,
                    Booru,
                    Link,
                    false,
                )],
            },
        ]
    }
}
