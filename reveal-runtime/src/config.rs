//! # Config 模块
//!
//! 引擎配置：所有类别相关的阈值、延迟、错开间隔、时长都是数据，
//! 不写死在分发逻辑里。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高，由宿主处理）
//! 2. 配置文件 (JSON)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::animation::EasingFunction;
use crate::surface::{CardKind, Category, ChildRole, ElementId, Motion, MotionName};
use crate::visibility::TriggerOptions;

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 计数动画
    #[serde(default)]
    pub counter: CounterSettings,

    /// 可见性阈值（按类别）
    #[serde(default)]
    pub visibility: VisibilitySettings,

    /// 卡片揭示
    #[serde(default)]
    pub cards: CardProfiles,

    /// 图表揭示
    #[serde(default)]
    pub charts: ChartSettings,

    /// 特性条目
    #[serde(default)]
    pub feature: FeatureSettings,

    /// 提示消息
    #[serde(default)]
    pub notification: NotificationSettings,

    /// 加载进度模拟
    #[serde(default)]
    pub loading: LoadingSettings,

    /// 首屏入场序列
    #[serde(default = "default_hero_steps")]
    pub hero: Vec<HeroStep>,

    /// 联系表单
    #[serde(default)]
    pub contact: ContactSettings,

    /// 启动时即进入减少动画模式（宿主的 prefers-reduced-motion）
    #[serde(default)]
    pub reduced_motion: bool,
}

/// 计数动画设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CounterSettings {
    /// 固定步数
    #[serde(default = "default_counter_steps")]
    pub steps: u32,

    /// 总时长（毫秒）
    #[serde(default = "default_counter_duration_ms")]
    pub duration_ms: u64,
}

impl CounterSettings {
    /// 每步间隔（至少 1 毫秒）
    pub fn step_duration_ms(&self) -> u64 {
        (self.duration_ms / u64::from(self.steps.max(1))).max(1)
    }

    /// 最后一步的间隔，吸收整除余数，使总时长等于 `duration_ms`
    pub fn final_step_duration_ms(&self) -> u64 {
        let steps = u64::from(self.steps.max(1));
        let step = self.step_duration_ms();
        step + self.duration_ms.saturating_sub(step * steps)
    }
}

/// 单个类别的触发设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerSettings {
    /// 可见比例阈值 (0.0 - 1.0)
    pub threshold: f64,
    /// 是否只触发一次
    #[serde(default = "default_true")]
    pub one_shot: bool,
}

impl TriggerSettings {
    fn new(threshold: f64, one_shot: bool) -> Self {
        Self {
            threshold,
            one_shot,
        }
    }
}

/// 可见性设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisibilitySettings {
    #[serde(default = "default_low_trigger")]
    pub stat: TriggerSettings,
    #[serde(default = "default_chart_trigger")]
    pub chart: TriggerSettings,
    #[serde(default = "default_low_trigger")]
    pub card: TriggerSettings,
    #[serde(default = "default_low_trigger")]
    pub feature: TriggerSettings,
    #[serde(default = "default_heading_trigger")]
    pub heading: TriggerSettings,
}

impl VisibilitySettings {
    /// 类别对应的触发选项
    pub fn options_for(&self, category: Category) -> TriggerOptions {
        let settings = match category {
            Category::Stat => self.stat,
            Category::Chart(_) => self.chart,
            Category::Card(_) => self.card,
            Category::Feature => self.feature,
            Category::Heading => self.heading,
        };
        TriggerOptions::new(settings.threshold, settings.one_shot)
    }

    fn all(&self) -> [(&'static str, TriggerSettings); 5] {
        [
            ("stat", self.stat),
            ("chart", self.chart),
            ("card", self.card),
            ("feature", self.feature),
            ("heading", self.heading),
        ]
    }
}

/// 子元素动作
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildAction {
    /// 应用声明式揭示动画
    Reveal { motion: Motion },
    /// 对子元素文本启动计数
    Count,
}

/// 错开揭示配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaggerProfile {
    /// 第一个子元素的延迟（毫秒）
    pub base_delay_ms: u64,
    /// 相邻子元素的间隔（毫秒）
    pub stagger_ms: u64,
    /// 参与揭示的子元素角色
    pub child_role: ChildRole,
    /// 对每个子元素执行的动作
    pub action: ChildAction,
}

impl StaggerProfile {
    /// 第 `index` 个子元素的启动偏移
    pub fn offset(&self, index: usize) -> u64 {
        self.base_delay_ms
            .saturating_add(self.stagger_ms.saturating_mul(index as u64))
    }
}

/// 卡片揭示配置表
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CardProfiles {
    /// 卡片本身的揭示动画
    #[serde(default = "default_card_reveal")]
    pub reveal: Motion,
    #[serde(default = "default_service_profile")]
    pub service: StaggerProfile,
    #[serde(default = "default_property_profile")]
    pub property: StaggerProfile,
    #[serde(default = "default_insight_profile")]
    pub insight: StaggerProfile,
}

impl CardProfiles {
    pub fn profile(&self, kind: CardKind) -> &StaggerProfile {
        match kind {
            CardKind::Service => &self.service,
            CardKind::Property => &self.property,
            CardKind::Insight => &self.insight,
        }
    }
}

/// 图表设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChartSettings {
    /// 描线时长（毫秒）
    #[serde(default = "default_draw_duration_ms")]
    pub draw_duration_ms: u64,
    #[serde(default)]
    pub draw_easing: EasingFunction,
    /// 折线图数据点
    #[serde(default = "default_dot_profile")]
    pub dots: StaggerProfile,
    /// 柱状图
    #[serde(default = "default_bar_profile")]
    pub bars: StaggerProfile,
}

/// 特性条目设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureSettings {
    #[serde(default = "default_feature_reveal")]
    pub reveal: Motion,
    /// 图标变换延迟（毫秒）
    #[serde(default = "default_icon_delay_ms")]
    pub icon_delay_ms: u64,
    #[serde(default = "default_icon_motion")]
    pub icon_motion: Motion,
}

/// 提示消息设置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// 显示时长（毫秒）
    #[serde(default = "default_notification_duration_ms")]
    pub duration_ms: u64,
    /// 结束前的淡出时长（毫秒）
    #[serde(default = "default_notification_fade_ms")]
    pub fade_ms: u64,
}

/// 加载进度模拟设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingSettings {
    /// 进度更新间隔（毫秒）
    #[serde(default = "default_loading_tick_ms")]
    pub tick_ms: u64,
    /// 每次最大增量（百分比）
    #[serde(default = "default_loading_max_increment")]
    pub max_increment: f64,
    /// 到达 100% 后隐藏加载屏的延迟（毫秒）
    #[serde(default = "default_loading_hide_delay_ms")]
    pub hide_delay_ms: u64,
    /// 随机种子（不配置时使用系统熵）
    #[serde(default)]
    pub seed: Option<u64>,
    /// 进度条元素
    #[serde(default = "default_loading_bar")]
    pub bar: ElementId,
    /// 加载屏元素
    #[serde(default = "default_loading_screen")]
    pub screen: ElementId,
}

/// 首屏入场序列的一步
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroStep {
    pub element: ElementId,
    pub delay_ms: u64,
    pub motion: Motion,
}

/// 联系表单设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSettings {
    /// 表单后端访问密钥
    #[serde(default)]
    pub access_key: String,
    /// 邮件主题
    #[serde(default = "default_contact_subject")]
    pub subject: String,
    /// 发件人显示名
    #[serde(default = "default_contact_from_name")]
    pub from_name: String,
}

// 默认值函数
fn default_true() -> bool {
    true
}

fn default_counter_steps() -> u32 {
    60
}

fn default_counter_duration_ms() -> u64 {
    2000
}

fn default_low_trigger() -> TriggerSettings {
    TriggerSettings::new(0.1, true)
}

fn default_chart_trigger() -> TriggerSettings {
    TriggerSettings::new(0.5, true)
}

fn default_heading_trigger() -> TriggerSettings {
    TriggerSettings::new(0.1, false)
}

fn default_card_reveal() -> Motion {
    Motion::new(MotionName::SlideInUp, 800, EasingFunction::EaseOut)
}

fn default_service_profile() -> StaggerProfile {
    StaggerProfile {
        base_delay_ms: 300,
        stagger_ms: 100,
        child_role: ChildRole::Feature,
        action: ChildAction::Reveal {
            motion: Motion::new(MotionName::FadeInLeft, 500, EasingFunction::EaseOut),
        },
    }
}

fn default_property_profile() -> StaggerProfile {
    StaggerProfile {
        base_delay_ms: 400,
        stagger_ms: 100,
        child_role: ChildRole::Feature,
        action: ChildAction::Reveal {
            motion: Motion::new(MotionName::FadeInScale, 500, EasingFunction::EaseOut),
        },
    }
}

fn default_insight_profile() -> StaggerProfile {
    StaggerProfile {
        base_delay_ms: 500,
        stagger_ms: 200,
        child_role: ChildRole::Stat,
        action: ChildAction::Count,
    }
}

fn default_draw_duration_ms() -> u64 {
    2000
}

fn default_dot_profile() -> StaggerProfile {
    StaggerProfile {
        base_delay_ms: 500,
        stagger_ms: 300,
        child_role: ChildRole::Dot,
        action: ChildAction::Reveal {
            motion: Motion::new(MotionName::FadeInDot, 500, EasingFunction::EaseInOut),
        },
    }
}

fn default_bar_profile() -> StaggerProfile {
    StaggerProfile {
        base_delay_ms: 0,
        stagger_ms: 200,
        child_role: ChildRole::Bar,
        action: ChildAction::Reveal {
            motion: Motion::new(MotionName::GrowBar, 1000, EasingFunction::EaseInOut),
        },
    }
}

fn default_feature_reveal() -> Motion {
    Motion::new(MotionName::FadeInUp, 600, EasingFunction::EaseOut)
}

fn default_icon_delay_ms() -> u64 {
    200
}

fn default_icon_motion() -> Motion {
    Motion::new(MotionName::IconPop, 400, EasingFunction::EaseOut)
}

fn default_notification_duration_ms() -> u64 {
    4000
}

fn default_notification_fade_ms() -> u64 {
    300
}

fn default_loading_tick_ms() -> u64 {
    150
}

fn default_loading_max_increment() -> f64 {
    15.0
}

fn default_loading_hide_delay_ms() -> u64 {
    500
}

fn default_loading_bar() -> ElementId {
    ElementId::new("loading-progress")
}

fn default_loading_screen() -> ElementId {
    ElementId::new("loading-screen")
}

fn default_hero_steps() -> Vec<HeroStep> {
    vec![
        HeroStep {
            element: ElementId::new("hero-title"),
            delay_ms: 0,
            motion: Motion::new(MotionName::FadeInUp, 1000, EasingFunction::EaseOut),
        },
        HeroStep {
            element: ElementId::new("hero-subtitle"),
            delay_ms: 300,
            motion: Motion::new(MotionName::FadeInUp, 800, EasingFunction::EaseOut),
        },
        HeroStep {
            element: ElementId::new("hero-buttons"),
            delay_ms: 600,
            motion: Motion::new(MotionName::FadeInUp, 800, EasingFunction::EaseOut),
        },
    ]
}

fn default_contact_subject() -> String {
    "New enquiry from the website".to_string()
}

fn default_contact_from_name() -> String {
    "Instate Website".to_string()
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            steps: default_counter_steps(),
            duration_ms: default_counter_duration_ms(),
        }
    }
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            stat: default_low_trigger(),
            chart: default_chart_trigger(),
            card: default_low_trigger(),
            feature: default_low_trigger(),
            heading: default_heading_trigger(),
        }
    }
}

impl Default for CardProfiles {
    fn default() -> Self {
        Self {
            reveal: default_card_reveal(),
            service: default_service_profile(),
            property: default_property_profile(),
            insight: default_insight_profile(),
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            draw_duration_ms: default_draw_duration_ms(),
            draw_easing: EasingFunction::EaseInOut,
            dots: default_dot_profile(),
            bars: default_bar_profile(),
        }
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            reveal: default_feature_reveal(),
            icon_delay_ms: default_icon_delay_ms(),
            icon_motion: default_icon_motion(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            duration_ms: default_notification_duration_ms(),
            fade_ms: default_notification_fade_ms(),
        }
    }
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_loading_tick_ms(),
            max_increment: default_loading_max_increment(),
            hide_delay_ms: default_loading_hide_delay_ms(),
            seed: None,
            bar: default_loading_bar(),
            screen: default_loading_screen(),
        }
    }
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            subject: default_contact_subject(),
            from_name: default_contact_from_name(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            counter: CounterSettings::default(),
            visibility: VisibilitySettings::default(),
            cards: CardProfiles::default(),
            charts: ChartSettings::default(),
            feature: FeatureSettings::default(),
            notification: NotificationSettings::default(),
            loading: LoadingSettings::default(),
            hero: default_hero_steps(),
            contact: ContactSettings::default(),
            reduced_motion: false,
        }
    }
}

impl EngineConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.counter.steps == 0 {
            return Err(ConfigError::ValidationFailed(
                "counter.steps 必须大于 0".to_string(),
            ));
        }

        for (name, trigger) in self.visibility.all() {
            if !(0.0..=1.0).contains(&trigger.threshold) {
                return Err(ConfigError::ValidationFailed(format!(
                    "visibility.{} 的阈值必须在 0.0 - 1.0 之间",
                    name
                )));
            }
        }

        if self.notification.duration_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "notification.duration_ms 必须大于 0".to_string(),
            ));
        }

        if self.loading.tick_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "loading.tick_ms 必须大于 0".to_string(),
            ));
        }

        if !(self.loading.max_increment.is_finite() && self.loading.max_increment > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "loading.max_increment 必须是正数".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.counter.steps, 60);
        assert_eq!(config.counter.duration_ms, 2000);
        assert_eq!(config.counter.step_duration_ms(), 33);
        assert_eq!(config.counter.final_step_duration_ms(), 53);
        assert_eq!(config.cards.service.base_delay_ms, 300);
        assert_eq!(config.cards.service.stagger_ms, 100);
        assert_eq!(config.hero.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_counter_steps_span_full_duration() {
        for (steps, duration_ms) in [(60, 2000), (7, 1000), (4, 2000), (1, 500), (10, 5)] {
            let counter = CounterSettings { steps, duration_ms };
            let total = counter.step_duration_ms() * u64::from(steps - 1)
                + counter.final_step_duration_ms();
            assert_eq!(total, duration_ms.max(u64::from(steps)), "steps = {steps}");
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "counter": { "steps": 4 }, "visibility": { "chart": { "threshold": 0.3 } } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.counter.steps, 4);
        assert_eq!(config.counter.duration_ms, 2000);
        assert_eq!(config.visibility.chart.threshold, 0.3);
        assert!(config.visibility.chart.one_shot);
        assert_eq!(config.visibility.stat.threshold, 0.1);
        assert!(!config.visibility.heading.one_shot);
    }

    #[test]
    fn test_stagger_offsets() {
        let profile = default_service_profile();
        let offsets: Vec<u64> = (0..5).map(|i| profile.offset(i)).collect();
        assert_eq!(offsets, vec![300, 400, 500, 600, 700]);
    }

    #[test]
    fn test_options_for_category() {
        let settings = VisibilitySettings::default();
        let chart = settings.options_for(Category::Chart(crate::surface::ChartKind::Line));
        assert_eq!(chart.threshold, 0.5);
        assert!(chart.one_shot);
        assert!(!settings.options_for(Category::Heading).one_shot);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.visibility.card.threshold = 1.5;
        assert!(config.validate().is_err());
        config.visibility.card.threshold = 0.2;
        assert!(config.validate().is_ok());

        config.counter.steps = 0;
        assert!(config.validate().is_err());
        config.counter.steps = 30;

        config.loading.max_increment = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.counter.steps = 12;
        config.loading.seed = Some(7);
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path);
        assert_eq!(loaded.counter.steps, 12);
        assert_eq!(loaded.loading.seed, Some(7));
        assert_eq!(loaded.cards.insight.action, ChildAction::Count);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = EngineConfig::load("definitely/not/here.json");
        assert_eq!(config.counter.steps, 60);
    }
}
