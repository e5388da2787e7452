//! # Surface 模块
//!
//! 引擎与宿主之间的接口。
//!
//! 引擎不持有页面树，只通过 [`Surface`] 读取元素信息、写回展示状态：
//! 文本、状态标记、声明式动画、样式数值。浏览器、原生 UI、测试用的
//! 内存页面（[`crate::page::Page`]）都可以实现这个 trait。

use serde::{Deserialize, Serialize};

use crate::animation::EasingFunction;
use crate::error::SurfaceError;

/// 元素标识符
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 卡片种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// 服务卡片：列表特性依次左滑淡入
    Service,
    /// 房产卡片：特性依次缩放淡入
    Property,
    /// 洞察卡片：统计数字依次计数
    Insight,
}

/// 图表种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// 折线图：描线 + 数据点依次出现
    Line,
    /// 柱状图：柱子依次生长
    Bars,
    /// 环形进度：描环 + 标签计数
    Ring,
}

/// 元素类别（结构角色）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 统计数字
    Stat,
    /// 图表
    Chart(ChartKind),
    /// 卡片
    Card(CardKind),
    /// 特性条目
    Feature,
    /// 区块标题（可重复触发）
    Heading,
}

impl Category {
    /// 配置表中使用的类别名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stat => "stat",
            Self::Chart(_) => "chart",
            Self::Card(_) => "card",
            Self::Feature => "feature",
            Self::Heading => "heading",
        }
    }
}

/// 子元素角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildRole {
    /// 列表特性
    Feature,
    /// 统计数值
    Stat,
    /// 图标
    Icon,
    /// 图表折线路径
    Line,
    /// 图表数据点
    Dot,
    /// 柱子
    Bar,
    /// 环形路径
    Ring,
    /// 数值标签
    Label,
}

/// 状态标记（等价于 CSS class）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    /// 已进入视口
    AnimateIn,
    /// 图标已变换
    IconTransformed,
    /// 已隐藏（加载屏）
    Hidden,
}

/// 声明式动画名（与样式表中的 keyframes 同名）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MotionName {
    FadeInUp,
    SlideInUp,
    FadeInLeft,
    FadeInScale,
    FadeInDot,
    GrowBar,
    IconPop,
}

/// 声明式动画选择
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub name: MotionName,
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: EasingFunction,
}

impl Motion {
    pub fn new(name: MotionName, duration_ms: u64, easing: EasingFunction) -> Self {
        Self {
            name,
            duration_ms,
            easing,
        }
    }

    /// 时长归零的版本（减少动画模式）
    pub fn instant(self) -> Self {
        Self {
            duration_ms: 0,
            ..self
        }
    }
}

/// 可写的数值样式属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProperty {
    /// `stroke-dasharray`
    DashArray,
    /// `stroke-dashoffset`
    DashOffset,
    /// 宽度百分比（进度条）
    WidthPercent,
}

/// 宿主表面
///
/// 所有写操作只在持有表面的单线程循环中发生，因此方法直接取 `&mut self`。
pub trait Surface {
    /// 扫描页面，返回所有带类别标记的元素（文档顺序）
    fn scan(&self) -> Vec<(ElementId, Category)>;

    /// 元素是否存在
    fn contains(&self, id: &ElementId) -> bool;

    /// 读取文本
    fn text(&self, id: &ElementId) -> Result<String, SurfaceError>;

    /// 写入文本
    fn set_text(&mut self, id: &ElementId, text: &str) -> Result<(), SurfaceError>;

    /// 添加状态标记
    ///
    /// 重复添加是无操作，返回 `false`。
    fn add_marker(&mut self, id: &ElementId, marker: Marker) -> Result<bool, SurfaceError>;

    /// 是否带有标记
    fn has_marker(&self, id: &ElementId, marker: Marker) -> bool;

    /// 应用声明式动画
    fn apply_motion(&mut self, id: &ElementId, motion: Motion) -> Result<(), SurfaceError>;

    /// 路径总长度
    fn path_length(&self, id: &ElementId) -> Result<f64, SurfaceError>;

    /// 写入数值样式
    fn set_property(
        &mut self,
        id: &ElementId,
        property: StyleProperty,
        value: f64,
    ) -> Result<(), SurfaceError>;

    /// 按角色查询后代元素（文档顺序）
    fn children(&self, id: &ElementId, role: ChildRole) -> Result<Vec<ElementId>, SurfaceError>;

    /// 全局减少动画开关
    fn set_reduced_motion(&mut self, _enabled: bool) {}
}
