//! # Format 模块
//!
//! 数值格式化器：把展示文本（如 `"£65M+"`）拆成数值与后缀模式，
//! 并按动画进度渲染插值文本。
//!
//! ## 后缀匹配优先级
//!
//! 先匹配先得，顺序固定：
//!
//! ```text
//! M  -> CurrencyMillions   "£65M+"
//! %  -> Percent            "15.2%"
//! +  -> Plus               "150+"（后缀无字母）
//! K  -> CurrencyPerArea    "£1.2K/sq ft"
//! YoY -> YearOverYear      "8.5 YoY"
//! 其他 -> Plain            "12 years"
//! ```
//!
//! 同时包含多个标记的文本（如 `"12% YoY"`）按上表取第一个匹配。

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// 后缀模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixPattern {
    /// 百万货币，渲染为 `{prefix}{v}M+`
    CurrencyMillions,
    /// 百分比，一位小数
    Percent,
    /// 整数加 `+`
    Plus,
    /// 每平方英尺千元，渲染为 `{prefix}{v}K/sq ft`
    CurrencyPerArea,
    /// 同比百分比，渲染为 `+{v}% YoY`
    YearOverYear,
    /// 整数拼接原始后缀
    Plain,
}

impl SuffixPattern {
    /// 匹配优先级（不含兜底的 Plain）
    pub const PRIORITY: [SuffixPattern; 5] = [
        SuffixPattern::CurrencyMillions,
        SuffixPattern::Percent,
        SuffixPattern::Plus,
        SuffixPattern::CurrencyPerArea,
        SuffixPattern::YearOverYear,
    ];

    fn matches(self, residual: &str) -> bool {
        match self {
            Self::CurrencyMillions => residual.contains('M'),
            Self::Percent => residual.contains('%'),
            Self::Plus => {
                residual.trim_end().ends_with('+')
                    && !residual.chars().any(|c| c.is_alphabetic())
            }
            Self::CurrencyPerArea => residual.contains('K'),
            Self::YearOverYear => residual.contains("YoY"),
            Self::Plain => true,
        }
    }

    /// 对去掉数字后的残余文本分类
    pub fn classify(residual: &str) -> Self {
        Self::PRIORITY
            .into_iter()
            .find(|pattern| pattern.matches(residual))
            .unwrap_or(Self::Plain)
    }

    /// 是否按整数（向下取整）渲染
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Plus | Self::Plain)
    }
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// 可动画的展示值
///
/// 从元素初始文本解析一次，动画期间不可变。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayValue {
    raw_text: String,
    numeric_value: f64,
    suffix_pattern: SuffixPattern,
    /// 第一个数字之前的文本（货币符号、正负号）
    prefix: String,
    /// 第一个数字之后的非数字文本，按原顺序拼接
    suffix: String,
    /// 原始数值的小数位数
    precision: usize,
}

impl DisplayValue {
    /// 解析展示文本
    ///
    /// 没有可解析的数值时返回 [`FormatError::NotAnimatable`]，
    /// 调用方应保持原文本不变。
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let not_animatable = || FormatError::NotAnimatable {
            raw: raw.to_string(),
        };

        let digits: String = raw.chars().filter(|c| is_numeric_char(*c)).collect();
        let residual: String = raw.chars().filter(|c| !is_numeric_char(*c)).collect();

        let numeric_value: f64 = digits.parse().map_err(|_| not_animatable())?;
        if !numeric_value.is_finite() {
            return Err(not_animatable());
        }

        let precision = digits
            .split_once('.')
            .map(|(_, fraction)| fraction.len())
            .unwrap_or(0);

        let prefix = raw
            .find(is_numeric_char)
            .map(|idx| raw[..idx].to_string())
            .unwrap_or_default();

        let suffix = residual[prefix.len()..].to_string();

        Ok(Self {
            raw_text: raw.to_string(),
            numeric_value,
            suffix_pattern: SuffixPattern::classify(&residual),
            prefix,
            suffix,
            precision,
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn numeric_value(&self) -> f64 {
        self.numeric_value
    }

    pub fn suffix_pattern(&self) -> SuffixPattern {
        self.suffix_pattern
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// 目标值是否为零（零值不做动画）
    pub fn is_zero(&self) -> bool {
        self.numeric_value == 0.0
    }

    /// 按给定数值渲染文本
    pub fn render(&self, value: f64) -> String {
        let v = if value.is_finite() { value.max(0.0) } else { 0.0 };

        match self.suffix_pattern {
            SuffixPattern::CurrencyMillions => {
                format!("{}{}M+", self.prefix, truncate_fixed(v, self.precision))
            }
            SuffixPattern::Percent => format!("{}{:.1}%", self.prefix, v),
            SuffixPattern::Plus => format!("{}{}+", self.prefix, v.floor() as u64),
            SuffixPattern::CurrencyPerArea => {
                format!("{}{}K/sq ft", self.prefix, truncate_fixed(v, self.precision))
            }
            SuffixPattern::YearOverYear => format!("+{:.1}% YoY", v),
            SuffixPattern::Plain => {
                format!("{}{}{}", self.prefix, v.floor() as u64, self.suffix)
            }
        }
    }

    /// 按动画进度渲染（进度 >= 1 时精确落在目标值）
    pub fn render_at(&self, progress: f64) -> String {
        if progress >= 1.0 {
            return self.final_text();
        }
        let progress = if progress.is_nan() { 0.0 } else { progress.max(0.0) };
        self.render(self.numeric_value * progress)
    }

    /// 目标值对应的最终文本
    pub fn final_text(&self) -> String {
        self.render(self.numeric_value)
    }
}

/// 截断到指定小数位（不进位，避免超过目标值）
fn truncate_fixed(value: f64, precision: usize) -> String {
    let scale = 10f64.powi(precision as i32);
    // 1e-9 吸收乘法误差，如 1.2 * 10 = 11.999999999999998
    let truncated = ((value * scale) + 1e-9).floor() / scale;
    format!("{:.*}", precision, truncated)
}
