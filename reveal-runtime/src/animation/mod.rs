//! # Animation 模块
//!
//! 时间轴补间与缓动函数。
//!
//! 声明式的揭示动画（`slideInUp` 等）交给宿主的样式系统执行，
//! 需要逐帧写数值的动画（路径描边偏移）由 [`Tween`] 驱动。

mod easing;
mod tween;

pub use easing::EasingFunction;
pub use tween::{Tween, TweenState};
