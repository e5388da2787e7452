//! # Visibility 模块
//!
//! 可见比例阈值检测。
//!
//! 宿主上报元素的可见比例，本模块判断是否发生"向上穿越阈值"。
//! 一次性目标触发后立即取消观察；可重复目标在比例回落到阈值以下后重新待命。

use std::collections::HashMap;

use tracing::trace;

use crate::surface::ElementId;

/// 触发选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerOptions {
    /// 可见比例阈值 (0.0 - 1.0)
    pub threshold: f64,
    /// 是否只触发一次
    pub one_shot: bool,
}

impl TriggerOptions {
    pub fn new(threshold: f64, one_shot: bool) -> Self {
        Self {
            threshold,
            one_shot,
        }
    }
}

#[derive(Debug, Clone)]
struct Watch {
    options: TriggerOptions,
    /// 上一次上报时是否处于阈值之上
    above: bool,
}

/// 可见性触发器
#[derive(Debug, Default)]
pub struct VisibilityTrigger {
    watches: HashMap<ElementId, Watch>,
}

impl VisibilityTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始观察（重复观察会重置状态）
    pub fn observe(&mut self, element: ElementId, options: TriggerOptions) {
        self.watches.insert(
            element,
            Watch {
                options,
                above: false,
            },
        );
    }

    /// 取消观察
    pub fn unobserve(&mut self, element: &ElementId) -> bool {
        self.watches.remove(element).is_some()
    }

    pub fn is_watching(&self, element: &ElementId) -> bool {
        self.watches.contains_key(element)
    }

    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// 上报可见比例
    ///
    /// 返回 `true` 表示本次上报触发了目标。
    pub fn report(&mut self, element: &ElementId, fraction: f64) -> bool {
        let Some(watch) = self.watches.get_mut(element) else {
            return false;
        };

        let fraction = if fraction.is_nan() { 0.0 } else { fraction };
        let above = fraction > 0.0 && fraction >= watch.options.threshold;
        let fired = above && !watch.above;
        watch.above = above;

        if fired {
            trace!(element = %element, fraction, "可见比例越过阈值");
            if watch.options.one_shot {
                self.watches.remove(element);
            }
        }

        fired
    }

    pub fn clear(&mut self) {
        self.watches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut trigger = VisibilityTrigger::new();
        let id = ElementId::new("stat");
        trigger.observe(id.clone(), TriggerOptions::new(0.1, true));

        assert!(!trigger.report(&id, 0.05));
        assert!(trigger.report(&id, 0.2));
        assert!(!trigger.is_watching(&id));

        assert!(!trigger.report(&id, 0.0));
        assert!(!trigger.report(&id, 0.9));
    }

    #[test]
    fn test_repeatable_rearms_below_threshold() {
        let mut trigger = VisibilityTrigger::new();
        let id = ElementId::new("heading");
        trigger.observe(id.clone(), TriggerOptions::new(0.1, false));

        assert!(trigger.report(&id, 0.5));
        // 保持在阈值之上不会重复触发
        assert!(!trigger.report(&id, 0.8));
        assert!(!trigger.report(&id, 0.0));
        assert!(trigger.report(&id, 0.3));
    }

    #[test]
    fn test_zero_threshold_requires_visibility() {
        let mut trigger = VisibilityTrigger::new();
        let id = ElementId::new("card");
        trigger.observe(id.clone(), TriggerOptions::new(0.0, true));

        assert!(!trigger.report(&id, 0.0));
        assert!(trigger.report(&id, 0.01));
    }

    #[test]
    fn test_nan_counts_as_hidden() {
        let mut trigger = VisibilityTrigger::new();
        let id = ElementId::new("chart");
        trigger.observe(id.clone(), TriggerOptions::new(0.5, false));

        assert!(!trigger.report(&id, f64::NAN));
        assert!(trigger.report(&id, 0.5));
        assert!(!trigger.report(&id, f64::NAN));
        assert!(trigger.report(&id, 1.0));
    }

    #[test]
    fn test_unknown_element_ignored() {
        let mut trigger = VisibilityTrigger::new();
        assert!(!trigger.report(&ElementId::new("nope"), 1.0));
        assert!(!trigger.unobserve(&ElementId::new("nope")));
        assert_eq!(trigger.watch_count(), 0);
    }
}
