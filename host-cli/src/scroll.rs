//! 滚动脚本：按时间上报元素可见比例，驱动控制器逐帧运行。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reveal_runtime::{AnimationController, ElementId, EngineEvent, Surface};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 一次可见比例变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollStep {
    /// 发生时刻（虚拟毫秒）
    pub at_ms: u64,
    pub element: ElementId,
    /// 可见比例 (0.0 - 1.0)
    pub fraction: f64,
}

/// 带时间戳的事件（输出格式）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: EngineEvent,
}

/// 读取滚动脚本，按时间排序（同一时刻保持文件顺序）
pub fn load_script(path: &Path) -> Result<Vec<ScrollStep>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取滚动脚本: {}", path.display()))?;
    let mut steps: Vec<ScrollStep> = serde_json::from_str(&content)
        .with_context(|| format!("滚动脚本格式错误: {}", path.display()))?;
    steps.sort_by_key(|step| step.at_ms);
    Ok(steps)
}

/// 逐帧运行到 `duration_ms`
///
/// 每帧开始前上报所有已到时刻的可见比例变化。
pub fn simulate<S: Surface + ?Sized>(
    controller: &mut AnimationController,
    surface: &mut S,
    steps: &[ScrollStep],
    frame_ms: u64,
    duration_ms: u64,
) -> Vec<TimedEvent> {
    let frame_ms = frame_ms.max(1);
    let mut pending = steps.iter().peekable();
    let mut log = Vec::new();

    while controller.now_ms() < duration_ms {
        while let Some(step) = pending.next_if(|step| step.at_ms <= controller.now_ms()) {
            let fired = controller.on_intersection(surface, &step.element, step.fraction);
            debug!(
                at_ms = step.at_ms,
                element = %step.element,
                fraction = step.fraction,
                fired,
                "上报可见比例"
            );
        }

        let events = controller.update(surface, frame_ms);
        let at_ms = controller.now_ms();
        log.extend(events.into_iter().map(|event| TimedEvent { at_ms, event }));
    }

    log
}
