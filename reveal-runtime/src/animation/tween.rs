//! # Tween 模块
//!
//! 通用补间实例：管理单个 f64 值从 `from` 到 `to` 在 `duration_ms` 内的变化。
//!
//! 补间只关注时间轴，不假设值被用在哪里（路径偏移、宽度等）。

use super::EasingFunction;

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（有延迟）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
}

impl TweenState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Playing)
    }
}

/// 补间实例
#[derive(Debug, Clone)]
pub struct Tween {
    /// 起始值
    pub from: f64,
    /// 目标值
    pub to: f64,
    /// 时长（毫秒）
    pub duration_ms: f64,
    /// 缓动函数
    pub easing: EasingFunction,
    /// 延迟启动（毫秒）
    pub delay_ms: f64,
    /// 当前状态
    pub state: TweenState,
    /// 当前进度（0.0 - 1.0，已应用缓动）
    pub progress: f64,
    elapsed_ms: f64,
}

impl Tween {
    /// 创建新的补间（时长 <= 0 时直接完成）
    pub fn new(from: f64, to: f64, duration_ms: f64) -> Self {
        let duration_ms = if duration_ms.is_finite() { duration_ms.max(0.0) } else { 0.0 };
        let (state, progress) = if duration_ms <= 0.0 {
            (TweenState::Completed, 1.0)
        } else {
            (TweenState::Pending, 0.0)
        };

        Self {
            from,
            to,
            duration_ms,
            easing: EasingFunction::default(),
            delay_ms: 0.0,
            state,
            progress,
            elapsed_ms: 0.0,
        }
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    /// 更新补间
    ///
    /// # 返回
    /// - `true`: 仍在进行中
    /// - `false`: 已结束
    pub fn update(&mut self, dt_ms: f64) -> bool {
        match self.state {
            TweenState::Pending => {
                self.elapsed_ms += dt_ms;
                if self.elapsed_ms >= self.delay_ms {
                    self.state = TweenState::Playing;
                    self.elapsed_ms -= self.delay_ms;
                    self.update_playing()
                } else {
                    true
                }
            }
            TweenState::Playing => {
                self.elapsed_ms += dt_ms;
                self.update_playing()
            }
            TweenState::Completed => false,
        }
    }

    fn update_playing(&mut self) -> bool {
        let raw_progress = self.elapsed_ms / self.duration_ms;
        if raw_progress >= 1.0 {
            self.force_complete();
            false
        } else {
            self.progress = self.easing.apply(raw_progress);
            true
        }
    }

    /// 强制完成
    pub fn force_complete(&mut self) {
        self.progress = 1.0;
        self.state = TweenState::Completed;
    }

    /// 当前值（完成时精确等于目标值）
    pub fn current_value(&self) -> f64 {
        if self.state == TweenState::Completed {
            return self.to;
        }
        self.from + (self.to - self.from) * self.progress
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state == TweenState::Completed
    }
}
