//! # Counter 模块
//!
//! 固定步数的数字计数动画。
//!
//! 一次运行把元素文本从起始值线性推进到目标值，最后一步精确落在目标值。
//! 步进由控制器的定时器队列驱动，本模块只负责数值与文本。

use crate::config::CounterSettings;
use crate::format::DisplayValue;
use crate::scheduler::CancelToken;
use crate::surface::ElementId;

/// 单个元素上的一次计数运行
#[derive(Debug, Clone)]
pub struct CounterRun {
    /// 触发这次运行的观察目标
    pub owner: ElementId,
    /// 文本被改写的元素
    pub element: ElementId,
    target: DisplayValue,
    start_value: f64,
    current_step: u32,
    total_steps: u32,
    step_duration_ms: u64,
    final_step_duration_ms: u64,
    token: CancelToken,
}

impl CounterRun {
    /// 创建从 0 开始的运行
    pub fn new(
        owner: ElementId,
        element: ElementId,
        target: DisplayValue,
        settings: &CounterSettings,
        token: CancelToken,
    ) -> Self {
        Self {
            owner,
            element,
            target,
            start_value: 0.0,
            current_step: 0,
            total_steps: settings.steps.max(1),
            step_duration_ms: settings.step_duration_ms(),
            final_step_duration_ms: settings.final_step_duration_ms(),
            token,
        }
    }

    /// 设置起始值
    pub fn with_start(mut self, start_value: f64) -> Self {
        self.start_value = if start_value.is_finite() {
            start_value
        } else {
            0.0
        };
        self
    }

    pub fn target(&self) -> &DisplayValue {
        &self.target
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn step_duration_ms(&self) -> u64 {
        self.step_duration_ms
    }

    /// 距下一步的间隔，最后一步带上整除余数
    pub fn next_step_delay_ms(&self) -> u64 {
        if self.current_step + 1 >= self.total_steps {
            self.final_step_duration_ms
        } else {
            self.step_duration_ms
        }
    }

    /// 到达当前步所经过的时间
    pub fn elapsed_ms(&self) -> u64 {
        if self.is_finished() {
            self.step_duration_ms * u64::from(self.total_steps - 1) + self.final_step_duration_ms
        } else {
            self.step_duration_ms * u64::from(self.current_step)
        }
    }

    /// 第 `step` 步的数值
    pub fn value_at(&self, step: u32) -> f64 {
        let target = self.target.numeric_value();
        if step >= self.total_steps {
            return target;
        }
        let fraction = f64::from(step) / f64::from(self.total_steps);
        self.start_value + (target - self.start_value) * fraction
    }

    /// 推进一步，返回应写入元素的文本
    pub fn step(&mut self) -> String {
        if self.current_step < self.total_steps {
            self.current_step += 1;
        }
        self.text_at(self.current_step)
    }

    /// 直接跳到终点
    pub fn finish(&mut self) -> String {
        self.current_step = self.total_steps;
        self.target.final_text()
    }

    /// 当前步对应的文本
    pub fn current_text(&self) -> String {
        self.text_at(self.current_step)
    }

    /// 是否已到达目标值
    pub fn is_finished(&self) -> bool {
        self.current_step >= self.total_steps
    }

    fn text_at(&self, step: u32) -> String {
        if step >= self.total_steps {
            self.target.final_text()
        } else {
            self.target.render(self.value_at(step))
        }
    }
}
