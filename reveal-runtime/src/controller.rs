//! # Controller 模块
//!
//! 动画控制器：持有全部观察目标、计数运行、路径描边和定时任务。
//!
//! ## 执行模型
//!
//! 宿主每帧调用一次 [`AnimationController::update`]：
//!
//! 1. 按 `(到期时间, 调度顺序)` 执行到期任务
//! 2. 推进路径描边补间
//! 3. 推进提示消息
//! 4. 刷新目标阶段，返回本帧产生的事件
//!
//! 每个观察目标持有一个批次令牌，计数运行使用批次令牌的子令牌。
//! `detach` 取消批次令牌，`teardown` 取消根令牌。
//!
//! ## 错误处理
//!
//! 动画错误从不向上传播：缺失元素、非路径元素、不可解析的文本只记录 `debug`；
//! 宿主返回 [`SurfaceError::Unsupported`] 时进入减少动画模式。

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::animation::Tween;
use crate::config::{ConfigError, EngineConfig};
use crate::counter::CounterRun;
use crate::dispatcher::{Action, AnimationDispatcher};
use crate::error::{EngineError, EngineResult, SurfaceError};
use crate::format::DisplayValue;
use crate::loading::LoadingProgress;
use crate::notification::NotificationCenter;
use crate::scheduler::{CancelToken, TimerQueue};
use crate::surface::{Category, ElementId, Marker, Motion, StyleProperty, Surface};
use crate::visibility::VisibilityTrigger;

/// 目标阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPhase {
    /// 未观察
    Unwatched,
    /// 等待进入视口
    Watching,
    /// 刚被触发
    Triggered,
    /// 有未完成的动作
    Animating,
    /// 全部动作完成
    Settled,
}

/// 观察目标
#[derive(Debug, Clone)]
pub struct ObservedTarget {
    pub element: ElementId,
    pub category: Category,
    pub phase: TargetPhase,
    /// 累计触发次数
    pub trigger_count: u32,
    pub one_shot: bool,
    token: CancelToken,
}

/// 控制器事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// 目标被触发
    Triggered {
        element: ElementId,
        category: Category,
        trigger_count: u32,
    },
    /// 目标的全部动作完成
    Settled { element: ElementId },
    /// 计数到达目标值
    CounterFinished { element: ElementId, text: String },
    /// 路径描边完成
    PathDrawn { element: ElementId },
    /// 加载屏已隐藏
    LoadingComplete,
    /// 进入减少动画模式
    ReducedMotionEnabled { reason: String },
    /// 提示消息自动消失
    NotificationDismissed { id: u64 },
}

/// 定时任务
#[derive(Debug, Clone)]
enum Task {
    /// 计数推进一步
    CounterStep { owner: ElementId, element: ElementId },
    /// 错开执行的动作
    Action { owner: ElementId, action: Action },
    /// 加载进度推进
    LoadingTick,
    /// 隐藏加载屏并开始首屏入场
    LoadingFinished,
}

impl Task {
    fn owner(&self) -> Option<&ElementId> {
        match self {
            Self::CounterStep { owner, .. } | Self::Action { owner, .. } => Some(owner),
            Self::LoadingTick | Self::LoadingFinished => None,
        }
    }
}

/// 进行中的路径描边
#[derive(Debug, Clone)]
struct PathDraw {
    owner: ElementId,
    tween: Tween,
    /// 上次推进时的虚拟时间
    last_ms: u64,
    token: CancelToken,
}

#[derive(Debug)]
struct LoadingState {
    progress: LoadingProgress,
    token: CancelToken,
}

/// 动画控制器
pub struct AnimationController {
    config: EngineConfig,
    trigger: VisibilityTrigger,
    queue: TimerQueue<Task>,
    targets: BTreeMap<ElementId, ObservedTarget>,
    counters: BTreeMap<ElementId, CounterRun>,
    /// 每个计数元素首次解析得到的展示值，之后的运行都沿用
    display_values: BTreeMap<ElementId, DisplayValue>,
    draws: BTreeMap<ElementId, PathDraw>,
    loading: Option<LoadingState>,
    notifications: NotificationCenter,
    reduced_motion: bool,
    root: CancelToken,
    /// 待返回的事件
    events: Vec<EngineEvent>,
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("now_ms", &self.queue.now())
            .field("targets", &self.targets.len())
            .field("counters", &self.counters.len())
            .field("draws", &self.draws.len())
            .field("pending", &self.queue.pending_count())
            .field("reduced_motion", &self.reduced_motion)
            .finish()
    }
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnimationController {
    /// 校验配置后创建控制器
    pub fn try_new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// 创建控制器，不校验配置
    ///
    /// 配置来自外部文件时应使用 [`AnimationController::try_new`]。
    pub fn new(config: EngineConfig) -> Self {
        let notifications = NotificationCenter::new(&config.notification);
        let reduced_motion = config.reduced_motion;
        Self {
            config,
            trigger: VisibilityTrigger::new(),
            queue: TimerQueue::new(),
            targets: BTreeMap::new(),
            counters: BTreeMap::new(),
            display_values: BTreeMap::new(),
            draws: BTreeMap::new(),
            loading: None,
            notifications,
            reduced_motion,
            root: CancelToken::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 当前虚拟时间（毫秒）
    pub fn now_ms(&self) -> u64 {
        self.queue.now()
    }

    pub fn is_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    // ========== 注册 ==========

    /// 扫描表面，观察所有带类别的元素，返回新注册的数量
    pub fn discover<S: Surface + ?Sized>(&mut self, surface: &mut S) -> usize {
        if self.reduced_motion {
            surface.set_reduced_motion(true);
        }

        let mut registered = 0;
        for (element, category) in surface.scan() {
            if self.targets.contains_key(&element) {
                continue;
            }
            match self.observe(&*surface, element, category) {
                Ok(()) => registered += 1,
                Err(e) => debug!(error = %e, "跳过无法观察的元素"),
            }
        }
        info!(registered, "页面扫描完成");
        registered
    }

    /// 观察单个元素
    ///
    /// 已注册的元素保持原状态，一次性目标不会因为重复观察而再次触发。
    pub fn observe<S: Surface + ?Sized>(
        &mut self,
        surface: &S,
        element: ElementId,
        category: Category,
    ) -> EngineResult<()> {
        if !surface.contains(&element) {
            return Err(SurfaceError::MissingElement(element).into());
        }
        if self.targets.contains_key(&element) {
            return Ok(());
        }

        let options = self.config.visibility.options_for(category);
        self.trigger.observe(element.clone(), options);
        debug!(
            element = %element,
            category = category.name(),
            threshold = options.threshold,
            one_shot = options.one_shot,
            "开始观察"
        );
        self.targets.insert(
            element.clone(),
            ObservedTarget {
                element,
                category,
                phase: TargetPhase::Watching,
                trigger_count: 0,
                one_shot: options.one_shot,
                token: self.root.child(),
            },
        );
        Ok(())
    }

    /// 停止观察并取消该目标所有未完成的动作
    pub fn detach(&mut self, element: &ElementId) -> EngineResult<()> {
        let target = self
            .targets
            .remove(element)
            .ok_or_else(|| EngineError::UnknownTarget(element.clone()))?;

        target.token.cancel();
        self.trigger.unobserve(element);
        self.counters.retain(|_, run| !run.token().is_cancelled());
        self.draws.retain(|_, draw| !draw.token.is_cancelled());
        debug!(element = %element, "目标已分离");
        Ok(())
    }

    /// 取消全部动作并清空所有状态
    ///
    /// 已解析的展示值保留，元素文本此时可能停在中间帧。
    pub fn teardown(&mut self) {
        self.root.cancel();
        self.root = CancelToken::new();
        self.trigger.clear();
        self.queue.clear();
        self.targets.clear();
        self.counters.clear();
        self.draws.clear();
        self.loading = None;
        self.notifications.clear();
        self.events.clear();
        info!("动画控制器已拆除");
    }

    // ========== 查询 ==========

    pub fn target(&self, element: &ElementId) -> Option<&ObservedTarget> {
        self.targets.get(element)
    }

    /// 目标阶段（未注册的元素为 `Unwatched`）
    pub fn phase(&self, element: &ElementId) -> TargetPhase {
        self.targets
            .get(element)
            .map(|target| target.phase)
            .unwrap_or(TargetPhase::Unwatched)
    }

    /// 元素上是否有进行中的计数
    pub fn is_counting(&self, element: &ElementId) -> bool {
        self.counters.contains_key(element)
    }

    /// 没有任何待执行的工作
    pub fn is_idle(&self) -> bool {
        self.queue.pending_count() == 0 && self.counters.is_empty() && self.draws.is_empty()
    }

    // ========== 触发 ==========

    /// 宿主上报可见比例，返回是否触发
    ///
    /// 触发时同步执行即时动作，错开动作进入定时队列。
    pub fn on_intersection<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        element: &ElementId,
        fraction: f64,
    ) -> bool {
        if !self.trigger.report(element, fraction) {
            return false;
        }
        let Some(target) = self.targets.get_mut(element) else {
            return false;
        };

        target.trigger_count += 1;
        target.phase = TargetPhase::Triggered;
        let category = target.category;
        let token = target.token.clone();
        self.events.push(EngineEvent::Triggered {
            element: element.clone(),
            category,
            trigger_count: target.trigger_count,
        });

        self.dispatch(surface, element, category, &token);

        if let Some(target) = self.targets.get_mut(element) {
            target.phase = TargetPhase::Animating;
        }
        self.refresh_phases();
        true
    }

    fn dispatch<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        owner: &ElementId,
        category: Category,
        token: &CancelToken,
    ) {
        let planned = AnimationDispatcher::new(&self.config).plan(&*surface, owner, category);
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => {
                self.guard(surface, owner, Err(e.into()));
                return;
            }
        };

        for action in plan.immediate {
            let result = self.run_action(surface, owner, action, token);
            self.guard(surface, owner, result);
        }

        let mut staggered = plan.staggered;
        staggered.sort_by_key(|(delay, _)| *delay);
        for (delay, action) in staggered {
            if self.reduced_motion {
                let result = self.run_action(surface, owner, action, token);
                self.guard(surface, owner, result);
            } else {
                self.queue.schedule(
                    delay,
                    token,
                    Task::Action {
                        owner: owner.clone(),
                        action,
                    },
                );
            }
        }
    }

    // ========== 帧更新 ==========

    /// 推进 `dt_ms` 毫秒，返回期间产生的事件
    pub fn update<S: Surface + ?Sized>(&mut self, surface: &mut S, dt_ms: u64) -> Vec<EngineEvent> {
        let until = self.queue.now().saturating_add(dt_ms);

        while let Some((token, task)) = self.queue.pop_due(until) {
            self.run_task(surface, &token, task);
        }
        self.queue.advance_to(until);

        self.advance_draws(surface);

        for id in self.notifications.update(dt_ms as f64) {
            self.events.push(EngineEvent::NotificationDismissed { id });
        }

        self.refresh_phases();

        // 返回并清空事件队列
        std::mem::take(&mut self.events)
    }

    fn run_task<S: Surface + ?Sized>(&mut self, surface: &mut S, token: &CancelToken, task: Task) {
        match task {
            Task::CounterStep { owner, element } => self.step_counter(surface, &owner, &element),
            Task::Action { owner, action } => {
                let result = self.run_action(surface, &owner, action, token);
                self.guard(surface, &owner, result);
            }
            Task::LoadingTick => self.tick_loading(surface),
            Task::LoadingFinished => self.finish_loading(surface),
        }
    }

    fn run_action<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        owner: &ElementId,
        action: Action,
        token: &CancelToken,
    ) -> EngineResult<()> {
        match action {
            Action::Mark { element, marker } => {
                surface.add_marker(&element, marker)?;
            }
            Action::Reveal { element, motion } => {
                surface.apply_motion(&element, self.effective(motion))?;
            }
            Action::Count { element } => self.start_counter(surface, owner, element, token)?,
            Action::DrawPath { element } => self.start_draw(surface, owner, element, token)?,
            Action::TransformIcon { element, motion } => {
                surface.add_marker(&element, Marker::IconTransformed)?;
                surface.apply_motion(&element, self.effective(motion))?;
            }
        }
        Ok(())
    }

    fn effective(&self, motion: Motion) -> Motion {
        if self.reduced_motion {
            motion.instant()
        } else {
            motion
        }
    }

    // ========== 计数 ==========

    fn start_counter<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        owner: &ElementId,
        element: ElementId,
        parent: &CancelToken,
    ) -> EngineResult<()> {
        if let Some(previous) = self.counters.remove(&element) {
            previous.token().cancel();
            debug!(element = %element, "新的计数运行取代旧运行");
        }

        let target = match self.display_values.get(&element) {
            Some(value) => value.clone(),
            None => {
                let value = DisplayValue::parse(&surface.text(&element)?)?;
                self.display_values.insert(element.clone(), value.clone());
                value
            }
        };

        if target.is_zero() {
            debug!(element = %element, raw = target.raw_text(), "目标值为零，保持原文本");
            return Ok(());
        }

        let mut run = CounterRun::new(
            owner.clone(),
            element.clone(),
            target,
            &self.config.counter,
            parent.child(),
        );

        if self.reduced_motion {
            let text = run.finish();
            surface.set_text(&element, &text)?;
            self.events
                .push(EngineEvent::CounterFinished { element, text });
            return Ok(());
        }

        surface.set_text(&element, &run.current_text())?;
        self.queue.schedule(
            run.next_step_delay_ms(),
            run.token(),
            Task::CounterStep {
                owner: owner.clone(),
                element: element.clone(),
            },
        );
        self.counters.insert(element, run);
        Ok(())
    }

    fn step_counter<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        owner: &ElementId,
        element: &ElementId,
    ) {
        let Some(run) = self.counters.get_mut(element) else {
            return;
        };
        let text = run.step();
        let finished = run.is_finished();
        let delay = run.next_step_delay_ms();
        let token = run.token().clone();

        if let Err(e) = surface.set_text(element, &text) {
            self.counters.remove(element);
            self.guard(surface, owner, Err(e.into()));
            return;
        }

        if finished {
            self.counters.remove(element);
            self.events.push(EngineEvent::CounterFinished {
                element: element.clone(),
                text,
            });
        } else {
            self.queue.schedule(
                delay,
                &token,
                Task::CounterStep {
                    owner: owner.clone(),
                    element: element.clone(),
                },
            );
        }
    }

    // ========== 路径描边 ==========

    fn start_draw<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        owner: &ElementId,
        element: ElementId,
        token: &CancelToken,
    ) -> EngineResult<()> {
        let length = surface.path_length(&element)?;

        if !(length.is_finite() && length > 0.0) {
            debug!(element = %element, length, "路径长度无效，直接显示");
            surface.set_property(&element, StyleProperty::DashOffset, 0.0)?;
            self.events.push(EngineEvent::PathDrawn { element });
            return Ok(());
        }

        surface.set_property(&element, StyleProperty::DashArray, length)?;
        surface.set_property(&element, StyleProperty::DashOffset, length)?;

        let duration = if self.reduced_motion {
            0.0
        } else {
            self.config.charts.draw_duration_ms as f64
        };
        let tween = Tween::new(length, 0.0, duration).with_easing(self.config.charts.draw_easing);

        if tween.is_finished() {
            surface.set_property(&element, StyleProperty::DashOffset, 0.0)?;
            self.events.push(EngineEvent::PathDrawn { element });
            return Ok(());
        }

        self.draws.insert(
            element,
            PathDraw {
                owner: owner.clone(),
                tween,
                last_ms: self.queue.now(),
                token: token.clone(),
            },
        );
        Ok(())
    }

    fn advance_draws<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let now = self.queue.now();
        let mut done = Vec::new();
        let mut failures = Vec::new();

        for (element, draw) in &mut self.draws {
            if draw.token.is_cancelled() {
                done.push(element.clone());
                continue;
            }

            let dt = now.saturating_sub(draw.last_ms);
            draw.last_ms = now;
            draw.tween.update(dt as f64);

            let offset = draw.tween.current_value();
            if let Err(e) = surface.set_property(element, StyleProperty::DashOffset, offset) {
                failures.push((draw.owner.clone(), e));
                done.push(element.clone());
                continue;
            }

            if draw.tween.is_finished() {
                done.push(element.clone());
                self.events.push(EngineEvent::PathDrawn {
                    element: element.clone(),
                });
            }
        }

        for element in done {
            self.draws.remove(&element);
        }
        for (owner, error) in failures {
            self.guard(surface, &owner, Err(error.into()));
        }
    }

    // ========== 加载与首屏 ==========

    /// 开始加载进度模拟，完成后隐藏加载屏并播放首屏入场序列
    pub fn start_loading<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let settings = &self.config.loading;
        if !surface.contains(&settings.bar) {
            debug!(element = %settings.bar, "进度条不存在，仅模拟进度");
        }

        let token = self.root.child();
        let delay = if self.reduced_motion { 0 } else { settings.tick_ms };
        self.loading = Some(LoadingState {
            progress: LoadingProgress::new(settings),
            token: token.clone(),
        });
        self.queue.schedule(delay, &token, Task::LoadingTick);
        info!("开始加载进度模拟");
    }

    /// 当前加载进度（未在加载时为 `None`）
    pub fn loading_progress(&self) -> Option<f64> {
        self.loading.as_ref().map(|state| state.progress.progress())
    }

    fn tick_loading<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let reduced = self.reduced_motion;
        let Some(state) = self.loading.as_mut() else {
            return;
        };

        let value = if reduced {
            state.progress.complete();
            state.progress.progress()
        } else {
            state.progress.tick()
        };
        let complete = state.progress.is_complete();
        let token = state.token.clone();

        let (next_delay, next_task) = if complete {
            let delay = if reduced { 0 } else { self.config.loading.hide_delay_ms };
            (delay, Task::LoadingFinished)
        } else {
            (self.config.loading.tick_ms, Task::LoadingTick)
        };
        self.queue.schedule(next_delay, &token, next_task);

        let bar = self.config.loading.bar.clone();
        let result = surface
            .set_property(&bar, StyleProperty::WidthPercent, value)
            .map_err(EngineError::from);
        self.guard(surface, &bar, result);
    }

    fn finish_loading<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let Some(state) = self.loading.take() else {
            return;
        };

        let screen = self.config.loading.screen.clone();
        let result = surface
            .add_marker(&screen, Marker::Hidden)
            .map(|_| ())
            .map_err(EngineError::from);
        self.guard(surface, &screen, result);
        self.events.push(EngineEvent::LoadingComplete);
        info!("加载完成，开始首屏入场");

        for step in self.config.hero.clone() {
            if !surface.contains(&step.element) {
                debug!(element = %step.element, "首屏元素不存在，跳过");
                continue;
            }
            let delay = if self.reduced_motion { 0 } else { step.delay_ms };
            self.queue.schedule(
                delay,
                &state.token,
                Task::Action {
                    owner: step.element.clone(),
                    action: Action::Reveal {
                        element: step.element,
                        motion: step.motion,
                    },
                },
            );
        }
    }

    // ========== 降级 ==========

    /// 进入减少动画模式
    ///
    /// 所有计数与描边立即落到终值，队列中的任务立即执行，
    /// 之后的动画时长与延迟都为零。
    pub fn degrade<S: Surface + ?Sized>(&mut self, surface: &mut S, reason: impl Into<String>) {
        if self.reduced_motion {
            return;
        }
        let reason = reason.into();
        warn!(reason = %reason, "动画运行时错误，进入减少动画模式");

        self.reduced_motion = true;
        surface.set_reduced_motion(true);
        self.events
            .push(EngineEvent::ReducedMotionEnabled { reason });
        self.settle_all(surface);
    }

    fn settle_all<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        for (element, mut run) in std::mem::take(&mut self.counters) {
            run.token().cancel();
            let text = run.finish();
            match surface.set_text(&element, &text) {
                Ok(()) => self
                    .events
                    .push(EngineEvent::CounterFinished { element, text }),
                Err(e) => debug!(element = %element, error = %e, "计数终值写入失败"),
            }
        }

        for (element, draw) in std::mem::take(&mut self.draws) {
            if draw.token.is_cancelled() {
                continue;
            }
            match surface.set_property(&element, StyleProperty::DashOffset, 0.0) {
                Ok(()) => self.events.push(EngineEvent::PathDrawn { element }),
                Err(e) => debug!(element = %element, error = %e, "描边终值写入失败"),
            }
        }

        // 执行任务可能产生新的零延迟任务
        loop {
            let pending = self.queue.drain_pending();
            if pending.is_empty() {
                break;
            }
            for (token, task) in pending {
                if !token.is_cancelled() {
                    self.run_task(surface, &token, task);
                }
            }
        }
    }

    /// 动作错误处理
    fn guard<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        element: &ElementId,
        result: EngineResult<()>,
    ) {
        let Err(error) = result else {
            return;
        };

        match error {
            EngineError::Surface(e) if e.is_runtime_failure() => {
                if self.reduced_motion {
                    debug!(element = %element, error = %e, "减少动画模式下操作仍不受支持，跳过");
                } else {
                    self.degrade(surface, e.to_string());
                }
            }
            other => debug!(element = %element, error = %other, "跳过动画"),
        }
    }

    // ========== 阶段 ==========

    fn has_work(&self, owner: &ElementId) -> bool {
        self.queue.has_pending(|task| task.owner() == Some(owner))
            || self.counters.values().any(|run| &run.owner == owner)
            || self.draws.values().any(|draw| &draw.owner == owner)
    }

    fn refresh_phases(&mut self) {
        let busy: Vec<ElementId> = self
            .targets
            .values()
            .filter(|target| {
                matches!(
                    target.phase,
                    TargetPhase::Triggered | TargetPhase::Animating
                )
            })
            .map(|target| target.element.clone())
            .collect();

        for element in busy {
            if self.has_work(&element) {
                continue;
            }
            if let Some(target) = self.targets.get_mut(&element) {
                target.phase = TargetPhase::Settled;
            }
            self.events.push(EngineEvent::Settled { element });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Page, PageElement};
    use crate::surface::{CardKind, ChartKind, ChildRole};

    fn id(s: &str) -> ElementId {
        ElementId::new(s)
    }

    fn run_frames(
        controller: &mut AnimationController,
        page: &mut Page,
        total_ms: u64,
    ) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut elapsed = 0;
        while elapsed < total_ms {
            events.extend(controller.update(page, 16));
            elapsed += 16;
        }
        events
    }

    #[test]
    fn test_stat_counts_to_target() {
        let mut page = Page::from_elements(vec![
            PageElement::new("aum")
                .with_category(Category::Stat)
                .with_text("£65M+"),
        ]);
        let mut controller = AnimationController::default();
        assert_eq!(controller.discover(&mut page), 1);
        assert_eq!(controller.phase(&id("aum")), TargetPhase::Watching);

        assert!(controller.on_intersection(&mut page, &id("aum"), 0.4));
        assert_eq!(page.text(&id("aum")).unwrap(), "£0M+");
        assert_eq!(controller.phase(&id("aum")), TargetPhase::Animating);
        assert!(page.has_marker(&id("aum"), Marker::AnimateIn));

        let events = run_frames(&mut controller, &mut page, 2500);
        assert_eq!(page.text(&id("aum")).unwrap(), "£65M+");
        assert_eq!(controller.phase(&id("aum")), TargetPhase::Settled);
        assert!(events.contains(&EngineEvent::Settled { element: id("aum") }));
        assert!(controller.is_idle());
    }

    #[test]
    fn test_unparseable_and_zero_text_untouched() {
        let mut page = Page::from_elements(vec![
            PageElement::new("a").with_category(Category::Stat).with_text("N/A"),
            PageElement::new("b").with_category(Category::Stat).with_text("0%"),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);

        controller.on_intersection(&mut page, &id("a"), 1.0);
        controller.on_intersection(&mut page, &id("b"), 1.0);
        run_frames(&mut controller, &mut page, 100);

        assert_eq!(page.text(&id("a")).unwrap(), "N/A");
        assert_eq!(page.text(&id("b")).unwrap(), "0%");
        assert_eq!(controller.phase(&id("a")), TargetPhase::Settled);
    }

    #[test]
    fn test_repeatable_heading() {
        let mut page = Page::from_elements(vec![
            PageElement::new("title").with_category(Category::Heading),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);

        assert!(controller.on_intersection(&mut page, &id("title"), 0.5));
        assert_eq!(controller.phase(&id("title")), TargetPhase::Settled);
        controller.on_intersection(&mut page, &id("title"), 0.0);
        assert!(controller.on_intersection(&mut page, &id("title"), 0.5));

        assert_eq!(controller.target(&id("title")).unwrap().trigger_count, 2);
        assert!(page.has_marker(&id("title"), Marker::AnimateIn));
    }

    #[test]
    fn test_line_chart_draw() {
        let mut page = Page::from_elements(vec![
            PageElement::new("chart")
                .with_category(Category::Chart(ChartKind::Line))
                .with_children(["line", "d0", "d1"]),
            PageElement::new("line")
                .with_role(ChildRole::Line)
                .with_path_length(400.0),
            PageElement::new("d0").with_role(ChildRole::Dot),
            PageElement::new("d1").with_role(ChildRole::Dot),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);

        // 图表阈值为 0.5
        assert!(!controller.on_intersection(&mut page, &id("chart"), 0.3));
        assert!(controller.on_intersection(&mut page, &id("chart"), 0.6));
        assert_eq!(page.style(&id("line"), StyleProperty::DashArray), Some(400.0));
        assert_eq!(page.style(&id("line"), StyleProperty::DashOffset), Some(400.0));

        controller.update(&mut page, 1000);
        let offset = page.style(&id("line"), StyleProperty::DashOffset).unwrap();
        assert!(offset > 0.0 && offset < 400.0);
        assert!(page.element(&id("d0")).unwrap().motion.is_some());
        assert!(page.element(&id("d1")).unwrap().motion.is_some());

        let events = controller.update(&mut page, 1000);
        assert_eq!(page.style(&id("line"), StyleProperty::DashOffset), Some(0.0));
        assert!(events.contains(&EngineEvent::PathDrawn { element: id("line") }));
        assert_eq!(controller.phase(&id("chart")), TargetPhase::Settled);
    }

    #[test]
    fn test_superseding_run_keeps_single_counter() {
        let mut page = Page::from_elements(vec![
            PageElement::new("card")
                .with_category(Category::Card(CardKind::Insight))
                .with_children(["s"]),
            PageElement::new("s").with_role(ChildRole::Stat).with_text("98%"),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);
        controller.on_intersection(&mut page, &id("card"), 1.0);
        run_frames(&mut controller, &mut page, 1000);
        assert!(controller.is_counting(&id("s")));

        // 同一元素再次计数：旧运行被取消，沿用原分类
        let token = controller.target(&id("card")).unwrap().token.clone();
        controller.dispatch(&mut page, &id("card"), Category::Card(CardKind::Insight), &token);
        run_frames(&mut controller, &mut page, 3500);

        assert_eq!(page.text(&id("s")).unwrap(), "98.0%");
        assert!(!controller.is_counting(&id("s")));
    }

    #[test]
    fn test_repeatable_stat_keeps_first_classification() {
        let mut page = Page::from_elements(vec![
            PageElement::new("growth")
                .with_category(Category::Stat)
                .with_text("8.5 YoY"),
        ]);
        let mut config = EngineConfig::default();
        config.visibility.stat.one_shot = false;
        let mut controller = AnimationController::new(config);
        controller.discover(&mut page);

        assert!(controller.on_intersection(&mut page, &id("growth"), 1.0));
        run_frames(&mut controller, &mut page, 2500);
        assert_eq!(page.text(&id("growth")).unwrap(), "+8.5% YoY");

        // 文本已是引擎渲染结果，再次进入视口不能重新分类
        controller.on_intersection(&mut page, &id("growth"), 0.0);
        assert!(controller.on_intersection(&mut page, &id("growth"), 1.0));
        assert_eq!(page.text(&id("growth")).unwrap(), "+0.0% YoY");
        run_frames(&mut controller, &mut page, 2500);

        assert_eq!(page.text(&id("growth")).unwrap(), "+8.5% YoY");
        assert_eq!(controller.target(&id("growth")).unwrap().trigger_count, 2);
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.loading.max_increment = f64::NAN;
        assert!(matches!(
            AnimationController::try_new(config),
            Err(ConfigError::ValidationFailed(_))
        ));

        let mut config = EngineConfig::default();
        config.counter.steps = 0;
        assert!(AnimationController::try_new(config).is_err());

        assert!(AnimationController::try_new(EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_detach_cancels_counter() {
        let mut page = Page::from_elements(vec![
            PageElement::new("aum")
                .with_category(Category::Stat)
                .with_text("500+"),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);
        controller.on_intersection(&mut page, &id("aum"), 1.0);
        run_frames(&mut controller, &mut page, 320);

        controller.detach(&id("aum")).unwrap();
        let frozen = page.text(&id("aum")).unwrap();
        run_frames(&mut controller, &mut page, 3000);

        assert_eq!(page.text(&id("aum")).unwrap(), frozen);
        assert_ne!(frozen, "500+");
        assert!(controller.is_idle());
        assert_eq!(controller.phase(&id("aum")), TargetPhase::Unwatched);
        assert!(matches!(
            controller.detach(&id("aum")),
            Err(EngineError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_loading_then_hero() {
        let mut page = Page::from_elements(vec![
            PageElement::new("loading-screen"),
            PageElement::new("loading-progress"),
            PageElement::new("hero-title"),
            PageElement::new("hero-buttons"),
        ]);
        let mut config = EngineConfig::default();
        config.loading.seed = Some(11);
        let mut controller = AnimationController::new(config);

        controller.start_loading(&mut page);
        let mut events = Vec::new();
        for _ in 0..400 {
            events.extend(controller.update(&mut page, 50));
        }

        assert!(events.contains(&EngineEvent::LoadingComplete));
        assert_eq!(
            page.style(&id("loading-progress"), StyleProperty::WidthPercent),
            Some(100.0)
        );
        assert!(page.has_marker(&id("loading-screen"), Marker::Hidden));
        assert!(page.element(&id("hero-title")).unwrap().motion.is_some());
        assert!(page.element(&id("hero-buttons")).unwrap().motion.is_some());
        assert_eq!(controller.loading_progress(), None);
    }

    #[test]
    fn test_degrade_finalizes_everything() {
        let mut page = Page::from_elements(vec![
            PageElement::new("aum")
                .with_category(Category::Stat)
                .with_text("£65M+"),
            PageElement::new("feat")
                .with_category(Category::Feature)
                .with_children(["icon"]),
            PageElement::new("icon").with_role(ChildRole::Icon),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);
        controller.on_intersection(&mut page, &id("aum"), 1.0);
        controller.on_intersection(&mut page, &id("feat"), 1.0);

        controller.degrade(&mut page, "test");
        let events = controller.update(&mut page, 0);

        assert!(controller.is_reduced_motion());
        assert!(page.reduced_motion());
        assert_eq!(page.text(&id("aum")).unwrap(), "£65M+");
        assert!(page.has_marker(&id("icon"), Marker::IconTransformed));
        assert_eq!(
            page.element(&id("icon")).unwrap().motion.map(|m| m.duration_ms),
            Some(0)
        );
        assert!(events.contains(&EngineEvent::ReducedMotionEnabled {
            reason: "test".to_string()
        }));
        assert!(controller.is_idle());
    }

    #[test]
    fn test_teardown_clears_state() {
        let mut page = Page::from_elements(vec![
            PageElement::new("aum")
                .with_category(Category::Stat)
                .with_text("98%"),
        ]);
        let mut controller = AnimationController::default();
        controller.discover(&mut page);
        controller.on_intersection(&mut page, &id("aum"), 1.0);
        controller.notifications_mut().info("hello");

        controller.teardown();

        assert!(controller.is_idle());
        assert_eq!(controller.phase(&id("aum")), TargetPhase::Unwatched);
        assert!(!controller.notifications().has_notifications());
        assert!(controller.update(&mut page, 5000).is_empty());
        assert_eq!(page.text(&id("aum")).unwrap(), "0.0%");
    }
}
