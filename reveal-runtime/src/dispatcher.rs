//! # Dispatcher 模块
//!
//! 类别 → 揭示流程。
//!
//! 分发器只读表面、不写表面：它把一次触发翻译为 [`DispatchPlan`]，
//! 即"立即执行的动作"和"带偏移的错开动作"。执行、取消与降级都由控制器负责。

use tracing::debug;

use crate::config::{ChildAction, EngineConfig, StaggerProfile};
use crate::error::SurfaceError;
use crate::surface::{Category, ChartKind, ChildRole, ElementId, Marker, Motion, Surface};

/// 对单个元素的动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 添加状态标记
    Mark { element: ElementId, marker: Marker },
    /// 应用声明式动画
    Reveal { element: ElementId, motion: Motion },
    /// 对元素文本启动计数
    Count { element: ElementId },
    /// 路径描边揭示
    DrawPath { element: ElementId },
    /// 图标变换
    TransformIcon { element: ElementId, motion: Motion },
}

impl Action {
    /// 动作作用的元素
    pub fn element(&self) -> &ElementId {
        match self {
            Self::Mark { element, .. }
            | Self::Reveal { element, .. }
            | Self::Count { element }
            | Self::DrawPath { element }
            | Self::TransformIcon { element, .. } => element,
        }
    }
}

/// 一次触发的执行计划
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchPlan {
    /// 触发时同步执行
    pub immediate: Vec<Action>,
    /// `(延迟毫秒, 动作)`，延迟从触发时刻算起
    pub staggered: Vec<(u64, Action)>,
}

impl DispatchPlan {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.staggered.is_empty()
    }

    fn push_profile(&mut self, children: Vec<ElementId>, profile: &StaggerProfile) {
        for (index, child) in children.into_iter().enumerate() {
            let action = match profile.action {
                ChildAction::Reveal { motion } => Action::Reveal {
                    element: child,
                    motion,
                },
                ChildAction::Count => Action::Count { element: child },
            };
            self.staggered.push((profile.offset(index), action));
        }
    }
}

/// 动画分发器
#[derive(Debug, Clone, Copy)]
pub struct AnimationDispatcher<'a> {
    config: &'a EngineConfig,
}

impl<'a> AnimationDispatcher<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// 为一次触发生成执行计划
    pub fn plan<S: Surface + ?Sized>(
        &self,
        surface: &S,
        element: &ElementId,
        category: Category,
    ) -> Result<DispatchPlan, SurfaceError> {
        if !surface.contains(element) {
            return Err(SurfaceError::MissingElement(element.clone()));
        }

        let mut plan = DispatchPlan::default();
        let animate_in = Action::Mark {
            element: element.clone(),
            marker: Marker::AnimateIn,
        };

        match category {
            Category::Stat => {
                plan.immediate.push(animate_in);
                plan.immediate.push(Action::Count {
                    element: element.clone(),
                });
            }
            Category::Card(kind) => {
                let cards = &self.config.cards;
                plan.immediate.push(animate_in);
                plan.immediate.push(Action::Reveal {
                    element: element.clone(),
                    motion: cards.reveal,
                });

                let profile = cards.profile(kind);
                let children = surface.children(element, profile.child_role)?;
                plan.push_profile(children, profile);
            }
            Category::Chart(kind) => self.plan_chart(surface, element, kind, &mut plan)?,
            Category::Feature => {
                let feature = &self.config.feature;
                plan.immediate.push(animate_in);
                plan.immediate.push(Action::Reveal {
                    element: element.clone(),
                    motion: feature.reveal,
                });
                for icon in surface.children(element, ChildRole::Icon)? {
                    plan.staggered.push((
                        feature.icon_delay_ms,
                        Action::TransformIcon {
                            element: icon,
                            motion: feature.icon_motion,
                        },
                    ));
                }
            }
            Category::Heading => plan.immediate.push(animate_in),
        }

        debug!(
            element = %element,
            category = category.name(),
            immediate = plan.immediate.len(),
            staggered = plan.staggered.len(),
            "生成揭示计划"
        );
        Ok(plan)
    }

    fn plan_chart<S: Surface + ?Sized>(
        &self,
        surface: &S,
        element: &ElementId,
        kind: ChartKind,
        plan: &mut DispatchPlan,
    ) -> Result<(), SurfaceError> {
        let charts = &self.config.charts;
        match kind {
            ChartKind::Line => {
                let lines = surface.children(element, ChildRole::Line)?;
                if lines.is_empty() {
                    // 图表本身就是路径
                    plan.immediate.push(Action::DrawPath {
                        element: element.clone(),
                    });
                } else {
                    plan.immediate
                        .extend(lines.into_iter().map(|line| Action::DrawPath { element: line }));
                }
                let dots = surface.children(element, charts.dots.child_role)?;
                plan.push_profile(dots, &charts.dots);
            }
            ChartKind::Bars => {
                let bars = surface.children(element, charts.bars.child_role)?;
                plan.push_profile(bars, &charts.bars);
            }
            ChartKind::Ring => {
                for ring in surface.children(element, ChildRole::Ring)? {
                    plan.immediate.push(Action::DrawPath { element: ring });
                }
                for label in surface.children(element, ChildRole::Label)? {
                    plan.immediate.push(Action::Count { element: label });
                }
            }
        }
        Ok(())
    }
}
