//! # Reveal Runtime
//!
//! 滚动触发揭示动画与数字计数引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `reveal-runtime` 是纯逻辑核心，不依赖任何渲染引擎，也不读系统时钟。
//! 它通过 [`Surface`] trait 与宿主通信：
//!
//! ```text
//! Host                                   Runtime
//!   │                                       │
//!   │──── on_intersection(id, fraction) ──►│ 触发 → 即时动作 + 错开任务
//!   │──── update(dt_ms) ──────────────────►│ 执行到期任务、推进补间
//!   │◄─── Surface 写回（文本/标记/样式）────│
//!   │◄─── Vec<EngineEvent> ────────────────│
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use reveal_runtime::{AnimationController, EngineConfig, Page};
//!
//! let mut page = Page::from_json(&page_json)?;
//! let mut controller = AnimationController::try_new(EngineConfig::load("reveal.json"))?;
//! controller.discover(&mut page);
//!
//! loop {
//!     for (id, fraction) in host.visibility_changes() {
//!         controller.on_intersection(&mut page, &id, fraction);
//!     }
//!     for event in controller.update(&mut page, 16) {
//!         host.handle(event);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`format`]：展示文本解析与渲染
//! - [`counter`]：固定步数计数
//! - [`visibility`]：可见比例阈值检测
//! - [`dispatcher`]：类别 → 揭示计划
//! - [`controller`]：控制器（注册表、帧更新、降级、拆除）
//! - [`scheduler`]：虚拟时钟定时器队列与取消令牌
//! - [`animation`]：补间与缓动
//! - [`surface`] / [`page`]：宿主接口与内存页面
//! - [`notification`] / [`contact`] / [`loading`]：页面外壳功能
//! - [`config`] / [`error`]：配置与错误类型

pub mod animation;
pub mod config;
pub mod contact;
pub mod controller;
pub mod counter;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod loading;
pub mod notification;
pub mod page;
pub mod scheduler;
pub mod surface;
pub mod visibility;

// 重导出核心类型
pub use animation::{EasingFunction, Tween, TweenState};
pub use config::{ConfigError, EngineConfig};
pub use contact::{ContactForm, FormBackend, Submission, submit_contact_form};
pub use controller::{AnimationController, EngineEvent, ObservedTarget, TargetPhase};
pub use counter::CounterRun;
pub use dispatcher::{Action, AnimationDispatcher, DispatchPlan};
pub use error::{
    EngineError, EngineResult, FormError, FormField, FormatError, SubmitError, SurfaceError,
};
pub use format::{DisplayValue, SuffixPattern};
pub use notification::{Notification, NotificationCenter, Severity};
pub use page::{Page, PageDocument, PageElement};
pub use scheduler::{CancelToken, TimerQueue};
pub use surface::{
    CardKind, Category, ChartKind, ChildRole, ElementId, Marker, Motion, MotionName,
    StyleProperty, Surface,
};
pub use visibility::{TriggerOptions, VisibilityTrigger};
