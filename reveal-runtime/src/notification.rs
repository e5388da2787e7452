//! # Notification 模块
//!
//! 短暂提示消息：按严重程度区分，到时自动消失，结束前淡出。

use serde::Serialize;

use crate::config::NotificationSettings;

/// 提示严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 成功
    Success,
    /// 错误
    Error,
    /// 普通信息
    Info,
}

/// 单条提示
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    /// 剩余显示时间（毫秒）
    pub remaining_ms: f64,
    /// 淡出进度 (0.0 - 1.0)
    pub fade_progress: f64,
}

impl Notification {
    /// 更新状态，返回是否应该移除
    fn update(&mut self, dt_ms: f64, fade_ms: f64) -> bool {
        self.remaining_ms -= dt_ms;

        if fade_ms > 0.0 && self.remaining_ms <= fade_ms {
            self.fade_progress = 1.0 - (self.remaining_ms / fade_ms).max(0.0);
        }

        self.remaining_ms <= 0.0
    }
}

/// 提示管理器
#[derive(Debug)]
pub struct NotificationCenter {
    active: Vec<Notification>,
    next_id: u64,
    duration_ms: f64,
    fade_ms: f64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(&NotificationSettings::default())
    }
}

impl NotificationCenter {
    pub fn new(settings: &NotificationSettings) -> Self {
        Self {
            active: Vec::new(),
            next_id: 1,
            duration_ms: settings.duration_ms as f64,
            fade_ms: settings.fade_ms as f64,
        }
    }

    /// 显示普通消息
    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Info)
    }

    /// 显示成功消息
    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Success)
    }

    /// 显示错误消息
    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Error)
    }

    /// 显示消息，返回其 id
    pub fn show(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Notification {
            id,
            message: message.into(),
            severity,
            remaining_ms: self.duration_ms,
            fade_progress: 0.0,
        });
        id
    }

    /// 推进时间，返回本次被移除的提示 id
    pub fn update(&mut self, dt_ms: f64) -> Vec<u64> {
        let fade_ms = self.fade_ms;
        let mut dismissed = Vec::new();
        self.active.retain_mut(|notification| {
            if notification.update(dt_ms, fade_ms) {
                dismissed.push(notification.id);
                false
            } else {
                true
            }
        });
        dismissed
    }

    /// 当前显示中的提示
    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    pub fn has_notifications(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
