//! # Loading 模块
//!
//! 加载进度模拟：每个间隔随机增长一段，封顶 100。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::LoadingSettings;

/// 进度上限（百分比）
pub const FULL_PROGRESS: f64 = 100.0;

/// 加载进度
#[derive(Debug, Clone)]
pub struct LoadingProgress {
    progress: f64,
    max_increment: f64,
    rng: StdRng,
}

impl LoadingProgress {
    /// 按配置创建；未配置种子时使用系统熵
    pub fn new(settings: &LoadingSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            progress: 0.0,
            max_increment: settings.max_increment,
            rng,
        }
    }

    /// 推进一次，返回新的进度
    pub fn tick(&mut self) -> f64 {
        if self.max_increment > 0.0 && !self.is_complete() {
            self.progress += self.rng.gen_range(0.0..self.max_increment);
        }
        self.progress = self.progress.min(FULL_PROGRESS);
        self.progress
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= FULL_PROGRESS
    }

    /// 直接完成（减少动画模式）
    pub fn complete(&mut self) {
        self.progress = FULL_PROGRESS;
    }
}
