//! # Scheduler 模块
//!
//! 单线程协作式定时器队列。
//!
//! ## 设计说明
//!
//! - 时间是虚拟的：由宿主通过 `advance_to` 推进，队列本身不读系统时钟
//! - 同一时刻到期的任务按调度顺序执行（FIFO）
//! - 每个任务携带一个 [`CancelToken`]，执行前检查，已取消的任务直接丢弃
//!
//! 取消令牌是分层的：父令牌取消后，所有子令牌同时视为已取消。

use std::cell::Cell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct TokenNode {
    cancelled: Cell<bool>,
    parent: Option<CancelToken>,
}

/// 取消令牌
///
/// 克隆共享同一个状态。
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<TokenNode>);

impl CancelToken {
    /// 创建新的根令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建子令牌（父令牌取消时子令牌也视为取消）
    pub fn child(&self) -> Self {
        Self(Rc::new(TokenNode {
            cancelled: Cell::new(false),
            parent: Some(self.clone()),
        }))
    }

    /// 取消
    pub fn cancel(&self) {
        self.0.cancelled.set(true);
    }

    /// 是否已取消（包括祖先令牌）
    pub fn is_cancelled(&self) -> bool {
        if self.0.cancelled.get() {
            return true;
        }
        match &self.0.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }
}

/// 队列中的一个条目
struct Entry<T> {
    due_ms: u64,
    seq: u64,
    token: CancelToken,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// 定时器队列
pub struct TimerQueue<T> {
    now_ms: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TimerQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now_ms", &self.now_ms)
            .field("entries", &self.heap.len())
            .finish()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// 当前虚拟时间（毫秒）
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// 在 `delay_ms` 之后调度任务
    pub fn schedule(&mut self, delay_ms: u64, token: &CancelToken, task: T) {
        let entry = Entry {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            token: token.clone(),
            task,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// 弹出下一个在 `until_ms` 之前到期且未取消的任务
    ///
    /// 弹出时虚拟时间推进到该任务的到期时间。
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(CancelToken, T)> {
        loop {
            let due = self.heap.peek().map(|Reverse(entry)| entry.due_ms)?;
            if due > until_ms {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if entry.token.is_cancelled() {
                continue;
            }
            self.now_ms = self.now_ms.max(entry.due_ms);
            return Some((entry.token, entry.task));
        }
    }

    /// 推进虚拟时间（不执行任务）
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// 是否存在满足条件且未取消的待执行任务
    pub fn has_pending(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.heap
            .iter()
            .any(|Reverse(entry)| !entry.token.is_cancelled() && predicate(&entry.task))
    }

    /// 未取消的待执行任务数量
    pub fn pending_count(&self) -> usize {
        self.heap
            .iter()
            .filter(|Reverse(entry)| !entry.token.is_cancelled())
            .count()
    }

    /// 取出全部未取消任务（按到期顺序），不推进时间
    pub fn drain_pending(&mut self) -> Vec<(CancelToken, T)> {
        let mut entries: Vec<Entry<T>> = std::mem::take(&mut self.heap)
            .into_iter()
            .map(|Reverse(entry)| entry)
            .filter(|entry| !entry.token.is_cancelled())
            .collect();
        entries.sort();
        entries
            .into_iter()
            .map(|entry| (entry.token, entry.task))
            .collect()
    }

    /// 清空队列
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_hierarchy() {
        let parent = CancelToken::new();
        let child = parent.child();
        let sibling = parent.child();

        assert!(!child.is_cancelled());
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!sibling.is_cancelled());
        assert!(!parent.is_cancelled());

        parent.cancel();
        assert!(sibling.is_cancelled());
    }

    #[test]
    fn test_fifo_for_same_due_time() {
        let mut queue = TimerQueue::new();
        let token = CancelToken::new();
        queue.schedule(100, &token, "a");
        queue.schedule(100, &token, "b");
        queue.schedule(50, &token, "c");

        let order: Vec<&str> = std::iter::from_fn(|| queue.pop_due(1000).map(|(_, t)| t)).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(queue.now(), 100);
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let mut queue = TimerQueue::new();
        let token = CancelToken::new();
        queue.schedule(30, &token, 1);
        queue.schedule(60, &token, 2);

        assert_eq!(queue.pop_due(40).map(|(_, t)| t), Some(1));
        assert_eq!(queue.pop_due(40).map(|(_, t)| t), None);
        queue.advance_to(40);
        assert_eq!(queue.now(), 40);
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn test_cancelled_tasks_are_skipped() {
        let mut queue = TimerQueue::new();
        let keep = CancelToken::new();
        let discard = CancelToken::new();
        queue.schedule(10, &discard, "dropped");
        queue.schedule(20, &keep, "kept");
        discard.cancel();

        assert!(!queue.has_pending(|t| *t == "dropped"));
        assert_eq!(queue.pop_due(100).map(|(_, t)| t), Some("kept"));
        assert!(queue.pop_due(100).is_none());
    }

    #[test]
    fn test_drain_pending_in_order() {
        let mut queue = TimerQueue::new();
        let token = CancelToken::new();
        queue.schedule(300, &token, 3);
        queue.schedule(100, &token, 1);
        queue.schedule(200, &token, 2);

        let drained: Vec<i32> = queue.drain_pending().into_iter().map(|(_, t)| t).collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.now(), 0);
    }
}
