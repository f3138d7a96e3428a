//! 缓冲池统计。
//!
//! # 设计概要（How）
//! - [`PoolMetrics`] 以原子计数记录租借、命中、未命中、归还与拒收，写入路径全部 `Relaxed`，
//!   不参与任何同步；
//! - [`PoolStats`] 是某一时刻的只读快照，由 [`BucketPool::stats`](crate::BucketPool::stats) 组装。
//!
//! # 契约说明（What）
//! - `rents == hits + misses` 在静止状态下恒成立；
//! - `rejected_returns` 同时包含容量拒收与非法缓冲，`invalid_returns` 为其中非法缓冲的子集；
//! - 并发修改期间读取的快照各字段之间可能存在瞬时偏差，但每个字段自身单调或受上限约束。

use crate::sync::{AtomicU64, Ordering};

pub(crate) struct PoolMetrics {
    rents: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    rejected_returns: AtomicU64,
    invalid_returns: AtomicU64,
}

impl PoolMetrics {
    pub(crate) fn new() -> Self {
        Self {
            rents: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            rejected_returns: AtomicU64::new(0),
            invalid_returns: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_hit(&self) {
        self.rents.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.rents.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_return(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected_returns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid(&self) {
        self.rejected_returns.fetch_add(1, Ordering::Relaxed);
        self.invalid_returns.fetch_add(1, Ordering::Relaxed);
    }

    /// 将计数器写入快照，其余字段由调用方填充。
    pub(crate) fn fill(&self, stats: &mut PoolStats) {
        stats.rents = self.rents.load(Ordering::Relaxed);
        stats.hits = self.hits.load(Ordering::Relaxed);
        stats.misses = self.misses.load(Ordering::Relaxed);
        stats.returns = self.returns.load(Ordering::Relaxed);
        stats.rejected_returns = self.rejected_returns.load(Ordering::Relaxed);
        stats.invalid_returns = self.invalid_returns.load(Ordering::Relaxed);
    }
}

/// 单个尺寸类的可用缓冲数量。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketStats {
    pub size_class: usize,
    pub available: usize,
}

/// 缓冲池统计快照。
///
/// `buckets` 只列出非空桶，按尺寸类升序排列。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 成功的租借次数。
    pub rents: u64,
    /// 由桶内缓冲满足的租借。
    pub hits: u64,
    /// 需要新分配的租借。
    pub misses: u64,
    /// 被接收入桶的归还。
    pub returns: u64,
    /// 被拒收的归还（容量不足或非法缓冲）。
    pub rejected_returns: u64,
    /// 因缓冲非法而被拒收的归还。
    pub invalid_returns: u64,
    /// 当前保留在各桶中的总字节数。
    pub retained_bytes: usize,
    /// 当前保留在各桶中的缓冲个数。
    pub retained_buffers: usize,
    /// 构造时给定的容量上限。
    pub max_pool_bytes: usize,
    pub buckets: Vec<BucketStats>,
}

impl PoolStats {
    /// 命中率（0.0 ~ 1.0），尚无租借时为 0。
    pub fn hit_rate(&self) -> f64 {
        if self.rents == 0 {
            return 0.0;
        }
        self.hits as f64 / self.rents as f64
    }

    /// 保留字节数占上限的比例（0.0 ~ 1.0）。
    pub fn utilization(&self) -> f64 {
        if self.max_pool_bytes == 0 {
            return 0.0;
        }
        self.retained_bytes as f64 / self.max_pool_bytes as f64
    }

    /// 查找指定尺寸类的桶统计，桶为空时返回 `None`。
    pub fn bucket(&self, size_class: usize) -> Option<&BucketStats> {
        self.buckets.iter().find(|bucket| bucket.size_class == size_class)
    }

    /// 单行摘要，便于日志输出。
    pub fn summary(&self) -> String {
        format!(
            "PoolStats {{ rents: {}, hits: {}, misses: {}, returns: {}, rejected: {}, \
             retained: {}/{} bytes in {} buffers, hit_rate: {:.2}% }}",
            self.rents,
            self.hits,
            self.misses,
            self.returns,
            self.rejected_returns,
            self.retained_bytes,
            self.max_pool_bytes,
            self.retained_buffers,
            self.hit_rate() * 100.0
        )
    }
}
