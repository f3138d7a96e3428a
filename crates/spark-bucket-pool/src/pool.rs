use std::sync::Arc;

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::{
    buffer::PooledBuf,
    config::BucketPoolConfig,
    error::{PoolError, Result},
    lease::BufferLease,
    metrics::{BucketStats, PoolMetrics, PoolStats},
    size_class,
    sync::{AtomicUsize, Mutex, Ordering},
};

/// `BucketPool` 按 2 的幂尺寸类复用字节缓冲，并对池内保留的总字节数设置硬上限。
///
/// # 模块角色（Why）
/// - 为需要反复申请同量级缓冲的组件提供复用来源，减少堆分配；
/// - 以显式构造、显式持有的实例替代进程级单例：`Clone` 仅复制内部 `Arc`，
///   同一池可以安全地注入多个消费者，生命周期随最后一个持有者结束。
///
/// # 核心机制（How）
/// - 每个尺寸类对应一个桶，桶内为 `spin::Mutex<Vec<BytesMut>>` 自由链表，不同尺寸类互不竞争；
/// - 共享的 `retained_bytes` 计数器通过 CAS 循环预留容量，预留与入桶都在该桶的锁内完成，
///   出桶与扣减同样如此，因此计数器从不超过 `max_pool_bytes`；
/// - 只为不超过上限的尺寸类建桶，更大的租借总是新分配，其归还总是被拒收。
///
/// # 契约说明（What）
/// - **线程安全**：`Send + Sync`，`rent`/`give_back` 不会等待其它调用方，也不会挂起；
/// - **所有权**：`rent` 返回后池不再引用该缓冲，`give_back` 消耗缓冲，
///   安全代码中不存在“归还后继续使用”的路径；
/// - **拒收**：容量不足不是错误，[`ReturnOutcome::Rejected`] 把缓冲交还调用方丢弃，调用方不应重试。
///
/// # 设计权衡（Trade-offs）
/// - 采用满即拒收而非淘汰旧缓冲：同类缓冲完全等价，没有可依据的淘汰顺序；
/// - 清零发生在锁外，容量预检失败的缓冲不会被清零，竞争中预留失败的缓冲则可能已被清零。
#[derive(Clone)]
pub struct BucketPool {
    inner: Arc<PoolInner>,
}

/// 一次归还的结果。
#[must_use = "被拒收的缓冲需要由调用方丢弃"]
#[derive(Debug)]
pub enum ReturnOutcome {
    /// 缓冲已入桶，可供后续租借复用。
    Accepted,
    /// 接收会超出容量上限，缓冲原样交还调用方。
    Rejected { buffer: PooledBuf },
}

impl ReturnOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReturnOutcome::Accepted)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ReturnOutcome::Rejected { .. })
    }

    /// 取出被拒收的缓冲。
    pub fn into_rejected(self) -> Option<PooledBuf> {
        match self {
            ReturnOutcome::Accepted => None,
            ReturnOutcome::Rejected { buffer } => Some(buffer),
        }
    }
}

impl BucketPool {
    /// 以给定容量上限创建池，归还时默认清零。
    ///
    /// `max_pool_bytes == 0` 时返回 [`PoolError::Configuration`]。
    pub fn new(max_pool_bytes: usize) -> Result<Self> {
        Self::with_config(BucketPoolConfig::new(max_pool_bytes))
    }

    /// 以完整配置创建池。
    pub fn with_config(config: BucketPoolConfig) -> Result<Self> {
        config.validate()?;
        let buckets = (0..size_class::bucket_count(config.max_pool_bytes))
            .map(|index| Bucket::new(1usize << index))
            .collect();
        debug!(
            max_pool_bytes = config.max_pool_bytes,
            clear_on_return = config.clear_on_return,
            "bucket pool created"
        );
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                buckets,
                retained_bytes: AtomicUsize::new(0),
                metrics: PoolMetrics::new(),
            }),
        })
    }

    /// 租借长度至少为 `requested` 的缓冲。
    ///
    /// # 参数与契约
    /// - `requested`：期望的最小长度，必须大于 0；
    /// - **后置条件**：返回缓冲长度为 `requested` 向上取整的 2 的幂；
    /// - **内容**：命中桶时，仅当池启用了 `clear_on_return` 才保证全零；新分配的缓冲总是全零。
    ///
    /// # 实现策略
    /// 1. 计算尺寸类，`requested == 0` 或尺寸类超过 [`MAX_SIZE_CLASS`](size_class::MAX_SIZE_CLASS)
    ///    时返回 [`PoolError::InvalidArgument`]；
    /// 2. 若存在对应桶，在桶锁内弹出一块缓冲并扣减 `retained_bytes`；
    /// 3. 桶为空或尺寸类超出上限时新分配。
    pub fn rent(&self, requested: usize) -> Result<PooledBuf> {
        let size_class = size_class::size_class_for(requested).ok_or_else(|| {
            if requested == 0 {
                PoolError::invalid_argument("requested_size", "must be greater than zero")
            } else {
                PoolError::invalid_argument(
                    "requested_size",
                    format!(
                        "{requested} bytes exceeds the largest allocatable size class ({})",
                        size_class::MAX_SIZE_CLASS
                    ),
                )
            }
        })?;

        if let Some(buffer) = self.inner.take(size_class) {
            self.inner.metrics.record_hit();
            trace!(requested, size_class, "rent served from bucket");
            return Ok(buffer);
        }

        self.inner.metrics.record_miss();
        debug!(requested, size_class, "rent allocated a fresh buffer");
        Ok(PooledBuf::zeroed(size_class))
    }

    /// 归还缓冲。
    ///
    /// # 参数与契约
    /// - `buffer`：应来自本池的 [`rent`](Self::rent)；长度为 0、不是 2 的幂，或底层容量不等于长度时
    ///   返回 [`PoolError::InvalidArgument`]，缓冲随之丢弃，计入 `rejected_returns` 与 `invalid_returns`；
    /// - 接收会使 `retained_bytes` 超过上限时返回 [`ReturnOutcome::Rejected`]；
    /// - 接收时若启用 `clear_on_return`，缓冲在入桶前被整体清零。
    ///
    /// # 实现策略
    /// 1. 校验长度与容量，保留字节数按长度计，容量多出的部分不能绕过上限；
    /// 2. 无对应桶或容量预检失败时直接拒收，不触碰缓冲内容；
    /// 3. 锁外清零；
    /// 4. 桶锁内 CAS 预留容量并入桶，预留失败则拒收。
    pub fn give_back(&self, mut buffer: PooledBuf) -> Result<ReturnOutcome> {
        let len = buffer.len();
        if !size_class::is_size_class(len) {
            self.inner.metrics.record_invalid();
            warn!(len, "rejected a buffer that did not originate from the pool");
            return Err(PoolError::invalid_argument(
                "buffer",
                format!("length {len} is not a power-of-two size class"),
            ));
        }
        let capacity = buffer.capacity();
        if capacity != len {
            self.inner.metrics.record_invalid();
            warn!(len, capacity, "rejected a buffer whose capacity differs from its length");
            return Err(PoolError::invalid_argument(
                "buffer",
                format!("capacity {capacity} does not match size class {len}"),
            ));
        }

        let Some(bucket) = self.inner.bucket(len) else {
            return Ok(self.inner.reject(buffer));
        };
        if !self.inner.has_room_for(len) {
            return Ok(self.inner.reject(buffer));
        }

        if self.inner.config.clear_on_return {
            buffer.zero();
        }

        let mut free = bucket.free.lock();
        if !self.inner.try_reserve(len) {
            drop(free);
            return Ok(self.inner.reject(buffer));
        }
        free.push(buffer.into_inner());
        drop(free);

        self.inner.metrics.record_return();
        trace!(size_class = len, "buffer returned to bucket");
        Ok(ReturnOutcome::Accepted)
    }

    /// 租借一块缓冲并包装为作用域租约，租约 `Drop` 时自动归还。
    pub fn lease(&self, requested: usize) -> Result<BufferLease> {
        let buffer = self.rent(requested)?;
        Ok(BufferLease::new(self.clone(), buffer))
    }

    /// 清空所有桶，返回释放的字节数。调用方持有的缓冲不受影响。
    pub fn trim(&self) -> usize {
        let mut released = 0;
        for bucket in self.inner.buckets.iter() {
            let mut free = bucket.free.lock();
            if free.is_empty() {
                continue;
            }
            let bytes = free.len() * bucket.size_class;
            free.clear();
            self.inner.release(bytes);
            released += bytes;
        }
        debug!(released, "bucket pool trimmed");
        released
    }

    /// 读取统计快照。
    ///
    /// 计数器无锁读取；每个桶的可用数量在该桶锁内读取，不会长时间阻塞租借与归还。
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            max_pool_bytes: self.inner.config.max_pool_bytes,
            ..PoolStats::default()
        };
        self.inner.metrics.fill(&mut stats);
        for bucket in self.inner.buckets.iter() {
            let available = bucket.free.lock().len();
            if available > 0 {
                stats.retained_buffers += available;
                stats.buckets.push(BucketStats {
                    size_class: bucket.size_class,
                    available,
                });
            }
        }
        stats.retained_bytes = self.retained_bytes();
        stats
    }

    /// 当前保留在各桶中的总字节数。
    pub fn retained_bytes(&self) -> usize {
        self.inner.retained_bytes.load(Ordering::Acquire)
    }

    pub fn max_pool_bytes(&self) -> usize {
        self.inner.config.max_pool_bytes
    }

    pub fn clear_on_return(&self) -> bool {
        self.inner.config.clear_on_return
    }

    pub fn config(&self) -> &BucketPoolConfig {
        &self.inner.config
    }

    /// 指定尺寸类当前可用的缓冲数，非尺寸类或无对应桶时为 0。
    pub fn available(&self, size_class: usize) -> usize {
        if !size_class::is_size_class(size_class) {
            return 0;
        }
        self.inner
            .bucket(size_class)
            .map(|bucket| bucket.free.lock().len())
            .unwrap_or_default()
    }
}

struct PoolInner {
    config: BucketPoolConfig,
    buckets: Box<[Bucket]>,
    retained_bytes: AtomicUsize,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn bucket(&self, size_class: usize) -> Option<&Bucket> {
        self.buckets.get(size_class::bucket_index(size_class))
    }

    /// 从桶中弹出一块缓冲，出桶与扣减在同一把桶锁内完成。
    fn take(&self, size_class: usize) -> Option<PooledBuf> {
        let bucket = self.bucket(size_class)?;
        let mut free = bucket.free.lock();
        let bytes = free.pop()?;
        self.release(size_class);
        drop(free);
        debug_assert_eq!(bytes.len(), size_class);
        Some(PooledBuf::from(bytes))
    }

    fn has_room_for(&self, len: usize) -> bool {
        self.retained_bytes
            .load(Ordering::Acquire)
            .checked_add(len)
            .is_some_and(|total| total <= self.config.max_pool_bytes)
    }

    /// CAS 预留 `len` 字节，预留后的总量超过上限时失败且不修改计数器。
    fn try_reserve(&self, len: usize) -> bool {
        let max = self.config.max_pool_bytes;
        let mut current = self.retained_bytes.load(Ordering::Acquire);
        loop {
            let Some(next) = current.checked_add(len).filter(|total| *total <= max) else {
                return false;
            };
            match self.retained_bytes.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, len: usize) {
        self.retained_bytes.fetch_sub(len, Ordering::AcqRel);
    }

    fn reject(&self, buffer: PooledBuf) -> ReturnOutcome {
        self.metrics.record_rejected();
        debug!(
            size_class = buffer.len(),
            retained_bytes = self.retained_bytes.load(Ordering::Relaxed),
            max_pool_bytes = self.config.max_pool_bytes,
            "return rejected: pool at capacity"
        );
        ReturnOutcome::Rejected { buffer }
    }
}

/// 单个尺寸类的自由链表，链表内每块缓冲的长度都等于 `size_class`。
struct Bucket {
    size_class: usize,
    free: Mutex<Vec<BytesMut>>,
}

impl Bucket {
    fn new(size_class: usize) -> Self {
        Self {
            size_class,
            free: Mutex::new(Vec::new()),
        }
    }
}
