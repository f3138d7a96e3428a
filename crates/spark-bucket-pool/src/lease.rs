use core::{
    fmt, mem,
    ops::{Deref, DerefMut},
};

use tracing::{trace, warn};

use crate::{BucketPool, PooledBuf, ReturnOutcome};

/// `BufferLease` 是作用域化的租借：创建时租出缓冲，`Drop` 时自动归还。
///
/// # 角色定位（Why）
/// - 显式 `rent`/`give_back` 需要调用方在每条退出路径（含 `?` 提前返回与 panic 展开）上记得归还；
///   租约把归还绑定到值的生命周期，覆盖所有路径。
///
/// # 契约说明（What）
/// - 通过 [`BucketPool::lease`] 创建，持有池的一份克隆，因此可以跨线程移动并比调用点活得更久；
/// - 解引用为定长 `[u8]`，不能改变长度；
/// - [`detach`](Self::detach) 取回缓冲的所有权，之后租约不再自动归还；
/// - `Drop` 中的归还若被拒收，缓冲直接释放；归还结果不会以 panic 形式暴露。
pub struct BufferLease {
    pool: BucketPool,
    buffer: PooledBuf,
}

impl BufferLease {
    pub(crate) fn new(pool: BucketPool, buffer: PooledBuf) -> Self {
        Self { pool, buffer }
    }

    /// 缓冲长度，即租借时的尺寸类。
    pub fn size_class(&self) -> usize {
        self.buffer.len()
    }

    /// 结束租约并取回缓冲，由调用方自行归还或丢弃。
    pub fn detach(mut self) -> PooledBuf {
        mem::replace(&mut self.buffer, PooledBuf::empty())
    }
}

impl Deref for BufferLease {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buffer
    }
}

impl DerefMut for BufferLease {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}

impl fmt::Debug for BufferLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferLease")
            .field("size_class", &self.size_class())
            .finish()
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        // detach 之后只剩空句柄。
        if self.buffer.is_empty() {
            return;
        }
        let buffer = mem::replace(&mut self.buffer, PooledBuf::empty());
        match self.pool.give_back(buffer) {
            Ok(ReturnOutcome::Accepted) => {}
            Ok(ReturnOutcome::Rejected { buffer }) => {
                trace!(size_class = buffer.len(), "lease dropped its buffer");
            }
            Err(err) => warn!(code = err.code(), %err, "lease failed to return buffer"),
        }
    }
}
