use core::{
    fmt,
    ops::{Deref, DerefMut},
};

use bytes::{Bytes, BytesMut};

/// `PooledBuf` 是缓冲池发出与回收的定长字节缓冲。
///
/// # 角色定位（Why）
/// - 池的桶按长度划分，若持有者能随意增删长度，归还时便无法判定其尺寸类；
///   因此句柄只暴露 `[u8]` 视图，长度自创建起固定不变。
/// - 内部以 `bytes::BytesMut` 存储，需要零拷贝下发时可通过 [`freeze`](Self::freeze)
///   转为只读 `Bytes`，此时缓冲脱离池的管理。
///
/// # 契约说明（What）
/// - `rent` 返回的句柄长度总是 2 的幂；
/// - 通过 `From<BytesMut>`/`From<Vec<u8>>` 构造的外部缓冲也可以交给
///   [`BucketPool::give_back`](crate::BucketPool::give_back)，长度不是 2 的幂或容量大于长度时会被拒绝；
/// - 句柄在 `rent` 与 `give_back` 之间由调用方独占，池不保留任何引用。
pub struct PooledBuf {
    bytes: BytesMut,
}

impl PooledBuf {
    /// 分配 `len` 字节并全部置零。
    pub(crate) fn zeroed(len: usize) -> Self {
        Self {
            bytes: BytesMut::zeroed(len),
        }
    }

    /// 空句柄，不持有堆内存。
    pub(crate) fn empty() -> Self {
        Self {
            bytes: BytesMut::new(),
        }
    }

    /// 缓冲长度，对池发出的缓冲即其尺寸类。
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 底层分配的容量。池发出的缓冲容量总是等于长度。
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// 将全部字节覆写为 0。
    pub fn zero(&mut self) {
        self.bytes.fill(0);
    }

    /// 取出底层 `BytesMut`，缓冲从此不再受长度约束。
    pub fn into_inner(self) -> BytesMut {
        self.bytes
    }

    /// 冻结为只读 `Bytes`，用于零拷贝下发。
    pub fn freeze(self) -> Bytes {
        self.bytes.freeze()
    }
}

impl Deref for PooledBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl AsRef<[u8]> for PooledBuf {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsMut<[u8]> for PooledBuf {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl From<BytesMut> for PooledBuf {
    fn from(bytes: BytesMut) -> Self {
        Self { bytes }
    }
}

// 新建的 `Bytes` 独占分配，`try_into_mut` 直接接管 `Vec` 的内存，不复制内容。
impl From<Vec<u8>> for PooledBuf {
    fn from(bytes: Vec<u8>) -> Self {
        let bytes = Bytes::from(bytes)
            .try_into_mut()
            .unwrap_or_else(|shared| BytesMut::from(&shared[..]));
        Self { bytes }
    }
}

// 只打印长度：缓冲可能承载上一位持有者的业务数据。
impl fmt::Debug for PooledBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuf").field("len", &self.len()).finish()
    }
}
