//! 尺寸类计算。
//!
//! 尺寸类即 2 的幂字节长度：`1, 2, 4, …`。请求长度向上取整到最近的尺寸类，
//! 以最多 2 倍的内部碎片换取同类缓冲之间的完全可互换。

/// 返回能容纳 `requested` 字节的最小尺寸类。
///
/// `requested == 0` 或不存在可分配的 2 的幂时返回 `None`。单次分配不能超过 `isize::MAX`，
/// 因此最大尺寸类是 `2^(usize::BITS - 2)`。
pub fn size_class_for(requested: usize) -> Option<usize> {
    if requested == 0 {
        return None;
    }
    requested
        .checked_next_power_of_two()
        .filter(|class| *class <= MAX_SIZE_CLASS)
}

/// 可分配的最大尺寸类。
pub const MAX_SIZE_CLASS: usize = (isize::MAX as usize >> 1) + 1;

/// `len` 是否为合法尺寸类，即池可能发出的缓冲长度。
pub fn is_size_class(len: usize) -> bool {
    len.is_power_of_two()
}

/// 尺寸类在桶数组中的下标，即 `log2(size_class)`。
pub(crate) fn bucket_index(size_class: usize) -> usize {
    debug_assert!(is_size_class(size_class));
    size_class.trailing_zeros() as usize
}

/// 上限为 `max_pool_bytes` 时需要的桶数。
///
/// 只有不超过上限的尺寸类才可能被保留，因此桶覆盖 `1 ..= 2^floor(log2(max_pool_bytes))`。
pub(crate) fn bucket_count(max_pool_bytes: usize) -> usize {
    (usize::BITS - max_pool_bytes.leading_zeros()) as usize
}
