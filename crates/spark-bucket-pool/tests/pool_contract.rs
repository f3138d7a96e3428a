//! `pool_contract` 集成测试：以外部 crate 视角验证 `BucketPool` 的租借、归还与统计契约。
//!
//! # 结构安排（How）
//! - 两个固定场景对应文档中的典型调用序列；
//! - 其余测试覆盖清零策略、非法参数、容量封顶与配置加载等边界。

use spark_bucket_pool::{
    BucketPool, BucketPoolConfig, PoolError, PooledBuf, ReturnOutcome, error::codes,
};

/// 场景一：租借、归还、再租借命中同一尺寸类。
///
/// # 步骤说明（How）
/// 1. `New(1024)` 后 `Rent(100)` 得到 128 字节缓冲，未命中计数为 1；
/// 2. 归还后保留 128 字节；
/// 3. 再次 `Rent(100)` 命中 128 桶，保留字节回到 0。
#[test]
fn rent_return_rent_reuses_bucket() {
    let pool = BucketPool::new(1024).expect("合法上限");

    let buf = pool.rent(100).expect("首次租借");
    assert_eq!(buf.len(), 128);
    let stats = pool.stats();
    assert_eq!((stats.rents, stats.misses, stats.hits), (1, 1, 0));

    assert!(matches!(pool.give_back(buf), Ok(ReturnOutcome::Accepted)));
    assert_eq!(pool.retained_bytes(), 128);

    let again = pool.rent(100).expect("再次租借");
    assert_eq!(again.len(), 128);
    let stats = pool.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.retained_bytes, 0);
}

/// 场景二：上限只容得下一块缓冲时，两块同时在外的缓冲先后归还，第二块被拒收。
#[test]
fn second_return_is_rejected_when_cap_holds_one_buffer() {
    let pool = BucketPool::new(128).expect("合法上限");
    let first = pool.rent(128).expect("第一块");
    let second = pool.rent(128).expect("第二块");

    assert!(pool.give_back(first).expect("合法缓冲").is_accepted());
    assert_eq!(pool.retained_bytes(), 128);

    match pool.give_back(second).expect("合法缓冲") {
        ReturnOutcome::Rejected { buffer } => assert_eq!(buffer.len(), 128),
        ReturnOutcome::Accepted => panic!("超过上限的归还必须被拒收"),
    }
    let stats = pool.stats();
    assert_eq!(stats.retained_bytes, 128, "拒收不改变保留字节数");
    assert_eq!(stats.returns, 1);
    assert_eq!(stats.rejected_returns, 1);
}

/// 一旦池满，后续归还持续被拒收且保留字节数不变。
#[test]
fn full_pool_keeps_rejecting() {
    let pool = BucketPool::new(256).expect("合法上限");
    let outstanding: Vec<_> = (0..6).map(|_| pool.rent(128).expect("租借")).collect();

    let outcomes: Vec<_> = outstanding
        .into_iter()
        .map(|buf| pool.give_back(buf).expect("合法缓冲"))
        .collect();
    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    assert_eq!(accepted, 2, "256 字节上限只能容纳两块 128 字节缓冲");
    assert_eq!(pool.retained_bytes(), 256);
    assert_eq!(pool.stats().rejected_returns, 4);
}

/// 开启清零策略时，写脏后归还再租出的缓冲每个字节都为 0。
#[test]
fn clear_on_return_zeroes_reused_buffer() {
    let pool = BucketPool::new(1024).expect("合法上限");
    assert!(pool.clear_on_return(), "默认开启清零");

    let mut buf = pool.rent(64).expect("租借");
    buf.fill(0xAA);
    assert!(pool.give_back(buf).expect("合法缓冲").is_accepted());

    let reused = pool.rent(64).expect("命中");
    assert_eq!(pool.stats().hits, 1);
    assert!(reused.iter().all(|b| *b == 0), "复用缓冲不得残留上一位持有者的数据");
}

/// 关闭清零策略时，复用缓冲保留原内容。
#[test]
fn disabled_clearing_keeps_previous_contents() {
    let config = BucketPoolConfig::new(1024).with_clear_on_return(false);
    let pool = BucketPool::with_config(config).expect("合法配置");

    let mut buf = pool.rent(16).expect("租借");
    buf.fill(0x5A);
    assert!(pool.give_back(buf).expect("合法缓冲").is_accepted());

    let reused = pool.rent(16).expect("命中");
    assert!(reused.iter().all(|b| *b == 0x5A));
}

/// 较小的请求只要落在同一尺寸类，就能复用已归还的缓冲。
#[test]
fn smaller_request_in_same_class_is_a_hit() {
    let pool = BucketPool::new(4096).expect("合法上限");
    let buf = pool.rent(1000).expect("租借");
    assert_eq!(buf.len(), 1024);
    assert!(pool.give_back(buf).expect("合法缓冲").is_accepted());

    let reused = pool.rent(513).expect("同属 1024 尺寸类");
    assert_eq!(reused.len(), 1024);
    assert_eq!(pool.stats().hits, 1);

    let other = pool.rent(512).expect("512 尺寸类为空");
    assert_eq!(other.len(), 512);
    assert_eq!(pool.stats().misses, 2);
}

#[test]
fn zero_sized_rent_is_invalid_argument() {
    let pool = BucketPool::new(1024).expect("合法上限");
    let err = pool.rent(0).expect_err("长度 0 非法");
    assert_eq!(err.code(), codes::INVALID_ARGUMENT);
    assert!(matches!(
        err,
        PoolError::InvalidArgument {
            argument: "requested_size",
            ..
        }
    ));
    assert_eq!(pool.stats().rents, 0, "失败的租借不计数");
}

#[test]
fn unrepresentable_rent_is_invalid_argument() {
    let pool = BucketPool::new(1024).expect("合法上限");
    let err = pool.rent(usize::MAX).expect_err("不存在可表示的尺寸类");
    assert!(err.is_invalid_argument());
}

/// 尺寸类能用 `usize` 表示但超出单次分配上限（`isize::MAX`）时同样是非法参数，而不是分配失败。
#[test]
fn unallocatable_rent_is_invalid_argument() {
    let pool = BucketPool::new(1024).expect("合法上限");
    let err = pool.rent((1usize << 62) + 1).expect_err("尺寸类超过可分配上限");
    assert!(err.is_invalid_argument());
    assert_eq!(pool.stats().rents, 0);
}

/// 非池化缓冲（长度不是 2 的幂或为空）被拒绝，且不影响池状态。
#[test]
fn foreign_buffers_are_invalid_and_leave_pool_untouched() {
    let pool = BucketPool::new(1024).expect("合法上限");
    let kept = pool.rent(64).expect("租借");
    assert!(pool.give_back(kept).expect("合法缓冲").is_accepted());

    for foreign in [PooledBuf::from(vec![1u8; 100]), PooledBuf::from(Vec::new())] {
        let err = pool.give_back(foreign).expect_err("非池化缓冲");
        assert_eq!(err.code(), codes::INVALID_ARGUMENT);
    }

    let stats = pool.stats();
    assert_eq!(stats.retained_bytes, 64);
    assert_eq!(stats.invalid_returns, 2);
    assert_eq!(stats.rejected_returns, 2);
    assert_eq!(stats.returns, 1);
}

/// 长度恰为 2 的幂的外部缓冲与池化缓冲无法区分，按尺寸类接收。
#[test]
fn power_of_two_external_buffer_is_accepted() {
    let pool = BucketPool::new(1024).expect("合法上限");
    let external = PooledBuf::from(bytes::BytesMut::zeroed(256));
    assert!(pool.give_back(external).expect("长度合法").is_accepted());
    assert_eq!(pool.available(256), 1);
}

/// 容量大于长度的缓冲会让池实际持有的内存超出上限，归还时按非法缓冲处理。
#[test]
fn shrunk_oversized_buffer_is_invalid() {
    let pool = BucketPool::new(128).expect("合法上限");
    let mut oversized = bytes::BytesMut::with_capacity(1 << 20);
    oversized.resize(64, 0);
    let buf = PooledBuf::from(oversized);
    assert_eq!(buf.len(), 64);

    let err = pool.give_back(buf).expect_err("容量与长度不符");
    assert_eq!(err.code(), codes::INVALID_ARGUMENT);

    let stats = pool.stats();
    assert_eq!(stats.retained_bytes, 0);
    assert_eq!(stats.invalid_returns, 1);
    assert_eq!(stats.returns, 0);
    assert_eq!(pool.available(64), 0);
}

#[test]
fn zero_capacity_pool_cannot_be_built() {
    let err = BucketPool::new(0).err().expect("上限为 0 必须失败");
    assert_eq!(err.code(), codes::CONFIGURATION);
}

#[test]
fn pool_from_toml_config() {
    let config = BucketPoolConfig::from_toml_str("max_pool_bytes = 2048\nclear_on_return = false")
        .expect("合法配置");
    let pool = BucketPool::with_config(config).expect("合法配置");
    assert_eq!(pool.max_pool_bytes(), 2048);
    assert!(!pool.clear_on_return());
}

/// 克隆共享同一个池，而不是复制出独立的池。
#[test]
fn clones_share_state() {
    let pool = BucketPool::new(1024).expect("合法上限");
    let handle = pool.clone();
    let buf = handle.rent(32).expect("租借");
    assert!(pool.give_back(buf).expect("合法缓冲").is_accepted());
    assert_eq!(handle.retained_bytes(), 32);
    assert_eq!(handle.stats(), pool.stats());
}

/// 统计快照中的桶明细与保留字节数一致。
#[test]
fn stats_buckets_sum_to_retained_bytes() {
    let pool = BucketPool::new(8192).expect("合法上限");
    let bufs: Vec<_> = [3, 17, 17, 300, 4000]
        .into_iter()
        .map(|size| pool.rent(size).expect("租借"))
        .collect();
    for buf in bufs {
        assert!(pool.give_back(buf).expect("合法缓冲").is_accepted());
    }

    let stats = pool.stats();
    let summed: usize = stats
        .buckets
        .iter()
        .map(|bucket| bucket.size_class * bucket.available)
        .sum();
    assert_eq!(summed, stats.retained_bytes);
    assert_eq!(stats.retained_buffers, 5);
    assert_eq!(
        stats.buckets.iter().map(|b| b.size_class).collect::<Vec<_>>(),
        vec![4, 32, 512, 4096]
    );
    assert_eq!(stats.bucket(32).map(|b| b.available), Some(2));
}
