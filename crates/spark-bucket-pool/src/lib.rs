//! `spark-bucket-pool` 提供按 2 的幂分桶、总保留字节数封顶的并发缓冲池。
//!
//! # 模块定位（Why）
//! - 为需要反复申请同量级字节缓冲的组件（编解码、批量 IO、临时拼包）提供统一的复用来源，
//!   在不引入全局单例的前提下削减堆分配次数。
//! - 池在插入路径上强制执行 `max_pool_bytes` 上限：归还时若会越界则直接拒收，
//!   池内保留的字节数在任何时刻都不会超过该值。
//!
//! # 设计概要（How）
//! - [`size_class`]：将请求长度向上取整到 2 的幂，并映射到桶下标；
//! - [`buffer`]：[`PooledBuf`] 是基于 `bytes::BytesMut` 的定长缓冲句柄，长度在生命周期内不变；
//! - [`pool`]：[`BucketPool`] 为每个尺寸类维护独立的 `spin::Mutex` 自由链表，
//!   共享的保留字节计数通过 CAS 预留，桶锁内与出入桶动作一起完成；
//! - [`lease`]：[`BufferLease`] 在 `Drop` 时自动归还，覆盖所有退出路径；
//! - [`metrics`]：原子计数器与 [`PoolStats`] 快照；
//! - [`config`]：[`BucketPoolConfig`] 支持代码构造与 TOML 反序列化；
//! - [`error`]：基于 `thiserror` 的 [`PoolError`]，附带稳定错误码。
//!
//! # 契约说明（What）
//! - `rent(n)` 返回长度为 `n` 向上取整到 2 的幂的缓冲，命中桶时复用，否则新分配；
//! - `give_back(buf)` 只接受长度为 2 的幂的缓冲，容量不足时以 [`ReturnOutcome::Rejected`]
//!   把缓冲交还调用方丢弃，这不被视为错误；
//! - 两个方法都不会阻塞等待其它调用方，临界区仅覆盖单个桶的 `Vec` 进出。
//!
//! ```rust
//! use spark_bucket_pool::{BucketPool, ReturnOutcome};
//!
//! let pool = BucketPool::new(1024).expect("合法的容量上限");
//! let buf = pool.rent(100).expect("合法的请求长度");
//! assert_eq!(buf.len(), 128);
//! assert!(matches!(pool.give_back(buf), Ok(ReturnOutcome::Accepted)));
//! assert_eq!(pool.retained_bytes(), 128);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod lease;
pub mod metrics;
pub mod pool;
pub mod size_class;

mod sync;

pub use buffer::PooledBuf;
pub use config::BucketPoolConfig;
pub use error::{PoolError, Result};
pub use lease::BufferLease;
pub use metrics::{BucketStats, PoolStats};
pub use pool::{BucketPool, ReturnOutcome};
