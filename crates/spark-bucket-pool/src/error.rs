//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义缓冲池对外暴露的错误语义：构造期的配置错误与调用期的参数错误；
//! - 容量不足导致的拒收属于正常结果，由 [`ReturnOutcome`](crate::ReturnOutcome) 表达，不在此处建模。
//!
//! ## 设计要求（What）
//! - 所有变体派生 `thiserror::Error`，可直接交给 `anyhow`/`eyre` 等上层框架；
//! - 每个变体对应一个 `<域>.<语义>` 形式的稳定错误码，见 [`codes`]；
//! - 错误只影响当次调用，池状态保持一致，调用方可修正参数后重试。

use std::borrow::Cow;

use thiserror::Error;

/// 缓冲池操作的结果别名，默认错误类型为 [`PoolError`]。
pub type Result<T, E = PoolError> = core::result::Result<T, E>;

/// 稳定错误码，供日志、指标与告警做精确分类。
pub mod codes {
    /// 构造参数非法，仅在创建池或解析配置时出现。
    pub const CONFIGURATION: &str = "pool.configuration";
    /// 调用参数非法：租借长度为 0 或溢出，或归还的缓冲不是池内尺寸类。
    pub const INVALID_ARGUMENT: &str = "pool.invalid_argument";
}

/// 缓冲池错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“池本身无法建立”与“单次调用参数有误”两类故障，
///   前者在启动期致命，后者仅作用于当次调用。
/// - **契约 (What)**：
///   - 所有变体满足 `Send + Sync + 'static`，可跨线程传播；
///   - `field`/`argument` 为出错参数的稳定名称，`reason` 为人类可读描述；
///   - [`PoolError::code`] 返回 [`codes`] 中的稳定码值。
/// - **设计权衡 (Trade-offs)**：`reason` 使用 `Cow<'static, str>`，静态描述零分配，
///   需要拼接长度等上下文时再分配。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum PoolError {
    /// 构造参数非法，例如 `max_pool_bytes == 0` 或 TOML 无法解析。
    #[error("invalid pool configuration `{field}`: {reason}")]
    Configuration {
        field: &'static str,
        reason: Cow<'static, str>,
    },

    /// 调用参数非法。
    ///
    /// - `rent`：请求长度为 0，或不存在能容纳该长度的 2 的幂；
    /// - `give_back`：缓冲长度为 0 或不是 2 的幂，说明它并非来自本池的 `rent`。
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: Cow<'static, str>,
    },
}

impl PoolError {
    pub(crate) fn configuration(field: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(
        argument: &'static str,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            PoolError::Configuration { .. } => codes::CONFIGURATION,
            PoolError::InvalidArgument { .. } => codes::INVALID_ARGUMENT,
        }
    }

    /// 是否为构造期配置错误。
    pub fn is_configuration(&self) -> bool {
        matches!(self, PoolError::Configuration { .. })
    }

    /// 是否为调用期参数错误。
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PoolError::InvalidArgument { .. })
    }
}
