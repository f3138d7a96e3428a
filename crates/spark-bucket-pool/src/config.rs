//! 缓冲池配置。
//!
//! # 契约说明（What）
//! - 所有选项在构造时一次性给定，池创建后不可修改；
//! - 既可通过 [`BucketPoolConfig::new`] 与 `with_*` 方法在代码中组装，
//!   也可通过 [`BucketPoolConfig::from_toml_str`] 从 TOML 片段加载；
//! - 非法值统一以 [`PoolError::Configuration`] 报告。
//!
//! ```toml
//! max_pool_bytes = 67108864
//! clear_on_return = true
//! ```

use serde::Deserialize;

use crate::error::{PoolError, Result};

/// 未显式指定时的默认容量上限（64 MiB）。
pub const DEFAULT_MAX_POOL_BYTES: usize = 64 * 1024 * 1024;

/// 缓冲池配置。
///
/// # 字段语义
/// - `max_pool_bytes`：所有桶合计保留字节数的硬上限，必须大于 0；
/// - `clear_on_return`：归还时是否先将缓冲全部清零再入桶，默认开启，
///   防止上一位持有者的数据经由复用泄露给下一位。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketPoolConfig {
    pub max_pool_bytes: usize,
    #[serde(default = "default_clear_on_return")]
    pub clear_on_return: bool,
}

fn default_clear_on_return() -> bool {
    true
}

impl Default for BucketPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POOL_BYTES)
    }
}

impl BucketPoolConfig {
    /// 以给定上限创建配置，`clear_on_return` 取默认值 `true`。
    pub fn new(max_pool_bytes: usize) -> Self {
        Self {
            max_pool_bytes,
            clear_on_return: default_clear_on_return(),
        }
    }

    /// 设置容量上限。
    pub fn with_max_pool_bytes(mut self, max_pool_bytes: usize) -> Self {
        self.max_pool_bytes = max_pool_bytes;
        self
    }

    /// 设置归还清零策略。
    pub fn with_clear_on_return(mut self, clear_on_return: bool) -> Self {
        self.clear_on_return = clear_on_return;
        self
    }

    /// 校验配置。
    ///
    /// # 契约定义（What）
    /// - `max_pool_bytes == 0` 时返回 [`PoolError::Configuration`]；
    /// - 其余组合均合法，`clear_on_return` 无约束。
    pub fn validate(&self) -> Result<()> {
        if self.max_pool_bytes == 0 {
            return Err(PoolError::configuration(
                "max_pool_bytes",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// 从 TOML 文本解析并校验配置。
    ///
    /// # 执行步骤（How）
    /// 1. 使用 `toml` + `serde` 反序列化，拒绝未知字段，负数或非整数在此步失败；
    /// 2. 调用 [`validate`](Self::validate) 检查取值范围。
    ///
    /// 两步的失败都映射为 `field = "toml"` 或具体字段名的 [`PoolError::Configuration`]。
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|err| PoolError::configuration("toml", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
