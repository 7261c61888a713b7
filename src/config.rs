//! 配置模块
//! Configuration module
//!
//! 提供调度器配置
//! Provides scheduler configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认的全局并发执行上限
/// Default system-wide concurrent execution cap
pub const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 2;

/// 默认的同一租户相邻操作之间的冷却间隔
/// Default cooldown between a tenant's consecutive operations
pub const DEFAULT_OPERATION_COOLDOWN: Duration = Duration::from_secs(1);

/// 默认的优雅关闭超时
/// Default graceful shutdown timeout
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 调度器配置
/// Scheduler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
  /// 全局同时执行的操作数量上限（准入门槽位数）
  /// System-wide cap on simultaneously executing operations (admission gate slots)
  pub max_concurrent_executions: usize,

  /// 每个租户待处理队列的深度上限；`None` 表示不限制
  /// Per-tenant pending queue depth limit; `None` means unbounded
  ///
  /// 超出上限的提交会以容量错误被拒绝，防止失控调用方造成无界内存增长
  /// Submissions past the limit are rejected with a capacity error,
  /// preventing unbounded memory growth from a runaway caller
  pub max_queue_depth_per_tenant: Option<usize>,

  /// 同一租户相邻操作之间的冷却间隔
  /// Cooldown between a tenant's consecutive operations
  pub operation_cooldown: Duration,

  /// 关闭时等待每个工作者结束的超时
  /// Timeout when waiting for each worker to finish during shutdown
  pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      max_concurrent_executions: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
      max_queue_depth_per_tenant: None,
      operation_cooldown: DEFAULT_OPERATION_COOLDOWN,
      shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
    }
  }
}

impl SchedulerConfig {
  /// 创建默认配置
  /// Create the default configuration
  pub fn new() -> Self {
    Self::default()
  }

  /// 设置全局并发执行上限
  /// Set the system-wide concurrent execution cap
  pub fn max_concurrent_executions(mut self, n: usize) -> Self {
    self.max_concurrent_executions = n;
    self
  }

  /// 设置每个租户的队列深度上限
  /// Set the per-tenant queue depth limit
  pub fn max_queue_depth_per_tenant(mut self, limit: usize) -> Self {
    self.max_queue_depth_per_tenant = Some(limit);
    self
  }

  /// 设置操作之间的冷却间隔
  /// Set the cooldown between operations
  pub fn operation_cooldown(mut self, cooldown: Duration) -> Self {
    self.operation_cooldown = cooldown;
    self
  }

  /// 设置关闭超时
  /// Set the shutdown timeout
  pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
    self.shutdown_timeout = timeout;
    self
  }

  /// 校验配置
  /// Validate the configuration
  pub fn validate(&self) -> Result<()> {
    if self.max_concurrent_executions == 0 {
      return Err(Error::config("max_concurrent_executions must be at least 1"));
    }
    if let Some(limit) = self.max_queue_depth_per_tenant {
      if limit == 0 {
        return Err(Error::config("max_queue_depth_per_tenant must be at least 1"));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(
      config.max_concurrent_executions,
      DEFAULT_MAX_CONCURRENT_EXECUTIONS
    );
    assert_eq!(config.max_queue_depth_per_tenant, None);
    assert_eq!(config.operation_cooldown, DEFAULT_OPERATION_COOLDOWN);
  }

  #[test]
  fn test_builder_methods() {
    let config = SchedulerConfig::new()
      .max_concurrent_executions(5)
      .max_queue_depth_per_tenant(100)
      .operation_cooldown(Duration::from_millis(250))
      .shutdown_timeout(Duration::from_secs(10));

    assert_eq!(config.max_concurrent_executions, 5);
    assert_eq!(config.max_queue_depth_per_tenant, Some(100));
    assert_eq!(config.operation_cooldown, Duration::from_millis(250));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_invalid_config_rejected() {
    let config = SchedulerConfig::new().max_concurrent_executions(0);
    assert!(config.validate().is_err());

    let mut config = SchedulerConfig::new();
    config.max_queue_depth_per_tenant = Some(0);
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_config_serialization() {
    let config = SchedulerConfig::new().max_queue_depth_per_tenant(50);
    let json = serde_json::to_string(&config).unwrap();
    let back: SchedulerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.max_queue_depth_per_tenant, Some(50));
    assert_eq!(back.max_concurrent_executions, config.max_concurrent_executions);
  }
}
