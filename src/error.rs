//! 错误处理模块
//! Error handling module
//!
//! 定义调度器使用的各种错误类型
//! Defines the error types used by the scheduler

use thiserror::Error;

/// 调度器的结果类型
/// Result type for the scheduler
pub type Result<T> = std::result::Result<T, Error>;

/// 调度器错误类型
/// Scheduler error type
#[derive(Error, Debug)]
pub enum Error {
  /// 校验错误 - 操作负载不合法，在入队之前被拒绝
  /// Validation error - malformed operation payload, rejected before enqueue
  #[error("Validation error: {message}")]
  Validation { message: String },

  /// 容量错误 - 租户待处理队列已达到深度上限
  /// Capacity error - the tenant's pending queue reached its depth limit
  #[error("Queue for tenant {tenant} is full ({depth}/{limit} pending)")]
  Capacity {
    tenant: String,
    depth: usize,
    limit: usize,
  },

  /// 执行失败 - 执行器返回失败或崩溃
  /// Execution failure - the executor returned a failure or panicked
  #[error("Execution failed: {message}")]
  Execution { message: String },

  /// 不变量违规 - 例如同一租户出现两个工作者，属于致命的编程错误
  /// Invariant violation - e.g. two workers for one tenant, a fatal programming error
  #[error("Invariant violation: {message}")]
  InvariantViolation { message: String },

  /// 调度器已关闭
  /// Scheduler closed
  #[error("Scheduler closed")]
  SchedulerClosed,

  /// 配置错误
  /// Configuration error
  #[error("Configuration error: {message}")]
  Config { message: String },

  /// 序列化错误
  /// Serialization error
  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// IO 错误
  /// IO error
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// 创建校验错误
  /// Create a validation error
  pub fn validation<S: Into<String>>(message: S) -> Self {
    Self::Validation {
      message: message.into(),
    }
  }

  /// 创建容量错误
  /// Create a capacity error
  pub fn capacity<S: Into<String>>(tenant: S, depth: usize, limit: usize) -> Self {
    Self::Capacity {
      tenant: tenant.into(),
      depth,
      limit,
    }
  }

  /// 创建执行失败错误
  /// Create an execution failure error
  pub fn execution<S: Into<String>>(message: S) -> Self {
    Self::Execution {
      message: message.into(),
    }
  }

  /// 创建不变量违规错误
  /// Create an invariant violation error
  pub fn invariant<S: Into<String>>(message: S) -> Self {
    Self::InvariantViolation {
      message: message.into(),
    }
  }

  /// 创建配置错误
  /// Create a configuration error
  pub fn config<S: Into<String>>(message: S) -> Self {
    Self::Config {
      message: message.into(),
    }
  }

  /// 检查是否为同步拒绝错误（在 submit 调用中直接返回给调用方）
  /// Check if the error is a synchronous rejection (returned directly to the submit caller)
  pub fn is_rejection(&self) -> bool {
    matches!(self, Error::Validation { .. } | Error::Capacity { .. })
  }

  /// 检查是否为致命错误
  /// Check if the error is fatal
  ///
  /// 不变量违规破坏了核心的顺序保证，绝不能被静默吞掉
  /// An invariant violation breaks the core sequencing guarantee and must never be swallowed
  pub fn is_fatal(&self) -> bool {
    matches!(self, Error::InvariantViolation { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_creation() {
    let err = Error::validation("missing title");
    assert!(matches!(err, Error::Validation { .. }));

    let err = Error::capacity("alice@example.com", 10, 10);
    assert!(matches!(err, Error::Capacity { .. }));
    assert!(err.to_string().contains("alice@example.com"));

    let err = Error::execution("login failed");
    assert!(matches!(err, Error::Execution { .. }));

    let err = Error::config("bad concurrency");
    assert!(matches!(err, Error::Config { .. }));
  }

  #[test]
  fn test_error_rejection() {
    assert!(Error::validation("x").is_rejection());
    assert!(Error::capacity("t", 1, 1).is_rejection());
    assert!(!Error::execution("x").is_rejection());
    assert!(!Error::SchedulerClosed.is_rejection());
  }

  #[test]
  fn test_error_fatal() {
    assert!(Error::invariant("two workers for tenant t").is_fatal());
    assert!(!Error::execution("x").is_fatal());
    assert!(!Error::SchedulerClosed.is_fatal());
  }
}
