//! 执行器模块
//! Executor module
//!
//! 定义调度器调用实际自动化动作的外部协作接口
//! Defines the external collaborator interface through which the scheduler invokes the actual automation action

use crate::error::Result;
use crate::operation::Operation;
use async_trait::async_trait;
use std::sync::Arc;

/// 执行器特性 - 执行一个自动化操作的不透明外部过程
/// Executor trait - the opaque external procedure that performs one automation operation
///
/// 从工作者的角度看这是一次阻塞调用（打开浏览器、登录、执行、关闭）；
/// 执行器内部的重试或退避策略对调度器契约不可见，执行器自身也不得
/// 派生无上限的并发浏览器会话
/// From the worker's point of view this is a blocking call (open browser, log in,
/// perform, close); any internal retry/backoff is the executor's concern and
/// invisible to the scheduler contract, and the executor must not itself spawn
/// unbounded concurrent browser sessions
#[async_trait]
pub trait Executor: Send + Sync {
  /// 执行操作
  /// Execute an operation
  ///
  /// `Ok(())` 表示成功；`Err` 会被记录为该租户的最近失败，
  /// 不会中止队列，也不会自动重试
  /// `Ok(())` means success; an `Err` is recorded as the tenant's most recent
  /// failure, does not abort the queue, and is never retried automatically
  async fn execute(&self, operation: Operation) -> Result<()>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
  async fn execute(&self, operation: Operation) -> Result<()> {
    (**self).execute(operation).await
  }
}

/// 函数式执行器适配器
/// Functional executor adapter
pub struct ExecutorFunc<F> {
  func: F,
}

impl<F> ExecutorFunc<F>
where
  F: Fn(Operation) -> Result<()> + Send + Sync,
{
  /// 创建新的函数式执行器
  /// Create a new functional executor
  pub fn new(func: F) -> Self {
    Self { func }
  }
}

#[async_trait]
impl<F> Executor for ExecutorFunc<F>
where
  F: Fn(Operation) -> Result<()> + Send + Sync,
{
  async fn execute(&self, operation: Operation) -> Result<()> {
    (self.func)(operation)
  }
}

/// 异步函数式执行器适配器
/// Asynchronous functional executor adapter
pub struct AsyncExecutorFunc<F, Fut> {
  func: F,
  _phantom: std::marker::PhantomData<Fut>,
}

impl<F, Fut> AsyncExecutorFunc<F, Fut>
where
  F: Fn(Operation) -> Fut + Send + Sync,
  Fut: std::future::Future<Output = Result<()>> + Send + Sync,
{
  /// 创建新的异步函数式执行器
  /// Create a new asynchronous functional executor
  pub fn new(func: F) -> Self {
    Self {
      func,
      _phantom: std::marker::PhantomData,
    }
  }
}

#[async_trait]
impl<F, Fut> Executor for AsyncExecutorFunc<F, Fut>
where
  F: Fn(Operation) -> Fut + Send + Sync,
  Fut: std::future::Future<Output = Result<()>> + Send + Sync,
{
  async fn execute(&self, operation: Operation) -> Result<()> {
    (self.func)(operation).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::operation::OperationKind;

  #[tokio::test]
  async fn test_executor_func() {
    let executor = ExecutorFunc::new(|op: Operation| {
      assert_eq!(op.kind.name(), "renew");
      Ok(())
    });

    let op = Operation::new("t", OperationKind::renew_default()).unwrap();
    assert!(executor.execute(op).await.is_ok());
  }

  #[tokio::test]
  async fn test_async_executor_func() {
    let executor = AsyncExecutorFunc::new(|op: Operation| async move {
      if op.kind.name() == "post" {
        Ok(())
      } else {
        Err(Error::execution("only posts supported"))
      }
    });

    let post = Operation::post("t", "title", "desc", 5.0, "img.jpg").unwrap();
    assert!(executor.execute(post).await.is_ok());

    let renew = Operation::renew("t", 3).unwrap();
    assert!(executor.execute(renew).await.is_err());
  }
}
