//! 触发式动作资源
//!
//! 模拟瞬时命令：持有布尔“已触发”标志。写入 true 触发回调并在回调
//! 报告完成时于同一次写入内同步清除标志

use crate::error::{Result, SimFlowError};
use crate::events::EventBus;
use crate::storage::{Reader, Resource, Storage, Writer};
use crate::types::{Value, ValueKind};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// 动作回调：可访问注册表与事件总线；返回 true 表示已完成
type ActionCallback = Arc<dyn Fn(Arc<Storage>, Arc<EventBus>) -> BoxFuture<'static, bool> + Send + Sync>;

/// 绑定状态
#[derive(Clone)]
struct Bound {
    storage: Arc<Storage>,
    events: Arc<EventBus>,
}

/// 触发式一次性动作
pub struct Action {
    callback: ActionCallback,
    /// 已触发标志
    armed: RwLock<bool>,
    /// 绑定状态
    bound: Mutex<Option<Bound>>,
}

impl Action {
    /// 创建动作资源
    ///
    /// 回调在 write 调用内同步执行并使该次写入阻塞至回调返回；
    /// 若回调需要等待后续总线事件，应自行 spawn 任务以免死锁
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(Arc<Storage>, Arc<EventBus>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |storage, events| callback(storage, events).boxed()),
            armed: RwLock::new(false),
            bound: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Resource for Action {
    async fn start(&self, name: &str, storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!("action '{}' started", name);

        *self.armed.write().await = false;
        *self.bound.lock().await = Some(Bound { storage, events });
    }

    async fn stop(&self) {
        *self.bound.lock().await = None;
    }

    fn reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }

    fn writer(&self) -> Option<&dyn Writer> {
        Some(self)
    }
}

#[async_trait]
impl Reader for Action {
    async fn read(&self) -> Result<Value> {
        Ok(Value::Bool(*self.armed.read().await))
    }
}

#[async_trait]
impl Writer for Action {
    async fn write(&self, value: Value) -> Result<()> {
        let Value::Bool(fire) = value else {
            return Err(SimFlowError::MismatchedTypes {
                expected: ValueKind::Bool,
                actual: value.kind(),
            });
        };

        *self.armed.write().await = fire;

        if fire {
            // 不跨回调持有绑定锁
            let bound = self.bound.lock().await.clone();

            if let Some(bound) = bound {
                if (self.callback)(bound.storage, bound.events).await {
                    *self.armed.write().await = false;
                }
            } else {
                debug!("action written before start, callback skipped");
            }
        }

        Ok(())
    }
}
