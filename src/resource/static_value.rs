//! 静态可写资源
//!
//! 读写能力齐备、无更新循环：写入校验类型后存储并发布变更通知

use crate::error::{Result, SimFlowError};
use crate::events::{EventBus, Payload, Topic};
use crate::storage::{Reader, Resource, Storage, Writer};
use crate::types::Value;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// 绑定状态：仅在 start/stop 括号内存在
struct Bound {
    name: String,
    events: Arc<EventBus>,
}

/// 可读可写的静态资源
pub struct Static {
    /// 当前值；类型在构造时固定
    current: RwLock<Value>,
    /// 绑定状态
    bound: Mutex<Option<Bound>>,
}

impl Static {
    /// 创建静态资源；初始值同时固定其类型
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            current: RwLock::new(value.into()),
            bound: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Resource for Static {
    async fn start(&self, name: &str, _storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!("static '{}' started", name);

        *self.bound.lock().await = Some(Bound {
            name: name.to_string(),
            events,
        });
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
impl Reader for Static {
    async fn read(&self) -> Result<Value> {
        Ok(*self.current.read().await)
    }
}

#[async_trait]
impl Writer for Static {
    async fn write(&self, value: Value) -> Result<()> {
        {
            let mut current = self.current.write().await;

            if value.kind() != current.kind() {
                return Err(SimFlowError::MismatchedTypes {
                    expected: current.kind(),
                    actual: value.kind(),
                });
            }

            *current = value;
        }

        if let Some(bound) = self.bound.lock().await.as_ref() {
            bound
                .events
                .emit(
                    &Topic::changed(&bound.name),
                    Payload::Changed {
                        resource: bound.name.clone(),
                        value,
                    },
                )
                .await;
        }

        Ok(())
    }
}
