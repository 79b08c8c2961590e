//! 常量资源
//!
//! 只读、无更新循环：构造后值不再变化

use crate::error::Result;
use crate::events::EventBus;
use crate::storage::{Reader, Resource, Storage};
use crate::types::Value;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// 固定值的只读资源
pub struct Constant {
    value: Value,
}

impl Constant {
    /// 创建常量资源
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl Resource for Constant {
    async fn start(&self, name: &str, _storage: Arc<Storage>, _events: Arc<EventBus>) {
        debug!("constant '{}' started", name);
    }

    async fn stop(&self) {}

    fn reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }
}

#[async_trait]
impl Reader for Constant {
    async fn read(&self) -> Result<Value> {
        Ok(self.value)
    }
}
