//! 计算值资源
//!
//! 值由注册表当前状态的纯函数导出，并声明依赖资源名列表。
//! 启动时先求值一次作为种子，再用单个监听器订阅每个依赖的变更主题；
//! 循环在任意依赖通知到达时重算。重算总是从注册表读取权威当前值
//! 而非事件负载，因此近乎同时的依赖变更会自然合并为一次唤醒内的
//! 单次重算，结果始终与依赖值的某个快照一致

use crate::error::Result;
use crate::events::{listener, EventBus, Listener, Payload, Topic};
use crate::resource::UpdateLoop;
use crate::storage::{Reader, Resource, Storage};
use crate::types::Value;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// 计算回调：从注册表读取依赖并导出新值
type ComputeFn = Arc<dyn Fn(Arc<Storage>) -> BoxFuture<'static, Value> + Send + Sync>;

/// 活动状态
struct Active {
    events: Arc<EventBus>,
    update: UpdateLoop,
    listener: Listener,
}

/// 依赖驱动的计算值
pub struct Computed {
    callback: ComputeFn,
    dependencies: Vec<String>,
    /// 当前值；initial 在首次求值落地前固定其类型
    current: Arc<RwLock<Value>>,
    /// 活动状态
    active: Mutex<Option<Active>>,
}

impl Computed {
    /// 创建计算值资源
    ///
    /// `initial` 决定值的类型并在启动前充当默认值；
    /// `dependencies` 是要订阅变更主题的资源名
    pub fn new<F, Fut>(
        initial: impl Into<Value>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
        callback: F,
    ) -> Self
    where
        F: Fn(Arc<Storage>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |storage| callback(storage).boxed()),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            current: Arc::new(RwLock::new(initial.into())),
            active: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Resource for Computed {
    async fn start(&self, name: &str, storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!(
            "computed '{}' started with {} dependencies",
            name,
            self.dependencies.len()
        );

        // 先求值一次作为种子
        let seeded = (self.callback)(Arc::clone(&storage)).await;
        *self.current.write().await = seeded;

        // 单监听器，容量与依赖数对齐：突发通知合并为有限次唤醒
        let (tx, mut rx) = listener(self.dependencies.len().max(1));

        let loop_name = name.to_string();
        let loop_events = Arc::clone(&events);
        let callback = Arc::clone(&self.callback);
        let current = Arc::clone(&self.current);

        let update = UpdateLoop::spawn(move |mut shutdown| async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    Some(_) = rx.recv() => {
                        let value = callback(Arc::clone(&storage)).await;
                        *current.write().await = value;

                        loop_events
                            .emit(
                                &Topic::changed(&loop_name),
                                Payload::Changed { resource: loop_name.clone(), value },
                            )
                            .await;
                    }
                }
            }
        });

        for dependency in &self.dependencies {
            events
                .subscribe(Topic::changed(dependency), tx.clone())
                .await;
        }

        *self.active.lock().await = Some(Active {
            events,
            update,
            listener: tx,
        });
    }

    async fn stop(&self) {
        if let Some(active) = self.active.lock().await.take() {
            for dependency in &self.dependencies {
                active
                    .events
                    .unsubscribe(&Topic::changed(dependency), &active.listener)
                    .await;
            }

            active.update.stop().await;
        }
    }

    fn reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }
}

#[async_trait]
impl Reader for Computed {
    async fn read(&self) -> Result<Value> {
        Ok(*self.current.read().await)
    }
}
