//! 计数器资源
//!
//! 每个节拍累加固定步长；同时在自己名下订阅三个动作主题：
//! `reset`（恢复初始值并发布）、`pause`（停止计数但不终止循环）、
//! `resume`（以新的节拍重新开始计数）

use crate::error::Result;
use crate::events::{listener, EventBus, Listener, Payload, Topic};
use crate::resource::UpdateLoop;
use crate::storage::{Reader, Resource, Storage};
use crate::types::{Numeric, Value};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// 动作名
const ACTION_RESET: &str = "reset";
const ACTION_PAUSE: &str = "pause";
const ACTION_RESUME: &str = "resume";

/// 活动状态：保留订阅句柄以便按身份退订
struct Active {
    name: String,
    events: Arc<EventBus>,
    update: UpdateLoop,
    reset: Listener,
    pause: Listener,
    resume: Listener,
}

/// 定步长计数器
pub struct Increment {
    initial: Numeric,
    step: Numeric,
    interval: Duration,
    /// 当前值
    current: Arc<RwLock<Numeric>>,
    /// 活动状态
    active: Mutex<Option<Active>>,
}

impl Increment {
    /// 创建计数器；步长在构造期转换到初始值的种类
    pub fn new(initial: impl Into<Numeric>, step: impl Into<Numeric>, interval: Duration) -> Self {
        let initial = initial.into();
        let step = step.into().coerce_to(initial);

        Self {
            initial,
            step,
            interval,
            current: Arc::new(RwLock::new(initial)),
            active: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Resource for Increment {
    async fn start(&self, name: &str, _storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!("increment '{}' started", name);

        let (reset_tx, mut reset_rx) = listener(1);
        let (pause_tx, mut pause_rx) = listener(1);
        let (resume_tx, mut resume_rx) = listener(1);

        events
            .subscribe(Topic::action(name, ACTION_RESET), reset_tx.clone())
            .await;
        events
            .subscribe(Topic::action(name, ACTION_PAUSE), pause_tx.clone())
            .await;
        events
            .subscribe(Topic::action(name, ACTION_RESUME), resume_tx.clone())
            .await;

        let loop_name = name.to_string();
        let loop_events = Arc::clone(&events);
        let initial = self.initial;
        let step = self.step;
        let period = self.interval;
        let current = Arc::clone(&self.current);

        let update = UpdateLoop::spawn(move |mut shutdown| async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut paused = false;

            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    Some(_) = pause_rx.recv() => {
                        paused = true;
                    }
                    Some(_) = resume_rx.recv() => {
                        paused = false;
                        // 恢复时以当下为基准重建节拍
                        ticker = interval_at(Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    }
                    Some(_) = reset_rx.recv() => {
                        let value = {
                            let mut current = current.write().await;
                            *current = initial;
                            Value::from(*current)
                        };

                        loop_events
                            .emit(
                                &Topic::changed(&loop_name),
                                Payload::Changed { resource: loop_name.clone(), value },
                            )
                            .await;
                    }
                    _ = ticker.tick(), if !paused => {
                        let value = {
                            let mut current = current.write().await;
                            *current = current.add(step);
                            Value::from(*current)
                        };

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

        *self.active.lock().await = Some(Active {
            name: name.to_string(),
            events,
            update,
            reset: reset_tx,
            pause: pause_tx,
            resume: resume_tx,
        });
    }

    async fn stop(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active
                .events
                .unsubscribe(&Topic::action(&active.name, ACTION_RESET), &active.reset)
                .await;
            active
                .events
                .unsubscribe(&Topic::action(&active.name, ACTION_PAUSE), &active.pause)
                .await;
            active
                .events
                .unsubscribe(&Topic::action(&active.name, ACTION_RESUME), &active.resume)
                .await;

            active.update.stop().await;
        }
    }

    fn reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }
}

#[async_trait]
impl Reader for Increment {
    async fn read(&self) -> Result<Value> {
        Ok(Value::from(*self.current.read().await))
    }
}
