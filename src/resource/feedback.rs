//! 线性反馈控制器资源
//!
//! 跟踪设定点资源的值，每个节拍以固定步长朝其逼近并夹紧（任一方向
//! 都不越过目标）。订阅设定点的变更主题以便及时重读，而不是只在
//! 自己的节拍边界拉取；int32 与 float32 之间按显式转换表进行数值转换。
//! 对同伴的瞬时读取错误保持上次已知目标，不会终止循环

use crate::error::{Result, SimFlowError};
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

/// 活动状态
struct Active {
    setpoint: String,
    events: Arc<EventBus>,
    update: UpdateLoop,
    listener: Listener,
}

/// 朝设定点爬坡的反馈控制器
pub struct LinearFeedback {
    step: Numeric,
    interval: Duration,
    setpoint: String,
    /// 当前值；种类由步长固定，从零起步
    current: Arc<RwLock<Numeric>>,
    /// 活动状态
    active: Mutex<Option<Active>>,
}

impl LinearFeedback {
    /// 创建反馈控制器；步长的种类同时固定自身值的种类
    pub fn new(step: impl Into<Numeric>, interval: Duration, setpoint: &str) -> Self {
        let step = step.into();

        Self {
            step,
            interval,
            setpoint: setpoint.to_string(),
            current: Arc::new(RwLock::new(step.zero_like())),
            active: Mutex::new(None),
        }
    }
}

/// 读取设定点并转换到 kind_like 的种类
///
/// 非数值设定点返回 `NotNumeric`
async fn read_setpoint(
    storage: &Arc<Storage>,
    setpoint: &str,
    kind_like: Numeric,
) -> Result<Numeric> {
    let value = storage.read(setpoint).await?;

    match Numeric::try_from(value) {
        Ok(numeric) => Ok(numeric.coerce_to(kind_like)),
        Err(actual) => Err(SimFlowError::NotNumeric {
            setpoint: setpoint.to_string(),
            actual,
        }),
    }
}

#[async_trait]
impl Resource for LinearFeedback {
    async fn start(&self, name: &str, storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!("feedback '{}' tracking setpoint '{}'", name, self.setpoint);

        let (tx, mut rx) = listener(1);
        events
            .subscribe(Topic::changed(&self.setpoint), tx.clone())
            .await;

        let loop_name = name.to_string();
        let loop_events = Arc::clone(&events);
        let setpoint = self.setpoint.clone();
        let step = self.step;
        let period = self.interval;
        let current = Arc::clone(&self.current);

        let update = UpdateLoop::spawn(move |mut shutdown| async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // 设定点可能尚未产生首个样本；读取失败时从零目标起步
            let mut target = read_setpoint(&storage, &setpoint, step)
                .await
                .unwrap_or_else(|_| step.zero_like());

            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    Some(_) = rx.recv() => {
                        // 瞬时读取错误保持上次已知目标
                        if let Ok(fresh) = read_setpoint(&storage, &setpoint, step).await {
                            target = fresh;
                        }
                    }
                    _ = ticker.tick() => {
                        let moved = {
                            let mut current = current.write().await;
                            let next = current.step_toward(target, step);

                            if next == *current {
                                None
                            } else {
                                *current = next;
                                Some(Value::from(next))
                            }
                        };

                        if let Some(value) = moved {
                            loop_events
                                .emit(
                                    &Topic::changed(&loop_name),
                                    Payload::Changed { resource: loop_name.clone(), value },
                                )
                                .await;
                        }
                    }
                }
            }
        });

        *self.active.lock().await = Some(Active {
            setpoint: self.setpoint.clone(),
            events,
            update,
            listener: tx,
        });
    }

    async fn stop(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active
                .events
                .unsubscribe(&Topic::changed(&active.setpoint), &active.listener)
                .await;

            active.update.stop().await;
        }
    }

    fn reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }
}

#[async_trait]
impl Reader for LinearFeedback {
    async fn read(&self) -> Result<Value> {
        Ok(Value::from(*self.current.read().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Constant, Static};

    async fn next_changed(rx: &mut tokio::sync::mpsc::Receiver<Payload>) -> Value {
        let payload = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick expected")
            .expect("payload expected");

        match payload {
            Payload::Changed { value, .. } => value,
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ramps_to_target_without_overshoot() {
        let events = Arc::new(EventBus::default());
        let storage = Storage::builder()
            .resource("setpoint", Constant::new(10i32))
            .resource(
                "ramp",
                LinearFeedback::new(1, Duration::from_millis(10), "setpoint"),
            )
            .build();

        let (handle, mut rx) = listener(32);
        events.subscribe(Topic::changed("ramp"), handle).await;
        storage.start(&events).await;

        // 每个节拍恰好 +1，到达 10 后保持不再越过
        for expected in 1..=10 {
            assert_eq!(next_changed(&mut rx).await, Value::Int(expected));
        }

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(storage.read("ramp").await.unwrap(), Value::Int(10));
        assert!(rx.try_recv().is_err(), "no emission once target is held");

        storage.stop().await;
    }

    #[tokio::test]
    async fn test_coerces_float_setpoint_to_int_kind() {
        let events = Arc::new(EventBus::default());
        let storage = Storage::builder()
            .resource("setpoint", Constant::new(3.9f32))
            .resource(
                "ramp",
                LinearFeedback::new(1, Duration::from_millis(10), "setpoint"),
            )
            .build();

        storage.start(&events).await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        // float32 设定点按转换表截断为 int32 目标
        assert_eq!(storage.read("ramp").await.unwrap(), Value::Int(3));
        storage.stop().await;
    }

    #[tokio::test]
    async fn test_tracks_setpoint_changes_promptly() {
        let events = Arc::new(EventBus::default());
        let storage = Storage::builder()
            .resource("setpoint", Static::new(2i32))
            .resource(
                "ramp",
                LinearFeedback::new(1, Duration::from_millis(10), "setpoint"),
            )
            .build();

        let (handle, mut rx) = listener(64);
        events.subscribe(Topic::changed("ramp"), handle).await;
        storage.start(&events).await;

        for expected in 1..=2 {
            assert_eq!(next_changed(&mut rx).await, Value::Int(expected));
        }

        storage.write("setpoint", Value::Int(0)).await.unwrap();

        for expected in (0..=1).rev() {
            assert_eq!(next_changed(&mut rx).await, Value::Int(expected));
        }

        storage.stop().await;
    }

    #[tokio::test]
    async fn test_non_numeric_setpoint_never_moves() {
        let events = Arc::new(EventBus::default());
        let storage = Storage::builder()
            .resource("setpoint", Constant::new(true))
            .resource(
                "ramp",
                LinearFeedback::new(1.0f32, Duration::from_millis(10), "setpoint"),
            )
            .build();

        storage.start(&events).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(storage.read("ramp").await.unwrap(), Value::Float(0.0));
        storage.stop().await;
    }

    #[tokio::test]
    async fn test_read_setpoint_rejects_non_numeric() {
        let storage = Storage::builder()
            .resource("flag", Constant::new(false))
            .build();

        let error = read_setpoint(&storage, "flag", Numeric::Int(0))
            .await
            .unwrap_err();

        assert!(matches!(error, SimFlowError::NotNumeric { .. }));
    }
}
