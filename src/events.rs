//! 事件总线
//!
//! 基于主题的发布/订阅原语。主题是不透明字符串；监听器注册表是
//! 系统中唯一被多方直接修改的共享状态：Emit 走读锁并发进行，
//! Subscribe/Unsubscribe 走写锁串行化。单个监听器的投递受超时约束，
//! 迟滞的监听器不会无限期阻塞发布方或其余监听器

use crate::types::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// 事件主题：按字符串字面量相等
///
/// 两种规范形状只由约定构造：`changed` 与 `action`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    /// 资源值变更主题
    pub fn changed(resource: &str) -> Self {
        Topic(resource.to_string())
    }

    /// 资源动作主题
    pub fn action(resource: &str, action: &str) -> Self {
        Topic(format!("{}:{}", resource, action))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一次投递携带的负载
#[derive(Debug, Clone)]
pub enum Payload {
    /// 空信号
    Signal,
    /// 值变更通知：携带资源名与新值
    Changed { resource: String, value: Value },
    /// 动作负载：由调用方提供
    Action(Value),
}

/// 监听器句柄：有界通道的发送端
///
/// 退订按通道身份匹配（`Sender::same_channel`），克隆仍视为同一句柄
pub type Listener = mpsc::Sender<Payload>;

/// 创建一个监听器及其接收端
pub fn listener(capacity: usize) -> (Listener, mpsc::Receiver<Payload>) {
    mpsc::channel(capacity)
}

/// 事件总线配置
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 单个监听器的投递超时；超时后放弃该次投递并继续下一个监听器
    pub emit_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            emit_timeout: Duration::from_millis(50),
        }
    }
}

/// 主题式事件总线
pub struct EventBus {
    /// 配置
    config: EventBusConfig,
    /// 监听器注册表：主题到已注册监听器的有序列表（允许重复）
    listeners: RwLock<HashMap<Topic, Vec<Listener>>>,
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// 以指定投递超时创建事件总线
    pub fn with_timeout(emit_timeout: Duration) -> Self {
        Self::new(EventBusConfig { emit_timeout })
    }

    /// 注册监听器；只有副作用，不会失败
    pub async fn subscribe(&self, topic: Topic, listener: Listener) {
        let mut listeners = self.listeners.write().await;

        debug!("listener subscribed to topic '{}'", topic);
        listeners.entry(topic).or_default().push(listener);
    }

    /// 按通道身份移除该主题下的所有匹配监听器；不存在时为空操作
    pub async fn unsubscribe(&self, topic: &Topic, listener: &Listener) {
        let mut listeners = self.listeners.write().await;

        if let Some(registered) = listeners.get_mut(topic) {
            registered.retain(|candidate| !candidate.same_channel(listener));

            if registered.is_empty() {
                listeners.remove(topic);
            }

            debug!("listener unsubscribed from topic '{}'", topic);
        }
    }

    /// 向该主题当前注册的每个监听器同步投递负载
    ///
    /// 未知主题是静默空操作；单个投递受 `emit_timeout` 约束
    pub async fn emit(&self, topic: &Topic, payload: Payload) {
        let listeners = self.listeners.read().await;

        let Some(registered) = listeners.get(topic) else {
            return;
        };

        for listener in registered {
            match tokio::time::timeout(self.config.emit_timeout, listener.send(payload.clone()))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    debug!("listener on topic '{}' dropped its receiver", topic);
                }
                Err(_) => {
                    warn!(
                        "listener on topic '{}' did not accept delivery within {:?}, skipping",
                        topic, self.config.emit_timeout
                    );
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_emit_delivers_to_all_listeners() {
        let bus = EventBus::default();
        let (first, mut first_rx) = listener(4);
        let (second, mut second_rx) = listener(4);

        let topic = Topic::changed("tank");
        bus.subscribe(topic.clone(), first).await;
        bus.subscribe(topic.clone(), second).await;

        bus.emit(
            &topic,
            Payload::Changed {
                resource: "tank".to_string(),
                value: Value::Int(7),
            },
        )
        .await;

        for rx in [&mut first_rx, &mut second_rx] {
            match rx.recv().await {
                Some(Payload::Changed { resource, value }) => {
                    assert_eq!(resource, "tank");
                    assert_eq!(value, Value::Int(7));
                }
                other => panic!("unexpected payload: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_duplicate_registrations() {
        let bus = EventBus::default();
        let (handle, mut rx) = listener(8);
        let topic = Topic::changed("tank");

        // 同一句柄注册两次，一次 emit 应收到两份
        bus.subscribe(topic.clone(), handle.clone()).await;
        bus.subscribe(topic.clone(), handle.clone()).await;

        bus.emit(&topic, Payload::Signal).await;
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());

        // 退订移除全部匹配项
        bus.unsubscribe(&topic, &handle).await;
        bus.emit(&topic, Payload::Signal).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stalled_listener_does_not_block_others() {
        let bus = EventBus::with_timeout(Duration::from_millis(100));
        let (stalled, _stalled_rx) = listener(1);
        let (healthy, mut healthy_rx) = listener(4);

        let topic = Topic::changed("tank");
        bus.subscribe(topic.clone(), stalled.clone()).await;
        bus.subscribe(topic.clone(), healthy).await;

        // 占满迟滞监听器的缓冲，使后续投递阻塞直至超时
        stalled.send(Payload::Signal).await.expect("buffer slot");

        let started = Instant::now();
        bus.emit(&topic, Payload::Signal).await;
        let elapsed = started.elapsed();

        // 迟滞者被放弃，健康监听器仍收到投递，且整体耗时有界
        assert!(healthy_rx.recv().await.is_some());
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_emit_unknown_topic_is_noop() {
        let bus = EventBus::default();
        bus.emit(&Topic::changed("missing"), Payload::Signal).await;
    }

    #[tokio::test]
    async fn test_action_topic_identity() {
        assert_eq!(Topic::action("counter", "reset").to_string(), "counter:reset");
        assert_eq!(Topic::changed("counter").to_string(), "counter");
        assert_ne!(Topic::changed("counter"), Topic::action("counter", "reset"));
    }
}
