//! 资源变体
//!
//! 每个变体独立实现生命周期契约与可选的读/写能力，
//! 各自拥有自己的并发（内部更新循环）与值存储。
//! 时间驱动变体共享同一更新循环句柄：关闭信号 + 任务句柄，
//! 停止时先发信号再等待循环退出

pub mod action;
pub mod computed;
pub mod constant;
pub mod feedback;
pub mod increment;
pub mod random;
pub mod sine_wave;
pub mod static_value;

pub use action::Action;
pub use computed::Computed;
pub use constant::Constant;
pub use feedback::LinearFeedback;
pub use increment::Increment;
pub use random::Random;
pub use sine_wave::SineWave;
pub use static_value::Static;

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 更新循环句柄
///
/// 取消是协作式的：循环必须在每个等待点轮询关闭信号
pub(crate) struct UpdateLoop {
    /// 关闭信号发送端
    shutdown: mpsc::UnboundedSender<()>,
    /// 循环任务句柄
    handle: JoinHandle<()>,
}

impl UpdateLoop {
    /// 启动更新循环；闭包获得关闭信号接收端
    pub(crate) fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(mpsc::UnboundedReceiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(body(receiver));

        Self { shutdown, handle }
    }

    /// 同步停止：发出关闭信号并等待循环完全退出
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stop_joins_the_loop() {
        let exited = Arc::new(AtomicBool::new(false));
        let flag = exited.clone();

        let update = UpdateLoop::spawn(move |mut shutdown| async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(std::time::Duration::from_millis(5)) => {}
                }
            }
            flag.store(true, Ordering::SeqCst);
        });

        update.stop().await;
        assert!(exited.load(Ordering::SeqCst));
    }
}
