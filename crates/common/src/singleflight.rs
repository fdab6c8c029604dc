//! Singleflight 模式
//!
//! 合并对同一个 key 的并发调用：第一个调用方执行实际操作，其余调用方等待并共享结果。
//! 执行方被取消时等待方会重新竞争执行权。

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use creator_errors::{AppError, AppResult};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

type Calls<T> = Arc<Mutex<HashMap<String, broadcast::Sender<Result<T, String>>>>>;

/// Singleflight 组
pub struct SingleFlight<T> {
    calls: Calls<T>,
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// 执行方退出（正常结束或被取消）时移除进行中的记录
struct InFlight<'a, T> {
    calls: &'a Calls<T>,
    key: &'a str,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(self.key);
    }
}

impl<T: Clone + Send + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前进行中的 key 数量
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// 执行操作，如果已有相同 key 的操作在进行中，则等待其结果
    pub async fn run<F, Fut>(&self, key: &str, f: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let tx = loop {
            let waiting = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(tx) => Ok(tx.subscribe()),
                    None => {
                        let (tx, _) = broadcast::channel(1);
                        calls.insert(key.to_string(), tx.clone());
                        Err(tx)
                    }
                }
            };

            match waiting {
                Ok(mut rx) => match rx.recv().await {
                    Ok(shared) => {
                        debug!(key, "Joined in-flight call");
                        return shared.map_err(AppError::internal);
                    }
                    // 执行方被取消，重新竞争
                    Err(_) => continue,
                },
                Err(tx) => break tx,
            }
        };

        let guard = InFlight {
            calls: &self.calls,
            key,
        };
        let result = f().await;

        // 先移除记录再广播，之后到达的调用方会发起新的执行
        drop(guard);
        let shared = match &result {
            Ok(value) => Ok(value.clone()),
            Err(e) => Err(e.to_string()),
        };
        let _ = tx.send(shared);

        result
    }
}
