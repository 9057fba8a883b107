//! キー付きの遅延タスク
//!
//! ルームごとのタイマー（自動クローズの猶予期間、チェックポイント書き込みの間引き）を
//! 1 か所で管理し、シャットダウン時にまとめてキャンセルできるようにする。
//!
//! タスクは遅延が経過した時点で待機中から実行中に移り、その後に本体を実行する。
//! 実行中の本体は中断しない。`cancel` と `schedule` は待機中のタスクだけを対象にし、
//! `cancel_where` と `cancel_all` は対象キーの実行中の本体が終わるまで待ってから返る。

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};

struct PendingTask {
    generation: u64,
    handle: JoinHandle<()>,
}

struct RunningTask<K> {
    key: K,
    handle: JoinHandle<()>,
}

struct TaskTable<K> {
    pending: HashMap<K, PendingTask>,
    /// generation → 本体を実行中のタスク
    running: HashMap<u64, RunningTask<K>>,
}

pub struct DelayedTasks<K> {
    table: Arc<Mutex<TaskTable<K>>>,
    next_generation: AtomicU64,
}

impl<K> Default for DelayedTasks<K> {
    fn default() -> Self {
        Self {
            table: Arc::new(Mutex::new(TaskTable {
                pending: HashMap::new(),
                running: HashMap::new(),
            })),
            next_generation: AtomicU64::new(0),
        }
    }
}

impl<K> DelayedTasks<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// `delay` 後に `task` を実行する。同じキーの待機中タスクは置き換える
    pub async fn schedule<F>(&self, key: K, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut table = self.table.lock().await;
        if let Some(previous) = table.pending.remove(&key) {
            previous.handle.abort();
        }
        let entry = self.spawn(key.clone(), delay, task);
        table.pending.insert(key, entry);
    }

    /// 同じキーのタスクが待機中でなければ登録する（間引き）
    ///
    /// 登録した場合は `true`、待機中のタスクがあり破棄した場合は `false`。
    pub async fn schedule_if_idle<F>(&self, key: K, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut table = self.table.lock().await;
        if table.pending.contains_key(&key) {
            return false;
        }
        let entry = self.spawn(key.clone(), delay, task);
        table.pending.insert(key, entry);
        true
    }

    /// 待機中のタスクをキャンセルする。キャンセルした場合は `true`
    pub async fn cancel(&self, key: &K) -> bool {
        let mut table = self.table.lock().await;
        match table.pending.remove(key) {
            Some(task) => {
                task.handle.abort();
                true
            }
            None => false,
        }
    }

    /// 条件に合うキーの待機中タスクをすべてキャンセルし、件数を返す
    ///
    /// 同じ条件に合う実行中の本体があれば、その完了を待つ。
    pub async fn cancel_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let (cancelled, in_flight) = {
            let mut table = self.table.lock().await;
            let keys: Vec<K> = table
                .pending
                .keys()
                .filter(|key| predicate(key))
                .cloned()
                .collect();
            for key in &keys {
                if let Some(task) = table.pending.remove(key) {
                    task.handle.abort();
                }
            }
            let generations: Vec<u64> = table
                .running
                .iter()
                .filter(|(_, task)| predicate(&task.key))
                .map(|(generation, _)| *generation)
                .collect();
            let in_flight: Vec<JoinHandle<()>> = generations
                .iter()
                .filter_map(|generation| table.running.remove(generation))
                .map(|task| task.handle)
                .collect();
            (keys.len(), in_flight)
        };

        wait_all(in_flight).await;
        cancelled
    }

    /// 待機中のタスクをすべてキャンセルし、件数を返す。実行中の本体は完了を待つ
    pub async fn cancel_all(&self) -> usize {
        let (cancelled, in_flight) = {
            let mut table = self.table.lock().await;
            let count = table.pending.len();
            for (_, task) in table.pending.drain() {
                task.handle.abort();
            }
            let in_flight: Vec<JoinHandle<()>> =
                table.running.drain().map(|(_, task)| task.handle).collect();
            (count, in_flight)
        };

        wait_all(in_flight).await;
        cancelled
    }

    pub async fn is_pending(&self, key: &K) -> bool {
        self.table.lock().await.pending.contains_key(key)
    }

    pub async fn pending_count(&self) -> usize {
        self.table.lock().await.pending.len()
    }

    pub async fn running_count(&self) -> usize {
        self.table.lock().await.running.len()
    }

    // 呼び出し側が `table` のロックを保持している間に呼ぶこと。
    // 生成されたタスクは、登録が終わるまでロックを取得できない。
    fn spawn<F>(&self, key: K, delay: Duration, task: F) -> PendingTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let table = Arc::clone(&self.table);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut table = table.lock().await;
                let current = matches!(
                    table.pending.get(&key),
                    Some(entry) if entry.generation == generation
                );
                if !current {
                    return;
                }
                if let Some(entry) = table.pending.remove(&key) {
                    table.running.insert(
                        generation,
                        RunningTask {
                            key,
                            handle: entry.handle,
                        },
                    );
                }
            }
            task.await;
            table.lock().await.running.remove(&generation);
        });
        PendingTask { generation, handle }
    }
}

async fn wait_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Delayed task failed: {}", e);
        }
    }
}
