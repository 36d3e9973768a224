use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Keyed background tasks; spawning under a taken key aborts the old task.
#[derive(Default)]
pub struct TaskManager {
    tasks: HashMap<String, JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub fn spawn(&mut self, key: &str, task: JoinHandle<()>) {
        if let Some(handle) = self.tasks.insert(key.to_string(), task) {
            handle.abort();
        }
    }

    pub fn abort(&mut self, key: &str) -> bool {
        match self.tasks.remove(key) {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn abort_all(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
        self.tasks.clear();
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}
