use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use crossbeam::queue::SegQueue;
use crossbeam::sync::{Parker, Unparker};

use super::{Task, TaskId};

struct TaskWaker {
    task_id: TaskId,
    wake_queue: Arc<SegQueue<TaskId>>,
    unparker: Unparker,
}

impl TaskWaker {
    fn wake_task(&self) {
        log::trace!("wake task {:?}", self.task_id);
        self.wake_queue.push(self.task_id);
        self.unparker.unpark();
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_task();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.wake_task();
    }
}

fn task_waker(task_id: TaskId, wake_queue: &Arc<SegQueue<TaskId>>, unparker: &Unparker) -> Waker {
    Waker::from(Arc::new(TaskWaker {
        task_id,
        wake_queue: wake_queue.clone(),
        unparker: unparker.clone(),
    }))
}

/// Single-threaded executor for cooperative tasks.
///
/// Suspended tasks wait in `waiting_tasks` until their waker, possibly called
/// from another thread, puts their id on the wake queue and unparks the
/// executor thread.
pub struct Executor {
    task_queue: VecDeque<Task>,
    waiting_tasks: BTreeMap<TaskId, Task>,
    wake_queue: Arc<SegQueue<TaskId>>,
    waker_cache: BTreeMap<TaskId, Waker>,
    parker: Parker,
}

impl Default for Executor {
    fn default() -> Executor {
        Executor::new()
    }
}

impl Executor {
    pub fn new() -> Executor {
        Executor {
            task_queue: VecDeque::new(),
            waiting_tasks: BTreeMap::new(),
            wake_queue: Arc::new(SegQueue::new()),
            waker_cache: BTreeMap::new(),
            parker: Parker::new(),
        }
    }

    pub fn spawn(&mut self, task: Task) {
        self.task_queue.push_back(task);
    }

    /// Polls every ready task once; pending ones move to `waiting_tasks`.
    fn run_ready_tasks(&mut self) {
        while let Some(mut task) = self.task_queue.pop_front() {
            let id = task.id();
            let wake_queue = &self.wake_queue;
            let unparker = self.parker.unparker();
            let waker = self
                .waker_cache
                .entry(id)
                .or_insert_with(|| task_waker(id, wake_queue, unparker))
                .clone();

            let mut context = Context::from_waker(&waker);
            match task.poll(&mut context) {
                Poll::Pending => {
                    self.waiting_tasks.insert(id, task);
                }
                Poll::Ready(()) => {
                    log::trace!("task {:?} finished", id);
                    self.waker_cache.remove(&id);
                }
            }
        }
    }

    /// Moves woken tasks from `waiting_tasks` back to the ready queue.
    fn wake_tasks(&mut self) {
        while let Ok(task_id) = self.wake_queue.pop() {
            if let Some(task) = self.waiting_tasks.remove(&task_id) {
                self.task_queue.push_back(task);
            }
        }
    }

    /// Runs until every spawned task has completed.
    ///
    /// The thread parks while all remaining tasks are suspended.
    pub fn run(&mut self) {
        loop {
            self.wake_tasks();
            self.run_ready_tasks();
            if self.waiting_tasks.is_empty() {
                return;
            }
            if self.wake_queue.is_empty() {
                self.parker.park();
            }
        }
    }
}

struct ThreadWaker(Unparker);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Runs a future to completion on the current thread.
pub fn block_on<F: Future>(future: F) -> F::Output {
    futures::pin_mut!(future);

    let parker = Parker::new();
    let waker = Waker::from(Arc::new(ThreadWaker(parker.unparker().clone())));
    let mut context = Context::from_waker(&waker);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => parker.park(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::completion::completion;
    use crate::config::Config;
    use crate::fetch::{FetchService, UserId};
    use crate::logger::Capture;
    use crate::spawn::Threads;
    use crate::suspend::await_fetch;

    #[test]
    fn run_returns_when_no_tasks() {
        let mut executor = Executor::new();

        executor.run();
    }

    #[test]
    fn runs_task_resumed_from_another_thread() {
        // Given
        let mut executor = Executor::new();
        let (resumer, suspended) = completion::<u64>();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        executor.spawn(Task::new(async move {
            *sink.borrow_mut() = suspended.await.ok();
        }));

        // When
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            resumer.resume(5).unwrap();
        });
        executor.run();
        worker.join().unwrap();

        // Then
        assert_eq!(*seen.borrow(), Some(5));
    }

    #[test]
    fn drives_concurrent_fetches_to_completion() {
        // Given
        let config = Config::default().with_latency(Duration::from_millis(10));
        let service = FetchService::new(config, Arc::new(Threads), Arc::new(Capture::new()));
        let fetched = Rc::new(RefCell::new(Vec::new()));
        let mut executor = Executor::new();
        for id in 1..=3 {
            let service = service.clone();
            let fetched = fetched.clone();
            executor.spawn(Task::new(async move {
                let id = await_fetch(&service, UserId(id)).await.unwrap();
                fetched.borrow_mut().push(id);
            }));
        }

        // When
        executor.run();

        // Then
        let mut fetched = fetched.borrow().clone();
        fetched.sort();
        assert_eq!(fetched, vec![UserId(1), UserId(2), UserId(3)]);
    }

    #[test]
    fn block_on_waits_for_cross_thread_wake() {
        let (resumer, suspended) = completion();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            resumer.resume("done").unwrap();
        });

        assert_eq!(block_on(suspended), Ok("done"));
    }
}
