//! Worker units: where the fetch service runs its blocking and completion work.

use std::io;
use std::thread;

use crossbeam::queue::SegQueue;

use crate::logger;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Spawn: Send + Sync {
    /// Starts `job` on an independent worker unit called `name`.
    ///
    /// Must not run `job` before returning.
    fn spawn(&self, name: &str, job: Job) -> io::Result<()>;
}

/// One named OS thread per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct Threads;

impl Spawn for Threads {
    fn spawn(&self, name: &str, job: Job) -> io::Result<()> {
        thread::Builder::new().name(name.to_string()).spawn(job)?;
        log::debug!("spawned worker thread {}", name);
        Ok(())
    }
}

/// Deterministic worker units for tests.
///
/// Jobs wait in a queue until [`Queued::run_pending`] runs them on the calling
/// thread, each one logging under its worker name.
pub struct Queued {
    jobs: SegQueue<(String, Job)>,
}

impl Queued {
    pub fn new() -> Queued {
        Queued {
            jobs: SegQueue::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Runs queued jobs, including ones they queue, until none are left.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok((name, job)) = self.jobs.pop() {
            let previous = logger::set_context_name(Some(&name));
            job();
            logger::set_context_name(previous.as_deref());
            ran += 1;
        }
        ran
    }
}

impl Default for Queued {
    fn default() -> Queued {
        Queued::new()
    }
}

impl Spawn for Queued {
    fn spawn(&self, name: &str, job: Job) -> io::Result<()> {
        self.jobs.push((name.to_string(), job));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossbeam::channel;

    use super::*;
    use crate::logger::LogContext;

    #[test]
    fn threads_run_job_on_named_thread() {
        // Given
        let (sender, receiver) = channel::unbounded();

        // When
        Threads
            .spawn(
                "work",
                Box::new(move || {
                    sender.send(LogContext::current().thread).unwrap();
                }),
            )
            .unwrap();

        // Then
        assert_eq!(receiver.recv().unwrap(), "work");
    }

    #[test]
    fn queued_defers_until_run_pending() {
        // Given
        let queued = Queued::new();
        let (sender, receiver) = channel::unbounded();

        // When
        queued
            .spawn("work", Box::new(move || sender.send(()).unwrap()))
            .unwrap();

        // Then
        assert!(receiver.try_recv().is_err());
        assert_eq!(queued.pending(), 1);
        assert_eq!(queued.run_pending(), 1);
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn queued_runs_nested_jobs_under_their_names() {
        // Given
        let queued = Arc::new(Queued::new());
        let (sender, receiver) = channel::unbounded();
        let inner = queued.clone();

        // When
        queued
            .spawn(
                "work",
                Box::new(move || {
                    sender.send(LogContext::current().thread).unwrap();
                    inner
                        .spawn(
                            "ui",
                            Box::new(move || sender.send(LogContext::current().thread).unwrap()),
                        )
                        .unwrap();
                }),
            )
            .unwrap();
        let ran = queued.run_pending();

        // Then
        assert_eq!(ran, 2);
        assert_eq!(receiver.iter().collect::<Vec<_>>(), vec!["work", "ui"]);
    }
}
