use std::sync::Arc;

use crossbeam::channel;
use fetch_bridge::display;
use fetch_bridge::logger::{self, Console, Sink};
use fetch_bridge::spawn::Threads;
use fetch_bridge::task::{executor, Task};
use fetch_bridge::{await_fetch, Config, FetchError, FetchService, UserId};

const USER: UserId = UserId(123);

/// Fetch with a callback; `display::show` runs on the completion worker.
fn fetch_with_callback(service: &FetchService) -> Result<(), FetchError> {
    let (done, finished) = channel::bounded(1);
    let sink = service.sink().clone();

    service.fetch(USER, move |outcome| {
        match outcome {
            Ok(id) => display::show(&*sink, id),
            Err(error) => display::report(&*sink, &error),
        }
        let _ = done.send(());
    })?;

    // Worker threads die with the process; wait for the display line.
    if finished.recv().is_err() {
        log::warn!("completion of user {} was never delivered", USER);
    }
    Ok(())
}

/// Same fetch awaited from a cooperative task; `display::show` runs in the task.
async fn fetch_with_suspension(service: FetchService) {
    match await_fetch(&service, USER).await {
        Ok(id) => display::show(&**service.sink(), id),
        Err(error) => display::report(&**service.sink(), &error),
    }
}

fn main() {
    if let Err(error) = logger::init(log::LevelFilter::Info) {
        log::warn!("keeping the installed logger: {}", error);
    }

    let sink: Arc<dyn Sink> = Arc::new(Console);
    let service = FetchService::new(Config::default(), Arc::new(Threads), sink.clone());

    if let Err(error) = fetch_with_callback(&service) {
        display::report(&*sink, &error);
    }

    let mut exec = executor::Executor::new();
    exec.spawn(Task::new(fetch_with_suspension(service)));
    exec.run();
}
