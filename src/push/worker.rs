//! Background push worker.
//!
//! One named thread blocks on the push-request channel, coalesces whatever
//! is queued into a single cycle, and exits when stopped or when every
//! requester is gone.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, select};

use super::{PushRequest, drain_requests};

pub struct PushWorker {
    handle: Option<JoinHandle<()>>,
    stop_tx: Sender<()>,
}

impl PushWorker {
    /// Spawn the worker. `cycle` runs once per batch of requests.
    pub fn spawn<F>(name: &str, requests: Receiver<PushRequest>, cycle: F) -> io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded(1);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(&requests, &stop_rx, cycle))?;
        crate::debug!("push"; "worker `{}` started", name);
        Ok(Self {
            handle: Some(handle),
            stop_tx,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.stop_tx.try_send(());
        if handle.join().is_err() {
            crate::log!("error"; "push worker panicked");
        }
    }
}

impl Drop for PushWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F: Fn()>(requests: &Receiver<PushRequest>, stop: &Receiver<()>, cycle: F) {
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(requests) -> request => match request {
                Ok(request) => {
                    let coalesced = drain_requests(requests);
                    crate::debug!("push"; "cycle for {} (+{} queued)", request.vm_id, coalesced);
                    cycle();
                }
                Err(_) => break,
            },
        }
    }
    crate::debug!("push"; "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(vm_id: &str) -> PushRequest {
        PushRequest {
            vm_id: vm_id.to_string(),
        }
    }

    #[test]
    fn test_worker_runs_cycle_and_stops() {
        let (tx, rx) = channel::unbounded();
        let cycles = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = channel::unbounded();

        let counter = Arc::clone(&cycles);
        let mut worker = PushWorker::spawn("test-push", rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = done_tx.send(());
        })
        .unwrap();
        assert!(worker.is_running());

        tx.send(request("A")).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(cycles.load(Ordering::SeqCst) >= 1);

        worker.stop();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_worker_exits_when_requesters_dropped() {
        let (tx, rx) = channel::unbounded::<PushRequest>();
        let mut worker = PushWorker::spawn("test-push-drop", rx, || {}).unwrap();
        drop(tx);
        worker.stop();
        assert!(!worker.is_running());
    }
}
