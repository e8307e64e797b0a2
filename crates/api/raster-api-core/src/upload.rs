//! Asynchronous resource uploads.
//!
//! Decoding and uploading images happens on a worker thread. The main thread only ever polls an
//! [`UploadTicket`]: until the worker fulfils it, a [`Value::Pending`](crate::Value::Pending)
//! holding the ticket resolves to "no value" rather than blocking the frame.

use std::fmt;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::resource::ResourceHandle;

/// Shared slot that becomes ready exactly once.
#[derive(Clone, Default)]
pub struct UploadTicket {
    slot: Arc<OnceLock<ResourceHandle>>,
}

impl UploadTicket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn handle(&self) -> Option<ResourceHandle> {
        self.slot.get().cloned()
    }

    /// Store the finished handle. Returns `false` if the ticket was already fulfilled.
    pub fn fulfil(&self, handle: ResourceHandle) -> bool {
        self.slot.set(handle).is_ok()
    }
}

impl PartialEq for UploadTicket {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for UploadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTicket")
            .field("ready", &self.is_ready())
            .finish()
    }
}

type UploadJob = Box<dyn FnOnce() -> Option<ResourceHandle> + Send>;

/// Single worker thread that runs upload jobs in submission order.
pub struct AsyncUploader {
    sender: Option<Sender<(UploadTicket, UploadJob)>>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncUploader {
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel::<(UploadTicket, UploadJob)>();
        let worker = thread::spawn(move || {
            debug!("async uploader started");
            for (ticket, job) in receiver {
                match job() {
                    Some(handle) => {
                        ticket.fulfil(handle);
                    }
                    None => warn!("upload job produced no resource"),
                }
            }
            debug!("async uploader stopped");
        });
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queue `job` and return the ticket it will fulfil.
    pub fn submit<F>(&self, job: F) -> UploadTicket
    where
        F: FnOnce() -> Option<ResourceHandle> + Send + 'static,
    {
        let ticket = UploadTicket::new();
        if let Some(sender) = &self.sender {
            if sender.send((ticket.clone(), Box::new(job))).is_err() {
                warn!("async uploader is gone; ticket will never be ready");
            }
        }
        ticket
    }
}

impl Drop for AsyncUploader {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("async uploader thread panicked");
            }
        }
    }
}
