/// Background geometry loading.
///
/// Each file is parsed on its own thread; results come back over a channel
/// and are applied to the store on the render loop, one completion per load.
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::debug;
use strata_core::loader::{self, StlLoader};
use strata_core::{GeometryLoadError, LoadTicket, Mesh};

/// A finished load, tagged with the ticket it was started for
pub struct CompletedLoad {
    pub ticket: LoadTicket,
    pub result: Result<Mesh, GeometryLoadError>,
}

pub struct LoadQueue {
    tx: Sender<CompletedLoad>,
    rx: Receiver<CompletedLoad>,
    in_flight: usize,
}

impl LoadQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Read and parse `path` off the render loop
    pub fn spawn(&mut self, ticket: LoadTicket, path: PathBuf) {
        let tx = self.tx.clone();
        self.in_flight += 1;
        debug!("loading {} for layer {}", path.display(), ticket.layer);

        thread::spawn(move || {
            let result = loader::load_path(&StlLoader, &path);
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(CompletedLoad { ticket, result });
        });
    }

    /// Completed loads received since the last call, without blocking
    pub fn drain(&mut self) -> Vec<CompletedLoad> {
        let done: Vec<CompletedLoad> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}
