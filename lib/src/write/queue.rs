use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Identifies one registered write unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit that has finished, as seen by [`WriteQueue::wait()`].
#[derive(Debug)]
pub struct Completion {
    pub id: UnitId,
    /// The output path the unit wrote.
    pub path: PathBuf,
    /// How many units have completed so far, this one included.
    pub position: usize,
    /// How many units were registered when this one completed.
    pub total: usize,
}

/// The registry of in-flight write units.
///
/// Every unit gets a [`Signal`] at registration, moved into whatever runs the
/// unit. Firing the signal, explicitly or by dropping it, reports the unit as
/// complete. [`WriteQueue::wait()`] blocks until every registered unit has
/// reported, observing completions in the order they happen.
pub struct WriteQueue {
    registry: Mutex<Registry>,
    sender: Sender<UnitId>,
    receiver: Mutex<Receiver<UnitId>>,
}

#[derive(Default)]
struct Registry {
    in_flight: FxHashMap<UnitId, PathBuf>,
    registered: usize,
    completed: usize,
}

/// A unit's single-use completion signal.
#[must_use = "dropping a signal completes its unit"]
pub struct Signal {
    id: UnitId,
    sender: Sender<UnitId>,
}

impl WriteQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        WriteQueue {
            registry: Mutex::new(Registry::default()),
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Registers a unit that will write `path`.
    pub fn register<P: Into<PathBuf>>(&self, path: P) -> Signal {
        let mut registry = self.registry.lock();
        let id = UnitId(registry.registered);
        registry.registered += 1;
        registry.in_flight.insert(id, path.into());
        Signal { id, sender: self.sender.clone() }
    }

    /// The number of units registered so far.
    pub fn registered(&self) -> usize {
        self.registry.lock().registered
    }

    /// The number of registered units whose completion hasn't been observed
    /// by [`WriteQueue::wait()`] yet.
    pub fn in_flight(&self) -> usize {
        self.registry.lock().in_flight.len()
    }

    /// Blocks until every registered unit has completed, calling
    /// `on_complete` once per unit as each completion is observed. Returns
    /// the number of completions observed by this call.
    ///
    /// Units registered while waiting, say by a completion callback, are
    /// waited on as well.
    pub fn wait<F: FnMut(&Completion)>(&self, mut on_complete: F) -> usize {
        let receiver = self.receiver.lock();
        let mut observed = 0;
        while self.in_flight() > 0 {
            // `self.sender` is alive, so the channel can't disconnect.
            let Ok(id) = receiver.recv() else { break };
            let completion = {
                let mut registry = self.registry.lock();
                let Some(path) = registry.in_flight.remove(&id) else {
                    tracing::warn!("completion for unknown write unit {id}");
                    continue;
                };

                registry.completed += 1;
                Completion { id, path, position: registry.completed, total: registry.registered }
            };

            observed += 1;
            tracing::trace!(unit = %completion.id, "wrote {}", completion.path.display());
            on_complete(&completion);
        }

        observed
    }
}

impl Default for WriteQueue {
    fn default() -> Self {
        WriteQueue::new()
    }
}

impl fmt::Debug for WriteQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("WriteQueue")
            .field("registered", &registry.registered)
            .field("completed", &registry.completed)
            .field("in_flight", &registry.in_flight.len())
            .finish()
    }
}

impl Signal {
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Reports the unit as complete.
    pub fn complete(self) {
        drop(self)
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        // The receiver only goes away with the queue, after which nobody is
        // waiting on this unit.
        let _ = self.sender.send(self.id);
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.id).finish()
    }
}

impl Completion {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
