//! `tillbook-sync` — the offline mutation queue and its drain.
//!
//! Every local mutation leaves an entry in a durable queue; when the host
//! reports the network back, the drain pushes unsynced records through a
//! transport and flips their `synced` flags. The transport is a seam: no
//! real backend protocol exists yet, so the only shipped implementation
//! simulates one.

pub mod connectivity;
pub mod drain;
pub mod entry;
pub mod error;
pub mod queue;
pub mod transport;
pub mod worker;

pub use connectivity::{ConnectivityState, ConnectivityWatcher};
pub use drain::{DrainReport, SyncEngine};
pub use entry::{QueueStatus, SyncQueueEntry};
pub use error::{SyncError, SyncResult};
pub use queue::SyncQueue;
pub use transport::{PushedRecord, SimulatedTransport, SyncTransport};
pub use worker::{SyncEvent, SyncWorker, SyncWorkerHandle};
