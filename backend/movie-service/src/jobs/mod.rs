//! Background work over a Redis-backed task queue.
//!
//! The API publishes [`TaskEnvelope`]s after its transactions commit; the
//! `task-worker` binary consumes them and the `task-scheduler` binary
//! promotes delayed retries and enqueues periodic maintenance.

pub mod cleanup;
pub mod queue;
pub mod scheduler;
pub mod tasks;
pub mod worker;

pub use queue::{QueueError, RedisTaskQueue, TaskDispatcher, TaskPublisher};
pub use tasks::{Task, TaskEnvelope};
pub use worker::{EmailTaskHandler, TaskHandler, Worker};
