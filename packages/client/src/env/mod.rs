//! Environment configuration
//!
//! An [`Environment`] is the immutable set of operational knobs and shared
//! resources a client runs with. It is assembled by an
//! [`EnvironmentBuilder`], which resolves each knob from, in order of
//! precedence, the value set on the builder, a process-wide override under
//! the `kvlink.` namespace, and the compiled-in default.
//!
//! - `core`: read accessors shared by the builder and the environment
//! - `defaults`: compiled-in knob values
//! - `knob` / `overrides`: override keys and the concurrent override table
//! - `pool` / `scheduler` / `event`: collaborator traits and their defaults

pub mod builder;
pub mod core;
pub mod defaults;
pub mod environment;
pub mod event;
pub mod knob;
pub mod overrides;
pub mod pool;
pub mod scheduler;
pub mod settings;

pub use builder::EnvironmentBuilder;
pub use self::core::CoreEnvironment;
pub use environment::{Environment, Provenance, ShutdownSignal, live_instances, reset_instance_counter};
pub use event::{BroadcastEventBus, CoreEvent, EventBus};
pub use knob::Knob;
pub use overrides::{FromOverride, NAMESPACE, Overrides};
pub use pool::{IoPool, WorkerPool};
pub use scheduler::{ComputationScheduler, Job, Scheduler};
pub use settings::{EnvironmentSnapshot, Secret, Settings};
