//! specport-replay: run extracted test cases against a service.
//!
//! Specs written by `specport extract` are loaded, filtered by
//! [`ReplayOptions`], sent to a [`Target`] (a base URL or an in-process
//! handler) and checked; results are reported as TAP.

pub mod client;
pub mod error;
pub mod load;
pub mod matchers;
pub mod options;
pub mod runner;
pub mod tap;

pub use client::{build_request, normalize_path, HttpRequest, HttpResponse, Target};
pub use error::ReplayError;
pub use load::{load_specs, spec_paths};
pub use matchers::{check_response, Mismatch};
pub use options::ReplayOptions;
pub use runner::{replay_dir, run_specs, RunResult};
pub use tap::{Tap, TapSummary};
