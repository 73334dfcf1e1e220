//! Step registry and action contract.
//!
//! - [`StepAction`] - The work performed by one step
//! - [`Step`] - A step name bound to its action
//! - [`StepRegistry`] - Canonical, append-only mapping of names to actions
//! - [`StepOrder`] - Append-only order of released step names
//!
//! # Example
//!
//! ```
//! use stepwise::steps::StepRegistry;
//!
//! let registry = StepRegistry::builder()
//!     .step("read_file", || Ok(true))
//!     .step("exit", || Ok(true))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.terminal(), Some("exit"));
//! ```

pub mod action;
pub mod order;
pub mod registry;

pub use action::{ActionOutcome, Step, StepAction};
pub use order::StepOrder;
pub use registry::{StepRegistry, StepRegistryBuilder};
