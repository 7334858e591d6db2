//! Sub-step workflow engine.
//!
//! A workflow is an ordered, fail-fast chain of sub-steps that produces one
//! terminal [`SubStepResponse`]:
//!
//! - [`SubStepResponse`] - The outcome envelope every sub-step returns
//! - [`SubStep`] - A sub-step that needs no input
//! - [`ConsumingSubStep`] - A sub-step that consumes the previous payload
//! - [`StepWorkflow`] - Composes sub-steps and runs them in declared order
//!
//! # Example
//!
//! ```
//! use polaris_step::workflow::{consuming, executing, StepWorkflow, SubStepResponse};
//!
//! let response = StepWorkflow::first(executing("answer", || SubStepResponse::success(21)))
//!     .then_consume(consuming("double", |n: i32| SubStepResponse::success(n * 2)))
//!     .run();
//!
//! assert_eq!(response.payload(), Some(&42));
//! ```

pub mod response;
pub mod runner;

pub use response::SubStepResponse;
pub use runner::{consuming, executing, ConsumingSubStep, FnConsumingStep, FnStep, StepWorkflow, SubStep};
