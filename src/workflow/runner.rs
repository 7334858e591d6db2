//! Fail-fast sub-step composition.
//!
//! [`StepWorkflow`] chains sub-steps in declared order. Each sub-step runs
//! only after its predecessor succeeded; the first failure is forwarded
//! untouched as the workflow's response and nothing after it runs. Payload
//! types are threaded through the chain at compile time: a
//! [`ConsumingSubStep`] can only follow a step whose output it accepts.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::PolarisError;

use super::response::SubStepResponse;

/// A sub-step that needs no input from its predecessor.
pub trait SubStep {
    /// Payload produced on success.
    type Output;

    /// Name used in logs and payload errors.
    fn name(&self) -> &str;

    /// Run the sub-step.
    fn run(&mut self) -> SubStepResponse<Self::Output>;
}

/// A sub-step that consumes the payload of its predecessor.
pub trait ConsumingSubStep {
    /// Payload consumed from the previous sub-step.
    type Input;

    /// Payload produced on success.
    type Output;

    /// Name used in logs and payload errors.
    fn name(&self) -> &str;

    /// Run the sub-step with the previous payload.
    fn run(&mut self, input: Self::Input) -> SubStepResponse<Self::Output>;
}

/// Closure-backed [`SubStep`], built with [`executing`].
pub struct FnStep<F> {
    name: &'static str,
    f: F,
}

impl<F, T> SubStep for FnStep<F>
where
    F: FnMut() -> SubStepResponse<T>,
{
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    fn run(&mut self) -> SubStepResponse<T> {
        (self.f)()
    }
}

/// Closure-backed [`ConsumingSubStep`], built with [`consuming`].
pub struct FnConsumingStep<F, I> {
    name: &'static str,
    f: F,
    _input: PhantomData<fn(I)>,
}

impl<F, I, O> ConsumingSubStep for FnConsumingStep<F, I>
where
    F: FnMut(I) -> SubStepResponse<O>,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &str {
        self.name
    }

    fn run(&mut self, input: I) -> SubStepResponse<O> {
        (self.f)(input)
    }
}

/// Wrap a closure as a sub-step that takes no input.
pub fn executing<F, T>(name: &'static str, f: F) -> FnStep<F>
where
    F: FnMut() -> SubStepResponse<T>,
{
    FnStep { name, f }
}

/// Wrap a closure as a sub-step that consumes the previous payload.
pub fn consuming<F, I, O>(name: &'static str, f: F) -> FnConsumingStep<F, I>
where
    F: FnMut(I) -> SubStepResponse<O>,
{
    FnConsumingStep {
        name,
        f,
        _input: PhantomData,
    }
}

/// An ordered, fail-fast chain of sub-steps.
///
/// Built once per build invocation and consumed by [`run`](Self::run).
///
/// # Example
///
/// ```
/// use polaris_step::workflow::{executing, StepWorkflow, SubStepResponse};
/// use polaris_step::PolarisError;
///
/// let response = StepWorkflow::first(executing("prepare", || SubStepResponse::<()>::success_empty()))
///     .then(executing("fail", || SubStepResponse::<u8>::failure(PolarisError::Interrupted)))
///     .then(executing("never", || -> SubStepResponse<u8> { unreachable!() }))
///     .run();
///
/// assert!(response.is_failure());
/// ```
pub struct StepWorkflow<'a, T> {
    steps: Vec<String>,
    chain: Box<dyn FnOnce() -> SubStepResponse<T> + 'a>,
}

impl<'a, T: 'a> StepWorkflow<'a, T> {
    /// Start a workflow with its first sub-step.
    pub fn first<S>(step: S) -> Self
    where
        S: SubStep<Output = T> + 'a,
    {
        let mut step = step;
        Self {
            steps: vec![step.name().to_string()],
            chain: Box::new(move || invoke(&mut step)),
        }
    }

    /// Append a sub-step that ignores the current payload.
    pub fn then<S>(self, step: S) -> StepWorkflow<'a, S::Output>
    where
        S: SubStep + 'a,
        S::Output: 'a,
    {
        let mut step = step;
        let StepWorkflow { mut steps, chain } = self;
        steps.push(step.name().to_string());

        StepWorkflow {
            steps,
            chain: Box::new(move || match chain() {
                SubStepResponse::Failure(cause) => SubStepResponse::Failure(cause),
                SubStepResponse::Success(_) | SubStepResponse::SuccessEmpty => invoke(&mut step),
            }),
        }
    }

    /// Append a sub-step that consumes the current payload.
    ///
    /// If the previous sub-step succeeded without a payload, the workflow
    /// fails with [`PolarisError::MissingPayload`] instead of running `step`.
    pub fn then_consume<S>(self, step: S) -> StepWorkflow<'a, S::Output>
    where
        S: ConsumingSubStep<Input = T> + 'a,
        S::Output: 'a,
    {
        let mut step = step;
        let StepWorkflow { mut steps, chain } = self;
        steps.push(step.name().to_string());

        StepWorkflow {
            steps,
            chain: Box::new(move || match chain() {
                SubStepResponse::Failure(cause) => SubStepResponse::Failure(cause),
                SubStepResponse::SuccessEmpty => SubStepResponse::Failure(
                    PolarisError::MissingPayload {
                        step: step.name().to_string(),
                    },
                ),
                SubStepResponse::Success(payload) => invoke_consuming(&mut step, payload),
            }),
        }
    }

    /// Append a pass-through sub-step only when one is given.
    pub fn then_optionally<S>(self, step: Option<S>) -> Self
    where
        S: ConsumingSubStep<Input = T, Output = T> + 'a,
    {
        match step {
            Some(step) => self.then_consume(step),
            None => self,
        }
    }

    /// Names of the sub-steps in execution order.
    pub fn step_names(&self) -> &[String] {
        &self.steps
    }

    /// Run every sub-step in order and return the terminal response.
    pub fn run(self) -> SubStepResponse<T> {
        debug!(steps = ?self.steps, "Running workflow");
        let response = (self.chain)();
        match response.cause() {
            Some(cause) => debug!(%cause, "Workflow failed"),
            None => debug!("Workflow succeeded"),
        }
        response
    }
}

fn invoke<S: SubStep>(step: &mut S) -> SubStepResponse<S::Output> {
    debug!(step = step.name(), "Running sub-step");
    let response = step.run();
    log_outcome(step.name(), &response);
    response
}

fn invoke_consuming<S: ConsumingSubStep>(step: &mut S, input: S::Input) -> SubStepResponse<S::Output> {
    debug!(step = step.name(), "Running sub-step");
    let response = step.run(input);
    log_outcome(step.name(), &response);
    response
}

fn log_outcome<T>(name: &str, response: &SubStepResponse<T>) {
    match response {
        SubStepResponse::Success(_) => debug!(step = name, "Sub-step succeeded"),
        SubStepResponse::SuccessEmpty => debug!(step = name, "Sub-step succeeded without payload"),
        SubStepResponse::Failure(cause) => debug!(step = name, %cause, "Sub-step failed"),
    }
}
