//! Train [`Agent`].
mod config;
mod report;
mod stop_handle;
use crate::{
    error::{Component, StrideError},
    record::{
        AggregateRecorder, Record,
        RecordValue::{DateTime, Scalar},
    },
    Agent, CollectMode, Collector, DefaultEvaluator, Env, Evaluator, ExperienceBufferBase,
    LossInfo, ReplayBufferBase, Transition,
};
use anyhow::{Context, Result};
use chrono::Local;
pub use config::TrainerConfig;
use log::{debug, info};
pub use report::TrainReport;
pub use stop_handle::StopHandle;

/// Phase of [`Trainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Filling the replay buffer before the first optimization step.
    Warmup,

    /// Alternating collection and optimization.
    Train,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages training loop and related objects.
///
/// # Training loop
///
/// [`Trainer::train()`] runs as follows:
///
/// 0. Given an environment, an agent implementing [`Agent`], a replay buffer, a recorder
///    implementing [`AggregateRecorder`] and an evaluator implementing [`Evaluator`].
/// 1. Construct a [`Collector`] with the environment and switch the agent to training mode.
/// 2. Warm-up: if the trainer is in [`Phase::Warmup`], collect `initial_collect_steps`
///    environment steps with the agent's collect policy, then move to [`Phase::Train`].
///    On-policy buffers do not accept a warm-up.
/// 3. Repeat `num_iterations` times:
///     1. If stopping was requested with a [`StopHandle`], finish the loop.
///     2. Collect experiences as given by `collect`.
///     3. Take a batch from the replay buffer: `batch_size` random windows for the ring
///        buffer, everything stored since the last update for the episodic buffer.
///     4. Do an optimization step and increment `train_step_counter`.
///     5. If `train_step_counter % log_interval == 0`, report the loss.
///     6. If `train_step_counter % eval_interval == 0`, evaluate the agent in evaluation
///        mode and report the average return. The agent is back in training mode
///        afterwards.
///     7. Store the record of the iteration and, every `flush_record_interval` steps,
///        flush the recorder.
///
/// If any component fails, the loop stops and returns the error with
/// [`StrideError::Aborted`] as context. Records already flushed stay in the recorder.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[Collector]
///     C -->|Transition|D[ReplayBufferBase]
///     D -->|ReplayBufferBase::Batch|A
///     A -->|LossInfo|E[AggregateRecorder]
///     F[Evaluator] -->|Record|E
/// ```
///
/// * [`Collector`] asks the agent for an [`Env::Act`] given the previous [`Env::Obs`]
///   and steps the environment. This is referred to as an *environment step*.
/// * Each environment step produces a [`Transition`], which is pushed into the
///   replay buffer.
/// * Batches built by the replay buffer are consumed by [`Learner::update()`] in an
///   *optimization step*.
///
/// [`Learner::update()`]: crate::Learner::update
pub struct Trainer {
    config: TrainerConfig,
    train_step_counter: usize,
    phase: Phase,
    stop: StopHandle,
}

impl Trainer {
    /// Constructs a trainer.
    ///
    /// Fails with [`StrideError::InvalidArgument`] if the configuration has a zero
    /// count or interval.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            train_step_counter: 0,
            phase: Phase::Warmup,
            stop: StopHandle::default(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Returns the number of optimization steps done so far.
    pub fn train_step_counter(&self) -> usize {
        self.train_step_counter
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns a handle to stop the training loop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Resets the train step counter, the phase and the stop flag.
    pub fn restart(&mut self) {
        self.train_step_counter = 0;
        self.phase = Phase::Warmup;
        self.stop.clear();
    }

    /// Constructs a [`DefaultEvaluator`] running `num_eval_episodes` episodes.
    ///
    /// [`Trainer::train`] takes any [`Evaluator`], and `num_eval_episodes` takes effect
    /// only through this constructor.
    pub fn default_evaluator<E: Env>(&self, env: E) -> Result<DefaultEvaluator<E>> {
        DefaultEvaluator::new(env, self.config.num_eval_episodes)
    }

    fn evaluate<E, A, R, D>(agent: &mut A, evaluator: &mut D, step: usize) -> Result<Record>
    where
        E: Env,
        A: Agent<E, R>,
        R: ReplayBufferBase,
        D: Evaluator<E, A>,
    {
        info!("Starts evaluation at step {}", step);
        agent.eval();
        let result = evaluator.evaluate(agent);
        agent.train();
        result.with_context(|| StrideError::Aborted {
            component: Component::Evaluator,
            iteration: step,
        })
    }

    fn report_evaluation(record: &Record, step: usize, report: &mut TrainReport) {
        if let Ok(average_return) = record.get_scalar("average_return") {
            info!("step = {}, average_return = {}", step, average_return);
            report.average_returns.push((step, average_return));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_iterations<E, A, R, D>(
        &mut self,
        collector: &mut Collector<E, A>,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
        report: &mut TrainReport,
        pending: &mut bool,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
        D: Evaluator<E, A>,
    {
        let flush_interval = self.config.flush_interval();

        for _ in 0..self.config.num_iterations {
            if self.stop.is_stopped() {
                info!("Stopped at step {}", self.train_step_counter);
                report.stopped = true;
                break;
            }

            let iteration = self.train_step_counter;
            let aborted = |component| move || StrideError::Aborted {
                component,
                iteration,
            };

            let stats = collector
                .run(agent, buffer, self.config.collect)
                .with_context(aborted(Component::Collector))?;
            let batch = buffer
                .batch(self.config.batch_size)
                .with_context(aborted(Component::ReplayBuffer))?;
            let LossInfo { loss, extra } = agent
                .update(batch)
                .with_context(aborted(Component::Learner))?;
            self.train_step_counter += 1;
            report.env_steps += stats.env_steps;

            let step = self.train_step_counter;
            let mut record = stats.record().merge(extra);
            record.insert("loss", Scalar(loss));

            if step % self.config.log_interval == 0 {
                info!("step = {}, loss = {}", step, loss);
                report.losses.push((step, loss));
            }

            if step % self.config.eval_interval == 0 {
                let record_eval = Self::evaluate::<E, A, R, D>(agent, evaluator, step)?;
                Self::report_evaluation(&record_eval, step, report);
                record.merge_inplace(record_eval);
            }

            record.insert("datetime", DateTime(Local::now()));
            recorder.store(record);
            *pending = true;

            if step % flush_interval == 0 {
                recorder.flush(step as _);
                *pending = false;
            }
        }
        Ok(())
    }

    /// Train the agent.
    ///
    /// The train step counter and the phase persist across calls, so that a second
    /// call continues training without a warm-up.
    pub fn train<E, A, R, D>(
        &mut self,
        env: E,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<TrainReport>
    where
        E: Env,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
        D: Evaluator<E, A>,
    {
        let warmup_steps = match self.phase {
            Phase::Warmup => self.config.initial_collect_steps,
            Phase::Train => 0,
        };
        if R::ON_POLICY && warmup_steps > 0 {
            return Err(StrideError::InvalidArgument(
                "initial_collect_steps must be zero with an on-policy buffer".to_string(),
            )
            .into());
        }

        let mut collector = Collector::<E, A>::new(env);
        let mut report = TrainReport::default();
        let mut pending = false;
        agent.train();

        if self.phase == Phase::Warmup {
            if warmup_steps > 0 {
                info!("Warm-up: collecting {} steps", warmup_steps);
                let iteration = self.train_step_counter;
                let stats = collector
                    .run(agent, buffer, CollectMode::Steps(warmup_steps))
                    .with_context(|| StrideError::Aborted {
                        component: Component::Collector,
                        iteration,
                    })?;
                debug!("Warm-up finished with {} episodes", stats.episodes);
                report.env_steps += stats.env_steps;
            }
            self.phase = Phase::Train;

            if self.config.eval_before_training {
                let step = self.train_step_counter;
                let mut record = Self::evaluate::<E, A, R, D>(agent, evaluator, step)?;
                Self::report_evaluation(&record, step, &mut report);
                record.insert("datetime", DateTime(Local::now()));
                recorder.store(record);
                recorder.flush(step as _);
            }
        }

        let result = self.run_iterations::<E, A, R, D>(
            &mut collector,
            agent,
            buffer,
            recorder,
            evaluator,
            &mut report,
            &mut pending,
        );

        // Records of completed iterations are kept when an iteration fails.
        if pending {
            recorder.flush(self.train_step_counter as _);
        }
        result?;

        report.train_steps = self.train_step_counter;
        info!(
            "Finished training: {} steps, {} environment steps",
            report.train_steps, report.env_steps
        );
        Ok(report)
    }
}
