use anyhow::{anyhow, Result};
use std::sync::atomic::Ordering;
use stride_core::{
    dummy::{DummyAct, DummyAgent, DummyEnv, DummyEnvConfig, DummyObs},
    error::{Component, StrideError},
    record::{BufferedRecorder, NullRecorder, Record},
    replay_buffer::{
        EpisodicBuffer, EpisodicBufferConfig, RingReplayBuffer, RingReplayBufferConfig,
    },
    Agent, Env, Evaluator, ExperienceBufferBase, Phase, ReplayBufferBase, StopHandle,
    TrainReport, Trainer, TrainerConfig,
};
use test_log::test;

type Ring = RingReplayBuffer<DummyObs, DummyAct>;
type Episodic = EpisodicBuffer<DummyObs, DummyAct>;

fn env(config: &DummyEnvConfig) -> DummyEnv {
    DummyEnv::build(config, 0).unwrap()
}

fn ring(window: usize) -> Ring {
    Ring::build(&RingReplayBufferConfig::default().window(window)).unwrap()
}

fn is_train<R>(agent: &DummyAgent) -> bool
where
    R: ReplayBufferBase,
    DummyAgent: Agent<DummyEnv, R>,
{
    <DummyAgent as Agent<DummyEnv, R>>::is_train(agent)
}

fn aborted(err: &anyhow::Error) -> Option<(Component, usize)> {
    match err.downcast_ref::<StrideError>() {
        Some(StrideError::Aborted {
            component,
            iteration,
        }) => Some((*component, *iteration)),
        _ => None,
    }
}

/// Runs training with a ring buffer and a [`DefaultEvaluator`](stride_core::DefaultEvaluator).
fn train_ring(
    trainer: &mut Trainer,
    env_config: &DummyEnvConfig,
    agent: &mut DummyAgent,
    buffer: &mut Ring,
    recorder: &mut BufferedRecorder,
) -> Result<TrainReport> {
    let mut evaluator = trainer.default_evaluator(env(&DummyEnvConfig::default()))?;
    trainer.train(env(env_config), agent, buffer, recorder, &mut evaluator)
}

/// Stops training on every evaluation.
struct StoppingEvaluator(StopHandle);

impl Evaluator<DummyEnv, DummyAgent> for StoppingEvaluator {
    fn evaluate(&mut self, _policy: &mut DummyAgent) -> Result<Record> {
        self.0.stop();
        Ok(Record::from_scalar("average_return", 0.0))
    }
}

struct FailingEvaluator;

impl Evaluator<DummyEnv, DummyAgent> for FailingEvaluator {
    fn evaluate(&mut self, _policy: &mut DummyAgent) -> Result<Record> {
        Err(anyhow!("evaluation failed"))
    }
}

#[test]
fn test_default_evaluator_episodes() -> Result<()> {
    let trainer = Trainer::build(TrainerConfig::default().num_eval_episodes(7))?;
    let evaluator = trainer.default_evaluator(env(&DummyEnvConfig::default()))?;
    assert_eq!(evaluator.n_episodes(), 7);
    Ok(())
}

#[test]
fn test_eval_resets() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(3)
        .eval_interval(1)
        .num_eval_episodes(2)
        .batch_size(2)
        .log_interval(1);
    let mut trainer = Trainer::build(config)?;
    let eval_env = env(&DummyEnvConfig::default());
    let eval_resets = eval_env.reset_counter();
    let mut evaluator = trainer.default_evaluator(eval_env)?;
    let mut agent = DummyAgent::new();
    let mut buffer = ring(1);
    let mut recorder = BufferedRecorder::new();

    let report = trainer.train(
        env(&DummyEnvConfig::default()),
        &mut agent,
        &mut buffer,
        &mut recorder,
        &mut evaluator,
    )?;

    assert_eq!(eval_resets.load(Ordering::SeqCst), 6);
    assert_eq!(agent.n_eval_actions, 18);
    assert_eq!(report.train_steps, 3);
    assert_eq!(report.average_returns, vec![(1, 3.0), (2, 3.0), (3, 3.0)]);
    assert_eq!(recorder.scalar_series("average_return").len(), 3);
    assert!(is_train::<Ring>(&agent));
    Ok(())
}

#[test]
fn test_evaluation_does_not_touch_buffer() -> Result<()> {
    let run = |eval_interval: usize| -> Result<(Vec<usize>, usize)> {
        let config = TrainerConfig::default()
            .num_iterations(6)
            .collect_steps_per_iteration(2)
            .eval_interval(eval_interval)
            .batch_size(4);
        let mut trainer = Trainer::build(config)?;
        let mut agent = DummyAgent::new();
        let mut buffer = ring(2);
        let mut recorder = BufferedRecorder::new();
        train_ring(
            &mut trainer,
            &DummyEnvConfig::default(),
            &mut agent,
            &mut buffer,
            &mut recorder,
        )?;
        let tags = buffer.iter().map(|tr| tr.observation.tag).collect();
        Ok((tags, trainer.train_step_counter()))
    };

    let (tags_eval, steps_eval) = run(1)?;
    let (tags, steps) = run(1000)?;
    assert_eq!(tags_eval.len(), 12);
    assert_eq!(tags_eval, tags);
    assert_eq!(steps_eval, 6);
    assert_eq!(steps, 6);
    Ok(())
}

#[test]
fn test_warmup() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(2)
        .initial_collect_steps(5)
        .batch_size(3);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new();
    let mut buffer = ring(2);
    let mut recorder = BufferedRecorder::new();
    assert_eq!(trainer.phase(), Phase::Warmup);

    let report = train_ring(
        &mut trainer,
        &DummyEnvConfig::default(),
        &mut agent,
        &mut buffer,
        &mut recorder,
    )?;
    assert_eq!(trainer.phase(), Phase::Train);
    assert_eq!(report.env_steps, 7);
    assert_eq!(buffer.len(), 7);
    assert_eq!(agent.batch_lens, vec![6, 6]);

    // No warm-up when training continues
    let report = train_ring(
        &mut trainer,
        &DummyEnvConfig::default(),
        &mut agent,
        &mut buffer,
        &mut recorder,
    )?;
    assert_eq!(report.env_steps, 2);
    assert_eq!(report.train_steps, 4);
    assert_eq!(buffer.len(), 9);
    Ok(())
}

#[test]
fn test_episodic_buffer_is_drained_on_every_update() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(3)
        .collect_episodes_per_iteration(2);
    let mut trainer = Trainer::build(config)?;
    let env_config = DummyEnvConfig::default().episode_lengths(vec![4, 6]);
    let mut evaluator = trainer.default_evaluator(env(&env_config))?;
    let mut agent = DummyAgent::new();
    let mut buffer = Episodic::build(&EpisodicBufferConfig::default())?;
    let mut recorder = BufferedRecorder::new();

    let report = trainer.train(
        env(&env_config),
        &mut agent,
        &mut buffer,
        &mut recorder,
        &mut evaluator,
    )?;
    assert_eq!(agent.batch_lens, vec![10, 10, 10]);
    assert_eq!(report.env_steps, 30);
    assert!(buffer.is_empty());
    Ok(())
}

#[test]
fn test_warmup_with_on_policy_buffer_is_rejected() -> Result<()> {
    let config = TrainerConfig::default().initial_collect_steps(10);
    let mut trainer = Trainer::build(config)?;
    let train_env = env(&DummyEnvConfig::default());
    let resets = train_env.reset_counter();
    let mut evaluator = trainer.default_evaluator(env(&DummyEnvConfig::default()))?;
    let mut buffer = Episodic::build(&EpisodicBufferConfig::default())?;

    let err = trainer
        .train(
            train_env,
            &mut DummyAgent::new(),
            &mut buffer,
            &mut BufferedRecorder::new(),
            &mut evaluator,
        )
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StrideError>(),
        Some(StrideError::InvalidArgument(_))
    ));
    assert_eq!(resets.load(Ordering::SeqCst), 0);
    assert_eq!(trainer.phase(), Phase::Warmup);
    Ok(())
}

#[test]
fn test_invalid_config() {
    for config in [
        TrainerConfig::default().num_iterations(0),
        TrainerConfig::default().batch_size(0),
        TrainerConfig::default().eval_interval(0),
        TrainerConfig::default().collect_episodes_per_iteration(0),
    ] {
        let err = Trainer::build(config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<StrideError>(),
            Some(StrideError::InvalidArgument(_))
        ));
    }
}

#[test]
fn test_losses_are_reported_every_log_interval() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(4)
        .log_interval(2)
        .batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let mut recorder = BufferedRecorder::new();
    let report = train_ring(
        &mut trainer,
        &DummyEnvConfig::default(),
        &mut DummyAgent::new(),
        &mut ring(1),
        &mut recorder,
    )?;

    assert_eq!(report.losses, vec![(2, 0.5), (4, 0.25)]);
    assert!(report.average_returns.is_empty());

    // Records are flushed with the log interval, aggregating two iterations each
    let series = recorder.scalar_series("loss_max");
    assert_eq!(series, vec![(2, 1.0), (4, 1.0 / 3.0)]);
    Ok(())
}

#[test]
fn test_env_error_aborts_training() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(10)
        .log_interval(1)
        .batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let env_config = DummyEnvConfig::default().fail_at_step(Some(4));
    let mut recorder = BufferedRecorder::new();
    let err = train_ring(
        &mut trainer,
        &env_config,
        &mut DummyAgent::new(),
        &mut ring(1),
        &mut recorder,
    )
    .unwrap_err();

    assert_eq!(aborted(&err), Some((Component::Collector, 4)));
    assert_eq!(err.root_cause().to_string(), "DummyEnv failed at step 4");
    assert_eq!(trainer.train_step_counter(), 4);
    assert_eq!(recorder.scalar_series("loss").len(), 4);
    Ok(())
}

#[test]
fn test_pending_records_flushed_on_error() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(10)
        .log_interval(100)
        .batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let env_config = DummyEnvConfig::default().fail_at_step(Some(4));
    let mut recorder = BufferedRecorder::new();
    let err = train_ring(
        &mut trainer,
        &env_config,
        &mut DummyAgent::new(),
        &mut ring(1),
        &mut recorder,
    )
    .unwrap_err();

    assert_eq!(aborted(&err), Some((Component::Collector, 4)));
    assert_eq!(recorder.len(), 1);
    let losses = recorder.scalar_series("loss_mean");
    assert_eq!(losses.len(), 1);
    assert_eq!(losses[0].0, 4);
    Ok(())
}

#[test]
fn test_learner_error_aborts_training() -> Result<()> {
    let config = TrainerConfig::default().num_iterations(10).batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new();
    agent.fail_at_update = Some(2);
    let mut evaluator = trainer.default_evaluator(env(&DummyEnvConfig::default()))?;
    let err = trainer
        .train(
            env(&DummyEnvConfig::default()),
            &mut agent,
            &mut ring(1),
            &mut NullRecorder::new(),
            &mut evaluator,
        )
        .unwrap_err();

    assert_eq!(aborted(&err), Some((Component::Learner, 2)));
    assert_eq!(agent.n_updates(), 2);
    Ok(())
}

#[test]
fn test_insufficient_data_aborts_training() -> Result<()> {
    let config = TrainerConfig::default().num_iterations(10).batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let err = train_ring(
        &mut trainer,
        &DummyEnvConfig::default(),
        &mut DummyAgent::new(),
        &mut ring(5),
        &mut BufferedRecorder::new(),
    )
    .unwrap_err();

    assert_eq!(aborted(&err), Some((Component::ReplayBuffer, 0)));
    assert!(matches!(
        err.root_cause().downcast_ref::<StrideError>(),
        Some(StrideError::InsufficientData {
            required: 5,
            available: 1
        })
    ));
    Ok(())
}

#[test]
fn test_evaluator_error_restores_train_mode() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(5)
        .eval_interval(3)
        .batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let mut agent = DummyAgent::new();
    let err = trainer
        .train(
            env(&DummyEnvConfig::default()),
            &mut agent,
            &mut ring(1),
            &mut BufferedRecorder::new(),
            &mut FailingEvaluator,
        )
        .unwrap_err();

    assert_eq!(aborted(&err), Some((Component::Evaluator, 3)));
    assert_eq!(err.root_cause().to_string(), "evaluation failed");
    assert!(is_train::<Ring>(&agent));
    Ok(())
}

#[test]
fn test_stop_handle() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(10)
        .eval_interval(2)
        .batch_size(1);
    let mut trainer = Trainer::build(config)?;
    let mut evaluator = StoppingEvaluator(trainer.stop_handle());
    let mut agent = DummyAgent::new();

    let report = trainer.train(
        env(&DummyEnvConfig::default()),
        &mut agent,
        &mut ring(1),
        &mut BufferedRecorder::new(),
        &mut evaluator,
    )?;
    assert!(report.stopped);
    assert_eq!(report.train_steps, 2);
    assert_eq!(agent.n_updates(), 2);

    // The flag stays set until restart
    let report = trainer.train(
        env(&DummyEnvConfig::default()),
        &mut agent,
        &mut ring(1),
        &mut BufferedRecorder::new(),
        &mut evaluator,
    )?;
    assert!(report.stopped);
    assert_eq!(report.train_steps, 2);

    trainer.restart();
    assert_eq!(trainer.train_step_counter(), 0);
    assert_eq!(trainer.phase(), Phase::Warmup);
    assert!(!trainer.stop_handle().is_stopped());
    Ok(())
}

#[test]
fn test_eval_before_training() -> Result<()> {
    let config = TrainerConfig::default()
        .num_iterations(2)
        .eval_interval(2)
        .batch_size(1)
        .eval_before_training(true);
    let mut trainer = Trainer::build(config)?;
    let mut recorder = BufferedRecorder::new();
    let report = train_ring(
        &mut trainer,
        &DummyEnvConfig::default(),
        &mut DummyAgent::new(),
        &mut ring(1),
        &mut recorder,
    )?;

    assert_eq!(report.average_returns, vec![(0, 3.0), (2, 3.0)]);
    assert_eq!(recorder.scalar_series("average_return")[0], (0, 3.0));
    Ok(())
}
