/// Summary of a call to [`Trainer::train()`](super::Trainer::train).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// Value of the train step counter when the loop returned.
    pub train_steps: usize,

    /// Environment steps taken by the collector, including the warm-up.
    pub env_steps: usize,

    /// `(step, loss)` emitted every `log_interval` optimization steps.
    pub losses: Vec<(usize, f32)>,

    /// `(step, average_return)` emitted at every evaluation.
    pub average_returns: Vec<(usize, f32)>,

    /// `true` if the loop ended through a [`StopHandle`](super::StopHandle).
    pub stopped: bool,
}
