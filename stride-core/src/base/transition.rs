//! Transition.

/// One environment step as stored in replay buffers.
///
/// `observation` is the observation the action was computed from; `reward`, `discount`
/// and `is_last` come from the step that followed. A transition with `is_last == true`
/// closes an episode, and the next transition produced by the same
/// [`Collector`](crate::Collector) has `is_first == true`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation before the step.
    pub observation: O,

    /// Action taken.
    pub action: A,

    /// Reward.
    pub reward: f32,

    /// Discount.
    pub discount: f32,

    /// If the transition starts an episode.
    pub is_first: bool,

    /// If the transition ends an episode.
    pub is_last: bool,
}
