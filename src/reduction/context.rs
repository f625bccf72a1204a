use std::ops::{Deref, DerefMut};

use crate::loss::loss_type::LossType;
use crate::reduction::shared::SharedData;
use crate::reduction::sink::TextSink;

/// Per-pipeline state handed explicitly to every learner call.
///
/// Holds what other stages may temporarily override (the active loss and the
/// label bounds) so overrides are visible only to calls that receive this
/// context, never to unrelated pipelines.
pub struct LearnContext {
    pub loss: LossType,
    pub sd: SharedData,
    /// False for test-only runs: `learn` still predicts but reductions skip
    /// their own credit assignment.
    pub training: bool,
    /// Set when the outer optimizer replays the data and needs every pass to
    /// see identical random draws.
    pub deterministic_sweeps: bool,
    pub raw_prediction_channel: i32,
    raw_prediction: Option<Box<dyn TextSink>>,
}

impl LearnContext {
    pub fn new(loss: LossType) -> LearnContext {
        LearnContext {
            loss,
            sd: SharedData::default(),
            training: true,
            deterministic_sweeps: false,
            raw_prediction_channel: 1,
            raw_prediction: None,
        }
    }

    pub fn with_bounds(mut self, min_label: f32, max_label: f32) -> LearnContext {
        self.sd.min_label = min_label;
        self.sd.max_label = max_label;
        self
    }

    pub fn with_raw_prediction(mut self, sink: Box<dyn TextSink>) -> LearnContext {
        self.raw_prediction = Some(sink);
        self
    }

    /// Whether raw-prediction tracing is currently enabled.
    pub fn tracing(&self) -> bool {
        self.raw_prediction.is_some()
    }

    pub fn print_raw(&mut self, text: &str, tag: &str) {
        let channel = self.raw_prediction_channel;
        if let Some(sink) = self.raw_prediction.as_mut() {
            sink.print_text(channel, text, tag);
        }
    }

    /// Detaches the raw-prediction sink, disabling tracing until it is put
    /// back with `restore_raw_prediction`.
    pub fn take_raw_prediction(&mut self) -> Option<Box<dyn TextSink>> {
        self.raw_prediction.take()
    }

    pub fn restore_raw_prediction(&mut self, sink: Option<Box<dyn TextSink>>) {
        self.raw_prediction = sink;
    }

    /// Switches to squared loss over `[min_label, max_label]` with bound
    /// updates frozen, for as long as the returned guard lives.
    pub fn hidden_unit_scope(&mut self, min_label: f32, max_label: f32) -> HiddenUnitScope<'_> {
        HiddenUnitScope::enter(self, min_label, max_label)
    }
}

/// Scoped regression override used while hidden units are trained.
///
/// Dropping the guard restores the exact loss, bounds and freeze flag that
/// were active on entry, including when a delegate call inside the scope
/// returned an error or panicked.
pub struct HiddenUnitScope<'a> {
    ctx: &'a mut LearnContext,
    saved_loss: LossType,
    saved_min: f32,
    saved_max: f32,
    saved_frozen: bool,
}

impl<'a> HiddenUnitScope<'a> {
    fn enter(ctx: &'a mut LearnContext, min_label: f32, max_label: f32) -> HiddenUnitScope<'a> {
        let scope = HiddenUnitScope {
            saved_loss: ctx.loss,
            saved_min: ctx.sd.min_label,
            saved_max: ctx.sd.max_label,
            saved_frozen: ctx.sd.bounds_frozen,
            ctx,
        };
        scope.ctx.loss = LossType::Squared;
        scope.ctx.sd.min_label = min_label;
        scope.ctx.sd.max_label = max_label;
        scope.ctx.sd.bounds_frozen = true;
        scope
    }
}

impl Deref for HiddenUnitScope<'_> {
    type Target = LearnContext;

    fn deref(&self) -> &LearnContext {
        self.ctx
    }
}

impl DerefMut for HiddenUnitScope<'_> {
    fn deref_mut(&mut self) -> &mut LearnContext {
        self.ctx
    }
}

impl Drop for HiddenUnitScope<'_> {
    fn drop(&mut self) {
        self.ctx.loss = self.saved_loss;
        self.ctx.sd.min_label = self.saved_min;
        self.ctx.sd.max_label = self.saved_max;
        self.ctx.sd.bounds_frozen = self.saved_frozen;
    }
}
