/// Receives progress percentages in `[0, 100]`.
pub trait ProgressSink {
    fn report(&mut self, percent: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, percent: f64) {
        self(percent)
    }
}

/// Enforces the progress contract on top of a caller sink.
///
/// Values are clamped and only strictly increasing ones pass. Everything before
/// [`ProgressReporter::done`] is capped at [`ProgressReporter::FINALIZING`], so 100 is only ever
/// seen after a successful run.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    last: Option<f64>,
}

impl<'a> ProgressReporter<'a> {
    pub const SYNTHESIZING: f64 = 10.0;
    pub const AUDIO_READY: f64 = 40.0;
    pub const COMPOSITING: f64 = 50.0;
    pub const FINALIZING: f64 = 90.0;
    pub const DONE: f64 = 100.0;

    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink, last: None }
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn emit(&mut self, percent: f64) {
        if percent.is_nan() {
            return;
        }
        self.push(percent.clamp(0.0, Self::FINALIZING));
    }

    /// Ramp across the compositing window for `completion` in `[0, 1]`.
    pub fn compositing(&mut self, completion: f64) {
        let c = if completion.is_finite() {
            completion.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.emit(Self::COMPOSITING + c * (Self::FINALIZING - Self::COMPOSITING));
    }

    pub fn done(&mut self) {
        self.push(Self::DONE);
    }

    fn push(&mut self, value: f64) {
        if self.last.is_some_and(|l| value <= l) {
            return;
        }
        self.last = Some(value);
        self.sink.report(value);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
