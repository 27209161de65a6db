/// Events emitted while a protocol or a standalone MD run makes progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// A protocol stage begins. `index` counts from zero.
    StageStart { index: usize, name: &'static str },
    /// A protocol stage ended with the pose at `score`.
    StageFinish { index: usize, score: f64 },

    MdStart { total_steps: usize },
    /// Thermodynamic state at a reporting step (K, kcal/mol).
    MdSnapshot {
        step: usize,
        temperature: f64,
        total_energy: f64,
    },
    MdFinish { final_temperature: f64 },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback; silent without one.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::MdStart { total_steps: 10 });
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            reporter.report(Progress::StageStart {
                index: 0,
                name: "Molecular Dynamics",
            });
            reporter.report(Progress::MdSnapshot {
                step: 10,
                temperature: 301.5,
                total_energy: -12.0,
            });
            reporter.report(Progress::StageFinish {
                index: 0,
                score: -12.5,
            });
        }
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Progress::StageStart { index: 0, .. }));
        assert!(matches!(events[1], Progress::MdSnapshot { step: 10, .. }));
        assert_eq!(
            events[2],
            Progress::StageFinish {
                index: 0,
                score: -12.5
            }
        );
    }
}
