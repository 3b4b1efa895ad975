//! Wizard state for one analysis session.
//!
//! `AnalysisWorkflow` is an owned value; every transition consumes it and
//! returns the next state. Callers only ever observe `loading`, `error` and
//! `result` for the outcome of a run.

use crate::step::{Step, StepStatus};
use chrono::NaiveDate;
use log::{debug, info, warn};
use wra_core::analysis::{AnalysisRequest, AnalysisResult};
use wra_core::date_range::{DateRange, DateRangeSelector, DEFAULT_MAX_DAYS};
use wra_core::error::{Result, WeatherError};
use wra_core::location::Location;
use wra_core::service::AnalysisService;
use wra_core::threshold::WeatherThreshold;

const INCOMPLETE_STEPS: &str = "Please complete all steps before analyzing";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisWorkflow {
    step: Step,
    location: Location,
    date_range: DateRange,
    /// Longest span the DateRange step accepts
    max_days: i64,
    threshold: WeatherThreshold,
    /// True only while an analysis call is outstanding
    loading: bool,
    error: Option<String>,
    result: Option<AnalysisResult>,
    /// The request behind `result`, or the one in flight
    request: Option<AnalysisRequest>,
}

impl AnalysisWorkflow {
    /// Phoenix, the default date span starting tomorrow, and the first temperature preset.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            step: Step::Location,
            location: Location::default(),
            date_range: DateRangeSelector::new(today).range(),
            max_days: DEFAULT_MAX_DAYS,
            threshold: WeatherThreshold::default(),
            loading: false,
            error: None,
            result: None,
            request: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    pub fn threshold(&self) -> &WeatherThreshold {
        &self.threshold
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn request(&self) -> Option<&AnalysisRequest> {
        self.request.as_ref()
    }

    fn rejected_while_loading(&self, what: &str) -> bool {
        if self.loading {
            warn!("ignoring {what} while an analysis is running");
        }
        self.loading
    }

    pub fn with_location(self, location: Location) -> Self {
        if self.rejected_while_loading("location change") {
            return self;
        }
        Self { location, ..self }
    }

    pub fn with_date_range(self, date_range: DateRange) -> Self {
        if self.rejected_while_loading("date range change") {
            return self;
        }
        Self { date_range, ..self }
    }

    pub fn with_max_days(self, max_days: i64) -> Self {
        if self.rejected_while_loading("range limit change") {
            return self;
        }
        Self {
            max_days: max_days.max(0),
            ..self
        }
    }

    pub fn with_threshold(self, threshold: WeatherThreshold) -> Self {
        if self.rejected_while_loading("threshold change") {
            return self;
        }
        Self { threshold, ..self }
    }

    /// Gate for leaving `step`.
    pub fn can_proceed(&self, step: Step) -> bool {
        match step {
            Step::Location => self.location.is_complete(),
            Step::DateRange => self.date_range.is_valid(self.max_days),
            Step::Threshold => self.threshold.is_known_parameter() && self.threshold.value > 0.0,
            Step::Analyze | Step::Results => true,
        }
    }

    pub fn step_status(&self, step: Step) -> StepStatus {
        if step == self.step {
            StepStatus::Current
        } else if step < self.step && self.can_proceed(step) {
            StepStatus::Completed
        } else if step < self.step {
            StepStatus::Error
        } else {
            StepStatus::Pending
        }
    }

    /// Jump to any of steps 1-4. Clears the error.
    pub fn go_to_step(self, step: Step) -> Self {
        if self.rejected_while_loading("navigation") {
            return self;
        }
        if !step.is_navigable() {
            debug!("cannot navigate directly to {step}");
            return self;
        }
        Self {
            step,
            error: None,
            ..self
        }
    }

    /// Move to the next input step when the current one is complete.
    pub fn advance(self) -> Self {
        if self.rejected_while_loading("navigation") {
            return self;
        }
        match self.step.next() {
            Some(next) if next.is_navigable() && self.can_proceed(self.step) => Self {
                step: next,
                error: None,
                ..self
            },
            Some(next) if next.is_navigable() => Self {
                error: Some(format!("Please complete the {} step first", self.step.title())),
                ..self
            },
            _ => self,
        }
    }

    /// The outgoing request, with the threshold in the parameter's canonical unit.
    pub fn prepare_request(&self) -> Result<AnalysisRequest> {
        if let Some(step) = Step::INPUTS.iter().find(|step| !self.can_proceed(**step)) {
            return Err(WeatherError::Validation(format!(
                "{INCOMPLETE_STEPS} ({} is incomplete)",
                step.title()
            )));
        }
        AnalysisRequest::build(&self.location, &self.date_range, &self.threshold)
    }

    /// Move to the Analyze step, enter `loading` and hand back the request to
    /// send. Returns `None` (with `error` set on a gate failure) when nothing
    /// should be sent.
    pub fn start_analysis(self) -> (Self, Option<AnalysisRequest>) {
        if self.rejected_while_loading("analysis request") {
            return (self, None);
        }
        match self.prepare_request() {
            Ok(request) => {
                info!(
                    "Starting analysis for {}: {} ({} {} {})",
                    request.location_name,
                    self.threshold.label,
                    request.operator,
                    request.threshold,
                    self.threshold.parameter.canonical_unit()
                );
                let next = Self {
                    step: Step::Analyze,
                    loading: true,
                    error: None,
                    request: Some(request.clone()),
                    ..self
                };
                (next, Some(request))
            }
            Err(e) => {
                warn!("analysis not started: {e}");
                (
                    Self {
                        error: Some(e.to_string()),
                        ..self
                    },
                    None,
                )
            }
        }
    }

    /// Leave `loading` with the collaborator's outcome. Success moves to
    /// Results; failure keeps the current step and any earlier result.
    pub fn finish_analysis(self, outcome: Result<AnalysisResult>) -> Self {
        if !self.loading {
            warn!("ignoring analysis outcome with no analysis running");
            return self;
        }
        let outcome = outcome.and_then(|result| match &self.request {
            Some(request) => result.validate(request).map(|_| result),
            None => Ok(result),
        });
        match outcome {
            Ok(result) => {
                info!(
                    "Analysis {} complete: overall probability {:.2}, risk {}",
                    result.analysis_id,
                    result.overall_probability(),
                    result.risk_level()
                );
                Self {
                    step: Step::Results,
                    loading: false,
                    error: None,
                    result: Some(result),
                    ..self
                }
            }
            Err(e) => {
                warn!("Analysis failed: {e}");
                Self {
                    loading: false,
                    error: Some(format!("Failed to analyze weather risk: {e}")),
                    ..self
                }
            }
        }
    }

    /// Gate, send and record the outcome in one step.
    pub async fn run_analysis<S>(self, service: &S) -> Self
    where
        S: AnalysisService + ?Sized,
    {
        let (started, request) = self.start_analysis();
        let Some(request) = request else {
            return started;
        };
        let outcome = service.analyze(&request).await;
        started.finish_analysis(outcome)
    }

    /// Back to step 1 for another run. Inputs are kept.
    pub fn reset_to_new_analysis(self) -> Self {
        if self.rejected_while_loading("reset") {
            return self;
        }
        Self {
            step: Step::Location,
            error: None,
            result: None,
            request: None,
            ..self
        }
    }
}
