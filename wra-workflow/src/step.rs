use std::fmt;

/// Wizard steps, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Location = 1,
    DateRange = 2,
    Threshold = 3,
    Analyze = 4,
    Results = 5,
}

/// How a step is shown relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Current,
    Completed,
    Error,
    Pending,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Location,
        Step::DateRange,
        Step::Threshold,
        Step::Analyze,
        Step::Results,
    ];

    /// Steps whose gate must pass before an analysis can run.
    pub const INPUTS: [Step; 3] = [Step::Location, Step::DateRange, Step::Threshold];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Step> {
        Step::ALL.iter().copied().find(|step| step.number() == n)
    }

    pub fn next(&self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Location => "Location",
            Step::DateRange => "Date Range",
            Step::Threshold => "Threshold",
            Step::Analyze => "Analyze",
            Step::Results => "Results",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Step::Location => "Search for location",
            Step::DateRange => "Select analysis period",
            Step::Threshold => "Set weather criteria",
            Step::Analyze => "Run analysis",
            Step::Results => "View predictions",
        }
    }

    /// Only the results step is unreachable by direct navigation.
    pub fn is_navigable(&self) -> bool {
        *self != Step::Results
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}
