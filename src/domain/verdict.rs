//! Query outcomes and how never-observed devices are classified.

/// Host result code for a satisfied condition.
pub const RESULT_CONDITION_SATISFIED: i32 = 16;

/// Host result code for an unsatisfied condition.
pub const RESULT_CONDITION_UNSATISFIED: i32 = 17;

/// Host result code for a condition that could not be answered.
pub const RESULT_CONDITION_UNKNOWN: i32 = 18;

/// Ternary outcome of a condition query.
///
/// `Indeterminate` is a normal answer for malformed queries, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryVerdict {
    Satisfied,
    Unsatisfied,
    Indeterminate,
}

impl QueryVerdict {
    /// Classifies an observed state against the expected one.
    #[must_use]
    pub const fn compare(observed: bool, expected: bool) -> Self {
        if observed == expected {
            Self::Satisfied
        } else {
            Self::Unsatisfied
        }
    }

    /// The fixed host-visible result code for this verdict.
    #[must_use]
    pub const fn result_code(self) -> i32 {
        match self {
            Self::Satisfied => RESULT_CONDITION_SATISFIED,
            Self::Unsatisfied => RESULT_CONDITION_UNSATISFIED,
            Self::Indeterminate => RESULT_CONDITION_UNKNOWN,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Satisfied => "satisfied",
            Self::Unsatisfied => "unsatisfied",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl std::fmt::Display for QueryVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a query about a device with no recorded state is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsencePolicy {
    /// A never-observed device compares as disconnected.
    #[default]
    AsDisconnected,

    /// A never-observed device always yields [`QueryVerdict::Indeterminate`].
    Indeterminate,
}

impl AbsencePolicy {
    /// Parses the `unknown_devices` configuration value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "disconnected" => Some(Self::AsDisconnected),
            "indeterminate" | "unknown" => Some(Self::Indeterminate),
            _ => None,
        }
    }

    /// Verdict for a device whose state was never recorded.
    #[must_use]
    pub const fn classify_absent(self, expected: bool) -> QueryVerdict {
        match self {
            Self::AsDisconnected => QueryVerdict::compare(false, expected),
            Self::Indeterminate => QueryVerdict::Indeterminate,
        }
    }
}
