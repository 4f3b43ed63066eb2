/// Job state definitions for tracking one job through the pipeline
///
/// A job moves `Received → Fetching → Extracting → Routing → Acknowledged`
/// on success, or into `Failed` from any active state and then to
/// `Acknowledged`.
use std::fmt;

/// Why a job failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The page fetch exceeded its deadline
    Timeout,

    /// The connection through the proxy failed
    Proxy,

    /// Anything else: bad payload, bad URL, network or publish failure
    Generic,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Proxy => "proxy",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the current state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// The delivery was taken off the inbound queue
    Received,

    /// The page is being fetched
    Fetching,

    /// Links are being extracted from the fetched page
    Extracting,

    /// The result is being published downstream
    Routing,

    /// The job failed and its failure is being handled
    Failed(FailureKind),

    // ===== Terminal State =====
    /// The delivery was acknowledged; nothing more happens to this job
    Acknowledged,
}

impl JobState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Acknowledged)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Self::Received, Self::Fetching)
            | (Self::Fetching, Self::Extracting)
            | (Self::Extracting, Self::Routing)
            | (Self::Routing, Self::Acknowledged)
            | (Self::Failed(_), Self::Acknowledged) => true,
            (
                Self::Received | Self::Fetching | Self::Extracting | Self::Routing,
                Self::Failed(_),
            ) => true,
            _ => false,
        }
    }

    /// Short name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Routing => "routing",
            Self::Failed(_) => "failed",
            Self::Acknowledged => "acknowledged",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "failed({})", kind),
            other => f.write_str(other.as_str()),
        }
    }
}
