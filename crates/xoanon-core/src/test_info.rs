use std::time::SystemTime;

/// Lifecycle state of a single test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestState {
    Initial,
    Running,
    Succeeded,
    Failed,
}

impl TestState {
    pub fn name(&self) -> &'static str {
        match self {
            TestState::Initial => "INITIAL",
            TestState::Running => "RUNNING",
            TestState::Succeeded => "SUCCEEDED",
            TestState::Failed => "FAILED",
        }
    }
}

/// Information about a test. A test is uniquely identified by `id`; a
/// later `TestInfo` for the same id supersedes the earlier one for
/// display purposes.
#[derive(Clone, Debug, PartialEq)]
pub struct TestInfo {
    /// The time of the last update.
    pub time: SystemTime,
    /// The unique test id.
    pub id: String,
    /// The display name.
    pub name: String,
    pub state: TestState,
}

impl TestInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: TestState) -> Self {
        Self {
            time: SystemTime::now(),
            id: id.into(),
            name: name.into(),
            state,
        }
    }
}

/// Information about the application under test, shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub name: String,
    pub version: String,
    pub build: String,
}

impl ApplicationInfo {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: build.into(),
        }
    }
}
