use crate::errors::AppError;

/// Runtime settings collected from the environment.
///
/// The escalation thresholds are expressed in business days and feed the
/// task scheduler at construction time; nothing reads them globally.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    /// Business days before an open task is raised to supervising coordinators.
    pub task_raise_1: u32,
    /// Business days before an open task is raised to staff.
    pub task_raise_2: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let port = std::env::var("APP_PORT")
            .map(|value| value.parse::<u16>())
            .unwrap_or(Ok(8000))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        let task_raise_1 = std::env::var("TASK_RAISE_1")
            .map(|value| value.parse::<u32>())
            .unwrap_or(Ok(5))
            .map_err(|_| AppError::configuration("TASK_RAISE_1 must be a non-negative integer"))?;

        let task_raise_2 = std::env::var("TASK_RAISE_2")
            .map(|value| value.parse::<u32>())
            .unwrap_or(Ok(10))
            .map_err(|_| AppError::configuration("TASK_RAISE_2 must be a non-negative integer"))?;

        Ok(Self {
            port,
            task_raise_1,
            task_raise_2,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8000,
            task_raise_1: 5,
            task_raise_2: 10,
        }
    }
}
