use std::fmt;

/// Roster-changing operations. Each one sets the dashboard busy flag while
/// in flight and triggers a roster refresh when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppAction {
    Deploy,
    Stop,
    Delete,
    Create,
}

impl AppAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Stop => "stop",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }
}

impl fmt::Display for AppAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destructive operations that wait for an explicit confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteApp(String),
    ResetPassword(String),
}

impl ConfirmAction {
    pub fn app(&self) -> &str {
        match self {
            Self::DeleteApp(name) | Self::ResetPassword(name) => name,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::DeleteApp(_) => "Delete App",
            Self::ResetPassword(_) => "Reset Password",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::DeleteApp(name) => {
                format!("Delete {name}? This will stop and remove the app and its configuration.")
            }
            Self::ResetPassword(name) => {
                format!("Reset the password for {name}? The current password stops working.")
            }
        }
    }
}

pub const DUPLICATE_NAME_MESSAGE: &str = "This app name already exists.";

/// Buffer of the "new app" dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDialog {
    pub name: String,
}

impl CreateDialog {
    pub fn trimmed(&self) -> &str {
        self.name.trim()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// One-line status message shown under the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
