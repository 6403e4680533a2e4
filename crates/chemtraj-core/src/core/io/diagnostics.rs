use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A non-fatal problem noticed while reading or writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Where the warning comes from, usually the format name.
    pub context: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

pub type WarningCallback = Arc<dyn Fn(&Warning) + Send + Sync>;

/// The sink for warnings. Every warning is logged; it is also forwarded to
/// the callback when one is installed. Cloning shares the callback.
#[derive(Clone, Default)]
pub struct Diagnostics {
    callback: Option<WarningCallback>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: WarningCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn warn(&self, context: &str, message: impl Into<String>) {
        let warning = Warning {
            context: context.to_string(),
            message: message.into(),
        };
        warn!(context = %warning.context, "{}", warning.message);
        if let Some(callback) = &self.callback {
            callback(&warning);
        }
    }
}
