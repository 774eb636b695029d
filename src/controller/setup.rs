use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

/// One-time derived-view setup progress of a track controller.
///
/// `Failed` is retryable: the next bounds change runs setup again, and the
/// attempt counter keeps growing until setup succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SetupState {
    #[default]
    Uninitialized,
    SettingUp,
    Ready,
    Failed {
        attempts: u32,
        last_error: String,
    },
}

impl SetupState {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    #[must_use]
    pub fn failed_attempts(&self) -> u32 {
        match self {
            Self::Failed { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// Enters `SettingUp`, returning the number of earlier failed attempts.
    pub(crate) fn begin(&mut self) -> u32 {
        let prior_failures = self.failed_attempts();
        *self = Self::SettingUp;
        prior_failures
    }

    pub(crate) fn complete(&mut self, prior_failures: u32, outcome: &PipelineResult<()>) {
        *self = match outcome {
            Ok(()) => Self::Ready,
            Err(err) => Self::Failed {
                attempts: prior_failures + 1,
                last_error: err.to_string(),
            },
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedViewKind {
    View,
    VirtualTable,
}

/// Relation a controller created in the query engine during setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedView {
    pub name: String,
    pub kind: DerivedViewKind,
}

impl DerivedView {
    #[must_use]
    pub fn drop_statement(&self) -> String {
        match self.kind {
            DerivedViewKind::View => format!("drop view if exists {};", self.name),
            DerivedViewKind::VirtualTable => format!("drop table if exists {};", self.name),
        }
    }
}
