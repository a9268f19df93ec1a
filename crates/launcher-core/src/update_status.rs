//! Update lifecycle as an explicit state machine.
//!
//! One cycle runs `Idle → Checking → {Available → Downloading → Downloaded}
//! | NotAvailable`, and any stage may fall into `Error`. Every accepted event
//! produces exactly one [`UpdateStatus`] for observers; rejected events
//! produce nothing.

use serde::Serialize;
use thiserror::Error;

use crate::shell_locale::ShellTexts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStage {
    Idle,
    Checking,
    Available,
    NotAvailable,
    Downloading,
    Downloaded,
    Error,
}

impl UpdateStage {
    /// Stages after which a new check may start.
    pub fn is_cycle_finished(self) -> bool {
        matches!(
            self,
            Self::Idle | Self::NotAvailable | Self::Downloaded | Self::Error
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    #[serde(rename = "status")]
    pub stage: UpdateStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

/// What the update collaborator reported.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    CheckStarted,
    Available { version: String },
    NotAvailable { current_version: String },
    Progress { percent: f64 },
    Downloaded { version: String },
    Failed { detail: String },
}

impl UpdateEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::CheckStarted => "check-started",
            Self::Available { .. } => "available",
            Self::NotAvailable { .. } => "not-available",
            Self::Progress { .. } => "progress",
            Self::Downloaded { .. } => "downloaded",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("update event '{event}' is not valid in stage {stage:?}")]
pub struct RejectedTransition {
    pub event: &'static str,
    pub stage: UpdateStage,
}

#[derive(Debug)]
pub struct UpdateStateMachine {
    stage: UpdateStage,
    progress: Option<u8>,
    texts: ShellTexts,
}

impl UpdateStateMachine {
    pub fn new(texts: ShellTexts) -> Self {
        Self {
            stage: UpdateStage::Idle,
            progress: None,
            texts,
        }
    }

    pub fn stage(&self) -> UpdateStage {
        self.stage
    }

    pub fn set_texts(&mut self, texts: ShellTexts) {
        self.texts = texts;
    }

    pub fn apply(&mut self, event: UpdateEvent) -> Result<UpdateStatus, RejectedTransition> {
        let rejected = RejectedTransition {
            event: event.name(),
            stage: self.stage,
        };

        let status = match (self.stage, event) {
            (stage, UpdateEvent::CheckStarted) if stage.is_cycle_finished() => {
                self.progress = None;
                self.status(UpdateStage::Checking, self.texts.update_checking.to_string())
            }
            (UpdateStage::Checking, UpdateEvent::Available { version }) => self
                .status(UpdateStage::Available, self.texts.available(&version))
                .with_version(version),
            (UpdateStage::Checking, UpdateEvent::NotAvailable { current_version }) => self
                .status(
                    UpdateStage::NotAvailable,
                    self.texts.update_not_available.to_string(),
                )
                .with_version(current_version),
            (
                UpdateStage::Available | UpdateStage::Downloading,
                UpdateEvent::Progress { percent },
            ) => {
                let progress = self.next_progress(percent);
                self.status(UpdateStage::Downloading, self.texts.downloading(progress))
                    .with_progress(progress)
            }
            (UpdateStage::Downloading, UpdateEvent::Downloaded { version }) => self
                .status(
                    UpdateStage::Downloaded,
                    self.texts.update_downloaded.to_string(),
                )
                .with_version(version),
            (stage, UpdateEvent::Failed { detail }) if stage != UpdateStage::Error => {
                tracing::warn!("update cycle failed in stage {stage:?}: {detail}");
                self.status(UpdateStage::Error, self.texts.update_error.to_string())
            }
            _ => return Err(rejected),
        };

        self.stage = status.stage;
        if status.stage != UpdateStage::Downloading {
            self.progress = None;
        }
        Ok(status)
    }

    /// Rounds, bounds and clamps so progress never goes backwards in a cycle.
    fn next_progress(&mut self, percent: f64) -> u8 {
        let reported = if percent.is_finite() {
            percent.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };
        let progress = match self.progress {
            Some(previous) if reported < previous => {
                tracing::debug!(
                    "update progress went backwards ({previous}% -> {reported}%); holding at {previous}%"
                );
                previous
            }
            _ => reported,
        };
        self.progress = Some(progress);
        progress
    }

    fn status(&self, stage: UpdateStage, message: String) -> UpdateStatus {
        UpdateStatus {
            stage,
            message,
            version: None,
            progress: None,
        }
    }
}

impl UpdateStatus {
    fn with_version(mut self, version: String) -> Self {
        self.version = Some(version);
        self
    }

    fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell_locale::shell_texts_for_locale;

    fn machine() -> UpdateStateMachine {
        UpdateStateMachine::new(shell_texts_for_locale("en-US"))
    }

    fn assert_field_invariants(status: &UpdateStatus) {
        assert_eq!(
            status.progress.is_some(),
            status.stage == UpdateStage::Downloading,
            "progress present iff downloading: {status:?}"
        );
        if status.version.is_some() {
            assert!(matches!(
                status.stage,
                UpdateStage::Available | UpdateStage::NotAvailable | UpdateStage::Downloaded
            ));
        }
    }

    #[test]
    fn full_download_cycle_emits_ordered_statuses() {
        let mut machine = machine();
        let events = vec![
            UpdateEvent::CheckStarted,
            UpdateEvent::Available {
                version: "1.4.0".to_string(),
            },
            UpdateEvent::Progress { percent: 0.0 },
            UpdateEvent::Progress { percent: 12.4 },
            UpdateEvent::Progress { percent: 99.6 },
            UpdateEvent::Downloaded {
                version: "1.4.0".to_string(),
            },
        ];

        let statuses: Vec<UpdateStatus> = events
            .into_iter()
            .map(|event| machine.apply(event).expect("valid transition"))
            .collect();

        let stages: Vec<UpdateStage> = statuses.iter().map(|status| status.stage).collect();
        assert_eq!(
            stages,
            vec![
                UpdateStage::Checking,
                UpdateStage::Available,
                UpdateStage::Downloading,
                UpdateStage::Downloading,
                UpdateStage::Downloading,
                UpdateStage::Downloaded,
            ]
        );
        assert_eq!(statuses[1].message, "Version 1.4.0 is available");
        assert_eq!(statuses[3].progress, Some(12));
        assert_eq!(statuses[4].progress, Some(100));
        assert_eq!(statuses[5].version.as_deref(), Some("1.4.0"));
        statuses.iter().for_each(assert_field_invariants);
    }

    #[test]
    fn progress_is_clamped_and_never_decreases() {
        let mut machine = machine();
        machine.apply(UpdateEvent::CheckStarted).expect("check");
        machine
            .apply(UpdateEvent::Available {
                version: "2.0.0".to_string(),
            })
            .expect("available");

        let reported = [10.0, 45.2, 30.0, f64::NAN, 150.0, 99.0, -5.0];
        let mut last = 0;
        for percent in reported {
            let status = machine
                .apply(UpdateEvent::Progress { percent })
                .expect("progress accepted");
            assert_field_invariants(&status);
            let progress = status.progress.expect("downloading carries progress");
            assert!(progress >= last, "{progress} < {last}");
            assert!(progress <= 100);
            last = progress;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn not_available_reports_current_version() {
        let mut machine = machine();
        machine.apply(UpdateEvent::CheckStarted).expect("check");
        let status = machine
            .apply(UpdateEvent::NotAvailable {
                current_version: "1.0.0".to_string(),
            })
            .expect("not available");
        assert_eq!(status.stage, UpdateStage::NotAvailable);
        assert_eq!(status.version.as_deref(), Some("1.0.0"));
        assert_eq!(status.message, "You have the latest version");
    }

    #[test]
    fn skipped_stages_are_rejected_without_changing_state() {
        let mut machine = machine();
        assert!(machine
            .apply(UpdateEvent::Progress { percent: 5.0 })
            .is_err());

        machine.apply(UpdateEvent::CheckStarted).expect("check");
        let rejected = machine
            .apply(UpdateEvent::Downloaded {
                version: "1.1.0".to_string(),
            })
            .expect_err("downloaded cannot follow checking");
        assert_eq!(rejected.stage, UpdateStage::Checking);
        assert_eq!(machine.stage(), UpdateStage::Checking);

        machine
            .apply(UpdateEvent::Available {
                version: "1.1.0".to_string(),
            })
            .expect("available");
        assert!(machine
            .apply(UpdateEvent::Downloaded {
                version: "1.1.0".to_string(),
            })
            .is_err());
        assert!(machine.apply(UpdateEvent::CheckStarted).is_err());
    }

    #[test]
    fn any_stage_can_fail_and_next_check_restarts_the_cycle() {
        let mut machine = machine();
        machine.apply(UpdateEvent::CheckStarted).expect("check");
        machine
            .apply(UpdateEvent::Available {
                version: "3.0.0".to_string(),
            })
            .expect("available");
        machine
            .apply(UpdateEvent::Progress { percent: 60.0 })
            .expect("progress");

        let failed = machine
            .apply(UpdateEvent::Failed {
                detail: "connection reset".to_string(),
            })
            .expect("error from downloading");
        assert_eq!(failed.stage, UpdateStage::Error);
        assert_eq!(failed.message, "Failed to check for updates");
        assert_field_invariants(&failed);
        assert!(machine
            .apply(UpdateEvent::Failed {
                detail: "again".to_string(),
            })
            .is_err());

        let restarted = machine.apply(UpdateEvent::CheckStarted).expect("retry");
        assert_eq!(restarted.stage, UpdateStage::Checking);
        machine
            .apply(UpdateEvent::Available {
                version: "3.0.0".to_string(),
            })
            .expect("available");
        let first = machine
            .apply(UpdateEvent::Progress { percent: 3.0 })
            .expect("progress restarts from zero");
        assert_eq!(first.progress, Some(3));
    }

    #[test]
    fn status_serializes_with_ui_field_names() {
        let mut machine = machine();
        machine.apply(UpdateEvent::CheckStarted).expect("check");
        machine
            .apply(UpdateEvent::Available {
                version: "1.2.0".to_string(),
            })
            .expect("available");
        let status = machine
            .apply(UpdateEvent::Progress { percent: 50.0 })
            .expect("progress");

        let json = serde_json::to_value(&status).expect("serialize");
        assert_eq!(json["status"], "downloading");
        assert_eq!(json["progress"], 50);
        assert!(json.get("version").is_none());

        let mut machine = self::machine();
        machine.apply(UpdateEvent::CheckStarted).expect("check");
        let status = machine
            .apply(UpdateEvent::NotAvailable {
                current_version: "1.0.0".to_string(),
            })
            .expect("not available");
        let json = serde_json::to_value(&status).expect("serialize");
        assert_eq!(json["status"], "not-available");
    }
}
