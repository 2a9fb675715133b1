//! Headless replay of dialog operations
//!
//! A script is a JSON array of steps run against a fresh dialog provider.
//! Each step prints one JSON line describing what would be on screen.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::config::Config;
use crate::dialogs::{
    AlertDialog, ContentDialog, DialogError, DialogHandle, DialogId, DialogKind, DialogLabels,
    DialogProvider, DialogRequest, DialogSnapshot,
};

/// Replay a JSON list of dialog steps and print the visible dialogs after each
#[derive(Args, Debug)]
pub struct ScriptCommand {
    /// Script file, or `-` to read from stdin
    pub path: PathBuf,
}

/// What an alert button does when the script provides a callback for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAction {
    Close,
    HideAll,
    /// Callback that leaves the stack alone
    None,
}

/// One scripted operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Open {
        kind: DialogKind,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        confirm_label: Option<String>,
        #[serde(default)]
        cancel_label: Option<String>,
        #[serde(default)]
        confirm_action: Option<ScriptAction>,
        #[serde(default)]
        cancel_action: Option<ScriptAction>,
    },
    Close,
    HideAll,
    SetLoading {
        value: bool,
    },
    DismissContent,
    DismissAlert,
    Confirm,
    Cancel,
}

impl ScriptStep {
    fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close => "close",
            Self::HideAll => "hide_all",
            Self::SetLoading { .. } => "set_loading",
            Self::DismissContent => "dismiss_content",
            Self::DismissAlert => "dismiss_alert",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentReport {
    pub id: DialogId,
    pub title: Option<String>,
    pub body: String,
    pub on_top: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertReport {
    pub id: DialogId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// State after one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened: Option<DialogId>,
    /// Result of `dismiss_content`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissed: Option<bool>,
    pub version: u64,
    pub depth: usize,
    pub loading: bool,
    pub content: Option<ContentReport>,
    pub alert: Option<AlertReport>,
}

impl StepReport {
    fn new(step: usize, op: &'static str, snapshot: &DialogSnapshot<String>) -> Self {
        let content = snapshot.content.as_ref().map(|content| ContentReport {
            id: content.id,
            title: content.dialog.title.clone(),
            body: content.dialog.content.clone(),
            on_top: content.on_top,
        });
        let alert = snapshot.alert.as_ref().map(|alert| AlertReport {
            id: alert.id,
            title: alert.dialog.title.clone(),
            description: alert.dialog.description.clone(),
            confirm_label: snapshot.confirm_label().unwrap_or_default().to_string(),
            cancel_label: snapshot.cancel_label().unwrap_or_default().to_string(),
        });

        Self {
            step,
            op,
            opened: None,
            dismissed: None,
            version: snapshot.version,
            depth: snapshot.depth,
            loading: snapshot.loading,
            content,
            alert,
        }
    }
}

fn run_action(action: ScriptAction, dialogs: &DialogHandle<String>) -> Result<(), DialogError> {
    match action {
        ScriptAction::Close => dialogs.close_dialog(),
        ScriptAction::HideAll => dialogs.hide_all_dialog(),
        ScriptAction::None => Ok(()),
    }
}

fn build_request(step: ScriptStep) -> Option<DialogRequest<String>> {
    let ScriptStep::Open {
        kind,
        title,
        description,
        content,
        confirm_label,
        cancel_label,
        confirm_action,
        cancel_action,
    } = step
    else {
        return None;
    };

    let request = match kind {
        DialogKind::Content => {
            let mut dialog = ContentDialog::new(content.unwrap_or_default());
            dialog.title = title;
            dialog.description = description;
            DialogRequest::from(dialog)
        }
        DialogKind::Alert => {
            let mut alert = AlertDialog::new();
            alert.title = title;
            alert.description = description;
            alert.content = content;
            alert.confirm_label = confirm_label;
            alert.cancel_label = cancel_label;
            if let Some(action) = confirm_action {
                alert = alert.on_confirm(move |dialogs| run_action(action, dialogs));
            }
            if let Some(action) = cancel_action {
                alert = alert.on_cancel(move |dialogs| run_action(action, dialogs));
            }
            DialogRequest::from(alert)
        }
    };
    Some(request)
}

/// Run `steps` against a new provider, reporting the state after each
pub fn replay(steps: Vec<ScriptStep>, labels: DialogLabels) -> Result<Vec<StepReport>> {
    let provider = DialogProvider::with_labels(labels);
    let dialogs = provider.handle();
    let mut reports = Vec::with_capacity(steps.len());

    for (index, step) in steps.into_iter().enumerate() {
        let op = step.name();
        let step_number = index + 1;
        debug!(step = step_number, op, "replaying step");

        let mut opened = None;
        let mut dismissed = None;
        match step {
            step @ ScriptStep::Open { .. } => {
                if let Some(request) = build_request(step) {
                    opened = Some(dialogs.open_dialog(request)?);
                }
            }
            ScriptStep::Close => dialogs.close_dialog()?,
            ScriptStep::HideAll => dialogs.hide_all_dialog()?,
            ScriptStep::SetLoading { value } => dialogs.set_loading(value)?,
            ScriptStep::DismissContent => dismissed = Some(dialogs.dismiss_content()?),
            ScriptStep::DismissAlert => dialogs.dismiss_alert()?,
            ScriptStep::Confirm => dialogs.confirm_alert()?,
            ScriptStep::Cancel => dialogs.cancel_alert()?,
        }

        let mut report = StepReport::new(step_number, op, &provider.snapshot());
        report.opened = opened;
        report.dismissed = dismissed;
        reports.push(report);
    }

    Ok(reports)
}

impl ScriptCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let source = self.read_source().await?;
        let steps: Vec<ScriptStep> =
            serde_json::from_str(&source).context("Failed to parse dialog script")?;
        info!(steps = steps.len(), "Replaying dialog script");

        for report in replay(steps, config.dialog_labels())? {
            println!("{}", serde_json::to_string(&report)?);
        }
        Ok(())
    }

    async fn read_source(&self) -> Result<String> {
        if self.path.as_os_str() == "-" {
            let mut source = String::new();
            tokio::io::stdin()
                .read_to_string(&mut source)
                .await
                .context("Failed to read script from stdin")?;
            return Ok(source);
        }

        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read script {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::DEFAULT_CONFIRM_LABEL;
    use tempfile::TempDir;

    fn parse(json: &str) -> Vec<ScriptStep> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_discard_changes_script() {
        let steps = parse(
            r#"[
                {"op": "open", "kind": "content", "title": "Add Transaction", "content": "form"},
                {"op": "open", "kind": "alert", "title": "Discard Changes",
                 "confirm_label": "Discard", "cancel_label": "Continue Editing",
                 "cancel_action": "close"},
                {"op": "cancel"}
            ]"#,
        );

        let reports = replay(steps, DialogLabels::default()).unwrap();

        let alert = reports[1].alert.as_ref().unwrap();
        assert_eq!(alert.confirm_label, "Discard");
        assert_eq!(alert.cancel_label, "Continue Editing");
        assert!(!reports[1].content.as_ref().unwrap().on_top);

        assert_eq!(reports[2].depth, 1);
        assert!(reports[2].alert.is_none());
        assert_eq!(
            reports[2].content.as_ref().unwrap().title.as_deref(),
            Some("Add Transaction")
        );
    }

    #[test]
    fn test_side_effect_only_confirm_keeps_stack() {
        let steps = parse(
            r#"[
                {"op": "open", "kind": "alert", "confirm_action": "none"},
                {"op": "confirm"},
                {"op": "open", "kind": "alert"},
                {"op": "confirm"}
            ]"#,
        );

        let reports = replay(steps, DialogLabels::default()).unwrap();

        assert_eq!(reports[1].depth, 1);
        assert_eq!(reports[2].alert.as_ref().unwrap().confirm_label, DEFAULT_CONFIRM_LABEL);
        assert_eq!(reports[3].depth, 0);
    }

    #[test]
    fn test_loading_blocks_dismiss_content() {
        let steps = parse(
            r#"[
                {"op": "open", "kind": "content", "content": "saving"},
                {"op": "set_loading", "value": true},
                {"op": "dismiss_content"},
                {"op": "set_loading", "value": false},
                {"op": "dismiss_content"},
                {"op": "close"},
                {"op": "hide_all"}
            ]"#,
        );

        let reports = replay(steps, DialogLabels::default()).unwrap();

        assert_eq!(reports[0].opened, Some(DialogId(1)));
        assert_eq!(reports[2].dismissed, Some(false));
        assert_eq!(reports[2].depth, 1);
        assert_eq!(reports[4].dismissed, Some(true));
        assert_eq!(reports[6].depth, 0);
    }

    #[test]
    fn test_report_serialization_skips_empty_fields() {
        let reports = replay(parse(r#"[{"op": "close"}]"#), DialogLabels::default()).unwrap();
        let line = serde_json::to_value(&reports[0]).unwrap();

        assert_eq!(line["op"], "close");
        assert_eq!(line["depth"], 0);
        assert!(line.get("opened").is_none());
        assert!(line["content"].is_null());
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result: Result<Vec<ScriptStep>, _> = serde_json::from_str(r#"[{"op": "explode"}]"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_execute_reads_script_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("steps.json");
        std::fs::write(&path, r#"[{"op": "open", "kind": "content"}]"#).unwrap();

        let command = ScriptCommand { path };
        assert!(command.execute(&Config::default()).await.is_ok());

        let missing = ScriptCommand {
            path: dir.path().join("missing.json"),
        };
        assert!(missing.execute(&Config::default()).await.is_err());
    }
}
