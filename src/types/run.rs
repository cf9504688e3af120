//! Run lifecycle and decoded run results.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ResourceId;

/// State of an asynchronous crew run.
///
/// `Pending` moves to `Completed` or `Failed`. `Unknown` covers a
/// missing or unrecognised status string and is treated as not yet
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Completed,
    Failed,
    Unknown,
}

impl RunStatus {
    /// Map a wire status string onto the lifecycle.
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" | "success" | "succeeded" => Self::Completed,
            "failed" | "error" => Self::Failed,
            "pending" | "running" | "queued" | "started" | "in_progress" => Self::Pending,
            _ => Self::Unknown,
        }
    }

    /// Read the `status` field of a status payload.
    pub fn from_payload(payload: &Value) -> Self {
        payload
            .get("status")
            .and_then(Value::as_str)
            .map(Self::from_wire)
            .unwrap_or(Self::Unknown)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of a run that reached a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: ResourceId,
    pub status: RunStatus,
    /// Generated text per task as `(name, text)`, in the order the
    /// studio reported them.
    pub results: Vec<(String, String)>,
    /// Single output string, for deployments that do not split by task.
    pub output: Option<String>,
    pub error: Option<String>,
    /// Number of status checks that were made.
    pub polls: u32,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    /// The final status payload as received.
    pub raw: Value,
}

impl JobResult {
    /// Decode the final status payload of a run.
    ///
    /// The result is read from `result` when that is an object, else
    /// from the payload itself. Non-string section values are kept as
    /// JSON text.
    pub fn from_payload(job_id: ResourceId, raw: Value, polls: u32, elapsed: Duration) -> Self {
        let status = RunStatus::from_payload(&raw);
        let body = match raw.get("result") {
            Some(result @ Value::Object(_)) => result,
            _ => &raw,
        };

        let results = body
            .get("results")
            .and_then(Value::as_object)
            .map(|sections| {
                sections
                    .iter()
                    .map(|(name, content)| (name.clone(), value_text(content)))
                    .collect()
            })
            .unwrap_or_default();

        let output = body
            .get("output")
            .map(value_text)
            .or_else(|| raw.get("result").and_then(Value::as_str).map(str::to_string))
            .filter(|text| !text.trim().is_empty());

        let error = raw
            .get("error")
            .or_else(|| body.get("error"))
            .filter(|e| !e.is_null())
            .map(value_text);

        Self {
            job_id,
            status,
            results,
            output,
            error,
            polls,
            elapsed,
            raw,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Text of the result section called `name`.
    pub fn section(&self, name: &str) -> Option<&str> {
        self.results
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, text)| text.as_str())
    }

    /// All generated text, sections separated by blank lines.
    pub fn combined_text(&self) -> String {
        if self.results.is_empty() {
            return self.output.clone().unwrap_or_default();
        }
        self.results
            .iter()
            .map(|(_, text)| text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
