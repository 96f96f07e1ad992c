use serde::{Deserialize, Serialize};

use crate::Client;
use crate::error::Result;
use crate::util::{null_as_default, require};

/// State of an asynchronous GRiD task (e.g. an export being generated).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDetail {
    #[serde(rename = "task_traceback", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub traceback: String,
    #[serde(rename = "task_state", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(rename = "task_tstamp", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(rename = "task_name", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub task_id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Tasks<'a> {
    client: &'a Client,
}

impl<'a> Tasks<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn get(&self, task_id: &str) -> Result<TaskDetail> {
        require(task_id, "Please provide a task ID")?;
        let id = task_id.trim();
        if id.contains(['/', '\\', '?', '#']) || id == "." || id == ".." {
            return Err(crate::GridError::validation(format!("invalid task ID {id:?}")));
        }
        self.client.get_json(&format!("api/v2/task/{id}/"))
    }
}
