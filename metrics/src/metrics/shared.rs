use serde::{
    Deserialize,
    Serialize,
};

/// Normalized status taxonomy derived from the tracker's workflow state names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Category {
    Completed,
    InProgress,
    Backlog,
    Canceled,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Completed => "completed",
            Category::InProgress => "inProgress",
            Category::Backlog => "backlog",
            Category::Canceled => "canceled",
        }
    }
}
