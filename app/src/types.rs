//! Frontend type definitions
//!
//! Shapes returned by the stories backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// One page of the story feed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    pub stories: Vec<Story>,
    #[serde(default)]
    pub next_page: Option<u32>,
}
