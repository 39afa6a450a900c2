// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph-format result fragments (`resultDataContents: ["graph"]`)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nodes and relationships touched by one result row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphFragment {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

impl GraphFragment {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub element_id: Option<String>,
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

impl GraphNode {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphRelationship {
    pub id: String,
    pub element_id: Option<String>,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start_node: String,
    pub end_node: String,
    pub properties: Map<String, Value>,
}
