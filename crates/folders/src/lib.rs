// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! A drive: a tree of folders and files, reduced by the lineage engine.
//!
//! Every node lives in one flat map keyed by id and points at its parent
//! folder; `None` is the drive root. Business rules are enforced here, not
//! by the engine: a rejected action is recorded on its operation and leaves
//! the drive untouched.
//!
//! | Action | Input |
//! |---|---|
//! | `ADD_FOLDER` | `{ id, name, parentFolder? }` |
//! | `ADD_FILE` | `{ id, name, documentType, parentFolder? }` |
//! | `UPDATE_NODE` | `{ id, name?, parentFolder? }` |
//! | `DELETE_NODE` | `{ id }`, removes the whole subtree |
//! | `MOVE_NODE` | `{ srcFolder, targetParentFolder? }` |

use std::collections::BTreeMap;

use lineage::Action;
use lineage::error::ActionError;
use lineage::reducer::Reducer;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub mod actions {
    pub const ADD_FOLDER: &str = "ADD_FOLDER";
    pub const ADD_FILE: &str = "ADD_FILE";
    pub const UPDATE_NODE: &str = "UPDATE_NODE";
    pub const DELETE_NODE: &str = "DELETE_NODE";
    pub const MOVE_NODE: &str = "MOVE_NODE";
}

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("node {0} already exists")]
    DuplicateNode(String),

    #[error("node {0} not found")]
    NodeNotFound(String),

    #[error("node {0} is not a folder")]
    NotAFolder(String),

    #[error("cannot move folder {folder} into {target}, which is itself or one of its descendants")]
    CircularMove { folder: String, target: String },

    #[error("unknown drive action {0}")]
    UnknownAction(String),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] serde_json::Error),
}

impl From<DriveError> for ActionError {
    fn from(error: DriveError) -> ActionError {
        return ActionError::new(error.to_string());
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    Folder,
    File {
        #[serde(rename = "documentType")]
        document_type: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub parent_folder: Option<String>,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        return self.kind == NodeKind::Folder;
    }
}

/// The global state of a drive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    pub nodes: BTreeMap<String, Node>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFolderInput {
    id: String,
    name: String,
    #[serde(default)]
    parent_folder: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFileInput {
    id: String,
    name: String,
    document_type: String,
    #[serde(default)]
    parent_folder: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNodeInput {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent_folder: Option<String>,
}

#[derive(Deserialize)]
struct DeleteNodeInput {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveNodeInput {
    src_folder: String,
    #[serde(default)]
    target_parent_folder: Option<String>,
}

fn parse<T: DeserializeOwned>(action: &Action) -> Result<T, DriveError> {
    return Ok(serde_json::from_value(action.input.clone())?);
}

impl Drive {
    pub fn node(&self, id: &str) -> Option<&Node> {
        return self.nodes.get(id);
    }

    /// Ids of the direct children of `folder`, or of the root for `None`.
    pub fn children(&self, folder: Option<&str>) -> Vec<&str> {
        return self
            .nodes
            .values()
            .filter(|node| node.parent_folder.as_deref() == folder)
            .map(|node| node.id.as_str())
            .collect();
    }

    /// `id` and every node below it.
    pub fn subtree(&self, id: &str) -> FxHashSet<String> {
        let mut found = FxHashSet::default();
        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            if !found.insert(current.clone()) {
                continue;
            }
            pending.extend(self.children(Some(&current)).into_iter().map(str::to_string));
        }
        return found;
    }

    fn expect_folder(&self, id: &str) -> Result<(), DriveError> {
        return match self.nodes.get(id) {
            None => Err(DriveError::NodeNotFound(id.to_string())),
            Some(node) if !node.is_folder() => Err(DriveError::NotAFolder(id.to_string())),
            Some(_) => Ok(()),
        };
    }

    fn insert(&mut self, node: Node) -> Result<(), DriveError> {
        if self.nodes.contains_key(&node.id) {
            return Err(DriveError::DuplicateNode(node.id));
        }
        if let Some(parent) = &node.parent_folder {
            self.expect_folder(parent)?;
        }
        self.nodes.insert(node.id.clone(), node);
        return Ok(());
    }

    /// Re-parent `id` under `target`, refusing to make a folder its own ancestor.
    fn reparent(&mut self, id: &str, target: Option<String>) -> Result<(), DriveError> {
        if !self.nodes.contains_key(id) {
            return Err(DriveError::NodeNotFound(id.to_string()));
        }
        if let Some(target) = &target {
            self.expect_folder(target)?;
            if self.subtree(id).contains(target) {
                return Err(DriveError::CircularMove {
                    folder: id.to_string(),
                    target: target.clone(),
                });
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_folder = target;
        }
        return Ok(());
    }

    pub fn apply(&mut self, action: &Action) -> Result<(), DriveError> {
        match action.kind.as_str() {
            actions::ADD_FOLDER => {
                let input: AddFolderInput = parse(action)?;
                self.insert(Node {
                    id: input.id,
                    name: input.name,
                    kind: NodeKind::Folder,
                    parent_folder: input.parent_folder,
                })?;
            }
            actions::ADD_FILE => {
                let input: AddFileInput = parse(action)?;
                self.insert(Node {
                    id: input.id,
                    name: input.name,
                    kind: NodeKind::File { document_type: input.document_type },
                    parent_folder: input.parent_folder,
                })?;
            }
            actions::UPDATE_NODE => {
                let input: UpdateNodeInput = parse(action)?;
                if input.parent_folder.is_some() {
                    self.reparent(&input.id, input.parent_folder)?;
                }
                let node = self
                    .nodes
                    .get_mut(&input.id)
                    .ok_or_else(|| DriveError::NodeNotFound(input.id.clone()))?;
                if let Some(name) = input.name {
                    node.name = name;
                }
            }
            actions::DELETE_NODE => {
                let input: DeleteNodeInput = parse(action)?;
                if !self.nodes.contains_key(&input.id) {
                    return Err(DriveError::NodeNotFound(input.id));
                }
                let doomed = self.subtree(&input.id);
                debug!(node = %input.id, removed = doomed.len(), "deleting subtree");
                self.nodes.retain(|id, _| !doomed.contains(id));
            }
            actions::MOVE_NODE => {
                let input: MoveNodeInput = parse(action)?;
                self.reparent(&input.src_folder, input.target_parent_folder)?;
            }
            other => return Err(DriveError::UnknownAction(other.to_string())),
        }
        return Ok(());
    }
}

/// The drive schema. Global state is the drive; local state is unused.
#[derive(Clone, Copy, Debug, Default)]
pub struct Folders;

impl Reducer for Folders {
    type State = Drive;

    fn reduce(&self, state: &mut Drive, action: &Action) -> Result<(), ActionError> {
        return Ok(state.apply(action)?);
    }
}
