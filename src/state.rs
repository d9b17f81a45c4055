//       ___           ___           ___           ___
//      /\__\         /\  \         /\  \         /\__\
//     /:/  /         \:\  \        \:\  \       /::|  |
//    /:/__/           \:\  \        \:\  \     /:|:|  |
//   /::\  \ ___       /::\  \       /::\  \   /:/|:|__|__
//  /:/\:\  /\__\     /:/\:\__\     /:/\:\__\ /:/ |::::\__\
//  \/__\:\/:/  /    /:/  \/__/    /:/  \/__/ \/__/~~/:/  /
//       \::/  /    /:/  /        /:/  /            /:/  /
//       /:/  /     \/__/         \/__/            /:/  /
//      /:/  /                                    /:/  /
//      \/__/                                     \/__/
//
// (c) Robert Swinford <robert.swinford<...at...>gmail.com>
//
// For the full copyright and license information, please view the LICENSE file
// that was distributed with this source code.

use crate::dataset::DatasetRef;
use serde::Serialize;
use std::collections::BTreeMap;

/// A bootable configuration: either a machine's current state, or one
/// entry of its history.
#[derive(Debug, Clone, Serialize)]
pub struct State {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "IsZsys", skip_serializing_if = "is_false")]
    pub is_zsys: bool,
    #[serde(rename = "LastUsed", skip_serializing_if = "Option::is_none")]
    pub last_used: Option<u64>,
    #[serde(rename = "SystemDatasets", skip_serializing_if = "BTreeMap::is_empty")]
    pub system_datasets: BTreeMap<String, Vec<DatasetRef>>,
    #[serde(rename = "UserDatasets", skip_serializing_if = "BTreeMap::is_empty")]
    pub user_datasets: BTreeMap<String, Vec<DatasetRef>>,
    #[serde(rename = "PersistentDatasets", skip_serializing_if = "Vec::is_empty")]
    pub persistent_datasets: Vec<DatasetRef>,
}

fn is_false(b: &bool) -> bool {
    !b
}

impl State {
    pub fn new(id: impl Into<String>, is_zsys: bool, last_used: Option<u64>) -> Self {
        State {
            id: id.into(),
            is_zsys,
            last_used,
            system_datasets: BTreeMap::new(),
            user_datasets: BTreeMap::new(),
            persistent_datasets: Vec::new(),
        }
    }

    /// The state's own root dataset, i.e. `system_datasets[self.id][0]`.
    pub fn root_dataset(&self) -> Option<&DatasetRef> {
        self.system_datasets.get(&self.id).and_then(|v| v.first())
    }
}

/// A particular history of user-data datasets for one user.
#[derive(Debug, Clone, Serialize)]
pub struct UserState {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "LastUsed", skip_serializing_if = "Option::is_none")]
    pub last_used: Option<u64>,
    #[serde(rename = "Datasets")]
    pub datasets: Vec<DatasetRef>,
}

/// A group of a main `State` and every history state reachable from it,
/// plus the per-user view of its user datasets.
#[derive(Debug, Clone, Serialize)]
pub struct Machine {
    #[serde(flatten)]
    pub state: State,
    #[serde(rename = "Users", skip_serializing_if = "BTreeMap::is_empty")]
    pub users: BTreeMap<String, BTreeMap<String, UserState>>,
    #[serde(rename = "History", skip_serializing_if = "BTreeMap::is_empty")]
    pub history: BTreeMap<String, State>,
}

impl Machine {
    pub fn new(id: impl Into<String>, is_zsys: bool, last_used: Option<u64>) -> Self {
        Machine {
            state: State::new(id, is_zsys, last_used),
            users: BTreeMap::new(),
            history: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn is_zsys(&self) -> bool {
        self.state.is_zsys
    }
}
