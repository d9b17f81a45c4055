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

use crate::dataset::{split_snapshot_name, DatasetRef};
use std::collections::HashMap;

/// For every dataset whose clone/snapshot chain reaches a dataset mounted at
/// `target_mountpoint` (the *anchor*), records the anchor's name — or the
/// empty string if the dataset itself is that anchor. Datasets whose chain
/// never reaches an anchor have no entry. An empty `target_mountpoint`
/// matches any dataset with no origin and no mountpoint requirement (used
/// for walking the ancestry of user datasets, where "any root" will do).
pub fn resolve_origins(
    datasets: &[DatasetRef],
    target_mountpoint: &str,
) -> HashMap<String, String> {
    let by_name: HashMap<&str, &DatasetRef> =
        datasets.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut anchors: HashMap<String, Option<String>> = HashMap::with_capacity(datasets.len());
    for d in datasets {
        resolve_one(&d.name, &by_name, target_mountpoint, &mut anchors, datasets.len());
    }

    anchors
        .into_iter()
        .filter_map(|(name, anchor)| anchor.map(|a| (name, a)))
        .collect()
}

/// Walks the origin chain for `name`, memoising into `anchors`. Returns the
/// anchor name for `name` if one was found (`Some("")` if `name` is itself
/// the anchor), `None` if the chain doesn't terminate at `target_mountpoint`.
/// `budget` bounds recursion depth by dataset count so a malformed inventory
/// can never spin forever even though true cycles can't occur in a
/// well-formed pool.
fn resolve_one(
    name: &str,
    by_name: &HashMap<&str, &DatasetRef>,
    target_mountpoint: &str,
    anchors: &mut HashMap<String, Option<String>>,
    budget: usize,
) -> Option<String> {
    if let Some(cached) = anchors.get(name) {
        return cached.clone();
    }
    if budget == 0 {
        return None;
    }

    let Some(d) = by_name.get(name) else {
        anchors.insert(name.to_string(), None);
        return None;
    };

    let result = if d.is_snapshot {
        let (base, _) = split_snapshot_name(&d.name);
        resolve_one(base, by_name, target_mountpoint, anchors, budget - 1).map(|anchor| {
            if anchor.is_empty() {
                base.to_string()
            } else {
                anchor
            }
        })
    } else if d.is_clone() {
        let origin = d.origin.clone();
        resolve_one(&origin, by_name, target_mountpoint, anchors, budget - 1).map(|anchor| {
            if anchor.is_empty() {
                origin
            } else {
                anchor
            }
        })
    } else if target_mountpoint.is_empty() || d.mountpoint == target_mountpoint {
        // An empty target means "any mountpoint matches" (used when walking
        // user-dataset ancestry, where there's no single expected mountpoint).
        Some(String::new())
    } else {
        None
    };

    anchors.insert(name.to_string(), result.clone());
    result
}
