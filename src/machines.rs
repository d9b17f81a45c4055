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

use crate::cmdline::root_from_cmdline;
use crate::dataset::{basename, is_child, split_snapshot_name, user_from_dataset_name, CanMount, DatasetRef};
use crate::error::{ZsysError, ZsysResult};
use crate::origin::resolve_origins;
use crate::provider::DatasetProvider;
use crate::state::{Machine, State, UserState};
use crate::topo::sort_datasets;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const USERDATA_CONTAINER_TOKEN: &str = "/userdata/";

/// Top-level snapshot of every machine known to the pool, plus the raw
/// residual dataset buckets every downstream consumer needs. Produced fresh
/// by every call to [`refresh`]; never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct Machines {
    #[serde(rename = "All", skip_serializing_if = "BTreeMap::is_empty")]
    pub all: BTreeMap<String, Machine>,
    #[serde(rename = "Cmdline", skip_serializing_if = "String::is_empty")]
    pub cmdline: String,
    #[serde(rename = "Current", skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(rename = "NextState", skip_serializing_if = "Option::is_none")]
    pub next_state: Option<State>,
    #[serde(rename = "AllSystemDatasets", skip_serializing_if = "Vec::is_empty")]
    pub all_system_datasets: Vec<DatasetRef>,
    #[serde(rename = "AllUsersDatasets", skip_serializing_if = "Vec::is_empty")]
    pub all_users_datasets: Vec<DatasetRef>,
    #[serde(rename = "AllPersistentDatasets", skip_serializing_if = "Vec::is_empty")]
    pub all_persistent_datasets: Vec<DatasetRef>,
    #[serde(rename = "UnmanagedDatasets", skip_serializing_if = "Vec::is_empty")]
    pub unmanaged_datasets: Vec<DatasetRef>,
}

/// Points at a specific state (main or history) of a specific machine,
/// without borrowing either — both live in `Machines::all` and are looked
/// up again by id when needed. Mirrors the source's `machineAndState`
/// helper, minus the pointers it can't express safely in owned Rust.
#[derive(Debug, Clone)]
struct MachineAndState {
    machine_id: String,
    state_id: String,
}

impl Machines {
    /// Builds a brand-new machines graph from the provider's current
    /// inventory and the given boot cmdline. This is the only entry point
    /// into the core; it performs no I/O of its own beyond `provider.datasets()`.
    pub fn refresh(provider: &dyn DatasetProvider, cmdline: &str) -> ZsysResult<Machines> {
        debug!("building new machines list");
        let mut datasets = provider.datasets()?;
        sort_datasets(&mut datasets);

        let origins = resolve_origins(&datasets, "/");

        let mut main_bucket = Vec::new();
        let mut clone_bucket = Vec::new();
        let mut other_bucket = Vec::new();
        for d in datasets {
            match origins.get(&d.name).map(|s| s.as_str()) {
                Some("") => main_bucket.push(d),
                Some(_) => clone_bucket.push(d),
                None => other_bucket.push(d),
            }
        }
        main_bucket.extend(clone_bucket);
        main_bucket.extend(other_bucket);
        let ordered = main_bucket;

        let Populated {
            mut all,
            mns,
            boots,
            userdatas,
            persistents,
            unmanaged,
        } = populate(&ordered, &origins);

        attach_user_datasets(&mut all, &mns, &userdatas);

        let mut all_users_datasets = Vec::new();
        for d in &userdatas {
            if d.can_mount != CanMount::Off {
                all_users_datasets.push(d.clone());
            }
        }

        let mut all_system_datasets = Vec::new();
        for (_, m) in all.iter_mut() {
            attach_remaining(m, &boots, &persistents);
            for group in m.state.system_datasets.values() {
                all_system_datasets.extend(group.iter().cloned());
            }
            for h in m.history.values() {
                for group in h.system_datasets.values() {
                    all_system_datasets.extend(group.iter().cloned());
                }
            }
        }

        for d in &boots {
            if !all_system_datasets.iter().any(|existing| existing.name == d.name) {
                all_system_datasets.push(d.clone());
            }
        }

        let root = root_from_cmdline(cmdline);
        let current = root.filter(|r| all.contains_key(r));

        Ok(Machines {
            all,
            cmdline: cmdline.to_string(),
            current,
            next_state: None,
            all_system_datasets,
            all_users_datasets,
            all_persistent_datasets: persistents,
            unmanaged_datasets: unmanaged,
        })
    }

    /// Returns the machine matching `id`, fuzzy-matching on basename and the
    /// trailing `_`-separated token of the basename, and also searching
    /// every machine's history. Falls back to the current machine when `id`
    /// is empty.
    pub fn get_machine(&self, id: &str) -> ZsysResult<&Machine> {
        if id.is_empty() {
            return self
                .current
                .as_ref()
                .and_then(|cur| self.all.get(cur))
                .ok_or(ZsysError::NoCurrent);
        }

        let matches_token = |candidate: &str| -> bool {
            if candidate == id {
                return true;
            }
            let base = basename(candidate);
            if base == id {
                return true;
            }
            base.rsplit('_').next() == Some(id)
        };

        let mut candidates: Vec<&str> = Vec::new();
        for (machine_id, m) in &self.all {
            if matches_token(machine_id) {
                candidates.push(machine_id);
                continue;
            }
            if m.history.keys().any(|hid| matches_token(hid)) {
                candidates.push(machine_id);
            }
        }

        match candidates.as_slice() {
            [] => Err(ZsysError::NotFound { id: id.to_string() }),
            [only] => Ok(self.all.get(*only).expect("candidate came from self.all")),
            many => Err(ZsysError::Ambiguous {
                id: id.to_string(),
                candidates: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

struct Populated {
    all: BTreeMap<String, Machine>,
    mns: BTreeMap<String, MachineAndState>,
    boots: Vec<DatasetRef>,
    userdatas: Vec<DatasetRef>,
    persistents: Vec<DatasetRef>,
    unmanaged: Vec<DatasetRef>,
}

/// First pass (C4): partitions the topologically-sorted, origin-resolved
/// inventory into machines (+ their history), and the residual boot, user,
/// persistent and unmanaged buckets.
fn populate(ordered: &[DatasetRef], origins: &HashMap<String, String>) -> Populated {
    let mut all: BTreeMap<String, Machine> = BTreeMap::new();
    let mut mns: BTreeMap<String, MachineAndState> = BTreeMap::new();
    let mut boots = Vec::new();
    let mut userdatas = Vec::new();
    let mut persistents = Vec::new();
    let mut unmanaged = Vec::new();

    for d in ordered {
        let origin_entry = origins.get(&d.name).map(|s| s.as_str());

        if let Some(machine) = new_machine_from_dataset(d, origin_entry) {
            mns.insert(
                d.name.clone(),
                MachineAndState {
                    machine_id: d.name.clone(),
                    state_id: d.name.clone(),
                },
            );
            all.insert(d.name.clone(), machine);
            continue;
        }

        if populate_system_and_history(d, origin_entry, &mut all, &mut mns) {
            continue;
        }

        if d.mountpoint.starts_with("/boot") {
            boots.push(d.clone());
            continue;
        }

        if d.name.to_lowercase().contains(USERDATA_CONTAINER_TOKEN) {
            userdatas.push(d.clone());
            continue;
        }

        if d.can_mount != CanMount::On {
            debug!(
                "ignoring {:?}: either an orphan clone or not a boot, user or system dataset and canmount isn't on",
                d.name
            );
            unmanaged.push(d.clone());
            continue;
        }

        persistents.push(d.clone());
    }

    Populated {
        all,
        mns,
        boots,
        userdatas,
        persistents,
        unmanaged,
    }
}

fn non_zero_last_used(raw: u64) -> Option<u64> {
    if raw == 0 {
        None
    } else {
        Some(raw)
    }
}

/// Registers all non-cloned, mountable `/`-mounted datasets as a new machine.
fn new_machine_from_dataset(d: &DatasetRef, origin_entry: Option<&str>) -> Option<Machine> {
    if d.mountpoint == "/" && d.can_mount != CanMount::Off && origin_entry == Some("") {
        let mut m = Machine::new(d.name.clone(), d.boot_fs, non_zero_last_used(d.last_used));
        m.state
            .system_datasets
            .insert(d.name.clone(), vec![d.clone()]);
        return Some(m);
    }
    None
}

/// Identifies whether `d` is a system child of a known machine/history
/// state, or a brand-new history root (clone/snapshot of a machine's root).
/// Returns whether `d` was attached anywhere.
fn populate_system_and_history(
    d: &DatasetRef,
    origin_entry: Option<&str>,
    all: &mut BTreeMap<String, Machine>,
    mns: &mut BTreeMap<String, MachineAndState>,
) -> bool {
    for (machine_id, m) in all.iter_mut() {
        // Checked ahead of the plain is_child test below: a root's own bare
        // snapshot (`machine_id@snap`) textually satisfies is_child's `@`
        // separator rule too, but it must become its own history entry
        // rather than folding into the main state's system_datasets group.
        if d.mountpoint == "/" && d.can_mount != CanMount::Off && origin_entry == Some(machine_id.as_str()) {
            let mut s = State::new(d.name.clone(), d.boot_fs, non_zero_last_used(d.last_used));
            s.system_datasets.insert(d.name.clone(), vec![d.clone()]);
            m.history.insert(d.name.clone(), s);
            mns.insert(
                d.name.clone(),
                MachineAndState {
                    machine_id: machine_id.clone(),
                    state_id: d.name.clone(),
                },
            );
            return true;
        }

        if is_child(machine_id, d) {
            m.state
                .system_datasets
                .entry(machine_id.clone())
                .or_default()
                .push(d.clone());
            return true;
        }

        for (history_id, h) in m.history.iter_mut() {
            if is_child(history_id, d) {
                h.system_datasets
                    .entry(history_id.clone())
                    .or_default()
                    .push(d.clone());
                return true;
            }
        }
    }

    false
}

/// Returns the root user datasets (those with no strict ancestor also
/// present in `userdatas`) mapped to their descendants, sorted by root name.
fn group_user_dataset_roots(userdatas: &[DatasetRef]) -> Vec<(DatasetRef, Vec<DatasetRef>)> {
    let is_root =
        |d: &DatasetRef| !userdatas.iter().any(|other| other.name != d.name && is_child(&other.name, d));

    let mut roots: Vec<DatasetRef> = userdatas.iter().filter(|d| is_root(d)).cloned().collect();
    roots.sort_by(|a, b| a.name.cmp(&b.name));

    let mut groups: Vec<(DatasetRef, Vec<DatasetRef>)> =
        roots.into_iter().map(|r| (r, Vec::new())).collect();

    for d in userdatas {
        if groups.iter().any(|(r, _)| r.name == d.name) {
            continue;
        }
        if let Some((_, children)) = groups.iter_mut().find(|(r, _)| is_child(&r.name, d)) {
            children.push(d.clone());
        }
    }

    groups
}

fn get_state_mut<'a>(m: &'a mut Machine, state_id: &str) -> Option<&'a mut State> {
    if state_id == m.id() {
        Some(&mut m.state)
    } else {
        m.history.get_mut(state_id)
    }
}

/// Attaches `root` (+ `children`) to the given state of the given machine,
/// and always records it in the machine's per-user view, overwriting any
/// prior entry with the same root name.
fn attach(
    all: &mut BTreeMap<String, Machine>,
    target: Option<&MachineAndState>,
    machine_id: &str,
    root: &DatasetRef,
    children: &[DatasetRef],
) {
    let Some(m) = all.get_mut(machine_id) else {
        return;
    };

    if let Some(target) = target {
        if let Some(state) = get_state_mut(m, &target.state_id) {
            let mut datasets = vec![root.clone()];
            datasets.extend(children.iter().cloned());
            state.user_datasets.insert(root.name.clone(), datasets);
        }
    }

    let user = user_from_dataset_name(&root.name);
    let mut datasets = vec![root.clone()];
    datasets.extend(children.iter().cloned());
    m.users.entry(user).or_default().insert(
        root.name.clone(),
        UserState {
            id: root.name.clone(),
            last_used: non_zero_last_used(root.last_used),
            datasets,
        },
    );
}

/// Second pass (C5): associates every user-data root (and its children)
/// with the state(s)/machine(s) it belongs to.
fn attach_user_datasets(
    all: &mut BTreeMap<String, Machine>,
    mns: &BTreeMap<String, MachineAndState>,
    userdatas: &[DatasetRef],
) {
    let groups = group_user_dataset_roots(userdatas);

    let roots_only: Vec<DatasetRef> = groups.iter().map(|(r, _)| r.clone()).collect();
    let origins_user = resolve_origins(&roots_only, "");

    let mut unattached_clones: Vec<(DatasetRef, Vec<DatasetRef>)> = Vec::new();
    let mut unattached_snapshots: Vec<(DatasetRef, Vec<DatasetRef>)> = Vec::new();

    for (root, children) in &groups {
        if root.is_snapshot {
            let (_, snap) = split_snapshot_name(&root.name);
            let suffix = format!("@{snap}");
            let mut attached = false;
            for (state_name, ms) in mns {
                if state_name.ends_with(&suffix) {
                    attach(all, Some(ms), &ms.machine_id, root, children);
                    attached = true;
                }
            }
            if !attached {
                unattached_snapshots.push((root.clone(), children.clone()));
            }
            continue;
        }

        let mut attached = false;
        for (state_name, ms) in mns {
            if !root.bootfs_datasets_tokens().any(|t| t == state_name) {
                continue;
            }
            attached = true;
            let matched_children: Vec<DatasetRef> = children
                .iter()
                .filter(|c| c.bootfs_datasets_tokens().any(|t| t == state_name))
                .cloned()
                .collect();
            attach(all, Some(ms), &ms.machine_id, root, &matched_children);
        }
        if !attached {
            unattached_clones.push((root.clone(), children.clone()));
        }
    }

    // Case C: manual promotion of a user dataset without promoting the
    // whole state. Only attaches to machines whose Users map already
    // references the clone's origin as a UserState id, machine-scoped only.
    for (root, children) in &unattached_clones {
        let origin = origins_user.get(&root.name).cloned().unwrap_or_default();
        if origin.is_empty() {
            warn!("couldn't find any association for user dataset {}", root.name);
            continue;
        }

        let mut associated = false;
        let machine_ids: Vec<String> = all.keys().cloned().collect();
        for machine_id in machine_ids {
            let already_has_origin = all
                .get(&machine_id)
                .map(|m| m.users.values().any(|states| states.values().any(|s| s.id == origin)))
                .unwrap_or(false);
            if already_has_origin {
                attach(all, None, &machine_id, root, children);
                associated = true;
            }
        }
        if !associated {
            warn!("couldn't find any association for user dataset {}", root.name);
        }
    }

    // Case D: a user-only snapshot, matched against the base id of an
    // existing UserState for the same user. May attach to multiple machines.
    for (root, children) in &unattached_snapshots {
        let (base, _) = split_snapshot_name(&root.name);
        let user = user_from_dataset_name(&root.name);

        let mut associated = false;
        let machine_ids: Vec<String> = all.keys().cloned().collect();
        for machine_id in machine_ids {
            let matches = all
                .get(&machine_id)
                .and_then(|m| m.users.get(&user))
                .map(|states| states.values().any(|s| s.id == base))
                .unwrap_or(false);
            if matches {
                attach(all, None, &machine_id, root, children);
                associated = true;
            }
        }
        if !associated {
            warn!("couldn't find any association for user dataset {}", root.name);
        }
    }
}

/// Third pass (C6): attaches boot and persistent datasets to a machine's
/// main state.
fn attach_remaining(m: &mut Machine, boots: &[DatasetRef], persistents: &[DatasetRef]) {
    let machine_id = basename(m.id()).to_string();

    let mut boot_group_id: Option<String> = None;
    for d in boots {
        if d.is_snapshot {
            continue;
        }
        if d.name.ends_with(&format!("/{machine_id}")) {
            boot_group_id = Some(d.name.clone());
            m.state.system_datasets.insert(d.name.clone(), vec![d.clone()]);
        } else if let Some(group) = &boot_group_id {
            if d.name.starts_with(&format!("{group}/")) {
                m.state
                    .system_datasets
                    .get_mut(group)
                    .expect("boot group was just inserted")
                    .push(d.clone());
            }
        }
    }

    m.state.persistent_datasets = persistents.to_vec();

    let history_ids: Vec<String> = m.history.keys().cloned().collect();
    for history_id in history_ids {
        let h = m.history.get_mut(&history_id).expect("key came from m.history");
        attach_remaining_history(h, boots, persistents);
    }
}

/// Boot-dataset attachment for a history state. Runs the snapshot-suffix
/// branch and the clone/promotion branch over the same scan, `continue`-ing
/// past the clone branch once a dataset has matched the snapshot branch;
/// per design note 2 this is preserved verbatim from the reference
/// implementation, including the case where a later `/state_id` match on a
/// *different* dataset overwrites a snapshot-derived `boot_group_id`.
fn attach_remaining_history(h: &mut State, boots: &[DatasetRef], persistents: &[DatasetRef]) {
    let state_id = basename(&h.id).to_string();
    let (_, snap) = split_snapshot_name(&state_id);

    let mut boot_group_id: Option<String> = None;
    for d in boots {
        if !snap.is_empty() {
            let snap_suffix = format!("@{snap}");
            if boot_group_id.is_none() && d.name.ends_with(&snap_suffix) {
                boot_group_id = Some(d.name.clone());
                h.system_datasets.insert(d.name.clone(), vec![d.clone()]);
                continue;
            } else if let Some(group) = &boot_group_id {
                let (group_base, _) = split_snapshot_name(group);
                if d.name.starts_with(&format!("{group_base}/")) && d.name.ends_with(&snap_suffix) {
                    h.system_datasets
                        .get_mut(group)
                        .expect("boot group was just inserted")
                        .push(d.clone());
                }
            }
        }

        if d.name.ends_with(&format!("/{state_id}")) {
            boot_group_id = Some(d.name.clone());
            h.system_datasets.insert(d.name.clone(), vec![d.clone()]);
        } else if let Some(group) = &boot_group_id {
            if d.name.starts_with(&format!("{group}/")) {
                h.system_datasets
                    .entry(group.clone())
                    .or_default()
                    .push(d.clone());
            }
        }
    }

    h.persistent_datasets = persistents.to_vec();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::provider::FixtureDatasetProvider;
    use std::sync::Arc;

    fn ds(
        name: &str,
        mountpoint: &str,
        can_mount: CanMount,
        boot_fs: bool,
        is_snapshot: bool,
        origin: &str,
        bootfs_datasets: &str,
    ) -> DatasetRef {
        Arc::new(Dataset {
            name: name.to_string(),
            mountpoint: mountpoint.to_string(),
            can_mount,
            boot_fs,
            is_snapshot,
            origin: origin.to_string(),
            last_used: 0,
            mounted: false,
            last_booted_kernel: String::new(),
            bootfs_datasets: bootfs_datasets.to_string(),
        })
    }

    fn s1_inventory() -> Vec<DatasetRef> {
        vec![
            ds(
                "rpool/ROOT/ubuntu_aaa",
                "/",
                CanMount::On,
                true,
                false,
                "",
                "",
            ),
            ds(
                "rpool/ROOT/ubuntu_aaa/var",
                "/var",
                CanMount::On,
                false,
                false,
                "",
                "",
            ),
            ds("rpool/BOOT/ubuntu_aaa", "/boot", CanMount::On, false, false, "", ""),
            ds(
                "rpool/USERDATA/alice_xx",
                "/home/alice",
                CanMount::On,
                false,
                false,
                "",
                "rpool/ROOT/ubuntu_aaa",
            ),
            ds("rpool/shared", "/shared", CanMount::On, false, false, "", ""),
        ]
    }

    #[test]
    fn s1_single_fresh_machine() {
        let provider = FixtureDatasetProvider::new(s1_inventory());
        let machines = Machines::refresh(&provider, "root=ZFS=rpool/ROOT/ubuntu_aaa").unwrap();

        assert_eq!(machines.all.len(), 1);
        let m = machines.all.get("rpool/ROOT/ubuntu_aaa").unwrap();
        assert!(m.history.is_empty());
        assert_eq!(machines.current.as_deref(), Some("rpool/ROOT/ubuntu_aaa"));

        let alice = m.users.get("alice").expect("alice should be attached");
        assert_eq!(alice.len(), 1);

        assert_eq!(
            machines.all_persistent_datasets.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            vec!["rpool/shared"]
        );
    }

    #[test]
    fn s2_clone_as_history() {
        let mut inventory = s1_inventory();
        // canmount=noauto (not "off"): a history root must still satisfy
        // `can_mount != off` to be recognised per populate_system_and_history.
        inventory.push(ds(
            "rpool/ROOT/ubuntu_bbb",
            "/",
            CanMount::NoAuto,
            false,
            false,
            "rpool/ROOT/ubuntu_aaa@snap1",
            "",
        ));
        inventory.push(ds(
            "rpool/ROOT/ubuntu_aaa@snap1",
            "/",
            CanMount::On,
            false,
            true,
            "",
            "",
        ));
        inventory.push(ds(
            "rpool/ROOT/ubuntu_bbb/var",
            "/var",
            CanMount::On,
            false,
            false,
            "",
            "",
        ));

        let provider = FixtureDatasetProvider::new(inventory);
        let machines = Machines::refresh(&provider, "root=ZFS=rpool/ROOT/ubuntu_aaa").unwrap();

        assert_eq!(machines.all.len(), 1);
        let m = machines.all.get("rpool/ROOT/ubuntu_aaa").unwrap();
        let history = m
            .history
            .get("rpool/ROOT/ubuntu_bbb")
            .expect("clone should be registered as history");
        let group = history
            .system_datasets
            .get("rpool/ROOT/ubuntu_bbb")
            .expect("history root should seed its own route key");
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn s3_snapshot_history_with_boot() {
        let mut inventory = s1_inventory();
        inventory.push(ds(
            "rpool/ROOT/ubuntu_aaa@snap1",
            "/",
            CanMount::On,
            false,
            true,
            "",
            "",
        ));
        inventory.push(ds(
            "rpool/BOOT/ubuntu_aaa@snap1",
            "/boot",
            CanMount::On,
            false,
            true,
            "",
            "",
        ));

        let provider = FixtureDatasetProvider::new(inventory);
        let machines = Machines::refresh(&provider, "root=ZFS=rpool/ROOT/ubuntu_aaa").unwrap();

        let m = machines.all.get("rpool/ROOT/ubuntu_aaa").unwrap();
        let h = m
            .history
            .get("rpool/ROOT/ubuntu_aaa@snap1")
            .expect("snapshot should be registered as history");

        assert!(h.system_datasets.contains_key("rpool/ROOT/ubuntu_aaa@snap1"));
        assert!(h.system_datasets.contains_key("rpool/BOOT/ubuntu_aaa@snap1"));
    }

    #[test]
    fn s4_ambiguous_get_machine() {
        let mut inventory = Vec::new();
        inventory.push(ds("pool/ROOT/ubuntu_aaa", "/", CanMount::On, true, false, "", ""));
        inventory.push(ds("pool2/ROOT/ubuntu_aaa", "/", CanMount::On, true, false, "", ""));

        let provider = FixtureDatasetProvider::new(inventory);
        let machines = Machines::refresh(&provider, "").unwrap();

        assert!(matches!(
            machines.get_machine("ubuntu_aaa"),
            Err(ZsysError::Ambiguous { .. })
        ));
        assert!(machines.get_machine("pool/ROOT/ubuntu_aaa").is_ok());
    }

    #[test]
    fn s5_orphan_user_clone_warns_but_is_still_listed() {
        let mut inventory = s1_inventory();
        inventory.push(ds(
            "rpool/USERDATA/orphan_zz",
            "/home/orphan",
            CanMount::On,
            false,
            false,
            "rpool/USERDATA/nonexistent@snap1",
            "",
        ));

        let provider = FixtureDatasetProvider::new(inventory);
        let machines = Machines::refresh(&provider, "").unwrap();

        let m = machines.all.get("rpool/ROOT/ubuntu_aaa").unwrap();
        assert!(!m.users.contains_key("orphan"));
        assert!(machines
            .all_users_datasets
            .iter()
            .any(|d| d.name == "rpool/USERDATA/orphan_zz"));
    }

    #[test]
    fn s6_promotion_without_state_promotion() {
        let mut inventory = s1_inventory();
        inventory.push(ds(
            "rpool/USERDATA/alice_yy",
            "/home/alice",
            CanMount::On,
            false,
            false,
            "rpool/USERDATA/alice_xx",
            "",
        ));

        let provider = FixtureDatasetProvider::new(inventory);
        let machines = Machines::refresh(&provider, "").unwrap();

        let m = machines.all.get("rpool/ROOT/ubuntu_aaa").unwrap();
        let alice = m.users.get("alice").expect("alice should exist");
        assert!(alice.contains_key("rpool/USERDATA/alice_yy"));
        assert!(!m
            .state
            .user_datasets
            .contains_key("rpool/USERDATA/alice_yy"));
    }
}
