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

use crate::error::{ZsysError, ZsysResult};
use crate::machines::Machines;
use crate::state::Machine;
use serde::Serialize;

/// Serialises the whole graph to pretty-printed JSON using the exported
/// field names already carried by the `Serialize` derives on `Machines`.
pub fn dump_machines(machines: &Machines) -> ZsysResult<String> {
    dump(machines)
}

/// Serialises a single machine, for `machined info <id> --json`.
pub fn dump_machine(m: &Machine) -> ZsysResult<String> {
    dump(m)
}

fn dump<T: Serialize>(value: &T) -> ZsysResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ZsysError::InputUnusable {
        source: format!("failed to serialise JSON dump: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FixtureDatasetProvider;

    #[test]
    fn dump_round_trips_without_panicking_on_empty_graph() {
        let provider = FixtureDatasetProvider::new(Vec::new());
        let machines = Machines::refresh(&provider, "").unwrap();
        let json = dump_machines(&machines).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }

    #[test]
    fn dump_omits_empty_collections() {
        let provider = FixtureDatasetProvider::new(Vec::new());
        let machines = Machines::refresh(&provider, "").unwrap();
        let json = dump_machines(&machines).unwrap();
        assert!(!json.contains("\"All\""));
        assert!(!json.contains("\"Cmdline\""));
    }
}
