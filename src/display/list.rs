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

use crate::display::info::format_timestamp;
use crate::machines::Machines;

/// Renders the `ID\tZSys\tLast Used` table: current machine first, then the
/// rest lexicographically by id. The current row's `Last Used` column is
/// always the literal `current`.
pub fn format_list(machines: &Machines) -> String {
    let mut out = String::new();
    out.push_str("ID\tZSys\tLast Used\n");
    out.push_str("--\t----\t---------\n");

    let mut ids: Vec<&String> = machines.all.keys().collect();
    ids.sort_by(|a, b| {
        let a_is_current = machines.current.as_deref() == Some(a.as_str());
        let b_is_current = machines.current.as_deref() == Some(b.as_str());
        match (a_is_current, b_is_current) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.cmp(b),
        }
    });

    for id in ids {
        let m = machines.all.get(id).expect("id came from machines.all");
        let is_current = machines.current.as_deref() == Some(id.as_str());
        let last_used = if is_current {
            "current".to_string()
        } else {
            m.state
                .last_used
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string())
        };
        out.push_str(&format!("{id}\t{}\t{last_used}\n", m.is_zsys()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FixtureDatasetProvider;

    #[test]
    fn current_machine_sorts_first() {
        let text = "name=pool/ROOT/ubuntu_aaa\nmountpoint=/\ncanmount=on\norg.zsys:bootfs=yes\n\nname=pool/ROOT/ubuntu_bbb\nmountpoint=/\ncanmount=on\norg.zsys:bootfs=yes\n";
        let provider = FixtureDatasetProvider::from_file_text(text).unwrap();
        let machines = Machines::refresh(&provider, "root=pool/ROOT/ubuntu_bbb").unwrap();
        let rendered = format_list(&machines);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[2].starts_with("pool/ROOT/ubuntu_bbb"));
        assert!(lines[2].ends_with("current"));
    }
}
