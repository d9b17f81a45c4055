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

use crate::state::{Machine, State};
use itertools::Itertools;
use time::format_description;
use time::OffsetDateTime;

/// Formats a unix timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(secs: u64) -> String {
    let format = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .expect("format description is a fixed, valid literal");
    OffsetDateTime::from_unix_timestamp(secs as i64)
        .ok()
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| "-".to_string())
}

/// Composes the `<zero-padded-10-digit-unix-time>_<id>` sort key used to
/// order history/user-state entries by recency. Reverse-lexical order on
/// this key puts the most recent entry first, with id as a descending
/// tie-break.
fn recency_key(last_used: Option<u64>, id: &str) -> String {
    format!("{:010}_{}", last_used.unwrap_or(0), id)
}

fn render_timestamp_field(last_used: Option<u64>) -> String {
    last_used.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

/// Renders the full `info` block for one machine: the machine's own state,
/// its `History:` states sorted by recency, then its `Users:` states sorted
/// the same way per user.
pub fn format_info(m: &Machine) -> String {
    let mut out = String::new();
    out.push_str(&format_state_header(&m.state));

    if !m.history.is_empty() {
        out.push_str("History:\n");
        for (id, h) in sorted_states_by_recency(&m.history) {
            out.push_str(&format!("  {id}\t{}\n", render_timestamp_field(h.last_used)));
        }
    }

    if !m.users.is_empty() {
        out.push_str("Users:\n");
        for (user, states) in &m.users {
            out.push_str(&format!("  {user}:\n"));
            let ordered = states
                .iter()
                .map(|(id, s)| (recency_key(s.last_used, id), id.as_str(), s.last_used))
                .sorted_by(|a, b| b.0.cmp(&a.0));
            for (_, id, last_used) in ordered {
                out.push_str(&format!("    {id}\t{}\n", render_timestamp_field(last_used)));
            }
        }
    }

    out
}

fn format_state_header(s: &State) -> String {
    format!(
        "ID: {}\nZSys: {}\nLast Used: {}\n",
        s.id,
        s.is_zsys,
        render_timestamp_field(s.last_used)
    )
}

fn sorted_states_by_recency(
    history: &std::collections::BTreeMap<String, State>,
) -> impl Iterator<Item = (&str, &State)> {
    history
        .iter()
        .map(|(id, h)| (recency_key(h.last_used, id), id.as_str(), h))
        .sorted_by(|a, b| b.0.cmp(&a.0))
        .map(|(_, id, h)| (id, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recency_key_orders_more_recent_first_when_reverse_sorted() {
        let mut keys = vec![recency_key(Some(100), "a"), recency_key(Some(200), "b")];
        keys.sort();
        keys.reverse();
        assert_eq!(keys, vec![recency_key(Some(200), "b"), recency_key(Some(100), "a")]);
    }

    #[test]
    fn format_timestamp_renders_iso_like_string() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }
}
