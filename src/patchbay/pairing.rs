//! Stereo pair detection
//!
//! When an audio port is added, look back at the most recent ungrouped port
//! of the same group, type and mode, and decide from the two names whether
//! they form a left/right (or n-1/n) pair. Read-only: the caller creates the
//! portgroup.

use crate::graph::{Group, MediaType, Port};

/// Suffix conventions for right-hand channels and their left-hand partners.
const RIGHT_LEFT_ENDINGS: &[(&str, &str)] = &[
    ("right", "left"),
    ("Right", "Left"),
    ("(Right)", "(Left)"),
    (".r", ".l"),
    ("_r", "_l"),
    ("_r\n", "_l\n"),
];

/// Words that may follow the channel marker, as in "R out" or "Right input".
const TRAILING_WORDS: &[&str] = &[
    "out",
    "Out",
    "output",
    "Output",
    "in",
    "In",
    "input",
    "Input",
    "audio input",
    "audio output",
];

/// Find the port `new_port` pairs with, if any.
///
/// `group_ports` are the group's ports in insertion order; `new_port` may or
/// may not already be among them.
pub fn detect_pair<'a>(group: &Group, group_ports: &[&'a Port], new_port: &Port) -> Option<&'a Port> {
    if new_port.media_type != Some(MediaType::Audio) {
        return None;
    }
    let mode = new_port.mode()?;

    let other = group_ports.iter().rev().copied().find(|other| {
        other.id != new_port.id
            && other.media_type == new_port.media_type
            && other.mode() == Some(mode)
            && other.portgroup_id.is_none()
            && !other.prevent_stereo
    })?;

    let port_name = strip_group(&group.name, &new_port.full_name);
    let other_name = strip_group(&group.name, &other.full_name);

    let candidates = if new_port.is_physical() {
        vec![other_name.to_string()]
    } else {
        pair_candidates(port_name)
    };

    if candidates.iter().any(|c| c == other_name) {
        log::debug!("Pairing {:?} with {:?}", other.full_name, new_port.full_name);
        Some(other)
    } else {
        None
    }
}

/// Names the left partner of `port_name` could carry.
pub fn pair_candidates(port_name: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let Some(last) = port_name.chars().last() else {
        return candidates;
    };

    if last.is_ascii_digit() {
        let base = port_name.trim_end_matches(|c: char| c.is_ascii_digit());
        let digits = &port_name[base.len()..];

        if let Some(left_base) = base.strip_suffix('R') {
            candidates.push(format!("{left_base}L{digits}"));
        } else if let Ok(num) = digits.parse::<u64>() {
            if let Some(prev) = num.checked_sub(1) {
                candidates.push(format!("{base}{prev}"));
            }
            if num == 1 || num == 2 {
                let bare = base.strip_suffix([' ', '_']).unwrap_or(base);
                candidates.push(bare.to_string());
            }
        }
        return candidates;
    }

    if let Some(stem) = port_name.strip_suffix('R') {
        candidates.push(format!("{stem}L"));
        if !stem.is_empty() {
            candidates.push(stem.strip_suffix(' ').unwrap_or(stem).to_string());
        }
    } else if let Some((stem, left)) = RIGHT_LEFT_ENDINGS
        .iter()
        .find_map(|(right, left)| port_name.strip_suffix(right).map(|stem| (stem, left)))
    {
        candidates.push(format!("{stem}{left}"));
    }

    for word in TRAILING_WORDS {
        for (right, left) in [("R ", "L "), ("right ", "left "), ("Right ", "Left ")] {
            if let Some(stem) = port_name.strip_suffix(&format!("{right}{word}")) {
                candidates.push(format!("{stem}{left}{word}"));
                break;
            }
        }
    }

    candidates
}

fn strip_group<'a>(group_name: &str, full_name: &'a str) -> &'a str {
    full_name
        .strip_prefix(group_name)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(full_name)
}
