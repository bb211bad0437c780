//! Graceful port names
//!
//! Turns raw port suffixes into something readable, using rules keyed on the
//! client that owns the port. A group name selects a rule when it equals a
//! known client name, or is that name followed by `_<digits>` or `.<anything>`.
//! The first rule in table order wins; unknown clients get the generic rule,
//! which only swaps underscores for spaces.

/// Result of cleaning up one port name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GracefulName {
    pub display_name: String,
    /// The port ends in "1" and should only show it once it is paired
    pub set_the_one_on_pair: bool,
}

struct NamingRule {
    clients: &'static [&'static str],
    transform: fn(&str) -> GracefulName,
}

const NAMING_RULES: &[NamingRule] = &[
    NamingRule { clients: &["firewire_pcm"], transform: firewire_pcm },
    NamingRule { clients: &["a2j"], transform: a2j },
    NamingRule { clients: &["Hydrogen"], transform: hydrogen },
    NamingRule { clients: &["ardour", "Ardour"], transform: ardour },
    NamingRule { clients: &["Qtractor"], transform: qtractor },
    NamingRule { clients: &["SooperLooper", "sooperlooper"], transform: sooperlooper },
    NamingRule { clients: &["Luppp"], transform: luppp },
    NamingRule { clients: &["seq64"], transform: seq64 },
    NamingRule { clients: &["calfjackhost"], transform: calfjackhost },
];

/// Clean up `raw_port_name` for a port of group `group_name`.
///
/// Pure: the same inputs always give the same output. An empty result falls
/// back to the raw name.
pub fn graceful_name(group_name: &str, raw_port_name: &str) -> GracefulName {
    let transform = NAMING_RULES
        .iter()
        .find(|rule| rule.clients.iter().any(|client| client_matches(client, group_name)))
        .map(|rule| rule.transform)
        .unwrap_or(generic);

    let mut graceful = transform(raw_port_name);
    if graceful.display_name.is_empty() {
        graceful.display_name = raw_port_name.to_string();
    }
    graceful
}

/// Display name for a group box. "PulseAudio JACK Sink" becomes
/// "PulseAudio/JACK Sink" so the canvas can show it as title and subtitle.
pub fn group_display_name(group_name: &str) -> String {
    if group_name.starts_with("PulseAudio ") {
        group_name.replacen(' ', "/", 1)
    } else {
        group_name.to_string()
    }
}

fn client_matches(client: &str, group_name: &str) -> bool {
    let Some(rest) = group_name.strip_prefix(client) else {
        return false;
    };
    if rest.is_empty() || rest.starts_with('.') {
        return true;
    }
    rest.strip_prefix('_')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Split a trailing run of ASCII digits off `name`.
pub fn split_end_digits(name: &str) -> (&str, &str) {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    (base, &name[base.len()..])
}

fn cut_end<'a>(name: &'a str, ends: &[&str]) -> &'a str {
    ends.iter()
        .find_map(|end| name.strip_suffix(end))
        .unwrap_or(name)
}

fn plain(display_name: String) -> GracefulName {
    GracefulName {
        display_name,
        set_the_one_on_pair: false,
    }
}

/// Shared shape of the DAW rules: drop a known "/audio_out " style infix
/// before the channel number, defer a "1" until pairing.
fn numbered(name: &str, ends: &[&str]) -> GracefulName {
    let (base, num) = split_end_digits(name);
    if num.is_empty() {
        return plain(name.to_string());
    }

    let base = cut_end(base, ends);
    if num == "1" {
        GracefulName {
            display_name: base.to_string(),
            set_the_one_on_pair: true,
        }
    } else {
        plain(format!("{base} {num}"))
    }
}

fn firewire_pcm(name: &str) -> GracefulName {
    if name.contains('(') && name.contains(')') {
        let after_paren = name.split_once('(').map(|(_, rest)| rest).unwrap_or_default();
        let inner = after_paren.rsplit_once(')').map(|(inner, _)| inner).unwrap_or_default();
        let (base, num) = split_end_digits(inner);
        if num.is_empty() {
            return plain(base.to_string());
        }
        let base = base.strip_suffix(':').unwrap_or(base);
        plain(format!("{base} {num}"))
    } else {
        let after = name.split_once('_').map(|(_, rest)| rest).unwrap_or_default();
        plain(cut_end(after, &["_in", "_out"]).to_string())
    }
}

fn a2j(name: &str) -> GracefulName {
    match name.split_once(':') {
        Some((_, device)) if !device.is_empty() => {
            let device = device.strip_prefix(' ').unwrap_or(device);
            plain(cut_end(device, &[" Port-0", " MIDI 1"]).to_string())
        }
        _ => plain(name.to_string()),
    }
}

fn hydrogen(name: &str) -> GracefulName {
    let mut display = name.to_string();

    // A bare track number stays as is, without a trailing separator
    if let Some(track) = name.strip_prefix("Track_") {
        display = track.to_string();
        if let Some((num, rest)) = track.split_once('_')
            && !num.is_empty()
            && num.chars().all(|c| c.is_ascii_digit())
        {
            display = format!("{num} {rest}");
        }
    }

    if display.ends_with("_Main_L") {
        display = display.replacen("_Main_L", " L", 1);
    } else if display.ends_with("_Main_R") {
        display = display.replacen("_Main_R", " R", 1);
    }

    plain(display)
}

fn ardour(name: &str) -> GracefulName {
    numbered(name, &["/audio_out ", "/audio_in ", "/midi_out ", "/midi_in "])
}

fn qtractor(name: &str) -> GracefulName {
    numbered(name, &["/in_", "/out_"])
}

fn sooperlooper(name: &str) -> GracefulName {
    numbered(name, &["_in_", "_out_"])
}

fn luppp(name: &str) -> GracefulName {
    let name = name.strip_suffix('\n').unwrap_or(name);
    plain(name.replace('_', " "))
}

fn seq64(name: &str) -> GracefulName {
    plain(name.replacen("seq64 midi ", "", 1))
}

fn calfjackhost(name: &str) -> GracefulName {
    let (base, num) = split_end_digits(name);
    if num.is_empty() {
        return plain(name.to_string());
    }
    plain(format!("{} {num}", cut_end(base, &[" Out #", " In #"])))
}

fn generic(name: &str) -> GracefulName {
    plain(name.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(group: &str, port: &str) -> String {
        graceful_name(group, port).display_name
    }

    #[test]
    fn test_client_matching() {
        assert!(client_matches("ardour", "ardour"));
        assert!(client_matches("ardour", "ardour_12"));
        assert!(client_matches("ardour", "ardour.session"));
        assert!(!client_matches("ardour", "ardour_"));
        assert!(!client_matches("ardour", "ardour_x1"));
        assert!(!client_matches("ardour", "ardourish"));
    }

    #[test]
    fn test_split_end_digits() {
        assert_eq!(split_end_digits("capture_12"), ("capture_", "12"));
        assert_eq!(split_end_digits("out"), ("out", ""));
        assert_eq!(split_end_digits("42"), ("", "42"));
    }

    #[test]
    fn test_ardour_defers_the_one() {
        let first = graceful_name("Ardour", "master/audio_out 1");
        assert_eq!(first.display_name, "master");
        assert!(first.set_the_one_on_pair);
        assert_eq!(first, graceful_name("Ardour", "master/audio_out 1"));

        let second = graceful_name("Ardour", "master/audio_out 2");
        assert_eq!(second.display_name, "master 2");
        assert!(!second.set_the_one_on_pair);

        assert_eq!(display("ardour_3", "Audio 1/midi_in 2"), "Audio 1 2");
        assert_eq!(display("Ardour", "LTC-Out"), "LTC-Out");
    }

    #[test]
    fn test_qtractor_and_sooperlooper() {
        let one = graceful_name("Qtractor", "Master/out_1");
        assert_eq!(one.display_name, "Master");
        assert!(one.set_the_one_on_pair);
        assert_eq!(display("Qtractor", "Master/out_2"), "Master 2");
        assert_eq!(display("sooperlooper", "loop0_out_2"), "loop0 2");
        assert_eq!(display("SooperLooper.1", "common_in_3"), "common 3");
    }

    #[test]
    fn test_firewire_pcm() {
        assert_eq!(display("firewire_pcm", "pcm-0 (Analog:3)"), "Analog 3");
        assert_eq!(display("firewire_pcm", "pcm-0 (SPDIF)"), "SPDIF");
        assert_eq!(display("firewire_pcm", "pcm_analog1_in"), "analog1");
    }

    #[test]
    fn test_a2j() {
        assert_eq!(display("a2j", "Midi Through [14] (capture): Midi Through Port-0"), "Midi Through");
        assert_eq!(display("a2j", "nanoKEY2 [20] (playback): nanoKEY2 MIDI 1"), "nanoKEY2");
        assert_eq!(display("a2j", "no colon here"), "no colon here");
    }

    #[test]
    fn test_hydrogen() {
        assert_eq!(display("Hydrogen", "Track_3_Kick_Main_L"), "3 Kick L");
        assert_eq!(display("Hydrogen", "Track_3"), "3");
        assert_eq!(display("Hydrogen", "out_Main_R"), "out R");
    }

    #[test]
    fn test_misc_clients() {
        assert_eq!(display("Luppp", "master_left\n"), "master left");
        assert_eq!(display("seq64", "seq64 midi out 3"), "out 3");
        assert_eq!(display("calfjackhost", "Reverb Out #2"), "Reverb 2");
        assert_eq!(display("calfjackhost", "Reverb"), "Reverb");
    }

    #[test]
    fn test_generic_and_empty_fallback() {
        assert_eq!(display("mplayer", "out_0"), "out 0");
        assert_eq!(display("firewire_pcm", "pcm_"), "pcm_");
        assert_eq!(display("system", ""), "");
    }

    #[test]
    fn test_group_display_name() {
        assert_eq!(group_display_name("PulseAudio JACK Sink"), "PulseAudio/JACK Sink");
        assert_eq!(group_display_name("system"), "system");
    }
}
