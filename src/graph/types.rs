use serde::{Deserialize, Serialize};

pub type GroupId = u64;
pub type PortId = u64;
pub type PortgroupId = u64;
pub type ConnectionId = u64;

/// Signal type carried by a port. A port with no type is `None` at use sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Midi,
}

/// Port direction (Input sorts before Output for display)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Which of a port's three names decides its group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasMode {
    #[default]
    None,
    Alias1,
    Alias2,
}

/// Port flag bitset as reported by the audio server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortFlags(u32);

impl PortFlags {
    pub const INPUT: PortFlags = PortFlags(0x01);
    pub const OUTPUT: PortFlags = PortFlags(0x02);
    pub const PHYSICAL: PortFlags = PortFlags(0x04);
    pub const CAN_MONITOR: PortFlags = PortFlags(0x08);
    pub const TERMINAL: PortFlags = PortFlags(0x10);
    pub const CONTROL_VOLTAGE: PortFlags = PortFlags(0x100);

    pub const fn empty() -> Self {
        PortFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        PortFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: PortFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for PortFlags {
    type Output = PortFlags;

    fn bitor(self, rhs: PortFlags) -> PortFlags {
        PortFlags(self.0 | rhs.0)
    }
}

/// Icon family used by the canvas when drawing a group box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKind {
    Application,
    Hardware,
    Client,
}

/// One client/program and the ports it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    /// Raw name as reported by the backend
    pub name: String,
    pub display_name: String,
    /// Set when the first port of the group was physical
    pub is_hardware: bool,
    /// Icon supplied by the session layer, empty when unknown
    pub client_icon: String,
    /// Owned ports in insertion order
    pub ports: Vec<PortId>,
    pub portgroups: Vec<PortgroupId>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            display_name: name.clone(),
            name,
            is_hardware: false,
            client_icon: String::new(),
            ports: Vec::new(),
            portgroups: Vec::new(),
        }
    }

    /// Title and optional subtitle, split on the first `/` of the display name.
    pub fn title_subtitle(&self) -> (&str, Option<&str>) {
        match self.display_name.split_once('/') {
            Some((title, subtitle)) => (title, Some(subtitle)),
            None => (&self.display_name, None),
        }
    }

    /// Icon kind and name the canvas should use for this group.
    pub fn icon(&self) -> (IconKind, String) {
        if !self.client_icon.is_empty() {
            return (IconKind::Client, self.client_icon.clone());
        }

        let mut icon_name = self
            .name
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        if self.is_hardware {
            if self.name == "a2j" {
                icon_name = "a2j".to_string();
            }
            return (IconKind::Hardware, icon_name);
        }

        (IconKind::Application, icon_name)
    }
}

/// One addressable endpoint of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: PortId,
    pub group_id: GroupId,
    /// Raw "client:port" identity
    pub full_name: String,
    pub alias_1: String,
    pub alias_2: String,
    pub media_type: Option<MediaType>,
    pub flags: PortFlags,
    pub metadata: String,
    pub display_name: String,
    pub portgroup_id: Option<PortgroupId>,
    pub prevent_stereo: bool,
    /// The display name still waits for its " 1" suffix until a pair shows up
    pub set_the_one_on_pair: bool,
}

impl Port {
    pub fn new(
        id: PortId,
        full_name: impl Into<String>,
        alias_1: impl Into<String>,
        alias_2: impl Into<String>,
        media_type: Option<MediaType>,
        flags: PortFlags,
    ) -> Self {
        Self {
            id,
            group_id: 0,
            full_name: full_name.into(),
            alias_1: alias_1.into(),
            alias_2: alias_2.into(),
            media_type,
            flags,
            metadata: String::new(),
            display_name: String::new(),
            portgroup_id: None,
            prevent_stereo: false,
            set_the_one_on_pair: false,
        }
    }

    /// Mode derived from the flags. Output wins when both bits are set.
    pub fn mode(&self) -> Option<PortDirection> {
        if self.flags.contains(PortFlags::OUTPUT) {
            Some(PortDirection::Output)
        } else if self.flags.contains(PortFlags::INPUT) {
            Some(PortDirection::Input)
        } else {
            None
        }
    }

    pub fn is_physical(&self) -> bool {
        self.flags.contains(PortFlags::PHYSICAL)
    }

    /// The name that decides group membership under `alias_mode`.
    /// An empty alias falls back to the primary name.
    pub fn grouping_name(&self, alias_mode: AliasMode) -> &str {
        let alias = match alias_mode {
            AliasMode::None => return &self.full_name,
            AliasMode::Alias1 => &self.alias_1,
            AliasMode::Alias2 => &self.alias_2,
        };
        if alias.is_empty() { &self.full_name } else { alias }
    }
}

/// A stereo (or wider) bundle of ports inside one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Portgroup {
    pub id: PortgroupId,
    pub group_id: GroupId,
    pub port_mode: PortDirection,
    pub ports: Vec<PortId>,
}

/// A directed link from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub port_out: PortId,
    pub port_in: PortId,
}
