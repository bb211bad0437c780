use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::*;

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.as_bytes().iter().peekable();
    let mut bi = b.as_bytes().iter().peekable();

    loop {
        match (ai.peek(), bi.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&&ac), Some(&&bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let an = take_number(&mut ai);
                    let bn = take_number(&mut bi);
                    match an.cmp(&bn) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                } else {
                    match ac.cmp(&bc) {
                        Ordering::Equal => {
                            ai.next();
                            bi.next();
                        }
                        ord => return ord,
                    }
                }
            }
        }
    }
}

fn take_number<'a>(it: &mut std::iter::Peekable<impl Iterator<Item = &'a u8>>) -> u64 {
    let mut n: u64 = 0;
    while let Some(&&c) = it.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        n = n.saturating_mul(10).saturating_add((c - b'0') as u64);
        it.next();
    }
    n
}

/// Everything a port removal took down with it.
#[derive(Debug, Clone)]
pub struct PortRemoval {
    pub port: Port,
    /// Connections that touched the port, in id order
    pub connections: Vec<Connection>,
    /// Portgroup disbanded because it fell under two members
    pub disbanded: Option<Portgroup>,
    /// The owning group, when this was its last port
    pub removed_group: Option<Group>,
}

/// Side effects of moving a port into another group.
#[derive(Debug, Clone)]
pub struct PortMove {
    pub from_group: GroupId,
    pub disbanded: Option<Portgroup>,
    pub removed_group: Option<Group>,
}

/// The patchbay graph: groups, ports, portgroups and connections, keyed by id.
///
/// Every mutator either applies completely or returns `None`/`false` without
/// touching anything. Cross references are plain ids resolved through the
/// maps held here.
#[derive(Debug, Default)]
pub struct GraphModel {
    groups: HashMap<GroupId, Group>,
    ports: HashMap<PortId, Port>,
    portgroups: HashMap<PortgroupId, Portgroup>,
    connections: HashMap<ConnectionId, Connection>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.ports.is_empty()
    }

    // ── Groups ─────────────────────────────────────────────────────────────

    /// Register a new, empty group. Refused when the id or name is taken.
    pub fn create_group(&mut self, mut group: Group) -> Option<GroupId> {
        if self.groups.contains_key(&group.id) || self.group_by_name(&group.name).is_some() {
            log::warn!("Refusing duplicate group {} ({:?})", group.id, group.name);
            return None;
        }
        group.ports.clear();
        group.portgroups.clear();
        let id = group.id;
        self.groups.insert(id, group);
        Some(id)
    }

    /// Drop a group that no longer owns any port.
    pub fn destroy_group(&mut self, id: GroupId) -> Option<Group> {
        if !self.groups.get(&id)?.ports.is_empty() {
            return None;
        }
        self.groups.remove(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.values().find(|g| g.name == name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Groups ordered naturally by display name ("track 2" before "track 10").
    pub fn groups_sorted(&self) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by(|a, b| natural_cmp(&a.display_name, &b.display_name).then(a.id.cmp(&b.id)));
        groups
    }

    pub fn set_group_display_name(&mut self, id: GroupId, display_name: &str) -> bool {
        match self.groups.get_mut(&id) {
            Some(group) => {
                group.display_name = display_name.to_string();
                true
            }
            None => false,
        }
    }

    /// Which side MIDI ports can be lined up against, if any.
    pub fn midi_alignable(&self, id: GroupId) -> Option<PortDirection> {
        let group = self.groups.get(&id)?;
        let (mut in_audio, mut in_midi, mut out_audio, mut out_midi) = (0, 0, 0, 0);

        for port in group.ports.iter().filter_map(|p| self.ports.get(p)) {
            match (port.mode(), port.media_type) {
                (Some(PortDirection::Input), Some(MediaType::Audio)) => in_audio += 1,
                (Some(PortDirection::Input), Some(MediaType::Midi)) => in_midi += 1,
                (Some(PortDirection::Output), Some(MediaType::Audio)) => out_audio += 1,
                (Some(PortDirection::Output), Some(MediaType::Midi)) => out_midi += 1,
                _ => {}
            }
        }

        if in_audio <= out_audio {
            (in_midi <= out_midi).then_some(PortDirection::Input)
        } else {
            (out_midi <= in_midi).then_some(PortDirection::Output)
        }
    }

    // ── Ports ──────────────────────────────────────────────────────────────

    /// Append a port to the group named by `port.group_id`.
    pub fn insert_port(&mut self, mut port: Port) -> Option<PortId> {
        if self.ports.contains_key(&port.id) || self.port_by_name(&port.full_name).is_some() {
            log::warn!("Refusing duplicate port {} ({:?})", port.id, port.full_name);
            return None;
        }
        let group = self.groups.get_mut(&port.group_id)?;

        if group.ports.is_empty() {
            group.is_hardware = port.is_physical();
        }
        group.ports.push(port.id);

        port.portgroup_id = None;
        let id = port.id;
        self.ports.insert(id, port);
        Some(id)
    }

    /// Remove a port along with its connections. Disbands a portgroup left
    /// with fewer than two members and drops the group once it is empty.
    pub fn remove_port(&mut self, id: PortId) -> Option<PortRemoval> {
        let group_id = self.ports.get(&id)?.group_id;

        let connections = self.connections_of_port(id);
        for connection in &connections {
            self.connections.remove(&connection.id);
        }

        let disbanded = self.leave_portgroup(id);

        let mut port = self.ports.remove(&id)?;
        port.portgroup_id = None;

        let removed_group = self.detach_from_group(group_id, id);

        Some(PortRemoval {
            port,
            connections,
            disbanded,
            removed_group,
        })
    }

    /// Move a port into another existing group, keeping its id and its
    /// connections. The port leaves any portgroup it belonged to.
    pub fn move_port(&mut self, id: PortId, to_group: GroupId) -> Option<PortMove> {
        let from_group = self.ports.get(&id)?.group_id;
        if from_group == to_group || !self.groups.contains_key(&to_group) {
            return None;
        }

        let disbanded = self.leave_portgroup(id);
        let removed_group = self.detach_from_group(from_group, id);

        let is_physical = self.ports.get(&id).is_some_and(|p| p.is_physical());
        if let Some(group) = self.groups.get_mut(&to_group) {
            if group.ports.is_empty() {
                group.is_hardware = is_physical;
            }
            group.ports.push(id);
        }
        if let Some(port) = self.ports.get_mut(&id) {
            port.group_id = to_group;
        }

        Some(PortMove {
            from_group,
            disbanded,
            removed_group,
        })
    }

    /// Change a port's full name. Refused when another port already uses it.
    pub fn rename_port(&mut self, id: PortId, full_name: &str) -> bool {
        if self.port_by_name(full_name).is_some_and(|p| p.id != id) {
            return false;
        }
        match self.ports.get_mut(&id) {
            Some(port) => {
                port.full_name = full_name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_port_label(&mut self, id: PortId, display_name: &str, set_the_one_on_pair: bool) -> bool {
        match self.ports.get_mut(&id) {
            Some(port) => {
                port.display_name = display_name.to_string();
                port.set_the_one_on_pair = set_the_one_on_pair;
                true
            }
            None => false,
        }
    }

    pub fn set_prevent_stereo(&mut self, id: PortId, prevent: bool) -> bool {
        match self.ports.get_mut(&id) {
            Some(port) => {
                port.prevent_stereo = prevent;
                true
            }
            None => false,
        }
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    pub fn port_by_name(&self, full_name: &str) -> Option<&Port> {
        self.ports.values().find(|p| p.full_name == full_name)
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Ports of a group in insertion order.
    pub fn ports_of_group(&self, group_id: GroupId) -> Vec<&Port> {
        self.groups
            .get(&group_id)
            .map(|g| g.ports.iter().filter_map(|id| self.ports.get(id)).collect())
            .unwrap_or_default()
    }

    fn detach_from_group(&mut self, group_id: GroupId, port_id: PortId) -> Option<Group> {
        let group = self.groups.get_mut(&group_id)?;
        group.ports.retain(|p| *p != port_id);
        if group.ports.is_empty() {
            self.destroy_group(group_id)
        } else {
            None
        }
    }

    fn leave_portgroup(&mut self, port_id: PortId) -> Option<Portgroup> {
        let pg_id = self.ports.get(&port_id)?.portgroup_id?;
        if let Some(port) = self.ports.get_mut(&port_id) {
            port.portgroup_id = None;
        }

        let remaining = {
            let portgroup = self.portgroups.get_mut(&pg_id)?;
            portgroup.ports.retain(|p| *p != port_id);
            portgroup.ports.len()
        };

        if remaining < 2 {
            self.disband_portgroup(pg_id)
        } else {
            None
        }
    }

    // ── Portgroups ─────────────────────────────────────────────────────────

    /// Bundle two or more ungrouped ports of one group sharing type and mode.
    pub fn create_portgroup(&mut self, portgroup: Portgroup) -> Option<PortgroupId> {
        if self.portgroups.contains_key(&portgroup.id) || portgroup.ports.len() < 2 {
            return None;
        }

        let mut media_type = None;
        for (index, port_id) in portgroup.ports.iter().enumerate() {
            let port = self.ports.get(port_id)?;
            if port.group_id != portgroup.group_id
                || port.mode() != Some(portgroup.port_mode)
                || port.portgroup_id.is_some()
                || portgroup.ports[..index].contains(port_id)
            {
                log::warn!("Refusing portgroup {}: port {} does not fit", portgroup.id, port_id);
                return None;
            }
            match media_type {
                None => media_type = Some(port.media_type),
                Some(mt) if mt != port.media_type => return None,
                Some(_) => {}
            }
        }

        let group = self.groups.get_mut(&portgroup.group_id)?;
        group.portgroups.push(portgroup.id);

        for port_id in &portgroup.ports {
            if let Some(port) = self.ports.get_mut(port_id) {
                port.portgroup_id = Some(portgroup.id);
            }
        }

        let id = portgroup.id;
        self.portgroups.insert(id, portgroup);
        Some(id)
    }

    /// Break a portgroup up, leaving its ports ungrouped.
    pub fn disband_portgroup(&mut self, id: PortgroupId) -> Option<Portgroup> {
        let portgroup = self.portgroups.remove(&id)?;

        for port_id in &portgroup.ports {
            if let Some(port) = self.ports.get_mut(port_id) {
                port.portgroup_id = None;
            }
        }
        if let Some(group) = self.groups.get_mut(&portgroup.group_id) {
            group.portgroups.retain(|pg| *pg != id);
        }

        Some(portgroup)
    }

    pub fn portgroup(&self, id: PortgroupId) -> Option<&Portgroup> {
        self.portgroups.get(&id)
    }

    pub fn portgroups(&self) -> impl Iterator<Item = &Portgroup> {
        self.portgroups.values()
    }

    // ── Connections ────────────────────────────────────────────────────────

    /// Add a connection between two known ports. At most one per pair.
    pub fn insert_connection(&mut self, connection: Connection) -> Option<ConnectionId> {
        if self.connections.contains_key(&connection.id)
            || !self.ports.contains_key(&connection.port_out)
            || !self.ports.contains_key(&connection.port_in)
            || self.find_connection(connection.port_out, connection.port_in).is_some()
        {
            return None;
        }
        self.connections.insert(connection.id, connection);
        Some(connection.id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn find_connection(&self, port_out: PortId, port_in: PortId) -> Option<&Connection> {
        self.connections
            .values()
            .find(|c| c.port_out == port_out && c.port_in == port_in)
    }

    /// Connections touching a port, in id order.
    pub fn connections_of_port(&self, port_id: PortId) -> Vec<Connection> {
        let mut connections: Vec<Connection> = self
            .connections
            .values()
            .filter(|c| c.port_out == port_id || c.port_in == port_id)
            .copied()
            .collect();
        connections.sort_by_key(|c| c.id);
        connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(id: PortId, group_id: GroupId, name: &str, flags: PortFlags) -> Port {
        let mut port = Port::new(id, name, "", "", Some(MediaType::Audio), flags);
        port.group_id = group_id;
        port
    }

    fn stereo_model() -> GraphModel {
        let mut model = GraphModel::new();
        model.create_group(Group::new(0, "app"));
        model.insert_port(port(0, 0, "app:out_L", PortFlags::OUTPUT));
        model.insert_port(port(1, 0, "app:out_R", PortFlags::OUTPUT));
        model
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("track 2", "track 10"), Ordering::Less);
        assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
        assert_eq!(natural_cmp("b1", "a2"), Ordering::Greater);
    }

    #[test]
    fn test_insert_requires_group_and_unique_name() {
        let mut model = stereo_model();
        assert!(model.insert_port(port(2, 7, "ghost:x", PortFlags::INPUT)).is_none());
        assert!(model.insert_port(port(3, 0, "app:out_L", PortFlags::OUTPUT)).is_none());
        assert_eq!(model.ports_of_group(0).len(), 2);
        assert!(model.create_group(Group::new(5, "app")).is_none());
    }

    #[test]
    fn test_last_port_removes_group() {
        let mut model = stereo_model();
        let removal = model.remove_port(0).unwrap();
        assert!(removal.removed_group.is_none());
        let removal = model.remove_port(1).unwrap();
        assert_eq!(removal.removed_group.map(|g| g.id), Some(0));
        assert!(model.is_empty());
        assert!(model.remove_port(1).is_none());
    }

    #[test]
    fn test_destroy_group_refuses_non_empty() {
        let mut model = stereo_model();
        assert!(model.destroy_group(0).is_none());
        assert!(model.group(0).is_some());
    }

    #[test]
    fn test_portgroup_validation() {
        let mut model = stereo_model();
        model.insert_port(port(2, 0, "app:in", PortFlags::INPUT));

        let mixed = Portgroup { id: 1, group_id: 0, port_mode: PortDirection::Output, ports: vec![0, 2] };
        assert!(model.create_portgroup(mixed).is_none());
        let single = Portgroup { id: 1, group_id: 0, port_mode: PortDirection::Output, ports: vec![0] };
        assert!(model.create_portgroup(single).is_none());
        let doubled = Portgroup { id: 1, group_id: 0, port_mode: PortDirection::Output, ports: vec![0, 0] };
        assert!(model.create_portgroup(doubled).is_none());
        assert!(model.port(0).unwrap().portgroup_id.is_none());

        let pair = Portgroup { id: 1, group_id: 0, port_mode: PortDirection::Output, ports: vec![0, 1] };
        assert_eq!(model.create_portgroup(pair.clone()), Some(1));
        assert_eq!(model.port(1).unwrap().portgroup_id, Some(1));
        assert_eq!(model.group(0).unwrap().portgroups, vec![1]);

        let again = Portgroup { id: 2, ..pair };
        assert!(model.create_portgroup(again).is_none());
    }

    #[test]
    fn test_removing_member_disbands_pair() {
        let mut model = stereo_model();
        let pair = Portgroup { id: 1, group_id: 0, port_mode: PortDirection::Output, ports: vec![0, 1] };
        model.create_portgroup(pair);

        let removal = model.remove_port(1).unwrap();
        assert_eq!(removal.disbanded.map(|pg| pg.id), Some(1));
        assert!(model.portgroup(1).is_none());
        assert!(model.port(0).unwrap().portgroup_id.is_none());
        assert!(model.group(0).unwrap().portgroups.is_empty());
    }

    #[test]
    fn test_connections_unique_and_dropped_with_port() {
        let mut model = stereo_model();
        model.create_group(Group::new(1, "sink"));
        model.insert_port(port(2, 1, "sink:in", PortFlags::INPUT));

        assert_eq!(model.insert_connection(Connection { id: 0, port_out: 0, port_in: 2 }), Some(0));
        assert!(model.insert_connection(Connection { id: 1, port_out: 0, port_in: 2 }).is_none());
        assert!(model.insert_connection(Connection { id: 1, port_out: 0, port_in: 9 }).is_none());

        let removal = model.remove_port(2).unwrap();
        assert_eq!(removal.connections.len(), 1);
        assert_eq!(model.connections().count(), 0);
    }

    #[test]
    fn test_move_port_keeps_connections() {
        let mut model = stereo_model();
        model.create_group(Group::new(1, "sink"));
        model.insert_port(port(2, 1, "sink:in", PortFlags::INPUT));
        model.insert_connection(Connection { id: 0, port_out: 0, port_in: 2 });
        model.create_group(Group::new(2, "other"));

        let moved = model.move_port(2, 2).unwrap();
        assert_eq!(moved.from_group, 1);
        assert_eq!(moved.removed_group.map(|g| g.id), Some(1));
        assert_eq!(model.port(2).unwrap().group_id, 2);
        assert_eq!(model.group(2).unwrap().ports, vec![2]);
        assert!(model.find_connection(0, 2).is_some());
        assert!(model.move_port(2, 2).is_none());
    }

    #[test]
    fn test_midi_alignable() {
        let mut model = GraphModel::new();
        model.create_group(Group::new(0, "synth"));
        let mut midi_in = port(0, 0, "synth:midi_in", PortFlags::INPUT);
        midi_in.media_type = Some(MediaType::Midi);
        model.insert_port(midi_in);
        model.insert_port(port(1, 0, "synth:out_L", PortFlags::OUTPUT));
        model.insert_port(port(2, 0, "synth:out_R", PortFlags::OUTPUT));
        // one midi input, no midi output, more audio outs than ins
        assert_eq!(model.midi_alignable(0), None);

        model.insert_port(port(3, 0, "synth:in_1", PortFlags::INPUT));
        model.insert_port(port(4, 0, "synth:in_2", PortFlags::INPUT));
        model.insert_port(port(5, 0, "synth:in_3", PortFlags::INPUT));
        assert_eq!(model.midi_alignable(0), Some(PortDirection::Output));
    }
}
