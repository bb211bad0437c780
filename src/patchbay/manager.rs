//! Patchbay manager
//!
//! Mirrors the audio server graph into the [`GraphModel`] and keeps the canvas
//! in sync with it.
//!
//! ## Ingress
//! Backend events (`add_port`, `remove_port`, connections, positions...) are
//! applied one at a time. Each handler mutates the model first and then sends
//! the matching canvas commands, so the canvas never sees a state the model
//! does not hold. Events naming unknown ports or groups are ignored: the
//! backend is the source of truth and will catch up.
//!
//! ## Gestures
//! Canvas gestures never touch the model. They become [`BackendRequest`]s and
//! the model only changes once the backend echoes the result back as an event.

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use super::icons::ClientIconLookup;
use super::naming::{self, group_display_name};
use super::pairing;
use super::types::{BackendRequest, CanvasAction, CanvasCommand, PatchEvent};
use crate::config::Preferences;
use crate::graph::{
    AliasMode, Connection, ConnectionId, GraphModel, Group, GroupId, IdAllocator, IdKind, MediaType,
    PortDirection, PortFlags, Port, PortId, Portgroup, PortgroupId,
};

/// Group name and port suffix of a full port name.
///
/// The split happens on the first `:`; a name without one is all group.
/// Non-physical ports bridged by a2j are grouped under the bridged client,
/// e.g. `a2j:Midi Through [14] (capture): Midi Through Port-0` belongs to
/// `Midi Through`.
pub fn split_port_name(full_name: &str, physical: bool) -> (&str, &str) {
    if !physical && let Some(bridged) = full_name.strip_prefix("a2j:") {
        let (client, port) = bridged.split_once(':').unwrap_or((bridged, ""));
        let client = client.rsplit_once(" [").map(|(name, _)| name).unwrap_or(client);
        return (client, port);
    }
    full_name.split_once(':').unwrap_or((full_name, ""))
}

fn same_members(a: &[PortId], b: &[PortId]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Patchbay manager owning the graph model
pub struct PatchbayManager {
    graph: GraphModel,
    ids: IdAllocator,
    /// Which port name decides the group, applies to ports added from now on
    alias_mode: AliasMode,
    pub stereo_detection: bool,
    /// Last known box positions keyed by side and group name
    group_positions: HashMap<(PortDirection, String), (i32, i32)>,
    icons: Box<dyn ClientIconLookup>,
    canvas_tx: Sender<CanvasCommand>,
    backend_tx: Sender<BackendRequest>,
}

impl PatchbayManager {
    pub fn new(
        canvas_tx: Sender<CanvasCommand>,
        backend_tx: Sender<BackendRequest>,
        icons: impl ClientIconLookup + 'static,
    ) -> Self {
        Self {
            graph: GraphModel::new(),
            ids: IdAllocator::new(),
            alias_mode: AliasMode::None,
            stereo_detection: true,
            group_positions: HashMap::new(),
            icons: Box::new(icons),
            canvas_tx,
            backend_tx,
        }
    }

    /// Take over alias mode, stereo detection and stored positions.
    pub fn apply_preferences(&mut self, prefs: &Preferences) {
        self.set_alias_mode(prefs.alias_mode);
        self.stereo_detection = prefs.stereo_detection;
        for pos in &prefs.group_positions {
            self.group_positions
                .insert((pos.direction, pos.group.clone()), (pos.x, pos.y));
        }
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn alias_mode(&self) -> AliasMode {
        self.alias_mode
    }

    /// Switch the alias mode. Ports already in the graph keep their group.
    pub fn set_alias_mode(&mut self, alias_mode: AliasMode) {
        if self.alias_mode != alias_mode {
            log::info!("Alias mode {:?} -> {:?}", self.alias_mode, alias_mode);
            self.alias_mode = alias_mode;
        }
    }

    fn emit(&self, command: CanvasCommand) {
        log::trace!("canvas <- {:?}", command);
        let _ = self.canvas_tx.send(command);
    }

    fn request(&self, request: BackendRequest) {
        log::debug!("backend <- {:?}", request);
        let _ = self.backend_tx.send(request);
    }

    // ── Ingress ────────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: PatchEvent) {
        match event {
            PatchEvent::AddPort {
                name,
                alias_1,
                alias_2,
                port_type,
                flags,
                metadata,
            } => self.add_port(&name, &alias_1, &alias_2, port_type, flags, &metadata),
            PatchEvent::RemovePort { name } => self.remove_port(&name),
            PatchEvent::RenamePort { old, new } => self.rename_port(&old, &new),
            PatchEvent::AddConnection { port_out, port_in } => {
                self.add_connection(&port_out, &port_in)
            }
            PatchEvent::RemoveConnection { port_out, port_in } => {
                self.remove_connection(&port_out, &port_in)
            }
            PatchEvent::UpdateGroupPosition {
                direction,
                group,
                x,
                y,
            } => self.update_group_position(direction, &group, x, y),
            PatchEvent::UpdatePortgroup {
                group,
                port_mode,
                ports,
            } => self.update_portgroup(&group, port_mode, &ports),
            PatchEvent::RemovePortgroup { group, port } => self.remove_portgroup(&group, &port),
            PatchEvent::UpdateGroupSplit { group, split } => self.update_group_split(&group, split),
        }
    }

    pub fn add_port(
        &mut self,
        name: &str,
        alias_1: &str,
        alias_2: &str,
        port_type: Option<MediaType>,
        flags: PortFlags,
        metadata: &str,
    ) {
        if self.graph.port_by_name(name).is_some() {
            log::debug!("Port {:?} already known", name);
            return;
        }

        let mut port = Port::new(
            self.ids.next(IdKind::Port),
            name,
            alias_1,
            alias_2,
            port_type,
            flags,
        );
        port.metadata = metadata.to_string();

        let grouping_name = port.grouping_name(self.alias_mode).to_string();
        let (group_name, port_suffix) = split_port_name(&grouping_name, port.is_physical());

        let Some((group_id, group_is_new)) = self.ensure_group(group_name) else {
            return;
        };
        port.group_id = group_id;

        let graceful = naming::graceful_name(group_name, port_suffix);
        port.display_name = graceful.display_name;
        port.set_the_one_on_pair = graceful.set_the_one_on_pair;

        let Some(port_id) = self.graph.insert_port(port) else {
            if group_is_new {
                self.graph.destroy_group(group_id);
            }
            return;
        };
        log::debug!("Port added: id={} name={:?} group={}", port_id, name, group_id);

        if group_is_new {
            self.announce_group(group_id);
        }
        self.announce_port(port_id);
        self.run_stereo_detection(port_id);
    }

    pub fn remove_port(&mut self, name: &str) {
        let Some(port_id) = self.graph.port_by_name(name).map(|p| p.id) else {
            log::debug!("Ignoring removal of unknown port {:?}", name);
            return;
        };
        let Some(removal) = self.graph.remove_port(port_id) else {
            return;
        };
        log::debug!("Port removed: id={} name={:?}", port_id, name);

        for connection in &removal.connections {
            self.emit(CanvasCommand::Disconnect {
                connection_id: connection.id,
            });
        }
        if let Some(portgroup) = &removal.disbanded {
            self.emit(CanvasCommand::RemovePortgroup {
                group_id: portgroup.group_id,
                portgroup_id: portgroup.id,
            });
            self.relabel_released(portgroup);
        }
        if removal.port.mode().is_some() {
            self.emit(CanvasCommand::RemovePort {
                group_id: removal.port.group_id,
                port_id,
            });
        }
        if let Some(group) = &removal.removed_group {
            log::debug!("Group removed: id={} name={:?}", group.id, group.name);
            self.emit(CanvasCommand::RemoveGroup { group_id: group.id });
        }
    }

    /// Follow a port rename. When the name that decides grouping now points at
    /// another client the port moves there; otherwise it stays put and only
    /// its label is refreshed.
    pub fn rename_port(&mut self, old: &str, new: &str) {
        let Some(port_id) = self.port_id(old) else {
            log::debug!("Ignoring rename of unknown port {:?}", old);
            return;
        };
        if old == new {
            return;
        }
        if !self.graph.rename_port(port_id, new) {
            log::debug!("Ignoring rename {:?} -> {:?}: name already taken", old, new);
            return;
        }

        let Some(port) = self.graph.port(port_id) else {
            return;
        };
        let (group_name, _) = split_port_name(port.grouping_name(self.alias_mode), port.is_physical());
        let stays = self
            .graph
            .group(port.group_id)
            .is_some_and(|g| g.name == group_name);
        if !stays {
            let group_name = group_name.to_string();
            self.move_port(port_id, &group_name);
            return;
        }

        self.refresh_port_label(port_id);
        self.announce_port_properties(port_id);
    }

    /// Reattach an already renamed port to `group_name`.
    fn move_port(&mut self, port_id: PortId, group_name: &str) {
        let Some(port) = self.graph.port(port_id) else {
            return;
        };
        let had_mode = port.mode().is_some();
        let connections = self.graph.connections_of_port(port_id);

        let Some((group_id, group_is_new)) = self.ensure_group(group_name) else {
            return;
        };
        let Some(moved) = self.graph.move_port(port_id, group_id) else {
            if group_is_new {
                self.graph.destroy_group(group_id);
            }
            log::warn!("Port {} could not move to group {:?}", port_id, group_name);
            return;
        };
        log::debug!(
            "Port {} moved from group {} to group {}",
            port_id,
            moved.from_group,
            group_id
        );

        for connection in &connections {
            self.emit(CanvasCommand::Disconnect {
                connection_id: connection.id,
            });
        }
        if let Some(portgroup) = &moved.disbanded {
            self.emit(CanvasCommand::RemovePortgroup {
                group_id: portgroup.group_id,
                portgroup_id: portgroup.id,
            });
            self.relabel_released(portgroup);
        }
        if had_mode {
            self.emit(CanvasCommand::RemovePort {
                group_id: moved.from_group,
                port_id,
            });
        }
        if let Some(group) = &moved.removed_group {
            self.emit(CanvasCommand::RemoveGroup { group_id: group.id });
        }

        self.refresh_port_label(port_id);
        if group_is_new {
            self.announce_group(group_id);
        }
        self.announce_port(port_id);
        self.run_stereo_detection(port_id);
        for connection in &connections {
            self.announce_connection(connection);
        }
    }

    pub fn add_connection(&mut self, port_out: &str, port_in: &str) {
        let (Some(out_id), Some(in_id)) = (self.port_id(port_out), self.port_id(port_in)) else {
            log::debug!("Ignoring connection {:?} -> {:?}: unknown port", port_out, port_in);
            return;
        };
        if self.graph.find_connection(out_id, in_id).is_some() {
            log::debug!("Connection {:?} -> {:?} already known", port_out, port_in);
            return;
        }

        let connection = Connection {
            id: self.ids.next(IdKind::Connection),
            port_out: out_id,
            port_in: in_id,
        };
        if self.graph.insert_connection(connection).is_some() {
            self.announce_connection(&connection);
        }
    }

    pub fn remove_connection(&mut self, port_out: &str, port_in: &str) {
        let (Some(out_id), Some(in_id)) = (self.port_id(port_out), self.port_id(port_in)) else {
            log::debug!("Ignoring disconnection {:?} -> {:?}: unknown port", port_out, port_in);
            return;
        };
        let Some(connection_id) = self.graph.find_connection(out_id, in_id).map(|c| c.id) else {
            return;
        };
        if self.graph.remove_connection(connection_id).is_some() {
            self.emit(CanvasCommand::Disconnect { connection_id });
        }
    }

    /// Move a group box now, or remember the position until the group shows up.
    pub fn update_group_position(&mut self, direction: PortDirection, group_name: &str, x: i32, y: i32) {
        self.group_positions
            .insert((direction, group_name.to_string()), (x, y));

        if let Some(group_id) = self.graph.group_by_name(group_name).map(|g| g.id) {
            self.emit(CanvasCommand::MoveGroupBox {
                group_id,
                direction,
                x,
                y,
            });
        }
    }

    /// Declare a portgroup the backend confirmed. Ports already in another
    /// portgroup leave it first.
    pub fn update_portgroup(&mut self, group_name: &str, port_mode: PortDirection, port_names: &[String]) {
        let Some(group_id) = self.graph.group_by_name(group_name).map(|g| g.id) else {
            log::debug!("Ignoring portgroup for unknown group {:?}", group_name);
            return;
        };

        let mut members: Vec<PortId> = Vec::with_capacity(port_names.len());
        let mut media_type = None;
        for name in port_names {
            let Some(port) = self.graph.port_by_name(name) else {
                log::debug!("Ignoring portgroup with unknown port {:?}", name);
                return;
            };
            if port.group_id != group_id
                || port.mode() != Some(port_mode)
                || members.contains(&port.id)
                || media_type.is_some_and(|mt| mt != port.media_type)
            {
                log::warn!("Ignoring portgroup in {:?}: {:?} does not fit", group_name, name);
                return;
            }
            media_type = Some(port.media_type);
            members.push(port.id);
        }
        if members.len() < 2 {
            return;
        }

        let mut previous: Vec<PortgroupId> = members
            .iter()
            .filter_map(|id| self.graph.port(*id).and_then(|p| p.portgroup_id))
            .collect();
        previous.sort_unstable();
        previous.dedup();
        if let [pg_id] = previous.as_slice()
            && self
                .graph
                .portgroup(*pg_id)
                .is_some_and(|pg| same_members(&pg.ports, &members))
        {
            return;
        }

        for pg_id in previous {
            if let Some(portgroup) = self.graph.disband_portgroup(pg_id) {
                self.emit(CanvasCommand::RemovePortgroup {
                    group_id: portgroup.group_id,
                    portgroup_id: portgroup.id,
                });
                self.relabel_released(&portgroup);
            }
        }
        self.form_portgroup(group_id, port_mode, members);
    }

    /// Split the portgroup holding `port_name`. Its ports won't be paired
    /// automatically again.
    pub fn remove_portgroup(&mut self, group_name: &str, port_name: &str) {
        let Some(port) = self.graph.port_by_name(port_name) else {
            return;
        };
        let in_group = self
            .graph
            .group(port.group_id)
            .is_some_and(|g| g.name == group_name);
        let Some(pg_id) = port.portgroup_id.filter(|_| in_group) else {
            return;
        };
        let Some(portgroup) = self.graph.disband_portgroup(pg_id) else {
            return;
        };
        for port_id in &portgroup.ports {
            self.graph.set_prevent_stereo(*port_id, true);
        }
        self.emit(CanvasCommand::RemovePortgroup {
            group_id: portgroup.group_id,
            portgroup_id: portgroup.id,
        });
        self.relabel_released(&portgroup);
    }

    pub fn update_group_split(&mut self, group_name: &str, split: bool) {
        let Some(group_id) = self.graph.group_by_name(group_name).map(|g| g.id) else {
            return;
        };
        if split {
            self.emit(CanvasCommand::SplitGroup { group_id });
        } else {
            self.emit(CanvasCommand::JoinGroup { group_id });
        }
    }

    // ── Gestures ───────────────────────────────────────────────────────────

    /// Turn a canvas gesture into a backend request. Never changes the graph.
    pub fn handle_canvas_action(&self, action: CanvasAction) {
        match action {
            CanvasAction::PortsConnect { port_out, port_in } => {
                if let (Some(out_port), Some(in_port)) =
                    (self.graph.port(port_out), self.graph.port(port_in))
                {
                    self.request(BackendRequest::Connect {
                        port_out: out_port.full_name.clone(),
                        port_in: in_port.full_name.clone(),
                    });
                }
            }
            CanvasAction::PortsDisconnect { connection_id } => {
                if let Some((out_port, in_port)) = self.connection_ports(connection_id) {
                    self.request(BackendRequest::Disconnect {
                        port_out: out_port.full_name.clone(),
                        port_in: in_port.full_name.clone(),
                    });
                }
            }
            CanvasAction::GroupSplit { group_id } => self.request_group_split(group_id, true),
            CanvasAction::GroupJoin { group_id } => self.request_group_split(group_id, false),
            CanvasAction::GroupMove {
                group_id,
                direction,
                x,
                y,
            } => {
                if let Some(group) = self.graph.group(group_id) {
                    self.request(BackendRequest::SaveGroupPosition {
                        direction,
                        group: group.name.clone(),
                        x,
                        y,
                    });
                }
            }
            CanvasAction::PortgroupAdd {
                group_id,
                port_mode,
                ports,
            } => {
                if let Some((group, names)) = self.member_names(group_id, &ports)
                    && names.len() >= 2
                {
                    self.request(BackendRequest::Portgroup {
                        group,
                        port_mode,
                        ports: names,
                    });
                }
            }
            CanvasAction::PortgroupRemove {
                group_id,
                portgroup_id,
            } => {
                if let Some(portgroup) = self.graph.portgroup(portgroup_id)
                    && let Some((group, names)) = self.member_names(group_id, &portgroup.ports)
                {
                    self.request(BackendRequest::PortgroupSplit {
                        group,
                        port_mode: portgroup.port_mode,
                        ports: names,
                    });
                }
            }
        }
    }

    fn request_group_split(&self, group_id: GroupId, split: bool) {
        if let Some(group) = self.graph.group(group_id) {
            self.request(BackendRequest::GroupSplit {
                group: group.name.clone(),
                split,
            });
        }
    }

    fn connection_ports(&self, connection_id: ConnectionId) -> Option<(&Port, &Port)> {
        let connection = self.graph.connection(connection_id)?;
        Some((
            self.graph.port(connection.port_out)?,
            self.graph.port(connection.port_in)?,
        ))
    }

    /// Group name and member full names, when every port belongs to the group.
    fn member_names(&self, group_id: GroupId, ports: &[PortId]) -> Option<(String, Vec<String>)> {
        let group = self.graph.group(group_id)?;
        let names = ports
            .iter()
            .map(|id| {
                self.graph
                    .port(*id)
                    .filter(|p| p.group_id == group_id)
                    .map(|p| p.full_name.clone())
            })
            .collect::<Option<Vec<_>>>()?;
        Some((group.name.clone(), names))
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    fn port_id(&self, full_name: &str) -> Option<PortId> {
        self.graph.port_by_name(full_name).map(|p| p.id)
    }

    /// Existing group by name, or a freshly created one (second field true).
    fn ensure_group(&mut self, group_name: &str) -> Option<(GroupId, bool)> {
        if let Some(group) = self.graph.group_by_name(group_name) {
            return Some((group.id, false));
        }

        let mut group = Group::new(self.ids.next(IdKind::Group), group_name);
        group.display_name = group_display_name(group_name);
        group.client_icon = self.icons.resolve_client_icon(group_name);
        let group_id = self.graph.create_group(group)?;
        log::debug!("Group created: id={} name={:?}", group_id, group_name);
        Some((group_id, true))
    }

    /// Recompute a port's display name from its current names.
    fn refresh_port_label(&mut self, port_id: PortId) {
        let Some(port) = self.graph.port(port_id) else {
            return;
        };
        let Some(group) = self.graph.group(port.group_id) else {
            return;
        };
        let grouping_name = port.grouping_name(self.alias_mode);
        let (_, port_suffix) = split_port_name(grouping_name, port.is_physical());
        let graceful = naming::graceful_name(&group.name, port_suffix);

        let (display_name, set_the_one) =
            if graceful.set_the_one_on_pair && port.portgroup_id.is_some() {
                (format!("{} 1", graceful.display_name), false)
            } else {
                (graceful.display_name, graceful.set_the_one_on_pair)
            };
        self.graph.set_port_label(port_id, &display_name, set_the_one);
    }

    /// Former members of a disbanded portgroup get their unpaired label back.
    fn relabel_released(&mut self, portgroup: &Portgroup) {
        for port_id in &portgroup.ports {
            let Some(before) = self.graph.port(*port_id).map(|p| p.display_name.clone()) else {
                continue;
            };
            self.refresh_port_label(*port_id);
            if self
                .graph
                .port(*port_id)
                .is_some_and(|p| p.display_name != before)
            {
                self.announce_port_properties(*port_id);
            }
        }
    }

    fn run_stereo_detection(&mut self, port_id: PortId) {
        if !self.stereo_detection {
            return;
        }
        let Some(port) = self.graph.port(port_id) else {
            return;
        };
        let Some(group) = self.graph.group(port.group_id) else {
            return;
        };
        let group_ports = self.graph.ports_of_group(group.id);
        let Some(other) = pairing::detect_pair(group, &group_ports, port) else {
            return;
        };
        let Some(mode) = port.mode() else {
            return;
        };
        let members = vec![other.id, port.id];
        let group_id = group.id;

        self.form_portgroup(group_id, mode, members);
    }

    /// Create a portgroup, resolve deferred " 1" suffixes and tell the canvas.
    fn form_portgroup(&mut self, group_id: GroupId, mode: PortDirection, members: Vec<PortId>) {
        let portgroup = Portgroup {
            id: self.ids.next(IdKind::Portgroup),
            group_id,
            port_mode: mode,
            ports: members,
        };
        let members = portgroup.ports.clone();
        let Some(portgroup_id) = self.graph.create_portgroup(portgroup) else {
            return;
        };
        log::debug!("Portgroup {} formed in group {}: {:?}", portgroup_id, group_id, members);

        for port_id in &members {
            let Some(port) = self.graph.port(*port_id) else {
                continue;
            };
            if port.set_the_one_on_pair {
                let display_name = format!("{} 1", port.display_name);
                self.graph.set_port_label(*port_id, &display_name, false);
                self.announce_port_properties(*port_id);
            }
        }

        let port_type = members
            .first()
            .and_then(|id| self.graph.port(*id))
            .and_then(|p| p.media_type);
        self.emit(CanvasCommand::AddPortgroup {
            group_id,
            portgroup_id,
            mode,
            port_type,
        });
        for port_id in members {
            self.emit(CanvasCommand::AddPortToPortgroup {
                group_id,
                port_id,
                portgroup_id,
            });
        }
    }

    fn announce_group(&self, group_id: GroupId) {
        let Some(group) = self.graph.group(group_id) else {
            return;
        };
        let (icon_kind, icon_name) = group.icon();
        self.emit(CanvasCommand::AddGroup {
            group_id,
            display_name: group.display_name.clone(),
            icon_kind,
            icon_name,
        });

        for direction in [PortDirection::Input, PortDirection::Output] {
            if let Some(&(x, y)) = self.group_positions.get(&(direction, group.name.clone())) {
                self.emit(CanvasCommand::MoveGroupBox {
                    group_id,
                    direction,
                    x,
                    y,
                });
            }
        }
    }

    fn announce_port(&self, port_id: PortId) {
        let Some(port) = self.graph.port(port_id) else {
            return;
        };
        // Ports without a direction have no place on the canvas
        let Some(mode) = port.mode() else {
            return;
        };
        self.emit(CanvasCommand::AddPort {
            group_id: port.group_id,
            port_id,
            display_name: port.display_name.clone(),
            mode,
            port_type: port.media_type,
            portgroup_id: port.portgroup_id.unwrap_or(0),
        });
    }

    fn announce_port_properties(&self, port_id: PortId) {
        let Some(port) = self.graph.port(port_id) else {
            return;
        };
        if port.mode().is_none() {
            return;
        }
        self.emit(CanvasCommand::ChangePortProperties {
            group_id: port.group_id,
            port_id,
            portgroup_id: port.portgroup_id.unwrap_or(0),
            display_name: port.display_name.clone(),
        });
    }

    fn announce_connection(&self, connection: &Connection) {
        let (Some(out_port), Some(in_port)) = (
            self.graph.port(connection.port_out),
            self.graph.port(connection.port_in),
        ) else {
            return;
        };
        self.emit(CanvasCommand::Connect {
            connection_id: connection.id,
            group_out: out_port.group_id,
            port_out: out_port.id,
            group_in: in_port.group_id,
            port_in: in_port.id,
        });
    }
}
