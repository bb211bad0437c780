use serde::{Deserialize, Serialize};

use crate::graph::{
    ConnectionId, GroupId, IconKind, MediaType, PortDirection, PortFlags, PortId, PortgroupId,
};

/// Messages from the audio backend to the patchbay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PatchEvent {
    /// A port appeared on the server
    AddPort {
        name: String,
        #[serde(default)]
        alias_1: String,
        #[serde(default)]
        alias_2: String,
        #[serde(default)]
        port_type: Option<MediaType>,
        flags: PortFlags,
        #[serde(default)]
        metadata: String,
    },
    /// A port went away
    RemovePort { name: String },
    /// A port changed its full name
    RenamePort { old: String, new: String },
    /// Two ports got connected
    AddConnection { port_out: String, port_in: String },
    /// Two ports got disconnected
    RemoveConnection { port_out: String, port_in: String },
    /// Stored box position for a group side
    UpdateGroupPosition {
        direction: PortDirection,
        group: String,
        x: i32,
        y: i32,
    },
    /// The backend confirmed a user-declared portgroup
    UpdatePortgroup {
        group: String,
        port_mode: PortDirection,
        ports: Vec<String>,
    },
    /// The backend confirmed a portgroup split
    RemovePortgroup { group: String, port: String },
    /// The backend confirmed a group box split or join
    UpdateGroupSplit { group: String, split: bool },
}

/// Commands from the patchbay to the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CanvasCommand {
    AddGroup {
        group_id: GroupId,
        display_name: String,
        icon_kind: IconKind,
        icon_name: String,
    },
    RemoveGroup {
        group_id: GroupId,
    },
    MoveGroupBox {
        group_id: GroupId,
        direction: PortDirection,
        x: i32,
        y: i32,
    },
    SplitGroup {
        group_id: GroupId,
    },
    JoinGroup {
        group_id: GroupId,
    },
    AddPort {
        group_id: GroupId,
        port_id: PortId,
        display_name: String,
        mode: PortDirection,
        port_type: Option<MediaType>,
        /// 0 when the port is not in a portgroup
        portgroup_id: PortgroupId,
    },
    RemovePort {
        group_id: GroupId,
        port_id: PortId,
    },
    ChangePortProperties {
        group_id: GroupId,
        port_id: PortId,
        portgroup_id: PortgroupId,
        display_name: String,
    },
    AddPortgroup {
        group_id: GroupId,
        portgroup_id: PortgroupId,
        mode: PortDirection,
        port_type: Option<MediaType>,
    },
    AddPortToPortgroup {
        group_id: GroupId,
        port_id: PortId,
        portgroup_id: PortgroupId,
    },
    RemovePortgroup {
        group_id: GroupId,
        portgroup_id: PortgroupId,
    },
    Connect {
        connection_id: ConnectionId,
        group_out: GroupId,
        port_out: PortId,
        group_in: GroupId,
        port_in: PortId,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
}

/// Requests from the patchbay to the backend.
///
/// None of these touch the graph; the backend answers with a [`PatchEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum BackendRequest {
    Connect {
        port_out: String,
        port_in: String,
    },
    Disconnect {
        port_out: String,
        port_in: String,
    },
    SaveGroupPosition {
        direction: PortDirection,
        group: String,
        x: i32,
        y: i32,
    },
    GroupSplit {
        group: String,
        split: bool,
    },
    Portgroup {
        group: String,
        port_mode: PortDirection,
        ports: Vec<String>,
    },
    PortgroupSplit {
        group: String,
        port_mode: PortDirection,
        ports: Vec<String>,
    },
}

/// User gestures reported by the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasAction {
    PortsConnect {
        port_out: PortId,
        port_in: PortId,
    },
    PortsDisconnect {
        connection_id: ConnectionId,
    },
    GroupSplit {
        group_id: GroupId,
    },
    GroupJoin {
        group_id: GroupId,
    },
    GroupMove {
        group_id: GroupId,
        direction: PortDirection,
        x: i32,
        y: i32,
    },
    PortgroupAdd {
        group_id: GroupId,
        port_mode: PortDirection,
        ports: Vec<PortId>,
    },
    PortgroupRemove {
        group_id: GroupId,
        portgroup_id: PortgroupId,
    },
}
