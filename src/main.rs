//! raybay - headless patchbay replay
//!
//! Feeds a JSON-lines event script through the patchbay manager and prints
//! the resulting canvas commands, one JSON object per line.

use std::io::{BufReader, Write};
use std::sync::mpsc;

use raybay::config::Preferences;
use raybay::graph::GraphModel;
use raybay::patchbay::{ClientRegistry, PatchEvent, PatchbayManager};
use raybay::replay;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting raybay replay");

    let prefs = Preferences::load().unwrap_or_else(|e| {
        log::warn!("Using default preferences: {}", e);
        Preferences::default()
    });

    let events = match std::env::args().nth(1) {
        Some(path) => {
            let file = std::fs::File::open(&path)?;
            replay::read_events(BufReader::new(file))?
        }
        None => replay::read_events(std::io::stdin().lock())?,
    };
    log::info!("Replaying {} events", events.len());

    let (event_tx, event_rx) = mpsc::channel::<PatchEvent>();
    let (canvas_tx, canvas_rx) = mpsc::channel();
    let (backend_tx, _backend_rx) = mpsc::channel();
    let clients = ClientRegistry::new();

    // The manager runs on its own thread and owns the graph; we only see
    // what it sends out.
    let worker = std::thread::spawn(move || {
        let mut manager = PatchbayManager::new(canvas_tx, backend_tx, clients);
        manager.apply_preferences(&prefs);
        while let Ok(event) = event_rx.recv() {
            manager.handle_event(event);
        }
        summarize(manager.graph())
    });

    for event in events {
        event_tx.send(event)?;
    }
    drop(event_tx);

    let mut stdout = std::io::stdout().lock();
    for command in canvas_rx {
        writeln!(stdout, "{}", serde_json::to_string(&command)?)?;
    }

    let summary = worker
        .join()
        .map_err(|_| "patchbay thread panicked")?;
    for line in summary {
        log::info!("{}", line);
    }

    Ok(())
}

fn summarize(graph: &GraphModel) -> Vec<String> {
    let mut lines: Vec<String> = graph
        .groups_sorted()
        .into_iter()
        .map(|group| {
            format!(
                "{}: {} ports, {} portgroups",
                group.display_name,
                group.ports.len(),
                group.portgroups.len()
            )
        })
        .collect();
    lines.push(format!(
        "{} groups, {} ports, {} connections",
        graph.groups().count(),
        graph.ports().count(),
        graph.connections().count()
    ));
    lines
}
