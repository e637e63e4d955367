//! Drives the background monitor and block-screen contexts by hand,
//! standing in for the host's out-of-process callbacks.

use std::sync::Arc;

use clap::{Subcommand, ValueEnum};
use uuid::Uuid;

use timebank_core::shield::{ShieldScreen, TargetKind};
use timebank_core::{ActivityEvent, ActivityWatcher, ShieldButton};

use crate::common;

#[derive(Subcommand)]
pub enum SimulateAction {
    /// A limit's usage crossed its threshold
    Threshold { id: Uuid },
    /// The daily monitoring window closed
    IntervalEnd,
    /// A block-screen button press
    Button { which: ButtonArg },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ButtonArg {
    /// "Unlock" -- clears the shield and defers
    Primary,
    /// "Close" -- keeps the shield
    Secondary,
}

pub fn run(action: SimulateAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SimulateAction::Threshold { id } => handle_activity(ActivityEvent::ThresholdReached {
            activity_id: id.to_string(),
        }),
        SimulateAction::IntervalEnd => handle_activity(ActivityEvent::IntervalEnd {
            activity_id: String::new(),
        }),
        SimulateAction::Button { which } => press_button(which),
    }
}

fn handle_activity(event: ActivityEvent) -> Result<(), Box<dyn std::error::Error>> {
    let watcher = ActivityWatcher::new(
        common::open_store()?,
        common::shield_controller()?,
        Arc::new(common::PrintWakeup),
    );

    match watcher.handle(event)? {
        Some(event) => println!("{}", serde_json::to_string(&event)?),
        None => println!("no-op"),
    }
    Ok(())
}

fn press_button(which: ButtonArg) -> Result<(), Box<dyn std::error::Error>> {
    let store = common::open_store()?;
    let shield = common::shield_controller()?;

    let blocked = shield.blocked();
    if blocked.is_empty() {
        println!("shield is clear; no block screen to press");
        return Ok(());
    }

    let screen = ShieldScreen::from_store(TargetKind::of(&blocked), &store);
    println!("[{}] {}", screen.title, screen.subtitle.replace('\n', " "));

    let button = match which {
        ButtonArg::Primary => ShieldButton::Primary,
        ButtonArg::Secondary => ShieldButton::Secondary,
    };
    shield.handle_action(button, |verdict| {
        println!("verdict: {verdict:?}");
    });
    Ok(())
}
