//! Headless skirmish host. Runs a bot player and a bot peer over an
//! in-process link until interrupted.

use std::path::Path;
use std::time::Duration;

use bevy::{app::App, log, prelude::*};
use skirmish_shared::combat::CombatClass;
use skirmish_shared::rng::CombatRng;

pub mod bot;
pub mod combat;
pub mod models;
pub mod networking;
pub mod scene;

use models::*;
use networking::{LoopbackHub, LoopbackLink, PeerLink};

const FRAME: Duration = Duration::from_micros(16_667);
/// Share of the peer's messages lost on the way, so sync runs over a lossy link.
const PEER_PACKET_LOSS: f32 = 0.05;

fn main() -> AppExit {
    let settings = Settings::load();
    // first run: leave an editable copy of the defaults behind
    let defaults = (!Path::new(SETTINGS_PATH).exists()).then(|| settings.clone());
    let hub = LoopbackHub::default();

    let peer_settings = Settings {
        player_id: None,
        class: match settings.class {
            CombatClass::Archer => CombatClass::Warrior,
            _ => CombatClass::Archer,
        },
        seed: None,
        combat: settings.combat.clone(),
    };

    let peer_link = hub
        .connect()
        .with_packet_loss(PEER_PACKET_LOSS, CombatRng::from_entropy());
    let mut apps = [
        session(settings, hub.connect(), true),
        session(peer_settings, peer_link, false),
    ];

    if let Some(defaults) = defaults {
        match defaults.save() {
            Ok(()) => info!("Wrote default settings to '{SETTINGS_PATH}'"),
            Err(e) => error!("Failed to save settings: {e}"),
        }
    }

    loop {
        for app in &mut apps {
            app.update();
            if let Some(exit) = app.should_exit() {
                return exit;
            }
        }
        std::thread::sleep(FRAME);
    }
}

/// One client: core, peer link and a bot at the controls.
fn session(settings: Settings, link: LoopbackLink, with_log: bool) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if with_log {
        // DEBUG
        // let filter = "debug,skirmish=trace".to_string();
        let filter = "info,skirmish_shared=info,skirmish=info".to_string();
        app.add_plugins(log::LogPlugin {
            level: log::Level::TRACE,
            filter,
            ..Default::default()
        });
    }

    app.insert_resource(settings);
    // the order is important: settings, then the core, then its consumers
    app.add_plugins((
        models::plugin,
        combat::plugin,
        scene::plugin,
        networking::plugin,
        bot::plugin,
    ));
    app.insert_resource(PeerLink::new(link))
        .insert_resource(bot::Bot::hunter());

    app.finish();
    app.cleanup();
    app
}
