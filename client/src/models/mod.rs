use bevy::prelude::*;

mod settings;

pub use settings::*;

pub fn plugin(app: &mut App) {
    app.add_plugins(settings::plugin);
}
