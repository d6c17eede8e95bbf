use macroquad::prelude::*;
use ndarray::Array1;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shoal::simulation::agent::Species;
use shoal::simulation::ecosystem::Ecosystem;
use shoal::simulation::params::Params;

mod graphics;

/// World units the viewpoint moves per frame while an arrow key is held.
const PAN_SPEED: f32 = 12.0;

fn load_params() -> Params {
    match std::env::args().nth(1) {
        Some(path) => match Params::load_from_file(&path) {
            Ok(params) => {
                info!("loaded parameters from {}", path);
                params
            }
            Err(e) => {
                error!("could not load {}: {}, using defaults", path, e);
                Params::default()
            }
        },
        None => Params::default(),
    }
}

#[macroquad::main("Shoal")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let params = load_params();
    let mut ecosystem = match Ecosystem::new(params) {
        Ok(ecosystem) => ecosystem,
        Err(e) => {
            error!("invalid parameters: {}", e);
            return;
        }
    };

    let bounds = ecosystem.params().bounds();
    let mut viewpoint: Array1<f32> = bounds.center();

    loop {
        if is_key_down(KeyCode::Left) {
            viewpoint[0] -= PAN_SPEED;
        }
        if is_key_down(KeyCode::Right) {
            viewpoint[0] += PAN_SPEED;
        }
        if is_key_down(KeyCode::Up) {
            viewpoint[1] -= PAN_SPEED;
        }
        if is_key_down(KeyCode::Down) {
            viewpoint[1] += PAN_SPEED;
        }
        bounds.clamp(&mut viewpoint);

        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            let world = graphics::to_world(x, y, &viewpoint);
            if let Err(e) = ecosystem.spawn(Species::Food, &world) {
                info!("food not placed: {}", e);
            }
        }

        ecosystem.advance_tick(&viewpoint);

        clear_background(Color::from_rgba(8, 30, 60, 255));
        graphics::draw_world(&ecosystem, &viewpoint);

        next_frame().await;
    }
}
