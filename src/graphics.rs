use macroquad::prelude::*;
use ndarray::Array1;

use shoal::simulation::agent::Species;
use shoal::simulation::ecosystem::Ecosystem;
use shoal::simulation::geometric_utils::vec2;

trait ToScreen {
    type Output;
    fn to_screen(&self, viewpoint: &Array1<f32>) -> Self::Output;
}

impl ToScreen for Array1<f32> {
    type Output = (f32, f32);
    fn to_screen(&self, viewpoint: &Array1<f32>) -> (f32, f32) {
        (
            self[0] - viewpoint[0] + screen_width() / 2.0,
            self[1] - viewpoint[1] + screen_height() / 2.0,
        )
    }
}

/// Converts a screen position to world coordinates.
pub fn to_world(x: f32, y: f32, viewpoint: &Array1<f32>) -> Array1<f32> {
    vec2(
        x + viewpoint[0] - screen_width() / 2.0,
        y + viewpoint[1] - screen_height() / 2.0,
    )
}

fn species_color(species: Species) -> Color {
    match species {
        Species::Krill => Color::from_rgba(255, 160, 160, 255),
        Species::Fish => Color::from_rgba(240, 200, 60, 255),
        Species::Shark => Color::from_rgba(150, 160, 170, 255),
        Species::Orca => Color::from_rgba(20, 20, 20, 255),
        Species::Food => Color::from_rgba(120, 220, 120, 255),
        Species::Egg => Color::from_rgba(250, 250, 230, 255),
    }
}

/// Draws every visible agent as a circle sized by its species.
pub fn draw_world(ecosystem: &Ecosystem, viewpoint: &Array1<f32>) {
    let bounds = ecosystem.params().bounds();
    let (left, top) = vec2(0.0, 0.0).to_screen(viewpoint);
    let (right, bottom) = vec2(bounds.width, bounds.height).to_screen(viewpoint);
    draw_rectangle_lines(left, top, right - left, bottom - top, 2.0, DARKBLUE);

    for species in Species::ALL {
        let radius = (ecosystem.params().species.get(species).size * 2.0).max(1.0);
        let color = species_color(species);
        for agent in ecosystem.agents(species) {
            let (x, y) = agent.pos.to_screen(viewpoint);
            let hidden = x < -radius
                || y < -radius
                || x > screen_width() + radius
                || y > screen_height() + radius;
            if hidden {
                continue;
            }
            draw_circle(x, y, radius, color);
        }
    }
}
