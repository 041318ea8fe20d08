use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Canvas coordinate space the particles live in.
pub const FIELD_WIDTH: f64 = 100.0;
pub const FIELD_HEIGHT: f64 = 100.0;

const PARTICLE_COUNT: usize = 100;
const MAX_SPEED: f64 = 0.5;

/// Cycles through the profile's role titles.
#[derive(Debug, Clone)]
pub struct RoleRotation {
    roles: Vec<String>,
    index: usize,
}

impl RoleRotation {
    pub fn new(roles: Vec<String>) -> Self {
        Self { roles, index: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.roles.get(self.index).map(String::as_str)
    }

    pub fn advance(&mut self) {
        if !self.roles.is_empty() {
            self.index = (self.index + 1) % self.roles.len();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
}

impl Particle {
    fn step(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
        if self.x < 0.0 || self.x > FIELD_WIDTH {
            self.dx = -self.dx;
            self.x = self.x.clamp(0.0, FIELD_WIDTH);
        }
        if self.y < 0.0 || self.y > FIELD_HEIGHT {
            self.dy = -self.dy;
            self.y = self.y.clamp(0.0, FIELD_HEIGHT);
        }
    }
}

/// Slowly drifting points behind the hero text. Particles bounce off the
/// edges of the field.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::with_rng(PARTICLE_COUNT, &mut StdRng::from_entropy())
    }

    pub fn with_rng(count: usize, rng: &mut impl Rng) -> Self {
        let particles = (0..count)
            .map(|_| Particle {
                x: rng.gen_range(0.0..=FIELD_WIDTH),
                y: rng.gen_range(0.0..=FIELD_HEIGHT),
                dx: rng.gen_range(-MAX_SPEED..=MAX_SPEED),
                dy: rng.gen_range(-MAX_SPEED..=MAX_SPEED),
            })
            .collect();
        Self { particles }
    }

    pub fn step(&mut self) {
        self.particles.iter_mut().for_each(Particle::step);
    }

    /// Particle positions as canvas points.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.particles.iter().map(|p| (p.x, p.y)).collect()
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new()
    }
}
