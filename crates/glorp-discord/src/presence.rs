//! Rotating "Playing / Listening to / Watching" status.

use std::sync::Arc;
use std::time::Duration;

use serenity::all::ActivityData;
use tokio::sync::watch;
use tracing::info;

use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Playing,
    Listening,
    Watching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub kind: ActivityKind,
    pub name: &'static str,
}

impl Status {
    const fn new(kind: ActivityKind, name: &'static str) -> Self {
        Self { kind, name }
    }

    pub fn activity(&self) -> ActivityData {
        match self.kind {
            ActivityKind::Playing => ActivityData::playing(self.name),
            ActivityKind::Listening => ActivityData::listening(self.name),
            ActivityKind::Watching => ActivityData::watching(self.name),
        }
    }
}

use ActivityKind::{Listening, Playing, Watching};

pub const STATUSES: &[Status] = &[
    Status::new(Playing, "Glorping around"),
    Status::new(Listening, "Sabrina Carpenter"),
    Status::new(Watching, "Stranger Things"),
    Status::new(Playing, "Fortnite with Elon Musk"),
    Status::new(Listening, "Dance Gavin Dance"),
    Status::new(Watching, "Game of Thrones"),
    Status::new(Playing, "Stardew Valley"),
    Status::new(Listening, "kendrick lamar"),
    Status::new(Watching, "Severance"),
    Status::new(Playing, "Minecraft"),
    Status::new(Listening, "Peach Pit"),
    Status::new(Watching, "You"),
    Status::new(Playing, "Tetris"),
    Status::new(Listening, "AC/DC"),
    Status::new(Watching, "Invincible"),
    Status::new(Playing, "Dead by Daylight"),
    Status::new(Listening, "Gorillaz"),
    Status::new(Watching, "Daredevil: Born Again"),
    Status::new(Playing, "Grand Theft Auto VI"),
];

pub fn random_status(random: &dyn RandomSource) -> &'static Status {
    &STATUSES[random.pick(STATUSES.len()).min(STATUSES.len() - 1)]
}

/// Apply a random status every `interval` until `shutdown` flips to true.
///
/// The first change happens one full interval after start; the ready handler
/// sets the initial status.
pub async fn run_rotation<F>(
    apply: F,
    random: Arc<dyn RandomSource>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    F: Fn(&'static Status) + Send + Sync,
{
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let status = random_status(random.as_ref());
                apply(status);
                info!(kind = ?status.kind, name = status.name, "changed status");
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("status rotation shutting down");
                    break;
                }
            }
        }
    }
}
