use std::path::PathBuf;

use rltris_engine::{FeatureGroup, PieceSeed, SessionSnapshot};
use serde::Serialize;

use crate::util::Output;

use super::{Driver, SessionArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ObserveArg {
    #[clap(flatten)]
    session: SessionArg,
    /// Frames to play before observing
    #[arg(long, default_value_t = 0)]
    frames: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct ObservationReport {
    seed: PieceSeed,
    frames: u64,
    snapshot: SessionSnapshot,
    observation: Vec<f32>,
    groups: Vec<ObservationGroup>,
}

#[derive(Debug, Clone, Serialize)]
struct ObservationGroup {
    group: FeatureGroup,
    start: usize,
    values: Vec<f32>,
}

pub(crate) fn run(arg: &ObserveArg) -> anyhow::Result<()> {
    let config = arg.session.load_config()?;
    let size = config.board_size;
    let seed = arg.session.base_seed();
    let mut driver = Driver::new(&arg.session, config, seed);
    driver.run(arg.frames);
    if driver.session.is_game_over() {
        tracing::warn!(
            frames = driver.clock.total_frames(),
            "game over before the requested frame count"
        );
    }

    let observation = driver.session.observe();
    let groups = FeatureGroup::ALL
        .into_iter()
        .map(|group| {
            let range = group.range(size);
            ObservationGroup {
                group,
                start: range.start,
                values: observation[range].to_vec(),
            }
        })
        .collect();

    let report = ObservationReport {
        seed,
        frames: driver.clock.total_frames(),
        snapshot: driver.session.snapshot(),
        observation,
        groups,
    };
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}
