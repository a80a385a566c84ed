use std::{path::PathBuf, thread};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rltris_engine::{PieceSeed, SessionConfig};
use serde::Serialize;

use crate::{summary::Summary, util::Output};

use super::{Driver, PieceSourceKind, Policy, SessionArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    session: SessionArg,
    /// Number of episodes, run in parallel
    #[arg(long, default_value_t = 8)]
    episodes: u64,
    /// Frame limit per episode
    #[arg(long, default_value_t = 200_000)]
    max_frames: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    generated_at: DateTime<Utc>,
    base_seed: PieceSeed,
    pieces: PieceSourceKind,
    policy: Policy,
    max_frames: u64,
    config: SessionConfig,
    summary: SimulationSummary,
    episodes: Vec<EpisodeReport>,
}

#[derive(Debug, Clone, Serialize)]
struct EpisodeReport {
    index: u64,
    seed: PieceSeed,
    game_over: bool,
    frames: u64,
    score: usize,
    reward: f64,
    completed_pieces: usize,
    cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

#[derive(Debug, Clone, Serialize)]
struct SimulationSummary {
    finished: usize,
    score: Summary,
    reward: Summary,
    completed_pieces: Summary,
    cleared_lines: Summary,
    frames: Summary,
}

impl SimulationSummary {
    #[expect(clippy::cast_precision_loss)]
    fn new(episodes: &[EpisodeReport]) -> anyhow::Result<Self> {
        let summarize = |f: fn(&EpisodeReport) -> f64| {
            Summary::new(episodes.iter().map(f)).ok_or_else(|| anyhow!("no episodes to summarize"))
        };
        Ok(Self {
            finished: episodes.iter().filter(|e| e.game_over).count(),
            score: summarize(|e| e.score as f64)?,
            reward: summarize(|e| e.reward)?,
            completed_pieces: summarize(|e| e.completed_pieces as f64)?,
            cleared_lines: summarize(|e| e.cleared_lines as f64)?,
            frames: summarize(|e| e.frames as f64)?,
        })
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let config = arg.session.load_config()?;
    let base_seed = arg.session.base_seed();
    tracing::info!(
        episodes = arg.episodes,
        %base_seed,
        policy = ?arg.session.policy,
        "starting simulation"
    );

    let episodes = thread::scope(|s| {
        let handles: Vec<_> = (0..arg.episodes)
            .map(|index| {
                let config = config.clone();
                s.spawn(move || play_episode(arg, config, base_seed, index))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("episode thread panicked"))
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let summary = SimulationSummary::new(&episodes)?;
    tracing::info!(
        finished = summary.finished,
        mean_score = summary.score.mean,
        max_score = summary.score.max,
        mean_reward = summary.reward.mean,
        "simulation finished"
    );

    let report = SimulationReport {
        generated_at: Utc::now(),
        base_seed,
        pieces: arg.session.pieces,
        policy: arg.session.policy,
        max_frames: arg.max_frames,
        config,
        summary,
        episodes,
    };
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}

fn play_episode(
    arg: &SimulateArg,
    config: SessionConfig,
    base_seed: PieceSeed,
    index: u64,
) -> EpisodeReport {
    let seed = base_seed.derive(index);
    let mut driver = Driver::new(&arg.session, config, seed);
    driver.run(arg.max_frames);

    let session = &driver.session;
    let stats = session.stats();
    let report = EpisodeReport {
        index,
        seed,
        game_over: session.is_game_over(),
        frames: driver.clock.total_frames(),
        score: stats.score(),
        reward: session.reward(),
        completed_pieces: stats.completed_pieces(),
        cleared_lines: stats.total_cleared_lines(),
        line_cleared_counter: stats.line_cleared_counter(),
    };
    tracing::info!(
        index,
        score = report.score,
        reward = report.reward,
        pieces = report.completed_pieces,
        frames = report.frames,
        "episode finished"
    );
    report
}
