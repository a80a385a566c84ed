use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use rltris_engine::{
    Action, BagPieceSource, FrameClock, PieceSeed, PieceSource, Session, SessionConfig,
    UniformPieceSource,
};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use self::{observe::ObserveArg, simulate::SimulateArg};

mod observe;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log session events (line clears, locks, game over)
    #[arg(long, short, global = true)]
    verbose: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play episodes with a built-in policy and report the results
    Simulate(#[clap(flatten)] SimulateArg),
    /// Print the session state and observation vector after some steps
    Observe(#[clap(flatten)] ObserveArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Observe(arg) => observe::run(&arg)?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::FromStr)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PieceSourceKind {
    #[default]
    Uniform,
    Bag,
}

/// Picks the action for every frame.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::FromStr)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Policy {
    /// One uniformly chosen flag per frame.
    #[default]
    Random,
    /// No input; pieces fall where they spawn.
    Idle,
}

impl Policy {
    fn choose<R>(self, rng: &mut R) -> Action
    where
        R: Rng + ?Sized,
    {
        match self {
            Policy::Random => Action::one_hot(rng.random_range(0..Action::LEN)).unwrap_or_default(),
            Policy::Idle => Action::NONE,
        }
    }
}

/// Options shared by every command that builds a session.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SessionArg {
    /// Session config JSON file (board size, reward shaping, observation)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base seed as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Piece generator: uniform or bag
    #[arg(long, default_value = "uniform")]
    pieces: PieceSourceKind,
    /// Frames between normal gravity steps
    #[arg(long, default_value_t = FrameClock::DEFAULT_NORMAL_PERIOD, value_parser = clap::value_parser!(u64).range(1..))]
    normal_period: u64,
    /// Frames between fast gravity steps
    #[arg(long, default_value_t = FrameClock::DEFAULT_FAST_PERIOD, value_parser = clap::value_parser!(u64).range(1..))]
    fast_period: u64,
    /// Action policy: random or idle
    #[arg(long, default_value = "random")]
    policy: Policy,
}

type BoxedPieceSource = Box<dyn PieceSource + Send>;

impl SessionArg {
    fn load_config(&self) -> anyhow::Result<SessionConfig> {
        match &self.config {
            Some(path) => crate::util::read_session_config_file(path),
            None => Ok(SessionConfig::default()),
        }
    }

    fn base_seed(&self) -> PieceSeed {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }

    fn clock(&self) -> FrameClock {
        FrameClock::new(self.normal_period, self.fast_period)
    }

    fn session(&self, config: SessionConfig, seed: PieceSeed) -> Session<BoxedPieceSource> {
        let source: BoxedPieceSource = match self.pieces {
            PieceSourceKind::Uniform => Box::new(UniformPieceSource::with_seed(seed)),
            PieceSourceKind::Bag => Box::new(BagPieceSource::with_seed(seed)),
        };
        Session::with_config(config, source)
    }
}

/// Runs one policy on one session, frame by frame.
struct Driver {
    session: Session<BoxedPieceSource>,
    clock: FrameClock,
    policy: Policy,
    rng: Pcg32,
}

impl Driver {
    /// Index passed to [`PieceSeed::derive`] for the policy's random stream.
    const POLICY_STREAM: u64 = u64::MAX;

    fn new(arg: &SessionArg, config: SessionConfig, seed: PieceSeed) -> Self {
        Self {
            session: arg.session(config, seed),
            clock: arg.clock(),
            policy: arg.policy,
            rng: Pcg32::from_seed(*seed.derive(Self::POLICY_STREAM).as_bytes()),
        }
    }

    /// Steps until game over or until `max_frames` frames have run.
    fn run(&mut self, max_frames: u64) {
        while self.clock.total_frames() < max_frames {
            let action = self.policy.choose(&mut self.rng);
            let outcome = self.session.step(action, self.clock.advance());
            if outcome.game_over {
                break;
            }
        }
    }
}
