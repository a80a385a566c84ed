use rltris_engine::{
    Action, BagPieceSource, Board, ClockSignal, FrameClock, PieceKind, PieceSeed,
    SequencePieceSource, Session, SessionConfig, observation_len,
};

const SEED: &str = "5eed5eed5eed5eed5eed5eed5eed5eed";

fn seed() -> PieceSeed {
    SEED.parse().unwrap()
}

/// Plays until game over with a fixed cyclic input pattern.
fn play_to_end<S>(session: &mut Session<S>) -> (u64, Vec<f64>)
where
    S: rltris_engine::PieceSource,
{
    let pattern = [
        Action::MOVE_LEFT,
        Action::ROTATE,
        Action::NONE,
        Action::MOVE_RIGHT,
        Action::SPEED_UP,
        Action::HOLD,
    ];
    let mut clock = FrameClock::default();
    let mut rewards = vec![];
    for frame in 0..1_000_000 {
        let outcome = session.step(pattern[frame % pattern.len()], clock.advance());
        rewards.push(outcome.reward);
        if outcome.game_over {
            return (clock.total_frames(), rewards);
        }
    }
    panic!("episode did not end");
}

#[test]
fn seeded_episodes_are_reproducible() {
    let mut a = Session::with_seed(SessionConfig::default(), seed());
    let mut b = Session::with_seed(SessionConfig::default(), seed());
    let (frames_a, rewards_a) = play_to_end(&mut a);
    let (frames_b, rewards_b) = play_to_end(&mut b);

    assert_eq!(frames_a, frames_b);
    assert_eq!(rewards_a, rewards_b);
    assert_eq!(a.board(), b.board());
    assert_eq!(a.stats(), b.stats());
}

#[test]
fn reward_only_changes_by_configured_amounts() {
    let config = SessionConfig::default();
    let mut session = Session::with_config(config.clone(), BagPieceSource::with_seed(seed()));
    let mut clock = FrameClock::default();
    let mut previous = 0.0;
    loop {
        let outcome = session.step(Action::SPEED_UP, clock.advance());
        let mut expected = config.reward.line_clear_reward(outcome.cleared_lines);
        if outcome.game_over {
            expected += config.reward.terminal_reward(session.board()).total();
            assert!((outcome.reward_delta - expected).abs() < 1e-6);
            break;
        }
        assert!((outcome.reward - previous - expected).abs() < 1e-6);
        previous = outcome.reward;
    }
}

#[test]
fn board_never_holds_full_rows_between_ticks_after_sweep() {
    let mut session = Session::with_seed(SessionConfig::default(), seed());
    let mut clock = FrameClock::new(2, 1);
    for frame in 0..20_000_u32 {
        let action = if frame % 3 == 0 {
            Action::MOVE_LEFT
        } else {
            Action::MOVE_RIGHT
        };
        let signal = clock.advance();
        let locked_before = session.stats().completed_pieces();
        let outcome = session.step(action, signal);
        if outcome.game_over {
            break;
        }
        // a gravity step that did not lock leaves no full rows behind
        if signal.fires(session.is_speed_up()) && session.stats().completed_pieces() == locked_before
        {
            assert_eq!(session.board().count_full_rows(), 0);
        }
        assert_eq!(session.observe().len(), observation_len(session.board().size()));
    }
}

#[test]
fn tetris_scores_fifteen() {
    let board = Board::from_ascii(
        "
        #########.
        #########.
        #########.
        #########.
        ",
    );
    let mut session =
        Session::new(SequencePieceSource::new([PieceKind::I, PieceKind::O])).with_board(board);
    for _ in 0..5 {
        session.apply_action(Action::MOVE_RIGHT);
    }
    assert_eq!(session.current_piece().position().x(), 9);

    let mut cleared = 0;
    for _ in 0..40 {
        let outcome = session.tick(ClockSignal::BOTH);
        cleared += outcome.cleared_lines;
        if cleared > 0 {
            assert_eq!(outcome.cleared_lines, 4);
            assert_eq!(outcome.score, 15);
            assert!((outcome.reward_delta - 15_000_000.0).abs() < f64::EPSILON);
            break;
        }
    }
    assert_eq!(cleared, 4);
    assert_eq!(session.board().count_full_rows(), 0);
    assert_eq!(session.stats().line_cleared_counter(), [0, 0, 0, 0, 1]);
}
