use chess_session::authority::ShakmatyAuthority;
use chess_session::session::GameSession;
use shakmaty::{CastlingMode, Chess, Color, Square, fen::Fen};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Helper: session over the reference authority from the starting position.
fn setup() -> GameSession<ShakmatyAuthority> {
    GameSession::new(ShakmatyAuthority::new())
}

/// Helper: session from a FEN string.
fn setup_fen(fen: &str) -> GameSession<ShakmatyAuthority> {
    let position: Chess = fen
        .parse::<Fen>()
        .expect("valid FEN")
        .into_position(CastlingMode::Standard)
        .expect("valid position");
    GameSession::new(ShakmatyAuthority::from_position(position))
}

/// Helper: play a move through the click interface.
fn play(session: &mut GameSession<ShakmatyAuthority>, from: Square, to: Square) {
    session.click_square(from).expect("authority in sync");
    session.click_square(to).expect("authority in sync");
    assert_eq!(
        session.last_move(),
        Some((from, to)),
        "move {from}-{to} should have been applied"
    );
}

// ---------------------------------------------------------------
// Apply + single-step undo
// ---------------------------------------------------------------

#[test]
fn e4_scenario_records_and_undoes() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.current_move_index(), Some(0));

    let entry = &session.history()[0];
    assert_eq!(u32::from(entry.descriptor.from()), 12);
    assert_eq!(u32::from(entry.descriptor.to()), 28);
    assert_eq!(session.side_to_move(), Color::Black);

    session.undo().expect("one move to undo");
    assert_eq!(session.current_move_index(), None);
    assert_eq!(session.side_to_move(), Color::White);
    assert_eq!(session.position_fen(), START_FEN);
}

#[test]
fn undo_repeatedly_returns_to_starting_position() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    play(&mut session, Square::E7, Square::E5);
    play(&mut session, Square::G1, Square::F3);
    play(&mut session, Square::B8, Square::C6);

    while session.can_undo() {
        session.undo().expect("undo of a recorded move");
    }

    assert_eq!(session.current_move_index(), None);
    assert_eq!(session.position_fen(), START_FEN);
}

// ---------------------------------------------------------------
// Branch truncation
// ---------------------------------------------------------------

#[test]
fn new_move_after_undo_discards_redo_branch() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    play(&mut session, Square::E7, Square::E5);
    play(&mut session, Square::G1, Square::F3);

    session.undo().expect("undo Nf3");
    session.undo().expect("undo e5");
    assert_eq!(session.current_move_index(), Some(0));
    assert!(session.can_redo());

    // Branch: black answers with c5 instead of e5.
    play(&mut session, Square::C7, Square::C5);

    assert_eq!(session.history().len(), 2, "old branch truncated");
    assert_eq!(session.current_move_index(), Some(1));
    assert!(!session.can_redo(), "discarded branch is unreachable");
    assert_eq!(session.history()[1].from, Square::C7);

    session.redo().expect("redo past the tail is a no-op");
    assert_eq!(session.current_move_index(), Some(1));
}

// ---------------------------------------------------------------
// Jump-to-index
// ---------------------------------------------------------------

#[test]
fn jump_matches_sequential_single_steps() {
    let moves = [
        (Square::E2, Square::E4),
        (Square::E7, Square::E5),
        (Square::G1, Square::F3),
        (Square::B8, Square::C6),
    ];

    let mut jumped = setup();
    let mut stepped = setup();
    for (from, to) in moves {
        play(&mut jumped, from, to);
        play(&mut stepped, from, to);
    }

    jumped.jump_to(Some(1)).expect("jump within ledger");
    stepped.undo().expect("first step back");
    stepped.undo().expect("second step back");

    assert_eq!(jumped.current_move_index(), stepped.current_move_index());
    assert_eq!(jumped.position_fen(), stepped.position_fen());

    jumped.jump_to(None).expect("jump to start");
    assert_eq!(jumped.position_fen(), START_FEN);
}

#[test]
fn jump_forward_replays_in_order_with_fresh_tokens() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    play(&mut session, Square::E7, Square::E5);
    play(&mut session, Square::G1, Square::F3);
    let final_fen = session.position_fen();

    session.undo().expect("undo Nf3");
    session.undo().expect("undo e5");
    assert_eq!(session.current_move_index(), Some(0));

    session.jump_to(Some(2)).expect("replay entries 1 and 2");
    assert_eq!(session.current_move_index(), Some(2));
    assert_eq!(session.position_fen(), final_fen);

    // The replay stored tokens the authority will honor: walking all the
    // way back must succeed and land on the starting position.
    session.jump_to(None).expect("tokens regenerated by redo are valid");
    assert_eq!(session.position_fen(), START_FEN);
}

#[test]
fn jump_to_current_index_is_noop() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    let fen = session.position_fen();

    session.jump_to(Some(0)).expect("no-op jump");
    assert_eq!(session.current_move_index(), Some(0));
    assert_eq!(session.position_fen(), fen);
}

#[test]
fn jump_out_of_range_is_noop() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);

    session.jump_to(Some(7)).expect("out-of-range target ignored");
    assert_eq!(session.current_move_index(), Some(0));
}

// ---------------------------------------------------------------
// Redo regenerates tokens in place
// ---------------------------------------------------------------

#[test]
fn redo_overwrites_entry_token() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    play(&mut session, Square::D7, Square::D5);
    play(&mut session, Square::E4, Square::D5);

    // Each token remembers the en-passant square of its pre-move position.
    assert_eq!(session.history()[1].undo.en_passant, Some(Square::E3));
    assert_eq!(session.history()[2].undo.en_passant, Some(Square::D6));

    session.undo().expect("undo exd5");
    session.undo().expect("undo d5");
    session.redo().expect("redo d5");
    session.redo().expect("redo exd5");

    assert_eq!(session.current_move_index(), Some(2));
    assert_eq!(session.history()[1].undo.en_passant, Some(Square::E3));

    // Tokens stored by the redo chain keep working.
    while session.can_undo() {
        session.undo().expect("undo with refreshed token");
    }
    assert_eq!(session.position_fen(), START_FEN);
}

// ---------------------------------------------------------------
// Derived state across time-travel
// ---------------------------------------------------------------

#[test]
fn captures_restored_by_undo() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    play(&mut session, Square::D7, Square::D5);
    play(&mut session, Square::E4, Square::D5);
    assert_eq!(
        session.piece_at(Square::D5).map(|p| p.color),
        Some(Color::White)
    );

    session.undo().expect("undo the capture");
    assert_eq!(
        session.piece_at(Square::D5).map(|p| p.color),
        Some(Color::Black),
        "captured pawn reappears from the fresh snapshot"
    );
    assert_eq!(
        session.piece_at(Square::E4).map(|p| p.color),
        Some(Color::White)
    );
}

#[test]
fn check_highlight_follows_time_travel() {
    let mut session = setup_fen("4k3/8/8/8/8/8/3R4/4K3 w - - 0 1");
    play(&mut session, Square::D2, Square::E2);
    assert_eq!(session.check_square(), Some(Square::E8));

    session.undo().expect("undo the checking move");
    assert_eq!(session.check_square(), None);

    session.redo().expect("redo the checking move");
    assert_eq!(session.check_square(), Some(Square::E8));
}

#[test]
fn last_move_highlight_follows_ledger_cursor() {
    let mut session = setup();
    play(&mut session, Square::E2, Square::E4);
    play(&mut session, Square::E7, Square::E5);

    session.undo().expect("undo e5");
    assert_eq!(session.last_move(), Some((Square::E2, Square::E4)));

    session.undo().expect("undo e4");
    assert_eq!(session.last_move(), None);
}

// ---------------------------------------------------------------
// Promotion through the full pipeline
// ---------------------------------------------------------------

#[test]
fn promotion_capture_then_undo() {
    let mut session = setup_fen("r3k3/1P6/8/8/8/8/8/4K3 w - - 0 1");
    session.click_square(Square::B7).expect("authority in sync");
    session.click_square(Square::A8).expect("authority in sync");
    session
        .resolve_promotion(chess_session::moves::PromotionChoice::Queen)
        .expect("capture promotion is legal");

    assert_eq!(
        session.piece_at(Square::A8).map(|p| p.role),
        Some(shakmaty::Role::Queen)
    );
    assert_eq!(session.history()[0].descriptor.flags(), 15);

    session.undo().expect("undo the promotion");
    assert_eq!(
        session.piece_at(Square::A8).map(|p| p.role),
        Some(shakmaty::Role::Rook),
        "captured rook restored"
    );
    assert_eq!(
        session.piece_at(Square::B7).map(|p| p.role),
        Some(shakmaty::Role::Pawn)
    );
}
