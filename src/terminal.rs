use std::io::{self, Write};

use shakmaty::{CastlingMode, Chess, Color, File, Piece, Rank, Role, Square, fen::Fen};

use crate::authority::ShakmatyAuthority;
use crate::moves::PromotionChoice;
use crate::session::GameSession;

/// Clears the screen and moves cursor to top-left.
#[inline]
fn clear_screen() {
    print!("\x1B[2J\x1B[H");
}

/// Runs an interactive terminal interface for driving a game session.
///
/// Presentation only: board orientation (flip) lives here and never in the
/// session, which always works in the fixed a1 = 0 frame.
pub fn run_interactive_terminal(mut session: GameSession<ShakmatyAuthority>) {
    let mut flipped = false;

    clear_screen();
    draw_interface(&session, flipped);

    loop {
        print!("> ");
        if let Err(e) = io::stdout().flush() {
            eprintln!("Failed to flush stdout: {}", e);
            break;
        }

        let mut input = String::new();
        if let Err(e) = io::stdin().read_line(&mut input) {
            eprintln!("Failed to read input: {}", e);
            break;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        // Session errors are desync bugs, not user mistakes; surface them
        // and stop instead of masking.
        let result = match parts[0] {
            "c" => match parse_square(parts.get(1)) {
                Some(square) => session.click_square(square),
                None => {
                    println!("Usage: c <square>");
                    continue;
                }
            },
            "promote" => match parts.get(1).and_then(|s| parse_choice(s)) {
                Some(choice) => session.resolve_promotion(choice),
                None => {
                    println!("Usage: promote <q|r|b|n>");
                    continue;
                }
            },
            "undo" => session.undo(),
            "redo" => session.redo(),
            "jump" => match parts.get(1) {
                Some(&"start") => session.jump_to(None),
                Some(n) => match n.parse::<usize>() {
                    Ok(index) => session.jump_to(Some(index)),
                    Err(_) => {
                        println!("Usage: jump <index|start>");
                        continue;
                    }
                },
                None => {
                    println!("Usage: jump <index|start>");
                    continue;
                }
            },
            "m" => match parse_square(parts.get(1)) {
                Some(square) => {
                    session.toggle_mark(square);
                    Ok(())
                }
                None => {
                    println!("Usage: m <square>");
                    continue;
                }
            },
            "a" => match (parse_square(parts.get(1)), parse_square(parts.get(2))) {
                (Some(from), Some(to)) => {
                    session.toggle_arrow(from, to);
                    Ok(())
                }
                _ => {
                    println!("Usage: a <from> <to>");
                    continue;
                }
            },
            "load" => {
                if parts.len() < 2 {
                    println!("Usage: load <fen> | load startpos");
                    continue;
                }
                let fen_str = if parts[1] == "startpos" {
                    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
                } else {
                    // Rejoin the rest as FEN contains spaces
                    input[5..].trim()
                };
                match fen_str.parse::<Fen>() {
                    Ok(fen) => match fen.into_position::<Chess>(CastlingMode::Standard) {
                        Ok(position) => {
                            session = GameSession::new(ShakmatyAuthority::from_position(position));
                            Ok(())
                        }
                        Err(_) => {
                            println!("Invalid FEN setup");
                            continue;
                        }
                    },
                    Err(e) => {
                        println!("Invalid FEN: {}", e);
                        continue;
                    }
                }
            }
            "new" => {
                session.reset();
                Ok(())
            }
            "flip" => {
                flipped = !flipped;
                Ok(())
            }
            "fen" => {
                println!("{}", session.position_fen());
                continue;
            }
            "p" => Ok(()),
            "q" => break,
            _ => {
                println!("Unknown command");
                continue;
            }
        };

        if let Err(e) = result {
            eprintln!("fatal: {}", e);
            break;
        }

        clear_screen();
        draw_interface(&session, flipped);
    }
}

fn parse_square(token: Option<&&str>) -> Option<Square> {
    token.and_then(|t| t.parse().ok())
}

fn parse_choice(token: &str) -> Option<PromotionChoice> {
    match token {
        "q" => Some(PromotionChoice::Queen),
        "r" => Some(PromotionChoice::Rook),
        "b" => Some(PromotionChoice::Bishop),
        "n" => Some(PromotionChoice::Knight),
        _ => None,
    }
}

/// Draws the complete interface: help text, board, status, and history.
fn draw_interface(session: &GameSession<ShakmatyAuthority>, flipped: bool) {
    println!("♟️  Chess");
    println!();
    println!(
        "Commands: c <square> | promote <q|r|b|n> | undo | redo | jump <index|start> \
         | m <square> | a <from> <to> | load <fen> | new | flip | fen | p (refresh) | q (quit)"
    );
    println!();

    let mut stdout = io::stdout();
    if let Err(e) = render_board(&mut stdout, session, flipped) {
        eprintln!("Failed to render board: {}", e);
    }
    println!();
    print_status(session);
}

/// Render the board to any writer. Extracted for testability.
fn render_board(
    w: &mut impl Write,
    session: &GameSession<ShakmatyAuthority>,
    flipped: bool,
) -> io::Result<()> {
    let mut ranks: Vec<Rank> = Rank::ALL.to_vec();
    let mut files: Vec<File> = File::ALL.to_vec();
    if flipped {
        files.reverse();
    } else {
        ranks.reverse();
    }

    for rank in &ranks {
        write!(w, " {} ", rank.char())?;
        for file in &files {
            let square = Square::from_coords(*file, *rank);
            let cell = piece_cell(session.piece_at(square));
            match background(session, square) {
                Some(code) => write!(w, "\x1b[{}m{}\x1b[0m", code, cell)?,
                None => write!(w, "{}", cell)?,
            }
        }
        writeln!(w)?;
    }

    write!(w, "   ")?;
    for file in &files {
        write!(w, " {} ", file.char())?;
    }
    writeln!(w)?;
    w.flush()
}

/// ANSI background for a square, by highlight priority.
fn background(session: &GameSession<ShakmatyAuthority>, square: Square) -> Option<u32> {
    if session.check_square() == Some(square) {
        Some(45) // magenta: king in check
    } else if session.selected_square() == Some(square) {
        Some(42) // green: selection
    } else if session.is_destination(square) {
        if session.piece_at(square).is_some() {
            Some(41) // red: capture destination
        } else {
            Some(44) // blue: quiet destination
        }
    } else if session
        .last_move()
        .is_some_and(|(from, to)| square == from || square == to)
    {
        Some(43) // yellow: last move
    } else if session.annotations().is_marked(square) {
        Some(46) // cyan: user mark
    } else {
        None
    }
}

fn piece_cell(piece: Option<Piece>) -> &'static str {
    match piece {
        Some(Piece {
            color: Color::White,
            role,
        }) => match role {
            Role::Pawn => " P ",
            Role::Knight => " N ",
            Role::Bishop => " B ",
            Role::Rook => " R ",
            Role::Queen => " Q ",
            Role::King => " K ",
        },
        Some(Piece {
            color: Color::Black,
            role,
        }) => match role {
            Role::Pawn => " p ",
            Role::Knight => " n ",
            Role::Bishop => " b ",
            Role::Rook => " r ",
            Role::Queen => " q ",
            Role::King => " k ",
        },
        None => " · ",
    }
}

fn print_status(session: &GameSession<ShakmatyAuthority>) {
    if let Some(over) = session.game_over() {
        match over.winner {
            Some(Color::White) => println!("Game over: {} — white wins", over.kind),
            Some(Color::Black) => println!("Game over: {} — black wins", over.kind),
            None => println!("Game over: {} — draw", over.kind),
        }
    } else if session.pending_promotion().is_some() {
        println!("Promotion pending: promote <q|r|b|n>");
    } else {
        let side = match session.side_to_move() {
            Color::White => "white",
            Color::Black => "black",
        };
        println!("{} to move", side);
    }

    if !session.history().is_empty() {
        let current = session.current_move_index();
        let line: Vec<String> = session
            .history()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let marker = if Some(i) == current { "*" } else { "" };
                format!("{}:{}{}", i, entry.descriptor, marker)
            })
            .collect();
        println!("History: {}", line.join("  "));
    }

    let arrows: Vec<String> = session
        .annotations()
        .arrows()
        .map(|(from, to)| format!("{}→{}", from, to))
        .collect();
    if !arrows.is_empty() {
        println!("Arrows: {}", arrows.join("  "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(session: &GameSession<ShakmatyAuthority>, flipped: bool) -> String {
        let mut buf = Vec::new();
        render_board(&mut buf, session, flipped).expect("rendering to buffer should succeed");
        String::from_utf8(buf).expect("output should be valid UTF-8")
    }

    #[test]
    fn render_contains_rank_and_file_labels() {
        let session = GameSession::new(ShakmatyAuthority::new());
        let output = render_to_string(&session, false);

        for rank in '1'..='8' {
            assert!(
                output.contains(rank),
                "output should contain rank label '{rank}'"
            );
        }
        assert!(output.contains(" a  b  c  d  e  f  g  h "));
    }

    #[test]
    fn render_starting_position_has_no_highlights() {
        let session = GameSession::new(ShakmatyAuthority::new());
        let output = render_to_string(&session, false);

        assert!(
            !output.contains("\x1b[4"),
            "no ANSI backgrounds before any interaction"
        );
    }

    #[test]
    fn render_selection_uses_green_and_destinations_blue() {
        let mut session = GameSession::new(ShakmatyAuthority::new());
        session.click_square(Square::E2).expect("authority in sync");

        let output = render_to_string(&session, false);
        assert!(output.contains("\x1b[42m"), "selection should be green");
        assert!(output.contains("\x1b[44m"), "destinations should be blue");
    }

    #[test]
    fn render_mark_uses_cyan() {
        let mut session = GameSession::new(ShakmatyAuthority::new());
        session.toggle_mark(Square::D4);

        let output = render_to_string(&session, false);
        assert!(output.contains("\x1b[46m"), "marks should be cyan");
    }

    #[test]
    fn render_flipped_starts_with_first_rank() {
        let session = GameSession::new(ShakmatyAuthority::new());

        let normal = render_to_string(&session, false);
        let flipped = render_to_string(&session, true);

        assert!(normal.trim_start().starts_with('8'));
        assert!(flipped.trim_start().starts_with('1'));
    }
}
