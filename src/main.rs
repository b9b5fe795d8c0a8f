use chess_session::authority::ShakmatyAuthority;
use chess_session::session::GameSession;

fn main() {
    let session = GameSession::new(ShakmatyAuthority::new());
    chess_session::terminal::run_interactive_terminal(session);
}
