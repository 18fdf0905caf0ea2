//! ArborChess - Remote game server boundary
//!
//! The engine treats the server as an opaque move sink and source. Concrete
//! transports (HTTP clients and the like) live outside this crate.

use crate::board::Move;
use crate::error::Result;

/// Server verdict on a submitted move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitStatus {
    Ok,
    IllegalMove,
    NotYourTurn,
    OutOfTime,
}

/// Move sink and source for a game played against a remote server.
///
/// Connection failures are reported as `ChessError::Transport`.
pub trait MoveTransport {
    /// Submit our move and return the server's verdict
    fn submit_move(&mut self, mv: &Move) -> Result<SubmitStatus>;

    /// Block until the opponent's next move is available
    fn receive_move(&mut self) -> Result<Move>;
}
