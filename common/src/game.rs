use rand::Rng;

use crate::{Agent, Board, Cell, Move};

/// The visible state of a single cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tile {
    Hidden,
    /// Hidden, but known to be a mine.
    Flagged,
    Revealed(u8), // The u8 is the number of adjacent mines.
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// One game: the hidden board, the agent reasoning about it, and what has
/// been revealed so far.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Game {
    board: Board,
    agent: Agent,
    /// Revealed counts, row-major. `None` while hidden.
    revealed: Vec<Vec<Option<u8>>>,
    pub game_state: GameState,
}

impl Game {
    pub fn new<R>(height: usize, width: usize, mines: usize, rng: &mut R) -> anyhow::Result<Self>
    where
        R: Rng + ?Sized,
    {
        Ok(Self::from_board(Board::new(height, width, mines, rng)?))
    }

    pub fn from_board(board: Board) -> Self {
        let (height, width) = board.bounds();
        Game {
            agent: Agent::new(height, width),
            revealed: vec![vec![None; width]; height],
            board,
            game_state: GameState::Playing,
        }
    }

    /// Deserializes a game state from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    /// Reveals `at`.
    ///
    /// Returns `Ok(false)` if `at` was a mine, which loses the game. An
    /// already revealed cell is left alone and reported as safe.
    pub fn reveal(&mut self, at: Cell) -> anyhow::Result<bool> {
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }
        anyhow::ensure!(self.board.contains(at), "cell {at} is off the board");
        if self.revealed[at.row][at.col].is_some() {
            return Ok(true);
        }

        if self.board.is_mine(at) {
            self.agent.mark_move(at);
            self.game_state = GameState::Lost;
            log::info!("revealed a mine at {at}");
            return Ok(false);
        }

        let count = self.board.adjacent_mine_count(at);
        let deductions = self.agent.observe(at, count)?;
        // At most 8 neighbours.
        self.revealed[at.row][at.col] = Some(count as u8);
        if !deductions.is_empty() {
            log::debug!(
                "{at} shows {count}; deduced {} mines and {} safe cells",
                deductions.mines.len(),
                deductions.safe.len()
            );
        }

        if self.check_win_condition() {
            self.game_state = GameState::Won;
        }
        Ok(true)
    }

    /// Lets the agent play one move. Returns the move, or `None` if the
    /// agent has nothing left to try.
    pub fn step<R>(&mut self, rng: &mut R) -> anyhow::Result<Option<Move>>
    where
        R: Rng + ?Sized,
    {
        let Some(next) = self.agent.next_move(rng) else {
            return Ok(None);
        };
        match next {
            Move::Certain(cell) => log::info!("certain safe move {cell}"),
            Move::Guess(cell) => log::info!("no certain move, guessing {cell}"),
        }
        self.reveal(next.cell())?;
        Ok(Some(next))
    }

    /// Won once every safe cell is revealed or every mine is known.
    pub fn check_win_condition(&self) -> bool {
        let (height, width) = self.board.bounds();
        let revealed = self.revealed.iter().flatten().filter(|t| t.is_some()).count();
        revealed + self.board.mines().len() == height * width
            || self.board.won(self.agent.knowledge().known_mines())
    }

    /// The board as the player sees it, with known mines flagged.
    pub fn tiles(&self) -> Vec<Vec<Tile>> {
        let known_mines = self.agent.knowledge().known_mines();
        self.revealed
            .iter()
            .enumerate()
            .map(|(row, tiles)| {
                tiles
                    .iter()
                    .enumerate()
                    .map(|(col, tile)| match tile {
                        Some(count) => Tile::Revealed(*count),
                        None if known_mines.contains(&Cell::new(row, col)) => Tile::Flagged,
                        None => Tile::Hidden,
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn game(height: usize, width: usize, mines: &[(usize, usize)]) -> Game {
        let board = Board::with_mines(height, width, mines.iter().copied().map(Cell::from));
        Game::from_board(board.unwrap())
    }

    #[test]
    fn test_game_initialization() {
        let mut rng = StdRng::seed_from_u64(0);
        let game = Game::new(5, 4, 3, &mut rng).unwrap();
        assert_eq!(game.height(), 5);
        assert_eq!(game.width(), 4);
        assert_eq!(game.board().mines().len(), 3);
        assert_eq!(game.game_state, GameState::Playing);

        // Verify all cells start as hidden
        for row in game.tiles() {
            assert_eq!(row.len(), 4);
            assert!(row.iter().all(|tile| *tile == Tile::Hidden));
        }
    }

    #[test]
    fn test_game_initialization_too_many_mines() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Game::new(3, 3, 10, &mut rng).is_err());
    }

    #[test]
    fn test_reveal_safe_cell() {
        let mut game = game(3, 3, &[(0, 0)]);
        assert!(game.reveal(Cell::new(1, 1)).unwrap());

        assert_eq!(game.tiles()[1][1], Tile::Revealed(1));
        assert_eq!(game.game_state, GameState::Playing);
        assert!(game.agent().knowledge().resolved_cells().contains(&Cell::new(1, 1)));

        // Revealing it again changes nothing
        assert!(game.reveal(Cell::new(1, 1)).unwrap());
        assert_eq!(game.agent().knowledge().resolved_cells().len(), 1);
    }

    #[test]
    fn test_hitting_mine() {
        let mut game = game(2, 2, &[(0, 0)]);
        assert!(!game.reveal(Cell::new(0, 0)).unwrap());
        assert_eq!(game.game_state, GameState::Lost);

        // No further moves once the game is over
        assert!(game.reveal(Cell::new(1, 1)).is_err());
    }

    #[test]
    fn test_reveal_off_board() {
        let mut game = game(2, 2, &[]);
        assert!(game.reveal(Cell::new(2, 0)).is_err());
    }

    #[test]
    fn test_known_mines_are_flagged() {
        let mut game = game(1, 3, &[(0, 2)]);
        game.reveal(Cell::new(0, 1)).unwrap();

        // {(0, 0), (0, 2)} = 1 is undecided until (0, 0) shows a zero
        assert_eq!(game.tiles()[0][2], Tile::Hidden);
        game.reveal(Cell::new(0, 0)).unwrap();
        assert_eq!(
            game.tiles(),
            vec![vec![Tile::Revealed(0), Tile::Revealed(1), Tile::Flagged]]
        );
        assert_eq!(game.game_state, GameState::Won);
    }

    #[test]
    fn test_bot_plays_to_completion() {
        // Deductions alone solve this board once the corner is open:
        //   . . .
        //   . . .
        //   . . M
        let mut game = game(3, 3, &[(2, 2)]);
        let mut rng = StdRng::seed_from_u64(8);
        game.reveal(Cell::new(0, 0)).unwrap();

        let mut guesses = 0;
        while game.game_state == GameState::Playing {
            match game.step(&mut rng).unwrap() {
                Some(Move::Guess(_)) => guesses += 1,
                Some(Move::Certain(_)) => {}
                None => break,
            }
        }

        assert_eq!(game.game_state, GameState::Won);
        assert_eq!(guesses, 0);
        assert!(game.agent().knowledge().known_mines().contains(&Cell::new(2, 2)));
    }

    #[test]
    fn test_serialization() {
        let mut game = game(3, 3, &[(0, 0)]);
        game.reveal(Cell::new(2, 2)).unwrap();

        let bytes = game.serialize().unwrap();
        let restored = Game::deserialize(&bytes).unwrap();
        assert_eq!(restored.tiles(), game.tiles());
        assert_eq!(restored.agent(), game.agent());
        assert_eq!(restored.board(), game.board());

        assert!(Game::deserialize(&[0xff]).is_err());
    }
}
