//! Survivor activation order with a rotating first player.
//!
//! The roster is fixed at setup. Within a round survivors activate in seat
//! order starting from the current first player; when a round closes the
//! first-player token passes one seat to the left.

use serde::{Deserialize, Serialize};

use crate::entities::EntityId;
use crate::error::SetupError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrder {
    roster: Vec<EntityId>,
    /// Roster index of the current first player.
    first: usize,
    /// Seats already activated this round.
    cursor: usize,
}

impl TurnOrder {
    /// # Errors
    ///
    /// [`SetupError::EmptyRoster`] when no survivors are supplied.
    pub fn new(roster: Vec<EntityId>) -> Result<Self, SetupError> {
        if roster.is_empty() {
            return Err(SetupError::EmptyRoster);
        }
        Ok(Self {
            roster,
            first: 0,
            cursor: 0,
        })
    }

    #[must_use]
    pub fn first_player(&self) -> EntityId {
        self.roster[self.first]
    }

    /// The survivor whose activation is up, or `None` once the round is
    /// exhausted.
    #[must_use]
    pub fn current(&self) -> Option<EntityId> {
        (self.cursor < self.roster.len()).then(|| self.seat(self.cursor))
    }

    /// Finish the current activation and move to the next seat.
    pub fn advance(&mut self) -> Option<EntityId> {
        if self.cursor < self.roster.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Reset the cursor for a fresh round.
    pub fn begin_round(&mut self) {
        self.cursor = 0;
    }

    /// Rotate the first-player token one seat.
    pub fn close_round(&mut self) {
        self.first = (self.first + 1) % self.roster.len();
        self.cursor = 0;
    }

    /// Activation order for the current round.
    #[must_use]
    pub fn seat_order(&self) -> Vec<EntityId> {
        (0..self.roster.len()).map(|seat| self.seat(seat)).collect()
    }

    #[must_use]
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    fn seat(&self, seat: usize) -> EntityId {
        self.roster[(self.first + seat) % self.roster.len()]
    }
}
