//! Flutter bridge for the apartment occupancy board.

pub mod api;
