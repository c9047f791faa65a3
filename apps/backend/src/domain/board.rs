//! Board generation and tile lookup.
//!
//! Tiles are stored column-major: tile `(x, y)` lives at index
//! `x * height + y`. Every coordinate lookup goes through [`tile_index`];
//! nothing searches the board by coordinate.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::rules::{check_board_size, check_bombs_fit};
use crate::errors::domain::{DomainError, ValidationKind};

/// One board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    pub is_bomb: bool,
    pub is_selected: bool,
}

impl Tile {
    pub const fn new(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            is_bomb: false,
            is_selected: false,
        }
    }
}

/// Tile as shown to clients. `is_bomb` is withheld until the tile is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub x: usize,
    pub y: usize,
    pub is_selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bomb: Option<bool>,
}

impl From<&Tile> for TileView {
    fn from(tile: &Tile) -> Self {
        Self {
            x: tile.x,
            y: tile.y,
            is_selected: tile.is_selected,
            is_bomb: tile.is_selected.then_some(tile.is_bomb),
        }
    }
}

#[inline]
pub const fn tile_index(x: usize, y: usize, height: usize) -> usize {
    x * height + y
}

/// Build a `width * height` grid with `bomb_count` distinct bomb tiles.
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    bomb_count: usize,
    rng: &mut R,
) -> Result<Vec<Tile>, DomainError> {
    check_bombs_fit(bomb_count, width, height)?;
    let tile_count = check_board_size(width, height)?;

    let mut tiles = Vec::with_capacity(tile_count);
    for x in 0..width {
        for y in 0..height {
            tiles.push(Tile::new(x, y));
        }
    }

    for index in choose_bomb_indices(bomb_count, tiles.len(), rng) {
        tiles[index].is_bomb = true;
    }
    Ok(tiles)
}

/// Rejection sampling: draw uniformly in `[0, range)` and drop repeats until
/// `count` distinct indices are collected. Caller guarantees `count < range`.
fn choose_bomb_indices<R: Rng + ?Sized>(count: usize, range: usize, rng: &mut R) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(count);
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let index = rng.random_range(0..range);
        if seen.insert(index) {
            picked.push(index);
        }
    }
    picked
}

/// A generated board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        bomb_count: usize,
        rng: &mut R,
    ) -> Result<Self, DomainError> {
        let tiles = generate(width, height, bomb_count, rng)?;
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn bomb_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_bomb).count()
    }

    /// Index for `(x, y)`, or an out-of-bounds rejection.
    pub fn index_of(&self, x: usize, y: usize) -> Result<usize, DomainError> {
        if x >= self.width || y >= self.height {
            return Err(DomainError::validation(
                ValidationKind::OutOfBounds,
                format!(
                    "({x}, {y}) is outside the {}x{} board",
                    self.width, self.height
                ),
            ));
        }
        Ok(tile_index(x, y, self.height))
    }

    pub fn tile(&self, x: usize, y: usize) -> Result<&Tile, DomainError> {
        let index = self.index_of(x, y)?;
        let tile = self.tiles.get(index).ok_or_else(|| {
            DomainError::invariant(format!("tile index {index} missing from board"))
        })?;
        if tile.x != x || tile.y != y {
            return Err(DomainError::invariant(format!(
                "tile at index {index} is ({}, {}), expected ({x}, {y})",
                tile.x, tile.y
            )));
        }
        Ok(tile)
    }

    /// Mark `(x, y)` selected and return the updated tile.
    pub fn select(&mut self, x: usize, y: usize) -> Result<Tile, DomainError> {
        if self.tile(x, y)?.is_selected {
            return Err(DomainError::validation(
                ValidationKind::TileAlreadySelected,
                format!("({x}, {y}) was already selected"),
            ));
        }
        let index = tile_index(x, y, self.height);
        let tile = &mut self.tiles[index];
        tile.is_selected = true;
        Ok(*tile)
    }

    pub fn public_view(&self) -> Vec<TileView> {
        self.tiles.iter().map(TileView::from).collect()
    }
}
