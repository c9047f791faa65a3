use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::board::{generate, tile_index, Board, TileView};
use crate::errors::domain::{DomainError, ValidationKind};

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[test]
fn tiles_are_laid_out_by_index_formula() {
    let tiles = generate(4, 3, 2, &mut rng(1)).unwrap();
    assert_eq!(tiles.len(), 12);
    for x in 0..4 {
        for y in 0..3 {
            let tile = &tiles[tile_index(x, y, 3)];
            assert_eq!((tile.x, tile.y), (x, y));
            assert!(!tile.is_selected);
        }
    }
}

#[test]
fn places_exactly_the_requested_bombs() {
    let tiles = generate(6, 6, 3, &mut rng(7)).unwrap();
    assert_eq!(tiles.iter().filter(|t| t.is_bomb).count(), 3);
}

#[test]
fn all_but_one_tile_can_be_a_bomb() {
    let tiles = generate(2, 2, 3, &mut rng(3)).unwrap();
    assert_eq!(tiles.iter().filter(|t| !t.is_bomb).count(), 1);
}

#[test]
fn rejects_full_board_of_bombs() {
    let err = generate(6, 6, 36, &mut rng(0)).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidBombCount, _)
    ));
    assert!(generate(6, 6, 40, &mut rng(0)).is_err());
}

#[test]
fn same_seed_same_board() {
    let a = generate(8, 8, 10, &mut rng(42)).unwrap();
    let b = generate(8, 8, 10, &mut rng(42)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn select_marks_tile_once() {
    let mut board = Board::generate(3, 3, 1, &mut rng(5)).unwrap();
    let tile = board.select(1, 2).unwrap();
    assert!(tile.is_selected);
    assert!(board.tile(1, 2).unwrap().is_selected);

    let err = board.select(1, 2).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::TileAlreadySelected, _)
    ));
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let mut board = Board::generate(3, 2, 1, &mut rng(5)).unwrap();
    assert!(matches!(
        board.select(3, 0),
        Err(DomainError::Validation(ValidationKind::OutOfBounds, _))
    ));
    assert!(matches!(
        board.select(0, 2),
        Err(DomainError::Validation(ValidationKind::OutOfBounds, _))
    ));
}

#[test]
fn public_view_hides_unselected_bombs() {
    let mut board = Board::generate(3, 3, 4, &mut rng(9)).unwrap();
    let bomb = *board.tiles().iter().find(|t| t.is_bomb).unwrap();
    board.select(bomb.x, bomb.y).unwrap();

    let view = board.public_view();
    for tile in &view {
        if tile.is_selected {
            assert_eq!(tile.is_bomb, Some(true));
        } else {
            assert_eq!(tile.is_bomb, None);
        }
    }

    let hidden = TileView::from(&board.tiles()[tile_index(0, 0, 3)]);
    let json = serde_json::to_value(hidden).unwrap();
    if !hidden.is_selected {
        assert!(json.get("is_bomb").is_none());
    }
}
