use super::*;

#[test]
fn acquire_allocates_transparent_pixels() {
    let surface = Surface::acquire(1, 4, 3).unwrap();
    assert_eq!((surface.width(), surface.height()), (4, 3));
    assert_eq!(surface.generation(), 1);
    assert_eq!(surface.pixels().len(), 4 * 3 * 4);
    assert!(surface.pixels().iter().all(|b| *b == 0));
}

#[test]
fn acquire_rejects_zero_size() {
    assert_eq!(Surface::acquire(1, 0, 10).unwrap_err(), SurfaceError::InvalidSize { width: 0, height: 10 });
}

#[test]
fn resize_changes_dimensions() {
    let mut surface = Surface::acquire(2, 10, 10).unwrap();
    surface.resize(20, 5).unwrap();
    assert_eq!((surface.width(), surface.height()), (20, 5));
    assert_eq!(surface.generation(), 2);
}

#[test]
fn failed_resize_keeps_old_buffer() {
    let mut surface = Surface::acquire(1, 10, 10).unwrap();
    assert!(surface.resize(0, 0).is_err());
    assert_eq!((surface.width(), surface.height()), (10, 10));
}

#[test]
fn pixel_size_rounds_up_and_floors_at_one() {
    assert_eq!(pixel_size(Viewport::new(99.2, 10.0)), (100, 10));
    assert_eq!(pixel_size(Viewport::new(0.0, f64::NAN)), (1, 1));
}
