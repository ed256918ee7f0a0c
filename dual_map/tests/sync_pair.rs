use dual_map::sync::{ViewportPair, SYNC_TOLERANCE};
use dual_map::viewport::{LatLng, MapViewport, MemoryViewport, Side};

fn pair(syncing: bool) -> ViewportPair<MemoryViewport> {
    let _ = env_logger::builder().is_test(true).try_init();
    ViewportPair::new(MemoryViewport::default(), MemoryViewport::default(), syncing)
}

fn assert_settled(p: &ViewportPair<MemoryViewport>) {
    let a = p.primary().unwrap().camera();
    let b = p.secondary().unwrap().camera();
    assert!(a.approx_eq(&b, SYNC_TOLERANCE), "{:?} != {:?}", a, b);
}

#[test]
fn moves_from_either_side_keep_cameras_equal() {
    let mut p = pair(true);
    let moves = [
        (Side::Primary, LatLng::new(10.0, 10.0), 5.0),
        (Side::Secondary, LatLng::new(-33.9, 151.2), 11.5),
        (Side::Primary, LatLng::new(64.1, -21.9), 3.25),
        (Side::Secondary, LatLng::new(0.0, 0.0), 0.0),
    ];
    for (side, center, zoom) in moves {
        let vp = p.get_mut(side).unwrap();
        vp.pan_to(center);
        vp.zoom_to(zoom);
        p.dispatch();
        assert_settled(&p);
        assert_eq!(p.get(side.other()).unwrap().center(), center);
        assert_eq!(p.get(side.other()).unwrap().zoom(), zoom);
    }
}

#[test]
fn each_move_writes_the_sibling_once() {
    let mut p = pair(true);
    p.get_mut(Side::Secondary).unwrap().pan_to(LatLng::new(5.0, 5.0));
    assert_eq!(p.dispatch(), 1);
    assert_eq!(p.secondary().unwrap().view_writes(), 0);
    assert_eq!(p.primary().unwrap().view_writes(), 1);
    assert_eq!(p.primary().unwrap().pending_events(), 0);
}

#[test]
fn disabled_sync_leaves_sibling_alone() {
    let mut p = pair(false);
    p.get_mut(Side::Primary).unwrap().pan_to(LatLng::new(40.0, -74.0));
    p.get_mut(Side::Primary).unwrap().zoom_to(12.0);
    assert_eq!(p.dispatch(), 0);
    let secondary = p.secondary().unwrap();
    assert_eq!(secondary.center(), LatLng::new(0.0, 0.0));
    assert_eq!(secondary.zoom(), 2.0);
    assert_eq!(secondary.view_writes(), 0);
}

#[test]
fn double_toggle_restores_propagation() {
    let mut p = pair(true);
    assert!(!p.toggle_sync());
    p.get_mut(Side::Primary).unwrap().zoom_to(6.0);
    assert_eq!(p.dispatch(), 0);
    assert_eq!(p.secondary().unwrap().zoom(), 2.0);

    assert!(p.toggle_sync());
    assert!(p.is_syncing());
    // Toggling alone does not move anything.
    assert_eq!(p.secondary().unwrap().zoom(), 2.0);

    p.get_mut(Side::Primary).unwrap().pan_to(LatLng::new(1.0, 2.0));
    assert_eq!(p.dispatch(), 1);
    assert_settled(&p);
}

#[test]
fn clamped_sibling_does_not_echo_back() {
    let mut p = ViewportPair::new(
        MemoryViewport::default(),
        MemoryViewport::default().with_zoom_range(0.0, 18.0),
        true,
    );
    p.get_mut(Side::Primary).unwrap().zoom_to(20.0);
    assert_eq!(p.dispatch(), 1);
    assert_eq!(p.primary().unwrap().zoom(), 20.0);
    assert_eq!(p.secondary().unwrap().zoom(), 18.0);
    assert_eq!(p.primary().unwrap().view_writes(), 0);
}

#[test]
fn latest_move_wins_across_sides() {
    let mut p = pair(true);
    p.get_mut(Side::Primary).unwrap().pan_to(LatLng::new(10.0, 10.0));
    p.get_mut(Side::Secondary).unwrap().pan_to(LatLng::new(-20.0, 30.0));
    assert_eq!(p.dispatch(), 1);
    assert_settled(&p);
    assert_eq!(p.primary().unwrap().center(), LatLng::new(-20.0, 30.0));
    assert_eq!(p.secondary().unwrap().view_writes(), 0);
}

#[test]
fn interleaved_moves_follow_arrival_order() {
    let mut p = pair(true);
    p.get_mut(Side::Secondary).unwrap().zoom_to(7.0);
    p.get_mut(Side::Primary).unwrap().pan_to(LatLng::new(45.0, 7.0));
    p.get_mut(Side::Secondary).unwrap().pan_to(LatLng::new(46.0, 8.0));
    p.get_mut(Side::Primary).unwrap().zoom_to(9.0);
    p.dispatch();
    assert_settled(&p);
    // The primary moved last, so its camera is the one both show.
    let primary = p.primary().unwrap();
    assert_eq!(primary.center(), LatLng::new(45.0, 7.0));
    assert_eq!(primary.zoom(), 9.0);
    assert_eq!(p.dispatch(), 0);
}

#[test]
fn nan_zoom_settles_without_writes() {
    let mut p = pair(true);
    p.get_mut(Side::Primary).unwrap().zoom_to(f64::NAN);
    p.set_zoom(f64::NAN);
    p.set_view(LatLng::new(f64::NAN, 0.0), 3.0);
    assert_eq!(p.dispatch(), 0);
    assert_eq!(p.primary().unwrap().zoom(), 2.0);
    assert_eq!(p.secondary().unwrap().zoom(), 2.0);
    assert_eq!(p.secondary().unwrap().view_writes(), 0);
}
