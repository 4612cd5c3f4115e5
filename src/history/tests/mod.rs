use super::{
    AddPointCommand, BatchMovePointsCommand, Command, CommandManager, CompositeCommand,
    ConvertToInterpolatedCommand, DeletePointsCommand, InsertTrackOperation, MovePointCommand,
    SetPointStatusCommand, SmoothPointsCommand, MAX_HISTORY,
};
use crate::models::curves::{CurvePoint, PointStatus};
use crate::store::CurveStore;

fn tracked(frame: i64, x: f64, y: f64) -> CurvePoint {
    CurvePoint::new(frame, x, y, PointStatus::Tracked)
}

fn store_with(name: &str, points: Vec<CurvePoint>) -> CurveStore {
    let mut store = CurveStore::new();
    store.set_curve(name, points).unwrap();
    store
}

fn snapshot(store: &CurveStore) -> Vec<(String, Vec<CurvePoint>)> {
    store
        .curve_names()
        .into_iter()
        .map(|name| {
            let points = store.points(&name).to_vec();
            (name, points)
        })
        .collect()
}

#[test]
fn undo_redo_round_trip_restores_states() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0), tracked(2, 1.0, 1.0)]);
    let before = snapshot(&store);

    let mut manager = CommandManager::new();
    assert!(manager.execute_command(
        Box::new(MovePointCommand::new("cam01", 2, 7.0, 8.0)),
        &mut store
    ));
    let after = snapshot(&store);
    assert_ne!(before, after);

    assert!(manager.undo(&mut store));
    assert_eq!(snapshot(&store), before);

    assert!(manager.redo(&mut store));
    assert_eq!(snapshot(&store), after);
}

#[test]
fn undo_and_redo_refuse_when_nothing_to_do() {
    let mut store = CurveStore::new();
    let mut manager = CommandManager::new();

    assert!(!manager.undo(&mut store));
    assert!(!manager.redo(&mut store));
    assert!(!manager.can_undo());
    assert!(!manager.can_redo());
}

#[test]
fn never_executed_command_refuses_undo() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let mut command = MovePointCommand::new("cam01", 1, 5.0, 5.0);
    assert!(!command.undo(&mut store));
}

#[test]
fn failed_command_is_discarded() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let before = snapshot(&store);

    let mut manager = CommandManager::new();
    // No point on frame 99.
    assert!(!manager.execute_command(
        Box::new(MovePointCommand::new("cam01", 99, 5.0, 5.0)),
        &mut store
    ));
    assert_eq!(snapshot(&store), before);
    assert_eq!(manager.history_len(), 0);
}

#[test]
fn new_command_truncates_redo_tail() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let mut manager = CommandManager::new();

    manager.execute_command(
        Box::new(AddPointCommand::new("cam01", tracked(2, 1.0, 1.0))),
        &mut store,
    );
    manager.undo(&mut store);
    assert!(manager.can_redo());

    manager.execute_command(
        Box::new(AddPointCommand::new("cam01", tracked(3, 2.0, 2.0))),
        &mut store,
    );
    assert!(!manager.can_redo());
    assert_eq!(manager.history_len(), 1);
}

#[test]
fn move_commands_merge_into_single_entry() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let mut manager = CommandManager::new();

    manager.execute_command(
        Box::new(MovePointCommand::new("cam01", 1, 2.0, 2.0)),
        &mut store,
    );
    manager.execute_command(
        Box::new(MovePointCommand::new("cam01", 1, 4.0, 4.0)),
        &mut store,
    );

    assert_eq!(manager.history_len(), 1);
    assert_eq!(store.points("cam01")[0].x, 4.0);

    // One undo restores the original position, one redo the final one.
    assert!(manager.undo(&mut store));
    assert_eq!(store.points("cam01")[0].x, 0.0);
    assert!(!manager.can_undo());

    assert!(manager.redo(&mut store));
    assert_eq!(store.points("cam01")[0].x, 4.0);
}

#[test]
fn moves_of_different_points_do_not_merge() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0), tracked(2, 1.0, 1.0)]);
    let mut manager = CommandManager::new();

    manager.execute_command(
        Box::new(MovePointCommand::new("cam01", 1, 2.0, 2.0)),
        &mut store,
    );
    manager.execute_command(
        Box::new(MovePointCommand::new("cam01", 2, 3.0, 3.0)),
        &mut store,
    );
    assert_eq!(manager.history_len(), 2);
}

#[test]
fn batch_moves_merge_and_sum_deltas() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0), tracked(2, 1.0, 1.0)]);
    let mut manager = CommandManager::new();

    manager.execute_command(
        Box::new(BatchMovePointsCommand::new("cam01", vec![1, 2], 1.0, 0.0)),
        &mut store,
    );
    manager.execute_command(
        Box::new(BatchMovePointsCommand::new("cam01", vec![1, 2], 2.0, 0.0)),
        &mut store,
    );

    assert_eq!(manager.history_len(), 1);
    assert_eq!(store.points("cam01")[0].x, 3.0);

    assert!(manager.undo(&mut store));
    assert_eq!(store.points("cam01")[0].x, 0.0);
    assert_eq!(store.points("cam01")[1].x, 1.0);

    assert!(manager.redo(&mut store));
    assert_eq!(store.points("cam01")[0].x, 3.0);
}

#[test]
fn overlapping_smooths_merge_keeping_pre_and_post_state() {
    let points: Vec<CurvePoint> = (1..=5)
        .map(|f| tracked(f, (f * f) as f64, 0.0))
        .collect();
    let mut store = store_with("cam01", points);
    let before = snapshot(&store);

    let mut manager = CommandManager::new();
    assert!(manager.execute_command(
        Box::new(SmoothPointsCommand::new("cam01", vec![2, 3])),
        &mut store
    ));
    assert!(manager.execute_command(
        Box::new(SmoothPointsCommand::new("cam01", vec![3, 4])),
        &mut store
    ));
    assert_eq!(manager.history_len(), 1);
    let after = snapshot(&store);

    assert!(manager.undo(&mut store));
    assert_eq!(snapshot(&store), before);

    assert!(manager.redo(&mut store));
    assert_eq!(snapshot(&store), after);
}

#[test]
fn disjoint_smooths_do_not_merge() {
    let points: Vec<CurvePoint> = (1..=6).map(|f| tracked(f, f as f64, 0.0)).collect();
    let mut store = store_with("cam01", points);
    let mut manager = CommandManager::new();

    manager.execute_command(
        Box::new(SmoothPointsCommand::new("cam01", vec![2])),
        &mut store,
    );
    manager.execute_command(
        Box::new(SmoothPointsCommand::new("cam01", vec![5])),
        &mut store,
    );
    assert_eq!(manager.history_len(), 2);
}

#[test]
fn history_is_bounded() {
    let mut store = store_with("cam01", vec![tracked(0, 0.0, 0.0)]);
    let mut manager = CommandManager::new();

    for i in 1..=(MAX_HISTORY as i64 + 5) {
        assert!(manager.execute_command(
            Box::new(AddPointCommand::new("cam01", tracked(i, i as f64, 0.0))),
            &mut store
        ));
    }
    assert_eq!(manager.history_len(), MAX_HISTORY);
    assert_eq!(manager.undo_depth(), MAX_HISTORY);

    while manager.can_undo() {
        assert!(manager.undo(&mut store));
    }
    // The five evicted adds are unreachable: their points remain.
    assert_eq!(store.points("cam01").len(), 6);
}

#[test]
fn clear_history_drops_everything() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let mut manager = CommandManager::new();

    manager.execute_command(
        Box::new(AddPointCommand::new("cam01", tracked(2, 1.0, 1.0))),
        &mut store,
    );
    manager.clear_history();
    assert!(!manager.can_undo());
    assert!(!manager.can_redo());
    assert_eq!(manager.history_len(), 0);
}

#[test]
fn composite_failure_rolls_back_atomically() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let before = snapshot(&store);

    let mut composite = CompositeCommand::new("two-step edit");
    composite.push(Box::new(AddPointCommand::new("cam01", tracked(2, 1.0, 1.0))));
    // No point on frame 99: this step fails.
    composite.push(Box::new(MovePointCommand::new("cam01", 99, 5.0, 5.0)));

    assert!(!composite.execute(&mut store));
    assert_eq!(snapshot(&store), before);
    assert!(!composite.commands()[0].is_executed());
    assert!(!composite.is_executed());
}

#[test]
fn composite_undoes_in_reverse_order() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0)]);
    let before = snapshot(&store);

    let mut composite = CompositeCommand::new("edit");
    composite.push(Box::new(AddPointCommand::new("cam01", tracked(2, 1.0, 1.0))));
    composite.push(Box::new(MovePointCommand::new("cam01", 2, 9.0, 9.0)));

    assert!(composite.execute(&mut store));
    assert_eq!(store.points("cam01").len(), 2);
    assert_eq!(store.points("cam01")[1].x, 9.0);

    assert!(composite.undo(&mut store));
    assert_eq!(snapshot(&store), before);
}

#[test]
fn delete_and_status_commands_round_trip() {
    let mut store = store_with(
        "cam01",
        vec![tracked(1, 0.0, 0.0), tracked(2, 1.0, 1.0), tracked(3, 2.0, 2.0)],
    );
    let before = snapshot(&store);
    let mut manager = CommandManager::new();

    assert!(manager.execute_command(
        Box::new(DeletePointsCommand::new("cam01", vec![2, 3])),
        &mut store
    ));
    assert_eq!(store.points("cam01").len(), 1);

    assert!(manager.execute_command(
        Box::new(SetPointStatusCommand::new("cam01", 1, PointStatus::Endframe)),
        &mut store
    ));
    assert_eq!(store.points("cam01")[0].status, PointStatus::Endframe);

    assert!(manager.undo(&mut store));
    assert!(manager.undo(&mut store));
    assert_eq!(snapshot(&store), before);
}

#[test]
fn convert_to_interpolated_recomputes_position() {
    let mut store = store_with(
        "cam01",
        vec![
            tracked(1, 0.0, 0.0),
            CurvePoint::new(5, 99.0, 99.0, PointStatus::Keyframe),
            tracked(9, 80.0, 80.0),
        ],
    );
    let mut manager = CommandManager::new();

    assert!(manager.execute_command(
        Box::new(ConvertToInterpolatedCommand::new("cam01", 5)),
        &mut store
    ));
    let converted = *store.curve("cam01").unwrap().point_at(5).unwrap();
    assert_eq!(converted.status, PointStatus::Interpolated);
    // Halfway between frames 1 and 9.
    assert!((converted.x - 40.0).abs() < 1e-9, "x={}", converted.x);
    assert!((converted.y - 40.0).abs() < 1e-9, "y={}", converted.y);

    assert!(manager.undo(&mut store));
    let original = *store.curve("cam01").unwrap().point_at(5).unwrap();
    assert_eq!(original.status, PointStatus::Keyframe);
    assert_eq!(original.x, 99.0);
}

#[test]
fn insert_track_interpolates_single_gapped_curve() {
    let mut store = store_with("cam01", vec![tracked(1, 0.0, 0.0), tracked(10, 90.0, 90.0)]);
    let before = snapshot(&store);
    let mut manager = CommandManager::new();

    let op = InsertTrackOperation::new(vec!["cam01".into()], 5);
    assert!(manager.execute_command(Box::new(op), &mut store));

    assert_eq!(store.points("cam01").len(), 10);
    let p5 = *store.curve("cam01").unwrap().point_at(5).unwrap();
    assert!((p5.x - 40.0).abs() < 1e-9);
    assert_eq!(p5.status, PointStatus::Interpolated);

    assert!(manager.undo(&mut store));
    assert_eq!(snapshot(&store), before);
    assert!(manager.redo(&mut store));
    assert_eq!(store.points("cam01").len(), 10);
}

#[test]
fn insert_track_fills_gap_from_single_source() {
    let mut store = store_with(
        "target",
        vec![
            tracked(1, 100.0, 200.0),
            tracked(2, 110.0, 210.0),
            tracked(4, 130.0, 230.0),
        ],
    );
    store
        .set_curve(
            "source",
            vec![
                tracked(1, 0.0, 150.0),
                tracked(2, 10.0, 160.0),
                tracked(3, 20.0, 170.0),
                tracked(4, 30.0, 180.0),
            ],
        )
        .unwrap();
    let before = snapshot(&store);
    let mut manager = CommandManager::new();

    let op = InsertTrackOperation::new(vec!["target".into(), "source".into()], 3);
    assert!(manager.execute_command(Box::new(op), &mut store));

    let p3 = *store.curve("target").unwrap().point_at(3).unwrap();
    // Overlap frames 1, 2 and 4 all agree on a (100, 50) offset.
    assert!((p3.x - 120.0).abs() < 1e-9, "x={}", p3.x);
    assert!((p3.y - 220.0).abs() < 1e-9, "y={}", p3.y);
    // The source curve is untouched.
    assert_eq!(store.points("source"), &before[0].1[..]);

    assert!(manager.undo(&mut store));
    assert_eq!(snapshot(&store), before);
}

#[test]
fn insert_track_averages_multiple_sources() {
    let mut store = store_with(
        "target",
        vec![
            tracked(1, 100.0, 100.0),
            tracked(2, 101.0, 101.0),
            tracked(4, 103.0, 103.0),
        ],
    );
    let source: Vec<CurvePoint> = (1..=4)
        .map(|f| tracked(f, (f - 1) as f64, (f - 1) as f64))
        .collect();
    store.set_curve("src_a", source.clone()).unwrap();
    store.set_curve("src_b", source).unwrap();
    let mut manager = CommandManager::new();

    let op = InsertTrackOperation::new(
        vec!["target".into(), "src_a".into(), "src_b".into()],
        3,
    );
    assert!(manager.execute_command(Box::new(op), &mut store));

    let p3 = *store.curve("target").unwrap().point_at(3).unwrap();
    assert!((p3.x - 102.0).abs() < 1e-9, "x={}", p3.x);
    assert!((p3.y - 102.0).abs() < 1e-9, "y={}", p3.y);
}

#[test]
fn insert_track_creates_averaged_curve_with_unique_name() {
    let mut store = store_with("a", vec![tracked(3, 110.0, 210.0), tracked(4, 0.0, 0.0)]);
    store
        .set_curve("b", vec![tracked(3, 130.0, 230.0), tracked(4, 2.0, 2.0)])
        .unwrap();
    store.set_curve("avrg_01", vec![tracked(1, 0.0, 0.0)]).unwrap();
    let before = snapshot(&store);

    let mut op = InsertTrackOperation::new(vec!["a".into(), "b".into()], 3);
    assert!(op.execute(&mut store));
    assert_eq!(op.created_curve_name(), Some("avrg_02"));

    let averaged = store.points("avrg_02");
    assert_eq!(averaged.len(), 2);
    assert!((averaged[0].x - 120.0).abs() < 1e-9);
    assert!((averaged[0].y - 220.0).abs() < 1e-9);

    // Undo removes the created curve entirely.
    assert!(op.undo(&mut store));
    assert!(!store.contains_curve("avrg_02"));
    assert_eq!(snapshot(&store), before);

    assert!(op.redo(&mut store));
    assert!(store.contains_curve("avrg_02"));
}

#[test]
fn insert_track_rejects_unsupported_selections() {
    // Both curves have a gap at the reference frame: nothing can act as
    // a source and interpolation only applies to single selections.
    let mut store = store_with("a", vec![tracked(1, 0.0, 0.0), tracked(5, 4.0, 4.0)]);
    store
        .set_curve("b", vec![tracked(1, 0.0, 0.0), tracked(5, 4.0, 4.0)])
        .unwrap();
    let before = snapshot(&store);
    let mut manager = CommandManager::new();

    let op = InsertTrackOperation::new(vec!["a".into(), "b".into()], 3);
    assert!(!manager.execute_command(Box::new(op), &mut store));
    assert_eq!(snapshot(&store), before);
    assert_eq!(manager.history_len(), 0);

    // Empty selection.
    let op = InsertTrackOperation::new(Vec::new(), 3);
    assert!(!manager.execute_command(Box::new(op), &mut store));

    // A single data-bearing curve: no gap, not enough curves to average.
    let op = InsertTrackOperation::new(vec!["a".into()], 1);
    assert!(!manager.execute_command(Box::new(op), &mut store));
    assert_eq!(snapshot(&store), before);
}

#[test]
fn insert_track_skips_unfillable_target_but_fills_sibling() {
    // "far" has a gap at frame 3 but shares no overlap frames with the
    // source; "near" does. The operation still succeeds for "near".
    let mut store = store_with(
        "near",
        vec![tracked(2, 10.0, 10.0), tracked(4, 12.0, 12.0)],
    );
    store
        .set_curve("far", vec![tracked(1, 0.0, 0.0), tracked(9, 8.0, 8.0)])
        .unwrap();
    store
        .set_curve(
            "source",
            vec![tracked(2, 0.0, 0.0), tracked(3, 1.0, 1.0), tracked(4, 2.0, 2.0)],
        )
        .unwrap();
    let mut manager = CommandManager::new();

    let op = InsertTrackOperation::new(
        vec!["near".into(), "far".into(), "source".into()],
        3,
    );
    assert!(manager.execute_command(Box::new(op), &mut store));

    assert!(store.curve("near").unwrap().point_at(3).is_some());
    // The unfillable sibling is left alone.
    assert!(store.curve("far").unwrap().point_at(3).is_none());
}
