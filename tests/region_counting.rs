//! Grouping and counting behaviour over small hand-built datasets.

use device_heatmap::counting::{entity_tallies, points_within};
use device_heatmap::{count_within, group, GeometryError, PointEvent, Region};
use geo::Coord;

fn unit_square() -> Region {
    Region::from_lon_lat(&[(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)]).unwrap()
}

fn sorted_coords(mut coords: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    coords.sort_by(|a, b| a.partial_cmp(b).unwrap());
    coords
}

#[test]
fn test_grouping_preserves_point_multiset() {
    let events: Vec<PointEvent> = (0..40)
        .map(|i| {
            PointEvent::new(
                (i % 7) as f64 * 0.5,
                (i % 3) as f64 * 0.25,
                format!("dev-{}", i % 5),
            )
        })
        .collect();

    let grouped = group(&events).unwrap();
    assert_eq!(grouped.len(), 5);
    assert_eq!(grouped.point_count(), events.len());

    let input = sorted_coords(events.iter().map(|e| (e.longitude, e.latitude)).collect());
    let output = sorted_coords(
        grouped
            .iter()
            .flat_map(|(_, points)| points.iter().map(|c| (c.x, c.y)))
            .collect(),
    );
    assert_eq!(input, output);
}

#[test]
fn test_grouping_order_is_reversed() {
    let events = vec![
        PointEvent::new(1.0, 0.0, "first"),
        PointEvent::new(2.0, 0.0, "second"),
        PointEvent::new(3.0, 0.0, "first"),
        PointEvent::new(4.0, 0.0, "third"),
    ];
    let grouped = group(&events).unwrap();

    // Newest event's entity comes first
    assert_eq!(
        grouped.entity_ids().collect::<Vec<_>>(),
        vec!["third", "first", "second"]
    );
    assert_eq!(
        grouped.get("first").unwrap(),
        &[Coord { x: 3.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }]
    );
}

#[test]
fn test_single_entity_many_points() {
    let events: Vec<PointEvent> = (0..12)
        .map(|i| PointEvent::new(i as f64, i as f64, "solo"))
        .collect();
    let grouped = group(&events).unwrap();
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped.get("solo").unwrap().len(), 12);
}

#[test]
fn test_coincident_points_scenario() {
    let grouped = group(&[
        PointEvent::new(0.0, 0.0, "A"),
        PointEvent::new(0.0, 0.0, "A"),
        PointEvent::new(10.0, 10.0, "B"),
    ])
    .unwrap();

    let result = count_within(&unit_square(), &grouped);
    assert_eq!(result.entities, 1);
    assert_eq!(result.label(), "1");

    let tallies = entity_tallies(&unit_square(), &grouped);
    assert_eq!(tallies, vec![("B", 0), ("A", 2)]);
}

#[test]
fn test_three_single_point_entities_inside() {
    let grouped = group(&[
        PointEvent::new(0.1, 0.1, "a"),
        PointEvent::new(-0.5, 0.5, "b"),
        PointEvent::new(0.5, -0.5, "c"),
    ])
    .unwrap();
    assert_eq!(count_within(&unit_square(), &grouped).entities, 3);
}

#[test]
fn test_polygon_around_one_entity_only() {
    let grouped = group(&[
        PointEvent::new(11.501, 48.101, "inside"),
        PointEvent::new(11.502, 48.102, "inside"),
        PointEvent::new(11.6, 48.2, "outside"),
        PointEvent::new(11.7, 48.3, "outside"),
    ])
    .unwrap();
    let region =
        Region::from_lon_lat(&[(11.5, 48.1), (11.51, 48.1), (11.51, 48.11), (11.5, 48.11)])
            .unwrap();

    let tallies = entity_tallies(&region, &grouped);
    assert!(tallies.contains(&("inside", 2)));
    assert!(tallies.contains(&("outside", 0)));
    assert_eq!(count_within(&region, &grouped).entities, 1);
}

#[test]
fn test_empty_polygon_counts_zero() {
    let grouped = group(&[
        PointEvent::new(5.0, 5.0, "a"),
        PointEvent::new(6.0, 6.0, "b"),
    ])
    .unwrap();
    assert_eq!(count_within(&unit_square(), &grouped).entities, 0);
}

#[test]
fn test_counting_is_repeatable() {
    let grouped = group(&[
        PointEvent::new(0.0, 0.0, "a"),
        PointEvent::new(0.5, 0.5, "b"),
        PointEvent::new(3.0, 3.0, "c"),
    ])
    .unwrap();
    let before = grouped.clone();

    let first = count_within(&unit_square(), &grouped);
    let second = count_within(&unit_square(), &grouped);
    assert_eq!(first, second);
    assert_eq!(grouped, before);
}

#[test]
fn test_boundary_points_are_outside() {
    let grouped = group(&[
        PointEvent::new(1.0, 0.0, "edge"),
        PointEvent::new(-1.0, -1.0, "vertex"),
    ])
    .unwrap();
    assert_eq!(count_within(&unit_square(), &grouped).entities, 0);
    assert_eq!(
        points_within(&unit_square(), &[Coord { x: 0.0, y: 1.0 }]),
        0
    );
}

#[test]
fn test_concave_polygon() {
    // U shape opening upwards; the notch at (2, 2) is outside
    let region = Region::from_lon_lat(&[
        (0.0, 0.0),
        (4.0, 0.0),
        (4.0, 4.0),
        (3.0, 4.0),
        (3.0, 1.0),
        (1.0, 1.0),
        (1.0, 4.0),
        (0.0, 4.0),
    ])
    .unwrap();
    let grouped = group(&[
        PointEvent::new(2.0, 2.0, "notch"),
        PointEvent::new(0.5, 3.0, "left-arm"),
        PointEvent::new(3.5, 3.0, "right-arm"),
    ])
    .unwrap();
    assert_eq!(count_within(&region, &grouped).entities, 2);
}

#[test]
fn test_invalid_polygons() {
    assert_eq!(
        Region::from_lon_lat(&[(0.0, 0.0), (1.0, 1.0)]).unwrap_err(),
        GeometryError::TooFewVertices { distinct: 2 }
    );
    let err = Region::from_lon_lat(&[(0.0, 0.0), (1.0, f64::NAN), (1.0, 1.0)]).unwrap_err();
    assert!(err.is_invalid_geometry());
}
