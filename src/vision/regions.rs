//! Reading-order sort for detected character boxes
//!
//! Detectors report boxes in arbitrary order; recognition and label
//! alignment both need left-to-right, top-to-bottom. Two boxes whose
//! vertical origins differ by at most 0.7x the mean box height are treated
//! as sharing a row.

use crate::vision::RegionBox;

/// Fraction of the mean box height below which two boxes count as
/// same-row.
const ROW_THRESHOLD_FACTOR: f32 = 0.7;

/// Sort boxes into reading order: rows top to bottom, same-row boxes left
/// to right. An empty input stays empty (detection found no text; that is
/// not an error here).
pub fn order_regions(mut boxes: Vec<RegionBox>) -> Vec<RegionBox> {
    if boxes.is_empty() {
        return boxes;
    }

    let mean_height =
        boxes.iter().map(|b| b.height as f32).sum::<f32>() / boxes.len() as f32;
    let row_threshold = mean_height * ROW_THRESHOLD_FACTOR;

    // The comparator is not transitive across the row threshold: in a
    // staircase layout, adjacent boxes compare by x while the chain's ends
    // compare by y, so the resulting order for such inputs is unspecified.
    boxes.sort_by(|a, b| {
        let vertical_difference = (a.y as f32 - b.y as f32).abs();
        if vertical_difference > row_threshold {
            a.y.cmp(&b.y)
        } else {
            a.x.cmp(&b.x).then(a.y.cmp(&b.y))
        }
    });

    boxes
}
