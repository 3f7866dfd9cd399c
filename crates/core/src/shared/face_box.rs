/// IoU above which two candidate detections count as the same face.
pub const DEFAULT_GROUP_IOU: f64 = 0.3;

/// A face bounding box in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = self.width as f64 * self.height as f64;
        let area_b = other.width as f64 * other.height as f64;
        inter / (area_a + area_b - inter)
    }

    /// Intersects the box with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the box remains visible.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceBox> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x + self.width).min(frame_width as i32);
        let y2 = (self.y + self.height).min(frame_height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(FaceBox::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Clusters raw candidate detections and confirms a face for every
    /// cluster holding at least `min_neighbors` candidates.
    ///
    /// Greedy assignment: a candidate joins the first cluster whose seed it
    /// overlaps above `iou_threshold`, otherwise it seeds a new cluster.
    /// Confirmed boxes are the integer mean of their cluster's members.
    pub fn group_candidates(
        candidates: &[FaceBox],
        min_neighbors: u32,
        iou_threshold: f64,
    ) -> Vec<FaceBox> {
        let mut seeds: Vec<FaceBox> = Vec::new();
        let mut members: Vec<Vec<FaceBox>> = Vec::new();

        for c in candidates {
            match seeds.iter().position(|s| s.iou(c) > iou_threshold) {
                Some(i) => members[i].push(*c),
                None => {
                    seeds.push(*c);
                    members.push(vec![*c]);
                }
            }
        }

        members
            .iter()
            .filter(|m| m.len() as u32 >= min_neighbors.max(1))
            .map(|m| mean_box(m))
            .collect()
    }
}

fn mean_box(boxes: &[FaceBox]) -> FaceBox {
    let n = boxes.len() as i64;
    let sum = |f: fn(&FaceBox) -> i32| boxes.iter().map(|b| f(b) as i64).sum::<i64>();
    FaceBox::new(
        (sum(|b| b.x) / n) as i32,
        (sum(|b| b.y) / n) as i32,
        (sum(|b| b.width) / n) as i32,
        (sum(|b| b.height) / n) as i32,
    )
}
