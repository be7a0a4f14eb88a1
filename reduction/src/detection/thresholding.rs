//! Seed thresholding and connected component labeling.

use ndarray::{Array2, ArrayView2};

/// Bounding box of a labeled region, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Topmost row of the region
    pub min_row: usize,
    /// Leftmost column of the region
    pub min_col: usize,
    /// Bottommost row of the region
    pub max_row: usize,
    /// Rightmost column of the region
    pub max_col: usize,
}

impl BoundingBox {
    fn seed(row: usize, col: usize) -> Self {
        Self {
            min_row: row,
            min_col: col,
            max_row: row,
            max_col: col,
        }
    }

    fn include(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }
}

/// Binary seed mask: true where `image` strictly exceeds `threshold`.
pub fn apply_threshold(image: &ArrayView2<f64>, threshold: f64) -> Array2<bool> {
    image.mapv(|v| v > threshold)
}

/// Label 8-connected components of a binary mask.
///
/// Returns the label image (0 = background, labels start at 1) together with
/// one bounding box per label, indexed by `label - 1`. Boxes are accumulated
/// during the flood fill, so the whole pass is a single image traversal.
pub fn connected_components(mask: &ArrayView2<bool>) -> (Array2<u32>, Vec<BoundingBox>) {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut bboxes = Vec::new();

    let neighbors = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    let mut stack = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] || labels[[i, j]] != 0 {
                continue;
            }

            let label = bboxes.len() as u32 + 1;
            let mut bbox = BoundingBox::seed(i, j);
            stack.push((i, j));

            while let Some((y, x)) = stack.pop() {
                if labels[[y, x]] != 0 {
                    continue;
                }
                labels[[y, x]] = label;
                bbox.include(y, x);

                for &(dy, dx) in &neighbors {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny >= 0 && ny < rows as isize && nx >= 0 && nx < cols as isize {
                        let (ny, nx) = (ny as usize, nx as usize);
                        if mask[[ny, nx]] && labels[[ny, nx]] == 0 {
                            stack.push((ny, nx));
                        }
                    }
                }
            }

            bboxes.push(bbox);
        }
    }

    (labels, bboxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_threshold_is_strict() {
        let image = arr2(&[[0.1, 0.5], [0.8, 0.5]]);
        let mask = apply_threshold(&image.view(), 0.5);

        assert!(!mask[[0, 0]]);
        assert!(!mask[[0, 1]]);
        assert!(mask[[1, 0]]);
        assert!(!mask[[1, 1]]);
    }

    #[test]
    fn test_two_components_with_boxes() {
        let mask = arr2(&[
            [false, true, true, false],
            [false, true, false, false],
            [false, false, false, true],
            [false, false, true, true],
        ]);

        let (labels, bboxes) = connected_components(&mask.view());
        assert_eq!(bboxes.len(), 2);

        // Pixels of the first blob share a label.
        assert_eq!(labels[[0, 1]], labels[[0, 2]]);
        assert_eq!(labels[[0, 1]], labels[[1, 1]]);
        assert_ne!(labels[[0, 1]], labels[[2, 3]]);

        assert_eq!(
            bboxes[0],
            BoundingBox {
                min_row: 0,
                min_col: 1,
                max_row: 1,
                max_col: 2
            }
        );
        assert_eq!(
            bboxes[1],
            BoundingBox {
                min_row: 2,
                min_col: 2,
                max_row: 3,
                max_col: 3
            }
        );
    }

    #[test]
    fn test_diagonal_pixels_are_one_component() {
        let mask = arr2(&[[true, false], [false, true]]);
        let (_, bboxes) = connected_components(&mask.view());
        assert_eq!(bboxes.len(), 1);
    }

    #[test]
    fn test_empty_mask_yields_no_components() {
        let mask = Array2::from_elem((5, 5), false);
        let (labels, bboxes) = connected_components(&mask.view());
        assert!(bboxes.is_empty());
        assert!(labels.iter().all(|&l| l == 0));
    }
}
