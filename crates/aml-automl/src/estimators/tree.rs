//! CART classification tree with Gini impurity.
//!
//! Nodes are stored in a flat vector and refer to their children by index,
//! with the root at position 0.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};
use rkyv::{Archive, Deserialize, Serialize};

use super::{argmax, distinct_classes};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        class: i64,
    },
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl DecisionTree {
    pub fn fit(x: &Array2<f64>, y: &[i64], max_depth: u32, min_samples_leaf: u32) -> Self {
        let classes = distinct_classes(y);
        let codes: Vec<usize> = y
            .iter()
            .map(|c| classes.binary_search(c).unwrap_or(0))
            .collect();

        let mut builder = Builder {
            x,
            codes: &codes,
            classes: &classes,
            max_depth,
            min_leaf: usize::try_from(min_samples_leaf).unwrap_or(1).max(1),
            nodes: Vec::new(),
        };
        builder.build((0..y.len()).collect(), 0);

        tracing::trace!(nodes = builder.nodes.len(), "grew decision tree");
        Self {
            nodes: builder.nodes,
            n_features: x.ncols(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> i64 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { class }) => return *class,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = usize::try_from(*feature).ok().and_then(|f| row.get(f)).copied();
                    let next = if value.is_some_and(|v| v <= *threshold) { left } else { right };
                    idx = usize::try_from(*next).unwrap_or(usize::MAX);
                }
                None => return 0,
            }
        }
    }
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    codes: &'a [usize],
    classes: &'a [i64],
    max_depth: u32,
    min_leaf: usize,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

#[allow(clippy::cast_precision_loss)]
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

impl Builder<'_> {
    fn counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[self.codes[i]] += 1;
        }
        counts
    }

    fn push(&mut self, node: Node) -> u32 {
        self.nodes.push(node);
        u32::try_from(self.nodes.len() - 1).unwrap_or(u32::MAX)
    }

    fn build(&mut self, indices: Vec<usize>, depth: u32) -> u32 {
        let counts = self.counts(&indices);
        #[allow(clippy::cast_precision_loss)]
        let as_scores: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        let majority = self.classes[argmax(&as_scores)];

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure || depth >= self.max_depth || indices.len() < 2 * self.min_leaf {
            return self.push(Node::Leaf { class: majority });
        }

        let parent = gini(&counts, indices.len());
        let Some(best) = self.best_split(&indices, &counts) else {
            return self.push(Node::Leaf { class: majority });
        };
        if best.impurity >= parent - 1e-12 {
            return self.push(Node::Leaf { class: majority });
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[[i, best.feature]] <= best.threshold);

        // Reserve this node's slot before the children take theirs.
        let slot = self.push(Node::Leaf { class: majority });
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        if let Some(node) = usize::try_from(slot).ok().and_then(|s| self.nodes.get_mut(s)) {
            *node = Node::Split {
                feature: u32::try_from(best.feature).unwrap_or(u32::MAX),
                threshold: best.threshold,
                left,
                right,
            };
        }
        slot
    }

    #[allow(clippy::cast_precision_loss)]
    fn best_split(&self, indices: &[usize], totals: &[usize]) -> Option<BestSplit> {
        let n = indices.len();
        let mut best: Option<BestSplit> = None;

        for feature in 0..self.x.ncols() {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                self.x[[a, feature]]
                    .partial_cmp(&self.x[[b, feature]])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left = vec![0usize; totals.len()];
            for pos in 1..n {
                left[self.codes[sorted[pos - 1]]] += 1;
                let lo = self.x[[sorted[pos - 1], feature]];
                let hi = self.x[[sorted[pos], feature]];
                if pos < self.min_leaf || n - pos < self.min_leaf || lo >= hi {
                    continue;
                }
                let right: Vec<usize> = totals.iter().zip(&left).map(|(t, l)| t - l).collect();
                let impurity = (pos as f64 * gini(&left, pos) + (n - pos) as f64 * gini(&right, n - pos)) / n as f64;
                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (lo + hi) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let tree = DecisionTree::fit(&x, &y, 5, 1);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict(&array![[6.4], [6.6]]), vec![0, 1]);
    }

    #[test]
    fn test_depth_zero_is_majority_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let tree = DecisionTree::fit(&x, &[4, 4, 9], 0, 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&x), vec![4, 4, 4]);
    }

    #[test]
    fn test_min_samples_leaf_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0, 1, 0, 1];
        let tree = DecisionTree::fit(&x, &y, 10, 2);
        assert!(tree.node_count() <= 3);
    }

    #[test]
    fn test_xor_needs_depth_two() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = [0, 1, 1, 0];
        let tree = DecisionTree::fit(&x, &y, 1, 1);
        // A single split cannot reduce XOR impurity.
        assert_eq!(tree.node_count(), 1);
    }
}
