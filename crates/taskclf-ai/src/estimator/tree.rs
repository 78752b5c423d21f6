//! CART decision tree with Gini impurity.

use serde::{Deserialize, Serialize};
use taskclf_core::EstimatorConfig;

use super::{Estimator, argmax};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        class: usize,
        samples: usize,
    },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Depth-capped binary classification tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    max_depth: usize,
    min_samples_split: usize,
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            nodes: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Depth of the deepest leaf; a lone root leaf has depth 0.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        rows: &[usize],
        depth: usize,
    ) -> usize {
        let counts = class_counts(y, rows, n_classes);
        let majority = argmax(&counts);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            class: majority,
            samples: rows.len(),
        });

        let pure = counts[majority] == rows.len();
        if pure || depth >= self.max_depth || rows.len() < self.min_samples_split {
            return id;
        }

        let Some((feature, threshold)) = best_split(x, y, n_classes, rows, &counts) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().copied().partition(|&r| x[r][feature] <= threshold);
        let left = self.grow(x, y, n_classes, &left_rows, depth + 1);
        let right = self.grow(x, y, n_classes, &right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }
}

fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &r in rows {
        counts[y[r]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

/// Best `(feature, threshold)` by weighted Gini, scanning features in order
/// and thresholds at midpoints between distinct sorted values. Earlier
/// candidates win ties. A zero-gain split is still taken; only a node whose
/// rows are identical on every feature has no split.
fn best_split(
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    rows: &[usize],
    counts: &[usize],
) -> Option<(usize, f64)> {
    let n = rows.len();
    let n_features = x[rows[0]].len();
    let mut best_score = f64::INFINITY;
    let mut best = None;

    let mut order = rows.to_vec();
    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]).then(a.cmp(&b)));

        let mut left = vec![0usize; n_classes];
        let mut right = counts.to_vec();
        for pos in 1..n {
            let moved = order[pos - 1];
            left[y[moved]] += 1;
            right[y[moved]] -= 1;

            let lo = x[moved][feature];
            let hi = x[order[pos]][feature];
            if lo == hi {
                continue;
            }

            let score = (pos as f64 * gini(&left, pos) + (n - pos) as f64 * gini(&right, n - pos))
                / n as f64;
            if score < best_score {
                best_score = score;
                best = Some((feature, lo + (hi - lo) / 2.0));
            }
        }
    }
    best
}

impl Estimator for DecisionTree {
    fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) {
        self.nodes.clear();
        if x.is_empty() || n_classes == 0 {
            self.nodes.push(Node::Leaf {
                class: 0,
                samples: 0,
            });
            return;
        }
        let rows: Vec<usize> = (0..x.len()).collect();
        self.grow(x, y, n_classes, &rows, 0);
    }

    fn predict(&self, x: &[f64]) -> usize {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { class, .. }) => return *class,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if x.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(max_depth: usize) -> DecisionTree {
        DecisionTree::new(&EstimatorConfig {
            max_depth,
            ..Default::default()
        })
    }

    #[test]
    fn learns_threshold_on_one_feature() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0], vec![12.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut t = tree(8);
        t.fit(&x, &y, 2);
        assert_eq!(t.depth(), 1);
        match t.nodes()[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(feature, 0);
                assert!((threshold - 6.5).abs() < 1e-12);
            }
            ref other => panic!("expected root split, got {other:?}"),
        }
        assert_eq!(t.predict(&[0.0]), 0);
        assert_eq!(t.predict(&[100.0]), 1);
    }

    #[test]
    fn learns_xor_with_depth_two() {
        let x = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let y = vec![0, 1, 1, 0, 0, 1, 1, 0];
        let mut t = tree(8);
        t.fit(&x, &y, 2);
        for (row, &class) in x.iter().zip(&y) {
            assert_eq!(t.predict(row), class);
        }
    }

    #[test]
    fn depth_cap_is_respected() {
        let x: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..64).map(|i| i % 2).collect();
        let mut t = tree(3);
        t.fit(&x, &y, 2);
        assert!(t.depth() <= 3);
    }

    #[test]
    fn pure_node_stays_a_leaf() {
        let mut t = tree(8);
        t.fit(&[vec![1.0], vec![2.0]], &[1, 1], 2);
        assert_eq!(t.nodes().len(), 1);
        assert_eq!(t.predict(&[5.0]), 1);
    }

    #[test]
    fn identical_rows_cannot_split() {
        let mut t = tree(8);
        t.fit(&[vec![1.0], vec![1.0], vec![1.0]], &[0, 1, 1], 2);
        assert_eq!(t.nodes().len(), 1);
        assert_eq!(t.predict(&[1.0]), 1);
    }
}
