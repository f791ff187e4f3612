//! Random forest regression
//!
//! Bagged CART trees with variance-reduction splits. Each tree draws its
//! bootstrap sample and feature order from its own `ChaCha8Rng` seeded with
//! `seed + tree_index`, so a forest is reproducible regardless of how rayon
//! schedules the fits.

use super::linalg;
use super::{ModelKind, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Single regression tree stored as a flat node arena
#[derive(Debug, Clone)]
pub struct RegressionTree {
    config: TreeConfig,
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    /// Grow the tree on the given sample rows (duplicates allowed)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: Vec<usize>, rng: &mut ChaCha8Rng) {
        self.nodes.clear();
        self.grow(x, y, rows, 0, rng);
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let n = rows.len();
        let sum: f64 = rows.iter().map(|&i| y[i]).sum();
        let mean = sum / n as f64;
        let sse: f64 = rows.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let at_depth_limit = self.config.max_depth.is_some_and(|d| depth >= d);
        if at_depth_limit || n < self.config.min_samples_split || sse <= 1e-12 {
            return self.push(Node::Leaf { value: mean });
        }

        let Some(split) = self.best_split(x, y, &rows, rng) else {
            return self.push(Node::Leaf { value: mean });
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);

        // reserve the slot so children land after their parent
        let id = self.push(Node::Leaf { value: mean });
        let left = self.grow(x, y, left_rows, depth + 1, rng);
        let right = self.grow(x, y, right_rows, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Lowest total squared error split over every feature
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.config.min_samples_leaf.max(1);
        let n = rows.len();

        let mut features: Vec<usize> = (0..x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature in features {
            sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let total: f64 = sorted.iter().map(|&i| y[i]).sum();
            let total_sq: f64 = sorted.iter().map(|&i| y[i] * y[i]).sum();
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 1..n {
                let prev = sorted[k - 1];
                left_sum += y[prev];
                left_sq += y[prev] * y[prev];

                let lo = x[[prev, feature]];
                let hi = x[[sorted[k], feature]];
                if lo >= hi || k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let n_left = k as f64;
                let n_right = (n - k) as f64;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    let mut threshold = (lo + hi) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        sse,
                    });
                }
            }
        }

        best
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Averaged ensemble of bootstrap trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_trees: usize,
    seed: u64,
    tree_config: TreeConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            tree_config: TreeConfig::default(),
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_tree_config(mut self, config: TreeConfig) -> Self {
        self.tree_config = config;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        linalg::check_shapes(x, y)?;
        if self.n_trees == 0 {
            return Err(ForecastError::Internal("forest needs at least one tree".into()));
        }
        let n = x.nrows();
        let config = self.tree_config;
        let seed = self.seed;

        let trees: Vec<RegressionTree> = (0..self.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                let mut tree = RegressionTree::new(config);
                tree.fit(x, y, sample, &mut rng);
                tree
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            rows = n,
            cols = x.ncols(),
            seed,
            "Fitted random forest"
        );

        self.n_features = x.ncols();
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ForecastError::NotFitted(ModelKind::RandomForest.id()));
        }
        if x.ncols() != self.n_features {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        let count = self.trees.len() as f64;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / count)
            .collect())
    }

    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }
}
