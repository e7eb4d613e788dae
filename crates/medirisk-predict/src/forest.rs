//! Random forest binary classifier
//!
//! CART trees grown on bootstrap samples with Gini impurity and a random
//! subset of candidate features at every node. When none of the drawn
//! features can split a node, the remaining ones are tried before giving up.
//! Trees are stored as flat node arrays so snapshots stay shallow regardless
//! of tree depth.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Minimum impurity decrease a split must achieve
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
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

/// A single classification tree; leaves hold the positive fraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Grower<'a, R> {
    rows: &'a [R],
    labels: &'a [bool],
    max_features: usize,
    params: &'a ForestParams,
    rng: StdRng,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl<R: AsRef<[f64]>> Grower<'_, R> {
    fn value(&self, sample: usize, feature: usize) -> f64 {
        self.rows[sample].as_ref()[feature]
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let total = samples.len();
        let positives = samples.iter().filter(|&&i| self.labels[i]).count();
        let leaf = Node::Leaf {
            value: if total == 0 {
                0.0
            } else {
                positives as f64 / total as f64
            },
        };

        let pure = positives == 0 || positives == total;
        let too_small = total < self.params.min_samples_split;
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || too_small || too_deep {
            return self.push(leaf);
        }

        let parent = gini(positives, total);
        let Some(best) = self.best_split(&samples, parent) else {
            return self.push(leaf);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.value(i, best.feature) <= best.threshold);

        // reserve the slot so children land after their parent
        let index = self.push(leaf);
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        index
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn best_split(&mut self, samples: &[usize], parent: f64) -> Option<BestSplit> {
        let n_features = self.rows[samples[0]].as_ref().len();
        // random visiting order; features past max_features are only
        // examined while no usable split has been found
        let order = rand::seq::index::sample(&mut self.rng, n_features, n_features);

        let total = samples.len();
        let total_pos = samples.iter().filter(|&&i| self.labels[i]).count();
        let mut best: Option<BestSplit> = None;
        let mut column: Vec<(f64, bool)> = Vec::with_capacity(total);

        for (visited, feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            column.clear();
            column.extend(
                samples
                    .iter()
                    .map(|&i| (self.value(i, feature), self.labels[i])),
            );
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0;
            for k in 0..total - 1 {
                if column[k].1 {
                    left_pos += 1;
                }
                let (here, next) = (column[k].0, column[k + 1].0);
                if here == next {
                    continue;
                }
                let left_n = k + 1;
                let right_n = total - left_n;
                let impurity = (left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(total_pos - left_pos, right_n))
                    / total as f64;

                if impurity < parent - MIN_GAIN
                    && best.as_ref().is_none_or(|b| impurity < b.impurity)
                {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    fn fit<R: AsRef<[f64]>>(
        rows: &[R],
        labels: &[bool],
        samples: Vec<usize>,
        max_features: usize,
        params: &ForestParams,
        rng: StdRng,
    ) -> Self {
        let mut grower = Grower {
            rows,
            labels,
            max_features,
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(samples, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Positive fraction of the leaf `row` falls into
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    /// Check a deserialized tree before it is walked
    ///
    /// Children always sit after their parent, which rules out cycles.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::CorruptSnapshot("tree has no nodes".to_string()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { value } => {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ModelError::CorruptSnapshot(format!(
                            "leaf {index} holds {value}"
                        )));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features || !threshold.is_finite() {
                        return Err(ModelError::CorruptSnapshot(format!(
                            "node {index} splits on feature {feature} at {threshold}"
                        )));
                    }
                    for child in [left, right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelError::CorruptSnapshot(format!(
                                "node {index} points to node {child}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

/// Independent RNG stream for one tree
fn tree_rng(seed: u64, tree: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl RandomForest {
    pub fn fit<R: AsRef<[f64]>>(
        params: ForestParams,
        rows: &[R],
        labels: &[bool],
    ) -> Result<Self, ModelError> {
        let first = rows.first().ok_or(ModelError::EmptyDataset)?;
        if rows.len() != labels.len() {
            return Err(ModelError::LabelMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let n_features = first.as_ref().len();
        if let Some(bad) = rows.iter().find(|r| r.as_ref().len() != n_features) {
            return Err(ModelError::DimensionMismatch {
                expected: n_features,
                actual: bad.as_ref().len(),
            });
        }
        if n_features == 0 {
            return Err(ModelError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);
        let n = rows.len();
        let trees = (0..params.n_estimators.max(1))
            .map(|t| {
                let mut rng = tree_rng(params.seed, t);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                DecisionTree::fit(rows, labels, bootstrap, max_features, &params, rng)
            })
            .collect();

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    /// Mean positive-class probability across trees, in `[0, 1]`
    pub fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok((sum / self.trees.len() as f64).clamp(0.0, 1.0))
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if self.n_features == 0 {
            return Err(ModelError::CorruptSnapshot("forest has no features".to_string()));
        }
        self.trees.iter().try_for_each(|t| t.validate(self.n_features))
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn xor_like() -> (Vec<[f64; 2]>, Vec<bool>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = (i % 10) as f64;
            let y = (i / 10) as f64;
            rows.push([x, y]);
            labels.push(x >= 5.0);
        }
        (rows, labels)
    }

    #[test]
    fn test_forest_learns_threshold() {
        let (rows, labels) = xor_like();
        let forest = RandomForest::fit(ForestParams::default(), &rows, &labels).unwrap();
        assert_eq!(forest.trees().len(), 100);
        assert!(forest.predict_proba(&[9.0, 1.0]).unwrap() > 0.8);
        assert!(forest.predict_proba(&[0.0, 1.0]).unwrap() < 0.2);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (rows, labels) = xor_like();
        let params = ForestParams {
            n_estimators: 10,
            ..Default::default()
        };
        let a = RandomForest::fit(params, &rows, &labels).unwrap();
        let b = RandomForest::fit(params, &rows, &labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_gives_constant_leaf() {
        let rows = vec![[1.0], [2.0], [3.0]];
        let labels = vec![true, true, true];
        let forest = RandomForest::fit(ForestParams::default(), &rows, &labels).unwrap();
        assert_eq!(forest.predict_proba(&[100.0]).unwrap(), 1.0);
        assert!(forest.trees().iter().all(|t| t.node_count() == 1));
    }

    #[test]
    fn test_max_depth_is_respected() {
        let (rows, labels) = xor_like();
        let params = ForestParams {
            n_estimators: 5,
            max_depth: Some(1),
            ..Default::default()
        };
        let forest = RandomForest::fit(params, &rows, &labels).unwrap();
        assert!(forest.trees().iter().all(|t| t.depth() <= 1));
    }

    #[test]
    fn test_fit_errors() {
        let rows: Vec<[f64; 2]> = Vec::new();
        assert!(matches!(
            RandomForest::fit(ForestParams::default(), &rows, &[]),
            Err(ModelError::EmptyDataset)
        ));

        let rows = vec![[1.0, 2.0]];
        assert!(matches!(
            RandomForest::fit(ForestParams::default(), &rows, &[true, false]),
            Err(ModelError::LabelMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_wrong_width() {
        let (rows, labels) = xor_like();
        let params = ForestParams {
            n_estimators: 2,
            ..Default::default()
        };
        let forest = RandomForest::fit(params, &rows, &labels).unwrap();
        assert!(forest.predict_proba(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (rows, labels) = xor_like();
        let params = ForestParams {
            n_estimators: 3,
            ..Default::default()
        };
        let forest = RandomForest::fit(params, &rows, &labels).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict_proba(&[7.0, 2.0]).unwrap(), forest.predict_proba(&[7.0, 2.0]).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn probability_is_bounded(
            rows in prop::collection::vec(prop::array::uniform3(-10.0f64..10.0), 2..40),
            flips in prop::collection::vec(any::<bool>(), 40),
            probe in prop::array::uniform3(-20.0f64..20.0),
        ) {
            let labels: Vec<bool> = flips[..rows.len()].to_vec();
            let params = ForestParams { n_estimators: 5, ..Default::default() };
            let forest = RandomForest::fit(params, &rows, &labels).unwrap();
            let p = forest.predict_proba(&probe).unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
