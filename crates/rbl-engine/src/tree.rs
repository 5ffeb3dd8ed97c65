//! Builds an allocation tree from category paths.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::AllocationError;
use crate::node::RebalanceNode;
use crate::receiver::Receiver;
use crate::taxonomy::WeightType;

/// Category weight relative to its siblings.
pub type WeightMap = BTreeMap<WeightType, f64>;

/// Weight for a category the weight map does not mention.
pub const DEFAULT_WEIGHT: f64 = 1.0;

pub struct TreeBuilder<'a> {
    root: RebalanceNode<'a>,
    weights: Option<WeightMap>,
}

impl<'a> TreeBuilder<'a> {
    /// Without a weight map every category gets [`DEFAULT_WEIGHT`].
    pub fn new(weights: Option<WeightMap>) -> Self {
        Self {
            root: RebalanceNode::root(),
            weights,
        }
    }

    pub fn weight_of(&self, category: WeightType) -> f64 {
        match self.weights.as_ref().and_then(|w| w.get(&category)) {
            Some(weight) => *weight,
            None => {
                debug!(category = %category, weight = DEFAULT_WEIGHT, "tree/default_weight");
                DEFAULT_WEIGHT
            }
        }
    }

    /// Attach `receiver` under `path`, creating nodes as needed.
    ///
    /// `path` lists categories from just below `All` down to the holding's
    /// own category; a leading `All` is accepted and ignored.  Each step must
    /// roll up into the one before it.  An empty path attaches to the root.
    pub fn place(
        &mut self,
        path: &[WeightType],
        receiver: &'a mut dyn Receiver,
    ) -> Result<(), AllocationError> {
        let path = match path.split_first() {
            Some((WeightType::All, rest)) => rest,
            _ => path,
        };

        let mut parent = WeightType::All;
        for &category in path {
            if !category.rolls_up_into(parent) {
                return Err(AllocationError::TaxonomyMismatch {
                    parent,
                    child: category,
                });
            }
            parent = category;
        }

        let weights: Vec<f64> = path.iter().map(|c| self.weight_of(*c)).collect();
        let mut node = &mut self.root;
        for (&category, weight) in path.iter().zip(weights) {
            node = node.add_child(RebalanceNode::new(category, weight));
        }
        node.add_leaf(receiver);
        Ok(())
    }

    pub fn finish(mut self) -> RebalanceNode<'a> {
        self.root.refresh_values();
        self.root
    }
}
