//! Ordered step plan extraction.
//!
//! Every node that obtains units through a method becomes a step. Steps with
//! the same item and method are merged into one, carrying the summed
//! quantity. The merged steps are ordered with Kahn's algorithm so that each
//! step comes after every step producing one of its ingredients; among ready
//! steps the one first reached in post-order goes first.

use crate::error::PlanError;
use crate::id::{ItemId, StepId};
use crate::tree::{AcquisitionTree, ChosenMethod, TreeNode};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One action of a plan: buy, draw from a cooldown, or craft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingStep {
    pub item: ItemId,
    /// Units this step yields for the plan (owned units excluded).
    pub quantity: u64,
    pub method: ChosenMethod,
    /// Recipe executions; zero unless crafted.
    pub crafts: u64,
    /// Ingredient totals consumed, in first-seen order. Empty unless crafted.
    pub ingredients: Vec<(ItemId, u64)>,
}

#[derive(Debug)]
struct StepNode {
    step: CraftingStep,
    /// Index of the step's first appearance in post-order.
    first_seen: usize,
    dependents: Vec<StepId>,
}

/// Steps merged on `(item, method)` plus the edges from ingredient steps
/// to the steps consuming them.
#[derive(Debug, Default)]
struct StepGraph {
    steps: SlotMap<StepId, StepNode>,
    by_key: HashMap<(ItemId, ChosenMethod), StepId>,
    edges: HashSet<(StepId, StepId)>,
}

impl StepGraph {
    /// Post-order walk. Returns the step `node` merged into, if any.
    fn collect(&mut self, node: &TreeNode) -> Option<StepId> {
        let inputs: Vec<StepId> = node
            .children
            .iter()
            .filter_map(|child| self.collect(child))
            .collect();
        if node.remaining() == 0 {
            return None;
        }

        let id = self.merge(node);
        for input in inputs {
            if self.edges.insert((input, id)) {
                self.steps[input].dependents.push(id);
            }
        }
        Some(id)
    }

    fn merge(&mut self, node: &TreeNode) -> StepId {
        let key = (node.item, node.method);
        let id = match self.by_key.get(&key) {
            Some(&id) => id,
            None => {
                let first_seen = self.steps.len();
                let id = self.steps.insert(StepNode {
                    step: CraftingStep {
                        item: node.item,
                        quantity: 0,
                        method: node.method,
                        crafts: 0,
                        ingredients: Vec::new(),
                    },
                    first_seen,
                    dependents: Vec::new(),
                });
                self.by_key.insert(key, id);
                id
            }
        };

        let step = &mut self.steps[id].step;
        step.quantity += node.remaining();
        step.crafts += node.crafts;
        for child in &node.children {
            match step.ingredients.iter_mut().find(|(item, _)| *item == child.item) {
                Some((_, total)) => *total += child.quantity,
                None => step.ingredients.push((child.item, child.quantity)),
            }
        }
        id
    }

    /// Kahn's algorithm, ready steps taken in first-seen order.
    fn into_order(mut self) -> Result<Vec<CraftingStep>, PlanError> {
        let mut in_degree: SecondaryMap<StepId, usize> = SecondaryMap::new();
        for (id, _) in &self.steps {
            in_degree.insert(id, 0);
        }
        for &(_, to) in &self.edges {
            if let Some(deg) = in_degree.get_mut(to) {
                *deg += 1;
            }
        }

        let mut ready: BTreeMap<usize, StepId> = self
            .steps
            .iter()
            .filter(|(id, _)| in_degree[*id] == 0)
            .map(|(id, node)| (node.first_seen, id))
            .collect();

        let mut order = Vec::with_capacity(self.steps.len());
        while let Some((_, id)) = ready.pop_first() {
            order.push(id);
            for &dest in &self.steps[id].dependents {
                if let Some(deg) = in_degree.get_mut(dest) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(self.steps[dest].first_seen, dest);
                    }
                }
            }
        }

        // Leftover steps depend on each other.
        if let Some((_, stuck)) = self
            .steps
            .iter()
            .filter(|(id, _)| in_degree[*id] > 0)
            .min_by_key(|(_, node)| node.first_seen)
        {
            return Err(PlanError::CyclicRecipe(stuck.step.item));
        }

        Ok(order
            .into_iter()
            .filter_map(|id| self.steps.remove(id))
            .map(|node| node.step)
            .collect())
    }
}

/// Flatten a tree into an ordered, deduplicated list of steps. Fully owned
/// nodes produce no step.
pub fn linearize(tree: &AcquisitionTree) -> Result<Vec<CraftingStep>, PlanError> {
    let mut graph = StepGraph::default();
    graph.collect(tree.root());
    graph.into_order()
}
