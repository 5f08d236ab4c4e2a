//! Structured (tree-shaped) BOM collections.
//!
//! Building runs in two phases. Every item is first placed at its dotted
//! position, then parent links are resolved against the finished tree, since
//! a parent row may come after its children.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::collection::Bom;
use crate::dialect::{Dialect, PositionSource};
use crate::diff::{diff_trees, StructuredReport};
use crate::error::{BuildError, DiffError, TreeError};
use crate::item::{attr, Item, ItemId, Placement};
use crate::tree::{AssemblyTree, Branch, TreeCounter, TreePosition};
use crate::value::Value;

/// Extra columns appended to structured rows.
pub const PARENT_COLUMNS: [&str; 2] = ["Parent Item Code", "Parent #"];

/// A collection whose items also form an assembly tree.
#[derive(Debug, Clone)]
pub struct StructuredBom {
    bom: Bom,
    tree: AssemblyTree<ItemId>,
    flattened: Vec<(ItemId, i64)>,
    flat_index: HashMap<Value, usize>,
}

impl StructuredBom {
    /// Wrap a collection without building its tree.
    pub fn from_bom(bom: Bom) -> Self {
        Self {
            bom,
            tree: AssemblyTree::new(),
            flattened: Vec::new(),
            flat_index: HashMap::new(),
        }
    }

    /// Load rows and build the tree.
    pub fn from_rows<I>(
        name: impl Into<String>,
        dialect: Arc<Dialect>,
        rows: I,
    ) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut out = Self::from_bom(Bom::from_rows(name, dialect, rows)?);
        out.build_tree()?;
        Ok(out)
    }

    /// Rebuild from an existing tree, renumbering every position.
    pub fn from_tree(
        name: impl Into<String>,
        dialect: Arc<Dialect>,
        tree: &AssemblyTree<&Item>,
    ) -> Result<Self, BuildError> {
        let nodes = tree
            .iter()
            .map(|(depth, branch)| (depth, branch.value().copied()));
        Self::rebuild(name.into(), dialect, nodes)
    }

    /// Place the trees of `sources` one after another under fresh top-level
    /// positions.
    pub fn concat_tree(dialect: Arc<Dialect>, sources: &[&StructuredBom]) -> Result<Self, BuildError> {
        let name = sources
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" + ");
        let nodes = sources
            .iter()
            .flat_map(|&source| source.iter_tree().map(|(depth, _, item)| (depth, item)));
        Self::rebuild(name, dialect, nodes)
    }

    fn rebuild<'s>(
        name: String,
        dialect: Arc<Dialect>,
        nodes: impl Iterator<Item = (usize, Option<&'s Item>)>,
    ) -> Result<Self, BuildError> {
        let mut bom = Bom::new(name, Arc::clone(&dialect));
        let mut counter = TreeCounter::new(0);
        for (depth, source) in nodes {
            let (position, _) = counter.next(depth as i64)?;
            if let Some(source) = source {
                let mut item = dialect.item_to_item(source);
                item.set(attr::TREE_NUM, Value::text(position));
                bom.append(item);
            }
        }
        let mut out = Self::from_bom(bom);
        out.build_tree()?;
        Ok(out)
    }

    pub fn bom(&self) -> &Bom {
        &self.bom
    }

    pub fn bom_mut(&mut self) -> &mut Bom {
        &mut self.bom
    }

    pub fn name(&self) -> &str {
        self.bom.name()
    }

    pub fn dialect(&self) -> &Arc<Dialect> {
        self.bom.dialect()
    }

    pub fn len(&self) -> usize {
        self.bom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bom.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.bom.get(id)
    }

    pub fn tree(&self) -> &AssemblyTree<ItemId> {
        &self.tree
    }

    pub fn clear_tree(&mut self) {
        self.tree.clear();
        self.flattened.clear();
        self.flat_index.clear();
    }

    /// Place every item in the tree, accumulate the flattened view and link
    /// parents.
    ///
    /// The tree must be empty. On failure the tree is left empty again.
    pub fn build_tree(&mut self) -> Result<(), BuildError> {
        if !self.tree.is_empty() {
            return Err(TreeError::NotCleared {
                name: self.name().to_string(),
            }
            .into());
        }
        let result = self.populate();
        if result.is_err() {
            self.clear_tree();
        }
        result
    }

    fn populate(&mut self) -> Result<(), BuildError> {
        let positions = self.derive_positions()?;

        for (id, position) in positions.iter().enumerate() {
            let key = position.as_string();
            if let Err(err) = self.tree.set_branch(&key, id) {
                return Err(match err {
                    TreeError::DuplicatePosition { position } => {
                        let existing = self
                            .tree
                            .get(&position)
                            .map(|other| self.bom[*other].to_string())
                            .unwrap_or_default();
                        BuildError::DuplicateItem {
                            collection: self.name().to_string(),
                            position,
                            existing,
                            incoming: self.bom[id].to_string(),
                        }
                    }
                    other => other.into(),
                });
            }
            self.bom.items_mut()[id].set_placement(Placement {
                position: key,
                parent_position: position.parent(),
                level: position.level(),
                parent: None,
            });
            self.add_flattened(id);
        }

        for id in 0..self.bom.len() {
            let parent_position = match self.bom[id].placement() {
                Some(p) if !p.parent_position.is_empty() => p.parent_position.clone(),
                _ => continue,
            };
            let parent = self.tree.branch(&parent_position)?.value().copied();
            self.bom.items_mut()[id].set_parent(parent);
        }

        debug!(
            bom = self.name(),
            items = self.bom.len(),
            nodes = self.tree.len(),
            "built assembly tree"
        );
        Ok(())
    }

    /// Positions for every item, in item order.
    ///
    /// Explicit positions are used as given; level-only rows are numbered by a
    /// counter based at the shallowest level; anything else is appended after
    /// the highest top-level index seen.
    fn derive_positions(&self) -> Result<Vec<TreePosition>, TreeError> {
        let items = self.bom.items();
        let levels = self.dialect().positions() == PositionSource::Levels;
        let min_level = items
            .iter()
            .filter_map(|i| i.get(attr::LEVEL).as_int())
            .min()
            .unwrap_or(0);
        let mut counter = TreeCounter::new(min_level);
        let mut max_top = 0;

        let mut derived: Vec<Option<TreePosition>> = Vec::with_capacity(items.len());
        for item in items {
            let explicit = item.text(attr::TREE_NUM);
            let position = if !explicit.trim().is_empty() {
                Some(TreePosition::parse(&explicit)?)
            } else if let (true, Some(level)) = (levels, item.get(attr::LEVEL).as_int()) {
                let (position, _) = counter.next(level)?;
                Some(TreePosition::parse(&position)?)
            } else {
                None
            };
            if let Some(position) = &position {
                max_top = max_top.max(position.top());
            }
            derived.push(position);
        }

        derived
            .into_iter()
            .map(|position| match position {
                Some(position) => Ok(position),
                None => {
                    max_top += 1;
                    TreePosition::parse(&max_top.to_string())
                }
            })
            .collect()
    }

    fn add_flattened(&mut self, id: ItemId) {
        let item = &self.bom[id];
        let quantity = item.quantity();
        match self.flat_index.get(item.identity()) {
            Some(slot) => self.flattened[*slot].1 += quantity,
            None => {
                self.flat_index
                    .insert(item.identity().clone(), self.flattened.len());
                self.flattened.push((id, quantity));
            }
        }
    }

    /// Each distinct item with its quantity summed over every position.
    pub fn flattened(&self) -> impl Iterator<Item = (&Item, i64)> {
        self.flattened.iter().map(|(id, qty)| (&self.bom[*id], *qty))
    }

    /// First flattened entry whose `attribute` equals `key`.
    pub fn find_in_flattened(&self, key: &Value, attribute: &str) -> Option<(&Item, i64)> {
        self.flattened().find(|(item, _)| item.get(attribute) == key)
    }

    /// Branches whose item has `attribute == key`. For `tree_num` the key is
    /// the position itself.
    pub fn get_item(&self, key: &Value, attribute: &str) -> Result<Vec<Branch<'_, ItemId>>, TreeError> {
        if attribute == attr::TREE_NUM {
            return Ok(vec![self.tree.branch(&key.to_string())?]);
        }
        self.bom
            .iter()
            .filter(|item| item.get(attribute) == key)
            .filter_map(Item::position)
            .map(|position| self.tree.branch(position))
            .collect()
    }

    /// Pre-order walk: `(depth, position, item)`.
    pub fn iter_tree(&self) -> impl Iterator<Item = (usize, &str, Option<&Item>)> {
        self.tree.iter().map(move |(depth, branch)| {
            (
                depth,
                branch.position(),
                branch.value().map(|id| &self.bom[*id]),
            )
        })
    }

    /// Tree of the items that have children.
    pub fn assemblies_only(&self) -> Result<AssemblyTree<&Item>, TreeError> {
        let mut out = AssemblyTree::new();
        for (_, branch) in self.tree.iter() {
            if !branch.has_children() {
                continue;
            }
            if let Some(id) = branch.value() {
                out.set_branch(branch.position(), &self.bom[*id])?;
            }
        }
        Ok(out)
    }

    /// Top-level items: the children of the single root when there is exactly
    /// one root, otherwise the roots themselves.
    pub fn top_level_items(&self) -> Vec<&Item> {
        let roots: Vec<Branch<'_, ItemId>> = self.tree.top_level().collect();
        let branches: Vec<Branch<'_, ItemId>> = if roots.len() == 1 {
            roots[0].children().collect()
        } else {
            roots
        };
        branches
            .into_iter()
            .filter_map(|b| b.value().map(|id| &self.bom[*id]))
            .collect()
    }

    fn flat_dialect(&self) -> Arc<Dialect> {
        self.dialect()
            .flat_dialect()
            .cloned()
            .unwrap_or_else(|| Arc::clone(self.dialect()))
    }

    /// Top-level items as a flat collection of the paired flat dialect.
    pub fn top_level(&self) -> Bom {
        let mut bom = Bom::from_items(self.name(), self.flat_dialect(), self.top_level_items());
        bom.copy_settings_from(&self.bom);
        bom
    }

    /// The flattened view as a flat collection, quantities aggregated.
    pub fn flattened_bom(&self) -> Bom {
        let dialect = self.flat_dialect();
        let mut bom = Bom::new(self.name(), Arc::clone(&dialect));
        for (item, quantity) in self.flattened() {
            let mut copy = dialect.item_to_item(item);
            copy.set_quantity(quantity);
            bom.append(copy);
        }
        bom.copy_settings_from(&self.bom);
        bom
    }

    /// Every assembly once, quantities aggregated over the assembly-only
    /// tree, as a flat collection.
    pub fn assemblies_bom(&self) -> Result<Bom, BuildError> {
        let assemblies = self.assemblies_only()?;
        let rebuilt = Self::from_tree(self.name(), Arc::clone(self.dialect()), &assemblies)?;
        let mut bom = rebuilt.flattened_bom();
        bom.copy_settings_from(&self.bom);
        Ok(bom)
    }

    fn row_header(&self) -> Vec<String> {
        let mut header = self.dialect().schema().preparsed_header();
        header.extend(PARENT_COLUMNS.iter().map(|c| c.to_string()));
        header
    }

    /// Header plus one row per item, with parent code and position columns.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let header = self.row_header();
        let names = &header[..header.len() - PARENT_COLUMNS.len()];
        let mut rows = vec![header.clone()];
        for item in self.bom.iter() {
            let mut row = item.to_list(names);
            let parent = item
                .placement()
                .and_then(|p| p.parent.map(|id| (id, p.parent_position.clone())));
            match parent {
                Some((id, position)) => {
                    row.push(self.bom[id].item_code());
                    row.push(position);
                }
                None => row.extend([String::new(), String::new()]),
            }
            rows.push(row);
        }
        rows
    }

    /// The flattened view as rows, renumbered `1..n` at level 1 with
    /// aggregated quantities.
    pub fn flattened_rows(&self) -> Vec<Vec<String>> {
        let header = self.row_header();
        let names = &header[..header.len() - PARENT_COLUMNS.len()];
        let mut rows = vec![header.clone()];
        for (counter, (item, quantity)) in self.flattened().enumerate() {
            let mut copy = item.clone();
            copy.set(attr::TREE_NUM, Value::text((counter + 1).to_string()));
            copy.set(attr::LEVEL, Value::Int(1));
            copy.set_quantity(quantity);
            let mut row = copy.to_list(names);
            row.extend([String::new(), String::new()]);
            rows.push(row);
        }
        rows
    }

    /// Nested export: leaves are item summaries, assemblies are
    /// `[summary, {children}]`.
    pub fn export_tree(&self) -> TreeExport<'_> {
        TreeExport {
            bom: self,
            branches: self.tree.top_level().collect(),
        }
    }

    /// Hierarchical comparison against `other`.
    pub fn diff<'a>(
        &'a self,
        other: &'a StructuredBom,
    ) -> Result<AssemblyTreeDiff<'a>, DiffError> {
        diff_trees(self, other)
    }

    /// [`StructuredBom::diff`] bundled with both collections for rendering.
    pub fn compare<'a>(&'a self, other: &'a StructuredBom) -> Result<StructuredReport<'a>, DiffError> {
        Ok(StructuredReport {
            left: self,
            right: other,
            tree: self.diff(other)?,
        })
    }
}

/// Result tree of [`StructuredBom::diff`].
pub type AssemblyTreeDiff<'a> = AssemblyTree<crate::diff::AssemblyDiff<'a>>;

impl std::ops::Index<ItemId> for StructuredBom {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Item {
        &self.bom[id]
    }
}

/// Serializable, order-preserving view of an assembly tree.
pub struct TreeExport<'a> {
    bom: &'a StructuredBom,
    branches: Vec<Branch<'a, ItemId>>,
}

struct ExportNode<'a> {
    bom: &'a StructuredBom,
    branch: Branch<'a, ItemId>,
}

impl Serialize for TreeExport<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.branches.len()))?;
        for branch in &self.branches {
            map.serialize_entry(
                branch.position(),
                &ExportNode {
                    bom: self.bom,
                    branch: *branch,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for ExportNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let summary = self
            .branch
            .value()
            .map(|id| self.bom[*id].summary())
            .unwrap_or_default();
        if !self.branch.has_children() {
            return serializer.serialize_str(&summary);
        }
        let children = TreeExport {
            bom: self.bom,
            branches: self.branch.children().collect(),
        };
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&summary)?;
        tuple.serialize_element(&children)?;
        tuple.end()
    }
}
