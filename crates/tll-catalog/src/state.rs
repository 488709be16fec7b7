use std::collections::BTreeMap;

use tll_types::ToolId;

use crate::error::{CatalogError, CatalogResult};
use crate::tool::{required, Tool, ToolDraft, ToolPatch};

/// The catalog: every tool the pool owns, keyed by id, plus the counter
/// that assigns new ids.
///
/// This is plain state with no lock of its own. The ledger engine owns one
/// instance behind its state lock, which is what makes reads consistent and
/// quantity changes atomic with transaction-log appends.
#[derive(Debug, Clone)]
pub struct CatalogState {
    tools: BTreeMap<ToolId, Tool>,
    next_id: u64,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tool from a draft, assigning the next id.
    ///
    /// `name` and `category` must be non-empty after trimming. The new tool
    /// starts with every unit on the shelf.
    pub fn create(&mut self, draft: ToolDraft) -> CatalogResult<Tool> {
        let tool = self.prepare(draft)?;
        self.tools.insert(tool.id, tool.clone());
        Ok(tool)
    }

    /// Validate a draft and assign it the next id without storing it.
    ///
    /// The id is consumed either way, so callers that durably record the
    /// tool before inserting it (via [`CatalogState::restore`]) never hand
    /// the same id to two tools. A prepared tool that is never inserted
    /// leaves a gap in the id sequence, which is harmless.
    pub fn prepare(&mut self, draft: ToolDraft) -> CatalogResult<Tool> {
        let name = required("name", &draft.name)?;
        let category = required("category", &draft.category)?;

        let id = ToolId::new(self.next_id);
        self.next_id += 1;
        Ok(Tool {
            id,
            name,
            category,
            condition: draft.condition,
            total_quantity: draft.total_quantity,
            available_quantity: draft.total_quantity,
            location: draft.location.trim().to_string(),
        })
    }

    pub fn get(&self, id: ToolId) -> CatalogResult<&Tool> {
        self.tools.get(&id).ok_or(CatalogError::NotFound(id))
    }

    /// All tools in id order.
    pub fn list(&self) -> Vec<Tool> {
        self.tools.values().cloned().collect()
    }

    /// Case-insensitive substring match against name or category.
    /// An empty keyword matches every tool.
    pub fn search(&self, keyword: &str) -> Vec<Tool> {
        let needle = keyword.trim().to_lowercase();
        self.tools
            .values()
            .filter(|tool| {
                tool.name.to_lowercase().contains(&needle)
                    || tool.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Apply a partial update and return the updated tool.
    ///
    /// Every supplied field is validated before the record is touched, so a
    /// bad patch leaves the tool exactly as it was. A supplied
    /// `total_quantity` preserves the lent-out count and fails if it would
    /// drop below it.
    pub fn update(&mut self, id: ToolId, patch: &ToolPatch) -> CatalogResult<Tool> {
        let tool = self.tools.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        patch.apply_to(tool)?;
        Ok(tool.clone())
    }

    /// Remove a tool and return the removed record.
    ///
    /// This is the raw primitive; the ledger engine refuses it while open
    /// loans reference the id, which this leaf cannot see.
    pub fn delete(&mut self, id: ToolId) -> CatalogResult<Tool> {
        self.tools.remove(&id).ok_or(CatalogError::NotFound(id))
    }

    /// Apply a signed delta to `available_quantity`, holding it within
    /// `0..=total_quantity`. The only mutation path borrow/return uses.
    pub fn adjust_available(&mut self, id: ToolId, delta: i64) -> CatalogResult<Tool> {
        let tool = self.tools.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        let next = i64::from(tool.available_quantity) + delta;
        if next < 0 || next > i64::from(tool.total_quantity) {
            return Err(CatalogError::QuantityOutOfRange {
                id,
                available: tool.available_quantity,
                total: tool.total_quantity,
                delta,
            });
        }
        tool.available_quantity = next as u32;
        Ok(tool.clone())
    }

    /// Recovery-only insert that keeps a recorded id and advances the
    /// counter past it, so replayed catalogs never hand the id out again.
    pub fn restore(&mut self, tool: Tool) -> CatalogResult<()> {
        if self.tools.contains_key(&tool.id) {
            return Err(CatalogError::DuplicateId(tool.id));
        }
        self.next_id = self.next_id.max(tool.id.as_u64() + 1);
        self.tools.insert(tool.id, tool);
        Ok(())
    }

    /// Drop every record. The id counter is not rewound: an id handed out
    /// before a wipe is never reissued after it.
    pub fn clear(&mut self) {
        self.tools.clear();
    }

    /// The id the next created tool will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Move the id counter to at least `next`. The counter only ever moves
    /// forward; a smaller value is ignored.
    pub fn advance_next_id(&mut self, next: u64) {
        self.next_id = self.next_id.max(next);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            tools: BTreeMap::new(),
            next_id: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tll_types::{Condition, ToolStatus};

    fn draft(name: &str, category: &str, total: u32) -> ToolDraft {
        ToolDraft {
            name: name.into(),
            category: category.into(),
            condition: Condition::Good,
            total_quantity: total,
            location: "Shelf A".into(),
        }
    }

    // ---- creation ----

    #[test]
    fn create_assigns_sequential_ids() {
        let mut catalog = CatalogState::new();
        let first = catalog.create(draft("Hammer", "Hand Tools", 2)).unwrap();
        let second = catalog.create(draft("Drill", "Power Tools", 1)).unwrap();

        assert_eq!(first.id, ToolId::new(1));
        assert_eq!(second.id, ToolId::new(2));
    }

    #[test]
    fn create_starts_fully_available() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 3)).unwrap();

        assert_eq!(tool.total_quantity, 3);
        assert_eq!(tool.available_quantity, 3);
        assert_eq!(tool.status(), ToolStatus::Available);
    }

    #[test]
    fn create_trims_stored_fields() {
        let mut catalog = CatalogState::new();
        let tool = catalog
            .create(draft("  Hammer  ", " Hand Tools ", 1))
            .unwrap();

        assert_eq!(tool.name, "Hammer");
        assert_eq!(tool.category, "Hand Tools");
    }

    #[test]
    fn create_rejects_blank_required_fields() {
        let mut catalog = CatalogState::new();

        let error = catalog.create(draft("   ", "Hand Tools", 1)).unwrap_err();
        assert_eq!(error, CatalogError::EmptyField { field: "name" });

        let error = catalog.create(draft("Hammer", "", 1)).unwrap_err();
        assert_eq!(error, CatalogError::EmptyField { field: "category" });

        assert!(catalog.is_empty());
    }

    #[test]
    fn zero_total_is_a_valid_tool() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Retired Saw", "Saws", 0)).unwrap();

        assert_eq!(tool.available_quantity, 0);
        assert_eq!(tool.status(), ToolStatus::Unavailable);
    }

    #[test]
    fn ids_are_never_reused_after_delete() {
        let mut catalog = CatalogState::new();
        let first = catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();
        catalog.delete(first.id).unwrap();

        let second = catalog.create(draft("Drill", "Power Tools", 1)).unwrap();
        assert_eq!(second.id, ToolId::new(2));
    }

    // ---- reads ----

    #[test]
    fn get_unknown_id_is_not_found() {
        let catalog = CatalogState::new();
        let error = catalog.get(ToolId::new(404)).unwrap_err();
        assert_eq!(error, CatalogError::NotFound(ToolId::new(404)));
    }

    #[test]
    fn list_is_ordered_by_id() {
        let mut catalog = CatalogState::new();
        catalog.create(draft("Wrench", "Hand Tools", 1)).unwrap();
        catalog.create(draft("Drill", "Power Tools", 1)).unwrap();
        catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();

        let ids: Vec<_> = catalog.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![ToolId::new(1), ToolId::new(2), ToolId::new(3)]);
    }

    #[test]
    fn search_matches_name_and_category_case_insensitively() {
        let mut catalog = CatalogState::new();
        catalog.create(draft("Claw Hammer", "Hand Tools", 1)).unwrap();
        catalog.create(draft("Drill", "Power Tools", 1)).unwrap();
        catalog.create(draft("Sledgehammer", "Demolition", 1)).unwrap();

        let by_name = catalog.search("hammer");
        assert_eq!(by_name.len(), 2);

        let by_category = catalog.search("POWER");
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].name, "Drill");
    }

    #[test]
    fn search_with_empty_keyword_matches_everything() {
        let mut catalog = CatalogState::new();
        catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();
        catalog.create(draft("Drill", "Power Tools", 1)).unwrap();

        assert_eq!(catalog.search("").len(), 2);
        assert_eq!(catalog.search("   ").len(), 2);
    }

    // ---- updates ----

    #[test]
    fn update_changes_only_supplied_fields() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 2)).unwrap();

        let updated = catalog
            .update(
                tool.id,
                &ToolPatch {
                    condition: Some(Condition::Fair),
                    location: Some("Shelf B".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.condition, Condition::Fair);
        assert_eq!(updated.location, "Shelf B");
        assert_eq!(updated.name, "Hammer");
        assert_eq!(updated.total_quantity, 2);
    }

    #[test]
    fn update_rejects_blank_supplied_name() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 2)).unwrap();

        let error = catalog
            .update(
                tool.id,
                &ToolPatch {
                    name: Some("  ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(error, CatalogError::EmptyField { field: "name" });

        // The record is untouched.
        assert_eq!(catalog.get(tool.id).unwrap().name, "Hammer");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut catalog = CatalogState::new();
        let error = catalog
            .update(ToolId::new(9), &ToolPatch::default())
            .unwrap_err();
        assert_eq!(error, CatalogError::NotFound(ToolId::new(9)));
    }

    #[test]
    fn raising_total_raises_available_by_the_same_amount() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 2)).unwrap();
        catalog.adjust_available(tool.id, -1).unwrap();

        let updated = catalog
            .update(
                tool.id,
                &ToolPatch {
                    total_quantity: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();

        // One unit is still out; the rest of the new total is on the shelf.
        assert_eq!(updated.total_quantity, 5);
        assert_eq!(updated.available_quantity, 4);
        assert_eq!(updated.lent_out(), 1);
    }

    #[test]
    fn lowering_total_below_lent_out_is_rejected() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 3)).unwrap();
        catalog.adjust_available(tool.id, -2).unwrap();

        let error = catalog
            .update(
                tool.id,
                &ToolPatch {
                    total_quantity: Some(1),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert_eq!(
            error,
            CatalogError::TotalBelowLentOut {
                id: tool.id,
                requested: 1,
                lent_out: 2,
            }
        );
        assert_eq!(catalog.get(tool.id).unwrap().total_quantity, 3);
    }

    #[test]
    fn lowering_total_to_exactly_lent_out_empties_the_shelf() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 3)).unwrap();
        catalog.adjust_available(tool.id, -2).unwrap();

        let updated = catalog
            .update(
                tool.id,
                &ToolPatch {
                    total_quantity: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.available_quantity, 0);
        assert_eq!(updated.status(), ToolStatus::Unavailable);
    }

    // ---- availability adjustments ----

    #[test]
    fn adjust_available_moves_within_bounds() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 2)).unwrap();

        let after_borrow = catalog.adjust_available(tool.id, -1).unwrap();
        assert_eq!(after_borrow.available_quantity, 1);

        let after_return = catalog.adjust_available(tool.id, 1).unwrap();
        assert_eq!(after_return.available_quantity, 2);
    }

    #[test]
    fn adjust_below_zero_is_rejected() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();
        catalog.adjust_available(tool.id, -1).unwrap();

        let error = catalog.adjust_available(tool.id, -1).unwrap_err();
        assert_eq!(
            error,
            CatalogError::QuantityOutOfRange {
                id: tool.id,
                available: 0,
                total: 1,
                delta: -1,
            }
        );
    }

    #[test]
    fn adjust_above_total_is_rejected() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();

        let error = catalog.adjust_available(tool.id, 1).unwrap_err();
        assert_eq!(
            error,
            CatalogError::QuantityOutOfRange {
                id: tool.id,
                available: 1,
                total: 1,
                delta: 1,
            }
        );
    }

    // ---- recovery and clearing ----

    #[test]
    fn restore_keeps_id_and_advances_counter() {
        let mut catalog = CatalogState::new();
        catalog
            .restore(Tool {
                id: ToolId::new(7),
                name: "Hammer".into(),
                category: "Hand Tools".into(),
                condition: Condition::Good,
                total_quantity: 2,
                available_quantity: 1,
                location: String::new(),
            })
            .unwrap();

        assert_eq!(catalog.get(ToolId::new(7)).unwrap().name, "Hammer");

        let fresh = catalog.create(draft("Drill", "Power Tools", 1)).unwrap();
        assert_eq!(fresh.id, ToolId::new(8));
    }

    #[test]
    fn restore_rejects_duplicate_ids() {
        let mut catalog = CatalogState::new();
        let tool = catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();

        let error = catalog.restore(tool.clone()).unwrap_err();
        assert_eq!(error, CatalogError::DuplicateId(tool.id));
    }

    #[test]
    fn clear_keeps_the_id_counter_moving_forward() {
        let mut catalog = CatalogState::new();
        catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();
        catalog.create(draft("Drill", "Power Tools", 1)).unwrap();

        catalog.clear();
        assert!(catalog.is_empty());

        // Ids handed out before the wipe are never reissued after it.
        let fresh = catalog.create(draft("Wrench", "Hand Tools", 1)).unwrap();
        assert_eq!(fresh.id, ToolId::new(3));
    }

    #[test]
    fn advance_next_id_never_rewinds() {
        let mut catalog = CatalogState::new();
        catalog.advance_next_id(5);
        assert_eq!(catalog.next_id(), 5);

        catalog.advance_next_id(2);
        assert_eq!(catalog.next_id(), 5);

        let fresh = catalog.create(draft("Hammer", "Hand Tools", 1)).unwrap();
        assert_eq!(fresh.id, ToolId::new(5));
    }
}
