use serde::{Deserialize, Serialize};

use tll_types::{Condition, ToolId, ToolStatus};

use crate::error::{CatalogError, CatalogResult};

/// A catalog entry for one kind of tool.
///
/// `available_quantity` is the number of units on the shelf right now;
/// `total_quantity` is the number the pool owns. The difference is the
/// number of units currently lent out. Availability status is derived,
/// never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
    pub category: String,
    pub condition: Condition,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub location: String,
}

impl Tool {
    /// Derived availability status.
    pub fn status(&self) -> ToolStatus {
        ToolStatus::from_available(self.available_quantity)
    }

    /// Units currently out on loan.
    pub fn lent_out(&self) -> u32 {
        self.total_quantity - self.available_quantity
    }
}

/// Input for creating a tool. The catalog assigns the id and initializes
/// `available_quantity = total_quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDraft {
    pub name: String,
    pub category: String,
    pub condition: Condition,
    pub total_quantity: u32,
    pub location: String,
}

/// Partial update for a tool. Absent fields are left unchanged; each
/// supplied field is validated on its own.
///
/// There is deliberately no `available_quantity` field: availability is
/// derived state, kept in step by borrow/return. Supplying `total_quantity`
/// is the administrative correction path and preserves the lent-out count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub condition: Option<Condition>,
    pub total_quantity: Option<u32>,
    pub location: Option<String>,
}

impl ToolPatch {
    /// Returns `true` if no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.condition.is_none()
            && self.total_quantity.is_none()
            && self.location.is_none()
    }

    /// Validate and apply this patch to a tool.
    ///
    /// Every supplied field is validated before any of them is assigned,
    /// so a failed patch leaves the tool exactly as it was.
    pub fn apply_to(&self, tool: &mut Tool) -> CatalogResult<()> {
        let name = self
            .name
            .as_deref()
            .map(|value| required("name", value))
            .transpose()?;
        let category = self
            .category
            .as_deref()
            .map(|value| required("category", value))
            .transpose()?;
        let quantities = self
            .total_quantity
            .map(|new_total| {
                let lent_out = tool.total_quantity - tool.available_quantity;
                if new_total < lent_out {
                    return Err(CatalogError::TotalBelowLentOut {
                        id: tool.id,
                        requested: new_total,
                        lent_out,
                    });
                }
                Ok((new_total, new_total - lent_out))
            })
            .transpose()?;

        if let Some(name) = name {
            tool.name = name;
        }
        if let Some(category) = category {
            tool.category = category;
        }
        if let Some(condition) = self.condition {
            tool.condition = condition;
        }
        if let Some((total, available)) = quantities {
            tool.total_quantity = total;
            tool.available_quantity = available;
        }
        if let Some(location) = &self.location {
            tool.location = location.trim().to_string();
        }
        Ok(())
    }
}

/// Trim a required text field, rejecting blank values.
pub(crate) fn required(field: &'static str, value: &str) -> CatalogResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}
