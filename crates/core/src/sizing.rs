//! Pipeline-resource sizing policy.
//!
//! Derives the out-of-order backend capacities (reorder buffer, issue queue, load and
//! store queues, physical register files) from a single issue-width knob. Each capacity
//! follows a [`ScalingRule`]: `max(baseline, per_width * issue_width)`. Since both terms
//! are non-decreasing in the width, a wider machine never receives a smaller structure.
//!
//! The rules are data, not code: a [`SizingTable`] is read from configuration, so callers
//! can reproduce the default "wide issue without starving the backend" provisioning or a
//! deliberately under-provisioned regime for stress testing.

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Default scaling rules.
///
/// The baselines match the single-issue provisioning the reference experiments use
/// (192-entry ROB, 64-entry queues, 256 physical registers per class).
mod defaults {
    use super::ScalingRule;

    pub const REORDER_BUFFER: ScalingRule = ScalingRule::new(192, 32);
    pub const ISSUE_QUEUE: ScalingRule = ScalingRule::new(64, 16);
    pub const LOAD_QUEUE: ScalingRule = ScalingRule::new(64, 8);
    pub const STORE_QUEUE: ScalingRule = ScalingRule::new(64, 8);
    pub const PHYS_INT_REGS: ScalingRule = ScalingRule::new(256, 32);
    pub const PHYS_FLOAT_REGS: ScalingRule = ScalingRule::new(256, 32);
}

/// `max(baseline, per_width * issue_width)` for one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingRule {
    /// Capacity floor applied at every width.
    pub baseline: u32,
    /// Entries added per unit of issue width.
    pub per_width: u32,
}

impl ScalingRule {
    /// Creates a rule.
    pub const fn new(baseline: u32, per_width: u32) -> Self {
        Self {
            baseline,
            per_width,
        }
    }

    /// Evaluates the rule; saturates instead of wrapping so the result stays monotonic.
    pub const fn apply(self, issue_width: u32) -> u32 {
        let scaled = self.per_width.saturating_mul(issue_width);
        if scaled > self.baseline {
            scaled
        } else {
            self.baseline
        }
    }

    const fn can_yield_zero(self) -> bool {
        self.baseline == 0 && self.per_width == 0
    }
}

/// Tunable scaling rules for every sized backend structure.
///
/// # Examples
///
/// ```
/// use o3wire_core::sizing::SizingTable;
///
/// let table = SizingTable::default();
/// let narrow = table.size_for(1).unwrap();
/// let wide = table.size_for(8).unwrap();
/// assert_eq!(narrow.reorder_buffer_entries, 192);
/// assert_eq!(wide.reorder_buffer_entries, 256);
/// assert!(wide.issue_queue_entries >= narrow.issue_queue_entries);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingTable {
    /// Reorder buffer entries.
    #[serde(default = "SizingTable::default_reorder_buffer")]
    pub reorder_buffer: ScalingRule,
    /// Instruction queue entries.
    #[serde(default = "SizingTable::default_issue_queue")]
    pub issue_queue: ScalingRule,
    /// Load queue entries.
    #[serde(default = "SizingTable::default_load_queue")]
    pub load_queue: ScalingRule,
    /// Store queue entries.
    #[serde(default = "SizingTable::default_store_queue")]
    pub store_queue: ScalingRule,
    /// Physical integer registers.
    #[serde(default = "SizingTable::default_phys_int_regs")]
    pub physical_int_registers: ScalingRule,
    /// Physical floating-point registers.
    #[serde(default = "SizingTable::default_phys_float_regs")]
    pub physical_float_registers: ScalingRule,
}

impl SizingTable {
    const fn default_reorder_buffer() -> ScalingRule {
        defaults::REORDER_BUFFER
    }

    const fn default_issue_queue() -> ScalingRule {
        defaults::ISSUE_QUEUE
    }

    const fn default_load_queue() -> ScalingRule {
        defaults::LOAD_QUEUE
    }

    const fn default_store_queue() -> ScalingRule {
        defaults::STORE_QUEUE
    }

    const fn default_phys_int_regs() -> ScalingRule {
        defaults::PHYS_INT_REGS
    }

    const fn default_phys_float_regs() -> ScalingRule {
        defaults::PHYS_FLOAT_REGS
    }

    /// Provisioning that keeps a wide pipeline fed (the default).
    pub const fn wide_issue() -> Self {
        Self {
            reorder_buffer: defaults::REORDER_BUFFER,
            issue_queue: defaults::ISSUE_QUEUE,
            load_queue: defaults::LOAD_QUEUE,
            store_queue: defaults::STORE_QUEUE,
            physical_int_registers: defaults::PHYS_INT_REGS,
            physical_float_registers: defaults::PHYS_FLOAT_REGS,
        }
    }

    /// Tiny backend structures that starve wide pipelines on purpose.
    pub const fn under_provisioned() -> Self {
        Self {
            reorder_buffer: ScalingRule::new(4, 2),
            issue_queue: ScalingRule::new(2, 1),
            load_queue: ScalingRule::new(2, 1),
            store_queue: ScalingRule::new(2, 1),
            physical_int_registers: ScalingRule::new(64, 0),
            physical_float_registers: ScalingRule::new(64, 0),
        }
    }

    fn rules(&self) -> [(&'static str, ScalingRule); 6] {
        [
            ("reorder_buffer", self.reorder_buffer),
            ("issue_queue", self.issue_queue),
            ("load_queue", self.load_queue),
            ("store_queue", self.store_queue),
            ("physical_int_registers", self.physical_int_registers),
            ("physical_float_registers", self.physical_float_registers),
        ]
    }

    /// Rejects tables that could produce a zero-sized structure.
    pub fn validate(&self) -> Result<()> {
        for (name, rule) in self.rules() {
            if rule.can_yield_zero() {
                return Err(Error::invalid(
                    format!("sizing.{name}"),
                    "baseline and per_width are both zero",
                ));
            }
        }
        Ok(())
    }

    /// Derives the backend capacities for `issue_width`.
    ///
    /// Fails with [`Error::InvalidParameter`] when the width is zero or the table is
    /// invalid. Pure: the same width always yields the same sizes.
    pub fn size_for(&self, issue_width: u32) -> Result<ResourceSizes> {
        if issue_width < 1 {
            return Err(Error::invalid("issue_width", "must be at least 1"));
        }
        self.validate()?;
        Ok(ResourceSizes {
            reorder_buffer_entries: self.reorder_buffer.apply(issue_width),
            issue_queue_entries: self.issue_queue.apply(issue_width),
            load_queue_entries: self.load_queue.apply(issue_width),
            store_queue_entries: self.store_queue.apply(issue_width),
            physical_int_registers: self.physical_int_registers.apply(issue_width),
            physical_float_registers: self.physical_float_registers.apply(issue_width),
        })
    }
}

impl Default for SizingTable {
    fn default() -> Self {
        Self::wide_issue()
    }
}

/// Backend capacities derived from an issue width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceSizes {
    /// Reorder buffer entries (`numROBEntries`).
    pub reorder_buffer_entries: u32,
    /// Instruction queue entries (`numIQEntries`).
    pub issue_queue_entries: u32,
    /// Load queue entries (`LQEntries`).
    pub load_queue_entries: u32,
    /// Store queue entries (`SQEntries`).
    pub store_queue_entries: u32,
    /// Physical integer registers (`numPhysIntRegs`).
    pub physical_int_registers: u32,
    /// Physical floating-point registers (`numPhysFloatRegs`).
    pub physical_float_registers: u32,
}

impl ResourceSizes {
    /// All fields in a fixed order, named as the engine parameters they set.
    pub const fn fields(&self) -> [(&'static str, u32); 6] {
        [
            ("numROBEntries", self.reorder_buffer_entries),
            ("numIQEntries", self.issue_queue_entries),
            ("LQEntries", self.load_queue_entries),
            ("SQEntries", self.store_queue_entries),
            ("numPhysIntRegs", self.physical_int_registers),
            ("numPhysFloatRegs", self.physical_float_registers),
        ]
    }
}

/// Sizes for `issue_width` under the default table.
pub fn size_for(issue_width: u32) -> Result<ResourceSizes> {
    SizingTable::default().size_for(issue_width)
}
