//! ECS Components for frontier entities
//!
//! A person is one `hecs` entity carrying every component below. Position is
//! the [`Point`](crate::resource_map::Point) component and occupation is the
//! [`Occupation`](crate::occupation::Occupation) component.

use serde::Serialize;

use crate::resources::{Resource, ResourceBag};

// ============================================================================
// Identity Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PersonId(pub u64);

#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Person Components
// ============================================================================

/// Age in whole turns (years).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Age {
    pub years: u32,
}

impl Age {
    pub fn new(years: u32) -> Self {
        Self { years }
    }
}

/// Store, this turn's income and last consumption's shortfall.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Holdings {
    pub store: ResourceBag,
    pub income: ResourceBag,
    pub deficit: ResourceBag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transaction {
    pub side: TradeSide,
    pub resource: Resource,
    pub quantity: f64,
    pub gold: f64,
}

/// Market orders for the current turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketPack {
    pub surplus: ResourceBag,
    pub demand: ResourceBag,
    pub budget: ResourceBag,
    pub transactions: Vec<Transaction>,
}

/// Childcare given to children and received from a parent this turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FamilySupport {
    pub given: ResourceBag,
    pub received: ResourceBag,
}

/// Narrative of what happened to a person this turn. Cleared every turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog(pub String);

impl EventLog {
    pub fn push(&mut self, line: impl AsRef<str>) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        self.0.push_str(line.as_ref());
    }

    /// Replaces everything recorded so far.
    pub fn replace(&mut self, line: impl Into<String>) {
        self.0 = line.into();
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// ============================================================================
// Calendar
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Calendar {
    pub turn: i64,
}

impl Calendar {
    pub fn advance(&mut self) {
        self.turn += 1;
    }
}
