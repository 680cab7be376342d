//! Occupations: behavior tables, modifiers and the transition state machine
//!
//! Every occupation maps to one static [`OccupationProfile`]. The functions
//! below layer age, deficit and family modifiers over that table. Transition
//! and reproduction decisions return outcomes; callers apply them.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::buildings::{Building, BuildingType};
use crate::geography::{Geography, Terrain};
use crate::resource_map::Point;
use crate::resources::{ProductionKind, Resource, ResourceBag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupation {
    Gatherer,
    Farmer,
    Fisher,
    Trader,
    Whaler,
    Lumberjack,
    Craftsperson,
    Deceased,
}

/// `radius`/`strength` claim on tiles producing `resource`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraftStat {
    pub resource: Resource,
    pub radius: f64,
    pub strength: f64,
}

const fn draft(resource: Resource, radius: f64, strength: f64) -> DraftStat {
    DraftStat {
        resource,
        radius,
        strength,
    }
}

#[derive(Debug)]
pub struct OccupationProfile {
    /// Steps moved per turn while short of something.
    pub travel: u32,
    /// Steps moved per turn otherwise.
    pub home: u32,
    pub work_strength: f64,
    pub work_radius: f64,
    pub drafts: &'static [DraftStat],
    pub consumption: &'static [(Resource, f64)],
}

const GATHERER: OccupationProfile = OccupationProfile {
    travel: 4,
    home: 1,
    work_strength: 0.2,
    work_radius: 1.5,
    drafts: &[draft(Resource::Food, 1.5, 1.0), draft(Resource::Gold, 2.5, 1.0)],
    consumption: &[(Resource::Food, 0.5)],
};

const FARMER: OccupationProfile = OccupationProfile {
    travel: 1,
    home: 0,
    work_strength: 1.0,
    work_radius: 0.0,
    drafts: &[draft(Resource::Food, 0.0, 10.0), draft(Resource::Gold, 1.5, 1.0)],
    consumption: &[(Resource::Food, 0.4), (Resource::Tool, 0.1)],
};

const FISHER: OccupationProfile = OccupationProfile {
    travel: 1,
    home: 0,
    work_strength: 0.3,
    work_radius: 1.0,
    drafts: &[draft(Resource::Food, 1.0, 1.0), draft(Resource::Gold, 1.5, 1.0)],
    consumption: &[(Resource::Food, 0.5), (Resource::Wood, 0.1)],
};

const TRADER: OccupationProfile = OccupationProfile {
    travel: 5,
    home: 0,
    work_strength: 3.0,
    work_radius: 0.0,
    drafts: &[draft(Resource::Gold, 0.0, 3.0)],
    consumption: &[(Resource::Food, 0.5), (Resource::Tool, 0.1)],
};

const WHALER: OccupationProfile = OccupationProfile {
    travel: 2,
    home: 0,
    work_strength: 0.15,
    work_radius: 3.0,
    drafts: &[draft(Resource::Food, 3.0, 0.3)],
    consumption: &[(Resource::Food, 0.6), (Resource::Wood, 0.3)],
};

const LUMBERJACK: OccupationProfile = OccupationProfile {
    travel: 1,
    home: 0,
    work_strength: 1.0,
    work_radius: 0.0,
    drafts: &[draft(Resource::Wood, 0.0, 1.0)],
    consumption: &[(Resource::Food, 0.6), (Resource::Tool, 0.2)],
};

// Craftspeople run their own workshop instead of working tiles.
const CRAFTSPERSON: OccupationProfile = OccupationProfile {
    travel: 3,
    home: 0,
    work_strength: 1.0,
    work_radius: 0.0,
    drafts: &[draft(Resource::Gold, 0.0, 1.0)],
    consumption: &[(Resource::Food, 0.5), (Resource::Wood, 0.2)],
};

const DECEASED: OccupationProfile = OccupationProfile {
    travel: 0,
    home: 0,
    work_strength: 0.0,
    work_radius: 0.0,
    drafts: &[],
    consumption: &[],
};

impl Occupation {
    pub const LIVING: [Occupation; 7] = [
        Occupation::Gatherer,
        Occupation::Farmer,
        Occupation::Fisher,
        Occupation::Trader,
        Occupation::Whaler,
        Occupation::Lumberjack,
        Occupation::Craftsperson,
    ];

    pub fn profile(self) -> &'static OccupationProfile {
        match self {
            Occupation::Gatherer => &GATHERER,
            Occupation::Farmer => &FARMER,
            Occupation::Fisher => &FISHER,
            Occupation::Trader => &TRADER,
            Occupation::Whaler => &WHALER,
            Occupation::Lumberjack => &LUMBERJACK,
            Occupation::Craftsperson => &CRAFTSPERSON,
            Occupation::Deceased => &DECEASED,
        }
    }

    /// Effort category placed on tiles, if the occupation works tiles at all.
    pub fn production(self) -> Option<ProductionKind> {
        match self {
            Occupation::Gatherer => Some(ProductionKind::Gathering),
            Occupation::Farmer => Some(ProductionKind::Farming),
            Occupation::Fisher => Some(ProductionKind::Fishing),
            Occupation::Trader => Some(ProductionKind::Commerce),
            Occupation::Whaler => Some(ProductionKind::Whaling),
            Occupation::Lumberjack => Some(ProductionKind::Logging),
            Occupation::Craftsperson | Occupation::Deceased => None,
        }
    }

    /// Occupation a newborn of this parent starts with.
    pub fn birth_occupation(self) -> Occupation {
        match self {
            Occupation::Farmer => Occupation::Farmer,
            Occupation::Fisher | Occupation::Whaler => Occupation::Fisher,
            Occupation::Craftsperson => Occupation::Craftsperson,
            _ => Occupation::Gatherer,
        }
    }

    pub fn is_alive(self) -> bool {
        self != Occupation::Deceased
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Occupation::Gatherer => "gatherer",
            Occupation::Farmer => "farmer",
            Occupation::Fisher => "fisher",
            Occupation::Trader => "trader",
            Occupation::Whaler => "whaler",
            Occupation::Lumberjack => "lumberjack",
            Occupation::Craftsperson => "craftsperson",
            Occupation::Deceased => "deceased",
        }
    }
}

impl fmt::Display for Occupation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Scale applied to work strength: nothing under 6, ramping to full at 15.
pub fn work_age_factor(age: u32) -> f64 {
    match age {
        0..=5 => 0.0,
        6..=14 => f64::from(age - 5) * 0.1,
        _ => 1.0,
    }
}

/// Scale applied to draft strength: nothing under 6, ramping to full at 25.
pub fn draft_age_factor(age: u32) -> f64 {
    match age {
        0..=5 => 0.0,
        6..=24 => f64::from(age - 5) * 0.05,
        _ => 1.0,
    }
}

/// Extra draft weight for raising young children, fading out at 17.
pub fn childcare_factor(child_ages: &[i64]) -> f64 {
    child_ages
        .iter()
        .map(|age| ((17 - age) as f64 * 0.03).max(0.0))
        .sum()
}

/// Age-scaled yearly needs. Children eat smaller meals and need nothing
/// but food before 10.
pub fn consumption(occupation: Occupation, age: u32) -> ResourceBag {
    let mut needs = ResourceBag::from_pairs(occupation.profile().consumption);
    if age > 15 {
        return needs;
    }
    let scale = 0.4 + f64::from(age) / 25.0;
    for resource in Resource::ALL {
        if age < 10 && resource != Resource::Food {
            needs.set(resource, 0.0);
        }
        needs[resource] *= scale;
    }
    needs
}

/// Share of the occupation's adult need that was met last turn, 0 when
/// nothing is needed.
fn sufficiency(occupation: Occupation, deficit: &ResourceBag, resource: Resource) -> f64 {
    let need = ResourceBag::from_pairs(occupation.profile().consumption)[resource];
    if need <= 0.0 {
        return 0.0;
    }
    let lacked = deficit[resource].clamp(0.0, need);
    (need - lacked) / need
}

fn radius_modifier(occupation: Occupation, deficit: &ResourceBag) -> f64 {
    match occupation {
        Occupation::Fisher => sufficiency(occupation, deficit, Resource::Wood),
        Occupation::Whaler => sufficiency(occupation, deficit, Resource::Wood) * 2.0,
        _ => 0.0,
    }
}

fn strength_modifier(occupation: Occupation, deficit: &ResourceBag) -> f64 {
    match occupation {
        Occupation::Farmer | Occupation::Lumberjack => {
            sufficiency(occupation, deficit, Resource::Tool)
        }
        _ => 0.0,
    }
}

pub fn work_strength(occupation: Occupation, age: u32, deficit: &ResourceBag) -> f64 {
    let base = occupation.profile().work_strength;
    (base + strength_modifier(occupation, deficit)) * work_age_factor(age)
}

pub fn work_radius(occupation: Occupation, age: u32, deficit: &ResourceBag) -> f64 {
    occupation.profile().work_radius + radius_modifier(occupation, deficit)
}

/// Draft claims after radius, age and childcare modifiers.
pub fn drafts(occupation: Occupation, age: u32, deficit: &ResourceBag, child_ages: &[i64]) -> Vec<DraftStat> {
    let radius_mod = radius_modifier(occupation, deficit);
    let weight = draft_age_factor(age) + childcare_factor(child_ages);
    occupation
        .profile()
        .drafts
        .iter()
        .map(|d| DraftStat {
            resource: d.resource,
            radius: d.radius + radius_mod,
            strength: d.strength * weight,
        })
        .collect()
}

/// Output earned outside the tile pipeline.
pub fn enterprise_output(occupation: Occupation, age: u32, deficit: &ResourceBag) -> Option<(Resource, f64)> {
    match occupation {
        Occupation::Craftsperson => {
            let wood = sufficiency(occupation, deficit, Resource::Wood);
            Some((Resource::Tool, (wood * 2.0 + 1.0) / 3.0 * work_age_factor(age)))
        }
        _ => None,
    }
}

// ============================================================================
// Transitions
// ============================================================================

/// Read-only world view handed to transition functions.
pub struct TransitionContext<'a> {
    pub geography: &'a Geography,
    pub buildings: &'a BTreeMap<Point, Building>,
}

impl TransitionContext<'_> {
    fn building_at(&self, point: Point) -> Option<BuildingType> {
        self.buildings.get(&point).map(|b| b.kind)
    }

    fn terrain_at(&self, point: Point) -> Option<Terrain> {
        self.geography.terrain_at(point)
    }

    /// A random tile, accepted only when it is coastal.
    fn sail<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point> {
        let size = self.geography.size() as i32;
        if size == 0 {
            return None;
        }
        let target = Point::new(rng.gen_range(0..size), rng.gen_range(0..size));
        self.geography.is_coast(target).then_some(target)
    }
}

/// The agent fields a transition may look at.
pub struct AgentState<'a> {
    pub position: Point,
    pub age: u32,
    pub deficit: &'a ResourceBag,
    pub income: &'a ResourceBag,
}

impl AgentState<'_> {
    fn hungry(&self) -> bool {
        self.deficit.has(Resource::Food)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Starvation,
    OldAge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transition {
    /// Relocation decided by a sailing occupation.
    pub sail_to: Option<Point>,
    pub next: Option<Occupation>,
    pub death: Option<DeathCause>,
}

fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

fn change_to(occupation: Occupation) -> Transition {
    Transition {
        next: Some(occupation),
        ..Transition::default()
    }
}

fn gatherer_transition<R: Rng + ?Sized>(agent: &AgentState, ctx: &TransitionContext, rng: &mut R) -> Transition {
    let here = agent.position;
    if agent.age >= 15 {
        let (trade, craft) = match ctx.building_at(here) {
            Some(BuildingType::Town) => (0.05, 0.1),
            Some(BuildingType::City) => (0.1, 0.1),
            _ => (0.0, 0.0),
        };
        if chance(rng, trade) {
            return change_to(Occupation::Trader);
        }
        if chance(rng, craft) {
            return change_to(Occupation::Craftsperson);
        }
    }
    let terrain = ctx.terrain_at(here);
    if terrain == Some(Terrain::Forest) && chance(rng, 0.1) {
        return change_to(Occupation::Lumberjack);
    }
    if agent.hungry() || agent.income[Resource::Food] < 0.4 {
        if ctx.geography.is_coast(here) && chance(rng, 0.8) {
            return change_to(Occupation::Fisher);
        }
        // Not everyone wants to farm, even when hungry.
        if terrain == Some(Terrain::Grassland) && chance(rng, 0.2) {
            return change_to(Occupation::Farmer);
        }
    }
    Transition::default()
}

fn farmer_transition<R: Rng + ?Sized>(agent: &AgentState, ctx: &TransitionContext, rng: &mut R) -> Transition {
    if agent.income[Resource::Food] < 0.4 && chance(rng, 0.05) {
        return change_to(Occupation::Gatherer);
    }
    let craft = match ctx.building_at(agent.position) {
        Some(BuildingType::Town) => 0.2,
        Some(BuildingType::City) => 0.4,
        _ => 0.0,
    };
    if chance(rng, craft) {
        return change_to(Occupation::Craftsperson);
    }
    Transition::default()
}

fn fisher_transition<R: Rng + ?Sized>(agent: &AgentState, ctx: &TransitionContext, rng: &mut R) -> Transition {
    let here = agent.position;
    let mut outcome = Transition::default();
    if let Some(building) = ctx.building_at(here) {
        if agent.age >= 13 {
            if agent.hungry() {
                outcome.sail_to = ctx.sail(rng);
            }
            let (whale, trade, craft) = match building {
                BuildingType::Town => (0.1, 0.02, 0.05),
                BuildingType::City => (0.05, 0.1, 0.1),
                BuildingType::Farm => (0.0, 0.0, 0.0),
            };
            for (p, target) in [
                (whale, Occupation::Whaler),
                (trade, Occupation::Trader),
                (craft, Occupation::Craftsperson),
            ] {
                if chance(rng, p) {
                    outcome.next = Some(target);
                    return outcome;
                }
            }
        }
    }
    // Inland fishers can no longer fish.
    if !ctx.geography.is_coast(here) {
        outcome.next = Some(match ctx.building_at(here) {
            Some(BuildingType::Farm) => Occupation::Farmer,
            _ => Occupation::Gatherer,
        });
        return outcome;
    }
    if agent.age < 40 && chance(rng, 0.03) {
        outcome.next = Some(Occupation::Gatherer);
    }
    outcome
}

fn trader_transition<R: Rng + ?Sized>(agent: &AgentState, rng: &mut R) -> Transition {
    if agent.hungry() {
        if chance(rng, 0.3) {
            return change_to(Occupation::Gatherer);
        }
        if chance(rng, 0.3) {
            return change_to(Occupation::Craftsperson);
        }
    }
    Transition::default()
}

// Once a whaler, always a whaler; hungry ones sail off instead.
fn whaler_transition<R: Rng + ?Sized>(agent: &AgentState, ctx: &TransitionContext, rng: &mut R) -> Transition {
    Transition {
        sail_to: if agent.hungry() { ctx.sail(rng) } else { None },
        ..Transition::default()
    }
}

fn hungry_to_gatherer<R: Rng + ?Sized>(agent: &AgentState, rng: &mut R) -> Transition {
    if agent.hungry() && chance(rng, 0.5) {
        return change_to(Occupation::Gatherer);
    }
    Transition::default()
}

/// Occupation-specific transition followed by the universal mortality checks.
///
/// Starvation kills with probability equal to the unmet fraction of food
/// need. Old age kills with probability `(age - 60) / 60` past 60.
pub fn evaluate_transition<R: Rng + ?Sized>(
    occupation: Occupation,
    agent: &AgentState,
    ctx: &TransitionContext,
    rng: &mut R,
) -> Transition {
    let mut outcome = match occupation {
        Occupation::Gatherer => gatherer_transition(agent, ctx, rng),
        Occupation::Farmer => farmer_transition(agent, ctx, rng),
        Occupation::Fisher => fisher_transition(agent, ctx, rng),
        Occupation::Trader => trader_transition(agent, rng),
        Occupation::Whaler => whaler_transition(agent, ctx, rng),
        Occupation::Lumberjack | Occupation::Craftsperson => hungry_to_gatherer(agent, rng),
        Occupation::Deceased => return Transition::default(),
    };

    // The deficit was recorded before last year's birthday.
    let food_need = consumption(occupation, agent.age.saturating_sub(1))[Resource::Food];
    let hunger = if food_need > 0.0 {
        agent.deficit[Resource::Food] / food_need
    } else {
        0.0
    };
    if chance(rng, hunger) {
        outcome.death = Some(DeathCause::Starvation);
    }
    if rng.gen::<f64>() * 60.0 < f64::from(agent.age) - 60.0 {
        outcome.death = Some(DeathCause::OldAge);
    }
    if outcome.death.is_some() {
        outcome.next = Some(Occupation::Deceased);
    }
    outcome
}

// ============================================================================
// Reproduction
// ============================================================================

/// Youngest and oldest age at which a person may have a child.
pub const FERTILE_AGES: (u32, u32) = (13, 45);

/// Food store that makes provisioning for a child certain, scaled.
const PROVISION_DIVISOR: f64 = 7.0;

/// Base chance of a child this turn, before the food check.
pub fn reproduction_chance(age: u32, child_count: usize) -> f64 {
    if age < FERTILE_AGES.0 || age > FERTILE_AGES.1 {
        return 0.0;
    }
    let base = (20.0 - child_count as f64) / 20.0;
    let young = if age > 20 { 0.0 } else { f64::from(20 - age) / 7.0 };
    let old = if age < 35 { 0.0 } else { f64::from(age - 35) / 10.0 };
    (base - young - old) * 0.6
}

pub fn decide_reproduction<R: Rng + ?Sized>(
    occupation: Occupation,
    age: u32,
    child_count: usize,
    store: &ResourceBag,
    rng: &mut R,
) -> bool {
    if !occupation.is_alive() {
        return false;
    }
    let odds = reproduction_chance(age, child_count);
    if odds <= 0.0 {
        return false;
    }
    let provisioned = rng.gen::<f64>() + 0.25 < store[Resource::Food] / PROVISION_DIVISOR;
    provisioned && chance(rng, odds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn plains(size: usize) -> Geography {
        Geography::from_terrain(vec![vec![Terrain::Grassland; size]; size])
    }

    #[test]
    fn test_child_consumption_scaling() {
        let adult = consumption(Occupation::Farmer, 30);
        assert_eq!(adult[Resource::Tool], 0.1);

        let toddler = consumption(Occupation::Farmer, 5);
        assert_eq!(toddler[Resource::Tool], 0.0);
        assert!((toddler[Resource::Food] - 0.4 * 0.6).abs() < 1e-12);

        let teen = consumption(Occupation::Farmer, 12);
        assert!(teen[Resource::Tool] > 0.0 && teen[Resource::Tool] < 0.1);
    }

    #[test]
    fn test_work_strength_age_ramp() {
        let none = ResourceBag::new();
        assert_eq!(work_strength(Occupation::Gatherer, 4, &none), 0.0);
        assert!((work_strength(Occupation::Gatherer, 10, &none) - 0.1).abs() < 1e-12);
        assert!((work_strength(Occupation::Gatherer, 30, &none) - 0.2).abs() < 1e-12);
        // Fully tooled farmers work at double strength.
        assert!((work_strength(Occupation::Farmer, 30, &none) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tool_shortage_weakens_farmer() {
        let short = ResourceBag::from_pairs(&[(Resource::Tool, 0.1)]);
        assert!((work_strength(Occupation::Farmer, 30, &short) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_whaler_radius_depends_on_wood() {
        let none = ResourceBag::new();
        assert!((work_radius(Occupation::Whaler, 30, &none) - 5.0).abs() < 1e-12);
        let short = ResourceBag::from_pairs(&[(Resource::Wood, 0.3)]);
        assert!((work_radius(Occupation::Whaler, 30, &short) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_children_keep_tool_and_wood_bonuses() {
        // Under ten nobody needs tools or wood, so nothing is lacking.
        let none = ResourceBag::new();
        assert!((work_strength(Occupation::Farmer, 8, &none) - 0.6).abs() < 1e-12);
        assert!((work_radius(Occupation::Fisher, 8, &none) - 2.0).abs() < 1e-12);
        let (_, tools) = enterprise_output(Occupation::Craftsperson, 8, &none).unwrap();
        assert!((tools - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_drafts_reward_young_children() {
        let none = ResourceBag::new();
        let plain = drafts(Occupation::Gatherer, 30, &none, &[]);
        let parent = drafts(Occupation::Gatherer, 30, &none, &[2]);
        assert_eq!(plain.len(), 2);
        assert!((plain[0].strength - 1.0).abs() < 1e-12);
        assert!((parent[0].strength - (1.0 + 15.0 * 0.03)).abs() < 1e-12);
        assert_eq!(drafts(Occupation::Gatherer, 3, &none, &[])[0].strength, 0.0);
    }

    #[test]
    fn test_craftsperson_enterprise() {
        let none = ResourceBag::new();
        let (resource, amount) = enterprise_output(Occupation::Craftsperson, 30, &none).unwrap();
        assert_eq!(resource, Resource::Tool);
        assert!((amount - 1.0).abs() < 1e-12);
        let short = ResourceBag::from_pairs(&[(Resource::Wood, 0.2)]);
        let (_, amount) = enterprise_output(Occupation::Craftsperson, 30, &short).unwrap();
        assert!((amount - 1.0 / 3.0).abs() < 1e-12);
        assert!(enterprise_output(Occupation::Farmer, 30, &none).is_none());
    }

    #[test]
    fn test_full_food_deficit_always_starves() {
        let geography = plains(5);
        let buildings = BTreeMap::new();
        let ctx = TransitionContext {
            geography: &geography,
            buildings: &buildings,
        };
        let deficit = ResourceBag::from_pairs(&[(Resource::Food, 0.5)]);
        let income = ResourceBag::new();
        let agent = AgentState {
            position: Point::new(2, 2),
            age: 30,
            deficit: &deficit,
            income: &income,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let outcome = evaluate_transition(Occupation::Gatherer, &agent, &ctx, &mut rng);
            assert_eq!(outcome.death, Some(DeathCause::Starvation));
            assert_eq!(outcome.next, Some(Occupation::Deceased));
        }
    }

    #[test]
    fn test_child_starves_on_last_years_full_deficit() {
        let geography = plains(5);
        let buildings = BTreeMap::new();
        let ctx = TransitionContext {
            geography: &geography,
            buildings: &buildings,
        };
        // Recorded at age four, evaluated after turning five.
        let deficit = consumption(Occupation::Gatherer, 4);
        let income = ResourceBag::new();
        let agent = AgentState {
            position: Point::new(2, 2),
            age: 5,
            deficit: &deficit,
            income: &income,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..400 {
            let outcome = evaluate_transition(Occupation::Gatherer, &agent, &ctx, &mut rng);
            assert_eq!(outcome.death, Some(DeathCause::Starvation));
        }
    }

    #[test]
    fn test_young_fed_person_does_not_die() {
        let geography = plains(5);
        let buildings = BTreeMap::new();
        let ctx = TransitionContext {
            geography: &geography,
            buildings: &buildings,
        };
        let none = ResourceBag::new();
        let income = ResourceBag::from_pairs(&[(Resource::Food, 1.0)]);
        let agent = AgentState {
            position: Point::new(2, 2),
            age: 30,
            deficit: &none,
            income: &income,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            let outcome = evaluate_transition(Occupation::Lumberjack, &agent, &ctx, &mut rng);
            assert!(outcome.death.is_none());
            assert!(outcome.next.is_none());
        }
    }

    #[test]
    fn test_inland_fisher_changes_trade() {
        let geography = plains(5);
        let mut buildings = BTreeMap::new();
        let none = ResourceBag::new();
        let agent = AgentState {
            position: Point::new(2, 2),
            age: 30,
            deficit: &none,
            income: &none,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let ctx = TransitionContext {
            geography: &geography,
            buildings: &buildings,
        };
        let outcome = evaluate_transition(Occupation::Fisher, &agent, &ctx, &mut rng);
        assert_eq!(outcome.next, Some(Occupation::Gatherer));

        buildings.insert(Point::new(2, 2), Building::new(BuildingType::Farm));
        let ctx = TransitionContext {
            geography: &geography,
            buildings: &buildings,
        };
        let outcome = evaluate_transition(Occupation::Fisher, &agent, &ctx, &mut rng);
        assert_eq!(outcome.next, Some(Occupation::Farmer));
    }

    #[test]
    fn test_reproduction_window() {
        assert_eq!(reproduction_chance(12, 0), 0.0);
        assert_eq!(reproduction_chance(46, 0), 0.0);
        assert!((reproduction_chance(25, 0) - 0.6).abs() < 1e-12);
        assert!(reproduction_chance(25, 10) < reproduction_chance(25, 0));
        assert_eq!(reproduction_chance(13, 0), 0.0);
        assert!((reproduction_chance(14, 0) - 0.6 / 7.0).abs() < 1e-12);
        assert!(reproduction_chance(40, 0) < reproduction_chance(30, 0));
    }

    #[test]
    fn test_no_children_without_food() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let empty = ResourceBag::new();
        for _ in 0..100 {
            assert!(!decide_reproduction(Occupation::Farmer, 25, 0, &empty, &mut rng));
        }
        let rich = ResourceBag::from_pairs(&[(Resource::Food, 100.0)]);
        let births = (0..100)
            .filter(|_| decide_reproduction(Occupation::Farmer, 25, 0, &rich, &mut rng))
            .count();
        assert!(births > 30);
        assert!(!decide_reproduction(Occupation::Deceased, 25, 0, &rich, &mut rng));
    }
}
