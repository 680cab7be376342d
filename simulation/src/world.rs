//! Simulation World - main orchestrator

use std::collections::BTreeMap;

use hecs::{Entity, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::buildings::Building;
use crate::components::*;
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::genealogy::Genealogy;
use crate::geography::Geography;
use crate::market::MarketConditions;
use crate::names;
use crate::occupation::Occupation;
use crate::resource_map::{Point, RadiusCache, ResourceMap};
use crate::resources::{ProductionKind, Resource, ResourceBag};
use crate::statistics::{self, StatisticsReport};
use crate::systems::{self, ProductionMaps};

/// What one call to [`SimulationWorld::advance_turn`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    pub turn: i64,
    pub population: usize,
    pub births: u32,
    pub deaths: u32,
    /// Deceased removed at the start of the turn.
    pub removed: usize,
    pub buildings: usize,
}

/// Read-only view of one person.
#[derive(Debug, Clone, Serialize)]
pub struct PersonSnapshot {
    pub id: PersonId,
    pub name: String,
    pub position: Point,
    pub occupation: Occupation,
    pub age: u32,
    pub store: ResourceBag,
    pub income: ResourceBag,
    pub deficit: ResourceBag,
    pub market: MarketPack,
    pub family_support: FamilySupport,
    pub log: String,
}

pub struct SimulationWorld {
    pub world: World,
    pub calendar: Calendar,
    pub next_person_id: u64,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    geography: Geography,
    buildings: BTreeMap<Point, Building>,
    genealogy: Genealogy,
    radius_cache: RadiusCache,
    maps: ProductionMaps,
    market: MarketConditions,
    statistics: StatisticsReport,
}

impl SimulationWorld {
    /// Generate a world from `config` and place its founders.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let geography = Geography::generate_viable(config.world_size, config.min_land_tiles(), &mut rng)?;
        let mut sim = Self::assemble(config, geography, rng);
        sim.place_founders();
        Ok(sim)
    }

    /// An empty world on a given map. Nobody is placed.
    pub fn with_geography(config: SimulationConfig, geography: Geography) -> Result<Self> {
        config.validate()?;
        if geography.size() != config.world_size {
            return Err(SimulationError::InvalidConfig(format!(
                "geography is {} wide but world_size is {}",
                geography.size(),
                config.world_size
            )));
        }
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::assemble(config, geography, rng))
    }

    fn assemble(config: SimulationConfig, geography: Geography, rng: ChaCha8Rng) -> Self {
        let size = geography.size();
        Self {
            world: World::new(),
            calendar: Calendar::default(),
            next_person_id: 1,
            config,
            rng,
            geography,
            buildings: BTreeMap::new(),
            genealogy: Genealogy::new(),
            radius_cache: RadiusCache::new(),
            maps: ProductionMaps::empty(size),
            market: MarketConditions::default(),
            statistics: StatisticsReport::default(),
        }
    }

    /// Seed founders on random land tiles.
    fn place_founders(&mut self) {
        let land = self.geography.land_tiles().to_vec();
        if land.is_empty() {
            return;
        }
        for _ in 0..self.config.initial_population {
            let location = land[self.rng.gen_range(0..land.len())];
            let age = self
                .rng
                .gen_range(self.config.founder_age_min..=self.config.founder_age_max);
            self.spawn_person(location, Occupation::Gatherer, age);
        }
        info!(count = self.config.initial_population, "Placed founders");
        self.statistics = statistics::generate_report(&self.world, self.calendar.turn);
    }

    /// Add a person with an empty store and a random name.
    pub fn spawn_person(&mut self, position: Point, occupation: Occupation, age: u32) -> PersonId {
        let id = PersonId(self.next_person_id);
        self.next_person_id += 1;
        let person = Person {
            id,
            first_name: names::random_first_name(&mut self.rng).to_string(),
            last_name: names::random_last_name(&mut self.rng).to_string(),
        };
        self.genealogy
            .register_founder(id, person.full_name(), age, self.calendar.turn);
        self.world.spawn((
            person,
            position,
            occupation,
            Age::new(age),
            Holdings::default(),
            MarketPack::default(),
            FamilySupport::default(),
            EventLog::default(),
        ));
        id
    }

    /// Run one turn (one year).
    pub fn advance_turn(&mut self) -> Result<TurnSummary> {
        let turn = self.calendar.turn;

        systems::refresh_logs(&mut self.world);
        let removed = systems::cleanup_deceased(&mut self.world, &self.genealogy);
        systems::movement_system(
            &mut self.world,
            &self.geography,
            &self.buildings,
            self.config.movement_retries,
            &mut self.rng,
        );
        self.maps = systems::production_system(
            &mut self.world,
            &self.geography,
            &self.buildings,
            &self.genealogy,
            turn,
            &mut self.radius_cache,
        );
        systems::childcare_system(&mut self.world, &self.genealogy);
        self.market = systems::market_system(&mut self.world, &self.genealogy, turn);
        let mut deaths = systems::transition_system(
            &mut self.world,
            &self.geography,
            &self.buildings,
            &mut self.genealogy,
            turn,
            &mut self.rng,
        );
        systems::consumption_system(&mut self.world);
        systems::aging_system(&mut self.world);
        let (births, childbirth_deaths) = systems::birth_system(
            &mut self.world,
            &mut self.genealogy,
            turn,
            &mut self.next_person_id,
            &mut self.rng,
        );
        deaths += childbirth_deaths;
        let report = systems::building_system(&self.world, &mut self.buildings);

        let interval = i64::from(self.config.genealogy.prune_interval);
        if turn > 0 && turn % interval == 0 {
            self.genealogy
                .prune(turn, i64::from(self.config.genealogy.grace_turns));
        }

        self.check_finite()?;
        self.statistics = statistics::generate_report(&self.world, turn);
        self.calendar.advance();

        let summary = TurnSummary {
            turn,
            population: self.statistics.population,
            births,
            deaths,
            removed,
            buildings: self.buildings.len(),
        };
        info!(
            turn,
            population = summary.population,
            births,
            deaths,
            buildings = summary.buildings,
            founded = report.founded,
            "Turn complete"
        );
        debug!(statistics = ?self.statistics, "Statistics");
        Ok(summary)
    }

    /// Every resource quantity must stay a real number.
    fn check_finite(&self) -> Result<()> {
        for (_, (person, holdings)) in self.world.query::<(&Person, &Holdings)>().iter() {
            for bag in [&holdings.store, &holdings.income, &holdings.deficit] {
                if let Some((resource, value)) = bag.first_non_finite() {
                    return Err(SimulationError::NonFiniteResource {
                        person: person.id,
                        resource,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Throw everything away and generate a new world from the current
    /// random stream.
    pub fn regenerate(&mut self) -> Result<()> {
        info!("Regenerating world");
        let geography = Geography::generate_viable(
            self.config.world_size,
            self.config.min_land_tiles(),
            &mut self.rng,
        )?;
        self.world.clear();
        self.calendar = Calendar::default();
        self.next_person_id = 1;
        self.maps = ProductionMaps::empty(geography.size());
        self.geography = geography;
        self.buildings.clear();
        self.genealogy = Genealogy::new();
        self.market = MarketConditions::default();
        self.place_founders();
        Ok(())
    }

    pub fn regenerate_with_seed(&mut self, seed: u64) -> Result<()> {
        self.config.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.regenerate()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn turn(&self) -> i64 {
        self.calendar.turn
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    pub fn buildings(&self) -> &BTreeMap<Point, Building> {
        &self.buildings
    }

    pub fn market(&self) -> &MarketConditions {
        &self.market
    }

    pub fn effort_map(&self) -> &ResourceMap<ProductionKind> {
        &self.maps.effort
    }

    pub fn production_map(&self) -> &ResourceMap<Resource> {
        &self.maps.production
    }

    pub fn draft_map(&self) -> &ResourceMap<PersonId> {
        &self.maps.draft
    }

    pub fn genealogy(&self) -> &Genealogy {
        &self.genealogy
    }

    pub fn statistics(&self) -> &StatisticsReport {
        &self.statistics
    }

    /// Living people.
    pub fn population(&self) -> usize {
        systems::death::living_count(&self.world)
    }

    /// Everyone on the map, keyed by id. Includes the deceased awaiting
    /// removal.
    pub fn people(&self) -> BTreeMap<PersonId, PersonSnapshot> {
        let mut people = BTreeMap::new();
        for (_, (person, position, occupation, age, holdings, pack, support, log)) in self
            .world
            .query::<(
                &Person,
                &Point,
                &Occupation,
                &Age,
                &Holdings,
                &MarketPack,
                &FamilySupport,
                &EventLog,
            )>()
            .iter()
        {
            people.insert(
                person.id,
                PersonSnapshot {
                    id: person.id,
                    name: person.full_name(),
                    position: *position,
                    occupation: *occupation,
                    age: age.years,
                    store: holdings.store,
                    income: holdings.income,
                    deficit: holdings.deficit,
                    market: pack.clone(),
                    family_support: support.clone(),
                    log: log.0.clone(),
                },
            );
        }
        people
    }

    pub fn person(&self, id: PersonId) -> Option<PersonSnapshot> {
        self.people().remove(&id)
    }

    pub fn people_by_location(&self) -> BTreeMap<Point, Vec<PersonSnapshot>> {
        let mut grouped: BTreeMap<Point, Vec<PersonSnapshot>> = BTreeMap::new();
        for snapshot in self.people().into_values() {
            grouped.entry(snapshot.position).or_default().push(snapshot);
        }
        grouped
    }

    fn entity_of(&self, id: PersonId) -> Option<Entity> {
        self.world
            .query::<&Person>()
            .iter()
            .find(|(_, person)| person.id == id)
            .map(|(entity, _)| entity)
    }

    /// Direct access to a person's holdings, for scripted scenarios.
    pub fn holdings_mut(&mut self, id: PersonId) -> Option<hecs::RefMut<'_, Holdings>> {
        let entity = self.entity_of(id)?;
        self.world.get::<&mut Holdings>(entity).ok()
    }
}
