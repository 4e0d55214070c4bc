//! Roster setup
//!
//! Runs once when the match starts and fills every free seat with a bot:
//! config, spawn point, name, cosmetics, loadout, team and difficulty
//! modifiers. Random draws happen in a fixed order per bot so the roster is
//! reproducible from the match seed.

use std::collections::BTreeMap;

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::bots::state::{BehaviourType, BotState};
use crate::error::{BotError, Result};
use crate::game::catalog::{BotCatalog, BotConfig, GameModeConfig, ItemCatalog, WeaponSpec};
use crate::game::constants::roster::*;
use crate::game::constants::specials::STARTING_CHARGES;
use crate::game::entity::EntityHandle;
use crate::game::world::{
    Character, Cosmetics, ModifierOp, PlayerSpawner, Special, SpecialKind, SpawnerKind, StatKind, StatModifier,
    WeaponSlot, World,
};
use crate::util::fixed::Fp;
use crate::util::rng::SimRng;
use crate::util::vec2::Vec2;

/// Match-level knobs that are not part of the content catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterSettings {
    /// Seat count of the map
    pub map_max_players: u32,
    /// Forces one difficulty instead of the trophy lookup
    pub difficulty_override: Option<u32>,
}

pub struct BotSetup {
    pub catalog: BotCatalog,
    pub items: ItemCatalog,
    pub game_mode: GameModeConfig,
    pub settings: RosterSettings,
}

#[derive(Debug, Clone, Copy)]
struct FreeSpawner {
    spawner: PlayerSpawner,
    position: Vec2,
}

type Teams = BTreeMap<i32, SmallVec<[EntityHandle; 4]>>;

impl BotSetup {
    pub fn new(catalog: BotCatalog, items: ItemCatalog, game_mode: GameModeConfig, settings: RosterSettings) -> Self {
        Self { catalog, items, game_mode, settings }
    }

    /// Fill the empty seats with bots; returns the spawned bot entities
    ///
    /// Does nothing if the mode disallows bots or bots already exist.
    pub fn initialize_bots(&self, world: &mut World, rng: &mut SimRng) -> Result<Vec<EntityHandle>> {
        if !self.game_mode.allow_bots || !world.bots.is_empty() {
            return Ok(Vec::new());
        }

        let humans: SmallVec<[u32; 8]> = world.characters_iter().filter(|(_, c)| !c.is_bot).map(|(_, c)| c.skill_rating).collect();
        let seats = self.settings.map_max_players.min(self.game_mode.max_players);
        let slots = seats.saturating_sub(humans.len() as u32) as usize;
        if slots == 0 {
            return Ok(Vec::new());
        }
        let average_trophies = average_rating(&humans);

        let configs = self.select_configs(average_trophies)?;
        let mut free = free_spawners(world)?;
        let mut forced: Vec<BehaviourType> = world
            .spawners
            .iter()
            .filter_map(|(_, s)| match s.kind {
                SpawnerKind::BotOfType(behaviour) => Some(behaviour),
                _ => None,
            })
            .collect();

        let available_names = self.catalog.bot_name_count as usize;
        if available_names < slots {
            return Err(BotError::NotEnoughBotNames { needed: slots, available: available_names });
        }
        let mut names: Vec<u32> = (1..=self.catalog.bot_name_count).collect();

        let weapons = self.items.weapon_pool();
        if weapons.is_empty() {
            return Err(BotError::EmptyWeaponPool);
        }
        let melee = self.items.melee_weapon();

        let team_size = self.game_mode.team_size();
        let mut teams = self.initial_teams(world);

        info!(
            "Spawning {} bots ({} humans, average trophies {}, {} configs)",
            slots,
            humans.len(),
            average_trophies,
            configs.len()
        );

        let mut spawned = Vec::with_capacity(slots);
        for ordinal in 0..slots {
            let team = self.team_for(ordinal, &teams);

            let mut config = configs[rng.range_usize(0, configs.len())];
            while !forced.is_empty() {
                let wanted = forced.remove(0);
                if let Some(&found) = configs.iter().find(|c| c.behaviour == wanted) {
                    config = found;
                    break;
                }
            }

            let teammates: SmallVec<[Vec2; 4]> = teams
                .get(&team)
                .into_iter()
                .flatten()
                .filter_map(|&h| world.position(h))
                .collect();
            let (spawn_index, with_teammate) = choose_spawn(&free, config.behaviour, &teammates, rng);
            let position = free[spawn_index].position;
            if !with_teammate && free.len() > 1 {
                free.remove(spawn_index);
            }

            let name_index = names.remove(rng.range_usize(0, names.len()));
            let mut state = BotState::from_config(config, name_index);
            state.wander_direction = rng.next_fp() > Fp::HALF;
            state.time_start_running_from_circle = rng.range_fp_inclusive(CIRCLE_PANIC_MIN, CIRCLE_PANIC_MAX);
            state.favorite_weapon = Some(weapons[rng.range_usize(0, weapons.len())].id);
            state.team_size = team_size;
            state.spawn_with_player = with_teammate;

            let cosmetics = Cosmetics {
                skin: pick(&self.items.skins, rng),
                death_marker: pick(&self.items.death_markers, rng),
                glider: pick(&self.items.gliders, rng),
            };
            let jitter = rng.range_i32(-SKILL_RATING_JITTER, SKILL_RATING_JITTER);
            let skill_rating = (i64::from(average_trophies) + i64::from(jitter)).max(0) as u32;
            let loadout = weapons[rng.range_usize(0, weapons.len())];

            let character = build_character(team, config, melee, loadout, skill_rating, cosmetics);
            let handle = world.spawn_character(position, character);
            world.bots.insert(handle.index(), state);
            teams.entry(team).or_default().push(handle);

            debug!(
                "Bot {} spawned: behaviour {:?}, difficulty {}, team {}, name #{}",
                handle, config.behaviour, config.difficulty, team, name_index
            );
            spawned.push(handle);
        }

        Ok(spawned)
    }

    /// Configs for this match: override, else trophy bucket, else any difficulty
    fn select_configs(&self, average_trophies: u32) -> Result<Vec<&BotConfig>> {
        let key = self.game_mode.bot_config_key();
        let difficulty = self
            .settings
            .difficulty_override
            .or_else(|| self.catalog.difficulty_for_trophies(average_trophies));

        let mut configs = match difficulty {
            Some(level) => self.catalog.configs_for(key, Some(level)),
            None => Vec::new(),
        };
        if configs.is_empty() {
            configs = self.catalog.configs_for(key, None);
        }
        if configs.is_empty() {
            return Err(BotError::NoBotConfigs { game_mode: key.to_string(), difficulty });
        }
        Ok(configs)
    }

    /// Existing parties plus the empty bot parties that complete the lobby
    fn initial_teams(&self, world: &World) -> Teams {
        let mut teams = Teams::new();
        if !self.game_mode.teams {
            return teams;
        }
        for (handle, character) in world.characters_iter() {
            if character.team > 0 {
                teams.entry(character.team).or_default().push(handle);
            }
        }
        let total = self.game_mode.max_players / self.game_mode.team_size();
        let missing = total.saturating_sub(teams.len() as u32) as i32;
        for offset in 0..missing {
            teams.entry(TEAM_ID_START_BOT_PARTIES + offset).or_default();
        }
        teams
    }

    fn team_for(&self, ordinal: usize, teams: &Teams) -> i32 {
        let solo = TEAM_ID_START_SOLO + ordinal as i32;
        if !self.game_mode.teams {
            return solo;
        }
        if self.game_mode.bots_team_override != 0 {
            return self.game_mode.bots_team_override;
        }
        let seats = self.game_mode.team_size() as usize;
        teams
            .iter()
            .find(|(_, members)| members.len() < seats)
            .map_or(solo, |(&team, _)| team)
    }
}

fn average_rating(ratings: &[u32]) -> u32 {
    if ratings.is_empty() {
        return 0;
    }
    let total: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
    let count = ratings.len() as u64;
    ((total + count / 2) / count) as u32
}

/// Spawners active now, or the one that activates first
fn free_spawners(world: &World) -> Result<Vec<FreeSpawner>> {
    let mut free = Vec::new();
    let mut earliest: Option<FreeSpawner> = None;
    for (index, spawner) in world.spawners.iter() {
        let Some(position) = world.entities.handle_at(index).and_then(|h| world.position(h)) else {
            continue;
        };
        let entry = FreeSpawner { spawner: *spawner, position };
        if spawner.activation_time <= world.time {
            free.push(entry);
        } else if earliest.map_or(true, |e| spawner.activation_time < e.spawner.activation_time) {
            earliest = Some(entry);
        }
    }
    if free.is_empty() {
        free.extend(earliest);
    }
    if free.is_empty() {
        return Err(BotError::NoSpawnPoints);
    }
    Ok(free)
}

/// Pick a spawn point: exact archetype, any-bot, next to a teammate, random
fn choose_spawn(free: &[FreeSpawner], behaviour: BehaviourType, teammates: &[Vec2], rng: &mut SimRng) -> (usize, bool) {
    fn pick_among(rng: &mut SimRng, indices: &[usize]) -> usize {
        indices[rng.range_usize(0, indices.len())]
    }

    let exact: SmallVec<[usize; 8]> = (0..free.len())
        .filter(|&i| free[i].spawner.kind == SpawnerKind::BotOfType(behaviour))
        .collect();
    if !exact.is_empty() {
        return (pick_among(rng, &exact), false);
    }

    let any_bot: SmallVec<[usize; 8]> = (0..free.len()).filter(|&i| free[i].spawner.kind == SpawnerKind::AnyBot).collect();
    if !any_bot.is_empty() {
        return (pick_among(rng, &any_bot), false);
    }

    let mut nearest: Option<(usize, Fp)> = None;
    for (index, spawner) in free.iter().enumerate() {
        for mate in teammates {
            let distance_sq = spawner.position.distance_sq_to(*mate);
            if nearest.map_or(true, |(_, best)| distance_sq < best) {
                nearest = Some((index, distance_sq));
            }
        }
    }
    if let Some((index, _)) = nearest {
        return (index, true);
    }

    (rng.range_usize(0, free.len()), false)
}

fn pick(pool: &[u32], rng: &mut SimRng) -> Option<u32> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.range_usize(0, pool.len())])
}

fn build_character(
    team: i32,
    config: &BotConfig,
    melee: Option<&WeaponSpec>,
    loadout: &WeaponSpec,
    skill_rating: u32,
    cosmetics: Cosmetics,
) -> Character {
    let mut character = Character::new(team);
    character.is_bot = true;
    character.weapon_slots[0] = melee.map(|w| WeaponSlot::from_spec(w, 0, false));
    character.weapon_slots[1] = Some(WeaponSlot::from_spec(loadout, config.loadout_rarity, false));
    character.current_slot = 1;
    character.specials = [
        Special::new(SpecialKind::Grenade, STARTING_CHARGES),
        Special::new(SpecialKind::ShieldSelf, STARTING_CHARGES),
    ];
    character.skill_rating = skill_rating;
    character.cosmetics = cosmetics;
    character.max_speed = character.speed;

    if config.damage_taken_multiplier != Fp::ONE {
        character.modifiers.push(StatModifier {
            stat: StatKind::Armour,
            op: ModifierOp::Add,
            power: Fp::from_int(100) * (config.damage_taken_multiplier - Fp::ONE),
            start_time: Fp::ZERO,
            duration: INFINITE_DURATION,
            negative: true,
        });
    }
    if config.damage_done_multiplier != Fp::ONE {
        character.modifiers.push(StatModifier {
            stat: StatKind::Power,
            op: ModifierOp::Multiply,
            power: Fp::ONE - config.damage_done_multiplier,
            start_time: Fp::ZERO,
            duration: INFINITE_DURATION,
            negative: true,
        });
    }
    character
}
