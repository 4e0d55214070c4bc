//! Decision orchestrator
//!
//! `BotCharacterSystem::update` runs once per tick. Bots are split across a
//! round-robin window by name index, so each tick only processes the bots
//! whose index falls on it. A scheduled bot then goes through gating,
//! targeting upkeep and the ordered decision list, where the first step that
//! applies ends the pass.

use bitvec::vec::BitVec;

use crate::bot_trace;
use crate::bots::combat;
use crate::bots::movement::{self, ReviveStep};
use crate::bots::pickups;
use crate::bots::state::{BehaviourType, BotState, MoveTarget, MovementType};
use crate::bots::zone::{self, ZoneContext};
use crate::bots::BotCtx;
use crate::config::EngineConfig;
use crate::game::constants::decision::*;
use crate::game::entity::EntityHandle;
use crate::game::nav::{NavEvent, Navigation};
use crate::game::physics::LineOfSight;
use crate::game::world::World;
use crate::util::rng::SimRng;
use crate::util::vec2::Vec2;

/// One observable bot decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotAction {
    TargetAcquired(EntityHandle),
    TargetCleared,
    /// Left the storm toward this point
    Flee(Vec2),
    KeepFleeing,
    KeepFighting,
    /// Passed the decision-interval gate
    DecisionPass,
    /// Knocked out with a teammate reviving
    WaitBeingRevived,
    /// Knocked out and crawling toward a teammate
    CrawlToTeammate(Vec2),
    /// Knocked out with nowhere useful to crawl
    WaitForRevive,
    /// Standing on a knocked-out teammate until they get up
    Reviving(EntityHandle),
    GoRevive(Vec2),
    WaitCollecting,
    UseSpecial { slot: usize },
    SwitchWeapon { slot: usize },
    GoToSafeArea(Vec2),
    WaitForPath,
    Unstuck,
    Reposition(Vec2),
    Nudge(Vec2),
    Collect { item: EntityHandle, close: bool },
    FollowTeammate(Vec2),
    Wander(Vec2),
    Idle,
    PathFailed(Option<EntityHandle>),
    WaypointReached,
    MoveTargetLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BotDecision {
    pub tick: u64,
    pub bot: EntityHandle,
    pub action: BotAction,
}

/// Per-update counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BotSystemStats {
    /// Bots whose round-robin slot matched this tick
    pub scheduled: usize,
    /// Full passes run
    pub passes: usize,
    /// Scheduled bots skipped by gating
    pub skipped: usize,
}

pub struct BotCharacterSystem {
    config: EngineConfig,
    /// Bot column slots due this tick
    scheduled: BitVec,
    stats: BotSystemStats,
}

impl BotCharacterSystem {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            scheduled: BitVec::new(),
            stats: BotSystemStats::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Counters from the last `update`
    pub fn stats(&self) -> BotSystemStats {
        self.stats
    }

    /// Run every bot due this tick; returns the tick's decisions in bot index order
    pub fn update(
        &mut self,
        world: &mut World,
        nav: &mut dyn Navigation,
        physics: &dyn LineOfSight,
        rng: &mut SimRng,
    ) -> Vec<BotDecision> {
        let window = u64::from(self.config.tick_window.max(1));
        let slot = world.tick % window;

        self.scheduled.clear();
        self.scheduled.resize(world.bots.span(), false);
        for (index, bot) in world.bots.iter() {
            if u64::from(bot.name_index) % window == slot {
                self.scheduled.set(index, true);
            }
        }
        self.stats = BotSystemStats {
            scheduled: self.scheduled.count_ones(),
            ..BotSystemStats::default()
        };

        let zone = ZoneContext::from_world(world);
        let mut decisions = Vec::new();

        for index in self.scheduled.iter_ones() {
            let Some(handle) = world.entities.handle_at(index) else {
                continue;
            };
            let Some(character) = world.character(handle) else {
                self.stats.skipped += 1;
                continue;
            };
            if !character.alive || character.stunned || world.time < character.spawn_time + self.config.spawn_grace {
                self.stats.skipped += 1;
                continue;
            }

            let Some(mut state) = world.bots.remove(index) else {
                continue;
            };
            let mut ctx = BotCtx {
                world: &mut *world,
                nav: &mut *nav,
                physics,
                rng: &mut *rng,
                config: &self.config,
                zone,
                entity: handle,
                decisions: &mut decisions,
            };
            run_pass(&mut ctx, &mut state);
            world.bots.insert(index, state);
            self.stats.passes += 1;
        }

        decisions
    }

    /// Route a navigation callback to the owning bot
    pub fn on_nav_event(&self, world: &mut World, event: NavEvent) -> Option<BotDecision> {
        match event {
            NavEvent::SearchFailed { agent } => self.on_nav_search_failed(world, agent),
            NavEvent::WaypointReached { agent, is_final, .. } => self.on_waypoint_reached(world, agent, is_final),
        }
    }

    /// Remember the unreachable target and re-decide almost at once
    pub fn on_nav_search_failed(&self, world: &mut World, bot: EntityHandle) -> Option<BotDecision> {
        let (now, tick) = (world.time, world.tick);
        let state = world.bot_mut(bot)?;
        let failed = state.move_target_entity();
        if let Some(item) = failed {
            state.invalid_move_targets.insert(item);
        }
        let previous = state.move_target.take();
        state.movement_type = MovementType::None;
        state.stuck_detection_position = None;
        state.set_next_decision_delay(now, NAV_RETRY_DELAY);
        world.release_claim(bot, previous);

        bot_trace!(bot = %bot, "path search failed");
        Some(BotDecision { tick, bot, action: BotAction::PathFailed(failed) })
    }

    /// Clear a location move target once its final waypoint is reached
    pub fn on_waypoint_reached(&self, world: &mut World, bot: EntityHandle, is_final: bool) -> Option<BotDecision> {
        if !is_final {
            return None;
        }
        let (now, tick) = (world.time, world.tick);
        let state = world.bot_mut(bot)?;
        let Some(MoveTarget::Location(_)) = state.move_target else {
            return None;
        };
        state.move_target = None;
        state.movement_type = MovementType::None;
        state.stuck_detection_position = None;
        state.set_next_decision_delay(now, NAV_RETRY_DELAY);
        Some(BotDecision { tick, bot, action: BotAction::WaypointReached })
    }

    /// Drop a bot's state, its invalid-target memo and any pickup claim
    pub fn on_bot_removed(&self, world: &mut World, bot: EntityHandle) -> Option<BotState> {
        if !world.exists(bot) {
            return None;
        }
        let state = world.bots.remove(bot.index())?;
        world.release_claim(bot, state.move_target);
        Some(state)
    }
}

fn run_pass(ctx: &mut BotCtx, bot: &mut BotState) {
    if bot.behaviour == BehaviourType::Idle {
        return;
    }
    if !bot.speed_reset {
        combat::stop_aiming(ctx, bot);
        bot.speed_reset = true;
    }

    let taking_circle_damage = ctx.world.character(ctx.entity).is_some_and(|c| c.taking_circle_damage);
    if taking_circle_damage && bot.target.is_some() {
        combat::clear_target(ctx, bot);
    } else {
        combat::update_aim_target(ctx, bot);
    }
    let now = ctx.now();
    if bot.can_look_for_targets(now) {
        combat::check_enemies_to_shoot_at(ctx, bot);
        bot.set_search_for_enemy_delay(now);
    }

    if bot.behaviour == BehaviourType::StaticShooting {
        return;
    }
    decide(ctx, bot, taking_circle_damage);
}

/// The ordered decision list; the first step that applies ends the pass
fn decide(ctx: &mut BotCtx, bot: &mut BotState, taking_circle_damage: bool) {
    let full = bot.behaviour == BehaviourType::FullCombat;

    movement::clean_destroyed_move_target(ctx, bot);
    if full && bot.team_size > 1 {
        movement::check_on_teammates(ctx, bot);
    }

    // 1. Storm damage overrides everything
    if taking_circle_damage {
        if bot.movement_type != MovementType::GoToSafeArea && bot.target.is_none() {
            combat::stop_aiming(ctx, bot);
            let (center, radius) = (ctx.zone.center, ctx.zone.radius);
            if let Some(point) = movement::try_go_to_safe_area(ctx, bot, center, radius) {
                ctx.record(BotAction::Flee(point));
            }
        } else if bot.target.is_some() {
            ctx.record(BotAction::KeepFighting);
        } else {
            ctx.record(BotAction::KeepFleeing);
        }
        return;
    }

    // 2. Decision interval
    let now = ctx.now();
    if !bot.can_take_decision(now) {
        return;
    }
    ctx.record(BotAction::DecisionPass);

    // Knocked out: wait for help or crawl to the tracked teammate
    let knocked_out = ctx.world.character(ctx.entity).is_some_and(|c| c.is_knocked_out());
    if full && knocked_out {
        let being_revived = ctx.world.character(ctx.entity).is_some_and(|c| c.is_being_revived());
        if being_revived {
            ctx.record(BotAction::WaitBeingRevived);
        } else if let Some(point) = movement::stay_close_to_teammate(ctx, bot, true) {
            bot.set_next_decision_delay(now, bot.decision_interval);
            ctx.record(BotAction::CrawlToTeammate(point));
        } else {
            ctx.record(BotAction::WaitForRevive);
        }
        return;
    }

    // Revive a downed teammate
    if full {
        match movement::try_go_revive_teammate(ctx, bot) {
            Some(ReviveStep::Reviving(mate)) => {
                ctx.record(BotAction::Reviving(mate));
                return;
            }
            Some(ReviveStep::GoTo(_, point)) => {
                ctx.record(BotAction::GoRevive(point));
                return;
            }
            None => {}
        }
    }

    // 3. Collecting
    if let Some(item) = bot.move_target_entity() {
        if let Some(end) = ctx.world.collectable(item).and_then(|c| c.collecting_end_time(ctx.entity)) {
            bot.set_next_decision_delay(end, COLLECT_WAIT_PADDING);
            ctx.record(BotAction::WaitCollecting);
            return;
        }
    }
    bot.set_next_decision_delay(now, bot.decision_interval);

    // 4. Specials
    if full {
        if let Some(slot) = combat::try_use_specials(ctx, bot) {
            combat::stop_aiming(ctx, bot);
            ctx.record(BotAction::UseSpecial { slot });
            return;
        }
    }

    // 5. Weapon switch
    if full {
        if let Some(slot) = combat::try_switch_weapon(ctx) {
            ctx.record(BotAction::SwitchWeapon { slot });
            return;
        }
    }

    // 6. Head for the next circle before it closes
    let position = ctx.position();
    if !zone::is_position_safe(&ctx.zone, bot, position) {
        combat::stop_aiming(ctx, bot);
        let (center, radius) = (ctx.zone.target_center, ctx.zone.target_radius);
        if let Some(point) = movement::try_go_to_safe_area(ctx, bot, center, radius) {
            ctx.record(BotAction::GoToSafeArea(point));
            return;
        }
    }

    // 7. Already pathing
    if bot.movement_type != MovementType::None && ctx.nav.is_active(ctx.entity) {
        if bot.is_stuck(position) {
            ctx.nav.stop(ctx.world, ctx.entity, true);
            movement::clear_move_target(ctx, bot);
            ctx.record(BotAction::Unstuck);
        } else {
            ctx.record(BotAction::WaitForPath);
            return;
        }
    }

    if full && bot.target.is_some() {
        if let Some(point) = combat::try_reposition(ctx, bot) {
            ctx.record(BotAction::Reposition(point));
            return;
        }
    }

    // 8. Pickups
    if full && pickups::try_go_for_best_pickup(ctx, bot) {
        combat::stop_aiming(ctx, bot);
        return;
    }

    // 9. Teammate
    if full {
        if let Some(point) = movement::stay_close_to_teammate(ctx, bot, false) {
            ctx.record(BotAction::FollowTeammate(point));
            return;
        }
    }

    // 10. Wander; a full-combat bot on the move drops its target
    if let Some(point) = movement::wander_inside_circle(ctx, bot) {
        ctx.record(BotAction::Wander(point));
        if full {
            combat::clear_target(ctx, bot);
        }
        return;
    }

    if bot.is_doing_nothing() {
        bot.set_next_decision_delay(now, IDLE_RETRY_DELAY);
        ctx.record(BotAction::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::ItemCatalog;
    use crate::game::circle::ShrinkingCircle;
    use crate::game::nav::StraightLineNav;
    use crate::game::physics::OpenFieldPhysics;
    use crate::game::revive::KnockedOut;
    use crate::game::world::{Character, CollectableKind, Collector, ConsumableKind, WeaponSlot};
    use crate::util::fixed::Fp;

    struct Harness {
        world: World,
        nav: StraightLineNav,
        physics: OpenFieldPhysics,
        rng: SimRng,
        system: BotCharacterSystem,
    }

    impl Harness {
        fn new() -> Self {
            let config = EngineConfig {
                tick_window: 1,
                spawn_grace: Fp::ZERO,
                ..EngineConfig::default()
            };
            Self {
                world: World::new(Fp::from_int(16), Fp::from_ratio(1, 30)),
                nav: StraightLineNav::new(Fp::from_int(200), Vec::new()),
                physics: OpenFieldPhysics::default(),
                rng: SimRng::new(42),
                system: BotCharacterSystem::new(config),
            }
        }

        fn spawn_bot(&mut self, position: Vec2, character: Character, state: BotState) -> EntityHandle {
            let handle = self.world.spawn_character(position, character);
            self.world.bots.insert(handle.index(), state);
            handle
        }

        fn update(&mut self) -> Vec<BotDecision> {
            self.system.update(&mut self.world, &mut self.nav, &self.physics, &mut self.rng)
        }

        fn bot(&self, handle: EntityHandle) -> &BotState {
            self.world.bot(handle).expect("bot state")
        }
    }

    fn armed(team: i32) -> Character {
        let items = ItemCatalog::builtin();
        let mut character = Character::new(team);
        character.is_bot = true;
        character.weapon_slots[0] = items.melee_weapon().map(|w| WeaponSlot::from_spec(w, 0, false));
        character.weapon_slots[1] = items.weapon(2).map(|w| WeaponSlot::from_spec(w, 0, false));
        character.current_slot = 1;
        character
    }

    fn full_combat(index: u32) -> BotState {
        let mut state = BotState::new(BehaviourType::FullCombat, index);
        state.max_aiming_range = Fp::from_int(18);
        state
    }

    fn actions(decisions: &[BotDecision], bot: EntityHandle) -> Vec<BotAction> {
        decisions.iter().filter(|d| d.bot == bot).map(|d| d.action).collect()
    }

    #[test]
    fn test_idle_bot_never_acts() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), BotState::new(BehaviourType::Idle, 1));
        assert!(h.update().is_empty());
        assert!(h.bot(bot).move_target.is_none());
        assert_eq!(h.system.stats().passes, 1);
    }

    #[test]
    fn test_round_robin_window() {
        let mut h = Harness::new();
        h.system.config.tick_window = 4;
        let mut state = full_combat(6);
        state.decision_interval = Fp::ZERO;
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), state);

        let mut active_ticks = Vec::new();
        for _ in 0..8 {
            if !h.update().is_empty() {
                active_ticks.push(h.world.tick);
            }
            h.world.advance();
        }
        assert_eq!(active_ticks, vec![2, 6]);
        assert!(h.world.bot(bot).is_some());
    }

    #[test]
    fn test_gating_skips_stunned_dead_and_fresh_spawns() {
        let mut h = Harness::new();
        let mut stunned = armed(1);
        stunned.stunned = true;
        let stunned = h.spawn_bot(Vec2::ZERO, stunned, full_combat(1));
        let mut dead = armed(2);
        dead.alive = false;
        h.spawn_bot(Vec2::from_ints(5, 0), dead, full_combat(2));

        let decisions = h.update();
        assert!(decisions.is_empty());
        assert_eq!(h.system.stats().skipped, 2);
        assert_eq!(h.bot(stunned).next_decision_time, Fp::ZERO);

        h.system.config.spawn_grace = Fp::from_int(2);
        h.world.character_mut(stunned).unwrap().stunned = false;
        assert!(h.update().is_empty());
    }

    #[test]
    fn test_dead_bot_skipped_without_mutation() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), full_combat(1));
        let item = h.world.spawn_collectable(Vec2::from_ints(5, 0), CollectableKind::Consumable(ConsumableKind::Ammo));
        h.world.bot_mut(bot).unwrap().move_target = Some(MoveTarget::Entity(item));
        h.world.claim(bot, item);
        h.world.character_mut(bot).unwrap().alive = false;
        let before = h.bot(bot).clone();

        assert!(h.update().is_empty());
        assert_eq!(h.system.stats().skipped, 1);
        assert_eq!(h.bot(bot).move_target, before.move_target);
        assert_eq!(h.bot(bot).next_decision_time, before.next_decision_time);
    }

    #[test]
    fn test_shot_down_bot_lets_go_of_its_pickup() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), full_combat(1));
        let shooter = h.world.spawn_character(Vec2::from_ints(30, 0), Character::new(2));
        let item = h.world.spawn_collectable(Vec2::from_ints(5, 0), CollectableKind::Consumable(ConsumableKind::Ammo));
        h.world.bot_mut(bot).unwrap().move_target = Some(MoveTarget::Entity(item));
        h.world.claim(bot, item);

        h.world.apply_damage(bot, Some(shooter), Fp::from_int(500));
        assert!(h.update().is_empty());
        assert!(h.bot(bot).move_target.is_none());
        assert_eq!(h.world.collectable(item).and_then(|c| c.reserved_by), None);
        assert!(!h.world.is_reserved_by_other(item, shooter));
    }

    #[test]
    fn test_quiet_bot_wanders_inside_static_circle() {
        let center = Vec2::from_ints(5, -5);
        let radius = Fp::from_int(40);
        let start = Vec2::from_ints(25, -5);
        let mut h = Harness::new();
        h.world.circle = Some(ShrinkingCircle::fixed(center, radius));
        let mut state = full_combat(1);
        state.wander_direction = true;
        let bot = h.spawn_bot(start, armed(1), state);

        let decisions = h.update();
        let wander = actions(&decisions, bot).into_iter().find_map(|a| match a {
            BotAction::Wander(point) => Some(point),
            _ => None,
        });
        let point = wander.expect("bot should wander");
        let offset = point - center;
        assert!(offset.length_sq() <= (radius * Fp::from_milli(750)) * (radius * Fp::from_milli(750)));
        let turned = (offset.angle() - (start - center).angle()).wrap_angle();
        assert!(turned >= Fp::from_milli(190) && turned <= Fp::from_milli(760));
        assert_eq!(h.bot(bot).movement_type, MovementType::Wander);
    }

    #[test]
    fn test_losing_badly_does_not_reposition() {
        let mut h = Harness::new();
        let mut weak = armed(1);
        weak.health = Fp::from_int(10);
        let bot = h.spawn_bot(Vec2::ZERO, weak, full_combat(1));
        let mut strong = Character::new(2);
        strong.health = Fp::from_int(90);
        h.world.spawn_character(Vec2::from_ints(10, 0), strong);

        let decisions = actions(&h.update(), bot);
        assert!(decisions.iter().any(|a| matches!(a, BotAction::TargetAcquired(_))));
        assert!(!decisions.iter().any(|a| matches!(a, BotAction::Reposition(_))));
    }

    #[test]
    fn test_even_fight_repositions() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), full_combat(1));
        h.world.spawn_character(Vec2::from_ints(10, 0), Character::new(2));

        let decisions = actions(&h.update(), bot);
        assert!(decisions.iter().any(|a| matches!(a, BotAction::Reposition(_))));
        assert_eq!(h.bot(bot).movement_type, MovementType::Reposition);
    }

    #[test]
    fn test_storm_damage_triggers_flee() {
        let mut h = Harness::new();
        h.world.circle = Some(ShrinkingCircle::fixed(Vec2::ZERO, Fp::from_int(20)));
        let mut character = armed(1);
        character.taking_circle_damage = true;
        let bot = h.spawn_bot(Vec2::from_ints(60, 0), character, full_combat(1));

        let decisions = actions(&h.update(), bot);
        assert!(matches!(decisions.last(), Some(BotAction::Flee(_))));
        assert!(!decisions.contains(&BotAction::DecisionPass));
        assert_eq!(h.bot(bot).movement_type, MovementType::GoToSafeArea);

        let again = actions(&h.update(), bot);
        assert_eq!(again.last(), Some(&BotAction::KeepFleeing));
    }

    #[test]
    fn test_unsafe_position_heads_for_target_circle() {
        let mut h = Harness::new();
        let stage = crate::game::circle::CircleStage {
            delay: Fp::ONE,
            duration: Fp::from_int(10),
            radius_fraction: Fp::HALF,
            damage_per_second: Fp::ONE,
        };
        h.world.circle = Some(ShrinkingCircle::new(Vec2::ZERO, Fp::from_int(100), vec![stage]));
        let bot = h.spawn_bot(Vec2::from_ints(80, 0), armed(1), full_combat(1));

        let decisions = actions(&h.update(), bot);
        let point = decisions.iter().find_map(|a| match a {
            BotAction::GoToSafeArea(p) => Some(*p),
            _ => None,
        });
        let point = point.expect("should head for the next circle");
        assert!(point.x <= Fp::from_milli(41_500));
    }

    #[test]
    fn test_collecting_waits_until_done() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), full_combat(1));
        let item = h.world.spawn_collectable(Vec2::from_ints(1, 0), CollectableKind::Consumable(ConsumableKind::Ammo));
        h.world.bot_mut(bot).unwrap().move_target = Some(MoveTarget::Entity(item));
        h.world
            .collectable_mut(item)
            .unwrap()
            .collectors
            .push(Collector { entity: bot, end_time: Fp::from_int(3) });

        let decisions = actions(&h.update(), bot);
        assert_eq!(decisions.last(), Some(&BotAction::WaitCollecting));
        assert_eq!(h.bot(bot).next_decision_time, Fp::from_int(3) + COLLECT_WAIT_PADDING);
    }

    #[test]
    fn test_special_then_stops_aiming() {
        let mut h = Harness::new();
        let mut character = armed(1);
        character.specials[0] = crate::game::world::Special::new(crate::game::world::SpecialKind::Grenade, 1);
        let mut state = full_combat(1);
        state.chance_to_use_special = Fp::ONE;
        let bot = h.spawn_bot(Vec2::ZERO, character, state);
        let enemy = h.world.spawn_character(Vec2::from_ints(10, 0), Character::new(2));

        let decisions = actions(&h.update(), bot);
        assert!(decisions.contains(&BotAction::TargetAcquired(enemy)));
        assert_eq!(decisions.last(), Some(&BotAction::UseSpecial { slot: 0 }));
        assert!(!h.world.character(bot).unwrap().aim.pressed);
        assert_eq!(h.bot(bot).target, Some(enemy));
    }

    #[test]
    fn test_empty_magazine_switches_to_melee() {
        let mut h = Harness::new();
        let mut character = armed(1);
        character.ammo = Fp::ZERO;
        let bot = h.spawn_bot(Vec2::ZERO, character, full_combat(1));

        let decisions = actions(&h.update(), bot);
        assert_eq!(decisions.last(), Some(&BotAction::SwitchWeapon { slot: 0 }));
    }

    #[test]
    fn test_search_failure_is_remembered() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), full_combat(1));
        let item = h.world.spawn_collectable(Vec2::from_ints(6, 0), CollectableKind::Consumable(ConsumableKind::Health));
        h.world.character_mut(bot).unwrap().health = Fp::from_int(20);

        let decisions = actions(&h.update(), bot);
        assert!(decisions.contains(&BotAction::Collect { item, close: false }));

        let failed = h.system.on_nav_event(&mut h.world, NavEvent::SearchFailed { agent: bot });
        assert_eq!(failed.map(|d| d.action), Some(BotAction::PathFailed(Some(item))));
        assert!(h.bot(bot).is_invalid_move_target(item));
        assert_eq!(h.world.collectable(item).and_then(|c| c.reserved_by), None);
        assert_eq!(h.bot(bot).next_decision_time, h.world.time + NAV_RETRY_DELAY);

        h.world.time = h.world.time + Fp::ONE;
        let retry = actions(&h.update(), bot);
        assert!(!retry.iter().any(|a| matches!(a, BotAction::Collect { .. })));
    }

    #[test]
    fn test_final_waypoint_clears_location_target() {
        let mut h = Harness::new();
        let mut state = full_combat(1);
        state.move_target = Some(MoveTarget::Location(Vec2::from_ints(3, 3)));
        state.movement_type = MovementType::Wander;
        state.next_decision_time = Fp::from_int(50);
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), state);

        assert!(h.system.on_waypoint_reached(&mut h.world, bot, false).is_none());
        let reached = h.system.on_waypoint_reached(&mut h.world, bot, true);
        assert_eq!(reached.map(|d| d.action), Some(BotAction::WaypointReached));
        assert!(h.bot(bot).move_target.is_none());
        assert_eq!(h.bot(bot).next_decision_time, NAV_RETRY_DELAY);
    }

    #[test]
    fn test_bot_removal_releases_claim() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), full_combat(1));
        let item = h.world.spawn_collectable(Vec2::from_ints(5, 0), CollectableKind::Consumable(ConsumableKind::Ammo));
        h.world.bot_mut(bot).unwrap().move_target = Some(MoveTarget::Entity(item));
        h.world.claim(bot, item);

        assert!(h.system.on_bot_removed(&mut h.world, bot).is_some());
        assert!(h.world.bot(bot).is_none());
        assert_eq!(h.world.collectable(item).and_then(|c| c.reserved_by), None);
    }

    #[test]
    fn test_wander_and_shoot_skips_pickups() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), BotState::new(BehaviourType::WanderAndShoot, 1));
        h.world.spawn_collectable(Vec2::from_ints(2, 0), CollectableKind::Consumable(ConsumableKind::Ammo));
        h.world.character_mut(bot).unwrap().ammo = Fp::ONE;

        let decisions = actions(&h.update(), bot);
        assert!(!decisions.iter().any(|a| matches!(a, BotAction::Collect { .. })));
        assert!(decisions.iter().any(|a| matches!(a, BotAction::Wander(_))));
    }

    #[test]
    fn test_static_shooter_never_moves() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), BotState::new(BehaviourType::StaticShooting, 1));
        let enemy = h.world.spawn_character(Vec2::from_ints(10, 0), Character::new(2));

        let decisions = actions(&h.update(), bot);
        assert_eq!(decisions, vec![BotAction::TargetAcquired(enemy)]);
        assert!(h.bot(bot).move_target.is_none());
    }

    fn knocked_out(team: i32) -> Character {
        let mut character = armed(team);
        character.knocked_out = Some(KnockedOut::new(Fp::ZERO, None));
        character
    }

    fn in_team(index: u32) -> BotState {
        let mut state = full_combat(index);
        state.team_size = 2;
        state
    }

    #[test]
    fn test_wander_drops_target_for_full_combat() {
        let mut h = Harness::new();
        let mut weak = armed(1);
        weak.health = Fp::from_int(10);
        let bot = h.spawn_bot(Vec2::ZERO, weak, full_combat(1));
        let mut strong = Character::new(2);
        strong.health = Fp::from_int(90);
        h.world.spawn_character(Vec2::from_ints(10, 0), strong);

        let decisions = actions(&h.update(), bot);
        let wander = decisions.iter().position(|a| matches!(a, BotAction::Wander(_)));
        let cleared = decisions.iter().position(|a| *a == BotAction::TargetCleared);
        assert!(wander.is_some() && cleared > wander);
        assert!(h.bot(bot).target.is_none());
        assert!(!h.world.character(bot).unwrap().aim.pressed);
    }

    #[test]
    fn test_wander_and_shoot_keeps_target_while_roaming() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), BotState::new(BehaviourType::WanderAndShoot, 1));
        let enemy = h.world.spawn_character(Vec2::from_ints(10, 0), Character::new(2));

        let decisions = actions(&h.update(), bot);
        assert!(decisions.iter().any(|a| matches!(a, BotAction::Wander(_))));
        assert!(!decisions.contains(&BotAction::TargetCleared));
        assert_eq!(h.bot(bot).target, Some(enemy));
    }

    #[test]
    fn test_knocked_out_bot_crawls_to_teammate() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, knocked_out(1), in_team(1));
        h.world.spawn_character(Vec2::from_ints(10, 0), armed(1));
        h.world.spawn_collectable(Vec2::from_ints(1, 0), CollectableKind::Consumable(ConsumableKind::Health));

        let decisions = actions(&h.update(), bot);
        assert_eq!(
            decisions.last(),
            Some(&BotAction::CrawlToTeammate(Vec2::new(Fp::from_milli(8_500), Fp::ZERO)))
        );
        assert_eq!(h.bot(bot).movement_type, MovementType::GoCloserToTeammate);
        assert_eq!(h.bot(bot).next_decision_time, h.bot(bot).decision_interval);
    }

    #[test]
    fn test_knocked_out_bot_waits_while_revived() {
        let mut h = Harness::new();
        let mut character = knocked_out(1);
        let bot_slot = h.world.spawn_character(Vec2::from_ints(10, 0), armed(1));
        if let Some(k) = character.knocked_out.as_mut() {
            k.revivers.push(bot_slot);
        }
        let bot = h.spawn_bot(Vec2::ZERO, character, in_team(1));

        let decisions = actions(&h.update(), bot);
        assert_eq!(decisions.last(), Some(&BotAction::WaitBeingRevived));
        assert!(h.bot(bot).move_target.is_none());
    }

    #[test]
    fn test_revive_comes_before_pickups() {
        let mut h = Harness::new();
        let bot = h.spawn_bot(Vec2::ZERO, armed(1), in_team(1));
        h.world.character_mut(bot).unwrap().ammo = Fp::ONE;
        h.world.spawn_collectable(Vec2::from_ints(2, 0), CollectableKind::Consumable(ConsumableKind::Ammo));
        h.world.spawn_character(Vec2::from_ints(-8, 0), knocked_out(1));

        let decisions = actions(&h.update(), bot);
        assert_eq!(decisions.last(), Some(&BotAction::GoRevive(Vec2::new(Fp::from_milli(-8_500), Fp::ZERO))));
        assert!(!decisions.iter().any(|a| matches!(a, BotAction::Collect { .. })));
    }
}
