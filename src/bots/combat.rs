//! Combat behaviour
//!
//! Targeting upkeep, predictive aiming, special-ability usage, weapon
//! switching and close-quarters repositioning.

use crate::bot_trace;
use crate::bots::movement::move_to_location;
use crate::bots::perception::try_aim_at;
use crate::bots::state::{BotState, MovementType};
use crate::bots::system::BotAction;
use crate::bots::BotCtx;
use crate::game::constants::character::MELEE_SLOT;
use crate::game::constants::combat::*;
use crate::game::entity::EntityHandle;
use crate::game::world::Character;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

/// Aim point leading a moving target
///
/// Estimates the projectile travel time over the current distance and
/// shifts the target by its velocity over that time. Hit-scan and melee
/// weapons (zero speed) aim straight at the target.
pub fn lead_target(shooter: Vec2, target: Vec2, target_velocity: Vec2, projectile_speed: Fp) -> Vec2 {
    if projectile_speed <= Fp::ZERO || target_velocity.is_zero() {
        return target;
    }
    let travel_time = shooter.distance_to(target) / projectile_speed;
    target + target_velocity * travel_time
}

/// Engagement range: weapon range capped by the bot's aiming range
pub fn weapon_target_range(character: &Character, bot: &BotState) -> Fp {
    character.attack_range().min(bot.max_aiming_range)
}

/// Restore the non-aiming movement cap and release the trigger
pub fn stop_aiming(ctx: &mut BotCtx, bot: &BotState) {
    if let Some(character) = ctx.world.character_mut(ctx.entity) {
        character.max_speed = character.speed * bot.movement_speed_multiplier;
        character.aim.pressed = false;
    }
}

pub fn clear_target(ctx: &mut BotCtx, bot: &mut BotState) {
    stop_aiming(ctx, bot);
    if bot.target.take().is_some() {
        ctx.record(BotAction::TargetCleared);
    }
}

/// Press the trigger on `target` and slow down to the weapon's aiming speed
pub fn set_attack_target(ctx: &mut BotCtx, bot: &mut BotState, target: EntityHandle) {
    if let Some(character) = ctx.world.character_mut(ctx.entity) {
        let aiming = character.current_weapon().map_or(Fp::ONE, |w| w.aiming_movement_speed);
        character.max_speed = character.speed * bot.movement_speed_multiplier * aiming;
        character.aim.pressed = true;
    }
    if bot.target != Some(target) {
        bot.target = Some(target);
        ctx.record(BotAction::TargetAcquired(target));
    }
}

/// Re-validate and re-aim the current target
pub fn update_aim_target(ctx: &mut BotCtx, bot: &mut BotState) {
    let Some(target) = bot.target else {
        return;
    };
    if !ctx.world.is_alive(target) {
        clear_target(ctx, bot);
        return;
    }
    let Some(range) = ctx.world.character(ctx.entity).map(|c| weapon_target_range(c, bot)) else {
        return;
    };
    match try_aim_at(ctx, bot, target, range).engaged_target() {
        Some(hit) => set_attack_target(ctx, bot, hit),
        None => clear_target(ctx, bot),
    }
}

/// Scan every character in index order and engage the first valid one
pub fn check_enemies_to_shoot_at(ctx: &mut BotCtx, bot: &mut BotState) {
    let Some(range) = ctx.world.character(ctx.entity).map(|c| weapon_target_range(c, bot)) else {
        return;
    };
    let candidates: Vec<EntityHandle> = ctx.world.characters_iter().map(|(h, _)| h).collect();

    let mut found = None;
    for candidate in candidates {
        if let Some(hit) = try_aim_at(ctx, bot, candidate, range).engaged_target() {
            found = Some(hit);
            break;
        }
    }

    match found {
        Some(target) => set_attack_target(ctx, bot, target),
        None => clear_target(ctx, bot),
    }
}

/// Roll for and fire a special ability; returns the slot used
pub fn try_use_specials(ctx: &mut BotCtx, bot: &mut BotState) -> Option<usize> {
    let now = ctx.now();
    if now < bot.next_allowed_special_use_time {
        return None;
    }
    if ctx.rng.next_fp() >= bot.chance_to_use_special {
        return None;
    }

    let target = bot.target.filter(|t| ctx.world.is_alive(*t));
    let specials = ctx.world.character(ctx.entity)?.specials;

    for (slot, special) in specials.iter().enumerate() {
        if !special.is_usable(now) || (target.is_none() && !special.kind.is_self_buff()) {
            continue;
        }
        let aim = match target.and_then(|t| ctx.world.position(t)) {
            Some(position) if !special.kind.is_self_buff() => {
                let deviation = bot.special_aiming_deviation;
                let offset = Vec2::new(
                    ctx.rng.range_fp_inclusive(-deviation, deviation),
                    ctx.rng.range_fp_inclusive(-deviation, deviation),
                );
                position + offset
            }
            _ => ctx.position(),
        };
        if ctx.world.activate_special(ctx.entity, slot, aim) {
            let cooldown = ctx.rng.range_fp_inclusive(bot.special_cooldown_min, bot.special_cooldown_max);
            bot.next_allowed_special_use_time = now + cooldown;
            bot_trace!(bot = %ctx.entity, slot, "use special");
            return Some(slot);
        }
    }
    None
}

/// Swap between melee and ranged weapons depending on ammo
///
/// A ranged weapon with an empty magazine goes back to melee; melee with ammo
/// available goes to the first ranged slot. Returns the slot equipped.
pub fn try_switch_weapon(ctx: &mut BotCtx) -> Option<usize> {
    let character = ctx.world.character_mut(ctx.entity)?;
    let holding_melee = character.has_melee_weapon_equipped();

    if !holding_melee && character.ammo <= Fp::ZERO {
        return (character.current_slot != MELEE_SLOT && character.equip_slot(MELEE_SLOT)).then_some(MELEE_SLOT);
    }

    if holding_melee && character.ammo > Fp::ZERO {
        let slot = (1..character.weapon_slots.len())
            .find(|&i| character.weapon_slots[i].is_some_and(|w| !w.melee))?;
        return character.equip_slot(slot).then_some(slot);
    }

    None
}

/// True when the bot is far behind its opponent in effective health
pub fn is_losing_badly(own: &Character, enemy: &Character) -> bool {
    own.vitality_ratio() + LOSING_BADLY_MARGIN < enemy.vitality_ratio()
}

/// Close-quarters repositioning against the current target
///
/// Too close (inside a third of the weapon range) backs off; in range and
/// not losing badly circles around the target. Returns the destination.
pub fn try_reposition(ctx: &mut BotCtx, bot: &mut BotState) -> Option<Vec2> {
    let target = bot.target.filter(|t| ctx.world.is_alive(*t))?;
    let own = ctx.world.character(ctx.entity)?;
    let enemy = ctx.world.character(target)?;
    let range = weapon_target_range(own, bot);
    if range <= Fp::ZERO {
        return None;
    }
    let losing_badly = is_losing_badly(own, enemy);
    let position = ctx.position();
    let target_position = ctx.world.position(target)?;
    let offset = position - target_position;
    let distance_sq = offset.length_sq();
    let third = range / Fp::from_int(3);

    let destination = if distance_sq < third * third {
        let away = offset.normalize();
        let away = if away.is_zero() { Vec2::from_angle(ctx.rng.range_fp(Fp::ZERO, Fp::TWO_PI)) } else { away };
        let distance = range * ctx.rng.range_fp(RETREAT_MIN_FRACTION, RETREAT_MAX_FRACTION);
        position + away * distance
    } else if distance_sq <= range * range && !losing_badly {
        let angle = ctx.rng.range_fp(STRAFE_MIN_ANGLE, STRAFE_MAX_ANGLE);
        let angle = if bot.wander_direction { angle } else { -angle };
        bot.wander_direction = !bot.wander_direction;
        target_position + offset.rotate(angle)
    } else {
        return None;
    };

    move_to_location(ctx, bot, destination, MovementType::Reposition).then_some(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::state::BehaviourType;
    use crate::bots::ZoneContext;
    use crate::config::EngineConfig;
    use crate::game::catalog::ItemCatalog;
    use crate::game::nav::{Navigation, StraightLineNav};
    use crate::game::physics::OpenFieldPhysics;
    use crate::game::world::{Special, SpecialKind, WeaponSlot, World};
    use crate::util::rng::SimRng;

    struct Fixture {
        world: World,
        nav: StraightLineNav,
        physics: OpenFieldPhysics,
        rng: SimRng,
        config: EngineConfig,
        decisions: Vec<crate::bots::BotDecision>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: World::new(Fp::from_int(16), Fp::from_ratio(1, 30)),
                nav: StraightLineNav::new(Fp::from_int(200), Vec::new()),
                physics: OpenFieldPhysics::default(),
                rng: SimRng::new(11),
                config: EngineConfig::default(),
                decisions: Vec::new(),
            }
        }

        fn ctx(&mut self, entity: EntityHandle) -> BotCtx<'_> {
            BotCtx {
                world: &mut self.world,
                nav: &mut self.nav,
                physics: &self.physics,
                rng: &mut self.rng,
                config: &self.config,
                zone: ZoneContext::default(),
                entity,
                decisions: &mut self.decisions,
            }
        }
    }

    fn armed(team: i32) -> Character {
        let items = ItemCatalog::builtin();
        let mut character = Character::new(team);
        let hammer = items.melee_weapon().map(|w| WeaponSlot::from_spec(w, 0, false));
        let rifle = items.weapon(2).map(|w| WeaponSlot::from_spec(w, 0, false));
        character.weapon_slots = [hammer, rifle, None];
        character.current_slot = 1;
        character
    }

    fn combat_bot() -> BotState {
        let mut state = BotState::new(BehaviourType::FullCombat, 1);
        state.max_aiming_range = Fp::from_int(18);
        state
    }

    #[test]
    fn test_lead_target() {
        let aim = lead_target(Vec2::ZERO, Vec2::from_ints(20, 0), Vec2::from_ints(0, 5), Fp::from_int(40));
        assert_eq!(aim, Vec2::new(Fp::from_int(20), Fp::from_milli(2500)));
        let straight = lead_target(Vec2::ZERO, Vec2::from_ints(20, 0), Vec2::from_ints(0, 5), Fp::ZERO);
        assert_eq!(straight, Vec2::from_ints(20, 0));
    }

    #[test]
    fn test_check_enemies_picks_first_in_index_order() {
        let mut fx = Fixture::new();
        let bot = fx.world.spawn_character(Vec2::ZERO, armed(1));
        let first = fx.world.spawn_character(Vec2::from_ints(0, 10), Character::new(2));
        fx.world.spawn_character(Vec2::from_ints(0, -5), Character::new(3));
        let mut state = combat_bot();

        check_enemies_to_shoot_at(&mut fx.ctx(bot), &mut state);
        assert_eq!(state.target, Some(first));
        let character = fx.world.character(bot).cloned().unwrap();
        assert!(character.aim.pressed);
        assert_eq!(character.max_speed, character.speed * Fp::from_milli(700));
        assert_eq!(fx.decisions.last().map(|d| d.action), Some(BotAction::TargetAcquired(first)));
    }

    #[test]
    fn test_update_aim_target_clears_dead_target() {
        let mut fx = Fixture::new();
        let bot = fx.world.spawn_character(Vec2::ZERO, armed(1));
        let enemy = fx.world.spawn_character(Vec2::from_ints(0, 10), Character::new(2));
        let mut state = combat_bot();
        state.target = Some(enemy);
        fx.world.character_mut(enemy).unwrap().alive = false;

        update_aim_target(&mut fx.ctx(bot), &mut state);
        assert_eq!(state.target, None);
        let character = fx.world.character(bot).cloned().unwrap();
        assert!(!character.aim.pressed);
        assert_eq!(character.max_speed, character.speed);
    }

    #[test]
    fn test_specials_need_target_unless_self_buff() {
        let mut fx = Fixture::new();
        let mut character = armed(1);
        character.specials = [Special::new(SpecialKind::Grenade, 1), Special::new(SpecialKind::ShieldSelf, 1)];
        let bot = fx.world.spawn_character(Vec2::ZERO, character);
        let mut state = combat_bot();
        state.chance_to_use_special = Fp::ONE;
        state.special_cooldown_min = Fp::from_int(5);
        state.special_cooldown_max = Fp::from_int(5);

        assert_eq!(try_use_specials(&mut fx.ctx(bot), &mut state), Some(1));
        assert_eq!(state.next_allowed_special_use_time, Fp::from_int(5));
        assert!(try_use_specials(&mut fx.ctx(bot), &mut state).is_none());
    }

    #[test]
    fn test_specials_never_with_zero_chance() {
        let mut fx = Fixture::new();
        let mut character = armed(1);
        character.specials = [Special::new(SpecialKind::ShieldSelf, 1), Special::default()];
        let bot = fx.world.spawn_character(Vec2::ZERO, character);
        let mut state = combat_bot();
        assert!(try_use_specials(&mut fx.ctx(bot), &mut state).is_none());
    }

    #[test]
    fn test_switch_weapon_both_ways() {
        let mut fx = Fixture::new();
        let bot = fx.world.spawn_character(Vec2::ZERO, armed(1));

        fx.world.character_mut(bot).unwrap().ammo = Fp::ZERO;
        assert_eq!(try_switch_weapon(&mut fx.ctx(bot)), Some(MELEE_SLOT));
        assert_eq!(try_switch_weapon(&mut fx.ctx(bot)), None);

        fx.world.character_mut(bot).unwrap().ammo = Fp::from_int(10);
        assert_eq!(try_switch_weapon(&mut fx.ctx(bot)), Some(1));
        assert_eq!(fx.world.character(bot).map(|c| c.current_slot), Some(1));
    }

    #[test]
    fn test_reposition_backs_off_when_too_close() {
        let mut fx = Fixture::new();
        let bot = fx.world.spawn_character(Vec2::ZERO, armed(1));
        let enemy = fx.world.spawn_character(Vec2::from_ints(2, 0), Character::new(2));
        let mut state = combat_bot();
        state.target = Some(enemy);

        let destination = try_reposition(&mut fx.ctx(bot), &mut state).expect("should back off");
        // Range 18: retreat between 0.33 and 0.66 of it, away from the enemy
        assert!(destination.x < Fp::from_int(-5));
        assert!(destination.x > Fp::from_int(-12));
        assert_eq!(state.movement_type, MovementType::Reposition);
        assert!(fx.nav.is_active(bot));
    }

    #[test]
    fn test_reposition_circles_when_even() {
        let mut fx = Fixture::new();
        let bot = fx.world.spawn_character(Vec2::ZERO, armed(1));
        let enemy = fx.world.spawn_character(Vec2::from_ints(12, 0), Character::new(2));
        let mut state = combat_bot();
        state.target = Some(enemy);
        state.wander_direction = true;

        let destination = try_reposition(&mut fx.ctx(bot), &mut state).expect("should strafe");
        let radius_sq = destination.distance_sq_to(Vec2::from_ints(12, 0));
        assert!((radius_sq - Fp::from_int(144)).abs() < Fp::ONE);
        assert!(!state.wander_direction);
    }

    #[test]
    fn test_losing_badly_does_not_dance() {
        let mut fx = Fixture::new();
        let mut weak = armed(1);
        weak.health = Fp::from_int(10);
        let bot = fx.world.spawn_character(Vec2::ZERO, weak);
        let mut strong = Character::new(2);
        strong.health = Fp::from_int(90);
        let enemy = fx.world.spawn_character(Vec2::from_ints(12, 0), strong);
        let mut state = combat_bot();
        state.target = Some(enemy);

        assert!(try_reposition(&mut fx.ctx(bot), &mut state).is_none());
        assert_eq!(state.movement_type, MovementType::None);
        assert!(!fx.nav.is_active(bot));
    }
}
