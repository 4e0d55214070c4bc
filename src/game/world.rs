//! Simulation world: entity arena plus component columns
//!
//! The decision engine only reads and writes state through this store. It
//! owns no characters itself; it piggybacks `BotState` onto characters that
//! also carry transforms, stats and inventory.
//!
//! All cross-entity references are `EntityHandle`s validated at the point of
//! use. Nothing here hands out a reference to a destroyed entity.

use smallvec::SmallVec;

use crate::bots::state::{BehaviourType, BotState, MoveTarget, MovementType};
use crate::game::catalog::{WeaponId, WeaponSpec};
use crate::game::chunks::CollectableChunks;
use crate::game::circle::ShrinkingCircle;
use crate::game::constants::character::*;
use crate::game::constants::revive::{KNOCKED_OUT_DAMAGE_FACTOR, LIFE_ON_KNOCKED_OUT, MAX_KNOCKOUTS};
use crate::game::constants::specials::*;
use crate::game::entity::{ComponentColumn, EntityArena, EntityHandle};
use crate::game::revive::KnockedOut;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

// ============================================================================
// Components
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub height: Fp,
    pub velocity: Vec2,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self { position, ..Self::default() }
    }
}

/// A weapon held in an inventory slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponSlot {
    pub id: WeaponId,
    pub rarity: u8,
    pub golden: bool,
    pub melee: bool,
    pub range: Fp,
    pub projectile_speed: Fp,
    pub aiming_movement_speed: Fp,
    pub damage_per_second: Fp,
}

impl WeaponSlot {
    pub fn from_spec(spec: &WeaponSpec, rarity: u8, golden: bool) -> Self {
        Self {
            id: spec.id,
            rarity,
            golden,
            melee: spec.melee,
            range: spec.range,
            projectile_speed: spec.projectile_speed,
            aiming_movement_speed: spec.aiming_movement_speed,
            damage_per_second: spec.damage_per_second,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialKind {
    #[default]
    None,
    Grenade,
    Airstrike,
    /// Self buff; usable without a target
    ShieldSelf,
}

impl SpecialKind {
    pub fn is_self_buff(self) -> bool {
        matches!(self, SpecialKind::ShieldSelf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Special {
    pub kind: SpecialKind,
    pub charges: u8,
    pub available_at: Fp,
}

impl Special {
    pub fn new(kind: SpecialKind, charges: u8) -> Self {
        Self { kind, charges, available_at: Fp::ZERO }
    }

    pub fn is_usable(&self, now: Fp) -> bool {
        self.kind != SpecialKind::None && self.charges > 0 && now >= self.available_at
    }

    /// Consume a charge; false if not usable right now
    pub fn try_activate(&mut self, now: Fp) -> bool {
        if !self.is_usable(now) {
            return false;
        }
        self.charges -= 1;
        self.available_at = now + SPECIAL_REUSE_DELAY;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Armour,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierOp {
    Add,
    Multiply,
}

/// Timed stat modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatModifier {
    pub stat: StatKind,
    pub op: ModifierOp,
    pub power: Fp,
    pub start_time: Fp,
    pub duration: Fp,
    pub negative: bool,
}

impl StatModifier {
    pub fn is_active(&self, now: Fp) -> bool {
        now >= self.start_time && (self.duration == Fp::MAX || now < self.start_time + self.duration)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cosmetics {
    pub skin: Option<u32>,
    pub death_marker: Option<u32>,
    pub glider: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AimState {
    /// Facing angle in radians, interpolated toward the desired aim
    pub angle: Fp,
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collecting {
    pub item: EntityHandle,
    pub end_time: Fp,
}

/// Combatant stats, inventory and status flags
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub team: i32,
    pub alive: bool,
    pub stunned: bool,
    pub attackable: bool,
    pub is_bot: bool,
    pub health: Fp,
    pub max_health: Fp,
    pub shield: Fp,
    pub max_shield: Fp,
    pub ammo: Fp,
    pub max_ammo: Fp,
    /// Stat movement speed
    pub speed: Fp,
    /// Current movement cap applied by the controller
    pub max_speed: Fp,
    pub weapon_slots: [Option<WeaponSlot>; WEAPON_SLOT_COUNT],
    pub current_slot: usize,
    pub specials: [Special; SPECIAL_SLOT_COUNT],
    pub equipment_count: u8,
    pub max_equipment: u8,
    pub taking_circle_damage: bool,
    pub collecting: Option<Collecting>,
    pub spawn_time: Fp,
    pub skill_rating: u32,
    pub modifiers: SmallVec<[StatModifier; 2]>,
    pub cosmetics: Cosmetics,
    pub aim: AimState,
    pub kills: u32,
    pub eliminated_at: Option<Fp>,
    /// Downed but not out; teammates can still revive
    pub knocked_out: Option<KnockedOut>,
    pub times_knocked_out: u8,
}

/// What a hit did to its victim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Ignored,
    Hurt,
    KnockedOut,
    Eliminated,
}

impl Character {
    pub fn new(team: i32) -> Self {
        Self {
            team,
            alive: true,
            stunned: false,
            attackable: true,
            is_bot: false,
            health: DEFAULT_MAX_HEALTH,
            max_health: DEFAULT_MAX_HEALTH,
            shield: Fp::ZERO,
            max_shield: DEFAULT_MAX_SHIELD,
            ammo: DEFAULT_MAX_AMMO,
            max_ammo: DEFAULT_MAX_AMMO,
            speed: DEFAULT_SPEED,
            max_speed: DEFAULT_SPEED,
            weapon_slots: [None; WEAPON_SLOT_COUNT],
            current_slot: MELEE_SLOT,
            specials: [Special::default(); SPECIAL_SLOT_COUNT],
            equipment_count: 0,
            max_equipment: DEFAULT_MAX_EQUIPMENT,
            taking_circle_damage: false,
            collecting: None,
            spawn_time: Fp::ZERO,
            skill_rating: 0,
            modifiers: SmallVec::new(),
            cosmetics: Cosmetics::default(),
            aim: AimState::default(),
            kills: 0,
            eliminated_at: None,
            knocked_out: None,
            times_knocked_out: 0,
        }
    }

    pub fn is_knocked_out(&self) -> bool {
        self.knocked_out.is_some()
    }

    pub fn is_being_revived(&self) -> bool {
        self.knocked_out.as_ref().is_some_and(|k| !k.revivers.is_empty())
    }

    /// Alive and on its feet
    pub fn is_standing(&self) -> bool {
        self.alive && self.knocked_out.is_none()
    }

    fn ratio(value: Fp, max: Fp) -> Fp {
        if max <= Fp::ZERO { Fp::ZERO } else { value / max }
    }

    pub fn health_ratio(&self) -> Fp {
        Self::ratio(self.health, self.max_health)
    }

    pub fn shield_ratio(&self) -> Fp {
        Self::ratio(self.shield, self.max_shield)
    }

    pub fn ammo_ratio(&self) -> Fp {
        Self::ratio(self.ammo, self.max_ammo)
    }

    /// Effective hit points (health plus shield) over max health
    pub fn vitality_ratio(&self) -> Fp {
        Self::ratio(self.health + self.shield, self.max_health)
    }

    pub fn current_weapon(&self) -> Option<&WeaponSlot> {
        self.weapon_slots.get(self.current_slot).and_then(Option::as_ref)
    }

    /// True when holding the melee weapon or nothing at all
    pub fn has_melee_weapon_equipped(&self) -> bool {
        self.current_weapon().map_or(true, |w| w.melee)
    }

    pub fn attack_range(&self) -> Fp {
        self.current_weapon().map_or(Fp::ZERO, |w| w.range)
    }

    pub fn has_ranged_weapon(&self) -> bool {
        self.weapon_slots.iter().flatten().any(|w| !w.melee)
    }

    pub fn holds_weapon(&self, id: WeaponId) -> Option<&WeaponSlot> {
        self.weapon_slots.iter().flatten().find(|w| w.id == id)
    }

    pub fn has_golden_weapon(&self) -> bool {
        self.weapon_slots.iter().flatten().any(|w| w.golden)
    }

    /// Switch to a slot holding a weapon
    pub fn equip_slot(&mut self, slot: usize) -> bool {
        if self.weapon_slots.get(slot).is_some_and(Option::is_some) {
            self.current_slot = slot;
            true
        } else {
            false
        }
    }

    /// Damage multiplier applied to outgoing hits
    pub fn damage_done_factor(&self, now: Fp) -> Fp {
        self.modifiers
            .iter()
            .filter(|m| m.stat == StatKind::Power && m.op == ModifierOp::Multiply && m.is_active(now))
            .fold(Fp::ONE, |acc, m| acc * (Fp::ONE - m.power))
    }

    /// Damage multiplier applied to incoming hits
    pub fn damage_taken_factor(&self, now: Fp) -> Fp {
        let armour = self
            .modifiers
            .iter()
            .filter(|m| m.stat == StatKind::Armour && m.op == ModifierOp::Add && m.is_active(now))
            .fold(Fp::ZERO, |acc, m| if m.negative { acc - m.power } else { acc + m.power });
        (Fp::ONE - armour / Fp::from_int(100)).max(Fp::ZERO)
    }

    /// Shield first, then health; true once health is gone
    fn absorb_damage(&mut self, amount: Fp) -> bool {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.health -= amount - absorbed;
        if self.health <= Fp::ZERO {
            self.health = Fp::ZERO;
            return true;
        }
        false
    }

    fn eliminate(&mut self, now: Fp) {
        self.health = Fp::ZERO;
        self.alive = false;
        self.aim.pressed = false;
        self.collecting = None;
        self.knocked_out = None;
        self.eliminated_at = Some(now);
    }

    fn knock_out(&mut self, now: Fp, by: Option<EntityHandle>) {
        self.health = self.max_health * LIFE_ON_KNOCKED_OUT;
        self.shield = Fp::ZERO;
        self.aim.pressed = false;
        self.collecting = None;
        self.knocked_out = Some(KnockedOut::new(now, by));
        self.times_knocked_out = self.times_knocked_out.saturating_add(1);
    }

    /// Back on its feet with `fraction` of max health
    pub fn revive(&mut self, fraction: Fp) {
        self.knocked_out = None;
        self.health = (self.max_health * fraction).max(Fp::EPSILON);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumableKind {
    Ammo,
    Health,
    Shield,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestKind {
    Equipment,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectableKind {
    Weapon { id: WeaponId, rarity: u8, golden: bool },
    Consumable(ConsumableKind),
    Chest(ChestKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collector {
    pub entity: EntityHandle,
    pub end_time: Fp,
}

/// Pickup-able world object
#[derive(Debug, Clone, PartialEq)]
pub struct Collectable {
    pub kind: CollectableKind,
    /// Bot that committed to this pickup
    pub reserved_by: Option<EntityHandle>,
    pub collectors: SmallVec<[Collector; 2]>,
}

impl Collectable {
    pub fn new(kind: CollectableKind) -> Self {
        Self { kind, reserved_by: None, collectors: SmallVec::new() }
    }

    pub fn is_collecting(&self, entity: EntityHandle) -> bool {
        self.collectors.iter().any(|c| c.entity == entity)
    }

    pub fn collecting_end_time(&self, entity: EntityHandle) -> Option<Fp> {
        self.collectors.iter().find(|c| c.entity == entity).map(|c| c.end_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerKind {
    Player,
    AnyBot,
    BotOfType(BehaviourType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSpawner {
    pub kind: SpawnerKind,
    pub activation_time: Fp,
}

// ============================================================================
// World
// ============================================================================

pub struct World {
    pub entities: EntityArena,
    pub transforms: ComponentColumn<Transform>,
    pub characters: ComponentColumn<Character>,
    pub collectables: ComponentColumn<Collectable>,
    pub bots: ComponentColumn<BotState>,
    pub spawners: ComponentColumn<PlayerSpawner>,
    pub chunks: CollectableChunks,
    pub circle: Option<ShrinkingCircle>,
    pub time: Fp,
    pub tick: u64,
    pub delta_time: Fp,
}

impl World {
    pub fn new(chunk_size: Fp, delta_time: Fp) -> Self {
        Self {
            entities: EntityArena::new(),
            transforms: ComponentColumn::new(),
            characters: ComponentColumn::new(),
            collectables: ComponentColumn::new(),
            bots: ComponentColumn::new(),
            spawners: ComponentColumn::new(),
            chunks: CollectableChunks::new(chunk_size),
            circle: None,
            time: Fp::ZERO,
            tick: 0,
            delta_time,
        }
    }

    /// Advance the clock by one tick
    pub fn advance(&mut self) {
        self.tick += 1;
        self.time += self.delta_time;
    }

    pub fn spawn(&mut self, transform: Transform) -> EntityHandle {
        let handle = self.entities.create();
        self.transforms.insert(handle.index(), transform);
        handle
    }

    pub fn spawn_character(&mut self, position: Vec2, mut character: Character) -> EntityHandle {
        let handle = self.spawn(Transform::at(position));
        character.spawn_time = self.time;
        self.characters.insert(handle.index(), character);
        handle
    }

    pub fn spawn_collectable(&mut self, position: Vec2, kind: CollectableKind) -> EntityHandle {
        let handle = self.spawn(Transform::at(position));
        self.collectables.insert(handle.index(), Collectable::new(kind));
        self.chunks.insert(handle, position);
        handle
    }

    pub fn spawn_spawner(&mut self, position: Vec2, spawner: PlayerSpawner) -> EntityHandle {
        let handle = self.spawn(Transform::at(position));
        self.spawners.insert(handle.index(), spawner);
        handle
    }

    /// Destroy an entity and every component attached to it
    ///
    /// A removed bot releases its pickup reservation; its invalid-target memo
    /// is dropped with the state.
    pub fn despawn(&mut self, handle: EntityHandle) -> bool {
        if !self.entities.contains(handle) {
            return false;
        }
        let index = handle.index();
        if let Some(bot) = self.bots.remove(index) {
            self.release_claim(handle, bot.move_target);
        }
        if self.collectables.remove(index).is_some() {
            self.chunks.remove(handle);
        }
        self.transforms.remove(index);
        self.characters.remove(index);
        self.spawners.remove(index);
        self.entities.destroy(handle)
    }

    #[inline]
    pub fn exists(&self, handle: EntityHandle) -> bool {
        self.entities.contains(handle)
    }

    pub fn transform(&self, handle: EntityHandle) -> Option<&Transform> {
        if self.exists(handle) { self.transforms.get(handle.index()) } else { None }
    }

    pub fn transform_mut(&mut self, handle: EntityHandle) -> Option<&mut Transform> {
        if self.exists(handle) { self.transforms.get_mut(handle.index()) } else { None }
    }

    pub fn position(&self, handle: EntityHandle) -> Option<Vec2> {
        self.transform(handle).map(|t| t.position)
    }

    pub fn character(&self, handle: EntityHandle) -> Option<&Character> {
        if self.exists(handle) { self.characters.get(handle.index()) } else { None }
    }

    pub fn character_mut(&mut self, handle: EntityHandle) -> Option<&mut Character> {
        if self.exists(handle) { self.characters.get_mut(handle.index()) } else { None }
    }

    pub fn collectable(&self, handle: EntityHandle) -> Option<&Collectable> {
        if self.exists(handle) { self.collectables.get(handle.index()) } else { None }
    }

    pub fn collectable_mut(&mut self, handle: EntityHandle) -> Option<&mut Collectable> {
        if self.exists(handle) { self.collectables.get_mut(handle.index()) } else { None }
    }

    pub fn bot(&self, handle: EntityHandle) -> Option<&BotState> {
        if self.exists(handle) { self.bots.get(handle.index()) } else { None }
    }

    pub fn bot_mut(&mut self, handle: EntityHandle) -> Option<&mut BotState> {
        if self.exists(handle) { self.bots.get_mut(handle.index()) } else { None }
    }

    /// Exists and has a living character
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.character(handle).is_some_and(|c| c.alive)
    }

    pub fn team_of(&self, handle: EntityHandle) -> Option<i32> {
        self.character(handle).map(|c| c.team)
    }

    /// Characters in ascending slot order
    pub fn characters_iter(&self) -> impl Iterator<Item = (EntityHandle, &Character)> {
        self.characters
            .iter()
            .filter_map(|(index, c)| self.entities.handle_at(index).map(|h| (h, c)))
    }

    /// Other members of `team`, in ascending slot order
    pub fn team_members(&self, team: i32, except: EntityHandle) -> SmallVec<[EntityHandle; 4]> {
        self.characters_iter()
            .filter(|(h, c)| c.team == team && *h != except)
            .map(|(h, _)| h)
            .collect()
    }

    /// Reserve a pickup for `bot`
    pub fn claim(&mut self, bot: EntityHandle, item: EntityHandle) {
        if let Some(collectable) = self.collectable_mut(item) {
            collectable.reserved_by = Some(bot);
        }
    }

    /// Drop `bot`'s reservation on its current move target, if any
    pub fn release_claim(&mut self, bot: EntityHandle, target: Option<MoveTarget>) {
        let Some(MoveTarget::Entity(item)) = target else {
            return;
        };
        if let Some(collectable) = self.collectable_mut(item) {
            if collectable.reserved_by == Some(bot) {
                collectable.reserved_by = None;
            }
        }
    }

    /// Activate a special ability slot, aimed at `aim`
    ///
    /// Returns false if the slot is empty, out of charges or cooling down.
    pub fn activate_special(&mut self, entity: EntityHandle, slot: usize, aim: Vec2) -> bool {
        let now = self.time;
        let Some(character) = self.character_mut(entity) else {
            return false;
        };
        let Some(special) = character.specials.get_mut(slot) else {
            return false;
        };
        let kind = special.kind;
        if !special.try_activate(now) {
            return false;
        }
        let team = character.team;

        if kind.is_self_buff() {
            character.shield = (character.shield + SPECIAL_SHIELD_AMOUNT).min(character.max_shield);
            return true;
        }

        let radius_sq = SPECIAL_BLAST_RADIUS * SPECIAL_BLAST_RADIUS;
        let factor = character.damage_done_factor(now);
        let victims: SmallVec<[(EntityHandle, Fp); 4]> = self
            .characters_iter()
            .filter(|(handle, c)| {
                c.alive
                    && c.attackable
                    && c.team != team
                    && self.position(*handle).is_some_and(|p| p.distance_sq_to(aim) <= radius_sq)
            })
            .map(|(handle, c)| (handle, SPECIAL_BLAST_DAMAGE * factor * c.damage_taken_factor(now)))
            .collect();

        for (victim, damage) in victims {
            self.apply_damage(victim, Some(entity), damage);
        }
        true
    }

    /// True if another live bot still holds this pickup as its move target
    pub fn is_reserved_by_other(&self, item: EntityHandle, bot: EntityHandle) -> bool {
        let Some(owner) = self.collectable(item).and_then(|c| c.reserved_by) else {
            return false;
        };
        owner != bot
            && self.is_alive(owner)
            && self.bot(owner).is_some_and(|b| b.move_target == Some(MoveTarget::Entity(item)))
    }

    /// True if a teammate of `handle` is still on its feet
    pub fn has_standing_teammate(&self, handle: EntityHandle) -> bool {
        let Some(team) = self.team_of(handle) else {
            return false;
        };
        self.team_members(team, handle)
            .iter()
            .any(|mate| self.character(*mate).is_some_and(Character::is_standing))
    }

    fn can_be_knocked_out(&self, handle: EntityHandle) -> bool {
        self.character(handle)
            .is_some_and(|c| c.is_standing() && c.times_knocked_out < MAX_KNOCKOUTS)
            && self.has_standing_teammate(handle)
    }

    /// Hit a character; knocked-out victims take reduced damage
    pub fn apply_damage(&mut self, victim: EntityHandle, attacker: Option<EntityHandle>, amount: Fp) -> DamageOutcome {
        let knocked = self.character(victim).is_some_and(Character::is_knocked_out);
        let amount = if knocked { amount * KNOCKED_OUT_DAMAGE_FACTOR } else { amount };
        self.deal_damage(victim, attacker, amount)
    }

    /// Hit a character at full strength
    ///
    /// A lethal hit knocks the victim out while a teammate still stands and
    /// knock-outs remain; otherwise it eliminates. Kills go to whoever
    /// knocked the victim out, if anyone did.
    pub(crate) fn deal_damage(&mut self, victim: EntityHandle, attacker: Option<EntityHandle>, amount: Fp) -> DamageOutcome {
        let now = self.time;
        let can_knock_out = self.can_be_knocked_out(victim);
        let Some(character) = self.character_mut(victim) else {
            return DamageOutcome::Ignored;
        };
        if !character.alive || amount <= Fp::ZERO {
            return DamageOutcome::Ignored;
        }
        if !character.absorb_damage(amount) {
            return DamageOutcome::Hurt;
        }
        if can_knock_out {
            character.knock_out(now, attacker);
            self.stop_reviving_by(victim);
            self.on_eliminated_or_downed(victim);
            return DamageOutcome::KnockedOut;
        }

        let killer = character.knocked_out.as_ref().and_then(|k| k.by).or(attacker);
        character.eliminate(now);
        self.credit_kill(killer, victim);
        self.on_eliminated_or_downed(victim);
        self.finish_stranded_knocked_out();
        DamageOutcome::Eliminated
    }

    fn credit_kill(&mut self, killer: Option<EntityHandle>, victim: EntityHandle) {
        if let Some(character) = killer.filter(|k| *k != victim).and_then(|k| self.character_mut(k)) {
            character.kills += 1;
        }
    }

    /// Knocked-out characters with no standing teammate left are eliminated
    fn finish_stranded_knocked_out(&mut self) {
        let stranded: SmallVec<[EntityHandle; 4]> = self
            .characters_iter()
            .filter(|(_, c)| c.alive && c.is_knocked_out())
            .map(|(h, _)| h)
            .filter(|h| !self.has_standing_teammate(*h))
            .collect();
        let now = self.time;
        for handle in stranded {
            let Some(character) = self.character_mut(handle) else {
                continue;
            };
            let killer = character.knocked_out.as_ref().and_then(|k| k.by);
            character.eliminate(now);
            self.credit_kill(killer, handle);
            self.on_eliminated_or_downed(handle);
        }
    }

    /// A downed character stops reviving anyone it was helping
    fn stop_reviving_by(&mut self, reviver: EntityHandle) {
        let now = self.time;
        for (_, character) in self.characters.iter_mut() {
            if let Some(knocked) = character.knocked_out.as_mut() {
                knocked.remove_reviver(reviver, now);
            }
        }
    }

    /// A bot that goes down drops its attack target and pickup claim
    fn on_eliminated_or_downed(&mut self, handle: EntityHandle) {
        let Some(state) = self.bot_mut(handle) else {
            return;
        };
        let previous = state.move_target.take();
        state.target = None;
        state.movement_type = MovementType::None;
        state.stuck_detection_position = None;
        self.release_claim(handle, previous);
    }
}
