//! Match result and ranking
//!
//! Ranks every character once the headless match ends.

use std::collections::BTreeSet;

use crate::game::entity::EntityHandle;
use crate::game::world::World;
use crate::util::fixed::Fp;

/// Match result information
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Last team standing, if exactly one survived
    pub winner_team: Option<i32>,
    pub rankings: Vec<CharacterRanking>,
    pub match_duration: Fp,
    pub total_kills: u32,
    pub end_reason: MatchEndReason,
}

/// One character's placement
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRanking {
    pub entity: EntityHandle,
    pub team: i32,
    pub rank: u32,
    pub kills: u32,
    pub survived: bool,
    pub is_bot: bool,
    pub eliminated_at: Option<Fp>,
}

/// Reason why match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEndReason {
    /// At most one team has living members
    LastTeamStanding,
    /// Tick budget ran out
    TimeLimit,
}

fn alive_teams(world: &World) -> BTreeSet<i32> {
    world
        .characters_iter()
        .filter(|(_, c)| c.alive)
        .map(|(_, c)| c.team)
        .collect()
}

/// Check if match should end
pub fn check_match_end(world: &World, tick_limit: u64) -> Option<MatchEndReason> {
    if alive_teams(world).len() <= 1 {
        return Some(MatchEndReason::LastTeamStanding);
    }
    if world.tick >= tick_limit {
        return Some(MatchEndReason::TimeLimit);
    }
    None
}

/// Determine match result from the world
pub fn determine_result(world: &World, end_reason: MatchEndReason) -> MatchResult {
    let mut rankings: Vec<CharacterRanking> = world
        .characters_iter()
        .map(|(entity, c)| CharacterRanking {
            entity,
            team: c.team,
            rank: 0,
            kills: c.kills,
            survived: c.alive,
            is_bot: c.is_bot,
            eliminated_at: c.eliminated_at,
        })
        .collect();

    // Survivors first, then later eliminations, then kills; slot order breaks ties
    rankings.sort_by(|a, b| {
        b.survived
            .cmp(&a.survived)
            .then_with(|| b.eliminated_at.cmp(&a.eliminated_at))
            .then_with(|| b.kills.cmp(&a.kills))
            .then_with(|| a.entity.index().cmp(&b.entity.index()))
    });

    for (i, ranking) in rankings.iter_mut().enumerate() {
        ranking.rank = (i + 1) as u32;
    }

    let total_kills: u32 = rankings.iter().map(|r| r.kills).sum();

    let teams = alive_teams(world);
    let winner_team = if teams.len() == 1 { teams.first().copied() } else { None };

    MatchResult {
        winner_team,
        rankings,
        match_duration: world.time,
        total_kills,
        end_reason,
    }
}
