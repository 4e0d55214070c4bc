//! Navigation service boundary
//!
//! Bots issue "go to point" requests and react to arrival and failure
//! callbacks. `StraightLineNav` is the reference navigator used by the
//! harness: it walks agents along a straight segment at their movement cap
//! and reports unreachable destinations one step after the request.

use smallvec::SmallVec;

use crate::game::entity::{ComponentColumn, EntityHandle};
use crate::game::physics::Obstacle;
use crate::game::world::World;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;

pub trait Navigation {
    /// Request a path to `target`; false if the request is rejected outright
    fn set_target(&mut self, world: &World, agent: EntityHandle, target: Vec2) -> bool;
    /// Halt the agent where it stands; its velocity drops to zero at once
    fn stop(&mut self, world: &mut World, agent: EntityHandle, reset_path: bool);
    fn is_active(&self, agent: EntityHandle) -> bool;
    fn waypoint_count(&self, agent: EntityHandle) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    WaypointReached { agent: EntityHandle, waypoint: Vec2, is_final: bool },
    SearchFailed { agent: EntityHandle },
}

#[derive(Debug, Clone, Default)]
struct NavAgent {
    handle: Option<EntityHandle>,
    waypoints: SmallVec<[Vec2; 2]>,
    active: bool,
    failed: bool,
}

/// Straight-line navigator over an open square map
pub struct StraightLineNav {
    agents: ComponentColumn<NavAgent>,
    /// Half edge of the walkable square centred on the origin
    half_extent: Fp,
    blocked: Vec<Obstacle>,
    /// Distance at which a waypoint counts as reached
    arrival_radius: Fp,
}

impl StraightLineNav {
    pub fn new(half_extent: Fp, blocked: Vec<Obstacle>) -> Self {
        Self {
            agents: ComponentColumn::new(),
            half_extent,
            blocked,
            arrival_radius: Fp::from_milli(100),
        }
    }

    fn in_bounds(&self, point: Vec2) -> bool {
        point.x.abs() <= self.half_extent && point.y.abs() <= self.half_extent
    }

    fn agent(&self, handle: EntityHandle) -> Option<&NavAgent> {
        self.agents.get(handle.index()).filter(|a| a.handle == Some(handle))
    }

    fn agent_mut(&mut self, handle: EntityHandle) -> Option<&mut NavAgent> {
        self.agents.get_mut(handle.index()).filter(|a| a.handle == Some(handle))
    }

    /// Move agents one tick and collect callbacks in agent index order
    pub fn step(&mut self, world: &mut World, dt: Fp) -> Vec<NavEvent> {
        let mut events = Vec::new();
        let arrival_sq = self.arrival_radius * self.arrival_radius;

        for (_, agent) in self.agents.iter_mut() {
            let Some(handle) = agent.handle else {
                continue;
            };
            if !world.is_alive(handle) {
                agent.active = false;
                agent.waypoints.clear();
                halt(world, handle);
                continue;
            }
            if agent.failed {
                agent.failed = false;
                agent.active = false;
                agent.waypoints.clear();
                halt(world, handle);
                events.push(NavEvent::SearchFailed { agent: handle });
                continue;
            }
            if !agent.active {
                halt(world, handle);
                continue;
            }
            let Some(&waypoint) = agent.waypoints.first() else {
                agent.active = false;
                halt(world, handle);
                continue;
            };

            let max_speed = world.character(handle).map_or(Fp::ZERO, |c| c.max_speed);
            let Some(transform) = world.transform_mut(handle) else {
                continue;
            };
            let next = transform.position.move_towards(waypoint, max_speed * dt);
            transform.velocity = if dt > Fp::ZERO { (next - transform.position) / dt } else { Vec2::ZERO };
            transform.position = next;

            if next.distance_sq_to(waypoint) <= arrival_sq {
                agent.waypoints.remove(0);
                let is_final = agent.waypoints.is_empty();
                if is_final {
                    agent.active = false;
                    transform.velocity = Vec2::ZERO;
                }
                events.push(NavEvent::WaypointReached { agent: handle, waypoint, is_final });
            }
        }

        events
    }
}

fn halt(world: &mut World, agent: EntityHandle) {
    if let Some(transform) = world.transform_mut(agent) {
        transform.velocity = Vec2::ZERO;
    }
}

impl Navigation for StraightLineNav {
    fn set_target(&mut self, world: &World, agent: EntityHandle, target: Vec2) -> bool {
        if !self.in_bounds(target) || !world.is_alive(agent) {
            return false;
        }
        let unreachable = self.blocked.iter().any(|o| o.contains(target));

        let mut state = NavAgent { handle: Some(agent), ..NavAgent::default() };
        if unreachable {
            // Search runs asynchronously; failure is reported on the next step
            state.failed = true;
        } else {
            state.waypoints.push(target);
            state.active = true;
        }
        self.agents.insert(agent.index(), state);
        true
    }

    fn stop(&mut self, world: &mut World, agent: EntityHandle, reset_path: bool) {
        if let Some(state) = self.agent_mut(agent) {
            state.active = false;
            state.failed = false;
            if reset_path {
                state.waypoints.clear();
            }
        }
        halt(world, agent);
    }

    fn is_active(&self, agent: EntityHandle) -> bool {
        self.agent(agent).is_some_and(|a| a.active || a.failed)
    }

    fn waypoint_count(&self, agent: EntityHandle) -> usize {
        self.agent(agent).map_or(0, |a| a.waypoints.len())
    }
}
