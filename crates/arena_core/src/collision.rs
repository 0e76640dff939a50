//! Inter-agent contact rules.
//!
//! Every tick the world scans all agent pairs and reports each
//! touching pair exactly once to the registered rules. Rules answer
//! with effects instead of mutating the world directly, so a rule
//! never observes a half-applied tick and the world stays in charge
//! of when state actually changes.

use crate::agent::AgentId;
use crate::math::Vec2;

/// A touching agent pair, reported once per unordered pair per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Lower agent id of the pair.
    pub first: AgentId,
    /// Center of the first agent.
    pub first_pos: Vec2,
    /// Higher agent id of the pair.
    pub second: AgentId,
    /// Center of the second agent.
    pub second_pos: Vec2,
}

/// World change requested by a collision rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEffect {
    /// Move an agent to the free corner farthest from a reference
    /// point, zeroing its velocities.
    TeleportFarthestFrom {
        /// Agent to move.
        agent: AgentId,
        /// Point the agent should end up far away from.
        reference: Vec2,
    },
}

/// Hook invoked for every touching agent pair.
pub trait CollisionRule: Send {
    /// React to a contact. Returns the effects to apply after the
    /// scan finishes; most contacts return none.
    fn on_contact(&mut self, contact: Contact) -> Vec<CollisionEffect>;
}

/// Tag rule: when a registered hunter touches its fugitive, the
/// hunter is thrown to the corner farthest from the fugitive.
#[derive(Debug, Default)]
pub struct CatchRule {
    pairs: Vec<(AgentId, AgentId)>,
}

impl CatchRule {
    /// Register one fugitive with any number of hunters.
    #[must_use]
    pub fn new(fugitive: AgentId, hunters: &[AgentId]) -> Self {
        Self {
            pairs: hunters.iter().map(|&h| (fugitive, h)).collect(),
        }
    }
}

impl CollisionRule for CatchRule {
    fn on_contact(&mut self, contact: Contact) -> Vec<CollisionEffect> {
        let mut effects = Vec::new();
        for &(fugitive, hunter) in &self.pairs {
            let forward = contact.first == fugitive && contact.second == hunter;
            let reverse = contact.second == fugitive && contact.first == hunter;
            if !forward && !reverse {
                continue;
            }
            let reference = if forward {
                contact.first_pos
            } else {
                contact.second_pos
            };
            effects.push(CollisionEffect::TeleportFarthestFrom {
                agent: hunter,
                reference,
            });
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: AgentId, second: AgentId) -> Contact {
        Contact {
            first,
            first_pos: Vec2::new(100.0, 100.0),
            second,
            second_pos: Vec2::new(150.0, 100.0),
        }
    }

    #[test]
    fn test_catch_fires_for_either_orientation() {
        let mut rule = CatchRule::new(0, &[1]);

        let effects = rule.on_contact(contact(0, 1));
        assert_eq!(
            effects,
            vec![CollisionEffect::TeleportFarthestFrom {
                agent: 1,
                reference: Vec2::new(100.0, 100.0),
            }]
        );

        // Fugitive reported second: the reference follows it.
        let effects = rule.on_contact(contact(1, 0));
        assert_eq!(
            effects,
            vec![CollisionEffect::TeleportFarthestFrom {
                agent: 1,
                reference: Vec2::new(150.0, 100.0),
            }]
        );
    }

    #[test]
    fn test_unregistered_pairs_ignored() {
        let mut rule = CatchRule::new(0, &[1]);
        assert!(rule.on_contact(contact(0, 2)).is_empty());
        assert!(rule.on_contact(contact(2, 3)).is_empty());
    }

    #[test]
    fn test_multiple_hunters_share_a_fugitive() {
        let mut rule = CatchRule::new(2, &[0, 1]);

        let effects = rule.on_contact(contact(0, 2));
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            effects[0],
            CollisionEffect::TeleportFarthestFrom { agent: 0, .. }
        ));

        let effects = rule.on_contact(contact(1, 2));
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            effects[0],
            CollisionEffect::TeleportFarthestFrom { agent: 1, .. }
        ));
    }
}
