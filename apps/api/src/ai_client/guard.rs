use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::ai_client::{AiAction, AiError};

type Slot = (String, AiAction);

/// At most one request per action type may be in flight within a workspace.
///
/// `acquire` hands out a permit that releases the slot on drop, so a failed or
/// cancelled request never leaves its action locked.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<Slot>>>,
}

pub struct InFlightPermit {
    active: Arc<Mutex<HashSet<Slot>>>,
    slot: Slot,
}

impl InFlightGuard {
    pub fn acquire(&self, workspace: &str, action: AiAction) -> Result<InFlightPermit, AiError> {
        let slot = (workspace.to_string(), action);
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(slot.clone()) {
            return Err(AiError::AlreadyInFlight(action));
        }
        Ok(InFlightPermit {
            active: self.active.clone(),
            slot,
        })
    }

    pub fn is_in_flight(&self, workspace: &str, action: AiAction) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(workspace.to_string(), action))
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WS: &str = "default";

    #[test]
    fn test_second_request_for_same_action_is_rejected() {
        let guard = InFlightGuard::default();
        let _permit = guard.acquire(WS, AiAction::Polish).unwrap();
        assert!(matches!(
            guard.acquire(WS, AiAction::Polish),
            Err(AiError::AlreadyInFlight(AiAction::Polish))
        ));
    }

    #[test]
    fn test_different_actions_run_together() {
        let guard = InFlightGuard::default();
        let _a = guard.acquire(WS, AiAction::Polish).unwrap();
        let _b = guard.acquire(WS, AiAction::AtsScore).unwrap();
        assert!(guard.is_in_flight(WS, AiAction::Polish));
        assert!(guard.is_in_flight(WS, AiAction::AtsScore));
        assert!(!guard.is_in_flight(WS, AiAction::ParseRawText));
    }

    #[test]
    fn test_workspaces_do_not_block_each_other() {
        let guard = InFlightGuard::default();
        let _alice = guard.acquire("alice", AiAction::Polish).unwrap();
        let _bob = guard.acquire("bob", AiAction::Polish).unwrap();
        assert!(guard.is_in_flight("alice", AiAction::Polish));
        assert!(guard.acquire("alice", AiAction::Polish).is_err());
        assert!(!guard.is_in_flight("carol", AiAction::Polish));
    }

    #[test]
    fn test_dropping_permit_releases_action() {
        let guard = InFlightGuard::default();
        let permit = guard.acquire(WS, AiAction::GenerateCoverLetter).unwrap();
        drop(permit);
        assert!(!guard.is_in_flight(WS, AiAction::GenerateCoverLetter));
        assert!(guard.acquire(WS, AiAction::GenerateCoverLetter).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = InFlightGuard::default();
        let other = guard.clone();
        let _permit = guard.acquire(WS, AiAction::Polish).unwrap();
        assert!(other.acquire(WS, AiAction::Polish).is_err());
    }
}
