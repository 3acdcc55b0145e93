use serde::{Deserialize, Serialize};

/// A one-shot request from another screen to focus the map on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NavigationTarget {
    Place {
        id: String,
    },
    /// Fly to a territory polygon; `place_id` is focused afterwards when set.
    Territory {
        id: String,
        #[serde(default)]
        place_id: Option<String>,
    },
    /// Leave the map for the territory's detail screen.
    TerritoryDetail {
        id: String,
    },
}

impl NavigationTarget {
    pub fn id(&self) -> &str {
        match self {
            Self::Place { id } | Self::Territory { id, .. } | Self::TerritoryDetail { id } => id,
        }
    }
}

/// Identifies one raised request. Acknowledging with a stale ticket is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Holds at most one pending navigation request.
///
/// The consumer acknowledges with the ticket it was handed, so a request raised
/// while an older one was being handled is never cleared by mistake, and a
/// handled request can never be replayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationSlot {
    pending: Option<(Ticket, NavigationTarget)>,
    raised: u64,
}

impl NavigationSlot {
    /// Replace any pending request with `target`.
    pub fn raise(&mut self, target: NavigationTarget) -> Ticket {
        self.raised += 1;
        let ticket = Ticket(self.raised);
        self.pending = Some((ticket, target));
        ticket
    }

    pub fn pending(&self) -> Option<(Ticket, &NavigationTarget)> {
        self.pending.as_ref().map(|(t, target)| (*t, target))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear the request identified by `ticket`, returning it.
    /// Returns `None` when it was already acknowledged or superseded.
    pub fn acknowledge(&mut self, ticket: Ticket) -> Option<NavigationTarget> {
        match &self.pending {
            Some((current, _)) if *current == ticket => self.pending.take().map(|(_, t)| t),
            _ => None,
        }
    }
}
