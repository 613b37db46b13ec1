use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CompanyId, LinkId};

/// Employment relationship between a technician and a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerLink {
    pub link_id: LinkId,
    pub company_id: CompanyId,
    pub linked_since: DateTime<Utc>,
    #[serde(default)]
    pub unlinked_at: Option<DateTime<Utc>>,
}

impl EmployerLink {
    pub fn active(&self) -> bool {
        self.unlinked_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkageState {
    Unlinked,
    Linked(EmployerLink),
}

/// Raised when a transition is requested from the wrong state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkageError {
    #[error("technician is already linked to {0}")]
    AlreadyLinked(CompanyId),
    #[error("technician is not linked to an employer")]
    NotLinked,
}

/// `Unlinked <-> Linked(company)` state machine plus the ended links.
///
/// The rating engine only reads this; transitions are driven by events
/// coming from the employment workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Linkage {
    state: LinkageState,
    past_links: Vec<EmployerLink>,
}

impl Default for Linkage {
    fn default() -> Self {
        Self {
            state: LinkageState::Unlinked,
            past_links: Vec::new(),
        }
    }
}

impl Linkage {
    pub fn state(&self) -> &LinkageState {
        &self.state
    }

    pub fn active_link(&self) -> Option<&EmployerLink> {
        match &self.state {
            LinkageState::Linked(link) => Some(link),
            LinkageState::Unlinked => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_link().is_some()
    }

    pub fn company(&self) -> Option<&CompanyId> {
        self.active_link().map(|link| &link.company_id)
    }

    /// Ended links followed by the current one, oldest first.
    pub fn history(&self) -> Vec<&EmployerLink> {
        self.past_links.iter().chain(self.active_link()).collect()
    }

    pub fn link(
        &mut self,
        link_id: LinkId,
        company_id: CompanyId,
        at: DateTime<Utc>,
    ) -> Result<&EmployerLink, LinkageError> {
        if let LinkageState::Linked(link) = &self.state {
            return Err(LinkageError::AlreadyLinked(link.company_id.clone()));
        }

        self.state = LinkageState::Linked(EmployerLink {
            link_id,
            company_id,
            linked_since: at,
            unlinked_at: None,
        });

        self.active_link().ok_or(LinkageError::NotLinked)
    }

    pub fn unlink(&mut self, at: DateTime<Utc>) -> Result<&EmployerLink, LinkageError> {
        let mut link = match std::mem::replace(&mut self.state, LinkageState::Unlinked) {
            LinkageState::Linked(link) => link,
            LinkageState::Unlinked => return Err(LinkageError::NotLinked),
        };

        link.unlinked_at = Some(at);
        self.past_links.push(link);
        self.past_links.last().ok_or(LinkageError::NotLinked)
    }
}
