use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::linkage::{Linkage, LinkageError};

/// Identifier wrapper for rope-access technicians.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TechnicianId(pub String);

/// Identifier wrapper for employer companies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuizId(pub String);

/// Identifier for a single employment link, stable after the link ends.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub String);

impl fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rope-access certification level. Serialized as the bare number 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CertificationLevel {
    Level1,
    Level2,
    Level3,
}

impl CertificationLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::Level1, Self::Level2, Self::Level3]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level3 => 3,
        }
    }

    /// Certification quizzes unlocked at this level, cumulative with the levels below.
    pub const fn base_quiz_count(self) -> usize {
        match self {
            Self::Level1 => 2,
            Self::Level2 => 4,
            Self::Level3 => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("certification level must be 1, 2 or 3 (found {0})")]
pub struct InvalidCertificationLevel(pub u8);

impl TryFrom<u8> for CertificationLevel {
    type Error = InvalidCertificationLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Level1),
            2 => Ok(Self::Level2),
            3 => Ok(Self::Level3),
            other => Err(InvalidCertificationLevel(other)),
        }
    }
}

impl From<CertificationLevel> for u8 {
    fn from(value: CertificationLevel) -> Self {
        value.number()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub level: CertificationLevel,
    pub verified: bool,
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionOutcome {
    Passed,
    Failed,
}

/// Equipment/safety-document inspection, issued by whichever company ran it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub outcome: InspectionOutcome,
    pub inspected_at: DateTime<Utc>,
    pub issuing_company: CompanyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub quiz_id: QuizId,
    pub passed: bool,
    pub attempted_at: DateTime<Utc>,
}

/// Incident logged against a technician. `link_id` is `None` when it was
/// recorded while the technician had no employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub occurred_at: DateTime<Utc>,
    pub link_id: Option<LinkId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSessionRecord {
    pub started_at: DateTime<Utc>,
    pub link_id: Option<LinkId>,
}

/// Lifetime pass/fail counts across every employer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionTally {
    pub passed: u32,
    pub total: u32,
}

/// A technician's lifetime history plus current employer linkage.
///
/// History is append-only: the only mutators add records (quiz retakes
/// replace the earlier attempt for the same quiz). Nothing here is cleared
/// when the technician links to or unlinks from an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianRecord {
    technician_id: TechnicianId,
    certifications: Vec<Certification>,
    inspections: Vec<InspectionRecord>,
    quiz_attempts: BTreeMap<QuizId, QuizAttempt>,
    incidents: Vec<IncidentRecord>,
    work_sessions: Vec<WorkSessionRecord>,
    linkage: Linkage,
}

impl TechnicianRecord {
    pub fn new(technician_id: TechnicianId) -> Self {
        Self {
            technician_id,
            certifications: Vec::new(),
            inspections: Vec::new(),
            quiz_attempts: BTreeMap::new(),
            incidents: Vec::new(),
            work_sessions: Vec::new(),
            linkage: Linkage::default(),
        }
    }

    pub fn technician_id(&self) -> &TechnicianId {
        &self.technician_id
    }

    pub fn certifications(&self) -> &[Certification] {
        &self.certifications
    }

    pub fn inspections(&self) -> &[InspectionRecord] {
        &self.inspections
    }

    pub fn quiz_attempts(&self) -> impl Iterator<Item = &QuizAttempt> {
        self.quiz_attempts.values()
    }

    pub fn incidents(&self) -> &[IncidentRecord] {
        &self.incidents
    }

    pub fn work_sessions(&self) -> &[WorkSessionRecord] {
        &self.work_sessions
    }

    pub fn linkage(&self) -> &Linkage {
        &self.linkage
    }

    /// Highest level on file; ties go to the most recently issued.
    pub fn primary_certification(&self) -> Option<&Certification> {
        self.certifications
            .iter()
            .max_by(|a, b| a.level.cmp(&b.level).then(a.issued_at.cmp(&b.issued_at)))
    }

    pub fn inspection_tally(&self) -> InspectionTally {
        self.inspections
            .iter()
            .fold(InspectionTally::default(), |mut tally, inspection| {
                tally.total += 1;
                if inspection.outcome == InspectionOutcome::Passed {
                    tally.passed += 1;
                }
                tally
            })
    }

    pub fn incidents_under(&self, link_id: &LinkId) -> usize {
        self.incidents
            .iter()
            .filter(|incident| incident.link_id.as_ref() == Some(link_id))
            .count()
    }

    pub fn work_sessions_under(&self, link_id: &LinkId) -> usize {
        self.work_sessions
            .iter()
            .filter(|session| session.link_id.as_ref() == Some(link_id))
            .count()
    }

    pub(crate) fn add_certification(&mut self, certification: Certification) {
        self.certifications.push(certification);
    }

    pub(crate) fn add_inspection(&mut self, inspection: InspectionRecord) {
        self.inspections.push(inspection);
    }

    /// Keeps one counted attempt per quiz; an older attempt never replaces a newer one.
    pub(crate) fn record_quiz_attempt(&mut self, attempt: QuizAttempt) {
        match self.quiz_attempts.get(&attempt.quiz_id) {
            Some(existing) if existing.attempted_at > attempt.attempted_at => {}
            _ => {
                self.quiz_attempts.insert(attempt.quiz_id.clone(), attempt);
            }
        }
    }

    pub(crate) fn add_incident(&mut self, occurred_at: DateTime<Utc>) {
        let link_id = self.linkage.active_link().map(|link| link.link_id.clone());
        self.incidents.push(IncidentRecord {
            occurred_at,
            link_id,
        });
    }

    pub(crate) fn add_work_session(&mut self, started_at: DateTime<Utc>) {
        let link_id = self.linkage.active_link().map(|link| link.link_id.clone());
        self.work_sessions.push(WorkSessionRecord {
            started_at,
            link_id,
        });
    }

    pub(crate) fn link(
        &mut self,
        company_id: CompanyId,
        at: DateTime<Utc>,
    ) -> Result<(), LinkageError> {
        let sequence = self.linkage.history().len() + 1;
        let link_id = LinkId(format!("{}-link-{sequence}", self.technician_id.0));
        self.linkage.link(link_id, company_id, at).map(|_| ())
    }

    pub(crate) fn unlink(&mut self, at: DateTime<Utc>) -> Result<(), LinkageError> {
        self.linkage.unlink(at).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn certification_level_round_trips_through_number() {
        for level in CertificationLevel::ordered() {
            assert_eq!(CertificationLevel::try_from(level.number()), Ok(level));
        }
        assert_eq!(
            CertificationLevel::try_from(4),
            Err(InvalidCertificationLevel(4))
        );
    }

    #[test]
    fn primary_certification_prefers_highest_level_then_latest() {
        let mut record = TechnicianRecord::new(TechnicianId("tech-1".to_string()));
        assert!(record.primary_certification().is_none());

        record.add_certification(Certification {
            level: CertificationLevel::Level2,
            verified: false,
            issued_at: at(1),
            expires_at: None,
        });
        record.add_certification(Certification {
            level: CertificationLevel::Level2,
            verified: true,
            issued_at: at(5),
            expires_at: None,
        });
        record.add_certification(Certification {
            level: CertificationLevel::Level1,
            verified: true,
            issued_at: at(9),
            expires_at: None,
        });

        let primary = record.primary_certification().expect("primary present");
        assert_eq!(primary.level, CertificationLevel::Level2);
        assert!(primary.verified);
    }

    #[test]
    fn quiz_retake_overwrites_earlier_attempt() {
        let mut record = TechnicianRecord::new(TechnicianId("tech-1".to_string()));
        let quiz_id = QuizId("harness-basics".to_string());
        record.record_quiz_attempt(QuizAttempt {
            quiz_id: quiz_id.clone(),
            passed: false,
            attempted_at: at(1),
        });
        record.record_quiz_attempt(QuizAttempt {
            quiz_id: quiz_id.clone(),
            passed: true,
            attempted_at: at(2),
        });
        // late-arriving stale attempt must not win
        record.record_quiz_attempt(QuizAttempt {
            quiz_id,
            passed: false,
            attempted_at: at(1),
        });

        let attempts: Vec<_> = record.quiz_attempts().collect();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].passed);
    }

    #[test]
    fn incidents_attach_to_the_active_link_only() {
        let mut record = TechnicianRecord::new(TechnicianId("tech-1".to_string()));
        record.add_incident(at(1));
        record
            .link(CompanyId("acme".to_string()), at(2))
            .expect("link succeeds");
        record.add_incident(at(3));

        let link_id = record
            .linkage()
            .active_link()
            .expect("linked")
            .link_id
            .clone();
        assert_eq!(record.incidents().len(), 2);
        assert_eq!(record.incidents_under(&link_id), 1);
    }
}
