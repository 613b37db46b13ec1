use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Certification, CompanyId, InspectionRecord, QuizAttempt, TechnicianRecord};
use super::linkage::LinkageError;

/// Mutating events from upstream producers. Each one appends to the
/// technician's history and triggers a PSR recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RatingEvent {
    CertificationRecorded(Certification),
    InspectionLogged(InspectionRecord),
    QuizAttempted(QuizAttempt),
    IncidentReported { occurred_at: DateTime<Utc> },
    WorkSessionLogged { started_at: DateTime<Utc> },
    Linked { company_id: CompanyId, at: DateTime<Utc> },
    Unlinked { at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingEventError {
    #[error(transparent)]
    Linkage(#[from] LinkageError),
}

impl RatingEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            RatingEvent::CertificationRecorded(_) => "certification_recorded",
            RatingEvent::InspectionLogged(_) => "inspection_logged",
            RatingEvent::QuizAttempted(_) => "quiz_attempted",
            RatingEvent::IncidentReported { .. } => "incident_reported",
            RatingEvent::WorkSessionLogged { .. } => "work_session_logged",
            RatingEvent::Linked { .. } => "linked",
            RatingEvent::Unlinked { .. } => "unlinked",
        }
    }

    pub fn apply(self, record: &mut TechnicianRecord) -> Result<(), RatingEventError> {
        match self {
            RatingEvent::CertificationRecorded(certification) => {
                record.add_certification(certification)
            }
            RatingEvent::InspectionLogged(inspection) => record.add_inspection(inspection),
            RatingEvent::QuizAttempted(attempt) => record.record_quiz_attempt(attempt),
            RatingEvent::IncidentReported { occurred_at } => record.add_incident(occurred_at),
            RatingEvent::WorkSessionLogged { started_at } => record.add_work_session(started_at),
            RatingEvent::Linked { company_id, at } => record.link(company_id, at)?,
            RatingEvent::Unlinked { at } => record.unlink(at)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::domain::{InspectionOutcome, TechnicianId};
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, 7, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn deserializes_tagged_payloads() {
        let event: RatingEvent = serde_json::from_value(json!({
            "type": "certification_recorded",
            "level": 2,
            "verified": true,
            "issued_at": "2024-01-10T00:00:00Z",
            "expires_at": null
        }))
        .expect("certification event parses");
        assert_eq!(event.label(), "certification_recorded");

        let rejected = serde_json::from_value::<RatingEvent>(json!({
            "type": "certification_recorded",
            "level": 5,
            "verified": true,
            "issued_at": "2024-01-10T00:00:00Z"
        }));
        assert!(rejected.is_err());
    }

    #[test]
    fn unlinking_preserves_lifetime_history() {
        let mut record = TechnicianRecord::new(TechnicianId("tech-7".to_string()));
        let events = vec![
            RatingEvent::Linked {
                company_id: CompanyId("acme".to_string()),
                at: at(1),
            },
            RatingEvent::InspectionLogged(InspectionRecord {
                outcome: InspectionOutcome::Passed,
                inspected_at: at(2),
                issuing_company: CompanyId("acme".to_string()),
            }),
            RatingEvent::IncidentReported { occurred_at: at(3) },
            RatingEvent::Unlinked { at: at(4) },
        ];
        for event in events {
            event.apply(&mut record).expect("event applies");
        }

        assert_eq!(record.inspections().len(), 1);
        assert_eq!(record.incidents().len(), 1);
        assert!(!record.linkage().is_active());
    }

    #[test]
    fn double_link_surfaces_linkage_error() {
        let mut record = TechnicianRecord::new(TechnicianId("tech-7".to_string()));
        RatingEvent::Linked {
            company_id: CompanyId("acme".to_string()),
            at: at(1),
        }
        .apply(&mut record)
        .expect("first link");

        let err = RatingEvent::Linked {
            company_id: CompanyId("globex".to_string()),
            at: at(2),
        }
        .apply(&mut record)
        .expect_err("second link fails");
        assert_eq!(
            err,
            RatingEventError::Linkage(LinkageError::AlreadyLinked(CompanyId("acme".to_string())))
        );
    }
}
