use crate::infra::{build_rating_service, MemoryRatingService};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use rope_safety::error::AppError;
use rope_safety::ratings::{
    AcknowledgmentDocument, Certification, CertificationLevel, CompanyId, InspectionOutcome,
    InspectionRecord, PsrSnapshot, QuizAttempt, QuizDefinition, QuizId, RatingEvent, RatingPolicy,
    TechnicianId, WorkforceSafetyScore,
};
use serde::Serialize;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the seeded ratings as JSON instead of a text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    ratings: Vec<PsrSnapshot>,
    workforce: Vec<WorkforceSafetyScore>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_rating_service(RatingPolicy::default());
    let report = seed_demo(&service)?;

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Demo payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_report(&report);
    Ok(())
}

fn seed_demo(service: &MemoryRatingService) -> Result<DemoReport, AppError> {
    for document in [
        AcknowledgmentDocument::HealthAndSafetyManual,
        AcknowledgmentDocument::SafeWorkProcedures,
    ] {
        service.publish_quiz(QuizDefinition::employer_document(cliffside(), document))?;
    }

    let mut ratings = Vec::new();

    // Independent technician with a level 2 ticket and no employer.
    let solo = TechnicianId("tech-solo".to_string());
    ratings.push(seed(service, &solo, independent_history())?);

    // The same history, then linked to cliffside with one incident on record.
    let linked = TechnicianId("tech-cliffside".to_string());
    let mut events = independent_history();
    events.push(RatingEvent::Linked {
        company_id: cliffside(),
        at: days_ago(30),
    });
    let manual = QuizDefinition::employer_document(
        cliffside(),
        AcknowledgmentDocument::HealthAndSafetyManual,
    );
    events.push(passed_quiz(manual.quiz_id));
    events.push(RatingEvent::WorkSessionLogged {
        started_at: days_ago(10),
    });
    events.push(RatingEvent::IncidentReported {
        occurred_at: days_ago(5),
    });
    ratings.push(seed(service, &linked, events)?);

    // Three technicians on the harbourside crew.
    let crew = [
        ("tech-harbour-1", crew_history(Some(365), 2, 0, 2, 2)),
        ("tech-harbour-2", crew_history(Some(365), 8, 2, 1, 1)),
        ("tech-harbour-3", crew_history(None, 1, 1, 1, 1)),
    ];
    for (id, events) in crew {
        ratings.push(seed(service, &TechnicianId(id.to_string()), events)?);
    }

    let workforce = [cliffside(), harbourside()]
        .iter()
        .map(|company| service.workforce_safety_score(company))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DemoReport { ratings, workforce })
}

fn seed(
    service: &MemoryRatingService,
    id: &TechnicianId,
    events: Vec<RatingEvent>,
) -> Result<PsrSnapshot, AppError> {
    let mut snapshot = service.register_technician(id.clone())?;
    for event in events {
        snapshot = service.apply(id, event)?;
    }
    Ok(snapshot)
}

fn render_report(report: &DemoReport) {
    println!("Personal safety ratings");
    for rating in &report.ratings {
        println!(
            "- {}: {:.2} ({}, {} weights)",
            rating.technician_id,
            rating.score,
            rating.tier.label(),
            rating.scheme.label()
        );
        let components = &rating.components;
        println!(
            "    certification {:.0} | safety docs {} | quizzes {} | work history {}",
            components.certification,
            format_component(components.safety_docs),
            format_component(components.quizzes),
            format_component(components.work_history)
        );
    }

    println!("\nWorkforce safety scores");
    for score in &report.workforce {
        println!(
            "- {}: {:.2} across {} linked technicians",
            score.company_id, score.score, score.technician_count
        );
    }
}

fn format_component(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{score:.1}"),
        None => "n/a".to_string(),
    }
}

fn cliffside() -> CompanyId {
    CompanyId("cliffside-access".to_string())
}

fn harbourside() -> CompanyId {
    CompanyId("harbourside-rope".to_string())
}

fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

fn passed_quiz(quiz_id: QuizId) -> RatingEvent {
    RatingEvent::QuizAttempted(QuizAttempt {
        quiz_id,
        passed: true,
        attempted_at: Utc::now(),
    })
}

fn inspections(passed: usize, failed: usize) -> impl Iterator<Item = RatingEvent> {
    std::iter::repeat(InspectionOutcome::Passed)
        .take(passed)
        .chain(std::iter::repeat(InspectionOutcome::Failed).take(failed))
        .enumerate()
        .map(|(index, outcome)| {
            RatingEvent::InspectionLogged(InspectionRecord {
                outcome,
                inspected_at: days_ago(100 - index as i64),
                issuing_company: harbourside(),
            })
        })
}

fn independent_history() -> Vec<RatingEvent> {
    let mut events = vec![RatingEvent::CertificationRecorded(Certification {
        level: CertificationLevel::Level2,
        verified: true,
        issued_at: days_ago(200),
        expires_at: Some(Utc::now() + Duration::days(365)),
    })];
    events.extend(inspections(8, 2));
    events.extend(
        ["l1-harness-inspection", "l1-rope-systems", "l2-rescue-techniques"]
            .map(|id| passed_quiz(QuizId(id.to_string()))),
    );
    events
}

fn crew_history(
    expires_in_days: Option<i64>,
    passed: usize,
    failed: usize,
    quizzes_passed: usize,
    incidents: usize,
) -> Vec<RatingEvent> {
    let mut events = vec![RatingEvent::CertificationRecorded(Certification {
        level: CertificationLevel::Level1,
        verified: true,
        issued_at: days_ago(90),
        expires_at: expires_in_days.map(|days| Utc::now() + Duration::days(days)),
    })];
    events.extend(inspections(passed, failed));
    events.extend(
        ["l1-harness-inspection", "l1-rope-systems"]
            .into_iter()
            .take(quizzes_passed)
            .map(|id| passed_quiz(QuizId(id.to_string()))),
    );
    events.push(RatingEvent::Linked {
        company_id: harbourside(),
        at: days_ago(30),
    });
    events.push(RatingEvent::WorkSessionLogged {
        started_at: days_ago(10),
    });
    events.extend(
        std::iter::repeat_with(|| RatingEvent::IncidentReported {
            occurred_at: days_ago(5),
        })
        .take(incidents),
    );
    events
}
