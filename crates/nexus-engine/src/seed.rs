use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use tracing::info;

use nexus_core::directory::NewUser;
use nexus_core::seed::{SeedBatch, SeedComment, SeedHandling, SeedTicket};
use nexus_core::ticket::{Priority, TicketStatus};
use nexus_core::{DeskResult, FeedbackStore, Role};

use crate::credentials::Credentials;

struct DemoUser {
    username: &'static str,
    password: &'static str,
    role: Role,
    display_name: &'static str,
    email: &'static str,
    phone: &'static str,
}

const DEMO_USERS: [DemoUser; 4] = [
    DemoUser {
        username: "student",
        password: "student123",
        role: Role::Student,
        display_name: "Student User",
        email: "student@nexus.edu",
        phone: "555-0100",
    },
    DemoUser {
        username: "dean",
        password: "dean123",
        role: Role::Dean,
        display_name: "Dr. J Dean",
        email: "dean@nexus.edu",
        phone: "555-0200",
    },
    DemoUser {
        username: "faculty1",
        password: "faculty123",
        role: Role::Faculty,
        display_name: "Prof. Alan Grant",
        email: "prof@nexus.edu",
        phone: "555-0300",
    },
    DemoUser {
        username: "admin",
        password: "admin123",
        role: Role::Admin,
        display_name: "System Admin",
        email: "admin@nexus.edu",
        phone: "555-0000",
    },
];

/// What the seeder created, for the startup log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub tickets: usize,
    pub comments: usize,
}

/// Populate an empty directory with demo users, tickets, and comments.
/// Returns `None` without touching anything when any user already exists.
/// The batch is written in one transaction, so a failed seed leaves the
/// database empty and the next start seeds again.
pub fn seed_demo_data<S: FeedbackStore>(
    store: &S,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> DeskResult<Option<SeedReport>> {
    if store.count_users()? > 0 {
        return Ok(None);
    }

    let batch = demo_batch(credentials, now)?;
    if !store.seed_if_empty(&batch)? {
        return Ok(None);
    }

    let report = SeedReport {
        users: batch.users.len(),
        tickets: batch.tickets.len(),
        comments: batch.comments.len(),
    };
    info!(users = report.users, tickets = report.tickets, comments = report.comments, "seeded demo data");
    Ok(Some(report))
}

fn demo_batch(credentials: &Credentials, now: DateTime<Utc>) -> DeskResult<SeedBatch> {
    let users = DEMO_USERS
        .iter()
        .map(|user| -> DeskResult<NewUser> {
            Ok(NewUser {
                username: user.username.to_string(),
                password_hash: credentials.hash(&SecretString::from(user.password.to_string()))?,
                role: user.role,
                display_name: user.display_name.to_string(),
                email: Some(user.email.to_string()),
                phone: Some(user.phone.to_string()),
                created_at: now,
            })
        })
        .collect::<DeskResult<Vec<_>>>()?;
    let (student, dean, faculty) = (0, 1, 2);
    let grant = DEMO_USERS[faculty].display_name;

    let tickets = vec![
        ticket(
            student,
            ("facility", "Projector in Room 304 Malfunction"),
            "The main projector keeps flickering and turning off every 5 minutes.",
            Priority::High,
            now - Duration::days(3),
            Some((TicketStatus::Processing, grant)),
        ),
        ticket(
            student,
            ("academic", "Missing Grade for CS101 Midterm"),
            "I submitted my midterm paper last week but the portal still shows \"Not Submitted\".",
            Priority::Medium,
            now - Duration::days(2),
            None,
        ),
        ticket(
            student,
            ("administrative", "Library ID Card Activation"),
            "My ID card is not working at the library turnstile.",
            Priority::Low,
            now - Duration::days(1),
            Some((TicketStatus::Resolved, grant)),
        ),
    ];
    let (projector, library) = (0, 2);

    let comments = vec![
        SeedComment {
            ticket: projector,
            author: dean,
            body: "Please prioritize this, classes are ongoing in that room.".to_string(),
            created_at: now - Duration::days(2),
        },
        SeedComment {
            ticket: library,
            author: faculty,
            body: "Your card has been reactivated. Try again in 1 hour.".to_string(),
            created_at: now - Duration::hours(12),
        },
    ];

    Ok(SeedBatch { users, tickets, comments })
}

fn ticket(
    author: usize,
    (category, subject): (&str, &str),
    message: &str,
    priority: Priority,
    created_at: DateTime<Utc>,
    handled: Option<(TicketStatus, &str)>,
) -> SeedTicket {
    SeedTicket {
        author,
        category: category.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        priority,
        created_at,
        handled: handled.map(|(status, assignee)| SeedHandling {
            status,
            assigned_to: assignee.to_string(),
            updated_at: created_at + Duration::hours(2),
        }),
    }
}
