//! Pure formatting of the current collections into delimited-text
//! documents: one flat CSV per entity type, or an aggregated multi-sheet
//! report with a computed summary sheet. The whole collection is
//! materialized in one pass; fine at the small-data scale this targets.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::core::project::Project;
use crate::store::Snapshot;

/// Date format used across all exports, matching the he-IL display format.
const DATE_FMT: &str = "%d.%m.%Y";
const TIME_FMT: &str = "%H:%M";

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn fmt_opt_date(date: Option<NaiveDate>) -> String {
    date.map(fmt_date).unwrap_or_default()
}

fn fmt_opt_time(dt: Option<NaiveDateTime>) -> String {
    dt.map(|d| d.format(TIME_FMT).to_string()).unwrap_or_default()
}

fn minutes_to_hours(minutes: i64) -> String {
    let hours = ((minutes as f64) / 60.0 * 100.0).round() / 100.0;
    hours.to_string()
}

fn project_name(projects: &[Project], id: Uuid) -> String {
    projects
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.clone())
        .unwrap_or_default()
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::Writer::from_writer(Vec::new())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| format!("Failed to flush CSV: {}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("CSV output is not UTF-8: {}", e))
}

/// Projects: name, description, status, priority, start date, due date.
pub fn projects_csv(snapshot: &Snapshot) -> Result<String, String> {
    let mut wtr = writer();
    wtr.write_record(["שם", "תיאור", "סטטוס", "עדיפות", "תאריך התחלה", "תאריך יעד"])
        .map_err(|e| format!("Failed to write header: {}", e))?;

    for p in &snapshot.projects {
        wtr.write_record([
            p.name.as_str(),
            p.description.as_str(),
            p.status.as_hebrew(),
            p.priority.as_hebrew(),
            &fmt_date(p.start_date),
            &fmt_opt_date(p.due_date),
        ])
        .map_err(|e| format!("Failed to write project '{}': {}", p.name, e))?;
    }

    finish(wtr)
}

/// Tasks: title, parent project name, status, priority, due date.
pub fn tasks_csv(snapshot: &Snapshot) -> Result<String, String> {
    let mut wtr = writer();
    wtr.write_record(["כותרת", "פרויקט", "סטטוס", "עדיפות", "תאריך יעד"])
        .map_err(|e| format!("Failed to write header: {}", e))?;

    for t in &snapshot.tasks {
        wtr.write_record([
            t.title.as_str(),
            &project_name(&snapshot.projects, t.project_id),
            t.status.as_hebrew(),
            t.priority.as_hebrew(),
            &fmt_opt_date(t.due_date),
        ])
        .map_err(|e| format!("Failed to write task '{}': {}", t.title, e))?;
    }

    finish(wtr)
}

/// Contacts: name, email, phone, joined project names.
pub fn contacts_csv(snapshot: &Snapshot) -> Result<String, String> {
    let mut wtr = writer();
    wtr.write_record(["שם", "אימייל", "טלפון", "פרויקטים"])
        .map_err(|e| format!("Failed to write header: {}", e))?;

    for c in &snapshot.contacts {
        let projects = c
            .project_ids
            .iter()
            .map(|id| project_name(&snapshot.projects, *id))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            c.name.as_str(),
            c.email.as_deref().unwrap_or(""),
            c.phone.as_deref().unwrap_or(""),
            &projects,
        ])
        .map_err(|e| format!("Failed to write contact '{}': {}", c.name, e))?;
    }

    finish(wtr)
}

/// Time entries: task, project, date, start/end time, minutes, description.
pub fn time_entries_csv(snapshot: &Snapshot) -> Result<String, String> {
    let mut wtr = writer();
    wtr.write_record(["משימה", "פרויקט", "תאריך", "שעת התחלה", "שעת סיום", "משך (דקות)", "תיאור"])
        .map_err(|e| format!("Failed to write header: {}", e))?;

    for e in &snapshot.time_entries {
        let task = snapshot.tasks.iter().find(|t| t.id == e.task_id);
        let project = task
            .map(|t| project_name(&snapshot.projects, t.project_id))
            .unwrap_or_default();
        wtr.write_record([
            task.map(|t| t.title.as_str()).unwrap_or(""),
            &project,
            &fmt_date(e.start_time.date()),
            &e.start_time.format(TIME_FMT).to_string(),
            &fmt_opt_time(e.end_time),
            &e.duration_minutes.to_string(),
            e.description.as_deref().unwrap_or(""),
        ])
        .map_err(|err| format!("Failed to write time entry: {}", err))?;
    }

    finish(wtr)
}

/// An aggregated report: one named CSV sheet per entity type plus a
/// computed summary sheet.
#[derive(Debug, Clone)]
pub struct Report {
    sheets: Vec<(String, String)>,
}

impl Report {
    pub fn sheet(&self, name: &str) -> Option<&str> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.as_str())
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// All sheets concatenated into one text document.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (name, content) in &self.sheets {
            out.push_str("=== ");
            out.push_str(name);
            out.push_str(" ===\n");
            out.push_str(content);
            out.push('\n');
        }
        out
    }
}

/// Build the full workbook report with per-sheet join-style lookups.
pub fn workbook(snapshot: &Snapshot) -> Result<Report, String> {
    let mut sheets = Vec::new();

    // Projects sheet, enriched with task/contact counts.
    {
        let mut wtr = writer();
        wtr.write_record([
            "שם הפרויקט",
            "תיאור",
            "סטטוס",
            "עדיפות",
            "תאריך התחלה",
            "תאריך יעד",
            "מספר משימות",
            "משימות הושלמו",
            "אנשי קשר",
        ])
        .map_err(|e| format!("Failed to write header: {}", e))?;

        for p in &snapshot.projects {
            let tasks = snapshot.tasks.iter().filter(|t| t.project_id == p.id);
            let total = tasks.clone().count();
            let done = tasks.filter(|t| t.is_completed()).count();
            let contacts = snapshot
                .contacts
                .iter()
                .filter(|c| c.in_project(p.id))
                .count();
            wtr.write_record([
                p.name.as_str(),
                p.description.as_str(),
                p.status.as_hebrew(),
                p.priority.as_hebrew(),
                &fmt_date(p.start_date),
                &fmt_opt_date(p.due_date),
                &total.to_string(),
                &done.to_string(),
                &contacts.to_string(),
            ])
            .map_err(|e| format!("Failed to write project row: {}", e))?;
        }
        sheets.push(("פרויקטים".to_string(), finish(wtr)?));
    }

    // Tasks sheet with logged-time aggregates.
    {
        let mut wtr = writer();
        wtr.write_record([
            "כותרת",
            "פרויקט",
            "סטטוס",
            "עדיפות",
            "תאריך יעד",
            "זמן מושקע (דקות)",
            "זמן מושקע (שעות)",
            "מספר רשומות זמן",
        ])
        .map_err(|e| format!("Failed to write header: {}", e))?;

        for t in &snapshot.tasks {
            let entries: Vec<_> = snapshot
                .time_entries
                .iter()
                .filter(|e| e.task_id == t.id)
                .collect();
            let minutes: i64 = entries.iter().map(|e| e.duration_minutes).sum();
            wtr.write_record([
                t.title.as_str(),
                &project_name(&snapshot.projects, t.project_id),
                t.status.as_hebrew(),
                t.priority.as_hebrew(),
                &fmt_opt_date(t.due_date),
                &minutes.to_string(),
                &minutes_to_hours(minutes),
                &entries.len().to_string(),
            ])
            .map_err(|e| format!("Failed to write task row: {}", e))?;
        }
        sheets.push(("משימות".to_string(), finish(wtr)?));
    }

    // Contacts sheet.
    {
        let mut wtr = writer();
        wtr.write_record(["שם", "אימייל", "טלפון", "פרויקטים", "מספר פרויקטים"])
            .map_err(|e| format!("Failed to write header: {}", e))?;

        for c in &snapshot.contacts {
            let projects = c
                .project_ids
                .iter()
                .map(|id| project_name(&snapshot.projects, *id))
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            wtr.write_record([
                c.name.as_str(),
                c.email.as_deref().unwrap_or(""),
                c.phone.as_deref().unwrap_or(""),
                &projects,
                &c.project_ids.len().to_string(),
            ])
            .map_err(|e| format!("Failed to write contact row: {}", e))?;
        }
        sheets.push(("אנשי קשר".to_string(), finish(wtr)?));
    }

    // Time-tracking sheet.
    sheets.push(("מעקב זמן".to_string(), time_entries_csv(snapshot)?));

    // Summary sheet of aggregate counts and sums.
    {
        let total_minutes: i64 = snapshot
            .time_entries
            .iter()
            .map(|e| e.duration_minutes)
            .sum();
        let active = snapshot
            .projects
            .iter()
            .filter(|p| p.status.is_active())
            .count();
        let done_projects = snapshot
            .projects
            .iter()
            .filter(|p| matches!(p.status, crate::core::project::ProjectStatus::Done))
            .count();
        let done_tasks = snapshot.tasks.iter().filter(|t| t.is_completed()).count();

        let mut wtr = writer();
        wtr.write_record(["נתון", "ערך"])
            .map_err(|e| format!("Failed to write header: {}", e))?;
        let rows: Vec<(&str, String)> = vec![
            ("סה\"כ פרויקטים", snapshot.projects.len().to_string()),
            ("פרויקטים פעילים", active.to_string()),
            ("פרויקטים הושלמו", done_projects.to_string()),
            ("סה\"כ משימות", snapshot.tasks.len().to_string()),
            ("משימות הושלמו", done_tasks.to_string()),
            ("סה\"כ אנשי קשר", snapshot.contacts.len().to_string()),
            ("סה\"כ זמן מושקע (שעות)", minutes_to_hours(total_minutes)),
            (
                "תאריך יצירת הדוח",
                fmt_date(chrono::Local::now().date_naive()),
            ),
        ];
        for (key, value) in rows {
            wtr.write_record([key, &value])
                .map_err(|e| format!("Failed to write summary row: {}", e))?;
        }
        sheets.push(("סיכום".to_string(), finish(wtr)?));
    }

    Ok(Report { sheets })
}
