use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Planning,
    Active,
    Done,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Active => "Active",
            Self::Done => "Done",
            Self::OnHold => "OnHold",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn as_hebrew(&self) -> &'static str {
        match self {
            Self::Planning => "תכנון",
            Self::Active => "פעיל",
            Self::Done => "הושלם",
            Self::OnHold => "בהמתנה",
            Self::Cancelled => "בוטל",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Planning" | "planning" | "תכנון" => Some(Self::Planning),
            "Active" | "active" | "פעיל" => Some(Self::Active),
            "Done" | "done" | "הושלם" => Some(Self::Done),
            "OnHold" | "on_hold" | "on-hold" | "בהמתנה" => Some(Self::OnHold),
            "Cancelled" | "cancelled" | "בוטל" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A labeled WhatsApp number on a client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappNumber {
    pub label: String,
    pub number: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// Client sub-record embedded in a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub whatsapp_numbers: Vec<WhatsappNumber>,
}

impl Client {
    /// Mark one number as primary and clear the flag on all others.
    /// This is the only place the at-most-one-primary rule is applied;
    /// plain updates leave the flags as given.
    pub fn set_primary_whatsapp(&mut self, number: &str) -> bool {
        let found = self.whatsapp_numbers.iter().any(|w| w.number == number);
        if found {
            for w in &mut self.whatsapp_numbers {
                w.is_primary = w.number == number;
            }
        }
        found
    }

    pub fn primary_whatsapp(&self) -> Option<&WhatsappNumber> {
        self.whatsapp_numbers
            .iter()
            .find(|w| w.is_primary)
            .or_else(|| self.whatsapp_numbers.first())
    }
}

/// Payment sub-record embedded in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub message: String,
    pub remind_at: NaiveDateTime,
    #[serde(default)]
    pub dismissed: bool,
}

impl Reminder {
    pub fn new(message: impl Into<String>, remind_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            remind_at,
            dismissed: false,
        }
    }
}

/// A client project with optional client, payment and reminder records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub folder_path: Option<String>,
    #[serde(default)]
    pub client: Option<Client>,
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::Planning,
            priority: Priority::Medium,
            start_date: now.date(),
            due_date: None,
            folder_path: None,
            client: None,
            payment: None,
            tags: Vec::new(),
            reminders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
