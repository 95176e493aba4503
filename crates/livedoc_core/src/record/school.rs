//! Records of the school dashboard collections.

use super::Record;
use crate::document::DocumentId;
use crate::identity::Role;
use serde::{Deserialize, Serialize};

/// A user profile (`users`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Document id (the user's uid).
    #[serde(default)]
    pub id: DocumentId,
    /// Login email.
    pub email: String,
    /// Student or teacher.
    pub role: Role,
    /// Display name.
    pub name: String,
    /// Class the student belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// A single mark (`grades`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Student the mark belongs to.
    pub student_id: String,
    /// Subject name.
    pub subject: String,
    /// Mark on the 2..6 scale.
    pub value: f64,
    /// Date the mark was given.
    pub date: String,
    /// School term.
    pub term: u32,
    /// Teacher remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Whether an absence was excused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceStatus {
    /// Excused absence.
    Excused,
    /// Unexcused absence.
    Unexcused,
}

/// A missed period (`absences`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Absent student.
    pub student_id: String,
    /// Date of the absence.
    pub date: String,
    /// Subject of the missed period.
    pub subject: String,
    /// Period number.
    pub period: u32,
    /// Excused or not.
    pub status: AbsenceStatus,
    /// Teacher who recorded it.
    pub teacher_id: String,
}

/// An assignment (`homework`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Class the assignment is for.
    pub class_id: String,
    /// Subject name.
    pub subject: String,
    /// Short title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Due date.
    pub deadline: String,
    /// Assigning teacher.
    pub teacher_id: String,
    /// Creation timestamp, stamped on write.
    #[serde(default)]
    pub created_at: String,
}

/// Review state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Waiting for a grade.
    Pending,
    /// Graded by the teacher.
    Graded,
}

/// A student's answer to a homework (`submissions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Homework answered.
    pub homework_id: String,
    /// Submitting student.
    pub student_id: String,
    /// Student display name.
    pub student_name: String,
    /// Answer text.
    pub submission_text: String,
    /// Submission timestamp.
    pub submitted_at: String,
    /// Mark, once graded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    /// Teacher feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Review state.
    pub status: SubmissionStatus,
}

/// A notice to a class or the whole school (`announcements`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// Class the announcement targets; everyone when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,
    /// Author id.
    pub teacher_id: String,
    /// Author name.
    pub teacher_name: String,
    /// Creation timestamp, stamped on write.
    #[serde(default)]
    pub created_at: String,
}

/// A direct message (`messages`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Sender id.
    pub from_id: String,
    /// Sender name.
    pub from_name: String,
    /// Sender role.
    pub from_role: Role,
    /// Recipient id.
    pub to_id: String,
    /// Recipient name.
    pub to_name: String,
    /// Recipient role.
    pub to_role: Role,
    /// Subject line.
    pub subject: String,
    /// Body.
    pub content: String,
    /// Creation timestamp, stamped on write.
    #[serde(default)]
    pub created_at: String,
    /// Whether the recipient has read it.
    pub read: bool,
}

/// School day of a timetable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
}

/// One period of the weekly timetable (`timetable`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    /// Document id.
    #[serde(default)]
    pub id: DocumentId,
    /// Day of the week.
    pub day: Weekday,
    /// Period number.
    pub period: u32,
    /// Subject name.
    pub subject: String,
    /// Teacher name.
    pub teacher: String,
    /// Class attending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

macro_rules! impl_record {
    ($($ty:ty => $collection:literal),* $(,)?) => {
        $(
            impl Record for $ty {
                const COLLECTION: &'static str = $collection;

                fn id(&self) -> &DocumentId {
                    &self.id
                }
            }
        )*
    };
}

impl_record! {
    UserProfile => "users",
    Grade => "grades",
    Absence => "absences",
    Homework => "homework",
    Submission => "submissions",
    Announcement => "announcements",
    Message => "messages",
    TimetableSlot => "timetable",
}
