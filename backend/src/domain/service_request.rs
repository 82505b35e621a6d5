//! Service requests: a member asking for help. Write-only.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;

use super::category::Category;
use super::ids::UserId;

/// Validation failures for the post-request form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceRequestValidationError {
    /// Category missing or unknown.
    #[error("choose a category")]
    InvalidCategory,
    /// Date missing or not `YYYY-MM-DD`.
    #[error("date needed must be a date")]
    InvalidDate,
    /// Time missing or not `HH:MM`.
    #[error("time needed must be a time")]
    InvalidTime,
    /// Duration blank.
    #[error("duration is required")]
    MissingDuration,
}

impl ServiceRequestValidationError {
    /// Form field the error belongs to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidCategory => "category",
            Self::InvalidDate => "dateNeeded",
            Self::InvalidTime => "timeNeeded",
            Self::MissingDuration => "duration",
        }
    }
}

/// Raw post-request form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceRequestForm {
    /// Category label.
    pub category: String,
    /// Date as `YYYY-MM-DD`.
    pub date_needed: String,
    /// Time as `HH:MM`.
    pub time_needed: String,
    /// Free-text duration, e.g. "2 hours".
    pub duration: String,
    /// Optional details.
    pub details: String,
}

/// A validated service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequestDraft {
    /// Requesting member.
    pub requester_id: UserId,
    /// Category.
    pub category: Category,
    /// Day help is needed.
    pub date_needed: NaiveDate,
    /// Time help is needed.
    pub time_needed: NaiveTime,
    /// Free-text duration.
    pub duration: String,
    /// Free-text details, possibly empty.
    pub details: String,
}

impl ServiceRequestForm {
    /// Validate the form on behalf of `requester_id`.
    pub fn validate(
        &self,
        requester_id: UserId,
    ) -> Result<ServiceRequestDraft, ServiceRequestValidationError> {
        let category = self
            .category
            .parse::<Category>()
            .map_err(|_| ServiceRequestValidationError::InvalidCategory)?;
        let date_needed = NaiveDate::parse_from_str(self.date_needed.trim(), "%Y-%m-%d")
            .map_err(|_| ServiceRequestValidationError::InvalidDate)?;
        let time_needed = parse_time(self.time_needed.trim())
            .ok_or(ServiceRequestValidationError::InvalidTime)?;
        let duration = self.duration.trim();
        if duration.is_empty() {
            return Err(ServiceRequestValidationError::MissingDuration);
        }
        Ok(ServiceRequestDraft {
            requester_id,
            category,
            date_needed,
            time_needed,
            duration: duration.to_owned(),
            details: self.details.trim().to_owned(),
        })
    }
}

// Browsers send `HH:MM`, some send seconds too.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn form() -> ServiceRequestForm {
        ServiceRequestForm {
            category: "Moving Help".to_owned(),
            date_needed: "2026-03-14".to_owned(),
            time_needed: "09:30".to_owned(),
            duration: "2 hours".to_owned(),
            details: String::new(),
        }
    }

    #[rstest]
    fn valid_request(form: ServiceRequestForm) {
        let requester = UserId::random();
        let draft = form.validate(requester).expect("valid");
        assert_eq!(draft.category, Category::MovingHelp);
        assert_eq!(draft.time_needed, NaiveTime::from_hms_opt(9, 30, 0).expect("time"));
        assert_eq!(draft.requester_id, requester);
        assert!(draft.details.is_empty());
    }

    #[rstest]
    fn seconds_are_accepted(mut form: ServiceRequestForm) {
        form.time_needed = "18:05:00".to_owned();
        assert!(form.validate(UserId::random()).is_ok());
    }

    #[rstest]
    #[case(|f: &mut ServiceRequestForm| f.category.clear(), ServiceRequestValidationError::InvalidCategory)]
    #[case(|f: &mut ServiceRequestForm| f.date_needed = "14/03/2026".to_owned(), ServiceRequestValidationError::InvalidDate)]
    #[case(|f: &mut ServiceRequestForm| f.time_needed = "25:00".to_owned(), ServiceRequestValidationError::InvalidTime)]
    #[case(|f: &mut ServiceRequestForm| f.duration.clear(), ServiceRequestValidationError::MissingDuration)]
    fn invalid_requests(
        mut form: ServiceRequestForm,
        #[case] tweak: fn(&mut ServiceRequestForm),
        #[case] expected: ServiceRequestValidationError,
    ) {
        tweak(&mut form);
        assert_eq!(form.validate(UserId::random()), Err(expected));
    }
}
