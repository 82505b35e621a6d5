//! Post-request form.

use serde::Serialize;
use tracing::info;

use crate::domain::auth::Caller;
use crate::domain::ports::BackendPorts;
use crate::domain::service_request::ServiceRequestForm;
use crate::domain::view_state::{FormPhase, FormState};
use crate::domain::Error;

use super::{LOGIN_REQUIRED, field_error};

/// Where the page sends the member after posting.
pub const AFTER_POST: &str = "/";

/// Post-request controller.
#[derive(Debug, Default)]
pub struct PostRequestController {
    form: FormState,
}

/// Post-request form as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequestSnapshot<'a> {
    /// Submission phase.
    #[serde(flatten)]
    pub phase: &'a FormPhase,
    /// Redirect target once submitted.
    pub redirect_to: Option<&'static str>,
}

impl PostRequestController {
    /// A controller with an untouched form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submission phase.
    #[must_use]
    pub const fn phase(&self) -> &FormPhase {
        self.form.phase()
    }

    /// Serialisable view of the form.
    #[must_use]
    pub fn snapshot(&self) -> PostRequestSnapshot<'_> {
        PostRequestSnapshot {
            phase: self.form.phase(),
            redirect_to: matches!(self.form.phase(), FormPhase::Succeeded { .. })
                .then_some(AFTER_POST),
        }
    }
}

/// Validate and insert a service request from the caller.
///
/// # Errors
/// `unauthorized` when signed out, `invalid_request` naming the field, or the
/// backend failure.
pub async fn submit(
    controller: &mut PostRequestController,
    ports: &BackendPorts,
    caller: &Caller,
    form: &ServiceRequestForm,
) -> Result<(), Error> {
    let Some(user) = caller.user() else {
        controller.form.fail(LOGIN_REQUIRED);
        return Err(Error::unauthorized(LOGIN_REQUIRED));
    };
    let draft = match form.validate(user.id) {
        Ok(draft) => draft,
        Err(err) => {
            controller.form.fail(err.to_string());
            return Err(field_error(err.field(), err.to_string()));
        }
    };
    controller.form.begin_submit()?;
    if let Err(err) = ports.requests.insert(caller, &draft).await {
        let error = Error::from(err);
        controller.form.fail(error.message());
        return Err(error);
    }
    info!(requester = %user.id, date = %draft.date_needed, "service request posted");
    controller.form.succeed(None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::pages::test_support::{MockPorts, signed_in, user};
    use crate::domain::ports::ServiceRequestRepositoryError;
    use crate::domain::ErrorCode;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    #[fixture]
    fn form() -> ServiceRequestForm {
        ServiceRequestForm {
            category: "Moving Help".to_owned(),
            date_needed: "2026-05-02".to_owned(),
            time_needed: "14:30".to_owned(),
            duration: "2 hours".to_owned(),
            details: "Couch up three floors".to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn request_is_inserted(form: ServiceRequestForm) {
        let member = user("Bo");
        let member_id = member.id;
        let mut mocks = MockPorts::default();
        mocks
            .requests
            .expect_insert()
            .withf(move |_, draft| {
                draft.requester_id == member_id
                    && draft.category == Category::MovingHelp
                    && NaiveDate::from_ymd_opt(2026, 5, 2) == Some(draft.date_needed)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let ports = mocks.into_ports();
        let mut controller = PostRequestController::new();

        submit(&mut controller, &ports, &signed_in(&member), &form)
            .await
            .expect("posted");

        assert_eq!(controller.phase(), &FormPhase::Succeeded { message: None });
    }

    #[rstest]
    #[tokio::test]
    async fn signed_out_submit_asks_to_log_in(form: ServiceRequestForm) {
        let ports = MockPorts::default().into_ports();
        let mut controller = PostRequestController::new();

        let err = submit(&mut controller, &ports, &Caller::anonymous(), &form)
            .await
            .expect_err("signed out");

        assert_eq!(err.message(), LOGIN_REQUIRED);
    }

    #[rstest]
    #[tokio::test]
    async fn bad_time_names_the_field(mut form: ServiceRequestForm) {
        form.time_needed = "half past two".to_owned();
        let ports = MockPorts::default().into_ports();
        let mut controller = PostRequestController::new();

        let err = submit(&mut controller, &ports, &signed_in(&user("Bo")), &form)
            .await
            .expect_err("bad time");

        assert_eq!(
            err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
            Some("timeNeeded")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn backend_failure_is_reported(form: ServiceRequestForm) {
        let mut mocks = MockPorts::default();
        mocks
            .requests
            .expect_insert()
            .returning(|_, _| Err(ServiceRequestRepositoryError::unavailable("timeout")));
        let ports = mocks.into_ports();
        let mut controller = PostRequestController::new();

        let err = submit(&mut controller, &ports, &signed_in(&user("Bo")), &form)
            .await
            .expect_err("down");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert!(matches!(controller.phase(), FormPhase::Failed { .. }));
    }
}
