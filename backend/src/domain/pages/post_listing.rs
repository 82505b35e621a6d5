//! Post-listing form.

use serde::Serialize;
use tracing::info;

use crate::domain::auth::Caller;
use crate::domain::listing::ListingForm;
use crate::domain::ports::BackendPorts;
use crate::domain::view_state::{FormPhase, FormState};
use crate::domain::Error;

use super::{LOGIN_REQUIRED, field_error};

/// Where the page sends the member after posting.
pub const AFTER_POST: &str = "/";

/// Post-listing controller.
#[derive(Debug, Default)]
pub struct PostListingController {
    form: FormState,
}

/// Post-listing form as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListingSnapshot<'a> {
    /// Submission phase.
    #[serde(flatten)]
    pub phase: &'a FormPhase,
    /// Redirect target once submitted.
    pub redirect_to: Option<&'static str>,
}

impl PostListingController {
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
    pub fn snapshot(&self) -> PostListingSnapshot<'_> {
        PostListingSnapshot {
            phase: self.form.phase(),
            redirect_to: matches!(self.form.phase(), FormPhase::Succeeded { .. })
                .then_some(AFTER_POST),
        }
    }
}

/// Validate and insert a listing provided by the caller.
///
/// Backend errors are shown verbatim.
///
/// # Errors
/// `unauthorized` when signed out, `invalid_request` naming the field, or the
/// backend failure.
pub async fn submit(
    controller: &mut PostListingController,
    ports: &BackendPorts,
    caller: &Caller,
    form: &ListingForm,
) -> Result<(), Error> {
    let Some(user) = caller.user() else {
        controller.form.fail(LOGIN_REQUIRED);
        return Err(Error::unauthorized(LOGIN_REQUIRED));
    };
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(err) => {
            controller.form.fail(err.to_string());
            return Err(field_error(err.field(), err.to_string()));
        }
    };
    controller.form.begin_submit()?;
    if let Err(err) = ports.listings.insert(caller, &user.id, &draft).await {
        let error = Error::from(err);
        controller.form.fail(error.message());
        return Err(error);
    }
    info!(provider = %user.id, category = %draft.category, "listing posted");
    controller.form.succeed(None);
    Ok(())
}
