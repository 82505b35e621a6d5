//! Page view-state machine shared by every page controller.
//!
//! A page moves `Idle → Loading → Ready | Error`. Each load hands out a
//! [`LoadTicket`]; results presented with an older ticket are discarded, so a
//! slow response from a superseded load can never overwrite newer state.
//! Mutations declare a [`MutationPolicy`] saying whether they patch local
//! state or trigger a reload.

use serde::Serialize;

use super::{Error, ErrorCode};

/// Generation number identifying one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Whether a result was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Applied {
    /// The result belonged to the latest load and was applied.
    Current,
    /// A newer load superseded it; nothing changed.
    Stale,
}

/// How a mutation reconciles local state with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationPolicy {
    /// Apply the change to local state directly.
    Patch,
    /// Reload the page data from the backend.
    Refetch,
}

/// Failure shown in place of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageError {
    /// Stable error code.
    pub code: ErrorCode,
    /// Message safe to display.
    pub message: String,
}

impl From<&Error> for PageError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_owned(),
        }
    }
}

/// Lifecycle phase of a page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum PagePhase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// Data is present.
    Ready,
    /// The last load failed.
    Error {
        /// What went wrong.
        error: PageError,
    },
}

/// View state of one page: phase, data and the current load generation.
#[derive(Debug, Clone)]
pub struct PageState<T> {
    generation: u64,
    phase: PagePhase,
    data: Option<T>,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            phase: PagePhase::Idle,
            data: None,
        }
    }
}

impl<T> PageState<T> {
    /// A fresh idle page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &PagePhase {
        &self.phase
    }

    /// Loaded data, present once the page has been ready at least once.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Whether the page is showing data.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.phase, PagePhase::Ready)
    }

    /// Start a load, superseding any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.phase = PagePhase::Loading;
        LoadTicket(self.generation)
    }

    /// Whether `ticket` belongs to the latest load.
    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation && matches!(self.phase, PagePhase::Loading)
    }

    /// Apply the outcome of the load identified by `ticket`.
    ///
    /// Stale tickets change nothing. Failures keep previously loaded data so
    /// a failed refetch does not blank the page.
    pub fn resolve(&mut self, ticket: LoadTicket, outcome: Result<T, Error>) -> Applied {
        if !self.is_current(ticket) {
            return Applied::Stale;
        }
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.phase = PagePhase::Ready;
            }
            Err(err) => {
                self.phase = PagePhase::Error {
                    error: PageError::from(&err),
                };
            }
        }
        Applied::Current
    }

    /// Abandon any load in flight, e.g. when the page goes away.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if matches!(self.phase, PagePhase::Loading) {
            self.phase = PagePhase::Idle;
        }
    }

    /// Patch ready data in place.
    ///
    /// # Errors
    /// Returns `conflict` unless the page is ready.
    pub fn patch<R>(&mut self, apply: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        match (&self.phase, self.data.as_mut()) {
            (PagePhase::Ready, Some(data)) => Ok(apply(data)),
            _ => Err(Error::conflict("page is not ready")),
        }
    }
}

/// Lifecycle of a form submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum FormPhase {
    /// Editing; nothing sent.
    #[default]
    Idle,
    /// A submission is in flight.
    Submitting,
    /// The last submission succeeded.
    Succeeded {
        /// Confirmation to show, if any.
        message: Option<String>,
    },
    /// The last submission failed.
    Failed {
        /// Inline error text.
        message: String,
    },
}

/// Submission state of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    phase: FormPhase,
}

impl FormState {
    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &FormPhase {
        &self.phase
    }

    /// Enter `Submitting`.
    ///
    /// # Errors
    /// Returns `conflict` when a submission is already in flight.
    pub fn begin_submit(&mut self) -> Result<(), Error> {
        if matches!(self.phase, FormPhase::Submitting) {
            return Err(Error::conflict("submission already in progress"));
        }
        self.phase = FormPhase::Submitting;
        Ok(())
    }

    /// Record a successful submission.
    pub fn succeed(&mut self, message: Option<String>) {
        self.phase = FormPhase::Succeeded { message };
    }

    /// Record a failed submission with the text to show inline.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = FormPhase::Failed {
            message: message.into(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn load_moves_to_ready() {
        let mut page = PageState::<u32>::new();
        assert_eq!(page.phase(), &PagePhase::Idle);
        let ticket = page.begin_load();
        assert_eq!(page.phase(), &PagePhase::Loading);
        assert_eq!(page.resolve(ticket, Ok(7)), Applied::Current);
        assert!(page.is_ready());
        assert_eq!(page.data(), Some(&7));
    }

    #[rstest]
    fn failure_moves_to_error() {
        let mut page = PageState::<u32>::new();
        let ticket = page.begin_load();
        assert_eq!(
            page.resolve(ticket, Err(Error::service_unavailable("down"))),
            Applied::Current
        );
        assert!(matches!(
            page.phase(),
            PagePhase::Error { error } if error.code == ErrorCode::ServiceUnavailable
        ));
    }

    #[rstest]
    fn stale_ticket_changes_nothing() {
        let mut page = PageState::<u32>::new();
        let old = page.begin_load();
        let new = page.begin_load();
        assert_eq!(page.resolve(new, Ok(2)), Applied::Current);
        assert_eq!(page.resolve(old, Ok(1)), Applied::Stale);
        assert_eq!(page.resolve(old, Err(Error::internal("late"))), Applied::Stale);
        assert_eq!(page.data(), Some(&2));
        assert!(page.is_ready());
    }

    #[rstest]
    fn invalidate_discards_in_flight_loads() {
        let mut page = PageState::<u32>::new();
        let ticket = page.begin_load();
        page.invalidate();
        assert_eq!(page.resolve(ticket, Ok(1)), Applied::Stale);
        assert_eq!(page.phase(), &PagePhase::Idle);
        assert!(page.data().is_none());
    }

    #[rstest]
    fn duplicate_resolution_is_stale() {
        let mut page = PageState::<u32>::new();
        let ticket = page.begin_load();
        assert_eq!(page.resolve(ticket, Ok(1)), Applied::Current);
        assert_eq!(page.resolve(ticket, Ok(9)), Applied::Stale);
        assert_eq!(page.data(), Some(&1));
    }

    #[rstest]
    fn patch_requires_ready() {
        let mut page = PageState::<Vec<u32>>::new();
        assert!(page.patch(|items| items.push(1)).is_err());
        let ticket = page.begin_load();
        assert_eq!(page.resolve(ticket, Ok(vec![1, 2])), Applied::Current);
        page.patch(|items| items.retain(|item| *item != 1))
            .expect("ready page accepts patches");
        assert_eq!(page.data(), Some(&vec![2]));
    }

    #[rstest]
    fn refetch_failure_keeps_old_data() {
        let mut page = PageState::<u32>::new();
        let first = page.begin_load();
        assert_eq!(page.resolve(first, Ok(3)), Applied::Current);
        let second = page.begin_load();
        assert_eq!(page.resolve(second, Err(Error::internal("x"))), Applied::Current);
        assert_eq!(page.data(), Some(&3));
    }

    #[rstest]
    fn forms_refuse_double_submit() {
        let mut form = FormState::default();
        form.begin_submit().expect("first submit");
        let err = form.begin_submit().expect_err("second submit");
        assert_eq!(err.code(), ErrorCode::Conflict);
        form.fail("You must be logged in.");
        assert_eq!(
            form.phase(),
            &FormPhase::Failed {
                message: "You must be logged in.".to_owned()
            }
        );
        form.begin_submit().expect("retry after failure");
        form.succeed(None);
        assert_eq!(form.phase(), &FormPhase::Succeeded { message: None });
    }
}
