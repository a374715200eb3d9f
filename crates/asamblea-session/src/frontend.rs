//! Data-out seam to the UI.
//!
//! The controller pushes render-ready data through this trait and never
//! holds references into the UI. Default implementations are no-ops so a
//! delivery that arrives after the user navigated away (there is no request
//! cancellation) lands harmlessly.

use asamblea_client::Download;
use asamblea_core::models::{
    ActiveQuestion, AforoSnapshot, Identity, MyVote, Participant, QuestionResults,
};

use crate::confirm::ConfirmTicket;

/// UI surface the session layer talks to.
#[allow(unused_variables)]
pub trait Frontend: Send + Sync {
    /// Return to the unauthenticated screen.
    fn show_login(&self) {}

    /// Reload the whole client (after a system reset).
    fn reload(&self) {}

    /// Enter the voter home screen.
    fn show_voter_home(&self, identity: Identity, skip_power_question: bool) {}

    /// Render the active-questions view.
    fn show_active_questions(&self, questions: Vec<ActiveQuestion>) {}

    /// Render this voter's recorded votes.
    fn show_my_votes(&self, votes: Vec<MyVote>) {}

    /// Render the quorum panel.
    fn show_aforo(&self, aforo: AforoSnapshot) {}

    /// Render the roster.
    fn show_participants(&self, participants: Vec<Participant>) {}

    /// Render one question's live results.
    fn show_results(&self, results: QuestionResults) {}

    /// Hand a generated report to the user.
    fn deliver_download(&self, download: Download) {}

    /// Ask the user to confirm an operation. Dropping the ticket denies.
    fn request_confirm(&self, ticket: ConfirmTicket) {}
}
